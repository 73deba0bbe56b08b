//! The engine boundary consumed by front ends: configuration, stepping,
//! edits and undo over a single history.

use std::num::NonZeroUsize;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::Config;
use crate::error::Result;
use crate::grid::Grid;
use crate::history::History;

/// An owned copy of the current state, safe to hand to a renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub grid: Grid,
    /// For a step: whether any cell actively changed. For an undo: whether the
    /// restored state differs from the discarded one.
    pub changed: bool,
    /// Position of this state in the timeline since the last clear.
    pub generation: usize,
}

/// Grid engine plus undo history.
///
/// Step and undo are independent operations; whether a run loop is active is
/// for the caller to track.
#[derive(Debug)]
pub struct Simulation {
    config: Config,
    history: History,
    rng: StdRng,
}

impl Simulation {
    pub fn new(config: Config) -> Result<Self> {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Build with an explicit random source, for reproducible seeding.
    pub fn with_rng(config: Config, rng: StdRng) -> Result<Self> {
        config.validate()?;
        let history = History::new(Grid::new(config.rows, config.cols)?);
        Ok(Self {
            config,
            history,
            rng,
        })
    }

    /// Keep at most `limit` states in the undo history.
    pub fn with_history_limit(mut self, limit: NonZeroUsize) -> Self {
        self.history = History::with_limit(self.history.top().clone(), limit);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Apply a new configuration. Dimension changes rewrite every history entry.
    ///
    /// Invalid configurations are rejected and leave everything unchanged.
    pub fn configure(&mut self, config: Config) -> Result<()> {
        if let Err(err) = config.validate() {
            warn!("rejected configuration {config:?}: {err}");
            return Err(err);
        }

        if (config.rows, config.cols) != (self.config.rows, self.config.cols) {
            self.history.resize_all(config.rows, config.cols)?;
            info!(
                "resized {} snapshot(s) from {}x{} to {}x{}",
                self.history.len(),
                self.config.rows,
                self.config.cols,
                config.rows,
                config.cols
            );
        }
        self.config = config;
        Ok(())
    }

    /// Advance one generation and make it the current state.
    pub fn step(&mut self) -> Result<Snapshot> {
        let (next, changed) = self.history.top().step();
        self.history.push(next)?;
        let snapshot = self.snapshot(changed);
        debug!(
            "generation {}: population {}, changed {}",
            snapshot.generation,
            snapshot.grid.population(),
            changed
        );
        Ok(snapshot)
    }

    /// Toggle one cell of the current state in place of the current snapshot.
    pub fn toggle_cell(&mut self, row: usize, col: usize) -> Result<()> {
        let edited = self.history.top().toggled(row, col).inspect_err(|err| {
            warn!("rejected toggle: {err}");
        })?;
        self.history.replace_top(edited)?;
        debug!("toggled cell ({row}, {col})");
        Ok(())
    }

    /// Push a freshly seeded random grid. The previous state stays undoable.
    pub fn randomize(&mut self) -> Result<()> {
        let grid = Grid::random(
            self.config.seed_density_percent,
            self.config.rows,
            self.config.cols,
            &mut self.rng,
        )?;
        info!(
            "randomized {}x{} grid at {}% density: {} live cells",
            self.config.rows,
            self.config.cols,
            self.config.seed_density_percent,
            grid.population()
        );
        self.history.push(grid)
    }

    /// Reset to a single empty grid, discarding the whole undo chain.
    pub fn clear(&mut self) -> Result<()> {
        let grid = Grid::new(self.config.rows, self.config.cols)?;
        info!("cleared history of {} snapshot(s)", self.history.len());
        self.history.reset(grid);
        Ok(())
    }

    /// Discard the current state and return to the previous one.
    pub fn undo(&mut self) -> Result<Snapshot> {
        let discarded = self.history.pop().inspect_err(|err| {
            warn!("rejected undo: {err}");
        })?;
        let changed = discarded != *self.history.top();
        let snapshot = self.snapshot(changed);
        debug!("undo back to generation {}", snapshot.generation);
        Ok(snapshot)
    }

    /// Read-only view of the current state.
    pub fn current_grid(&self) -> &Grid {
        self.history.top()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn generation(&self) -> usize {
        self.history.position()
    }

    fn snapshot(&self, changed: bool) -> Snapshot {
        Snapshot {
            grid: self.history.top().clone(),
            changed,
            generation: self.history.position(),
        }
    }
}
