//! Linear undo history of grid snapshots.

use std::num::NonZeroUsize;

use log::debug;

use crate::error::{EngineError, Result};
use crate::grid::Grid;

/// Snapshots ordered oldest first; the last entry is the current state.
///
/// The history is never empty and every entry shares the dimensions of the
/// current state.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<Grid>,
    limit: Option<NonZeroUsize>,
    dropped: usize,
}

impl History {
    pub fn new(initial: Grid) -> Self {
        Self {
            entries: vec![initial],
            limit: None,
            dropped: 0,
        }
    }

    /// A history that keeps at most `limit` snapshots, dropping the oldest.
    ///
    /// A limit of one tracks only the current state.
    pub fn with_limit(initial: Grid, limit: NonZeroUsize) -> Self {
        Self {
            entries: vec![initial],
            limit: Some(limit),
            dropped: 0,
        }
    }

    pub fn top(&self) -> &Grid {
        // Non-empty by construction: `pop` never removes the last entry.
        &self.entries[self.entries.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Index of the current state in the timeline since the last reset,
    /// counting snapshots dropped by the limit.
    pub fn position(&self) -> usize {
        self.dropped + self.entries.len() - 1
    }

    pub fn can_undo(&self) -> bool {
        self.entries.len() > 1
    }

    pub fn iter(&self) -> impl Iterator<Item = &Grid> {
        self.entries.iter()
    }

    /// Append a new current state.
    pub fn push(&mut self, grid: Grid) -> Result<()> {
        self.check_dimensions(&grid)?;
        self.entries.push(grid);

        if let Some(limit) = self.limit {
            let excess = self.entries.len().saturating_sub(limit.get());
            if excess > 0 {
                self.entries.drain(..excess);
                self.dropped += excess;
                debug!("history limit {limit} reached, dropped {excess} oldest snapshot(s)");
            }
        }
        Ok(())
    }

    /// Remove and return the current state, exposing the previous one.
    pub fn pop(&mut self) -> Result<Grid> {
        if !self.can_undo() {
            return Err(EngineError::EmptyHistory);
        }
        self.entries.pop().ok_or(EngineError::EmptyHistory)
    }

    /// Swap the current state for an edited copy.
    pub fn replace_top(&mut self, grid: Grid) -> Result<Grid> {
        self.check_dimensions(&grid)?;
        let last = self.entries.len() - 1;
        Ok(std::mem::replace(&mut self.entries[last], grid))
    }

    /// Discard every snapshot and start over from `grid`.
    pub fn reset(&mut self, grid: Grid) {
        self.entries.clear();
        self.entries.push(grid);
        self.dropped = 0;
    }

    /// Rewrite every snapshot to `rows x cols`.
    ///
    /// Either all entries are rewritten or, on error, none are.
    pub fn resize_all(&mut self, rows: usize, cols: usize) -> Result<()> {
        let resized = self
            .entries
            .iter()
            .map(|grid| grid.resized(rows, cols))
            .collect::<Result<Vec<_>>>()?;
        self.entries = resized;
        Ok(())
    }

    fn check_dimensions(&self, grid: &Grid) -> Result<()> {
        let expected = self.top().dimensions();
        let got = grid.dimensions();
        if expected != got {
            return Err(EngineError::DimensionMismatch { expected, got });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::CellState;

    fn empty(rows: usize, cols: usize) -> Grid {
        Grid::new(rows, cols).unwrap()
    }

    #[test]
    fn starts_with_one_entry_and_cannot_undo() {
        let history = History::new(empty(3, 3));
        assert_eq!(history.len(), 1);
        assert!(!history.can_undo());
    }

    #[test]
    fn pop_on_single_entry_fails_and_keeps_entry() {
        let mut history = History::new(empty(3, 3));
        assert_eq!(history.pop(), Err(EngineError::EmptyHistory));
        assert_eq!(history.len(), 1);
        assert_eq!(history.top(), &empty(3, 3));
    }

    #[test]
    fn pop_returns_most_recent_push() {
        let mut history = History::new(empty(2, 2));
        let edited = empty(2, 2).toggled(0, 0).unwrap();
        history.push(edited.clone()).unwrap();

        assert!(history.can_undo());
        assert_eq!(history.pop().unwrap(), edited);
        assert_eq!(history.top(), &empty(2, 2));
    }

    #[test]
    fn push_rejects_foreign_dimensions() {
        let mut history = History::new(empty(2, 2));
        let err = history.push(empty(3, 2)).unwrap_err();
        assert_eq!(
            err,
            EngineError::DimensionMismatch {
                expected: (2, 2),
                got: (3, 2)
            }
        );
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn replace_top_keeps_length() {
        let mut history = History::new(empty(2, 2));
        history.push(empty(2, 2)).unwrap();
        let edited = empty(2, 2).toggled(1, 1).unwrap();
        history.replace_top(edited.clone()).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.top(), &edited);
    }

    #[test]
    fn snapshots_are_independent_of_later_edits() {
        let mut history = History::new(empty(2, 2));
        let mut working = history.top().clone();
        working.set(0, 1, CellState::Alive).unwrap();
        history.push(working.clone()).unwrap();
        working.set(1, 0, CellState::Alive).unwrap();

        assert_eq!(history.top().get(1, 0).unwrap(), CellState::Nothing);
        history.pop().unwrap();
        assert_eq!(history.top(), &empty(2, 2));
    }

    #[test]
    fn reset_drops_everything() {
        let mut history = History::new(empty(2, 2));
        history.push(empty(2, 2)).unwrap();
        history.push(empty(2, 2)).unwrap();
        history.reset(empty(4, 4));
        assert_eq!(history.len(), 1);
        assert_eq!(history.position(), 0);
        assert_eq!(history.top().dimensions(), (4, 4));
    }

    #[test]
    fn resize_all_rewrites_every_entry() {
        let mut history = History::new("o.\n.o".parse().unwrap());
        history.push("oo\noo".parse().unwrap()).unwrap();
        history.resize_all(3, 1).unwrap();

        assert!(history.iter().all(|grid| grid.dimensions() == (3, 1)));
        assert_eq!(history.top(), &"o\no\n.".parse::<Grid>().unwrap());
        history.pop().unwrap();
        assert_eq!(history.top(), &"o\n.\n.".parse::<Grid>().unwrap());
    }

    #[test]
    fn failed_resize_leaves_history_untouched() {
        let mut history = History::new(empty(2, 2));
        assert!(history.resize_all(0, 2).is_err());
        assert_eq!(history.top().dimensions(), (2, 2));
    }

    #[test]
    fn limit_drops_oldest_snapshots() {
        let limit = NonZeroUsize::new(2).unwrap();
        let first = empty(2, 2);
        let second = first.toggled(0, 0).unwrap();
        let third = second.toggled(1, 1).unwrap();

        let mut history = History::with_limit(first, limit);
        history.push(second.clone()).unwrap();
        history.push(third.clone()).unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history.position(), 2);
        assert_eq!(history.pop().unwrap(), third);
        assert_eq!(history.top(), &second);
        assert_eq!(history.pop(), Err(EngineError::EmptyHistory));
    }

    #[test]
    fn limit_of_one_tracks_only_current_state() {
        let mut history = History::with_limit(empty(2, 2), NonZeroUsize::MIN);
        let next = empty(2, 2).toggled(0, 0).unwrap();
        history.push(next.clone()).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history.top(), &next);
        assert!(!history.can_undo());
    }
}
