use std::sync::Arc;

use anyhow::Context;
use eframe::egui;
use eframe::egui::{Color32, ScrollArea, Ui};
use eframe::run_native;
use quadlife_engine::run::{self, Runner, StepObserver};
use quadlife_engine::{CellState, Config, Grid, Simulation, Snapshot};
use tokio::runtime::Runtime;

const CELL_SIZE: f32 = 20.0;
const CELL_GAP: f32 = 2.0;
const MAX_DIMENSION: usize = 200;
const MAX_TICK_MS: u64 = 10_000;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // Optional JSON config file as the only argument
    let config = match std::env::args().nth(1) {
        Some(path) => {
            let text = std::fs::read_to_string(&path).with_context(|| format!("read config {path}"))?;
            Config::from_json(&text).with_context(|| format!("load config {path}"))?
        }
        None => Config::default(),
    };
    log::info!("starting with {config:?}");

    // One worker: only one step is ever in flight
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_time()
        .build()
        .context("build runtime")?;
    let simulation = run::shared(Simulation::new(config).context("create simulation")?);

    run_native(
        "Game of Life GUI",
        eframe::NativeOptions::default(),
        Box::new(move |cc| {
            // Repaint whenever the run loop produces a generation
            let ctx = cc.egui_ctx.clone();
            let observer: StepObserver = Arc::new(move |_: &Snapshot| ctx.request_repaint());
            let runner = Runner::new(simulation, runtime.handle().clone()).with_observer(observer);

            Ok(Box::new(GuiOfLife::new(runner, runtime)))
        }),
    )
    .map_err(|err| anyhow::anyhow!("run gui: {err}"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Palette {
    Color,
    Mono,
}

impl Palette {
    fn color(self, cell: CellState) -> Color32 {
        match (self, cell) {
            (Palette::Color, CellState::Born) => Color32::GREEN,
            (Palette::Color, CellState::Alive) => Color32::BLUE,
            (Palette::Color, CellState::Dead) => Color32::RED,
            (Palette::Color, CellState::Nothing) => Color32::GRAY,
            (Palette::Mono, cell) if cell.is_live() => Color32::BLACK,
            (Palette::Mono, _) => Color32::GRAY,
        }
    }
}

/// The cell under `offset`, measured from the grid's top-left corner.
fn cell_at(offset: egui::Vec2, grid: &Grid) -> Option<(usize, usize)> {
    if offset.x < 0.0 || offset.y < 0.0 {
        return None;
    }
    let row = (offset.y / CELL_SIZE) as usize;
    let col = (offset.x / CELL_SIZE) as usize;
    (row < grid.rows() && col < grid.cols()).then_some((row, col))
}

struct GuiOfLife {
    runner: Runner,
    show_json: bool,
    status: Option<String>,
    // Dropped after the runner so its loop is cancelled first
    _runtime: Runtime,
}

impl GuiOfLife {
    fn new(runner: Runner, runtime: Runtime) -> Self {
        Self {
            runner,
            show_json: false,
            status: None,
            _runtime: runtime,
        }
    }

    /// Apply one mutation under the simulation lock and remember any rejection.
    fn act<T>(&mut self, action: impl FnOnce(&mut Simulation) -> quadlife_engine::Result<T>) {
        let result = {
            let mut sim = run::lock(self.runner.simulation());
            action(&mut *sim)
        };
        self.status = result.err().map(|err| err.to_string());
    }

    fn settings(&mut self, ui: &mut Ui, running: bool) {
        let current = *run::lock(self.runner.simulation()).config();
        let mut form = current;

        ui.horizontal(|ui| {
            ui.label("Rows:");
            ui.add_enabled(!running, egui::DragValue::new(&mut form.rows).range(1..=MAX_DIMENSION));
            ui.label("Cols:");
            ui.add_enabled(!running, egui::DragValue::new(&mut form.cols).range(1..=MAX_DIMENSION));
            ui.label("Tick:");
            ui.add(
                egui::DragValue::new(&mut form.tick_interval_ms)
                    .range(1..=MAX_TICK_MS)
                    .suffix(" ms"),
            );
            ui.label("Density:");
            ui.add(
                egui::DragValue::new(&mut form.seed_density_percent)
                    .range(0..=100)
                    .suffix(" %"),
            );
        });

        if form != current {
            self.act(|sim| sim.configure(form));
        }
    }

    fn controls(&mut self, ui: &mut Ui, running: bool) {
        let can_undo = run::lock(self.runner.simulation()).can_undo();

        ui.horizontal(|ui| {
            if ui.button(if running { "Stop" } else { "Start" }).clicked() {
                if running {
                    self.runner.stop();
                } else {
                    self.runner.start();
                }
            }
            if ui.button("Randomize").clicked() {
                self.act(|sim| sim.randomize());
            }
            if ui.button("Clear").clicked() {
                self.act(|sim| sim.clear());
            }
            if ui.add_enabled(can_undo && !running, egui::Button::new("<-")).clicked() {
                self.act(|sim| sim.undo());
            }
            if ui.add_enabled(!running, egui::Button::new("->")).clicked() {
                self.act(|sim| sim.step());
            }
            ui.checkbox(&mut self.show_json, "Show JSON");
        });
    }

    fn create_grid(&mut self, ui: &mut Ui, grid: &Grid, palette: Palette, running: bool) {
        let (rect, response) = ui.allocate_exact_size(
            egui::vec2(CELL_SIZE * grid.cols() as f32, CELL_SIZE * grid.rows() as f32),
            egui::Sense::click(),
        );

        let painter = ui.painter();
        for (row_index, row) in grid.iter_rows().enumerate() {
            for (col_index, cell) in row.iter().enumerate() {
                let pos = rect.min + egui::vec2(col_index as f32 * CELL_SIZE, row_index as f32 * CELL_SIZE);
                painter.rect_filled(
                    egui::Rect::from_min_size(pos, egui::vec2(CELL_SIZE - CELL_GAP, CELL_SIZE - CELL_GAP)),
                    CELL_SIZE / 4f32,
                    palette.color(*cell),
                );
            }
        }

        // Edits only while stopped
        if running || !response.clicked() {
            return;
        }
        if let Some((row, col)) = response
            .interact_pointer_pos()
            .and_then(|pos| cell_at(pos - rect.min, grid))
        {
            self.act(|sim| sim.toggle_cell(row, col));
        }
    }
}

impl eframe::App for GuiOfLife {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let running = self.runner.is_running();
        // Render from a copy so the run loop never waits on drawing
        let (grid, generation, history_len) = {
            let sim = run::lock(self.runner.simulation());
            (sim.current_grid().clone(), sim.generation(), sim.history_len())
        };

        egui::CentralPanel::default().show(ctx, |ui| {
            ScrollArea::both().show(ui, |ui| {
                ui.heading("Game of Life");
                self.settings(ui, running);
                self.controls(ui, running);
                ui.label(format!(
                    "Generation: {generation}   Population: {}   History: {history_len}",
                    grid.population()
                ));
                if let Some(status) = &self.status {
                    ui.colored_label(Color32::RED, status);
                }

                ui.horizontal(|ui| {
                    self.create_grid(ui, &grid, Palette::Color, running);
                    ui.add_space(CELL_SIZE);
                    self.create_grid(ui, &grid, Palette::Mono, running);
                });

                if self.show_json {
                    match serde_json::to_string(&grid) {
                        Ok(json) => {
                            ui.monospace(json);
                        }
                        Err(err) => log::warn!("serialize grid: {err}"),
                    }
                }
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_palette_distinguishes_every_state() {
        let colors = [CellState::Nothing, CellState::Dead, CellState::Alive, CellState::Born]
            .map(|cell| Palette::Color.color(cell));
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn mono_palette_only_shows_live_cells() {
        assert_eq!(Palette::Mono.color(CellState::Alive), Color32::BLACK);
        assert_eq!(Palette::Mono.color(CellState::Born), Color32::BLACK);
        assert_eq!(Palette::Mono.color(CellState::Dead), Color32::GRAY);
        assert_eq!(Palette::Mono.color(CellState::Nothing), Color32::GRAY);
    }

    #[test]
    fn click_maps_to_cell() {
        let grid = Grid::new(3, 4).unwrap();
        assert_eq!(cell_at(egui::vec2(0.0, 0.0), &grid), Some((0, 0)));
        assert_eq!(cell_at(egui::vec2(CELL_SIZE * 3.5, CELL_SIZE * 2.1), &grid), Some((2, 3)));
        assert_eq!(cell_at(egui::vec2(CELL_SIZE * 4.0, 0.0), &grid), None);
        assert_eq!(cell_at(egui::vec2(-1.0, 0.0), &grid), None);
    }
}
