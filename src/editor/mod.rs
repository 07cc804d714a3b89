//! Signal flow graph editor window

pub mod canvas;
pub mod interaction;
pub mod panels;
pub mod viewport;

pub use canvas::{GraphCanvas, NewNodePayload};
pub use interaction::{CanvasDrag, ControlPointDrag, InteractionManager, Selection};
pub use panels::{GainDrafts, ToolbarAction};
pub use viewport::Viewport;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use eframe::egui;
use egui::{Color32, Pos2};
use log::{error, info};

use crate::analysis::AnalysisRunner;
use crate::config::AppConfig;
use crate::export;
use crate::graph::SignalGraph;
use crate::solver::{HttpSolver, SolverError, SolverTransport};
use crate::stability::CharacteristicForm;

/// Spacing between nodes placed with the Add Node button
const NEW_NODE_STEP: f32 = 60.0;

/// Main application state
pub struct SignalFlowEditor {
    graph: SignalGraph,
    canvas: GraphCanvas,
    runner: AnalysisRunner,
    gain_drafts: GainDrafts,
    stability_form: CharacteristicForm,
    show_stability: bool,
    confirm_clear: bool,
    /// Outcome of the last export, shown in the status bar
    status: Option<Result<String, String>>,
}

impl SignalFlowEditor {
    /// Builds the editor against the configured solver
    pub fn new(config: &AppConfig) -> Result<Self, SolverError> {
        let solver = HttpSolver::new(config)?;
        Ok(Self::with_transport(config, Arc::new(solver)))
    }

    /// Builds the editor against any transport
    pub fn with_transport(config: &AppConfig, transport: Arc<dyn SolverTransport>) -> Self {
        Self {
            graph: SignalGraph::new(),
            canvas: GraphCanvas::new(config.canvas_grid),
            runner: AnalysisRunner::new(transport),
            gain_drafts: GainDrafts::new(),
            stability_form: CharacteristicForm::default(),
            show_stability: false,
            confirm_clear: false,
            status: None,
        }
    }

    pub fn graph(&self) -> &SignalGraph {
        &self.graph
    }

    /// Applies a toolbar action
    pub fn perform(&mut self, action: ToolbarAction) {
        match action {
            ToolbarAction::AddNode => {
                let index = self.graph.nodes().count() as f32;
                let position = Pos2::new(80.0 + index * NEW_NODE_STEP, 120.0);
                let id = self.graph.add_node(position).id;
                self.canvas.interaction.select_node(id);
            }
            ToolbarAction::Analyze => {
                self.runner.analyze(&self.graph);
            }
            ToolbarAction::Clear => {
                info!("Clearing graph");
                self.graph.clear();
                self.gain_drafts.clear();
                self.canvas.interaction.release_stale(&self.graph);
            }
            ToolbarAction::ExportEdges => {
                if let Some(path) = pick_save_path("JSON files", "json", "edges.json") {
                    self.report(export::save_edge_list(&path, &self.graph), &path);
                }
            }
            ToolbarAction::ExportSvg => {
                if let Some(path) = pick_save_path("SVG images", "svg", "diagram.svg") {
                    self.report(export::save_svg(&path, &self.graph), &path);
                }
            }
            ToolbarAction::ToggleStability => {
                self.show_stability = !self.show_stability;
            }
            ToolbarAction::ResetView => self.canvas.viewport.reset(),
        }
    }

    fn report(&mut self, outcome: anyhow::Result<()>, path: &Path) {
        self.status = Some(match outcome {
            Ok(()) => Ok(format!("Saved {}", path.display())),
            Err(e) => {
                error!("Export failed: {:#}", e);
                Err(format!("{:#}", e))
            }
        });
    }
}

fn pick_save_path(filter: &str, extension: &str, file_name: &str) -> Option<PathBuf> {
    rfd::FileDialog::new()
        .add_filter(filter, &[extension])
        .set_file_name(file_name)
        .save_file()
}

impl eframe::App for SignalFlowEditor {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.runner.poll();

        let solving = self.runner.is_solving();
        let action = egui::TopBottomPanel::top("toolbar")
            .show(ctx, |ui| panels::toolbar(ui, &mut self.confirm_clear, solving))
            .inner;
        if let Some(action) = action {
            self.perform(action);
        }

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!(
                    "{} nodes, {} branches",
                    self.graph.nodes().count(),
                    self.graph.edges().len()
                ));
                match &self.status {
                    Some(Ok(message)) => {
                        ui.separator();
                        ui.label(message);
                    }
                    Some(Err(message)) => {
                        ui.separator();
                        ui.colored_label(Color32::from_rgb(230, 80, 80), message);
                    }
                    None => {}
                }
            });
        });

        egui::SidePanel::right("gain_table")
            .default_width(220.0)
            .show(ctx, |ui| panels::gain_table(ui, &mut self.graph, &mut self.gain_drafts));

        egui::CentralPanel::default()
            .frame(egui::Frame::default())
            .show(ctx, |ui| self.canvas.show(ui, &mut self.graph));

        if !panels::results_window(ctx, self.runner.solve_state()) {
            self.runner.dismiss_results();
        }

        if self.show_stability {
            let (open, solve) =
                panels::stability_window(ctx, &mut self.stability_form, self.runner.stability_state());
            if solve {
                self.runner.check_stability(&self.stability_form);
            }
            if !open {
                self.show_stability = false;
                self.runner.dismiss_stability();
            }
        }

        if self.runner.is_busy() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}
