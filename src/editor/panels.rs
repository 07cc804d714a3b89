//! Toolbar, gain table and the analysis windows

use std::collections::HashMap;

use egui::{Color32, Context, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use super::canvas::NewNodePayload;
use crate::analysis::RequestState;
use crate::graph::{is_valid_gain, FunctionId, SignalGraph};
use crate::results::ResultView;
use crate::stability::{CharacteristicForm, StabilityReport};

const ROW_HEIGHT: f32 = 22.0;
const HEADER_HEIGHT: f32 = 20.0;
const ERROR_COLOR: Color32 = Color32::from_rgb(230, 80, 80);
const STABLE_COLOR: Color32 = Color32::from_rgb(90, 200, 120);

/// Something the user asked for from the toolbar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    AddNode,
    Analyze,
    Clear,
    ExportEdges,
    ExportSvg,
    ToggleStability,
    ResetView,
}

/// Top bar. `confirm_clear` holds the two-step Clear confirmation.
pub fn toolbar(ui: &mut Ui, confirm_clear: &mut bool, solving: bool) -> Option<ToolbarAction> {
    let mut action = None;
    ui.horizontal(|ui| {
        let chip = egui::Id::new("new_node_chip");
        ui.dnd_drag_source(chip, NewNodePayload, |ui| {
            ui.label(RichText::new("◯ Node").strong());
        })
        .response
        .on_hover_text("Drag onto the canvas to place a node");

        if ui.button("Add Node").clicked() {
            action = Some(ToolbarAction::AddNode);
        }
        ui.separator();

        let analyze = ui.add_enabled(!solving, egui::Button::new("Analyze"));
        if analyze.clicked() {
            action = Some(ToolbarAction::Analyze);
        }
        if ui.button("Stability").clicked() {
            action = Some(ToolbarAction::ToggleStability);
        }
        ui.separator();

        ui.menu_button("Export", |ui| {
            if ui.button("Edge list (JSON)…").clicked() {
                action = Some(ToolbarAction::ExportEdges);
                ui.close_menu();
            }
            if ui.button("Diagram (SVG)…").clicked() {
                action = Some(ToolbarAction::ExportSvg);
                ui.close_menu();
            }
        });
        if ui.button("Reset View").clicked() {
            action = Some(ToolbarAction::ResetView);
        }
        ui.separator();

        if *confirm_clear {
            ui.label("Sure?");
            if ui.button("Clear all").clicked() {
                action = Some(ToolbarAction::Clear);
                *confirm_clear = false;
            }
            if ui.button("Cancel").clicked() {
                *confirm_clear = false;
            }
        } else if ui.button("Clear").clicked() {
            *confirm_clear = true;
        }
    });
    action
}

/// Text being typed into gain cells that is not a number yet, such as `-` or `1e`.
///
/// A cell shows its draft while one exists. Every edit that reads as a gain
/// is stored right away; the draft is dropped when the cell loses focus, so
/// the cell falls back to the stored value.
#[derive(Debug, Clone, Default)]
pub struct GainDrafts {
    drafts: HashMap<FunctionId, String>,
}

impl GainDrafts {
    pub fn new() -> Self {
        Self::default()
    }

    /// What the cell for `function_id` should show
    pub fn text<'a>(&'a self, function_id: FunctionId, stored: &'a str) -> &'a str {
        self.drafts
            .get(&function_id)
            .map(String::as_str)
            .unwrap_or(stored)
    }

    /// Records an edit and stores it when it is a valid gain. Returns whether it was stored.
    pub fn edit(&mut self, graph: &mut SignalGraph, function_id: FunctionId, text: String) -> bool {
        let stored = is_valid_gain(&text) && graph.set_gain(function_id, &text);
        self.drafts.insert(function_id, text);
        stored
    }

    /// Forgets the draft of a cell that lost focus
    pub fn release(&mut self, function_id: FunctionId) {
        self.drafts.remove(&function_id);
    }

    /// Drops drafts of branches that no longer exist
    pub fn retain_existing(&mut self, graph: &SignalGraph) {
        self.drafts
            .retain(|id, _| graph.gain_rows().any(|row| row.function_id == *id));
    }

    pub fn clear(&mut self) {
        self.drafts.clear();
    }
}

/// Editable gain per branch. Text that is not a gain yet stays in the cell
/// without touching the stored value.
pub fn gain_table(ui: &mut Ui, graph: &mut SignalGraph, drafts: &mut GainDrafts) {
    ui.heading("Functions");
    ui.separator();

    drafts.retain_existing(graph);
    let rows: Vec<(FunctionId, String)> = graph
        .gain_rows()
        .map(|row| (row.function_id, drafts.text(row.function_id, row.gain).to_string()))
        .collect();
    if rows.is_empty() {
        ui.label("No functions defined yet. Connect nodes to create functions.");
        return;
    }

    TableBuilder::new(ui)
        .striped(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .column(Column::exact(60.0))
        .column(Column::remainder().at_least(80.0))
        .header(HEADER_HEIGHT, |mut header| {
            header.col(|ui| {
                ui.strong("Function");
            });
            header.col(|ui| {
                ui.strong("Gain");
            });
        })
        .body(|body| {
            body.rows(ROW_HEIGHT, rows.len(), |mut row| {
                let (function_id, shown) = &rows[row.index()];
                row.col(|ui| {
                    ui.label(function_id.to_string());
                });
                row.col(|ui| {
                    let mut text = shown.clone();
                    let response = ui.add(egui::TextEdit::singleline(&mut text).hint_text("1"));
                    if response.changed() {
                        drafts.edit(graph, *function_id, text);
                    }
                    if response.lost_focus() {
                        drafts.release(*function_id);
                    }
                });
            });
        });
}

/// Analysis results. Returns false once the user closed the window.
pub fn results_window(ctx: &Context, state: &RequestState<ResultView>) -> bool {
    if matches!(state, RequestState::Idle) {
        return true;
    }
    let mut open = true;
    egui::Window::new("Analysis Results")
        .open(&mut open)
        .default_width(420.0)
        .vscroll(true)
        .show(ctx, |ui| match state {
            RequestState::Idle => {}
            RequestState::Pending => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Processing your signal flow graph...");
                });
            }
            RequestState::Failed(message) => {
                ui.label(RichText::new(message).color(ERROR_COLOR));
            }
            RequestState::Succeeded(view) => result_view(ui, view),
        });
    open
}

fn result_view(ui: &mut Ui, view: &ResultView) {
    if view.is_empty() {
        ui.label("No results available. Please check your graph configuration.");
        return;
    }
    if let Some(tf) = &view.transfer_function {
        ui.label(RichText::new(format!("Transfer Function: {}", tf)).strong());
    }
    if let Some(delta) = &view.delta {
        ui.label(format!("Delta (Δ): {}", delta));
    }

    for section in &view.sections {
        ui.add_space(8.0);
        ui.heading(section.title());
        let [left, right] = section.kind.headers();
        egui::Grid::new(section.title())
            .striped(true)
            .num_columns(2)
            .show(ui, |ui| {
                ui.strong(left);
                ui.strong(right);
                ui.end_row();
                for row in &section.rows {
                    ui.label(&row.label);
                    ui.label(&row.value);
                    ui.end_row();
                }
            });
    }
}

/// Characteristic equation form and report. Returns (still open, solve pressed).
pub fn stability_window(
    ctx: &Context,
    form: &mut CharacteristicForm,
    state: &RequestState<StabilityReport>,
) -> (bool, bool) {
    let mut open = true;
    let mut solve = false;
    egui::Window::new("Stability Analysis")
        .open(&mut open)
        .default_width(360.0)
        .vscroll(true)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Order");
                let mut order = form.order();
                if ui
                    .add(egui::DragValue::new(&mut order).range(0..=20))
                    .changed()
                {
                    form.set_order(order);
                }
            });

            egui::Grid::new("coefficients").num_columns(2).show(ui, |ui| {
                for index in 0..form.fields().len() {
                    let power = form.power_of(index);
                    ui.label(format!("s^{}", power));
                    ui.text_edit_singleline(&mut form.fields_mut()[index]);
                    ui.end_row();
                }
            });

            let pending = matches!(state, RequestState::Pending);
            if ui.add_enabled(!pending, egui::Button::new("Solve")).clicked() {
                solve = true;
            }
            ui.separator();

            match state {
                RequestState::Idle => {}
                RequestState::Pending => {
                    ui.spinner();
                }
                RequestState::Failed(message) => {
                    ui.label(RichText::new(message).color(ERROR_COLOR));
                }
                RequestState::Succeeded(report) => stability_report(ui, report),
            }
        });
    (open, solve)
}

fn stability_report(ui: &mut Ui, report: &StabilityReport) {
    let color = if report.stable { STABLE_COLOR } else { ERROR_COLOR };
    ui.label(RichText::new(&report.message).color(color).strong());

    if !report.unstable_poles.is_empty() {
        ui.add_space(6.0);
        ui.strong("Unstable poles");
        for pole in &report.unstable_poles {
            ui.label(pole);
        }
    }

    if !report.routh_rows.is_empty() {
        ui.add_space(6.0);
        ui.strong("Routh array");
        egui::Grid::new("routh").striped(true).show(ui, |ui| {
            for row in &report.routh_rows {
                ui.label(&row.label);
                for cell in &row.cells {
                    ui.monospace(cell);
                }
                ui.end_row();
            }
        });
    }
}
