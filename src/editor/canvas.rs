//! Graph canvas: painting and pointer/keyboard input

use egui::epaint::QuadraticBezierShape;
use egui::{Align2, Color32, FontId, Key, Painter, Pos2, Rect, Response, Sense, Shape, Stroke, Ui, Vec2};
use log::debug;

use super::interaction::{
    control_handle, edge_at, handle_at, node_at, output_handle, output_handle_at, CanvasDrag,
    InteractionManager, Selection,
};
use super::viewport::Viewport;
use crate::constants::canvas::{
    EDGE_PICK_DISTANCE, GRID_SPACING, HANDLE_RADIUS, LABEL_LIFT, NODE_RADIUS,
};
use crate::geometry::branch_curves;
use crate::graph::SignalGraph;

const BACKGROUND: Color32 = Color32::from_rgb(28, 28, 28);
const GRID_DOT: Color32 = Color32::from_rgb(56, 56, 56);
const EDGE_COLOR: Color32 = Color32::from_rgb(150, 150, 150);
const SELECTED_COLOR: Color32 = Color32::from_rgb(0, 122, 255);
const NODE_FILL: Color32 = Color32::from_rgb(48, 48, 48);
const NODE_BORDER: Color32 = Color32::from_rgb(64, 64, 64);
const TEXT_COLOR: Color32 = Color32::from_rgb(220, 220, 220);
const HANDLE_COLOR: Color32 = Color32::from_rgb(255, 170, 0);

/// Payload carried when a node chip is dragged onto the canvas
#[derive(Debug, Clone, Copy)]
pub struct NewNodePayload;

/// Screen/graph mapping for one frame, anchored at the canvas corner
#[derive(Clone, Copy)]
struct Transform<'a> {
    viewport: &'a Viewport,
    origin: Vec2,
}

impl Transform<'_> {
    fn to_screen(&self, world: Pos2) -> Pos2 {
        self.viewport.world_to_screen(world) + self.origin
    }

    fn to_world(&self, screen: Pos2) -> Pos2 {
        self.viewport.screen_to_world(screen - self.origin)
    }

    fn scale(&self, length: f32) -> f32 {
        length * self.viewport.zoom
    }
}

/// The interactive drawing surface
#[derive(Debug, Clone, Default)]
pub struct GraphCanvas {
    pub viewport: Viewport,
    pub interaction: InteractionManager,
    pub show_grid: bool,
}

impl GraphCanvas {
    pub fn new(show_grid: bool) -> Self {
        Self {
            show_grid,
            ..Self::default()
        }
    }

    /// Handles input and paints the graph into the remaining space
    pub fn show(&mut self, ui: &mut Ui, graph: &mut SignalGraph) {
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let rect = response.rect;
        painter.rect_filled(rect, 0.0, BACKGROUND);

        self.handle_input(ui, &response, graph);
        self.interaction.release_stale(graph);

        let transform = Transform {
            viewport: &self.viewport,
            origin: rect.min.to_vec2(),
        };
        if self.show_grid {
            paint_grid(&painter, rect, &transform);
        }
        self.paint_edges(&painter, &transform, graph);
        self.paint_pending_connection(&painter, &transform, graph);
        self.paint_nodes(&painter, &transform, graph);
    }

    fn handle_input(&mut self, ui: &Ui, response: &Response, graph: &mut SignalGraph) {
        let origin = response.rect.min.to_vec2();
        let to_world = |viewport: &Viewport, screen: Pos2| viewport.screen_to_world(screen - origin);
        let pick = self.viewport.screen_to_world_distance(EDGE_PICK_DISTANCE);
        let handle_pick = self.viewport.screen_to_world_distance(HANDLE_RADIUS + 1.0);

        if response.drag_started() {
            let press = ui
                .input(|i| i.pointer.press_origin())
                .or_else(|| response.interact_pointer_pos());
            if let Some(press) = press {
                let world = to_world(&self.viewport, press);
                self.begin_drag(world, handle_pick, graph);
            }
        }

        if response.dragged() {
            if *self.interaction.drag() == CanvasDrag::Pan {
                self.viewport.pan(response.drag_delta());
            } else if let Some(pointer) = response.interact_pointer_pos() {
                let world = to_world(&self.viewport, pointer);
                self.interaction.update_drag(world, graph);
            }
        }

        if response.drag_stopped() {
            let pointer = response
                .interact_pointer_pos()
                .or_else(|| response.hover_pos())
                .map(|p| to_world(&self.viewport, p));
            self.interaction.end_drag(pointer, graph);
        }

        if response.clicked() {
            if let Some(pointer) = response.interact_pointer_pos() {
                let world = to_world(&self.viewport, pointer);
                if let Some(id) = node_at(graph, world) {
                    self.interaction.select_node(id);
                } else if let Some(id) = edge_at(graph, world, pick) {
                    self.interaction.select_edge(id);
                } else {
                    self.interaction.clear_selection();
                }
            }
        }

        if response.double_clicked() {
            if let Some(pointer) = response.interact_pointer_pos() {
                let world = to_world(&self.viewport, pointer);
                match self.interaction.selection {
                    Selection::Edge(id) if handle_at(graph, id, world, handle_pick) => {
                        let _ = graph.reset_control_point(id);
                    }
                    _ if node_at(graph, world).is_none() => {
                        let id = graph.add_node(world).id;
                        self.interaction.select_node(id);
                    }
                    _ => {}
                }
            }
        }

        if let Some(_payload) = response.dnd_release_payload::<NewNodePayload>() {
            if let Some(pointer) = response.hover_pos() {
                let id = graph.add_node(to_world(&self.viewport, pointer)).id;
                self.interaction.select_node(id);
            }
        }

        if response.hovered() {
            let scroll = ui.input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                if let Some(pointer) = response.hover_pos() {
                    self.viewport.zoom_at_point(pointer - origin, (scroll * 0.002).exp());
                }
            }
        }

        let delete = !ui.ctx().wants_keyboard_input()
            && ui.input(|i| i.key_pressed(Key::Delete) || i.key_pressed(Key::Backspace));
        if delete && self.interaction.delete_selected(graph) {
            debug!("Deleted selection from canvas");
        }
    }

    /// Picks the drag kind from what lies under the press position
    fn begin_drag(&mut self, world: Pos2, handle_pick: f32, graph: &SignalGraph) {
        let result = match self.interaction.selected_edge() {
            Some(edge) if handle_at(graph, edge, world, handle_pick) => {
                self.interaction.begin_control_point_drag(edge, graph)
            }
            _ => {
                let port_pick = handle_pick.max(HANDLE_RADIUS);
                if let Some(source) = output_handle_at(graph, world, port_pick) {
                    self.interaction.begin_connect(source, world, graph)
                } else if let Some(id) = node_at(graph, world) {
                    self.interaction.begin_node_drag(id, world, graph)
                } else {
                    self.interaction.begin_pan()
                }
            }
        };
        if let Err(reason) = result {
            debug!("Drag not started: {}", reason);
        }
    }

    fn paint_edges(&self, painter: &Painter, transform: &Transform, graph: &SignalGraph) {
        let selected = self.interaction.selected_edge();
        for (edge, curve) in branch_curves(graph) {
            let color = if selected == Some(edge.id) {
                SELECTED_COLOR
            } else {
                EDGE_COLOR
            };
            let stroke = Stroke::new(transform.scale(1.5).max(1.0), color);
            let source = transform.to_screen(curve.source);
            let target = transform.to_screen(curve.target);

            if curve.is_curved() {
                let control = transform.to_screen(curve.control);
                painter.add(QuadraticBezierShape::from_points_stroke(
                    [source, control, target],
                    false,
                    Color32::TRANSPARENT,
                    stroke,
                ));
            } else {
                painter.line_segment([source, target], stroke);
            }

            if let Some(arrow) = curve.arrow {
                let points = arrow.iter().map(|p| transform.to_screen(*p)).collect();
                painter.add(Shape::convex_polygon(points, color, Stroke::NONE));
            }

            let label = transform.to_screen(curve.label) - Vec2::new(0.0, transform.scale(LABEL_LIFT));
            painter.text(
                label,
                Align2::CENTER_CENTER,
                edge.function_id.to_string(),
                FontId::proportional(transform.scale(12.0).max(6.0)),
                TEXT_COLOR,
            );
        }

        if let Some(handle) = selected.and_then(|id| control_handle(graph, id)) {
            let center = transform.to_screen(handle);
            painter.circle(center, HANDLE_RADIUS, HANDLE_COLOR, Stroke::new(1.0, BACKGROUND));
        }
    }

    fn paint_pending_connection(&self, painter: &Painter, transform: &Transform, graph: &SignalGraph) {
        if let CanvasDrag::Connect { source, cursor } = self.interaction.drag() {
            if let Some(node) = graph.node(*source) {
                let start = transform.to_screen(output_handle(node.position));
                let end = transform.to_screen(*cursor);
                painter.line_segment([start, end], Stroke::new(1.5, SELECTED_COLOR));
            }
        }
    }

    fn paint_nodes(&self, painter: &Painter, transform: &Transform, graph: &SignalGraph) {
        let radius = transform.scale(NODE_RADIUS);
        for node in graph.nodes() {
            let center = transform.to_screen(node.position);
            let border = if self.interaction.selection == Selection::Node(node.id) {
                SELECTED_COLOR
            } else {
                NODE_BORDER
            };
            painter.circle(center, radius, NODE_FILL, Stroke::new(2.0, border));
            painter.text(
                center,
                Align2::CENTER_CENTER,
                &node.display_name,
                FontId::proportional(transform.scale(13.0).max(6.0)),
                TEXT_COLOR,
            );

            let handle = transform.to_screen(output_handle(node.position));
            painter.circle(
                handle,
                transform.scale(HANDLE_RADIUS * 0.8),
                EDGE_COLOR,
                Stroke::new(1.0, BACKGROUND),
            );
        }
    }
}

fn paint_grid(painter: &Painter, rect: Rect, transform: &Transform) {
    let spacing = transform.scale(GRID_SPACING);
    if spacing < 6.0 {
        return;
    }
    let top_left = transform.to_world(rect.min);
    let start = Pos2::new(
        (top_left.x / GRID_SPACING).floor() * GRID_SPACING,
        (top_left.y / GRID_SPACING).floor() * GRID_SPACING,
    );
    let mut screen_x = transform.to_screen(start).x;
    while screen_x <= rect.max.x {
        let mut screen_y = transform.to_screen(start).y;
        while screen_y <= rect.max.y {
            let dot = Pos2::new(screen_x, screen_y);
            if rect.contains(dot) {
                painter.circle_filled(dot, 1.0, GRID_DOT);
            }
            screen_y += spacing;
        }
        screen_x += spacing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_is_anchored_at_canvas_corner() {
        let mut viewport = Viewport::new();
        viewport.zoom = 2.0;
        let transform = Transform {
            viewport: &viewport,
            origin: Vec2::new(100.0, 50.0),
        };

        assert_eq!(transform.to_screen(Pos2::new(10.0, 10.0)), Pos2::new(120.0, 70.0));
        assert_eq!(transform.to_world(Pos2::new(120.0, 70.0)), Pos2::new(10.0, 10.0));
        assert_eq!(transform.scale(NODE_RADIUS), 36.0);
    }

    #[test]
    fn test_new_canvas_starts_idle() {
        let canvas = GraphCanvas::new(true);
        assert!(canvas.show_grid);
        assert!(!canvas.interaction.is_dragging());
        assert_eq!(canvas.viewport, Viewport::default());
    }
}
