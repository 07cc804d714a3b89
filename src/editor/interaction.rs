//! Canvas interaction handling (selection, dragging, connections)
//!
//! At most one drag runs at a time. A drag is a value held by the
//! [`InteractionManager`]; ending it, or dropping the manager, releases it.

use egui::{Pos2, Vec2};
use log::debug;

use crate::constants::canvas::NODE_RADIUS;
use crate::geometry::{branch_curves, resolve_control_point};
use crate::graph::{EdgeId, NodeId, SignalGraph};

/// What the user has selected on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    Node(NodeId),
    Edge(EdgeId),
}

/// Reshaping session for one branch's control point
#[derive(Debug, Clone, PartialEq)]
pub struct ControlPointDrag {
    edge: EdgeId,
}

impl ControlPointDrag {
    pub fn edge(&self) -> EdgeId {
        self.edge
    }

    /// Writes the pointer position (graph space) as the new control point
    pub fn update(&self, point: Pos2, graph: &mut SignalGraph) -> Result<(), &'static str> {
        graph.set_control_point(self.edge, point)
    }
}

/// The drag currently in progress
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CanvasDrag {
    #[default]
    Idle,
    Pan,
    Node {
        id: NodeId,
        /// Node position minus pointer position at drag start
        offset: Vec2,
    },
    Connect {
        source: NodeId,
        cursor: Pos2,
    },
    ControlPoint(ControlPointDrag),
}

/// Manages selection and the active drag
#[derive(Debug, Clone, Default)]
pub struct InteractionManager {
    pub selection: Selection,
    drag: CanvasDrag,
}

impl InteractionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drag(&self) -> &CanvasDrag {
        &self.drag
    }

    pub fn is_dragging(&self) -> bool {
        self.drag != CanvasDrag::Idle
    }

    pub fn select_node(&mut self, id: NodeId) {
        self.selection = Selection::Node(id);
    }

    pub fn select_edge(&mut self, id: EdgeId) {
        self.selection = Selection::Edge(id);
    }

    pub fn clear_selection(&mut self) {
        self.selection = Selection::None;
    }

    pub fn selected_edge(&self) -> Option<EdgeId> {
        match self.selection {
            Selection::Edge(id) => Some(id),
            _ => None,
        }
    }

    fn begin(&mut self, drag: CanvasDrag) -> Result<(), &'static str> {
        if self.is_dragging() {
            return Err("Another drag is already active");
        }
        debug!("Drag started: {:?}", drag);
        self.drag = drag;
        Ok(())
    }

    pub fn begin_pan(&mut self) -> Result<(), &'static str> {
        self.begin(CanvasDrag::Pan)
    }

    /// Starts moving a node, keeping the grab offset under the pointer
    pub fn begin_node_drag(
        &mut self,
        id: NodeId,
        pointer: Pos2,
        graph: &SignalGraph,
    ) -> Result<(), &'static str> {
        let node = graph.node(id).ok_or("Node does not exist")?;
        let offset = node.position - pointer;
        self.begin(CanvasDrag::Node { id, offset })?;
        self.select_node(id);
        Ok(())
    }

    /// Starts dragging a new branch out of `source`
    pub fn begin_connect(
        &mut self,
        source: NodeId,
        pointer: Pos2,
        graph: &SignalGraph,
    ) -> Result<(), &'static str> {
        graph.node(source).ok_or("Node does not exist")?;
        self.begin(CanvasDrag::Connect {
            source,
            cursor: pointer,
        })
    }

    /// Starts reshaping a branch. Fails while any other drag is active.
    pub fn begin_control_point_drag(
        &mut self,
        edge: EdgeId,
        graph: &SignalGraph,
    ) -> Result<(), &'static str> {
        graph.edge(edge).ok_or("Branch does not exist")?;
        self.begin(CanvasDrag::ControlPoint(ControlPointDrag { edge }))?;
        self.select_edge(edge);
        Ok(())
    }

    /// Follows the pointer (graph space). Panning is applied by the canvas.
    pub fn update_drag(&mut self, pointer: Pos2, graph: &mut SignalGraph) {
        let result = match &mut self.drag {
            CanvasDrag::Idle | CanvasDrag::Pan => Ok(()),
            CanvasDrag::Node { id, offset } => graph.move_node(*id, pointer + *offset),
            CanvasDrag::Connect { cursor, .. } => {
                *cursor = pointer;
                Ok(())
            }
            CanvasDrag::ControlPoint(session) => session.update(pointer, graph),
        };
        if let Err(reason) = result {
            debug!("Ending drag: {}", reason);
            self.drag = CanvasDrag::Idle;
        }
    }

    /// Ends the active drag. A connection released over a node becomes a
    /// branch, whose id is returned; without a pointer position it is dropped.
    pub fn end_drag(&mut self, pointer: Option<Pos2>, graph: &mut SignalGraph) -> Option<EdgeId> {
        let drag = std::mem::take(&mut self.drag);
        debug!("Drag ended: {:?}", drag);
        match drag {
            CanvasDrag::Connect { source, .. } => {
                let target = node_at(graph, pointer?)?;
                graph.node(source)?;
                let id = graph.add_edge(source, target).id;
                self.select_edge(id);
                Some(id)
            }
            _ => None,
        }
    }

    /// Drops the drag and selection if they refer to something that no longer exists
    pub fn release_stale(&mut self, graph: &SignalGraph) {
        let drag_alive = match &self.drag {
            CanvasDrag::Idle | CanvasDrag::Pan => true,
            CanvasDrag::Node { id, .. } => graph.node(*id).is_some(),
            CanvasDrag::Connect { source, .. } => graph.node(*source).is_some(),
            CanvasDrag::ControlPoint(session) => graph.edge(session.edge()).is_some(),
        };
        if !drag_alive {
            debug!("Releasing stale drag {:?}", self.drag);
            self.drag = CanvasDrag::Idle;
        }

        let selection_alive = match self.selection {
            Selection::None => true,
            Selection::Node(id) => graph.node(id).is_some(),
            Selection::Edge(id) => graph.edge(id).is_some(),
        };
        if !selection_alive {
            self.selection = Selection::None;
        }
    }

    /// Removes whatever is selected. Returns whether the graph changed.
    pub fn delete_selected(&mut self, graph: &mut SignalGraph) -> bool {
        let removed = match self.selection {
            Selection::None => false,
            Selection::Node(id) => graph.remove_node(id).is_some(),
            Selection::Edge(id) => graph.remove_edge(id).is_some(),
        };
        self.selection = Selection::None;
        self.release_stale(graph);
        removed
    }
}

/// Topmost node whose disc contains `point`
pub fn node_at(graph: &SignalGraph, point: Pos2) -> Option<NodeId> {
    graph
        .nodes()
        .filter(|node| (node.position - point).length() <= NODE_RADIUS)
        .last()
        .map(|node| node.id)
}

/// Where a node's outgoing connection handle sits
pub fn output_handle(position: Pos2) -> Pos2 {
    position + Vec2::new(NODE_RADIUS, 0.0)
}

/// Node whose output handle lies within `tolerance` of `point`
pub fn output_handle_at(graph: &SignalGraph, point: Pos2, tolerance: f32) -> Option<NodeId> {
    graph
        .nodes()
        .filter(|node| (output_handle(node.position) - point).length() <= tolerance)
        .last()
        .map(|node| node.id)
}

/// Branch drawn closest to `point`, if within `tolerance`
pub fn edge_at(graph: &SignalGraph, point: Pos2, tolerance: f32) -> Option<EdgeId> {
    branch_curves(graph)
        .into_iter()
        .map(|(edge, curve)| (edge.id, curve.distance_to(point)))
        .filter(|(_, distance)| *distance <= tolerance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}

/// The resolved control point of a branch, where its handle is drawn
pub fn control_handle(graph: &SignalGraph, id: EdgeId) -> Option<Pos2> {
    let edge = graph.edge(id)?;
    let source = graph.node(edge.source)?.position;
    let target = graph.node(edge.target)?.position;
    Some(resolve_control_point(source, target, edge.control_point))
}

/// True when `point` is on the control handle of branch `id`
pub fn handle_at(graph: &SignalGraph, id: EdgeId, point: Pos2, tolerance: f32) -> bool {
    control_handle(graph, id).is_some_and(|handle| (handle - point).length() <= tolerance)
}
