//! Saving the canonical edge list and an SVG picture of the diagram

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use egui::{Pos2, Rect, Vec2};
use log::info;

use crate::constants::canvas::{LABEL_LIFT, NODE_RADIUS};
use crate::geometry::{branch_curves, EdgeCurve};
use crate::graph::{Branch, SignalGraph};
use crate::payload;

const SVG_MARGIN: f32 = 40.0;

/// The solver request body, pretty printed
pub fn edge_list_json(graph: &SignalGraph) -> Result<String> {
    serde_json::to_string_pretty(&payload::build_request(graph))
        .context("Failed to serialize edge list")
}

pub fn save_edge_list(path: &Path, graph: &SignalGraph) -> Result<()> {
    let json = edge_list_json(graph)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Saved {} branches to {}", graph.edges().len(), path.display());
    Ok(())
}

fn bounds(graph: &SignalGraph, curves: &[(&Branch, EdgeCurve)]) -> Rect {
    let mut rect = Rect::NOTHING;
    for node in graph.nodes() {
        rect.extend_with(node.position);
    }
    for (_, curve) in curves {
        if curve.is_curved() {
            rect.extend_with(curve.control);
        }
    }
    if rect.is_negative() {
        return Rect::from_min_size(Pos2::ZERO, Vec2::splat(2.0 * SVG_MARGIN));
    }
    rect.expand(NODE_RADIUS + SVG_MARGIN)
}

/// Standalone SVG drawing of nodes, branches, arrowheads and gain labels
pub fn svg_snapshot(graph: &SignalGraph) -> String {
    let curves = branch_curves(graph);
    let view = bounds(graph, &curves);

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{} {} {} {}">"#,
        view.min.x,
        view.min.y,
        view.width(),
        view.height()
    );
    svg.push_str("  <g stroke=\"#555\" fill=\"none\">\n");
    for (edge, curve) in &curves {
        let _ = writeln!(svg, r#"    <path id="{}" d="{}"/>"#, edge.id, curve.path());
        let arrow = curve.arrow_path();
        if !arrow.is_empty() {
            let _ = writeln!(svg, r##"    <path d="{}" fill="#555"/>"##, arrow);
        }
    }
    svg.push_str("  </g>\n");

    svg.push_str("  <g font-family=\"sans-serif\" font-size=\"12\" text-anchor=\"middle\">\n");
    for (edge, curve) in &curves {
        let _ = writeln!(
            svg,
            r#"    <text x="{}" y="{}">{}</text>"#,
            curve.label.x,
            curve.label.y - LABEL_LIFT,
            edge.function_id
        );
    }
    for node in graph.nodes() {
        let _ = writeln!(
            svg,
            r##"    <circle cx="{}" cy="{}" r="{}" fill="#fff" stroke="#333"/>"##,
            node.position.x, node.position.y, NODE_RADIUS
        );
        let _ = writeln!(
            svg,
            r#"    <text x="{}" y="{}" dominant-baseline="middle">{}</text>"#,
            node.position.x, node.position.y, node.display_name
        );
    }
    svg.push_str("  </g>\n</svg>\n");
    svg
}

pub fn save_svg(path: &Path, graph: &SignalGraph) -> Result<()> {
    std::fs::write(path, svg_snapshot(graph))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Saved diagram to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_node_graph() -> SignalGraph {
        let mut graph = SignalGraph::new();
        graph.add_node(Pos2::new(0.0, 0.0));
        graph.add_node(Pos2::new(100.0, 0.0));
        let id = graph.add_edge(0, 1).function_id;
        graph.set_gain(id, "3");
        graph
    }

    #[test]
    fn test_edge_list_json_matches_request_body() {
        let json = edge_list_json(&two_node_graph()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["edges"][0]["from"], "N0");
        assert_eq!(value["edges"][0]["gain"], 3.0);
    }

    #[test]
    fn test_svg_contains_curve_arrow_and_labels() {
        let svg = svg_snapshot(&two_node_graph());
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"d="M 0,0 Q 50,-30 100,0""#));
        assert!(svg.contains(" Z\""));
        assert!(svg.contains(">g1</text>"));
        assert!(svg.contains(">N1</text>"));
    }

    #[test]
    fn test_empty_graph_still_renders() {
        let svg = svg_snapshot(&SignalGraph::new());
        assert!(svg.contains("viewBox=\"0 0 80 80\""));
    }

    #[test]
    fn test_save_edge_list_writes_file() {
        let path = std::env::temp_dir().join(format!("sfg-studio-{}-edges.json", std::process::id()));
        save_edge_list(&path, &two_node_graph()).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(written.contains("\"edges\""));
    }
}
