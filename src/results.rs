//! Interpretation of the solver's response into display tables
//!
//! The response is nested and partially optional. Nothing here computes
//! anything beyond pairing arrays by index: every section whose inputs are
//! present becomes a two-column table, every missing input just drops its
//! section.

use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::solver::SolverError;

/// A scalar the solver may send as a number or as preformatted text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Number(value) => write!(f, "{}", value),
            Scalar::Text(text) => f.write_str(text),
        }
    }
}

/// Node names along a path or loop
pub type NodeSequence = Vec<String>;

/// Body returned by `POST /solve`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolveResponse {
    pub success: Option<bool>,
    /// The same flag under the name the reference backend uses
    pub solved: Option<bool>,
    pub result: Option<Scalar>,
    pub delta: Option<Scalar>,
    pub deltas: Option<Vec<f64>>,
    #[serde(rename = "Forward_paths_gains")]
    pub forward_path_gains: Option<Vec<f64>>,
    #[serde(rename = "Forward_paths_nodes")]
    pub forward_path_nodes: Option<Vec<NodeSequence>>,
    /// Tier k lists the groups of k+1 mutually non-touching loops
    pub loop_pairs: Option<Vec<Option<Vec<Vec<NodeSequence>>>>>,
    pub loop_pairs_gains: Option<Vec<Option<Vec<f64>>>>,
    pub error: Option<String>,
}

impl SolveResponse {
    /// The failure message the solver reported, if this is a reported failure
    pub fn reported_error(&self) -> Option<&str> {
        match (self.success.or(self.solved), &self.error) {
            (Some(true), _) => None,
            (_, Some(error)) => Some(error),
            _ => None,
        }
    }

    /// Loop tier `index` and its gains, when both are present
    fn loop_tier(&self, index: usize) -> Option<(&[Vec<NodeSequence>], &[f64])> {
        let entries = self.loop_pairs.as_ref()?.get(index)?.as_ref()?;
        let gains = self.loop_pairs_gains.as_ref()?.get(index)?.as_ref()?;
        Some((entries.as_slice(), gains.as_slice()))
    }
}

/// One row of a loop table.
///
/// Single loops arrive wrapped one level deeper than loop groups, so the
/// two shapes are kept apart instead of sharing one nested type.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopEntry {
    /// `loop_pairs[0][i]`, sent as `[[a, b, ...]]`
    Single(NodeSequence),
    /// `loop_pairs[1..][i]`, sent as `[[a, b, ...], [c, d, ...], ...]`
    Group(Vec<NodeSequence>),
}

impl LoopEntry {
    /// Types a raw entry according to the tier it came from
    pub fn from_wire(tier: usize, mut raw: Vec<NodeSequence>) -> Self {
        if tier == 0 {
            if raw.len() > 1 {
                warn!("Single loop entry carries {} sequences, using the first", raw.len());
            }
            let first = if raw.is_empty() {
                Vec::new()
            } else {
                raw.swap_remove(0)
            };
            LoopEntry::Single(first)
        } else {
            LoopEntry::Group(raw)
        }
    }

    pub fn describe(&self) -> String {
        match self {
            LoopEntry::Single(nodes) => format_path(nodes),
            LoopEntry::Group(loops) => loops
                .iter()
                .map(|nodes| format_path(nodes))
                .collect::<Vec<_>>()
                .join(" & "),
        }
    }
}

/// Joins node names with arrows
pub fn format_path(nodes: &[String]) -> String {
    nodes.join(" → ")
}

/// Which part of the response a table was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    ForwardPaths,
    /// Groups of this many non-touching loops (1 for individual loops)
    Loops(usize),
    PathDeltas,
}

impl SectionKind {
    pub fn title(&self) -> String {
        match self {
            SectionKind::ForwardPaths => "Forward Paths".to_string(),
            SectionKind::Loops(1) => "Individual Loops".to_string(),
            SectionKind::Loops(n) => format!("{} Non-Touching Loops", n),
            SectionKind::PathDeltas => "Delta Values for Each Forward Path".to_string(),
        }
    }

    pub fn headers(&self) -> [&'static str; 2] {
        match self {
            SectionKind::ForwardPaths => ["Path", "Gain"],
            SectionKind::Loops(1) => ["Loop", "Gain"],
            SectionKind::Loops(_) => ["Loops", "Gain"],
            SectionKind::PathDeltas => ["Path", "Delta Value"],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultSection {
    pub kind: SectionKind,
    pub rows: Vec<ResultRow>,
}

impl ResultSection {
    pub fn title(&self) -> String {
        self.kind.title()
    }
}

/// Flat, display-ready rendering of a solver response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultView {
    pub transfer_function: Option<String>,
    pub delta: Option<String>,
    pub sections: Vec<ResultSection>,
}

impl ResultView {
    pub fn section(&self, kind: SectionKind) -> Option<&ResultSection> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.transfer_function.is_none() && self.delta.is_none() && self.sections.is_empty()
    }
}

/// Number of loop tiers the solver reports (groups of 1 to 4 loops)
pub const LOOP_TIERS: usize = 4;

fn zip_rows<L, V>(
    section: &str,
    labels: &[L],
    values: &[V],
    mut row: impl FnMut(&L, &V) -> ResultRow,
) -> Vec<ResultRow> {
    if labels.len() != values.len() {
        warn!(
            "{}: {} entries but {} values, extra entries dropped",
            section,
            labels.len(),
            values.len()
        );
    }
    labels.iter().zip(values).map(|(l, v)| row(l, v)).collect()
}

/// Turns a response into tables, or the solver's own failure message
pub fn interpret(response: &SolveResponse) -> Result<ResultView, SolverError> {
    if let Some(message) = response.reported_error() {
        return Err(SolverError::Reported(message.to_string()));
    }

    let mut view = ResultView {
        transfer_function: response.result.as_ref().map(|r| r.to_string()),
        delta: response.delta.as_ref().map(|d| d.to_string()),
        sections: Vec::new(),
    };

    if let (Some(paths), Some(gains)) = (&response.forward_path_nodes, &response.forward_path_gains) {
        let rows = zip_rows("Forward paths", paths, gains, |path, gain| ResultRow {
            label: format_path(path),
            value: gain.to_string(),
        });
        view.sections.push(ResultSection {
            kind: SectionKind::ForwardPaths,
            rows,
        });
    }

    for tier in 0..LOOP_TIERS {
        let Some((entries, gains)) = response.loop_tier(tier) else {
            continue;
        };
        let kind = SectionKind::Loops(tier + 1);
        let rows = zip_rows(&kind.title(), entries, gains, |entry, gain| ResultRow {
            label: LoopEntry::from_wire(tier, entry.clone()).describe(),
            value: gain.to_string(),
        });
        view.sections.push(ResultSection { kind, rows });
    }

    if let Some(deltas) = response.deltas.as_ref().filter(|d| !d.is_empty()) {
        let rows = deltas
            .iter()
            .enumerate()
            .map(|(index, delta)| ResultRow {
                label: format!("Path {}", index + 1),
                value: delta.to_string(),
            })
            .collect();
        view.sections.push(ResultSection {
            kind: SectionKind::PathDeltas,
            rows,
        });
    }

    Ok(view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> SolveResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_single_loops_are_unwrapped_one_level() {
        let response = parse(json!({
            "success": true,
            "loop_pairs": [[[["A", "B"]]], [[["C", "D"], ["E", "F"]]]],
            "loop_pairs_gains": [[2.0], [6.0]]
        }));
        let view = interpret(&response).unwrap();

        let singles = view.section(SectionKind::Loops(1)).unwrap();
        assert_eq!(singles.rows, vec![ResultRow { label: "A → B".into(), value: "2".into() }]);

        let pairs = view.section(SectionKind::Loops(2)).unwrap();
        assert_eq!(pairs.rows[0].label, "C → D & E → F");
        assert_eq!(pairs.rows[0].value, "6");
        assert_eq!(pairs.title(), "2 Non-Touching Loops");
    }

    #[test]
    fn test_missing_tier_omits_only_that_section() {
        let response = parse(json!({
            "success": true,
            "result": 1.5,
            "delta": -2,
            "deltas": [1, 0.5],
            "Forward_paths_nodes": [["N0", "N1", "N2"], ["N0", "N2"]],
            "Forward_paths_gains": [6, 3],
            "loop_pairs": [[[["N1", "N2", "N1"]]], [], [[["N1", "N1"], ["N2", "N2"], ["N3", "N3"]]]],
            "loop_pairs_gains": [[-1], [], [0.25]]
        }));
        let view = interpret(&response).unwrap();

        assert_eq!(view.transfer_function.as_deref(), Some("1.5"));
        assert_eq!(view.delta.as_deref(), Some("-2"));
        assert!(view.section(SectionKind::Loops(4)).is_none());

        let kinds: Vec<SectionKind> = view.sections.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SectionKind::ForwardPaths,
                SectionKind::Loops(1),
                SectionKind::Loops(2),
                SectionKind::Loops(3),
                SectionKind::PathDeltas,
            ]
        );

        let paths = view.section(SectionKind::ForwardPaths).unwrap();
        assert_eq!(paths.rows[0].label, "N0 → N1 → N2");
        assert_eq!(paths.rows[1].value, "3");
        assert!(view.section(SectionKind::Loops(2)).unwrap().rows.is_empty());
        assert_eq!(
            view.section(SectionKind::Loops(3)).unwrap().rows[0].label,
            "N1 → N1 & N2 → N2 & N3 → N3"
        );

        let deltas = view.section(SectionKind::PathDeltas).unwrap();
        assert_eq!(deltas.rows[1], ResultRow { label: "Path 2".into(), value: "0.5".into() });
    }

    #[test]
    fn test_absent_fields_render_nothing() {
        let view = interpret(&parse(json!({ "success": true }))).unwrap();
        assert!(view.is_empty());

        // Loop tier without its gains is skipped
        let view = interpret(&parse(json!({ "loop_pairs": [[[["A", "A"]]]] }))).unwrap();
        assert!(view.sections.is_empty());
    }

    #[test]
    fn test_reported_failure_surfaces_message() {
        let response = parse(json!({ "success": false, "error": "Expected exactly one start node" }));
        assert_eq!(
            interpret(&response),
            Err(SolverError::Reported("Expected exactly one start node".into()))
        );

        // The reference solver spells the flag `solved`
        let response = parse(json!({ "solved": false, "error": "Graph determinant is zero" }));
        assert_eq!(response.reported_error(), Some("Graph determinant is zero"));
    }

    #[test]
    fn test_both_success_flags_decode() {
        let response = parse(json!({
            "success": false,
            "solved": false,
            "error": "Graph has no forward path"
        }));
        assert_eq!(
            interpret(&response),
            Err(SolverError::Reported("Graph has no forward path".into()))
        );

        let response = parse(json!({ "success": true, "solved": true, "result": 2 }));
        assert_eq!(response.reported_error(), None);
        assert_eq!(interpret(&response).unwrap().transfer_function.as_deref(), Some("2"));
    }

    #[test]
    fn test_text_scalars_are_shown_verbatim() {
        let view = interpret(&parse(json!({ "success": true, "result": "G1*G2/(1-L1)" }))).unwrap();
        assert_eq!(view.transfer_function.as_deref(), Some("G1*G2/(1-L1)"));
    }

    #[test]
    fn test_mismatched_lengths_truncate() {
        let response = parse(json!({
            "Forward_paths_nodes": [["A", "B"], ["A", "C"]],
            "Forward_paths_gains": [4]
        }));
        let view = interpret(&response).unwrap();
        assert_eq!(view.section(SectionKind::ForwardPaths).unwrap().rows.len(), 1);
    }
}
