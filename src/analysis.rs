//! Analysis request lifecycle
//!
//! Each Analyze press issues a ticket. The request runs on a worker thread
//! and its outcome comes back over a channel tagged with that ticket; only
//! the outcome of the most recently issued ticket is ever applied, so a
//! slow earlier request can not overwrite a newer result.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};

use crate::graph::{Sequence, SignalGraph};
use crate::payload;
use crate::results::{self, ResultView};
use crate::solver::{SolverError, SolverTransport};
use crate::stability::{CharacteristicForm, StabilityReport};

/// Identifies one issued request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket(u64);

/// Observable state of a request slot
#[derive(Debug, Clone, PartialEq)]
pub enum RequestState<T> {
    Idle,
    Pending,
    Failed(String),
    Succeeded(T),
}

/// Tracks the latest request of one kind and discards superseded outcomes
#[derive(Debug)]
pub struct RequestTracker<T> {
    tickets: Sequence,
    latest: Option<RequestTicket>,
    state: RequestState<T>,
}

impl<T> RequestTracker<T> {
    pub fn new() -> Self {
        Self {
            tickets: Sequence::starting_at(0),
            latest: None,
            state: RequestState::Idle,
        }
    }

    /// Issues a new ticket, superseding any outstanding one
    pub fn begin(&mut self) -> RequestTicket {
        let ticket = RequestTicket(self.tickets.next());
        self.latest = Some(ticket);
        self.state = RequestState::Pending;
        ticket
    }

    /// Applies an outcome if `ticket` is still the latest. Returns whether it was applied.
    pub fn resolve(&mut self, ticket: RequestTicket, outcome: Result<T, SolverError>) -> bool {
        if self.latest != Some(ticket) {
            warn!("Discarding response to superseded request {:?}", ticket);
            return false;
        }
        self.latest = None;
        self.state = match outcome {
            Ok(value) => RequestState::Succeeded(value),
            Err(error) => RequestState::Failed(error.to_string()),
        };
        true
    }

    /// Fails immediately without issuing a request
    pub fn reject(&mut self, error: SolverError) {
        let ticket = self.begin();
        self.resolve(ticket, Err(error));
    }

    /// Returns to idle; anything still in flight will be ignored
    pub fn dismiss(&mut self) {
        self.latest = None;
        self.state = RequestState::Idle;
    }

    pub fn state(&self) -> &RequestState<T> {
        &self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, RequestState::Pending)
    }
}

impl<T> Default for RequestTracker<T> {
    fn default() -> Self {
        Self::new()
    }
}

enum Completion {
    Solve(RequestTicket, Result<ResultView, SolverError>),
    Stability(RequestTicket, Result<StabilityReport, SolverError>),
}

/// Runs solver requests in the background and keeps their state
pub struct AnalysisRunner {
    transport: Arc<dyn SolverTransport>,
    solve: RequestTracker<ResultView>,
    stability: RequestTracker<StabilityReport>,
    sender: Sender<Completion>,
    receiver: Receiver<Completion>,
}

impl AnalysisRunner {
    pub fn new(transport: Arc<dyn SolverTransport>) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            transport,
            solve: RequestTracker::new(),
            stability: RequestTracker::new(),
            sender,
            receiver,
        }
    }

    /// Snapshots the graph and posts it. An empty edge set fails locally.
    pub fn analyze(&mut self, graph: &SignalGraph) -> Option<RequestTicket> {
        let request = payload::build_request(graph);
        if request.is_empty() {
            info!("Analyze requested on a graph without branches");
            self.solve.reject(SolverError::NoData);
            return None;
        }

        let ticket = self.solve.begin();
        info!("Analyzing {} branches ({:?})", request.edges.len(), ticket);
        let transport = Arc::clone(&self.transport);
        let sender = self.sender.clone();
        thread::spawn(move || {
            let outcome = transport
                .solve(&request)
                .and_then(|response| results::interpret(&response));
            // The receiver only disappears when the editor shuts down
            let _ = sender.send(Completion::Solve(ticket, outcome));
        });
        Some(ticket)
    }

    /// Posts the characteristic equation collected by `form`
    pub fn check_stability(&mut self, form: &CharacteristicForm) -> RequestTicket {
        let request = form.request();
        let order = form.order();
        let ticket = self.stability.begin();
        info!("Checking stability of order {} polynomial ({:?})", order, ticket);
        let transport = Arc::clone(&self.transport);
        let sender = self.sender.clone();
        thread::spawn(move || {
            let outcome = transport
                .solve_characteristic(&request)
                .map(|response| StabilityReport::from_response(&response, order));
            let _ = sender.send(Completion::Stability(ticket, outcome));
        });
        ticket
    }

    fn apply(&mut self, completion: Completion) -> bool {
        match completion {
            Completion::Solve(ticket, outcome) => self.solve.resolve(ticket, outcome),
            Completion::Stability(ticket, outcome) => self.stability.resolve(ticket, outcome),
        }
    }

    /// Applies every finished request without blocking. Returns how many were applied.
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.receiver.try_recv() {
            if self.apply(completion) {
                applied += 1;
            }
        }
        if applied > 0 {
            debug!("Applied {} analysis results", applied);
        }
        applied
    }

    /// Waits up to `timeout` for one request to finish. Returns false on timeout.
    pub fn wait_one(&mut self, timeout: Duration) -> bool {
        match self.receiver.recv_timeout(timeout) {
            Ok(completion) => {
                self.apply(completion);
                true
            }
            Err(_) => false,
        }
    }

    pub fn solve_state(&self) -> &RequestState<ResultView> {
        self.solve.state()
    }

    pub fn stability_state(&self) -> &RequestState<StabilityReport> {
        self.stability.state()
    }

    /// True while an Analyze request is outstanding
    pub fn is_solving(&self) -> bool {
        self.solve.is_pending()
    }

    pub fn is_busy(&self) -> bool {
        self.solve.is_pending() || self.stability.is_pending()
    }

    pub fn dismiss_results(&mut self) {
        self.solve.dismiss();
    }

    pub fn dismiss_stability(&mut self) {
        self.stability.dismiss();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::SolveRequest;
    use crate::results::SolveResponse;
    use crate::stability::{StabilityRequest, StabilityResponse};
    use egui::Pos2;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers with the branch count as the transfer function. Single
    /// branch requests are held back so they finish after larger ones.
    #[derive(Default)]
    struct ScriptedSolver {
        calls: AtomicUsize,
        report_failure: bool,
    }

    impl SolverTransport for ScriptedSolver {
        fn solve(&self, request: &SolveRequest) -> Result<SolveResponse, SolverError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if request.edges.len() == 1 {
                thread::sleep(Duration::from_millis(200));
            }
            let body = if self.report_failure {
                serde_json::json!({ "success": false, "error": "No forward paths found" })
            } else {
                serde_json::json!({ "success": true, "result": request.edges.len() })
            };
            serde_json::from_value(body).map_err(|e| SolverError::Decode(e.to_string()))
        }

        fn solve_characteristic(
            &self,
            request: &StabilityRequest,
        ) -> Result<StabilityResponse, SolverError> {
            Ok(StabilityResponse {
                message: "The system is stable.".to_string(),
                poles: Some(vec![]),
                matrix: Some(vec![request.coeffs.clone()]),
            })
        }
    }

    fn connected_graph() -> SignalGraph {
        let mut graph = SignalGraph::new();
        graph.add_node(Pos2::ZERO);
        graph.add_node(Pos2::new(100.0, 0.0));
        graph.add_edge(0, 1);
        graph
    }

    #[test]
    fn test_tracker_discards_superseded_outcome() {
        let mut tracker: RequestTracker<u32> = RequestTracker::new();
        assert_eq!(tracker.state(), &RequestState::Idle);

        let first = tracker.begin();
        let second = tracker.begin();
        assert!(tracker.is_pending());

        assert!(tracker.resolve(second, Ok(2)));
        assert!(!tracker.resolve(first, Ok(1)));
        assert_eq!(tracker.state(), &RequestState::Succeeded(2));
    }

    #[test]
    fn test_tracker_dismiss_ignores_late_outcome() {
        let mut tracker: RequestTracker<u32> = RequestTracker::new();
        let ticket = tracker.begin();
        tracker.dismiss();
        assert!(!tracker.resolve(ticket, Ok(5)));
        assert_eq!(tracker.state(), &RequestState::Idle);
    }

    #[test]
    fn test_empty_graph_short_circuits() {
        let solver = Arc::new(ScriptedSolver::default());
        let mut runner = AnalysisRunner::new(solver.clone());

        assert!(runner.analyze(&SignalGraph::new()).is_none());
        assert_eq!(
            runner.solve_state(),
            &RequestState::Failed("No edge data available to process".to_string())
        );
        assert_eq!(solver.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_late_response_does_not_overwrite_newer_one() {
        let mut runner = AnalysisRunner::new(Arc::new(ScriptedSolver::default()));
        let mut graph = connected_graph();

        runner.analyze(&graph);
        graph.add_edge(1, 0);
        runner.analyze(&graph);

        assert!(runner.wait_one(Duration::from_secs(5)));
        assert!(runner.wait_one(Duration::from_secs(5)));

        match runner.solve_state() {
            RequestState::Succeeded(view) => {
                assert_eq!(view.transfer_function.as_deref(), Some("2"))
            }
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[test]
    fn test_reported_failure_is_shown_verbatim() {
        let solver = ScriptedSolver {
            calls: AtomicUsize::new(0),
            report_failure: true,
        };
        let mut runner = AnalysisRunner::new(Arc::new(solver));
        runner.analyze(&connected_graph());
        assert!(runner.is_solving());
        assert!(runner.wait_one(Duration::from_secs(5)));
        assert_eq!(
            runner.solve_state(),
            &RequestState::Failed("No forward paths found".to_string())
        );
    }

    #[test]
    fn test_stability_round_trip() {
        let mut runner = AnalysisRunner::new(Arc::new(ScriptedSolver::default()));
        let mut form = CharacteristicForm::new(1);
        form.fields_mut()[0] = "2".into();
        form.fields_mut()[1] = "3".into();

        runner.check_stability(&form);
        assert!(runner.is_busy());
        // Only the stability slot is pending, Analyze stays available
        assert!(!runner.is_solving());
        assert!(runner.wait_one(Duration::from_secs(5)));

        match runner.stability_state() {
            RequestState::Succeeded(report) => {
                assert!(report.stable);
                assert_eq!(report.routh_rows[0].label, "Row 1");
                assert_eq!(report.routh_rows[0].cells, vec!["2.000", "3.000"]);
            }
            other => panic!("unexpected state {:?}", other),
        }
    }
}
