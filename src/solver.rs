//! HTTP transport to the external analysis service

use std::fmt;
use std::time::Duration;

use log::{error, info};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::AppConfig;
use crate::constants::solver::{CHARACTERISTIC_PATH, SOLVE_PATH};
use crate::payload::SolveRequest;
use crate::results::SolveResponse;
use crate::stability::{StabilityRequest, StabilityResponse};

/// Message shown for any failure that is not the solver's own report
pub const GENERIC_FAILURE: &str = "Failed to fetch results from API";

/// Message shown when Analyze is pressed on a graph without branches
pub const NO_DATA: &str = "No edge data available to process";

/// Why an analysis produced no result
#[derive(Debug, Clone, PartialEq)]
pub enum SolverError {
    /// The request never completed (connection refused, timeout, ...)
    Transport(String),
    /// The service answered with a non-2xx status
    Status(u16),
    /// The body was not the expected JSON shape
    Decode(String),
    /// The service ran and reported a failure of its own
    Reported(String),
    /// Nothing to send; no request was issued
    NoData,
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverError::Transport(detail) => write!(f, "{}: {}", GENERIC_FAILURE, detail),
            SolverError::Status(code) => {
                write!(f, "{}: API returned error status: {}", GENERIC_FAILURE, code)
            }
            SolverError::Decode(detail) => write!(f, "{}: {}", GENERIC_FAILURE, detail),
            SolverError::Reported(message) => f.write_str(message),
            SolverError::NoData => f.write_str(NO_DATA),
        }
    }
}

impl std::error::Error for SolverError {}

/// Anything able to answer the two solver endpoints
pub trait SolverTransport: Send + Sync {
    fn solve(&self, request: &SolveRequest) -> Result<SolveResponse, SolverError>;

    fn solve_characteristic(
        &self,
        request: &StabilityRequest,
    ) -> Result<StabilityResponse, SolverError>;
}

/// Blocking JSON client for the analysis service
pub struct HttpSolver {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpSolver {
    /// Builds a client against the configured base URL
    pub fn new(config: &AppConfig) -> Result<Self, SolverError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| SolverError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.solver_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post<B, R>(&self, path: &str, body: &B) -> Result<R, SolverError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        info!("POST {}", url);

        let response = self.client.post(&url).json(body).send().map_err(|e| {
            error!("Request to {} failed: {}", url, e);
            SolverError::Transport(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            error!("{} answered with status {}", url, status);
            return Err(SolverError::Status(status.as_u16()));
        }

        response.json::<R>().map_err(|e| {
            error!("Could not decode response from {}: {}", url, e);
            SolverError::Decode(e.to_string())
        })
    }
}

impl SolverTransport for HttpSolver {
    fn solve(&self, request: &SolveRequest) -> Result<SolveResponse, SolverError> {
        self.post(SOLVE_PATH, request)
    }

    fn solve_characteristic(
        &self,
        request: &StabilityRequest,
    ) -> Result<StabilityResponse, SolverError> {
        self.post(CHARACTERISTIC_PATH, request)
    }
}
