// src/engine/task.rs
use std::sync::Arc;
use std::time::Duration;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::{Endpoint, Query};
use crate::osint::ExtractionResult;
use crate::utils::FetchError;

/// One (query, endpoint) pair, the unit of dispatch
#[derive(Debug, Clone)]
pub struct Task {
    /// Position in the planned task list
    pub id: usize,
    pub query: Arc<Query>,
    pub endpoint: Arc<Endpoint>,
}

impl Task {
    pub fn engine(&self) -> &str {
        &self.endpoint.id
    }
}

/// Lifecycle of a task
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TaskStatus {
    Admitted,
    InFlight,
    Completed,
    Failed,
    Extracted,
    Merged,
}

/// Why a task produced no body
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    #[error("timeout")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("http status {0}")]
    HttpStatus(u16),
}

impl FailureReason {
    /// Worth another attempt: timeouts, transport errors, 429 and 5xx
    pub fn is_transient(&self) -> bool {
        match self {
            FailureReason::Timeout | FailureReason::Transport(_) => true,
            FailureReason::HttpStatus(code) => *code == 429 || (500..600).contains(code),
        }
    }
}

impl From<FetchError> for FailureReason {
    fn from(error: FetchError) -> Self {
        match error {
            FetchError::Timeout => FailureReason::Timeout,
            FetchError::Transport(message) => FailureReason::Transport(message),
        }
    }
}

/// Settled task handed back by the dispatcher
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    pub task: Task,
    /// Global request index the identity was chosen from
    pub request_index: u64,
    pub result: Result<ExtractionResult, FailureReason>,
    /// Raw response body, kept only when the dispatcher retains bodies
    pub body: Option<String>,
    pub attempts: u32,
    pub elapsed: Duration,
}

impl TaskOutcome {
    pub fn status(&self) -> TaskStatus {
        match self.result {
            Ok(_) => TaskStatus::Extracted,
            Err(_) => TaskStatus::Failed,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Cartesian product of queries and endpoints, query-major
pub fn build_tasks(queries: &[Query], endpoints: &[Arc<Endpoint>]) -> Vec<Task> {
    let mut tasks = Vec::with_capacity(queries.len() * endpoints.len());

    for query in queries {
        let query = Arc::new(query.clone());
        for endpoint in endpoints {
            tasks.push(Task {
                id: tasks.len(),
                query: query.clone(),
                endpoint: endpoint.clone(),
            });
        }
    }

    tasks
}
