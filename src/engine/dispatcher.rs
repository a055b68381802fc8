// src/engine/dispatcher.rs
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use futures::future::join_all;
use rand::Rng;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{info, debug, warn, error};
use url::Url;

use crate::config::{Config, DispatchConfig, ExecutionMode};
use crate::error::DorkHuntResult;
use crate::osint::Extractor;
use crate::utils::Fetcher;
use super::identity::{HeaderSet, IdentityRotator};
use super::task::{FailureReason, Task, TaskOutcome, TaskStatus};

/// Runs tasks against their endpoints under a bounded, rate-limited schedule.
///
/// Cloning is cheap; clones share the fetcher, identity rotator, extractor
/// and request counter.
#[derive(Clone)]
pub struct Dispatcher {
    fetcher: Arc<dyn Fetcher>,
    rotator: Arc<IdentityRotator>,
    extractor: Arc<Extractor>,
    settings: DispatchConfig,
    next_request: Arc<AtomicU64>,
    keep_bodies: bool,
}

impl Dispatcher {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        rotator: IdentityRotator,
        extractor: Extractor,
        settings: DispatchConfig,
    ) -> Self {
        Self {
            fetcher,
            rotator: Arc::new(rotator),
            extractor: Arc::new(extractor),
            settings,
            next_request: Arc::new(AtomicU64::new(0)),
            keep_bodies: false,
        }
    }

    /// Hand successful response bodies back with their outcomes
    pub fn keep_bodies(mut self, keep: bool) -> Self {
        self.keep_bodies = keep;
        self
    }

    /// Dispatcher with the configured identity pool and default matchers
    pub fn from_config(config: &Config, fetcher: Arc<dyn Fetcher>, seed: Option<u64>) -> DorkHuntResult<Self> {
        let rotator = IdentityRotator::from_config(&config.identity, seed)?;
        Ok(Self::new(fetcher, rotator, Extractor::default(), config.dispatch.clone()))
    }

    /// Start dispatching in the background. Outcomes arrive in completion
    /// order; the channel closes once every admitted task has settled.
    /// After `cancel` fires no further task is admitted.
    pub fn dispatch(&self, tasks: Vec<Task>, cancel: CancellationToken) -> mpsc::Receiver<TaskOutcome> {
        let (tx, rx) = mpsc::channel(self.settings.max_concurrency.max(1));
        let dispatcher = self.clone();

        tokio::spawn(async move {
            match dispatcher.settings.mode {
                ExecutionMode::Sequential => dispatcher.run_sequential(tasks, tx, cancel).await,
                ExecutionMode::Parallel => dispatcher.run_parallel(tasks, tx, cancel).await,
            }
        });

        rx
    }

    async fn run_sequential(&self, tasks: Vec<Task>, tx: mpsc::Sender<TaskOutcome>, cancel: CancellationToken) {
        info!("Dispatching {} tasks sequentially", tasks.len());

        let mut pending = tasks.into_iter();
        while let Some(task) = pending.next() {
            if cancel.is_cancelled() {
                info!("Cancelled, {} tasks not admitted", pending.len() + 1);
                return;
            }

            let request_index = self.admit(&task);
            let outcome = self.execute(task, request_index, &cancel).await;
            if tx.send(outcome).await.is_err() {
                warn!("Outcome receiver dropped, stopping dispatch");
                return;
            }

            if pending.len() > 0 {
                self.politeness_delay(&cancel).await;
            }
        }
    }

    async fn run_parallel(&self, tasks: Vec<Task>, tx: mpsc::Sender<TaskOutcome>, cancel: CancellationToken) {
        let max_concurrency = self.settings.max_concurrency.max(1);
        info!("Dispatching {} tasks with max concurrency {}", tasks.len(), max_concurrency);

        let semaphore = Arc::new(Semaphore::new(max_concurrency));
        let mut handles = Vec::with_capacity(tasks.len());

        // Permits are taken here, in submission order, so admission is FIFO
        let mut pending = tasks.into_iter();
        while let Some(task) = pending.next() {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Cancelled, {} tasks not admitted", pending.len() + 1);
                    break;
                }
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(e) => {
                        error!("Admission gate closed: {}", e);
                        break;
                    }
                },
            };

            let request_index = self.admit(&task);
            let dispatcher = self.clone();
            let tx = tx.clone();
            let cancel = cancel.clone();

            handles.push(tokio::spawn(async move {
                let outcome = dispatcher.execute(task, request_index, &cancel).await;
                if tx.send(outcome).await.is_err() {
                    debug!("Outcome receiver dropped");
                }

                // the slot stays taken for the politeness delay
                dispatcher.politeness_delay(&cancel).await;
                drop(permit);
            }));
        }

        for joined in join_all(handles).await {
            if let Err(e) = joined {
                error!("Dispatch task failed: {}", e);
            }
        }
    }

    fn admit(&self, task: &Task) -> u64 {
        let request_index = self.next_request.fetch_add(1, Ordering::SeqCst);
        debug!("Task {} {:?} as request {}", task.id, TaskStatus::Admitted, request_index);
        request_index
    }

    /// Fetch and extract one task. Retries reuse the identity picked for
    /// `request_index`.
    async fn execute(&self, task: Task, request_index: u64, cancel: &CancellationToken) -> TaskOutcome {
        let started = Instant::now();
        let identity = self.rotator.identity_for(request_index);

        let mut attempts = 0;
        let result = match task.endpoint.url_for(task.query.as_str()) {
            Ok(url) => loop {
                attempts += 1;
                debug!(
                    "Task {} {:?} attempt {} -> {} ({})",
                    task.id,
                    TaskStatus::InFlight,
                    attempts,
                    task.engine(),
                    identity.user_agent().unwrap_or("-")
                );

                match self.fetch_once(&url, identity).await {
                    Err(reason)
                        if reason.is_transient()
                            && attempts <= self.settings.max_retries
                            && !cancel.is_cancelled() =>
                    {
                        let backoff = self.settings.min_delay() * attempts;
                        warn!(
                            "{} failed on {} ({}), retry {}/{} in {:?}",
                            task.query, task.engine(), reason, attempts, self.settings.max_retries, backoff
                        );

                        tokio::select! {
                            _ = cancel.cancelled() => break Err(reason),
                            _ = tokio::time::sleep(backoff) => {}
                        }
                    }
                    other => break other,
                }
            },
            Err(e) => Err(FailureReason::Transport(e.to_string())),
        };

        let (result, body) = match result {
            Ok(body) => {
                debug!("Task {} {:?} ({} bytes)", task.id, TaskStatus::Completed, body.len());
                let extracted = self.extractor.extract(&body);
                debug!("Task {} {:?} {} indicators", task.id, TaskStatus::Extracted, extracted.total());
                (Ok(extracted), self.keep_bodies.then_some(body))
            }
            Err(reason) => {
                warn!("Task {} {:?}: {} on {}: {}", task.id, TaskStatus::Failed, task.query, task.engine(), reason);
                (Err(reason), None)
            }
        };

        TaskOutcome {
            task,
            request_index,
            result,
            body,
            attempts,
            elapsed: started.elapsed(),
        }
    }

    async fn fetch_once(&self, url: &Url, identity: &HeaderSet) -> Result<String, FailureReason> {
        let timeout = self.settings.timeout();

        match tokio::time::timeout(timeout, self.fetcher.get(url, identity, timeout)).await {
            Err(_) => Err(FailureReason::Timeout),
            Ok(Err(e)) => Err(e.into()),
            Ok(Ok(response)) if response.is_success() => Ok(response.body),
            Ok(Ok(response)) => Err(FailureReason::HttpStatus(response.status)),
        }
    }

    // kept sync so the thread-local rng never lives across an await
    fn draw_delay(&self) -> Duration {
        let min = self.settings.min_delay_ms;
        let max = self.settings.max_delay_ms;
        if max <= min {
            return Duration::from_millis(min);
        }
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }

    async fn politeness_delay(&self, cancel: &CancellationToken) {
        let delay = self.draw_delay();
        if delay.is_zero() {
            return;
        }

        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
