// src/engine/pipeline.rs
use std::sync::Arc;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, debug, warn};

use crate::config::Config;
use crate::core::{EndpointRegistry, PlanOptions, QueryPlanner, Target};
use crate::error::DorkHuntResult;
use crate::reporting::{HtmlArchive, RunInfo, Snapshot};
use crate::utils::Fetcher;
use super::aggregator::Aggregator;
use super::dispatcher::Dispatcher;
use super::task::{build_tasks, Task, TaskStatus};

/// Plan, dispatch, extract and aggregate one hunt
pub struct Pipeline {
    planner: QueryPlanner,
    registry: EndpointRegistry,
    dispatcher: Dispatcher,
    archive: Option<HtmlArchive>,
}

impl Pipeline {
    pub fn new(config: &Config, fetcher: Arc<dyn Fetcher>) -> DorkHuntResult<Self> {
        Self::with_seed(config, fetcher, None)
    }

    /// Like `new`, with a fixed identity rotation seed
    pub fn with_seed(config: &Config, fetcher: Arc<dyn Fetcher>, seed: Option<u64>) -> DorkHuntResult<Self> {
        Ok(Self::from_parts(
            QueryPlanner::from_config(config),
            EndpointRegistry::from_config(&config.engines),
            Dispatcher::from_config(config, fetcher, seed)?,
        ))
    }

    pub fn from_parts(planner: QueryPlanner, registry: EndpointRegistry, dispatcher: Dispatcher) -> Self {
        Self {
            planner,
            registry,
            dispatcher,
            archive: None,
        }
    }

    /// Also write every successful response body into `archive`
    pub fn with_html_archive(mut self, archive: HtmlArchive) -> Self {
        self.dispatcher = self.dispatcher.keep_bodies(true);
        self.archive = Some(archive);
        self
    }

    pub fn planner(&self) -> &QueryPlanner {
        &self.planner
    }

    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    /// Classify the target and build its task list. Fails only on a blank
    /// target; unknown engines are skipped.
    pub fn plan(&self, raw_target: &str, options: &PlanOptions, engines: &[String]) -> DorkHuntResult<(Target, Vec<Task>)> {
        let (target, queries) = self.planner.plan_str(raw_target, options)?;
        let endpoints = self.registry.select(engines);

        if endpoints.is_empty() {
            warn!("No usable engines selected, nothing will be dispatched");
        }

        let tasks = build_tasks(&queries, &endpoints);
        info!("{} queries x {} engines = {} tasks", queries.len(), endpoints.len(), tasks.len());

        Ok((target, tasks))
    }

    /// Run a hunt to completion or cancellation. Results of every task that
    /// settled are kept in the snapshot either way.
    pub async fn run(
        &self,
        raw_target: &str,
        options: &PlanOptions,
        engines: &[String],
        cancel: CancellationToken,
    ) -> DorkHuntResult<Snapshot> {
        let (target, tasks) = self.plan(raw_target, options, engines)?;
        let total = tasks.len();

        let mut run = RunInfo::new(target.value(), target.kind(), total);
        info!("Starting run {} for {}", run.run_id, target);

        let aggregator = Aggregator::new();
        let mut outcomes = self.dispatcher.dispatch(tasks, cancel);
        let mut settled = 0;

        while let Some(outcome) = outcomes.recv().await {
            settled += 1;

            match outcome.result {
                Ok(result) => {
                    run.record(outcome.task.engine(), true);
                    info!(
                        "[{}/{}] {}: {} ({} found)",
                        settled, total, outcome.task.engine(), outcome.task.query, result.total()
                    );
                    aggregator.merge(result);
                    debug!("Task {} {:?}", outcome.task.id, TaskStatus::Merged);

                    if let (Some(archive), Some(body)) = (&self.archive, &outcome.body) {
                        if let Err(e) = archive.save(outcome.task.id, outcome.task.engine(), body).await {
                            warn!("Failed to save response body of task {}: {}", outcome.task.id, e);
                        }
                    }
                }
                Err(reason) => {
                    run.record(outcome.task.engine(), false);
                    info!(
                        "[{}/{}] {}: {} failed ({})",
                        settled, total, outcome.task.engine(), outcome.task.query, reason
                    );
                }
            }
        }

        run.cancelled = settled < total;
        run.finished_at = Utc::now();

        if run.cancelled {
            warn!("Run cancelled after {}/{} tasks", settled, total);
        }

        let snapshot = aggregator.finalize(run);
        info!(
            "Run {} finished: {} indicators, {}/{} tasks succeeded",
            snapshot.run.run_id,
            snapshot.total_count(),
            snapshot.run.tasks_succeeded,
            total
        );

        Ok(snapshot)
    }
}
