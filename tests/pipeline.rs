use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use url::Url;

use dorkhunt::config::{Config, ExecutionMode};
use dorkhunt::core::{Endpoint, PlanOptions, Query};
use dorkhunt::engine::{build_tasks, Dispatcher, HeaderSet, IdentityRotator, Pipeline, TaskOutcome};
use dorkhunt::osint::{Category, Extractor};
use dorkhunt::reporting::{EngineTally, HtmlArchive};
use dorkhunt::utils::{FetchError, FetchResponse, Fetcher};
use dorkhunt::DorkHuntError;

/// Answers by host and records what it saw
struct FakeFetcher {
    responses: HashMap<String, Result<String, FetchError>>,
    latency: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
    agents: Mutex<Vec<String>>,
}

impl FakeFetcher {
    fn new(latency: Duration) -> Self {
        Self {
            responses: HashMap::new(),
            latency,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            agents: Mutex::new(Vec::new()),
        }
    }

    fn respond(mut self, engine: &str, body: &str) -> Self {
        self.responses.insert(format!("{}.test", engine), Ok(body.to_string()));
        self
    }

    fn fail(mut self, engine: &str) -> Self {
        self.responses
            .insert(format!("{}.test", engine), Err(FetchError::Transport("connection refused".to_string())));
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn get(&self, url: &Url, headers: &HeaderSet, _timeout: Duration) -> Result<FetchResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.agents.lock().push(headers.user_agent().unwrap_or_default().to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let host = url.host_str().unwrap_or_default();
        match self.responses.get(host) {
            Some(Ok(body)) => Ok(FetchResponse { status: 200, body: body.clone() }),
            Some(Err(e)) => Err(e.clone()),
            None => Ok(FetchResponse { status: 404, body: String::new() }),
        }
    }
}

fn config(engines: &[&str], mode: ExecutionMode, max_concurrency: usize) -> Config {
    let mut config = Config::builtin().unwrap();
    config.engines = engines
        .iter()
        .map(|id| (id.to_string(), format!("https://{}.test/search?q={{query}}", id)))
        .collect::<BTreeMap<_, _>>();
    config.dispatch.mode = mode;
    config.dispatch.max_concurrency = max_concurrency;
    config.dispatch.min_delay_ms = 0;
    config.dispatch.max_delay_ms = 0;
    config.dispatch.timeout_secs = 5;
    config.identity.seed = Some(7);
    config
}

fn engines(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

#[tokio::test]
async fn single_engine_email_hunt() {
    let fake = Arc::new(
        FakeFetcher::new(Duration::ZERO).respond("e1", "contact a@b.com or ip 10.0.0.1 token=abcd1234efgh"),
    );
    let pipeline = Pipeline::new(&config(&["e1"], ExecutionMode::Sequential, 1), fake.clone()).unwrap();

    let snapshot = pipeline
        .run("a@b.com", &PlanOptions::default(), &engines(&["e1"]), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(snapshot.get(Category::Emails), ["a@b.com"]);
    assert_eq!(snapshot.get(Category::Ips), ["10.0.0.1"]);
    assert_eq!(snapshot.get(Category::Secrets), ["token=abcd1234efgh"]);
    assert_eq!(snapshot.findings().len(), 3);
    assert_eq!(snapshot.total_count(), 3);
    assert_eq!(snapshot.run.tasks_failed, 0);
    assert!(!snapshot.run.cancelled);
    assert_eq!(fake.calls(), snapshot.run.tasks_total);
}

#[tokio::test]
async fn failing_engine_does_not_lose_other_results() {
    let fake = Arc::new(
        FakeFetcher::new(Duration::from_millis(2))
            .fail("x")
            .respond("y", "reach admin@corp.com")
            .respond("z", "dump at https://paste.test/raw/abc and 192.168.1.10"),
    );
    let pipeline = Pipeline::new(&config(&["x", "y", "z"], ExecutionMode::Parallel, 4), fake).unwrap();

    let snapshot = pipeline
        .run("johndoe", &PlanOptions::default(), &[], CancellationToken::new())
        .await
        .unwrap();

    let per_engine = snapshot.run.tasks_total / 3;
    assert_eq!(snapshot.run.tasks_failed, per_engine);
    assert_eq!(snapshot.run.tasks_succeeded, per_engine * 2);
    assert_eq!(snapshot.get(Category::Emails), ["admin@corp.com"]);
    assert_eq!(snapshot.get(Category::Ips), ["192.168.1.10"]);
    assert_eq!(snapshot.get(Category::Urls), ["https://paste.test/raw/abc"]);

    let ok = EngineTally { succeeded: per_engine, failed: 0 };
    assert_eq!(snapshot.run.engines["x"], EngineTally { succeeded: 0, failed: per_engine });
    assert_eq!(snapshot.run.engines["y"], ok);
    assert_eq!(snapshot.run.engines["z"], ok);
}

#[tokio::test]
async fn parallel_dispatch_respects_concurrency_bound() {
    let fake = Arc::new(FakeFetcher::new(Duration::from_millis(20)).respond("e1", "a@b.com"));
    let settings = config(&["e1"], ExecutionMode::Parallel, 3).dispatch;

    let pool = vec![HeaderSet::new().with("User-Agent", "ua")];
    let dispatcher = Dispatcher::new(
        fake.clone(),
        IdentityRotator::new(pool, 10, 1).unwrap(),
        Extractor::default(),
        settings,
    );

    let queries: Vec<Query> = (0..20).map(|i| Query::from(format!("q{}", i))).collect();
    let endpoint = Arc::new(Endpoint::new("e1", "https://e1.test/?q={query}").unwrap());
    let tasks = build_tasks(&queries, &[endpoint]);
    assert_eq!(tasks.len(), 20);

    let mut rx = dispatcher.dispatch(tasks, CancellationToken::new());
    let mut settled = 0;
    while rx.recv().await.is_some() {
        settled += 1;
    }

    assert_eq!(settled, 20);
    assert_eq!(fake.calls(), 20);
    let peak = fake.peak.load(Ordering::SeqCst);
    assert!(peak <= 3, "observed {} concurrent requests", peak);
    assert!(peak > 1, "requests never overlapped");
}

#[tokio::test]
async fn blank_target_dispatches_nothing() {
    let fake = Arc::new(FakeFetcher::new(Duration::ZERO).respond("e1", "a@b.com"));
    let pipeline = Pipeline::new(&config(&["e1"], ExecutionMode::Parallel, 2), fake.clone()).unwrap();

    for target in ["", "   "] {
        let result = pipeline
            .run(target, &PlanOptions::default(), &[], CancellationToken::new())
            .await;
        assert!(matches!(result, Err(DorkHuntError::EmptyTarget)));
    }
    assert_eq!(fake.calls(), 0);
}

#[tokio::test]
async fn sequential_and_parallel_agree() {
    let build = || {
        Arc::new(
            FakeFetcher::new(Duration::from_millis(1))
                .respond("e1", "a@b.com 10.0.0.1")
                .respond("e2", "c@d.org token=abcd1234efgh see https://x.test/a")
                .fail("e3"),
        )
    };
    let options = PlanOptions {
        deep_mode: true,
        ..Default::default()
    };
    let ids = engines(&["e1", "e2", "e3"]);

    let sequential = Pipeline::new(&config(&["e1", "e2", "e3"], ExecutionMode::Sequential, 1), build())
        .unwrap()
        .run("a@b.com", &options, &ids, CancellationToken::new())
        .await
        .unwrap();
    let parallel = Pipeline::new(&config(&["e1", "e2", "e3"], ExecutionMode::Parallel, 5), build())
        .unwrap()
        .run("a@b.com", &options, &ids, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(sequential.findings(), parallel.findings());
    assert_eq!(sequential.total_count(), parallel.total_count());
    assert_eq!(sequential.run.tasks_failed, parallel.run.tasks_failed);
}

#[tokio::test]
async fn cancellation_keeps_settled_results() {
    for (mode, concurrency) in [(ExecutionMode::Sequential, 1), (ExecutionMode::Parallel, 2)] {
        let fake = Arc::new(FakeFetcher::new(Duration::from_millis(50)).respond("e1", "a@b.com"));
        let pipeline = Pipeline::new(&config(&["e1"], mode, concurrency), fake.clone()).unwrap();
        let options = PlanOptions {
            deep_mode: true,
            ..Default::default()
        };

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(80)).await;
            trigger.cancel();
        });

        let snapshot = pipeline.run("johndoe", &options, &[], cancel).await.unwrap();

        assert!(snapshot.run.cancelled, "{:?} run not marked cancelled", mode);
        assert!(snapshot.run.tasks_succeeded >= 1);
        assert!(snapshot.run.tasks_succeeded < snapshot.run.tasks_total);
        assert_eq!(fake.calls(), snapshot.run.tasks_succeeded);
        assert_eq!(snapshot.get(Category::Emails), ["a@b.com"]);
    }
}

#[tokio::test]
async fn saved_bodies_cover_successful_tasks() {
    let dir = tempfile::tempdir().unwrap();
    let fake = Arc::new(
        FakeFetcher::new(Duration::ZERO)
            .respond("e1", "<p>a@b.com</p>")
            .fail("e2"),
    );
    let archive = HtmlArchive::new(dir.path(), "a@b.com");
    let archive_dir = archive.dir().to_path_buf();

    let pipeline = Pipeline::new(&config(&["e1", "e2"], ExecutionMode::Sequential, 1), fake)
        .unwrap()
        .with_html_archive(archive);
    let snapshot = pipeline
        .run("a@b.com", &PlanOptions::default(), &[], CancellationToken::new())
        .await
        .unwrap();

    let mut saved: Vec<_> = std::fs::read_dir(&archive_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    saved.sort();

    assert_eq!(saved.len(), snapshot.run.tasks_succeeded);
    assert!(saved.iter().all(|name| name.ends_with("_e1.html")));
    let body = std::fs::read_to_string(archive_dir.join(&saved[0])).unwrap();
    assert_eq!(body, "<p>a@b.com</p>");
}

#[tokio::test]
async fn identity_rotates_per_window_and_replays_with_seed() {
    async fn agents(seed: u64) -> Vec<String> {
        let fake = Arc::new(FakeFetcher::new(Duration::ZERO).respond("e1", ""));
        let pool = (0..6)
            .map(|i| HeaderSet::new().with("User-Agent", &format!("agent-{}", i)))
            .collect();
        let settings = config(&["e1"], ExecutionMode::Sequential, 1).dispatch;

        let dispatcher = Dispatcher::new(
            fake.clone(),
            IdentityRotator::new(pool, 10, seed).unwrap(),
            Extractor::default(),
            settings,
        );

        let queries: Vec<Query> = (0..30).map(|i| Query::from(format!("q{}", i))).collect();
        let endpoint = Arc::new(Endpoint::new("e1", "https://e1.test/?q={query}").unwrap());
        let mut rx = dispatcher.dispatch(build_tasks(&queries, &[endpoint]), CancellationToken::new());

        let mut outcomes: Vec<TaskOutcome> = Vec::new();
        while let Some(outcome) = rx.recv().await {
            outcomes.push(outcome);
        }
        assert_eq!(outcomes.len(), 30);

        let seen = fake.agents.lock().clone();
        seen
    }

    let first = agents(2024).await;
    for window in first.chunks(10) {
        assert!(window.iter().all(|agent| agent == &window[0]));
    }

    assert_eq!(agents(2024).await, first);
}
