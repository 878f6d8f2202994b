//! Two-phase crawl: expand every authority into jobs, then drain the job
//! queue with a fixed pool of workers.
//!
//! Workers share one bounded job queue. After discovery the coordinator
//! appends one `Terminate` per worker behind the jobs, so a worker can only
//! observe its signal once every job has been handed out, and always after it
//! finished the job it was holding. Names travel back over a bounded result
//! queue that the coordinator drains while the workers run.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

use crate::concurrent::{ResultAggregator, ResultSet, WorkerPoolState};
use crate::error::{CrawlError, CrawlResult};
use crate::retry::RetryPolicy;
use crate::source::{AuthorityUnit, CrawlJob, PageSource, SeedTerm};

enum Message {
    Job(CrawlJob),
    Terminate,
}

type JobQueue = Arc<Mutex<mpsc::Receiver<Message>>>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    pub units: usize,
    pub jobs: usize,
    pub workers: usize,
    pub pages: usize,
    pub candidates: usize,
}

#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub names: ResultSet,
    pub stats: CrawlStats,
}

pub struct CrawlCoordinator {
    source: Arc<dyn PageSource>,
    retry: RetryPolicy,
    result_capacity: usize,
}

impl CrawlCoordinator {
    pub fn new(source: Arc<dyn PageSource>, retry: RetryPolicy, result_capacity: usize) -> Self {
        Self {
            source,
            retry,
            result_capacity: result_capacity.max(1),
        }
    }

    pub async fn crawl(&self, seed: &SeedTerm, units: &[AuthorityUnit], worker_count: usize) -> CrawlResult<CrawlReport> {
        let worker_count = worker_count.max(1);
        let state = Arc::new(WorkerPoolState::default());

        // Room for every discovered job plus one termination signal per worker
        let capacity = self
            .source
            .estimated_jobs(units)
            .saturating_add(worker_count)
            .clamp(1, tokio::sync::Semaphore::MAX_PERMITS);
        let (job_tx, job_rx) = mpsc::channel::<Message>(capacity);
        let job_rx: JobQueue = Arc::new(Mutex::new(job_rx));

        // Phase 1: discovery
        tracing::info!(units = units.len(), capacity, "starting discovery");
        let mut discovery = JoinSet::new();
        for unit in units.iter().copied() {
            let source = self.source.clone();
            let seed = seed.clone();
            let retry = self.retry;
            let tx = job_tx.clone();
            let state = state.clone();
            discovery.spawn(async move { discover_unit(source.as_ref(), retry, unit, &seed, &tx, &state).await });
        }

        let mut jobs = 0usize;
        while let Some(joined) = discovery.join_next().await {
            jobs += joined.map_err(|e| CrawlError::Coordinator(format!("discovery task panicked: {}", e)))??;
        }
        if state.discovery_completed() != units.len() {
            return Err(CrawlError::Coordinator(format!(
                "{} of {} discovery tasks completed",
                state.discovery_completed(),
                units.len()
            )));
        }
        tracing::info!(jobs, workers = worker_count, "discovery complete, starting workers");

        // Phase 2: crawl
        let (result_tx, mut result_rx) = mpsc::channel::<String>(self.result_capacity);
        let mut workers = JoinSet::new();
        for id in 0..worker_count {
            let source = self.source.clone();
            let retry = self.retry;
            let jobs = job_rx.clone();
            let results = result_tx.clone();
            let state = state.clone();
            workers.spawn(async move { run_worker(id, source.as_ref(), retry, jobs, results, &state).await });
        }
        drop(result_tx);

        for _ in 0..worker_count {
            job_tx
                .send(Message::Terminate)
                .await
                .map_err(|_| CrawlError::Coordinator("job queue closed before shutdown".into()))?;
        }
        drop(job_tx);

        let aggregator = ResultAggregator::new();
        let mut candidates = 0usize;
        let mut finished = 0usize;
        loop {
            tokio::select! {
                Some(name) = result_rx.recv() => {
                    candidates += 1;
                    aggregator.add(&name);
                }
                Some(joined) = workers.join_next() => {
                    joined.map_err(|e| CrawlError::Coordinator(format!("worker panicked: {}", e)))??;
                    finished += 1;
                }
                else => break,
            }
        }

        let queue_drained = job_rx.lock().await.try_recv().is_err();
        if finished != worker_count || state.workers_completed() != worker_count || !queue_drained {
            return Err(CrawlError::Coordinator(format!(
                "crawl ended with {} of {} workers finished (queue drained: {})",
                finished, worker_count, queue_drained
            )));
        }

        let stats = CrawlStats {
            units: units.len(),
            jobs,
            workers: worker_count,
            pages: state.pages_fetched(),
            candidates,
        };
        tracing::info!(?stats, unique = aggregator.len(), "crawl complete");
        Ok(CrawlReport { names: aggregator.snapshot(), stats })
    }
}

async fn discover_unit(
    source: &dyn PageSource,
    retry: RetryPolicy,
    unit: AuthorityUnit,
    seed: &SeedTerm,
    jobs: &mpsc::Sender<Message>,
    state: &WorkerPoolState,
) -> CrawlResult<usize> {
    let found = retry
        .run("discovery", || source.discover(&unit, seed))
        .await
        .map_err(|e| match e {
            CrawlError::Repair(_) => e,
            other => CrawlError::Discovery { authority_id: unit.authority_id, message: other.to_string() },
        })?;

    let n = found.len();
    for job in found {
        // Workers are not running yet, so a full queue would never drain
        jobs.try_send(Message::Job(job)).map_err(|_| CrawlError::Discovery {
            authority_id: unit.authority_id,
            message: "job queue overflow: more jobs than estimated".into(),
        })?;
    }
    let done = state.discovery_done();
    tracing::debug!(authority_id = unit.authority_id, jobs = n, done, "discovery task finished");
    Ok(n)
}

async fn run_worker(
    id: usize,
    source: &dyn PageSource,
    retry: RetryPolicy,
    jobs: JobQueue,
    results: mpsc::Sender<String>,
    state: &WorkerPoolState,
) -> CrawlResult<()> {
    state.worker_started();
    let mut handled = 0usize;
    loop {
        let msg = {
            let mut rx = jobs.lock().await;
            rx.recv().await
        };
        match msg {
            Some(Message::Job(job)) => {
                process_job(source, retry, job, &results, state).await?;
                handled += 1;
            }
            Some(Message::Terminate) | None => break,
        }
    }
    state.worker_done();
    tracing::debug!(worker = id, jobs = handled, active = state.active_workers(), "worker exiting");
    Ok(())
}

/// Fetch a job to exhaustion, following pagination for slice jobs.
async fn process_job(
    source: &dyn PageSource,
    retry: RetryPolicy,
    job: CrawlJob,
    results: &mpsc::Sender<String>,
    state: &WorkerPoolState,
) -> CrawlResult<()> {
    let mut next = Some(job);
    while let Some(job) = next {
        let page = retry
            .run("page fetch", || source.fetch_page(&job))
            .await
            .map_err(|e| match e {
                CrawlError::Repair(_) | CrawlError::PageFetch(_) => e,
                other => CrawlError::PageFetch(format!("{:?}: {}", job, other)),
            })?;
        state.page_fetched();

        for name in page.names {
            results
                .send(name)
                .await
                .map_err(|_| CrawlError::Coordinator("result queue closed".into()))?;
        }

        next = if page.exhausted || page.records == 0 {
            None
        } else {
            job.advance(page.records)
        };
    }
    Ok(())
}
