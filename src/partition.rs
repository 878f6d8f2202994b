use crate::error::{CrawlError, CrawlResult};
use crate::source::{AuthorityUnit, PageSource, SeedTerm};

/// Default for `Config::records_per_worker`. Empirical, not a correctness bound.
pub const RECORDS_PER_WORKER: u64 = 10_000;

/// Authority units for a seed plus the worker-pool size they call for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub units: Vec<AuthorityUnit>,
    pub worker_count: usize,
}

impl Partition {
    pub fn total_records(&self) -> u64 {
        self.units.iter().map(|u| u.estimated_records).sum()
    }
}

/// One worker per `records_per_worker` estimated records, at least one.
pub fn worker_count_for(units: &[AuthorityUnit], records_per_worker: u64) -> usize {
    let total: u64 = units.iter().map(|u| u.estimated_records).sum();
    let n = total / records_per_worker.max(1);
    usize::try_from(n).unwrap_or(usize::MAX).max(1)
}

pub struct SourcePartitioner<'a> {
    source: &'a dyn PageSource,
    records_per_worker: u64,
}

impl<'a> SourcePartitioner<'a> {
    pub fn new(source: &'a dyn PageSource, records_per_worker: u64) -> Self {
        Self { source, records_per_worker }
    }

    /// A failed lookup is fatal; there is no meaningful partial partition.
    pub async fn partition(&self, seed: &SeedTerm) -> CrawlResult<Partition> {
        let units = self.source.authorities(seed).await.map_err(|e| match e {
            CrawlError::Repair(_) => e,
            other => CrawlError::Partition(format!("authority lookup for {} failed: {}", seed, other)),
        })?;

        let worker_count = worker_count_for(&units, self.records_per_worker);
        let partition = Partition { units, worker_count };
        tracing::info!(
            seed = %seed,
            authorities = partition.units.len(),
            records = partition.total_records(),
            workers = worker_count,
            "partitioned search"
        );
        Ok(partition)
    }
}
