//! Upstream certificate sources.
//!
//! Both strategies answer the same three questions: which issuing authorities
//! hold records for a seed, which jobs an authority expands into, and what
//! names one job yields.

pub mod crtsh_db;
pub mod crtsh_web;

use async_trait::async_trait;
use std::fmt;

use crate::error::CrawlResult;
use crate::parse::NameKind;

pub use crtsh_db::CertwatchSource;
pub use crtsh_web::CrtShWebSource;

/// How the seed term is matched upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedTerm {
    /// Matched against any certificate field.
    Keyword(String),
    /// Matched against the subject's organization only.
    Organization(String),
}

impl SeedTerm {
    pub fn value(&self) -> &str {
        match self {
            SeedTerm::Keyword(s) | SeedTerm::Organization(s) => s,
        }
    }
}

impl fmt::Display for SeedTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedTerm::Keyword(s) => write!(f, "keyword '{}'", s),
            SeedTerm::Organization(s) => write!(f, "organization '{}'", s),
        }
    }
}

/// Records sharing one issuing authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorityUnit {
    pub authority_id: i64,
    pub estimated_records: u64,
}

/// One unit of fetchable work. Owned by exactly one worker once dequeued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlJob {
    /// A single certificate detail page.
    Record { id: i64 },
    /// One page of a paginated query over an authority's records.
    Slice {
        authority_id: i64,
        seed: SeedTerm,
        kind: NameKind,
        offset: u64,
    },
}

impl CrawlJob {
    /// The job that continues this one after a page of `fetched` records.
    pub fn advance(&self, fetched: usize) -> Option<CrawlJob> {
        match self {
            CrawlJob::Record { .. } => None,
            CrawlJob::Slice { authority_id, seed, kind, offset } => Some(CrawlJob::Slice {
                authority_id: *authority_id,
                seed: seed.clone(),
                kind: *kind,
                offset: offset + fetched as u64,
            }),
        }
    }
}

/// Names produced by a single fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub names: Vec<String>,
    /// Upstream rows consumed by this page; drives the next offset.
    pub records: usize,
    pub exhausted: bool,
}

#[async_trait]
pub trait PageSource: Send + Sync {
    /// Group all records matching `seed` by issuing authority.
    async fn authorities(&self, seed: &SeedTerm) -> CrawlResult<Vec<AuthorityUnit>>;

    /// Expand one authority into the jobs the workers will drain.
    async fn discover(&self, unit: &AuthorityUnit, seed: &SeedTerm) -> CrawlResult<Vec<CrawlJob>>;

    /// Fetch one job. Retrying is the caller's business.
    async fn fetch_page(&self, job: &CrawlJob) -> CrawlResult<Page>;

    /// Upper bound on the jobs `discover` produces for `units`, used to size the job queue.
    fn estimated_jobs(&self, units: &[AuthorityUnit]) -> usize;
}
