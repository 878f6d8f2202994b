use thiserror::Error;

/// Fatal crawl failures, tagged by the phase that produced them.
#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("partition failed: {0}")]
    Partition(String),

    #[error("discovery failed for authority {authority_id}: {message}")]
    Discovery { authority_id: i64, message: String },

    #[error("page fetch failed: {0}")]
    PageFetch(String),

    #[error("repair failed: {0}")]
    Repair(String),

    #[error("coordinator error: {0}")]
    Coordinator(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl CrawlError {
    /// Short phase label used in the final diagnostic.
    pub fn phase(&self) -> &'static str {
        match self {
            CrawlError::Partition(_) => "partition",
            CrawlError::Discovery { .. } => "discovery",
            CrawlError::PageFetch(_) | CrawlError::Http(_) | CrawlError::Database(_) => "page fetch",
            CrawlError::Repair(_) => "repair",
            CrawlError::Coordinator(_) => "coordinator",
        }
    }
}

pub type CrawlResult<T> = Result<T, CrawlError>;
