pub mod concurrent;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod http_client;
pub mod output;
pub mod parse;
pub mod partition;
pub mod probe;
pub mod retry;
pub mod source;

// re-export the engine surface used by the binary and tests
pub use crate::concurrent::{ResultAggregator, ResultSet};
pub use crate::coordinator::{CrawlCoordinator, CrawlReport, CrawlStats};
pub use crate::error::{CrawlError, CrawlResult};
pub use crate::partition::{Partition, SourcePartitioner};
pub use crate::source::{AuthorityUnit, CrawlJob, Page, PageSource, SeedTerm};
