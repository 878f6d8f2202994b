use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::retry::{Backoff, RetryPolicy};

/// Which upstream strategy feeds the crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// crt.sh web endpoint: discover record ids, then fetch each detail page
    Web,
    /// crt.sh certwatch replica: paginated SQL queries
    Db,
}

/// How the wait between two fetch attempts grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    Fixed,
    /// Starts at `retry_delay_ms`, doubles per retry up to `retry_max_delay_ms`
    Exponential,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceKind,
    pub crtsh_url: String,
    pub database_url: String,
    pub page_size: u32,
    /// Estimated records handled by one worker; the pool size is derived from it.
    pub records_per_worker: u64,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub retry_backoff: BackoffKind,
    pub retry_max_delay_ms: u64,
    pub max_connections: u32,
    pub result_queue_capacity: usize,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceKind::Db,
            crtsh_url: "https://crt.sh".to_string(),
            database_url: "postgres://guest@crt.sh:5432/certwatch".to_string(),
            page_size: 2000,
            records_per_worker: crate::partition::RECORDS_PER_WORKER,
            retry_attempts: 2,
            retry_delay_ms: 5_000,
            retry_backoff: BackoffKind::Fixed,
            retry_max_delay_ms: 60_000,
            max_connections: 16,
            result_queue_capacity: 10_000,
            timeout_secs: 60,
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let initial = Duration::from_millis(self.retry_delay_ms);
        let backoff = match self.retry_backoff {
            BackoffKind::Fixed => Backoff::Fixed(initial),
            BackoffKind::Exponential => Backoff::Exponential {
                initial,
                max: Duration::from_millis(self.retry_max_delay_ms).max(initial),
            },
        };
        RetryPolicy::new(self.retry_attempts, backoff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: Config = serde_json::from_str(r#"{"source":"web","page_size":500}"#).unwrap();
        assert_eq!(cfg.source, SourceKind::Web);
        assert_eq!(cfg.page_size, 500);
        assert_eq!(cfg.records_per_worker, 10_000);
        assert_eq!(cfg.retry_policy().max_attempts(), 2);
        assert_eq!(cfg.retry_policy().backoff(), Backoff::Fixed(Duration::from_secs(5)));
    }

    #[test]
    fn exponential_backoff_from_json() {
        let cfg: Config = serde_json::from_str(
            r#"{"retry_attempts":4,"retry_backoff":"exponential","retry_delay_ms":1000,"retry_max_delay_ms":3000}"#,
        )
        .unwrap();
        let policy = cfg.retry_policy();
        assert_eq!(policy.max_attempts(), 4);
        assert_eq!(
            policy.backoff(),
            Backoff::Exponential { initial: Duration::from_secs(1), max: Duration::from_secs(3) }
        );
        assert_eq!(policy.backoff().delay(3), Duration::from_secs(3));
    }
}
