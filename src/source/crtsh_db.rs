use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use std::time::Duration;

use crate::error::{CrawlError, CrawlResult};
use crate::parse::NameKind;
use crate::source::{AuthorityUnit, CrawlJob, Page, PageSource, SeedTerm};

/// Matches identities against the seed bound at `param`. Keyword seeds use
/// LIKE so upstream wildcards (`%`) pass through untouched.
fn identity_filter(seed: &SeedTerm, param: &str) -> String {
    match seed {
        SeedTerm::Keyword(_) => format!("lower(ci.NAME_VALUE) LIKE lower({})", param),
        SeedTerm::Organization(_) => {
            format!("ci.NAME_TYPE = 'organizationName' AND lower(ci.NAME_VALUE) = lower({})", param)
        }
    }
}

fn group_query(seed: &SeedTerm) -> String {
    format!(
        "SELECT ci.ISSUER_CA_ID::bigint, count(DISTINCT ci.CERTIFICATE_ID)::bigint \
         FROM certificate_identity ci \
         WHERE {} \
         GROUP BY ci.ISSUER_CA_ID",
        identity_filter(seed, "$1")
    )
}

fn page_query(seed: &SeedTerm, kind: NameKind) -> String {
    let names = match kind {
        NameKind::San => "x509_altNames(c.CERTIFICATE, 2, TRUE)",
        NameKind::CommonName => "x509_nameAttributes(c.CERTIFICATE, 'commonName', TRUE)",
    };
    // ORDER BY on the id keeps OFFSET/LIMIT stable between pages
    format!(
        "SELECT c.ID, {} \
         FROM certificate c WHERE c.ID IN ( \
           SELECT DISTINCT ci.CERTIFICATE_ID FROM certificate_identity ci \
           WHERE ci.ISSUER_CA_ID = $1 AND {} \
         ) \
         ORDER BY c.ID DESC OFFSET $3 LIMIT $4",
        names,
        identity_filter(seed, "$2")
    )
}

/// Paginated queries against the public certwatch replica behind crt.sh.
pub struct CertwatchSource {
    pool: PgPool,
    page_size: u32,
}

impl CertwatchSource {
    /// Connections are opened on first use.
    pub fn connect_lazy(database_url: &str, max_connections: u32, page_size: u32, timeout: Duration) -> CrawlResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(timeout)
            .connect_lazy(database_url)?;
        Ok(Self { pool, page_size: page_size.max(1) })
    }
}

#[async_trait]
impl PageSource for CertwatchSource {
    async fn authorities(&self, seed: &SeedTerm) -> CrawlResult<Vec<AuthorityUnit>> {
        tracing::debug!("Grouping certwatch identities for {} by issuer", seed);
        let rows = sqlx::query(&group_query(seed))
            .bind(seed.value())
            .persistent(false)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> CrawlResult<AuthorityUnit> {
                let estimated: i64 = row.try_get(1)?;
                Ok(AuthorityUnit {
                    authority_id: row.try_get(0)?,
                    estimated_records: estimated.max(0) as u64,
                })
            })
            .collect()
    }

    async fn discover(&self, unit: &AuthorityUnit, seed: &SeedTerm) -> CrawlResult<Vec<CrawlJob>> {
        // Each unit is paged twice, once per name kind
        Ok([NameKind::San, NameKind::CommonName]
            .into_iter()
            .map(|kind| CrawlJob::Slice {
                authority_id: unit.authority_id,
                seed: seed.clone(),
                kind,
                offset: 0,
            })
            .collect())
    }

    async fn fetch_page(&self, job: &CrawlJob) -> CrawlResult<Page> {
        let (authority_id, seed, kind, offset) = match job {
            CrawlJob::Slice { authority_id, seed, kind, offset } => (*authority_id, seed, *kind, *offset),
            CrawlJob::Record { .. } => {
                return Err(CrawlError::Coordinator("certwatch source cannot serve record jobs".into()))
            }
        };

        let rows = sqlx::query(&page_query(seed, kind))
            .bind(authority_id)
            .bind(seed.value())
            .bind(i64::try_from(offset).unwrap_or(i64::MAX))
            .bind(i64::from(self.page_size))
            .persistent(false)
            .fetch_all(&self.pool)
            .await?;

        let mut names = Vec::with_capacity(rows.len());
        for row in &rows {
            // Not every certificate carries the attribute
            if let Some(name) = row.try_get::<Option<String>, _>(1)? {
                names.push(name);
            }
        }
        tracing::debug!(authority_id, ?kind, offset, rows = rows.len(), "certwatch page");
        Ok(Page { names, records: rows.len(), exhausted: rows.is_empty() })
    }

    fn estimated_jobs(&self, units: &[AuthorityUnit]) -> usize {
        units.len() * 2
    }
}
