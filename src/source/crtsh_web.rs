use ahash::AHashSet;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{CrawlError, CrawlResult};
use crate::parse::{decode_objects, extract, NameKind};
use crate::source::{AuthorityUnit, CrawlJob, Page, PageSource, SeedTerm};

#[derive(Debug, Deserialize)]
struct AuthorityRow {
    #[serde(alias = "issuer_ca_id")]
    issuer_authority_id: i64,
    num_certs: u64,
}

#[derive(Debug, Deserialize)]
struct RecordRow {
    id: i64,
}

/// Discovery+fetch over the crt.sh web endpoint: list record ids per
/// authority, then scrape each certificate page.
pub struct CrtShWebSource {
    client: Client,
    base_url: String,
}

impl CrtShWebSource {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: format!("{}/", base_url.trim_end_matches('/')),
        }
    }

    fn seed_param(seed: &SeedTerm) -> &'static str {
        match seed {
            SeedTerm::Keyword(_) => "q",
            SeedTerm::Organization(_) => "O",
        }
    }

    async fn get_bytes(&self, query: &[(&str, String)]) -> CrawlResult<Vec<u8>> {
        let resp = self.client.get(&self.base_url).query(query).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CrawlError::PageFetch(format!("crt.sh returned status {}", status)));
        }
        Ok(resp.bytes().await?.to_vec())
    }
}

#[async_trait]
impl PageSource for CrtShWebSource {
    async fn authorities(&self, seed: &SeedTerm) -> CrawlResult<Vec<AuthorityUnit>> {
        tracing::debug!("Grouping crt.sh records for {} by issuer", seed);
        let body = self
            .get_bytes(&[
                (Self::seed_param(seed), seed.value().to_string()),
                ("group", "icaid".to_string()),
                ("output", "json".to_string()),
            ])
            .await?;
        let rows: Vec<AuthorityRow> = decode_objects(&body)?;
        Ok(rows
            .into_iter()
            .map(|r| AuthorityUnit {
                authority_id: r.issuer_authority_id,
                estimated_records: r.num_certs,
            })
            .collect())
    }

    async fn discover(&self, unit: &AuthorityUnit, seed: &SeedTerm) -> CrawlResult<Vec<CrawlJob>> {
        // One request sized to the whole unit so discovery never paginates
        let body = self
            .get_bytes(&[
                (Self::seed_param(seed), seed.value().to_string()),
                ("icaid", unit.authority_id.to_string()),
                ("output", "json".to_string()),
                ("limit", unit.estimated_records.to_string()),
            ])
            .await?;
        let rows: Vec<RecordRow> = decode_objects(&body)?;

        let mut seen = AHashSet::new();
        let mut jobs: Vec<CrawlJob> = rows
            .into_iter()
            .filter(|r| seen.insert(r.id))
            .map(|r| CrawlJob::Record { id: r.id })
            .collect();

        let cap = usize::try_from(unit.estimated_records).unwrap_or(usize::MAX);
        if jobs.len() > cap {
            tracing::warn!(
                authority_id = unit.authority_id,
                found = jobs.len(),
                estimated = cap,
                "discovery returned more records than estimated, truncating"
            );
            jobs.truncate(cap);
        }
        Ok(jobs)
    }

    async fn fetch_page(&self, job: &CrawlJob) -> CrawlResult<Page> {
        let id = match job {
            CrawlJob::Record { id } => *id,
            CrawlJob::Slice { .. } => {
                return Err(CrawlError::Coordinator("web source cannot serve paginated slices".into()))
            }
        };
        let body = self.get_bytes(&[("id", id.to_string())]).await?;
        let text = String::from_utf8_lossy(&body);

        let mut names = extract(&text, NameKind::CommonName);
        names.extend(extract(&text, NameKind::San));
        Ok(Page { names, records: 1, exhausted: true })
    }

    fn estimated_jobs(&self, units: &[AuthorityUnit]) -> usize {
        units
            .iter()
            .map(|u| usize::try_from(u.estimated_records).unwrap_or(usize::MAX))
            .fold(0usize, |acc, n| acc.saturating_add(n))
    }
}
