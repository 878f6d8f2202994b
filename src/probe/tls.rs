use anyhow::{anyhow, Context};
use reqwest::tls::TlsInfo;
use x509_parser::prelude::*;

/// First Organization attribute of the leaf certificate served at `url`.
pub async fn extract_organization(client: &reqwest::Client, url: &str) -> anyhow::Result<String> {
    let resp = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("could not connect to {}", url))?;

    let der = resp
        .extensions()
        .get::<TlsInfo>()
        .and_then(|info| info.peer_certificate())
        .ok_or_else(|| anyhow!("{} does not use TLS", url))?;

    organization_from_der(der)?.ok_or_else(|| anyhow!("certificate served by {} has no organization", url))
}

/// Only the first organization is used when a subject carries several.
pub fn organization_from_der(der: &[u8]) -> anyhow::Result<Option<String>> {
    let (_, cert) = X509Certificate::from_der(der).map_err(|e| anyhow!("invalid peer certificate: {}", e))?;
    let org = cert
        .subject()
        .iter_organization()
        .next()
        .and_then(|attr| attr.as_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    Ok(org)
}
