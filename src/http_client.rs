use reqwest::{Client, ClientBuilder};
use std::time::Duration;

pub const USER_AGENT: &str = concat!("san_crawler/", env!("CARGO_PKG_VERSION"));

/// HTTP client for crt.sh: pooled keep-alive connections, compression, rustls.
pub fn create_client(timeout_secs: u64, max_idle_connections: usize) -> reqwest::Result<Client> {
    ClientBuilder::new()
        // Connection pooling - every worker hits the same host
        .pool_max_idle_per_host(max_idle_connections)
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .tcp_nodelay(true)

        // Timeouts; crt.sh group queries for large organizations are slow
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))

        // Compression
        .gzip(true)
        .brotli(true)

        .use_rustls_tls()
        .redirect(reqwest::redirect::Policy::limited(5))
        .user_agent(USER_AGENT)
        .build()
}

/// Client used once to read the peer certificate of a user supplied URL.
pub fn create_tls_probe_client(timeout_secs: u64) -> reqwest::Result<Client> {
    ClientBuilder::new()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .use_rustls_tls()
        .tls_info(true)
        .user_agent(USER_AGENT)
        .build()
}
