use std::sync::Arc;
use std::time::Duration;

use san_crawler::http_client::create_client;
use san_crawler::retry::{Backoff, RetryPolicy};
use san_crawler::source::CrtShWebSource;
use san_crawler::{CrawlCoordinator, CrawlError, SeedTerm, SourcePartitioner};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn cert_page(subject: &str, sans: &[&str]) -> String {
    let mut body = String::from(
        "<TD CLASS=\"text\">Issuer:<BR>&nbsp;&nbsp;&nbsp;&nbsp;commonName&nbsp;=&nbsp;Example Issuing CA<BR>",
    );
    body.push_str(&format!("Subject:<BR>&nbsp;&nbsp;&nbsp;&nbsp;commonName&nbsp;=&nbsp;{}<BR>", subject));
    body.push_str("X509v3 Subject Alternative Name:<BR>");
    for san in sans {
        body.push_str(&format!("&nbsp;&nbsp;&nbsp;&nbsp;DNS:{}<BR>", san));
    }
    body.push_str("</TD>");
    body
}

async fn mount_get(server: &MockServer, key: &str, value: &str, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param(key, value))
        .respond_with(template)
        .mount(server)
        .await;
}

async fn mock_crtsh() -> MockServer {
    let server = MockServer::start().await;

    // group=icaid answers with concatenated objects, not an array
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("O", "Example Inc"))
        .and(query_param("group", "icaid"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"issuer_ca_id":16418,"num_certs":2}{"issuer_ca_id":183267,"num_certs":1}"#,
        ))
        .mount(&server)
        .await;

    mount_get(&server, "icaid", "16418", ResponseTemplate::new(200).set_body_string(r#"[{"id":101},{"id":102},{"id":101}]"#)).await;
    mount_get(&server, "icaid", "183267", ResponseTemplate::new(200).set_body_string(r#"{"id":201}"#)).await;

    mount_get(&server, "id", "101", ResponseTemplate::new(200).set_body_string(cert_page("www.Example.com", &["www.example.com", "example.com"]))).await;
    mount_get(&server, "id", "102", ResponseTemplate::new(200).set_body_string(cert_page("mail.example.com", &["mail.example.com"]))).await;
    server
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(2, Backoff::Fixed(Duration::from_millis(10)))
}

#[tokio::test]
async fn crawls_organization_end_to_end() {
    let server = mock_crtsh().await;
    // First hit on record 201 is rate limited; the retry succeeds
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("id", "201"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_get(&server, "id", "201", ResponseTemplate::new(200).set_body_string(cert_page("VPN.example.org", &["vpn.example.org"]))).await;

    let source = Arc::new(CrtShWebSource::new(create_client(10, 4).unwrap(), &server.uri()));
    let seed = SeedTerm::Organization("Example Inc".into());

    let partition = SourcePartitioner::new(source.as_ref(), 10_000).partition(&seed).await.unwrap();
    assert_eq!(partition.units.len(), 2);
    assert_eq!(partition.total_records(), 3);
    assert_eq!(partition.worker_count, 1);

    let report = CrawlCoordinator::new(source.clone(), fast_retry(), 16)
        .crawl(&seed, &partition.units, 2)
        .await
        .unwrap();

    let mut names: Vec<&str> = report.names.iter().map(String::as_str).collect();
    names.sort();
    assert_eq!(names, vec!["example.com", "mail.example.com", "vpn.example.org", "www.example.com"]);
    assert_eq!(report.stats.jobs, 3);
    assert!(!names.contains(&"example issuing ca"));
}

#[tokio::test]
async fn persistent_rate_limiting_is_fatal() {
    let server = mock_crtsh().await;
    mount_get(&server, "id", "201", ResponseTemplate::new(429)).await;

    let source = Arc::new(CrtShWebSource::new(create_client(10, 4).unwrap(), &server.uri()));
    let seed = SeedTerm::Organization("Example Inc".into());
    let partition = SourcePartitioner::new(source.as_ref(), 10_000).partition(&seed).await.unwrap();

    let result = CrawlCoordinator::new(source.clone(), fast_retry(), 16)
        .crawl(&seed, &partition.units, 1)
        .await;
    assert!(matches!(result, Err(CrawlError::PageFetch(_))));
}

#[tokio::test]
async fn garbage_partition_payload_is_a_repair_error() {
    let server = MockServer::start().await;
    mount_get(&server, "q", "%.example.com", ResponseTemplate::new(200).set_body_string("<html>Service Unavailable</html>")).await;

    let source = CrtShWebSource::new(create_client(10, 4).unwrap(), &server.uri());
    let result = SourcePartitioner::new(&source, 10_000)
        .partition(&SeedTerm::Keyword("%.example.com".into()))
        .await;
    assert!(matches!(result, Err(CrawlError::Repair(_))));
}

#[tokio::test]
async fn failed_partition_lookup_is_fatal() {
    let server = MockServer::start().await;
    mount_get(&server, "q", "acme", ResponseTemplate::new(502)).await;

    let source = CrtShWebSource::new(create_client(10, 4).unwrap(), &server.uri());
    let result = SourcePartitioner::new(&source, 10_000)
        .partition(&SeedTerm::Keyword("acme".into()))
        .await;
    assert!(matches!(result, Err(CrawlError::Partition(_))));
}
