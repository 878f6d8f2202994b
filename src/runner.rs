use anyhow::{anyhow, Context};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cli::Cli;
use san_crawler::config::{Config, SourceKind};
use san_crawler::source::{CertwatchSource, CrtShWebSource};
use san_crawler::{CrawlCoordinator, CrawlError, PageSource, SeedTerm, SourcePartitioner};

fn print_ascii_logo() {
    println!(r#"
  __________
  \\        | SAN CRAWLER v{}
   \\       |   x509 metadata -> names
    \\@@@@@@|
    "#, env!("CARGO_PKG_VERSION"));
}

fn fatal(e: CrawlError) -> anyhow::Error {
    anyhow!("{} phase failed: {}", e.phase(), e)
}

pub async fn run_from_cli(cli: Cli) -> anyhow::Result<()> {
    // Keep reqwest/hyper/sqlx quiet unless we are debugging the crawler itself.
    use tracing_subscriber::EnvFilter;
    let crate_level = if cli.debug { "debug" } else if cli.verbose { "info" } else { "warn" };
    let filter_str = format!(
        "san_crawler={crate},reqwest=info,hyper=info,sqlx=warn",
        crate = crate_level
    );
    let env_filter = EnvFilter::try_new(&filter_str).unwrap_or_else(|_| EnvFilter::new(crate_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(true)
        .with_target(false)
        .init();

    print_ascii_logo();
    let start = Instant::now();

    let mut config = match cli.config.as_deref() {
        Some(path) => Config::from_file(Path::new(path)).with_context(|| format!("failed to load config {}", path))?,
        None => Config::default(),
    };
    if let Some(source) = cli.source {
        config.source = source;
    }

    let seed = resolve_seed(&cli, &config).await?;
    tracing::info!(seed = %seed, source = ?config.source, "SAN crawler running");
    println!("[>] Seed: {}", seed);

    let source: Arc<dyn PageSource> = match config.source {
        SourceKind::Web => {
            let client = san_crawler::http_client::create_client(config.timeout_secs, 32)?;
            Arc::new(CrtShWebSource::new(client, &config.crtsh_url))
        }
        SourceKind::Db => Arc::new(
            CertwatchSource::connect_lazy(
                &config.database_url,
                config.max_connections,
                config.page_size,
                Duration::from_secs(config.timeout_secs),
            )
            .map_err(fatal)?,
        ),
    };

    let partition = SourcePartitioner::new(source.as_ref(), config.records_per_worker)
        .partition(&seed)
        .await
        .map_err(fatal)?;
    let workers = cli.workers.unwrap_or(partition.worker_count).max(1);
    println!(
        "[*] {} authorities, ~{} records, {} workers",
        partition.units.len(),
        partition.total_records(),
        workers
    );

    let coordinator = CrawlCoordinator::new(source.clone(), config.retry_policy(), config.result_queue_capacity);
    let report = coordinator
        .crawl(&seed, &partition.units, workers)
        .await
        .map_err(fatal)?;
    println!("[+] Found: {} unique names", report.names.len());

    if cli.print_stats {
        tracing::info!("Printing domain statistics ...");
        san_crawler::output::log_statistics(&report.names);
    }

    match cli.out.as_deref() {
        Some(out) => {
            tracing::info!(outfile = %out, "Writing results to output file");
            san_crawler::output::write_names(Path::new(out), &report.names)
                .with_context(|| format!("failed to write {}", out))?;
        }
        None => {
            for name in san_crawler::output::sorted_names(&report.names) {
                println!("{}", name);
            }
        }
    }

    tracing::info!(runtime = ?start.elapsed(), stats = ?report.stats, "SAN crawler shutting down");
    Ok(())
}

async fn resolve_seed(cli: &Cli, config: &Config) -> anyhow::Result<SeedTerm> {
    if let Some(keyword) = &cli.keyword {
        return Ok(SeedTerm::Keyword(keyword.clone()));
    }
    if let Some(org) = &cli.org {
        return Ok(SeedTerm::Organization(org.clone()));
    }
    let url = cli.url.as_deref().ok_or_else(|| anyhow!("no seed given"))?;
    let parsed = url::Url::parse(url).with_context(|| format!("invalid URL {}", url))?;
    if parsed.scheme() != "https" {
        return Err(anyhow!("{} does not use TLS", url));
    }

    tracing::info!(url = %url, "Attempting auto-extraction from URL");
    let client = san_crawler::http_client::create_tls_probe_client(config.timeout_secs)?;
    let org = san_crawler::probe::tls::extract_organization(&client, url).await?;
    tracing::info!(organization = %org, "Using extracted organization as seed");
    Ok(SeedTerm::Organization(org))
}
