use clap::{ArgGroup, Parser};

use san_crawler::config::SourceKind;

/// Reverses x509 metadata using certificate transparency logs
#[derive(clap::Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("seed").required(true).args(["keyword", "org", "url"])))]
pub struct Cli {
    /// Keyword to match on any certificate field (wildcards pass through)
    #[arg(short = 'k', long)]
    pub keyword: Option<String>,

    /// Organization name to match strictly
    #[arg(short = 's', long = "org")]
    pub org: Option<String>,

    /// URL; extract the x509 Subject's Organization field and use it as the seed
    #[arg(short = 'u', long)]
    pub url: Option<String>,

    /// Write names to this file, one per line
    #[arg(short = 'o', long = "out", value_name = "FILE")]
    pub out: Option<String>,

    /// Print domain statistics (subdomain distribution per registrable domain)
    #[arg(short = 'p', long = "print-stats", default_value_t = false)]
    pub print_stats: bool,

    /// Worker count (overrides the volume-based default)
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Upstream strategy
    #[arg(long, value_enum)]
    pub source: Option<SourceKind>,

    /// JSON config file
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<String>,

    /// Enable detailed debug logging
    #[arg(long, default_value_t = false)]
    pub debug: bool,

    /// Enable verbose logging
    #[arg(long, default_value_t = false)]
    pub verbose: bool,
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}
