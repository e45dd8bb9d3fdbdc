pub mod config;
pub mod data;
pub mod highlight;
pub mod index;
pub mod output;
pub mod registry;
pub mod search;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser, Subcommand};

use crate::data::{DirFetcher, Fetcher, HttpFetcher};
use crate::registry::IndexRegistry;
use crate::search::SearchClient;

fn long_version() -> String {
    format!(
        "{} (built {})",
        env!("CARGO_PKG_VERSION"),
        option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown")
    )
}

/// Command-line interface.
#[derive(Parser, Debug)]
#[command(
    name = "docsearch",
    version,
    long_version = long_version(),
    about = "Full-text search over a Nextra docs site's pre-built search data"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a search query
    Query {
        /// Query terms (joined with spaces)
        terms: Vec<String>,

        /// Site base URL (defaults to config / DOCSEARCH_SITE)
        #[arg(long)]
        site: Option<String>,

        /// Local site build directory; reads the assets from disk instead of HTTP
        #[arg(long, conflicts_with = "site")]
        dir: Option<PathBuf>,

        /// Locale of the search data asset
        #[arg(long)]
        locale: Option<String>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Load the indices and report document counts
    Stats {
        /// Site base URL (defaults to config / DOCSEARCH_SITE)
        #[arg(long)]
        site: Option<String>,

        /// Local site build directory; reads the assets from disk instead of HTTP
        #[arg(long, conflicts_with = "site")]
        dir: Option<PathBuf>,

        /// Locale of the search data asset
        #[arg(long)]
        locale: Option<String>,
    },
    /// Generate shell completions to stdout
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate man page to stdout
    Man,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Query {
            terms,
            site,
            dir,
            locale,
            json,
        } => {
            let cfg = config::Config::load();
            let locale = locale.unwrap_or(cfg.locale.clone());
            let query = terms.join(" ");
            match dir {
                Some(dir) => {
                    let base = dir.display().to_string();
                    run_query(DirFetcher::new(dir), &base, &locale, &query, json).await
                }
                None => {
                    let site = resolve_site(site, &cfg)?;
                    let fetcher = HttpFetcher::new(Duration::from_secs(cfg.timeout_secs))?;
                    run_query(fetcher, &site, &locale, &query, json).await
                }
            }
        }
        Commands::Stats { site, dir, locale } => {
            let cfg = config::Config::load();
            let locale = locale.unwrap_or(cfg.locale.clone());
            match dir {
                Some(dir) => {
                    let base = dir.display().to_string();
                    run_stats(DirFetcher::new(dir), &base, &locale).await
                }
                None => {
                    let site = resolve_site(site, &cfg)?;
                    let fetcher = HttpFetcher::new(Duration::from_secs(cfg.timeout_secs))?;
                    run_stats(fetcher, &site, &locale).await
                }
            }
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "docsearch", &mut std::io::stdout());
            Ok(())
        }
        Commands::Man => {
            let cmd = Cli::command();
            let man = clap_mangen::Man::new(cmd);
            let mut out = std::io::stdout();
            man.render(&mut out)?;
            Ok(())
        }
    }
}

fn resolve_site(flag: Option<String>, cfg: &config::Config) -> Result<String> {
    if let Some(site) = flag {
        return Ok(site);
    }
    if cfg.site.is_empty() {
        bail!("no site configured; pass --site, --dir, or set DOCSEARCH_SITE");
    }
    Ok(cfg.site.clone())
}

async fn run_query<F: Fetcher>(
    fetcher: F,
    base_path: &str,
    locale: &str,
    query: &str,
    json: bool,
) -> Result<()> {
    let registry = Arc::new(IndexRegistry::new(fetcher));
    let client = SearchClient::new(registry, base_path, locale);
    let results = client
        .search(query)
        .await
        .with_context(|| format!("searching {base_path}"))?;
    output::print_results(query, &results, json)
}

async fn run_stats<F: Fetcher>(fetcher: F, base_path: &str, locale: &str) -> Result<()> {
    let registry = IndexRegistry::new(fetcher);
    let docs = registry
        .docs(base_path, locale)
        .await
        .with_context(|| format!("loading doc indices for {base_path}"))?;
    let blog = registry
        .blog(base_path)
        .await
        .with_context(|| format!("loading blog index for {base_path}"))?;

    println!("locale:     {locale}");
    println!("pages:      {}", docs.pages.num_docs());
    println!("sections:   {}", docs.sections.num_docs());
    println!("blog posts: {}", blog.num_docs());
    Ok(())
}
