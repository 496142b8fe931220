mod export;
mod pagination;
mod parser;
mod query;
mod record;
mod session;
mod settings;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use export::ExportFormat;
use pagination::ScrapeOptions;
use session::{HttpSession, Page};
use settings::{Settings, DEFAULT_OUTPUT};

#[derive(Parser)]
#[command(name = "gcmt_scraper", about = "Global CMT catalog scraper and spreadsheet exporter")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query the catalog, follow every results page and export the records
    Run {
        /// Output file (default: earthquake_data.xlsx, or GCMT_OUTPUT)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Output format (default: inferred from the file extension)
        #[arg(short, long, value_enum)]
        format: Option<ExportFormat>,
        /// Stop after this many result pages
        #[arg(short = 'n', long)]
        max_pages: Option<usize>,
    },
    /// Print the catalog query URL built from the configuration
    Url,
    /// Extract records from saved result pages and export them
    Parse {
        /// Saved HTML result pages, in order
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(short, long)]
        out: Option<PathBuf>,
        #[arg(short, long, value_enum)]
        format: Option<ExportFormat>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = run(cli).await;
    if let Err(e) = &result {
        error!("Error in scraping or exporting: {:#}", e);
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }

    result
}

async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load()?;

    match cli.command {
        Commands::Url => {
            let url = settings.query.to_url(&settings.base_url)?;
            println!("{}", url);
            Ok(())
        }
        Commands::Run {
            out,
            format,
            max_pages,
        } => {
            let url = settings
                .query
                .to_url(&settings.base_url)
                .context("invalid catalog query")?;
            let (path, format) = output_target(&settings, out, format);

            let session = HttpSession::launch(settings.connect_timeout())
                .context("starting HTTP session")?;
            let opts = ScrapeOptions {
                nav_timeout: settings.nav_timeout(),
                more_link_text: settings.more_link_text.clone(),
                max_pages,
                show_progress: std::io::stderr().is_terminal(),
            };

            info!("Starting data extraction...");
            let outcome = pagination::scrape_catalog(session, &url, &opts).await?;

            export::write_records(&outcome.records, &path, format)?;
            println!(
                "Saved {} records from {} pages to {}",
                outcome.records.len(),
                outcome.pages,
                path.display()
            );
            Ok(())
        }
        Commands::Parse { files, out, format } => {
            let (path, format) = output_target(&settings, out, format);
            let base = reqwest::Url::parse(&settings.base_url)?;

            let mut records = Vec::new();
            for file in &files {
                let html = std::fs::read_to_string(file)
                    .with_context(|| format!("reading {}", file.display()))?;
                let page = Page {
                    url: base.clone(),
                    html,
                };
                let batch = parser::extract_records(&page);
                info!("{}: {} records", file.display(), batch.len());
                records.extend(batch);
            }

            let incomplete = records
                .iter()
                .filter(|r| !r.missing_fields().is_empty())
                .count();
            if incomplete > 0 {
                info!("{} records have fields missing from the catalog text", incomplete);
            }

            export::write_records(&records, &path, format)?;
            println!("Saved {} records to {}", records.len(), path.display());
            Ok(())
        }
    }
}

/// CLI flags win over configuration; the format follows the extension unless
/// given, and an explicit JSON format on the default path swaps the extension.
fn output_target(
    settings: &Settings,
    out: Option<PathBuf>,
    format: Option<ExportFormat>,
) -> (PathBuf, ExportFormat) {
    let explicit = out.is_some();
    let path = out.unwrap_or_else(|| settings.output.clone());
    match format {
        Some(ExportFormat::Json) if !explicit && path == PathBuf::from(DEFAULT_OUTPUT) => {
            (path.with_extension("json"), ExportFormat::Json)
        }
        Some(f) => (path, f),
        None => {
            let f = ExportFormat::from_path(&path);
            (path, f)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_defaults_to_xlsx() {
        let s = Settings::default();
        let (p, f) = output_target(&s, None, None);
        assert_eq!(p, PathBuf::from("earthquake_data.xlsx"));
        assert_eq!(f, ExportFormat::Xlsx);
    }

    #[test]
    fn json_flag_on_default_path() {
        let s = Settings::default();
        let (p, f) = output_target(&s, None, Some(ExportFormat::Json));
        assert_eq!(p, PathBuf::from("earthquake_data.json"));
        assert_eq!(f, ExportFormat::Json);
    }

    #[test]
    fn explicit_path_kept() {
        let s = Settings::default();
        let (p, f) = output_target(&s, Some("quakes.dat".into()), Some(ExportFormat::Json));
        assert_eq!(p, PathBuf::from("quakes.dat"));
        assert_eq!(f, ExportFormat::Json);

        let (p, f) = output_target(&s, Some("quakes.json".into()), None);
        assert_eq!(p, PathBuf::from("quakes.json"));
        assert_eq!(f, ExportFormat::Json);
    }

    #[test]
    fn cli_parses_run_flags() {
        let cli = Cli::try_parse_from(["gcmt_scraper", "run", "-o", "x.xlsx", "-n", "3", "--format", "json"]).unwrap();
        match cli.command {
            Commands::Run {
                out,
                format,
                max_pages,
            } => {
                assert_eq!(out, Some(PathBuf::from("x.xlsx")));
                assert_eq!(format, Some(ExportFormat::Json));
                assert_eq!(max_pages, Some(3));
            }
            _ => panic!("expected run"),
        }
    }
}
