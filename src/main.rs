use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use zipcrosswalk::{
    config::{Config, Overrides},
    export::OutputFormat,
    pipeline,
};

/// Build a ZIP code → county FIPS → CBSA crosswalk from HUD, Census and OMB files.
#[derive(Parser, Debug)]
#[command(name = "zipcrosswalk", version)]
struct Cli {
    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Year to build (repeatable); overrides `years` in the config
    #[arg(long = "year")]
    years: Vec<u16>,

    /// Directory holding inputs and downloads
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Directory for the finished crosswalks (defaults to the work dir)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Use the Census/OMB files already in the work dir
    #[arg(long)]
    skip_download: bool,

    /// Output format (repeatable)
    #[arg(long = "format", value_enum)]
    formats: Vec<OutputFormat>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) configuration ────────────────────────────────────────────
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?.with_overrides(Overrides {
        years: cli.years,
        work_dir: cli.work_dir,
        output_dir: cli.output_dir,
        skip_download: cli.skip_download,
        formats: cli.formats,
    });
    info!(
        years = ?config.years,
        work_dir = %config.work_dir.display(),
        download = config.download,
        "configured"
    );

    // ─── 3) fetch, build, export ─────────────────────────────────────
    let reports = pipeline::run(&config).await?;
    for report in &reports {
        for path in &report.outputs {
            info!(year = report.year, rows = report.summary.rows, path = %path.display(), "output");
        }
    }

    info!("all done");
    Ok(())
}
