// src/fetch/mod.rs

use anyhow::{Context, Result};
use reqwest::Client;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use crate::process::{cbsa::delineation_csv_name, county::COUNTY_FILE, sheet::convert_sheet_to_csv};

pub mod download;
pub mod urls;

pub use download::download_to;
pub use urls::SourceUrls;

/// Download `national_county.txt` into `work_dir`.
#[instrument(level = "info", skip(client, urls, work_dir))]
pub async fn fetch_county_reference(
    client: &Client,
    urls: &SourceUrls,
    work_dir: &Path,
) -> Result<PathBuf> {
    let url = urls.county_url()?;
    let dest = work_dir.join(COUNTY_FILE);
    let bytes = download_to(client, &url, &dest).await?;
    info!(%url, bytes, "fetched county reference");
    Ok(dest)
}

/// Download one year's delineation workbook and convert its first sheet to
/// `OMB_cbsa_<year>.csv` in `work_dir`.
///
/// The workbook is staged in a temporary file next to the output and removed
/// once converted, whether or not the conversion succeeds.
#[instrument(level = "info", skip(client, urls, work_dir))]
pub async fn fetch_delineation(
    client: &Client,
    urls: &SourceUrls,
    year: u16,
    work_dir: &Path,
) -> Result<PathBuf> {
    let url = urls.delineation_url(year)?;
    let suffix = format!(".{}", download::url_extension(&url).unwrap_or("xls"));
    tokio::fs::create_dir_all(work_dir)
        .await
        .with_context(|| format!("creating {}", work_dir.display()))?;
    let staged = tempfile::Builder::new()
        .prefix("list1-")
        .suffix(&suffix)
        .tempfile_in(work_dir)
        .with_context(|| format!("creating temporary workbook in {}", work_dir.display()))?;

    download_to(client, &url, staged.path()).await?;

    let dest = work_dir.join(delineation_csv_name(year));
    let rows = convert_sheet_to_csv(staged.path(), &dest)?;
    staged
        .close()
        .context("removing temporary delineation workbook")?;

    info!(%url, rows, dest = %dest.display(), "fetched delineation");
    Ok(dest)
}

/// Fetch the county reference, then every delineation year, one after another.
pub async fn fetch_all(
    client: &Client,
    urls: &SourceUrls,
    delineation_years: &[u16],
    work_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let mut fetched = vec![fetch_county_reference(client, urls, work_dir).await?];
    for &year in delineation_years {
        fetched.push(fetch_delineation(client, urls, year, work_dir).await?);
    }
    Ok(fetched)
}
