use anyhow::{bail, Context, Result};
use std::path::Path;
use tracing::info;

use crate::process::{
    dedup::{keep_max_share, ZipShare},
    raw_table::RawTable,
    sheet::read_table,
    utils::{clean_str, zero_pad},
};

const ZIP_COLUMN: &str = "ZIP";
const RES_RATIO_COLUMN: &str = "RES_RATIO";

/// The two HUD USPS crosswalks the pipeline reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrosswalkKind {
    /// ZIP → 5-digit county FIPS.
    County,
    /// ZIP → CBSA or metropolitan-division code.
    Cbsa,
}

impl CrosswalkKind {
    pub fn code_column(&self) -> &'static str {
        match self {
            CrosswalkKind::County => "COUNTY",
            CrosswalkKind::Cbsa => "CBSA",
        }
    }

    /// HUD's name for the fourth-quarter release of `year`.
    pub fn file_name(&self, year: u16) -> String {
        match self {
            CrosswalkKind::County => format!("ZIP_COUNTY_12{}.xlsx", year),
            CrosswalkKind::Cbsa => format!("ZIP_CBSA_12{}.xlsx", year),
        }
    }
}

/// One crosswalk row: a ZIP, the area it overlaps, and the residential share.
///
/// `res_ratio` is `None` when the cell is blank. Such a row still counts, but
/// ranks below every row that has a share.
#[derive(Debug, Clone, PartialEq)]
pub struct ZipArea {
    pub zip: String,
    pub code: String,
    pub res_ratio: Option<f64>,
}

impl ZipShare for ZipArea {
    fn zip(&self) -> &str {
        &self.zip
    }

    fn share(&self) -> f64 {
        self.res_ratio.unwrap_or(f64::NEG_INFINITY)
    }
}

fn parse_share(raw: &str, source: &str, row: usize) -> Result<Option<f64>> {
    if raw.is_empty() {
        return Ok(None);
    }
    let value: f64 = raw
        .parse()
        .with_context(|| format!("{}: row {}: RES_RATIO {:?} is not a number", source, row, raw))?;
    if !value.is_finite() {
        bail!("{}: row {}: RES_RATIO {:?} is not finite", source, row, raw);
    }
    Ok(Some(value))
}

/// Select and tidy the ZIP, area code and share columns. Rows stay in file order.
pub fn zip_areas_from_table(table: &RawTable, kind: CrosswalkKind) -> Result<Vec<ZipArea>> {
    let cols = table.select(&[ZIP_COLUMN, kind.code_column(), RES_RATIO_COLUMN])?;
    let (zip_idx, code_idx, ratio_idx) = (cols[0], cols[1], cols[2]);

    table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| -> Result<ZipArea> {
            Ok(ZipArea {
                zip: zero_pad(&clean_str(RawTable::cell(row, zip_idx)), 5),
                code: zero_pad(&clean_str(RawTable::cell(row, code_idx)), 5),
                res_ratio: parse_share(
                    &clean_str(RawTable::cell(row, ratio_idx)),
                    &table.source,
                    i + 1,
                )?,
            })
        })
        .collect()
}

/// Load a HUD crosswalk (workbook or CSV export) and reduce it to one row per ZIP.
#[tracing::instrument(level = "info", skip(path), fields(path = %path.display()))]
pub fn load_crosswalk(path: &Path, kind: CrosswalkKind) -> Result<Vec<ZipArea>> {
    let table = read_table(path)?;
    let rows = zip_areas_from_table(&table, kind)?;
    let total = rows.len();
    let deduped = keep_max_share(rows);
    info!(rows = total, zips = deduped.len(), "loaded crosswalk");
    Ok(deduped)
}
