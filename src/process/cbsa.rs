use anyhow::Result;
use serde::{Serialize, Serializer};
use std::{collections::HashSet, fmt, path::Path};
use tracing::{debug, info};

use crate::process::{
    raw_table::RawTable,
    utils::{clean_str, zero_pad},
};
use crate::schema::{DelineationSchema, AREA_TYPE_COLUMN, CBSA_CODE_COLUMN, CBSA_TITLE_COLUMN};

/// CSV produced from a year's OMB `list1.xls`.
pub fn delineation_csv_name(year: u16) -> String {
    format!("OMB_cbsa_{}.csv", year)
}

/// Metropolitan/micropolitan flag.
///
/// Values other than the two OMB long forms are carried through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AreaType {
    Metro,
    Micro,
    Other(String),
}

impl AreaType {
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "Metropolitan Statistical Area" => AreaType::Metro,
            "Micropolitan Statistical Area" => AreaType::Micro,
            other => AreaType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AreaType::Metro => "Metro",
            AreaType::Micro => "Micro",
            AreaType::Other(s) => s,
        }
    }
}

impl fmt::Display for AreaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AreaType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One CBSA (or metropolitan division) name keyed by metro code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CbsaName {
    /// Metropolitan-division code when the row has one, else the CBSA code.
    pub metro_code: String,
    pub title: String,
    pub area_type: AreaType,
}

/// The code HUD uses for a delineation row.
pub fn metro_code(cbsa_code: &str, division_code: &str) -> String {
    if division_code.is_empty() {
        cbsa_code.to_string()
    } else {
        division_code.to_string()
    }
}

/// Select, canonicalise and deduplicate the delineation rows.
///
/// The sheet has one row per county, so each (title, metro code) pair shows
/// up many times; only the first is kept.
pub fn cbsa_names_from_table(
    table: &RawTable,
    schema: &DelineationSchema,
) -> Result<Vec<CbsaName>> {
    let cols = table.select(&[
        CBSA_CODE_COLUMN,
        schema.metro_division_column.as_str(),
        CBSA_TITLE_COLUMN,
        AREA_TYPE_COLUMN,
    ])?;
    let (code_idx, div_idx, title_idx, area_idx) = (cols[0], cols[1], cols[2], cols[3]);

    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut out = Vec::new();
    for row in &table.rows {
        let cbsa = zero_pad(&clean_str(RawTable::cell(row, code_idx)), 5);
        let division = zero_pad(&clean_str(RawTable::cell(row, div_idx)), 5);
        let title = clean_str(RawTable::cell(row, title_idx));
        let metro = metro_code(&cbsa, &division);

        if !seen.insert((title.clone(), metro.clone())) {
            continue;
        }
        out.push(CbsaName {
            metro_code: metro,
            title,
            area_type: AreaType::from_raw(RawTable::cell(row, area_idx)),
        });
    }
    debug!(
        rows = table.len(),
        distinct = out.len(),
        "deduplicated delineation rows"
    );
    Ok(out)
}

#[tracing::instrument(level = "info", skip(path, schema), fields(path = %path.display()))]
pub fn load_cbsa_names(path: &Path, schema: &DelineationSchema) -> Result<Vec<CbsaName>> {
    let table = RawTable::from_csv_path(path, schema.skip_rows, schema.footer_rows)?;
    let names = cbsa_names_from_table(&table, schema)?;
    info!(cbsas = names.len(), "loaded CBSA names");
    Ok(names)
}
