use anyhow::{bail, Context, Result};
use std::{fs::File, path::Path};
use tracing::info;

use crate::process::{
    raw_table::{read_csv_records, RawTable},
    utils::{clean_str, zero_pad},
};

/// Census national county file name.
pub const COUNTY_FILE: &str = "national_county.txt";

/// Positional layout of the headerless Census county file.
const COUNTY_COLUMNS: [&str; 5] = ["State", "StateFIPS", "CountyFIPS", "CountyName", "CountyClass"];

/// One county: 5-digit FIPS code and Census name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountyName {
    pub fips: String,
    pub name: String,
}

/// Concatenate a state code (padded to 2) and county code (padded to 3).
pub fn fips_code(state: &str, county: &str) -> String {
    format!("{}{}", zero_pad(state, 2), zero_pad(county, 3))
}

/// Split a 5-digit FIPS code back into its state and county parts.
pub fn split_fips(fips: &str) -> Option<(&str, &str)> {
    if fips.len() != 5 || !fips.is_char_boundary(2) {
        return None;
    }
    Some(fips.split_at(2))
}

/// Parse `national_county.txt` rows into FIPS → name pairs, in file order.
pub fn county_names_from_table(table: &RawTable) -> Result<Vec<CountyName>> {
    let state = table.column_index(COUNTY_COLUMNS[1])?;
    let county = table.column_index(COUNTY_COLUMNS[2])?;
    let name = table.column_index(COUNTY_COLUMNS[3])?;

    Ok(table
        .rows
        .iter()
        .map(|row| CountyName {
            fips: fips_code(
                &clean_str(RawTable::cell(row, state)),
                &clean_str(RawTable::cell(row, county)),
            ),
            name: RawTable::cell(row, name).to_string(),
        })
        .collect())
}

/// Load the headerless county file, assigning the Census column names.
#[tracing::instrument(level = "info", skip(path), fields(path = %path.display()))]
pub fn load_county_names(path: &Path) -> Result<Vec<CountyName>> {
    let source = path.display().to_string();
    let file = File::open(path).with_context(|| format!("opening {}", source))?;
    let records = read_csv_records(&source, file)?;
    if records[0].len() < COUNTY_COLUMNS.len() {
        bail!(
            "{}: expected {} columns, found {}",
            source,
            COUNTY_COLUMNS.len(),
            records[0].len()
        );
    }

    let mut with_header = Vec::with_capacity(records.len() + 1);
    with_header.push(COUNTY_COLUMNS.iter().map(|c| c.to_string()).collect());
    with_header.extend(records);
    let table = RawTable::from_records(source, with_header, 0, 0)?;

    let names = county_names_from_table(&table)?;
    info!(counties = names.len(), "loaded county names");
    Ok(names)
}
