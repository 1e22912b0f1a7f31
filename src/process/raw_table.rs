use anyhow::{anyhow, bail, Context, Result};
use csv::ReaderBuilder;
use std::{fs::File, io::Read, path::Path};

use crate::process::utils::decode_field;

/// A header row plus string cells, as read from a CSV or a worksheet.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    /// Where the table came from; used in error messages.
    pub source: String,
    pub headers: Vec<String>,
    /// Data rows. Rows may be shorter than `headers`; missing cells read as "".
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Build a table from raw records: drop `skip_rows` leading records, take
    /// the next as the header, and drop `footer_rows` trailing records.
    pub fn from_records(
        source: impl Into<String>,
        records: Vec<Vec<String>>,
        skip_rows: usize,
        footer_rows: usize,
    ) -> Result<Self> {
        let source = source.into();
        let mut iter = records.into_iter().skip(skip_rows);
        let headers: Vec<String> = iter
            .next()
            .ok_or_else(|| anyhow!("{}: no header row after skipping {} rows", source, skip_rows))?
            .into_iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows: Vec<Vec<String>> = iter.collect();
        let keep = rows.len().saturating_sub(footer_rows);
        rows.truncate(keep);

        Ok(Self {
            source,
            headers,
            rows,
        })
    }

    /// Read every record of a CSV stream (no header interpretation) and hand
    /// them to [`RawTable::from_records`].
    pub fn from_csv_reader<R: Read>(
        source: impl Into<String>,
        reader: R,
        skip_rows: usize,
        footer_rows: usize,
    ) -> Result<Self> {
        let source = source.into();
        Self::from_records(
            source.clone(),
            read_csv_records(&source, reader)?,
            skip_rows,
            footer_rows,
        )
    }

    pub fn from_csv_path(path: &Path, skip_rows: usize, footer_rows: usize) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        Self::from_csv_reader(path.display().to_string(), file, skip_rows, footer_rows)
    }

    /// Position of `name` in the header row.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| {
                anyhow!(
                    "{}: missing column {:?} (found {:?})",
                    self.source,
                    name,
                    self.headers
                )
            })
    }

    /// Positions of every name in `names`, failing on the first one absent.
    pub fn select(&self, names: &[&str]) -> Result<Vec<usize>> {
        names.iter().map(|n| self.column_index(n)).collect()
    }

    /// Cell `idx` of `row`, or "" when the row is short.
    pub fn cell<'a>(row: &'a [String], idx: usize) -> &'a str {
        row.get(idx).map(String::as_str).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Read all records of a headerless, possibly ragged CSV stream.
pub fn read_csv_records<R: Read>(source: &str, reader: R) -> Result<Vec<Vec<String>>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut records = Vec::new();
    for (idx, result) in rdr.byte_records().enumerate() {
        let record = result.with_context(|| format!("CSV parse error in {} at record {}", source, idx))?;
        records.push(record.iter().map(decode_field).collect());
    }
    if records.is_empty() {
        bail!("{}: no records", source);
    }
    Ok(records)
}
