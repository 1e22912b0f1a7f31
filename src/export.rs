// src/export.rs

use anyhow::{Context, Result};
use arrow::{
    array::{ArrayRef, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use parquet::{arrow::ArrowWriter, basic::Compression, file::properties::WriterProperties};
use serde::Deserialize;
use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::info;

use crate::process::join::{CrosswalkRow, OUTPUT_COLUMNS};

/// File formats the crosswalk can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }
}

/// `zipcode_FIPS_cbsa_crosswalk_<year>.<ext>`
pub fn output_file_name(year: u16, format: OutputFormat) -> String {
    format!("zipcode_FIPS_cbsa_crosswalk_{}.{}", year, format.extension())
}

/// Write rows with a header line, replacing any existing file.
pub fn write_csv(rows: &[CrosswalkRow], path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut wtr = csv::Writer::from_writer(file);
    if rows.is_empty() {
        // serde only emits the header alongside the first record
        wtr.write_record(OUTPUT_COLUMNS)
            .with_context(|| format!("writing header to {}", path.display()))?;
    }
    for row in rows {
        wtr.serialize(row)
            .with_context(|| format!("writing row {} to {}", row.zipcode, path.display()))?;
    }
    wtr.flush()
        .with_context(|| format!("flushing {}", path.display()))?;
    Ok(())
}

fn string_column<F>(rows: &[CrosswalkRow], get: F) -> ArrayRef
where
    F: Fn(&CrosswalkRow) -> Option<&str>,
{
    Arc::new(rows.iter().map(get).collect::<StringArray>()) as ArrayRef
}

/// Write rows as a single-batch Parquet file of nullable UTF-8 columns.
pub fn write_parquet(rows: &[CrosswalkRow], path: &Path) -> Result<()> {
    let schema = Arc::new(Schema::new(
        OUTPUT_COLUMNS
            .iter()
            .map(|name| Field::new(*name, DataType::Utf8, true))
            .collect::<Vec<_>>(),
    ));

    let columns = vec![
        string_column(rows, |r| Some(r.zipcode.as_str())),
        string_column(rows, |r| r.fips.as_deref()),
        string_column(rows, |r| r.county_name.as_deref()),
        string_column(rows, |r| r.cbsa_code.as_deref()),
        string_column(rows, |r| r.cbsa_title.as_deref()),
        string_column(rows, |r| r.metro_micro.as_ref().map(|a| a.as_str())),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building crosswalk batch")?;

    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, schema, Some(props))
        .context("creating Arrow writer for crosswalk")?;
    writer.write(&batch).context("writing crosswalk batch")?;
    writer.close().context("closing crosswalk writer")?;
    Ok(())
}

/// Write `rows` for `year` in every requested format under `dir`.
#[tracing::instrument(level = "info", skip(rows, dir), fields(rows = rows.len()))]
pub fn export(
    rows: &[CrosswalkRow],
    dir: &Path,
    year: u16,
    formats: &[OutputFormat],
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(formats.len());
    for &format in formats {
        let path = dir.join(output_file_name(year, format));
        match format {
            OutputFormat::Csv => write_csv(rows, &path)?,
            OutputFormat::Parquet => write_parquet(rows, &path)?,
        }
        info!(path = %path.display(), "wrote crosswalk");
        written.push(path);
    }
    Ok(written)
}
