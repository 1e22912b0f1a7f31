// src/bin/inspect_crosswalk.rs

use anyhow::{Context, Result};
use glob::glob;
use regex::Regex;
use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
};

/// Summarise each crosswalk CSV given on the command line, or every
/// `zipcode_FIPS_cbsa_crosswalk_*.csv` in the current directory.
fn main() -> Result<()> {
    let mut paths: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();
    if paths.is_empty() {
        let pattern = "zipcode_FIPS_cbsa_crosswalk_*.csv";
        paths = glob(pattern)
            .with_context(|| format!("Failed to read glob pattern '{}'", pattern))?
            .filter_map(|entry| entry.ok())
            .collect();
        if paths.is_empty() {
            return Err(anyhow::anyhow!("No crosswalk files found matching '{}'", pattern));
        }
    }

    let zip_re = Regex::new(r"^\d{5}$").context("compiling ZIP pattern")?;
    for path in &paths {
        inspect(path, &zip_re)?;
    }
    Ok(())
}

fn inspect(path: &Path, zip_re: &Regex) -> Result<()> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let headers = rdr.headers()?.clone();
    let col = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("{} has no {} column", path.display(), name))
    };
    let (zip_i, fips_i, name_i, cbsa_i, title_i, area_i) = (
        col("zipcode")?,
        col("FIPS")?,
        col("CountyName")?,
        col("cbsacode")?,
        col("cbsatitle")?,
        col("metromicro")?,
    );

    let mut rows = 0usize;
    let mut zip_counts: HashMap<String, usize> = HashMap::new();
    let mut malformed = 0usize;
    let mut no_fips = 0usize;
    let mut no_name = 0usize;
    let mut no_cbsa = 0usize;
    let mut no_title = 0usize;
    let mut areas: BTreeMap<String, usize> = BTreeMap::new();

    for rec in rdr.records() {
        let rec = rec.with_context(|| format!("reading {}", path.display()))?;
        rows += 1;
        let zip = rec.get(zip_i).unwrap_or("");
        if !zip_re.is_match(zip) {
            malformed += 1;
        }
        *zip_counts.entry(zip.to_string()).or_default() += 1;
        no_fips += rec.get(fips_i).map_or(true, str::is_empty) as usize;
        no_name += rec.get(name_i).map_or(true, str::is_empty) as usize;
        no_cbsa += rec.get(cbsa_i).map_or(true, str::is_empty) as usize;
        no_title += rec.get(title_i).map_or(true, str::is_empty) as usize;
        let area = rec.get(area_i).unwrap_or("");
        let area = if area.is_empty() { "<none>" } else { area };
        *areas.entry(area.to_string()).or_default() += 1;
    }
    let duplicated = zip_counts.values().filter(|&&n| n > 1).count();

    println!("=== Crosswalk: {} ===", path.display());
    println!("Rows:                 {}", rows);
    println!("Distinct ZIPs:        {}", zip_counts.len());
    println!("Duplicated ZIPs:      {}", duplicated);
    println!("Malformed ZIPs:       {}", malformed);
    println!("Without FIPS:         {}", no_fips);
    println!("Without county name:  {}", no_name);
    println!("Without CBSA code:    {}", no_cbsa);
    println!("Without CBSA title:   {}", no_title);
    for (area, n) in &areas {
        println!("- {:<20} {}", area, n);
    }
    println!();
    Ok(())
}
