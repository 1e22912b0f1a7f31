// src/pipeline.rs

use anyhow::{Context, Result};
use reqwest::Client;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

use crate::{
    config::Config,
    export::export,
    fetch,
    process::{
        build_crosswalk,
        cbsa::{delineation_csv_name, load_cbsa_names},
        county::{load_county_names, COUNTY_FILE},
        crosswalk::{load_crosswalk, CrosswalkKind},
        CrosswalkRow, CrosswalkSummary,
    },
    schema::DelineationSchema,
};

/// The four files one year's crosswalk is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearInputs {
    pub county_names: PathBuf,
    pub delineation: PathBuf,
    pub zip_county: PathBuf,
    pub zip_cbsa: PathBuf,
}

impl YearInputs {
    /// The conventional file names for `year` inside `dir`.
    pub fn in_dir(dir: &Path, year: u16) -> Self {
        Self {
            county_names: dir.join(COUNTY_FILE),
            delineation: dir.join(delineation_csv_name(year)),
            zip_county: dir.join(CrosswalkKind::County.file_name(year)),
            zip_cbsa: dir.join(CrosswalkKind::Cbsa.file_name(year)),
        }
    }
}

/// What one year's run produced.
#[derive(Debug, Clone)]
pub struct YearReport {
    pub year: u16,
    pub summary: CrosswalkSummary,
    pub outputs: Vec<PathBuf>,
}

/// Normalise, deduplicate and join one year's inputs.
#[instrument(level = "info", skip(inputs, schema))]
pub fn build_year(year: u16, inputs: &YearInputs, schema: &DelineationSchema) -> Result<Vec<CrosswalkRow>> {
    let cbsa_names = load_cbsa_names(&inputs.delineation, schema)
        .with_context(|| format!("loading {} CBSA names", year))?;
    let zip_counties = load_crosswalk(&inputs.zip_county, CrosswalkKind::County)
        .with_context(|| format!("loading {} ZIP-county crosswalk", year))?;
    let zip_cbsas = load_crosswalk(&inputs.zip_cbsa, CrosswalkKind::Cbsa)
        .with_context(|| format!("loading {} ZIP-CBSA crosswalk", year))?;
    let county_names =
        load_county_names(&inputs.county_names).context("loading county names")?;

    Ok(build_crosswalk(
        &zip_counties,
        &county_names,
        &zip_cbsas,
        &cbsa_names,
    ))
}

/// Build and write the crosswalk for a single year.
pub fn run_year(config: &Config, year: u16) -> Result<YearReport> {
    let registry = config.registry();
    let schema = registry.get(year)?;
    let inputs = YearInputs::in_dir(&config.work_dir, year);

    let rows = build_year(year, &inputs, schema)?;
    let summary = CrosswalkSummary::from_rows(&rows);
    info!(
        year,
        rows = summary.rows,
        without_county = summary.without_county,
        without_county_name = summary.without_county_name,
        without_cbsa = summary.without_cbsa,
        without_cbsa_title = summary.without_cbsa_title,
        "crosswalk built"
    );
    if summary.without_cbsa_title > 0 {
        warn!(
            year,
            count = summary.without_cbsa_title,
            "ZIPs without a CBSA title"
        );
    }

    std::fs::create_dir_all(config.output_dir())
        .with_context(|| format!("creating {}", config.output_dir().display()))?;
    let outputs = export(&rows, config.output_dir(), year, &config.formats)?;
    Ok(YearReport {
        year,
        summary,
        outputs,
    })
}

/// Full run: optional acquisition, then each configured year in turn.
/// The first failure aborts the run.
pub async fn run(config: &Config) -> Result<Vec<YearReport>> {
    config.validate()?;

    if config.download {
        let client = Client::new();
        let fetched = fetch::fetch_all(
            &client,
            &config.sources,
            &config.delineation_years,
            &config.work_dir,
        )
        .await?;
        info!(files = fetched.len(), "acquisition done");
    } else {
        info!("download disabled; using files in {}", config.work_dir.display());
    }

    let mut reports = Vec::with_capacity(config.years.len());
    for &year in &config.years {
        reports.push(run_year(config, year)?);
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Overrides;
    use crate::export::OutputFormat;
    use std::{collections::HashSet, fs};
    use tempfile::tempdir;

    const COUNTIES: &str = "\
CA,6,1,Alameda County,H1
CA,06,075,San Francisco County,H6
NY,36,061,New York County,H6
";

    const DELINEATION_2015: &str = "\
List 1. CORE BASED STATISTICAL AREAS,,,
,,,
CBSA Code,Metropolitan Division Code,CBSA Title,Metropolitan/Micropolitan Statistical Area
41860,36084,\"San Francisco-Oakland-Hayward, CA\",Metropolitan Statistical Area
41860,41884,\"San Francisco-Oakland-Hayward, CA\",Metropolitan Statistical Area
35620,35614,\"New York-Newark-Jersey City, NY-NJ-PA\",Metropolitan Statistical Area
10100,,\"Aberdeen, SD\",Micropolitan Statistical Area
,,,
Note: footnote,,,
Source: OMB,,,
Release date,,,
";

    const ZIP_COUNTY: &str = "\
ZIP,COUNTY,RES_RATIO,BUS_RATIO,OTH_RATIO,TOT_RATIO
94601,06001,0.6,0.5,0.5,0.5
94601,06075,0.4,0.5,0.5,0.5
94102,06075,1,1,1,1
10001,36061,1,1,1,1
00501,36103,1,1,1,1
";

    const ZIP_CBSA: &str = "\
ZIP,CBSA,RES_RATIO,BUS_RATIO,OTH_RATIO,TOT_RATIO
94601,36084,1,1,1,1
94102,41884,1,1,1,1
10001,35614,0.9,1,1,1
10001,99999,0.1,0,0,0
57401,10100,1,1,1,1
";

    fn write_inputs(dir: &Path) -> YearInputs {
        let inputs = YearInputs {
            county_names: dir.join(COUNTY_FILE),
            delineation: dir.join(delineation_csv_name(2015)),
            zip_county: dir.join("ZIP_COUNTY_122015.csv"),
            zip_cbsa: dir.join("ZIP_CBSA_122015.csv"),
        };
        fs::write(&inputs.county_names, COUNTIES).unwrap();
        fs::write(&inputs.delineation, DELINEATION_2015).unwrap();
        fs::write(&inputs.zip_county, ZIP_COUNTY).unwrap();
        fs::write(&inputs.zip_cbsa, ZIP_CBSA).unwrap();
        inputs
    }

    #[test]
    fn test_conventional_names() {
        let inputs = YearInputs::in_dir(Path::new("data"), 2013);
        assert_eq!(inputs.delineation, Path::new("data/OMB_cbsa_2013.csv"));
        assert_eq!(inputs.zip_county, Path::new("data/ZIP_COUNTY_122013.xlsx"));
        assert_eq!(inputs.zip_cbsa, Path::new("data/ZIP_CBSA_122013.xlsx"));
        assert_eq!(inputs.county_names, Path::new("data/national_county.txt"));
    }

    #[test]
    fn test_build_year_end_to_end() {
        let tmp = tempdir().unwrap();
        let inputs = write_inputs(tmp.path());
        let schema = DelineationSchema::new("Metropolitan Division Code", 2, 4);

        let rows = build_year(2015, &inputs, &schema).unwrap();

        let zips: Vec<&str> = rows.iter().map(|r| r.zipcode.as_str()).collect();
        let unique: HashSet<&str> = zips.iter().copied().collect();
        assert_eq!(zips.len(), unique.len());
        let expected: HashSet<&str> = ["94601", "94102", "10001", "00501", "57401"]
            .into_iter()
            .collect();
        assert_eq!(unique, expected);

        // sorted by title, untitled last
        assert_eq!(zips, vec!["57401", "10001", "94102", "94601", "00501"]);

        let oakland = rows.iter().find(|r| r.zipcode == "94601").unwrap();
        assert_eq!(oakland.fips.as_deref(), Some("06001"));
        assert_eq!(oakland.county_name.as_deref(), Some("Alameda County"));
        assert_eq!(oakland.cbsa_code.as_deref(), Some("36084"));
        assert_eq!(oakland.metro_micro.as_ref().map(|a| a.as_str()), Some("Metro"));

        let aberdeen = rows.iter().find(|r| r.zipcode == "57401").unwrap();
        assert_eq!(aberdeen.fips, None);
        assert_eq!(aberdeen.cbsa_title.as_deref(), Some("Aberdeen, SD"));

        let unnamed = rows.iter().find(|r| r.zipcode == "00501").unwrap();
        assert_eq!(unnamed.county_name, None);
        assert_eq!(unnamed.cbsa_code, None);

        let ny = rows.iter().find(|r| r.zipcode == "10001").unwrap();
        assert_eq!(ny.cbsa_code.as_deref(), Some("35614"));
    }

    #[test]
    fn test_workbook_inputs_match_csv_exports() {
        let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/fixtures");
        let schema = DelineationSchema::new("Metropolitan Division Code", 2, 4);

        let csv_dir = tempdir().unwrap();
        let from_csv = build_year(2015, &write_inputs(csv_dir.path()), &schema).unwrap();

        let xlsx_dir = tempdir().unwrap();
        let mut inputs = write_inputs(xlsx_dir.path());
        inputs.zip_county = xlsx_dir.path().join(CrosswalkKind::County.file_name(2015));
        inputs.zip_cbsa = xlsx_dir.path().join(CrosswalkKind::Cbsa.file_name(2015));
        fs::copy(fixtures.join("ZIP_COUNTY_122015.xlsx"), &inputs.zip_county).unwrap();
        fs::copy(fixtures.join("ZIP_CBSA_122015.xlsx"), &inputs.zip_cbsa).unwrap();
        let from_xlsx = build_year(2015, &inputs, &schema).unwrap();

        assert_eq!(from_xlsx, from_csv);
    }

    #[test]
    fn test_rebuilding_is_byte_identical() {
        let tmp = tempdir().unwrap();
        let inputs = write_inputs(tmp.path());
        let schema = DelineationSchema::new("Metropolitan Division Code", 2, 4);

        let a = tmp.path().join("a.csv");
        let b = tmp.path().join("b.csv");
        crate::export::write_csv(&build_year(2015, &inputs, &schema).unwrap(), &a).unwrap();
        crate::export::write_csv(&build_year(2015, &inputs, &schema).unwrap(), &b).unwrap();
        assert_eq!(fs::read(&a).unwrap(), fs::read(&b).unwrap());
    }

    #[test]
    fn test_missing_crosswalk_aborts_run_year() {
        let tmp = tempdir().unwrap();
        write_inputs(tmp.path());
        let config = Config::default().with_overrides(Overrides {
            work_dir: Some(tmp.path().to_path_buf()),
            skip_download: true,
            formats: vec![OutputFormat::Csv],
            ..Overrides::default()
        });

        // run_year looks for the .xlsx names, which are not there
        let err = run_year(&config, 2015).unwrap_err();
        assert!(format!("{:#}", err).contains("ZIP-county"), "{:#}", err);
        assert!(!tmp
            .path()
            .join("zipcode_FIPS_cbsa_crosswalk_2015.csv")
            .exists());
    }
}
