// src/fetch/urls.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use url::Url;

use crate::process::county::COUNTY_FILE;

pub const CENSUS_COUNTY_BASE_URL: &str = "https://www2.census.gov/geo/docs/reference/codes/files/";
pub const DELINEATION_BASE_URL: &str =
    "https://www2.census.gov/programs-surveys/metro-micro/geographies/reference-files/";
pub const DELINEATION_FILE: &str = "list1.xls";

/// Where the Census reference files live. Base URLs must end in `/`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SourceUrls {
    pub county_base_url: String,
    pub delineation_base_url: String,
    /// Workbook name inside each year's `delineation-files/` directory.
    pub delineation_file: String,
}

impl Default for SourceUrls {
    fn default() -> Self {
        Self {
            county_base_url: CENSUS_COUNTY_BASE_URL.to_string(),
            delineation_base_url: DELINEATION_BASE_URL.to_string(),
            delineation_file: DELINEATION_FILE.to_string(),
        }
    }
}

impl SourceUrls {
    /// `<county base>/national_county.txt`
    pub fn county_url(&self) -> Result<Url> {
        let base = Url::parse(&self.county_base_url)
            .with_context(|| format!("parsing county base URL {}", self.county_base_url))?;
        base.join(COUNTY_FILE)
            .with_context(|| format!("joining {} onto {}", COUNTY_FILE, base))
    }

    /// `<delineation base>/<year>/delineation-files/<delineation file>`
    pub fn delineation_url(&self, year: u16) -> Result<Url> {
        let base = Url::parse(&self.delineation_base_url).with_context(|| {
            format!("parsing delineation base URL {}", self.delineation_base_url)
        })?;
        let rel = format!("{}/delineation-files/{}", year, self.delineation_file);
        base.join(&rel)
            .with_context(|| format!("joining {} onto {}", rel, base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_urls() {
        let urls = SourceUrls::default();
        assert_eq!(
            urls.county_url().unwrap().as_str(),
            "https://www2.census.gov/geo/docs/reference/codes/files/national_county.txt"
        );
        assert_eq!(
            urls.delineation_url(2015).unwrap().as_str(),
            "https://www2.census.gov/programs-surveys/metro-micro/geographies/reference-files/2015/delineation-files/list1.xls"
        );
    }

    #[test]
    fn test_delineation_file_is_configurable() {
        let urls = SourceUrls {
            delineation_file: "list1.xlsx".into(),
            ..SourceUrls::default()
        };
        assert!(urls
            .delineation_url(2023)
            .unwrap()
            .as_str()
            .ends_with("/2023/delineation-files/list1.xlsx"));
    }

    #[test]
    fn test_bad_base_url() {
        let urls = SourceUrls {
            county_base_url: "not a url".into(),
            ..SourceUrls::default()
        };
        assert!(urls.county_url().is_err());
    }
}
