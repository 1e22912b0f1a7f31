// src/config.rs

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use crate::{
    export::OutputFormat,
    fetch::SourceUrls,
    schema::{DelineationSchema, SchemaRegistry},
};

/// Run configuration, read from YAML and overlaid with command-line flags.
///
/// Every field has a default, so an empty file (or no file) reproduces a
/// plain 2015 run writing CSV into the current directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Where inputs are read from and downloads are written to.
    pub work_dir: PathBuf,
    /// Where crosswalks are written; defaults to `work_dir`.
    pub output_dir: Option<PathBuf>,
    /// Years to build a crosswalk for, in order.
    pub years: Vec<u16>,
    /// Delineation releases to download.
    pub delineation_years: Vec<u16>,
    /// Fetch Census/OMB files before processing.
    pub download: bool,
    pub formats: Vec<OutputFormat>,
    pub sources: SourceUrls,
    /// Extra or replacement year → delineation layouts.
    pub schemas: BTreeMap<u16, DelineationSchema>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            output_dir: None,
            years: vec![2015],
            delineation_years: vec![2013, 2015, 2017],
            download: true,
            formats: vec![OutputFormat::Csv],
            sources: SourceUrls::default(),
            schemas: BTreeMap::new(),
        }
    }
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub years: Vec<u16>,
    pub work_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub skip_download: bool,
    pub formats: Vec<OutputFormat>,
}

impl Config {
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("parsing configuration")
    }

    /// Read `path` if given, else start from defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => {
                let text = fs::read_to_string(p)
                    .with_context(|| format!("reading config {}", p.display()))?;
                Self::from_yaml(&text).with_context(|| format!("in {}", p.display()))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn with_overrides(mut self, o: Overrides) -> Self {
        if !o.years.is_empty() {
            self.years = o.years;
        }
        if let Some(dir) = o.work_dir {
            self.work_dir = dir;
        }
        if o.output_dir.is_some() {
            self.output_dir = o.output_dir;
        }
        if o.skip_download {
            self.download = false;
        }
        if !o.formats.is_empty() {
            self.formats = o.formats;
        }
        self
    }

    pub fn output_dir(&self) -> &Path {
        self.output_dir.as_deref().unwrap_or(&self.work_dir)
    }

    pub fn registry(&self) -> SchemaRegistry {
        SchemaRegistry::with_overrides(&self.schemas)
    }

    /// Reject configurations that would fail part-way through a run.
    pub fn validate(&self) -> Result<()> {
        if self.years.is_empty() {
            bail!("no years to process");
        }
        if self.formats.is_empty() {
            bail!("no output formats selected");
        }
        let registry = self.registry();
        for &year in &self.years {
            registry.get(year)?;
            if self.download && !self.delineation_years.contains(&year) {
                bail!(
                    "year {} is processed but its delineation is not downloaded (delineation_years: {:?})",
                    year,
                    self.delineation_years
                );
            }
        }
        Ok(())
    }
}
