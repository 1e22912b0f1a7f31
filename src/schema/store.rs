// src/schema/store.rs

use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use tracing::debug;

use super::DelineationSchema;

/// Year → delineation layout lookup.
///
/// Built-in entries cover the releases the pipeline has been run against;
/// configuration can add new years or override existing ones.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    by_year: BTreeMap<u16, DelineationSchema>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        let mut by_year = BTreeMap::new();
        by_year.insert(2013, DelineationSchema::new("Metro Division Code", 2, 3));
        by_year.insert(2015, DelineationSchema::new("Metropolitan Division Code", 2, 4));
        by_year.insert(2017, DelineationSchema::new("Metropolitan Division Code", 2, 4));
        Self { by_year }
    }
}

impl SchemaRegistry {
    /// Built-in entries overlaid with `overrides`.
    pub fn with_overrides(overrides: &BTreeMap<u16, DelineationSchema>) -> Self {
        let mut registry = Self::default();
        for (year, schema) in overrides {
            debug!(year, column = %schema.metro_division_column, "delineation schema override");
            registry.by_year.insert(*year, schema.clone());
        }
        registry
    }

    pub fn get(&self, year: u16) -> Result<&DelineationSchema> {
        self.by_year.get(&year).ok_or_else(|| {
            anyhow!(
                "no delineation schema for year {} (known: {:?})",
                year,
                self.years()
            )
        })
    }

    pub fn years(&self) -> Vec<u16> {
        self.by_year.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_division_columns() {
        let reg = SchemaRegistry::default();
        assert_eq!(
            reg.get(2013).unwrap().metro_division_column,
            "Metro Division Code"
        );
        assert_eq!(
            reg.get(2015).unwrap().metro_division_column,
            "Metropolitan Division Code"
        );
        assert_eq!(reg.get(2013).unwrap().footer_rows, 3);
        assert_eq!(reg.get(2015).unwrap().footer_rows, 4);
    }

    #[test]
    fn test_unknown_year_is_an_error() {
        let reg = SchemaRegistry::default();
        let err = reg.get(1999).unwrap_err().to_string();
        assert!(err.contains("1999"), "{}", err);
    }

    #[test]
    fn test_overrides_replace_and_extend() {
        let mut overrides = BTreeMap::new();
        overrides.insert(2015, DelineationSchema::new("Division", 1, 0));
        overrides.insert(2020, DelineationSchema::new("Metropolitan Division Code", 2, 4));
        let reg = SchemaRegistry::with_overrides(&overrides);

        assert_eq!(reg.get(2015).unwrap().metro_division_column, "Division");
        assert_eq!(reg.get(2015).unwrap().skip_rows, 1);
        assert!(reg.get(2020).is_ok());
        assert_eq!(reg.years(), vec![2013, 2015, 2017, 2020]);
    }

    #[test]
    fn test_schema_from_yaml_defaults() {
        let schema: DelineationSchema =
            serde_yaml::from_str("metro_division_column: Metro Division Code\n").unwrap();
        assert_eq!(schema.skip_rows, 2);
        assert_eq!(schema.footer_rows, 0);
    }
}
