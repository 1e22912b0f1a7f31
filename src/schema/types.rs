// src/schema/types.rs

use serde::{Deserialize, Serialize};

/// Column names shared by every delineation release we support.
pub const CBSA_CODE_COLUMN: &str = "CBSA Code";
pub const CBSA_TITLE_COLUMN: &str = "CBSA Title";
pub const AREA_TYPE_COLUMN: &str = "Metropolitan/Micropolitan Statistical Area";

/// Layout of one year's OMB delineation sheet (`list1.xls`) once converted to CSV.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct DelineationSchema {
    /// Header of the metropolitan-division column; OMB renamed it between releases.
    pub metro_division_column: String,
    /// Title rows above the header row.
    #[serde(default = "default_skip_rows")]
    pub skip_rows: usize,
    /// Note and source rows below the data.
    #[serde(default)]
    pub footer_rows: usize,
}

fn default_skip_rows() -> usize {
    2
}

impl DelineationSchema {
    pub fn new(metro_division_column: &str, skip_rows: usize, footer_rows: usize) -> Self {
        Self {
            metro_division_column: metro_division_column.to_string(),
            skip_rows,
            footer_rows,
        }
    }
}
