// src/process/mod.rs
pub mod cbsa;
pub mod county;
pub mod crosswalk;
pub mod dedup;
pub mod join;
pub mod raw_table;
pub mod sheet;
pub mod utils;

pub use cbsa::{load_cbsa_names, AreaType, CbsaName};
pub use county::{fips_code, load_county_names, CountyName};
pub use crosswalk::{load_crosswalk, CrosswalkKind, ZipArea};
pub use dedup::{keep_max_share, ZipShare};
pub use join::{build_crosswalk, CrosswalkRow, CrosswalkSummary};
pub use raw_table::RawTable;
