pub mod store;
pub mod types;

pub use store::SchemaRegistry;
pub use types::{DelineationSchema, AREA_TYPE_COLUMN, CBSA_CODE_COLUMN, CBSA_TITLE_COLUMN};
