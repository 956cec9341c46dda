pub mod errors;
pub mod stats;

pub use errors::{ChartError, extract_clean_error};
