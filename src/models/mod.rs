//! Data models for chart rendering
//!
//! The input series, the per-call request and the presentation presets.

pub mod chart;
pub mod series;
pub mod style;

// Re-export commonly used types for convenience
pub use chart::{ChartRequest, DEFAULT_STYLE};
pub use series::{Column, PriceSeries};
pub use style::ChartStyle;
