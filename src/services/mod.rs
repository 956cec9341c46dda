pub mod chart_service;
pub mod series_service;

pub use chart_service::{render_chart, ChartRenderer};
pub use series_service::{load_series_from_json, parse_series_json};
