//! Multi-panel stock indicator charts rendered to image files.
//!
//! A chart stacks a price panel (close, optional moving average and a one
//! standard deviation band), an RSI panel and a MACD panel. Indicator
//! columns are supplied pre-computed.

pub mod config;
pub mod models;
pub mod services;
pub mod utils;

pub use models::{ChartRequest, ChartStyle, Column, PriceSeries};
pub use services::{load_series_from_json, render_chart, ChartRenderer};
pub use utils::ChartError;
