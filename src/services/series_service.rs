use std::fs;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::models::{Column, PriceSeries};
use crate::utils::ChartError;

/// Column-oriented series as exported by dataframe tools:
/// `{"Date": [...], "Close": [...], "RSI": [...], ...}`.
/// Missing numeric values arrive as `null`.
#[derive(Debug, Default, Deserialize)]
struct RawSeries {
    #[serde(rename = "Date", default)]
    date: Option<Vec<Value>>,
    #[serde(rename = "Close", default)]
    close: Option<Vec<Option<f64>>>,
    #[serde(rename = "Moving_Average", default)]
    moving_average: Option<Vec<Option<f64>>>,
    #[serde(rename = "RSI", default)]
    rsi: Option<Vec<Option<f64>>>,
    #[serde(rename = "MACD", default)]
    macd: Option<Vec<Option<f64>>>,
    #[serde(rename = "Signal_Line", default)]
    signal_line: Option<Vec<Option<f64>>>,
}

/// Parse a series from its JSON representation
pub fn parse_series_json(json: &str) -> Result<PriceSeries, ChartError> {
    let raw: RawSeries = serde_json::from_str(json)?;

    let mut series = PriceSeries::new();
    let columns = [
        (Column::Close, raw.close),
        (Column::MovingAverage, raw.moving_average),
        (Column::Rsi, raw.rsi),
        (Column::Macd, raw.macd),
        (Column::SignalLine, raw.signal_line),
    ];
    for (column, values) in columns {
        if let Some(values) = values {
            series.set_column(column, values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect());
        }
    }

    if let Some(dates) = raw.date {
        let dates = dates.iter()
            .map(parse_date_value)
            .collect::<Result<Vec<_>, _>>()?;
        series = series.with_dates(dates);
    }

    Ok(series)
}

/// Load a series from a JSON file
pub fn load_series_from_json<P: AsRef<Path>>(path: P) -> Result<PriceSeries, ChartError> {
    let path = path.as_ref();
    debug!("Loading series from {}", path.display());
    let content = fs::read_to_string(path)?;
    let series = parse_series_json(&content)?;
    debug!("Loaded {} rows from {}", series.len(), path.display());
    Ok(series)
}

/// Dates are either epoch milliseconds or date strings
fn parse_date_value(value: &Value) -> Result<DateTime<Utc>, ChartError> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .ok_or_else(|| ChartError::InvalidDate(n.to_string())),
        Value::String(s) => parse_date(s),
        other => Err(ChartError::InvalidDate(other.to_string())),
    }
}

/// Parse a date string
/// Supported: RFC 3339, "YYYY-MM-DD HH:MM:SS", "YYYY-MM-DDTHH:MM:SS", "YYYY-MM-DD"
pub fn parse_date(input: &str) -> Result<DateTime<Utc>, ChartError> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc));
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
        .ok_or_else(|| ChartError::InvalidDate(input.to_string()))
}
