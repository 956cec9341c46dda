//! Column-oriented price series

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::utils::ChartError;

/// Numeric columns a series may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    Close,
    MovingAverage,
    Rsi,
    Macd,
    SignalLine,
}

impl Column {
    /// Columns every rendered chart needs
    pub const REQUIRED: [Column; 4] = [Column::Close, Column::Rsi, Column::Macd, Column::SignalLine];

    /// Column name as it appears in exported data files
    pub fn name(&self) -> &'static str {
        match self {
            Column::Close => "Close",
            Column::MovingAverage => "Moving_Average",
            Column::Rsi => "RSI",
            Column::Macd => "MACD",
            Column::SignalLine => "Signal_Line",
        }
    }
}

/// Index-aligned observations with an optional date column.
///
/// Columns are kept in a map so a series can be built without any of them;
/// the renderer decides which ones it needs.
#[derive(Debug, Clone, Default)]
pub struct PriceSeries {
    dates: Option<Vec<DateTime<Utc>>>,
    columns: BTreeMap<Column, Vec<f64>>,
}

impl PriceSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dates(mut self, dates: Vec<DateTime<Utc>>) -> Self {
        self.dates = Some(dates);
        self
    }

    pub fn with_column(mut self, column: Column, values: Vec<f64>) -> Self {
        self.columns.insert(column, values);
        self
    }

    pub fn set_column(&mut self, column: Column, values: Vec<f64>) {
        self.columns.insert(column, values);
    }

    pub fn remove_column(&mut self, column: Column) -> Option<Vec<f64>> {
        self.columns.remove(&column)
    }

    pub fn dates(&self) -> Option<&[DateTime<Utc>]> {
        self.dates.as_deref()
    }

    pub fn column(&self, column: Column) -> Option<&[f64]> {
        self.columns.get(&column).map(Vec::as_slice)
    }

    /// Look up a column that must be present
    pub fn require(&self, column: Column) -> Result<&[f64], ChartError> {
        self.column(column).ok_or(ChartError::MissingColumn(column.name()))
    }

    /// Number of rows, taken from the close column
    pub fn len(&self) -> usize {
        self.column(Column::Close).map_or(0, <[f64]>::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check required columns exist, are non-empty and every present
    /// column (dates included) has the same length. Returns the row count.
    pub fn validate(&self) -> Result<usize, ChartError> {
        for column in Column::REQUIRED {
            self.require(column)?;
        }

        let expected = self.len();
        if expected == 0 {
            return Err(ChartError::EmptySeries);
        }

        for (column, values) in &self.columns {
            if values.len() != expected {
                return Err(ChartError::LengthMismatch {
                    column: column.name(),
                    expected,
                    found: values.len(),
                });
            }
        }

        if let Some(dates) = &self.dates {
            if dates.len() != expected {
                return Err(ChartError::LengthMismatch {
                    column: "Date",
                    expected,
                    found: dates.len(),
                });
            }
        }

        Ok(expected)
    }
}
