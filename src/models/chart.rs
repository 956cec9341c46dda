//! Chart request models

/// Style used when a request does not name one
pub const DEFAULT_STYLE: &str = "default";

/// Identifying metadata and output options for one rendered chart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartRequest {
    pub ticker: String,
    pub period: String,
    pub filename: Option<String>,
    pub style: Option<String>,
}

impl ChartRequest {
    pub fn new(ticker: impl Into<String>, period: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            period: period.into(),
            filename: None,
            style: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    /// Output file name; `{ticker}_{period}.png` unless one was supplied.
    /// Ticker and period are interpolated as-is.
    pub fn file_name(&self) -> String {
        match &self.filename {
            Some(name) => name.clone(),
            None => format!("{}_{}.png", self.ticker, self.period),
        }
    }

    pub fn style_name(&self) -> &str {
        self.style.as_deref().unwrap_or(DEFAULT_STYLE)
    }
}
