use thiserror::Error;

/// Errors raised while loading or rendering a chart
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),
    #[error("Series is empty")]
    EmptySeries,
    #[error("Column {column} has {found} rows, expected {expected}")]
    LengthMismatch {
        column: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Unknown chart style: '{0}'")]
    InvalidStyle(String),
    #[error("Invalid date: '{0}'")]
    InvalidDate(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse series: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Render error: {0}")]
    Render(String),
}

/// Extract a clean message from a plotters error string
///
/// Drawing errors from the bitmap backend are wrapped as
/// "Drawing backend error: Image Error: <message>". Only the innermost
/// message is kept:
/// "The file extension .txt was not recognized as an image format"
pub fn extract_clean_error(error_msg: &str) -> String {
    if error_msg.contains("backend error:") {
        if let Some(last_colon) = error_msg.rfind(": ") {
            error_msg[last_colon + 2..].trim().to_string()
        } else {
            error_msg.to_string()
        }
    } else {
        error_msg.to_string()
    }
}

/// Wrap a plotters error into a `ChartError::Render` with some context
pub fn render_error(context: &str, error: impl std::fmt::Display) -> ChartError {
    ChartError::Render(format!("{}: {}", context, extract_clean_error(&error.to_string())))
}
