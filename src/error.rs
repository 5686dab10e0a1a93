use thiserror::Error;

use crate::notion::NotionApiError;

#[derive(Debug, Error)]
pub enum Chat2NotionError {
    #[error("CSV file is not valid: {0}")]
    MalformedCsv(String),

    #[error("CSV file has no data rows")]
    EmptyCsv,

    #[error("date column not found; expected a header containing Date, Time, 날짜 or 시간")]
    MissingDateColumn,

    #[error("no rows with a recognizable date were found; check the CSV date format")]
    NoDatedRows,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("output directory not found: {0}")]
    OutputDirNotFound(String),

    #[error("Filesystem error: {0}")]
    Filesystem(String),

    #[error("{}", .0.describe())]
    Notion(#[from] NotionApiError),
}

impl Chat2NotionError {
    /// Returns `true` for errors caused by the request itself (bad input or a
    /// rejected external call) as opposed to a server-side failure.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Filesystem(_))
    }

    /// The external service error code, when the failure came from Notion.
    pub fn external_code(&self) -> Option<&str> {
        match self {
            Self::Notion(err) => err.code.as_deref(),
            _ => None,
        }
    }
}
