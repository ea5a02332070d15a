//! Error types shared by the portal client and the license pipeline.

use thiserror::Error;

/// Everything the portal client and the license pipeline can fail with.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A requested region code is missing from the region reference.
    #[error("region code {0} is absent in reference")]
    RegionCodeAbsent(u32),

    /// Network-level failure: connection, TLS, or timeout.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A non-success HTTP status where a success was required.
    #[error("HTTP {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// A downloaded archive could not be read.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// A spreadsheet member could not be opened or read.
    #[error("workbook error: {0}")]
    Workbook(#[from] calamine::XlsxError),

    /// The workbook contains no worksheets.
    #[error("workbook contains no worksheets")]
    WorksheetAbsent,

    /// A non-blank date cell that does not match its expected format.
    #[error("value {value:?} does not match date format {format}")]
    DateFormat { value: String, format: &'static str },

    #[error("invalid JSON in response body: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;
