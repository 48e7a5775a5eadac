use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotebookImageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Directory traversal error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Environment variable {var} is not set. Export it before running, e.g. 'export {var}=your_token'")]
    MissingCredential { var: String },

    #[error("Root directory not found: {}", path.display())]
    RootNotFound { path: PathBuf },

    #[error("Upload failed: {status} - {body}")]
    UploadRejected { status: u16, body: String },

    #[error("Malformed upload response: {reason}")]
    MalformedResponse { reason: String },

    #[error("Invalid payload pattern: {reason}")]
    Pattern { reason: String },

    #[error("Span {start}..{end} no longer matches the scanned payload")]
    StaleSpan { start: usize, end: usize },
}

pub type Result<T> = std::result::Result<T, NotebookImageError>;
