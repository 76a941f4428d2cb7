//! Error types for the RWX loading pipeline.
//!
//! Only failures that the spec actually treats as fatal get a variant here:
//! network errors, archive-open errors, and format errors that leave a
//! caller with nothing useful. Recoverable parse conditions (unmatched
//! `*end`, out-of-range indices, unknown directives) are never represented
//! as [`RwxError`] — they are logged and the parse continues.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RwxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("network fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("asset not found: {0}")]
    NotFound(String),

    #[error("feature not enabled: {0}")]
    FeatureNotEnabled(&'static str),

    #[error("image decode failed: {0}")]
    ImageDecode(String),
}

pub type Result<T> = std::result::Result<T, RwxError>;

impl From<image::ImageError> for RwxError {
    fn from(err: image::ImageError) -> Self {
        RwxError::ImageDecode(err.to_string())
    }
}
