use thiserror::Error;

/// Why a search produced no results.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid target {field}: {value:?} is not a positive integer")]
    InvalidDimension { field: &'static str, value: String },

    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("search API returned {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("malformed search response: {0}")]
    Parse(String),

    #[error("search task did not complete: {0}")]
    Task(String),
}

/// Why a wallpaper could not be applied.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("failed to download {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("failed to read screen size: {0}")]
    ScreenMetrics(String),

    #[error("{0}")]
    Setter(String),

    #[error("apply task did not complete: {0}")]
    Task(String),
}

impl ApplyError {
    /// True when the image never made it into memory as a usable raster.
    pub fn is_load_failure(&self) -> bool {
        matches!(self, ApplyError::Fetch { .. } | ApplyError::Decode(_))
    }
}
