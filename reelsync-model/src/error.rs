use std::fmt::{self, Display};

/// Errors produced by model constructors and validation routines.
#[derive(Debug)]
pub enum ModelError {
    InvalidUrl { raw: String, source: url::ParseError },
    InvalidMarker { start: f64, end: f64 },
    UnknownCategory(String),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::InvalidUrl { raw, source } => {
                write!(f, "invalid url '{raw}': {source}")
            }
            ModelError::InvalidMarker { start, end } => {
                write!(f, "invalid skip marker: start={start} end={end}")
            }
            ModelError::UnknownCategory(raw) => {
                write!(f, "unknown category '{raw}' (expected sub or dub)")
            }
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::InvalidUrl { source, .. } => Some(source),
            ModelError::InvalidMarker { .. } | ModelError::UnknownCategory(_) => {
                None
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;

pub(crate) fn parse_url(raw: &str) -> Result<url::Url> {
    url::Url::parse(raw).map_err(|source| ModelError::InvalidUrl {
        raw: raw.to_string(),
        source,
    })
}
