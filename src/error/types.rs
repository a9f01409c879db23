use thiserror::Error;

/// Application-wide error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::ExternalApiError(format!("HTTP request error: {}", err))
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::ConfigError(format!("Invalid URL: {}", err))
    }
}

/// Failure to obtain the raw protocol listing from a source.
///
/// Never escapes the pipeline: it is absorbed into an empty collection and
/// reported through the diagnostic sink.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("Unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Malformed payload from {url}: {message}")]
    MalformedPayload { url: String, message: String },

    #[error("Cannot read {path}: {message}")]
    Io { path: String, message: String },
}

/// A single raw record that could not be scored.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("Record is not a JSON object")]
    NotAnObject,

    #[error("Field '{field}' is not {expected}")]
    InvalidField { field: String, expected: String },
}

impl RecordError {
    pub fn invalid_field(field: &str, expected: &str) -> Self {
        RecordError::InvalidField {
            field: field.to_string(),
            expected: expected.to_string(),
        }
    }
}
