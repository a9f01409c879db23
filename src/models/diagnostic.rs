use std::fmt;

use serde::{Deserialize, Serialize};

/// A data-quality condition absorbed by the pipeline instead of raised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The source produced no usable listing.
    SourceUnavailable { source: String, reason: String },
    /// The source answered but with nothing in it.
    SourceEmpty { source: String },
    /// One record was dropped from the batch.
    RecordMalformed { name: String, reason: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::SourceUnavailable { source, reason } => {
                write!(f, "Source {} unavailable: {}", source, reason)
            }
            Diagnostic::SourceEmpty { source } => write!(f, "No data received from {}", source),
            Diagnostic::RecordMalformed { name, reason } => {
                write!(f, "Error calculating metrics for {}: {}", name, reason)
            }
        }
    }
}
