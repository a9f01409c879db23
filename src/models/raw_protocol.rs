use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::utils::math::safe_float;

/// One protocol entry exactly as received from the listing endpoint.
///
/// Kept untyped: upstream records are partially populated and occasionally
/// malformed, and coercion happens only when the record is scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawProtocolRecord(Value);

impl RawProtocolRecord {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        self.0.as_object()
    }

    /// Field lookup; null counts as absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    /// TVL under the safe-float rule, as used for ranking.
    pub fn tvl(&self) -> f64 {
        safe_float(self.get("tvl"))
    }

    /// Best-effort name for log lines.
    pub fn display_name(&self) -> &str {
        self.get("name").and_then(Value::as_str).unwrap_or("Unknown")
    }
}

impl From<Value> for RawProtocolRecord {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}
