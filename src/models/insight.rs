use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Size,
    Diversity,
    Risk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightLevel {
    High,
    Positive,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub level: InsightLevel,
    pub message: String,
}

/// Insight tags for one protocol; `insights` is empty when no rule fired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolInsights {
    pub name: String,
    pub insights: Vec<Insight>,
}
