use std::fmt;
use std::io;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Unknown,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = std::convert::Infallible;

    /// Case-insensitive; anything unrecognised is `Unknown`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "low" => RiskLevel::Low,
            "medium" => RiskLevel::Medium,
            "high" => RiskLevel::High,
            _ => RiskLevel::Unknown,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthMetrics {
    /// In [0.5, 1.0].
    pub diversification_score: f64,
    /// In [0.0, 1.0].
    pub stability_score: f64,
    pub risk_level: RiskLevel,
}

/// Normalized health record for one protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolHealth {
    pub name: String,
    pub tvl: f64,
    pub mcap: f64,
    /// Carried for reporting; no aggregate or insight reads it.
    pub mcap_tvl_ratio: f64,
    pub chains: Vec<String>,
    pub category: String,
    pub health_metrics: HealthMetrics,
}

impl ProtocolHealth {
    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.health_metrics.risk_level
    }
}

/// Flat table row: the `ProtocolHealth` columns plus the collection timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolRow {
    pub name: String,
    pub tvl: f64,
    pub mcap: f64,
    pub mcap_tvl_ratio: f64,
    pub chains: Vec<String>,
    pub category: String,
    pub diversification_score: f64,
    pub stability_score: f64,
    pub risk_level: RiskLevel,
    pub timestamp: DateTime<Utc>,
}

pub const CSV_HEADER: [&str; 10] = [
    "name",
    "tvl",
    "mcap",
    "mcap_tvl_ratio",
    "chains",
    "category",
    "diversification_score",
    "stability_score",
    "risk_level",
    "timestamp",
];

/// Scored protocols ordered by TVL descending, stamped once at assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "CollectionParts")]
pub struct ScoredCollection {
    protocols: Vec<ProtocolHealth>,
    timestamp: DateTime<Utc>,
}

/// Wire shape of `ScoredCollection`; deserialization re-sorts through `new`.
#[derive(Deserialize)]
struct CollectionParts {
    protocols: Vec<ProtocolHealth>,
    timestamp: DateTime<Utc>,
}

impl From<CollectionParts> for ScoredCollection {
    fn from(parts: CollectionParts) -> Self {
        ScoredCollection::new(parts.protocols, parts.timestamp)
    }
}

impl ScoredCollection {
    /// Orders `protocols` by TVL descending; equal TVLs keep their input order.
    pub fn new(mut protocols: Vec<ProtocolHealth>, timestamp: DateTime<Utc>) -> Self {
        protocols.sort_by(|a, b| b.tvl.total_cmp(&a.tvl));
        Self { protocols, timestamp }
    }

    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            protocols: Vec::new(),
            timestamp,
        }
    }

    pub fn protocols(&self) -> &[ProtocolHealth] {
        &self.protocols
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn len(&self) -> usize {
        self.protocols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.protocols.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProtocolHealth> {
        self.protocols.iter()
    }

    pub fn tvls(&self) -> Vec<f64> {
        self.protocols.iter().map(|p| p.tvl).collect()
    }

    pub fn rows(&self) -> Vec<ProtocolRow> {
        self.protocols
            .iter()
            .map(|p| ProtocolRow {
                name: p.name.clone(),
                tvl: p.tvl,
                mcap: p.mcap,
                mcap_tvl_ratio: p.mcap_tvl_ratio,
                chains: p.chains.clone(),
                category: p.category.clone(),
                diversification_score: p.health_metrics.diversification_score,
                stability_score: p.health_metrics.stability_score,
                risk_level: p.health_metrics.risk_level,
                timestamp: self.timestamp,
            })
            .collect()
    }

    /// Write the table as CSV; chains are joined with `;`.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), AppError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(CSV_HEADER)?;

        let timestamp = self.timestamp.to_rfc3339();
        for row in self.rows() {
            csv_writer.write_record([
                row.name,
                row.tvl.to_string(),
                row.mcap.to_string(),
                row.mcap_tvl_ratio.to_string(),
                row.chains.join(";"),
                row.category,
                row.diversification_score.to_string(),
                row.stability_score.to_string(),
                row.risk_level.to_string(),
                timestamp.clone(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ScoredCollection {
    type Item = &'a ProtocolHealth;
    type IntoIter = std::slice::Iter<'a, ProtocolHealth>;

    fn into_iter(self) -> Self::IntoIter {
        self.protocols.iter()
    }
}
