use serde::{Deserialize, Serialize};

use crate::models::RiskLevel;

/// Market-wide statistics over a scored collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketMetrics {
    pub total_tvl: f64,
    pub average_tvl: f64,
    /// Herfindahl-Hirschman index of TVL shares; 0 when total TVL is 0.
    pub tvl_concentration: f64,
    pub chain_distribution: ChainDistribution,
    pub risk_distribution: RiskDistribution,
    pub top_protocols_dominance: TopDominance,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainDistribution {
    /// Up to five `(chain, protocol count)` pairs, most common first.
    pub most_popular_chains: Vec<(String, usize)>,
    pub chain_diversity: usize,
    pub average_chains_per_protocol: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskDistribution {
    pub risk_distribution: RiskCounts,
    pub high_risk_tvl: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskCounts {
    #[serde(rename = "Low")]
    pub low: usize,
    #[serde(rename = "Medium")]
    pub medium: usize,
    #[serde(rename = "High")]
    pub high: usize,
    #[serde(rename = "Unknown")]
    pub unknown: usize,
}

impl RiskCounts {
    pub fn record(&mut self, level: RiskLevel) {
        match level {
            RiskLevel::Low => self.low += 1,
            RiskLevel::Medium => self.medium += 1,
            RiskLevel::High => self.high += 1,
            RiskLevel::Unknown => self.unknown += 1,
        }
    }

    pub fn count(&self, level: RiskLevel) -> usize {
        match level {
            RiskLevel::Low => self.low,
            RiskLevel::Medium => self.medium,
            RiskLevel::High => self.high,
            RiskLevel::Unknown => self.unknown,
        }
    }

    pub fn total(&self) -> usize {
        self.low + self.medium + self.high + self.unknown
    }
}

/// Share of total TVL held by the largest protocols, in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TopDominance {
    pub top_3_dominance: f64,
    pub top_5_dominance: f64,
    pub top_10_dominance: f64,
}
