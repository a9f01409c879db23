use serde::{Deserialize, Serialize};

/// Classification and normalization policy for protocol health scoring.
///
/// Every cutoff used by `HealthScorer` lives here so the policy can be tuned
/// and tested independently of the scoring code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringThresholds {
    /// Chain count at which the chain contribution saturates.
    pub chain_saturation_count: f64,
    pub chain_score_cap: f64,
    /// Placeholder token-distribution contribution added to every
    /// diversification score.
    pub token_distribution_score: f64,
    pub tvl_normalizer_usd: f64,
    pub tvl_score_cap: f64,
    pub age_normalizer_days: f64,
    pub age_score_cap: f64,
    /// TVL strictly above this lands in the lowest risk bucket.
    pub low_risk_tvl_usd: f64,
    /// TVL strictly above this (and not above `low_risk_tvl_usd`) lands in the middle bucket.
    pub medium_risk_tvl_usd: f64,
    pub low_risk_chain_count: usize,
    pub medium_risk_chain_count: usize,
    /// Highest summed risk score still classified `Low`.
    pub low_risk_max_score: u8,
    /// Highest summed risk score still classified `Medium`.
    pub medium_risk_max_score: u8,
}

impl Default for ScoringThresholds {
    fn default() -> Self {
        Self {
            chain_saturation_count: 10.0,
            chain_score_cap: 0.5,
            token_distribution_score: 0.5,
            tvl_normalizer_usd: 1_000_000_000.0, // $1B
            tvl_score_cap: 0.6,
            age_normalizer_days: 365.0,
            age_score_cap: 0.4,
            low_risk_tvl_usd: 1_000_000_000.0,  // >$1B
            medium_risk_tvl_usd: 100_000_000.0, // >$100M
            low_risk_chain_count: 5,
            medium_risk_chain_count: 2,
            low_risk_max_score: 3,
            medium_risk_max_score: 5,
        }
    }
}

/// Cutoffs for the per-protocol insight tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightThresholds {
    pub major_protocol_tvl_usd: f64,
    pub high_diversity_chain_count: usize,
    pub limited_diversity_chain_count: usize,
}

impl Default for InsightThresholds {
    fn default() -> Self {
        Self {
            major_protocol_tvl_usd: 10_000_000_000.0, // $10B
            high_diversity_chain_count: 10,
            limited_diversity_chain_count: 3,
        }
    }
}
