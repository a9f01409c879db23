use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::config::ScoringThresholds;
use crate::error::RecordError;
use crate::models::{Diagnostic, HealthMetrics, ProtocolHealth, RawProtocolRecord, RiskLevel};
use crate::services::DiagnosticSink;
use crate::utils::math::{bounded_amount, non_negative, ratio_or_zero, safe_float};
use crate::utils::time::{age_in_days, timestamp_from_value};

/// Largest value `risk_score` can produce (worst bucket on both factors).
pub const MAX_RISK_SCORE: u8 = 6;

const UNKNOWN: &str = "Unknown";

/// Turns raw protocol records into `ProtocolHealth`.
#[derive(Debug, Clone, Default)]
pub struct HealthScorer {
    thresholds: ScoringThresholds,
}

impl HealthScorer {
    pub fn new(thresholds: ScoringThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &ScoringThresholds {
        &self.thresholds
    }

    /// Score one record against the current time.
    pub fn score(&self, raw: &RawProtocolRecord, sink: &dyn DiagnosticSink) -> Option<ProtocolHealth> {
        self.score_at(raw, Utc::now(), sink)
    }

    /// Score one record with ages measured up to `now`. A malformed record is
    /// reported to `sink` and yields `None`.
    pub fn score_at(
        &self,
        raw: &RawProtocolRecord,
        now: DateTime<Utc>,
        sink: &dyn DiagnosticSink,
    ) -> Option<ProtocolHealth> {
        debug!("Processing protocol: {}", raw.display_name());

        match self.try_score(raw, now) {
            Ok(health) => Some(health),
            Err(e) => {
                sink.report(Diagnostic::RecordMalformed {
                    name: raw.display_name().to_string(),
                    reason: e.to_string(),
                });
                None
            }
        }
    }

    pub fn try_score(&self, raw: &RawProtocolRecord, now: DateTime<Utc>) -> Result<ProtocolHealth, RecordError> {
        raw.as_object().ok_or(RecordError::NotAnObject)?;

        let name = string_field(raw, "name")?;
        let category = string_field(raw, "category")?;
        let chains = chains_field(raw)?;

        let tvl = bounded_amount(safe_float(raw.get("tvl")));
        let mcap = bounded_amount(safe_float(raw.get("mcap")));

        // Missing or unparseable creation dates count as brand new.
        let age_days = timestamp_from_value(raw.get("created_at"))
            .map(|created| age_in_days(created, now))
            .unwrap_or(0.0);

        let health_metrics = HealthMetrics {
            diversification_score: self.diversification_score(chains.len()),
            stability_score: self.stability_score(tvl, age_days),
            risk_level: self.risk_level(tvl, chains.len()),
        };

        Ok(ProtocolHealth {
            name,
            tvl,
            mcap,
            mcap_tvl_ratio: ratio_or_zero(mcap, tvl),
            chains,
            category,
            health_metrics,
        })
    }

    /// Chain contribution (saturating) plus the fixed token-distribution term.
    pub fn diversification_score(&self, chain_count: usize) -> f64 {
        let t = &self.thresholds;
        let chain_score = (chain_count as f64 / t.chain_saturation_count).min(t.chain_score_cap);
        chain_score + t.token_distribution_score
    }

    pub fn stability_score(&self, tvl: f64, age_days: f64) -> f64 {
        let t = &self.thresholds;
        let tvl_score = (non_negative(tvl) / t.tvl_normalizer_usd).min(t.tvl_score_cap);
        let age_score = (non_negative(age_days) / t.age_normalizer_days).min(t.age_score_cap);
        tvl_score + age_score
    }

    /// Sum of the TVL bucket and the chain-count bucket, each 1 (safest) to 3.
    pub fn risk_score(&self, tvl: f64, chain_count: usize) -> u8 {
        let t = &self.thresholds;

        let tvl_bucket = if tvl > t.low_risk_tvl_usd {
            1
        } else if tvl > t.medium_risk_tvl_usd {
            2
        } else {
            3
        };

        let chain_bucket = if chain_count > t.low_risk_chain_count {
            1
        } else if chain_count > t.medium_risk_chain_count {
            2
        } else {
            3
        };

        tvl_bucket + chain_bucket
    }

    pub fn risk_level(&self, tvl: f64, chain_count: usize) -> RiskLevel {
        self.classify(self.risk_score(tvl, chain_count))
    }

    pub fn classify(&self, risk_score: u8) -> RiskLevel {
        match risk_score {
            s if s <= self.thresholds.low_risk_max_score => RiskLevel::Low,
            s if s <= self.thresholds.medium_risk_max_score => RiskLevel::Medium,
            s if s <= MAX_RISK_SCORE => RiskLevel::High,
            _ => RiskLevel::Unknown,
        }
    }
}

fn string_field(raw: &RawProtocolRecord, field: &str) -> Result<String, RecordError> {
    match raw.get(field) {
        None => Ok(UNKNOWN.to_string()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(RecordError::invalid_field(field, "a string")),
    }
}

fn chains_field(raw: &RawProtocolRecord) -> Result<Vec<String>, RecordError> {
    match raw.get("chains") {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| RecordError::invalid_field("chains", "a list of strings"))
            })
            .collect(),
        Some(_) => Err(RecordError::invalid_field("chains", "a list of strings")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::CollectingSink;
    use crate::utils::math::MAX_AMOUNT_USD;
    use chrono::Duration;
    use serde_json::json;

    fn record(value: Value) -> RawProtocolRecord {
        RawProtocolRecord::new(value)
    }

    fn chain_names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("Chain{}", i)).collect()
    }

    #[test]
    fn test_empty_record_defaults() {
        let scorer = HealthScorer::default();
        let health = scorer.try_score(&record(json!({})), Utc::now()).unwrap();

        assert_eq!(health.name, "Unknown");
        assert_eq!(health.category, "Unknown");
        assert_eq!(health.tvl, 0.0);
        assert_eq!(health.mcap, 0.0);
        assert_eq!(health.mcap_tvl_ratio, 0.0);
        assert!(health.chains.is_empty());
        assert_eq!(health.health_metrics.diversification_score, 0.5);
        assert_eq!(health.health_metrics.stability_score, 0.0);
        assert_eq!(health.health_metrics.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_large_multichain_mature_protocol() {
        let scorer = HealthScorer::default();
        let now = Utc::now();
        let created = (now - Duration::days(400)).to_rfc3339();
        let raw = record(json!({
            "name": "Aave",
            "tvl": 2_000_000_000.0,
            "mcap": 1_000_000_000.0,
            "chains": chain_names(12),
            "category": "Lending",
            "created_at": created,
        }));

        let health = scorer.try_score(&raw, now).unwrap();
        assert_eq!(health.health_metrics.diversification_score, 1.0);
        assert!((health.health_metrics.stability_score - 1.0).abs() < 1e-9);
        assert_eq!(scorer.risk_score(health.tvl, health.chain_count()), 2);
        assert_eq!(health.risk_level(), RiskLevel::Low);
        assert_eq!(health.mcap_tvl_ratio, 0.5);
    }

    #[test]
    fn test_risk_buckets() {
        let scorer = HealthScorer::default();
        assert_eq!(scorer.risk_score(1e9 + 1.0, 6), 2);
        assert_eq!(scorer.risk_score(1e9, 6), 3);
        assert_eq!(scorer.risk_score(1e8 + 1.0, 3), 4);
        assert_eq!(scorer.risk_score(1e8, 3), 5);
        assert_eq!(scorer.risk_score(0.0, 2), 6);

        assert_eq!(scorer.classify(3), RiskLevel::Low);
        assert_eq!(scorer.classify(4), RiskLevel::Medium);
        assert_eq!(scorer.classify(5), RiskLevel::Medium);
        assert_eq!(scorer.classify(6), RiskLevel::High);
        assert_eq!(scorer.classify(7), RiskLevel::Unknown);
    }

    #[test]
    fn test_string_and_epoch_inputs_are_coerced() {
        let scorer = HealthScorer::default();
        let now = Utc::now();
        let created = (now - Duration::days(73)).timestamp();
        let raw = record(json!({
            "name": "Curve",
            "tvl": "500000000",
            "mcap": "not a number",
            "chains": ["Ethereum", "Arbitrum", "Polygon"],
            "created_at": created,
        }));

        let health = scorer.try_score(&raw, now).unwrap();
        assert_eq!(health.tvl, 5e8);
        assert_eq!(health.mcap, 0.0);
        assert!((health.health_metrics.stability_score - 0.7).abs() < 1e-3);
        assert_eq!(health.risk_level(), RiskLevel::Medium);
    }

    #[test]
    fn test_epoch_string_created_at() {
        let scorer = HealthScorer::default();
        let now = Utc::now();
        let created = (now - Duration::days(400)).timestamp().to_string();
        let raw = record(json!({"tvl": 0.0, "created_at": created}));

        let health = scorer.try_score(&raw, now).unwrap();
        assert!((health.health_metrics.stability_score - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_unparseable_created_at_counts_as_new() {
        let scorer = HealthScorer::default();
        let raw = record(json!({"tvl": 100_000_000.0, "created_at": "someday"}));
        let health = scorer.try_score(&raw, Utc::now()).unwrap();
        assert!((health.health_metrics.stability_score - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_negative_tvl_is_clamped() {
        let scorer = HealthScorer::default();
        let health = scorer
            .try_score(&record(json!({"tvl": -5.0, "mcap": 10.0})), Utc::now())
            .unwrap();
        assert_eq!(health.tvl, 0.0);
        assert_eq!(health.mcap_tvl_ratio, 0.0);
    }

    #[test]
    fn test_huge_amounts_are_capped() {
        let scorer = HealthScorer::default();
        let health = scorer
            .try_score(&record(json!({"tvl": "1e308", "mcap": 1e300})), Utc::now())
            .unwrap();
        assert_eq!(health.tvl, MAX_AMOUNT_USD);
        assert_eq!(health.mcap, MAX_AMOUNT_USD);
        assert_eq!(health.mcap_tvl_ratio, 1.0);
    }

    #[test]
    fn test_malformed_records_are_reported() {
        let scorer = HealthScorer::default();
        let sink = CollectingSink::new();

        assert!(scorer.score(&record(json!("oops")), &sink).is_none());
        assert!(scorer
            .score(&record(json!({"name": "Bad", "chains": "Ethereum"})), &sink)
            .is_none());
        assert!(scorer
            .score(&record(json!({"name": "Bad", "chains": ["Ethereum", 1]})), &sink)
            .is_none());
        assert!(scorer.score(&record(json!({"name": 42})), &sink).is_none());

        let diagnostics = sink.diagnostics();
        assert_eq!(diagnostics.len(), 4);
        assert_eq!(
            diagnostics[1],
            Diagnostic::RecordMalformed {
                name: "Bad".to_string(),
                reason: "Field 'chains' is not a list of strings".to_string(),
            }
        );
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = ScoringThresholds {
            low_risk_tvl_usd: 1_000.0,
            medium_risk_tvl_usd: 100.0,
            ..ScoringThresholds::default()
        };
        let scorer = HealthScorer::new(thresholds);
        assert_eq!(scorer.risk_level(5_000.0, 10), RiskLevel::Low);
        assert_eq!(scorer.risk_level(500.0, 1), RiskLevel::Medium);
    }
}
