use crate::config::InsightThresholds;
use crate::models::{Insight, InsightKind, InsightLevel, ProtocolHealth, ProtocolInsights, RiskLevel, ScoredCollection};

/// Threshold-based insight tags per protocol.
#[derive(Debug, Clone, Default)]
pub struct InsightGenerator {
    thresholds: InsightThresholds,
}

impl InsightGenerator {
    pub fn new(thresholds: InsightThresholds) -> Self {
        Self { thresholds }
    }

    /// One entry per protocol, in collection order, even when no rule fires.
    pub fn generate(&self, collection: &ScoredCollection) -> Vec<ProtocolInsights> {
        collection
            .iter()
            .map(|protocol| ProtocolInsights {
                name: protocol.name.clone(),
                insights: self.insights_for(protocol),
            })
            .collect()
    }

    pub fn insights_for(&self, protocol: &ProtocolHealth) -> Vec<Insight> {
        let t = &self.thresholds;
        let mut insights = Vec::new();

        if protocol.tvl > t.major_protocol_tvl_usd {
            insights.push(Insight {
                kind: InsightKind::Size,
                level: InsightLevel::High,
                message: format!("Major protocol with ${:.1}B TVL", protocol.tvl / 1e9),
            });
        }

        let chain_count = protocol.chain_count();
        if chain_count > t.high_diversity_chain_count {
            insights.push(Insight {
                kind: InsightKind::Diversity,
                level: InsightLevel::Positive,
                message: format!("High chain diversity with {} chains", chain_count),
            });
        } else if chain_count < t.limited_diversity_chain_count {
            insights.push(Insight {
                kind: InsightKind::Diversity,
                level: InsightLevel::Warning,
                message: format!("Limited chain diversity with only {} chains", chain_count),
            });
        }

        if protocol.risk_level() == RiskLevel::High {
            insights.push(Insight {
                kind: InsightKind::Risk,
                level: InsightLevel::Warning,
                message: "High risk protocol - extra caution advised".to_string(),
            });
        }

        insights
    }
}
