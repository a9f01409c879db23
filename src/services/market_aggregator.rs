use std::collections::HashMap;

use crate::models::{
    ChainDistribution, MarketMetrics, RiskCounts, RiskDistribution, RiskLevel, ScoredCollection, TopDominance,
};
use crate::utils::math::{herfindahl_index, percentage_of, ratio_or_zero, sum_of_largest};

/// Number of chains reported in `most_popular_chains`.
pub const TOP_CHAINS: usize = 5;

/// Market-wide statistics. Total over any collection, including the empty one.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarketAggregator;

impl MarketAggregator {
    pub fn new() -> Self {
        Self
    }

    pub fn aggregate(&self, collection: &ScoredCollection) -> MarketMetrics {
        let tvls = collection.tvls();
        let total_tvl: f64 = tvls.iter().sum();

        MarketMetrics {
            total_tvl,
            average_tvl: ratio_or_zero(total_tvl, tvls.len() as f64),
            tvl_concentration: herfindahl_index(&tvls),
            chain_distribution: self.chain_distribution(collection),
            risk_distribution: self.risk_distribution(collection),
            top_protocols_dominance: self.top_dominance(collection),
        }
    }

    /// Each protocol adds one to every chain it lists. Ties keep first-seen order.
    pub fn chain_distribution(&self, collection: &ScoredCollection) -> ChainDistribution {
        let mut counts: Vec<(String, usize)> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut memberships = 0usize;

        for protocol in collection {
            for chain in &protocol.chains {
                memberships += 1;
                match index.get(chain.as_str()) {
                    Some(&i) => counts[i].1 += 1,
                    None => {
                        index.insert(chain.as_str(), counts.len());
                        counts.push((chain.clone(), 1));
                    }
                }
            }
        }

        let chain_diversity = counts.len();
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts.truncate(TOP_CHAINS);

        ChainDistribution {
            most_popular_chains: counts,
            chain_diversity,
            average_chains_per_protocol: ratio_or_zero(memberships as f64, collection.len() as f64),
        }
    }

    pub fn risk_distribution(&self, collection: &ScoredCollection) -> RiskDistribution {
        let mut counts = RiskCounts::default();
        let mut high_risk_tvl = 0.0;

        for protocol in collection {
            counts.record(protocol.risk_level());
            if protocol.risk_level() == RiskLevel::High {
                high_risk_tvl += protocol.tvl;
            }
        }

        RiskDistribution {
            risk_distribution: counts,
            high_risk_tvl,
        }
    }

    pub fn top_dominance(&self, collection: &ScoredCollection) -> TopDominance {
        TopDominance {
            top_3_dominance: self.top_k_dominance(collection, 3),
            top_5_dominance: self.top_k_dominance(collection, 5),
            top_10_dominance: self.top_k_dominance(collection, 10),
        }
    }

    /// Percentage of total TVL held by the `k` largest protocols.
    pub fn top_k_dominance(&self, collection: &ScoredCollection, k: usize) -> f64 {
        let tvls = collection.tvls();
        let total: f64 = tvls.iter().sum();
        percentage_of(sum_of_largest(&tvls, k), total)
    }
}
