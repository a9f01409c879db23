use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::AppError;
use crate::models::{Diagnostic, RawProtocolRecord, ScoredCollection};
use crate::services::{DiagnosticSink, HealthScorer, RawProtocolSource, TracingSink};

/// Check a caller-supplied protocol count. Negative counts are a contract
/// violation, not a data-quality problem.
pub fn validate_top_n(top_n: i64) -> Result<usize, AppError> {
    usize::try_from(top_n)
        .map_err(|_| AppError::ValidationError(format!("top_n must be non-negative, got {}", top_n)))
}

/// Fetch, rank, truncate and score.
pub struct ProtocolPipeline {
    scorer: HealthScorer,
    sink: Arc<dyn DiagnosticSink>,
}

impl ProtocolPipeline {
    pub fn new(scorer: HealthScorer, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { scorer, sink }
    }

    pub fn scorer(&self) -> &HealthScorer {
        &self.scorer
    }

    /// Always returns a well-formed collection: an unavailable source gives an
    /// empty one, malformed records are dropped, both are reported to the sink.
    pub async fn run<S>(&self, source: &S, top_n: usize) -> ScoredCollection
    where
        S: RawProtocolSource + ?Sized,
    {
        let records = match source.fetch().await {
            Ok(records) => records,
            Err(e) => {
                self.sink.report(Diagnostic::SourceUnavailable {
                    source: source.name().to_string(),
                    reason: e.to_string(),
                });
                return ScoredCollection::empty(Utc::now());
            }
        };

        if records.is_empty() {
            self.sink.report(Diagnostic::SourceEmpty {
                source: source.name().to_string(),
            });
        } else {
            info!("Fetched {} protocols", records.len());
        }

        let collection = self.assemble(records, top_n, Utc::now());
        info!(
            "Scored {} protocols at {}",
            collection.len(),
            collection.timestamp().to_rfc3339()
        );
        collection
    }

    /// Rank `records` by TVL (stable), keep the first `top_n`, score them, and
    /// stamp the result with `now`.
    pub fn assemble(&self, records: Vec<RawProtocolRecord>, top_n: usize, now: DateTime<Utc>) -> ScoredCollection {
        let mut ranked: Vec<(f64, RawProtocolRecord)> =
            records.into_iter().map(|r| (r.tvl(), r)).collect();
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0));
        ranked.truncate(top_n);

        let scored = ranked
            .iter()
            .filter_map(|(_, raw)| self.scorer.score_at(raw, now, self.sink.as_ref()))
            .collect();

        ScoredCollection::new(scored, now)
    }
}

impl Default for ProtocolPipeline {
    fn default() -> Self {
        Self::new(HealthScorer::default(), Arc::new(TracingSink))
    }
}
