use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::{json, Value};

use defi_health_monitor::{
    error::SourceError,
    models::{Diagnostic, RiskLevel},
    services::{CollectingSink, HealthScorer, InsightGenerator, MarketAggregator, ProtocolPipeline, StaticSource},
};

fn pipeline_with_sink() -> (ProtocolPipeline, Arc<CollectingSink>) {
    let sink = Arc::new(CollectingSink::new());
    (ProtocolPipeline::new(HealthScorer::default(), sink.clone()), sink)
}

fn sample_listing() -> Vec<Value> {
    let created = (Utc::now() - Duration::days(800)).to_rfc3339();
    vec![
        json!({"name": "Curve", "tvl": 2_500_000_000.0, "mcap": 500_000_000.0,
               "chains": ["Ethereum", "Arbitrum", "Polygon", "Optimism"], "category": "Dexes"}),
        json!({"name": "Lido", "tvl": 30_000_000_000.0, "mcap": 1_800_000_000.0,
               "chains": ["Ethereum", "Solana", "Polygon", "Moonbeam", "Terra", "Kusama"],
               "category": "Liquid Staking", "created_at": created}),
        json!({"name": "Tiny", "tvl": "1500000", "chains": ["Base"], "category": "Yield"}),
        json!({"name": "Broken", "tvl": 9_000_000_000.0, "chains": "Ethereum"}),
        json!({"name": "Aave", "tvl": 12_000_000_000.0,
               "chains": ["Ethereum", "Arbitrum", "Polygon", "Optimism", "Avalanche",
                          "Base", "Gnosis", "Scroll", "BSC", "Metis", "Fantom"],
               "category": "Lending", "created_at": "2020-01-08T00:00:00Z"}),
        json!(null),
    ]
}

#[tokio::test]
async fn test_run_ranks_scores_and_drops_malformed() {
    let (pipeline, sink) = pipeline_with_sink();
    let source = StaticSource::from_values(sample_listing());

    let collection = pipeline.run(&source, 10).await;

    let names: Vec<&str> = collection.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Lido", "Aave", "Curve", "Tiny"]);
    assert!(collection.protocols().windows(2).all(|w| w[0].tvl >= w[1].tvl));

    let diagnostics = sink.diagnostics();
    assert_eq!(diagnostics.len(), 2);
    assert!(diagnostics
        .iter()
        .all(|d| matches!(d, Diagnostic::RecordMalformed { .. })));

    let aave = &collection.protocols()[1];
    assert_eq!(aave.health_metrics.diversification_score, 1.0);
    assert!((aave.health_metrics.stability_score - 1.0).abs() < 1e-9);
    assert_eq!(aave.risk_level(), RiskLevel::Low);

    let tiny = &collection.protocols()[3];
    assert_eq!(tiny.tvl, 1_500_000.0);
    assert_eq!(tiny.risk_level(), RiskLevel::High);
}

#[tokio::test]
async fn test_run_truncates_before_scoring() {
    let (pipeline, sink) = pipeline_with_sink();
    let source = StaticSource::from_values(sample_listing());

    // Lido, Aave, Broken survive the cut; Broken is then dropped.
    let collection = pipeline.run(&source, 3).await;

    assert_eq!(collection.len(), 2);
    assert_eq!(sink.diagnostics().len(), 1);
}

#[tokio::test]
async fn test_run_with_zero_top_n() {
    let (pipeline, _sink) = pipeline_with_sink();
    let source = StaticSource::from_values(sample_listing());

    assert!(pipeline.run(&source, 0).await.is_empty());
}

#[tokio::test]
async fn test_unavailable_source_yields_empty_collection() {
    let (pipeline, sink) = pipeline_with_sink();
    let source = StaticSource::failing(SourceError::Status {
        url: "https://api.llama.fi/protocols".to_string(),
        status: 502,
    })
    .named("defillama");

    let collection = pipeline.run(&source, 10).await;
    assert!(collection.is_empty());

    let diagnostics = sink.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    match &diagnostics[0] {
        Diagnostic::SourceUnavailable { source, reason } => {
            assert_eq!(source, "defillama");
            assert!(reason.contains("502"));
        }
        other => panic!("unexpected diagnostic: {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_source_end_to_end() {
    let (pipeline, sink) = pipeline_with_sink();
    let collection = pipeline.run(&StaticSource::new(Vec::new()), 10).await;

    assert!(collection.is_empty());
    assert_eq!(
        sink.diagnostics(),
        vec![Diagnostic::SourceEmpty {
            source: "static".to_string()
        }]
    );

    let metrics = MarketAggregator::new().aggregate(&collection);
    assert_eq!(metrics.total_tvl, 0.0);
    assert_eq!(metrics.tvl_concentration, 0.0);
    assert_eq!(metrics.top_protocols_dominance.top_3_dominance, 0.0);
    assert_eq!(metrics.top_protocols_dominance.top_5_dominance, 0.0);
    assert_eq!(metrics.top_protocols_dominance.top_10_dominance, 0.0);
    assert_eq!(metrics.chain_distribution.chain_diversity, 0);
    assert_eq!(metrics.chain_distribution.average_chains_per_protocol, 0.0);

    assert!(InsightGenerator::default().generate(&collection).is_empty());
}

#[tokio::test]
async fn test_market_metrics_and_insights_over_pipeline_output() {
    let (pipeline, _sink) = pipeline_with_sink();
    let collection = pipeline.run(&StaticSource::from_values(sample_listing()), 10).await;

    let aggregator = MarketAggregator::new();
    let metrics = aggregator.aggregate(&collection);
    assert_eq!(metrics, aggregator.aggregate(&collection));

    let total = 30e9 + 12e9 + 2.5e9 + 1.5e6;
    assert!((metrics.total_tvl - total).abs() < 1.0);
    assert_eq!(metrics.chain_distribution.most_popular_chains[0], ("Ethereum".to_string(), 3));
    assert_eq!(metrics.chain_distribution.most_popular_chains[1], ("Polygon".to_string(), 3));
    assert_eq!(metrics.risk_distribution.risk_distribution.high, 1);
    assert_eq!(metrics.risk_distribution.high_risk_tvl, 1_500_000.0);

    let dominance = metrics.top_protocols_dominance;
    assert!(dominance.top_3_dominance <= dominance.top_5_dominance);
    assert_eq!(dominance.top_5_dominance, 100.0);

    let insights = InsightGenerator::default().generate(&collection);
    assert_eq!(insights.len(), collection.len());
    assert_eq!(insights[0].name, "Lido");
    assert_eq!(insights[0].insights[0].message, "Major protocol with $30.0B TVL");
    assert_eq!(insights[1].insights.len(), 2); // Aave: size + high diversity
    assert!(insights[2].insights.is_empty()); // Curve
    assert_eq!(insights[3].insights.len(), 2); // Tiny: limited diversity + high risk
}

#[tokio::test]
async fn test_collection_serializes_with_nested_health_metrics() {
    let (pipeline, _sink) = pipeline_with_sink();
    let collection = pipeline.run(&StaticSource::from_values(sample_listing()), 1).await;

    let value = serde_json::to_value(&collection).unwrap();
    let first = &value["protocols"][0];
    assert_eq!(first["name"], "Lido");
    assert_eq!(first["health_metrics"]["risk_level"], "Low");
    assert!(value["timestamp"].is_string());
}

#[tokio::test]
async fn test_market_metrics_stay_finite_for_huge_tvls() {
    let (pipeline, sink) = pipeline_with_sink();
    let source = StaticSource::from_values(vec![
        json!({"name": "Whale", "tvl": "1e308", "chains": ["Ethereum"]}),
        json!({"name": "Orca", "tvl": "1e308", "chains": ["Solana"]}),
    ]);

    let collection = pipeline.run(&source, 10).await;
    assert_eq!(collection.len(), 2);
    assert!(sink.is_empty());

    let metrics = MarketAggregator::new().aggregate(&collection);
    assert!(metrics.total_tvl.is_finite());
    assert!(metrics.average_tvl.is_finite());
    assert!((metrics.tvl_concentration - 0.5).abs() < 1e-12);

    let dominance = metrics.top_protocols_dominance;
    assert_eq!(dominance.top_3_dominance, 100.0);
    assert_eq!(dominance.top_5_dominance, 100.0);
    assert_eq!(dominance.top_10_dominance, 100.0);
    assert_eq!(metrics.risk_distribution.high_risk_tvl, 0.0);
}
