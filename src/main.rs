use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use defi_health_monitor::{
    config::Settings,
    models::{MarketMetrics, ProtocolInsights, ScoredCollection},
    services::{
        validate_top_n, DefiLlamaSource, HealthScorer, InsightGenerator, JsonFileSource, MarketAggregator,
        ProtocolPipeline, RawProtocolSource, SourceValidator, TracingSink,
    },
    utils::{format_timestamp, init_logging},
};
use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Summary,
    Json,
    Csv,
}

/// Score the largest DeFi protocols and summarise market concentration.
#[derive(Debug, Parser)]
#[command(name = "defi-health-monitor", version, about)]
struct Cli {
    /// Number of protocols to score, largest TVL first
    #[arg(long, allow_negative_numbers = true)]
    top_n: Option<i64>,

    /// Only score the protocol with this name (case-insensitive)
    #[arg(long)]
    protocol: Option<String>,

    /// Read a saved /protocols response instead of calling the API
    #[arg(long)]
    input: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Summary)]
    format: OutputFormat,

    /// Probe the upstream data sources and exit
    #[arg(long)]
    check_sources: bool,
}

#[derive(Serialize)]
struct HealthReport<'a> {
    protocols: &'a ScoredCollection,
    market_metrics: &'a MarketMetrics,
    insights: &'a [ProtocolInsights],
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let settings = Settings::new()?;
    init_logging(&settings.logging)?;

    if cli.check_sources {
        return check_sources(&settings).await;
    }

    let top_n = validate_top_n(cli.top_n.unwrap_or(settings.pipeline.top_n as i64))?;

    let source: Box<dyn RawProtocolSource> = match (&cli.input, &cli.protocol) {
        (Some(path), Some(name)) => Box::new(JsonFileSource::new(path).with_protocol_filter(name.as_str())),
        (Some(path), None) => Box::new(JsonFileSource::new(path)),
        (None, Some(name)) => {
            Box::new(DefiLlamaSource::new(&settings.source)?.with_protocol_filter(name.as_str()))
        }
        (None, None) => Box::new(DefiLlamaSource::new(&settings.source)?),
    };

    info!("Fetching and analyzing top {} DeFi protocols from {}", top_n, source.name());

    let pipeline = ProtocolPipeline::new(HealthScorer::new(settings.scoring.clone()), Arc::new(TracingSink));
    let collection = pipeline.run(source.as_ref(), top_n).await;

    if collection.is_empty() {
        error!("No data was collected");
    }

    let market_metrics = MarketAggregator::new().aggregate(&collection);
    let insights = InsightGenerator::new(settings.insights.clone()).generate(&collection);

    match cli.format {
        OutputFormat::Summary => print_summary(&collection, &market_metrics, &insights),
        OutputFormat::Json => {
            let report = HealthReport {
                protocols: &collection,
                market_metrics: &market_metrics,
                insights: &insights,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Csv => collection.write_csv(io::stdout().lock())?,
    }

    Ok(())
}

fn print_summary(collection: &ScoredCollection, metrics: &MarketMetrics, insights: &[ProtocolInsights]) {
    info!("=== Top {} Protocols ({}) ===", collection.len(), format_timestamp(collection.timestamp()));
    for protocol in collection {
        let shown: Vec<&str> = protocol.chains.iter().take(3).map(String::as_str).collect();
        let more = if protocol.chains.len() > 3 { "..." } else { "" };
        info!(
            "{}: TVL ${:.2} | Risk {} | Diversification {:.2} | Stability {:.2} | Chains {}{}",
            protocol.name,
            protocol.tvl,
            protocol.health_metrics.risk_level,
            protocol.health_metrics.diversification_score,
            protocol.health_metrics.stability_score,
            shown.join(", "),
            more
        );
    }

    info!("=== Market Metrics ===");
    info!("Total TVL: ${:.2}B", metrics.total_tvl / 1e9);
    info!("TVL concentration (HHI): {:.4}", metrics.tvl_concentration);
    info!("Top 3 Dominance: {:.1}%", metrics.top_protocols_dominance.top_3_dominance);
    info!("High-risk TVL: ${:.2}B", metrics.risk_distribution.high_risk_tvl / 1e9);

    info!("=== Chain Distribution ===");
    for (chain, count) in &metrics.chain_distribution.most_popular_chains {
        info!("{}: {} protocols", chain, count);
    }

    info!("=== Protocol Insights ===");
    for protocol in insights.iter().filter(|p| !p.insights.is_empty()) {
        for insight in &protocol.insights {
            info!("{} - {} ({:?})", protocol.name, insight.message, insight.level);
        }
    }
}

async fn check_sources(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting data source validation...");
    let validator = SourceValidator::new(&settings.source)?;

    for report in validator.validate_all_sources().await {
        info!(
            "Results for {}: {}/{} endpoints working",
            report.name, report.working_endpoints, report.total_endpoints
        );
        if let Some(latency) = report.average_latency {
            info!("Average latency: {:.2} seconds", latency);
        }
        for endpoint in &report.results {
            if endpoint.working {
                info!("OK   {}", endpoint.url);
            } else {
                warn!(
                    "FAIL {} ({})",
                    endpoint.url,
                    endpoint
                        .error
                        .clone()
                        .unwrap_or_else(|| format!("status {}", endpoint.status.unwrap_or_default()))
                );
            }
        }
    }

    Ok(())
}
