use std::time::{Duration, Instant};

use futures::future::join_all;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::SourceSettings;
use crate::error::AppError;

/// A data provider and the endpoints probed on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    pub name: String,
    pub base_url: String,
    pub endpoints: Vec<String>,
}

impl DataSource {
    pub fn new(name: &str, base_url: &str, endpoints: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            endpoints: endpoints.iter().map(|e| e.to_string()).collect(),
        }
    }

    pub fn urls(&self) -> impl Iterator<Item = String> + '_ {
        self.endpoints
            .iter()
            .map(move |endpoint| format!("{}{}", self.base_url, endpoint))
    }
}

/// Outcome of one probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointCheck {
    pub url: String,
    /// `None` when no response arrived.
    pub status: Option<u16>,
    pub latency_seconds: Option<f64>,
    pub working: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceReport {
    pub name: String,
    pub total_endpoints: usize,
    pub working_endpoints: usize,
    /// Mean latency over working endpoints only.
    pub average_latency: Option<f64>,
    pub results: Vec<EndpointCheck>,
}

impl SourceReport {
    fn from_checks(name: &str, results: Vec<EndpointCheck>) -> Self {
        let latencies: Vec<f64> = results
            .iter()
            .filter(|r| r.working)
            .filter_map(|r| r.latency_seconds)
            .collect();
        let working_endpoints = results.iter().filter(|r| r.working).count();

        let average_latency = if working_endpoints > 0 {
            Some(latencies.iter().sum::<f64>() / working_endpoints as f64)
        } else {
            None
        };

        Self {
            name: name.to_string(),
            total_endpoints: results.len(),
            working_endpoints,
            average_latency,
            results,
        }
    }
}

/// Single-attempt availability and latency probe for the upstream APIs.
pub struct SourceValidator {
    client: Client,
    sources: Vec<DataSource>,
}

impl SourceValidator {
    /// Probes DeFiLlama (`/protocols`, `/chains`) and CoinGecko (`/ping`,
    /// `/simple/supported_vs_currencies`).
    pub fn new(settings: &SourceSettings) -> Result<Self, AppError> {
        let sources = vec![
            DataSource::new(
                "coingecko",
                &settings.coingecko_base_url,
                &["/ping", "/simple/supported_vs_currencies"],
            ),
            DataSource::new("defillama", &settings.defillama_base_url, &["/protocols", "/chains"]),
        ];
        Self::with_sources(settings, sources)
    }

    pub fn with_sources(settings: &SourceSettings, sources: Vec<DataSource>) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .user_agent(settings.user_agent.as_str())
            .build()
            .map_err(|e| AppError::ExternalApiError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, sources })
    }

    pub fn sources(&self) -> &[DataSource] {
        &self.sources
    }

    pub async fn test_endpoint(&self, url: &str) -> EndpointCheck {
        let start = Instant::now();
        match self.client.get(url).send().await {
            Ok(response) => {
                let status = response.status();
                EndpointCheck {
                    url: url.to_string(),
                    status: Some(status.as_u16()),
                    latency_seconds: Some(start.elapsed().as_secs_f64()),
                    working: status == StatusCode::OK,
                    error: None,
                }
            }
            Err(e) => {
                error!("Error testing {}: {}", url, e);
                EndpointCheck {
                    url: url.to_string(),
                    status: None,
                    latency_seconds: None,
                    working: false,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    pub async fn validate_source(&self, source_name: &str) -> Result<SourceReport, AppError> {
        let source = self
            .sources
            .iter()
            .find(|s| s.name == source_name)
            .ok_or_else(|| AppError::ValidationError(format!("Unknown source: {}", source_name)))?;

        Ok(self.probe(source).await)
    }

    /// Probe every configured source concurrently; reports keep configuration order.
    pub async fn validate_all_sources(&self) -> Vec<SourceReport> {
        join_all(self.sources.iter().map(|source| self.probe(source))).await
    }

    async fn probe(&self, source: &DataSource) -> SourceReport {
        let mut results = Vec::with_capacity(source.endpoints.len());
        for url in source.urls() {
            results.push(self.test_endpoint(&url).await);
        }

        let report = SourceReport::from_checks(&source.name, results);
        info!(
            "Source {}: {}/{} endpoints working",
            report.name, report.working_endpoints, report.total_endpoints
        );
        report
    }
}
