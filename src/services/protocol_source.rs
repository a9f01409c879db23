use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::config::SourceSettings;
use crate::error::{AppError, SourceError};
use crate::models::RawProtocolRecord;

/// Supplies the raw protocol universe in one call.
#[async_trait]
pub trait RawProtocolSource: Send + Sync {
    /// Identifier used in diagnostics.
    fn name(&self) -> &str;

    /// Fetch the whole listing once. No pagination, no retry.
    async fn fetch(&self) -> Result<Vec<RawProtocolRecord>, SourceError>;
}

/// DeFiLlama `/protocols` listing.
#[derive(Debug, Clone)]
pub struct DefiLlamaSource {
    client: Client,
    base_url: String,
    protocol_filter: Option<String>,
}

impl DefiLlamaSource {
    pub fn new(settings: &SourceSettings) -> Result<Self, AppError> {
        Url::parse(&settings.defillama_base_url)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .user_agent(settings.user_agent.as_str())
            .build()
            .map_err(|e| AppError::ExternalApiError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: settings.defillama_base_url.trim_end_matches('/').to_string(),
            protocol_filter: None,
        })
    }

    /// Only keep protocols whose name matches `name`, ignoring case.
    pub fn with_protocol_filter(mut self, name: impl Into<String>) -> Self {
        self.protocol_filter = Some(name.into());
        self
    }

    pub fn protocols_url(&self) -> String {
        format!("{}/protocols", self.base_url)
    }
}

#[async_trait]
impl RawProtocolSource for DefiLlamaSource {
    fn name(&self) -> &str {
        "defillama"
    }

    async fn fetch(&self) -> Result<Vec<RawProtocolRecord>, SourceError> {
        let url = self.protocols_url();
        debug!("Fetching {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::Transport {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let payload: Value = response.json().await.map_err(|e| SourceError::MalformedPayload {
            url: url.clone(),
            message: e.to_string(),
        })?;

        let records = records_from_payload(&url, payload)?;
        info!("Fetched {} protocols from {}", records.len(), self.name());

        Ok(match &self.protocol_filter {
            Some(name) => filter_by_name(records, name),
            None => records,
        })
    }
}

/// In-memory listing, or a canned failure.
#[derive(Debug, Clone)]
pub struct StaticSource {
    name: String,
    listing: Result<Vec<RawProtocolRecord>, SourceError>,
}

impl StaticSource {
    pub fn new(records: Vec<RawProtocolRecord>) -> Self {
        Self {
            name: "static".to_string(),
            listing: Ok(records),
        }
    }

    pub fn from_values(values: Vec<Value>) -> Self {
        Self::new(values.into_iter().map(RawProtocolRecord::new).collect())
    }

    pub fn failing(error: SourceError) -> Self {
        Self {
            name: "static".to_string(),
            listing: Err(error),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

#[async_trait]
impl RawProtocolSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Vec<RawProtocolRecord>, SourceError> {
        self.listing.clone()
    }
}

/// A saved `/protocols` response on disk.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
    protocol_filter: Option<String>,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            protocol_filter: None,
        }
    }

    pub fn with_protocol_filter(mut self, name: impl Into<String>) -> Self {
        self.protocol_filter = Some(name.into());
        self
    }
}

#[async_trait]
impl RawProtocolSource for JsonFileSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch(&self) -> Result<Vec<RawProtocolRecord>, SourceError> {
        let origin = self.path.display().to_string();
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| SourceError::Io {
                path: origin.clone(),
                message: e.to_string(),
            })?;

        let payload: Value = serde_json::from_str(&contents).map_err(|e| SourceError::MalformedPayload {
            url: origin.clone(),
            message: e.to_string(),
        })?;

        let records = records_from_payload(&origin, payload)?;
        Ok(match &self.protocol_filter {
            Some(name) => filter_by_name(records, name),
            None => records,
        })
    }
}

/// The listing must be a JSON array; its elements are kept as-is.
pub fn records_from_payload(origin: &str, payload: Value) -> Result<Vec<RawProtocolRecord>, SourceError> {
    match payload {
        Value::Array(items) => Ok(items.into_iter().map(RawProtocolRecord::new).collect()),
        other => Err(SourceError::MalformedPayload {
            url: origin.to_string(),
            message: format!("expected a JSON array, got {}", json_type(&other)),
        }),
    }
}

/// Records whose `name` equals `name` case-insensitively. Unnamed records never match.
pub fn filter_by_name(records: Vec<RawProtocolRecord>, name: &str) -> Vec<RawProtocolRecord> {
    let wanted = name.to_lowercase();
    records
        .into_iter()
        .filter(|r| {
            r.get("name")
                .and_then(Value::as_str)
                .map(|n| n.to_lowercase() == wanted)
                .unwrap_or(false)
        })
        .collect()
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
