use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{InsightThresholds, ScoringThresholds};
use crate::error::AppError;

/// Prefix for environment overrides, e.g. `DEFI_HEALTH__PIPELINE__TOP_N=25`.
pub const ENV_PREFIX: &str = "DEFI_HEALTH";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub source: SourceSettings,
    pub pipeline: PipelineSettings,
    pub scoring: ScoringThresholds,
    pub insights: InsightThresholds,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub defillama_base_url: String,
    pub coingecko_base_url: String,
    pub timeout_seconds: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub top_n: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    /// One of `json`, `pretty` or `compact`.
    pub format: String,
}

impl Default for SourceSettings {
    fn default() -> Self {
        SourceSettings {
            defillama_base_url: "https://api.llama.fi".to_string(),
            coingecko_base_url: "https://api.coingecko.com/api/v3".to_string(),
            timeout_seconds: 30,
            user_agent: "DeFi-Health-Monitor/0.1".to_string(),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        PipelineSettings { top_n: 10 }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl Settings {
    /// Built-in defaults overlaid with `DEFI_HEALTH__*` environment variables.
    pub fn new() -> Result<Self, AppError> {
        Self::load(Self::environment())
    }

    fn environment() -> config::Environment {
        config::Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
    }

    fn load(environment: config::Environment) -> Result<Self, AppError> {
        let settings: Settings = config::Config::builder()
            .add_source(config::Config::try_from(&Settings::default())?)
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        for (key, value) in [
            ("source.defillama_base_url", &self.source.defillama_base_url),
            ("source.coingecko_base_url", &self.source.coingecko_base_url),
        ] {
            Url::parse(value)
                .map_err(|e| AppError::ConfigError(format!("{} '{}': {}", key, value, e)))?;
        }

        if self.source.timeout_seconds == 0 {
            return Err(AppError::ConfigError(
                "source.timeout_seconds must be greater than zero".to_string(),
            ));
        }

        let normalizers = [
            ("scoring.chain_saturation_count", self.scoring.chain_saturation_count),
            ("scoring.tvl_normalizer_usd", self.scoring.tvl_normalizer_usd),
            ("scoring.age_normalizer_days", self.scoring.age_normalizer_days),
        ];
        for (key, value) in normalizers {
            if !(value.is_finite() && value > 0.0) {
                return Err(AppError::ConfigError(format!(
                    "{} must be a positive number, got {}",
                    key, value
                )));
            }
        }

        Ok(())
    }
}
