use crate::ingest::Delimiter;
use crate::scoring::normalizer::is_truthy;
use crate::scoring::{ModelVariant, OwnershipPolicy, PipelineConfig};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub scoring: ScoringSettings,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(&var_or("APP_ENV", "development"));

        let host = var_or("APP_HOST", "127.0.0.1");
        let port = var_or("APP_PORT", "3000")
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = var_or("APP_LOG_LEVEL", "info");
        let ansi = optional_var("APP_LOG_ANSI")
            .map(|value| is_truthy(&value.to_ascii_uppercase()))
            .unwrap_or(false);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level, ansi },
            scoring: ScoringSettings::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub ansi: bool,
}

/// Which extract to score and how.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringSettings {
    pub input: Option<PathBuf>,
    pub model: ModelVariant,
    /// `None` keeps the model's own ownership policy.
    pub ownership: Option<OwnershipPolicy>,
    pub delimiter: Delimiter,
    pub exclude_government_owners: bool,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            input: None,
            model: ModelVariant::Enhanced,
            ownership: None,
            delimiter: Delimiter::Auto,
            exclude_government_owners: false,
        }
    }
}

impl ScoringSettings {
    fn from_env() -> Result<Self, ConfigError> {
        let model = match optional_var("LISTPREDICT_MODEL") {
            Some(value) => parse_model(&value)?,
            None => ModelVariant::Enhanced,
        };
        let ownership = optional_var("LISTPREDICT_OWNERSHIP")
            .map(|value| parse_ownership(&value))
            .transpose()?;
        let delimiter = match optional_var("LISTPREDICT_DELIMITER") {
            Some(value) => parse_delimiter(&value)?,
            None => Delimiter::Auto,
        };
        let exclude_government_owners = optional_var("LISTPREDICT_EXCLUDE_GOVERNMENT")
            .map(|value| is_truthy(&value.to_ascii_uppercase()))
            .unwrap_or(false);

        Ok(Self {
            input: optional_var("LISTPREDICT_INPUT").map(PathBuf::from),
            model,
            ownership,
            delimiter,
            exclude_government_owners,
        })
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            ownership_policy: self.ownership,
            exclude_government_owners: self.exclude_government_owners,
            ..PipelineConfig::for_model(self.model)
        }
    }
}

pub fn parse_model(value: &str) -> Result<ModelVariant, ConfigError> {
    ModelVariant::parse(value).ok_or_else(|| ConfigError::InvalidModel {
        value: value.to_string(),
    })
}

pub fn parse_ownership(value: &str) -> Result<OwnershipPolicy, ConfigError> {
    OwnershipPolicy::parse(value).ok_or_else(|| ConfigError::InvalidOwnershipPolicy {
        value: value.to_string(),
    })
}

pub fn parse_delimiter(value: &str) -> Result<Delimiter, ConfigError> {
    Delimiter::parse(value).ok_or_else(|| ConfigError::InvalidDelimiter {
        value: value.to_string(),
    })
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidModel { value: String },
    InvalidOwnershipPolicy { value: String },
    InvalidDelimiter { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidModel { value } => write!(
                f,
                "unknown scoring model '{}' (expected basic, enhanced or dashboard)",
                value
            ),
            ConfigError::InvalidOwnershipPolicy { value } => write!(
                f,
                "unknown ownership policy '{}' (expected exclusive or additive)",
                value
            ),
            ConfigError::InvalidDelimiter { value } => write!(
                f,
                "unknown delimiter '{}' (expected auto, comma or tab)",
                value
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidModel { .. }
            | ConfigError::InvalidOwnershipPolicy { .. }
            | ConfigError::InvalidDelimiter { .. } => None,
        }
    }
}
