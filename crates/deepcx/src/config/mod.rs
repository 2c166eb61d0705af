use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::surveys::definition::{normalize_hex_color, DEFAULT_PRIMARY_COLOR};
use crate::surveys::SurveySettings;

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
    pub surveys: SurveySettings,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            surveys: load_survey_settings()?,
        })
    }
}

fn load_survey_settings() -> Result<SurveySettings, ConfigError> {
    let defaults = SurveySettings::default();

    let primary_color = env::var("APP_PRIMARY_COLOR")
        .map(|raw| normalize_hex_color(&raw, DEFAULT_PRIMARY_COLOR))
        .unwrap_or(defaults.primary_color);

    let survey_code_prefix = match env::var("APP_SURVEY_CODE_PREFIX") {
        Ok(raw) => parse_prefix("APP_SURVEY_CODE_PREFIX", &raw)?,
        Err(_) => defaults.survey_code_prefix,
    };
    let instance_code_prefix = match env::var("APP_INSTANCE_CODE_PREFIX") {
        Ok(raw) => parse_prefix("APP_INSTANCE_CODE_PREFIX", &raw)?,
        Err(_) => defaults.instance_code_prefix,
    };

    let code_retries = match env::var("APP_CODE_RETRIES") {
        Ok(raw) => match raw.trim().parse::<u8>() {
            Ok(value) if value > 0 => value,
            _ => return Err(ConfigError::InvalidRetryBudget),
        },
        Err(_) => defaults.code_retries,
    };

    Ok(SurveySettings {
        primary_color,
        survey_code_prefix,
        instance_code_prefix,
        code_retries,
    })
}

fn parse_prefix(variable: &'static str, raw: &str) -> Result<char, ConfigError> {
    let mut chars = raw.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(prefix), None) if prefix.is_ascii_uppercase() || prefix.is_ascii_digit() => {
            Ok(prefix)
        }
        _ => Err(ConfigError::InvalidCodePrefix { variable }),
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
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidCodePrefix { variable: &'static str },
    InvalidRetryBudget,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidCodePrefix { variable } => {
                write!(f, "{variable} must be a single character in [A-Z0-9]")
            }
            ConfigError::InvalidRetryBudget => {
                write!(f, "APP_CODE_RETRIES must be an integer between 1 and 255")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
