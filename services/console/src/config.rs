//! services/console/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development. Which backend is active is decided from
//! the hostname the portal is served from, with three fixed profiles.

use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;
use url::Url;

/// The hosted backend used when the portal is served from GitHub Pages.
pub const PRODUCTION_API_URL: &str = "https://student-management-system-backend.onrender.com/api";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// The three deployment profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Public hosted front end talking to the hosted backend.
    Production,
    /// No backend; everything runs against in-memory sample data.
    Demo,
    /// Local development, API served from the same origin under `/api`.
    Development,
}

impl Environment {
    /// Picks the profile for a portal hostname.
    pub fn detect(hostname: &str) -> Self {
        if hostname.contains("github.io") {
            Environment::Production
        } else if hostname == "localhost" || hostname == "127.0.0.1" {
            Environment::Development
        } else {
            Environment::Demo
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Demo => "demo",
            Environment::Development => "development",
        }
    }
}

/// Resolves the environment and API base URL for a portal origin.
///
/// Without a portal origin there is nothing to talk to, so the demo profile is used.
pub fn resolve_profile(portal_url: Option<&Url>) -> Result<(Environment, Option<Url>), ConfigError> {
    let Some(portal) = portal_url else {
        return Ok((Environment::Demo, None));
    };
    let environment = Environment::detect(portal.host_str().unwrap_or_default());
    let base = match environment {
        Environment::Production => Some(parse_url("PORTAL_URL", PRODUCTION_API_URL)?),
        Environment::Development => Some(same_origin_api(portal)?),
        Environment::Demo => None,
    };
    Ok((environment, base))
}

fn same_origin_api(portal: &Url) -> Result<Url, ConfigError> {
    let origin = portal.origin().ascii_serialization();
    parse_url("PORTAL_URL", &format!("{}/api", origin))
}

fn parse_url(var: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidValue(var.to_string(), e.to_string()))
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: Environment,
    /// `None` exactly when the demo backend is active.
    pub api_base_url: Option<Url>,
    pub session_file: PathBuf,
    pub download_dir: PathBuf,
    pub request_timeout: Duration,
    pub demo_latency: bool,
    pub log_level: Level,
}

impl Config {
    pub fn is_demo_mode(&self) -> bool {
        self.api_base_url.is_none()
    }

    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Resolve the backend profile ---
        let portal_url = std::env::var("PORTAL_URL")
            .ok()
            .map(|raw| parse_url("PORTAL_URL", &raw))
            .transpose()?;
        let (mut environment, mut api_base_url) = resolve_profile(portal_url.as_ref())?;

        if let Ok(raw) = std::env::var("API_BASE_URL") {
            api_base_url = Some(parse_url("API_BASE_URL", &raw)?);
            if environment == Environment::Demo {
                environment = Environment::Development;
            }
        }

        let demo_mode = parse_bool("DEMO_MODE", false)?;
        if demo_mode {
            environment = Environment::Demo;
            api_base_url = None;
        }

        // --- Local paths ---
        let session_file = std::env::var("SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./.portal-session.json"));
        let download_dir = std::env::var("DOWNLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));

        // --- Client behaviour ---
        let timeout_str =
            std::env::var("REQUEST_TIMEOUT_SECS").unwrap_or_else(|_| "30".to_string());
        let request_timeout = timeout_str
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::InvalidValue("REQUEST_TIMEOUT_SECS".to_string(), e.to_string()))?;
        let demo_latency = parse_bool("DEMO_LATENCY", true)?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            environment,
            api_base_url,
            session_file,
            download_dir,
            request_timeout,
            demo_latency,
            log_level,
        })
    }
}

fn parse_bool(var: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(var) {
        Err(_) => Ok(default),
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue(
                var.to_string(),
                format!("'{}' is not a boolean", raw),
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hostname_selects_profile() {
        assert_eq!(Environment::detect("acme.github.io"), Environment::Production);
        assert_eq!(Environment::detect("localhost"), Environment::Development);
        assert_eq!(Environment::detect("127.0.0.1"), Environment::Development);
        assert_eq!(Environment::detect("portal.example.org"), Environment::Demo);
    }

    #[test]
    fn development_uses_same_origin_api() {
        let portal = Url::parse("http://localhost:5000/index.html").unwrap();
        let (env, base) = resolve_profile(Some(&portal)).unwrap();
        assert_eq!(env, Environment::Development);
        assert_eq!(base.unwrap().as_str(), "http://localhost:5000/api");
    }

    #[test]
    fn production_points_at_hosted_backend() {
        let portal = Url::parse("https://acme.github.io/portal/").unwrap();
        let (env, base) = resolve_profile(Some(&portal)).unwrap();
        assert_eq!(env, Environment::Production);
        assert_eq!(base.unwrap().as_str(), PRODUCTION_API_URL);
    }

    #[test]
    fn unknown_or_missing_host_falls_back_to_demo() {
        let portal = Url::parse("https://portal.example.org").unwrap();
        assert_eq!(resolve_profile(Some(&portal)).unwrap(), (Environment::Demo, None));
        assert_eq!(resolve_profile(None).unwrap(), (Environment::Demo, None));
    }
}
