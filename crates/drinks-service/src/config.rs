//! Drinks service configuration.
//!
//! Configuration is loaded from environment variables. The database URL is
//! redacted in Debug output.

use jsonwebtoken::Algorithm;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default server bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default accepted token signing algorithms.
pub const DEFAULT_ALGORITHMS: &str = "RS256";

/// Maximum allowed leeway for `exp` validation (10 minutes).
pub const MAX_JWT_LEEWAY_SECONDS: u64 = 600;

/// Signing algorithms the verifier can use with RSA keys from a JWKS.
const SUPPORTED_ALGORITHMS: &[Algorithm] = &[
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
];

/// Which drink store implementation to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// PostgreSQL via sqlx.
    Postgres,

    /// Process-local in-memory store.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(ConfigError::InvalidStoreBackend(format!(
                "STORE_BACKEND must be 'postgres' or 'memory', got '{}'",
                other
            ))),
        }
    }
}

/// Drinks service configuration.
///
/// Loaded from environment variables with sensible defaults.
#[derive(Clone)]
pub struct Config {
    /// Identity provider domain (e.g., "dev-abc.us.auth0.com").
    pub auth0_domain: String,

    /// Expected `aud` claim of incoming tokens.
    pub api_audience: String,

    /// Accepted token signing algorithms.
    pub algorithms: Vec<Algorithm>,

    /// URL of the identity provider's JWKS document.
    pub jwks_url: String,

    /// Leeway in seconds applied to `exp` validation.
    pub jwt_leeway_seconds: u64,

    /// Store implementation.
    pub store_backend: StoreBackend,

    /// PostgreSQL connection URL (required for the postgres backend).
    pub database_url: Option<String>,

    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Insert a sample drink on startup when the catalog is empty.
    pub seed_catalog: bool,

    /// Seconds to wait after a shutdown signal before exiting.
    pub drain_seconds: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("auth0_domain", &self.auth0_domain)
            .field("api_audience", &self.api_audience)
            .field("algorithms", &self.algorithms)
            .field("jwks_url", &self.jwks_url)
            .field("jwt_leeway_seconds", &self.jwt_leeway_seconds)
            .field("store_backend", &self.store_backend)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("bind_address", &self.bind_address)
            .field("seed_catalog", &self.seed_catalog)
            .field("drain_seconds", &self.drain_seconds)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid algorithm configuration: {0}")]
    InvalidAlgorithms(String),

    #[error("Invalid JWT leeway configuration: {0}")]
    InvalidJwtLeeway(String),

    #[error("Invalid store backend configuration: {0}")]
    InvalidStoreBackend(String),

    #[error("Invalid boolean configuration: {0}")]
    InvalidBoolean(String),

    #[error("Invalid drain configuration: {0}")]
    InvalidDrainSeconds(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let auth0_domain = required(vars, "AUTH0_DOMAIN")?;
        let auth0_domain = auth0_domain
            .trim()
            .trim_start_matches("https://")
            .trim_end_matches('/')
            .to_string();
        if auth0_domain.is_empty() {
            return Err(ConfigError::MissingEnvVar("AUTH0_DOMAIN".to_string()));
        }

        let api_audience = required(vars, "API_AUDIENCE")?;

        let algorithms = parse_algorithms(
            vars.get("ALGORITHMS")
                .map(String::as_str)
                .unwrap_or(DEFAULT_ALGORITHMS),
        )?;

        let jwks_url = vars
            .get("JWKS_URL")
            .cloned()
            .unwrap_or_else(|| format!("https://{}/.well-known/jwks.json", auth0_domain));

        let jwt_leeway_seconds = if let Some(value_str) = vars.get("JWT_LEEWAY_SECONDS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidJwtLeeway(format!(
                    "JWT_LEEWAY_SECONDS must be a valid non-negative integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value > MAX_JWT_LEEWAY_SECONDS {
                return Err(ConfigError::InvalidJwtLeeway(format!(
                    "JWT_LEEWAY_SECONDS must not exceed {} seconds, got {}",
                    MAX_JWT_LEEWAY_SECONDS, value
                )));
            }

            value
        } else {
            0
        };

        let store_backend = match vars.get("STORE_BACKEND") {
            Some(value) => value.parse()?,
            None => StoreBackend::Postgres,
        };

        let database_url = vars.get("DATABASE_URL").cloned();
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingEnvVar("DATABASE_URL".to_string()));
        }

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let seed_catalog = match vars.get("SEED_CATALOG") {
            Some(value) => parse_bool("SEED_CATALOG", value)?,
            None => false,
        };

        let drain_seconds = if let Some(value_str) = vars.get("DRAIN_SECONDS") {
            value_str.parse().map_err(|e| {
                ConfigError::InvalidDrainSeconds(format!(
                    "DRAIN_SECONDS must be a valid non-negative integer, got '{}': {}",
                    value_str, e
                ))
            })?
        } else {
            0
        };

        Ok(Config {
            auth0_domain,
            api_audience,
            algorithms,
            jwks_url,
            jwt_leeway_seconds,
            store_backend,
            database_url,
            bind_address,
            seed_catalog,
            drain_seconds,
        })
    }

    /// Expected `iss` claim: `https://<domain>/`.
    pub fn issuer(&self) -> String {
        format!("https://{}/", self.auth0_domain)
    }
}

fn required(vars: &HashMap<String, String>, name: &str) -> Result<String, ConfigError> {
    vars.get(name)
        .filter(|v| !v.trim().is_empty())
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

fn parse_algorithms(value: &str) -> Result<Vec<Algorithm>, ConfigError> {
    let mut algorithms = Vec::new();

    for name in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let algorithm = Algorithm::from_str(name).map_err(|e| {
            ConfigError::InvalidAlgorithms(format!("unknown algorithm '{}': {}", name, e))
        })?;

        if !SUPPORTED_ALGORITHMS.contains(&algorithm) {
            return Err(ConfigError::InvalidAlgorithms(format!(
                "algorithm '{}' is not an RSA signing algorithm",
                name
            )));
        }

        if !algorithms.contains(&algorithm) {
            algorithms.push(algorithm);
        }
    }

    if algorithms.is_empty() {
        return Err(ConfigError::InvalidAlgorithms(
            "ALGORITHMS must list at least one algorithm".to_string(),
        ));
    }

    Ok(algorithms)
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBoolean(format!(
            "{} must be a boolean, got '{}'",
            name, value
        ))),
    }
}
