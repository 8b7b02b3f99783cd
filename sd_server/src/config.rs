//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use std::net::SocketAddr;
use swiss_draft::db::DatabaseConfig;
use swiss_draft::tournament::{DEFAULT_ROUNDS_PER_DRAFT, MAX_ROUNDS_PER_DRAFT, TournamentId};

/// Default bind address when neither `--bind` nor `SERVER_BIND` is given
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

/// Shortest accepted operator token
pub const MIN_OPERATOR_TOKEN_LEN: usize = 16;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Database configuration, `None` runs on the in-memory repository
    pub database: Option<DatabaseConfig>,
    /// Shared secret for operator endpoints
    pub operator_token: String,
    /// Tournament settings
    pub tournament: TournamentSettings,
    /// Prometheus scrape address
    pub metrics_bind: Option<SocketAddr>,
}

/// Tournament the server hosts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TournamentSettings {
    pub id: TournamentId,
    pub name: String,
    /// Rounds used when a scheduled draft does not name its own
    pub rounds_per_draft: u32,
    /// Seed applied to drafts scheduled without one
    pub pairing_seed: Option<u64>,
}

impl Default for TournamentSettings {
    fn default() -> Self {
        Self {
            id: 1,
            name: "Swiss Draft".to_string(),
            rounds_per_draft: DEFAULT_ROUNDS_PER_DRAFT,
            pairing_seed: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// CLI overrides win over the environment.
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or unparsable
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
        rounds_override: Option<u32>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_required_or("SERVER_BIND", DEFAULT_BIND)?,
        };

        let database = match database_url_override {
            Some(url) => Some(DatabaseConfig::with_url(url)),
            None => DatabaseConfig::from_env(),
        };

        let operator_token =
            std::env::var("OPERATOR_TOKEN").map_err(|_| ConfigError::MissingRequired {
                var: "OPERATOR_TOKEN".to_string(),
                hint: "Generate with: openssl rand -hex 16".to_string(),
            })?;

        let pairing_seed = match std::env::var("PAIRING_SEED") {
            Ok(raw) => Some(raw.parse().map_err(|_| ConfigError::Invalid {
                var: "PAIRING_SEED".to_string(),
                reason: format!("{raw:?} is not an unsigned integer"),
            })?),
            Err(_) => None,
        };

        let tournament = TournamentSettings {
            id: parse_env_or("TOURNAMENT_ID", 1),
            name: std::env::var("TOURNAMENT_NAME").unwrap_or_else(|_| "Swiss Draft".to_string()),
            rounds_per_draft: rounds_override
                .unwrap_or_else(|| parse_env_or("ROUNDS_PER_DRAFT", DEFAULT_ROUNDS_PER_DRAFT)),
            pairing_seed,
        };

        let metrics_bind = match std::env::var("METRICS_BIND") {
            Ok(raw) => Some(raw.parse().map_err(|_| ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("{raw:?} is not a socket address"),
            })?),
            Err(_) => None,
        };

        Ok(ServerConfig {
            bind,
            database,
            operator_token,
            tournament,
            metrics_bind,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.operator_token.len() < MIN_OPERATOR_TOKEN_LEN {
            return Err(ConfigError::Invalid {
                var: "OPERATOR_TOKEN".to_string(),
                reason: format!("Must be at least {MIN_OPERATOR_TOKEN_LEN} characters"),
            });
        }

        let rounds = self.tournament.rounds_per_draft;
        if rounds == 0 || rounds > MAX_ROUNDS_PER_DRAFT {
            return Err(ConfigError::Invalid {
                var: "ROUNDS_PER_DRAFT".to_string(),
                reason: format!("Must be between 1 and {MAX_ROUNDS_PER_DRAFT}"),
            });
        }

        if self.tournament.name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                var: "TOURNAMENT_NAME".to_string(),
                reason: "Must not be blank".to_string(),
            });
        }

        if let Some(db) = &self.database
            && db.min_connections > db.max_connections
        {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!("Cannot exceed DB_MAX_CONNECTIONS ({})", db.max_connections),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parse `key` if set, else `default`; a set but malformed value is an error
fn parse_required_or<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    let raw = std::env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse().map_err(|_| ConfigError::Invalid {
        var: key.to_string(),
        reason: format!("{raw:?} could not be parsed"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ServerConfig {
        ServerConfig {
            bind: "127.0.0.1:8000".parse().unwrap(),
            database: None,
            operator_token: "a".repeat(16),
            tournament: TournamentSettings::default(),
            metrics_bind: None,
        }
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingRequired {
            var: "OPERATOR_TOKEN".to_string(),
            hint: "Use openssl".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("OPERATOR_TOKEN"));
        assert!(msg.contains("Use openssl"));
    }

    #[test]
    fn test_valid_config() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_short_operator_token() {
        let mut config = config();
        config.operator_token = "short".to_string();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "OPERATOR_TOKEN"));
    }

    #[test]
    fn test_rounds_out_of_range() {
        let mut config = config();
        config.tournament.rounds_per_draft = 0;
        assert!(config.validate().is_err());

        config.tournament.rounds_per_draft = MAX_ROUNDS_PER_DRAFT + 1;
        assert!(config.validate().is_err());

        config.tournament.rounds_per_draft = MAX_ROUNDS_PER_DRAFT;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_pool_bounds() {
        let mut config = config();
        let mut db = DatabaseConfig::development();
        db.min_connections = db.max_connections + 1;
        config.database = Some(db);

        assert!(config.validate().is_err());
    }
}
