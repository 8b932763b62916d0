use std::env;
use std::net::SocketAddr;

use crate::cli::Cli;

/// Default bind address for the HTTP API.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:5000";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub listen_addr: SocketAddr,
}

impl Config {
    /// Build the config from the process environment, letting CLI flags
    /// override individual values.
    pub fn from_env(cli: &Cli) -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok(), cli)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>, cli: &Cli) -> Result<Self, String> {
        let database_url = cli
            .database_url
            .clone()
            .or_else(|| lookup("DATABASE_URL"))
            .ok_or("DATABASE_URL is required")?;

        let listen_addr = cli
            .listen_addr
            .clone()
            .or_else(|| lookup("LISTEN_ADDR"))
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|_| "LISTEN_ADDR must be a valid socket address")?;

        Ok(Self {
            database_url,
            listen_addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn cli(database_url: Option<&str>, listen_addr: Option<&str>) -> Cli {
        Cli {
            database_url: database_url.map(str::to_string),
            listen_addr: listen_addr.map(str::to_string),
            command: None,
        }
    }

    fn env_of(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn reads_environment_with_default_listen_addr() {
        let env = env_of(&[("DATABASE_URL", "sqlite://clinic.db")]);
        let config = Config::from_lookup(|k| env.get(k).cloned(), &cli(None, None)).unwrap();

        assert_eq!(config.database_url, "sqlite://clinic.db");
        assert_eq!(config.listen_addr, DEFAULT_LISTEN_ADDR.parse().unwrap());
    }

    #[test]
    fn cli_flags_override_environment() {
        let env = env_of(&[
            ("DATABASE_URL", "sqlite://clinic.db"),
            ("LISTEN_ADDR", "127.0.0.1:9000"),
        ]);
        let config = Config::from_lookup(
            |k| env.get(k).cloned(),
            &cli(Some("sqlite::memory:"), Some("127.0.0.1:7000")),
        )
        .unwrap();

        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.listen_addr.port(), 7000);
    }

    #[test]
    fn missing_database_url_is_an_error() {
        let err = Config::from_lookup(|_| None, &cli(None, None)).unwrap_err();
        assert!(err.contains("DATABASE_URL"));
    }

    #[test]
    fn invalid_listen_addr_is_an_error() {
        let env = env_of(&[("DATABASE_URL", "sqlite::memory:"), ("LISTEN_ADDR", "nope")]);
        let err = Config::from_lookup(|k| env.get(k).cloned(), &cli(None, None)).unwrap_err();
        assert!(err.contains("LISTEN_ADDR"));
    }
}
