//! Configuration management for roster.
//!
//! Connection settings are loaded from (in priority order):
//! 1. Environment variables (NEO4J_ prefix, e.g. `NEO4J_URI`)
//! 2. Config file (roster.toml, or the prefix given on the command line)
//! 3. Defaults
//!
//! Credentials are only ever read from `NEO4J_USER` and `NEO4J_PASSWORD`.
//! Both are required: loading fails before anything touches the network.

use std::ffi::OsString;
use std::fmt;

use serde::Deserialize;

use crate::error::{Result, RosterError};

/// Prefix shared by every environment variable roster reads.
pub const ENV_PREFIX: &str = "NEO4J";

pub const USER_VAR: &str = "NEO4J_USER";
pub const PASSWORD_VAR: &str = "NEO4J_PASSWORD";

/// Everything needed to reach the graph store.
#[derive(Debug, Clone)]
pub struct RosterConfig {
    pub connection: ConnectionSettings,
    pub credentials: Credentials,
}

impl RosterConfig {
    /// Load from `<file_prefix>.toml` (optional) and the process environment.
    pub fn load(file_prefix: &str) -> Result<Self> {
        Self::load_with_env(file_prefix, None)
    }

    /// Like [`RosterConfig::load`], but reads variables from `env` instead
    /// of the process environment when it is `Some`.
    pub fn load_with_env(
        file_prefix: &str,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self> {
        let credentials = Credentials::from_env(env.clone())?;
        let connection = ConnectionSettings::load(file_prefix, env)?;
        tracing::debug!(file_prefix, uri = %connection.uri, "Loaded roster configuration");
        Ok(Self {
            connection,
            credentials,
        })
    }
}

/// Connection settings for the Bolt endpoint and the driver pool.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ConnectionSettings {
    /// Bolt URI (default: "bolt://localhost:7687").
    #[serde(default = "default_uri")]
    pub uri: String,

    /// Upper bound on pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Rows fetched per PULL.
    #[serde(default = "default_fetch_size")]
    pub fetch_size: usize,

    /// Total time budget for retrying a managed write transaction.
    #[serde(default = "default_max_retry_time_ms")]
    pub max_retry_time_ms: u64,

    /// Delay before the first retry.
    #[serde(default = "default_initial_retry_delay_ms")]
    pub initial_retry_delay_ms: u64,

    /// Backoff factor applied to the delay after every retry.
    #[serde(default = "default_retry_delay_multiplier")]
    pub retry_delay_multiplier: f64,
}

impl ConnectionSettings {
    fn load(file_prefix: &str, env: Option<config::Map<String, String>>) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(env_source(env)?.try_parsing(true))
            .build()?;

        Ok(cfg.try_deserialize()?)
    }
}

fn default_uri() -> String {
    "bolt://localhost:7687".to_string()
}

fn default_max_connections() -> u32 {
    16
}

fn default_fetch_size() -> usize {
    256
}

fn default_max_retry_time_ms() -> u64 {
    30_000
}

fn default_initial_retry_delay_ms() -> u64 {
    1_000
}

fn default_retry_delay_multiplier() -> f64 {
    2.0
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            max_connections: default_max_connections(),
            fetch_size: default_fetch_size(),
            max_retry_time_ms: default_max_retry_time_ms(),
            initial_retry_delay_ms: default_initial_retry_delay_ms(),
            retry_delay_multiplier: default_retry_delay_multiplier(),
        }
    }
}

/// Basic-auth credentials for the graph store.
#[derive(Clone)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    /// Read `NEO4J_USER` and `NEO4J_PASSWORD`. Values are kept verbatim.
    pub fn from_env(env: Option<config::Map<String, String>>) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(env_source(env)?)
            .build()?;

        let user = cfg
            .get_string("user")
            .map_err(|_| RosterError::MissingEnv { var: USER_VAR })?;
        let password = cfg
            .get_string("password")
            .map_err(|_| RosterError::MissingEnv { var: PASSWORD_VAR })?;

        Ok(Self { user, password })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn env_source(env: Option<config::Map<String, String>>) -> Result<config::Environment> {
    let vars = match env {
        Some(vars) => vars,
        None => prefixed_vars(std::env::vars_os())?,
    };
    Ok(config::Environment::with_prefix(ENV_PREFIX).source(Some(vars)))
}

/// Keep only `NEO4J_*` variables. Other variables are skipped without
/// being decoded, so a non-UTF-8 value elsewhere in the environment
/// cannot fail the load.
fn prefixed_vars(
    vars: impl IntoIterator<Item = (OsString, OsString)>,
) -> Result<config::Map<String, String>> {
    let prefix = format!("{ENV_PREFIX}_");
    let mut kept = config::Map::new();
    for (key, value) in vars {
        let Some(key) = key.to_str() else {
            continue;
        };
        if !key.to_ascii_uppercase().starts_with(&prefix) {
            continue;
        }
        let value = value
            .into_string()
            .map_err(|_| RosterError::NotUnicode { var: key.to_string() })?;
        kept.insert(key.to_string(), value);
    }
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(vars: &[(&str, &str)]) -> Option<config::Map<String, String>> {
        Some(
            vars.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn missing_file(dir: &tempfile::TempDir) -> String {
        dir.path().join("absent").to_string_lossy().into_owned()
    }

    #[test]
    fn test_missing_user_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = RosterConfig::load_with_env(&missing_file(&dir), env(&[(PASSWORD_VAR, "pw")]))
            .unwrap_err();
        assert!(matches!(err, RosterError::MissingEnv { var: USER_VAR }));
        assert_eq!(err.to_string(), "NEO4J_USER not set");
    }

    #[test]
    fn test_missing_password_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = RosterConfig::load_with_env(&missing_file(&dir), env(&[(USER_VAR, "neo4j")]))
            .unwrap_err();
        assert!(matches!(err, RosterError::MissingEnv { var: PASSWORD_VAR }));
    }

    #[test]
    fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = RosterConfig::load_with_env(
            &missing_file(&dir),
            env(&[(USER_VAR, "neo4j"), (PASSWORD_VAR, "secret")]),
        )
        .unwrap();

        assert_eq!(cfg.connection, ConnectionSettings::default());
        assert_eq!(cfg.connection.uri, "bolt://localhost:7687");
        assert_eq!(cfg.credentials.user, "neo4j");
        assert_eq!(cfg.credentials.password, "secret");
    }

    #[test]
    fn test_password_is_not_coerced() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = RosterConfig::load_with_env(
            &missing_file(&dir),
            env(&[(USER_VAR, "neo4j"), (PASSWORD_VAR, "007")]),
        )
        .unwrap();
        assert_eq!(cfg.credentials.password, "007");
    }

    #[test]
    fn test_file_then_env_layering() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("roster.toml"),
            "uri = \"bolt://graph.internal:7687\"\nmax_connections = 4\nfetch_size = 64\n",
        )
        .unwrap();
        let prefix = dir.path().join("roster").to_string_lossy().into_owned();

        let cfg = RosterConfig::load_with_env(
            &prefix,
            env(&[
                (USER_VAR, "neo4j"),
                (PASSWORD_VAR, "secret"),
                ("NEO4J_FETCH_SIZE", "512"),
            ]),
        )
        .unwrap();

        assert_eq!(cfg.connection.uri, "bolt://graph.internal:7687");
        assert_eq!(cfg.connection.max_connections, 4);
        assert_eq!(cfg.connection.fetch_size, 512);
        assert_eq!(cfg.connection.max_retry_time_ms, 30_000);
    }

    #[test]
    fn test_only_prefixed_vars_are_kept() {
        let vars = [
            (OsString::from("NEO4J_USER"), OsString::from("neo4j")),
            (OsString::from("PATH"), OsString::from("/usr/bin")),
            (OsString::from("neo4j_uri"), OsString::from("bolt://db:7687")),
        ];
        let kept = prefixed_vars(vars).unwrap();
        assert_eq!(kept.len(), 2);
        assert_eq!(kept.get("NEO4J_USER").map(String::as_str), Some("neo4j"));
        assert!(!kept.contains_key("PATH"));
    }

    #[cfg(unix)]
    #[test]
    fn test_foreign_non_utf8_var_is_ignored() {
        use std::os::unix::ffi::OsStringExt;

        let vars = [
            (OsString::from("NEO4J_PASSWORD"), OsString::from("secret")),
            (OsString::from("LEGACY_BLOB"), OsString::from_vec(vec![0x66, 0xff])),
            (OsString::from_vec(vec![0xfe, 0x41]), OsString::from("x")),
        ];
        let kept = prefixed_vars(vars).unwrap();
        assert_eq!(kept.len(), 1);

        let err = Credentials::from_env(Some(kept)).unwrap_err();
        assert!(matches!(err, RosterError::MissingEnv { var: USER_VAR }));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_credential_is_reported() {
        use std::os::unix::ffi::OsStringExt;

        let vars = [(OsString::from("NEO4J_USER"), OsString::from_vec(vec![0xff]))];
        let err = prefixed_vars(vars).unwrap_err();
        assert!(matches!(err, RosterError::NotUnicode { ref var } if var == "NEO4J_USER"));
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = Credentials {
            user: "neo4j".to_string(),
            password: "hunter2".to_string(),
        };
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("neo4j"));
        assert!(!rendered.contains("hunter2"));
    }
}
