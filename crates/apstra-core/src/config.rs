//! Configuration Loader
//!
//! Builds the [`ApstraConfig`] used by the API client. Values come from, in
//! increasing priority:
//!
//! 1. an optional TOML file (`--config`)
//! 2. an optional environment file (`--env-file`, `APSTRA_ENV_FILE`,
//!    `/etc/apstra-mcp/environment`, `.env`)
//! 3. the process environment
//!
//! Only variables with the `APSTRA_` prefix are considered:
//!
//! ```text
//! APSTRA_BASE_URL=https://apstra.example.net
//! APSTRA_API_TOKEN=xxxxxxxx
//! APSTRA_TIMEOUT_SECS=30
//! APSTRA_VERIFY_TLS=false
//! ```
//!
//! The configuration is loaded once in `main()` and passed down explicitly.

use crate::error::{Error, Result};
use ::config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Prefix shared by every configuration variable
pub const ENV_PREFIX: &str = "APSTRA";

/// Default request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Variable naming a custom environment file
pub const ENV_FILE_VAR: &str = "APSTRA_ENV_FILE";

/// Environment files checked when none is given explicitly (in order)
pub const ENV_FILE_PATHS: &[&str] = &["/etc/apstra-mcp/environment", ".env"];

/// Connection settings for the Apstra API
#[derive(Clone)]
pub struct ApstraConfig {
    /// Base URL without trailing slash (e.g. "https://apstra.example.net")
    pub base_url: String,
    /// Value sent in the AUTHTOKEN header
    pub api_token: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Verify the server certificate (off by default, Apstra ships self-signed)
    pub verify_tls: bool,
}

impl fmt::Debug for ApstraConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApstraConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &"***")
            .field("timeout", &self.timeout)
            .field("verify_tls", &self.verify_tls)
            .finish()
    }
}

/// Where to look for configuration besides the process environment
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// TOML file with `base_url`, `api_token`, `timeout_secs`, `verify_tls`
    pub config_file: Option<PathBuf>,
    /// Environment file with `APSTRA_*` lines
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    base_url: Option<String>,
    api_token: Option<String>,
    timeout_secs: Option<u64>,
    verify_tls: Option<bool>,
}

impl ApstraConfig {
    /// Create a config with default timeout and TLS verification disabled
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            verify_tls: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_tls_verification(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    /// Load from the process environment plus the given sources.
    ///
    /// Fails if the base URL or token is missing.
    pub fn load(sources: &ConfigSources) -> Result<Self> {
        let mut vars = match locate_env_file(sources.env_file.as_deref())? {
            Some(path) => load_env_file(&path)?,
            None => HashMap::new(),
        };

        // Process environment wins over the file
        vars.extend(std::env::vars().filter(|(k, _)| k.starts_with(ENV_PREFIX)));

        Self::from_vars(vars, sources.config_file.as_deref())
    }

    /// Build from an explicit variable map (and optional TOML file).
    pub fn from_vars(vars: HashMap<String, String>, config_file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = config_file {
            debug!(path = %path.display(), "Adding config file source");
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .ignore_empty(true)
                    .source(Some(vars)),
            )
            .build()?;

        let raw: RawSettings = settings.try_deserialize()?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawSettings) -> Result<Self> {
        let base_url = raw
            .base_url
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| Error::config("APSTRA_BASE_URL environment variable is required"))?;
        let api_token = raw
            .api_token
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| Error::config("APSTRA_API_TOKEN environment variable is required"))?;

        let timeout_secs = raw.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(Error::config("APSTRA_TIMEOUT_SECS must be greater than zero"));
        }

        Ok(Self::new(base_url.trim(), api_token.trim())
            .with_timeout(Duration::from_secs(timeout_secs))
            .with_tls_verification(raw.verify_tls.unwrap_or(false)))
    }
}

/// Pick the environment file to read.
///
/// An explicit path must exist; the fallbacks are optional.
fn locate_env_file(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(Error::config(format!(
                "environment file not found: {}",
                path.display()
            )));
        }
        return Ok(Some(path.to_path_buf()));
    }

    if let Ok(custom) = std::env::var(ENV_FILE_VAR) {
        let path = PathBuf::from(custom);
        if path.exists() {
            return Ok(Some(path));
        }
        warn!(path = %path.display(), "{} points to a missing file", ENV_FILE_VAR);
    }

    let found = ENV_FILE_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists());
    if found.is_none() {
        debug!("No environment file found, using process environment only");
    }
    Ok(found)
}

/// Read `KEY=VALUE` lines from an environment file.
pub fn load_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let content = fs::read_to_string(path).map_err(|e| {
        Error::config(format!("failed to read environment file {}: {}", path.display(), e))
    })?;

    let vars: HashMap<String, String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(parse_env_line)
        .collect();

    info!(path = %path.display(), count = vars.len(), "Loaded environment file");
    Ok(vars)
}

/// Parse a single environment line into key-value pair.
fn parse_env_line(line: &str) -> Option<(String, String)> {
    // Handle: KEY=VALUE, KEY="VALUE", KEY='VALUE', export KEY=VALUE
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let value = value.trim();

    if key.is_empty() {
        return None;
    }

    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value);

    Some((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_env_line_simple() {
        let (k, v) = parse_env_line("FOO=bar").unwrap();
        assert_eq!(k, "FOO");
        assert_eq!(v, "bar");
    }

    #[test]
    fn test_parse_env_line_quoted() {
        let (k, v) = parse_env_line("APSTRA_API_TOKEN=\"abc def\"").unwrap();
        assert_eq!(k, "APSTRA_API_TOKEN");
        assert_eq!(v, "abc def");

        let (_, v) = parse_env_line("export FOO='bar'").unwrap();
        assert_eq!(v, "bar");
    }

    #[test]
    fn test_parse_env_line_empty() {
        assert!(parse_env_line("").is_none());
        assert!(parse_env_line("=value").is_none());
        assert!(parse_env_line("no-equals-sign").is_none());
    }

    #[test]
    fn test_from_vars_complete() {
        let config = ApstraConfig::from_vars(
            vars(&[
                ("APSTRA_BASE_URL", "https://apstra.lab/"),
                ("APSTRA_API_TOKEN", "secret"),
                ("APSTRA_TIMEOUT_SECS", "12"),
                ("APSTRA_VERIFY_TLS", "true"),
            ]),
            None,
        )
        .unwrap();

        assert_eq!(config.base_url, "https://apstra.lab");
        assert_eq!(config.api_token, "secret");
        assert_eq!(config.timeout, Duration::from_secs(12));
        assert!(config.verify_tls);
    }

    #[test]
    fn test_numeric_looking_values_stay_strings() {
        let config = ApstraConfig::from_vars(
            vars(&[
                ("APSTRA_BASE_URL", "https://apstra.lab"),
                ("APSTRA_API_TOKEN", "00123"),
                ("APSTRA_TIMEOUT_SECS", "045"),
                ("APSTRA_VERIFY_TLS", "false"),
            ]),
            None,
        )
        .unwrap();

        assert_eq!(config.api_token, "00123");
        assert_eq!(config.timeout, Duration::from_secs(45));
        assert!(!config.verify_tls);
    }

    #[test]
    fn test_from_vars_defaults() {
        let config = ApstraConfig::from_vars(
            vars(&[
                ("APSTRA_BASE_URL", "https://apstra.lab"),
                ("APSTRA_API_TOKEN", "secret"),
            ]),
            None,
        )
        .unwrap();

        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(!config.verify_tls);
    }

    #[test]
    fn test_missing_base_url_fails() {
        let err = ApstraConfig::from_vars(vars(&[("APSTRA_API_TOKEN", "secret")]), None).unwrap_err();
        assert!(err.to_string().contains("APSTRA_BASE_URL"));
    }

    #[test]
    fn test_empty_token_fails() {
        let err = ApstraConfig::from_vars(
            vars(&[("APSTRA_BASE_URL", "https://apstra.lab"), ("APSTRA_API_TOKEN", "")]),
            None,
        )
        .unwrap_err();
        assert!(err.to_string().contains("APSTRA_API_TOKEN"));
    }

    #[test]
    fn test_unrelated_vars_ignored() {
        let err = ApstraConfig::from_vars(
            vars(&[("BASE_URL", "https://apstra.lab"), ("API_TOKEN", "secret")]),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_env_file_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# Apstra lab").unwrap();
        writeln!(file, "APSTRA_BASE_URL=https://10.0.0.5").unwrap();
        writeln!(file, "APSTRA_API_TOKEN='tok'").unwrap();

        let loaded = load_env_file(file.path()).unwrap();
        let config = ApstraConfig::from_vars(loaded, None).unwrap();
        assert_eq!(config.base_url, "https://10.0.0.5");
        assert_eq!(config.api_token, "tok");
    }

    #[test]
    fn test_toml_file_overridden_by_env() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "base_url = \"https://from-file\"").unwrap();
        writeln!(file, "api_token = \"file-token\"").unwrap();
        writeln!(file, "timeout_secs = 5").unwrap();

        let config = ApstraConfig::from_vars(
            vars(&[("APSTRA_API_TOKEN", "env-token")]),
            Some(file.path()),
        )
        .unwrap();

        assert_eq!(config.base_url, "https://from-file");
        assert_eq!(config.api_token, "env-token");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_explicit_env_file_must_exist() {
        let err = locate_env_file(Some(Path::new("/nonexistent/apstra.env"))).unwrap_err();
        assert!(err.to_string().contains("environment file not found"));
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = ApstraConfig::new("https://apstra.lab", "super-secret");
        let printed = format!("{:?}", config);
        assert!(!printed.contains("super-secret"));
    }
}
