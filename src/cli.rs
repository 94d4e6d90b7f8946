//! Command-line interface parsing for the Vorex client
//!
//! Global flags configure the API client (with environment fallbacks); the
//! subcommands expose the retrying fetch, cached JSON reads and the local
//! settings store.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use thiserror::Error;

use crate::config::{ClientConfig, DEFAULT_BASE_URL};
use crate::fetch::RequestSpec;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// A `-H` value was not `Name: value` or not a valid header
    #[error("Invalid header: '{0}'. Expected 'Name: value'")]
    InvalidHeader(String),

    /// The HTTP method is not a valid token
    #[error("Invalid method: '{0}'")]
    InvalidMethod(String),

    /// A `-q` value was not `key=value`
    #[error("Invalid query parameter: '{0}'. Expected 'key=value'")]
    InvalidQuery(String),
}

/// Vorex client - talk to the Vorex API with retries and caching
#[derive(Parser, Debug)]
#[command(name = "vorex")]
#[command(about = "Resilient client for the Vorex language-learning API")]
#[command(version)]
pub struct Cli {
    /// Base URL of the backend API
    #[arg(long, env = "VOREX_API_URL", default_value = DEFAULT_BASE_URL, global = true)]
    pub base_url: String,

    /// Retries after the first attempt for server errors and network failures
    #[arg(long, env = "VOREX_MAX_RETRIES", default_value_t = 3, global = true)]
    pub retries: u32,

    /// Base delay between attempts in milliseconds (grows linearly)
    #[arg(long, env = "VOREX_RETRY_DELAY_MS", default_value_t = 1000, global = true)]
    pub retry_delay_ms: u64,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30, global = true)]
    pub timeout_secs: u64,

    /// Directory for local storage (defaults to the platform data directory)
    #[arg(long, env = "VOREX_STORAGE_DIR", global = true)]
    pub storage_dir: Option<PathBuf>,

    /// Log retries, cache hits and misses
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send one request to any URL with retry on transient failure
    ///
    /// Examples:
    ///   vorex fetch https://api.vorex.app/v1/health
    ///   vorex fetch -X POST -H 'Content-Type: application/json' -d '{}' <URL>
    Fetch {
        /// Target URL
        url: String,
        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,
        /// Request header, `Name: value` (repeatable)
        #[arg(short = 'H', long = "header", value_name = "HEADER")]
        headers: Vec<String>,
        /// Request body
        #[arg(short = 'd', long)]
        data: Option<String>,
    },

    /// Read a JSON resource from the API (cached for the session)
    Get {
        /// Path relative to the base URL, e.g. `lessons/42`
        path: String,
        /// Query parameter, `key=value` (repeatable)
        #[arg(short = 'q', long = "query", value_name = "KEY=VALUE")]
        query: Vec<String>,
    },

    /// Show or change local settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum SettingsAction {
    /// Print the current settings as JSON
    Show,
    /// Change one setting, e.g. `set theme dark`
    Set { field: String, value: String },
    /// Restore the defaults
    Reset,
}

impl Cli {
    /// Client configuration derived from the global flags
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            max_retries: self.retries,
            retry_delay_ms: self.retry_delay_ms,
            timeout_secs: self.timeout_secs,
            ..Default::default()
        }
    }
}

/// Parses a `Name: value` header argument.
pub fn parse_header(s: &str) -> Result<(HeaderName, HeaderValue), CliError> {
    let invalid = || CliError::InvalidHeader(s.to_string());
    let (name, value) = s.split_once(':').ok_or_else(invalid)?;
    let name = HeaderName::from_bytes(name.trim().as_bytes()).map_err(|_| invalid())?;
    let value = HeaderValue::from_str(value.trim()).map_err(|_| invalid())?;
    Ok((name, value))
}

/// Parses an HTTP method name, case-insensitively for the standard ones.
pub fn parse_method(s: &str) -> Result<Method, CliError> {
    Method::from_bytes(s.to_ascii_uppercase().as_bytes())
        .map_err(|_| CliError::InvalidMethod(s.to_string()))
}

/// Parses a `key=value` query argument.
pub fn parse_query(s: &str) -> Result<(String, String), CliError> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(CliError::InvalidQuery(s.to_string())),
    }
}

/// Builds the request descriptor for `vorex fetch`.
pub fn build_request(
    method: &str,
    headers: &[String],
    data: Option<&str>,
) -> Result<RequestSpec, CliError> {
    let mut header_map = HeaderMap::new();
    for header in headers {
        let (name, value) = parse_header(header)?;
        header_map.append(name, value);
    }

    let mut request = RequestSpec::new(parse_method(method)?).with_headers(header_map);
    if let Some(data) = data {
        request = request.with_body(data);
    }
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header() {
        let (name, value) = parse_header("Authorization: Bearer abc").unwrap();
        assert_eq!(name.as_str(), "authorization");
        assert_eq!(value.to_str().unwrap(), "Bearer abc");
    }

    #[test]
    fn test_parse_header_invalid() {
        assert!(parse_header("no-colon").is_err());
        assert!(parse_header("bad name: v").is_err());
        let err = parse_header("oops").unwrap_err();
        assert!(err.to_string().contains("Invalid header"));
    }

    #[test]
    fn test_parse_method() {
        assert_eq!(parse_method("post").unwrap(), Method::POST);
        assert_eq!(parse_method("DELETE").unwrap(), Method::DELETE);
        assert!(parse_method("GE T").is_err());
    }

    #[test]
    fn test_parse_query() {
        assert_eq!(
            parse_query("lang=es").unwrap(),
            ("lang".to_string(), "es".to_string())
        );
        assert_eq!(parse_query("empty=").unwrap().1, "");
        assert!(parse_query("=x").is_err());
        assert!(parse_query("novalue").is_err());
    }

    #[test]
    fn test_build_request() {
        let headers = vec!["Accept: application/json".to_string(), "X-Trace: 1".to_string()];
        let request = build_request("put", &headers, Some("{}")).unwrap();
        assert_eq!(request.method, Method::PUT);
        assert_eq!(request.headers.len(), 2);
        assert_eq!(request.body.as_deref(), Some(b"{}".as_slice()));
    }

    #[test]
    fn test_cli_parse_fetch_defaults() {
        let cli = Cli::parse_from(["vorex", "fetch", "http://localhost/health"]);
        assert_eq!(cli.retries, 3);
        assert_eq!(cli.retry_delay_ms, 1000);
        assert!(!cli.verbose);
        match cli.command {
            Command::Fetch { url, method, headers, data } => {
                assert_eq!(url, "http://localhost/health");
                assert_eq!(method, "GET");
                assert!(headers.is_empty());
                assert!(data.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_parse_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "vorex", "get", "lessons", "-q", "unit=2", "--retries", "0", "--retry-delay-ms", "5",
        ]);
        assert_eq!(cli.retries, 0);
        assert_eq!(cli.retry_delay_ms, 5);
        let config = cli.client_config();
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.retry_delay_ms, 5);
    }

    #[test]
    fn test_cli_flags_drive_retry_options() {
        let cli = Cli::parse_from([
            "vorex", "--retries", "7", "--retry-delay-ms", "250", "--timeout-secs", "4", "fetch", "http://x",
        ]);
        let options = cli.client_config().retry_options();
        assert_eq!(options.max_retries, 7);
        assert_eq!(options.retry_delay, std::time::Duration::from_millis(250));
        assert_eq!(options.total_attempts(), 8);
        assert_eq!(cli.client_config().timeout(), std::time::Duration::from_secs(4));
    }

    #[test]
    fn test_cli_rejects_negative_retries() {
        let result = Cli::try_parse_from(["vorex", "--retries", "-1", "fetch", "http://x"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_settings_set() {
        let cli = Cli::parse_from(["vorex", "settings", "set", "theme", "dark"]);
        match cli.command {
            Command::Settings { action } => assert_eq!(
                action,
                SettingsAction::Set {
                    field: "theme".to_string(),
                    value: "dark".to_string()
                }
            ),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
