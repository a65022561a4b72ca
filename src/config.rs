// Runtime configuration read from environment variables. Every value has a
// default so the CLI works out of the box against the production service.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.backscnr.com";
pub const DEFAULT_LOGIN_URL: &str = "https://backscnr.com/account/token";
const TOKEN_FILE_NAME: &str = ".backscnr_token.env";
const FALLBACK_TOKEN_FILE: &str = ".token.env";

#[derive(Debug, Clone)]
pub struct Config {
    /// API root, without a trailing slash.
    pub base_url: String,
    /// Page where users copy a fresh refresh token from.
    pub login_url: String,
    pub token_file: PathBuf,
    /// Timeout for ordinary requests (token refresh, downloads).
    pub timeout: Duration,
    /// Analysis runs synchronously server-side and needs far longer.
    pub analysis_timeout: Duration,
}

impl Config {
    /// Build a config for `base_url` with every other setting defaulted.
    pub fn new(base_url: &str, token_file: impl Into<PathBuf>) -> Self {
        Config {
            base_url: base_url.trim_end_matches('/').to_string(),
            login_url: DEFAULT_LOGIN_URL.into(),
            token_file: token_file.into(),
            timeout: Duration::from_secs(5),
            analysis_timeout: Duration::from_secs(3 * 60),
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` but reads variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("BACKSCNR_API_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let token_file = lookup("BACKSCNR_TOKEN_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(default_token_file);

        let mut config = Config::new(&base_url, token_file);
        if let Some(login_url) = lookup("BACKSCNR_LOGIN_URL") {
            config.login_url = login_url;
        }
        if let Some(secs) = lookup("BACKSCNR_TIMEOUT_SECS") {
            config.timeout = parse_secs("BACKSCNR_TIMEOUT_SECS", &secs)?;
        }
        if let Some(secs) = lookup("BACKSCNR_ANALYSIS_TIMEOUT_SECS") {
            config.analysis_timeout = parse_secs("BACKSCNR_ANALYSIS_TIMEOUT_SECS", &secs)?;
        }
        Ok(config)
    }
}

fn default_token_file() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(TOKEN_FILE_NAME),
        None => PathBuf::from(FALLBACK_TOKEN_FILE),
    }
}

fn parse_secs(name: &str, value: &str) -> Result<Duration> {
    let secs: u64 = value
        .trim()
        .parse()
        .with_context(|| format!("Invalid {}: {:?}", name, value))?;
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.login_url, DEFAULT_LOGIN_URL);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.analysis_timeout, Duration::from_secs(180));
        assert!(config.token_file.ends_with(TOKEN_FILE_NAME) || config.token_file.ends_with(FALLBACK_TOKEN_FILE));
    }

    #[test]
    fn overrides_and_trailing_slash() {
        let config = Config::from_lookup(lookup_from(&[
            ("BACKSCNR_API_URL", "http://localhost:9000/"),
            ("BACKSCNR_TOKEN_FILE", "/tmp/tok"),
            ("BACKSCNR_TIMEOUT_SECS", "12"),
            ("BACKSCNR_ANALYSIS_TIMEOUT_SECS", " 600 "),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.token_file, PathBuf::from("/tmp/tok"));
        assert_eq!(config.timeout, Duration::from_secs(12));
        assert_eq!(config.analysis_timeout, Duration::from_secs(600));
    }

    #[test]
    fn bad_timeout_names_the_variable() {
        let err = Config::from_lookup(lookup_from(&[("BACKSCNR_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(err.to_string().contains("BACKSCNR_TIMEOUT_SECS"));
    }
}
