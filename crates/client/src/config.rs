//! Client configuration loaded from the environment.

use std::path::PathBuf;
use std::time::Duration;

use authos_auth::{ExemptEndpoints, RedirectRoutes};

pub const API_URL_VAR: &str = "AUTHOS_API_URL";
pub const API_TIMEOUT_VAR: &str = "AUTHOS_API_TIMEOUT_MS";
pub const STATE_DIR_VAR: &str = "AUTHOS_STATE_DIR";
pub const SYSTEM_LOGIN_ROUTE_VAR: &str = "AUTHOS_SYSTEM_LOGIN_ROUTE";
pub const APP_SELECTION_ROUTE_VAR: &str = "AUTHOS_APP_SELECTION_ROUTE";
pub const EXEMPT_ENDPOINTS_VAR: &str = "AUTHOS_EXEMPT_ENDPOINTS";

const DEFAULT_API_URL: &str = "http://localhost:8080/api";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, value: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API root; request paths are appended to it.
    pub base_url: String,
    pub timeout: Duration,
    /// Directory holding the persisted session document.
    pub state_dir: PathBuf,
    pub redirects: RedirectRoutes,
    pub exempt_endpoints: ExemptEndpoints,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            state_dir: default_state_dir(),
            redirects: RedirectRoutes::default(),
            exempt_endpoints: ExemptEndpoints::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source. Unset or blank
    /// variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(url) = get(API_URL_VAR) {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::invalid(API_URL_VAR, &url, "expected an http(s) URL"));
            }
            config.base_url = url.trim_end_matches('/').to_string();
        }

        if let Some(raw) = get(API_TIMEOUT_VAR) {
            let millis = raw
                .parse::<u64>()
                .map_err(|err| ConfigError::invalid(API_TIMEOUT_VAR, &raw, err.to_string()))?;
            if millis == 0 {
                return Err(ConfigError::invalid(API_TIMEOUT_VAR, &raw, "timeout must be positive"));
            }
            config.timeout = Duration::from_millis(millis);
        }

        if let Some(dir) = get(STATE_DIR_VAR) {
            config.state_dir = PathBuf::from(dir);
        }

        if let Some(route) = get(SYSTEM_LOGIN_ROUTE_VAR) {
            config.redirects.system_login = route_path(SYSTEM_LOGIN_ROUTE_VAR, route)?;
        }

        if let Some(route) = get(APP_SELECTION_ROUTE_VAR) {
            config.redirects.app_selection = route_path(APP_SELECTION_ROUTE_VAR, route)?;
        }

        if let Some(raw) = get(EXEMPT_ENDPOINTS_VAR) {
            let exempt = ExemptEndpoints::new(raw.split(',').map(str::trim).filter(|p| !p.is_empty()));
            if exempt.is_empty() {
                return Err(ConfigError::invalid(
                    EXEMPT_ENDPOINTS_VAR,
                    &raw,
                    "at least one login endpoint must be listed",
                ));
            }
            config.exempt_endpoints = exempt;
        }

        Ok(config)
    }

    /// Path of the persisted session document.
    pub fn state_file(&self) -> PathBuf {
        self.state_dir.join(crate::storage::FileStore::FILE_NAME)
    }
}

fn route_path(key: &'static str, route: String) -> Result<String, ConfigError> {
    if route.starts_with('/') {
        Ok(route)
    } else {
        Err(ConfigError::invalid(key, &route, "route must start with '/'"))
    }
}

/// `{data_dir}/authos`, falling back to `~/.local/share/authos`, then the
/// working directory.
fn default_state_dir() -> PathBuf {
    let base = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .unwrap_or_else(|| PathBuf::from("."));

    base.join("authos")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = ClientConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.base_url, "http://localhost:8080/api");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.redirects, RedirectRoutes::default());
        assert!(config.exempt_endpoints.is_exempt("/public/login"));
        assert!(config.state_dir.ends_with("authos"));
    }

    #[test]
    fn overrides_are_applied() {
        let config = ClientConfig::from_lookup(lookup(&[
            (API_URL_VAR, "https://admin.example.com/api/"),
            (API_TIMEOUT_VAR, "2500"),
            (STATE_DIR_VAR, "/tmp/authos-test"),
            (SYSTEM_LOGIN_ROUTE_VAR, "/auth/root"),
            (EXEMPT_ENDPOINTS_VAR, "/public/system-login, /sso/callback"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "https://admin.example.com/api");
        assert_eq!(config.timeout, Duration::from_millis(2500));
        assert_eq!(config.state_file(), PathBuf::from("/tmp/authos-test/session.json"));
        assert_eq!(config.redirects.system_login, "/auth/root");
        assert_eq!(config.redirects.app_selection, "/app-selection");
        assert!(config.exempt_endpoints.is_exempt("/sso/callback"));
        assert!(!config.exempt_endpoints.is_exempt("/public/login"));
    }

    #[test]
    fn blank_values_keep_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[(API_URL_VAR, "  "), (API_TIMEOUT_VAR, "")])).unwrap();
        assert_eq!(config.base_url, DEFAULT_API_URL);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = ClientConfig::from_lookup(lookup(&[(API_TIMEOUT_VAR, "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: API_TIMEOUT_VAR, .. }));

        let err = ClientConfig::from_lookup(lookup(&[(API_TIMEOUT_VAR, "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: API_TIMEOUT_VAR, .. }));

        let err = ClientConfig::from_lookup(lookup(&[(EXEMPT_ENDPOINTS_VAR, " , ,")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: EXEMPT_ENDPOINTS_VAR, .. }));

        let err = ClientConfig::from_lookup(lookup(&[(API_URL_VAR, "localhost:8080")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: API_URL_VAR, .. }));

        let err = ClientConfig::from_lookup(lookup(&[(APP_SELECTION_ROUTE_VAR, "apps")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: APP_SELECTION_ROUTE_VAR, .. }));
    }
}
