//! Authorization-failure policy.
//!
//! Classifies a failed response by status and originating path. The client
//! performs the teardown and redirect; this module only decides.

use serde::{Deserialize, Serialize};

/// HTTP status signalling missing or rejected credentials.
pub const UNAUTHORIZED: u16 = 401;

/// Login-type request paths excluded from the global 401 policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExemptEndpoints(Vec<String>);

impl ExemptEndpoints {
    pub const SYSTEM_LOGIN: &'static str = "/public/system-login";
    pub const APP_LOGIN: &'static str = "/public/app-login";
    pub const USER_LOGIN: &'static str = "/public/login";

    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            paths
                .into_iter()
                .map(|p| {
                    let p: String = p.into();
                    let p = normalize_path(p.trim());
                    // Endpoints match on whole segments only.
                    if p.starts_with('/') { p.to_string() } else { format!("/{p}") }
                })
                .filter(|p| p != "/")
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Whether `path` targets an exempt endpoint.
    ///
    /// Query strings, fragments and trailing slashes are ignored, and any
    /// prefix (base path, scheme and host) in front of the endpoint matches.
    pub fn is_exempt(&self, path: &str) -> bool {
        let path = normalize_path(path);
        self.0.iter().any(|endpoint| path.ends_with(endpoint.as_str()))
    }
}

impl Default for ExemptEndpoints {
    fn default() -> Self {
        Self::new([Self::SYSTEM_LOGIN, Self::APP_LOGIN, Self::USER_LOGIN])
    }
}

/// What the client must do with a failed response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureDisposition {
    /// 401 outside an exempt endpoint: tear down every tier and hard-redirect
    /// to the system login screen.
    AuthorizationExpired,
    /// Failure on a login endpoint: the caller shows it to the user.
    AuthenticationRejected,
    /// Anything else: hand back unmodified.
    PassThrough,
}

/// Classify a failed response.
pub fn classify_failure(status: u16, path: &str, exempt: &ExemptEndpoints) -> FailureDisposition {
    if exempt.is_exempt(path) {
        FailureDisposition::AuthenticationRejected
    } else if status == UNAUTHORIZED {
        FailureDisposition::AuthorizationExpired
    } else {
        FailureDisposition::PassThrough
    }
}

/// Strip query, fragment and trailing slashes. The root stays `/`.
pub(crate) fn normalize_path(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let trimmed = path[..end].trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}
