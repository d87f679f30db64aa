//! Response Failure Interceptor.
//!
//! Owns the 401 recovery policy: an unauthorized response outside the login
//! endpoints tears down every tier and hard-redirects to the system login
//! screen. Everything else is handed back to the caller untouched.

use std::sync::Arc;

use serde_json::Value;

use authos_auth::{ExemptEndpoints, FailureDisposition, RedirectRoutes, classify_failure};

use crate::error::ApiError;
use crate::navigation::Navigator;
use crate::session::SessionStore;

pub struct ResponseInterceptor {
    session: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
    exempt: ExemptEndpoints,
    login_route: String,
}

impl core::fmt::Debug for ResponseInterceptor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ResponseInterceptor")
            .field("exempt", &self.exempt)
            .field("login_route", &self.login_route)
            .finish_non_exhaustive()
    }
}

impl ResponseInterceptor {
    pub fn new(
        session: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
        exempt: ExemptEndpoints,
        redirects: &RedirectRoutes,
    ) -> Self {
        Self {
            session,
            navigator,
            exempt,
            login_route: redirects.system_login.clone(),
        }
    }

    /// Apply the failure policy to a non-success response to `path`.
    ///
    /// Repeated expiries (several requests failing at once) are safe: the
    /// teardown only clears already-empty fields the second time.
    pub fn on_failure(&self, status: u16, path: &str, body: &str) -> ApiError {
        let message = error_message(status, body);

        match classify_failure(status, path, &self.exempt) {
            FailureDisposition::AuthorizationExpired => {
                tracing::warn!(path, status, "authorization expired; clearing session");
                self.session.logout();
                self.navigator.hard_redirect(&self.login_route);
                ApiError::AuthorizationExpired { path: path.to_string() }
            }
            FailureDisposition::AuthenticationRejected => {
                tracing::debug!(path, status, "login endpoint rejected the request");
                ApiError::AuthenticationRejected { status, message }
            }
            FailureDisposition::PassThrough => ApiError::Api { status, message },
        }
    }

    pub fn exempt_endpoints(&self) -> &ExemptEndpoints {
        &self.exempt
    }
}

/// Human-readable message from an error body.
///
/// Servers answer `{"message": ..}` (sometimes `{"error": ..}`); anything
/// else falls back to the raw text and finally the status reason.
pub fn error_message(status: u16, body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error"] {
            if let Some(text) = map.get(key).and_then(Value::as_str).filter(|s| !s.is_empty()) {
                return text.to_string();
            }
        }
    }

    let text = body.trim();
    if !text.is_empty() {
        return text.to_string();
    }

    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("request failed")
        .to_string()
}
