//! Outbound Header Composer.
//!
//! Stamps each request with one header per credential tier present plus the
//! tenant identifier. Each header is attached independently; a problem with
//! one never blocks the request or the other headers.

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};

use authos_auth::Credential;

use crate::session::{SessionSnapshot, SessionStore};

/// Platform-administrator credential.
pub const SYSTEM_TOKEN_HEADER: HeaderName = HeaderName::from_static("x-system-token");
/// Tenant-application credential.
pub const APP_TOKEN_HEADER: HeaderName = HeaderName::from_static("x-app-token");
/// Selected tenant identifier.
pub const TENANT_ID_HEADER: HeaderName = HeaderName::from_static("x-app-id");

#[derive(Debug, Clone)]
pub struct HeaderComposer {
    session: Arc<SessionStore>,
}

impl HeaderComposer {
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self { session }
    }

    /// Headers for a request dispatched now.
    pub fn headers(&self) -> HeaderMap {
        Self::compose(&self.session.snapshot())
    }

    /// Headers for a given snapshot.
    pub fn compose(snapshot: &SessionSnapshot) -> HeaderMap {
        let mut headers = HeaderMap::new();
        Self::apply(snapshot, &mut headers);
        headers
    }

    /// Add credential headers to `headers`, replacing any previous values.
    pub fn apply(snapshot: &SessionSnapshot, headers: &mut HeaderMap) {
        if let Some(token) = &snapshot.system_token {
            insert_credential(headers, SYSTEM_TOKEN_HEADER, token, "");
        }

        if let Some(token) = &snapshot.app_token {
            insert_credential(headers, APP_TOKEN_HEADER, token, "");
        }

        // The end-user token is the primary bearer credential.
        if let Some(token) = &snapshot.user_token {
            insert_credential(headers, AUTHORIZATION, token, "Bearer ");
        }

        if !snapshot.current_app.is_empty() {
            match snapshot.current_app.app_id() {
                Ok(Some(app_id)) => {
                    headers.insert(TENANT_ID_HEADER, HeaderValue::from(app_id.get()));
                }
                Ok(None) => {
                    tracing::debug!("selected tenant has no identifier; tenant header omitted");
                }
                Err(err) => {
                    tracing::warn!("{err}; tenant header omitted");
                }
            }
        }
    }
}

fn insert_credential(headers: &mut HeaderMap, name: HeaderName, token: &Credential, scheme: &str) {
    match HeaderValue::from_str(&format!("{scheme}{}", token.expose())) {
        Ok(mut value) => {
            value.set_sensitive(true);
            headers.insert(name, value);
        }
        Err(_) => {
            tracing::warn!(header = %name, "credential is not a valid header value; header omitted");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authos_auth::TenantRecord;
    use serde_json::json;

    fn tenant(value: serde_json::Value) -> TenantRecord {
        TenantRecord::from_value(value).unwrap()
    }

    #[test]
    fn empty_session_sends_no_headers() {
        let headers = HeaderComposer::compose(&SessionSnapshot::default());
        assert!(headers.is_empty());
    }

    #[test]
    fn every_tier_gets_its_header() {
        let session = Arc::new(SessionStore::in_memory());
        session.set_system_auth("root", "sys");
        session.set_app_auth(Some(tenant(json!({"id": 42, "code": "acme"}))), "app");
        session.set_user_auth("u", "usr", None);

        let headers = HeaderComposer::new(session).headers();
        assert_eq!(headers.get(SYSTEM_TOKEN_HEADER).unwrap(), "sys");
        assert_eq!(headers.get(APP_TOKEN_HEADER).unwrap(), "app");
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer usr");
        assert_eq!(headers.get(TENANT_ID_HEADER).unwrap(), "42");
        assert!(headers.get(AUTHORIZATION).unwrap().is_sensitive());
    }

    #[test]
    fn tenant_header_without_app_token() {
        let snapshot = SessionSnapshot {
            current_app: tenant(json!({"ID": 7})),
            ..Default::default()
        };
        let headers = HeaderComposer::compose(&snapshot);
        assert_eq!(headers.get(TENANT_ID_HEADER).unwrap(), "7");
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn malformed_tenant_only_drops_the_tenant_header() {
        let snapshot = SessionSnapshot {
            system_token: Credential::new("sys"),
            current_app: tenant(json!({"id": "not-a-number", "code": "acme"})),
            ..Default::default()
        };
        let headers = HeaderComposer::compose(&snapshot);
        assert!(headers.get(TENANT_ID_HEADER).is_none());
        assert_eq!(headers.get(SYSTEM_TOKEN_HEADER).unwrap(), "sys");
    }

    #[test]
    fn tenant_without_identifier_sends_no_tenant_header() {
        let snapshot = SessionSnapshot {
            current_app: tenant(json!({"code": "acme"})),
            ..Default::default()
        };
        assert!(HeaderComposer::compose(&snapshot).is_empty());
    }

    #[test]
    fn invalid_token_bytes_skip_only_that_header() {
        let snapshot = SessionSnapshot {
            system_token: Credential::new("bad\ntoken"),
            app_token: Credential::new("app"),
            ..Default::default()
        };
        let headers = HeaderComposer::compose(&snapshot);
        assert!(headers.get(SYSTEM_TOKEN_HEADER).is_none());
        assert_eq!(headers.get(APP_TOKEN_HEADER).unwrap(), "app");
    }

    #[test]
    fn snapshot_is_isolated_from_later_mutations() {
        let session = Arc::new(SessionStore::in_memory());
        session.set_system_auth("root", "sys");
        let snapshot = session.snapshot();

        session.logout();
        assert_eq!(HeaderComposer::compose(&snapshot).get(SYSTEM_TOKEN_HEADER).unwrap(), "sys");
        assert!(HeaderComposer::new(session).headers().is_empty());
    }
}
