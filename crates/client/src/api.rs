//! HTTP transport bound to the session layer.
//!
//! Every request is stamped by the [`HeaderComposer`] from a snapshot taken
//! at dispatch time, and every failure goes through the
//! [`ResponseInterceptor`] before the caller sees it.

use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use authos_auth::{ExemptEndpoints, TenantRecord};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::headers::HeaderComposer;
use crate::interceptor::ResponseInterceptor;
use crate::navigation::Navigator;
use crate::session::SessionStore;

pub const LOGOUT_PATH: &str = "/public/logout";

/// Body returned by the login endpoints.
#[derive(Clone, Default, Deserialize, Serialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub user: Option<Value>,
    #[serde(default)]
    pub app: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl core::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .field("app", &self.app)
            .field("message", &self.message)
            .finish()
    }
}

#[derive(Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
    composer: HeaderComposer,
    interceptor: ResponseInterceptor,
}

impl ApiClient {
    pub fn new(
        config: &ClientConfig,
        session: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            composer: HeaderComposer::new(session.clone()),
            interceptor: ResponseInterceptor::new(
                session.clone(),
                navigator,
                config.exempt_endpoints.clone(),
                &config.redirects,
            ),
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn composer(&self) -> &HeaderComposer {
        &self.composer
    }

    // ── Generic verbs ───────────────────────────────────────────────────────

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(Method::GET, path, None::<&()>).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::PUT, path, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(Method::DELETE, path, None::<&()>).await
    }

    async fn send<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let mut req = self.http.request(method.clone(), &url).headers(self.composer.headers());
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = match req.send().await {
            Ok(resp) => resp,
            Err(err) => {
                tracing::warn!(%method, path, "request failed: {err}");
                return Err(err.into());
            }
        };

        let status = resp.status();

        if !status.is_success() {
            // The status alone decides the failure policy; a body that cannot
            // be read only costs the error message.
            let text = resp.text().await.unwrap_or_else(|err| {
                tracing::debug!(%method, path, "failed to read error body: {err}");
                String::new()
            });
            return Err(self.interceptor.on_failure(status.as_u16(), path, &text));
        }

        let text = resp.text().await.map_err(|err| {
            tracing::warn!(%method, path, "failed to read response body: {err}");
            ApiError::Transport(format!("{path}: {err}"))
        })?;

        tracing::debug!(%method, path, status = status.as_u16(), "request completed");

        // An empty success body decodes as `null`, so `()` and `Option<_>` work.
        let text = if text.trim().is_empty() { "null" } else { text.as_str() };
        serde_json::from_str(text).map_err(|err| ApiError::Decode(format!("{path}: {err}")))
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    // ── Login flows ─────────────────────────────────────────────────────────

    /// Administrator login. On success the system tier is set from the
    /// returned user and token.
    pub async fn system_login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let resp = self
            .login(
                ExemptEndpoints::SYSTEM_LOGIN,
                &json!({ "username": username, "password": password }),
            )
            .await?;

        self.session
            .set_system_auth(resp.user.clone().unwrap_or(Value::Null), &resp.token);
        Ok(resp)
    }

    /// Tenant application login. The response must carry the application
    /// record; the token and record are stored together.
    pub async fn app_login(&self, app_uuid: &str, app_secret: &str) -> Result<LoginResponse, ApiError> {
        let resp = self
            .login(
                ExemptEndpoints::APP_LOGIN,
                &json!({ "appUuid": app_uuid, "appSecret": app_secret }),
            )
            .await?;

        let app = tenant_record(resp.app.as_ref())
            .ok_or_else(|| ApiError::Decode("app login response carried no application".to_string()))?;

        self.session.set_app_auth(Some(app), &resp.token);
        Ok(resp)
    }

    /// End-user login inside the tenant identified by `app_code`.
    pub async fn user_login(
        &self,
        username: &str,
        password: &str,
        app_code: &str,
    ) -> Result<LoginResponse, ApiError> {
        let resp = self
            .login(
                ExemptEndpoints::USER_LOGIN,
                &json!({ "username": username, "password": password, "appCode": app_code }),
            )
            .await?;

        self.session.set_user_auth(
            resp.user.clone().unwrap_or(Value::Null),
            &resp.token,
            tenant_record(resp.app.as_ref()),
        );
        Ok(resp)
    }

    async fn login(&self, path: &str, body: &Value) -> Result<LoginResponse, ApiError> {
        let resp: LoginResponse = self.post(path, body).await?;
        if resp.token.is_empty() {
            return Err(ApiError::Decode(format!("{path}: login response carried no token")));
        }
        Ok(resp)
    }

    /// Notify the server (best effort), then clear every tier locally.
    pub async fn logout(&self) {
        if let Err(err) = self.post::<_, Value>(LOGOUT_PATH, &json!({})).await {
            tracing::debug!("server logout failed, clearing local session anyway: {err}");
        }
        self.session.logout();
    }

    // ── Tenant selection ────────────────────────────────────────────────────

    /// Switch to another tenant using credentials obtained elsewhere.
    pub fn select_app(&self, app: TenantRecord, token: &str) {
        self.session.set_app_auth(Some(app), token);
    }

    /// Return to tenant selection, keeping the administrator tier.
    pub fn leave_app(&self) {
        self.session.clear_app_auth();
    }
}

fn tenant_record(value: Option<&Value>) -> Option<TenantRecord> {
    let value = value?;
    match TenantRecord::from_value(value.clone()) {
        Ok(record) if !record.is_empty() => Some(record),
        Ok(_) => None,
        Err(err) => {
            tracing::warn!("{err}; tenant record ignored");
            None
        }
    }
}
