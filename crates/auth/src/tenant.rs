//! Tenant application records.
//!
//! The selected tenant is kept as the raw record the server returned so that
//! nothing is lost across reloads; the typed [`AppIdentity`] view is decoded
//! on demand and may fail independently of the record being present.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use authos_core::AppId;

use crate::SessionError;

const ID_KEYS: [&str; 2] = ["id", "ID"];

/// Raw tenant application record (a JSON object).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantRecord(Map<String, Value>);

impl TenantRecord {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Accept a decoded payload. Only JSON objects are tenant records;
    /// `null` is the empty record.
    pub fn from_value(value: Value) -> Result<Self, SessionError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::default()),
            other => Err(SessionError::malformed_tenant(format!(
                "expected an object, found {}",
                json_kind(&other)
            ))),
        }
    }

    /// Decode the text stored under the `currentApp` key.
    pub fn from_persisted(text: &str) -> Result<Self, SessionError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| SessionError::malformed_tenant(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn to_persisted(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Tenant identifier, read from `id` and then `ID`.
    ///
    /// `Ok(None)` when the record carries no identifier at all; an error when
    /// an identifier is present but unusable.
    pub fn app_id(&self) -> Result<Option<AppId>, SessionError> {
        for key in ID_KEYS {
            match self.0.get(key) {
                None | Some(Value::Null) => continue,
                Some(Value::String(s)) if s.is_empty() => continue,
                Some(Value::Number(n)) if n.as_u64() == Some(0) => continue,
                Some(Value::Number(n)) => {
                    let raw = n.as_u64().ok_or_else(|| {
                        SessionError::malformed_tenant(format!("'{key}' is not a positive integer: {n}"))
                    })?;
                    let id = AppId::new(raw).map_err(|e| SessionError::malformed_tenant(e.to_string()))?;
                    return Ok(Some(id));
                }
                Some(Value::String(s)) => {
                    let id = s
                        .parse::<AppId>()
                        .map_err(|e| SessionError::malformed_tenant(e.to_string()))?;
                    return Ok(Some(id));
                }
                Some(other) => {
                    return Err(SessionError::malformed_tenant(format!(
                        "'{key}' has unexpected type {}",
                        json_kind(other)
                    )));
                }
            }
        }
        Ok(None)
    }

    pub fn code(&self) -> Option<&str> {
        self.str_field("code")
    }

    pub fn name(&self) -> Option<&str> {
        self.str_field("name")
    }

    /// Typed view of the record. Requires an identifier.
    pub fn identity(&self) -> Result<AppIdentity, SessionError> {
        let id = self
            .app_id()?
            .ok_or_else(|| SessionError::malformed_tenant("record has no identifier"))?;

        Ok(AppIdentity {
            id,
            uuid: self.str_field("uuid").and_then(|s| Uuid::parse_str(s).ok()),
            code: self.code().map(str::to_string),
            name: self.name().map(str::to_string),
            status: self.0.get("status").and_then(Value::as_i64),
        })
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
    }
}

impl From<AppIdentity> for TenantRecord {
    fn from(value: AppIdentity) -> Self {
        match serde_json::to_value(&value) {
            Ok(Value::Object(map)) => Self(map),
            _ => Self::default(),
        }
    }
}

/// Typed identity of a tenant application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppIdentity {
    pub id: AppId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// 1 = enabled, 0 = disabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,
}

impl AppIdentity {
    pub fn is_enabled(&self) -> bool {
        self.status.map_or(true, |s| s != 0)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> TenantRecord {
        TenantRecord::from_value(value).unwrap()
    }

    #[test]
    fn reads_lowercase_and_uppercase_ids() {
        assert_eq!(record(json!({"id": 42, "code": "acme"})).app_id().unwrap().map(|id| id.get()), Some(42));
        assert_eq!(record(json!({"ID": 7})).app_id().unwrap().map(|id| id.get()), Some(7));
        assert_eq!(record(json!({"id": "9"})).app_id().unwrap().map(|id| id.get()), Some(9));
    }

    #[test]
    fn falsy_lowercase_id_falls_through_to_uppercase() {
        let rec = record(json!({"id": 0, "ID": 5}));
        assert_eq!(rec.app_id().unwrap().map(|id| id.get()), Some(5));

        let rec = record(json!({"id": "", "ID": 6}));
        assert_eq!(rec.app_id().unwrap().map(|id| id.get()), Some(6));
    }

    #[test]
    fn missing_id_is_none_and_bad_id_is_an_error() {
        assert_eq!(record(json!({"code": "acme"})).app_id().unwrap(), None);
        assert!(record(json!({"id": "abc"})).app_id().is_err());
        assert!(record(json!({"id": -4})).app_id().is_err());
        assert!(record(json!({"id": {"nested": true}})).app_id().is_err());
    }

    #[test]
    fn non_object_payloads_are_rejected() {
        assert!(TenantRecord::from_value(json!("acme")).is_err());
        assert!(TenantRecord::from_value(json!([1])).is_err());
        assert!(TenantRecord::from_value(Value::Null).unwrap().is_empty());
        assert!(TenantRecord::from_persisted("{broken").is_err());
    }

    #[test]
    fn typed_identity_view() {
        let rec = record(json!({
            "ID": 3,
            "uuid": "0b0e5f8e-8a1c-4c55-9d1a-3f1b6b7f2c10",
            "code": "acme",
            "name": "Acme Corp",
            "status": 1
        }));
        let app = rec.identity().unwrap();
        assert_eq!(app.id.get(), 3);
        assert!(app.uuid.is_some());
        assert_eq!(app.code.as_deref(), Some("acme"));
        assert!(app.is_enabled());

        assert!(record(json!({"code": "acme"})).identity().is_err());
    }

    #[test]
    fn identity_converts_back_into_a_record() {
        let app = AppIdentity {
            id: AppId::new(42).unwrap(),
            uuid: None,
            code: Some("acme".to_string()),
            name: None,
            status: Some(0),
        };
        assert!(!app.is_enabled());

        let rec = TenantRecord::from(app);
        assert_eq!(rec.code(), Some("acme"));
        assert_eq!(rec.app_id().unwrap().map(|id| id.get()), Some(42));

        let restored = TenantRecord::from_persisted(&rec.to_persisted()).unwrap();
        assert_eq!(restored, rec);
    }
}
