//! Administrator / end-user identity payloads.
//!
//! Login endpoints hand back identities in more than one shape: a structured
//! record (with `username` or `Username`, `name` or `Name`), a JSON string, or
//! just a bare username. Everything is normalized into [`Identity`] here so the
//! ambiguity never leaves this module.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use authos_core::UserId;

use crate::SessionError;

/// Display name used when an identity carries no usable name.
pub const DISPLAY_NAME_PLACEHOLDER: &str = "Admin";

const USERNAME_KEYS: [&str; 2] = ["username", "Username"];
const NAME_KEYS: [&str; 2] = ["name", "Name"];

/// Identity as received from a caller, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum IdentityInput {
    /// Raw text: either JSON-encoded identity or a bare username.
    Raw(String),
    /// Already-decoded payload (normally a JSON object).
    Structured(Value),
}

impl From<&str> for IdentityInput {
    fn from(value: &str) -> Self {
        Self::Raw(value.to_string())
    }
}

impl From<String> for IdentityInput {
    fn from(value: String) -> Self {
        Self::Raw(value)
    }
}

impl From<Value> for IdentityInput {
    fn from(value: Value) -> Self {
        Self::Structured(value)
    }
}

impl From<Identity> for IdentityInput {
    fn from(value: Identity) -> Self {
        Self::Structured(value.to_value())
    }
}

/// Canonical identity record.
///
/// `username` and `name` are lifted out of whatever casing the server used;
/// every other field is preserved verbatim in `attributes`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Identity {
    /// Identity consisting of a bare username.
    pub fn bare(username: impl Into<String>) -> Self {
        let username = username.into();
        Self {
            username: (!username.is_empty()).then_some(username),
            ..Default::default()
        }
    }

    /// Normalize caller input. Never fails: undecodable text becomes a bare
    /// username, non-record payloads degrade to an empty identity.
    pub fn normalize(input: IdentityInput) -> Self {
        match input {
            IdentityInput::Raw(text) => Self::from_raw(&text),
            IdentityInput::Structured(value) => Self::from_value(value).unwrap_or_else(|| {
                tracing::warn!("identity payload is not a record; using an empty identity");
                Self::default()
            }),
        }
    }

    /// Decode an identity previously written by [`Identity::to_persisted`].
    ///
    /// Unlike [`Identity::normalize`], undecodable text is an error here: the
    /// caller decides how to degrade.
    pub fn from_persisted(key: &str, text: &str) -> Result<Self, SessionError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| SessionError::malformed_identity(key, e.to_string()))?;

        Self::from_value(value).ok_or_else(|| {
            SessionError::malformed_identity(key, "expected a record or a string")
        })
    }

    /// JSON text stored in durable storage.
    pub fn to_persisted(&self) -> String {
        self.to_value().to_string()
    }

    pub fn to_value(&self) -> Value {
        let mut map = self.attributes.clone();
        if let Some(username) = &self.username {
            map.insert("username".to_string(), Value::String(username.clone()));
        }
        if let Some(name) = &self.name {
            map.insert("name".to_string(), Value::String(name.clone()));
        }
        Value::Object(map)
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.name.is_none() && self.attributes.is_empty()
    }

    /// Name to show for this identity: username first, then name, then the
    /// placeholder.
    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or(DISPLAY_NAME_PLACEHOLDER)
    }

    /// Account key the server attached to the identity (`ID` or `id`).
    /// Unusable values are ignored.
    pub fn user_id(&self) -> Option<UserId> {
        ["ID", "id"].iter().find_map(|key| match self.attributes.get(*key)? {
            Value::Number(n) => n.as_u64().and_then(|raw| UserId::new(raw).ok()),
            Value::String(s) => s.parse().ok(),
            _ => None,
        })
    }

    fn from_raw(text: &str) -> Self {
        if text.is_empty() {
            return Self::default();
        }

        match serde_json::from_str::<Value>(text) {
            Ok(Value::Null) => Self::default(),
            Ok(value @ (Value::Object(_) | Value::String(_))) => {
                Self::from_value(value).unwrap_or_default()
            }
            // Valid JSON that is neither a record nor a string carries no identity.
            Ok(_) => Self::default(),
            Err(_) => Self::bare(text),
        }
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self::from_record(map)),
            Value::String(username) => Some(Self::bare(username)),
            Value::Null => Some(Self::default()),
            _ => None,
        }
    }

    fn from_record(mut map: Map<String, Value>) -> Self {
        let username = take_first(&mut map, &USERNAME_KEYS);
        let name = take_first(&mut map, &NAME_KEYS);
        Self {
            username,
            name,
            attributes: map,
        }
    }
}

/// Remove every key in `keys` from the record and return the first usable
/// value in key order. Empty strings and nulls are not usable.
fn take_first(map: &mut Map<String, Value>, keys: &[&str]) -> Option<String> {
    let mut found = None;
    for key in keys {
        let Some(value) = map.remove(*key) else {
            continue;
        };
        if found.is_none() {
            found = field_text(value);
        }
    }
    found
}

fn field_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn structured_record_keeps_attributes() {
        let identity = Identity::normalize(json!({"ID": 1, "username": "root", "appId": 3}).into());
        assert_eq!(identity.username.as_deref(), Some("root"));
        assert_eq!(identity.attributes.get("ID"), Some(&json!(1)));
        assert_eq!(identity.attributes.get("appId"), Some(&json!(3)));
        assert_eq!(identity.display_name(), "root");
        assert_eq!(identity.user_id().map(|id| id.get()), Some(1));
    }

    #[test]
    fn unusable_user_ids_are_ignored() {
        assert!(Identity::normalize(json!({"ID": 0}).into()).user_id().is_none());
        assert!(Identity::normalize(json!({"id": "x"}).into()).user_id().is_none());
        assert_eq!(Identity::normalize(json!({"id": "9"}).into()).user_id().map(u64::from), Some(9));
        assert!(Identity::bare("root").user_id().is_none());
    }

    #[test]
    fn casing_variants_resolve_in_order() {
        let capitalized = Identity::normalize(json!({"Username": "Root", "name": "Ops"}).into());
        assert_eq!(capitalized.display_name(), "Root");

        let empty_username = Identity::normalize(json!({"username": "", "Username": "second"}).into());
        assert_eq!(empty_username.display_name(), "second");
        assert!(!empty_username.attributes.contains_key("username"));

        let name_only = Identity::normalize(json!({"Name": "Operator"}).into());
        assert_eq!(name_only.display_name(), "Operator");

        let nothing = Identity::normalize(json!({"email": "a@b.c"}).into());
        assert_eq!(nothing.display_name(), DISPLAY_NAME_PLACEHOLDER);
    }

    #[test]
    fn raw_json_text_is_decoded() {
        let identity = Identity::normalize(r#"{"username":"alice"}"#.into());
        assert_eq!(identity.display_name(), "alice");

        let quoted = Identity::normalize(r#""bob""#.into());
        assert_eq!(quoted.display_name(), "bob");
    }

    #[test]
    fn raw_non_json_text_is_a_bare_username() {
        let identity = Identity::normalize("carol".into());
        assert_eq!(identity, Identity::bare("carol"));
        assert_eq!(identity.display_name(), "carol");

        assert_eq!(Identity::normalize("admin@example".into()).display_name(), "admin@example");
        assert!(Identity::normalize("".into()).is_empty());
    }

    #[test]
    fn raw_json_scalars_and_arrays_show_the_placeholder() {
        for text in ["1234", "true", "[1]", "null"] {
            let identity = Identity::normalize(text.into());
            assert!(identity.is_empty(), "{text} should not become a username");
            assert_eq!(identity.display_name(), DISPLAY_NAME_PLACEHOLDER);
        }
    }

    #[test]
    fn non_record_structured_input_degrades_to_empty() {
        assert!(Identity::normalize(json!([1, 2, 3]).into()).is_empty());
        assert!(Identity::normalize(Value::Null.into()).is_empty());
        assert_eq!(Identity::normalize(json!("dave").into()).display_name(), "dave");
    }

    #[test]
    fn persisted_round_trip_is_canonical() {
        let identity = Identity::normalize(json!({"Username": "eve", "Name": "Eve", "role": "admin"}).into());
        let text = identity.to_persisted();
        let restored = Identity::from_persisted("systemUser", &text).unwrap();
        assert_eq!(restored, identity);
        assert_eq!(restored.display_name(), "eve");
    }

    #[test]
    fn malformed_persisted_identity_is_an_error() {
        let err = Identity::from_persisted("systemUser", "not-json").unwrap_err();
        assert!(matches!(err, SessionError::MalformedIdentity { ref key, .. } if key == "systemUser"));

        assert!(Identity::from_persisted("systemUser", "42").is_err());
    }

    #[test]
    fn persisted_bare_string_is_the_display_name() {
        let restored = Identity::from_persisted("systemUser", r#""frank""#).unwrap();
        assert_eq!(restored.display_name(), "frank");
    }
}
