//! Session State Store.
//!
//! Single source of truth for the three tiers, the selected tenant and the
//! theme flag. Every mutator writes through to durable storage before it
//! returns, so storage and memory are never observably out of step.

use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

use authos_auth::{AuthStage, Credential, Identity, IdentityInput, TenantRecord, Tier, TierPredicates};

use crate::storage::{KeyValueStore, MemoryStore};

/// Storage keys.
pub mod keys {
    pub const SYSTEM_TOKEN: &str = "systemToken";
    pub const SYSTEM_USER: &str = "systemUser";
    pub const APP_TOKEN: &str = "appToken";
    pub const CURRENT_APP: &str = "currentApp";
    pub const USER_TOKEN: &str = "userToken";
    pub const USER_IDENTITY: &str = "userIdentity";
    pub const THEME_PREFERENCE: &str = "themePreference";
}

/// Immutable view of the session at one point in time.
///
/// Each outbound request composes its headers from a snapshot taken at
/// dispatch, so later mutations never affect a request already in flight.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub system_token: Option<Credential>,
    pub system_user: Identity,
    pub app_token: Option<Credential>,
    pub current_app: TenantRecord,
    pub user_token: Option<Credential>,
    pub current_user: Identity,
    pub theme_preference: bool,
}

impl SessionSnapshot {
    pub fn predicates(&self) -> TierPredicates {
        TierPredicates {
            system_authenticated: self.system_token.is_some(),
            app_authenticated: self.app_token.is_some() && !self.current_app.is_empty(),
            user_token_present: self.user_token.is_some(),
        }
    }

    pub fn stage(&self) -> AuthStage {
        self.predicates().stage()
    }

    pub fn display_name(&self) -> &str {
        self.system_user.display_name()
    }
}

/// Session State Store.
///
/// Shared as `Arc<SessionStore>` by the header composer, the response
/// interceptor and the navigation guard.
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    state: RwLock<SessionSnapshot>,
}

impl core::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionStore")
            .field("state", &*self.read())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Restore the session from storage.
    ///
    /// Absent or malformed entries default to empty; nothing here fails.
    pub fn open(storage: Arc<dyn KeyValueStore>) -> Self {
        let state = SessionSnapshot {
            system_token: read_credential(storage.as_ref(), keys::SYSTEM_TOKEN),
            system_user: read_identity(storage.as_ref(), keys::SYSTEM_USER),
            app_token: read_credential(storage.as_ref(), keys::APP_TOKEN),
            current_app: read_tenant(storage.as_ref()),
            user_token: read_credential(storage.as_ref(), keys::USER_TOKEN),
            current_user: read_identity(storage.as_ref(), keys::USER_IDENTITY),
            theme_preference: read_raw(storage.as_ref(), keys::THEME_PREFERENCE).as_deref() == Some("true"),
        };

        let store = Self {
            storage,
            state: RwLock::new(state),
        };
        store.drop_orphaned_app_token();

        let predicates = store.predicates();
        tracing::info!(
            system = predicates.system_authenticated,
            app = predicates.app_authenticated,
            user = predicates.user_token_present,
            stage = %predicates.stage(),
            "session restored"
        );

        store
    }

    /// A tenant token whose record is missing or unreadable authenticates
    /// nothing; both halves of the tier are removed.
    fn drop_orphaned_app_token(&self) {
        let mut state = self.write();
        if state.app_token.is_none() || !state.current_app.is_empty() {
            return;
        }

        tracing::warn!(key = keys::APP_TOKEN, "tenant token restored without a tenant record; clearing tier");
        self.persist(keys::APP_TOKEN, None);
        self.persist(keys::CURRENT_APP, None);
        state.app_token = None;
        state.current_app = TenantRecord::default();
    }

    /// Session backed by a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::open(Arc::new(MemoryStore::new()))
    }

    // ── Reads ───────────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> SessionSnapshot {
        self.read().clone()
    }

    pub fn predicates(&self) -> TierPredicates {
        self.read().predicates()
    }

    pub fn is_system_authenticated(&self) -> bool {
        self.predicates().system_authenticated
    }

    pub fn is_app_authenticated(&self) -> bool {
        self.predicates().app_authenticated
    }

    pub fn is_fully_authenticated(&self) -> bool {
        self.predicates().fully_authenticated()
    }

    pub fn stage(&self) -> AuthStage {
        self.predicates().stage()
    }

    pub fn display_name(&self) -> String {
        self.read().display_name().to_string()
    }

    pub fn system_token(&self) -> Option<Credential> {
        self.read().system_token.clone()
    }

    pub fn system_user(&self) -> Identity {
        self.read().system_user.clone()
    }

    pub fn app_token(&self) -> Option<Credential> {
        self.read().app_token.clone()
    }

    pub fn current_app(&self) -> TenantRecord {
        self.read().current_app.clone()
    }

    pub fn user_token(&self) -> Option<Credential> {
        self.read().user_token.clone()
    }

    pub fn current_user(&self) -> Identity {
        self.read().current_user.clone()
    }

    pub fn theme_preference(&self) -> bool {
        self.read().theme_preference
    }

    // ── Mutators ────────────────────────────────────────────────────────────

    /// Authenticate the administrator tier.
    ///
    /// `user` may be a record, JSON text or a bare username; it is normalized
    /// and never rejected.
    pub fn set_system_auth(&self, user: impl Into<IdentityInput>, token: &str) {
        let token = Credential::new(token);
        let identity = identity_for(token.as_ref(), user.into());

        let mut state = self.write();
        self.persist_credential(keys::SYSTEM_TOKEN, token.as_ref());
        self.persist(keys::SYSTEM_USER, token.as_ref().map(|_| identity.to_persisted()).as_deref());
        state.system_token = token;
        state.system_user = identity;

        tracing::info!(tier = %Tier::System, authenticated = state.system_token.is_some(), "tier updated");
    }

    /// Authenticate the tenant tier. Token and record are set together;
    /// a missing record or an empty token clears the tier instead.
    pub fn set_app_auth(&self, app: Option<TenantRecord>, token: &str) {
        let (app, token) = match (app.filter(|a| !a.is_empty()), Credential::new(token)) {
            (Some(app), Some(token)) => (app, token),
            _ => {
                tracing::debug!(tier = %Tier::App, "incomplete tenant credentials; clearing tier");
                self.clear_app_auth();
                return;
            }
        };

        let mut state = self.write();
        self.persist(keys::APP_TOKEN, Some(token.expose()));
        self.persist(keys::CURRENT_APP, Some(&app.to_persisted()));
        state.app_token = Some(token);
        state.current_app = app;

        tracing::info!(tier = %Tier::App, tenant = ?state.current_app.code(), "tier updated");
    }

    /// Authenticate an end user inside a tenant. When `app` is supplied the
    /// selected tenant record is replaced; the tenant token is left alone.
    pub fn set_user_auth(&self, user: impl Into<IdentityInput>, token: &str, app: Option<TenantRecord>) {
        let token = Credential::new(token);
        let identity = identity_for(token.as_ref(), user.into());

        let mut state = self.write();
        self.persist_credential(keys::USER_TOKEN, token.as_ref());
        self.persist(keys::USER_IDENTITY, token.as_ref().map(|_| identity.to_persisted()).as_deref());
        state.user_token = token;
        state.current_user = identity;

        if let Some(app) = app.filter(|a| !a.is_empty()) {
            self.persist(keys::CURRENT_APP, Some(&app.to_persisted()));
            state.current_app = app;
        }

        if state.user_token.is_some() && !state.predicates().app_authenticated {
            tracing::warn!(tier = %Tier::User, "user token stored without an authenticated tenant");
        }
        tracing::info!(tier = %Tier::User, authenticated = state.user_token.is_some(), "tier updated");
    }

    /// Clear the tenant tier only.
    pub fn clear_app_auth(&self) {
        let mut state = self.write();
        self.persist(keys::APP_TOKEN, None);
        self.persist(keys::CURRENT_APP, None);
        state.app_token = None;
        state.current_app = TenantRecord::default();

        tracing::info!(tier = %Tier::App, "tier cleared");
    }

    /// Clear every tier. Idempotent; the theme flag survives.
    pub fn logout(&self) {
        let mut state = self.write();
        for key in [
            keys::SYSTEM_TOKEN,
            keys::SYSTEM_USER,
            keys::APP_TOKEN,
            keys::CURRENT_APP,
            keys::USER_TOKEN,
            keys::USER_IDENTITY,
        ] {
            self.persist(key, None);
        }

        let theme_preference = state.theme_preference;
        *state = SessionSnapshot {
            theme_preference,
            ..SessionSnapshot::default()
        };

        tracing::info!("session cleared");
    }

    /// Flip the theme flag and return the new value.
    pub fn toggle_theme(&self) -> bool {
        let mut state = self.write();
        let next = !state.theme_preference;
        self.persist(keys::THEME_PREFERENCE, Some(if next { "true" } else { "false" }));
        state.theme_preference = next;
        next
    }

    // ── Internals ───────────────────────────────────────────────────────────

    fn read(&self) -> std::sync::RwLockReadGuard<'_, SessionSnapshot> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionSnapshot> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist_credential(&self, key: &str, token: Option<&Credential>) {
        self.persist(key, token.map(Credential::expose));
    }

    /// Write or remove one entry. Storage is assumed available; a failure is
    /// logged and the in-memory state still changes.
    fn persist(&self, key: &str, value: Option<&str>) {
        let result = match value {
            Some(value) => self.storage.set(key, value),
            None => self.storage.remove(key),
        };
        if let Err(err) = result {
            tracing::error!(key, "failed to persist session entry: {err}");
        }
    }
}

/// Identity kept for a tier: none when the tier has no token.
fn identity_for(token: Option<&Credential>, user: IdentityInput) -> Identity {
    match token {
        Some(_) => Identity::normalize(user),
        None => Identity::default(),
    }
}

fn read_raw(storage: &dyn KeyValueStore, key: &str) -> Option<String> {
    match storage.get(key) {
        Ok(value) => value,
        Err(err) => {
            tracing::error!(key, "failed to read session entry: {err}");
            None
        }
    }
}

fn read_credential(storage: &dyn KeyValueStore, key: &str) -> Option<Credential> {
    read_raw(storage, key).and_then(Credential::new)
}

fn read_identity(storage: &dyn KeyValueStore, key: &str) -> Identity {
    let Some(text) = read_raw(storage, key) else {
        return Identity::default();
    };
    Identity::from_persisted(key, &text).unwrap_or_else(|err| {
        tracing::warn!(key, "{err}; using an empty identity");
        Identity::default()
    })
}

fn read_tenant(storage: &dyn KeyValueStore) -> TenantRecord {
    let Some(text) = read_raw(storage, keys::CURRENT_APP) else {
        return TenantRecord::default();
    };
    TenantRecord::from_persisted(&text).unwrap_or_else(|err| {
        tracing::warn!(key = keys::CURRENT_APP, "{err}; using an empty tenant");
        TenantRecord::default()
    })
}
