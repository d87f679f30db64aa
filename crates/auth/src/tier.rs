use serde::{Deserialize, Serialize};

/// One of the independent authentication levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Platform administrator.
    System,
    /// Tenant application.
    App,
    /// End user acting inside a tenant application.
    User,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::System => "system",
            Tier::App => "app",
            Tier::User => "user",
        }
    }
}

impl core::fmt::Display for Tier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived predicates over the session state. Recomputed, never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierPredicates {
    /// `systemToken` is non-empty.
    pub system_authenticated: bool,
    /// `appToken` and `currentApp` are both non-empty.
    pub app_authenticated: bool,
    /// `userToken` is non-empty.
    pub user_token_present: bool,
}

impl TierPredicates {
    pub fn fully_authenticated(&self) -> bool {
        self.system_authenticated && self.app_authenticated
    }

    /// An end-user token only counts inside a selected tenant.
    pub fn user_authenticated(&self) -> bool {
        self.user_token_present && self.app_authenticated
    }

    pub fn stage(&self) -> AuthStage {
        match (self.system_authenticated, self.app_authenticated) {
            (false, false) => AuthStage::Unauthenticated,
            (true, false) => AuthStage::SystemAuthenticated,
            (false, true) => AuthStage::AppSelected,
            (true, true) => AuthStage::Ready,
        }
    }
}

/// Session progress, ordered by privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStage {
    Unauthenticated,
    SystemAuthenticated,
    /// Tenant tier authenticated without the administrator tier.
    AppSelected,
    /// Both administrator and tenant tiers authenticated.
    Ready,
}

impl core::fmt::Display for AuthStage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AuthStage::Unauthenticated => write!(f, "Unauthenticated"),
            AuthStage::SystemAuthenticated => write!(f, "SystemAuthenticated"),
            AuthStage::AppSelected => write!(f, "AppSelected"),
            AuthStage::Ready => write!(f, "Ready"),
        }
    }
}
