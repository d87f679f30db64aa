//! Navigation guard decision.
//!
//! - No IO
//! - No mutation
//! - Only route metadata and the current tier predicates are consulted

use serde::{Deserialize, Serialize};

use crate::TierPredicates;

/// Minimum tier a route declares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteRequirement {
    #[default]
    None,
    /// Administrator tier required.
    SystemTier,
    /// Administrator and tenant tiers required.
    FullTier,
}

impl RouteRequirement {
    /// Build a requirement from the two metadata flags routes carry.
    /// The full-tier flag dominates.
    pub fn from_flags(requires_system_auth: bool, requires_auth: bool) -> Self {
        if requires_auth {
            RouteRequirement::FullTier
        } else if requires_system_auth {
            RouteRequirement::SystemTier
        } else {
            RouteRequirement::None
        }
    }
}

/// Screen a refused navigation is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectTarget {
    SystemLogin,
    AppSelection,
}

/// Outcome handed to the navigation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationDecision {
    Allow,
    Redirect(RedirectTarget),
}

impl NavigationDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, NavigationDecision::Allow)
    }

    /// Concrete route for a redirect, `None` when navigation is allowed.
    pub fn redirect_route<'a>(&self, routes: &'a RedirectRoutes) -> Option<&'a str> {
        match self {
            NavigationDecision::Allow => None,
            NavigationDecision::Redirect(target) => Some(routes.route_for(*target)),
        }
    }
}

/// Route paths of the redirect screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectRoutes {
    pub system_login: String,
    pub app_selection: String,
}

impl RedirectRoutes {
    pub fn route_for(&self, target: RedirectTarget) -> &str {
        match target {
            RedirectTarget::SystemLogin => &self.system_login,
            RedirectTarget::AppSelection => &self.app_selection,
        }
    }
}

impl Default for RedirectRoutes {
    fn default() -> Self {
        Self {
            system_login: "/system-login".to_string(),
            app_selection: "/app-selection".to_string(),
        }
    }
}

/// Decide whether a navigation may proceed.
///
/// The requested route is never queued for resumption after login; a
/// redirect abandons it.
pub fn decide(requirement: RouteRequirement, predicates: &TierPredicates) -> NavigationDecision {
    match requirement {
        RouteRequirement::None => NavigationDecision::Allow,
        RouteRequirement::SystemTier | RouteRequirement::FullTier if !predicates.system_authenticated => {
            NavigationDecision::Redirect(RedirectTarget::SystemLogin)
        }
        RouteRequirement::FullTier if !predicates.app_authenticated => {
            NavigationDecision::Redirect(RedirectTarget::AppSelection)
        }
        RouteRequirement::SystemTier | RouteRequirement::FullTier => NavigationDecision::Allow,
    }
}
