//! Navigation engine boundary and the guard bound to live session state.

use std::sync::{Arc, Mutex, PoisonError};

use authos_auth::{NavigationDecision, RedirectRoutes, RouteTable, decide};

use crate::session::SessionStore;

/// Navigation engine as seen from the session layer.
pub trait Navigator: Send + Sync {
    /// Leave the current screen for `route`, discarding in-flight screen state.
    fn hard_redirect(&self, route: &str);
}

/// Navigator that records redirects instead of performing them.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    redirects: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn redirects(&self) -> Vec<String> {
        self.redirects.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn last(&self) -> Option<String> {
        self.redirects.lock().unwrap_or_else(PoisonError::into_inner).last().cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn hard_redirect(&self, route: &str) {
        self.redirects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route.to_string());
    }
}

/// Navigator for headless processes: redirects are only logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn hard_redirect(&self, route: &str) {
        tracing::info!(route, "redirect requested");
    }
}

/// Guard consulted before every route change.
#[derive(Debug, Clone)]
pub struct NavigationGuard {
    session: Arc<SessionStore>,
    routes: RouteTable,
    redirects: RedirectRoutes,
}

impl NavigationGuard {
    pub fn new(session: Arc<SessionStore>, routes: RouteTable, redirects: RedirectRoutes) -> Self {
        Self {
            session,
            routes,
            redirects,
        }
    }

    /// Decide a navigation to `path`. Reads the session, never mutates it.
    pub fn before_each(&self, path: &str) -> NavigationDecision {
        let route = self.routes.resolve(path);
        let decision = decide(route.requirement, &self.session.predicates());

        if let Some(target) = decision.redirect_route(&self.redirects) {
            tracing::debug!(path = %route.path, requirement = ?route.requirement, redirect = target, "navigation redirected");
        }

        decision
    }

    /// Concrete route for a decision, `None` when navigation is allowed.
    pub fn redirect_route(&self, decision: NavigationDecision) -> Option<&str> {
        decision.redirect_route(&self.redirects)
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authos_auth::{RedirectTarget, TenantRecord};
    use serde_json::json;

    fn guard(session: &Arc<SessionStore>) -> NavigationGuard {
        NavigationGuard::new(session.clone(), RouteTable::admin_console(), RedirectRoutes::default())
    }

    #[test]
    fn empty_session_is_sent_to_system_login() {
        let session = Arc::new(SessionStore::in_memory());
        let decision = guard(&session).before_each("/dashboard");
        assert_eq!(decision, NavigationDecision::Redirect(RedirectTarget::SystemLogin));
        assert_eq!(guard(&session).redirect_route(decision), Some("/system-login"));
    }

    #[test]
    fn system_only_session_is_sent_to_app_selection() {
        let session = Arc::new(SessionStore::in_memory());
        session.set_system_auth("root", "sys");

        let guard = guard(&session);
        assert_eq!(
            guard.before_each("/users"),
            NavigationDecision::Redirect(RedirectTarget::AppSelection)
        );
        assert!(guard.before_each("/app-selection").is_allowed());
    }

    #[test]
    fn ready_session_reaches_console_screens() {
        let session = Arc::new(SessionStore::in_memory());
        session.set_system_auth("root", "sys");
        session.set_app_auth(Some(TenantRecord::from_value(json!({"id": 1})).unwrap()), "app");

        let guard = guard(&session);
        for path in ["/", "/dashboard", "/roles", "/api-docs"] {
            assert!(guard.before_each(path).is_allowed(), "{path} should be allowed");
        }
    }

    #[test]
    fn public_routes_are_always_allowed() {
        let session = Arc::new(SessionStore::in_memory());
        let guard = guard(&session);
        assert!(guard.before_each("/system-login").is_allowed());
        assert!(guard.before_each("/login").is_allowed());
        assert!(guard.before_each("/not-a-route").is_allowed());
    }

    #[test]
    fn guard_does_not_mutate_the_session() {
        let session = Arc::new(SessionStore::in_memory());
        session.set_system_auth("root", "sys");
        let before = session.snapshot();

        guard(&session).before_each("/users");
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn recording_navigator_keeps_order() {
        let navigator = RecordingNavigator::new();
        navigator.hard_redirect("/a");
        navigator.hard_redirect("/b");
        assert_eq!(navigator.redirects(), vec!["/a", "/b"]);
        assert_eq!(navigator.last().as_deref(), Some("/b"));
    }
}
