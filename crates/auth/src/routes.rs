//! Route metadata table.
//!
//! Maps navigation paths to the tier they require. Nested routes inherit the
//! requirement of their parent; aliases resolve to their target before the
//! requirement is looked up.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::RouteRequirement;
use crate::policy::normalize_path;

/// Alias chains longer than this are treated as unresolvable.
const MAX_ALIAS_HOPS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
enum RouteEntry {
    Screen(RouteRequirement),
    Alias(String),
}

/// Result of looking up a navigation path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRoute {
    /// Path after alias resolution and normalization.
    pub path: String,
    pub requirement: RouteRequirement,
    /// Whether the path is a declared route.
    pub known: bool,
}

/// Registered routes and their requirements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
    entries: BTreeMap<String, RouteEntry>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes of the administrative console.
    pub fn admin_console() -> Self {
        Self::new()
            .route("/system-login", RouteRequirement::None)
            .route("/app-login", RouteRequirement::SystemTier)
            .route("/app-selection", RouteRequirement::SystemTier)
            .alias("/login", "/system-login")
            .nested(
                "/",
                RouteRequirement::FullTier,
                &[
                    ("dashboard", RouteRequirement::None),
                    ("users", RouteRequirement::None),
                    ("roles", RouteRequirement::None),
                    ("menus", RouteRequirement::None),
                    ("permissions", RouteRequirement::None),
                    ("api-docs", RouteRequirement::None),
                ],
            )
    }

    pub fn route(mut self, path: &str, requirement: RouteRequirement) -> Self {
        self.entries
            .insert(normalize_path(path).to_string(), RouteEntry::Screen(requirement));
        self
    }

    pub fn alias(mut self, from: &str, to: &str) -> Self {
        self.entries.insert(
            normalize_path(from).to_string(),
            RouteEntry::Alias(normalize_path(to).to_string()),
        );
        self
    }

    /// Register a parent and its children. A child requires at least what
    /// its parent requires.
    pub fn nested(mut self, parent: &str, requirement: RouteRequirement, children: &[(&str, RouteRequirement)]) -> Self {
        let parent = normalize_path(parent).to_string();
        for (child, own) in children {
            let child = child.trim_matches('/');
            let path = if parent == "/" {
                format!("/{child}")
            } else {
                format!("{parent}/{child}")
            };
            self.entries
                .insert(path, RouteEntry::Screen(requirement.max(*own)));
        }
        self.entries.insert(parent, RouteEntry::Screen(requirement));
        self
    }

    /// Look up a path. Unknown paths carry no requirement.
    pub fn resolve(&self, path: &str) -> ResolvedRoute {
        let mut current = normalize_path(path).to_string();

        for _ in 0..MAX_ALIAS_HOPS {
            match self.entries.get(&current) {
                Some(RouteEntry::Screen(requirement)) => {
                    return ResolvedRoute {
                        path: current,
                        requirement: *requirement,
                        known: true,
                    };
                }
                Some(RouteEntry::Alias(target)) => current = target.clone(),
                None => {
                    return ResolvedRoute {
                        path: current,
                        requirement: RouteRequirement::None,
                        known: false,
                    };
                }
            }
        }

        tracing::warn!(path, "route alias chain did not terminate");
        ResolvedRoute {
            path: current,
            requirement: RouteRequirement::None,
            known: false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
