//! `authos-auth` — pure session/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it knows how
//! identities and tenants are shaped, which tier a route needs, and what an
//! authorization failure means. The stateful client wires it to real I/O.

pub mod credential;
pub mod error;
pub mod guard;
pub mod identity;
pub mod policy;
pub mod routes;
pub mod tenant;
pub mod tier;

pub use credential::Credential;
pub use error::SessionError;
pub use guard::{NavigationDecision, RedirectRoutes, RedirectTarget, RouteRequirement, decide};
pub use identity::{DISPLAY_NAME_PLACEHOLDER, Identity, IdentityInput};
pub use policy::{ExemptEndpoints, FailureDisposition, UNAUTHORIZED, classify_failure};
pub use routes::{ResolvedRoute, RouteTable};
pub use tenant::{AppIdentity, TenantRecord};
pub use tier::{AuthStage, Tier, TierPredicates};
