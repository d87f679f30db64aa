//! `authos-client`
//!
//! **Responsibility:** session and authorization layer of the administrative
//! client.
//!
//! This crate provides:
//! - Durable session state for the three tiers (system, app, user)
//! - Credential headers on every outbound request
//! - The global 401 recovery policy (teardown + hard redirect)
//! - The navigation guard bound to live session state
//!
//! Screens and resource CRUD sit on top of [`ApiClient`] and are not part of
//! this crate.

pub mod api;
pub mod config;
pub mod error;
pub mod headers;
pub mod interceptor;
pub mod navigation;
pub mod notify;
pub mod session;
pub mod storage;

pub use api::{ApiClient, LoginResponse};
pub use config::{ClientConfig, ConfigError};
pub use error::ApiError;
pub use headers::HeaderComposer;
pub use interceptor::ResponseInterceptor;
pub use navigation::{NavigationGuard, Navigator, RecordingNavigator, TracingNavigator};
pub use notify::{MemoryNotifier, Notification, NotificationLevel, Notifier, TracingNotifier, report_api_error};
pub use session::{SessionSnapshot, SessionStore};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
