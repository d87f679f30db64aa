//! `authos-core` — identifiers and errors shared by every authos crate.
//!
//! This crate contains **pure** primitives (no I/O, no transport).

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{AppId, UserId};
