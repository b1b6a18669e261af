//! gitpane core - pure domain logic with no I/O dependencies
//!
//! This crate contains the domain types (refresh categories, selection, task
//! events, commits, diff classification), the ports (interfaces) the
//! application layer implements, and the operation error taxonomy. It has no
//! dependencies on UI frameworks, Git libraries, or async runtimes - those are
//! handled by the `gitpane-app` crate.

pub mod domain;
pub mod ports;
pub mod app;
pub mod error;

// Re-exports for ergonomics
pub use domain::*;
pub use error::*;
