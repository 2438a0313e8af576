//! roster-core: Shared types, configuration, and error handling for roster.
//!
//! This crate provides the pieces every roster component agrees on:
//! - The `Person` node type stored in the graph
//! - Configuration loading (connection settings and credentials)
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::{ConnectionSettings, Credentials, RosterConfig};
pub use error::RosterError;
pub use types::Person;
