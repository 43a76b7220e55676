//! # domains
//!
//! The central domain logic and interface definitions for Huntly:
//! the entities (users, posts, comments), the vote ledger state machine,
//! the error taxonomy, and the port traits every adapter implements.

pub mod error;
pub mod models;
pub mod ports;
pub mod vote;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use ports::*;
pub use vote::*;
