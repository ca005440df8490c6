//! CreatorsLab core API
//!
//! Engagement task marketplace backed by MongoDB: creators escrow $CLS into
//! tasks, participants earn it back through reviewed participations, and
//! every balance change is paired with a ledger entry in the same
//! transaction.

pub mod auth;
pub mod config;
pub mod db;
pub mod routes;
pub mod server;
pub mod services;
pub mod types;

pub use types::{CoreError, Result};
