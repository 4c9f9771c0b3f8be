//! Database module for SQLite operations.
//!
//! This module provides:
//! - Pool initialization from a connection string, with schema setup
//! - SQLite pragma configuration
//! - Repository layer for users, circles and sells

pub mod migrations;
pub mod repo;

pub use migrations::init_db;
pub use repo::{Repository, SellOutcome};
