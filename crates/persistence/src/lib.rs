//! Persistence layer for Client Manager.
//!
//! This crate contains:
//! - Database connection management
//! - Schema definition
//! - Entity definitions (database row mappings)
//! - Repository implementations

pub mod db;
pub mod entities;
pub mod error;
pub mod metrics;
pub mod repositories;
pub mod schema;
