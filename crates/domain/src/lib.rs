//! Domain layer for Client Manager.
//!
//! This crate contains:
//! - Domain models (Client, Phone, ClientSummary)
//! - Request records for create, update and search operations

pub mod models;
