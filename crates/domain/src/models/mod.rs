//! Domain models for Client Manager.

pub mod client;

pub use client::{Client, ClientFilter, ClientId, ClientSummary, ClientUpdate, NewClient, Phone};
