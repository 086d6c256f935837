//! PostgreSQL integration
//!
//! This module provides the PostgreSQL checksum source: a pooled client and
//! an adapter that streams ordered row identifiers.

pub mod adapter;
pub mod client;

pub use adapter::PostgreSQLAdapter;
pub use client::PostgreSQLClient;
