// Sextant - Event delivery and table checksum tool
// Copyright (c) 2025 Sextant Contributors
// Licensed under the MIT License

//! # Sextant - Event delivery and table checksums
//!
//! Sextant ships batches of analytics events to a BigQuery table and computes
//! row-set checksums over PostgreSQL tables so replicas can be audited for
//! drift.
//!
//! ## Overview
//!
//! This library provides:
//! - **Batch insertion** of JSON events through the `tabledata.insertAll` API,
//!   with exponential backoff on transport faults
//! - **Per-call credentials** from Azure workload identity federated to Google
//!   Cloud
//! - **Row-set checksums**: the digest of a table's ordered row identifiers,
//!   optionally restricted to rows older than a cutoff
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Batch insertion, retry, and checksum logic
//! - [`adapters`] - External integrations (credentials, BigQuery, PostgreSQL)
//! - [`domain`] - Events, identifiers, and error types
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sextant::adapters::auth::FederatedCredentialProvider;
//! use sextant::config::load_config;
//! use sextant::core::insert::BatchInserter;
//! use sextant::domain::{parse_events, Batch};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("sextant.toml")?;
//!     let credentials = Arc::new(FederatedCredentialProvider::from_config(&config.warehouse)?);
//!     let inserter = BatchInserter::from_config(&config, credentials);
//!
//!     let events = parse_events(r#"[{"event_type": "web_request", "status": 200}]"#)?;
//!     inserter.insert(&Batch::new(events)).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`domain::SextantError`]. A partially
//! rejected batch surfaces as [`domain::SextantError::SendEvents`], after each
//! event of the batch has been logged at info level.
//!
//! ```rust,no_run
//! use sextant::domain::SextantError;
//!
//! fn example() -> Result<(), SextantError> {
//!     let config = sextant::config::load_config("sextant.toml")?;
//!     config.warehouse.require_complete()?;
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
