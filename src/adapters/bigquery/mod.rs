//! BigQuery streaming insert integration

pub mod client;
pub mod models;

pub use client::WarehouseClient;
pub use models::{InsertAllRequest, InsertAllResponse, InsertOutcome, RowRejection};
