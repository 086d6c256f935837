//! Event delivery to the warehouse

pub mod inserter;

pub use inserter::{rejection_message, BatchInserter};
