//! Table verification with row-set checksums
//!
//! This module provides checksum computation for auditing replicated tables.

pub mod checksum;

pub use checksum::{ChecksumCalculator, ChecksumQuery, ChecksumResult};
