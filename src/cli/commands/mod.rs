//! CLI command implementations
//!
//! Each command returns the process exit code: `0` success, `1` rejected
//! events, `2` configuration, `3` authentication, `4` transport or database,
//! `5` anything else.

pub mod checksum;
pub mod init;
pub mod send;
pub mod validate;
