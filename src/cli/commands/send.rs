//! Send command implementation
//!
//! This module implements the `send` command, which reads events from a file
//! and inserts them into the warehouse in batches.

use crate::adapters::auth::FederatedCredentialProvider;
use crate::config::load_config;
use crate::core::insert::BatchInserter;
use crate::domain::{parse_events, Batch, SextantError};
use anyhow::Context;
use clap::Args;
use std::sync::Arc;
use tokio::io::AsyncReadExt;

/// Arguments for the send command
#[derive(Args, Debug)]
pub struct SendArgs {
    /// Events file: a JSON array, or one JSON object per line. `-` reads stdin.
    #[arg(short, long)]
    pub file: String,

    /// Maximum number of events per insert request
    #[arg(short, long, default_value_t = 500, value_parser = parse_batch_size)]
    pub batch_size: usize,
}

fn parse_batch_size(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(n) if (1..=50_000).contains(&n) => Ok(n),
        Ok(n) => Err(format!("batch size must be between 1 and 50000, got {n}")),
        Err(e) => Err(e.to_string()),
    }
}

impl SendArgs {
    /// Execute the send command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, file = %self.file, "Sending events");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => return Ok(report_failure("Failed to load configuration", &e)),
        };

        let input = self
            .read_input()
            .await
            .with_context(|| format!("Failed to read events from {}", self.file))?;
        let events = match parse_events(&input) {
            Ok(events) => events,
            Err(e) => return Ok(report_failure("Failed to parse events", &e)),
        };

        if let Err(e) = config.warehouse.require_complete() {
            return Ok(report_failure("Warehouse configuration is incomplete", &e));
        }
        let credentials = match FederatedCredentialProvider::from_config(&config.warehouse) {
            Ok(p) => Arc::new(p),
            Err(e) => return Ok(report_failure("Failed to set up credentials", &e)),
        };
        let inserter = BatchInserter::from_config(&config, credentials);

        if events.is_empty() {
            println!("No events in {}", self.file);
            return Ok(0);
        }

        let total_batches = events.len().div_ceil(self.batch_size);
        let mut sent = 0usize;
        let mut rejected = 0usize;

        for (n, chunk) in events.chunks(self.batch_size).enumerate() {
            let batch = Batch::new(chunk.to_vec());
            match inserter.insert(&batch).await {
                Ok(()) => sent += batch.len(),
                Err(SextantError::SendEvents(message)) => {
                    rejected += batch.len();
                    println!("❌ Batch {}/{} rejected", n + 1, total_batches);
                    println!("   {}", message.replace('\n', "\n   "));
                }
                Err(e) => {
                    println!("Sent {sent} of {} events before failure", events.len());
                    return Ok(report_failure(
                        &format!("Batch {}/{} failed", n + 1, total_batches),
                        &e,
                    ));
                }
            }
        }

        println!();
        println!("Send Summary:");
        println!("  Events: {}", events.len());
        println!("  Batches: {total_batches}");
        println!("  Delivered: {sent}");
        println!("  In rejected batches: {rejected}");

        Ok(if rejected > 0 { 1 } else { 0 })
    }

    async fn read_input(&self) -> std::io::Result<String> {
        if self.file == "-" {
            let mut input = String::new();
            tokio::io::stdin().read_to_string(&mut input).await?;
            Ok(input)
        } else {
            tokio::fs::read_to_string(&self.file).await
        }
    }
}

fn report_failure(context: &str, error: &SextantError) -> i32 {
    tracing::error!(error = %error, "{}", context);
    println!("❌ {context}");
    println!("   Error: {error}");
    error.exit_code()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_batch_size() {
        assert_eq!(parse_batch_size("500"), Ok(500));
        assert!(parse_batch_size("0").is_err());
        assert!(parse_batch_size("50001").is_err());
        assert!(parse_batch_size("many").is_err());
    }

    #[tokio::test]
    async fn test_missing_config_file_exits_with_config_code() {
        let args = SendArgs {
            file: "events.json".to_string(),
            batch_size: 10,
        };
        let code = args.execute("/nonexistent/sextant.toml").await.unwrap();
        assert_eq!(code, 2);
    }
}
