//! Checksum command implementation
//!
//! This module implements the `checksum` command, which prints the row count
//! and digest of one table.

use crate::adapters::database::create_row_id_source;
use crate::config::load_config;
use crate::core::verification::ChecksumCalculator;
use crate::domain::{ColumnName, SextantError, TableName};
use chrono::{DateTime, Utc};
use clap::Args;

/// Arguments for the checksum command
#[derive(Args, Debug)]
pub struct ChecksumArgs {
    /// Table to checksum, optionally schema-qualified
    #[arg(short, long)]
    pub table: String,

    /// Column to order identifiers by. `created_at` and `updated_at` also
    /// filter rows to those before `--as-of`.
    #[arg(short, long)]
    pub order_column: String,

    /// Cutoff timestamp (RFC 3339). Defaults to now.
    #[arg(long, value_parser = parse_as_of)]
    pub as_of: Option<DateTime<Utc>>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_as_of(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {e}"))
}

impl ChecksumArgs {
    /// Execute the checksum command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let (table, order_column) = match self.identifiers() {
            Ok(ids) => ids,
            Err(e) => {
                println!("❌ {e}");
                return Ok(e.exit_code());
            }
        };
        let as_of = self.as_of.unwrap_or_else(Utc::now);

        tracing::info!(
            config_path = %config_path,
            table = %table,
            order_column = %order_column,
            as_of = %as_of,
            "Computing checksum"
        );

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration");
                println!("   Error: {e}");
                return Ok(e.exit_code());
            }
        };

        let source = match create_row_id_source(&config) {
            Ok(source) => source,
            Err(e) => {
                println!("❌ {e}");
                return Ok(e.exit_code());
            }
        };
        let calculator = ChecksumCalculator::new(source).with_algorithm(config.checksum.algorithm);

        let result = match calculator.compute(&table, &order_column, as_of).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, table = %table, "Checksum query failed");
                println!("❌ Checksum failed");
                println!("   Error: {e}");
                return Ok(e.exit_code());
            }
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            println!("Table: {}", result.table);
            println!("Order column: {}", result.order_column);
            match result.as_of {
                Some(cutoff) => println!("Rows before: {}", cutoff.to_rfc3339()),
                None => println!("Rows before: (all rows)"),
            }
            println!("Rows: {}", result.row_count);
            println!("{}: {}", result.algorithm, result.digest);
        }

        Ok(0)
    }

    fn identifiers(&self) -> Result<(TableName, ColumnName), SextantError> {
        let table = TableName::new(self.table.as_str()).map_err(SextantError::Validation)?;
        let column =
            ColumnName::new(self.order_column.as_str()).map_err(SextantError::Validation)?;
        Ok((table, column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_as_of_normalizes_to_utc() {
        let ts = parse_as_of("2024-03-01T12:00:00+02:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap());
        assert!(parse_as_of("2024-03-01").is_err());
    }

    #[tokio::test]
    async fn test_invalid_table_name_is_rejected_before_loading_config() {
        let args = ChecksumArgs {
            table: "users; DROP TABLE users".to_string(),
            order_column: "id".to_string(),
            as_of: None,
            json: false,
        };
        let code = args.execute("/nonexistent/sextant.toml").await.unwrap();
        assert_eq!(code, 5);
    }
}
