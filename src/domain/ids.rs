//! SQL identifier newtypes
//!
//! Table and column names end up interpolated into the checksum query, so they
//! are restricted to an allow-list of characters at construction time and only
//! ever rendered through [`quote_identifier`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum identifier length accepted by PostgreSQL (NAMEDATALEN - 1)
const MAX_IDENTIFIER_LEN: usize = 63;

/// Columns that carry a row's creation or last-update time. Ordering by one of
/// these enables the `as_of` cutoff in checksum queries.
pub const TEMPORAL_COLUMNS: [&str; 2] = ["created_at", "updated_at"];

fn validate_identifier(kind: &str, ident: &str) -> Result<(), String> {
    if ident.is_empty() {
        return Err(format!("{kind} cannot be empty"));
    }
    if ident.len() > MAX_IDENTIFIER_LEN {
        return Err(format!(
            "{kind} '{ident}' exceeds {MAX_IDENTIFIER_LEN} characters"
        ));
    }

    let mut chars = ident.chars();
    let first_ok = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);
    if !first_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(format!(
            "{kind} '{ident}' must start with a letter or underscore and contain only ASCII letters, digits and underscores"
        ));
    }
    Ok(())
}

/// Render an allow-listed identifier for SQL, double-quoted with its case kept
///
/// Reserved words such as `order` stay usable as table names.
pub fn quote_identifier(ident: &str) -> String {
    format!("\"{ident}\"")
}

/// Table name, optionally schema-qualified (`schema.table`)
///
/// The name is quoted as given, so `Orders` addresses a table created as
/// `"Orders"` and `orders` the usual unquoted one.
///
/// # Examples
///
/// ```
/// use sextant::domain::ids::TableName;
///
/// let table = TableName::new("public.Users").unwrap();
/// assert_eq!(table.quoted(), "\"public\".\"Users\"");
/// assert!(TableName::new("users; DROP TABLE users").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TableName(String);

impl TableName {
    /// Creates a new TableName, rejecting anything outside the allow-list
    pub fn new(name: impl Into<String>) -> Result<Self, String> {
        let name = name.into();
        let parts: Vec<&str> = name.split('.').collect();
        if parts.len() > 2 {
            return Err(format!(
                "Table name '{name}' may contain at most one schema qualifier"
            ));
        }
        for part in &parts {
            validate_identifier("Table name", part)?;
        }
        Ok(Self(name))
    }

    /// Returns the table name as given
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Quoted form for use in SQL
    pub fn quoted(&self) -> String {
        self.0
            .split('.')
            .map(quote_identifier)
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TableName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for TableName {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TableName> for String {
    fn from(table: TableName) -> Self {
        table.0
    }
}

/// Column name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ColumnName(String);

impl ColumnName {
    /// Creates a new ColumnName, rejecting anything outside the allow-list
    pub fn new(name: impl Into<String>) -> Result<Self, String> {
        let name = name.into();
        validate_identifier("Column name", &name)?;
        Ok(Self(name))
    }

    /// Returns the column name as given
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Quoted form for use in SQL
    ///
    /// Folded to lower case first, matching how PostgreSQL resolves the
    /// unquoted `created_at` / `updated_at` columns.
    pub fn quoted(&self) -> String {
        quote_identifier(&self.0.to_ascii_lowercase())
    }

    /// Whether this is one of the [`TEMPORAL_COLUMNS`] (case-insensitive)
    pub fn is_temporal(&self) -> bool {
        TEMPORAL_COLUMNS
            .iter()
            .any(|c| c.eq_ignore_ascii_case(&self.0))
    }
}

impl fmt::Display for ColumnName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ColumnName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ColumnName {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ColumnName> for String {
    fn from(column: ColumnName) -> Self {
        column.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("users" ; "plain")]
    #[test_case("_audit_log" ; "leading underscore")]
    #[test_case("public.users" ; "schema qualified")]
    #[test_case("Events2024" ; "mixed case with digits")]
    fn test_table_name_valid(name: &str) {
        assert!(TableName::new(name).is_ok());
    }

    #[test_case("" ; "empty")]
    #[test_case("users; DROP TABLE users" ; "injection")]
    #[test_case("\"users\"" ; "pre-quoted")]
    #[test_case("1users" ; "leading digit")]
    #[test_case("a.b.c" ; "too many qualifiers")]
    #[test_case("public." ; "empty table part")]
    fn test_table_name_invalid(name: &str) {
        assert!(TableName::new(name).is_err());
    }

    #[test]
    fn test_table_name_too_long() {
        let name = "t".repeat(64);
        assert!(TableName::new(name).is_err());
        assert!(TableName::new("t".repeat(63)).is_ok());
    }

    #[test]
    fn test_table_case_kept_column_case_folded() {
        let table = TableName::new("Users").unwrap();
        assert_eq!(table.quoted(), "\"Users\"");

        let table = TableName::new("analytics.Orders").unwrap();
        assert_eq!(table.quoted(), "\"analytics\".\"Orders\"");

        let column = ColumnName::new("CREATED_AT").unwrap();
        assert_eq!(column.quoted(), "\"created_at\"");
    }

    #[test_case("created_at", true)]
    #[test_case("CREATED_AT", true)]
    #[test_case("updated_at", true)]
    #[test_case("Updated_At", true)]
    #[test_case("id", false)]
    #[test_case("deleted_at", false)]
    fn test_temporal_columns(name: &str, expected: bool) {
        assert_eq!(ColumnName::new(name).unwrap().is_temporal(), expected);
    }

    #[test]
    fn test_column_name_rejects_expressions() {
        assert!(ColumnName::new("id DESC").is_err());
        assert!(ColumnName::new("id--").is_err());
        assert!(ColumnName::new("t.id").is_err());
    }

    #[test]
    fn test_serde_validates() {
        let ok: Result<TableName, _> = serde_json::from_str("\"events\"");
        assert!(ok.is_ok());
        let bad: Result<TableName, _> = serde_json::from_str("\"events;--\"");
        assert!(bad.is_err());
    }
}
