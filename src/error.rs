//! Error types for schema definition and execution.

use thiserror::Error;

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid schema configuration (conflicting constraints, bad enum values, etc.)
    #[error("Schema error: {0}")]
    Schema(String),

    /// A value could not be coerced to, or decoded from, a column's type
    #[error("{}default cannot be of different type than {expected}: got {found}", column_prefix(.column))]
    TypeMismatch {
        column: Option<String>,
        expected: String,
        found: String,
    },

    /// Required columns were not supplied when building a record
    #[error("{table}: missing {} required column(s): {}", .missing.len(), join_names(.missing))]
    MissingColumns { table: String, missing: Vec<String> },

    /// Column name not declared on the table
    #[error("Table {table} has no column '{column}'")]
    UnknownColumn { table: String, column: String },

    /// Serialized type descriptor carries a kind tag nobody knows
    #[error("Could not locate type kind \"{0}\"")]
    UnknownType(String),

    /// Two definitions claimed the same table name
    #[error("Table {name} is already registered")]
    DuplicateTable { name: String },

    /// Unique constraint violated by the database
    #[error("Unique violation: {0}")]
    UniqueViolation(String),

    /// Connection or query error
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error (invalid URI, pool sizes, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation did not finish in time
    #[error("Timed out: {0}")]
    Timeout(String),
}

impl Error {
    /// Create a Schema error
    pub fn schema(message: impl Into<String>) -> Self {
        Error::Schema(message.into())
    }

    /// Names the column a [`Error::TypeMismatch`] came from, unless it
    /// already carries one.
    pub fn in_column(self, name: &str) -> Self {
        match self {
            Error::TypeMismatch {
                column: None,
                expected,
                found,
            } => Error::TypeMismatch {
                column: Some(name.to_string()),
                expected,
                found,
            },
            other => other,
        }
    }

    pub fn unknown_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Error::UnknownColumn {
            table: table.into(),
            column: column.into(),
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db) = err.as_database_error() {
            if db.is_unique_violation() {
                return Error::UniqueViolation(db.message().to_string());
            }
        }
        Error::Database(err)
    }
}

fn column_prefix(column: &Option<String>) -> String {
    match column {
        Some(name) => format!("Column '{}' ", name),
        None => "Column ".to_string(),
    }
}

/// Joins names as `'a', 'b' and 'c'`.
pub fn join_names(names: &[String]) -> String {
    let quoted: Vec<String> = names.iter().map(|n| format!("'{}'", n)).collect();
    match quoted.split_last() {
        None => String::new(),
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} and {}", rest.join(", "), last),
    }
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_join_names() {
        assert_eq!(join_names(&names(&["a"])), "'a'");
        assert_eq!(join_names(&names(&["a", "b"])), "'a' and 'b'");
        assert_eq!(join_names(&names(&["a", "b", "c"])), "'a', 'b' and 'c'");
        assert_eq!(join_names(&[]), "");
    }

    #[test]
    fn test_type_mismatch_names_column() {
        let err = Error::TypeMismatch {
            column: None,
            expected: "DATE".into(),
            found: "\"banana\"".into(),
        };
        assert!(err.to_string().starts_with("Column default"));

        let err = err.in_column("born");
        assert!(matches!(&err, Error::TypeMismatch { column: Some(c), .. } if c == "born"));
        assert!(err.to_string().starts_with("Column 'born' default"), "{err}");

        let err = err.in_column("other");
        assert!(matches!(&err, Error::TypeMismatch { column: Some(c), .. } if c == "born"));
    }

    #[test]
    fn test_missing_columns_message() {
        let err = Error::MissingColumns {
            table: "users".into(),
            missing: names(&["username", "email"]),
        };
        let msg = err.to_string();
        assert!(msg.contains("'username' and 'email'"), "{msg}");
        assert!(msg.contains("missing 2"), "{msg}");
    }
}
