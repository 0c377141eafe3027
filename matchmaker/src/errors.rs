//! Error types for the match engine
//!
//! Every outcome a caller has to branch on is a variant here. Guarded updates
//! that match no row are not errors; they surface as an affected-row count.

use std::fmt;

/// Main error type for the match engine
#[derive(Debug)]
pub enum EngineError {
    /// A like is missing in at least one direction
    MutualLikesRequired { user_id_1: String, user_id_2: String },

    /// Both sides of the pair are the same user
    InvalidPair { user_id: String },

    /// The member store has no row for this user
    MemberNotFound { user_id: String },

    /// Transient transaction failures (timeout, lock contention)
    Transaction(TransactionError),

    /// Database operation errors
    Database(DatabaseError),

    /// Configuration-related errors
    Config(ConfigError),

    /// Other errors with context
    Other(String),
}

/// Transaction error variants. All of them are transient.
#[derive(Debug)]
pub enum TransactionError {
    /// The transaction did not finish within its bound
    Timeout { operation: String, timeout_seconds: u64 },

    /// The store refused the transaction because of a concurrent writer
    SerializationFailure { reason: String },
}

/// Database error variants
#[derive(Debug)]
pub enum DatabaseError {
    /// Connection failed
    ConnectionFailed { reason: String },

    /// Query execution failed
    QueryFailed { reason: String },

    /// An insert collided with a unique index
    UniqueViolation { reason: String },

    /// A stored value could not be decoded into its Rust type
    DecodeFailed { column: String, reason: String },
}

/// Configuration error variants
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to load configuration file
    LoadFailed { path: String, reason: String },

    /// Invalid configuration value
    InvalidValue { field: String, reason: String },

    /// Configuration parsing error
    ParseError { reason: String },
}

impl EngineError {
    /// Stable machine-readable code for the failure.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::MutualLikesRequired { .. } => "MUTUAL_LIKES_REQUIRED",
            EngineError::InvalidPair { .. } => "INVALID_PAIR",
            EngineError::MemberNotFound { .. } => "MEMBER_NOT_FOUND",
            EngineError::Transaction(TransactionError::Timeout { .. }) => "TRANSACTION_TIMEOUT",
            EngineError::Transaction(TransactionError::SerializationFailure { .. }) => {
                "SERIALIZATION_FAILURE"
            }
            EngineError::Database(DatabaseError::UniqueViolation { .. }) => "UNIQUE_VIOLATION",
            EngineError::Database(_) => "DATABASE_ERROR",
            EngineError::Config(_) => "CONFIG_ERROR",
            EngineError::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// True for failures the caller may retry. The engine never retries itself.
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::Transaction(_))
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            EngineError::Database(DatabaseError::UniqueViolation { .. })
        )
    }

    pub(crate) fn decode(column: &str, reason: impl fmt::Display) -> Self {
        EngineError::Database(DatabaseError::DecodeFailed {
            column: column.to_string(),
            reason: reason.to_string(),
        })
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::MutualLikesRequired {
                user_id_1,
                user_id_2,
            } => write!(
                f,
                "Mutual likes required between '{}' and '{}'",
                user_id_1, user_id_2
            ),
            EngineError::InvalidPair { user_id } => {
                write!(f, "Cannot match user '{}' with themselves", user_id)
            }
            EngineError::MemberNotFound { user_id } => {
                write!(f, "Member '{}' not found", user_id)
            }
            EngineError::Transaction(e) => write!(f, "Transaction error: {}", e),
            EngineError::Database(e) => write!(f, "Database error: {}", e),
            EngineError::Config(e) => write!(f, "Configuration error: {}", e),
            EngineError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for TransactionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionError::Timeout {
                operation,
                timeout_seconds,
            } => write!(
                f,
                "'{}' did not complete within {}s",
                operation, timeout_seconds
            ),
            TransactionError::SerializationFailure { reason } => {
                write!(f, "Serialization failure: {}", reason)
            }
        }
    }
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseError::ConnectionFailed { reason } => {
                write!(f, "Database connection failed: {}", reason)
            }
            DatabaseError::QueryFailed { reason } => write!(f, "Query failed: {}", reason),
            DatabaseError::UniqueViolation { reason } => {
                write!(f, "Unique constraint violated: {}", reason)
            }
            DatabaseError::DecodeFailed { column, reason } => {
                write!(f, "Failed to decode column '{}': {}", column, reason)
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::LoadFailed { path, reason } => {
                write!(f, "Failed to load config from '{}': {}", path, reason)
            }
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
            ConfigError::ParseError { reason } => {
                write!(f, "Failed to parse config: {}", reason)
            }
        }
    }
}

impl std::error::Error for EngineError {}
impl std::error::Error for TransactionError {}
impl std::error::Error for DatabaseError {}
impl std::error::Error for ConfigError {}

impl From<TransactionError> for EngineError {
    fn from(err: TransactionError) -> Self {
        EngineError::Transaction(err)
    }
}

impl From<DatabaseError> for EngineError {
    fn from(err: DatabaseError) -> Self {
        EngineError::Database(err)
    }
}

impl From<ConfigError> for EngineError {
    fn from(err: ConfigError) -> Self {
        EngineError::Config(err)
    }
}

impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        EngineError::Other(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::decode("video_snapshot", err)
    }
}

// SQLite primary result codes, the low byte of the extended code sqlx reports
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    return DatabaseError::UniqueViolation {
                        reason: db_err.message().to_string(),
                    }
                    .into();
                }

                let primary_code = db_err
                    .code()
                    .and_then(|code| code.parse::<i32>().ok())
                    .map(|code| code & 0xff);

                match primary_code {
                    Some(SQLITE_BUSY) | Some(SQLITE_LOCKED) => {
                        TransactionError::SerializationFailure {
                            reason: db_err.message().to_string(),
                        }
                        .into()
                    }
                    _ => DatabaseError::QueryFailed {
                        reason: db_err.to_string(),
                    }
                    .into(),
                }
            }
            sqlx::Error::PoolTimedOut => TransactionError::SerializationFailure {
                reason: "timed out waiting for a pooled connection".to_string(),
            }
            .into(),
            sqlx::Error::ColumnDecode { index, source } => EngineError::decode(&index, source),
            other => DatabaseError::QueryFailed {
                reason: other.to_string(),
            }
            .into(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        let err = EngineError::MutualLikesRequired {
            user_id_1: "a".to_string(),
            user_id_2: "b".to_string(),
        };
        assert_eq!(err.code(), "MUTUAL_LIKES_REQUIRED");
        assert!(!err.is_transient());

        let err: EngineError = TransactionError::Timeout {
            operation: "create_match".to_string(),
            timeout_seconds: 10,
        }
        .into();
        assert_eq!(err.code(), "TRANSACTION_TIMEOUT");
        assert!(err.is_transient());
    }

    #[test]
    fn pool_timeout_is_transient() {
        let err: EngineError = sqlx::Error::PoolTimedOut.into();
        assert!(err.is_transient());
        assert!(!err.is_unique_violation());
    }

    #[test]
    fn row_not_found_is_a_query_failure() {
        let err: EngineError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.code(), "DATABASE_ERROR");
    }
}
