use thiserror::Error;

/// Coarse classification of [`AppError`] so callers can branch on the failure
/// without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unique constraint violated, expected when a record is submitted twice.
    DuplicateKey,
    UnknownTable,
    UnknownColumn,
    /// Equality search or substring replace against an encoded payload column.
    UnsupportedOperation,
    /// Stored bytes could not be decoded, or a value could not be encoded.
    Codec,
    /// The caller supplied a malformed name, value or definition.
    InvalidInput,
    /// Failure reported by redb or the filesystem.
    Engine,
    Config,
}

#[derive(Debug, Error)]
pub enum AppError {

    #[error("Duplicate value {value} for unique column {table}.{column}")]
    DuplicateKey { table: String, column: String, value: String },

    #[error("No such table: {name}. Available tables are {available:?}")]
    UnknownTable { name: String, available: Vec<String> },

    #[error("No such column: {table}.{name}. Available columns are {available:?}")]
    UnknownColumn { table: String, name: String, available: Vec<String> },

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Codec encode error: {0}")]
    CodecEncode(#[from] bincode::error::EncodeError),

    #[error("Codec decode error: {0}")]
    CodecDecode(#[from] bincode::error::DecodeError),

    #[error("Invalid identifier {0:?}: expected [A-Za-z_][A-Za-z0-9_]* of at most 64 characters")]
    InvalidIdentifier(String),

    #[error("Table {0} already exists")]
    TableExists(String),

    #[error("Column {table}.{column} already exists")]
    ColumnExists { table: String, column: String },

    #[error("Type mismatch for {column}: {message}")]
    TypeMismatch { column: String, message: String },

    #[error("NOT NULL constraint failed: {table}.{column}")]
    NullConstraint { table: String, column: String },

    #[error("Invalid date {year:04}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: u32, day: u32 },

    #[error("Invalid table definition: {0}")]
    InvalidDefinition(String),

    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serde error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::DuplicateKey { .. }          => ErrorKind::DuplicateKey,
            AppError::UnknownTable { .. }          => ErrorKind::UnknownTable,
            AppError::UnknownColumn { .. }         => ErrorKind::UnknownColumn,
            AppError::UnsupportedOperation(_)      => ErrorKind::UnsupportedOperation,
            AppError::Codec(_)
            | AppError::CodecEncode(_)
            | AppError::CodecDecode(_)             => ErrorKind::Codec,
            AppError::InvalidIdentifier(_)
            | AppError::TableExists(_)
            | AppError::ColumnExists { .. }
            | AppError::TypeMismatch { .. }
            | AppError::NullConstraint { .. }
            | AppError::InvalidDate { .. }
            | AppError::InvalidDefinition(_)       => ErrorKind::InvalidInput,
            AppError::Config(_)                    => ErrorKind::Config,
            _                                      => ErrorKind::Engine,
        }
    }

    /// Whether the store is known to be healthy after this error. Codec and engine
    /// failures point at corruption or I/O trouble and should be surfaced loudly.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Codec | ErrorKind::Engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_table_message_lists_available_tables() {
        let err = AppError::UnknownTable { name: "bloood".to_string(), available: vec!["blood".to_string(), "labels".to_string()] };
        let msg = err.to_string();
        assert!(msg.contains("bloood"));
        assert!(msg.contains("\"blood\""));
        assert!(msg.contains("\"labels\""));
        assert_eq!(err.kind(), ErrorKind::UnknownTable);
        assert!(err.is_recoverable());
    }

    #[test]
    fn codec_failures_are_not_recoverable() {
        let err = AppError::Codec("trailing bytes".to_string());
        assert_eq!(err.kind(), ErrorKind::Codec);
        assert!(!err.is_recoverable());
    }

    #[test]
    fn unsupported_is_distinct_from_unknown_column() {
        let unsupported = AppError::UnsupportedOperation("labels.label_list is encoded".to_string());
        let unknown = AppError::UnknownColumn { table: "labels".to_string(), name: "nope".to_string(), available: vec![] };
        assert_ne!(unsupported.kind(), unknown.kind());
    }
}
