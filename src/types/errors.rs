use thiserror::Error;

// === StorageError ===

/// Errors raised by a durable key-value store.
#[derive(Error, Debug)]
pub enum StorageError {
    /// SQLite operation failed.
    #[error("Storage database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// A stored value could not be encoded or decoded.
    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// The connection mutex was poisoned by a panicking writer.
    #[error("Storage lock poisoned")]
    LockPoisoned,
    /// Any other backend failure.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

// === FetchError ===

/// Errors from a single detail read. Never escapes the fan-out.
#[derive(Error, Debug)]
pub enum FetchError {
    /// No detail API base URL has been configured.
    #[error("Detail API base URL is not configured")]
    NotConfigured,
    /// Transport-level failure.
    #[error("Detail request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The API answered with a non-success status.
    #[error("Detail API returned {status}: {body}")]
    Status { status: u16, body: String },
    /// The response body did not have the expected shape.
    #[error("Malformed detail response: {0}")]
    Malformed(String),
    /// The fetch task panicked or was cancelled.
    #[error("Detail task failed: {0}")]
    TaskFailed(String),
}

// === HistoryError ===

/// Errors related to the ranking history store.
#[derive(Error, Debug)]
pub enum HistoryError {
    /// Reading or writing the persisted list failed.
    #[error("History storage error: {0}")]
    Storage(#[from] StorageError),
    /// The persisted list could not be decoded.
    #[error("History data is corrupt: {0}")]
    Corrupt(String),
    /// The in-memory list could not be encoded for writing.
    #[error("History serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// No history record carries the given timestamp.
    #[error("History entry not found: {0}")]
    NotFound(String),
}

// === FavoritesError ===

/// Errors related to the favorite creator set.
#[derive(Error, Debug)]
pub enum FavoritesError {
    #[error("Favorites storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Favorites data is corrupt: {0}")]
    Corrupt(String),
    #[error("Favorites serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid creator id: {0:?}")]
    InvalidCreatorId(String),
}

// === ImportError ===

/// Errors raised while importing a snapshot file.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The document is not valid JSON.
    #[error("Snapshot file is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),
    /// Valid JSON, but neither a character list nor a group list.
    #[error("Snapshot file has an unrecognized shape")]
    UnrecognizedShape,
}

// === ExportError ===

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to serialize snapshot: {0}")]
    Serialization(#[from] serde_json::Error),
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// A file system I/O error occurred.
    #[error("Settings I/O error: {0}")]
    IoError(String),
    /// Serialization or deserialization failed.
    #[error("Settings serialization error: {0}")]
    SerializationError(String),
    /// The settings key is invalid.
    #[error("Invalid settings key: {0}")]
    InvalidKey(String),
    /// The value is out of range for its key.
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}

// === AppError ===

/// Errors surfaced to the presentation layer.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error(transparent)]
    Favorites(#[from] FavoritesError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    /// A refresh was requested before any page snapshot was received.
    #[error("No page snapshot available to refresh from")]
    NoPageSnapshot,
    #[error("Detail client setup failed: {0}")]
    Client(String),
}
