use thiserror::Error;

/// The few conditions that genuinely surface as errors. Not-found lookups,
/// invalid gestures, and out-of-range values are handled as no-ops or
/// clamps at the call site instead.
#[derive(Debug, Error)]
pub enum FocusdeckError {
    #[error("external service failure: {0}")]
    ExternalService(String),

    #[error("persistence failure: {0}")]
    Persistence(String),

    #[error("backup restore failed: {0}")]
    BackupRestore(String),

    #[error("serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),
}
