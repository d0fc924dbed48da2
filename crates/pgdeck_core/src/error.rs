use thiserror::Error;

/// Failure reported by the record fetch service.
///
/// The dialog controller absorbs these at its boundary: a failed fetch only
/// clears the loading indicator and records the reason, it never propagates
/// to the caller of `open`/`refresh`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("No record for db_id {0}")]
    NotFound(String),
}

impl FetchError {
    pub fn transport(message: impl Into<String>) -> Self {
        FetchError::Transport(message.into())
    }
}

/// Caller-facing misuse errors from the dialog controller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DialogError {
    #[error("Record reference has an empty db_id")]
    EmptyRecordId,

    #[error("No record has been opened yet")]
    NothingLoaded,
}
