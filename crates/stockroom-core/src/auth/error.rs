use thiserror::Error;

/// Failures of the durable key-value storage backends.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage file is corrupt: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Keychain access failed: {0}")]
    Keyring(#[from] keyring::Error),
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid token: expected three dot-separated segments")]
    InvalidToken,

    #[error("Failed to decode token: {0}")]
    TokenDecode(String),

    #[error("Token is missing the `{0}` claim")]
    MissingClaim(&'static str),

    #[error("Token claim `{0}` has an unexpected type")]
    InvalidClaim(&'static str),

    #[error("{0}")]
    Authentication(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
