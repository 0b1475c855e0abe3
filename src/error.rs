use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum StoreError {
    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove {path:?}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize profile: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failure of the outbound chat-completion call. Every variant is recoverable:
/// the companion falls back to a local reply.
#[derive(Debug, Error)]
pub(crate) enum RemoteError {
    #[error("chat endpoint rejected the credentials (status {0})")]
    Unauthorized(u16),

    #[error("chat endpoint is rate limiting requests")]
    RateLimited,

    #[error("chat endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("chat request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("chat response was not valid JSON: {0}")]
    MalformedBody(#[source] serde_json::Error),

    #[error("chat response had no choices[0].message.content")]
    MissingContent,
}

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),
}
