use thiserror::Error;

/// Error taxonomy for the retrieval core.
///
/// `Precondition` covers operations invoked before their required state
/// exists (fatal to that call, never retried internally). `Collaborator`
/// wraps failures of the dense index, completion service or embedder,
/// which are propagated rather than masked. `Storage` covers the
/// persisted JSON maps.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Precondition not met: {0}")]
    Precondition(String),

    #[error(transparent)]
    Collaborator(#[from] anyhow::Error),

    #[error("Storage failed for {path}: {source}")]
    Storage {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
