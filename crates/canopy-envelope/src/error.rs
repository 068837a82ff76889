//! Error types for canopy-envelope

use thiserror::Error;

/// Errors that can occur while packaging or unpacking proof envelopes
#[derive(Error, Debug)]
pub enum Error {
    /// The envelope was rejected: ill-formed JSON, a missing field,
    /// malformed hex, or a version/type/direction string outside the
    /// accepted set
    #[error("malformed proof envelope: {0}")]
    MalformedProofEnvelope(String),

    /// A Merkle-core failure while assembling an envelope
    #[error(transparent)]
    Merkle(#[from] canopy_merkle::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::MalformedProofEnvelope(err.to_string())
    }
}

/// Result type for envelope operations
pub type Result<T> = std::result::Result<T, Error>;
