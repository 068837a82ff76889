//! Error types for canopy-merkle

use thiserror::Error;

/// Errors that can occur in Merkle tree and proof operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// `build` or `consistency_proof` called on a tree with no leaves
    #[error("tree has no leaves")]
    EmptyTree,

    /// A digest or algorithm output is not `HASH_LEN` bytes wide
    #[error("invalid hash length: expected {expected} bytes, got {actual}")]
    InvalidHashLength { expected: usize, actual: usize },

    /// A hex digest string could not be parsed
    #[error("invalid hex digest: {0}")]
    InvalidHexFormat(String),

    /// A verification routine was handed a proof with no elements
    #[error("proof has no elements")]
    EmptyProof,

    /// The built tree cannot cover a consistency proof of the requested width
    #[error("tree too small for a consistency proof over {requested} leaves")]
    TreeTooSmall { requested: usize },

    /// Proof navigation reached a node that does not exist
    #[error("invalid proof structure: {0}")]
    InvalidProofStructure(&'static str),
}

/// Result type for Merkle tree and proof operations
pub type Result<T> = std::result::Result<T, Error>;
