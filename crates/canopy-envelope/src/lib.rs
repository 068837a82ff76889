//! JSON interchange envelopes for canopy Merkle proofs
//!
//! An envelope packages one proof with the tree metadata a verifier needs:
//! the committed root(s), leaf counts, depth, the hash algorithm, and an
//! RFC 3339 assembly timestamp. The envelope is the library's only wire
//! artifact; earlier flat-array formats are not supported.
//!
//! Deserialization is strict and panic-free: arbitrary input only ever
//! produces [`Error::MalformedProofEnvelope`] or a valid envelope.

pub mod envelope;
pub mod error;

pub use envelope::{
    deserialize_audit, deserialize_consistency, serialize_audit, serialize_consistency,
    AuditEnvelope, AuditProofSection, AuditTreeMetadata, ConsistencyEnvelope,
    ConsistencyProofSection, ConsistencyTreeMetadata, EnvelopeVersion, ProofKind,
};
pub use error::{Error, Result};
