//! Carry-up Merkle trees for transparency and audit logs
//!
//! This crate commits to an ordered, append-only sequence of leaf digests
//! and produces two kinds of succinct proofs:
//! - audit proofs, showing that a leaf is included under a committed root
//! - consistency proofs, showing that a later root is an append-only
//!   extension of an earlier one
//!
//! Parent digests are plain concatenation hashes (`H(left || right)`) with
//! no RFC 6962 domain-separation prefixes. An unpaired node on the right
//! edge of a level is promoted to the next level unchanged ("carry-up")
//! rather than paired with a duplicate of itself; the consistency-proof
//! navigation depends on this shape.

pub mod digest;
pub mod error;
pub mod proof;
pub mod tree;

pub use digest::{Digest, HashAlgorithm, HASH_LEN};
pub use error::{Error, Result};
pub use proof::{
    verify_audit, verify_consistency, AuditProof, ConsistencyProof, Direction, ProofEntry,
};
pub use tree::MerkleTree;
