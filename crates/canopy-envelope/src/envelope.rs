//! Envelope data model, assembly, and serialization
//!
//! One JSON object per proof. Field order is fixed by struct declaration,
//! so serialization is deterministic; deserialization is strict: only
//! version `"1.0"`, the two exact `type` strings, and exact-case
//! `direction` values are accepted, and every rejection surfaces as
//! [`Error::MalformedProofEnvelope`](crate::Error::MalformedProofEnvelope).

use canopy_merkle::{
    AuditProof, ConsistencyProof, Digest, Direction, HashAlgorithm, MerkleTree, ProofEntry,
    HASH_LEN,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Envelope format versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvelopeVersion {
    /// Version 1.0
    #[serde(rename = "1.0")]
    V1_0,
}

/// Proof shape discriminator (the envelope's `type` field)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProofKind {
    #[serde(rename = "merkle_audit_proof")]
    Audit,
    #[serde(rename = "merkle_consistency_proof")]
    Consistency,
}

/// Envelope carrying an audit proof
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEnvelope {
    pub version: EnvelopeVersion,
    #[serde(rename = "type")]
    pub kind: ProofKind,
    /// Assembly time, RFC 3339 UTC
    pub timestamp: DateTime<Utc>,
    pub tree_metadata: AuditTreeMetadata,
    pub proof: AuditProofSection,
}

/// Tree state an audit proof was generated against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditTreeMetadata {
    pub root_hash: Digest,
    pub leaf_count: u64,
    pub tree_depth: u32,
    pub hash_algorithm: HashAlgorithm,
}

/// The audit proof payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditProofSection {
    pub leaf_hash: Digest,
    pub proof_path: Vec<ProofEntry>,
}

impl AuditEnvelope {
    /// Assemble an audit envelope for `leaf` against the tree's current
    /// leaves, building the tree and stamping the current time
    pub fn for_tree(tree: &mut MerkleTree, leaf: &Digest) -> Result<Self> {
        let root_hash = tree.build()?;
        let proof = tree.audit_proof(leaf)?;
        Ok(Self {
            version: EnvelopeVersion::V1_0,
            kind: ProofKind::Audit,
            timestamp: Utc::now(),
            tree_metadata: AuditTreeMetadata {
                root_hash,
                leaf_count: tree.leaf_count() as u64,
                tree_depth: tree.depth().unwrap_or_default(),
                hash_algorithm: tree.algorithm(),
            },
            proof: AuditProofSection {
                leaf_hash: *leaf,
                proof_path: proof.entries().to_vec(),
            },
        })
    }

    /// Reconstruct the core proof carried by this envelope
    pub fn proof(&self) -> AuditProof {
        AuditProof::from_entries(
            self.tree_metadata.hash_algorithm,
            self.proof.proof_path.clone(),
        )
    }
}

/// Envelope carrying a consistency proof
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyEnvelope {
    pub version: EnvelopeVersion,
    #[serde(rename = "type")]
    pub kind: ProofKind,
    /// Assembly time, RFC 3339 UTC
    pub timestamp: DateTime<Utc>,
    pub tree_metadata: ConsistencyTreeMetadata,
    pub proof: ConsistencyProofSection,
}

/// The two tree states a consistency proof relates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyTreeMetadata {
    pub old_root_hash: Digest,
    pub new_root_hash: Digest,
    pub old_leaf_count: u64,
    pub new_leaf_count: u64,
    pub hash_algorithm: HashAlgorithm,
}

/// The consistency proof payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyProofSection {
    pub proof_path: Vec<ProofEntry>,
}

impl ConsistencyEnvelope {
    /// Assemble a consistency envelope relating a previously committed
    /// root over `old_leaf_count` leaves to the tree's current state
    pub fn for_trees(
        old_root: &Digest,
        old_leaf_count: usize,
        tree: &mut MerkleTree,
    ) -> Result<Self> {
        let new_root_hash = tree.build()?;
        let proof = tree.consistency_proof(old_leaf_count)?;
        Ok(Self {
            version: EnvelopeVersion::V1_0,
            kind: ProofKind::Consistency,
            timestamp: Utc::now(),
            tree_metadata: ConsistencyTreeMetadata {
                old_root_hash: *old_root,
                new_root_hash,
                old_leaf_count: old_leaf_count as u64,
                new_leaf_count: tree.leaf_count() as u64,
                hash_algorithm: tree.algorithm(),
            },
            proof: ConsistencyProofSection {
                proof_path: proof.entries().to_vec(),
            },
        })
    }

    /// Reconstruct the core proof carried by this envelope
    pub fn proof(&self) -> ConsistencyProof {
        ConsistencyProof::from_entries(
            self.tree_metadata.hash_algorithm,
            self.proof.proof_path.clone(),
        )
    }
}

/// Serialize an audit envelope to its JSON interchange form
pub fn serialize_audit(envelope: &AuditEnvelope) -> Result<String> {
    Ok(serde_json::to_string(envelope)?)
}

/// Parse and validate an audit envelope
///
/// Never panics on arbitrary input. Every rejection (ill-formed JSON,
/// missing fields, malformed hex, unknown version/type/direction strings,
/// a non-32-byte hash algorithm, the wrong proof shape) is returned as
/// `MalformedProofEnvelope`.
pub fn deserialize_audit(input: &str) -> Result<AuditEnvelope> {
    let envelope: AuditEnvelope = serde_json::from_str(input)?;
    if envelope.kind != ProofKind::Audit {
        return Err(Error::MalformedProofEnvelope(
            "expected type \"merkle_audit_proof\"".to_string(),
        ));
    }
    validate_algorithm(envelope.tree_metadata.hash_algorithm)?;
    if envelope
        .proof
        .proof_path
        .iter()
        .any(|entry| entry.direction == Direction::OldRoot)
    {
        return Err(Error::MalformedProofEnvelope(
            "audit proof paths carry only \"Left\" and \"Right\" directions".to_string(),
        ));
    }
    Ok(envelope)
}

/// Serialize a consistency envelope to its JSON interchange form
pub fn serialize_consistency(envelope: &ConsistencyEnvelope) -> Result<String> {
    Ok(serde_json::to_string(envelope)?)
}

/// Parse and validate a consistency envelope
///
/// The same strictness as [`deserialize_audit`] applies.
pub fn deserialize_consistency(input: &str) -> Result<ConsistencyEnvelope> {
    let envelope: ConsistencyEnvelope = serde_json::from_str(input)?;
    if envelope.kind != ProofKind::Consistency {
        return Err(Error::MalformedProofEnvelope(
            "expected type \"merkle_consistency_proof\"".to_string(),
        ));
    }
    validate_algorithm(envelope.tree_metadata.hash_algorithm)?;
    Ok(envelope)
}

fn validate_algorithm(algorithm: HashAlgorithm) -> Result<()> {
    if algorithm.digest_size() != HASH_LEN {
        return Err(Error::MalformedProofEnvelope(format!(
            "hash algorithm {} does not produce {}-byte digests",
            algorithm, HASH_LEN
        )));
    }
    Ok(())
}
