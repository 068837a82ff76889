//! Proof types and verification
//!
//! Audit proofs are verified by folding sibling digests onto the leaf from
//! the deepest level up; consistency proofs are verified by folding the
//! recorded subtree digests right-to-left. A proof carries the algorithm
//! that produced it, so verifiers need nothing beyond the committed root.

use serde::{Deserialize, Serialize};

use crate::digest::{Digest, HashAlgorithm};
use crate::error::{Error, Result};

/// Side a proof element occupies relative to the running digest
///
/// `Left` and `Right` name the child slot the element's digest was taken
/// from, and therefore the side it sits on when composed with the running
/// digest. `OldRoot` appears only in consistency proofs and marks a
/// subtree of the old tree; consistency verification ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
    OldRoot,
}

/// One element of a proof path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofEntry {
    /// Side of the running digest this element composes on
    pub direction: Direction,
    /// The recorded sibling or subtree digest
    #[serde(rename = "hash")]
    pub digest: Digest,
}

/// Sibling chain proving that a leaf is included under a committed root
///
/// Ordered from the deepest sibling up to the root's sibling. An empty
/// proof means the leaf was not found in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditProof {
    algorithm: HashAlgorithm,
    entries: Vec<ProofEntry>,
}

impl AuditProof {
    /// Reassemble a proof from its entries (e.g. out of an envelope)
    pub fn from_entries(algorithm: HashAlgorithm, entries: Vec<ProofEntry>) -> Self {
        Self { algorithm, entries }
    }

    /// Algorithm used to compose digests along this path
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// The proof path, deepest sibling first
    pub fn entries(&self) -> &[ProofEntry] {
        &self.entries
    }

    /// Number of path elements
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the target leaf was absent from the tree
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Subtree digest sequence proving an append-only extension
///
/// Folding the entries right-to-left reconstructs the old root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyProof {
    algorithm: HashAlgorithm,
    entries: Vec<ProofEntry>,
}

impl ConsistencyProof {
    /// Reassemble a proof from its entries (e.g. out of an envelope)
    pub fn from_entries(algorithm: HashAlgorithm, entries: Vec<ProofEntry>) -> Self {
        Self { algorithm, entries }
    }

    /// Algorithm used to compose digests along this path
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// The recorded subtree digests, leftmost first
    pub fn entries(&self) -> &[ProofEntry] {
        &self.entries
    }

    /// Number of recorded subtree digests
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the proof carries no elements
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Verify an audit proof against a committed root
///
/// # Arguments
/// * `root` - The committed root digest
/// * `leaf` - The leaf digest being proven
/// * `proof` - The sibling chain produced by `MerkleTree::audit_proof`
///
/// # Returns
/// * `Ok(true)` if the recomputed root matches `root`
/// * `Ok(false)` if the fold completes but the digests differ
/// * `Err(Error::EmptyProof)` for an empty proof; a single-leaf tree has
///   no verifiable audit proof; compare the leaf to the root directly
pub fn verify_audit(root: &Digest, leaf: &Digest, proof: &AuditProof) -> Result<bool> {
    if proof.is_empty() {
        return Err(Error::EmptyProof);
    }
    let algorithm = proof.algorithm();
    let mut running = *leaf;
    for entry in proof.entries() {
        running = match entry.direction {
            Direction::Left => algorithm.compose(&entry.digest, &running)?,
            Direction::Right => algorithm.compose(&running, &entry.digest)?,
            Direction::OldRoot => {
                return Err(Error::InvalidProofStructure(
                    "audit proofs carry only left and right elements",
                ))
            }
        };
    }
    Ok(running == *root)
}

/// Verify a consistency proof against a previously committed root
///
/// A single-element proof asserts that the old tree is a complete subtree
/// of the new one; it is accepted iff the element equals `old_root`.
/// Longer proofs are folded right-to-left: the two deepest entries seed
/// the accumulator and every remaining entry composes on the left.
pub fn verify_consistency(old_root: &Digest, proof: &ConsistencyProof) -> Result<bool> {
    let entries = proof.entries();
    let n = entries.len();
    if n == 0 {
        return Err(Error::EmptyProof);
    }
    if n == 1 {
        return Ok(entries[0].digest == *old_root);
    }
    let algorithm = proof.algorithm();
    let mut running = algorithm.compose(&entries[n - 2].digest, &entries[n - 1].digest)?;
    for entry in entries[..n - 2].iter().rev() {
        running = algorithm.compose(&entry.digest, &running)?;
    }
    Ok(running == *old_root)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(data: &[u8]) -> Digest {
        HashAlgorithm::Sha2256.digest_of(data).unwrap()
    }

    fn compose(left: &Digest, right: &Digest) -> Digest {
        HashAlgorithm::Sha2256.compose(left, right).unwrap()
    }

    #[test]
    fn test_verify_audit_two_leaves() {
        let h1 = h(b"1");
        let h2 = h(b"2");
        let root = compose(&h1, &h2);

        // Left leaf: sibling h2 sits on the right
        let proof = AuditProof::from_entries(
            HashAlgorithm::Sha2256,
            vec![ProofEntry {
                direction: Direction::Right,
                digest: h2,
            }],
        );
        assert!(verify_audit(&root, &h1, &proof).unwrap());

        // Right leaf: sibling h1 sits on the left
        let proof = AuditProof::from_entries(
            HashAlgorithm::Sha2256,
            vec![ProofEntry {
                direction: Direction::Left,
                digest: h1,
            }],
        );
        assert!(verify_audit(&root, &h2, &proof).unwrap());
    }

    #[test]
    fn test_verify_audit_rejects_wrong_root() {
        let h1 = h(b"1");
        let h2 = h(b"2");
        let proof = AuditProof::from_entries(
            HashAlgorithm::Sha2256,
            vec![ProofEntry {
                direction: Direction::Right,
                digest: h2,
            }],
        );
        let wrong_root = h(b"not the root");
        assert!(!verify_audit(&wrong_root, &h1, &proof).unwrap());
    }

    #[test]
    fn test_verify_audit_empty_proof_is_an_error() {
        let leaf = h(b"leaf");
        let proof = AuditProof::from_entries(HashAlgorithm::Sha2256, Vec::new());
        assert_eq!(
            verify_audit(&leaf, &leaf, &proof).unwrap_err(),
            Error::EmptyProof
        );
    }

    #[test]
    fn test_verify_audit_rejects_old_root_direction() {
        let leaf = h(b"leaf");
        let proof = AuditProof::from_entries(
            HashAlgorithm::Sha2256,
            vec![ProofEntry {
                direction: Direction::OldRoot,
                digest: leaf,
            }],
        );
        assert!(matches!(
            verify_audit(&leaf, &leaf, &proof),
            Err(Error::InvalidProofStructure(_))
        ));
    }

    #[test]
    fn test_verify_consistency_single_element() {
        let old_root = h(b"old");
        let proof = ConsistencyProof::from_entries(
            HashAlgorithm::Sha2256,
            vec![ProofEntry {
                direction: Direction::OldRoot,
                digest: old_root,
            }],
        );
        assert!(verify_consistency(&old_root, &proof).unwrap());

        let other = h(b"other");
        assert!(!verify_consistency(&other, &proof).unwrap());
    }

    #[test]
    fn test_verify_consistency_folds_right_to_left() {
        let a = h(b"a");
        let b = h(b"b");
        let c = h(b"c");
        let old_root = compose(&a, &compose(&b, &c));

        let entry = |digest| ProofEntry {
            direction: Direction::OldRoot,
            digest,
        };
        let proof = ConsistencyProof::from_entries(
            HashAlgorithm::Sha2256,
            vec![entry(a), entry(b), entry(c)],
        );
        assert!(verify_consistency(&old_root, &proof).unwrap());

        // The fold is ordered; a left-to-right reading must not verify
        let wrong = compose(&compose(&a, &b), &c);
        assert!(!verify_consistency(&wrong, &proof).unwrap());
    }

    #[test]
    fn test_verify_consistency_empty_proof_is_an_error() {
        let old_root = h(b"old");
        let proof = ConsistencyProof::from_entries(HashAlgorithm::Sha2256, Vec::new());
        assert_eq!(
            verify_consistency(&old_root, &proof).unwrap_err(),
            Error::EmptyProof
        );
    }

    #[test]
    fn test_proof_entry_serde_shape() {
        let entry = ProofEntry {
            direction: Direction::Left,
            digest: h(b"entry"),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["direction"], "Left");
        assert_eq!(json["hash"], h(b"entry").to_hex());
    }
}
