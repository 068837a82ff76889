//! The Merkle tree store and builder
//!
//! The tree owns an ordered list of leaf digests and an arena of nodes.
//! Children hold their parent's arena index, so proof generation is a
//! plain index walk with no shared ownership. `build` recomputes the
//! arena from the leaf list; appending a leaf invalidates the cached
//! root and the next build (explicit or on-demand from a proof query)
//! recomputes it.

use std::cmp::Ordering;

use crate::digest::{Digest, HashAlgorithm, HASH_LEN};
use crate::error::{Error, Result};
use crate::proof::{AuditProof, ConsistencyProof, Direction, ProofEntry};

/// Index of a node in the tree's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NodeId(usize);

#[derive(Debug, Clone)]
struct Node {
    digest: Digest,
    left: Option<NodeId>,
    right: Option<NodeId>,
    parent: Option<NodeId>,
    leaf_count: usize,
}

/// A Merkle tree over an append-only sequence of leaf digests
///
/// Parent digests bind children with `H(left || right)`; an unpaired
/// node on the right edge of a level is carried up unchanged.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    algorithm: HashAlgorithm,
    leaf_digests: Vec<Digest>,
    nodes: Vec<Node>,
    leaf_ids: Vec<NodeId>,
    root: Option<NodeId>,
    depth: u32,
}

impl Default for MerkleTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MerkleTree {
    /// Construct an empty SHA2-256 tree
    pub fn new() -> Self {
        Self {
            algorithm: HashAlgorithm::Sha2256,
            leaf_digests: Vec::new(),
            nodes: Vec::new(),
            leaf_ids: Vec::new(),
            root: None,
            depth: 0,
        }
    }

    /// Construct an empty tree over the given algorithm
    ///
    /// Fails with [`Error::InvalidHashLength`] unless the algorithm
    /// produces [`HASH_LEN`]-byte digests. Validating here keeps the
    /// build and proof paths free of length checks.
    pub fn with_algorithm(algorithm: HashAlgorithm) -> Result<Self> {
        if algorithm.digest_size() != HASH_LEN {
            return Err(Error::InvalidHashLength {
                expected: HASH_LEN,
                actual: algorithm.digest_size(),
            });
        }
        Ok(Self {
            algorithm,
            ..Self::new()
        })
    }

    /// The algorithm digests are composed with
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Number of appended leaves
    pub fn leaf_count(&self) -> usize {
        self.leaf_digests.len()
    }

    /// All appended leaf digests, in order
    pub fn leaves(&self) -> &[Digest] {
        &self.leaf_digests
    }

    /// The root digest, if the tree has been built since the last append
    pub fn root(&self) -> Option<Digest> {
        self.root.map(|id| self.nodes[id.0].digest)
    }

    /// Levels above the leaf row (0 for a single leaf), once built
    pub fn depth(&self) -> Option<u32> {
        self.root.map(|_| self.depth)
    }

    /// Append a pre-hashed leaf
    pub fn append_leaf(&mut self, leaf: Digest) {
        self.root = None;
        self.leaf_digests.push(leaf);
    }

    /// Append a sequence of pre-hashed leaves
    pub fn append_leaves<I>(&mut self, leaves: I)
    where
        I: IntoIterator<Item = Digest>,
    {
        self.root = None;
        self.leaf_digests.extend(leaves);
    }

    /// Hash raw bytes with the tree's algorithm and append the digest
    pub fn append_raw_leaf(&mut self, data: &[u8]) -> Result<()> {
        let leaf = self.algorithm.digest_of(data)?;
        self.append_leaf(leaf);
        Ok(())
    }

    /// Append every leaf of another tree
    ///
    /// Leaf digests are copied; nothing is shared. The combined root is
    /// produced by the next build.
    pub fn append_tree(&mut self, other: &MerkleTree) {
        self.append_leaves(other.leaves().iter().copied());
    }

    /// Fold the current leaf list into a tree and return the root digest
    ///
    /// A full recomputation: level by level, pairs are bound with
    /// `compose` and an unpaired right edge is carried up unchanged.
    /// Idempotent with respect to the root; callable again after further
    /// appends.
    pub fn build(&mut self) -> Result<Digest> {
        if self.leaf_digests.is_empty() {
            return Err(Error::EmptyTree);
        }
        self.nodes.clear();
        self.leaf_ids.clear();

        let mut level: Vec<NodeId> = Vec::with_capacity(self.leaf_digests.len());
        for i in 0..self.leaf_digests.len() {
            let id = NodeId(self.nodes.len());
            self.nodes.push(Node {
                digest: self.leaf_digests[i],
                left: None,
                right: None,
                parent: None,
                leaf_count: 1,
            });
            level.push(id);
        }
        self.leaf_ids = level.clone();

        let mut depth = 0u32;
        while level.len() > 1 {
            let mut next = Vec::with_capacity((level.len() + 1) / 2);
            let mut i = 0;
            while i < level.len() {
                let left = level[i];
                let right = level.get(i + 1).copied();
                next.push(self.push_interior(left, right)?);
                i += 2;
            }
            level = next;
            depth += 1;
        }

        let root = level[0];
        self.root = Some(root);
        self.depth = depth;
        tracing::debug!(
            "built merkle tree: {} leaves, depth {}",
            self.leaf_digests.len(),
            depth
        );
        Ok(self.nodes[root.0].digest)
    }

    /// Generate an audit proof for the leftmost leaf equal to `leaf`
    ///
    /// Returns an empty proof when no leaf matches; callers distinguish
    /// absence from verification failure by checking emptiness. Rebuilds
    /// the tree first if leaves were appended since the last build.
    pub fn audit_proof(&mut self, leaf: &Digest) -> Result<AuditProof> {
        self.ensure_built()?;

        let start = self
            .leaf_ids
            .iter()
            .copied()
            .find(|id| self.nodes[id.0].digest == *leaf);
        let Some(start) = start else {
            tracing::debug!("audit proof requested for absent leaf {}", leaf);
            return Ok(AuditProof::from_entries(self.algorithm, Vec::new()));
        };

        let mut entries = Vec::new();
        let mut current = start;
        while let Some(parent) = self.nodes[current.0].parent {
            let node = &self.nodes[parent.0];
            if node.left == Some(current) {
                // A carried-up node has no sibling; that level contributes nothing.
                if let Some(right) = node.right {
                    entries.push(ProofEntry {
                        direction: Direction::Right,
                        digest: self.nodes[right.0].digest,
                    });
                }
            } else if let Some(left) = node.left {
                entries.push(ProofEntry {
                    direction: Direction::Left,
                    digest: self.nodes[left.0].digest,
                });
            }
            current = parent;
        }
        Ok(AuditProof::from_entries(self.algorithm, entries))
    }

    /// Generate a consistency proof for the first `m` leaves
    ///
    /// Emits the subtree digests whose right-to-left fold reconstructs
    /// the root the tree had at `m` leaves. Rebuilds first if needed.
    pub fn consistency_proof(&mut self, m: usize) -> Result<ConsistencyProof> {
        if self.leaf_digests.is_empty() {
            return Err(Error::EmptyTree);
        }
        self.ensure_built()?;
        if m == 0 {
            return Err(Error::TreeTooSmall { requested: m });
        }

        // Ascend floor(log2(m)) levels from the first leaf; the node
        // reached covers the largest power-of-two prefix of the old tree.
        let hops = (m as u64).ilog2();
        let mut node = self.leaf_ids[0];
        for _ in 0..hops {
            node = self.nodes[node.0]
                .parent
                .ok_or(Error::TreeTooSmall { requested: m })?;
        }

        let mut entries = vec![self.old_root_entry(node)];
        let mut covered = self.nodes[node.0].leaf_count;
        if covered == m {
            return Ok(ConsistencyProof::from_entries(self.algorithm, entries));
        }

        let mut sibling = self.right_sibling_of(node)?;
        loop {
            let span = self.nodes[sibling.0].leaf_count;
            match (m - covered).cmp(&span) {
                Ordering::Equal => {
                    entries.push(self.old_root_entry(sibling));
                    break;
                }
                Ordering::Greater => {
                    entries.push(self.old_root_entry(sibling));
                    covered += span;
                    sibling = self.right_sibling_of(sibling)?;
                }
                Ordering::Less => {
                    sibling = self.nodes[sibling.0].left.ok_or(Error::InvalidProofStructure(
                        "consistency navigation descended past a leaf",
                    ))?;
                }
            }
        }
        Ok(ConsistencyProof::from_entries(self.algorithm, entries))
    }

    fn ensure_built(&mut self) -> Result<()> {
        if self.root.is_none() {
            self.build()?;
        }
        Ok(())
    }

    fn push_interior(&mut self, left: NodeId, right: Option<NodeId>) -> Result<NodeId> {
        let digest = match right {
            Some(right) => self
                .algorithm
                .compose(&self.nodes[left.0].digest, &self.nodes[right.0].digest)?,
            // Carry-up: an unpaired node is promoted unchanged.
            None => self.nodes[left.0].digest,
        };
        let leaf_count = self.nodes[left.0].leaf_count
            + right.map_or(0, |right| self.nodes[right.0].leaf_count);
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            digest,
            left: Some(left),
            right,
            parent: None,
            leaf_count,
        });
        self.nodes[left.0].parent = Some(id);
        if let Some(right) = right {
            self.nodes[right.0].parent = Some(id);
        }
        Ok(id)
    }

    fn right_sibling_of(&self, id: NodeId) -> Result<NodeId> {
        let parent = self.nodes[id.0].parent.ok_or(Error::InvalidProofStructure(
            "consistency navigation ran past the root",
        ))?;
        self.nodes[parent.0]
            .right
            .ok_or(Error::InvalidProofStructure(
                "consistency navigation reached a carried-up level with no right child",
            ))
    }

    fn old_root_entry(&self, id: NodeId) -> ProofEntry {
        ProofEntry {
            direction: Direction::OldRoot,
            digest: self.nodes[id.0].digest,
        }
    }

    /// Leaf digests of the subtree rooted at `id`, left to right
    #[cfg(test)]
    fn leaves_under(&self, id: NodeId, out: &mut Vec<Digest>) {
        let node = &self.nodes[id.0];
        if node.left.is_none() && node.right.is_none() {
            out.push(node.digest);
            return;
        }
        if let Some(left) = node.left {
            self.leaves_under(left, out);
        }
        if let Some(right) = node.right {
            self.leaves_under(right, out);
        }
    }
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

    fn tree_of(n: usize) -> MerkleTree {
        let mut tree = MerkleTree::new();
        for i in 1..=n {
            tree.append_leaf(h(i.to_string().as_bytes()));
        }
        tree
    }

    #[test]
    fn test_single_leaf_is_its_own_root() {
        let mut tree = MerkleTree::new();
        tree.append_leaf(h(b"leaf1"));
        let root = tree.build().unwrap();
        assert_eq!(root, h(b"leaf1"));
        assert_eq!(tree.depth(), Some(0));
    }

    #[test]
    fn test_two_leaf_root_is_composition() {
        let mut tree = tree_of(2);
        let root = tree.build().unwrap();
        assert_eq!(root, compose(&h(b"1"), &h(b"2")));
        assert_eq!(tree.depth(), Some(1));
    }

    #[test]
    fn test_odd_width_carries_up() {
        // Width 3: (h1, h2) pair, h3 carried up; root = compose(P12, h3).
        let mut tree = tree_of(3);
        let root = tree.build().unwrap();
        let p12 = compose(&h(b"1"), &h(b"2"));
        assert_eq!(root, compose(&p12, &h(b"3")));
        assert_eq!(tree.depth(), Some(2));
    }

    #[test]
    fn test_empty_tree_fails_to_build() {
        let mut tree = MerkleTree::new();
        assert_eq!(tree.build().unwrap_err(), Error::EmptyTree);
    }

    #[test]
    fn test_build_is_idempotent() {
        let mut tree = tree_of(7);
        let first = tree.build().unwrap();
        let second = tree.build().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_append_invalidates_root() {
        let mut tree = tree_of(4);
        let r4 = tree.build().unwrap();
        assert!(tree.root().is_some());
        tree.append_leaf(h(b"5"));
        assert!(tree.root().is_none());
        let r5 = tree.build().unwrap();
        assert_ne!(r4, r5);
    }

    #[test]
    fn test_with_algorithm_rejects_wide_digests() {
        for algorithm in [HashAlgorithm::Sha2384, HashAlgorithm::Sha2512] {
            let err = MerkleTree::with_algorithm(algorithm).unwrap_err();
            assert_eq!(
                err,
                Error::InvalidHashLength {
                    expected: HASH_LEN,
                    actual: algorithm.digest_size(),
                }
            );
        }
        assert!(MerkleTree::with_algorithm(HashAlgorithm::Blake3).is_ok());
    }

    #[test]
    fn test_append_raw_leaf_hashes_with_tree_algorithm() {
        let mut tree = MerkleTree::new();
        tree.append_raw_leaf(b"payload").unwrap();
        assert_eq!(tree.leaves(), &[h(b"payload")]);

        let mut blake = MerkleTree::with_algorithm(HashAlgorithm::Blake3).unwrap();
        blake.append_raw_leaf(b"payload").unwrap();
        assert_ne!(blake.leaves()[0], h(b"payload"));
    }

    #[test]
    fn test_append_tree_copies_leaves() {
        let mut left = tree_of(3);
        let right = {
            let mut tree = MerkleTree::new();
            tree.append_leaves([h(b"4"), h(b"5")]);
            tree
        };
        left.append_tree(&right);
        assert_eq!(left.leaf_count(), 5);
        assert_eq!(left.build().unwrap(), tree_of(5).build().unwrap());
    }

    #[test]
    fn test_leaf_counts_match_subtree_walks() {
        let mut tree = tree_of(11);
        tree.build().unwrap();
        for id in 0..tree.nodes.len() {
            let mut walked = Vec::new();
            tree.leaves_under(NodeId(id), &mut walked);
            assert_eq!(walked.len(), tree.nodes[id].leaf_count);
        }
    }

    #[test]
    fn test_leaves_under_root_is_leaf_order() {
        let mut tree = tree_of(6);
        tree.build().unwrap();
        let root = tree.root.unwrap();
        let mut walked = Vec::new();
        tree.leaves_under(root, &mut walked);
        assert_eq!(walked, tree.leaf_digests);
    }

    #[test]
    fn test_audit_proof_absent_leaf_is_empty() {
        let mut tree = tree_of(4);
        let proof = tree.audit_proof(&h(b"not a leaf")).unwrap();
        assert!(proof.is_empty());
    }

    #[test]
    fn test_audit_proof_carry_up_level_emits_nothing() {
        // Width 3: h3's only composing level is the root, where P12 sits left.
        let mut tree = tree_of(3);
        tree.build().unwrap();
        let proof = tree.audit_proof(&h(b"3")).unwrap();
        let p12 = compose(&h(b"1"), &h(b"2"));
        assert_eq!(proof.len(), 1);
        assert_eq!(proof.entries()[0].direction, Direction::Left);
        assert_eq!(proof.entries()[0].digest, p12);
    }

    #[test]
    fn test_audit_proof_duplicate_leaf_uses_leftmost() {
        let mut tree = MerkleTree::new();
        tree.append_leaves([h(b"dup"), h(b"x"), h(b"dup"), h(b"y")]);
        let root = tree.build().unwrap();
        let proof = tree.audit_proof(&h(b"dup")).unwrap();
        // The leftmost occurrence sits at index 0: its first sibling is h("x").
        assert_eq!(proof.entries()[0].digest, h(b"x"));
        assert!(crate::proof::verify_audit(&root, &h(b"dup"), &proof).unwrap());
    }

    #[test]
    fn test_consistency_proof_covers_power_of_two_prefix() {
        let mut tree = tree_of(8);
        tree.build().unwrap();
        let proof = tree.consistency_proof(4).unwrap();
        // m = 4 is a complete subtree; the proof is its root alone.
        assert_eq!(proof.len(), 1);
        assert_eq!(proof.entries()[0].direction, Direction::OldRoot);
        let p1234 = compose(&compose(&h(b"1"), &h(b"2")), &compose(&h(b"3"), &h(b"4")));
        assert_eq!(proof.entries()[0].digest, p1234);
    }

    #[test]
    fn test_consistency_proof_zero_width_is_too_small() {
        let mut tree = tree_of(4);
        assert_eq!(
            tree.consistency_proof(0).unwrap_err(),
            Error::TreeTooSmall { requested: 0 }
        );
    }

    #[test]
    fn test_consistency_proof_width_past_tree() {
        let mut tree = tree_of(8);
        tree.build().unwrap();
        // floor(log2(16)) = 4 hops, but the tree is only 3 levels tall.
        assert_eq!(
            tree.consistency_proof(16).unwrap_err(),
            Error::TreeTooSmall { requested: 16 }
        );
        // floor(log2(9)) = 3 hops lands on the root; the walk then needs
        // the root's sibling, which does not exist.
        assert!(matches!(
            tree.consistency_proof(9),
            Err(Error::InvalidProofStructure(_))
        ));
    }

    #[test]
    fn test_consistency_proof_on_empty_tree() {
        let mut tree = MerkleTree::new();
        assert_eq!(tree.consistency_proof(1).unwrap_err(), Error::EmptyTree);
    }

    #[test]
    fn test_proof_queries_rebuild_after_append() {
        let mut tree = tree_of(4);
        tree.build().unwrap();
        tree.append_leaf(h(b"5"));
        // No explicit rebuild: the proof query must fold in the new leaf.
        let proof = tree.audit_proof(&h(b"5")).unwrap();
        let root = tree.root().unwrap();
        assert!(crate::proof::verify_audit(&root, &h(b"5"), &proof).unwrap());
    }
}
