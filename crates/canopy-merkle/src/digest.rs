//! Digest type and hash algorithm registry
//!
//! Every digest in the library is exactly [`HASH_LEN`] bytes. Algorithms
//! with a different output width can be named but are rejected wherever a
//! digest would be produced, so the tree and proof code never has to
//! re-check lengths.

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

use crate::error::{Error, Result};

/// Digest width in bytes
pub const HASH_LEN: usize = 32;

/// Supported hash algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashAlgorithm {
    /// SHA2-256
    #[serde(rename = "SHA2_256")]
    Sha2256,
    /// SHA2-384
    #[serde(rename = "SHA2_384")]
    Sha2384,
    /// SHA2-512
    #[serde(rename = "SHA2_512")]
    Sha2512,
    /// BLAKE3
    #[serde(rename = "BLAKE3")]
    Blake3,
}

impl HashAlgorithm {
    /// Get the digest size in bytes for this algorithm
    pub fn digest_size(&self) -> usize {
        match self {
            HashAlgorithm::Sha2256 => 32,
            HashAlgorithm::Sha2384 => 48,
            HashAlgorithm::Sha2512 => 64,
            HashAlgorithm::Blake3 => 32,
        }
    }

    /// Hash arbitrary bytes into a [`Digest`].
    ///
    /// Fails with [`Error::InvalidHashLength`] iff the algorithm's output
    /// width differs from [`HASH_LEN`].
    pub fn digest_of(&self, data: &[u8]) -> Result<Digest> {
        match self {
            HashAlgorithm::Sha2256 => Ok(Digest(Sha256::digest(data).into())),
            HashAlgorithm::Blake3 => Ok(Digest(*blake3::hash(data).as_bytes())),
            HashAlgorithm::Sha2384 | HashAlgorithm::Sha2512 => Err(Error::InvalidHashLength {
                expected: HASH_LEN,
                actual: self.digest_size(),
            }),
        }
    }

    /// Bind two child digests into a parent digest.
    ///
    /// Exactly `H(left || right)`: the two digests are concatenated into a
    /// single stack buffer and hashed in one shot. No separators, no
    /// length prefix, no streaming.
    pub fn compose(&self, left: &Digest, right: &Digest) -> Result<Digest> {
        let mut buf = [0u8; 2 * HASH_LEN];
        buf[..HASH_LEN].copy_from_slice(left.as_slice());
        buf[HASH_LEN..].copy_from_slice(right.as_slice());
        self.digest_of(&buf)
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashAlgorithm::Sha2256 => write!(f, "SHA2_256"),
            HashAlgorithm::Sha2384 => write!(f, "SHA2_384"),
            HashAlgorithm::Sha2512 => write!(f, "SHA2_512"),
            HashAlgorithm::Blake3 => write!(f, "BLAKE3"),
        }
    }
}

/// A fixed-width digest (32 bytes)
///
/// Equality is byte-wise. Serializes as a lowercase hex string and
/// deserializes from either case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; HASH_LEN]);

impl Digest {
    /// Create from a fixed-size byte array
    pub fn from_bytes(bytes: [u8; HASH_LEN]) -> Self {
        Digest(bytes)
    }

    /// Create from a slice, validating the length
    pub fn try_from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != HASH_LEN {
            return Err(Error::InvalidHashLength {
                expected: HASH_LEN,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; HASH_LEN];
        arr.copy_from_slice(bytes);
        Ok(Digest(arr))
    }

    /// Parse from a hex string (upper or lower case)
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| Error::InvalidHexFormat(format!("invalid hex: {}", e)))?;
        if bytes.len() != HASH_LEN {
            return Err(Error::InvalidHexFormat(format!(
                "expected {} hex characters, got {}",
                2 * HASH_LEN,
                hex_str.len()
            )));
        }
        Self::try_from_slice(&bytes)
    }

    /// Encode as a lowercase hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Get the digest as a fixed-size byte array
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Get the digest as a slice
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; HASH_LEN]> for Digest {
    fn from(bytes: [u8; HASH_LEN]) -> Self {
        Digest(bytes)
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl serde::Serialize for Digest {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Digest {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Digest::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
