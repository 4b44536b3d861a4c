//! Content identifiers: BLAKE3-256 digests.

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::io::Read;
use std::str::FromStr;

/// Digest size in bytes.
pub const HASH_SIZE: usize = 32;

/// Supported hash algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// BLAKE3 with 256-bit output.
    Blake3,
}

impl Algorithm {
    /// Name used in the store config and object directory.
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Blake3 => "blake3-256",
        }
    }

    /// Parse the config name. The short CLI spelling `blake3` is accepted too.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "blake3-256" | "blake3" => Ok(Algorithm::Blake3),
            _ => Err(Error::unsupported_algorithm(s)),
        }
    }

    /// Algorithm ID byte stored in object headers.
    pub fn id(&self) -> u8 {
        match self {
            Algorithm::Blake3 => 1,
        }
    }

    /// Parse algorithm from ID byte.
    pub fn from_id(id: u8) -> Result<Self> {
        match id {
            1 => Ok(Algorithm::Blake3),
            _ => Err(Error::unsupported_algorithm(format!("ID {}", id))),
        }
    }
}

/// Content identifier of a stored object.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hash([u8; HASH_SIZE]);

impl Hash {
    pub fn from_bytes(bytes: [u8; HASH_SIZE]) -> Self {
        Hash(bytes)
    }

    /// Parse 64 hex characters.
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let mut bytes = [0u8; HASH_SIZE];
        if hex_str.len() != HASH_SIZE * 2 {
            return Err(Error::invalid_hash(format!(
                "Expected {} hex characters, got {}",
                HASH_SIZE * 2,
                hex_str.len()
            )));
        }
        hex::decode_to_slice(hex_str, &mut bytes)
            .map_err(|e| Error::invalid_hash(format!("Invalid hex: {}", e)))?;
        Ok(Hash(bytes))
    }

    /// True if `s` looks like a hex content id, without allocating.
    pub fn is_hex_id(s: &str) -> bool {
        s.len() == HASH_SIZE * 2 && s.bytes().all(|b| b.is_ascii_hexdigit())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Shard directory name: first byte as hex.
    pub fn prefix(&self) -> String {
        hex::encode(&self.0[..1])
    }

    /// File name inside the shard: remaining bytes as hex.
    pub fn suffix(&self) -> String {
        hex::encode(&self.0[1..])
    }

    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    pub fn hash_bytes(data: &[u8]) -> Self {
        Hash(*blake3::hash(data).as_bytes())
    }

    pub fn hash_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut hasher = blake3::Hasher::new();
        std::io::copy(&mut reader, &mut hasher)?;
        Ok(Hash(*hasher.finalize().as_bytes()))
    }
}

impl FromStr for Hash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Hash::from_hex(s)
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
