//! On-disk object header.
//!
//! Every object file is a 16-byte header followed by the raw payload:
//!
//! ```text
//! 0x00  4   "CAIR" magic
//! 0x04  1   version (u8) = 1
//! 0x05  1   type: 1=blob, 2=tree
//! 0x06  1   algo: 1=blake3-256
//! 0x07  1   reserved (must be 0)
//! 0x08  8   payload_len (u64 LE)
//! 0x10  ... payload
//! ```

use crate::error::{Error, Result};
use crate::hash::Algorithm;
use serde::Serialize;

pub const MAGIC: &[u8; 4] = b"CAIR";

pub const VERSION: u8 = 1;

pub const HEADER_SIZE: usize = 16;

/// Object types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    /// File content.
    Blob = 1,
    /// Directory listing.
    Tree = 2,
}

impl ObjectType {
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            1 => Ok(ObjectType::Blob),
            2 => Ok(ObjectType::Tree),
            _ => Err(Error::invalid_object_type(
                "blob or tree",
                format!("type byte {}", value),
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Blob => "blob",
            ObjectType::Tree => "tree",
        }
    }
}

/// Decoded object header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectHeader {
    pub object_type: ObjectType,
    pub algorithm: Algorithm,
    /// Payload length in bytes.
    pub payload_len: u64,
}

impl ObjectHeader {
    pub fn new(object_type: ObjectType, algorithm: Algorithm, payload_len: u64) -> Self {
        Self {
            object_type,
            algorithm,
            payload_len,
        }
    }

    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(MAGIC);
        buf[4] = VERSION;
        buf[5] = self.object_type.to_u8();
        buf[6] = self.algorithm.id();
        buf[8..16].copy_from_slice(&self.payload_len.to_le_bytes());
        buf
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let header = |reason: String| Error::invalid_object_type("object header", reason);

        if buf.len() < HEADER_SIZE {
            return Err(header(format!(
                "{} bytes (expected {})",
                buf.len(),
                HEADER_SIZE
            )));
        }
        if &buf[0..4] != MAGIC {
            return Err(header(format!("bad magic {:?}", &buf[0..4])));
        }
        if buf[4] != VERSION {
            return Err(header(format!("unsupported version {}", buf[4])));
        }
        if buf[7] != 0 {
            return Err(header(format!("reserved byte is {}", buf[7])));
        }

        let object_type = ObjectType::from_u8(buf[5])?;
        let algorithm = Algorithm::from_id(buf[6])?;

        let mut len_bytes = [0u8; 8];
        len_bytes.copy_from_slice(&buf[8..16]);

        Ok(Self {
            object_type,
            algorithm,
            payload_len: u64::from_le_bytes(len_bytes),
        })
    }
}
