//! The 32-byte hash value stored at every tree position.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A 32-byte hash value — the unit stored at every position of the
/// accumulator, from leaves to root.
///
/// Serialized as a `0x`-prefixed hex string, which is how witnesses and
/// roots travel to the dispute contract and between coordinator and
/// challenger processes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Node(pub [u8; 32]);

impl Node {
    /// The all-zero node: the empty leaf, and the defined hash of the
    /// empty-account sentinel.
    pub const ZERO: Node = Node([0u8; 32]);

    /// View the node as raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render as a `0x`-prefixed lowercase hex string.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse from a hex string, with or without the `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, NodeParseError> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped)?;
        if bytes.len() != 32 {
            return Err(NodeParseError::BadLength(bytes.len()));
        }
        let mut node = [0u8; 32];
        node.copy_from_slice(&bytes);
        Ok(Node(node))
    }
}

/// Failure to parse a [`Node`] from its hex representation.
#[derive(Debug, Error, PartialEq)]
pub enum NodeParseError {
    /// The decoded value was not exactly 32 bytes.
    #[error("expected 32 bytes, got {0}")]
    BadLength(usize),

    /// The string was not valid hex.
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
}

impl From<[u8; 32]> for Node {
    fn from(bytes: [u8; 32]) -> Self {
        Node(bytes)
    }
}

impl FromStr for Node {
    type Err = NodeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Node::from_hex(s)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.to_hex())
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Node::from_hex(&s).map_err(de::Error::custom)
    }
}
