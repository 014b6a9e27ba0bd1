//! Item serialization plans
//!
//! Defines how a single item is turned into JSON bytes and back.

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

/// Encodes one item as a complete JSON value
pub trait ItemEncoder<T>: Send + Sync {
    /// Append the JSON encoding of `item` to `out`
    fn encode(&self, item: &T, out: &mut Vec<u8>) -> Result<()>;

    /// Short name used in logs
    fn name(&self) -> &'static str {
        "custom"
    }
}

/// Decodes one complete JSON value into an item
pub trait ItemDecoder<T>: Send + Sync {
    /// Decode an item from the bytes of one JSON value
    fn decode(&self, bytes: &[u8]) -> Result<T>;

    /// Short name used in logs
    fn name(&self) -> &'static str {
        "custom"
    }
}

// ============================================================================
// Serde (general path)
// ============================================================================

/// General-purpose plan driven by the item's serde implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SerdeJson;

impl<T: Serialize> ItemEncoder<T> for SerdeJson {
    fn encode(&self, item: &T, out: &mut Vec<u8>) -> Result<()> {
        serde_json::to_writer(out, item)?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "serde"
    }
}

impl<T: DeserializeOwned> ItemDecoder<T> for SerdeJson {
    fn decode(&self, bytes: &[u8]) -> Result<T> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn name(&self) -> &'static str {
        "serde"
    }
}

// ============================================================================
// Compiled plan
// ============================================================================

/// Encoding function of a compiled plan
pub type EncodeFn<T> = fn(&T, &mut Vec<u8>) -> Result<()>;

/// Decoding function of a compiled plan
pub type DecodeFn<T> = fn(&[u8]) -> Result<T>;

/// A per-type plan made of two plain functions, registered ahead of time
///
/// Used for types that want a hand-written encoding (or decoding) instead
/// of going through serde.
pub struct CompiledPlan<T> {
    name: &'static str,
    encode: EncodeFn<T>,
    decode: DecodeFn<T>,
}

impl<T> CompiledPlan<T> {
    /// Create a compiled plan
    pub fn new(name: &'static str, encode: EncodeFn<T>, decode: DecodeFn<T>) -> Self {
        Self {
            name,
            encode,
            decode,
        }
    }
}

impl<T> Clone for CompiledPlan<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            encode: self.encode,
            decode: self.decode,
        }
    }
}

impl<T> fmt::Debug for CompiledPlan<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledPlan")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<T> ItemEncoder<T> for CompiledPlan<T> {
    fn encode(&self, item: &T, out: &mut Vec<u8>) -> Result<()> {
        (self.encode)(item, out)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> ItemDecoder<T> for CompiledPlan<T> {
    fn decode(&self, bytes: &[u8]) -> Result<T> {
        (self.decode)(bytes)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
