use crate::{IntentionId, IntentionSpec};
use blake2::{digest::consts::U32, Blake2b, Digest};
use serde::{Serialize, Serializer};
use std::fmt;

type Blake2b256 = Blake2b<U32>;

/// A BLAKE2b-256 digest over an intention's semantic fields.
///
/// Used to detect no-op updates and to compare replicated copies of an intention.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct IntentionHash([u8; 32]);

/// Hashes the fields of an intention in a fixed order.
///
/// Strings are written without delimiters and integers as little-endian `u64`s; metadata is
/// written in key order. The digest is byte-compatible with the one produced by other control
/// plane servers, so neither the field order nor the encoding may change.
pub(crate) fn compute(id: &IntentionId, spec: &IntentionSpec, precedence: u32) -> IntentionHash {
    let mut hasher = Blake2b256::new();

    hasher.update(id.as_str());
    hasher.update(&spec.description);
    hasher.update(&spec.source_ns);
    hasher.update(&spec.source_name);
    hasher.update(&spec.destination_ns);
    hasher.update(&spec.destination_name);
    hasher.update(&spec.source_type);
    hasher.update(&spec.action);
    hasher.update(&spec.default_addr);

    let port = spec.default_port.map(|p| u64::from(p.get())).unwrap_or(0);
    hasher.update(port.to_le_bytes());
    hasher.update(u64::from(precedence).to_le_bytes());

    // BTreeMap iterates in key order.
    for (k, v) in &spec.meta {
        hasher.update(k);
        hasher.update(v);
    }

    IntentionHash(hasher.finalize().into())
}

// === impl IntentionHash ===

impl IntentionHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for IntentionHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0.iter() {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl fmt::Debug for IntentionHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IntentionHash({})", self)
    }
}

impl Serialize for IntentionHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
