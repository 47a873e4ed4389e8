//! Record identifiers
//!
//! An identifier is 12 bytes rendered as 24 lowercase hexadecimal characters:
//! a 4-byte big-endian creation timestamp, 5 bytes of per-process randomness
//! and a 3-byte counter.

use chrono::Utc;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;
use uuid::Uuid;

use super::error::{ValidationError, ValidationErrorKind};
use super::validation::is_valid_object_id;

static PROCESS_UNIQUE: OnceLock<[u8; 5]> = OnceLock::new();
static COUNTER: OnceLock<AtomicU32> = OnceLock::new();

fn process_unique() -> &'static [u8; 5] {
    PROCESS_UNIQUE.get_or_init(|| {
        let bytes = Uuid::new_v4().into_bytes();
        [bytes[0], bytes[1], bytes[2], bytes[3], bytes[4]]
    })
}

fn counter() -> &'static AtomicU32 {
    COUNTER.get_or_init(|| {
        let bytes = Uuid::new_v4().into_bytes();
        AtomicU32::new(u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]))
    })
}

/// Identifier of an owner, pet, veterinarian or visit
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    /// Generate a fresh identifier
    pub fn new() -> Self {
        let timestamp = Utc::now().timestamp() as u32;
        let count = counter().fetch_add(1, Ordering::Relaxed) & 0x00ff_ffff;

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&timestamp.to_be_bytes());
        bytes[4..9].copy_from_slice(process_unique());
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);
        Self(bytes)
    }

    /// Parse a 24-character hexadecimal string (case-insensitive)
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let invalid = || {
            ValidationError::with_context(
                ValidationErrorKind::InvalidId,
                "id",
                format!("'{}' is not a 24-character hexadecimal identifier", value),
            )
        };

        if !is_valid_object_id(value) {
            return Err(invalid());
        }

        let mut bytes = [0u8; 12];
        hex::decode_to_slice(value, &mut bytes).map_err(|_| invalid())?;
        Ok(Self(bytes))
    }

    /// Raw bytes
    pub fn bytes(&self) -> [u8; 12] {
        self.0
    }

    /// Canonical lowercase hexadecimal form
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ObjectId::parse(&raw).map_err(|e| de::Error::custom(e.message()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_ids_are_well_formed_and_unique() {
        let ids: Vec<ObjectId> = (0..1000).map(|_| ObjectId::new()).collect();
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());

        for id in &ids {
            let hex = id.to_string();
            assert_eq!(hex.len(), 24);
            assert!(is_valid_object_id(&hex));
        }
    }

    #[test]
    fn test_timestamp_prefix() {
        let before = Utc::now().timestamp() as u32;
        let id = ObjectId::new();
        let bytes = id.bytes();
        let ts = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        assert!(ts >= before);
    }

    #[test]
    fn test_parse_is_case_insensitive_and_canonicalizes() {
        let id = ObjectId::parse("507F1F77BCF86CD799439011").unwrap();
        assert_eq!(id.to_string(), "507f1f77bcf86cd799439011");
        assert_eq!(id, "507f1f77bcf86cd799439011".parse().unwrap());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        let err = ObjectId::parse("123").unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::InvalidId);
        assert!(ObjectId::parse("zzzzzzzzzzzzzzzzzzzzzzzz").is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let id = ObjectId::parse("507f1f77bcf86cd799439011").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"507f1f77bcf86cd799439011\"");

        let back: ObjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);

        assert!(serde_json::from_str::<ObjectId>("\"nope\"").is_err());
    }
}
