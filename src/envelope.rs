//! The canonical envelope record.
//!
//! An envelope carries everything a recipient needs to decrypt one message:
//! the wrapped session key, the AES-GCM nonce and authentication tag, the
//! ciphertext, and the version/algorithm/compression identifiers that pin
//! down how those bytes must be interpreted.
//!
//! The wire format is a CBOR map with text keys, byte fields encoded as
//! CBOR byte strings. Serialization always writes the fields in one fixed
//! order; parsing is strict and fails closed - a record that is missing a
//! field, claims an unknown version or algorithm, or carries a wrong-sized
//! nonce or tag is rejected outright, never "best-effort" accepted.
//! Unknown extra keys are ignored so that a future minor revision can add
//! fields without breaking this reader.

use ciborium::value::Value;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::{ALGORITHM_ID, ENVELOPE_VERSION};

/// Nonce length for AES-256-GCM.
pub const IV_LEN: usize = 12;

/// Authentication tag length for AES-256-GCM.
pub const TAG_LEN: usize = 16;

const KEY_VERSION: &str = "version";
const KEY_ALGORITHM: &str = "algorithm";
const KEY_COMPRESSION: &str = "compression";
const KEY_WRAPPED_KEY: &str = "encrypted_key";
const KEY_IV: &str = "iv";
const KEY_TAG: &str = "tag";
const KEY_CIPHERTEXT: &str = "ciphertext";

/// All seven required fields, in canonical serialization order.
const REQUIRED_FIELDS: [&str; 7] = [
    KEY_VERSION,
    KEY_ALGORITHM,
    KEY_COMPRESSION,
    KEY_WRAPPED_KEY,
    KEY_IV,
    KEY_TAG,
    KEY_CIPHERTEXT,
];

/// Errors that can occur while building, serializing, or parsing envelopes.
#[derive(Error, Debug)]
pub enum EnvelopeError {
    #[error("malformed envelope: {0}")]
    Malformed(String),

    #[error("envelope is missing required field {0:?}")]
    MissingField(&'static str),

    #[error("unsupported envelope version {got} (this implementation understands {ENVELOPE_VERSION})")]
    UnsupportedVersion { got: i128 },

    #[error("unsupported algorithm {got:?} (this implementation understands {ALGORITHM_ID:?})")]
    UnsupportedAlgorithm { got: String },

    #[error("field {field:?} must be exactly {expected} bytes, got {got}")]
    InvalidFieldLength {
        field: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("field {0:?} must not be empty")]
    EmptyField(&'static str),

    #[error("envelope serialization failed: {0}")]
    Serialize(String),
}

/// The canonical record carrying all fields needed to decrypt one message.
///
/// Immutable after creation: built once by the encryption pipeline,
/// consumed once by the decryption pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    version: u64,
    algorithm_id: String,
    compression_id: String,
    wrapped_key: Vec<u8>,
    iv: [u8; IV_LEN],
    tag: [u8; TAG_LEN],
    ciphertext: Vec<u8>,
}

impl Envelope {
    /// Builds an envelope for the current protocol version and algorithm.
    ///
    /// Fails if `wrapped_key` is empty; the fixed-size `iv` and `tag`
    /// parameters make the length invariants unrepresentable here.
    pub fn new(
        wrapped_key: Vec<u8>,
        iv: [u8; IV_LEN],
        tag: [u8; TAG_LEN],
        ciphertext: Vec<u8>,
        compression_id: &str,
    ) -> Result<Self, EnvelopeError> {
        if wrapped_key.is_empty() {
            return Err(EnvelopeError::EmptyField(KEY_WRAPPED_KEY));
        }
        Ok(Self {
            version: ENVELOPE_VERSION,
            algorithm_id: ALGORITHM_ID.to_string(),
            compression_id: compression_id.to_string(),
            wrapped_key,
            iv,
            tag,
            ciphertext,
        })
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn algorithm_id(&self) -> &str {
        &self.algorithm_id
    }

    pub fn compression_id(&self) -> &str {
        &self.compression_id
    }

    pub fn wrapped_key(&self) -> &[u8] {
        &self.wrapped_key
    }

    pub fn iv(&self) -> &[u8; IV_LEN] {
        &self.iv
    }

    pub fn tag(&self) -> &[u8; TAG_LEN] {
        &self.tag
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Serializes the envelope to its canonical CBOR encoding.
    ///
    /// Field order is fixed; two envelopes with equal fields serialize to
    /// identical bytes.
    pub fn serialize(&self) -> Result<Vec<u8>, EnvelopeError> {
        let map = Value::Map(vec![
            (
                Value::Text(KEY_VERSION.into()),
                Value::Integer(self.version.into()),
            ),
            (
                Value::Text(KEY_ALGORITHM.into()),
                Value::Text(self.algorithm_id.clone()),
            ),
            (
                Value::Text(KEY_COMPRESSION.into()),
                Value::Text(self.compression_id.clone()),
            ),
            (
                Value::Text(KEY_WRAPPED_KEY.into()),
                Value::Bytes(self.wrapped_key.clone()),
            ),
            (Value::Text(KEY_IV.into()), Value::Bytes(self.iv.to_vec())),
            (Value::Text(KEY_TAG.into()), Value::Bytes(self.tag.to_vec())),
            (
                Value::Text(KEY_CIPHERTEXT.into()),
                Value::Bytes(self.ciphertext.clone()),
            ),
        ]);

        let mut out = Vec::new();
        ciborium::ser::into_writer(&map, &mut out)
            .map_err(|e| EnvelopeError::Serialize(e.to_string()))?;
        Ok(out)
    }

    /// Parses an envelope from its CBOR encoding.
    ///
    /// Validation order: structural well-formedness, presence of all
    /// required fields, version, algorithm, fixed field lengths. The first
    /// failed check wins; nothing partial is ever returned.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        let value: Value = ciborium::de::from_reader(bytes)
            .map_err(|e| EnvelopeError::Malformed(e.to_string()))?;

        let Value::Map(entries) = value else {
            return Err(EnvelopeError::Malformed(
                "top-level value is not a map".to_string(),
            ));
        };

        // Unknown keys and non-text keys are ignored; a repeated key keeps
        // its last occurrence.
        let mut fields: BTreeMap<String, Value> = BTreeMap::new();
        for (key, entry) in entries {
            if let Value::Text(name) = key {
                fields.insert(name, entry);
            }
        }

        for name in REQUIRED_FIELDS {
            if !fields.contains_key(name) {
                return Err(EnvelopeError::MissingField(name));
            }
        }

        let version = int_field(&fields, KEY_VERSION)?;
        if version != ENVELOPE_VERSION as i128 {
            return Err(EnvelopeError::UnsupportedVersion { got: version });
        }

        let algorithm_id = text_field(&fields, KEY_ALGORITHM)?;
        if algorithm_id != ALGORITHM_ID {
            return Err(EnvelopeError::UnsupportedAlgorithm { got: algorithm_id });
        }

        let compression_id = text_field(&fields, KEY_COMPRESSION)?;
        let wrapped_key = bytes_field(&fields, KEY_WRAPPED_KEY)?;
        let iv = fixed_bytes_field::<IV_LEN>(&fields, KEY_IV)?;
        let tag = fixed_bytes_field::<TAG_LEN>(&fields, KEY_TAG)?;
        let ciphertext = bytes_field(&fields, KEY_CIPHERTEXT)?;

        if wrapped_key.is_empty() {
            return Err(EnvelopeError::EmptyField(KEY_WRAPPED_KEY));
        }

        Ok(Self {
            version: ENVELOPE_VERSION,
            algorithm_id,
            compression_id,
            wrapped_key,
            iv,
            tag,
            ciphertext,
        })
    }
}

fn int_field(fields: &BTreeMap<String, Value>, name: &'static str) -> Result<i128, EnvelopeError> {
    match &fields[name] {
        Value::Integer(value) => Ok(i128::from(*value)),
        other => Err(type_mismatch(name, "an integer", other)),
    }
}

fn text_field(
    fields: &BTreeMap<String, Value>,
    name: &'static str,
) -> Result<String, EnvelopeError> {
    match &fields[name] {
        Value::Text(value) => Ok(value.clone()),
        other => Err(type_mismatch(name, "a text string", other)),
    }
}

fn bytes_field(
    fields: &BTreeMap<String, Value>,
    name: &'static str,
) -> Result<Vec<u8>, EnvelopeError> {
    match &fields[name] {
        Value::Bytes(value) => Ok(value.clone()),
        other => Err(type_mismatch(name, "a byte string", other)),
    }
}

fn fixed_bytes_field<const N: usize>(
    fields: &BTreeMap<String, Value>,
    name: &'static str,
) -> Result<[u8; N], EnvelopeError> {
    let bytes = bytes_field(fields, name)?;
    <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| EnvelopeError::InvalidFieldLength {
        field: name,
        expected: N,
        got: bytes.len(),
    })
}

fn type_mismatch(name: &'static str, expected: &str, got: &Value) -> EnvelopeError {
    let got = match got {
        Value::Integer(_) => "an integer",
        Value::Bytes(_) => "a byte string",
        Value::Text(_) => "a text string",
        Value::Array(_) => "an array",
        Value::Map(_) => "a map",
        Value::Float(_) => "a float",
        Value::Bool(_) => "a boolean",
        Value::Null => "null",
        Value::Tag(..) => "a tagged value",
        _ => "an unexpected value",
    };
    EnvelopeError::Malformed(format!("field {name:?} must be {expected}, found {got}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Envelope {
        Envelope::new(
            vec![0xaa; 384],
            [2u8; IV_LEN],
            [3u8; TAG_LEN],
            vec![4u8; 100],
            "zstd",
        )
        .unwrap()
    }

    /// Re-serializes `envelope` with one field swapped out, for testing the
    /// parser against records this implementation would never produce.
    fn serialize_with_field(envelope: &Envelope, name: &str, replacement: Value) -> Vec<u8> {
        let bytes = envelope.serialize().unwrap();
        let Value::Map(entries) = ciborium::de::from_reader(bytes.as_slice()).unwrap() else {
            panic!("serialized envelope is not a map");
        };
        let patched: Vec<(Value, Value)> = entries
            .into_iter()
            .map(|(key, value)| {
                if key == Value::Text(name.to_string()) {
                    (key, replacement.clone())
                } else {
                    (key, value)
                }
            })
            .collect();
        let mut out = Vec::new();
        ciborium::ser::into_writer(&Value::Map(patched), &mut out).unwrap();
        out
    }

    fn serialize_without_field(envelope: &Envelope, name: &str) -> Vec<u8> {
        let bytes = envelope.serialize().unwrap();
        let Value::Map(entries) = ciborium::de::from_reader(bytes.as_slice()).unwrap() else {
            panic!("serialized envelope is not a map");
        };
        let stripped: Vec<(Value, Value)> = entries
            .into_iter()
            .filter(|(key, _)| *key != Value::Text(name.to_string()))
            .collect();
        let mut out = Vec::new();
        ciborium::ser::into_writer(&Value::Map(stripped), &mut out).unwrap();
        out
    }

    #[test]
    fn test_serialize_deserialize_roundtrip() {
        let envelope = sample();
        let bytes = envelope.serialize().unwrap();
        let parsed = Envelope::deserialize(&bytes).unwrap();
        assert_eq!(parsed, envelope);
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let a = sample().serialize().unwrap();
        let b = sample().serialize().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_wrapped_key_rejected_at_construction() {
        let result = Envelope::new(vec![], [0; IV_LEN], [0; TAG_LEN], vec![1, 2, 3], "zstd");
        assert!(matches!(result, Err(EnvelopeError::EmptyField("encrypted_key"))));
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(matches!(
            Envelope::deserialize(b"definitely not cbor"),
            Err(EnvelopeError::Malformed(_))
        ));
    }

    #[test]
    fn test_non_map_top_level_is_malformed() {
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&Value::Integer(7.into()), &mut bytes).unwrap();
        assert!(matches!(
            Envelope::deserialize(&bytes),
            Err(EnvelopeError::Malformed(_))
        ));
    }

    #[test]
    fn test_missing_field_rejected() {
        let bytes = serialize_without_field(&sample(), "tag");
        assert!(matches!(
            Envelope::deserialize(&bytes),
            Err(EnvelopeError::MissingField("tag"))
        ));
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let bytes = serialize_with_field(&sample(), "version", Value::Integer(2.into()));
        assert!(matches!(
            Envelope::deserialize(&bytes),
            Err(EnvelopeError::UnsupportedVersion { got: 2 })
        ));
    }

    #[test]
    fn test_unsupported_algorithm_rejected() {
        let bytes = serialize_with_field(
            &sample(),
            "algorithm",
            Value::Text("RSA2048-PKCS1+AES128-CBC".into()),
        );
        let err = Envelope::deserialize(&bytes).unwrap_err();
        assert!(matches!(err, EnvelopeError::UnsupportedAlgorithm { .. }));
    }

    #[test]
    fn test_wrong_iv_length_rejected() {
        let bytes = serialize_with_field(&sample(), "iv", Value::Bytes(vec![0u8; 10]));
        assert!(matches!(
            Envelope::deserialize(&bytes),
            Err(EnvelopeError::InvalidFieldLength {
                field: "iv",
                expected: IV_LEN,
                got: 10
            })
        ));
    }

    #[test]
    fn test_wrong_tag_length_rejected() {
        let bytes = serialize_with_field(&sample(), "tag", Value::Bytes(vec![0u8; 8]));
        assert!(matches!(
            Envelope::deserialize(&bytes),
            Err(EnvelopeError::InvalidFieldLength {
                field: "tag",
                expected: TAG_LEN,
                got: 8
            })
        ));
    }

    #[test]
    fn test_wrong_field_type_is_malformed() {
        let bytes = serialize_with_field(&sample(), "version", Value::Text("1".into()));
        assert!(matches!(
            Envelope::deserialize(&bytes),
            Err(EnvelopeError::Malformed(_))
        ));
    }

    #[test]
    fn test_unknown_extra_field_ignored() {
        let envelope = sample();
        let bytes = envelope.serialize().unwrap();
        let Value::Map(mut entries) = ciborium::de::from_reader(bytes.as_slice()).unwrap() else {
            panic!("serialized envelope is not a map");
        };
        entries.push((
            Value::Text("signature".into()),
            Value::Bytes(vec![9u8; 64]),
        ));
        let mut extended = Vec::new();
        ciborium::ser::into_writer(&Value::Map(entries), &mut extended).unwrap();

        let parsed = Envelope::deserialize(&extended).unwrap();
        assert_eq!(parsed, envelope);
    }

    #[test]
    fn test_missing_field_reported_before_version_check() {
        // A record that both lacks a field and claims a bad version must
        // report the missing field, matching the documented check order.
        let envelope = sample();
        let bytes = serialize_with_field(&envelope, "version", Value::Integer(9.into()));
        let Value::Map(entries) = ciborium::de::from_reader(bytes.as_slice()).unwrap() else {
            panic!("serialized envelope is not a map");
        };
        let stripped: Vec<(Value, Value)> = entries
            .into_iter()
            .filter(|(key, _)| *key != Value::Text("ciphertext".to_string()))
            .collect();
        let mut out = Vec::new();
        ciborium::ser::into_writer(&Value::Map(stripped), &mut out).unwrap();

        assert!(matches!(
            Envelope::deserialize(&out),
            Err(EnvelopeError::MissingField("ciphertext"))
        ));
    }
}
