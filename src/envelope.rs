//! CBOR typed envelope carried inside fountain-coded fragments.
//!
//! Before fountain encoding, the payload is wrapped in a compact binary
//! envelope: a CBOR map carrying the registry type name and the payload
//! bytes. On completion the decoder hands the same envelope back and the
//! typed-payload resolver dispatches on the tag.

use std::fmt;

use ciborium::Value;
use serde::{Deserialize, Serialize};

use crate::error::{QrError, Result};

/// Registry type tag of a fountain envelope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    /// Wallet account record; resolves to its first output descriptor.
    CryptoAccount,
    /// Partially signed transaction.
    CryptoPsbt,
    /// Output descriptor record.
    CryptoOutput,
    /// Plain byte payload.
    Bytes,
    /// Any tag this crate does not resolve. Not an error: the payload
    /// completes, but no final string is produced.
    Unknown(String),
}

impl TypeTag {
    /// Canonical registry string for this tag.
    pub fn as_str(&self) -> &str {
        match self {
            TypeTag::CryptoAccount => "crypto-account",
            TypeTag::CryptoPsbt => "crypto-psbt",
            TypeTag::CryptoOutput => "crypto-output",
            TypeTag::Bytes => "bytes",
            TypeTag::Unknown(tag) => tag,
        }
    }

    /// Map a registry string back to a tag.
    pub fn from_registry(tag: &str) -> TypeTag {
        match tag {
            "crypto-account" => TypeTag::CryptoAccount,
            "crypto-psbt" => TypeTag::CryptoPsbt,
            "crypto-output" => TypeTag::CryptoOutput,
            "bytes" => TypeTag::Bytes,
            other => TypeTag::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload kind selected by the caller at encode time.
///
/// Only fountain-coded sequences carry a kind; it decides how the payload
/// text becomes envelope bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayloadKind {
    /// Output descriptor text, carried as plain bytes.
    Descriptor,
    /// PSBT text, parsed to its binary form before wrapping.
    Psbt,
    /// Key material text, carried as plain bytes.
    Key,
    /// Arbitrary text, carried as plain bytes.
    Bytes,
}

impl PayloadKind {
    /// The envelope tag this kind produces.
    pub fn type_tag(self) -> TypeTag {
        match self {
            PayloadKind::Psbt => TypeTag::CryptoPsbt,
            PayloadKind::Descriptor | PayloadKind::Key | PayloadKind::Bytes => TypeTag::Bytes,
        }
    }
}

/// A typed wrapper around payload bytes, serialized as CBOR before
/// fountain encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Declared registry type of the payload.
    pub type_tag: TypeTag,
    /// Payload bytes. For `bytes` envelopes this is the raw payload; for
    /// `crypto-*` envelopes it is the record encoding the injected parser
    /// expects.
    pub data: Vec<u8>,
}

impl Envelope {
    /// Create an envelope from a tag and payload bytes.
    pub fn new(type_tag: TypeTag, data: Vec<u8>) -> Self {
        Self { type_tag, data }
    }

    /// Serialize to CBOR: a map of `type` (text) and `data` (bytes).
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        let value = Value::Map(vec![
            (Value::Text("type".into()), Value::Text(self.type_tag.as_str().to_string())),
            (Value::Text("data".into()), Value::Bytes(self.data.clone())),
        ]);
        let mut buf = Vec::new();
        ciborium::ser::into_writer(&value, &mut buf)
            .map_err(|e| QrError::envelope(format!("cbor encode: {e}")))?;
        Ok(buf)
    }

    /// Deserialize from CBOR produced by [`Envelope::to_cbor`].
    pub fn from_cbor(bytes: &[u8]) -> Result<Envelope> {
        let value: Value = ciborium::de::from_reader(bytes)
            .map_err(|e| QrError::envelope(format!("cbor decode: {e}")))?;

        let Value::Map(entries) = value else {
            return Err(QrError::envelope("expected a cbor map"));
        };

        let mut type_tag = None;
        let mut data = None;
        for (key, val) in entries {
            match (key, val) {
                (Value::Text(k), Value::Text(tag)) if k == "type" => {
                    type_tag = Some(TypeTag::from_registry(&tag));
                }
                (Value::Text(k), Value::Bytes(bytes)) if k == "data" => {
                    data = Some(bytes);
                }
                _ => {}
            }
        }

        match (type_tag, data) {
            (Some(type_tag), Some(data)) => Ok(Envelope { type_tag, data }),
            _ => Err(QrError::envelope("missing 'type' or 'data' entry")),
        }
    }
}
