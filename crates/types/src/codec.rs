// Path: crates/types/src/codec.rs

//! CBOR framing shared by certificates and request envelopes.
//!
//! The replica speaks CBOR on every HTTP endpoint. This module provides thin
//! wrappers around `ciborium` so the certificate parser and the envelope
//! builder agree on the framing: every document we emit carries the
//! self-describing tag (55799), and every document we read may or may not.

use ciborium::value::Value;

/// The CBOR self-describing tag prepended to every emitted document.
pub const SELF_DESCRIBE_TAG: u64 = 55799;

/// Encodes a CBOR value, wrapped in the self-describing tag.
pub fn to_cbor_bytes(value: &Value) -> Result<Vec<u8>, String> {
    let tagged = Value::Tag(SELF_DESCRIBE_TAG, Box::new(value.clone()));
    let mut out = Vec::new();
    ciborium::ser::into_writer(&tagged, &mut out)
        .map_err(|e| format!("cbor encode failed: {}", e))?;
    Ok(out)
}

/// Decodes a CBOR document, stripping any self-describing tags.
pub fn from_cbor_bytes(bytes: &[u8]) -> Result<Value, String> {
    let mut value: Value =
        ciborium::de::from_reader(bytes).map_err(|e| format!("cbor decode failed: {}", e))?;
    while let Value::Tag(SELF_DESCRIBE_TAG, inner) = value {
        value = *inner;
    }
    Ok(value)
}

/// Builds a CBOR map with text keys, preserving the given order.
pub fn text_map<I>(entries: I) -> Value
where
    I: IntoIterator<Item = (&'static str, Value)>,
{
    Value::Map(
        entries
            .into_iter()
            .map(|(k, v)| (Value::Text(k.to_string()), v))
            .collect(),
    )
}

/// Looks up a text key in a CBOR map.
pub fn map_get<'a>(map: &'a Value, key: &str) -> Option<&'a Value> {
    map.as_map()?
        .iter()
        .find(|(k, _)| k.as_text() == Some(key))
        .map(|(_, v)| v)
}

/// Reads an unsigned integer out of a CBOR value.
pub fn as_u64(value: &Value) -> Option<u64> {
    value.as_integer().and_then(|i| u64::try_from(i).ok())
}
