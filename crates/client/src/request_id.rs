// Path: crates/client/src/request_id.rs
//! Representation-independent hashing of request contents.
//!
//! The request id does not depend on how the content map is serialized:
//! each field is hashed as `sha256(key) || hash(value)`, the pairs are sorted
//! bytewise, and their concatenation is hashed once more.

use ica_candid::leb128::encode_unsigned;
use ica_crypto::algorithms::hash::{sha256, sha256_parts};
use ica_types::app::{RequestContent, RequestId};

/// A value that can appear in a request content map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashValue<'a> {
    Blob(&'a [u8]),
    Text(&'a str),
    Nat(u64),
    Array(Vec<HashValue<'a>>),
}

impl HashValue<'_> {
    pub fn hash(&self) -> [u8; 32] {
        match self {
            HashValue::Blob(bytes) => sha256(bytes),
            HashValue::Text(text) => sha256(text.as_bytes()),
            HashValue::Nat(n) => sha256(&encode_unsigned(*n)),
            HashValue::Array(items) => {
                let hashes: Vec<[u8; 32]> = items.iter().map(HashValue::hash).collect();
                sha256_parts(hashes.iter().map(|h| h.as_slice()))
            }
        }
    }
}

/// Hashes a content map given as `(key, value)` pairs in any order.
pub fn hash_of_map(fields: &[(&str, HashValue<'_>)]) -> [u8; 32] {
    let mut pairs: Vec<[u8; 64]> = fields
        .iter()
        .map(|(key, value)| {
            let mut pair = [0u8; 64];
            let (k, v) = pair.split_at_mut(32);
            k.copy_from_slice(&sha256(key.as_bytes()));
            v.copy_from_slice(&value.hash());
            pair
        })
        .collect();
    pairs.sort_unstable();
    sha256_parts(pairs.iter().map(|p| p.as_slice()))
}

/// The fields of `content` in its content-map form.
pub fn content_fields(content: &RequestContent) -> Vec<(&'static str, HashValue<'_>)> {
    let mut fields = vec![("request_type", HashValue::Text(content.request_type()))];
    match content {
        RequestContent::Call(call) => {
            fields.push(("canister_id", HashValue::Blob(call.canister_id.as_slice())));
            fields.push(("method_name", HashValue::Text(&call.method_name)));
            fields.push(("arg", HashValue::Blob(&call.arg)));
            if let Some(nonce) = &call.nonce {
                fields.push(("nonce", HashValue::Blob(nonce)));
            }
        }
        RequestContent::Query(query) => {
            fields.push(("canister_id", HashValue::Blob(query.canister_id.as_slice())));
            fields.push(("method_name", HashValue::Text(&query.method_name)));
            fields.push(("arg", HashValue::Blob(&query.arg)));
        }
        RequestContent::ReadState(read) => {
            let paths = read
                .paths
                .iter()
                .map(|path| {
                    HashValue::Array(path.iter().map(|l| HashValue::Blob(l)).collect())
                })
                .collect();
            fields.push(("paths", HashValue::Array(paths)));
        }
    }
    fields.push(("sender", HashValue::Blob(content.sender().as_slice())));
    fields.push(("ingress_expiry", HashValue::Nat(content.ingress_expiry())));
    fields
}

/// The request id of `content`.
pub fn request_id(content: &RequestContent) -> RequestId {
    RequestId(hash_of_map(&content_fields(content)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ica_types::app::{CallRequest, Principal, ReadStateRequest};

    fn call() -> CallRequest {
        CallRequest {
            canister_id: Principal::try_from_slice(&[0, 0, 0, 0, 0, 0, 0x04, 0xD2]).unwrap(),
            method_name: "hello".into(),
            arg: b"DIDL\x00\xFD*".to_vec(),
            sender: Principal::anonymous(),
            ingress_expiry: 1_685_570_400_000_000_000,
            nonce: None,
        }
    }

    #[test]
    fn test_content_map_reference_vector() {
        let fields = [
            ("request_type", HashValue::Text("call")),
            ("canister_id", HashValue::Blob(&[0, 0, 0, 0, 0, 0, 0x04, 0xD2])),
            ("method_name", HashValue::Text("hello")),
            ("arg", HashValue::Blob(b"DIDL\x00\xFD*")),
        ];
        assert_eq!(
            hex::encode(hash_of_map(&fields)),
            "8781291c347db32a9d8c10eb62b710fce5a93be676474c42babc74c51858f94b"
        );
    }

    #[test]
    fn test_call_request_id_reference_vector() {
        let id = request_id(&call().into());
        assert_eq!(
            id.to_string(),
            "1d1091364d6bb8a6c16b203ee75467d59ead468f523eb058880ae8ec80e2b101"
        );
    }

    #[test]
    fn test_field_order_does_not_matter() {
        let content: RequestContent = call().into();
        let mut fields = content_fields(&content);
        let forward = hash_of_map(&fields);
        fields.reverse();
        assert_eq!(hash_of_map(&fields), forward);
    }

    #[test]
    fn test_nonce_changes_the_id() {
        let plain = request_id(&call().into());
        let mut with_nonce = call();
        with_nonce.nonce = Some(vec![1, 2, 3]);
        assert_ne!(request_id(&with_nonce.into()), plain);
    }

    #[test]
    fn test_read_state_paths_are_hashed_as_nested_arrays() {
        let read = |paths: Vec<Vec<Vec<u8>>>| {
            request_id(&RequestContent::ReadState(ReadStateRequest {
                paths,
                sender: Principal::anonymous(),
                ingress_expiry: 1,
            }))
        };
        let joined = read(vec![vec![b"request_status".to_vec(), vec![7; 32]]]);
        let split = read(vec![vec![b"request_status".to_vec()], vec![vec![7; 32]]]);
        assert_ne!(joined, split);
    }
}
