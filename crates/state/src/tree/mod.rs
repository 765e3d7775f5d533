// Path: crates/state/src/tree/mod.rs
//! The certified hash tree.
//!
//! Every node hashes to a 32-byte digest under its own domain separator, so
//! a tree with elided (`Pruned`) subtrees still authenticates the paths it
//! keeps. Labels below a fork are kept in ascending order, which is what lets
//! [`HashTree::lookup_path`] prove absence.

mod lookup;

pub use lookup::LookupResult;

use ciborium::value::Value;
use ica_crypto::algorithms::hash::sha256_domain;
use ica_types::error::CertificateError;
use std::fmt;

/// A SHA-256 digest.
pub type Digest = [u8; 32];

const DOMAIN_EMPTY: &[u8] = b"ic-hashtree-empty";
const DOMAIN_FORK: &[u8] = b"ic-hashtree-fork";
const DOMAIN_LABELED: &[u8] = b"ic-hashtree-labeled";
const DOMAIN_LEAF: &[u8] = b"ic-hashtree-leaf";

const TAG_EMPTY: u64 = 0;
const TAG_FORK: u64 = 1;
const TAG_LABELED: u64 = 2;
const TAG_LEAF: u64 = 3;
const TAG_PRUNED: u64 = 4;

/// A node of the hash tree.
#[derive(Clone, PartialEq, Eq)]
pub enum HashTree {
    Empty,
    Fork(Box<(HashTree, HashTree)>),
    Labeled(Vec<u8>, Box<HashTree>),
    Leaf(Vec<u8>),
    Pruned(Digest),
}

/// Builds an empty tree.
pub fn empty() -> HashTree {
    HashTree::Empty
}

/// Joins two subtrees.
pub fn fork(left: HashTree, right: HashTree) -> HashTree {
    HashTree::Fork(Box::new((left, right)))
}

/// Attaches `child` under `label`.
pub fn label(label: impl Into<Vec<u8>>, child: HashTree) -> HashTree {
    HashTree::Labeled(label.into(), Box::new(child))
}

/// A leaf holding `contents`.
pub fn leaf(contents: impl Into<Vec<u8>>) -> HashTree {
    HashTree::Leaf(contents.into())
}

/// Stands in for an elided subtree with the given digest.
pub fn pruned(digest: Digest) -> HashTree {
    HashTree::Pruned(digest)
}

impl HashTree {
    /// The root digest of this tree.
    pub fn digest(&self) -> Digest {
        match self {
            HashTree::Empty => sha256_domain(DOMAIN_EMPTY, []),
            HashTree::Fork(children) => {
                let (left, right) = children.as_ref();
                sha256_domain(DOMAIN_FORK, [&left.digest()[..], &right.digest()[..]])
            }
            HashTree::Labeled(label, child) => {
                sha256_domain(DOMAIN_LABELED, [label.as_slice(), &child.digest()[..]])
            }
            HashTree::Leaf(contents) => sha256_domain(DOMAIN_LEAF, [contents.as_slice()]),
            HashTree::Pruned(digest) => *digest,
        }
    }

    /// Builds a tree holding each `(label, subtree)` pair, sorted by label
    /// and joined by balanced forks. Later duplicates replace earlier ones.
    pub fn from_labeled<L, I>(entries: I) -> HashTree
    where
        L: Into<Vec<u8>>,
        I: IntoIterator<Item = (L, HashTree)>,
    {
        let mut sorted: Vec<(Vec<u8>, HashTree)> = entries
            .into_iter()
            .map(|(l, t)| (l.into(), t))
            .collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        let mut deduped: Vec<(Vec<u8>, HashTree)> = Vec::with_capacity(sorted.len());
        for entry in sorted {
            match deduped.last_mut() {
                Some(last) if last.0 == entry.0 => *last = entry,
                _ => deduped.push(entry),
            }
        }
        balanced(deduped)
    }

    /// Replaces the subtree reached by `path` with its digest.
    ///
    /// Returns the tree unchanged when `path` leads nowhere.
    pub fn prune_path<P: AsRef<[u8]>>(self, path: &[P]) -> HashTree {
        let Some((first, rest)) = path.split_first() else {
            return HashTree::Pruned(self.digest());
        };
        match self {
            HashTree::Fork(children) => {
                let (left, right) = *children;
                fork(left.prune_path(path), right.prune_path(path))
            }
            HashTree::Labeled(l, child) if l.as_slice() == first.as_ref() => {
                HashTree::Labeled(l, Box::new(child.prune_path(rest)))
            }
            other => other,
        }
    }

    /// Encodes the tree as its nested-array CBOR form.
    pub fn to_cbor(&self) -> Value {
        let tag = |t: u64| Value::Integer(t.into());
        match self {
            HashTree::Empty => Value::Array(vec![tag(TAG_EMPTY)]),
            HashTree::Fork(children) => {
                let (left, right) = children.as_ref();
                Value::Array(vec![tag(TAG_FORK), left.to_cbor(), right.to_cbor()])
            }
            HashTree::Labeled(label, child) => Value::Array(vec![
                tag(TAG_LABELED),
                Value::Bytes(label.clone()),
                child.to_cbor(),
            ]),
            HashTree::Leaf(contents) => {
                Value::Array(vec![tag(TAG_LEAF), Value::Bytes(contents.clone())])
            }
            HashTree::Pruned(digest) => {
                Value::Array(vec![tag(TAG_PRUNED), Value::Bytes(digest.to_vec())])
            }
        }
    }

    /// Parses the nested-array CBOR form.
    pub fn from_cbor(value: &Value) -> Result<HashTree, CertificateError> {
        let items = value
            .as_array()
            .ok_or_else(|| malformed("tree node is not an array"))?;
        let (tag, rest) = items
            .split_first()
            .ok_or_else(|| malformed("tree node has no tag"))?;
        let tag = ica_types::codec::as_u64(tag)
            .ok_or_else(|| malformed("tree node tag is not an unsigned integer"))?;
        match (tag, rest) {
            (TAG_EMPTY, []) => Ok(HashTree::Empty),
            (TAG_FORK, [left, right]) => Ok(fork(
                HashTree::from_cbor(left)?,
                HashTree::from_cbor(right)?,
            )),
            (TAG_LABELED, [l, child]) => Ok(label(bytes(l, "label")?, HashTree::from_cbor(child)?)),
            (TAG_LEAF, [contents]) => Ok(leaf(bytes(contents, "leaf")?)),
            (TAG_PRUNED, [digest]) => {
                let digest: Digest = bytes(digest, "pruned digest")?
                    .try_into()
                    .map_err(|_| malformed("pruned digest is not 32 bytes"))?;
                Ok(HashTree::Pruned(digest))
            }
            (tag, rest) => Err(malformed(&format!(
                "tree node tag {tag} with {} operands",
                rest.len()
            ))),
        }
    }
}

fn balanced(mut entries: Vec<(Vec<u8>, HashTree)>) -> HashTree {
    match entries.len() {
        0 => HashTree::Empty,
        1 => match entries.pop() {
            Some((l, t)) => label(l, t),
            None => HashTree::Empty,
        },
        n => {
            let right = entries.split_off(n / 2);
            fork(balanced(entries), balanced(right))
        }
    }
}

fn bytes(value: &Value, what: &str) -> Result<Vec<u8>, CertificateError> {
    value
        .as_bytes()
        .cloned()
        .ok_or_else(|| malformed(&format!("{what} is not a byte string")))
}

fn malformed(msg: &str) -> CertificateError {
    CertificateError::Malformed(msg.to_string())
}

struct Label<'a>(&'a [u8]);

impl fmt::Display for Label<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(self.0) {
            Ok(s) if s.chars().all(|c| c.is_ascii_graphic()) => f.write_str(s),
            _ => write!(f, "0x{}", hex::encode(self.0)),
        }
    }
}

impl fmt::Debug for HashTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashTree::Empty => f.write_str("Empty"),
            HashTree::Fork(children) => {
                let (left, right) = children.as_ref();
                f.debug_tuple("Fork").field(left).field(right).finish()
            }
            HashTree::Labeled(l, child) => write!(f, "Labeled({}, {:?})", Label(l), child),
            HashTree::Leaf(contents) => write!(f, "Leaf({})", Label(contents)),
            HashTree::Pruned(digest) => write!(f, "Pruned({})", hex::encode(digest)),
        }
    }
}

#[cfg(test)]
mod tests;
