// Path: crates/state/src/tree/lookup.rs
use super::HashTree;
use std::cmp::Ordering;

/// The outcome of looking up a path in a (possibly pruned) tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupResult<'a> {
    /// The path ends on a leaf with these contents.
    Found(&'a [u8]),
    /// The tree proves the path does not exist.
    Absent,
    /// A pruned subtree could hide the path.
    Unknown,
    /// The path ends on an inner node.
    Error,
}

/// Where a label sits relative to a subtree.
enum Search<'a> {
    Found(&'a HashTree),
    Absent,
    Unknown,
    /// Smaller than every label of the subtree.
    Less,
    /// Greater than every label of the subtree.
    Greater,
}

fn find_label<'a>(target: &[u8], tree: &'a HashTree) -> Search<'a> {
    match tree {
        HashTree::Labeled(l, child) => match target.cmp(l.as_slice()) {
            Ordering::Equal => Search::Found(child),
            Ordering::Less => Search::Less,
            Ordering::Greater => Search::Greater,
        },
        HashTree::Fork(children) => {
            let (left, right) = children.as_ref();
            match find_label(target, left) {
                Search::Greater => match find_label(target, right) {
                    Search::Less => Search::Absent,
                    other => other,
                },
                Search::Unknown => match find_label(target, right) {
                    Search::Less => Search::Unknown,
                    other => other,
                },
                other => other,
            }
        }
        HashTree::Pruned(_) => Search::Unknown,
        HashTree::Empty | HashTree::Leaf(_) => Search::Absent,
    }
}

impl HashTree {
    /// Follows `path` through labeled edges.
    pub fn lookup_path<P: AsRef<[u8]>>(&self, path: &[P]) -> LookupResult<'_> {
        let mut tree = self;
        for segment in path {
            match find_label(segment.as_ref(), tree) {
                Search::Found(child) => tree = child,
                Search::Unknown => return LookupResult::Unknown,
                Search::Absent | Search::Less | Search::Greater => return LookupResult::Absent,
            }
        }
        match tree {
            HashTree::Leaf(contents) => LookupResult::Found(contents),
            HashTree::Empty => LookupResult::Absent,
            HashTree::Pruned(_) => LookupResult::Unknown,
            HashTree::Fork(_) | HashTree::Labeled(..) => LookupResult::Error,
        }
    }

    /// The subtree reached by `path`, if the tree proves it exists.
    pub fn lookup_subtree<P: AsRef<[u8]>>(&self, path: &[P]) -> Option<&HashTree> {
        let mut tree = self;
        for segment in path {
            match find_label(segment.as_ref(), tree) {
                Search::Found(child) => tree = child,
                _ => return None,
            }
        }
        Some(tree)
    }
}
