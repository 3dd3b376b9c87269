//! Flat property storage keyed by canonical path.
//!
//! Values live in a flat `key -> value` map. A shadow tree of the same keys
//! rejects shapes that cannot coexist: a leaf that is also a parent, or a node
//! used both as a map and as an array. The tree also answers subtree queries
//! (`has`, `sub_keys`) without scanning every key.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde::Serialize;

use crate::error::ConfError;
use crate::flatten;
use crate::path::{PathSegment, SegmentKind, split_path};

/// A stored value and the id of the source it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueInfo {
    pub value: String,
    pub file: usize,
}

#[derive(Debug, Clone)]
enum Node {
    Leaf,
    Map(BTreeMap<String, Node>),
    Array(BTreeMap<usize, Node>),
}

impl Node {
    fn child(&self, seg: &PathSegment) -> Option<&Node> {
        match (self, seg.kind) {
            (Node::Map(m), SegmentKind::Key) => m.get(&seg.text),
            (Node::Array(a), SegmentKind::Index) => a.get(&seg.text.parse().ok()?),
            _ => None,
        }
    }

    fn container_for(seg: &PathSegment) -> Node {
        match seg.kind {
            SegmentKind::Key => Node::Map(BTreeMap::new()),
            SegmentKind::Index => Node::Array(BTreeMap::new()),
        }
    }
}

/// A hierarchical property set.
#[derive(Debug, Clone)]
pub struct Properties {
    root: Node,
    data: BTreeMap<String, ValueInfo>,
    files: Vec<String>,
}

impl Default for Properties {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Properties {
    fn eq(&self, other: &Self) -> bool {
        self.data() == other.data()
    }
}

impl Properties {
    pub fn new() -> Self {
        Self {
            root: Node::Map(BTreeMap::new()),
            data: BTreeMap::new(),
            files: Vec::new(),
        }
    }

    /// Build a store from any nested `Serialize` value (see [`flatten`]).
    pub fn from_serialize<S: Serialize>(source: &S) -> Result<Self, ConfError> {
        let mut props = Self::new();
        props.merge(source, "<memory>")?;
        Ok(props)
    }

    /// Register an origin name, returning its id. Repeated names share an id.
    pub fn add_file(&mut self, name: &str) -> usize {
        if let Some(i) = self.files.iter().position(|f| f == name) {
            return i;
        }
        self.files.push(name.to_string());
        self.files.len() - 1
    }

    /// Flatten `source` and set every resulting key under origin `origin`.
    pub fn merge<S: Serialize>(&mut self, source: &S, origin: &str) -> Result<(), ConfError> {
        let pairs = flatten::flatten(source).map_err(|e| ConfError::Flatten(e.to_string()))?;
        let file = self.add_file(origin);
        for (key, value) in pairs {
            self.set(&key, &value, file)?;
        }
        Ok(())
    }

    /// Store `value` at `key`. Overwrites an existing leaf; fails if `key` would
    /// turn a leaf into a parent or a parent into a leaf.
    pub fn set(&mut self, key: &str, value: &str, file: usize) -> Result<(), ConfError> {
        let path = split_path(key)?;
        let conflict = || ConfError::PropertyConflict {
            path: key.to_string(),
        };

        // An empty root adopts whatever shape the first key asks for.
        if path[0].is_index() && matches!(&self.root, Node::Map(m) if m.is_empty()) {
            self.root = Node::Array(BTreeMap::new());
        }

        let mut node = &mut self.root;
        for (i, seg) in path.iter().enumerate() {
            let next = path.get(i + 1);
            let child = match node {
                Node::Map(m) if seg.kind == SegmentKind::Key => {
                    slot(m.entry(seg.text.clone()), next)
                }
                Node::Array(a) if seg.kind == SegmentKind::Index => {
                    let idx = seg.text.parse::<usize>().map_err(|_| conflict())?;
                    slot(a.entry(idx), next)
                }
                _ => None,
            };
            node = child.ok_or_else(conflict)?;
        }

        self.data.insert(
            key.to_string(),
            ValueInfo {
                value: value.to_string(),
                file,
            },
        );
        Ok(())
    }

    fn lookup(&self, key: &str) -> Option<&Node> {
        if key.is_empty() {
            return Some(&self.root);
        }
        let path = split_path(key).ok()?;
        let mut node = &self.root;
        for seg in &path {
            node = node.child(seg)?;
        }
        Some(node)
    }

    /// True for a stored leaf or for any key with stored descendants.
    pub fn has(&self, key: &str) -> bool {
        if key.is_empty() {
            return !self.data.is_empty();
        }
        self.lookup(key).is_some()
    }

    /// The leaf value at `key`, if one is stored.
    pub fn leaf(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(|v| v.value.as_str())
    }

    pub fn get(&self, key: &str) -> Result<&str, ConfError> {
        self.leaf(key).ok_or_else(|| ConfError::NotExist {
            key: key.to_string(),
        })
    }

    /// The leaf value at `key`, or `default` verbatim (placeholders untouched).
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.leaf(key).unwrap_or(default)
    }

    /// Immediate children of `prefix`, one level deep.
    ///
    /// An absent prefix and a prefix stored as an empty value both yield `[]`.
    pub fn sub_keys(&self, prefix: &str) -> Result<Vec<String>, ConfError> {
        match self.lookup(prefix) {
            None => Ok(Vec::new()),
            Some(Node::Map(m)) => Ok(m.keys().cloned().collect()),
            Some(Node::Array(a)) => Ok(a.keys().map(ToString::to_string).collect()),
            Some(Node::Leaf) => {
                if self.leaf(prefix).is_some_and(str::is_empty) {
                    Ok(Vec::new())
                } else {
                    Err(ConfError::NotContainer {
                        key: prefix.to_string(),
                    })
                }
            }
        }
    }

    /// True when `key` is the root of an array node.
    pub(crate) fn is_array(&self, key: &str) -> bool {
        matches!(self.lookup(key), Some(Node::Array(_)))
    }

    /// Replay every entry into `other`, remapping origin ids by name.
    pub fn copy_to(&self, other: &mut Properties) -> Result<(), ConfError> {
        let mut remap: Vec<Option<usize>> = vec![None; self.files.len()];
        for (key, info) in &self.data {
            let file = match self.files.get(info.file) {
                Some(name) => *remap[info.file].get_or_insert_with(|| other.add_file(name)),
                None => info.file,
            };
            other.set(key, &info.value, file)?;
        }
        Ok(())
    }

    /// All stored keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.data.keys().cloned().collect()
    }

    pub fn data(&self) -> BTreeMap<String, String> {
        self.data
            .iter()
            .map(|(k, v)| (k.clone(), v.value.clone()))
            .collect()
    }

    /// Origin name of the source that last set `key`.
    pub fn file_of(&self, key: &str) -> Option<&str> {
        let info = self.data.get(key)?;
        self.files.get(info.file).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Substitute every `${...}` placeholder in `s`.
    pub fn resolve(&self, s: &str) -> Result<String, ConfError> {
        crate::resolve::resolve_string(self, s)
    }
}

/// Step into (or create) the child held by `entry`. `next` is the segment
/// that will follow it; `None` means the child must be a leaf. Returns `None`
/// when an existing node has the wrong shape.
fn slot<'n, K: Ord>(entry: Entry<'n, K, Node>, next: Option<&PathSegment>) -> Option<&'n mut Node> {
    match entry {
        Entry::Vacant(v) => Some(v.insert(match next {
            None => Node::Leaf,
            Some(seg) => Node::container_for(seg),
        })),
        Entry::Occupied(o) => {
            let node = o.into_mut();
            let fits = match (&*node, next) {
                (Node::Leaf, None) => true,
                (Node::Leaf, Some(_)) | (_, None) => false,
                (_, Some(_)) => true,
            };
            fits.then_some(node)
        }
    }
}
