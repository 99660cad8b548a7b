use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use crate::node::NodeId;

/// Name → identifier occurrences of one document.
///
/// Only identifiers reachable from the document root are registered; the
/// [`Document`](crate::Document) keeps this in step with every attach and
/// detach.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierIndex {
    names: BTreeMap<String, BTreeSet<NodeId>>,
}

impl IdentifierIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, name: &str, id: NodeId) {
        self.names.entry(name.to_string()).or_default().insert(id);
    }

    pub(crate) fn remove(&mut self, name: &str, id: NodeId) {
        if let Some(ids) = self.names.get_mut(name) {
            ids.remove(&id);
            if ids.is_empty() {
                self.names.remove(name);
            }
        }
    }

    /// Move every occurrence of `old` under `new`, returning the moved ids.
    pub(crate) fn rename(&mut self, old: &str, new: &str) -> BTreeSet<NodeId> {
        let Some(ids) = self.names.remove(old) else {
            return BTreeSet::new();
        };
        self.names
            .entry(new.to_string())
            .or_default()
            .extend(ids.iter().copied());
        ids
    }

    pub fn get(&self, name: &str) -> impl Iterator<Item = NodeId> + '_ {
        self.names.get(name).into_iter().flatten().copied()
    }

    pub fn count(&self, name: &str) -> usize {
        self.names.get(name).map_or(0, BTreeSet::len)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Registered names starting with `prefix`, in lexical order.
    pub fn prefix_query<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.names
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(move |(name, _)| name.starts_with(prefix))
            .map(|(name, _)| name.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
