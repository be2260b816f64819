//! CP-008: Tag table: which concrete items carry which category tag.
//!
//! Member order is the configured order from the source and is what tag
//! selection falls back to, so it is preserved exactly.

use super::error::{CraftError, Result};
use super::types::Identity;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Tag name → ordered list of concrete item names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagTable {
    tags: IndexMap<String, Vec<String>>,
}

impl TagTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `items` to the member list of `tag`, skipping names already
    /// listed.
    pub fn insert<I, S>(&mut self, tag: impl Into<String>, items: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let members = self.tags.entry(tag.into()).or_default();
        for item in items {
            let item = item.into();
            if !members.contains(&item) {
                members.push(item);
            }
        }
    }

    /// Members of a single tag, in configured order.
    pub fn members(&self, tag: &str) -> Option<&[String]> {
        self.tags
            .get(tag)
            .map(Vec::as_slice)
            .filter(|members| !members.is_empty())
    }

    /// Concrete names satisfying a tag identity: the members of each tag in
    /// the set (tags in sorted order, members in configured order), without
    /// duplicates.
    ///
    /// Fails with `UnknownTag` if any tag has no members. Name identities
    /// resolve to themselves.
    pub fn candidates(&self, identity: &Identity) -> Result<Vec<String>> {
        let tags = match identity {
            Identity::Name(name) => return Ok(vec![name.clone()]),
            Identity::Tag(tags) => tags,
        };
        let mut names: IndexSet<String> = IndexSet::new();
        for tag in tags {
            let members = self
                .members(tag)
                .ok_or_else(|| CraftError::UnknownTag { tag: tag.clone() })?;
            names.extend(members.iter().cloned());
        }
        Ok(names.into_iter().collect())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.members(tag).is_some()
    }

    /// True iff `item` carries `tag`.
    pub fn carries(&self, item: &str, tag: &str) -> bool {
        self.members(tag)
            .is_some_and(|members| members.iter().any(|m| m == item))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.tags
            .iter()
            .map(|(tag, members)| (tag.as_str(), members.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
