//! The per-namespace rename map.
//!
//! A [`RenameMap`] is a small directed graph over [`ProfileKey`]s: each
//! edge says "the node addressed by the source should end up addressed by
//! the target". Sources are either original names or the already-renamed
//! identity of a node (a key at or under another entry's target).

use std::collections::{BTreeMap, btree_map};

use cfgedit_primitives::ProfileKey;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cycles::find_closed_loops;

/// Ordered mapping from source key to pending target key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenameMap {
	edges: BTreeMap<ProfileKey, ProfileKey>,
}

/// A broken [`RenameMap`] invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
	/// An entry maps a key to itself.
	#[error("{0} maps to itself")]
	Identity(ProfileKey),
	/// Two sources share one target.
	#[error("{first} and {second} both map to {target}")]
	SharedTarget {
		/// The shared target.
		target: ProfileKey,
		/// First source, in key order.
		first: ProfileKey,
		/// Second source, in key order.
		second: ProfileKey,
	},
	/// The map contains a closed loop.
	#[error("closed rename loop through {}", display_loop(.0))]
	ClosedLoop(Vec<ProfileKey>),
	/// A source sits under another source in old naming.
	#[error("{source_key} is orphaned by the pending move of {ancestor}")]
	StaleSource {
		/// The orphaned source.
		source_key: ProfileKey,
		/// The ancestor source that moves.
		ancestor: ProfileKey,
	},
}

fn display_loop(keys: &[ProfileKey]) -> String {
	keys.iter().map(ToString::to_string).collect::<Vec<_>>().join(" -> ")
}

impl RenameMap {
	/// Creates an empty map.
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of entries.
	pub fn len(&self) -> usize {
		self.edges.len()
	}

	/// Returns true if no rename is pending.
	pub fn is_empty(&self) -> bool {
		self.edges.is_empty()
	}

	/// Target for `source`, if any.
	pub fn get(&self, source: &ProfileKey) -> Option<&ProfileKey> {
		self.edges.get(source)
	}

	/// Returns true if `source` has an entry.
	pub fn contains_source(&self, source: &ProfileKey) -> bool {
		self.edges.contains_key(source)
	}

	/// Inserts or replaces an entry, returning the previous target.
	pub fn insert(&mut self, source: ProfileKey, target: ProfileKey) -> Option<ProfileKey> {
		self.edges.insert(source, target)
	}

	/// Removes the entry for `source`, returning its target.
	pub fn remove(&mut self, source: &ProfileKey) -> Option<ProfileKey> {
		self.edges.remove(source)
	}

	/// Keeps only the entries for which `keep` returns true.
	pub fn retain(&mut self, mut keep: impl FnMut(&ProfileKey, &ProfileKey) -> bool) {
		self.edges.retain(|source, target| keep(source, target));
	}

	/// Removes every entry.
	pub fn clear(&mut self) {
		self.edges.clear();
	}

	/// Entries in source key order.
	pub fn iter(&self) -> btree_map::Iter<'_, ProfileKey, ProfileKey> {
		self.edges.iter()
	}

	/// Sources in key order.
	pub fn sources(&self) -> btree_map::Keys<'_, ProfileKey, ProfileKey> {
		self.edges.keys()
	}

	/// Targets in source key order.
	pub fn targets(&self) -> btree_map::Values<'_, ProfileKey, ProfileKey> {
		self.edges.values()
	}

	/// Returns true if some entry targets exactly `key`.
	pub fn has_target(&self, key: &ProfileKey) -> bool {
		self.edges.values().any(|target| target == key)
	}

	/// Source of the entry targeting exactly `target`, if any.
	pub fn source_of(&self, target: &ProfileKey) -> Option<&ProfileKey> {
		self.edges.iter().find(|(_, t)| *t == target).map(|(s, _)| s)
	}

	/// Returns true if `key` lies at or under the target of an entry other
	/// than the one sourced at `key` itself.
	///
	/// Such a key is expressed in post-rename naming: it is the current
	/// identity of a node that already moved.
	pub fn lies_under_other_target(&self, key: &ProfileKey) -> bool {
		self.edges.iter().any(|(source, target)| source != key && key.starts_with(target))
	}

	/// Returns the nearest other source that `key` lies strictly beneath.
	pub fn moving_ancestor(&self, key: &ProfileKey) -> Option<&ProfileKey> {
		self.edges
			.keys()
			.filter(|source| key.is_descendant_of(source))
			.max_by_key(|source| source.depth())
	}

	/// Returns true if `source` is orphaned: it lies under another moving
	/// source and is still expressed in old naming.
	pub fn is_stale_source(&self, source: &ProfileKey) -> bool {
		self.moving_ancestor(source).is_some() && !self.lies_under_other_target(source)
	}

	/// Entries in the order they must be applied as sequential moves.
	///
	/// An entry whose source lies at or under another entry's target is
	/// applied after that entry. Ties are broken by target depth, then by
	/// source key.
	pub fn application_order(&self) -> Vec<(&ProfileKey, &ProfileKey)> {
		let entries: Vec<(&ProfileKey, &ProfileKey)> = self.edges.iter().collect();
		let n = entries.len();
		let mut ranks = vec![0usize; n];
		for _ in 0..n {
			let mut raised = false;
			for i in 0..n {
				for j in 0..n {
					if i != j && entries[i].0.starts_with(entries[j].1) && ranks[i] <= ranks[j] && ranks[j] < n {
						ranks[i] = ranks[j] + 1;
						raised = true;
					}
				}
			}
			if !raised {
				break;
			}
		}
		let mut order: Vec<usize> = (0..n).collect();
		order.sort_by(|&a, &b| {
			ranks[a]
				.cmp(&ranks[b])
				.then_with(|| entries[a].1.depth().cmp(&entries[b].1.depth()))
				.then_with(|| entries[a].0.cmp(entries[b].0))
		});
		order.into_iter().map(|idx| entries[idx]).collect()
	}

	/// Verifies every map invariant, reporting the first violation.
	pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
		if let Some((source, _)) = self.edges.iter().find(|(s, t)| s == t) {
			return Err(InvariantViolation::Identity(source.clone()));
		}

		let mut seen: BTreeMap<&ProfileKey, &ProfileKey> = BTreeMap::new();
		for (source, target) in &self.edges {
			if let Some(first) = seen.insert(target, source) {
				return Err(InvariantViolation::SharedTarget {
					target: target.clone(),
					first: first.clone(),
					second: source.clone(),
				});
			}
		}

		if let Some(cycle) = find_closed_loops(self).next() {
			return Err(InvariantViolation::ClosedLoop(cycle));
		}

		for source in self.edges.keys() {
			if let Some(ancestor) = self.moving_ancestor(source)
				&& !self.lies_under_other_target(source)
			{
				return Err(InvariantViolation::StaleSource {
					source_key: source.clone(),
					ancestor: ancestor.clone(),
				});
			}
		}

		Ok(())
	}

	/// Consumes the map, yielding entries in source key order.
	pub fn into_entries(self) -> impl Iterator<Item = (ProfileKey, ProfileKey)> {
		self.edges.into_iter()
	}
}

impl FromIterator<(ProfileKey, ProfileKey)> for RenameMap {
	fn from_iter<I: IntoIterator<Item = (ProfileKey, ProfileKey)>>(iter: I) -> Self {
		Self {
			edges: iter.into_iter().collect(),
		}
	}
}

impl<'a> IntoIterator for &'a RenameMap {
	type Item = (&'a ProfileKey, &'a ProfileKey);
	type IntoIter = btree_map::Iter<'a, ProfileKey, ProfileKey>;

	fn into_iter(self) -> Self::IntoIter {
		self.edges.iter()
	}
}
