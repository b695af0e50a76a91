//! Closed-loop detection over a rename map.
//!
//! Consolidation never leaves a loop behind; this walker exists so callers
//! and tests can verify that independently.

use std::collections::btree_map;

use cfgedit_primitives::ProfileKey;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::map::RenameMap;

/// Iterator over the closed loops of a [`RenameMap`].
///
/// Each loop is reported once, starting from the first node the walk
/// revisited. The iterator is single-pass.
pub struct ClosedLoops<'a> {
	map: &'a RenameMap,
	starts: btree_map::Keys<'a, ProfileKey, ProfileKey>,
	visited: FxHashSet<&'a ProfileKey>,
}

/// Walks every rename chain in `map`, yielding each closed loop.
pub fn find_closed_loops(map: &RenameMap) -> ClosedLoops<'_> {
	ClosedLoops {
		map,
		starts: map.sources(),
		visited: FxHashSet::default(),
	}
}

impl<'a> ClosedLoops<'a> {
	fn walk(&mut self, start: &'a ProfileKey) -> Option<Vec<ProfileKey>> {
		let mut path: Vec<&'a ProfileKey> = Vec::new();
		let mut on_path: FxHashMap<&'a ProfileKey, usize> = FxHashMap::default();
		let mut current = start;

		let found = loop {
			if let Some(&idx) = on_path.get(current) {
				break Some(idx);
			}
			if self.visited.contains(current) {
				break None;
			}
			on_path.insert(current, path.len());
			path.push(current);
			match self.map.get(current) {
				Some(next) => current = next,
				None => break None,
			}
		};

		self.visited.extend(path.iter().copied());
		found.map(|idx| path[idx..].iter().map(|key| (*key).clone()).collect())
	}
}

impl Iterator for ClosedLoops<'_> {
	type Item = Vec<ProfileKey>;

	fn next(&mut self) -> Option<Self::Item> {
		while let Some(start) = self.starts.next() {
			if self.visited.contains(start) {
				continue;
			}
			if let Some(cycle) = self.walk(start) {
				return Some(cycle);
			}
		}
		None
	}
}
