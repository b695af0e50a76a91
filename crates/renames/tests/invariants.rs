use std::collections::{BTreeMap, BTreeSet};

use cfgedit_renames::{
	ChangeRecord, Consolidator, Namespace, ProfileKey, RenameMap, RenameStore, find_closed_loops,
};
use proptest::prelude::*;

const ORIGINAL_TREE: [&str; 6] = ["a", "a.b", "a.c", "b", "b.d", "c"];
const FRESH_LEAVES: [&str; 4] = ["x", "y", "z", "w"];
const MAX_DEPTH: usize = 4;

fn arb_key() -> impl Strategy<Value = ProfileKey> {
	prop::collection::vec(prop::sample::select(vec!["a", "b", "c"]), 1..=3)
		.prop_map(|parts| ProfileKey::from_segments(parts).unwrap())
}

fn arb_requests() -> impl Strategy<Value = Vec<(ProfileKey, ProfileKey)>> {
	prop::collection::vec((arb_key(), arb_key()), 1..12)
}

fn key(text: &str) -> ProfileKey {
	ProfileKey::parse(text).unwrap()
}

/// Reference model of a profile tree under sequential moves: where every
/// original node is displayed, and every name each node has held.
struct Tree {
	displayed: BTreeMap<ProfileKey, ProfileKey>,
	held: BTreeMap<ProfileKey, BTreeSet<ProfileKey>>,
}

impl Tree {
	fn new() -> Self {
		let nodes: Vec<ProfileKey> = ORIGINAL_TREE.iter().map(|text| key(text)).collect();
		Self {
			displayed: nodes.iter().map(|node| (node.clone(), node.clone())).collect(),
			held: nodes.iter().map(|node| (node.clone(), BTreeSet::from([node.clone()]))).collect(),
		}
	}

	fn is_shown(&self, name: &ProfileKey) -> bool {
		self.displayed.values().any(|shown| shown == name)
	}

	/// Displays after moving `node`'s subtree to `new`.
	fn moved(&self, node: &ProfileKey, new: &ProfileKey) -> BTreeMap<ProfileKey, ProfileKey> {
		let current = &self.displayed[node];
		self.displayed
			.iter()
			.map(|(original, shown)| (original.clone(), shown.rebase(current, new).unwrap_or_else(|| shown.clone())))
			.collect()
	}

	/// New names offered for `node`: a fresh leaf under the root or under
	/// any node outside its subtree, or a name it held before.
	fn candidates(&self, node: &ProfileKey) -> Vec<ProfileKey> {
		let current = &self.displayed[node];
		let mut parents: Vec<Option<&ProfileKey>> = vec![None];
		parents.extend(self.displayed.values().filter(|shown| !shown.starts_with(current)).map(Some));
		let mut names: Vec<ProfileKey> = parents
			.into_iter()
			.flat_map(|parent| {
				FRESH_LEAVES.iter().map(move |leaf| match parent {
					Some(parent) => key(&format!("{parent}.{leaf}")),
					None => key(leaf),
				})
			})
			.collect();
		names.extend(self.held[node].iter().cloned());
		names
	}

	/// Moves the map can express: the slot is free, the parent exists, the
	/// name was never held by another node, and no node ends up beneath
	/// one of its own original descendants.
	fn accepts(&self, node: &ProfileKey, new: &ProfileKey) -> bool {
		let current = &self.displayed[node];
		if new.depth() > MAX_DEPTH || self.is_shown(new) || new.starts_with(current) {
			return false;
		}
		if new.parent().is_some_and(|parent| !self.is_shown(&parent)) {
			return false;
		}
		if self.held.iter().any(|(other, names)| other != node && names.contains(new)) {
			return false;
		}
		let after = self.moved(node, new);
		!after.iter().any(|(upper, upper_shown)| {
			after
				.iter()
				.any(|(lower, lower_shown)| lower.is_descendant_of(upper) && upper_shown.is_descendant_of(lower_shown))
		})
	}

	fn apply(&mut self, node: &ProfileKey, new: &ProfileKey) {
		self.displayed = self.moved(node, new);
		for (original, shown) in &self.displayed {
			if let Some(names) = self.held.get_mut(original) {
				names.insert(shown.clone());
			}
		}
	}
}

/// Flattened key of the `host` property of `profile`.
fn encoded(profile: &ProfileKey) -> String {
	let flat: Vec<String> = profile.segments().iter().map(|segment| format!("profiles.{segment}")).collect();
	format!("{}.properties.host", flat.join("."))
}

fn record_for(namespace: &Namespace, profile: &ProfileKey) -> ChangeRecord {
	ChangeRecord {
		namespace: namespace.clone(),
		profile: Some(profile.clone()),
		key: encoded(profile),
		path: Vec::new(),
		value: None,
	}
}

proptest! {
	/// Must leave no identity, shared target, closed loop or stale source
	/// after any request.
	///
	/// - Enforced in: `Consolidator::add_rename` (settle step)
	/// - Failure symptom: saved renames collide or are applied under names
	///   that no longer exist.
	#[test]
	fn every_request_sequence_keeps_map_invariants(requests in arb_requests()) {
		let engine = Consolidator::default();
		let mut map = RenameMap::new();
		for (original, new) in &requests {
			map = engine.add_rename(map, original, new).map;
			prop_assert_eq!(map.check_invariants(), Ok(()));
			prop_assert_eq!(find_closed_loops(&map).count(), 0);
		}
	}

	/// Must hold even when the round cap cuts consolidation short.
	#[test]
	fn invariants_survive_a_tiny_round_cap(requests in arb_requests()) {
		let engine = Consolidator::new(1);
		let mut map = RenameMap::new();
		for (original, new) in &requests {
			map = engine.add_rename(map, original, new).map;
			prop_assert_eq!(map.check_invariants(), Ok(()));
		}
	}

	/// Must return to an empty map when a lone rename is undone.
	#[test]
	fn undoing_a_lone_rename_clears_the_map(original in arb_key(), new in arb_key()) {
		prop_assume!(original != new);
		let engine = Consolidator::default();
		let staged = engine.add_rename(RenameMap::new(), &original, &new).map;
		let undone = engine.add_rename(staged, &new, &original).map;
		prop_assert!(undone.is_empty());
	}

	/// Must never keep an empty map for a namespace.
	#[test]
	fn store_drops_empty_namespaces(requests in arb_requests()) {
		let ns = Namespace::new("/c");
		let mut store = RenameStore::default();
		for (original, new) in &requests {
			store.stage(&ns, original, new);
			prop_assert_eq!(store.map(&ns).is_some_and(RenameMap::is_empty), false);
		}
	}

	/// Must agree with a tree that applies every request as a move: each
	/// original node resolves forward to where it is displayed, back from
	/// there to itself, and its pending edits are rewritten onto that name.
	///
	/// - Enforced in: `Consolidator::add_rename` (chain and propagation passes)
	/// - Failure symptom: a renamed profile's children or pending edits land
	///   under a name that no longer exists after save.
	#[test]
	fn store_tracks_a_tree_of_moves(steps in prop::collection::vec((0usize..64, 0usize..512), 1..10)) {
		let ns = Namespace::new("/c");
		let mut store = RenameStore::default();
		let mut tree = Tree::new();

		for (pick_node, pick_name) in steps {
			let nodes: Vec<ProfileKey> = tree.displayed.keys().cloned().collect();
			let node = &nodes[pick_node % nodes.len()];
			let candidates = tree.candidates(node);
			let new = &candidates[pick_name % candidates.len()];
			if !tree.accepts(node, new) {
				continue;
			}
			let shown = tree.displayed[node].clone();
			store.stage(&ns, &shown, new);
			tree.apply(node, new);

			for (original, shown) in &tree.displayed {
				prop_assert_eq!(&store.resolve_forward(&ns, original), shown, "forward {}", original);
				prop_assert_eq!(&store.resolve_reverse(&ns, shown), original, "reverse {}", shown);

				let mut records = vec![record_for(&ns, original)];
				store.apply_to_change_records(&ns, &mut records);
				prop_assert_eq!(records[0].profile.as_ref(), Some(shown), "profile {}", original);
				prop_assert_eq!(&records[0].key, &encoded(shown));
			}
			if let Some(map) = store.map(&ns) {
				prop_assert_eq!(map.check_invariants(), Ok(()));
			}
		}
	}
}

/// Fixed request sequences that once left a child rename behind when its
/// parent moved again.
#[test]
fn repeated_parent_moves_keep_child_renames() {
	let cases: [(&[(&str, &str)], &str, &str); 3] = [
		(&[("a", "y"), ("y.b", "y.x"), ("y", "x")], "a.b", "x.x"),
		(&[("b", "a.x"), ("a", "y"), ("y", "x")], "b", "x.x"),
		(&[("c.d", "c.x"), ("c", "a.x"), ("a", "b.y")], "c.d", "b.y.x.x"),
	];
	for (requests, original, expected) in cases {
		let ns = Namespace::new("/c");
		let mut store = RenameStore::default();
		for (from, to) in requests {
			store.add_rename(&ns, from, to).unwrap();
		}
		assert_eq!(store.resolve_forward(&ns, &key(original)), key(expected), "{requests:?}");
		assert_eq!(store.resolve_reverse(&ns, &key(expected)), key(original), "{requests:?}");

		let mut records = vec![record_for(&ns, &key(original))];
		store.apply_to_change_records(&ns, &mut records);
		assert_eq!(records[0].profile, Some(key(expected)), "{requests:?}");
	}
}
