//! Individual consolidation passes.
//!
//! Each pass mutates the map in place, appends what it did to the log and
//! returns whether anything changed. Candidate entries are always collected
//! before mutation and re-checked before use, since an earlier edit in the
//! same pass may already have consumed them.

use std::collections::{BTreeMap, BTreeSet};

use cfgedit_primitives::ProfileKey;
use tracing::{trace, warn};

use super::Diagnostic;
use crate::cycles::find_closed_loops;
use crate::map::RenameMap;

fn record(log: &mut Vec<Diagnostic>, diagnostic: Diagnostic) {
	trace!(?diagnostic, "consolidation step");
	log.push(diagnostic);
}

fn entries(map: &RenameMap) -> Vec<(ProfileKey, ProfileKey)> {
	map.iter().map(|(s, t)| (s.clone(), t.clone())).collect()
}

fn is_current(map: &RenameMap, source: &ProfileKey, target: &ProfileKey) -> bool {
	map.get(source) == Some(target)
}

pub(super) fn drop_identities(map: &mut RenameMap, log: &mut Vec<Diagnostic>) -> bool {
	let identities: Vec<ProfileKey> = map.iter().filter(|(s, t)| s == t).map(|(s, _)| s.clone()).collect();
	let changed = !identities.is_empty();
	for key in identities {
		map.remove(&key);
		record(log, Diagnostic::IdentityRemoved { key });
	}
	changed
}

/// Removes `a -> b` / `b -> a` pairs.
///
/// Entries that followed the pair's display name are moved back under the
/// restored name first. `latest` is the source of the request being
/// registered; when it is one of the pair, its key is the display name
/// being abandoned.
pub(super) fn cancel_opposing_pairs(
	map: &mut RenameMap,
	log: &mut Vec<Diagnostic>,
	latest: Option<&ProfileKey>,
) -> bool {
	let pairs: Vec<(ProfileKey, ProfileKey)> = map
		.iter()
		.filter(|(a, b)| a < b && map.get(b) == Some(*a))
		.map(|(a, b)| (a.clone(), b.clone()))
		.collect();

	let mut changed = false;
	for (first, second) in pairs {
		if !is_current(map, &first, &second) || !is_current(map, &second, &first) {
			continue;
		}
		let (from, to) = if latest == Some(&first) {
			(first.clone(), second.clone())
		} else {
			(second.clone(), first.clone())
		};

		map.remove(&first);
		map.remove(&second);

		for (source, target) in entries(map) {
			let target = match target.rebase(&from, &to) {
				Some(moved) if target.is_descendant_of(&from) => {
					map.insert(source.clone(), moved.clone());
					record(
						log,
						Diagnostic::TargetRebased {
							source: source.clone(),
							previous: target,
							target: moved.clone(),
						},
					);
					moved
				}
				_ => target,
			};
			if let Some(rekeyed) = source.suffix_after(&from).map(|suffix| to.join(suffix))
				&& !map.contains_source(&rekeyed)
			{
				map.remove(&source);
				map.insert(rekeyed.clone(), target.clone());
				record(
					log,
					Diagnostic::SourceRekeyed {
						previous: source,
						source: rekeyed,
						target,
					},
				);
			}
		}

		record(log, Diagnostic::Cancelled { first, second });
		changed = true;
	}
	changed
}

/// Collapses `x -> y -> z` into `x -> z`.
///
/// `y` was the display name of `x`'s node, so entries spelled under `y`
/// move under `z` with it. A rekeyed source whose slot is taken is dropped.
pub(super) fn compose_chains(map: &mut RenameMap, log: &mut Vec<Diagnostic>) -> bool {
	let links: Vec<(ProfileKey, ProfileKey)> = map
		.iter()
		.filter(|(s, t)| s != t && map.contains_source(t))
		.map(|(s, t)| (s.clone(), t.clone()))
		.collect();

	let mut changed = false;
	for (source, via) in links {
		if !is_current(map, &source, &via) {
			continue;
		}
		let Some(target) = map.get(&via).cloned() else {
			continue;
		};
		if target == source || target == via {
			continue;
		}
		map.remove(&via);
		map.insert(source.clone(), target.clone());
		move_followers(map, log, &source, &via, &target);
		record(log, Diagnostic::Chained { source, via, target });
		changed = true;
	}
	changed
}

/// Moves every entry other than `owner`'s that is spelled strictly under
/// `from` to the same place under `to`. Keys already under `to` are left
/// alone.
fn move_followers(map: &mut RenameMap, log: &mut Vec<Diagnostic>, owner: &ProfileKey, from: &ProfileKey, to: &ProfileKey) {
	for (source, target) in entries(map) {
		if source == *owner {
			continue;
		}
		let target = match target.suffix_after(from).map(|suffix| to.join(suffix)) {
			Some(moved) if !target.starts_with(to) => {
				map.insert(source.clone(), moved.clone());
				record(
					log,
					Diagnostic::TargetRebased {
						source: source.clone(),
						previous: target,
						target: moved.clone(),
					},
				);
				moved
			}
			_ => target,
		};
		if source.starts_with(to) {
			continue;
		}
		let Some(rekeyed) = source.suffix_after(from).map(|suffix| to.join(suffix)) else {
			continue;
		};
		map.remove(&source);
		if map.contains_source(&rekeyed) {
			record(log, Diagnostic::StalePruned { source, target });
			continue;
		}
		map.insert(rekeyed.clone(), target.clone());
		record(
			log,
			Diagnostic::SourceRekeyed {
				previous: source,
				source: rekeyed,
				target,
			},
		);
	}
}

/// Re-keys sources still spelled under a parent that is moving.
pub(super) fn propagate_sources(map: &mut RenameMap, log: &mut Vec<Diagnostic>) -> bool {
	let mut changed = false;
	for (parent, moved_to) in entries(map) {
		if !is_current(map, &parent, &moved_to) {
			continue;
		}
		let stale: Vec<ProfileKey> = map
			.sources()
			.filter(|s| s.is_descendant_of(&parent) && !map.lies_under_other_target(s))
			.cloned()
			.collect();

		for previous in stale {
			let Some(source) = previous.rebase(&parent, &moved_to) else {
				continue;
			};
			// Occupied slots are left for stale pruning.
			if map.contains_source(&source) {
				continue;
			}
			let Some(target) = map.remove(&previous) else {
				continue;
			};
			map.insert(source.clone(), target.clone());
			record(log, Diagnostic::SourceRekeyed { previous, source, target });
			changed = true;
		}
	}
	changed
}

/// Moves targets that were placed under a parent before the parent moved.
///
/// Sources spelled under a moved target are the current identities of
/// that target's descendants, so they move with it. Occupied slots are
/// left for stale pruning.
pub(super) fn propagate_targets(map: &mut RenameMap, log: &mut Vec<Diagnostic>) -> bool {
	let mut changed = false;
	for (parent, moved_to) in entries(map) {
		if !is_current(map, &parent, &moved_to) || map.has_target(&parent) {
			continue;
		}
		let followers: Vec<(ProfileKey, ProfileKey, ProfileKey)> = map
			.iter()
			.filter(|(s, t)| **s != parent && t.is_descendant_of(&parent) && !t.starts_with(&moved_to))
			.filter_map(|(s, t)| t.rebase(&parent, &moved_to).map(|moved| (s.clone(), t.clone(), moved)))
			.collect();
		let carried: BTreeSet<ProfileKey> = map
			.sources()
			.filter(|s| {
				followers
					.iter()
					.any(|(owner, previous, _)| *s != owner && s.is_descendant_of(previous))
			})
			.cloned()
			.collect();

		for (source, previous, target) in followers {
			map.insert(source.clone(), target.clone());
			record(log, Diagnostic::TargetRebased { source, previous, target });
			changed = true;
		}
		for previous in carried {
			let Some(source) = previous.rebase(&parent, &moved_to) else {
				continue;
			};
			if map.contains_source(&source) {
				continue;
			}
			let Some(target) = map.remove(&previous) else {
				continue;
			};
			map.insert(source.clone(), target.clone());
			record(log, Diagnostic::SourceRekeyed { previous, source, target });
		}
	}
	changed
}

pub(super) fn prune_stale_descendants(map: &mut RenameMap, log: &mut Vec<Diagnostic>) -> bool {
	let stale: Vec<ProfileKey> = map.sources().filter(|s| map.is_stale_source(s)).cloned().collect();
	let mut changed = false;
	for source in stale {
		if let Some(target) = map.remove(&source) {
			record(log, Diagnostic::StalePruned { source, target });
			changed = true;
		}
	}
	changed
}

/// Keeps one source per target: the shortest dotted text, then the
/// smallest key.
pub(super) fn resolve_conflicts(map: &mut RenameMap, log: &mut Vec<Diagnostic>) -> bool {
	let mut by_target: BTreeMap<&ProfileKey, Vec<&ProfileKey>> = BTreeMap::new();
	for (source, target) in map.iter() {
		by_target.entry(target).or_default().push(source);
	}

	let mut losers: Vec<(ProfileKey, ProfileKey, ProfileKey)> = Vec::new();
	for (target, sources) in by_target {
		if sources.len() < 2 {
			continue;
		}
		let Some(kept) = sources
			.iter()
			.copied()
			.min_by(|a, b| a.text_len().cmp(&b.text_len()).then_with(|| a.cmp(b)))
		else {
			continue;
		};
		for dropped in sources.into_iter().filter(|s| *s != kept) {
			losers.push((target.clone(), kept.clone(), dropped.clone()));
		}
	}

	let changed = !losers.is_empty();
	for (target, kept, dropped) in losers {
		map.remove(&dropped);
		record(log, Diagnostic::ConflictResolved { target, kept, dropped });
	}
	changed
}

fn drop_chain_leftovers(map: &mut RenameMap, log: &mut Vec<Diagnostic>) {
	let leftovers: Vec<(ProfileKey, ProfileKey)> = map
		.iter()
		.filter(|(s, t)| s != t && map.contains_source(t))
		.map(|(s, t)| (s.clone(), t.clone()))
		.collect();
	for (source, target) in leftovers {
		map.remove(&source);
		record(log, Diagnostic::ChainLeftoverDropped { source, target });
	}
}

fn break_loops(map: &mut RenameMap, log: &mut Vec<Diagnostic>) {
	let loops: Vec<Vec<ProfileKey>> = find_closed_loops(map).collect();
	for members in loops {
		for key in &members {
			map.remove(key);
		}
		warn!(members = ?members, "dropping closed rename loop");
		record(log, Diagnostic::LoopBroken { members });
	}
}

/// Removal-only cleanup run after the round loop, converged or not.
pub(super) fn settle(map: &mut RenameMap, log: &mut Vec<Diagnostic>) {
	drop_identities(map, log);
	resolve_conflicts(map, log);
	drop_chain_leftovers(map, log);
	break_loops(map, log);
	// Every pass that reports a change removed at least one entry.
	while prune_stale_descendants(map, log) {}
}
