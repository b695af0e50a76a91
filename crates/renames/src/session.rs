//! Per-namespace rename staging.
//!
//! [`RenameStore`] owns one [`RenameMap`] per open document and is the only
//! entry point the editor needs: stage requests, translate names, rewrite
//! pending changes, and hand the renames to persistence on save.

use cfgedit_primitives::{Namespace, ProfileKey};
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::config::RenameConfig;
use crate::consolidate::{Consolidation, ConsolidationReport, Consolidator, check_if_rename_cancels_out};
use crate::cycles::find_closed_loops;
use crate::error::Result;
use crate::map::RenameMap;
use crate::resolve::EffectiveNames;
use crate::rewrite::{ChangeRecord, DefaultPointer, RenameExport, apply_renames, apply_renames_to_defaults};

/// How a staged request was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameKind {
	/// A new pending rename was recorded.
	Staged,
	/// The request renamed a key to itself and erased its pending entry.
	Reverted,
	/// The request undid or restated what was already pending.
	CancelledByHistory,
}

/// Result of staging one rename request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameOutcome {
	/// Classification of the request.
	pub kind: RenameKind,
	/// What consolidation did.
	pub report: ConsolidationReport,
}

/// Owner of every namespace's pending renames.
#[derive(Debug)]
pub struct RenameStore {
	maps: FxHashMap<Namespace, RenameMap>,
	config: RenameConfig,
	consolidator: Consolidator,
}

impl Default for RenameStore {
	fn default() -> Self {
		Self::new(RenameConfig::default())
	}
}

fn export(namespace: &Namespace, map: &RenameMap) -> Vec<RenameExport> {
	map.application_order()
		.into_iter()
		.map(|(source, target)| RenameExport {
			original_key: source.clone(),
			new_key: target.clone(),
			namespace: namespace.clone(),
		})
		.collect()
}

impl RenameStore {
	/// Creates an empty store.
	pub fn new(config: RenameConfig) -> Self {
		Self {
			maps: FxHashMap::default(),
			consolidator: Consolidator::from_config(&config),
			config,
		}
	}

	/// The configuration the store was built with.
	pub fn config(&self) -> &RenameConfig {
		&self.config
	}

	/// Returns true if no namespace has pending renames.
	pub fn is_empty(&self) -> bool {
		self.maps.is_empty()
	}

	/// Parses both keys and stages the rename.
	pub fn add_rename(&mut self, namespace: &Namespace, original: &str, new: &str) -> Result<RenameOutcome> {
		let original = ProfileKey::parse(original)?;
		let new = ProfileKey::parse(new)?;
		Ok(self.stage(namespace, &original, &new))
	}

	/// Stages "the node displayed as `original` should end up as `new`".
	pub fn stage(&mut self, namespace: &Namespace, original: &ProfileKey, new: &ProfileKey) -> RenameOutcome {
		let current = self.maps.remove(namespace).unwrap_or_default();
		let kind = if original == new {
			RenameKind::Reverted
		} else if check_if_rename_cancels_out(&current, original, new) {
			RenameKind::CancelledByHistory
		} else {
			RenameKind::Staged
		};

		let Consolidation { mut map, report } = self.consolidator.add_rename(current, original, new);

		let loops: Vec<Vec<ProfileKey>> = find_closed_loops(&map).collect();
		for members in loops {
			warn!(%namespace, members = ?members, "dropping closed rename loop");
			for key in &members {
				map.remove(key);
			}
		}

		debug!(%namespace, %original, %new, ?kind, entries = map.len(), "staged rename");
		if !map.is_empty() {
			self.maps.insert(namespace.clone(), map);
		}
		RenameOutcome { kind, report }
	}

	/// Stages a rename and reports where `selected` is displayed afterwards.
	///
	/// `selected` is translated back to original naming through the map as
	/// it was, then forward through the updated map.
	pub fn stage_with_selection(
		&mut self,
		namespace: &Namespace,
		original: &ProfileKey,
		new: &ProfileKey,
		selected: &ProfileKey,
	) -> (RenameOutcome, ProfileKey) {
		let selected_original = self.resolve_reverse(namespace, selected);
		let outcome = self.stage(namespace, original, new);
		let selected = self.resolve_forward(namespace, &selected_original);
		(outcome, selected)
	}

	/// Snapshot of a namespace's map; empty if nothing is pending.
	pub fn consolidated_map(&self, namespace: &Namespace) -> RenameMap {
		self.maps.get(namespace).cloned().unwrap_or_default()
	}

	/// The namespace's map, if any rename is pending there.
	pub fn map(&self, namespace: &Namespace) -> Option<&RenameMap> {
		self.maps.get(namespace)
	}

	fn names(&self, namespace: &Namespace) -> Option<EffectiveNames<'_>> {
		self.maps
			.get(namespace)
			.map(|map| EffectiveNames::new(map, self.config.iteration_cap))
	}

	/// Display name of `key`, given in original naming.
	pub fn resolve_forward(&self, namespace: &Namespace, key: &ProfileKey) -> ProfileKey {
		self.names(namespace).map_or_else(|| key.clone(), |names| names.forward(key))
	}

	/// Original name of the node displayed as `key`.
	pub fn resolve_reverse(&self, namespace: &Namespace, key: &ProfileKey) -> ProfileKey {
		self.names(namespace).map_or_else(|| key.clone(), |names| names.reverse(key))
	}

	/// Returns true if `key` is the target of a pending rename.
	pub fn has_pending_rename(&self, namespace: &Namespace, key: &ProfileKey) -> bool {
		self.names(namespace).is_some_and(|names| names.is_rename_target(key))
	}

	/// Returns true if `entry_key`, in original naming, denotes the node
	/// displayed as `displayed`.
	pub fn refers_to(&self, namespace: &Namespace, entry_key: &ProfileKey, displayed: &ProfileKey) -> bool {
		self.names(namespace)
			.map_or_else(|| entry_key == displayed, |names| names.refers_to(entry_key, displayed))
	}

	/// Rewrites `records` onto the namespace's final names.
	pub fn apply_to_change_records(&self, namespace: &Namespace, records: &mut [ChangeRecord]) {
		apply_renames(records, &self.exports(namespace), &self.config);
	}

	/// Rewrites default pointers onto the namespace's final names.
	pub fn apply_to_defaults(&self, namespace: &Namespace, defaults: &mut [DefaultPointer]) {
		apply_renames_to_defaults(defaults, &self.exports(namespace), &self.config);
	}

	/// The namespace's renames in application order, without clearing.
	pub fn exports(&self, namespace: &Namespace) -> Vec<RenameExport> {
		self.maps
			.get(namespace)
			.map(|map| export(namespace, map))
			.unwrap_or_default()
	}

	/// Every namespace's renames, grouped by namespace in sorted order.
	pub fn pending_exports(&self) -> Vec<RenameExport> {
		let mut namespaces: Vec<&Namespace> = self.maps.keys().collect();
		namespaces.sort();
		namespaces.into_iter().flat_map(|namespace| self.exports(namespace)).collect()
	}

	/// Exports and clears the namespace's renames.
	pub fn commit(&mut self, namespace: &Namespace) -> Vec<RenameExport> {
		let Some(map) = self.maps.remove(namespace) else {
			return Vec::new();
		};
		let exported = export(namespace, &map);
		debug!(%namespace, renames = exported.len(), "committed renames");
		exported
	}

	/// Exports and clears every namespace.
	pub fn commit_all(&mut self) -> Vec<RenameExport> {
		let mut drained: Vec<(Namespace, RenameMap)> = self.maps.drain().collect();
		drained.sort_by(|(a, _), (b, _)| a.cmp(b));
		let exported: Vec<RenameExport> = drained.iter().flat_map(|(namespace, map)| export(namespace, map)).collect();
		debug!(renames = exported.len(), "committed all renames");
		exported
	}

	/// Drops the namespace's renames. Returns true if any were pending.
	pub fn discard(&mut self, namespace: &Namespace) -> bool {
		let discarded = self.maps.remove(namespace).is_some();
		if discarded {
			debug!(%namespace, "discarded renames");
		}
		discarded
	}

	/// Drops every namespace's renames.
	pub fn discard_all(&mut self) {
		debug!(namespaces = self.maps.len(), "discarded all renames");
		self.maps.clear();
	}
}

#[cfg(test)]
mod tests;
