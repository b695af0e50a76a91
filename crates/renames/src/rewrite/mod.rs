//! Rewriting of staged change records and default pointers.
//!
//! Change records are captured against whatever naming was current when
//! they were made. Before they are written out, every record's `profile`,
//! `key` and `path` are moved onto the final names, so that all three keep
//! describing the same profile.

use cfgedit_primitives::{Namespace, ProfileKey, iterate_bounded};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::config::RenameConfig;

mod flat_key;

use flat_key::{Layout, decode_key, match_at, profile_start, splice};

/// One rename as handed to persistence: `original_key` becomes `new_key`
/// in `namespace`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameExport {
	/// Key in the saved document.
	pub original_key: ProfileKey,
	/// Key after the rename.
	pub new_key: ProfileKey,
	/// Document the rename belongs to.
	pub namespace: Namespace,
}

/// A pending edit to one configuration value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
	/// Document the edit applies to.
	pub namespace: Namespace,
	/// Profile the edit belongs to, if it targets one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub profile: Option<ProfileKey>,
	/// Flattened key, e.g. `profiles.a.profiles.b.properties.host`.
	pub key: String,
	/// Path of the value inside the document.
	#[serde(default)]
	pub path: Vec<String>,
	/// New value; `None` for deletions.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub value: Option<serde_json::Value>,
}

/// A default-profile selection: `profile_type` defaults to `profile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultPointer {
	/// Document the pointer lives in.
	pub namespace: Namespace,
	/// Profile type the default is chosen for.
	pub profile_type: String,
	/// The selected profile.
	pub profile: ProfileKey,
}

fn rules_for<'r>(renames: &'r [RenameExport], namespace: &Namespace) -> Vec<&'r RenameExport> {
	renames.iter().filter(|rule| rule.namespace == *namespace).collect()
}

/// Applies each rule at most once to `value`, restarting from the first rule
/// after every hit.
fn apply_each_once<T>(
	value: &mut T,
	rules: &[&RenameExport],
	cap: usize,
	mut apply: impl FnMut(&mut T, &RenameExport) -> bool,
) -> bool {
	let mut used = vec![false; rules.len()];
	let mut changed = false;
	let convergence = iterate_bounded(value, cap, |value| {
		for (idx, rule) in rules.iter().enumerate() {
			if !used[idx] && apply(&mut *value, *rule) {
				used[idx] = true;
				changed = true;
				return true;
			}
		}
		false
	});
	if !convergence.is_settled() {
		warn!(cap, "rename rewrite hit the substitution cap");
	}
	changed
}

fn rename_profile(profile: &mut ProfileKey, rule: &RenameExport) -> bool {
	if *profile == rule.new_key {
		return false;
	}
	match profile.rebase(&rule.original_key, &rule.new_key) {
		Some(moved) => {
			*profile = moved;
			true
		}
		None => false,
	}
}

fn rename_path(path: &mut Vec<String>, rule: &RenameExport, marker: &str) -> bool {
	let start = profile_start(path, marker);
	for layout in Layout::ALL {
		let Some(matched) = match_at(path, start, &rule.original_key, layout, marker) else {
			continue;
		};
		if match_at(path, start, &rule.new_key, layout, marker).is_some() {
			return false;
		}
		*path = splice(path, start, matched, &rule.new_key, layout, marker);
		return true;
	}
	false
}

fn rewrite_record(record: &mut ChangeRecord, rules: &[&RenameExport], config: &RenameConfig) {
	let cap = config.iteration_cap;
	let marker = config.container_marker.as_str();

	if let Some(profile) = record.profile.as_mut() {
		let before = profile.clone();
		if apply_each_once(&mut *profile, rules, cap, rename_profile) {
			trace!(from = %before, to = %profile, "rewrote change profile");
		}
	}

	let encoded = decode_key(&record.key, marker).and_then(|mut decoded| {
		apply_each_once(&mut decoded.profile, rules, cap, rename_profile).then(|| decoded.encode(marker))
	});
	if let Some(key) = encoded {
		trace!(from = %record.key, to = %key, "rewrote change key");
		record.key = key;
	}

	if apply_each_once(&mut record.path, rules, cap, |path, rule| rename_path(path, rule, marker)) {
		trace!(path = ?record.path, "rewrote change path");
	}
}

/// Moves every record onto final names using the renames of its own
/// namespace. `renames` should be in application order.
pub fn apply_renames(records: &mut [ChangeRecord], renames: &[RenameExport], config: &RenameConfig) {
	if renames.is_empty() {
		return;
	}
	for record in records.iter_mut() {
		let rules = rules_for(renames, &record.namespace);
		if !rules.is_empty() {
			rewrite_record(record, &rules, config);
		}
	}
}

/// Moves default pointers onto final names.
pub fn apply_renames_to_defaults(defaults: &mut [DefaultPointer], renames: &[RenameExport], config: &RenameConfig) {
	for pointer in defaults.iter_mut() {
		let rules = rules_for(renames, &pointer.namespace);
		if rules.is_empty() {
			continue;
		}
		let before = pointer.profile.clone();
		if apply_each_once(&mut pointer.profile, &rules, config.iteration_cap, rename_profile) {
			trace!(profile_type = %pointer.profile_type, from = %before, to = %pointer.profile, "rewrote default pointer");
		}
	}
}
