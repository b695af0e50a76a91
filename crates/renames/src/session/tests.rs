use cfgedit_primitives::{Namespace, ProfileKey};
use pretty_assertions::assert_eq;

use super::{RenameKind, RenameStore};
use crate::config::RenameConfig;
use crate::error::RenameError;
use crate::rewrite::{ChangeRecord, RenameExport};

fn key(text: &str) -> ProfileKey {
	ProfileKey::parse(text).unwrap()
}

fn ns(id: &str) -> Namespace {
	Namespace::new(id)
}

fn export(namespace: &str, original: &str, new: &str) -> RenameExport {
	RenameExport {
		original_key: key(original),
		new_key: key(new),
		namespace: ns(namespace),
	}
}

#[test]
fn chained_renames_resolve_and_rewrite() {
	let c = ns("/c");
	let mut store = RenameStore::default();
	store.add_rename(&c, "a", "b").unwrap();
	store.add_rename(&c, "b", "c").unwrap();

	assert_eq!(store.resolve_forward(&c, &key("a")), key("c"));
	assert_eq!(store.resolve_reverse(&c, &key("c")), key("a"));

	let mut records = vec![ChangeRecord {
		namespace: c.clone(),
		profile: Some(key("a")),
		key: "profiles.a.properties.host".to_string(),
		path: vec!["profiles".into(), "a".into(), "properties".into(), "host".into()],
		value: None,
	}];
	store.apply_to_change_records(&c, &mut records);
	assert_eq!(records[0].profile, Some(key("c")));
	assert_eq!(records[0].key, "profiles.c.properties.host");
	assert_eq!(records[0].path, vec!["profiles", "c", "properties", "host"]);
}

#[test]
fn requests_are_classified() {
	let c = ns("/c");
	let mut store = RenameStore::default();
	assert_eq!(store.add_rename(&c, "a", "b").unwrap().kind, RenameKind::Staged);
	assert_eq!(store.add_rename(&c, "b", "a").unwrap().kind, RenameKind::CancelledByHistory);
	assert!(store.map(&c).is_none());

	store.add_rename(&c, "x", "y").unwrap();
	assert_eq!(store.add_rename(&c, "x", "x").unwrap().kind, RenameKind::Reverted);
	assert!(store.is_empty());
}

#[test]
fn malformed_keys_are_rejected() {
	let mut store = RenameStore::default();
	let err = store.add_rename(&ns("/c"), "a..b", "c").unwrap_err();
	assert!(matches!(err, RenameError::InvalidKey(_)));
	assert!(store.is_empty());
}

#[test]
fn namespaces_are_independent() {
	let (c, d) = (ns("/c"), ns("/d"));
	let mut store = RenameStore::default();
	store.add_rename(&c, "a", "b").unwrap();
	store.add_rename(&d, "a", "z").unwrap();

	assert_eq!(store.resolve_forward(&c, &key("a")), key("b"));
	assert_eq!(store.resolve_forward(&d, &key("a")), key("z"));
	assert!(store.has_pending_rename(&c, &key("b")));
	assert!(!store.has_pending_rename(&d, &key("b")));

	assert!(store.discard(&c));
	assert!(store.map(&c).is_none());
	assert_eq!(store.exports(&d), vec![export("/d", "a", "z")]);
}

#[test]
fn absent_namespace_is_identity() {
	let store = RenameStore::default();
	let c = ns("/c");
	assert_eq!(store.resolve_forward(&c, &key("a.b")), key("a.b"));
	assert_eq!(store.resolve_reverse(&c, &key("a.b")), key("a.b"));
	assert!(!store.has_pending_rename(&c, &key("a")));
	assert!(store.refers_to(&c, &key("a"), &key("a")));
	assert!(store.consolidated_map(&c).is_empty());
	assert!(store.exports(&c).is_empty());
}

#[test]
fn commit_exports_in_application_order_then_clears() {
	let c = ns("/c");
	let mut store = RenameStore::default();
	store.add_rename(&c, "a.b", "a.c").unwrap();
	store.add_rename(&c, "a", "x").unwrap();

	let expected = vec![export("/c", "a", "x"), export("/c", "x.b", "x.c")];
	assert_eq!(store.pending_exports(), expected);
	assert_eq!(store.commit(&c), expected);
	assert!(store.is_empty());
	assert!(store.commit(&c).is_empty());
}

#[test]
fn commit_all_groups_by_namespace() {
	let mut store = RenameStore::default();
	store.add_rename(&ns("/d"), "p", "q").unwrap();
	store.add_rename(&ns("/c"), "a", "b").unwrap();
	assert_eq!(store.commit_all(), vec![export("/c", "a", "b"), export("/d", "p", "q")]);
	assert!(store.is_empty());
}

#[test]
fn discard_all_clears_without_export() {
	let mut store = RenameStore::default();
	store.add_rename(&ns("/c"), "a", "b").unwrap();
	store.add_rename(&ns("/d"), "a", "b").unwrap();
	store.discard_all();
	assert!(store.is_empty());
	assert!(store.pending_exports().is_empty());
	assert!(!store.discard(&ns("/c")));
}

#[test]
fn selection_follows_the_renamed_node() {
	let c = ns("/c");
	let mut store = RenameStore::default();

	let (_, selected) = store.stage_with_selection(&c, &key("a"), &key("x"), &key("a"));
	assert_eq!(selected, key("x"));

	let (_, selected) = store.stage_with_selection(&c, &key("x.b"), &key("x.c"), &key("x.b"));
	assert_eq!(selected, key("x.c"));

	let (_, selected) = store.stage_with_selection(&c, &key("q"), &key("r"), &key("x.c.d"));
	assert_eq!(selected, key("x.c.d"));

	let (outcome, selected) = store.stage_with_selection(&c, &key("x"), &key("a"), &key("x.c"));
	assert_eq!(outcome.kind, RenameKind::CancelledByHistory);
	assert_eq!(selected, key("a.c"));
}

#[test]
fn refers_to_matches_original_entries_to_display_names() {
	let c = ns("/c");
	let mut store = RenameStore::default();
	store.add_rename(&c, "a", "x").unwrap();
	assert!(store.refers_to(&c, &key("a.b"), &key("x.b")));
	assert!(!store.refers_to(&c, &key("a.b"), &key("a.c")));
}

#[test]
fn configured_cap_reaches_the_engine() {
	let config = RenameConfig::from_toml("iteration_cap = 1").unwrap();
	let c = ns("/c");
	let mut store = RenameStore::new(config);
	store.add_rename(&c, "a.b", "a.c").unwrap();
	let outcome = store.add_rename(&c, "a", "x").unwrap();
	assert!(!outcome.report.converged());
	assert_eq!(store.map(&c).map(|map| map.check_invariants()), Some(Ok(())));
}
