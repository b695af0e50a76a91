//! Effective-name resolution.
//!
//! Translates between the original naming used by the on-disk document and
//! the display naming produced by the pending renames of one namespace.

use cfgedit_primitives::{ProfileKey, iterate_bounded};
use tracing::warn;

use crate::map::RenameMap;

type Rule<'a> = (&'a ProfileKey, &'a ProfileKey);

/// Forward and reverse name translation over one [`RenameMap`].
#[derive(Debug, Clone)]
pub struct EffectiveNames<'a> {
	map: &'a RenameMap,
	forward_rules: Vec<Rule<'a>>,
	reverse_rules: Vec<Rule<'a>>,
	cap: usize,
}

impl<'a> EffectiveNames<'a> {
	/// Prepares both rule orders for `map`. Every translation runs at most
	/// `cap` substitutions.
	pub fn new(map: &'a RenameMap, cap: usize) -> Self {
		let forward_rules = map.application_order();

		let mut reverse_rules: Vec<(usize, Rule<'a>)> = forward_rules.iter().copied().enumerate().collect();
		reverse_rules.sort_by(|(ia, (_, ta)), (ib, (_, tb))| {
			tb.depth()
				.cmp(&ta.depth())
				.then_with(|| tb.text_len().cmp(&ta.text_len()))
				.then_with(|| ib.cmp(ia))
		});

		Self {
			map,
			forward_rules,
			reverse_rules: reverse_rules.into_iter().map(|(_, rule)| rule).collect(),
			cap,
		}
	}

	/// Display name of the node addressed as `key` in original naming.
	pub fn forward(&self, key: &ProfileKey) -> ProfileKey {
		substitute(key, &self.forward_rules, self.cap, |(source, target)| (source, target))
	}

	/// Original name of the node displayed as `key`.
	///
	/// This is what computations over the original document structure must
	/// be queried with.
	pub fn reverse(&self, key: &ProfileKey) -> ProfileKey {
		substitute(key, &self.reverse_rules, self.cap, |(source, target)| (target, source))
	}

	/// Returns true if `key` is the target of a pending rename.
	pub fn is_rename_target(&self, key: &ProfileKey) -> bool {
		self.map.has_target(key)
	}

	/// Returns true if `entry_key`, in original naming, and `displayed`
	/// denote the same node.
	pub fn refers_to(&self, entry_key: &ProfileKey, displayed: &ProfileKey) -> bool {
		self.forward(entry_key) == *displayed || *entry_key == self.reverse(displayed)
	}
}

/// Rewrites `key` with the first unused matching rule until none matches.
/// `orient` picks which side of a rule is matched and which replaces it.
fn substitute<'a>(
	key: &ProfileKey,
	rules: &[Rule<'a>],
	cap: usize,
	orient: impl Fn(Rule<'a>) -> (&'a ProfileKey, &'a ProfileKey),
) -> ProfileKey {
	let mut current = key.clone();
	let mut used = vec![false; rules.len()];

	let convergence = iterate_bounded(&mut current, cap, |current| {
		let hit = rules.iter().enumerate().find_map(|(idx, rule)| {
			if used[idx] {
				return None;
			}
			let (from, to) = orient(*rule);
			current.rebase(from, to).map(|moved| (idx, moved))
		});
		match hit {
			Some((idx, moved)) => {
				used[idx] = true;
				*current = moved;
				true
			}
			None => false,
		}
	});

	if !convergence.is_settled() {
		warn!(%key, cap, "name resolution hit the substitution cap");
	}
	current
}
