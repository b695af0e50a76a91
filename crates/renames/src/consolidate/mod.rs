//! Rename consolidation.
//!
//! [`Consolidator::add_rename`] registers one rename request and then
//! restores every [`RenameMap`] invariant by running the passes in
//! [`passes`] to a bounded fixed point.
//!
//! # Round structure
//!
//! ```text
//! identities -> opposing pairs -> chains -> source-side propagation
//!            -> forward propagation -> stale pruning -> conflicts
//! ```
//!
//! Rounds repeat until none of the passes changes the map or the cap is
//! reached. A final settle step then removes whatever would still break an
//! invariant, so the returned map is always valid, converged or not.

use cfgedit_primitives::{Convergence, DEFAULT_ITERATION_CAP, ProfileKey, iterate_bounded};
use rustc_hash::FxHashSet;
use tracing::{trace, warn};

use crate::config::RenameConfig;
use crate::map::RenameMap;

mod passes;

/// One observable consolidation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
	/// A rename back to its own key removed the pending entry.
	Reverted {
		/// The key restored to its original name.
		source: ProfileKey,
		/// The target it had been heading for.
		previous: ProfileKey,
	},
	/// An entry mapping a key to itself was dropped.
	IdentityRemoved {
		/// The dropped key.
		key: ProfileKey,
	},
	/// `first -> second` and `second -> first` annihilated each other.
	Cancelled {
		/// Smaller key of the pair.
		first: ProfileKey,
		/// Larger key of the pair.
		second: ProfileKey,
	},
	/// `source -> via -> target` collapsed into `source -> target`.
	Chained {
		/// Start of the chain.
		source: ProfileKey,
		/// The intermediate key, no longer a source.
		via: ProfileKey,
		/// Final target.
		target: ProfileKey,
	},
	/// An entry keyed by an old ancestor name was moved under the
	/// ancestor's new name.
	SourceRekeyed {
		/// The former source key.
		previous: ProfileKey,
		/// The new source key.
		source: ProfileKey,
		/// The unchanged target.
		target: ProfileKey,
	},
	/// An entry's target followed a renamed ancestor.
	TargetRebased {
		/// The entry's source.
		source: ProfileKey,
		/// The target before the move.
		previous: ProfileKey,
		/// The target after the move.
		target: ProfileKey,
	},
	/// An entry orphaned by an ancestor's move was dropped.
	StalePruned {
		/// The dropped source.
		source: ProfileKey,
		/// Its target.
		target: ProfileKey,
	},
	/// Several sources converged on one target; only `kept` survives.
	ConflictResolved {
		/// The contested target.
		target: ProfileKey,
		/// The surviving source.
		kept: ProfileKey,
		/// A dropped source.
		dropped: ProfileKey,
	},
	/// An entry still pointing at another source after the rounds ended.
	ChainLeftoverDropped {
		/// The dropped source.
		source: ProfileKey,
		/// Its target, which is itself a source.
		target: ProfileKey,
	},
	/// A closed loop was broken by dropping all of its members.
	LoopBroken {
		/// Loop members in walk order.
		members: Vec<ProfileKey>,
	},
	/// The round cap was reached before a fixed point.
	ConvergenceExceeded {
		/// The cap in effect.
		cap: usize,
	},
}

/// What happened during one consolidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsolidationReport {
	/// How the round loop ended.
	pub convergence: Convergence,
	/// Every step, in the order it was taken.
	pub diagnostics: Vec<Diagnostic>,
}

impl ConsolidationReport {
	fn unchanged() -> Self {
		Self {
			convergence: Convergence::Settled { rounds: 0 },
			diagnostics: Vec::new(),
		}
	}

	/// Returns true if the round loop reached a fixed point within the cap.
	pub fn converged(&self) -> bool {
		self.convergence.is_settled()
	}

	/// `(target, kept, dropped)` for every resolved target conflict.
	pub fn conflicts(&self) -> impl Iterator<Item = (&ProfileKey, &ProfileKey, &ProfileKey)> {
		self.diagnostics.iter().filter_map(|diagnostic| match diagnostic {
			Diagnostic::ConflictResolved { target, kept, dropped } => Some((target, kept, dropped)),
			_ => None,
		})
	}
}

/// A consolidated map and the report of how it was reached.
#[derive(Debug, Clone)]
pub struct Consolidation {
	/// The invariant-respecting map.
	pub map: RenameMap,
	/// Steps taken to reach it.
	pub report: ConsolidationReport,
}

/// Rename consolidation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Consolidator {
	cap: usize,
}

impl Default for Consolidator {
	fn default() -> Self {
		Self::new(DEFAULT_ITERATION_CAP)
	}
}

struct Pending<'a> {
	map: RenameMap,
	log: Vec<Diagnostic>,
	latest: Option<&'a ProfileKey>,
}

fn round(state: &mut Pending<'_>) -> bool {
	let map = &mut state.map;
	let log = &mut state.log;
	let mut changed = passes::drop_identities(map, log);
	changed |= passes::cancel_opposing_pairs(map, log, state.latest);
	changed |= passes::compose_chains(map, log);
	changed |= passes::propagate_sources(map, log);
	changed |= passes::propagate_targets(map, log);
	changed |= passes::prune_stale_descendants(map, log);
	changed |= passes::resolve_conflicts(map, log);
	changed
}

impl Consolidator {
	/// Creates an engine running at most `cap` rounds per consolidation.
	pub fn new(cap: usize) -> Self {
		Self { cap }
	}

	/// Creates an engine using the configured iteration cap.
	pub fn from_config(config: &RenameConfig) -> Self {
		Self::new(config.iteration_cap)
	}

	/// The round cap.
	pub fn cap(&self) -> usize {
		self.cap
	}

	/// Registers "the node addressed as `original` should end up as `new`"
	/// and restores the map invariants.
	///
	/// A rename back to `original` itself only erases the pending entry for
	/// `original`; no passes run.
	pub fn add_rename(&self, mut map: RenameMap, original: &ProfileKey, new: &ProfileKey) -> Consolidation {
		if original == new {
			let mut report = ConsolidationReport::unchanged();
			if let Some(previous) = map.remove(original) {
				trace!(%original, %previous, "rename reverted to original key");
				report.diagnostics.push(Diagnostic::Reverted {
					source: original.clone(),
					previous,
				});
			}
			return Consolidation { map, report };
		}

		map.insert(original.clone(), new.clone());
		self.run(map, Some(original))
	}

	/// Restores the invariants of an arbitrary map.
	pub fn consolidate(&self, map: RenameMap) -> Consolidation {
		self.run(map, None)
	}

	fn run(&self, map: RenameMap, latest: Option<&ProfileKey>) -> Consolidation {
		let mut state = Pending {
			map,
			log: Vec::new(),
			latest,
		};

		let convergence = iterate_bounded(&mut state, self.cap, round);
		if let Convergence::Exhausted { cap } = convergence {
			warn!(cap, entries = state.map.len(), "rename consolidation hit the round cap; keeping best-effort map");
			state.log.push(Diagnostic::ConvergenceExceeded { cap });
		}

		passes::settle(&mut state.map, &mut state.log);
		debug_assert_eq!(state.map.check_invariants(), Ok(()));

		Consolidation {
			map: state.map,
			report: ConsolidationReport {
				convergence,
				diagnostics: state.log,
			},
		}
	}
}

/// Returns true if renaming `original` to `new` would only undo or restate
/// what `map` already implies.
///
/// That is the case when the keys are equal, when `new -> original` is
/// already pending, or when following the pending chain from `original`
/// already arrives at `new`.
pub fn check_if_rename_cancels_out(map: &RenameMap, original: &ProfileKey, new: &ProfileKey) -> bool {
	if original == new || map.get(new) == Some(original) {
		return true;
	}

	let mut visited: FxHashSet<&ProfileKey> = FxHashSet::default();
	let mut current = original;
	while let Some(next) = map.get(current) {
		if !visited.insert(current) {
			break;
		}
		current = next;
	}
	current == new
}
