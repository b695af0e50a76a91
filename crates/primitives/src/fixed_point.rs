//! Bounded fixed-point iteration.
//!
//! Every "repeat until nothing changes" loop in the rename subsystem runs
//! through [`iterate_bounded`], so all of them share one termination rule:
//! a hard round cap, with exhaustion reported as a value instead of an
//! error.

/// Round cap used when no configuration overrides it.
pub const DEFAULT_ITERATION_CAP: usize = 10;

/// How a bounded iteration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convergence {
	/// The step reported no change on round `rounds`.
	Settled {
		/// Rounds executed, including the final unchanged one.
		rounds: usize,
	},
	/// Every one of the `cap` rounds still changed the state.
	Exhausted {
		/// The cap that was hit.
		cap: usize,
	},
}

impl Convergence {
	/// Returns true if a fixed point was reached within the cap.
	#[inline]
	pub fn is_settled(&self) -> bool {
		matches!(self, Convergence::Settled { .. })
	}

	/// Number of rounds executed.
	pub fn rounds(&self) -> usize {
		match *self {
			Convergence::Settled { rounds } => rounds,
			Convergence::Exhausted { cap } => cap,
		}
	}
}

/// Applies `step` to `state` until it returns `false` or `cap` rounds ran.
///
/// `step` returns whether it changed the state. A cap of zero runs nothing
/// and reports exhaustion.
pub fn iterate_bounded<S, F>(state: &mut S, cap: usize, mut step: F) -> Convergence
where
	F: FnMut(&mut S) -> bool,
{
	for round in 1..=cap {
		if !step(state) {
			return Convergence::Settled { rounds: round };
		}
	}
	Convergence::Exhausted { cap }
}

#[cfg(test)]
mod tests;
