//! Profile sub-paths inside flattened change keys and path arrays.
//!
//! A nested profile `a.b` appears in a flattened key as
//! `profiles.a.profiles.b.properties.host`: every profile segment is
//! preceded by the container marker. Path arrays carry the same profile
//! either plainly (`["profiles", "a", "b", ...]`) or marker-interleaved
//! (`["profiles", "a", "profiles", "b", ...]`).

use cfgedit_primitives::{ProfileKey, SEPARATOR};

/// A flattened key split into its leading profile run and the remainder.
pub(super) struct DecodedKey<'k> {
	pub(super) profile: ProfileKey,
	rest: Vec<&'k str>,
}

/// Decodes the leading run of `marker.segment` pairs.
///
/// Returns `None` when the key has no profile sub-path.
pub(super) fn decode_key<'k>(key: &'k str, marker: &str) -> Option<DecodedKey<'k>> {
	let parts: Vec<&str> = key.split(SEPARATOR).collect();
	let mut segments: Vec<&str> = Vec::new();
	let mut idx = 0;
	while idx + 1 < parts.len() && parts[idx] == marker {
		segments.push(parts[idx + 1]);
		idx += 2;
	}
	if segments.is_empty() {
		return None;
	}
	let profile = ProfileKey::from_segments(&segments).ok()?;
	Some(DecodedKey {
		profile,
		rest: parts[idx..].to_vec(),
	})
}

impl DecodedKey<'_> {
	/// Re-encodes the (possibly replaced) profile, keeping the remainder
	/// verbatim.
	pub(super) fn encode(&self, marker: &str) -> String {
		let mut out = String::new();
		let profile = self.profile.segments().iter().flat_map(|segment| [marker, &**segment]);
		for part in profile.chain(self.rest.iter().copied()) {
			if !out.is_empty() {
				out.push(SEPARATOR);
			}
			out.push_str(part);
		}
		out
	}
}

/// How a profile run is laid out inside a path array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Layout {
	/// `a, b, c`
	Plain,
	/// `a, marker, b, marker, c`
	Interleaved,
}

impl Layout {
	pub(super) const ALL: [Layout; 2] = [Layout::Plain, Layout::Interleaved];

	fn run_len(self, key: &ProfileKey) -> usize {
		match self {
			Layout::Plain => key.depth(),
			Layout::Interleaved => key.depth() * 2 - 1,
		}
	}
}

/// Index where the profile run of a path begins: after a leading marker
/// element if there is one.
pub(super) fn profile_start(path: &[String], marker: &str) -> usize {
	usize::from(path.first().is_some_and(|first| first == marker))
}

/// Length of the run at `start` spelling `key` in `layout`, if it does.
pub(super) fn match_at(path: &[String], start: usize, key: &ProfileKey, layout: Layout, marker: &str) -> Option<usize> {
	let len = layout.run_len(key);
	let run = path.get(start..start + len)?;
	let matched = match layout {
		Layout::Plain => key.matches_parts(run),
		Layout::Interleaved => {
			run.iter().step_by(2).zip(key.segments()).all(|(part, segment)| part.as_str() == &**segment)
				&& run.iter().skip(1).step_by(2).all(|part| part == marker)
		}
	};
	matched.then_some(len)
}

/// Replaces the `matched` elements at `start` with `key` in `layout`.
pub(super) fn splice(
	path: &[String],
	start: usize,
	matched: usize,
	key: &ProfileKey,
	layout: Layout,
	marker: &str,
) -> Vec<String> {
	let mut out: Vec<String> = path[..start].to_vec();
	for (idx, segment) in key.segments().iter().enumerate() {
		if idx > 0 && layout == Layout::Interleaved {
			out.push(marker.to_owned());
		}
		out.push(segment.to_string());
	}
	out.extend_from_slice(&path[start + matched..]);
	out
}
