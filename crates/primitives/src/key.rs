//! Dot-delimited profile keys.
//!
//! A [`ProfileKey`] is an immutable, non-empty sequence of non-empty name
//! segments. All prefix and ancestry tests operate on whole segments, so
//! `ab` is never considered a prefix of `abc`.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

/// Separator between segments in the textual form of a key.
pub const SEPARATOR: char = '.';

/// A single name segment. Shared so that cloning a key never copies text.
pub type Segment = Arc<str>;

/// Errors produced when building a [`ProfileKey`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
	/// The key has no segments at all.
	#[error("profile key is empty")]
	Empty,
	/// One of the dot-separated segments is empty (`a..b`, `.a`, `a.`).
	#[error("profile key {input:?} has an empty segment at position {index}")]
	EmptySegment {
		/// The rejected input, as given.
		input: String,
		/// Zero-based segment position.
		index: usize,
	},
	/// A segment passed on its own contains the separator.
	#[error("segment {segment:?} contains the key separator")]
	SeparatorInSegment {
		/// The offending segment.
		segment: String,
	},
}

/// Path of a node in the hierarchical profile namespace.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProfileKey {
	segments: SmallVec<[Segment; 4]>,
}

impl ProfileKey {
	/// Parses the dotted textual form.
	pub fn parse(text: &str) -> Result<Self, KeyError> {
		if text.is_empty() {
			return Err(KeyError::Empty);
		}
		let mut segments = SmallVec::new();
		for (index, part) in text.split(SEPARATOR).enumerate() {
			if part.is_empty() {
				return Err(KeyError::EmptySegment {
					input: text.to_owned(),
					index,
				});
			}
			segments.push(Segment::from(part));
		}
		Ok(Self { segments })
	}

	/// Builds a key from individual segments.
	///
	/// Unlike [`ProfileKey::parse`], a segment containing the separator is
	/// rejected rather than split.
	pub fn from_segments<I, S>(parts: I) -> Result<Self, KeyError>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut segments: SmallVec<[Segment; 4]> = SmallVec::new();
		for (index, part) in parts.into_iter().enumerate() {
			let part = part.as_ref();
			if part.is_empty() {
				let mut input: Vec<String> = segments.iter().map(|s| s.to_string()).collect();
				input.push(String::new());
				return Err(KeyError::EmptySegment {
					input: input.join("."),
					index,
				});
			}
			if part.contains(SEPARATOR) {
				return Err(KeyError::SeparatorInSegment {
					segment: part.to_owned(),
				});
			}
			segments.push(Segment::from(part));
		}
		if segments.is_empty() {
			return Err(KeyError::Empty);
		}
		Ok(Self { segments })
	}

	fn from_validated(segments: SmallVec<[Segment; 4]>) -> Self {
		debug_assert!(!segments.is_empty());
		Self { segments }
	}

	/// Returns the segments in order.
	#[inline]
	pub fn segments(&self) -> &[Segment] {
		&self.segments
	}

	/// Number of segments. Always at least one.
	#[inline]
	pub fn depth(&self) -> usize {
		self.segments.len()
	}

	/// Length of the dotted textual form, without allocating it.
	pub fn text_len(&self) -> usize {
		let names: usize = self.segments.iter().map(|s| s.len()).sum();
		names + self.segments.len() - 1
	}

	/// The last segment.
	pub fn leaf(&self) -> &str {
		self.segments.last().map(|s| &**s).unwrap_or_default()
	}

	/// The enclosing key, or `None` for a top-level key.
	pub fn parent(&self) -> Option<ProfileKey> {
		if self.segments.len() < 2 {
			return None;
		}
		let segments = self.segments[..self.segments.len() - 1].iter().cloned().collect();
		Some(Self::from_validated(segments))
	}

	/// Returns true if `self` equals `prefix` or lies beneath it.
	pub fn starts_with(&self, prefix: &ProfileKey) -> bool {
		self.segments.len() >= prefix.segments.len() && self.segments[..prefix.segments.len()] == prefix.segments[..]
	}

	/// Returns true if `self` lies strictly beneath `ancestor`.
	pub fn is_descendant_of(&self, ancestor: &ProfileKey) -> bool {
		self.segments.len() > ancestor.segments.len() && self.starts_with(ancestor)
	}

	/// Segments below `ancestor`, if `self` lies strictly beneath it.
	pub fn suffix_after(&self, ancestor: &ProfileKey) -> Option<&[Segment]> {
		self.is_descendant_of(ancestor).then(|| &self.segments[ancestor.segments.len()..])
	}

	/// Appends `suffix` segments to this key.
	pub fn join(&self, suffix: &[Segment]) -> ProfileKey {
		let mut segments = self.segments.clone();
		segments.extend(suffix.iter().cloned());
		Self::from_validated(segments)
	}

	/// Moves this key from under `from` to under `to`.
	///
	/// Returns `to` when `self == from`, `to` plus the remaining segments
	/// when `self` lies beneath `from`, and `None` otherwise.
	pub fn rebase(&self, from: &ProfileKey, to: &ProfileKey) -> Option<ProfileKey> {
		if self == from {
			return Some(to.clone());
		}
		self.suffix_after(from).map(|suffix| to.join(suffix))
	}

	/// Returns true if the segments equal `parts` one by one.
	pub fn matches_parts<S: AsRef<str>>(&self, parts: &[S]) -> bool {
		self.segments.len() == parts.len() && self.segments.iter().zip(parts).all(|(seg, part)| &**seg == part.as_ref())
	}
}

impl fmt::Display for ProfileKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (idx, segment) in self.segments.iter().enumerate() {
			if idx > 0 {
				write!(f, "{SEPARATOR}")?;
			}
			f.write_str(segment)?;
		}
		Ok(())
	}
}

impl fmt::Debug for ProfileKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "ProfileKey({:?})", self.to_string())
	}
}

impl FromStr for ProfileKey {
	type Err = KeyError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

impl TryFrom<String> for ProfileKey {
	type Error = KeyError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::parse(&value)
	}
}

impl TryFrom<&str> for ProfileKey {
	type Error = KeyError;

	fn try_from(value: &str) -> Result<Self, Self::Error> {
		Self::parse(value)
	}
}

impl From<ProfileKey> for String {
	fn from(key: ProfileKey) -> Self {
		key.to_string()
	}
}
