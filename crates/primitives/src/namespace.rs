use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of one open document.
///
/// All rename state is scoped to a namespace; two namespaces never share
/// or influence each other's state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace(String);

impl Namespace {
	/// Creates a namespace from any string-like identifier.
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	/// Returns the identifier text.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for Namespace {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl AsRef<str> for Namespace {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

impl From<&str> for Namespace {
	fn from(id: &str) -> Self {
		Self(id.to_owned())
	}
}

impl From<String> for Namespace {
	fn from(id: String) -> Self {
		Self(id)
	}
}
