use cfgedit_primitives::KeyError;
use thiserror::Error;

/// Errors surfaced at the rename store boundary.
///
/// Consolidation, resolution and rewriting never fail; only turning
/// caller-supplied text into keys can.
#[derive(Debug, Error)]
pub enum RenameError {
	/// A caller-supplied key failed to parse.
	#[error("invalid profile key: {0}")]
	InvalidKey(#[from] KeyError),
}

/// Result type for rename store operations.
pub type Result<T> = std::result::Result<T, RenameError>;
