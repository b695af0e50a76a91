//! Pending profile renames for a configuration editor.
//!
//! Renames are staged per document ([`Namespace`]) and kept as a
//! consolidated [`RenameMap`] until the document is saved. The map answers
//! name translation in both directions and rewrites pending change records
//! so that they land on the final names.

/// Rename subsystem configuration.
pub mod config;
/// Consolidation engine and its diagnostics.
pub mod consolidate;
/// Closed-loop detection.
pub mod cycles;
/// Boundary errors.
pub mod error;
/// The rename map and its invariants.
pub mod map;
/// Forward and reverse name translation.
pub mod resolve;
/// Change record and default pointer rewriting.
pub mod rewrite;
/// Per-namespace rename store.
pub mod session;

pub use cfgedit_primitives::{Namespace, ProfileKey};
pub use config::{ConfigError, RenameConfig};
pub use consolidate::{
	Consolidation, ConsolidationReport, Consolidator, Diagnostic, check_if_rename_cancels_out,
};
pub use cycles::{ClosedLoops, find_closed_loops};
pub use error::{RenameError, Result};
pub use map::{InvariantViolation, RenameMap};
pub use resolve::EffectiveNames;
pub use rewrite::{ChangeRecord, DefaultPointer, RenameExport, apply_renames, apply_renames_to_defaults};
pub use session::{RenameKind, RenameOutcome, RenameStore};
