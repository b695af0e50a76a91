//! Rename subsystem configuration.

use cfgedit_primitives::{DEFAULT_ITERATION_CAP, SEPARATOR};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading a [`RenameConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error parsing TOML syntax or shape.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// The iteration cap must allow at least one round.
	#[error("iteration_cap must be at least 1")]
	ZeroIterationCap,

	/// The container marker must be a single non-empty key segment.
	#[error("invalid container marker {0:?} (expected a single non-empty segment)")]
	InvalidMarker(String),
}

/// Tunables for consolidation, resolution and path rewriting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenameConfig {
	/// Round cap for every fixed-point loop.
	pub iteration_cap: usize,
	/// Literal segment placed before each profile segment in flattened
	/// change keys (`profiles.a.profiles.b.properties.host`).
	pub container_marker: String,
}

impl Default for RenameConfig {
	fn default() -> Self {
		Self {
			iteration_cap: DEFAULT_ITERATION_CAP,
			container_marker: "profiles".to_string(),
		}
	}
}

impl RenameConfig {
	/// Parses and validates a TOML document. Missing fields take defaults.
	pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(text)?;
		config.validate()?;
		Ok(config)
	}

	/// Checks the values that serde cannot express.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.iteration_cap == 0 {
			return Err(ConfigError::ZeroIterationCap);
		}
		if self.container_marker.is_empty() || self.container_marker.contains(SEPARATOR) {
			return Err(ConfigError::InvalidMarker(self.container_marker.clone()));
		}
		Ok(())
	}
}
