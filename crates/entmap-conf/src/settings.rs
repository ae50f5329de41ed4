//! Metadata pipeline settings
//!
//! [`MetadataSettings`] is the typed record consumed by the metadata
//! processor. Use [`builder::SettingsBuilder`] to assemble it from layered
//! [`sources`], or [`MetadataSettings::load`] for the standard layering.

pub mod builder;
pub mod sources;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use builder::SettingsBuilder;
use sources::{EnvSource, FileSource, SourceError};

/// Prefix of the environment variables read by [`MetadataSettings::load`]
pub const ENV_PREFIX: &str = "ENTMAP_";

/// How entity attributes are reached at runtime
///
/// # Examples
///
/// ```
/// use entmap_conf::AccessType;
///
/// assert_eq!(AccessType::default(), AccessType::Field);
/// assert_eq!(AccessType::Property.to_string(), "property");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessType {
	/// Direct field access
	#[default]
	Field,
	/// Getter/setter method access
	Property,
}

impl fmt::Display for AccessType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			AccessType::Field => write!(f, "field"),
			AccessType::Property => write!(f, "property"),
		}
	}
}

/// What to do when the inheritance hierarchy contains a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePolicy {
	/// Abort the metadata build with an error
	#[default]
	Reject,
	/// Log a warning and keep going
	Permit,
}

/// How two composite key class names are judged compatible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyCompatibilityPolicy {
	/// Only identical class names are compatible
	Nominal,
	/// Identical names, or registered key classes with the same fields
	#[default]
	Structural,
}

/// Settings of one metadata build
///
/// Every field has a default, so partial sources deserialize cleanly.
///
/// # Examples
///
/// ```
/// use entmap_conf::{CyclePolicy, MetadataSettings};
///
/// let settings = MetadataSettings::default();
/// assert!(!settings.weaving_enabled);
/// assert_eq!(settings.hierarchy_cycle_policy, CyclePolicy::Reject);
/// assert_eq!(settings.log_level, "info");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataSettings {
	/// Whether entity classes are enhanced for lazy loading at load time
	pub weaving_enabled: bool,
	/// Handling of cyclic inheritance declarations
	pub hierarchy_cycle_policy: CyclePolicy,
	/// Composite key class compatibility check used for derived ids
	pub key_compatibility: KeyCompatibilityPolicy,
	/// Access type of entities that do not declare one
	pub default_access: AccessType,
	/// Persistence-unit default: cascade persist on every relationship
	pub default_cascade_persist: bool,
	/// Default log filter used by the command-line tool
	pub log_level: String,
}

impl Default for MetadataSettings {
	fn default() -> Self {
		Self {
			weaving_enabled: false,
			hierarchy_cycle_policy: CyclePolicy::default(),
			key_compatibility: KeyCompatibilityPolicy::default(),
			default_access: AccessType::default(),
			default_cascade_persist: false,
			log_level: "info".to_string(),
		}
	}
}

impl MetadataSettings {
	/// Load settings with the standard layering: defaults, then the optional
	/// settings file (TOML or JSON, by extension), then `ENTMAP_*`
	/// environment variables.
	pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
		let mut builder = SettingsBuilder::new();
		if let Some(path) = path {
			if !path.exists() {
				return Err(SettingsError::FileNotFound(path.display().to_string()));
			}
			builder = builder.add_source(FileSource::from_path(path)?);
		}
		builder
			.add_source(EnvSource::new(ENV_PREFIX))
			.build()
	}

	/// Enable or disable load-time weaving
	pub fn with_weaving(mut self, enabled: bool) -> Self {
		self.weaving_enabled = enabled;
		self
	}

	/// Set the inheritance cycle policy
	pub fn with_cycle_policy(mut self, policy: CyclePolicy) -> Self {
		self.hierarchy_cycle_policy = policy;
		self
	}

	/// Set the composite key compatibility policy
	pub fn with_key_compatibility(mut self, policy: KeyCompatibilityPolicy) -> Self {
		self.key_compatibility = policy;
		self
	}

	/// Set the default access type
	pub fn with_default_access(mut self, access: AccessType) -> Self {
		self.default_access = access;
		self
	}

	/// Enable or disable the cascade-persist default
	pub fn with_default_cascade_persist(mut self, enabled: bool) -> Self {
		self.default_cascade_persist = enabled;
		self
	}
}

/// Settings error
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	#[error("Settings file not found: {0}")]
	FileNotFound(String),

	#[error("Source error: {0}")]
	Source(#[from] SourceError),

	#[error("Invalid settings: {0}")]
	Invalid(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::io::Write;

	#[rstest]
	fn test_default_settings() {
		let settings = MetadataSettings::default();
		assert!(!settings.weaving_enabled);
		assert!(!settings.default_cascade_persist);
		assert_eq!(settings.key_compatibility, KeyCompatibilityPolicy::Structural);
		assert_eq!(settings.default_access, AccessType::Field);
	}

	#[rstest]
	fn test_builder_methods() {
		let settings = MetadataSettings::default()
			.with_weaving(true)
			.with_cycle_policy(CyclePolicy::Permit)
			.with_key_compatibility(KeyCompatibilityPolicy::Nominal)
			.with_default_access(AccessType::Property)
			.with_default_cascade_persist(true);

		assert!(settings.weaving_enabled);
		assert_eq!(settings.hierarchy_cycle_policy, CyclePolicy::Permit);
		assert_eq!(settings.key_compatibility, KeyCompatibilityPolicy::Nominal);
		assert_eq!(settings.default_access, AccessType::Property);
		assert!(settings.default_cascade_persist);
	}

	#[rstest]
	fn test_partial_toml_keeps_defaults() {
		let settings: MetadataSettings = toml::from_str("weaving_enabled = true").unwrap();
		assert!(settings.weaving_enabled);
		assert_eq!(settings.hierarchy_cycle_policy, CyclePolicy::Reject);
	}

	#[rstest]
	fn test_load_missing_file() {
		let result = MetadataSettings::load(Some(Path::new("/nonexistent/entmap.toml")));
		assert!(matches!(result, Err(SettingsError::FileNotFound(_))));
	}

	#[rstest]
	#[serial_test::serial(entmap_env)]
	fn test_load_from_file() {
		let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
		writeln!(file, "key_compatibility = \"nominal\"").unwrap();

		let settings = MetadataSettings::load(Some(file.path())).unwrap();
		assert_eq!(settings.key_compatibility, KeyCompatibilityPolicy::Nominal);
	}

	#[rstest]
	#[serial_test::serial(entmap_env)]
	fn test_load_from_json_file() {
		let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
		writeln!(file, r#"{{"weaving_enabled": true, "hierarchy_cycle_policy": "permit"}}"#).unwrap();

		let settings = MetadataSettings::load(Some(file.path())).unwrap();
		assert!(settings.weaving_enabled);
		assert_eq!(settings.hierarchy_cycle_policy, CyclePolicy::Permit);
	}

	#[rstest]
	fn test_load_unsupported_extension() {
		let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();

		let result = MetadataSettings::load(Some(file.path()));
		assert!(matches!(result, Err(SettingsError::Source(SourceError::UnsupportedFormat(_)))));
	}
}
