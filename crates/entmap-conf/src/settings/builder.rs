//! Settings builder merging layered sources
//!
//! Sources are applied layer by layer, lowest first; a key set by a
//! higher layer replaces the lower one.

use indexmap::IndexMap;
use serde_json::Value;

use super::sources::ConfigSource;
use super::{MetadataSettings, SettingsError};

/// Builder assembling [`MetadataSettings`] from configuration sources
///
/// # Examples
///
/// ```
/// use entmap_conf::settings::builder::SettingsBuilder;
/// use entmap_conf::settings::sources::DefaultSource;
/// use entmap_conf::KeyCompatibilityPolicy;
/// use serde_json::Value;
///
/// let settings = SettingsBuilder::new()
///     .add_source(DefaultSource::new().with_value("key_compatibility", Value::from("nominal")))
///     .build()
///     .unwrap();
/// assert_eq!(settings.key_compatibility, KeyCompatibilityPolicy::Nominal);
/// ```
#[derive(Default)]
pub struct SettingsBuilder {
	sources: Vec<Box<dyn ConfigSource>>,
}

impl SettingsBuilder {
	/// Create a builder without sources
	pub fn new() -> Self {
		Self::default()
	}

	/// Add a configuration source
	pub fn add_source<S: ConfigSource + 'static>(mut self, source: S) -> Self {
		self.sources.push(Box::new(source));
		self
	}

	/// Merge every source into one map without deserializing it
	pub fn merge(&self) -> Result<IndexMap<String, Value>, SettingsError> {
		let mut ordered: Vec<&dyn ConfigSource> = self.sources.iter().map(|s| s.as_ref()).collect();
		// stable: sources of one layer keep insertion order
		ordered.sort_by_key(|source| source.layer());

		let mut merged = IndexMap::new();
		for source in ordered {
			let values = source.load()?;
			tracing::debug!(
				source = %source.description(),
				layer = ?source.layer(),
				keys = values.len(),
				"loaded settings source"
			);
			merged.extend(values);
		}

		Ok(merged)
	}

	/// Merge the sources and deserialize them into [`MetadataSettings`]
	///
	/// Unknown keys are ignored so an unfiltered environment source can be
	/// layered in.
	pub fn build(&self) -> Result<MetadataSettings, SettingsError> {
		let merged = self.merge()?;
		let object: serde_json::Map<String, Value> = merged.into_iter().collect();
		Ok(serde_json::from_value(Value::Object(object))?)
	}
}
