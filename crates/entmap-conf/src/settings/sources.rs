//! Configuration sources for layered settings
//!
//! Every source belongs to a [`SourceLayer`]. The builder applies layers
//! from [`SourceLayer::Defaults`] up to [`SourceLayer::Environment`], so
//! environment variables override the settings file, which overrides
//! defaults.

use indexmap::IndexMap;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Layer a configuration source belongs to, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceLayer {
	Defaults,
	File,
	Environment,
}

/// A provider of raw settings values keyed by settings field name
pub trait ConfigSource: Send + Sync {
	/// Read the values of this source
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError>;

	fn layer(&self) -> SourceLayer;

	/// Human readable origin, used in debug logs
	fn description(&self) -> String;
}

/// Error type for configuration sources
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
	#[error("Failed to read {path}: {source}")]
	Io {
		path: String,
		#[source]
		source: std::io::Error,
	},

	#[error("{path}: expected a table of settings at the top level")]
	NotATable { path: String },

	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("Unsupported settings file {0}: expected a .toml or .json extension")]
	UnsupportedFormat(String),
}

/// `ENTMAP_*` style environment variables
///
/// The prefix is stripped and the rest lowercased, so
/// `ENTMAP_WEAVING_ENABLED` sets `weaving_enabled`.
pub struct EnvSource {
	prefix: String,
}

impl EnvSource {
	/// Read the variables starting with `prefix`
	///
	/// # Examples
	///
	/// ```
	/// use entmap_conf::settings::sources::{ConfigSource, EnvSource, SourceLayer};
	///
	/// let source = EnvSource::new("ENTMAP_");
	/// assert_eq!(source.layer(), SourceLayer::Environment);
	/// ```
	pub fn new(prefix: impl Into<String>) -> Self {
		Self {
			prefix: prefix.into(),
		}
	}
}

impl ConfigSource for EnvSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		Ok(std::env::vars()
			.filter_map(|(key, value)| {
				let field = key.strip_prefix(self.prefix.as_str())?.to_lowercase();
				Some((field, env_value(&value)))
			})
			.collect())
	}

	fn layer(&self) -> SourceLayer {
		SourceLayer::Environment
	}

	fn description(&self) -> String {
		format!("environment ({}*)", self.prefix)
	}
}

/// Flags accept `true`/`false` in any case; everything else is a string
fn env_value(raw: &str) -> Value {
	let trimmed = raw.trim();
	if trimmed.eq_ignore_ascii_case("true") {
		Value::Bool(true)
	} else if trimmed.eq_ignore_ascii_case("false") {
		Value::Bool(false)
	} else {
		Value::String(trimmed.to_string())
	}
}

/// Format of a settings file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
	Toml,
	Json,
}

impl FileFormat {
	/// Format implied by the extension of `path`
	pub fn from_path(path: &Path) -> Option<Self> {
		match path.extension().and_then(|ext| ext.to_str())? {
			"toml" => Some(Self::Toml),
			"json" => Some(Self::Json),
			_ => None,
		}
	}
}

/// A settings file in TOML or JSON
pub struct FileSource {
	path: PathBuf,
	format: FileFormat,
}

impl FileSource {
	pub fn new(path: impl Into<PathBuf>, format: FileFormat) -> Self {
		Self {
			path: path.into(),
			format,
		}
	}

	/// Settings file whose format follows its extension
	///
	/// # Examples
	///
	/// ```
	/// use entmap_conf::settings::sources::FileSource;
	///
	/// assert!(FileSource::from_path("entmap.json").is_ok());
	/// assert!(FileSource::from_path("entmap.ini").is_err());
	/// ```
	pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SourceError> {
		let path = path.as_ref();
		let format = FileFormat::from_path(path)
			.ok_or_else(|| SourceError::UnsupportedFormat(path.display().to_string()))?;
		Ok(Self::new(path, format))
	}

	pub fn format(&self) -> FileFormat {
		self.format
	}
}

impl ConfigSource for FileSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		let content = fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
			path: self.path.display().to_string(),
			source,
		})?;

		let value = match self.format {
			FileFormat::Toml => serde_json::to_value(toml::from_str::<toml::Table>(&content)?)?,
			FileFormat::Json => serde_json::from_str(&content)?,
		};
		match value {
			Value::Object(table) => Ok(table.into_iter().collect()),
			_ => Err(SourceError::NotATable {
				path: self.path.display().to_string(),
			}),
		}
	}

	fn layer(&self) -> SourceLayer {
		SourceLayer::File
	}

	fn description(&self) -> String {
		format!("settings file {}", self.path.display())
	}
}

/// Fixed values, below every other layer
#[derive(Default)]
pub struct DefaultSource {
	values: IndexMap<String, Value>,
}

impl DefaultSource {
	pub fn new() -> Self {
		Self::default()
	}

	/// Set the default of one settings field
	///
	/// # Examples
	///
	/// ```
	/// use entmap_conf::settings::sources::DefaultSource;
	/// use serde_json::Value;
	///
	/// let source = DefaultSource::new().with_value("weaving_enabled", Value::Bool(true));
	/// ```
	pub fn with_value(mut self, key: impl Into<String>, value: Value) -> Self {
		self.values.insert(key.into(), value);
		self
	}
}

impl ConfigSource for DefaultSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		Ok(self.values.clone())
	}

	fn layer(&self) -> SourceLayer {
		SourceLayer::Defaults
	}

	fn description(&self) -> String {
		format!("defaults ({} keys)", self.values.len())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serial_test::serial;
	use std::env;
	use tempfile::TempDir;

	#[rstest]
	#[serial(entmap_env)]
	fn test_env_source_strips_prefix() {
		// SAFETY: serialized with the other environment tests
		unsafe {
			env::set_var("ENTMAPTEST_WEAVING_ENABLED", "TRUE");
			env::set_var("ENTMAPTEST_LOG_LEVEL", "debug");
		}

		let config = EnvSource::new("ENTMAPTEST_").load().unwrap();

		assert_eq!(config.get("weaving_enabled"), Some(&Value::Bool(true)));
		assert_eq!(config.get("log_level"), Some(&Value::from("debug")));
		assert!(config.keys().all(|k| !k.starts_with("entmaptest_")));

		// SAFETY: serialized with the other environment tests
		unsafe {
			env::remove_var("ENTMAPTEST_WEAVING_ENABLED");
			env::remove_var("ENTMAPTEST_LOG_LEVEL");
		}
	}

	#[rstest]
	#[case(" false ", Value::Bool(false))]
	#[case("structural", Value::from("structural"))]
	#[case("42", Value::from("42"))]
	fn test_env_value(#[case] raw: &str, #[case] expected: Value) {
		assert_eq!(env_value(raw), expected);
	}

	#[rstest]
	#[case::toml("entmap.toml", "weaving_enabled = true\nlog_level = \"warn\"\n")]
	#[case::json("entmap.json", r#"{"weaving_enabled": true, "log_level": "warn"}"#)]
	fn test_file_source_reads_both_formats(#[case] file_name: &str, #[case] content: &str) {
		let temp_dir = TempDir::new().unwrap();
		let path = temp_dir.path().join(file_name);
		fs::write(&path, content).unwrap();

		let config = FileSource::from_path(&path).unwrap().load().unwrap();

		assert_eq!(config.get("weaving_enabled"), Some(&Value::Bool(true)));
		assert_eq!(config.get("log_level"), Some(&Value::from("warn")));
	}

	#[rstest]
	fn test_json_file_must_hold_a_table() {
		let temp_dir = TempDir::new().unwrap();
		let path = temp_dir.path().join("entmap.json");
		fs::write(&path, "[1, 2]").unwrap();

		let result = FileSource::from_path(&path).unwrap().load();
		assert!(matches!(result, Err(SourceError::NotATable { .. })));
	}

	#[rstest]
	fn test_missing_file_is_an_error() {
		let result = FileSource::new("/nonexistent/entmap.toml", FileFormat::Toml).load();
		assert!(matches!(result, Err(SourceError::Io { .. })));
	}

	#[rstest]
	fn test_layers_are_ordered() {
		assert!(SourceLayer::Defaults < SourceLayer::File);
		assert!(SourceLayer::File < SourceLayer::Environment);
		assert_eq!(DefaultSource::new().layer(), SourceLayer::Defaults);
	}
}
