//! Projects: the descriptor set and key classes of one persistence unit
//!
//! A [`MetadataProject`] is assembled in code or, with the `loader` feature,
//! read from a declarative TOML or JSON file (see [`definition`]).

#[cfg(feature = "loader")]
pub mod definition;

use indexmap::IndexMap;
use thiserror::Error;

use crate::descriptor::EntityDescriptor;
use crate::key_class::{KeyClass, KeyClassRegistry};

/// Errors raised while reading a project file
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ProjectLoadError {
	#[error("Failed to read {path}: {source}")]
	Io {
		path: String,
		#[source]
		source: std::io::Error,
	},

	#[cfg(feature = "loader")]
	#[error("Invalid TOML project: {0}")]
	Toml(#[from] toml::de::Error),

	#[cfg(feature = "loader")]
	#[error("Invalid JSON project: {0}")]
	Json(#[from] serde_json::Error),

	#[error("Unsupported project file format: {0}")]
	UnsupportedFormat(String),

	#[error("Entity {0} is declared more than once")]
	DuplicateEntity(String),

	#[error("Attribute {attribute} is declared more than once on {class}")]
	DuplicateAttribute { class: String, attribute: String },
}

/// Descriptors and key classes waiting to be processed
///
/// Descriptors are keyed by their class name (the runtime class name when
/// none is declared).
///
/// # Examples
///
/// ```
/// use entmap_metadata::descriptor::EntityDescriptor;
/// use entmap_metadata::key_class::KeyClass;
/// use entmap_metadata::project::MetadataProject;
///
/// let project = MetadataProject::named("hr")
///     .with_key_class(KeyClass::new("EmpPK").with_field("id", "i64"))
///     .with_descriptor(EntityDescriptor::new("Employee", "EMPLOYEE").with_id_class("EmpPK"));
///
/// assert_eq!(project.len(), 1);
/// assert!(project.descriptor("Employee").is_some());
/// assert!(project.key_classes().contains("EmpPK"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MetadataProject {
	name: Option<String>,
	descriptors: IndexMap<String, EntityDescriptor>,
	key_classes: KeyClassRegistry,
}

impl MetadataProject {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn named(name: impl Into<String>) -> Self {
		Self {
			name: Some(name.into()),
			..Self::default()
		}
	}

	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	/// Add a descriptor, returning the one it replaces
	pub fn add_descriptor(&mut self, descriptor: EntityDescriptor) -> Option<EntityDescriptor> {
		self.descriptors
			.insert(descriptor.name().to_string(), descriptor)
	}

	pub fn with_descriptor(mut self, descriptor: EntityDescriptor) -> Self {
		self.add_descriptor(descriptor);
		self
	}

	pub fn add_key_class(&mut self, key_class: KeyClass) -> Option<KeyClass> {
		self.key_classes.register(key_class)
	}

	pub fn with_key_class(mut self, key_class: KeyClass) -> Self {
		self.add_key_class(key_class);
		self
	}

	pub fn descriptor(&self, class_name: &str) -> Option<&EntityDescriptor> {
		self.descriptors.get(class_name)
	}

	pub fn descriptors(&self) -> impl Iterator<Item = &EntityDescriptor> {
		self.descriptors.values()
	}

	pub fn key_classes(&self) -> &KeyClassRegistry {
		&self.key_classes
	}

	pub fn len(&self) -> usize {
		self.descriptors.len()
	}

	pub fn is_empty(&self) -> bool {
		self.descriptors.is_empty()
	}

	pub(crate) fn into_parts(
		self,
	) -> (
		Option<String>,
		IndexMap<String, EntityDescriptor>,
		KeyClassRegistry,
	) {
		(self.name, self.descriptors, self.key_classes)
	}
}
