//! Declarative project files
//!
//! A project file lists entities and key classes. Attributes are tagged by
//! their `kind`; relationship attributes carry their relationship settings
//! inline.
//!
//! ```toml
//! name = "hr"
//!
//! [[key_classes]]
//! name = "DependentId"
//! fields = { name = "String", employee = "i64" }
//!
//! [[entities]]
//! class = "Employee"
//! table = "EMPLOYEE"
//! attributes = [
//!     { kind = "basic", name = "id", type = "i64", id = true },
//!     { kind = "many_to_one", name = "manager", type = "Employee", fetch = "lazy" },
//! ]
//!
//! [[entities]]
//! class = "Dependent"
//! id_class = "DependentId"
//! attributes = [
//!     { kind = "basic", name = "name", type = "String", id = true },
//!     { kind = "one_to_one", name = "employee", type = "Employee", id = true },
//! ]
//! ```

use entmap_conf::AccessType;
use serde::Deserialize;
use std::path::Path;

use crate::accessors::object::{RelationshipKind, RelationshipMetadata};
use crate::accessors::{
	BasicAccessor, DerivedIdClassAccessor, DerivedIdField, EmbeddedIdAccessor, MappingAccessor,
	ObjectAccessor,
};
use crate::descriptor::{EntityDescriptor, InheritancePolicy, InheritanceStrategy};
use crate::key_class::KeyClass;
use crate::project::{MetadataProject, ProjectLoadError};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectDefinition {
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub entities: Vec<EntityDefinition>,
	#[serde(default)]
	pub key_classes: Vec<KeyClass>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntityDefinition {
	/// Runtime class name
	pub class: String,
	/// Entity name, when it differs from the class name
	#[serde(default)]
	pub name: Option<String>,
	/// Primary table, the upper-cased entity name when unset
	#[serde(default)]
	pub table: Option<String>,
	#[serde(default)]
	pub parent: Option<String>,
	#[serde(default)]
	pub inheritance: Option<InheritanceStrategy>,
	#[serde(default)]
	pub access: Option<AccessType>,
	#[serde(default)]
	pub statically_woven: bool,
	#[serde(default)]
	pub id_class: Option<String>,
	#[serde(default)]
	pub attributes: Vec<AttributeDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttributeDefinition {
	Basic {
		name: String,
		#[serde(rename = "type")]
		raw_type: String,
		#[serde(default)]
		column: Option<String>,
		#[serde(default)]
		id: bool,
	},
	OneToOne {
		name: String,
		#[serde(rename = "type")]
		raw_type: String,
		#[serde(flatten)]
		relationship: RelationshipMetadata,
	},
	ManyToOne {
		name: String,
		#[serde(rename = "type")]
		raw_type: String,
		#[serde(flatten)]
		relationship: RelationshipMetadata,
	},
	EmbeddedId {
		name: String,
		key_class: String,
		#[serde(default)]
		attributes: Vec<EmbeddedAttributeDefinition>,
	},
}

impl AttributeDefinition {
	pub fn name(&self) -> &str {
		match self {
			AttributeDefinition::Basic { name, .. }
			| AttributeDefinition::OneToOne { name, .. }
			| AttributeDefinition::ManyToOne { name, .. }
			| AttributeDefinition::EmbeddedId { name, .. } => name,
		}
	}
}

/// Attribute of an embedded id
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmbeddedAttributeDefinition {
	Basic {
		name: String,
		#[serde(rename = "type")]
		raw_type: String,
		#[serde(default)]
		column: Option<String>,
	},
	DerivedIdClass {
		name: String,
		key_class: String,
		#[serde(default)]
		columns: Vec<DerivedIdField>,
	},
}

impl EntityDefinition {
	fn into_descriptor(self) -> Result<EntityDescriptor, ProjectLoadError> {
		let entity_name = self.name.clone().unwrap_or_else(|| self.class.clone());
		let table = self
			.table
			.clone()
			.unwrap_or_else(|| entity_name.to_uppercase());

		let mut descriptor = EntityDescriptor::new(self.class, table);
		if let Some(name) = self.name {
			descriptor = descriptor.with_class_name(name);
		}
		if let Some(parent) = self.parent {
			descriptor = descriptor.with_inheritance(
				InheritancePolicy::new(parent).with_strategy(self.inheritance.unwrap_or_default()),
			);
		}
		if let Some(access) = self.access {
			descriptor = descriptor.with_access(access);
		}
		if self.statically_woven {
			descriptor = descriptor.statically_woven();
		}
		if let Some(id_class) = self.id_class {
			descriptor = descriptor.with_id_class(id_class);
		}

		for attribute in self.attributes {
			let attribute_name = attribute.name().to_string();
			if descriptor.add_accessor(attribute.into_accessor()).is_some() {
				return Err(ProjectLoadError::DuplicateAttribute {
					class: entity_name,
					attribute: attribute_name,
				});
			}
		}

		Ok(descriptor)
	}
}

impl AttributeDefinition {
	fn into_accessor(self) -> MappingAccessor {
		match self {
			AttributeDefinition::Basic {
				name,
				raw_type,
				column,
				id,
			} => {
				let mut accessor = BasicAccessor::new(name, raw_type);
				if let Some(column) = column {
					accessor = accessor.with_column(column);
				}
				accessor.set_id(id);
				accessor.into()
			}
			AttributeDefinition::OneToOne {
				name,
				raw_type,
				relationship,
			} => ObjectAccessor::new(name, raw_type, RelationshipKind::OneToOne)
				.with_metadata(relationship)
				.into(),
			AttributeDefinition::ManyToOne {
				name,
				raw_type,
				relationship,
			} => ObjectAccessor::new(name, raw_type, RelationshipKind::ManyToOne)
				.with_metadata(relationship)
				.into(),
			AttributeDefinition::EmbeddedId {
				name,
				key_class,
				attributes,
			} => {
				let mut embedded = EmbeddedIdAccessor::new(name, key_class);
				for attribute in attributes {
					embedded = match attribute {
						EmbeddedAttributeDefinition::Basic {
							name,
							raw_type,
							column,
						} => {
							let mut basic = BasicAccessor::new(name, raw_type);
							if let Some(column) = column {
								basic = basic.with_column(column);
							}
							embedded.with_basic(basic)
						}
						EmbeddedAttributeDefinition::DerivedIdClass {
							name,
							key_class,
							columns,
						} => {
							let derived = columns
								.into_iter()
								.fold(DerivedIdClassAccessor::new(name, key_class), |derived, column| {
									derived.with_column(column)
								});
							embedded.with_derived_id_class(derived)
						}
					};
				}
				embedded.into()
			}
		}
	}
}

impl TryFrom<ProjectDefinition> for MetadataProject {
	type Error = ProjectLoadError;

	fn try_from(definition: ProjectDefinition) -> Result<Self, Self::Error> {
		let mut project = match definition.name {
			Some(name) => MetadataProject::named(name),
			None => MetadataProject::new(),
		};

		for key_class in definition.key_classes {
			project.add_key_class(key_class);
		}

		for entity in definition.entities {
			let descriptor = entity.into_descriptor()?;
			let name = descriptor.name().to_string();
			if project.add_descriptor(descriptor).is_some() {
				return Err(ProjectLoadError::DuplicateEntity(name));
			}
		}

		Ok(project)
	}
}

impl MetadataProject {
	pub fn from_definition(definition: ProjectDefinition) -> Result<Self, ProjectLoadError> {
		Self::try_from(definition)
	}

	pub fn from_toml_str(content: &str) -> Result<Self, ProjectLoadError> {
		let definition: ProjectDefinition = toml::from_str(content)?;
		Self::from_definition(definition)
	}

	pub fn from_json_str(content: &str) -> Result<Self, ProjectLoadError> {
		let definition: ProjectDefinition = serde_json::from_str(content)?;
		Self::from_definition(definition)
	}

	/// Read a `.toml` or `.json` project file
	pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ProjectLoadError> {
		let path = path.as_ref();
		let extension = path
			.extension()
			.and_then(|extension| extension.to_str())
			.map(str::to_ascii_lowercase)
			.unwrap_or_default();

		let read = || {
			std::fs::read_to_string(path).map_err(|source| ProjectLoadError::Io {
				path: path.display().to_string(),
				source,
			})
		};

		match extension.as_str() {
			"toml" => Self::from_toml_str(&read()?),
			"json" => Self::from_json_str(&read()?),
			_ => Err(ProjectLoadError::UnsupportedFormat(path.display().to_string())),
		}
	}
}
