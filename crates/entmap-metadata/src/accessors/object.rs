//! To-one relationship accessors
//!
//! An [`ObjectAccessor`] is a one-to-one or many-to-one attribute together
//! with its pre-parsed [`RelationshipMetadata`]. Processing it against the
//! owning and the referenced descriptor yields a [`OneToOneMapping`]: fetch
//! and indirection policy, cascade, and the foreign key column pairs, with
//! unset join column names defaulted.
//!
//! # Examples
//!
//! ```
//! use entmap_conf::MetadataSettings;
//! use entmap_metadata::accessors::{BasicAccessor, ObjectAccessor};
//! use entmap_metadata::descriptor::EntityDescriptor;
//! use entmap_metadata::fields::DatabaseField;
//! use entmap_metadata::logger::MetadataLogger;
//!
//! let mut employee = EntityDescriptor::new("Employee", "EMPLOYEE")
//!     .with_accessor(BasicAccessor::new("id", "i64").id());
//! employee.add_primary_key_field(DatabaseField::new("ID"));
//!
//! let manager = ObjectAccessor::one_to_one("manager", "Employee");
//! let mapping = manager
//!     .process(&employee, &employee, &MetadataSettings::default(), &MetadataLogger::new())
//!     .unwrap();
//!
//! assert_eq!(mapping.foreign_keys[0].source.qualified_name(), "EMPLOYEE.MANAGER_ID");
//! assert_eq!(mapping.foreign_keys[0].target.qualified_name(), "EMPLOYEE.ID");
//! ```

use entmap_conf::{AccessType, MetadataSettings};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::accessors::MappingAccessor;
use crate::accessors::embedded::process_derived_id_fields;
use crate::columns::{JoinColumn, PrimaryKeyJoinColumn};
use crate::descriptor::EntityDescriptor;
use crate::error::{MetadataError, Result};
use crate::fields::DatabaseField;
use crate::logger::{LogContext, MetadataLogger};
use crate::mapping::{AccessorMethods, CascadePolicy, IndirectionPolicy, OneToOneMapping};

/// When the related object is read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchType {
	#[default]
	Eager,
	Lazy,
}

/// Operation cascaded from the owner to the related object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeType {
	All,
	Persist,
	Merge,
	Remove,
	Refresh,
	Detach,
}

/// Join used to read the related object together with the owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinFetchType {
	Inner,
	Outer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
	OneToOne,
	ManyToOne,
}

impl RelationshipKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			RelationshipKind::OneToOne => "one-to-one",
			RelationshipKind::ManyToOne => "many-to-one",
		}
	}
}

/// Declared relationship settings of one attribute
///
/// Unset values are defaulted when the relationship is processed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipMetadata {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub target_entity: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub fetch: Option<FetchType>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub optional: Option<bool>,
	/// The relationship is (part of) the owner's primary key
	pub id: bool,
	/// Owner key attribute carrying the reference's key; empty for the whole key
	#[serde(skip_serializing_if = "Option::is_none")]
	pub mapped_by_id: Option<String>,
	/// Attribute of the reference owning the relationship
	#[serde(skip_serializing_if = "Option::is_none")]
	pub mapped_by: Option<String>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub join_columns: Vec<JoinColumn>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub primary_key_join_columns: Vec<PrimaryKeyJoinColumn>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub cascade: Vec<CascadeType>,
	pub private_owned: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub join_fetch: Option<JoinFetchType>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub access: Option<AccessType>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub get_method: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub set_method: Option<String>,
}

/// A to-one relationship attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectAccessor {
	attribute_name: String,
	raw_type: String,
	#[serde(rename = "relationship")]
	kind: RelationshipKind,
	#[serde(flatten)]
	metadata: RelationshipMetadata,
}

impl ObjectAccessor {
	pub fn new(
		attribute_name: impl Into<String>,
		raw_type: impl Into<String>,
		kind: RelationshipKind,
	) -> Self {
		Self {
			attribute_name: attribute_name.into(),
			raw_type: raw_type.into(),
			kind,
			metadata: RelationshipMetadata::default(),
		}
	}

	pub fn one_to_one(attribute_name: impl Into<String>, raw_type: impl Into<String>) -> Self {
		Self::new(attribute_name, raw_type, RelationshipKind::OneToOne)
	}

	pub fn many_to_one(attribute_name: impl Into<String>, raw_type: impl Into<String>) -> Self {
		Self::new(attribute_name, raw_type, RelationshipKind::ManyToOne)
	}

	pub fn with_metadata(mut self, metadata: RelationshipMetadata) -> Self {
		self.metadata = metadata;
		self
	}

	pub fn attribute_name(&self) -> &str {
		&self.attribute_name
	}

	pub fn raw_type(&self) -> &str {
		&self.raw_type
	}

	pub fn kind(&self) -> RelationshipKind {
		self.kind
	}

	pub fn metadata(&self) -> &RelationshipMetadata {
		&self.metadata
	}

	/// Target entity when declared, else the attribute's declared type
	pub fn reference_class_name(&self) -> &str {
		self.metadata
			.target_entity
			.as_deref()
			.unwrap_or(&self.raw_type)
	}

	pub fn fetch_type(&self) -> FetchType {
		self.metadata.fetch.unwrap_or_default()
	}

	pub fn is_lazy(&self) -> bool {
		self.fetch_type() == FetchType::Lazy
	}

	pub fn is_optional(&self) -> bool {
		self.metadata.optional.unwrap_or(true)
	}

	pub fn is_derived_id(&self) -> bool {
		self.metadata.id
	}

	pub fn mapped_by_id(&self) -> Option<&str> {
		self.metadata.mapped_by_id.as_deref()
	}

	pub fn has_mapped_by_id(&self) -> bool {
		self.metadata.mapped_by_id.is_some()
	}

	pub fn is_owning(&self) -> bool {
		self.metadata.mapped_by.is_none()
	}

	/// Whether the reference's key must be resolved before this accessor
	pub fn depends_on_reference(&self) -> bool {
		self.is_derived_id() || self.has_mapped_by_id()
	}

	pub fn is_one_to_one_primary_key_relationship(&self) -> bool {
		self.kind == RelationshipKind::OneToOne && !self.metadata.primary_key_join_columns.is_empty()
	}

	fn element_name(&self, owner: &EntityDescriptor) -> String {
		format!("{}.{}", owner.name(), self.attribute_name)
	}

	fn access(&self, owner: &EntityDescriptor, settings: &MetadataSettings) -> AccessType {
		self.metadata
			.access
			.unwrap_or_else(|| owner.access_or(settings.default_access))
	}

	fn accessor_methods(&self) -> AccessorMethods {
		let mut chars = self.attribute_name.chars();
		let capitalized = match chars.next() {
			Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
			None => String::new(),
		};
		AccessorMethods {
			get_method: self
				.metadata
				.get_method
				.clone()
				.unwrap_or_else(|| format!("get{}", capitalized)),
			set_method: self
				.metadata
				.set_method
				.clone()
				.unwrap_or_else(|| format!("set{}", capitalized)),
		}
	}

	/// Build the mapping for this relationship, keys included
	pub fn process(
		&self,
		owner: &EntityDescriptor,
		reference: &EntityDescriptor,
		settings: &MetadataSettings,
		logger: &MetadataLogger,
	) -> Result<OneToOneMapping> {
		let mut mapping = self.init_one_to_one_mapping(owner, settings, logger);

		if self.has_mapped_by_id() {
			self.process_mapped_by_id_keys(owner, reference, &mut mapping)?;
		} else if self.is_owning() {
			self.process_owning_mapping_keys(owner, reference, logger, &mut mapping)?;
		}

		Ok(mapping)
	}

	/// Mapping with the relationship-level settings, no keys yet
	pub fn init_one_to_one_mapping(
		&self,
		owner: &EntityDescriptor,
		settings: &MetadataSettings,
		logger: &MetadataLogger,
	) -> OneToOneMapping {
		if self.metadata.target_entity.is_none() {
			logger.log_config_message(
				LogContext::ReferenceClass,
				&self.element_name(owner),
				&self.raw_type,
			);
		}

		let mut mapping = OneToOneMapping::new(&self.attribute_name, self.reference_class_name());
		mapping.read_only = false;
		mapping.private_owned = self.metadata.private_owned;
		mapping.join_fetch = self.metadata.join_fetch;
		mapping.optional = self.is_optional();
		mapping.derived_id = self.is_derived_id() || self.has_mapped_by_id();
		mapping.mapped_by = self.metadata.mapped_by.clone();

		self.process_indirection(owner, settings, logger, &mut mapping);

		if self.access(owner, settings) == AccessType::Property {
			mapping.accessor_methods = Some(self.accessor_methods());
		}

		let mut cascade = CascadePolicy::default();
		for cascade_type in &self.metadata.cascade {
			cascade.apply(*cascade_type);
		}
		if settings.default_cascade_persist {
			cascade.persist = true;
		}
		mapping.cascade = cascade;

		mapping
	}

	/// Set the indirection policy from the fetch type
	///
	/// Lazy loading needs woven classes. Without weaving and without a
	/// statically woven owner the relationship falls back to eager loading.
	pub fn process_indirection(
		&self,
		owner: &EntityDescriptor,
		settings: &MetadataSettings,
		logger: &MetadataLogger,
		mapping: &mut OneToOneMapping,
	) {
		mapping.lazy = self.is_lazy();
		let mut uses_indirection = mapping.lazy;

		if uses_indirection && !settings.weaving_enabled && !owner.is_statically_woven() {
			logger.log_config_message(LogContext::Indirection, &self.element_name(owner), "eager");
			uses_indirection = false;
		}

		mapping.indirection = match (uses_indirection, self.access(owner, settings)) {
			(false, _) => IndirectionPolicy::None,
			(true, AccessType::Property) => IndirectionPolicy::Weaved {
				set_method: self.accessor_methods().set_method,
			},
			(true, AccessType::Field) => IndirectionPolicy::Basic,
		};
	}

	/// Build the keys of an owning relationship
	pub fn process_owning_mapping_keys(
		&self,
		owner: &EntityDescriptor,
		reference: &EntityDescriptor,
		logger: &MetadataLogger,
		mapping: &mut OneToOneMapping,
	) -> Result<()> {
		if self.is_one_to_one_primary_key_relationship() {
			self.process_one_to_one_primary_key_relationship(owner, reference, logger, mapping)
		} else {
			self.process_one_to_one_foreign_key_relationship(owner, reference, logger, mapping)
		}
	}

	fn incomplete_join_columns(&self, owner: &EntityDescriptor, reference: &EntityDescriptor) -> MetadataError {
		MetadataError::IncompleteJoinColumns {
			class: owner.name().to_string(),
			attribute: self.attribute_name.clone(),
			reference: reference.name().to_string(),
			expected: reference.primary_key_fields().len(),
		}
	}

	/// Join the owner's primary key to the reference's primary key
	///
	/// The mapping is read-only: the shared key is written through the
	/// owner's id attributes.
	pub fn process_one_to_one_primary_key_relationship(
		&self,
		owner: &EntityDescriptor,
		reference: &EntityDescriptor,
		logger: &MetadataLogger,
		mapping: &mut OneToOneMapping,
	) -> Result<()> {
		let default_pk_field = reference.primary_key_field()?;
		let composite = reference.primary_key_fields().len() > 1;
		let declared = &self.metadata.primary_key_join_columns;

		let implicit;
		let columns: &[PrimaryKeyJoinColumn] = if declared.is_empty() {
			if composite {
				return Err(self.incomplete_join_columns(owner, reference));
			}
			implicit = [PrimaryKeyJoinColumn::default()];
			&implicit
		} else {
			if composite
				&& (declared.iter().any(|column| column.name.is_none())
					|| !references_whole_key(
						reference,
						declared.iter().map(|column| column.referenced_column_name.as_deref()),
					)) {
				return Err(self.incomplete_join_columns(owner, reference));
			}
			declared
		};

		let element = self.element_name(owner);
		for column in columns {
			let mut pk_field = column.primary_key_field();
			if pk_field.is_unnamed() {
				pk_field.set_name(default_pk_field.name());
				logger.log_config_message(LogContext::PrimaryKeyColumn, &element, pk_field.name());
			}
			pk_field.set_table(reference.primary_table().clone());

			let mut fk_field = column.foreign_key_field();
			if fk_field.is_unnamed() {
				fk_field.set_name(owner.primary_key_field()?.name());
				logger.log_config_message(LogContext::ForeignKeyColumn, &element, fk_field.name());
			}
			fk_field.set_table(owner.primary_table().clone());

			mapping.add_foreign_key_field(fk_field, pk_field);
		}

		mapping.read_only = true;
		Ok(())
	}

	/// Join foreign key columns of the owner to the reference's primary key
	///
	/// An unnamed foreign key column defaults to
	/// `<ATTRIBUTE_NAME_UPPER>_<REFERENCED_PK_COLUMN>`.
	pub fn process_one_to_one_foreign_key_relationship(
		&self,
		owner: &EntityDescriptor,
		reference: &EntityDescriptor,
		logger: &MetadataLogger,
		mapping: &mut OneToOneMapping,
	) -> Result<()> {
		let default_pk_field = reference.primary_key_field()?;
		let composite = reference.primary_key_fields().len() > 1;
		let declared = &self.metadata.join_columns;

		let implicit;
		let columns: &[JoinColumn] = if declared.is_empty() {
			if composite {
				return Err(self.incomplete_join_columns(owner, reference));
			}
			implicit = [JoinColumn::default()];
			&implicit
		} else {
			if composite
				&& !references_whole_key(
					reference,
					declared.iter().map(|column| column.referenced_column_name.as_deref()),
				) {
				return Err(self.incomplete_join_columns(owner, reference));
			}
			declared
		};

		let element = self.element_name(owner);
		for column in columns {
			let mut pk_field = column.primary_key_field();
			if pk_field.is_unnamed() {
				pk_field.set_name(default_pk_field.name());
				logger.log_config_message(LogContext::PrimaryKeyColumn, &element, pk_field.name());
			}
			pk_field.set_table(reference.primary_table().clone());

			let mut fk_field = column.foreign_key_field();
			if fk_field.is_unnamed() {
				fk_field.set_name(format!(
					"{}_{}",
					self.attribute_name.to_uppercase(),
					pk_field.name()
				));
				logger.log_config_message(LogContext::ForeignKeyColumn, &element, fk_field.name());
			}
			if fk_field.table().is_none() {
				fk_field.set_table(owner.primary_table().clone());
			}

			if column.is_read_only() {
				mapping.read_only = true;
			}
			mapping.add_foreign_key_field(fk_field, pk_field);
		}

		Ok(())
	}

	/// Build the keys of a relationship whose key columns belong to one of
	/// the owner's id attributes
	pub fn process_mapped_by_id_keys(
		&self,
		owner: &EntityDescriptor,
		reference: &EntityDescriptor,
		mapping: &mut OneToOneMapping,
	) -> Result<()> {
		let value = self.mapped_by_id().unwrap_or_default();
		let parent_field = reference.primary_key_field()?;

		if value.is_empty() {
			if reference.has_composite_primary_key() {
				let embedded = owner.embedded_id().ok_or_else(|| MetadataError::MissingEmbeddedId {
					class: owner.name().to_string(),
					attribute: self.attribute_name.clone(),
				})?;
				process_derived_id_fields(
					owner,
					&self.attribute_name,
					reference,
					&embedded.derived_id_fields(),
					mapping,
				)?;
			} else {
				let dependent_field = owner.primary_key_field()?;
				mapping.add_foreign_key_field(dependent_field.clone(), parent_field.clone());
			}
		} else {
			match owner.accessor_for(value) {
				None => {
					return Err(MetadataError::InvalidMappedByIdValue {
						class: owner.name().to_string(),
						attribute: self.attribute_name.clone(),
						value: value.to_string(),
					});
				}
				Some(MappingAccessor::Basic(basic)) => {
					if reference.primary_key_fields().len() > 1 {
						return Err(self.incomplete_join_columns(owner, reference));
					}
					let dependent_field: DatabaseField = basic.field(owner.primary_table());
					mapping.add_foreign_key_field(dependent_field, parent_field.clone());
				}
				Some(MappingAccessor::DerivedIdClass(derived)) => {
					process_derived_id_fields(
						owner,
						&self.attribute_name,
						reference,
						derived.columns(),
						mapping,
					)?;
				}
				Some(other) => {
					return Err(MetadataError::UnsupportedMappedByIdAccessorKind {
						class: owner.name().to_string(),
						attribute: self.attribute_name.clone(),
						value: value.to_string(),
						kind: other.kind_name().to_string(),
					});
				}
			}
		}

		mapping.mapped_by_id = Some(value.to_string());
		mapping.read_only = true;
		Ok(())
	}
}

/// Whether the referenced names cover every key column of `reference`
/// exactly once
fn references_whole_key<'a>(
	reference: &EntityDescriptor,
	referenced: impl IntoIterator<Item = Option<&'a str>>,
) -> bool {
	let key: IndexSet<&str> = reference.primary_key_field_names().into_iter().collect();
	let mut seen = IndexSet::new();
	for name in referenced {
		match name {
			Some(name) if key.contains(name) && seen.insert(name) => {}
			_ => return false,
		}
	}
	seen.len() == key.len()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::accessors::BasicAccessor;
	use rstest::{fixture, rstest};

	#[fixture]
	fn employee() -> EntityDescriptor {
		let mut employee = EntityDescriptor::new("Employee", "EMPLOYEE")
			.with_accessor(BasicAccessor::new("id", "i64").id());
		employee.add_primary_key_field(DatabaseField::new("ID").with_table(employee.primary_table().clone()));
		employee
	}

	fn lazy(accessor: ObjectAccessor) -> ObjectAccessor {
		accessor.with_metadata(RelationshipMetadata {
			fetch: Some(FetchType::Lazy),
			..RelationshipMetadata::default()
		})
	}

	#[rstest]
	fn test_defaults() {
		let accessor = ObjectAccessor::many_to_one("department", "Department");
		assert_eq!(accessor.fetch_type(), FetchType::Eager);
		assert!(accessor.is_optional());
		assert!(accessor.is_owning());
		assert!(!accessor.depends_on_reference());
		assert_eq!(accessor.reference_class_name(), "Department");
	}

	#[rstest]
	fn test_target_entity_overrides_raw_type() {
		let accessor = ObjectAccessor::one_to_one("owner", "Object").with_metadata(RelationshipMetadata {
			target_entity: Some("Person".to_string()),
			..RelationshipMetadata::default()
		});
		assert_eq!(accessor.reference_class_name(), "Person");
	}

	#[rstest]
	fn test_indirection_disabled_without_weaving(employee: EntityDescriptor) {
		let accessor = lazy(ObjectAccessor::one_to_one("manager", "Employee"));
		let mapping = accessor
			.process(&employee, &employee, &MetadataSettings::default(), &MetadataLogger::new())
			.unwrap();

		assert!(mapping.lazy);
		assert!(!mapping.uses_indirection());
		assert_eq!(mapping.indirection, IndirectionPolicy::None);
	}

	#[rstest]
	fn test_statically_woven_owner_keeps_indirection(employee: EntityDescriptor) {
		let owner = employee.clone().statically_woven();
		let accessor = lazy(ObjectAccessor::one_to_one("manager", "Employee"));
		let mapping = accessor
			.process(&owner, &employee, &MetadataSettings::default(), &MetadataLogger::new())
			.unwrap();

		assert!(mapping.lazy);
		assert_eq!(mapping.indirection, IndirectionPolicy::Basic);
	}

	#[rstest]
	fn test_property_access_uses_weaved_indirection(employee: EntityDescriptor) {
		let owner = employee.clone().with_access(AccessType::Property);
		let settings = MetadataSettings::default().with_weaving(true);
		let accessor = lazy(ObjectAccessor::one_to_one("manager", "Employee"));
		let mapping = accessor
			.process(&owner, &employee, &settings, &MetadataLogger::new())
			.unwrap();

		assert_eq!(
			mapping.indirection,
			IndirectionPolicy::Weaved {
				set_method: "setManager".to_string()
			}
		);
		assert_eq!(
			mapping.accessor_methods.map(|methods| methods.get_method),
			Some("getManager".to_string())
		);
	}

	#[rstest]
	fn test_cascade_default_persist(employee: EntityDescriptor) {
		let settings = MetadataSettings::default().with_default_cascade_persist(true);
		let accessor = ObjectAccessor::one_to_one("manager", "Employee").with_metadata(RelationshipMetadata {
			cascade: vec![CascadeType::Merge],
			..RelationshipMetadata::default()
		});
		let mapping = accessor
			.process(&employee, &employee, &settings, &MetadataLogger::new())
			.unwrap();

		assert!(mapping.cascade.persist);
		assert!(mapping.cascade.merge);
		assert!(!mapping.cascade.remove);
	}

	#[rstest]
	fn test_non_owning_side_builds_no_keys(employee: EntityDescriptor) {
		let accessor = ObjectAccessor::one_to_one("report", "Employee").with_metadata(RelationshipMetadata {
			mapped_by: Some("manager".to_string()),
			..RelationshipMetadata::default()
		});
		let mapping = accessor
			.process(&employee, &employee, &MetadataSettings::default(), &MetadataLogger::new())
			.unwrap();

		assert!(mapping.foreign_keys.is_empty());
		assert_eq!(mapping.mapped_by.as_deref(), Some("manager"));
	}

	#[rstest]
	fn test_read_only_join_column(employee: EntityDescriptor) {
		let accessor = ObjectAccessor::many_to_one("manager", "Employee").with_metadata(RelationshipMetadata {
			join_columns: vec![JoinColumn::named("MGR_ID").read_only()],
			..RelationshipMetadata::default()
		});
		let mapping = accessor
			.process(&employee, &employee, &MetadataSettings::default(), &MetadataLogger::new())
			.unwrap();

		assert!(mapping.read_only);
		assert_eq!(mapping.foreign_keys[0].source.name(), "MGR_ID");
		assert_eq!(mapping.foreign_keys[0].target.name(), "ID");
	}
}
