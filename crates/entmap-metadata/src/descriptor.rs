//! Entity class descriptors
//!
//! An [`EntityDescriptor`] is the mapping metadata of one entity class. It is
//! created with its declared accessors and gains its identity state
//! (primary key fields, id attribute names, relationship mappings) while the
//! project is processed.

use entmap_conf::AccessType;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::accessors::{EmbeddedIdAccessor, MappingAccessor, ObjectAccessor};
use crate::error::{MetadataError, Result};
use crate::fields::{DatabaseField, DatabaseTable};
use crate::hierarchy::HierarchyMember;
use crate::key_class::{KeyClassRegistry, KeyCompatibility};
use crate::mapping::OneToOneMapping;

/// Table layout of an inheritance hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InheritanceStrategy {
	/// All classes of the hierarchy share one table
	#[default]
	SingleTable,
	/// Each class has its own table joined on the primary key
	Joined,
	/// Each concrete class has a complete table of its own
	TablePerClass,
}

/// Inheritance declared by a subclass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InheritancePolicy {
	parent_class_name: String,
	strategy: InheritanceStrategy,
}

impl InheritancePolicy {
	pub fn new(parent_class_name: impl Into<String>) -> Self {
		Self {
			parent_class_name: parent_class_name.into(),
			strategy: InheritanceStrategy::default(),
		}
	}

	pub fn with_strategy(mut self, strategy: InheritanceStrategy) -> Self {
		self.strategy = strategy;
		self
	}

	pub fn parent_class_name(&self) -> &str {
		&self.parent_class_name
	}

	pub fn strategy(&self) -> InheritanceStrategy {
		self.strategy
	}
}

/// Mapping metadata of one entity class
///
/// # Examples
///
/// ```
/// use entmap_metadata::accessors::BasicAccessor;
/// use entmap_metadata::descriptor::EntityDescriptor;
///
/// let descriptor = EntityDescriptor::new("model.Employee", "EMPLOYEE")
///     .with_class_name("Employee")
///     .with_accessor(BasicAccessor::new("id", "i64").id());
///
/// assert_eq!(descriptor.name(), "Employee");
/// assert!(descriptor.has_own_identity());
/// assert!(descriptor.primary_key_fields().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityDescriptor {
	#[serde(skip_serializing_if = "Option::is_none")]
	class_name: Option<String>,
	runtime_class_name: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	inheritance: Option<InheritancePolicy>,
	primary_table: DatabaseTable,
	#[serde(skip_serializing_if = "Option::is_none")]
	access: Option<AccessType>,
	statically_woven: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	id_class: Option<String>,
	#[serde(skip_serializing_if = "IndexMap::is_empty")]
	pk_class_ids: IndexMap<String, String>,
	id_attribute_names: Vec<String>,
	primary_key_fields: Vec<DatabaseField>,
	accessors: IndexMap<String, MappingAccessor>,
	#[serde(skip_serializing_if = "IndexMap::is_empty")]
	mappings: IndexMap<String, OneToOneMapping>,
}

impl EntityDescriptor {
	pub fn new(runtime_class_name: impl Into<String>, primary_table: impl Into<String>) -> Self {
		Self {
			class_name: None,
			runtime_class_name: runtime_class_name.into(),
			inheritance: None,
			primary_table: DatabaseTable::new(primary_table),
			access: None,
			statically_woven: false,
			id_class: None,
			pk_class_ids: IndexMap::new(),
			id_attribute_names: Vec::new(),
			primary_key_fields: Vec::new(),
			accessors: IndexMap::new(),
			mappings: IndexMap::new(),
		}
	}

	pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
		self.class_name = Some(class_name.into());
		self
	}

	pub fn with_parent(self, parent_class_name: impl Into<String>) -> Self {
		self.with_inheritance(InheritancePolicy::new(parent_class_name))
	}

	pub fn with_inheritance(mut self, inheritance: InheritancePolicy) -> Self {
		self.inheritance = Some(inheritance);
		self
	}

	pub fn with_access(mut self, access: AccessType) -> Self {
		self.access = Some(access);
		self
	}

	/// Mark the class as enhanced for lazy loading ahead of time
	pub fn statically_woven(mut self) -> Self {
		self.statically_woven = true;
		self
	}

	pub fn with_id_class(mut self, id_class: impl Into<String>) -> Self {
		self.id_class = Some(id_class.into());
		self
	}

	pub fn with_accessor(mut self, accessor: impl Into<MappingAccessor>) -> Self {
		self.add_accessor(accessor);
		self
	}

	/// Add an accessor, replacing one with the same attribute name
	pub fn add_accessor(&mut self, accessor: impl Into<MappingAccessor>) -> Option<MappingAccessor> {
		let accessor = accessor.into();
		self.accessors
			.insert(accessor.attribute_name().to_string(), accessor)
	}

	/// Declared class name, or the runtime class name
	pub fn name(&self) -> &str {
		self.class_name
			.as_deref()
			.unwrap_or(&self.runtime_class_name)
	}

	pub fn runtime_class_name(&self) -> &str {
		&self.runtime_class_name
	}

	pub fn inheritance(&self) -> Option<&InheritancePolicy> {
		self.inheritance.as_ref()
	}

	pub fn primary_table(&self) -> &DatabaseTable {
		&self.primary_table
	}

	/// Declared access type, or `default` when none is declared
	pub fn access_or(&self, default: AccessType) -> AccessType {
		self.access.unwrap_or(default)
	}

	pub fn is_statically_woven(&self) -> bool {
		self.statically_woven
	}

	pub fn id_class(&self) -> Option<&str> {
		self.id_class.as_deref()
	}

	pub fn set_id_class(&mut self, id_class: impl Into<String>) {
		self.id_class = Some(id_class.into());
	}

	/// Composite key class of the entity: the id class, or the class of its
	/// embedded id
	pub fn key_class_name(&self) -> Option<&str> {
		self.id_class()
			.or_else(|| self.embedded_id().map(EmbeddedIdAccessor::key_class))
	}

	/// Key class attributes not yet matched by an id accessor
	pub fn pk_class_ids(&self) -> &IndexMap<String, String> {
		&self.pk_class_ids
	}

	pub fn set_pk_class_ids(&mut self, pk_class_ids: IndexMap<String, String>) {
		self.pk_class_ids = pk_class_ids;
	}

	pub fn clear_pk_class_ids(&mut self) {
		self.pk_class_ids.clear();
	}

	/// Match `attribute` against the pending key class attributes
	///
	/// A pending attribute is removed and its declared type checked against
	/// `resolved`; on mismatch the declared type is returned. Attributes that
	/// are not pending are not checked.
	pub fn validate_pk_class_id(
		&mut self,
		attribute: &str,
		resolved: &str,
		compatibility: &dyn KeyCompatibility,
		key_classes: &KeyClassRegistry,
	) -> std::result::Result<(), String> {
		match self.pk_class_ids.shift_remove(attribute) {
			Some(declared) if !compatibility.is_compatible(&declared, resolved, key_classes) => {
				Err(declared)
			}
			_ => Ok(()),
		}
	}

	pub fn id_attribute_names(&self) -> &[String] {
		&self.id_attribute_names
	}

	pub fn add_id_attribute_name(&mut self, attribute: impl Into<String>) {
		let attribute = attribute.into();
		if !self.id_attribute_names.contains(&attribute) {
			self.id_attribute_names.push(attribute);
		}
	}

	pub fn primary_key_fields(&self) -> &[DatabaseField] {
		&self.primary_key_fields
	}

	pub fn primary_key_field_names(&self) -> Vec<&str> {
		self.primary_key_fields.iter().map(DatabaseField::name).collect()
	}

	/// Append a primary key field unless a field of that name is present
	pub fn add_primary_key_field(&mut self, field: DatabaseField) {
		if !self
			.primary_key_fields
			.iter()
			.any(|existing| existing.name() == field.name())
		{
			self.primary_key_fields.push(field);
		}
	}

	/// The single primary key field
	///
	/// With a composite key this is the first field.
	pub fn primary_key_field(&self) -> Result<&DatabaseField> {
		self.primary_key_fields
			.first()
			.ok_or_else(|| MetadataError::MissingPrimaryKey {
				class: self.name().to_string(),
			})
	}

	pub fn has_composite_primary_key(&self) -> bool {
		self.primary_key_fields.len() > 1 || self.key_class_name().is_some()
	}

	pub fn accessors(&self) -> impl Iterator<Item = &MappingAccessor> {
		self.accessors.values()
	}

	pub fn accessor(&self, attribute: &str) -> Option<&MappingAccessor> {
		self.accessors.get(attribute)
	}

	/// Accessor of `attribute`, looking inside the embedded id too
	pub fn accessor_for(&self, attribute: &str) -> Option<&MappingAccessor> {
		self.accessors
			.get(attribute)
			.or_else(|| self.embedded_id().and_then(|embedded| embedded.attribute(attribute)))
	}

	pub fn object_accessors(&self) -> impl Iterator<Item = &ObjectAccessor> {
		self.accessors.values().filter_map(MappingAccessor::as_object)
	}

	pub fn embedded_id(&self) -> Option<&EmbeddedIdAccessor> {
		self.accessors.values().find_map(MappingAccessor::as_embedded_id)
	}

	/// Whether any accessor declares identity for this class
	pub fn has_own_identity(&self) -> bool {
		self.accessors.values().any(MappingAccessor::is_identity)
	}

	pub fn mappings(&self) -> impl Iterator<Item = &OneToOneMapping> {
		self.mappings.values()
	}

	pub fn mapping(&self, attribute: &str) -> Option<&OneToOneMapping> {
		self.mappings.get(attribute)
	}

	pub fn has_mapping(&self, attribute: &str) -> bool {
		self.mappings.contains_key(attribute)
	}

	pub fn insert_mapping(&mut self, mapping: OneToOneMapping) {
		self.mappings
			.insert(mapping.attribute_name.clone(), mapping);
	}
}

impl HierarchyMember for EntityDescriptor {
	fn class_name(&self) -> Option<&str> {
		self.class_name.as_deref()
	}

	fn runtime_class_name(&self) -> &str {
		&self.runtime_class_name
	}

	fn parent_class_name(&self) -> Option<&str> {
		self.inheritance
			.as_ref()
			.map(InheritancePolicy::parent_class_name)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::accessors::{BasicAccessor, DerivedIdClassAccessor, DerivedIdField};
	use crate::key_class::{KeyClass, NominalKeyCompatibility};
	use rstest::rstest;

	#[rstest]
	fn test_primary_key_fields_are_deduplicated() {
		let mut descriptor = EntityDescriptor::new("Employee", "EMPLOYEE");
		descriptor.add_primary_key_field(DatabaseField::new("ID"));
		descriptor.add_primary_key_field(DatabaseField::new("ID"));
		descriptor.add_primary_key_field(DatabaseField::new("REGION"));

		assert_eq!(descriptor.primary_key_field_names(), vec!["ID", "REGION"]);
		assert!(descriptor.has_composite_primary_key());
	}

	#[rstest]
	fn test_missing_primary_key() {
		let descriptor = EntityDescriptor::new("Employee", "EMPLOYEE");
		assert_eq!(
			descriptor.primary_key_field(),
			Err(MetadataError::MissingPrimaryKey {
				class: "Employee".to_string()
			})
		);
	}

	#[rstest]
	fn test_validate_pk_class_id_consumes_pending_attribute() {
		let registry: KeyClassRegistry = [KeyClass::new("DependentId")].into_iter().collect();
		let mut descriptor = EntityDescriptor::new("Dependent", "DEPENDENT");
		descriptor.set_pk_class_ids(IndexMap::from([
			("emp".to_string(), "i64".to_string()),
			("name".to_string(), "String".to_string()),
		]));

		assert_eq!(
			descriptor.validate_pk_class_id("emp", "String", &NominalKeyCompatibility, &registry),
			Err("i64".to_string())
		);
		assert!(!descriptor.pk_class_ids().contains_key("emp"));
		assert_eq!(
			descriptor.validate_pk_class_id("other", "bool", &NominalKeyCompatibility, &registry),
			Ok(())
		);
		assert_eq!(
			descriptor.validate_pk_class_id("name", "String", &NominalKeyCompatibility, &registry),
			Ok(())
		);
		assert!(descriptor.pk_class_ids().is_empty());
	}

	#[rstest]
	fn test_accessor_for_looks_into_embedded_id() {
		let descriptor = EntityDescriptor::new("Dependent", "DEPENDENT").with_accessor(
			EmbeddedIdAccessor::new("id", "DependentId")
				.with_basic(BasicAccessor::new("name", "String"))
				.with_derived_id_class(
					DerivedIdClassAccessor::new("empPK", "EmployeeId")
						.with_column(DerivedIdField::new("EMP_ID")),
				),
		);

		assert!(descriptor.accessor("name").is_none());
		assert!(descriptor.accessor_for("name").is_some_and(MappingAccessor::is_basic));
		assert!(
			descriptor
				.accessor_for("empPK")
				.is_some_and(MappingAccessor::is_derived_id_class)
		);
		assert_eq!(descriptor.key_class_name(), Some("DependentId"));
	}
}
