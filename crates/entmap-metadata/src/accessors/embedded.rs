//! Embedded primary key accessors
//!
//! An [`EmbeddedIdAccessor`] holds the attributes of an embedded composite
//! key. Inside it, a [`DerivedIdClassAccessor`] is an attribute whose type is
//! the key class of a parent entity: its columns carry the parent's key.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::accessors::{BasicAccessor, MappingAccessor};
use crate::descriptor::EntityDescriptor;
use crate::error::{MetadataError, Result};
use crate::fields::DatabaseField;
use crate::mapping::OneToOneMapping;

/// One column of a derived id, optionally naming the parent key column it
/// carries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedIdField {
	pub column: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub references: Option<String>,
}

impl DerivedIdField {
	pub fn new(column: impl Into<String>) -> Self {
		Self {
			column: column.into(),
			references: None,
		}
	}

	pub fn referencing(mut self, column: impl Into<String>) -> Self {
		self.references = Some(column.into());
		self
	}

	fn carries(&self, reference_column: &str) -> bool {
		match &self.references {
			Some(references) => references == reference_column,
			None => self.column == reference_column,
		}
	}
}

/// Embedded-id attribute typed by a parent entity's key class
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedIdClassAccessor {
	attribute_name: String,
	key_class: String,
	columns: Vec<DerivedIdField>,
}

impl DerivedIdClassAccessor {
	pub fn new(attribute_name: impl Into<String>, key_class: impl Into<String>) -> Self {
		Self {
			attribute_name: attribute_name.into(),
			key_class: key_class.into(),
			columns: Vec::new(),
		}
	}

	pub fn with_column(mut self, column: DerivedIdField) -> Self {
		self.columns.push(column);
		self
	}

	pub fn attribute_name(&self) -> &str {
		&self.attribute_name
	}

	pub fn key_class(&self) -> &str {
		&self.key_class
	}

	pub fn columns(&self) -> &[DerivedIdField] {
		&self.columns
	}
}

/// A composite primary key embedded in the entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbeddedIdAccessor {
	attribute_name: String,
	key_class: String,
	attributes: IndexMap<String, MappingAccessor>,
}

impl EmbeddedIdAccessor {
	pub fn new(attribute_name: impl Into<String>, key_class: impl Into<String>) -> Self {
		Self {
			attribute_name: attribute_name.into(),
			key_class: key_class.into(),
			attributes: IndexMap::new(),
		}
	}

	pub fn with_basic(mut self, accessor: BasicAccessor) -> Self {
		self.attributes
			.insert(accessor.attribute_name().to_string(), accessor.into());
		self
	}

	pub fn with_derived_id_class(mut self, accessor: DerivedIdClassAccessor) -> Self {
		self.attributes
			.insert(accessor.attribute_name().to_string(), accessor.into());
		self
	}

	pub fn attribute_name(&self) -> &str {
		&self.attribute_name
	}

	pub fn key_class(&self) -> &str {
		&self.key_class
	}

	pub fn attributes(&self) -> impl Iterator<Item = &MappingAccessor> {
		self.attributes.values()
	}

	pub fn attribute(&self, name: &str) -> Option<&MappingAccessor> {
		self.attributes.get(name)
	}

	/// Every column of the key, basic attributes and derived-id class
	/// columns alike
	pub fn derived_id_fields(&self) -> Vec<DerivedIdField> {
		let mut fields = Vec::new();
		for accessor in self.attributes.values() {
			match accessor {
				MappingAccessor::Basic(basic) => fields.push(DerivedIdField::new(basic.column_name())),
				MappingAccessor::DerivedIdClass(derived) => {
					fields.extend(derived.columns.iter().cloned())
				}
				_ => {}
			}
		}
		fields
	}

	/// Key columns bound to the owner's primary table
	pub fn primary_key_fields(&self, owner: &EntityDescriptor) -> Vec<DatabaseField> {
		self.derived_id_fields()
			.into_iter()
			.map(|field| DatabaseField::new(field.column).with_table(owner.primary_table().clone()))
			.collect()
	}
}

/// Join every primary key column of `reference` to the derived-id field
/// that carries it
///
/// A field carries a reference column when it names it in `references`, or,
/// without `references`, when both columns have the same name.
pub fn process_derived_id_fields(
	owner: &EntityDescriptor,
	attribute: &str,
	reference: &EntityDescriptor,
	fields: &[DerivedIdField],
	mapping: &mut OneToOneMapping,
) -> Result<()> {
	for reference_field in reference.primary_key_fields() {
		let field = fields
			.iter()
			.find(|field| field.carries(reference_field.name()))
			.ok_or_else(|| MetadataError::UnmappedDerivedIdColumn {
				class: owner.name().to_string(),
				attribute: attribute.to_string(),
				column: reference_field.name().to_string(),
			})?;

		mapping.add_foreign_key_field(
			DatabaseField::new(field.column.clone()).with_table(owner.primary_table().clone()),
			reference_field.clone(),
		);
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_derived_id_fields_flatten_nested_columns() {
		let embedded = EmbeddedIdAccessor::new("id", "DependentId")
			.with_basic(BasicAccessor::new("name", "String"))
			.with_derived_id_class(
				DerivedIdClassAccessor::new("emp", "EmployeeId")
					.with_column(DerivedIdField::new("FIRST_NAME"))
					.with_column(DerivedIdField::new("EMP_LAST").referencing("LAST_NAME")),
			);

		let columns: Vec<_> = embedded
			.derived_id_fields()
			.into_iter()
			.map(|field| field.column)
			.collect();
		assert_eq!(columns, vec!["NAME", "FIRST_NAME", "EMP_LAST"]);
	}

	#[rstest]
	#[case(DerivedIdField::new("ID"), "ID", true)]
	#[case(DerivedIdField::new("EMP_ID").referencing("ID"), "ID", true)]
	#[case(DerivedIdField::new("ID").referencing("OTHER"), "ID", false)]
	fn test_carries(#[case] field: DerivedIdField, #[case] column: &str, #[case] expected: bool) {
		assert_eq!(field.carries(column), expected);
	}
}
