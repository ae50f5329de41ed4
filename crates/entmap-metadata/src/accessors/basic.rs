use serde::Serialize;

use crate::fields::{DatabaseField, DatabaseTable};

/// A single-column attribute
///
/// # Examples
///
/// ```
/// use entmap_metadata::accessors::BasicAccessor;
///
/// let id = BasicAccessor::new("empId", "i64").id();
/// assert_eq!(id.column_name(), "EMPID");
///
/// let named = BasicAccessor::new("name", "String").with_column("EMP_NAME");
/// assert_eq!(named.column_name(), "EMP_NAME");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BasicAccessor {
	attribute_name: String,
	raw_type: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	column: Option<String>,
	id: bool,
}

impl BasicAccessor {
	pub fn new(attribute_name: impl Into<String>, raw_type: impl Into<String>) -> Self {
		Self {
			attribute_name: attribute_name.into(),
			raw_type: raw_type.into(),
			column: None,
			id: false,
		}
	}

	pub fn with_column(mut self, column: impl Into<String>) -> Self {
		self.column = Some(column.into());
		self
	}

	/// Mark the attribute as (part of) the primary key
	pub fn id(mut self) -> Self {
		self.id = true;
		self
	}

	pub fn set_id(&mut self, id: bool) {
		self.id = id;
	}

	pub fn attribute_name(&self) -> &str {
		&self.attribute_name
	}

	pub fn raw_type(&self) -> &str {
		&self.raw_type
	}

	pub fn is_id(&self) -> bool {
		self.id
	}

	/// Declared column, or the upper-cased attribute name
	pub fn column_name(&self) -> String {
		self.column
			.clone()
			.unwrap_or_else(|| self.attribute_name.to_uppercase())
	}

	pub fn field(&self, table: &DatabaseTable) -> DatabaseField {
		DatabaseField::new(self.column_name()).with_table(table.clone())
	}
}
