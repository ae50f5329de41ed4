//! Physical tables and columns referenced by mappings

use serde::{Deserialize, Serialize};
use std::fmt;

/// A database table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatabaseTable {
	name: String,
}

impl DatabaseTable {
	pub fn new(name: impl Into<String>) -> Self {
		Self { name: name.into() }
	}

	pub fn name(&self) -> &str {
		&self.name
	}
}

impl fmt::Display for DatabaseTable {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.name)
	}
}

/// A database column, optionally bound to its table
///
/// A field with an empty name is "unnamed": join-column processing replaces
/// the name with a default.
///
/// # Examples
///
/// ```
/// use entmap_metadata::fields::{DatabaseField, DatabaseTable};
///
/// let field = DatabaseField::new("ID").with_table(DatabaseTable::new("EMPLOYEE"));
/// assert_eq!(field.qualified_name(), "EMPLOYEE.ID");
/// assert!(DatabaseField::unnamed().is_unnamed());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatabaseField {
	name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	table: Option<DatabaseTable>,
}

impl DatabaseField {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			table: None,
		}
	}

	pub fn unnamed() -> Self {
		Self::new("")
	}

	pub fn with_table(mut self, table: DatabaseTable) -> Self {
		self.table = Some(table);
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn set_name(&mut self, name: impl Into<String>) {
		self.name = name.into();
	}

	pub fn table(&self) -> Option<&DatabaseTable> {
		self.table.as_ref()
	}

	pub fn set_table(&mut self, table: DatabaseTable) {
		self.table = Some(table);
	}

	pub fn is_unnamed(&self) -> bool {
		self.name.is_empty()
	}

	/// `TABLE.COLUMN`, or just the column when unbound
	pub fn qualified_name(&self) -> String {
		match &self.table {
			Some(table) => format!("{}.{}", table, self.name),
			None => self.name.clone(),
		}
	}
}

impl fmt::Display for DatabaseField {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.qualified_name())
	}
}
