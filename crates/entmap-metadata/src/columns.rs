//! Join column declarations
//!
//! These are the pre-parsed forms of join-column and primary-key
//! join-column declarations. Unset names are defaulted during relationship
//! processing.

use serde::{Deserialize, Serialize};

use crate::fields::{DatabaseField, DatabaseTable};

fn default_true() -> bool {
	true
}

/// A foreign key join column of a to-one relationship
///
/// # Examples
///
/// ```
/// use entmap_metadata::columns::JoinColumn;
///
/// let column = JoinColumn::named("MGR_ID").referencing("EMP_ID");
/// assert_eq!(column.name.as_deref(), Some("MGR_ID"));
/// assert!(column.insertable && column.updatable);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinColumn {
	/// Local foreign key column
	#[serde(default)]
	pub name: Option<String>,
	/// Referenced primary key column of the target entity
	#[serde(default)]
	pub referenced_column_name: Option<String>,
	/// Table holding the foreign key column, the owner's primary table when unset
	#[serde(default)]
	pub table: Option<String>,
	#[serde(default = "default_true")]
	pub insertable: bool,
	#[serde(default = "default_true")]
	pub updatable: bool,
}

impl Default for JoinColumn {
	fn default() -> Self {
		Self {
			name: None,
			referenced_column_name: None,
			table: None,
			insertable: true,
			updatable: true,
		}
	}
}

impl JoinColumn {
	pub fn named(name: impl Into<String>) -> Self {
		Self {
			name: Some(name.into()),
			..Self::default()
		}
	}

	pub fn referencing(mut self, column: impl Into<String>) -> Self {
		self.referenced_column_name = Some(column.into());
		self
	}

	pub fn in_table(mut self, table: impl Into<String>) -> Self {
		self.table = Some(table.into());
		self
	}

	pub fn read_only(mut self) -> Self {
		self.insertable = false;
		self.updatable = false;
		self
	}

	/// Whether writes through this column are disabled
	pub fn is_read_only(&self) -> bool {
		!self.insertable || !self.updatable
	}

	pub fn foreign_key_field(&self) -> DatabaseField {
		let field = DatabaseField::new(self.name.clone().unwrap_or_default());
		match &self.table {
			Some(table) => field.with_table(DatabaseTable::new(table.clone())),
			None => field,
		}
	}

	pub fn primary_key_field(&self) -> DatabaseField {
		DatabaseField::new(self.referenced_column_name.clone().unwrap_or_default())
	}
}

/// A primary-key join column: the owner's primary key column joined to the
/// target's primary key column
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKeyJoinColumn {
	/// Local primary key column
	#[serde(default)]
	pub name: Option<String>,
	/// Referenced primary key column of the target entity
	#[serde(default)]
	pub referenced_column_name: Option<String>,
}

impl PrimaryKeyJoinColumn {
	pub fn new(name: Option<&str>, referenced_column_name: Option<&str>) -> Self {
		Self {
			name: name.map(str::to_string),
			referenced_column_name: referenced_column_name.map(str::to_string),
		}
	}

	pub fn foreign_key_field(&self) -> DatabaseField {
		DatabaseField::new(self.name.clone().unwrap_or_default())
	}

	pub fn primary_key_field(&self) -> DatabaseField {
		DatabaseField::new(self.referenced_column_name.clone().unwrap_or_default())
	}
}
