//! Produced relationship mappings
//!
//! A [`OneToOneMapping`] is the output of processing one to-one relationship
//! accessor. Many-to-one relationships produce the same mapping type.

use serde::Serialize;

use crate::accessors::object::{CascadeType, JoinFetchType};
use crate::fields::DatabaseField;

/// How the related object is loaded
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndirectionPolicy {
	/// Loaded together with the owner
	#[default]
	None,
	/// Loaded on first access through a value holder
	Basic,
	/// Loaded on first access through woven property accessors
	Weaved { set_method: String },
}

impl IndirectionPolicy {
	pub fn uses_indirection(&self) -> bool {
		!matches!(self, IndirectionPolicy::None)
	}
}

/// Operations cascaded to the related object
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CascadePolicy {
	pub persist: bool,
	pub merge: bool,
	pub remove: bool,
	pub refresh: bool,
	pub detach: bool,
}

impl CascadePolicy {
	pub fn all() -> Self {
		Self {
			persist: true,
			merge: true,
			remove: true,
			refresh: true,
			detach: true,
		}
	}

	pub fn apply(&mut self, cascade: CascadeType) {
		match cascade {
			CascadeType::All => *self = Self::all(),
			CascadeType::Persist => self.persist = true,
			CascadeType::Merge => self.merge = true,
			CascadeType::Remove => self.remove = true,
			CascadeType::Refresh => self.refresh = true,
			CascadeType::Detach => self.detach = true,
		}
	}

	pub fn is_empty(&self) -> bool {
		*self == Self::default()
	}
}

/// One source column on the owner joined to one target column on the
/// reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeyPair {
	pub source: DatabaseField,
	pub target: DatabaseField,
}

/// Accessor methods used with property access
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessorMethods {
	pub get_method: String,
	pub set_method: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OneToOneMapping {
	pub attribute_name: String,
	pub reference_class_name: String,
	pub read_only: bool,
	pub private_owned: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub join_fetch: Option<JoinFetchType>,
	pub optional: bool,
	pub derived_id: bool,
	/// Declared fetch type is lazy; see `indirection` for what is applied
	pub lazy: bool,
	pub indirection: IndirectionPolicy,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub accessor_methods: Option<AccessorMethods>,
	#[serde(skip_serializing_if = "CascadePolicy::is_empty")]
	pub cascade: CascadePolicy,
	pub foreign_keys: Vec<ForeignKeyPair>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub mapped_by_id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub mapped_by: Option<String>,
}

impl OneToOneMapping {
	pub fn new(attribute_name: impl Into<String>, reference_class_name: impl Into<String>) -> Self {
		Self {
			attribute_name: attribute_name.into(),
			reference_class_name: reference_class_name.into(),
			read_only: false,
			private_owned: false,
			join_fetch: None,
			optional: true,
			derived_id: false,
			lazy: false,
			indirection: IndirectionPolicy::None,
			accessor_methods: None,
			cascade: CascadePolicy::default(),
			foreign_keys: Vec::new(),
			mapped_by_id: None,
			mapped_by: None,
		}
	}

	pub fn add_foreign_key_field(&mut self, source: DatabaseField, target: DatabaseField) {
		self.foreign_keys.push(ForeignKeyPair { source, target });
	}

	/// Source columns on the owner, in declaration order
	pub fn foreign_key_fields(&self) -> impl Iterator<Item = &DatabaseField> {
		self.foreign_keys.iter().map(|pair| &pair.source)
	}

	pub fn target_fields(&self) -> impl Iterator<Item = &DatabaseField> {
		self.foreign_keys.iter().map(|pair| &pair.target)
	}

	/// Whether the mapping owns a foreign key
	pub fn is_owning(&self) -> bool {
		self.mapped_by.is_none()
	}

	pub fn uses_indirection(&self) -> bool {
		self.indirection.uses_indirection()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_cascade_all_sets_every_operation() {
		let mut cascade = CascadePolicy::default();
		cascade.apply(CascadeType::All);
		assert_eq!(cascade, CascadePolicy::all());
	}

	#[rstest]
	fn test_cascade_is_additive() {
		let mut cascade = CascadePolicy::default();
		cascade.apply(CascadeType::Persist);
		cascade.apply(CascadeType::Remove);
		assert!(cascade.persist && cascade.remove);
		assert!(!cascade.merge);
	}

	#[rstest]
	fn test_new_mapping_is_eager_and_optional() {
		let mapping = OneToOneMapping::new("manager", "Employee");
		assert!(mapping.optional);
		assert!(!mapping.lazy);
		assert!(!mapping.uses_indirection());
		assert!(mapping.is_owning());
	}
}
