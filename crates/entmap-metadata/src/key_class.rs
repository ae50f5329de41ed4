//! Composite key classes and their compatibility policies
//!
//! A key class is the dedicated type of a composite primary key: an ordered
//! set of field names with their declared types. When a derived id reaches a
//! reference whose key class differs from the owner's, a
//! [`KeyCompatibility`] policy decides whether the two may be joined.
//!
//! # Examples
//!
//! ```
//! use entmap_metadata::key_class::{
//!     KeyClass, KeyClassRegistry, KeyCompatibility, StructuralKeyCompatibility,
//! };
//!
//! let mut registry = KeyClassRegistry::new();
//! registry.register(KeyClass::new("EmpPK").with_field("id", "i64"));
//! registry.register(KeyClass::new("LegacyEmpPK").with_field("id", "i64"));
//!
//! assert!(StructuralKeyCompatibility.is_compatible("EmpPK", "LegacyEmpPK", &registry));
//! ```

use entmap_conf::KeyCompatibilityPolicy;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A declared composite key class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyClass {
	name: String,
	#[serde(default)]
	fields: IndexMap<String, String>,
}

impl KeyClass {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			fields: IndexMap::new(),
		}
	}

	pub fn with_field(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
		self.fields.insert(name.into(), type_name.into());
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Field name to declared type, in declaration order
	pub fn fields(&self) -> &IndexMap<String, String> {
		&self.fields
	}

	pub fn field_type(&self, field: &str) -> Option<&str> {
		self.fields.get(field).map(String::as_str)
	}
}

/// Key classes known to one project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct KeyClassRegistry {
	classes: IndexMap<String, KeyClass>,
}

impl KeyClassRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a key class, returning the one it replaces
	pub fn register(&mut self, key_class: KeyClass) -> Option<KeyClass> {
		self.classes.insert(key_class.name.clone(), key_class)
	}

	pub fn get(&self, name: &str) -> Option<&KeyClass> {
		self.classes.get(name)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.classes.contains_key(name)
	}

	pub fn iter(&self) -> impl Iterator<Item = &KeyClass> {
		self.classes.values()
	}

	pub fn len(&self) -> usize {
		self.classes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.classes.is_empty()
	}
}

impl FromIterator<KeyClass> for KeyClassRegistry {
	fn from_iter<T: IntoIterator<Item = KeyClass>>(iter: T) -> Self {
		let mut registry = Self::new();
		for key_class in iter {
			registry.register(key_class);
		}
		registry
	}
}

/// Decides whether a declared key attribute type accepts a resolved one
pub trait KeyCompatibility: fmt::Debug + Send + Sync {
	fn is_compatible(&self, declared: &str, resolved: &str, key_classes: &KeyClassRegistry) -> bool;

	/// Short policy name for diagnostics
	fn name(&self) -> &'static str;
}

/// Types are compatible only when their names are equal
#[derive(Debug, Clone, Copy, Default)]
pub struct NominalKeyCompatibility;

impl KeyCompatibility for NominalKeyCompatibility {
	fn is_compatible(&self, declared: &str, resolved: &str, _key_classes: &KeyClassRegistry) -> bool {
		declared == resolved
	}

	fn name(&self) -> &'static str {
		"nominal"
	}
}

/// Equal names, or two registered key classes with the same fields and
/// field types
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralKeyCompatibility;

impl KeyCompatibility for StructuralKeyCompatibility {
	fn is_compatible(&self, declared: &str, resolved: &str, key_classes: &KeyClassRegistry) -> bool {
		if declared == resolved {
			return true;
		}
		match (key_classes.get(declared), key_classes.get(resolved)) {
			// IndexMap equality ignores order; field order matters for keys
			(Some(left), Some(right)) => left.fields.iter().eq(right.fields.iter()),
			_ => false,
		}
	}

	fn name(&self) -> &'static str {
		"structural"
	}
}

/// Policy object for a configured compatibility setting
pub fn compatibility_for(policy: KeyCompatibilityPolicy) -> Box<dyn KeyCompatibility> {
	match policy {
		KeyCompatibilityPolicy::Nominal => Box::new(NominalKeyCompatibility),
		KeyCompatibilityPolicy::Structural => Box::new(StructuralKeyCompatibility),
	}
}
