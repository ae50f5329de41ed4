//! Attribute accessors
//!
//! An accessor describes how one attribute of an entity is mapped. Basic
//! accessors map a column, object accessors a to-one relationship, and the
//! embedded kinds a composite primary key.

pub mod basic;
pub mod embedded;
pub mod object;

use serde::Serialize;

pub use basic::BasicAccessor;
pub use embedded::{DerivedIdClassAccessor, DerivedIdField, EmbeddedIdAccessor};
pub use object::ObjectAccessor;

/// Any accessor of an entity attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MappingAccessor {
	Basic(BasicAccessor),
	Object(ObjectAccessor),
	DerivedIdClass(DerivedIdClassAccessor),
	EmbeddedId(EmbeddedIdAccessor),
}

impl MappingAccessor {
	pub fn attribute_name(&self) -> &str {
		match self {
			MappingAccessor::Basic(accessor) => accessor.attribute_name(),
			MappingAccessor::Object(accessor) => accessor.attribute_name(),
			MappingAccessor::DerivedIdClass(accessor) => accessor.attribute_name(),
			MappingAccessor::EmbeddedId(accessor) => accessor.attribute_name(),
		}
	}

	/// Kind name used in diagnostics
	pub fn kind_name(&self) -> &'static str {
		match self {
			MappingAccessor::Basic(_) => "basic",
			MappingAccessor::Object(accessor) => accessor.kind().as_str(),
			MappingAccessor::DerivedIdClass(_) => "derived id class",
			MappingAccessor::EmbeddedId(_) => "embedded id",
		}
	}

	pub fn is_basic(&self) -> bool {
		matches!(self, MappingAccessor::Basic(_))
	}

	pub fn is_derived_id_class(&self) -> bool {
		matches!(self, MappingAccessor::DerivedIdClass(_))
	}

	pub fn as_basic(&self) -> Option<&BasicAccessor> {
		match self {
			MappingAccessor::Basic(accessor) => Some(accessor),
			_ => None,
		}
	}

	pub fn as_object(&self) -> Option<&ObjectAccessor> {
		match self {
			MappingAccessor::Object(accessor) => Some(accessor),
			_ => None,
		}
	}

	pub fn as_embedded_id(&self) -> Option<&EmbeddedIdAccessor> {
		match self {
			MappingAccessor::EmbeddedId(accessor) => Some(accessor),
			_ => None,
		}
	}

	/// Whether this accessor contributes to its entity's own identity
	pub fn is_identity(&self) -> bool {
		match self {
			MappingAccessor::Basic(accessor) => accessor.is_id(),
			MappingAccessor::Object(accessor) => accessor.is_derived_id(),
			MappingAccessor::DerivedIdClass(_) => false,
			MappingAccessor::EmbeddedId(_) => true,
		}
	}
}

impl From<BasicAccessor> for MappingAccessor {
	fn from(accessor: BasicAccessor) -> Self {
		MappingAccessor::Basic(accessor)
	}
}

impl From<ObjectAccessor> for MappingAccessor {
	fn from(accessor: ObjectAccessor) -> Self {
		MappingAccessor::Object(accessor)
	}
}

impl From<DerivedIdClassAccessor> for MappingAccessor {
	fn from(accessor: DerivedIdClassAccessor) -> Self {
		MappingAccessor::DerivedIdClass(accessor)
	}
}

impl From<EmbeddedIdAccessor> for MappingAccessor {
	fn from(accessor: EmbeddedIdAccessor) -> Self {
		MappingAccessor::EmbeddedId(accessor)
	}
}
