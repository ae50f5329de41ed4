//! Metadata build errors
//!
//! Every variant is fatal to the metadata build of a project and names the
//! offending class and, where there is one, the attribute.

use thiserror::Error;

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
	/// The reference entity has a composite key class but the owner declares none
	#[error(
		"Invalid composite primary key on {class}: the derived id requires the primary key class {key_class}"
	)]
	MissingCompositeKeyClass { class: String, key_class: String },

	/// Owner and reference declare different, incompatible composite key classes
	#[error(
		"Incompatible primary key classes on {class}.{attribute}: {owner_key_class} does not declare a field compatible with {reference_key_class}"
	)]
	IncompatiblePrimaryKeyClasses {
		class: String,
		attribute: String,
		owner_key_class: String,
		reference_key_class: String,
	},

	/// A key class attribute has a type other than the resolved derived key type
	#[error(
		"Invalid composite primary key attribute {attribute} of {key_class} on {class}: declared {expected}, resolved {found}"
	)]
	InvalidCompositeKeyAttribute {
		class: String,
		key_class: String,
		attribute: String,
		expected: String,
		found: String,
	},

	/// A named mapped-by-id value does not resolve to an accessor of the owner
	#[error("Invalid mapped-by-id value '{value}' on {class}.{attribute}")]
	InvalidMappedByIdValue {
		class: String,
		attribute: String,
		value: String,
	},

	/// The mapped-by-id accessor is neither basic nor a derived-id class
	#[error(
		"Unsupported mapped-by-id target '{value}' on {class}.{attribute}: a {kind} accessor cannot carry a derived id"
	)]
	UnsupportedMappedByIdAccessorKind {
		class: String,
		attribute: String,
		value: String,
		kind: String,
	},

	/// A whole-key mapped-by-id against a composite key needs an embedded id
	#[error("{class}.{attribute} maps a composite key but {class} has no embedded id")]
	MissingEmbeddedId { class: String, attribute: String },

	/// A reference key column has no counterpart in the derived-id fields
	#[error("{class}.{attribute} leaves the reference key column {column} unmapped")]
	UnmappedDerivedIdColumn {
		class: String,
		attribute: String,
		column: String,
	},

	/// Join columns against a composite key are missing or incomplete
	#[error(
		"Incomplete join columns on {class}.{attribute}: {reference} has a composite primary key of {expected} columns"
	)]
	IncompleteJoinColumns {
		class: String,
		attribute: String,
		reference: String,
		expected: usize,
	},

	/// An entity without primary key fields was asked for one
	#[error("Entity {class} has no primary key")]
	MissingPrimaryKey { class: String },

	/// A relationship references a class that has no descriptor
	#[error("{class}.{attribute} references unknown entity {reference}")]
	UnknownEntity {
		class: String,
		attribute: String,
		reference: String,
	},

	/// Derived ids depend on each other in a cycle
	#[error("Circular derived id dependency: {}", cycle.join(" -> "))]
	CircularDerivedId { cycle: Vec<String> },

	/// An entity is its own transitive ancestor
	#[error("Inheritance cycle detected at {class}: {}", chain.join(" -> "))]
	InheritanceCycle { class: String, chain: Vec<String> },
}

pub type Result<T> = std::result::Result<T, MetadataError>;

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_missing_composite_key_class_names_owner() {
		let error = MetadataError::MissingCompositeKeyClass {
			class: "Dependent".to_string(),
			key_class: "EmployeeId".to_string(),
		};
		let message = error.to_string();
		assert!(message.contains("Dependent"));
		assert!(message.contains("EmployeeId"));
	}

	#[rstest]
	fn test_cycle_message_lists_path() {
		let error = MetadataError::CircularDerivedId {
			cycle: vec!["A".to_string(), "B".to_string(), "A".to_string()],
		};
		assert_eq!(error.to_string(), "Circular derived id dependency: A -> B -> A");
	}
}
