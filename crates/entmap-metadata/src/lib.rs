//! # entmap-metadata
//!
//! Mapping metadata for entity classes: inheritance hierarchies, derived
//! ids and composite keys, and the join columns of to-one relationships.
//!
//! Metadata arrives as typed records ([`EntityDescriptor`] with its
//! [`MappingAccessor`]s) grouped in a [`MetadataProject`]. The
//! [`MetadataProcessor`] resolves every identity and relationship and
//! returns a read-only [`MappedProject`].
//!
//! ## Features
//!
//! - `loader` (default): read projects from TOML or JSON files
//!
//! ## Examples
//!
//! ```
//! use entmap_metadata::prelude::*;
//!
//! let project = MetadataProject::new()
//!     .with_descriptor(
//!         EntityDescriptor::new("Employee", "EMPLOYEE")
//!             .with_accessor(BasicAccessor::new("id", "i64").id()),
//!     )
//!     .with_descriptor(
//!         EntityDescriptor::new("Manager", "MANAGER").with_parent("Employee"),
//!     );
//!
//! let mapped = MetadataProcessor::new(MetadataSettings::default()).process(project)?;
//!
//! assert_eq!(mapped.hierarchy().parent_of("Manager"), Some("Employee"));
//! let manager = mapped.descriptor("Manager").unwrap();
//! assert_eq!(manager.primary_key_fields()[0].qualified_name(), "MANAGER.ID");
//! # Ok::<(), MetadataError>(())
//! ```

pub mod accessors;
pub mod columns;
pub mod derived_id;
pub mod descriptor;
pub mod error;
pub mod fields;
pub mod hierarchy;
pub mod key_class;
pub mod logger;
pub mod mapping;
pub mod processor;
pub mod project;

pub use accessors::{
	BasicAccessor, DerivedIdClassAccessor, DerivedIdField, EmbeddedIdAccessor, MappingAccessor,
	ObjectAccessor,
};
pub use descriptor::EntityDescriptor;
pub use entmap_conf::AccessType;
pub use error::{MetadataError, Result};
pub use hierarchy::{HierarchyNode, HierarchyTree, InheritanceHierarchyBuilder};
pub use mapping::{IndirectionPolicy, OneToOneMapping};
pub use processor::{MappedProject, MetadataProcessor};
pub use project::{MetadataProject, ProjectLoadError};

pub mod prelude {
	pub use crate::accessors::object::{CascadeType, FetchType, RelationshipMetadata};
	pub use crate::accessors::{
		BasicAccessor, DerivedIdClassAccessor, DerivedIdField, EmbeddedIdAccessor, MappingAccessor,
		ObjectAccessor,
	};
	pub use crate::columns::{JoinColumn, PrimaryKeyJoinColumn};
	pub use crate::descriptor::{EntityDescriptor, InheritancePolicy, InheritanceStrategy};
	pub use crate::error::MetadataError;
	pub use crate::hierarchy::{HierarchyTree, InheritanceHierarchyBuilder};
	pub use crate::key_class::{KeyClass, KeyCompatibility};
	pub use crate::mapping::{IndirectionPolicy, OneToOneMapping};
	pub use crate::processor::{MappedProject, MetadataProcessor};
	pub use crate::project::MetadataProject;
	pub use entmap_conf::{AccessType, MetadataSettings};
}
