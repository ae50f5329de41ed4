//! # entmap
//!
//! Mapping metadata for entity classes.
//!
//! entmap turns entity descriptors into resolved mapping metadata: the
//! inheritance hierarchy of every class, primary keys derived through
//! to-one relationships, the join columns of each relationship and its
//! indirection policy.
//!
//! ## Crates
//!
//! - [`conf`]: layered settings (defaults, settings file, `ENTMAP_*` environment)
//! - [`metadata`]: descriptors, hierarchy building and metadata processing
//!
//! ## Feature Flags
//!
//! - `loader` (default): read projects from TOML or JSON files
//!
//! ## Quick Example
//!
//! ```
//! use entmap::prelude::*;
//!
//! let project = MetadataProject::new()
//!     .with_descriptor(
//!         EntityDescriptor::new("Employee", "EMPLOYEE")
//!             .with_accessor(BasicAccessor::new("id", "i64").id()),
//!     )
//!     .with_descriptor(
//!         EntityDescriptor::new("Dependent", "DEPENDENT")
//!             .with_accessor(BasicAccessor::new("name", "String").id())
//!             .with_accessor(
//!                 ObjectAccessor::many_to_one("employee", "Employee").with_metadata(
//!                     RelationshipMetadata {
//!                         id: true,
//!                         ..RelationshipMetadata::default()
//!                     },
//!                 ),
//!             ),
//!     );
//!
//! let mapped = MetadataProcessor::new(MetadataSettings::default()).process(project)?;
//! let dependent = mapped.descriptor("Dependent").unwrap();
//!
//! assert_eq!(dependent.primary_key_field_names(), vec!["NAME", "EMPLOYEE_ID"]);
//! # Ok::<(), MetadataError>(())
//! ```

pub use entmap_conf as conf;
pub use entmap_metadata as metadata;

pub use entmap_conf::{MetadataSettings, SettingsError};
pub use entmap_metadata::{MappedProject, MetadataError, MetadataProcessor, MetadataProject};

pub mod prelude {
	pub use entmap_metadata::prelude::*;
}
