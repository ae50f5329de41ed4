//! Metadata processing of one project
//!
//! [`MetadataProcessor::process`] moves the descriptors of a
//! [`MetadataProject`] into a [`BuildContext`], runs the phases below over it
//! and freezes the result into a read-only [`MappedProject`]:
//!
//! 1. inheritance hierarchy, checked against the configured cycle policy
//! 2. declared identities: key class attributes, basic ids, embedded ids
//! 3. derived ids, depth-first (see [`crate::derived_id`])
//! 4. the remaining relationships
//!
//! # Examples
//!
//! ```
//! use entmap_conf::MetadataSettings;
//! use entmap_metadata::accessors::{BasicAccessor, ObjectAccessor};
//! use entmap_metadata::descriptor::EntityDescriptor;
//! use entmap_metadata::processor::MetadataProcessor;
//! use entmap_metadata::project::MetadataProject;
//!
//! let project = MetadataProject::new().with_descriptor(
//!     EntityDescriptor::new("Employee", "EMPLOYEE")
//!         .with_accessor(BasicAccessor::new("id", "i64").id())
//!         .with_accessor(ObjectAccessor::one_to_one("manager", "Employee")),
//! );
//!
//! let mapped = MetadataProcessor::new(MetadataSettings::default())
//!     .process(project)
//!     .unwrap();
//! let employee = mapped.descriptor("Employee").unwrap();
//!
//! assert_eq!(employee.primary_key_field_names(), vec!["ID"]);
//! assert_eq!(
//!     employee.mapping("manager").unwrap().foreign_keys[0].source.name(),
//!     "MANAGER_ID"
//! );
//! ```

use entmap_conf::{CyclePolicy, MetadataSettings};
use indexmap::IndexMap;
use serde::Serialize;

use crate::accessors::MappingAccessor;
use crate::derived_id::DerivedIdResolver;
use crate::descriptor::EntityDescriptor;
use crate::error::{MetadataError, Result};
use crate::hierarchy::{HierarchyTree, InheritanceHierarchyBuilder};
use crate::key_class::{KeyClassRegistry, KeyCompatibility, compatibility_for};
use crate::logger::MetadataLogger;
use crate::project::MetadataProject;

/// Mutable state of one metadata build
///
/// Created at the start of [`MetadataProcessor::process`] and consumed by
/// [`BuildContext::freeze`].
pub struct BuildContext<'a> {
	pub(crate) name: Option<String>,
	pub(crate) descriptors: IndexMap<String, EntityDescriptor>,
	pub(crate) key_classes: KeyClassRegistry,
	pub(crate) hierarchy: HierarchyTree,
	pub(crate) settings: &'a MetadataSettings,
	pub(crate) compatibility: &'a dyn KeyCompatibility,
	pub(crate) logger: &'a MetadataLogger,
}

impl<'a> BuildContext<'a> {
	pub fn new(
		project: MetadataProject,
		settings: &'a MetadataSettings,
		compatibility: &'a dyn KeyCompatibility,
		logger: &'a MetadataLogger,
	) -> Self {
		let (name, descriptors, key_classes) = project.into_parts();
		Self {
			name,
			descriptors,
			key_classes,
			hierarchy: HierarchyTree::new(),
			settings,
			compatibility,
			logger,
		}
	}

	pub fn descriptor(&self, class_name: &str) -> Option<&EntityDescriptor> {
		self.descriptors.get(class_name)
	}

	pub fn hierarchy(&self) -> &HierarchyTree {
		&self.hierarchy
	}

	/// Build the hierarchy tree and apply the cycle policy
	pub fn build_hierarchy(&mut self) -> Result<()> {
		self.hierarchy = InheritanceHierarchyBuilder::build(self.descriptors.values());

		if let Err(error) = self.hierarchy.validate_acyclic() {
			match self.settings.hierarchy_cycle_policy {
				CyclePolicy::Reject => return Err(error),
				CyclePolicy::Permit => {
					let element = match &error {
						MetadataError::InheritanceCycle { class, .. } => class.clone(),
						_ => String::new(),
					};
					self.logger.log_warning(&element, &error.to_string());
				}
			}
		}

		self.logger.log_phase("hierarchy", self.hierarchy.len());
		Ok(())
	}

	/// Register the identities entities declare themselves
	///
	/// Pending key class attributes come from the registered id class. Basic
	/// ids and embedded id columns become primary key fields.
	pub fn initialize_identities(&mut self) -> Result<()> {
		let compatibility = self.compatibility;
		let key_classes = &self.key_classes;

		for descriptor in self.descriptors.values_mut() {
			if let Some(key_class) = descriptor.id_class().and_then(|name| key_classes.get(name)) {
				descriptor.set_pk_class_ids(key_class.fields().clone());
			}

			let table = descriptor.primary_table().clone();
			let basic_ids: Vec<_> = descriptor
				.accessors()
				.filter_map(MappingAccessor::as_basic)
				.filter(|basic| basic.is_id())
				.map(|basic| {
					(
						basic.attribute_name().to_string(),
						basic.raw_type().to_string(),
						basic.field(&table),
					)
				})
				.collect();

			for (attribute, raw_type, field) in basic_ids {
				descriptor.add_primary_key_field(field);
				descriptor.add_id_attribute_name(&attribute);
				if let Err(declared) =
					descriptor.validate_pk_class_id(&attribute, &raw_type, compatibility, key_classes)
				{
					return Err(MetadataError::InvalidCompositeKeyAttribute {
						class: descriptor.name().to_string(),
						key_class: descriptor.id_class().unwrap_or_default().to_string(),
						attribute,
						expected: declared,
						found: raw_type,
					});
				}
			}

			let owner: &EntityDescriptor = descriptor;
			let embedded = owner.embedded_id().map(|embedded| {
				(
					embedded.attribute_name().to_string(),
					embedded.primary_key_fields(owner),
				)
			});
			if let Some((attribute, fields)) = embedded {
				for field in fields {
					descriptor.add_primary_key_field(field);
				}
				descriptor.add_id_attribute_name(attribute);
			}
		}

		self.logger.log_phase("identities", self.descriptors.len());
		Ok(())
	}

	/// Resolve derived ids and inherited identities
	pub fn resolve_derived_ids(&mut self) -> Result<()> {
		DerivedIdResolver::new().resolve_all(self)?;
		self.logger.log_phase("derived_ids", self.descriptors.len());
		Ok(())
	}

	/// Build the mappings of every relationship not handled as a derived id
	pub fn process_relationships(&mut self) -> Result<()> {
		let mut mappings = Vec::new();

		for owner in self.descriptors.values() {
			for accessor in owner.object_accessors() {
				if owner.has_mapping(accessor.attribute_name()) {
					continue;
				}
				let reference_name = accessor.reference_class_name();
				let reference =
					self.descriptors
						.get(reference_name)
						.ok_or_else(|| MetadataError::UnknownEntity {
							class: owner.name().to_string(),
							attribute: accessor.attribute_name().to_string(),
							reference: reference_name.to_string(),
						})?;
				let mapping = accessor.process(owner, reference, self.settings, self.logger)?;
				mappings.push((owner.name().to_string(), mapping));
			}
		}

		let count = mappings.len();
		for (class_name, mapping) in mappings {
			if let Some(owner) = self.descriptors.get_mut(&class_name) {
				owner.insert_mapping(mapping);
			}
		}

		self.logger.log_phase("relationships", count);
		Ok(())
	}

	/// End the build
	pub fn freeze(self) -> MappedProject {
		for descriptor in self.descriptors.values() {
			if !descriptor.pk_class_ids().is_empty() {
				let pending: Vec<&str> = descriptor.pk_class_ids().keys().map(String::as_str).collect();
				self.logger.log_warning(
					descriptor.name(),
					&format!("key class attributes without an id mapping: {}", pending.join(", ")),
				);
			}
		}

		MappedProject {
			name: self.name,
			descriptors: self.descriptors,
			hierarchy: self.hierarchy,
			key_classes: self.key_classes,
		}
	}
}

/// Result of processing a project
#[derive(Debug, Clone, Serialize)]
pub struct MappedProject {
	#[serde(skip_serializing_if = "Option::is_none")]
	name: Option<String>,
	descriptors: IndexMap<String, EntityDescriptor>,
	hierarchy: HierarchyTree,
	key_classes: KeyClassRegistry,
}

impl MappedProject {
	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	pub fn descriptor(&self, class_name: &str) -> Option<&EntityDescriptor> {
		self.descriptors.get(class_name)
	}

	pub fn descriptors(&self) -> impl Iterator<Item = &EntityDescriptor> {
		self.descriptors.values()
	}

	pub fn hierarchy(&self) -> &HierarchyTree {
		&self.hierarchy
	}

	pub fn key_classes(&self) -> &KeyClassRegistry {
		&self.key_classes
	}

	pub fn len(&self) -> usize {
		self.descriptors.len()
	}

	pub fn is_empty(&self) -> bool {
		self.descriptors.is_empty()
	}
}

/// Runs the metadata build of a project
#[derive(Debug)]
pub struct MetadataProcessor {
	settings: MetadataSettings,
	compatibility: Box<dyn KeyCompatibility>,
	logger: Option<MetadataLogger>,
}

impl MetadataProcessor {
	/// Processor with the key compatibility policy named by `settings`
	pub fn new(settings: MetadataSettings) -> Self {
		let compatibility = compatibility_for(settings.key_compatibility);
		Self {
			settings,
			compatibility,
			logger: None,
		}
	}

	pub fn with_compatibility(mut self, compatibility: impl KeyCompatibility + 'static) -> Self {
		self.compatibility = Box::new(compatibility);
		self
	}

	/// Use `logger` for every build instead of a project-tagged one
	pub fn with_logger(mut self, logger: MetadataLogger) -> Self {
		self.logger = Some(logger);
		self
	}

	pub fn settings(&self) -> &MetadataSettings {
		&self.settings
	}

	pub fn compatibility(&self) -> &dyn KeyCompatibility {
		self.compatibility.as_ref()
	}

	pub fn process(&self, project: MetadataProject) -> Result<MappedProject> {
		let logger = self.logger_for(&project);

		let mut ctx = BuildContext::new(project, &self.settings, self.compatibility.as_ref(), &logger);
		ctx.build_hierarchy()?;
		ctx.initialize_identities()?;
		ctx.resolve_derived_ids()?;
		ctx.process_relationships()?;
		Ok(ctx.freeze())
	}

	/// The injected logger, or one tagged with the project's name
	fn logger_for(&self, project: &MetadataProject) -> MetadataLogger {
		match (&self.logger, project.name()) {
			(Some(logger), _) => logger.clone(),
			(None, Some(name)) => MetadataLogger::for_project(name),
			(None, None) => MetadataLogger::new(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::accessors::{BasicAccessor, ObjectAccessor};
	use crate::key_class::KeyClass;
	use rstest::rstest;

	#[rstest]
	fn test_cycle_rejected_by_default() {
		let project = MetadataProject::new()
			.with_descriptor(EntityDescriptor::new("A", "A").with_parent("B"))
			.with_descriptor(EntityDescriptor::new("B", "B").with_parent("A"));

		assert!(matches!(
			MetadataProcessor::new(MetadataSettings::default()).process(project),
			Err(MetadataError::InheritanceCycle { .. })
		));
	}

	#[rstest]
	fn test_cycle_permitted() {
		let project = MetadataProject::new()
			.with_descriptor(EntityDescriptor::new("A", "A").with_parent("B"))
			.with_descriptor(EntityDescriptor::new("B", "B").with_parent("A"));
		let settings = MetadataSettings::default().with_cycle_policy(CyclePolicy::Permit);

		let mapped = MetadataProcessor::new(settings).process(project).unwrap();
		assert_eq!(mapped.hierarchy().parent_of("A"), Some("B"));
	}

	#[rstest]
	fn test_basic_id_type_checked_against_key_class() {
		let project = MetadataProject::new()
			.with_key_class(KeyClass::new("EmpPK").with_field("id", "i64"))
			.with_descriptor(
				EntityDescriptor::new("Employee", "EMPLOYEE")
					.with_id_class("EmpPK")
					.with_accessor(BasicAccessor::new("id", "String").id()),
			);

		assert_eq!(
			MetadataProcessor::new(MetadataSettings::default())
				.process(project)
				.unwrap_err(),
			MetadataError::InvalidCompositeKeyAttribute {
				class: "Employee".to_string(),
				key_class: "EmpPK".to_string(),
				attribute: "id".to_string(),
				expected: "i64".to_string(),
				found: "String".to_string(),
			}
		);
	}

	#[rstest]
	fn test_unknown_reference() {
		let project = MetadataProject::new().with_descriptor(
			EntityDescriptor::new("Employee", "EMPLOYEE")
				.with_accessor(BasicAccessor::new("id", "i64").id())
				.with_accessor(ObjectAccessor::many_to_one("department", "Department")),
		);

		assert!(matches!(
			MetadataProcessor::new(MetadataSettings::default()).process(project),
			Err(MetadataError::UnknownEntity { reference, .. }) if reference == "Department"
		));
	}

	#[rstest]
	fn test_project_name_tags_logger() {
		let project = MetadataProject::named("hr");
		let mapped = MetadataProcessor::new(MetadataSettings::default())
			.process(project)
			.unwrap();

		assert_eq!(mapped.name(), Some("hr"));
		assert!(mapped.is_empty());
	}

	#[rstest]
	#[case::injected_wins(Some(MetadataLogger::for_project("audit")), Some("hr"), Some("audit"))]
	#[case::project_name(None, Some("hr"), Some("hr"))]
	#[case::untagged(None, None, None)]
	fn test_logger_for_project(
		#[case] injected: Option<MetadataLogger>,
		#[case] project_name: Option<&str>,
		#[case] expected: Option<&str>,
	) {
		let mut processor = MetadataProcessor::new(MetadataSettings::default());
		if let Some(logger) = injected {
			processor = processor.with_logger(logger);
		}
		let project = match project_name {
			Some(name) => MetadataProject::named(name),
			None => MetadataProject::new(),
		};

		assert_eq!(processor.logger_for(&project).project(), expected);
	}
}
