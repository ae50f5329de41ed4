//! Derived-id and primary key resolution
//!
//! A derived id is a primary key obtained through a to-one relationship to
//! another entity. Resolving one requires the referenced entity's key first,
//! so classes are resolved depth-first along accessor dependency edges:
//!
//! - the reference class of every derived-id or mapped-by-id accessor,
//! - the inheritance parent of a class that declares no identity of its own.
//!
//! Each class moves through [`VisitState`] once. Meeting a class that is
//! still [`VisitState::InProgress`] means the derived ids form a cycle, which
//! fails the build with [`MetadataError::CircularDerivedId`].

use indexmap::IndexMap;

use crate::accessors::MappingAccessor;
use crate::descriptor::EntityDescriptor;
use crate::error::{MetadataError, Result};
use crate::fields::DatabaseField;
use crate::hierarchy::HierarchyTree;
use crate::processor::BuildContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisitState {
	#[default]
	Unvisited,
	InProgress,
	Done,
}

/// Depth-first resolver over the classes of one build
#[derive(Debug, Default)]
pub struct DerivedIdResolver {
	states: IndexMap<String, VisitState>,
	path: Vec<String>,
}

impl DerivedIdResolver {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn state(&self, class_name: &str) -> VisitState {
		self.states.get(class_name).copied().unwrap_or_default()
	}

	/// Resolve every class of the build
	pub fn resolve_all(&mut self, ctx: &mut BuildContext<'_>) -> Result<()> {
		let class_names: Vec<String> = ctx.descriptors.keys().cloned().collect();
		for class_name in class_names {
			self.resolve_class(ctx, &class_name)?;
		}
		Ok(())
	}

	/// Resolve `class_name` after everything it depends on
	pub fn resolve_class(&mut self, ctx: &mut BuildContext<'_>, class_name: &str) -> Result<()> {
		match self.state(class_name) {
			VisitState::Done => return Ok(()),
			VisitState::InProgress => {
				let start = self
					.path
					.iter()
					.position(|name| name == class_name)
					.unwrap_or_default();
				let mut cycle = self.path[start..].to_vec();
				cycle.push(class_name.to_string());
				return Err(MetadataError::CircularDerivedId { cycle });
			}
			VisitState::Unvisited => {}
		}

		self.states
			.insert(class_name.to_string(), VisitState::InProgress);
		self.path.push(class_name.to_string());

		for dependency in dependencies(ctx, class_name)? {
			self.resolve_class(ctx, &dependency)?;
		}

		let has_own_identity = ctx
			.descriptors
			.get(class_name)
			.is_some_and(EntityDescriptor::has_own_identity);
		if !has_own_identity {
			inherit_identity(ctx, class_name);
		}

		let derived: Vec<String> = ctx
			.descriptors
			.get(class_name)
			.map(|descriptor| {
				descriptor
					.object_accessors()
					.filter(|accessor| accessor.depends_on_reference())
					.map(|accessor| accessor.attribute_name().to_string())
					.collect()
			})
			.unwrap_or_default();
		for attribute in derived {
			resolve_key(ctx, class_name, &attribute)?;
		}

		self.path.pop();
		self.states.insert(class_name.to_string(), VisitState::Done);
		Ok(())
	}
}

/// Classes whose keys `class_name` needs before its own can be resolved
fn dependencies(ctx: &BuildContext<'_>, class_name: &str) -> Result<Vec<String>> {
	let Some(descriptor) = ctx.descriptors.get(class_name) else {
		return Ok(Vec::new());
	};

	let mut dependencies = Vec::new();
	for accessor in descriptor
		.object_accessors()
		.filter(|accessor| accessor.depends_on_reference())
	{
		let reference = accessor.reference_class_name();
		if !ctx.descriptors.contains_key(reference) {
			return Err(MetadataError::UnknownEntity {
				class: class_name.to_string(),
				attribute: accessor.attribute_name().to_string(),
				reference: reference.to_string(),
			});
		}
		dependencies.push(reference.to_string());
	}

	// A cyclic hierarchy let through by the cycle policy is not followed
	if !descriptor.has_own_identity()
		&& ctx.hierarchy.ancestors(class_name).is_ok()
		&& let Some(parent) = ctx.hierarchy.parent_of(class_name)
		&& ctx.descriptors.contains_key(parent)
	{
		dependencies.push(parent.to_string());
	}

	Ok(dependencies)
}

/// Copy the parent's identity onto a class that declares none
///
/// Primary key columns keep their names but are bound to the class's own
/// primary table.
fn inherit_identity(ctx: &mut BuildContext<'_>, class_name: &str) {
	let Some(parent) = ctx.hierarchy.parent_of(class_name) else {
		return;
	};
	let Some(parent) = ctx.descriptors.get(parent) else {
		return;
	};

	let field_names: Vec<String> = parent
		.primary_key_fields()
		.iter()
		.map(|field| field.name().to_string())
		.collect();
	let id_attribute_names = parent.id_attribute_names().to_vec();
	let key_class = parent.key_class_name().map(str::to_string);

	if let Some(descriptor) = ctx.descriptors.get_mut(class_name) {
		let table = descriptor.primary_table().clone();
		for name in field_names {
			descriptor.add_primary_key_field(DatabaseField::new(name).with_table(table.clone()));
		}
		for attribute in id_attribute_names {
			descriptor.add_id_attribute_name(attribute);
		}
		if descriptor.id_class().is_none()
			&& let Some(key_class) = key_class
		{
			descriptor.set_id_class(key_class);
		}
	}
}

/// Find the accessor of `attribute` on `class_name` or its nearest ancestor
/// declaring it
fn find_accessor<'a>(
	descriptors: &'a IndexMap<String, EntityDescriptor>,
	hierarchy: &HierarchyTree,
	class_name: &str,
	attribute: &str,
) -> Option<&'a MappingAccessor> {
	let own = descriptors
		.get(class_name)
		.and_then(|descriptor| descriptor.accessor_for(attribute));
	if own.is_some() {
		return own;
	}
	hierarchy
		.ancestors(class_name)
		.ok()?
		.into_iter()
		.find_map(|ancestor| {
			descriptors
				.get(ancestor)
				.and_then(|descriptor| descriptor.accessor_for(attribute))
		})
}

/// Concrete key type of an entity with a simple primary key
///
/// Derived ids are followed to the class that finally declares the key: a
/// basic id yields its raw type, an embedded id its key class name.
pub fn resolve_primary_key_type(
	descriptors: &IndexMap<String, EntityDescriptor>,
	hierarchy: &HierarchyTree,
	class_name: &str,
) -> Result<String> {
	let mut visited: Vec<String> = Vec::new();
	let mut current = class_name.to_string();

	while visited.len() <= descriptors.len() {
		let missing = || MetadataError::MissingPrimaryKey {
			class: current.clone(),
		};
		let descriptor = descriptors.get(&current).ok_or_else(missing)?;
		let id_attribute = descriptor
			.id_attribute_names()
			.first()
			.ok_or_else(missing)?;

		let next = match find_accessor(descriptors, hierarchy, &current, id_attribute) {
			Some(MappingAccessor::Basic(basic)) => return Ok(basic.raw_type().to_string()),
			Some(MappingAccessor::EmbeddedId(embedded)) => return Ok(embedded.key_class().to_string()),
			Some(MappingAccessor::Object(object)) if object.is_derived_id() => {
				object.reference_class_name().to_string()
			}
			_ => return Err(missing()),
		};

		visited.push(std::mem::replace(&mut current, next));
	}

	visited.push(current);
	Err(MetadataError::CircularDerivedId { cycle: visited })
}

/// Resolve one relationship accessor whose reference key is needed first
///
/// The relationship mapping is built and stored on the owner. For a
/// derived id the reference key is then checked against the owner's key
/// class, and the mapping's foreign key columns become primary key fields
/// of the owner.
pub fn resolve_key(ctx: &mut BuildContext<'_>, class_name: &str, attribute: &str) -> Result<()> {
	let Some(owner) = ctx.descriptors.get(class_name) else {
		return Ok(());
	};
	let Some(accessor) = owner.accessor(attribute).and_then(MappingAccessor::as_object) else {
		return Ok(());
	};

	let reference_name = accessor.reference_class_name();
	let reference = ctx
		.descriptors
		.get(reference_name)
		.ok_or_else(|| MetadataError::UnknownEntity {
			class: class_name.to_string(),
			attribute: attribute.to_string(),
			reference: reference_name.to_string(),
		})?;

	let mapping = accessor.process(owner, reference, ctx.settings, ctx.logger)?;
	let is_derived_id = accessor.is_derived_id();
	let reference_key_class = reference.key_class_name().map(str::to_string);
	let simple_type = match (&reference_key_class, is_derived_id) {
		(None, true) => Some(resolve_primary_key_type(
			&ctx.descriptors,
			&ctx.hierarchy,
			reference_name,
		)?),
		_ => None,
	};

	let compatibility = ctx.compatibility;
	let key_classes = &ctx.key_classes;
	let Some(owner) = ctx.descriptors.get_mut(class_name) else {
		return Ok(());
	};

	if !is_derived_id {
		owner.insert_mapping(mapping);
		return Ok(());
	}

	match (reference_key_class, simple_type) {
		(Some(key_class), _) => match owner.id_class().map(str::to_string) {
			None => {
				return Err(MetadataError::MissingCompositeKeyClass {
					class: class_name.to_string(),
					key_class,
				});
			}
			Some(owner_key_class) if owner_key_class != key_class => {
				// The owner's key class must be registered and declare the attribute
				let declares_compatible_field = key_classes
					.get(&owner_key_class)
					.and_then(|owner_key| owner_key.field_type(attribute))
					.is_some_and(|declared| {
						compatibility.is_compatible(declared, &key_class, key_classes)
					});
				if !declares_compatible_field
					|| owner
						.validate_pk_class_id(attribute, &key_class, compatibility, key_classes)
						.is_err()
				{
					return Err(MetadataError::IncompatiblePrimaryKeyClasses {
						class: class_name.to_string(),
						attribute: attribute.to_string(),
						owner_key_class,
						reference_key_class: key_class,
					});
				}
			}
			Some(_) => owner.clear_pk_class_ids(),
		},
		(None, Some(resolved)) => {
			if let Err(declared) =
				owner.validate_pk_class_id(attribute, &resolved, compatibility, key_classes)
			{
				return Err(MetadataError::InvalidCompositeKeyAttribute {
					class: class_name.to_string(),
					key_class: owner.id_class().unwrap_or_default().to_string(),
					attribute: attribute.to_string(),
					expected: declared,
					found: resolved,
				});
			}
		}
		(None, None) => {}
	}

	owner.add_id_attribute_name(attribute);
	for field in mapping.foreign_key_fields() {
		owner.add_primary_key_field(field.clone());
	}
	owner.insert_mapping(mapping);
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::accessors::{BasicAccessor, EmbeddedIdAccessor, ObjectAccessor};
	use crate::accessors::object::RelationshipMetadata;
	use crate::hierarchy::InheritanceHierarchyBuilder;
	use rstest::rstest;

	fn derived(attribute: &str, reference: &str) -> ObjectAccessor {
		ObjectAccessor::one_to_one(attribute, reference).with_metadata(RelationshipMetadata {
			id: true,
			..RelationshipMetadata::default()
		})
	}

	fn index(descriptors: Vec<EntityDescriptor>) -> IndexMap<String, EntityDescriptor> {
		descriptors
			.into_iter()
			.map(|descriptor| (descriptor.name().to_string(), descriptor))
			.collect()
	}

	#[rstest]
	fn test_primary_key_type_follows_derived_ids() {
		let mut employee =
			EntityDescriptor::new("Employee", "EMPLOYEE").with_accessor(BasicAccessor::new("id", "i64").id());
		employee.add_id_attribute_name("id");
		let mut dependent = EntityDescriptor::new("Dependent", "DEPENDENT")
			.with_accessor(derived("employee", "Employee"));
		dependent.add_id_attribute_name("employee");
		let descriptors = index(vec![employee, dependent]);
		let hierarchy = InheritanceHierarchyBuilder::build(descriptors.values());

		assert_eq!(
			resolve_primary_key_type(&descriptors, &hierarchy, "Dependent").unwrap(),
			"i64"
		);
	}

	#[rstest]
	fn test_primary_key_type_of_embedded_id() {
		let mut order = EntityDescriptor::new("Order", "ORDERS")
			.with_accessor(EmbeddedIdAccessor::new("id", "OrderPK"));
		order.add_id_attribute_name("id");
		let descriptors = index(vec![order]);
		let hierarchy = InheritanceHierarchyBuilder::build(descriptors.values());

		assert_eq!(
			resolve_primary_key_type(&descriptors, &hierarchy, "Order").unwrap(),
			"OrderPK"
		);
	}

	#[rstest]
	fn test_primary_key_type_searches_ancestors() {
		let mut person =
			EntityDescriptor::new("Person", "PERSON").with_accessor(BasicAccessor::new("ssn", "String").id());
		person.add_id_attribute_name("ssn");
		let mut student = EntityDescriptor::new("Student", "STUDENT").with_parent("Person");
		student.add_id_attribute_name("ssn");
		let descriptors = index(vec![person, student]);
		let hierarchy = InheritanceHierarchyBuilder::build(descriptors.values());

		assert_eq!(
			resolve_primary_key_type(&descriptors, &hierarchy, "Student").unwrap(),
			"String"
		);
	}

	#[rstest]
	fn test_primary_key_type_cycle_is_bounded() {
		let mut first = EntityDescriptor::new("A", "A").with_accessor(derived("b", "B"));
		first.add_id_attribute_name("b");
		let mut second = EntityDescriptor::new("B", "B").with_accessor(derived("a", "A"));
		second.add_id_attribute_name("a");
		let descriptors = index(vec![first, second]);
		let hierarchy = InheritanceHierarchyBuilder::build(descriptors.values());

		assert!(matches!(
			resolve_primary_key_type(&descriptors, &hierarchy, "A"),
			Err(MetadataError::CircularDerivedId { .. })
		));
	}

	#[rstest]
	fn test_primary_key_type_without_id() {
		let descriptors = index(vec![EntityDescriptor::new("Loose", "LOOSE")]);
		let hierarchy = InheritanceHierarchyBuilder::build(descriptors.values());

		assert_eq!(
			resolve_primary_key_type(&descriptors, &hierarchy, "Loose"),
			Err(MetadataError::MissingPrimaryKey {
				class: "Loose".to_string()
			})
		);
	}
}
