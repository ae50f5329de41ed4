//! Plain-text rendering of processed projects

use std::fmt::Write as _;

use entmap_metadata::hierarchy::HierarchyTree;
use entmap_metadata::mapping::OneToOneMapping;
use entmap_metadata::processor::MappedProject;
use indexmap::IndexSet;

/// Render the inheritance tree, two spaces of indent per level
///
/// Classes unreachable from a root are part of a cycle and are listed last.
pub fn render_hierarchy(hierarchy_tree: &HierarchyTree) -> String {
	let mut out = String::new();
	let mut visited = IndexSet::new();

	for root in hierarchy_tree.roots() {
		render_node(hierarchy_tree, root.class_name(), 0, &mut visited, &mut out);
	}
	for node in hierarchy_tree.nodes() {
		if !visited.contains(node.class_name()) {
			let _ = writeln!(out, "{} (cyclic)", node.class_name());
		}
	}
	out
}

fn render_node<'a>(
	hierarchy_tree: &'a HierarchyTree,
	class_name: &'a str,
	depth: usize,
	visited: &mut IndexSet<&'a str>,
	out: &mut String,
) {
	if !visited.insert(class_name) {
		return;
	}
	let _ = writeln!(out, "{}{}", "  ".repeat(depth), class_name);
	for child in hierarchy_tree.children_of(class_name) {
		render_node(hierarchy_tree, child, depth + 1, visited, out);
	}
}

fn render_mapping(mapping: &OneToOneMapping) -> String {
	let pairs: Vec<_> = mapping
		.foreign_keys
		.iter()
		.map(|pair| format!("{} = {}", pair.source.qualified_name(), pair.target.qualified_name()))
		.collect();

	let mut line = format!("{} -> {}", mapping.attribute_name, mapping.reference_class_name);
	if !pairs.is_empty() {
		let _ = write!(line, " ({})", pairs.join(", "));
	}
	if let Some(mapped_by_id) = &mapping.mapped_by_id {
		let _ = write!(line, " maps-id[{}]", mapped_by_id);
	}
	if mapping.read_only {
		line.push_str(" read-only");
	}
	if mapping.uses_indirection() {
		line.push_str(" lazy");
	}
	line
}

/// Render every descriptor with its key and its to-one mappings
pub fn render_project(project: &MappedProject) -> String {
	let mut out = String::new();

	for descriptor in project.descriptors() {
		let _ = writeln!(out, "{} [{}]", descriptor.name(), descriptor.primary_table().name());
		if let Some(key_class) = descriptor.key_class_name() {
			let _ = writeln!(out, "  key class: {}", key_class);
		}
		let _ = writeln!(
			out,
			"  primary key: {}",
			descriptor.primary_key_field_names().join(", ")
		);
		if !descriptor.id_attribute_names().is_empty() {
			let _ = writeln!(out, "  id attributes: {}", descriptor.id_attribute_names().join(", "));
		}
		for mapping in descriptor.mappings() {
			let _ = writeln!(out, "  {}", render_mapping(mapping));
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use entmap_conf::{CyclePolicy, MetadataSettings};
	use entmap_metadata::prelude::*;
	use rstest::rstest;

	fn process(project: MetadataProject, settings: MetadataSettings) -> MappedProject {
		MetadataProcessor::new(settings).process(project).unwrap()
	}

	#[rstest]
	fn test_render_hierarchy_indents_children() {
		let descriptors = vec![
			EntityDescriptor::new("Vehicle", "VEHICLE"),
			EntityDescriptor::new("Car", "CAR").with_parent("Vehicle"),
			EntityDescriptor::new("Coupe", "COUPE").with_parent("Car"),
			EntityDescriptor::new("Garage", "GARAGE"),
		];
		let tree = InheritanceHierarchyBuilder::build(&descriptors);

		assert_eq!(render_hierarchy(&tree), "Vehicle\n  Car\n    Coupe\nGarage\n");
	}

	#[rstest]
	fn test_render_hierarchy_lists_cyclic_classes() {
		let descriptors = vec![
			EntityDescriptor::new("A", "A").with_parent("B"),
			EntityDescriptor::new("B", "B").with_parent("A"),
			EntityDescriptor::new("C", "C"),
		];
		let project = descriptors
			.into_iter()
			.fold(MetadataProject::new(), MetadataProject::with_descriptor);
		let settings = MetadataSettings::default().with_cycle_policy(CyclePolicy::Permit);
		let mapped = process(project, settings);

		assert_eq!(render_hierarchy(mapped.hierarchy()), "C\nA (cyclic)\nB (cyclic)\n");
	}

	#[rstest]
	fn test_render_project_lists_keys_and_mappings() {
		let project = MetadataProject::new().with_descriptor(
			EntityDescriptor::new("Employee", "EMPLOYEE")
				.with_accessor(BasicAccessor::new("id", "i64").id())
				.with_accessor(ObjectAccessor::one_to_one("manager", "Employee")),
		);
		let rendered = render_project(&process(project, MetadataSettings::default()));

		assert_eq!(
			rendered,
			"Employee [EMPLOYEE]\n  primary key: ID\n  id attributes: id\n  manager -> Employee (EMPLOYEE.MANAGER_ID = EMPLOYEE.ID)\n"
		);
	}
}
