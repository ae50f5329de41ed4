//! End-to-end processing of declarative project files

use entmap::prelude::*;
use rstest::{fixture, rstest};

const HR_PROJECT: &str = r#"
name = "hr"

[[key_classes]]
name = "DependentId"
fields = { name = "String", employee = "i64" }

[[entities]]
class = "Person"
attributes = [
	{ kind = "basic", name = "ssn", type = "String", id = true },
]

[[entities]]
class = "Employee"
parent = "Person"
inheritance = "joined"
attributes = [
	{ kind = "basic", name = "id", type = "i64", id = true },
	{ kind = "many_to_one", name = "manager", type = "Employee", fetch = "lazy" },
]

[[entities]]
class = "Manager"
parent = "Employee"
inheritance = "joined"

[[entities]]
class = "Dependent"
table = "DEP"
id_class = "DependentId"
attributes = [
	{ kind = "basic", name = "name", type = "String", id = true },
	{ kind = "one_to_one", name = "employee", type = "Employee", id = true },
]
"#;

#[fixture]
fn mapped() -> MappedProject {
	let project = MetadataProject::from_toml_str(HR_PROJECT).unwrap();
	MetadataProcessor::new(MetadataSettings::default())
		.process(project)
		.unwrap()
}

#[rstest]
fn test_hierarchy_follows_declared_parents(mapped: MappedProject) {
	let hierarchy = mapped.hierarchy();

	assert_eq!(hierarchy.ancestors("Manager").unwrap(), vec!["Employee", "Person"]);
	assert_eq!(hierarchy.children_of("Person"), ["Employee"]);
	assert_eq!(hierarchy.root_of("Dependent").unwrap(), "Dependent");
}

#[rstest]
fn test_subclass_without_identity_inherits_key(mapped: MappedProject) {
	let manager = mapped.descriptor("Manager").unwrap();

	assert_eq!(manager.primary_key_fields()[0].qualified_name(), "MANAGER.ID");
	assert_eq!(manager.id_attribute_names(), ["id"]);
}

#[rstest]
fn test_derived_id_joins_key_class(mapped: MappedProject) {
	let dependent = mapped.descriptor("Dependent").unwrap();

	assert_eq!(dependent.primary_key_field_names(), vec!["NAME", "EMPLOYEE_ID"]);
	assert!(dependent.pk_class_ids().is_empty());
	let mapping = dependent.mapping("employee").unwrap();
	assert!(mapping.derived_id);
	assert_eq!(mapping.foreign_keys[0].target.qualified_name(), "EMPLOYEE.ID");
}

#[rstest]
fn test_lazy_relationship_without_weaving_is_eager(mapped: MappedProject) {
	let mapping = mapped
		.descriptor("Employee")
		.and_then(|employee| employee.mapping("manager"))
		.unwrap();

	assert!(!mapping.uses_indirection());
	assert_eq!(mapping.foreign_keys[0].source.qualified_name(), "EMPLOYEE.MANAGER_ID");
}

#[rstest]
fn test_facade_reexports_crates() {
	let settings = entmap::conf::MetadataSettings::default();
	assert!(!settings.weaving_enabled);

	let error = entmap::metadata::MetadataProcessor::new(settings)
		.process(MetadataProject::from_toml_str("[[entities]]\nclass = \"A\"\nparent = \"A\"\n").unwrap())
		.unwrap_err();
	assert!(matches!(error, MetadataError::InheritanceCycle { .. }));
}
