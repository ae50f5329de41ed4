//! Inheritance hierarchy tree
//!
//! [`InheritanceHierarchyBuilder`] turns the descriptors of a project into a
//! [`HierarchyTree`]: one [`HierarchyNode`] per class name, linked to its
//! parent. The tree owns every node; parent and child links are class-name
//! keys into the tree.
//!
//! # Examples
//!
//! ```
//! use entmap_metadata::hierarchy::{HierarchyMember, InheritanceHierarchyBuilder};
//!
//! struct Decl(&'static str, Option<&'static str>);
//!
//! impl HierarchyMember for Decl {
//!     fn class_name(&self) -> Option<&str> { Some(self.0) }
//!     fn runtime_class_name(&self) -> &str { self.0 }
//!     fn parent_class_name(&self) -> Option<&str> { self.1 }
//! }
//!
//! let decls = [Decl("Bus", Some("Vehicle")), Decl("Vehicle", None)];
//! let tree = InheritanceHierarchyBuilder::build(&decls);
//!
//! assert_eq!(tree.parent_of("Bus"), Some("Vehicle"));
//! assert_eq!(tree.ancestors("Bus").unwrap(), vec!["Vehicle"]);
//! ```

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::error::{MetadataError, Result};

/// What the builder needs to know about a class descriptor
pub trait HierarchyMember {
	/// Class name declared by the metadata, if any
	fn class_name(&self) -> Option<&str>;

	/// Name of the underlying runtime class, used when no name is declared
	fn runtime_class_name(&self) -> &str;

	/// Parent class name when the descriptor declares inheritance
	fn parent_class_name(&self) -> Option<&str>;
}

/// One class in the hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HierarchyNode {
	class_name: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	parent: Option<String>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	children: Vec<String>,
}

impl HierarchyNode {
	pub fn new(class_name: impl Into<String>) -> Self {
		Self {
			class_name: class_name.into(),
			parent: None,
			children: Vec::new(),
		}
	}

	pub fn class_name(&self) -> &str {
		&self.class_name
	}

	pub fn parent(&self) -> Option<&str> {
		self.parent.as_deref()
	}

	pub fn children(&self) -> &[String] {
		&self.children
	}
}

/// Class name to node mapping
///
/// Equality ignores insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HierarchyTree {
	nodes: IndexMap<String, HierarchyNode>,
}

impl HierarchyTree {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			nodes: IndexMap::with_capacity(capacity),
		}
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn contains(&self, class_name: &str) -> bool {
		self.nodes.contains_key(class_name)
	}

	pub fn node(&self, class_name: &str) -> Option<&HierarchyNode> {
		self.nodes.get(class_name)
	}

	pub fn nodes(&self) -> impl Iterator<Item = &HierarchyNode> {
		self.nodes.values()
	}

	pub fn parent_of(&self, class_name: &str) -> Option<&str> {
		self.nodes.get(class_name).and_then(HierarchyNode::parent)
	}

	pub fn children_of(&self, class_name: &str) -> &[String] {
		self.nodes
			.get(class_name)
			.map(HierarchyNode::children)
			.unwrap_or_default()
	}

	/// Nodes without a parent
	pub fn roots(&self) -> impl Iterator<Item = &HierarchyNode> {
		self.nodes.values().filter(|node| node.parent.is_none())
	}

	/// Get the node for `class_name`, creating it when absent
	pub fn get_or_create(&mut self, class_name: &str) -> &mut HierarchyNode {
		self.nodes
			.entry(class_name.to_string())
			.or_insert_with(|| HierarchyNode::new(class_name))
	}

	/// Link `child` to `parent`, creating both nodes as needed
	///
	/// A previous parent loses `child` from its children.
	pub fn set_parent(&mut self, child: &str, parent: &str) {
		self.get_or_create(parent);
		let previous = self.get_or_create(child).parent.replace(parent.to_string());

		if let Some(previous) = previous
			&& previous != parent
			&& let Some(old) = self.nodes.get_mut(&previous)
		{
			old.children.retain(|name| name != child);
		}

		if let Some(parent_node) = self.nodes.get_mut(parent)
			&& !parent_node.children.iter().any(|name| name == child)
		{
			parent_node.children.push(child.to_string());
		}
	}

	/// Ancestors of `class_name`, nearest first
	///
	/// An unknown class has no ancestors. The walk visits each node at most
	/// once and fails with [`MetadataError::InheritanceCycle`] when it comes
	/// back to a class it has already seen.
	pub fn ancestors(&self, class_name: &str) -> Result<Vec<&str>> {
		let mut seen: IndexSet<&str> = IndexSet::new();
		let mut ancestors = Vec::new();
		let Some(start) = self.nodes.get(class_name) else {
			return Ok(ancestors);
		};
		seen.insert(start.class_name());

		let mut current = start.parent();
		while let Some(name) = current {
			if !seen.insert(name) {
				let mut chain: Vec<String> = seen.iter().map(|s| s.to_string()).collect();
				chain.push(name.to_string());
				return Err(MetadataError::InheritanceCycle {
					class: class_name.to_string(),
					chain,
				});
			}
			ancestors.push(name);
			current = self.parent_of(name);
		}

		Ok(ancestors)
	}

	/// Topmost ancestor of `class_name`, or the class itself
	pub fn root_of<'a>(&'a self, class_name: &'a str) -> Result<&'a str> {
		Ok(self
			.ancestors(class_name)?
			.last()
			.copied()
			.unwrap_or(class_name))
	}

	/// Fail on the first class that is its own transitive ancestor
	pub fn validate_acyclic(&self) -> Result<()> {
		for name in self.nodes.keys() {
			self.ancestors(name)?;
		}
		Ok(())
	}
}

/// Builds the inheritance tree of a project's descriptors
pub struct InheritanceHierarchyBuilder;

impl InheritanceHierarchyBuilder {
	/// Return the node for `class_name`, adding a new one to the tree when
	/// it does not exist yet
	pub fn get_node_for_class<'a>(
		class_name: &str,
		hierarchy_tree: &'a mut HierarchyTree,
	) -> &'a mut HierarchyNode {
		hierarchy_tree.get_or_create(class_name)
	}

	/// Build the tree for every descriptor
	///
	/// Parents named by a descriptor get a node even without a descriptor of
	/// their own. Cyclic declarations are accepted; see
	/// [`HierarchyTree::validate_acyclic`].
	pub fn build<'a, D, I>(descriptors: I) -> HierarchyTree
	where
		D: HierarchyMember + 'a,
		I: IntoIterator<Item = &'a D>,
	{
		let iter = descriptors.into_iter();
		let mut hierarchy_tree = HierarchyTree::with_capacity(iter.size_hint().0);

		for descriptor in iter {
			let class_name = descriptor
				.class_name()
				.unwrap_or_else(|| descriptor.runtime_class_name());
			Self::get_node_for_class(class_name, &mut hierarchy_tree);

			if let Some(parent_class_name) = descriptor.parent_class_name() {
				hierarchy_tree.set_parent(class_name, parent_class_name);
			}
		}

		hierarchy_tree
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	struct Decl {
		name: Option<&'static str>,
		runtime: &'static str,
		parent: Option<&'static str>,
	}

	impl HierarchyMember for Decl {
		fn class_name(&self) -> Option<&str> {
			self.name
		}

		fn runtime_class_name(&self) -> &str {
			self.runtime
		}

		fn parent_class_name(&self) -> Option<&str> {
			self.parent
		}
	}

	fn decl(name: &'static str, parent: Option<&'static str>) -> Decl {
		Decl {
			name: Some(name),
			runtime: name,
			parent,
		}
	}

	#[rstest]
	fn test_runtime_class_name_fallback() {
		let decls = [Decl {
			name: None,
			runtime: "model.Poison",
			parent: None,
		}];
		let tree = InheritanceHierarchyBuilder::build(&decls);

		assert!(tree.contains("model.Poison"));
		assert_eq!(tree.len(), 1);
	}

	#[rstest]
	fn test_get_node_for_class_reuses_node() {
		let mut tree = HierarchyTree::new();
		InheritanceHierarchyBuilder::get_node_for_class("A", &mut tree);
		InheritanceHierarchyBuilder::get_node_for_class("A", &mut tree);
		assert_eq!(tree.len(), 1);
	}

	#[rstest]
	fn test_children_follow_parent_links() {
		let decls = [
			decl("Bus", Some("Vehicle")),
			decl("Car", Some("Vehicle")),
			decl("Vehicle", None),
		];
		let tree = InheritanceHierarchyBuilder::build(&decls);

		assert_eq!(tree.children_of("Vehicle"), ["Bus", "Car"]);
		assert!(tree.children_of("Bus").is_empty());
		let roots: Vec<_> = tree.roots().map(HierarchyNode::class_name).collect();
		assert_eq!(roots, vec!["Vehicle"]);
	}

	#[rstest]
	fn test_reparenting_detaches_from_old_parent() {
		let mut tree = HierarchyTree::new();
		tree.set_parent("C", "A");
		tree.set_parent("C", "B");

		assert!(tree.children_of("A").is_empty());
		assert_eq!(tree.children_of("B"), ["C"]);
		assert_eq!(tree.parent_of("C"), Some("B"));
	}

	#[rstest]
	fn test_cycle_is_built_but_detected() {
		let decls = [decl("A", Some("B")), decl("B", Some("A"))];
		let tree = InheritanceHierarchyBuilder::build(&decls);

		assert_eq!(tree.len(), 2);
		assert!(matches!(
			tree.validate_acyclic(),
			Err(MetadataError::InheritanceCycle { .. })
		));
		assert!(tree.ancestors("A").is_err());
	}

	#[rstest]
	fn test_self_parent_is_a_cycle() {
		let decls = [decl("A", Some("A"))];
		let tree = InheritanceHierarchyBuilder::build(&decls);
		assert!(tree.validate_acyclic().is_err());
	}

	#[rstest]
	fn test_root_of() {
		let decls = [decl("A", Some("B")), decl("B", Some("C"))];
		let tree = InheritanceHierarchyBuilder::build(&decls);

		assert_eq!(tree.root_of("A").unwrap(), "C");
		assert_eq!(tree.root_of("C").unwrap(), "C");
		assert_eq!(tree.root_of("Unknown").unwrap(), "Unknown");
	}
}
