//! Recursive bundle/condition trees.
//!
//! A tree is an arena of nodes. Each node is either a leaf holding a
//! [`Requirement`] or a composite whose children are indexed by name. Nodes
//! refer to each other by [`NodeId`], so trees of any depth are plain owned
//! values with no reference cycles.
//!
//! On the wire a tree is a JSON object: nested objects become composites,
//! scalars and arrays of scalars become leaves.

use grantstack_model::{MarshalError, MarshalResult, json_kind};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const RECORD: &str = "Bundle";

/// Index of a node within its [`GrantTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// The value a leaf requires of its field.
#[derive(Debug, Clone, PartialEq)]
pub enum Requirement {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<Requirement>),
}

impl Requirement {
    fn from_json(value: &Value) -> MarshalResult<Self> {
        match value {
            Value::Null => Ok(Self::Null),
            Value::Bool(b) => Ok(Self::Bool(*b)),
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Ok(Self::Integer(i)),
                (None, Some(f)) => Ok(Self::Float(f)),
                (None, None) => Err(MarshalError::TypeMismatch {
                    record: RECORD,
                    field: String::new(),
                    expected: "requirement",
                    found: json_kind(value),
                }),
            },
            Value::String(s) => Ok(Self::Text(s.clone())),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| Self::from_json(item).map_err(|e| e.within(&format!("[{i}]"))))
                .collect::<MarshalResult<Vec<_>>>()
                .map(Self::List),
            Value::Object(_) => Err(MarshalError::TypeMismatch {
                record: RECORD,
                field: String::new(),
                expected: "scalar or array of scalars",
                found: "object",
            }),
        }
    }

    /// Renders the requirement back to JSON.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Integer(n) => Value::from(*n),
            Self::Float(f) => Value::from(*f),
            Self::Text(s) => Value::String(s.clone()),
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
        }
    }
}

/// A node of a [`GrantTree`].
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Leaf(Requirement),
    Composite(BTreeMap<String, NodeId>),
}

/// An owned bundle or condition tree.
///
/// The root is always a composite. Equality is structural: two trees are
/// equal when they hold the same names and requirements, however their arenas
/// are laid out.
#[derive(Debug, Clone)]
pub struct GrantTree {
    nodes: Vec<Node>,
}

impl Default for GrantTree {
    fn default() -> Self {
        Self::new()
    }
}

impl GrantTree {
    /// Creates a tree with an empty root.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::Composite(BTreeMap::new())],
        }
    }

    /// Builds a tree from its wire JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`MarshalError::TypeMismatch`] if the root is not an object or a
    /// leaf array contains an object; the field path names the offending node.
    pub fn from_json(value: &Value) -> MarshalResult<Self> {
        let Value::Object(map) = value else {
            return Err(MarshalError::TypeMismatch {
                record: RECORD,
                field: String::new(),
                expected: "object",
                found: json_kind(value),
            });
        };
        let mut tree = Self::new();
        let root = tree.root();
        tree.fill(root, map)?;
        Ok(tree)
    }

    fn fill(&mut self, parent: NodeId, map: &Map<String, Value>) -> MarshalResult<()> {
        for (name, value) in map {
            match value {
                Value::Object(children) => {
                    let id = self.attach(parent, name, Node::Composite(BTreeMap::new()));
                    self.fill(id, children).map_err(|e| e.within(name))?;
                }
                leaf => {
                    let requirement = Requirement::from_json(leaf).map_err(|e| e.within(name))?;
                    self.attach(parent, name, Node::Leaf(requirement));
                }
            }
        }
        Ok(())
    }

    /// Renders the tree as its wire JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        self.node_json(self.root())
    }

    fn node_json(&self, id: NodeId) -> Value {
        match self.node(id) {
            Node::Leaf(requirement) => requirement.to_json(),
            Node::Composite(children) => Value::Object(
                children
                    .iter()
                    .map(|(name, child)| (name.clone(), self.node_json(*child)))
                    .collect(),
            ),
        }
    }

    /// The root composite.
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Returns the node for an ID issued by this tree.
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by a larger tree. Use [`GrantTree::try_node`]
    /// for IDs of unknown origin.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Returns the node for `id`, or `None` if this tree never issued it.
    #[must_use]
    pub fn try_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Looks up a named child of a composite.
    #[must_use]
    pub fn child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        match self.node(parent) {
            Node::Composite(children) => children.get(name).copied(),
            Node::Leaf(_) => None,
        }
    }

    /// Follows a dotted path (`"fitbit.steps"`) from the root.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Node> {
        path.split('.')
            .try_fold(self.root(), |id, name| self.child(id, name))
            .map(|id| self.node(id))
    }

    /// Returns the requirement at a dotted path, if it names a leaf.
    #[must_use]
    pub fn requirement(&self, path: &str) -> Option<&Requirement> {
        match self.get(path)? {
            Node::Leaf(requirement) => Some(requirement),
            Node::Composite(_) => None,
        }
    }

    /// Names of the root's children, i.e. the endpoints the tree covers.
    #[must_use]
    pub fn endpoints(&self) -> Vec<&str> {
        match self.node(self.root()) {
            Node::Composite(children) => children.keys().map(String::as_str).collect(),
            Node::Leaf(_) => Vec::new(),
        }
    }

    /// Every leaf with its dotted path, depth first in name order.
    #[must_use]
    pub fn leaves(&self) -> Vec<(String, &Requirement)> {
        let mut out = Vec::new();
        self.collect_leaves(self.root(), "", &mut out);
        out
    }

    fn collect_leaves<'a>(
        &'a self,
        id: NodeId,
        prefix: &str,
        out: &mut Vec<(String, &'a Requirement)>,
    ) {
        match self.node(id) {
            Node::Leaf(requirement) => out.push((prefix.to_string(), requirement)),
            Node::Composite(children) => {
                for (name, child) in children {
                    self.collect_leaves(*child, &join_path(prefix, name), out);
                }
            }
        }
    }

    /// Returns true if the root has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self.node(self.root()), Node::Composite(children) if children.is_empty())
    }

    /// Number of nodes, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Appends a node under a composite parent and returns its ID.
    ///
    /// A child with the same name is replaced. Callers only pass composites as
    /// `parent`.
    pub(crate) fn attach(&mut self, parent: NodeId, name: &str, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        if let Node::Composite(children) = &mut self.nodes[parent.0] {
            children.insert(name.to_string(), id);
        }
        id
    }

    /// Copies the subtree rooted at `source_id` in `source` under `parent`.
    pub(crate) fn graft(
        &mut self,
        parent: NodeId,
        name: &str,
        source: &GrantTree,
        source_id: NodeId,
    ) {
        match source.node(source_id) {
            Node::Leaf(requirement) => {
                self.attach(parent, name, Node::Leaf(requirement.clone()));
            }
            Node::Composite(children) => {
                let id = self.attach(parent, name, Node::Composite(BTreeMap::new()));
                for (child_name, child) in children {
                    self.graft(id, child_name, source, *child);
                }
            }
        }
    }

    fn subtree_eq(&self, id: NodeId, other: &GrantTree, other_id: NodeId) -> bool {
        match (self.node(id), other.node(other_id)) {
            (Node::Leaf(a), Node::Leaf(b)) => a == b,
            (Node::Composite(a), Node::Composite(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|((name_a, child_a), (name_b, child_b))| {
                        name_a == name_b && self.subtree_eq(*child_a, other, *child_b)
                    })
            }
            _ => false,
        }
    }
}

impl PartialEq for GrantTree {
    fn eq(&self, other: &Self) -> bool {
        self.subtree_eq(self.root(), other, other.root())
    }
}

pub(crate) fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}
