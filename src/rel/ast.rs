//! Parse tree returned by a successful parse
//!
//! An [`Ast`] node is either a leaf holding the matched text or a branch
//! holding child nodes; the two cannot be mixed. Nodes are named after
//! the rule (or terminal) that produced them, and children only ever grow
//! by append while the engine walks the grammar, bottom-up.
//!
//! [`AstSnapshot`] is a serializable mirror of the tree for tooling that
//! wants a plain-data form (JSON output, fixtures, golden files).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;
use std::slice;

/// Error returned by tree operations applied to the wrong node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AstError {
    /// `append` was called on a leaf node.
    LeafNode,
}

impl fmt::Display for AstError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AstError::LeafNode => write!(f, "cannot append children to a leaf node"),
        }
    }
}

impl std::error::Error for AstError {}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Leaf(String),
    Branch(Vec<Ast>),
}

/// One node of the parse tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ast {
    rule_name: String,
    node: Node,
}

impl Ast {
    /// Create a leaf node carrying matched text.
    pub fn leaf(rule_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            rule_name: rule_name.into(),
            node: Node::Leaf(value.into()),
        }
    }

    /// Create an empty branch node.
    pub fn branch(rule_name: impl Into<String>) -> Self {
        Self {
            rule_name: rule_name.into(),
            node: Node::Branch(Vec::new()),
        }
    }

    /// Create a branch node holding `children`.
    pub fn branch_with(rule_name: impl Into<String>, children: Vec<Ast>) -> Self {
        Self {
            rule_name: rule_name.into(),
            node: Node::Branch(children),
        }
    }

    /// Name of the rule or terminal that produced this node.
    pub fn rule_name(&self) -> &str {
        &self.rule_name
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.node, Node::Leaf(_))
    }

    /// Matched text of a leaf node; `None` for a branch.
    pub fn value(&self) -> Option<&str> {
        match &self.node {
            Node::Leaf(value) => Some(value),
            Node::Branch(_) => None,
        }
    }

    /// Children of a branch node; `None` for a leaf.
    pub fn children(&self) -> Option<&[Ast]> {
        match &self.node {
            Node::Leaf(_) => None,
            Node::Branch(children) => Some(children),
        }
    }

    /// Child at `index`, if this is a branch and the index is in range.
    pub fn get(&self, index: usize) -> Option<&Ast> {
        self.children().and_then(|children| children.get(index))
    }

    /// Number of children; 0 for a leaf.
    pub fn len(&self) -> usize {
        self.children().map_or(0, <[Ast]>::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a child to a branch node.
    pub fn append(&mut self, child: Ast) -> Result<(), AstError> {
        match &mut self.node {
            Node::Leaf(_) => Err(AstError::LeafNode),
            Node::Branch(children) => {
                children.push(child);
                Ok(())
            }
        }
    }

    /// Iterate over children; empty for a leaf.
    pub fn iter(&self) -> slice::Iter<'_, Ast> {
        match &self.node {
            Node::Leaf(_) => [].iter(),
            Node::Branch(children) => children.iter(),
        }
    }

    /// Build the serializable mirror of this subtree.
    pub fn snapshot(&self) -> AstSnapshot {
        AstSnapshot {
            rule: self.rule_name.clone(),
            value: self.value().map(str::to_string),
            children: self.iter().map(Ast::snapshot).collect(),
        }
    }

    /// Serialize this subtree as a JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self.snapshot()).unwrap_or(serde_json::Value::Null)
    }
}

impl Index<usize> for Ast {
    type Output = Ast;

    fn index(&self, index: usize) -> &Ast {
        match self.get(index) {
            Some(child) => child,
            None => panic!(
                "no child {index} on node '{}' ({} children)",
                self.rule_name,
                self.len()
            ),
        }
    }
}

impl<'a> IntoIterator for &'a Ast {
    type Item = &'a Ast;
    type IntoIter = slice::Iter<'a, Ast>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Plain-data mirror of an [`Ast`] subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AstSnapshot {
    pub rule: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<AstSnapshot>,
}
