//! Testing utilities for parse-tree assertions
//!
//! Parse trees nest, and asserting on them with raw `match` blocks
//! buries the intent of a test under boilerplate. This module provides
//! a small fluent API instead: [`assert_ast`] wraps a node and every
//! assertion returns the wrapper, so whole hierarchies read as one
//! chain. Failure messages carry the path from the root to the node
//! under test.
//!
//! ```rust,ignore
//! assert_ast(&ast)
//!     .rule("sum")
//!     .child_count(3)
//!     .child(0, |operand| {
//!         operand.rule("integer").value("12");
//!     });
//! ```
//!
//! [`parser_from`] builds a parser straight from a `serde_json::Value`,
//! which keeps grammar fixtures inline and readable in tests.

use crate::rel::ast::Ast;
use crate::rel::parser::Parser;
use serde_json::Value;

/// Build a parser from an inline JSON grammar, panicking on load errors.
pub fn parser_from(grammar: Value) -> Parser {
    match Parser::from_value(&grammar) {
        Ok(parser) => parser,
        Err(error) => panic!("grammar should load: {error}"),
    }
}

/// Start an assertion chain on a parse-tree node.
pub fn assert_ast(ast: &Ast) -> AstAssertion<'_> {
    AstAssertion {
        node: ast,
        path: ast.rule_name().to_string(),
    }
}

/// Fluent assertions over one node; see the module docs.
pub struct AstAssertion<'a> {
    node: &'a Ast,
    path: String,
}

impl<'a> AstAssertion<'a> {
    pub fn rule(self, expected: &str) -> Self {
        assert_eq!(
            self.node.rule_name(),
            expected,
            "rule name mismatch at {}",
            self.path
        );
        self
    }

    pub fn is_leaf(self) -> Self {
        assert!(self.node.is_leaf(), "expected a leaf at {}", self.path);
        self
    }

    pub fn is_branch(self) -> Self {
        assert!(!self.node.is_leaf(), "expected a branch at {}", self.path);
        self
    }

    pub fn value(self, expected: &str) -> Self {
        assert_eq!(
            self.node.value(),
            Some(expected),
            "leaf value mismatch at {}",
            self.path
        );
        self
    }

    pub fn child_count(self, expected: usize) -> Self {
        assert_eq!(
            self.node.len(),
            expected,
            "child count mismatch at {}",
            self.path
        );
        self
    }

    /// Descend into child `index` and run nested assertions on it.
    pub fn child(self, index: usize, assertions: impl FnOnce(AstAssertion<'_>)) -> Self {
        let child = match self.node.get(index) {
            Some(child) => child,
            None => panic!(
                "no child {index} at {} ({} children)",
                self.path,
                self.node.len()
            ),
        };
        assertions(AstAssertion {
            node: child,
            path: format!("{}[{index}:{}]", self.path, child.rule_name()),
        });
        self
    }

    /// Assert the values of all direct leaf children, in order.
    pub fn leaf_values(self, expected: &[&str]) -> Self {
        let values: Vec<_> = self.node.iter().filter_map(Ast::value).collect();
        assert_eq!(values, expected, "leaf values mismatch at {}", self.path);
        self
    }
}
