//! # rel-parser
//!
//! A runtime-configurable parser generator.
//!
//! A grammar arrives as a declarative document - terminal rules as regular
//! expressions, composite rules as rule-expression strings - and comes out
//! as a [`Parser`](rel::Parser) whose `generate_ast` matches input against
//! the grammar's start rule with backtracking recursive descent, returning a
//! parse tree or a recorded trail of why nothing matched.
//!
//! ```rust
//! use rel_parser::rel::Parser;
//!
//! let grammar = r#"{
//! "terminals": [{"name": "op", "regex": "[+-]"}],
//! "rules": [{"name": "sum", "expressions": ["[s]<integer><op><integer>"]}]
//! }"#;
//!
//! let mut parser = Parser::from_json(grammar).unwrap();
//! let ast = parser.generate_ast("12 + 34").unwrap();
//!
//! assert_eq!(ast.rule_name(), "sum");
//! assert_eq!(ast[0].value(), Some("12"));
//! assert_eq!(ast[1].value(), Some("+"));
//! assert_eq!(ast[2].value(), Some("34"));
//! ```
//!
//! Everything lives under the [rel] module; see its docs for the pipeline
//! layout.

pub mod rel;

pub use rel::{Ast, Parser};
