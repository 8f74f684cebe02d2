//! Parser facade
//!
//! This module provides [`Parser`] - the constructed form of one grammar,
//! ready to parse input strings. A parser is built once from a grammar
//! document (value, string, reader or file) and then reused; every
//! [`generate_ast`](Parser::generate_ast) call tokenizes its input from
//! scratch and matches it against the grammar's start rule.
//!
//! # Example
//!
//! ```rust
//! use rel_parser::rel::parser::Parser;
//!
//! let mut parser = Parser::from_json(
//! r#"{
//!     "terminals": [],
//!     "rules": [{"name": "greeting", "expressions": ["hello <identifier>"]}]
//! }"#,
//! )
//! .unwrap();
//!
//! let ast = parser.generate_ast("hello world").unwrap();
//! assert_eq!(ast.rule_name(), "greeting");
//! assert_eq!(ast[1].value(), Some("world"));
//! ```
//!
//! A parser instance carries its own cursor state and error stack, so
//! concurrent parses need one instance each; the instance itself can be
//! rebuilt cheaply from the same document.

use crate::rel::ast::Ast;
use crate::rel::document::GrammarDocument;
use crate::rel::engine::Engine;
use crate::rel::errors::SyntaxError;
use crate::rel::grammar::{Grammar, GrammarError};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;

/// Error that can occur while constructing a parser.
#[derive(Debug)]
pub enum LoadError {
    /// IO error while reading the grammar source
    Io(String),
    /// The grammar source is not valid JSON
    Json(String),
    /// The document shape or the grammar itself is invalid
    Grammar(GrammarError),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io(message) => write!(f, "IO error: {message}"),
            LoadError::Json(message) => write!(f, "JSON error: {message}"),
            LoadError::Grammar(error) => write!(f, "grammar error: {error}"),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<std::io::Error> for LoadError {
    fn from(error: std::io::Error) -> Self {
        LoadError::Io(error.to_string())
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(error: serde_json::Error) -> Self {
        LoadError::Json(error.to_string())
    }
}

impl From<GrammarError> for LoadError {
    fn from(error: GrammarError) -> Self {
        LoadError::Grammar(error)
    }
}

/// A constructed parser for one grammar.
#[derive(Debug)]
pub struct Parser {
    grammar: Grammar,
    errors: Vec<SyntaxError>,
}

impl Parser {
    /// Build a parser from already-adapted document entries.
    pub fn from_document(document: &GrammarDocument) -> Result<Self, LoadError> {
        Ok(Self {
            grammar: Grammar::from_document(document)?,
            errors: Vec::new(),
        })
    }

    /// Build a parser from a parsed JSON value.
    pub fn from_value(value: &Value) -> Result<Self, LoadError> {
        let document = GrammarDocument::from_value(value).map_err(GrammarError::from)?;
        Self::from_document(&document)
    }

    /// Build a parser from a JSON grammar string.
    pub fn from_json(grammar: &str) -> Result<Self, LoadError> {
        let value: Value = serde_json::from_str(grammar)?;
        Self::from_value(&value)
    }

    /// Build a parser from a readable JSON grammar source.
    pub fn from_reader(mut reader: impl Read) -> Result<Self, LoadError> {
        let mut grammar = String::new();
        reader.read_to_string(&mut grammar)?;
        Self::from_json(&grammar)
    }

    /// Build a parser from a JSON grammar file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Parse one input string against the grammar's start rule.
    ///
    /// On failure the returned error is the most recent record of the error
    /// stack; the full stack stays available through
    /// [`error_stack`](Self::error_stack) and is not cleared between calls.
    pub fn generate_ast(&mut self, input: &str) -> Result<Ast, SyntaxError> {
        let Self { grammar, errors } = self;
        Engine::new(grammar, input, errors).run()
    }

    /// The validated grammar tables this parser matches against.
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Chronological log of every recorded match failure, including
    /// explored-and-abandoned branches of successful parses.
    pub fn error_stack(&self) -> &[SyntaxError] {
        &self.errors
    }

    /// The most recently recorded failure.
    pub fn last_error(&self) -> Option<&SyntaxError> {
        self.errors.last()
    }

    /// Drop all recorded failures.
    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }
}
