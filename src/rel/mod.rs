//! The rel matching engine
//!
//! "rel" is the rule-expression language: the mini-language grammar
//! documents use for the body of their rules. This module tree holds the
//! complete pipeline from a grammar document to a parse tree:
//!
//! 1. Compilation: every rule-expression string is compiled into a
//!    typed element list. See [expression].
//! 2. Loading: the document's terminal and rule arrays become
//!    validated, read-only tables. See [document] and [grammar].
//! 3. Tokenization: every terminal's regex is scanned over the
//!    input, producing a position-sorted token stream. See [lexing].
//! 4. Matching: a backtracking recursive descent over the tokens
//!    builds the tree or records why it could not. See [engine],
//!    [ast] and [errors].
//!
//! Steps 1 and 2 happen once per grammar, steps 3 and 4 once per parsed
//! input. The [parser] module ties the pipeline together behind the
//! [`Parser`](parser::Parser) facade, which is the only entry point most
//! callers need.

pub mod ast;
pub mod document;
pub(crate) mod engine;
pub mod errors;
pub mod expression;
pub mod grammar;
pub mod lexing;
pub mod location;
pub mod parser;
pub mod testing;

pub use ast::{Ast, AstSnapshot};
pub use document::{GrammarDocument, RuleEntry, TerminalEntry};
pub use errors::{SyntaxError, SyntaxErrorKind};
pub use expression::{Quantifier, RuleExpression};
pub use grammar::{Grammar, GrammarError, Rule, TerminalRule};
pub use lexing::Token;
pub use parser::{LoadError, Parser};
