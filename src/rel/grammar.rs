//! Grammar tables: terminal rules, composite rules, name resolution
//!
//! The loader turns a [`GrammarDocument`] into the two read-only tables
//! the engine matches against: terminal rules (named regexes, the token
//! producers) and composite rules (named lists of compiled rule
//! expressions). Everything is validated here (expression syntax, regex
//! syntax, cross-references), so a constructed [`Grammar`] is always
//! internally consistent.
//!
//! Name resolution
//!
//! A reference target resolves in namespace order: rules first, then the
//! terminal table, then the implicit terminals. Within the terminal
//! table, later entries shadow earlier ones, which is how a user
//! terminal overrides a built-in of the same name. The first rule of the
//! document is the start rule; rule order is significant.
//!
//! Built-in terminals
//!
//! Three user-visible defaults seed the terminal table: `integer`,
//! `identifier` and `real`. A further implicit set (`any`, `alpha`,
//! `alnum`, `digit`, `hexDigit`, `octDigit`, `space`, `newLine`, `eof`)
//! is always resolvable without being declared. All of them take part in
//! tokenization; `any` and `newLine` between them cover every input
//! character, which the constant-matching engine relies on.

use crate::rel::document::GrammarDocument;
use crate::rel::expression::{ExpressionElement, ExpressionError, RuleExpression};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// A named regular expression producing tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalRule {
    pub name: String,
    pub pattern: String,
}

impl TerminalRule {
    fn new(name: &str, pattern: &str) -> Self {
        Self {
            name: name.to_string(),
            pattern: pattern.to_string(),
        }
    }
}

/// A named list of alternative rule expressions; the first that matches wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub name: String,
    pub expressions: Vec<RuleExpression>,
}

/// A terminal rule with its compiled regex, ready for scanning.
#[derive(Debug)]
pub(crate) struct ScanRule {
    pub terminal: TerminalRule,
    pub regex: Regex,
}

/// Defaults visible in the terminal table.
static DEFAULT_TERMINALS: Lazy<Vec<TerminalRule>> = Lazy::new(|| {
    vec![
        TerminalRule::new("integer", r"[-|+]?\d+"),
        TerminalRule::new("identifier", "[_a-zA-Z][_a-zA-Z0-9]*"),
        TerminalRule::new("real", r"[+|-]?\d+(\.\d+)?"),
    ]
});

/// Implicit terminals, resolvable without declaration.
static IMPLICIT_TERMINALS: Lazy<Vec<TerminalRule>> = Lazy::new(|| {
    vec![
        TerminalRule::new("any", "."),
        TerminalRule::new("alpha", "[a-zA-Z]"),
        TerminalRule::new("alnum", "[a-zA-Z0-9]"),
        TerminalRule::new("digit", "[0-9]"),
        TerminalRule::new("hexDigit", "[0-9a-fA-F]"),
        TerminalRule::new("octDigit", "[0-7]"),
        TerminalRule::new("space", r"\s"),
        TerminalRule::new("newLine", r"\r?\n"),
        TerminalRule::new("eof", r"\z"),
    ]
});

/// Error raised while building a grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    /// The document itself was malformed.
    Document(crate::rel::document::DocumentError),
    /// A rule expression failed to compile.
    Expression { rule: String, error: ExpressionError },
    /// A terminal pattern was rejected by the regex engine.
    InvalidRegex { terminal: String, error: String },
    /// A reference target resolves to nothing.
    UndefinedReference { reference: String, rule: String },
    /// The rules array is empty.
    EmptyGrammar,
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::Document(error) => write!(f, "{error}"),
            GrammarError::Expression { rule, error } => {
                write!(f, "in rule '{rule}': {error}")
            }
            GrammarError::InvalidRegex { terminal, error } => {
                write!(f, "invalid regex for terminal '{terminal}': {error}")
            }
            GrammarError::UndefinedReference { reference, rule } => {
                write!(f, "undefined reference to <{reference}> in rule '{rule}'")
            }
            GrammarError::EmptyGrammar => write!(f, "the grammar defines no rules"),
        }
    }
}

impl std::error::Error for GrammarError {}

impl From<crate::rel::document::DocumentError> for GrammarError {
    fn from(error: crate::rel::document::DocumentError) -> Self {
        GrammarError::Document(error)
    }
}

/// The validated, read-only tables of one grammar.
#[derive(Debug)]
pub struct Grammar {
    /// Visible defaults followed by user terminals, in document order.
    terminals: Vec<TerminalRule>,
    rules: Vec<Rule>,
    scan: Vec<ScanRule>,
}

impl Grammar {
    /// Build and validate a grammar from adapted document entries.
    pub fn from_document(document: &GrammarDocument) -> Result<Grammar, GrammarError> {
        if document.rules.is_empty() {
            return Err(GrammarError::EmptyGrammar);
        }

        let mut terminals = DEFAULT_TERMINALS.clone();
        terminals.extend(
            document
                .terminals
                .iter()
                .map(|entry| TerminalRule::new(&entry.name, &entry.regex)),
        );

        let mut rules = Vec::with_capacity(document.rules.len());
        for entry in &document.rules {
            let expressions = entry
                .expressions
                .iter()
                .map(|source| RuleExpression::compile(source))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|error| GrammarError::Expression {
                    rule: entry.name.clone(),
                    error,
                })?;
            rules.push(Rule {
                name: entry.name.clone(),
                expressions,
            });
        }

        let mut grammar = Grammar {
            terminals,
            rules,
            scan: Vec::new(),
        };
        grammar.check_references()?;
        grammar.scan = grammar.build_scan_set()?;
        Ok(grammar)
    }

    /// All rules, in document order. `rules()[0]` is the start rule.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// The terminal table: visible defaults plus user terminals.
    pub fn terminals(&self) -> &[TerminalRule] {
        &self.terminals
    }

    pub fn start_rule(&self) -> &Rule {
        &self.rules[0]
    }

    /// First rule with this name, in document order.
    pub fn find_rule(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.name == name)
    }

    /// Resolve a terminal name: newest table entry first, implicit set last.
    pub fn resolve_terminal(&self, name: &str) -> Option<&TerminalRule> {
        self.terminals
            .iter()
            .rev()
            .find(|terminal| terminal.name == name)
            .or_else(|| {
                IMPLICIT_TERMINALS
                    .iter()
                    .find(|terminal| terminal.name == name)
            })
    }

    /// Whether a reference target resolves to anything.
    pub fn resolves(&self, name: &str) -> bool {
        self.find_rule(name).is_some() || self.resolve_terminal(name).is_some()
    }

    pub(crate) fn scan_rules(&self) -> &[ScanRule] {
        &self.scan
    }

    fn check_references(&self) -> Result<(), GrammarError> {
        for rule in &self.rules {
            for expression in &rule.expressions {
                for element in &expression.elements {
                    for target in element_targets(element) {
                        if !self.resolves(target) {
                            return Err(GrammarError::UndefinedReference {
                                reference: target.to_string(),
                                rule: rule.name.clone(),
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Every resolvable terminal name, each compiled once with the pattern
    /// that resolution would pick for it.
    fn build_scan_set(&self) -> Result<Vec<ScanRule>, GrammarError> {
        let mut scanned: Vec<&str> = Vec::new();
        let mut scan = Vec::new();

        let implicit = IMPLICIT_TERMINALS.iter();
        let table = self.terminals.iter();
        for candidate in implicit.chain(table) {
            if scanned.contains(&candidate.name.as_str()) {
                continue;
            }
            scanned.push(&candidate.name);
            let terminal = self
                .resolve_terminal(&candidate.name)
                .cloned()
                .unwrap_or_else(|| candidate.clone());
            let regex =
                Regex::new(&terminal.pattern).map_err(|error| GrammarError::InvalidRegex {
                    terminal: terminal.name.clone(),
                    error: error.to_string(),
                })?;
            scan.push(ScanRule { terminal, regex });
        }
        Ok(scan)
    }
}

fn element_targets(element: &ExpressionElement) -> Vec<&str> {
    match element {
        ExpressionElement::Constant { .. } => Vec::new(),
        ExpressionElement::Reference(reference) => vec![reference.target.as_str()],
        ExpressionElement::Alternative { refs } => {
            refs.iter().map(|r| r.target.as_str()).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rel::document::{RuleEntry, TerminalEntry};

    fn document(
        terminals: Vec<(&str, &str)>,
        rules: Vec<(&str, Vec<&str>)>,
    ) -> GrammarDocument {
        GrammarDocument {
            terminals: terminals
                .into_iter()
                .map(|(name, regex)| TerminalEntry {
                    name: name.to_string(),
                    regex: regex.to_string(),
                })
                .collect(),
            rules: rules
                .into_iter()
                .map(|(name, expressions)| RuleEntry {
                    name: name.to_string(),
                    expressions: expressions.into_iter().map(str::to_string).collect(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_defaults_are_seeded() {
        let grammar =
            Grammar::from_document(&document(vec![], vec![("r", vec!["x"])])).unwrap();
        let names: Vec<_> = grammar
            .terminals()
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(names, vec!["integer", "identifier", "real"]);
    }

    #[test]
    fn test_user_terminal_overrides_default() {
        let grammar = Grammar::from_document(&document(
            vec![("integer", "[0-9]+")],
            vec![("r", vec!["<integer>"])],
        ))
        .unwrap();
        let resolved = grammar.resolve_terminal("integer").unwrap();
        assert_eq!(resolved.pattern, "[0-9]+");
        // the overriding pattern is scanned exactly once
        let count = grammar
            .scan_rules()
            .iter()
            .filter(|scan| scan.terminal.name == "integer")
            .count();
        assert_eq!(count, 1);
        assert!(grammar
            .scan_rules()
            .iter()
            .all(|scan| scan.terminal.name != "integer" || scan.terminal.pattern == "[0-9]+"));
    }

    #[test]
    fn test_later_duplicate_shadows_earlier() {
        let grammar = Grammar::from_document(&document(
            vec![("sep", ","), ("sep", ";")],
            vec![("r", vec!["<sep>"])],
        ))
        .unwrap();
        assert_eq!(grammar.resolve_terminal("sep").unwrap().pattern, ";");
    }

    #[test]
    fn test_implicit_terminals_resolve() {
        let grammar =
            Grammar::from_document(&document(vec![], vec![("r", vec!["<digit>"])])).unwrap();
        for name in [
            "any", "alpha", "alnum", "digit", "hexDigit", "octDigit", "space", "newLine", "eof",
        ] {
            assert!(
                grammar.resolve_terminal(name).is_some(),
                "implicit terminal {name} should resolve"
            );
        }
    }

    #[test]
    fn test_rule_shadows_terminal_name() {
        let grammar = Grammar::from_document(&document(
            vec![("value", "v")],
            vec![("value", vec!["x"]), ("r", vec!["<value>"])],
        ))
        .unwrap();
        assert!(grammar.find_rule("value").is_some());
        // terminal still resolvable for the lexer
        assert!(grammar.resolve_terminal("value").is_some());
    }

    #[test]
    fn test_undefined_reference_names_target_and_rule() {
        let err = Grammar::from_document(&document(vec![], vec![("start", vec!["<foo>"])]))
            .unwrap_err();
        let message = format!("{err}");
        assert!(message.contains("foo"), "message: {message}");
        assert!(message.contains("start"), "message: {message}");
    }

    #[test]
    fn test_undefined_reference_inside_alternative() {
        let err = Grammar::from_document(&document(
            vec![("yes", "yes")],
            vec![("start", vec!["<yes|nope>"])],
        ))
        .unwrap_err();
        assert!(matches!(
            err,
            GrammarError::UndefinedReference { reference, .. } if reference == "nope"
        ));
    }

    #[test]
    fn test_empty_rules_rejected() {
        let err = Grammar::from_document(&document(vec![("t", "t")], vec![])).unwrap_err();
        assert_eq!(err, GrammarError::EmptyGrammar);
    }

    #[test]
    fn test_bad_expression_names_rule() {
        let err =
            Grammar::from_document(&document(vec![], vec![("broken", vec!["<a{"])])).unwrap_err();
        assert!(matches!(err, GrammarError::Expression { rule, .. } if rule == "broken"));
    }

    #[test]
    fn test_invalid_regex_names_terminal() {
        let err = Grammar::from_document(&document(
            vec![("open", "[unclosed")],
            vec![("r", vec!["<open>"])],
        ))
        .unwrap_err();
        assert!(matches!(err, GrammarError::InvalidRegex { terminal, .. } if terminal == "open"));
    }

    #[test]
    fn test_start_rule_is_first() {
        let grammar = Grammar::from_document(&document(
            vec![],
            vec![("first", vec!["a"]), ("second", vec!["b"])],
        ))
        .unwrap();
        assert_eq!(grammar.start_rule().name, "first");
    }

    #[test]
    fn test_scan_set_covers_user_terminals() {
        let grammar = Grammar::from_document(&document(
            vec![("arrow", "->")],
            vec![("r", vec!["<arrow>"])],
        ))
        .unwrap();
        assert!(grammar
            .scan_rules()
            .iter()
            .any(|scan| scan.terminal.name == "arrow"));
    }
}
