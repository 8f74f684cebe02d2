//! Recursive-descent matching engine
//!
//! The engine walks grammar rules against the token stream with a
//! two-level cursor: `token` selects a token, `offset` a byte inside its
//! value. Constants consume characters through tokens; references
//! consume whole tokens (or whole sub-trees when the target is a rule).
//! Backtracking is done by value: the cursor is copied before every
//! speculative branch and written back on failure, and element results
//! are collected per expression, so an abandoned branch leaves neither
//! children nor cursor movement behind. Its error records stay on the
//! stack as a trace of what was explored.
//!
//! Token selection
//!
//! Tokens overlap freely, so a cursor position rarely identifies one
//! token. A reference scans forward across every token starting at the
//! current input position and takes the first whose terminal name
//! matches. Constant matching re-anchors after each exhausted token at
//! the next input position: the earliest unconsumed token spanning it,
//! or the first token at or after it. The implicit terminals guarantee
//! a token starts at every character, so this walk cannot strand.

use crate::rel::ast::Ast;
use crate::rel::errors::{SyntaxError, SyntaxErrorKind};
use crate::rel::expression::{
    CaseFolding, ExpressionElement, ExpressionFlags, ExpressionReference, Quantifier,
    RuleExpression,
};
use crate::rel::grammar::{Grammar, Rule};
use crate::rel::lexing::{tokenize, Token};
use crate::rel::location::line_and_column;

/// Two-level parse position: a token and a byte offset inside its value.
///
/// `token == tokens.len()` marks end of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cursor {
    token: usize,
    offset: usize,
}

/// One `generate_ast` run over one input string.
pub(crate) struct Engine<'a> {
    grammar: &'a Grammar,
    input: &'a str,
    tokens: Vec<Token>,
    cursor: Cursor,
    errors: &'a mut Vec<SyntaxError>,
}

impl<'a> Engine<'a> {
    pub fn new(grammar: &'a Grammar, input: &'a str, errors: &'a mut Vec<SyntaxError>) -> Self {
        Self {
            grammar,
            input,
            tokens: tokenize(grammar, input),
            cursor: Cursor { token: 0, offset: 0 },
            errors,
        }
    }

    /// Match the start rule and build the tree, or surface the most recent
    /// failure record.
    pub fn run(&mut self) -> Result<Ast, SyntaxError> {
        let grammar = self.grammar;
        self.cursor = Cursor { token: 0, offset: 0 };
        match self.analyze_rule(grammar.start_rule()) {
            Some(node) => Ok(node),
            None => Err(self.errors.last().cloned().unwrap_or_else(|| {
                SyntaxError::new(
                    SyntaxErrorKind::UnmatchedRule,
                    format!("input does not match rule '{}'", grammar.start_rule().name),
                    0,
                    0,
                    0,
                )
            })),
        }
    }

    /// Absolute byte position of the cursor in the input.
    fn position(&self) -> usize {
        match self.tokens.get(self.cursor.token) {
            Some(token) => token.index + self.cursor.offset,
            None => self.input.len(),
        }
    }

    fn push_error(&mut self, kind: SyntaxErrorKind, message: String) {
        let index = self.position();
        let (line, column) = line_and_column(self.input, index);
        self.errors
            .push(SyntaxError::new(kind, message, index, line, column));
    }

    /// Cursor for an input position: the earliest unconsumed token spanning
    /// it, else the first token starting at or after it.
    fn seek(&self, from: usize, pos: usize) -> Cursor {
        let mut at_or_after = None;
        for (i, token) in self.tokens.iter().enumerate().skip(from) {
            if token.index >= pos && at_or_after.is_none() {
                at_or_after = Some(i);
            }
            if token.index <= pos && pos < token.end() {
                return Cursor {
                    token: i,
                    offset: pos - token.index,
                };
            }
            if token.index > pos {
                break;
            }
        }
        Cursor {
            token: at_or_after.unwrap_or(self.tokens.len()),
            offset: 0,
        }
    }

    /// Try each expression of a rule in order from the same snapshot; the
    /// first full match keeps its children under a node named after the rule.
    fn analyze_rule(&mut self, rule: &Rule) -> Option<Ast> {
        let entry = self.cursor;
        for expression in &rule.expressions {
            self.cursor = entry;
            if let Some(children) = self.match_expression(expression, &rule.name) {
                return Some(Ast::branch_with(&rule.name, children));
            }
        }
        self.cursor = entry;
        self.push_error(
            SyntaxErrorKind::UnmatchedRule,
            format!("no expression of rule '{}' matched", rule.name),
        );
        None
    }

    /// Match every element of an expression consecutively, collecting the
    /// produced nodes. Any element failure fails the whole expression.
    fn match_expression(
        &mut self,
        expression: &RuleExpression,
        rule_name: &str,
    ) -> Option<Vec<Ast>> {
        // TODO: enforce the 'b' boundary flag here once constant matching
        // tracks word edges.
        let mut children = Vec::new();
        for element in &expression.elements {
            if expression.flags.ignore_spaces {
                self.skip_spaces();
            }
            match element {
                ExpressionElement::Constant { literal } => {
                    children.push(self.match_constant(literal, &expression.flags, rule_name)?);
                }
                ExpressionElement::Reference(reference) => {
                    self.match_reference(reference, &mut children)?;
                }
                ExpressionElement::Alternative { refs } => {
                    self.match_alternative(refs, &mut children)?;
                }
            }
        }
        Some(children)
    }

    /// Character-by-character match of a literal through the token stream.
    fn match_constant(
        &mut self,
        literal: &str,
        flags: &ExpressionFlags,
        rule_name: &str,
    ) -> Option<Ast> {
        let start = self.position();
        let mut pos = start;
        for expected in literal.chars() {
            self.cursor = self.seek(self.cursor.token, pos);
            let found = if self.position() == pos {
                self.tokens
                    .get(self.cursor.token)
                    .and_then(|token| token.value[self.cursor.offset..].chars().next())
            } else {
                None
            };
            let Some(found) = found else {
                self.push_error(
                    SyntaxErrorKind::ExpectedToken,
                    format!(
                        "expected '{}', found end of input",
                        expected.escape_debug()
                    ),
                );
                return None;
            };
            if !chars_match(expected, found, flags.case_folding) {
                self.push_error(
                    SyntaxErrorKind::ExpectedToken,
                    format!(
                        "expected '{}', found '{}'",
                        expected.escape_debug(),
                        found.escape_debug()
                    ),
                );
                return None;
            }
            pos += found.len_utf8();
        }
        self.cursor = self.seek(self.cursor.token, pos);

        let matched = &self.input[start..pos];
        let value = if flags.case_folding == CaseFolding::Strict {
            matched.to_lowercase()
        } else {
            matched.to_string()
        };
        Some(Ast::leaf(rule_name, value))
    }

    /// Match one reference with its quantifier, appending every produced
    /// node to `out` only when the quantifier as a whole is satisfied.
    fn match_reference(
        &mut self,
        reference: &ExpressionReference,
        out: &mut Vec<Ast>,
    ) -> Option<()> {
        let mut matched = Vec::new();
        match reference.quantifier {
            Quantifier::None => {
                matched.push(self.try_reference_once(&reference.target)?);
            }
            Quantifier::ZeroOrOne => {
                let saved = self.cursor;
                match self.try_reference_once(&reference.target) {
                    Some(node) => matched.push(node),
                    None => self.cursor = saved,
                }
            }
            Quantifier::ZeroOrMore => {
                self.match_repeated(&reference.target, usize::MAX, &mut matched);
            }
            Quantifier::OneOrMore => {
                self.match_repeated(&reference.target, usize::MAX, &mut matched);
                if matched.is_empty() {
                    self.push_error(
                        SyntaxErrorKind::UnmatchedRule,
                        format!("expected at least one '{}'", reference.target),
                    );
                    return None;
                }
            }
            Quantifier::Exactly(count) => {
                let entry = self.cursor;
                for attempt in 0..count {
                    match self.try_reference_once(&reference.target) {
                        Some(node) => matched.push(node),
                        None => {
                            self.cursor = entry;
                            self.push_error(
                                SyntaxErrorKind::UnmatchedRule,
                                format!(
                                    "expected {count} occurrences of '{}', found {attempt}",
                                    reference.target
                                ),
                            );
                            return None;
                        }
                    }
                }
                // one probe past the count: a successful match is rolled
                // back so the cursor rests after the count-th; a failed
                // probe leaves its record on the stack
                let after_last = self.cursor;
                let _ = self.try_reference_once(&reference.target);
                self.cursor = after_last;
            }
            Quantifier::Range(low, high) => {
                let entry = self.cursor;
                self.match_repeated(&reference.target, high, &mut matched);
                if matched.len() < low {
                    let found = matched.len();
                    self.cursor = entry;
                    self.push_error(
                        SyntaxErrorKind::UnmatchedRule,
                        format!(
                            "expected between {low} and {high} occurrences of '{}', found {found}",
                            reference.target
                        ),
                    );
                    return None;
                }
            }
        }
        out.extend(matched);
        Some(())
    }

    /// Greedy repetition up to `limit` matches. Restores the cursor after
    /// the first failure and stops after a success that does not advance it.
    fn match_repeated(&mut self, target: &str, limit: usize, matched: &mut Vec<Ast>) {
        while matched.len() < limit {
            let saved = self.cursor;
            match self.try_reference_once(target) {
                Some(node) => {
                    let stalled = self.cursor == saved;
                    matched.push(node);
                    if stalled {
                        break;
                    }
                }
                None => {
                    self.cursor = saved;
                    break;
                }
            }
        }
    }

    /// First branch whose quantified match succeeds wins; branches are tried
    /// in order from the same snapshot.
    fn match_alternative(
        &mut self,
        refs: &[ExpressionReference],
        out: &mut Vec<Ast>,
    ) -> Option<()> {
        let saved = self.cursor;
        for reference in refs {
            self.cursor = saved;
            let mut branch = Vec::new();
            if self.match_reference(reference, &mut branch).is_some() {
                out.extend(branch);
                return Some(());
            }
        }
        self.cursor = saved;
        let names: Vec<_> = refs.iter().map(|r| r.target.as_str()).collect();
        self.push_error(
            SyntaxErrorKind::UnmatchedRule,
            format!("no alternative of <{}> matched", names.join("|")),
        );
        None
    }

    /// One unquantified match of a reference target: a sub-tree when the
    /// target is a rule, a single token when it is a terminal. Rules shadow
    /// terminals.
    fn try_reference_once(&mut self, target: &str) -> Option<Ast> {
        let grammar = self.grammar;
        if let Some(rule) = grammar.find_rule(target) {
            return self.analyze_rule(rule);
        }
        if grammar.resolve_terminal(target).is_some() {
            return self.match_terminal(target);
        }
        None
    }

    /// Consume the first token at the current input position produced by
    /// the named terminal, scanning across same-position candidates.
    fn match_terminal(&mut self, name: &str) -> Option<Ast> {
        let pos = self.position();
        let mut i = self.cursor.token;
        while let Some(token) = self.tokens.get(i) {
            if token.index > pos {
                break;
            }
            if token.index == pos && token.from.name == name {
                let leaf = Ast::leaf(name, token.value.clone());
                let end = token.end();
                self.cursor = self.seek(i + 1, end);
                return Some(leaf);
            }
            i += 1;
        }
        self.push_error(
            SyntaxErrorKind::ExpectedToken,
            format!("expected token '{name}'"),
        );
        None
    }

    /// Advance the cursor past spaces and tabs (the `s` flag).
    fn skip_spaces(&mut self) {
        let mut pos = self.position();
        while matches!(self.input[pos..].chars().next(), Some(' ' | '\t')) {
            pos += 1;
        }
        if pos != self.position() {
            self.cursor = self.seek(self.cursor.token, pos);
        }
    }
}

fn chars_match(expected: char, found: char, folding: CaseFolding) -> bool {
    match folding {
        CaseFolding::Clear => expected == found,
        CaseFolding::Soft | CaseFolding::Strict => {
            expected == found || expected.to_lowercase().eq(found.to_lowercase())
        }
    }
}
