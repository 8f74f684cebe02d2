//! Syntax-error records produced while matching
//!
//! Matching never unwinds mid-parse: every failing primitive appends one
//! record to the parser's error stack and reports failure to its caller, and
//! backtracking decides what happens next. The stack is therefore a
//! chronological log of every branch the engine explored and abandoned, not
//! just of the final failure. A successful parse can leave records behind;
//! callers inspecting the stack after success should treat them as advisory.
//!
//! The stack is owned by the [`Parser`](crate::rel::parser::Parser) instance
//! and is only cleared on request, so diagnostics survive across
//! `generate_ast` calls.

use std::fmt;

/// Classification of a recorded match failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    /// A constant literal or expected terminal token did not match the input.
    ExpectedToken,
    /// Reserved for input present where none is expected (e.g. trailing text
    /// in a future strict mode).
    UnexpectedToken,
    /// Every expression of a rule, every branch of an alternative, or a
    /// required repetition failed to match.
    UnmatchedRule,
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyntaxErrorKind::ExpectedToken => "expected token",
            SyntaxErrorKind::UnexpectedToken => "unexpected token",
            SyntaxErrorKind::UnmatchedRule => "unmatched rule",
        };
        f.write_str(name)
    }
}

/// One entry of the error stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub message: String,
    /// Byte offset into the input where the failure was observed.
    pub index: usize,
    pub column: usize,
    pub line: usize,
}

impl SyntaxError {
    pub fn new(
        kind: SyntaxErrorKind,
        message: String,
        index: usize,
        line: usize,
        column: usize,
    ) -> Self {
        Self {
            kind,
            message,
            index,
            column,
            line,
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {}:{}: {}",
            self.kind, self.line, self.column, self.message
        )
    }
}

impl std::error::Error for SyntaxError {}
