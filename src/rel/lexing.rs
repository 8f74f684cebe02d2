//! Tokenization
//!
//! The lexer runs every terminal rule's regex over the input as a
//! repeated non-overlapping search and collects one token per match,
//! then stable-sorts the lot by byte index. It is deliberately not a
//! longest-match tokenizer: every match of every terminal is kept, so
//! tokens from different terminals routinely overlap and share start
//! positions. The matching engine picks between candidates by terminal
//! name at the point where a reference consumes a token.
//!
//! Token values are byte-exact slices of the input and positions are
//! preserved end to end; nothing downstream may alter them.

use crate::rel::grammar::{Grammar, TerminalRule};
use crate::rel::location::LineCounter;

/// One terminal match, with its source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The terminal rule that produced this token.
    pub from: TerminalRule,
    /// Byte offset of the match in the input.
    pub index: usize,
    pub column: usize,
    pub line: usize,
    /// The matched text, equal to the input slice at `index`.
    pub value: String,
}

impl Token {
    /// Byte offset one past the end of the matched text.
    pub fn end(&self) -> usize {
        self.index + self.value.len()
    }
}

/// Scan the input with every terminal of the grammar.
///
/// The result is sorted by `index`; tokens sharing an index keep the scan
/// order of their terminals (the sort is stable).
pub fn tokenize(grammar: &Grammar, input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();

    for scan in grammar.scan_rules() {
        // matches of one terminal arrive in ascending order, so a
        // forward-only counter covers them
        let mut positions = LineCounter::new();
        for found in scan.regex.find_iter(input) {
            let (line, column) = positions.advance_to(input, found.start());
            tokens.push(Token {
                from: scan.terminal.clone(),
                index: found.start(),
                column,
                line,
                value: found.as_str().to_string(),
            });
        }
    }

    tokens.sort_by_key(|token| token.index);
    tokens
}
