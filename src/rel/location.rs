//! Line and column lookup for diagnostics
//!
//! Tokens and syntax errors report where in the input they point: a byte
//! `index` plus a 0-based line/column pair. Both coordinates are derived
//! straight from the input text by counting `\n` characters in the
//! prefix before the offset; the column restarts at 0 after every
//! newline and counts bytes, matching the offsets recorded in tokens.
//! There is no per-input index structure to build or keep in sync.
//!
//! One-off lookups (error records) use [`line_and_column`]. The lexer
//! asks for positions in ascending offset order while it walks one
//! terminal's matches, so it uses [`LineCounter`] instead, which
//! remembers how far it has scanned and reads each input byte once.

/// Line and column of a byte offset, counting newlines in the prefix.
pub fn line_and_column(input: &str, byte_offset: usize) -> (usize, usize) {
    let prefix = &input[..byte_offset.min(input.len())];
    let line = prefix.bytes().filter(|byte| *byte == b'\n').count();
    let column = match prefix.rfind('\n') {
        Some(newline) => prefix.len() - newline - 1,
        None => prefix.len(),
    };
    (line, column)
}

/// Forward-only position tracker for ascending offset lookups.
pub struct LineCounter {
    line: usize,
    line_start: usize,
    scanned: usize,
}

impl LineCounter {
    pub fn new() -> Self {
        Self {
            line: 0,
            line_start: 0,
            scanned: 0,
        }
    }

    /// Position of `byte_offset`. Offsets must not precede an earlier
    /// lookup through the same counter.
    pub fn advance_to(&mut self, input: &str, byte_offset: usize) -> (usize, usize) {
        let target = byte_offset.min(input.len());
        let bytes = input.as_bytes();
        while self.scanned < target {
            if bytes[self.scanned] == b'\n' {
                self.line += 1;
                self.line_start = self.scanned + 1;
            }
            self.scanned += 1;
        }
        (self.line, target.saturating_sub(self.line_start))
    }
}

impl Default for LineCounter {
    fn default() -> Self {
        Self::new()
    }
}
