//! Rule-expression compiler
//!
//! A rule expression is the body of a grammar rule, written in a small
//! mini-language: constants are matched literally, `<name>` references
//! another rule or a terminal, `<a|b>` picks the first branch that
//! matches, and a reference can carry a quantifier (`?`, `*`, `+`,
//! `{n}`, `{n:m}`). An optional leading `[iIbs]` block sets flags for
//! the whole expression.
//!
//! The compiler turns one expression string into a [`RuleExpression`]:
//! a flag set plus an ordered list of typed elements. All surface-level
//! validation happens here, so the matching engine never sees a
//! malformed element. Errors carry the character offset where the
//! problem was detected.
//!
//! Escapes
//!
//! Inside a constant, `\n`, `\t`, `\r`, `\v` and `\0` decode to control
//! codes; a backslash before any other character yields that character,
//! which is how literal `<`, `>`, `[` and `\` are written. An unescaped
//! `>` outside a reference is rejected.

use std::fmt;

/// Repetition attached to a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    /// Match exactly once.
    None,
    /// `?`
    ZeroOrOne,
    /// `*`
    ZeroOrMore,
    /// `+`
    OneOrMore,
    /// `{n}`
    Exactly(usize),
    /// `{lo:hi}`, inclusive on both ends.
    Range(usize, usize),
}

/// Case handling requested by the `i`/`I` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseFolding {
    /// Case-sensitive matching.
    #[default]
    Clear,
    /// `i`: case-insensitive matching, tree keeps the input spelling.
    Soft,
    /// `I`: case-insensitive matching, tree value is lowercased.
    Strict,
}

/// Whole-expression flags from the leading `[...]` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExpressionFlags {
    pub case_folding: CaseFolding,
    /// `b`: require word boundaries around the match.
    pub boundary: bool,
    /// `s`: skip spaces between elements while matching.
    pub ignore_spaces: bool,
}

/// A single named reference with its quantifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionReference {
    pub target: String,
    pub quantifier: Quantifier,
}

/// One element of a compiled expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpressionElement {
    /// A decoded literal, matched character by character.
    Constant { literal: String },
    /// A reference to a rule or terminal.
    Reference(ExpressionReference),
    /// A one-of choice between two or more references. Every branch carries
    /// the group quantifier, which the surface grammar restricts to `{n}` or
    /// `{n:m}`.
    Alternative { refs: Vec<ExpressionReference> },
}

/// A compiled rule expression: flags plus consecutive elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleExpression {
    pub flags: ExpressionFlags,
    pub elements: Vec<ExpressionElement>,
}

impl RuleExpression {
    /// Compile one rule-expression string.
    pub fn compile(source: &str) -> Result<RuleExpression, ExpressionError> {
        Compiler::new(source).compile()
    }
}

/// Compile failure with the character offset where it was detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionError {
    pub message: String,
    pub offset: usize,
}

impl ExpressionError {
    fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

impl fmt::Display for ExpressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at offset {})", self.message, self.offset)
    }
}

impl std::error::Error for ExpressionError {}

struct Compiler {
    chars: Vec<char>,
    pos: usize,
}

impl Compiler {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<char> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn error(&self, message: impl Into<String>, offset: usize) -> ExpressionError {
        ExpressionError::new(message, offset)
    }

    fn compile(mut self) -> Result<RuleExpression, ExpressionError> {
        let flags = if self.peek() == Some('[') {
            self.parse_flags()?
        } else {
            ExpressionFlags::default()
        };

        let mut elements = Vec::new();
        while let Some(ch) = self.peek() {
            if ch == '<' {
                elements.push(self.parse_reference()?);
            } else {
                elements.push(self.parse_constant()?);
            }
        }

        if elements.is_empty() {
            return Err(self.error("expression has no elements", self.pos));
        }
        Ok(RuleExpression { flags, elements })
    }

    fn parse_flags(&mut self) -> Result<ExpressionFlags, ExpressionError> {
        self.next(); // consume '['
        let mut flags = ExpressionFlags::default();
        loop {
            let at = self.pos;
            match self.next() {
                None => {
                    return Err(self.error("unterminated flag block, ']' was expected", at));
                }
                Some(']') => return Ok(flags),
                Some('i') => match flags.case_folding {
                    CaseFolding::Strict => {
                        return Err(self.error("'i' flag cannot be combined with 'I'", at));
                    }
                    CaseFolding::Soft => {
                        return Err(self.error("'i' flag is already set", at));
                    }
                    CaseFolding::Clear => flags.case_folding = CaseFolding::Soft,
                },
                Some('I') => match flags.case_folding {
                    CaseFolding::Soft => {
                        return Err(self.error("'I' flag cannot be combined with 'i'", at));
                    }
                    CaseFolding::Strict => {
                        return Err(self.error("'I' flag is already set", at));
                    }
                    CaseFolding::Clear => flags.case_folding = CaseFolding::Strict,
                },
                Some('b') => {
                    if flags.boundary {
                        return Err(self.error("'b' flag is already set", at));
                    }
                    flags.boundary = true;
                }
                Some('s') => {
                    if flags.ignore_spaces {
                        return Err(self.error("'s' flag is already set", at));
                    }
                    flags.ignore_spaces = true;
                }
                Some('<') => {
                    return Err(self.error("unexpected '<' in flag block, did you forget ']'?", at));
                }
                Some(other) => {
                    return Err(self.error(format!("unrecognized '{other}' flag"), at));
                }
            }
        }
    }

    fn parse_reference(&mut self) -> Result<ExpressionElement, ExpressionError> {
        let open = self.pos;
        self.next(); // consume '<'
        let mut names: Vec<String> = vec![String::new()];
        let mut quantifier = Quantifier::None;

        loop {
            let at = self.pos;
            match self.next() {
                None => {
                    return Err(self.error("unterminated reference, '>' was expected", open));
                }
                Some('>') => break,
                Some('|') => {
                    if names.last().map_or(true, String::is_empty) {
                        return Err(self.error("empty reference name before '|'", at));
                    }
                    names.push(String::new());
                }
                Some(q @ ('?' | '*' | '+')) => {
                    if names.last().map_or(true, String::is_empty) {
                        return Err(self.error("quantifier must follow a reference name", at));
                    }
                    if names.len() > 1 {
                        return Err(self.error(
                            format!("'{q}' quantifier is not allowed after an alternative"),
                            at,
                        ));
                    }
                    quantifier = match q {
                        '?' => Quantifier::ZeroOrOne,
                        '*' => Quantifier::ZeroOrMore,
                        _ => Quantifier::OneOrMore,
                    };
                    self.expect_reference_close()?;
                    break;
                }
                Some('{') => {
                    if names.last().map_or(true, String::is_empty) {
                        return Err(self.error("quantifier must follow a reference name", at));
                    }
                    quantifier = self.parse_braced_quantifier(at)?;
                    self.expect_reference_close()?;
                    break;
                }
                Some(ch) if ch.is_ascii_alphanumeric() => {
                    if let Some(name) = names.last_mut() {
                        name.push(ch);
                    }
                }
                Some(other) => {
                    return Err(self.error(
                        format!("unexpected '{other}' in reference name"),
                        at,
                    ));
                }
            }
        }

        if names.last().map_or(true, String::is_empty) {
            let message = if names.len() > 1 {
                "empty reference name after '|'"
            } else {
                "empty reference"
            };
            return Err(self.error(message, self.pos.saturating_sub(1)));
        }

        if names.len() > 1 {
            let refs = names
                .into_iter()
                .map(|target| ExpressionReference { target, quantifier })
                .collect();
            Ok(ExpressionElement::Alternative { refs })
        } else {
            let target = names.into_iter().next().unwrap_or_default();
            Ok(ExpressionElement::Reference(ExpressionReference {
                target,
                quantifier,
            }))
        }
    }

    fn expect_reference_close(&mut self) -> Result<(), ExpressionError> {
        let at = self.pos;
        match self.next() {
            Some('>') => Ok(()),
            Some(other) => Err(self.error(
                format!("unexpected '{other}' after quantifier, '>' was expected"),
                at,
            )),
            None => Err(self.error("unterminated reference, '>' was expected", at)),
        }
    }

    fn parse_braced_quantifier(&mut self, open: usize) -> Result<Quantifier, ExpressionError> {
        let mut low = String::new();
        let mut high = String::new();
        let mut in_high = false;

        loop {
            let at = self.pos;
            match self.next() {
                None => {
                    return Err(self.error("unterminated quantifier, '}' was expected", open));
                }
                Some('}') => break,
                Some(':') => {
                    if in_high {
                        return Err(self.error("unexpected second ':' in quantifier", at));
                    }
                    if low.is_empty() {
                        return Err(self.error("expected a value before ':' in quantifier", at));
                    }
                    in_high = true;
                }
                Some(ch) if ch.is_ascii_digit() => {
                    if in_high {
                        high.push(ch);
                    } else {
                        low.push(ch);
                    }
                }
                Some(other) => {
                    return Err(self.error(
                        format!("unexpected '{other}' in quantifier, a digit was expected"),
                        at,
                    ));
                }
            }
        }

        if low.is_empty() {
            return Err(self.error("expected a value after '{'", open));
        }
        let low_value: usize = low
            .parse()
            .map_err(|_| self.error("quantifier value is out of range", open))?;

        if in_high {
            if high.is_empty() {
                return Err(self.error("expected a value after ':' in quantifier", open));
            }
            let high_value: usize = high
                .parse()
                .map_err(|_| self.error("quantifier value is out of range", open))?;
            if low_value == 0 {
                return Err(self.error("quantifier range must start at 1 or more", open));
            }
            if low_value > high_value {
                return Err(self.error(
                    format!("invalid quantifier range {{{low_value}:{high_value}}}"),
                    open,
                ));
            }
            Ok(Quantifier::Range(low_value, high_value))
        } else {
            if low_value == 0 {
                return Err(self.error("quantifier must match at least once", open));
            }
            Ok(Quantifier::Exactly(low_value))
        }
    }

    fn parse_constant(&mut self) -> Result<ExpressionElement, ExpressionError> {
        let mut literal = String::new();
        while let Some(ch) = self.peek() {
            match ch {
                '<' => break,
                '>' => {
                    return Err(self.error("unescaped '>' in constant, use '\\>'", self.pos));
                }
                '\\' => {
                    let at = self.pos;
                    self.next();
                    let escaped = self
                        .next()
                        .ok_or_else(|| self.error("incomplete escape at end of expression", at))?;
                    literal.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        'v' => '\u{000B}',
                        '0' => '\0',
                        other => other,
                    });
                }
                other => {
                    self.next();
                    literal.push(other);
                }
            }
        }
        Ok(ExpressionElement::Constant { literal })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(source: &str) -> RuleExpression {
        RuleExpression::compile(source).expect("expression should compile")
    }

    fn compile_err(source: &str) -> ExpressionError {
        RuleExpression::compile(source).expect_err("expression should be rejected")
    }

    #[test]
    fn test_single_constant() {
        let expr = compile("hello");
        assert_eq!(expr.flags, ExpressionFlags::default());
        assert_eq!(
            expr.elements,
            vec![ExpressionElement::Constant {
                literal: "hello".to_string()
            }]
        );
    }

    #[test]
    fn test_constant_escapes() {
        let expr = compile(r"a\n\t\r\v\0\<\>\\b");
        assert_eq!(
            expr.elements,
            vec![ExpressionElement::Constant {
                literal: "a\n\t\r\u{000B}\0<>\\b".to_string()
            }]
        );
    }

    #[test]
    fn test_reference_with_each_quantifier() {
        let cases = [
            ("<word>", Quantifier::None),
            ("<word?>", Quantifier::ZeroOrOne),
            ("<word*>", Quantifier::ZeroOrMore),
            ("<word+>", Quantifier::OneOrMore),
            ("<word{3}>", Quantifier::Exactly(3)),
            ("<word{2:5}>", Quantifier::Range(2, 5)),
        ];
        for (source, quantifier) in cases {
            let expr = compile(source);
            assert_eq!(
                expr.elements,
                vec![ExpressionElement::Reference(ExpressionReference {
                    target: "word".to_string(),
                    quantifier,
                })],
                "source: {source}"
            );
        }
    }

    #[test]
    fn test_mixed_elements_keep_order() {
        let expr = compile("def <identifier>\\<<digit{3}>");
        assert_eq!(expr.elements.len(), 4);
        assert!(matches!(
            &expr.elements[0],
            ExpressionElement::Constant { literal } if literal == "def "
        ));
        assert!(matches!(
            &expr.elements[1],
            ExpressionElement::Reference(r) if r.target == "identifier"
        ));
        assert!(matches!(
            &expr.elements[2],
            ExpressionElement::Constant { literal } if literal == "<"
        ));
        assert!(matches!(
            &expr.elements[3],
            ExpressionElement::Reference(r) if r.quantifier == Quantifier::Exactly(3)
        ));
    }

    #[test]
    fn test_alternative() {
        let expr = compile("<yes|no|maybe>");
        match &expr.elements[0] {
            ExpressionElement::Alternative { refs } => {
                let names: Vec<_> = refs.iter().map(|r| r.target.as_str()).collect();
                assert_eq!(names, vec!["yes", "no", "maybe"]);
                assert!(refs.iter().all(|r| r.quantifier == Quantifier::None));
            }
            other => panic!("expected alternative, got {other:?}"),
        }
    }

    #[test]
    fn test_alternative_with_counted_quantifier() {
        let expr = compile("<a|b{2:4}>");
        match &expr.elements[0] {
            ExpressionElement::Alternative { refs } => {
                assert!(refs.iter().all(|r| r.quantifier == Quantifier::Range(2, 4)));
            }
            other => panic!("expected alternative, got {other:?}"),
        }
    }

    #[test]
    fn test_alternative_rejects_star() {
        let err = compile_err("<a|b*>");
        assert!(err.message.contains("'*'"), "message: {}", err.message);
        assert_eq!(err.offset, 4);
    }

    #[test]
    fn test_flags() {
        let expr = compile("[ibs]x");
        assert_eq!(
            expr.flags,
            ExpressionFlags {
                case_folding: CaseFolding::Soft,
                boundary: true,
                ignore_spaces: true,
            }
        );

        let expr = compile("[I]x");
        assert_eq!(expr.flags.case_folding, CaseFolding::Strict);
    }

    #[test]
    fn test_incompatible_case_flags() {
        let err = compile_err("[iI]x");
        assert!(err.message.contains("'I'"), "message: {}", err.message);
        assert_eq!(err.offset, 2);
    }

    #[test]
    fn test_duplicate_flag() {
        let err = compile_err("[bb]x");
        assert!(err.message.contains("already set"));
    }

    #[test]
    fn test_unterminated_flag_block() {
        let err = compile_err("[ib");
        assert!(err.message.contains("']'"));
    }

    #[test]
    fn test_flag_block_hitting_reference() {
        let err = compile_err("[i<word>");
        assert!(err.message.contains("forget ']'"));
        assert_eq!(err.offset, 2);
    }

    #[test]
    fn test_unterminated_reference() {
        let err = compile_err("<word");
        assert!(err.message.contains("'>'"));
        assert_eq!(err.offset, 0);
    }

    #[test]
    fn test_bad_reference_name() {
        let err = compile_err("<wo-rd>");
        assert!(err.message.contains("'-'"));
        assert_eq!(err.offset, 3);
    }

    #[test]
    fn test_empty_reference() {
        assert!(compile_err("<>").message.contains("empty reference"));
        assert!(compile_err("<a|>").message.contains("after '|'"));
        assert!(compile_err("<|a>").message.contains("before '|'"));
    }

    #[test]
    fn test_quantifier_errors() {
        assert!(compile_err("<a{}>").message.contains("after '{'"));
        assert!(compile_err("<a{1:2:3}>").message.contains("':'"));
        assert!(compile_err("<a{:2}>").message.contains("before ':'"));
        assert!(compile_err("<a{2:}>").message.contains("after ':'"));
        assert!(compile_err("<a{x}>").message.contains("digit"));
        assert!(compile_err("<a{3:1}>").message.contains("invalid quantifier range"));
        assert!(compile_err("<a{0}>").message.contains("at least once"));
        assert!(compile_err("<a{0:2}>").message.contains("start at 1"));
    }

    #[test]
    fn test_quantifier_must_be_last() {
        let err = compile_err("<a{2}b>");
        assert!(err.message.contains("'>' was expected"));
    }

    #[test]
    fn test_unescaped_close_angle() {
        let err = compile_err("a>b");
        assert_eq!(err.offset, 1);
        assert!(err.message.contains("unescaped '>'"));
    }

    #[test]
    fn test_trailing_backslash() {
        let err = compile_err("abc\\");
        assert!(err.message.contains("incomplete escape"));
    }

    #[test]
    fn test_empty_expression() {
        assert!(compile_err("").message.contains("no elements"));
        assert!(compile_err("[i]").message.contains("no elements"));
    }
}
