//! Splitting a raw argument list into individual arguments.
//!
//! The splitter only finds argument boundaries; it does not interpret them. Each
//! argument comes back exactly as written (quotes, nested parentheses and all) so
//! it can be parsed and resolved later.
//!
//! An argument starts with one of five tokens:
//!
//! | start                    | kind                    | ends at                         |
//! |--------------------------|-------------------------|---------------------------------|
//! | `array(`                 | [`ArgKind::Array`]      | the balancing `)`               |
//! | letter, `_` or `.`       | [`ArgKind::Reference`]  | a `,` outside parentheses       |
//! | `"` or `'`               | [`ArgKind::String`]     | the closing quote               |
//! | digits with `.` or `e`   | [`ArgKind::Decimal`]    | the last digit                  |
//! | digits                   | [`ArgKind::Integer`]    | the last digit                  |
//!
//! Commas inside parentheses or quotes never split an argument:
//!
//! ```
//! use stache_context::params::split;
//!
//! assert_eq!(split("a(1,2),b")?, ["a(1,2)", "b"]);
//! assert_eq!(split("")?, [] as [&str; 0]);
//! # Ok::<(), stache_context::ParseError>(())
//! ```

use core::ops::Range;

use crate::error::{ParseError, ParseErrorKind};

/// What an argument starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// `array( ... )` list literal.
    Array,
    /// A name or dotted path, possibly with call arguments.
    Reference,
    /// A single- or double-quoted string literal.
    String,
    /// A number with a fraction or an exponent.
    Decimal,
    /// A number without fraction or exponent.
    Integer,
}

/// One argument found by the [`Splitter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawArg {
    /// How the argument starts.
    pub kind: ArgKind,
    /// Byte range of the argument in the input, without separators or
    /// surrounding whitespace.
    pub span: Range<usize>,
}

/// Split a comma-separated argument list into its arguments, as written.
///
/// Whitespace around arguments and stray commas (`a,,b`, `a,`) are dropped.
/// Unclosed parentheses and unterminated strings are errors.
pub fn split(input: &str) -> Result<Vec<&str>, ParseError> {
    Splitter::new(input)
        .map(|arg| arg.map(|arg| &input[arg.span]))
        .collect()
}

/// Iterator over the arguments of an argument list.
///
/// Yields at most one error, then stops.
pub struct Splitter<'a> {
    input: &'a str,
    pos: usize,
    done: bool,
}

impl<'a> Splitter<'a> {
    /// Start splitting `input`.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            done: false,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn error(&self, kind: ParseErrorKind, span: Range<usize>) -> ParseError {
        ParseError::new(kind, span, self.input)
    }

    fn skip_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn next_arg(&mut self) -> Result<Option<RawArg>, ParseError> {
        self.skip_while(|c| c.is_whitespace() || c == ',');
        let start = self.pos;
        let Some(c) = self.peek() else {
            return Ok(None);
        };

        let kind = if c == '"' || c == '\'' {
            self.pos = scan_string(self.input, start)?;
            ArgKind::String
        } else if starts_number(&self.input[start..]) {
            let (end, kind) = scan_number(self.input, start);
            self.pos = end;
            kind
        } else if let Some(open) = array_open(self.input, start) {
            self.pos = scan_group(self.input, open)? + 1;
            ArgKind::Array
        } else if is_reference_start(c) {
            let end = scan_reference(self.input, start)?;
            self.pos = end;
            let trimmed = start + self.input[start..end].trim_end().len();
            return Ok(Some(RawArg {
                kind: ArgKind::Reference,
                span: start..trimmed,
            }));
        } else if c == ')' {
            return Err(self.error(ParseErrorKind::UnmatchedParen, start..start + 1));
        } else {
            return Err(self.error(
                ParseErrorKind::UnexpectedChar(c),
                start..start + c.len_utf8(),
            ));
        };

        let end = self.pos;
        self.skip_while(char::is_whitespace);
        match self.peek() {
            None | Some(',') => Ok(Some(RawArg {
                kind,
                span: start..end,
            })),
            Some(c) => Err(self.error(
                ParseErrorKind::ExpectedSeparator,
                self.pos..self.pos + c.len_utf8(),
            )),
        }
    }
}

impl Iterator for Splitter<'_> {
    type Item = Result<RawArg, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_arg() {
            Ok(Some(arg)) => Some(Ok(arg)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Characters a name may be made of.
pub(crate) fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

fn is_reference_start(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

fn starts_number(rest: &str) -> bool {
    let mut chars = rest.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('-' | '+') => match chars.next() {
            Some(c) if c.is_ascii_digit() => true,
            Some('.') => chars.next().is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        },
        Some('.') => chars.next().is_some_and(|c| c.is_ascii_digit()),
        _ => false,
    }
}

fn scan_digits(bytes: &[u8], mut pos: usize) -> usize {
    while bytes.get(pos).is_some_and(u8::is_ascii_digit) {
        pos += 1;
    }
    pos
}

/// Scan a number literal starting at `start`. Only called when
/// [`starts_number`] said yes.
fn scan_number(src: &str, start: usize) -> (usize, ArgKind) {
    let bytes = src.as_bytes();
    let mut pos = start;
    let mut kind = ArgKind::Integer;
    if matches!(bytes.get(pos), Some(b'-' | b'+')) {
        pos += 1;
    }
    pos = scan_digits(bytes, pos);
    if bytes.get(pos) == Some(&b'.') {
        kind = ArgKind::Decimal;
        pos = scan_digits(bytes, pos + 1);
    }
    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        let mut exp = pos + 1;
        if matches!(bytes.get(exp), Some(b'-' | b'+')) {
            exp += 1;
        }
        if bytes.get(exp).is_some_and(u8::is_ascii_digit) {
            kind = ArgKind::Decimal;
            pos = scan_digits(bytes, exp);
        }
    }
    (pos, kind)
}

/// Scan a quoted string whose opening quote is at `start`. Returns the position
/// just past the closing quote. A backslash escapes the next character.
pub(crate) fn scan_string(src: &str, start: usize) -> Result<usize, ParseError> {
    let mut chars = src[start..].char_indices();
    let Some((_, quote)) = chars.next() else {
        return Err(ParseError::new(
            ParseErrorKind::UnterminatedString,
            start..start,
            src,
        ));
    };
    while let Some((i, c)) = chars.next() {
        if c == '\\' {
            chars.next();
        } else if c == quote {
            return Ok(start + i + 1);
        }
    }
    Err(ParseError::new(
        ParseErrorKind::UnterminatedString,
        start..src.len(),
        src,
    ))
}

/// Given the position of a `(`, find its balancing `)`. Quoted strings inside
/// are skipped whole.
pub(crate) fn scan_group(src: &str, open: usize) -> Result<usize, ParseError> {
    let mut depth = 0usize;
    let mut pos = open;
    while let Some(c) = src[pos..].chars().next() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(pos);
                }
            }
            '"' | '\'' => {
                pos = scan_string(src, pos)?;
                continue;
            }
            _ => {}
        }
        pos += c.len_utf8();
    }
    Err(ParseError::new(
        ParseErrorKind::UnclosedParen,
        open..open + 1,
        src,
    ))
}

/// Scan a reference argument: up to the first `,` outside parentheses, or the
/// end of input.
fn scan_reference(src: &str, start: usize) -> Result<usize, ParseError> {
    let mut pos = start;
    while let Some(c) = src[pos..].chars().next() {
        match c {
            ',' => break,
            '(' => {
                pos = scan_group(src, pos)? + 1;
                continue;
            }
            ')' => {
                return Err(ParseError::new(
                    ParseErrorKind::UnmatchedParen,
                    pos..pos + 1,
                    src,
                ));
            }
            '"' | '\'' => {
                pos = scan_string(src, pos)?;
                continue;
            }
            _ => {}
        }
        pos += c.len_utf8();
    }
    Ok(pos)
}

/// If an `array(` list literal starts at `start`, the position of its `(`.
pub(crate) fn array_open(src: &str, start: usize) -> Option<usize> {
    let rest = src[start..].strip_prefix("array")?;
    let after = rest.trim_start();
    if !after.starts_with('(') {
        return None;
    }
    Some(src.len() - after.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<ArgKind> {
        Splitter::new(input)
            .map(|arg| arg.map(|arg| arg.kind))
            .collect::<Result<_, _>>()
            .unwrap()
    }

    fn error(input: &str) -> (ParseErrorKind, Range<usize>) {
        let err = split(input).unwrap_err();
        (err.kind, err.range())
    }

    #[test]
    fn splits_plain_lists() {
        assert_eq!(split("1,2,3").unwrap(), ["1", "2", "3"]);
        assert_eq!(split("a, b ,c").unwrap(), ["a", "b", "c"]);
        assert!(split("").unwrap().is_empty());
        assert!(split("   ").unwrap().is_empty());
    }

    #[test]
    fn nested_commas_do_not_split() {
        assert_eq!(split("a(1,2),b").unwrap(), ["a(1,2)", "b"]);
        assert_eq!(split("a(b(1, 2), c).d, e").unwrap(), ["a(b(1, 2), c).d", "e"]);
    }

    #[test]
    fn literals_are_kept_verbatim() {
        insta::assert_debug_snapshot!(split(r#"a(1,2), "x,y", array(1, (2)), 3.5"#).unwrap(), @r#"
        [
            "a(1,2)",
            "\"x,y\"",
            "array(1, (2))",
            "3.5",
        ]
        "#);
        assert_eq!(split(r#"'it\'s', "a)b""#).unwrap(), [r#"'it\'s'"#, r#""a)b""#]);
        assert_eq!(split(r#"f(")")"#).unwrap(), [r#"f(")")"#]);
    }

    #[test]
    fn classifies_argument_starts() {
        use ArgKind::*;
        assert_eq!(
            kinds(r#"array(1), name, "s", 1.5, 42, -3, 1e9, .5, ."#),
            [Array, Reference, String, Decimal, Integer, Integer, Decimal, Decimal, Reference]
        );
        assert_eq!(kinds("arrayish, array (1)"), [Reference, Array]);
    }

    #[test]
    fn stray_commas_are_skipped() {
        assert_eq!(split("a,,b,").unwrap(), ["a", "b"]);
        assert_eq!(split(",").unwrap(), [] as [&str; 0]);
    }

    #[test]
    fn malformed_lists_fail() {
        assert_eq!(error("a(1,2"), (ParseErrorKind::UnclosedParen, 1..2));
        assert_eq!(error("a)"), (ParseErrorKind::UnmatchedParen, 1..2));
        assert_eq!(error(")"), (ParseErrorKind::UnmatchedParen, 0..1));
        assert_eq!(error(r#""abc"#), (ParseErrorKind::UnterminatedString, 0..4));
        assert_eq!(error("array(1"), (ParseErrorKind::UnclosedParen, 5..6));
        assert_eq!(error("1 2"), (ParseErrorKind::ExpectedSeparator, 2..3));
        assert_eq!(error(r#""a" b"#), (ParseErrorKind::ExpectedSeparator, 4..5));
        assert_eq!(error("a, !"), (ParseErrorKind::UnexpectedChar('!'), 3..4));
    }

    #[test]
    fn stops_after_the_first_error() {
        let mut splitter = Splitter::new("a, )");
        assert!(matches!(splitter.next(), Some(Ok(_))));
        assert!(matches!(splitter.next(), Some(Err(_))));
        assert!(splitter.next().is_none());
    }
}
