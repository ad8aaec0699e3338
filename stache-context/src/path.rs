//! Tag identifiers parsed into paths.
//!
//! ```text
//! path     := "." | segment ("." segment)*
//! segment  := identifier ["(" [arglist] ")"]
//! arglist  := arg ("," arg)*
//! arg      := path | literal | "array(" [arglist] ")"
//! literal  := string-literal | number-literal
//! ```
//!
//! Parsing happens once per tag, before any lookup, so a malformed identifier
//! fails without touching the context.

use core::fmt;
use core::ops::Range;
use core::str::FromStr;

use tracing::{debug, trace};

use crate::error::{ParseError, ParseErrorKind};
use crate::params::{self, ArgKind};
use crate::value::Value;

/// How deeply call arguments may nest inside one tag.
const MAX_NESTING: usize = 32;

/// A parsed tag identifier.
#[derive(Debug, Clone, PartialEq)]
pub enum Path {
    /// The reserved `.` path: the innermost frame itself.
    Current,
    /// One or more dot-separated segments. Always non-empty when produced by
    /// [`Path::parse`].
    Segments(Vec<Segment>),
}

/// One dot-separated component of a path.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Member name looked up for this segment.
    pub name: String,
    /// Call arguments, when the segment was written with parentheses.
    pub args: Option<Vec<Arg>>,
}

/// A call argument.
///
/// Paths are kept unevaluated and resolved against the whole stack every time
/// the tag is resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// A string or number written in the tag.
    Literal(Value),
    /// A name or dotted path.
    Path(Path),
    /// An `array(...)` list literal.
    List(Vec<Arg>),
}

impl Path {
    /// Parse a tag identifier. Surrounding whitespace is ignored.
    pub fn parse(src: &str) -> Result<Path, ParseError> {
        let mut parser = Parser { src, nesting: 0 };
        match parser.path(0..src.len()) {
            Ok(path) => {
                trace!(tag = src, %path, "parsed path");
                Ok(path)
            }
            Err(err) => {
                debug!(tag = src, error = %err, "malformed path");
                Err(err)
            }
        }
    }

    /// A single segment without arguments.
    pub fn name(name: impl Into<String>) -> Path {
        Path::Segments(vec![Segment::new(name)])
    }

    /// The segments, empty for [`Path::Current`].
    pub fn segments(&self) -> &[Segment] {
        match self {
            Path::Current => &[],
            Path::Segments(segments) => segments,
        }
    }

    /// Whether this is the reserved `.` path.
    pub fn is_current(&self) -> bool {
        matches!(self, Path::Current)
    }

    /// Whether this path is a bare name: one segment, no parentheses.
    pub fn is_simple(&self) -> bool {
        matches!(self.segments(), [segment] if segment.args.is_none())
    }
}

impl Segment {
    /// A segment without arguments.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: None,
        }
    }

    /// A segment written with parentheses.
    pub fn call(name: impl Into<String>, args: Vec<Arg>) -> Self {
        Self {
            name: name.into(),
            args: Some(args),
        }
    }

    /// The call arguments, empty when there are none.
    pub fn args(&self) -> &[Arg] {
        self.args.as_deref().unwrap_or_default()
    }
}

impl FromStr for Path {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Path::Current => f.write_str("."),
            Path::Segments(segments) => {
                for (i, segment) in segments.iter().enumerate() {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    write!(f, "{segment}")?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(args) = &self.args {
            write_args(f, args)?;
        }
        Ok(())
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Literal(Value::String(s)) => write!(f, "{s:?}"),
            Arg::Literal(Value::Float(x)) => write!(f, "{x:?}"),
            Arg::Literal(value) => f.write_str(&value.render_to_string()),
            Arg::Path(path) => write!(f, "{path}"),
            Arg::List(items) => {
                f.write_str("array")?;
                write_args(f, items)
            }
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[Arg]) -> fmt::Result {
    f.write_str("(")?;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{arg}")?;
    }
    f.write_str(")")
}

struct Parser<'a> {
    src: &'a str,
    nesting: usize,
}

impl Parser<'_> {
    fn err(&self, kind: ParseErrorKind, span: Range<usize>) -> ParseError {
        ParseError::new(kind, span, self.src)
    }

    fn char_at(&self, pos: usize, end: usize) -> Option<char> {
        if pos >= end {
            return None;
        }
        self.src[pos..].chars().next()
    }

    fn ident_end(&self, mut pos: usize, end: usize) -> usize {
        while let Some(c) = self.char_at(pos, end) {
            if !params::is_ident_char(c) {
                break;
            }
            pos += c.len_utf8();
        }
        pos
    }

    fn unexpected(&self, c: Option<char>, pos: usize) -> ParseError {
        match c {
            None => self.err(ParseErrorKind::EmptySegment, pos..pos),
            Some('.') => self.err(ParseErrorKind::EmptySegment, pos..pos + 1),
            Some(')') => self.err(ParseErrorKind::UnmatchedParen, pos..pos + 1),
            Some(c) => self.err(ParseErrorKind::UnexpectedChar(c), pos..pos + c.len_utf8()),
        }
    }

    fn path(&mut self, range: Range<usize>) -> Result<Path, ParseError> {
        let text = &self.src[range.clone()];
        let start = range.start + (text.len() - text.trim_start().len());
        let end = range.start + text.trim_end().len();
        if start >= end {
            return Err(self.err(ParseErrorKind::EmptyPath, range));
        }
        if &self.src[start..end] == "." {
            return Ok(Path::Current);
        }

        let mut segments = Vec::new();
        let mut pos = start;
        loop {
            let name_end = self.ident_end(pos, end);
            if name_end == pos {
                let c = self.char_at(pos, end);
                if c == Some('.') && segments.is_empty() {
                    return Err(self.err(ParseErrorKind::MisplacedDot, pos..pos + 1));
                }
                return Err(self.unexpected(c, pos));
            }
            let name = self.src[pos..name_end].to_owned();
            pos = name_end;

            let mut args = None;
            if self.char_at(pos, end) == Some('(') {
                let close = params::scan_group(self.src, pos)?;
                if close >= end {
                    return Err(self.err(ParseErrorKind::UnclosedParen, pos..pos + 1));
                }
                args = Some(self.args(pos + 1..close)?);
                pos = close + 1;
            }
            segments.push(Segment { name, args });

            match self.char_at(pos, end) {
                None => break,
                Some('.') => pos += 1,
                c => return Err(self.unexpected(c, pos)),
            }
        }
        Ok(Path::Segments(segments))
    }

    fn args(&mut self, range: Range<usize>) -> Result<Vec<Arg>, ParseError> {
        self.nesting += 1;
        if self.nesting > MAX_NESTING {
            return Err(self.err(ParseErrorKind::TooDeep, range.start - 1..range.start));
        }
        let mut args = Vec::new();
        for raw in params::Splitter::new(&self.src[range.clone()]) {
            let raw = raw.map_err(|err| err.shifted(range.start, self.src))?;
            let span = raw.span.start + range.start..raw.span.end + range.start;
            args.push(self.arg(raw.kind, span)?);
        }
        self.nesting -= 1;
        Ok(args)
    }

    fn arg(&mut self, kind: ArgKind, span: Range<usize>) -> Result<Arg, ParseError> {
        let text = &self.src[span.clone()];
        match kind {
            ArgKind::String => Ok(Arg::Literal(Value::String(unescape(
                &text[1..text.len() - 1],
            )))),
            ArgKind::Integer => text
                .parse::<i64>()
                .map(|i| Arg::Literal(Value::Int(i)))
                .map_err(|_| self.err(ParseErrorKind::InvalidNumber, span)),
            ArgKind::Decimal => text
                .parse::<f64>()
                .map(|x| Arg::Literal(Value::Float(x)))
                .map_err(|_| self.err(ParseErrorKind::InvalidNumber, span)),
            ArgKind::Array => {
                let open = params::array_open(self.src, span.start)
                    .ok_or_else(|| self.err(ParseErrorKind::UnexpectedChar('a'), span.clone()))?;
                Ok(Arg::List(self.args(open + 1..span.end - 1)?))
            }
            ArgKind::Reference => Ok(Arg::Path(self.path(span)?)),
        }
    }
}

/// Decode backslash escapes in the body of a string literal.
fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
