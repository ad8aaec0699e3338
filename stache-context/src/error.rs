//! Errors raised while parsing a tag identifier or resolving it.
//!
//! A name that is not found anywhere is not an error; see [`Value::absent`](crate::Value::absent).

use core::fmt;
use core::ops::Range;

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use crate::record::CallError;

/// A malformed tag identifier or argument list.
///
/// Raised before any lookup happens, so no callable has run when this is returned.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
#[error("{kind}")]
#[diagnostic(code(stache::syntax), help("{}", kind.help()))]
pub struct ParseError {
    /// What went wrong.
    pub kind: ParseErrorKind,
    /// Where it went wrong, in bytes into `src`.
    #[label("here")]
    pub span: SourceSpan,
    /// The text being parsed.
    #[source_code]
    pub src: String,
}

impl ParseError {
    pub(crate) fn new(kind: ParseErrorKind, span: Range<usize>, src: &str) -> Self {
        Self {
            kind,
            span: span.into(),
            src: src.to_owned(),
        }
    }

    /// Re-anchor an error found in a substring so it points into `src`.
    pub(crate) fn shifted(self, offset: usize, src: &str) -> Self {
        Self {
            kind: self.kind,
            span: (self.span.offset() + offset, self.span.len()).into(),
            src: src.to_owned(),
        }
    }

    /// The offending byte range within [`ParseError::src`].
    pub fn range(&self) -> Range<usize> {
        self.span.offset()..self.span.offset() + self.span.len()
    }
}

/// Classification of [`ParseError`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseErrorKind {
    /// Nothing but whitespace.
    EmptyPath,
    /// Two dots in a row, or a dot at the end.
    EmptySegment,
    /// `.` combined with other segments.
    MisplacedDot,
    /// A character that cannot appear here.
    UnexpectedChar(char),
    /// A quoted string without its closing quote.
    UnterminatedString,
    /// A `(` without its `)`.
    UnclosedParen,
    /// A `)` without its `(`.
    UnmatchedParen,
    /// Something other than `,` after a complete argument.
    ExpectedSeparator,
    /// A number literal that does not fit.
    InvalidNumber,
    /// Arguments nested deeper than the parser accepts.
    TooDeep,
}

impl ParseErrorKind {
    fn help(&self) -> &'static str {
        match self {
            ParseErrorKind::EmptyPath => "a tag needs a name, or `.` for the current context",
            ParseErrorKind::EmptySegment => "every `.` must be followed by a name",
            ParseErrorKind::MisplacedDot => "`.` alone means the current context; it cannot be combined with names",
            ParseErrorKind::UnexpectedChar(_) => "names are made of letters, digits, `_` and `-`",
            ParseErrorKind::UnterminatedString => "close the string with the quote it was opened with",
            ParseErrorKind::UnclosedParen => "add `)` to close the argument list",
            ParseErrorKind::UnmatchedParen => "remove the `)` or add the `(` it belongs to",
            ParseErrorKind::ExpectedSeparator => "separate arguments with `,`",
            ParseErrorKind::InvalidNumber => "integers must fit in 64 bits",
            ParseErrorKind::TooDeep => "flatten the nested calls",
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::EmptyPath => write!(f, "empty path"),
            ParseErrorKind::EmptySegment => write!(f, "empty path segment"),
            ParseErrorKind::MisplacedDot => write!(f, "`.` must be the whole path"),
            ParseErrorKind::UnexpectedChar(c) => write!(f, "unexpected character {c:?}"),
            ParseErrorKind::UnterminatedString => write!(f, "unterminated string literal"),
            ParseErrorKind::UnclosedParen => write!(f, "unclosed `(`"),
            ParseErrorKind::UnmatchedParen => write!(f, "unmatched `)`"),
            ParseErrorKind::ExpectedSeparator => write!(f, "expected `,` between arguments"),
            ParseErrorKind::InvalidNumber => write!(f, "invalid number literal"),
            ParseErrorKind::TooDeep => write!(f, "arguments nested too deeply"),
        }
    }
}

/// Anything that stops a lookup from producing a value.
#[derive(Error, Debug, Diagnostic)]
pub enum ResolveError {
    /// The tag identifier did not parse.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    /// Resolutions and callable invocations nested deeper than the configured limit.
    #[error("resolution nested deeper than {limit} levels")]
    #[diagnostic(
        code(stache::depth),
        help("a callable is probably resolving itself; raise `ResolveOptions::max_depth` if the nesting is intended")
    )]
    DepthExceeded {
        /// The configured `max_depth`.
        limit: usize,
    },

    /// A callable member returned an error.
    #[error("callable `{member}` failed")]
    #[diagnostic(code(stache::call))]
    Call {
        /// Name the callable was looked up by.
        member: String,
        /// What the callable returned.
        #[source]
        source: CallError,
    },
}

impl ResolveError {
    /// Wrap an error returned by a callable. A resolve error raised by a nested
    /// lookup inside the callable is passed through as is.
    pub(crate) fn from_call(member: &str, source: CallError) -> Self {
        match source.downcast::<ResolveError>() {
            Ok(inner) => *inner,
            Err(source) => ResolveError::Call {
                member: member.to_owned(),
                source,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shifted_points_into_the_outer_text() {
        let inner = ParseError::new(ParseErrorKind::UnclosedParen, 2..3, "b(c");
        let outer = inner.shifted(4, "a.f(b(c)");
        assert_eq!(outer.range(), 6..7);
        assert_eq!(outer.src, "a.f(b(c)");
    }

    #[test]
    fn nested_resolve_errors_are_not_wrapped() {
        let nested: CallError = Box::new(ResolveError::DepthExceeded { limit: 3 });
        assert!(matches!(
            ResolveError::from_call("f", nested),
            ResolveError::DepthExceeded { limit: 3 }
        ));

        let foreign: CallError = "boom".into();
        let err = ResolveError::from_call("f", foreign);
        assert_eq!(err.to_string(), "callable `f` failed");
        assert_eq!(
            core::error::Error::source(&err).map(ToString::to_string),
            Some("boom".to_owned())
        );
    }
}
