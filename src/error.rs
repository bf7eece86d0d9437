use std::cmp::max;
use std::fmt;

use crate::types::span::Span;

/// An error that can occur during template compilation or rendering.
#[derive(Clone)]
pub struct Error {
    kind: ErrorKind,
    msg: String,
    name: Option<String>,
    span: Option<(String, Span)>,
}

/// The category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The template source is malformed.
    Syntax,
    /// A filter name did not resolve to a callable value.
    UnknownFilter,
    /// A template could not be found by the loader.
    UnknownTemplate,
    /// A helper was requested by name but is not registered.
    UnknownHelper,
    /// The engine configuration is invalid.
    Config,
    /// Rendering failed for any other reason.
    Render,
    /// The render context could not be converted to a value.
    Serialize,
}

impl Error {
    fn new(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            msg: msg.into(),
            name: None,
            span: None,
        }
    }

    fn with_span(kind: ErrorKind, msg: impl Into<String>, source: &str, span: Span) -> Self {
        Self {
            kind,
            msg: msg.into(),
            name: None,
            span: (!source.is_empty()).then(|| (source.to_owned(), span)),
        }
    }

    pub(crate) fn syntax(msg: impl Into<String>, source: &str, span: impl Into<Span>) -> Self {
        Self::with_span(ErrorKind::Syntax, msg, source, span.into())
    }

    pub(crate) fn unknown_filter(name: &str, source: &str, span: Span) -> Self {
        Self::with_span(
            ErrorKind::UnknownFilter,
            format!("unknown filter `{name}`"),
            source,
            span,
        )
    }

    pub(crate) fn unknown_template(name: &str) -> Self {
        let mut err = Self::new(ErrorKind::UnknownTemplate, "unknown template");
        err.name = Some(name.to_owned());
        err
    }

    pub(crate) fn unknown_helper(name: &str) -> Self {
        Self::new(ErrorKind::UnknownHelper, format!("unknown helper `{name}`"))
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, msg)
    }

    pub(crate) fn render(msg: impl Into<String>, source: &str, span: Span) -> Self {
        Self::with_span(ErrorKind::Render, msg, source, span)
    }

    pub(crate) fn max_partial_depth(max: usize) -> Self {
        Self::new(
            ErrorKind::Render,
            format!("reached maximum partial depth ({max})"),
        )
    }

    /// Attaches a span to an error that was raised without one, e.g. by a
    /// lambda.
    pub(crate) fn enrich(mut self, source: &str, span: Span) -> Self {
        if self.span.is_none() && !source.is_empty() {
            self.span = Some((source.to_owned(), span));
        }
        self
    }

    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message without any source context.
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// Returns the template name, for errors about a named template.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Self::new(ErrorKind::Render, msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Self::new(ErrorKind::Render, msg)
    }
}

#[cfg(feature = "serde")]
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::new(ErrorKind::Serialize, err.to_string())
    }
}

impl std::error::Error for Error {}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.span {
            Some((source, span)) => fmt_pretty(&self.msg, source, *span, f),
            None => fmt::Display::fmt(self, f),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.span, &self.name) {
            (Some((source, span)), _) => {
                if f.alternate() {
                    fmt_pretty(&self.msg, source, *span, f)
                } else {
                    write!(f, "{} between bytes {} and {}", self.msg, span.m, span.n)
                }
            }
            (None, Some(name)) => write!(f, "{} `{}`", self.msg, name),
            (None, None) => write!(f, "{}", self.msg),
        }
    }
}

fn fmt_pretty(msg: &str, source: &str, span: Span, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let lines: Vec<_> = source.split_terminator('\n').collect();
    let (line, col) = to_line_col(&lines, span.m);
    let width = max(1, width(&source[span]));
    let code = lines
        .get(line)
        .or_else(|| lines.last())
        .copied()
        .unwrap_or_default();

    let num = (line + 1).to_string();
    let pad = width_of(&num);
    let pipe = "|";
    let underline = "^".repeat(width);

    write!(
        f,
        "\n \
        {0:pad$} {pipe}\n \
        {num:>} {pipe} {code}\n \
        {0:pad$} {pipe} {underline:>width$} {msg}\n",
        "",
        pad = pad,
        pipe = pipe,
        num = num,
        code = code,
        underline = underline,
        width = col + width,
        msg = msg
    )
}

fn to_line_col(lines: &[&str], offset: usize) -> (usize, usize) {
    let mut n = 0;
    for (i, line) in lines.iter().enumerate() {
        let len = line.len() + 1;
        if n + len > offset {
            return (i, width(&line[..offset - n]));
        }
        n += len;
    }
    (lines.len(), lines.last().map(|l| width(l)).unwrap_or(0))
}

fn width_of(s: &str) -> usize {
    s.len()
}

#[cfg(feature = "unicode")]
fn width(s: &str) -> usize {
    unicode_width::UnicodeWidthStr::width(s)
}

#[cfg(not(feature = "unicode"))]
fn width(s: &str) -> usize {
    s.chars().count()
}
