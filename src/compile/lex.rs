use std::collections::BTreeSet;

use crate::types::span::Span;
use crate::types::syntax::{Delimiters, Pragma};
use crate::{Error, Result};

/// A lexer that tokenizes the template source into a flat list of text and
/// tag tokens so that the parser doesn't have to operate on raw text.
///
/// Text is emitted as one token per source line. Once a line is complete the
/// standalone rule is applied to it: if the line holds a single block-type
/// tag and nothing but whitespace, the whitespace tokens are dropped. This is
/// why the lexer collects into a list instead of yielding tokens lazily.
#[cfg_attr(internal_debug, derive(Debug))]
pub struct Lexer<'source> {
    /// The original template source.
    pub source: &'source str,

    /// A cursor over the template source.
    cursor: usize,

    /// The delimiters currently in effect.
    delims: Delimiters<'source>,

    /// Whether `{{$ name }}` block tags are recognized.
    blocks: bool,

    /// The tokens lexed so far.
    tokens: Vec<Token<'source>>,

    /// The index of the first token of the current line.
    line: usize,
}

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Raw template, never spanning more than one line
    Text,
    /// `{{ name }}`
    Escaped,
    /// `{{{ name }}}` or `{{& name }}`
    Unescaped,
    /// `{{# name }}`
    Section,
    /// `{{^ name }}`
    Inverted,
    /// `{{/ name }}`
    Close,
    /// `{{> name }}`
    Partial,
    /// `{{< name }}`
    Parent,
    /// `{{$ name }}`
    Block,
    /// `{{! comment }}`
    Comment,
    /// `{{% PRAGMA }}`
    Pragma,
    /// `{{=<% %>=}}`
    Delimiters,
}

/// The unit produced by the lexer.
#[derive(Debug, Clone)]
pub struct Token<'source> {
    pub kind: Kind,

    /// The span of the entire tag including delimiters, or of the text.
    pub span: Span,

    /// The trimmed tag content after the sigil, including any filters.
    pub content: &'source str,

    /// The part of the content before the first `|`.
    pub name: &'source str,

    /// The `|` separated parts of the content after the first one.
    pub filters: Vec<&'source str>,

    /// The delimiters in effect where the tag was opened.
    pub delims: Delimiters<'source>,

    /// The whitespace before a standalone partial or parent tag.
    pub indent: &'source str,

    /// Whether the tag was alone on its line and its line was removed.
    pub standalone: bool,
}

impl Kind {
    fn from_sigil(c: char) -> Option<Self> {
        let kind = match c {
            '#' => Self::Section,
            '^' => Self::Inverted,
            '/' => Self::Close,
            '>' => Self::Partial,
            '<' => Self::Parent,
            '$' => Self::Block,
            '!' => Self::Comment,
            '%' => Self::Pragma,
            '&' => Self::Unescaped,
            _ => return None,
        };
        Some(kind)
    }

    /// Whether a tag of this kind is removed along with its line when it
    /// stands alone.
    pub fn is_standalone(&self) -> bool {
        !matches!(self, Self::Text | Self::Escaped | Self::Unescaped)
    }
}

impl<'source> Lexer<'source> {
    /// Construct a new lexer.
    pub fn new(source: &'source str, pragmas: &BTreeSet<Pragma>) -> Self {
        Self {
            source,
            cursor: 0,
            delims: Delimiters::default(),
            blocks: pragmas.contains(&Pragma::Blocks),
            tokens: Vec::new(),
            line: 0,
        }
    }

    /// Lex the entire source.
    pub fn tokenize(mut self) -> Result<Vec<Token<'source>>> {
        while self.cursor < self.source.len() {
            match self.source[self.cursor..].find(self.delims.open) {
                Some(0) => self.lex_tag()?,
                Some(i) => self.lex_text(self.cursor + i),
                None => self.lex_text(self.source.len()),
            }
        }
        self.end_line();
        Ok(self.tokens)
    }

    /// Emits text tokens up to `end`, one per line.
    fn lex_text(&mut self, end: usize) {
        while self.cursor < end {
            let i = self.cursor;
            let j = match self.source[i..end].find('\n') {
                Some(k) => i + k + 1,
                None => end,
            };
            self.push(Kind::Text, i..j, "");
            self.cursor = j;
            if self.source[..j].ends_with('\n') {
                self.end_line();
            }
        }
    }

    /// Lexes a single tag starting at the cursor.
    fn lex_tag(&mut self) -> Result<()> {
        // A diagram of the indexes used below, for `{{# name }}`.
        //
        //   {{# name }}
        //   ^  ^      ^
        //   i  j      k
        //
        // `i` is the start of the open delimiter, `j` the start of the tag
        // content (after the sigil) and `k` one past the close delimiter.

        let Delimiters { open, close } = self.delims;
        let i = self.cursor;
        let after_open = i + open.len();

        let sigil = self.source[after_open..].chars().next();
        let (kind, j) = match sigil {
            Some('=') => return self.lex_delimiters(i),
            Some('{') => (Kind::Unescaped, after_open + 1),
            Some('$') if !self.blocks => (Kind::Escaped, after_open),
            Some(c) => match Kind::from_sigil(c) {
                Some(kind) => (kind, after_open + c.len_utf8()),
                None => (Kind::Escaped, after_open),
            },
            None => (Kind::Escaped, after_open),
        };

        let m = match self.source[j..].find(close) {
            Some(m) => j + m,
            None => return Err(self.err_unclosed(i)),
        };
        let mut k = m + close.len();
        let mut content = self.source[j..m].trim();

        if sigil == Some('{') {
            if close == "}}" {
                if !self.source[k..].starts_with('}') {
                    return Err(Error::syntax(
                        "expected `}}}` to close triple mustache",
                        self.source,
                        i..k,
                    ));
                }
                k += 1;
            } else {
                content = match content.strip_suffix('}') {
                    Some(c) => c.trim_end(),
                    None => {
                        return Err(Error::syntax(
                            "expected `}` to close triple mustache",
                            self.source,
                            i..k,
                        ));
                    }
                };
            }
        }

        if content.is_empty() && kind != Kind::Comment {
            return Err(Error::syntax("expected a tag name", self.source, i..k));
        }

        self.push(kind, i..k, content);
        self.cursor = k;
        Ok(())
    }

    /// Lexes a delimiter change tag, e.g. `{{=<% %>=}}`, and switches to the
    /// new delimiters.
    fn lex_delimiters(&mut self, i: usize) -> Result<()> {
        let Delimiters { open, close } = self.delims;
        let j = i + open.len() + 1;
        let end = format!("={close}");
        let m = match self.source[j..].find(&end) {
            Some(m) => j + m,
            None => return Err(self.err_unclosed(i)),
        };
        let k = m + end.len();

        let content = &self.source[j..m];
        let parts: Vec<_> = content.split_whitespace().collect();
        match parts[..] {
            [o, c] if !o.contains('=') && !c.contains('=') => {
                self.push(Kind::Delimiters, i..k, content.trim());
                self.delims = Delimiters { open: o, close: c };
                self.cursor = k;
                Ok(())
            }
            _ => Err(Error::syntax(
                "invalid delimiter change, expected two delimiters without `=`",
                self.source,
                i..k,
            )),
        }
    }

    fn push(&mut self, kind: Kind, span: impl Into<Span>, content: &'source str) {
        let (name, filters) = match kind {
            Kind::Text | Kind::Comment | Kind::Delimiters => (content, Vec::new()),
            _ => {
                let mut parts = content.split('|').map(str::trim);
                let name = parts.next().unwrap_or_default();
                (name, parts.filter(|f| !f.is_empty()).collect())
            }
        };
        if kind == Kind::Pragma
            && content.split_whitespace().next() == Some(Pragma::Blocks.as_str())
        {
            self.blocks = true;
        }
        self.tokens.push(Token {
            kind,
            span: span.into(),
            content,
            name,
            filters,
            delims: self.delims,
            indent: "",
            standalone: false,
        });
    }

    /// Applies the standalone rule to the tokens of the current line.
    fn end_line(&mut self) {
        let line = &self.tokens[self.line..];

        let mut tags = line.iter().enumerate().filter(|(_, t)| t.kind != Kind::Text);
        let standalone = match (tags.next(), tags.next()) {
            (Some((idx, tag)), None) if tag.kind.is_standalone() => line
                .iter()
                .filter(|t| t.kind == Kind::Text)
                .all(|t| is_whitespace(&self.source[t.span]))
                .then_some((idx, tag.span.m)),
            _ => None,
        };

        if let Some((idx, m)) = standalone {
            let start = line[0].span.m;
            let mut tag = self.tokens[self.line + idx].clone();
            tag.standalone = true;
            if matches!(tag.kind, Kind::Partial | Kind::Parent) {
                tag.indent = &self.source[start..m];
            }
            self.tokens.truncate(self.line);
            self.tokens.push(tag);
        }

        self.line = self.tokens.len();
    }

    fn err_unclosed(&self, i: usize) -> Error {
        Error::syntax("unclosed tag", self.source, i..i + self.delims.open.len())
    }
}

fn is_whitespace(s: &str) -> bool {
    s.chars().all(|c| matches!(c, ' ' | '\t' | '\r' | '\n'))
}
