//! The parse tree of a template.

use crate::types::span::Span;
use crate::types::syntax::{Delimiters, Pragma};

#[cfg_attr(internal_debug, derive(Debug))]
pub struct Template<'source> {
    pub nodes: Vec<Node<'source>>,
}

#[cfg_attr(internal_debug, derive(Debug))]
pub enum Node<'source> {
    Text(Span),
    Var(Var<'source>),
    Section(Section<'source>),
    Partial(Partial<'source>),
    Parent(Parent<'source>),
    BlockArg(Block<'source>),
    BlockVar(Block<'source>),
    Pragma(Pragma),
}

/// A tag name with any filters applied to it, e.g. `user.name | upper`.
#[cfg_attr(internal_debug, derive(Debug))]
pub struct Name<'source> {
    pub path: &'source str,
    pub filters: Vec<&'source str>,
    pub span: Span,
}

#[cfg_attr(internal_debug, derive(Debug))]
pub struct Var<'source> {
    pub name: Name<'source>,
    pub escape: bool,
}

#[cfg_attr(internal_debug, derive(Debug))]
pub struct Section<'source> {
    pub name: Name<'source>,
    pub inverted: bool,
    /// The raw section body between the open and close tags.
    pub body: Span,
    pub delims: Delimiters<'source>,
    /// Whether the open and close tags stand alone on their lines.
    pub standalone: (bool, bool),
    pub nodes: Vec<Node<'source>>,
}

#[cfg_attr(internal_debug, derive(Debug))]
pub struct Partial<'source> {
    pub name: &'source str,
    pub indent: &'source str,
}

#[cfg_attr(internal_debug, derive(Debug))]
pub struct Parent<'source> {
    pub name: &'source str,
    pub indent: &'source str,
    pub nodes: Vec<Node<'source>>,
}

#[cfg_attr(internal_debug, derive(Debug))]
pub struct Block<'source> {
    pub name: &'source str,
    pub body: Span,
    pub delims: Delimiters<'source>,
    pub standalone: (bool, bool),
    pub nodes: Vec<Node<'source>>,
}
