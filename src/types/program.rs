//! Defines a compiled [`Program`], the executable form of a template.
//!
//! A program is an entry sequence of [`Instr`] plus two tables of
//! sub-routines, one for sections and one for inheritance block overrides.
//! Both tables are keyed by a content hash so that structurally identical
//! sub-templates are compiled once and shared by every call site.

use std::fmt;

use indexmap::IndexMap;
use sha2::{Digest, Sha256};

use crate::fmt::EntityFlags;
use crate::types::span::Span;

/// A placeholder for a jump index that is updated once the target is known.
pub(crate) const FIXME: usize = !0;

/// A content hash, used both as the identity of a compiled template and as
/// the de-duplication key of its sub-routines.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key([u8; 32]);

impl Key {
    /// Hashes the concatenation of the given parts.
    pub(crate) fn digest<'a>(parts: impl IntoIterator<Item = &'a str>) -> Self {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part.as_bytes());
        }
        Self(hasher.finalize().into())
    }

    /// Returns the key as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", &self.to_hex()[..12])
    }
}

/// A compiled template.
///
/// Programs are immutable once compiled and are shared between renders using
/// an [`Arc`][std::sync::Arc].
pub struct Program {
    pub(crate) key: Key,
    pub(crate) source: String,
    pub(crate) escape: Escape,
    pub(crate) strict_callables: bool,
    pub(crate) instrs: Vec<Instr>,
    pub(crate) sections: IndexMap<Key, Section>,
    pub(crate) blocks: IndexMap<Key, Block>,
}

/// How escaped variables are escaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Escape {
    /// HTML entity escaping with the given quote handling.
    Html(EntityFlags),
    /// The engine's custom escape function.
    Custom,
}

/// A section sub-routine.
#[cfg_attr(internal_debug, derive(Debug))]
pub(crate) struct Section {
    /// The raw section body, passed to lambdas.
    pub body: Span,
    /// The delimiter change tag in effect at the section, if not the default.
    pub delims: Option<String>,
    /// The open delimiter in effect at the section.
    pub open: String,
    pub instrs: Vec<Instr>,
}

/// An inheritance block override sub-routine.
#[cfg_attr(internal_debug, derive(Debug))]
pub(crate) struct Block {
    pub instrs: Vec<Instr>,
}

/// How to find a name in the context stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lookup {
    /// `.`, the top frame itself.
    Last,
    /// `name`, searched top down through every frame.
    Find,
    /// `a.b.c`, the first segment searched top down and the rest within it.
    Dot,
    /// `.a.b`, resolved within the top frame only.
    AnchoredDot,
}

/// A name to look up along with how to look it up.
#[derive(Debug, Clone)]
pub(crate) struct Var {
    pub lookup: Lookup,
    pub name: String,
    /// The span of the tag, used for error reporting.
    pub span: Span,
}

#[cfg_attr(internal_debug, derive(Debug))]
pub(crate) enum Instr {
    /// Emit raw template
    EmitRaw(Span),

    /// Lookup a variable and start building an expression
    Lookup(Var),

    /// Replace the current expression with its result if it is a lambda
    Resolve(Span),

    /// Apply the filter with the given name to the current expression
    Apply(Var),

    /// Emit the current expression, optionally escaped
    Emit { escape: bool, span: Span },

    /// Render a section sub-routine with the current expression
    Section(Key),

    /// Jump to the instruction if the current expression is not empty
    JumpIfNotEmpty(usize),

    /// Render a partial
    Partial { name: String, indent: String },

    /// Render a parent template with the given block overrides
    Parent {
        name: String,
        indent: String,
        args: Vec<(String, Key)>,
    },

    /// Render the block override if one exists and jump to the instruction,
    /// otherwise fall through to the default block body
    BlockVar { name: String, jump: usize },
}

impl Program {
    /// Returns the identity key of this program.
    pub fn key(&self) -> Key {
        self.key
    }

    /// Returns the template source this program was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the number of distinct section sub-routines.
    pub fn sections(&self) -> usize {
        self.sections.len()
    }

    /// Returns the number of distinct block override sub-routines.
    pub fn blocks(&self) -> usize {
        self.blocks.len()
    }
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("key", &self.key)
            .field("sections", &self.sections.len())
            .field("blocks", &self.blocks.len())
            .finish_non_exhaustive()
    }
}
