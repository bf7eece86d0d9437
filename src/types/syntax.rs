use std::fmt;
use std::str::FromStr;

use crate::Error;

/// The tag delimiters in effect at some point of a template, `{{` and `}}`
/// unless changed by a `{{=<% %>=}}` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiters<'a> {
    pub open: &'a str,
    pub close: &'a str,
}

impl Default for Delimiters<'_> {
    fn default() -> Self {
        Self {
            open: "{{",
            close: "}}",
        }
    }
}

impl<'a> Delimiters<'a> {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Returns the delimiter change tag that restores these delimiters, or
    /// `None` if they are the defaults.
    pub fn change_tag(&self) -> Option<String> {
        if self.is_default() {
            None
        } else {
            Some(format!("{{{{= {} {} =}}}}", self.open, self.close))
        }
    }
}

/// A template pragma, i.e. a named compile time feature.
///
/// Pragmas are enabled in a template using a pragma tag, e.g.
/// `{{% FILTERS }}`, and stay enabled for the rest of that template. They can
/// also be enabled for every template using
/// [`EngineBuilder::pragma`][crate::EngineBuilder::pragma].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Pragma {
    /// Enables `{{% BLOCKS }}` template inheritance tags `{{$ block }}`.
    Blocks,
    /// Enables `{{ value | filter }}` filter pipelines.
    Filters,
    /// Enables `{{ .name }}` lookups anchored to the current section value.
    AnchoredDot,
}

impl Pragma {
    /// Returns the name of the pragma as written in templates.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Blocks => "BLOCKS",
            Self::Filters => "FILTERS",
            Self::AnchoredDot => "ANCHORED-DOT",
        }
    }
}

impl fmt::Display for Pragma {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pragma {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BLOCKS" => Ok(Self::Blocks),
            "FILTERS" => Ok(Self::Filters),
            "ANCHORED-DOT" => Ok(Self::AnchoredDot),
            _ => Err(Error::config(format!("unknown pragma `{s}`"))),
        }
    }
}
