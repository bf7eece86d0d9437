//! Defines the [`Value`] enum, representing any valid renderable data.

mod cow;
mod from;
#[cfg(feature = "serde")]
mod ser;

use std::mem;

pub use indexmap::IndexMap;
pub use std::vec::Vec as List;

pub(crate) use crate::value::cow::ValueCow;
#[cfg(feature = "serde")]
pub use crate::value::ser::to_value;
use crate::Lambda;

/// An insertion ordered map of values.
pub type Map = IndexMap<String, Value>;

/// Data to be rendered represented as a recursive enum.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(List<Value>),
    Map(Map),
    Lambda(Lambda),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(s), Self::Bool(o)) => s == o,
            (Self::Integer(s), Self::Integer(o)) => s == o,
            (Self::Float(s), Self::Float(o)) => s == o,
            (Self::String(s), Self::String(o)) => s == o,
            (Self::List(s), Self::List(o)) => s == o,
            (Self::Map(s), Self::Map(o)) => s == o,
            (Self::Lambda(s), Self::Lambda(o)) => s == o,
            _ => mem::discriminant(self) == mem::discriminant(other),
        }
    }
}

impl Value {
    /// Returns whether this value counts as empty, in which case sections are
    /// skipped and inverted sections are rendered.
    ///
    /// `None`, `false`, `0`, `0.0`, `""` and empty lists and maps are empty.
    /// Everything else, including the string `"0"`, is not.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::None => true,
            Self::Bool(b) => !b,
            Self::Integer(n) => *n == 0,
            Self::Float(n) => *n == 0.0,
            Self::String(s) => s.is_empty(),
            Self::List(l) => l.is_empty(),
            Self::Map(m) => m.is_empty(),
            Self::Lambda(_) => false,
        }
    }
}
