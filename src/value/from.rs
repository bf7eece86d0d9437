//! Conversions from standard types into a [`Value`], used by the `value!`
//! macro and by lambda return values.

use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;

use crate::{Lambda, Value};

macro_rules! impl_from_scalar {
    ($variant:ident: $($ty:ty),+) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v.into())
                }
            }
        )+
    };
}

impl_from_scalar! { Bool: bool }
impl_from_scalar! { Integer: u8, u16, u32, i8, i16, i32, i64 }
impl_from_scalar! { Float: f64 }
impl_from_scalar! { String: String, &str }
impl_from_scalar! { Lambda: Lambda }

/// Sizes that do not fit an `i64` fall back to a float.
impl From<usize> for Value {
    fn from(n: usize) -> Self {
        i64::try_from(n).map_or(Self::Float(n as f64), Self::Integer)
    }
}

impl<V: Into<Value>> From<Option<V>> for Value {
    fn from(opt: Option<V>) -> Self {
        opt.map_or(Self::None, Into::into)
    }
}

impl<V: Into<Value>> From<Vec<V>> for Value {
    fn from(list: Vec<V>) -> Self {
        Self::List(list.into_iter().map(Into::into).collect())
    }
}

impl<V: Into<Value>, const N: usize> From<[V; N]> for Value {
    fn from(list: [V; N]) -> Self {
        Self::from(Vec::from(list))
    }
}

// `HashMap` keys come out in an arbitrary order, so such a map never
// iterates as a list in a section.
macro_rules! impl_from_map {
    ($($map:ident),+) => {
        $(
            impl<K: Into<String>, V: Into<Value>> From<$map<K, V>> for Value {
                fn from(map: $map<K, V>) -> Self {
                    Self::Map(map.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
                }
            }
        )+
    };
}

impl_from_map! { IndexMap, BTreeMap, HashMap }
