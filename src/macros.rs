/// Construct a [`Value`][crate::Value] from a JSON-like literal.
///
/// Maps use `key: value` entries where the key is an identifier or a string
/// literal. Lists use `[...]`. Any other value is converted using
/// [`From`].
///
/// ```
/// use lump::{value, Value};
///
/// let v = value! {
///     user: {
///         name: "John Smith",
///         "favourite-numbers": [1, 7, 42],
///         nickname: None,
///     },
/// };
/// let Value::Map(map) = v else { unreachable!() };
/// assert!(map.contains_key("user"));
/// ```
#[macro_export]
macro_rules! value {
    ($($tt:tt)*) => {
        $crate::_value!({ $($tt)* })
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! _value {
    // Lists, munched one element at a time into an accumulator.

    (@list [$($elems:expr,)*]) => {
        $crate::Value::List(::std::vec![$($elems,)*])
    };

    (@list [$($elems:expr,)*] None $(, $($rest:tt)*)?) => {
        $crate::_value!(@list [$($elems,)* $crate::Value::None,] $($($rest)*)?)
    };

    (@list [$($elems:expr,)*] [$($list:tt)*] $(, $($rest:tt)*)?) => {
        $crate::_value!(@list [$($elems,)* $crate::_value!([$($list)*]),] $($($rest)*)?)
    };

    (@list [$($elems:expr,)*] {$($map:tt)*} $(, $($rest:tt)*)?) => {
        $crate::_value!(@list [$($elems,)* $crate::_value!({$($map)*}),] $($($rest)*)?)
    };

    (@list [$($elems:expr,)*] $next:expr $(, $($rest:tt)*)?) => {
        $crate::_value!(@list [$($elems,)* $crate::Value::from($next),] $($($rest)*)?)
    };

    // Maps, each entry is inserted into the map variable.

    (@map $map:ident) => {};

    (@map $map:ident $key:ident : $($rest:tt)*) => {
        $crate::_value!(@entry $map (stringify!($key)) $($rest)*);
    };

    (@map $map:ident $key:literal : $($rest:tt)*) => {
        $crate::_value!(@entry $map ($key) $($rest)*);
    };

    (@entry $map:ident ($key:expr) None $(, $($rest:tt)*)?) => {
        let _ = $map.insert(::std::string::String::from($key), $crate::Value::None);
        $crate::_value!(@map $map $($($rest)*)?);
    };

    (@entry $map:ident ($key:expr) [$($list:tt)*] $(, $($rest:tt)*)?) => {
        let _ = $map.insert(::std::string::String::from($key), $crate::_value!([$($list)*]));
        $crate::_value!(@map $map $($($rest)*)?);
    };

    (@entry $map:ident ($key:expr) {$($inner:tt)*} $(, $($rest:tt)*)?) => {
        let _ = $map.insert(::std::string::String::from($key), $crate::_value!({$($inner)*}));
        $crate::_value!(@map $map $($($rest)*)?);
    };

    (@entry $map:ident ($key:expr) $value:expr $(, $($rest:tt)*)?) => {
        let _ = $map.insert(::std::string::String::from($key), $crate::Value::from($value));
        $crate::_value!(@map $map $($($rest)*)?);
    };

    // Entry points.

    ([$($tt:tt)*]) => {
        $crate::_value!(@list [] $($tt)*)
    };

    ({$($tt:tt)*}) => {{
        #[allow(unused_mut)]
        let mut map = $crate::Map::new();
        $crate::_value!(@map map $($tt)*);
        $crate::Value::Map(map)
    }};
}
