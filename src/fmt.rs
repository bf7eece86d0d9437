//! HTML escaping and value formatting.
//!
//! Escaped variables `{{ name }}` are formatted to text and then passed
//! through [`escape_html`] using the engine's [`EntityFlags`], unless the
//! engine was configured with a custom escape function using
//! [`EngineBuilder::escape`][crate::EngineBuilder::escape].
//!
//! ```
//! use lump::fmt::{escape_html, EntityFlags};
//!
//! assert_eq!(escape_html("<a href=\"#\">", EntityFlags::Compat), "&lt;a href=&quot;#&quot;&gt;");
//! assert_eq!(escape_html("it's", EntityFlags::Quotes), "it&#039;s");
//! assert_eq!(escape_html("\"it's\"", EntityFlags::NoQuotes), "\"it's\"");
//! ```

use std::borrow::Cow;
use std::fmt;
use std::fmt::Write;

use crate::Value;

/// An escape function or closure.
pub(crate) type EscapeFn = dyn Fn(&str) -> String + Send + Sync + 'static;

/// Controls which quote characters are escaped by [`escape_html`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EntityFlags {
    /// Escape double quotes but leave single quotes alone.
    #[default]
    Compat,
    /// Escape both double and single quotes.
    Quotes,
    /// Leave both kinds of quotes alone.
    NoQuotes,
}

/// The character sets accepted by
/// [`EngineBuilder::charset`][crate::EngineBuilder::charset].
const CHARSETS: &[&str] = &[
    "UTF-8",
    "ISO-8859-1",
    "ISO-8859-5",
    "ISO-8859-15",
    "CP866",
    "CP1251",
    "CP1252",
    "KOI8-R",
    "BIG5",
    "GB2312",
    "BIG5-HKSCS",
    "SHIFT_JIS",
    "EUC-JP",
    "MACROMAN",
];

impl EntityFlags {
    /// Returns the numeric form of the flags, as used in the template key.
    pub const fn bits(&self) -> u8 {
        match self {
            Self::Compat => 2,
            Self::Quotes => 3,
            Self::NoQuotes => 0,
        }
    }
}

impl fmt::Display for EntityFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

/// Returns whether the given character set name is supported.
pub(crate) fn is_known_charset(charset: &str) -> bool {
    CHARSETS.iter().any(|c| c.eq_ignore_ascii_case(charset))
}

/// Escapes the HTML special characters in `s`.
///
/// `&`, `<` and `>` are always escaped, quotes are escaped according to the
/// given flags.
pub fn escape_html(s: &str, flags: EntityFlags) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match (c, flags) {
            ('&', _) => out.push_str("&amp;"),
            ('<', _) => out.push_str("&lt;"),
            ('>', _) => out.push_str("&gt;"),
            ('"', EntityFlags::Compat | EntityFlags::Quotes) => out.push_str("&quot;"),
            ('\'', EntityFlags::Quotes) => out.push_str("&#039;"),
            (c, _) => out.push(c),
        }
    }
    out
}

/// Formats a value as text for interpolation.
///
/// Values are formatted as follows:
/// - [`Value::None`]: empty string
/// - [`Value::Bool`]: `true` or `false`
/// - [`Value::Integer`]: the integer formatted using [`Display`][std::fmt::Display]
/// - [`Value::Float`]: the float formatted using [`Display`][std::fmt::Display]
/// - [`Value::String`]: the string, unescaped
///
/// Errors if the value is a list, a map or a lambda.
pub(crate) fn to_text(value: &Value) -> Result<Cow<'_, str>, String> {
    let mut s = String::new();
    match value {
        Value::None => {}
        Value::String(s) => return Ok(Cow::Borrowed(s)),
        Value::Bool(b) => write!(s, "{b}").map_err(|e| e.to_string())?,
        Value::Integer(n) => write!(s, "{n}").map_err(|e| e.to_string())?,
        Value::Float(n) => write!(s, "{n}").map_err(|e| e.to_string())?,
        value => {
            return Err(format!(
                "expected renderable value, found {}",
                value.human()
            ));
        }
    }
    Ok(Cow::Owned(s))
}
