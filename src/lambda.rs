//! Callable values.
//!
//! A [`Lambda`] is a value that is called instead of rendered. There are three
//! shapes of lambda, depending on where in a template it is meant to be used.
//!
//! ### Interpolation
//!
//! A lambda created with [`Lambda::new`] takes no arguments. When it is
//! interpolated its result is rendered as a template against the current
//! context.
//!
//! ```
//! use lump::{value, Engine, Lambda};
//!
//! let engine = Engine::new();
//! let result = engine
//!     .compile("Hello {{ planet }}!")?
//!     .render_value(&value! {
//!         planet: Lambda::new(|| "{{ name }}"),
//!         name: "World",
//!     })?;
//! assert_eq!(result, "Hello World!");
//! # Ok::<(), lump::Error>(())
//! ```
//!
//! ### Sections
//!
//! A lambda created with [`Lambda::section`] receives the raw, unrendered
//! text of the section and a [`LambdaHelper`] that can render text against
//! the current context.
//!
//! ```
//! use lump::{value, Engine, Lambda};
//!
//! let engine = Engine::new();
//! let result = engine
//!     .compile("{{#bold}}Hi {{ name }}.{{/bold}}")?
//!     .render_value(&value! {
//!         name: "Tater",
//!         bold: Lambda::section(|text, helper| {
//!             Ok::<_, lump::Error>(format!("<b>{}</b>", helper.render(text)?))
//!         }),
//!     })?;
//! assert_eq!(result, "<b>Hi Tater.</b>");
//! # Ok::<(), lump::Error>(())
//! ```
//!
//! ### Filters
//!
//! A lambda created with [`Lambda::filter`] receives a value and returns a
//! new one. Filters are applied using the `FILTERS` pragma.
//!
//! ```
//! use lump::{value, Engine, Lambda, Value};
//!
//! let engine = Engine::new();
//! let result = engine
//!     .compile("{{% FILTERS }}{{ name | upper }}")?
//!     .render_value(&value! {
//!         name: "john",
//!         upper: Lambda::filter(|v: Value| match v {
//!             Value::String(s) => Value::from(s.to_uppercase()),
//!             v => v,
//!         }),
//!     })?;
//! assert_eq!(result, "JOHN");
//! # Ok::<(), lump::Error>(())
//! ```

use std::fmt;
use std::sync::Arc;

use crate::render::Stack;
use crate::{Engine, Error, Result, Value};

type InterpFn = dyn Fn() -> Result<Value> + Send + Sync + 'static;
type SectionFn = dyn Fn(&str, &LambdaHelper<'_>) -> Result<Value> + Send + Sync + 'static;
type FilterFn = dyn Fn(Value) -> Result<Value> + Send + Sync + 'static;

/// A callable value.
///
/// Lambdas are cheap to clone, clones share the same closure. Two lambdas
/// are equal if they share the same closure.
#[derive(Clone)]
pub struct Lambda(Arc<LambdaFn>);

enum LambdaFn {
    Interp(Box<InterpFn>),
    Section(Box<SectionFn>),
    Filter(Box<FilterFn>),
}

/// The return type of a lambda.
///
/// This is implemented for anything that converts into a [`Value`] and for
/// [`Result`]s of those, so that lambdas can fail.
pub trait LambdaReturn {
    #[doc(hidden)]
    fn to_value(self) -> Result<Value>;
}

impl<T> LambdaReturn for T
where
    T: Into<Value>,
{
    fn to_value(self) -> Result<Value> {
        Ok(self.into())
    }
}

impl<T> LambdaReturn for Result<T>
where
    T: Into<Value>,
{
    fn to_value(self) -> Result<Value> {
        self.map(Into::into)
    }
}

/// Renders text against the context of a section lambda call site.
pub struct LambdaHelper<'a> {
    pub(crate) engine: &'a Engine,
    pub(crate) stack: &'a Stack<'a>,
    /// The delimiter change tag in effect at the call site, if any.
    pub(crate) delims: Option<&'a str>,
    pub(crate) depth: usize,
}

impl Lambda {
    /// Creates a lambda that takes no arguments.
    ///
    /// This shape can be used in every position: interpolation, section and
    /// filter. In sections and filters its input is ignored.
    pub fn new<F, R>(f: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: LambdaReturn,
    {
        Self(Arc::new(LambdaFn::Interp(Box::new(move || f().to_value()))))
    }

    /// Creates a lambda for use as a section, receiving the raw section text.
    pub fn section<F, R>(f: F) -> Self
    where
        F: Fn(&str, &LambdaHelper<'_>) -> R + Send + Sync + 'static,
        R: LambdaReturn,
    {
        Self(Arc::new(LambdaFn::Section(Box::new(move |text, helper| {
            f(text, helper).to_value()
        }))))
    }

    /// Creates a lambda for use as a filter.
    ///
    /// Used as a section, the filter receives the raw section text as a string.
    pub fn filter<F, R>(f: F) -> Self
    where
        F: Fn(Value) -> R + Send + Sync + 'static,
        R: LambdaReturn,
    {
        Self(Arc::new(LambdaFn::Filter(Box::new(move |v| f(v).to_value()))))
    }

    pub(crate) fn call_interp(&self) -> Result<Value> {
        match &*self.0 {
            LambdaFn::Interp(f) => f(),
            LambdaFn::Section(_) => Err(Error::from("section lambda cannot be interpolated")),
            LambdaFn::Filter(_) => Err(Error::from("filter lambda cannot be interpolated")),
        }
    }

    pub(crate) fn call_section(&self, text: &str, helper: &LambdaHelper<'_>) -> Result<Value> {
        match &*self.0 {
            LambdaFn::Interp(f) => f(),
            LambdaFn::Section(f) => f(text, helper),
            LambdaFn::Filter(f) => f(Value::from(text)),
        }
    }

    pub(crate) fn call_filter(&self, value: Value) -> Result<Value> {
        match &*self.0 {
            LambdaFn::Interp(f) => f(),
            LambdaFn::Section(_) => Err(Error::from("section lambda cannot be used as a filter")),
            LambdaFn::Filter(f) => f(value),
        }
    }
}

impl PartialEq for Lambda {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = match &*self.0 {
            LambdaFn::Interp(_) => "interpolation",
            LambdaFn::Section(_) => "section",
            LambdaFn::Filter(_) => "filter",
        };
        write!(f, "Lambda({shape})")
    }
}

impl LambdaHelper<'_> {
    /// Renders the text as a template against the current context.
    ///
    /// The text is compiled using the delimiters in effect where the section
    /// was opened.
    pub fn render(&self, text: &str) -> Result<String> {
        let program = self.engine.load_lambda(text, self.delims)?;
        crate::render::lambda(self.engine, &program, self.stack, self.depth)
    }
}

impl fmt::Debug for LambdaHelper<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LambdaHelper")
            .field("delims", &self.delims)
            .finish_non_exhaustive()
    }
}
