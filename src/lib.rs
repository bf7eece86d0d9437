//! A Mustache template engine that compiles templates into cacheable
//! programs.
//!
//! # Features
//!
//! ### Syntax
//!
//! - Variables: `{{ user.name }}`, unescaped `{{{ html }}}` or `{{& html }}`
//! - Sections and inverted sections: `{{# users }} ... {{/ users }}`
//! - Partials: `{{> header }}`, indented by the whitespace before the tag
//! - Template inheritance: `{{< base }}{{$ title }}...{{/ title }}{{/ base }}`
//! - Delimiter changes: `{{=<% %>=}}`
//! - Lambdas and higher order sections
//! - Filters: `{{% FILTERS }}{{ name | upper }}`
//!
//! ### Engine
//!
//! - Templates compile to an immutable [`Program`] identified by a content
//!   hash, so identical templates are compiled once
//! - Pluggable [`Loader`]s for templates and partials and a pluggable
//!   [`Cache`] for compiled programs
//! - Render using any [`serde`] serializable values
//! - Convenient macro for quick rendering:
//!   `lump::value!{ name: "John", age: 42 }`
//!
//! # Getting started
//!
//! Your entry point is the [`Engine`] struct. The engine stores the
//! configuration, the helpers and the compiled programs. Generally, you only
//! need to construct one engine during the lifetime of a program.
//!
//! ```
//! let engine = lump::Engine::new();
//! ```
//!
//! A template can be compiled directly from source using
//! [`.compile`][Engine::compile] and rendered with
//! [`.render`][Template::render].
//!
//! ```
//! # let engine = lump::Engine::new();
//! let template = engine.compile("Hello {{ user.name }}!")?;
//! let result = template.render(lump::value!{ user: { name: "John Smith" }})?;
//! assert_eq!(result, "Hello John Smith!");
//! # Ok::<(), lump::Error>(())
//! ```
//!
//! # Examples
//!
//! ### Render using structured data
//!
//! ```
//! #[derive(serde::Serialize)]
//! struct Context { user: User }
//!
//! #[derive(serde::Serialize)]
//! struct User { name: String }
//!
//! let ctx = Context { user: User { name: "John Smith".into() } };
//!
//! let result = lump::Engine::new()
//!     .compile("Hello {{ user.name }}")?
//!     .render(&ctx)?;
//!
//! assert_eq!(result, "Hello John Smith");
//! # Ok::<(), lump::Error>(())
//! ```
//!
//! ### Load templates and partials by name
//!
//! ```
//! use lump::{ArrayLoader, Engine};
//!
//! let engine = Engine::builder()
//!     .loader(ArrayLoader::new([
//!         ("page", "<h1>{{ title }}</h1>\n{{> footer }}"),
//!         ("footer", "<p>{{ year }}</p>\n"),
//!     ]))
//!     .build()?;
//!
//! let result = engine.render("page", lump::value! { title: "Home", year: 2024 })?;
//! assert_eq!(result, "<h1>Home</h1>\n<p>2024</p>\n");
//! # Ok::<(), lump::Error>(())
//! ```
//!
//! ### Transform data using filters
//!
//! Helpers are available to every template rendered by the engine, below any
//! context. Lambda helpers can be used as filters.
//!
//! ```
//! use lump::{Engine, Lambda, Value};
//!
//! let engine = Engine::builder()
//!     .pragma("FILTERS")
//!     .helper("lower", Lambda::filter(|v: Value| match v {
//!         Value::String(s) => Value::from(s.to_lowercase()),
//!         v => v,
//!     }))
//!     .build()?;
//!
//! let result = engine
//!     .compile("Hello {{ value | lower }}")?
//!     .render(lump::value! { value: "WORLD!" })?;
//!
//! assert_eq!(result, "Hello world!");
//! # Ok::<(), lump::Error>(())
//! ```

mod cache;
mod compile;
mod error;
pub mod fmt;
mod lambda;
mod loader;
mod macros;
mod render;
mod types;
mod value;

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

pub use crate::cache::{Cache, MemoryCache, NoopCache};
pub use crate::error::{Error, ErrorKind};
pub use crate::fmt::EntityFlags;
pub use crate::lambda::{Lambda, LambdaHelper, LambdaReturn};
pub use crate::loader::{ArrayLoader, CascadingLoader, Loader, StringLoader};
pub use crate::types::program::{Key, Program};
pub use crate::types::syntax::Pragma;
#[cfg(feature = "serde")]
pub use crate::value::to_value;
pub use crate::value::{List, Map, Value};

use crate::fmt::EscapeFn;

/// A type alias for results in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The version of the compiled program format, part of every template key.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The default limit on nested partials and parents.
const DEFAULT_MAX_PARTIAL_DEPTH: usize = 64;

/// The compilation and rendering engine.
pub struct Engine {
    loader: Arc<dyn Loader>,
    partials: Option<Arc<dyn Loader>>,
    /// Always a [`Value::Map`].
    helpers: Value,
    pub(crate) escape: Option<Box<EscapeFn>>,
    pub(crate) entity_flags: EntityFlags,
    charset: String,
    pub(crate) strict_callables: bool,
    pub(crate) pragmas: BTreeSet<Pragma>,
    cache: Arc<dyn Cache>,
    lambda_cache: Arc<dyn Cache>,
    pub(crate) max_partial_depth: usize,
    programs: RwLock<HashMap<Key, Arc<Program>>>,
}

/// Configures and builds an [`Engine`].
///
/// # Examples
///
/// ```
/// use lump::{Engine, EntityFlags};
///
/// let engine = Engine::builder()
///     .entity_flags(EntityFlags::Quotes)
///     .pragma("ANCHORED-DOT")
///     .max_partial_depth(16)
///     .build()?;
/// # Ok::<(), lump::Error>(())
/// ```
pub struct EngineBuilder {
    loader: Option<Arc<dyn Loader>>,
    partials: Option<Arc<dyn Loader>>,
    helpers: Map,
    escape: Option<Box<EscapeFn>>,
    entity_flags: EntityFlags,
    charset: String,
    strict_callables: bool,
    pragmas: Vec<String>,
    cache: Option<Arc<dyn Cache>>,
    cache_lambda_templates: bool,
    max_partial_depth: usize,
}

/// A compiled template.
///
/// Templates are cheap to clone, the compiled program is shared.
#[derive(Clone)]
pub struct Template<'engine> {
    engine: &'engine Engine,
    program: Arc<Program>,
}

impl Default for Engine {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Construct a new engine with the default configuration.
    ///
    /// Templates are loaded using a [`StringLoader`], there are no partials
    /// and nothing is cached beyond the lifetime of the engine.
    #[inline]
    pub fn new() -> Self {
        EngineBuilder::new().finish(BTreeSet::new())
    }

    /// Returns a builder to configure a new engine.
    #[inline]
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Load the named template and render it using the provided value.
    #[cfg(feature = "serde")]
    pub fn render<S>(&self, name: &str, ctx: S) -> Result<String>
    where
        S: serde::Serialize,
    {
        self.load_template(name)?.render(ctx)
    }

    /// Load the named template and render it using the provided value.
    pub fn render_value(&self, name: &str, ctx: &Value) -> Result<String> {
        self.load_template(name)?.render_value(ctx)
    }

    /// Load and compile the named template.
    ///
    /// # Errors
    ///
    /// If the loader does not know the template this returns an
    /// [`ErrorKind::UnknownTemplate`] error, the error is named after the
    /// template.
    pub fn load_template(&self, name: &str) -> Result<Template<'_>> {
        let source = self
            .loader
            .load(name)
            .ok_or_else(|| Error::unknown_template(name))?;
        let program = self.load_source(source, &*self.cache)?;
        Ok(Template::new(self, program))
    }

    /// Compile a template from source.
    ///
    /// The compiled program is kept by the engine, so compiling the same
    /// source again is cheap.
    pub fn compile(&self, source: impl Into<String>) -> Result<Template<'_>> {
        let program = self.load_source(source.into(), &*self.cache)?;
        Ok(Template::new(self, program))
    }

    /// Returns the identity key of the given template source under this
    /// engine's configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// let engine = lump::Engine::new();
    /// let template = engine.compile("Hello {{ name }}")?;
    /// assert_eq!(template.key(), engine.template_key("Hello {{ name }}"));
    /// # Ok::<(), lump::Error>(())
    /// ```
    pub fn template_key(&self, source: &str) -> Key {
        let escape = match self.escape {
            Some(_) => "custom",
            None => "default",
        };
        let pragmas: Vec<_> = self.pragmas.iter().map(Pragma::as_str).collect();
        let identity = format!(
            "version:{},escape:{},entity_flags:{},charset:{},strict_callables:{},pragmas:{},source:{}",
            VERSION,
            escape,
            self.entity_flags,
            self.charset,
            self.strict_callables,
            pragmas.join(" "),
            source,
        );
        Key::digest([identity.as_str()])
    }

    /// Add a helper, available as the bottom context frame of every render.
    ///
    /// A helper with the same name is replaced.
    pub fn add_helper(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.helpers_mut().insert(name.into(), value.into());
    }

    /// Returns the named helper.
    ///
    /// # Errors
    ///
    /// If there is no such helper this returns an
    /// [`ErrorKind::UnknownHelper`] error.
    pub fn get_helper(&self, name: &str) -> Result<&Value> {
        self.helpers()
            .get(name)
            .ok_or_else(|| Error::unknown_helper(name))
    }

    /// Returns whether there is a helper with the given name.
    pub fn has_helper(&self, name: &str) -> bool {
        self.helpers().contains_key(name)
    }

    /// Remove a helper, returning it if it existed.
    pub fn remove_helper(&mut self, name: &str) -> Option<Value> {
        self.helpers_mut().shift_remove(name)
    }

    /// Returns all helpers in the order they were added.
    pub fn helpers(&self) -> &Map {
        match &self.helpers {
            Value::Map(map) => map,
            _ => unreachable!("helpers are always a map"),
        }
    }

    /// Returns the pragmas enabled for every template.
    pub fn pragmas(&self) -> impl Iterator<Item = Pragma> + '_ {
        self.pragmas.iter().copied()
    }

    /// Returns which quote characters are escaped.
    pub fn entity_flags(&self) -> EntityFlags {
        self.entity_flags
    }

    /// Returns the configured character set.
    pub fn charset(&self) -> &str {
        &self.charset
    }

    fn helpers_mut(&mut self) -> &mut Map {
        match &mut self.helpers {
            Value::Map(map) => map,
            _ => unreachable!("helpers are always a map"),
        }
    }

    pub(crate) fn helpers_value(&self) -> &Value {
        &self.helpers
    }

    /// Load and compile a partial or parent template.
    ///
    /// A missing partial is not an error, it renders nothing.
    pub(crate) fn load_partial(&self, name: &str) -> Result<Option<Arc<Program>>> {
        let source = self.partials.as_ref().and_then(|loader| loader.load(name));
        match source {
            Some(source) => self.load_source(source, &*self.cache).map(Some),
            None => {
                warn!(name, "partial not found");
                Ok(None)
            }
        }
    }

    /// Compile the text returned by a lambda.
    ///
    /// If the lambda was called where the delimiters were changed then the
    /// text is compiled with a leading delimiter change tag so that it uses
    /// the same delimiters.
    pub(crate) fn load_lambda(&self, text: &str, delims: Option<&str>) -> Result<Arc<Program>> {
        let source = match delims {
            Some(tag) => format!("{tag}\n{text}"),
            None => text.to_owned(),
        };
        self.load_source(source, &*self.lambda_cache)
    }

    /// Returns the program for the source, compiling it only if neither the
    /// engine nor the cache has it already.
    fn load_source(&self, source: String, cache: &dyn Cache) -> Result<Arc<Program>> {
        let key = self.template_key(&source);

        if let Some(program) = self.programs.read().get(&key) {
            return Ok(Arc::clone(program));
        }

        let program = match cache.load(&key) {
            Some(program) => {
                debug!(%key, "loaded template from cache");
                program
            }
            None => {
                info!(%key, "compiling template");
                let program = Arc::new(compile::template(self, source, key)?);
                cache.cache(&key, Arc::clone(&program));
                program
            }
        };

        // Another thread may have compiled the same template in the meantime,
        // the first program stored wins.
        let program = self.programs.write().entry(key).or_insert(program).clone();
        Ok(program)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("helpers", &self.helpers().keys())
            .field("escape", &self.escape.as_ref().map(|_| "custom"))
            .field("entity_flags", &self.entity_flags)
            .field("charset", &self.charset)
            .field("strict_callables", &self.strict_callables)
            .field("pragmas", &self.pragmas)
            .field("max_partial_depth", &self.max_partial_depth)
            .field("programs", &self.programs.read().len())
            .finish_non_exhaustive()
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    /// Construct a builder with the default configuration.
    pub fn new() -> Self {
        Self {
            loader: None,
            partials: None,
            helpers: Map::new(),
            escape: None,
            entity_flags: EntityFlags::default(),
            charset: String::from("UTF-8"),
            strict_callables: false,
            pragmas: Vec::new(),
            cache: None,
            cache_lambda_templates: false,
            max_partial_depth: DEFAULT_MAX_PARTIAL_DEPTH,
        }
    }

    /// Set the loader used by [`Engine::load_template`].
    ///
    /// Unless a partials loader is set this loader is also used for partials.
    pub fn loader(mut self, loader: impl Loader + 'static) -> Self {
        self.loader = Some(Arc::new(loader));
        self
    }

    /// Set the loader used for partials and parents.
    pub fn partials_loader(mut self, loader: impl Loader + 'static) -> Self {
        self.partials = Some(Arc::new(loader));
        self
    }

    /// Set the partials and parents from name and source pairs.
    pub fn partials<I, K, V>(self, partials: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.partials_loader(ArrayLoader::new(partials))
    }

    /// Add a helper.
    pub fn helper(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.helpers.insert(name.into(), value.into());
        self
    }

    /// Add helpers from name and value pairs.
    pub fn helpers<I, K, V>(mut self, helpers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.helpers
            .extend(helpers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Set a custom escape function for escaped variables.
    ///
    /// # Examples
    ///
    /// ```
    /// let engine = lump::Engine::builder()
    ///     .escape(|s| s.replace('"', "\\\""))
    ///     .build()?;
    /// let result = engine.compile("{{ q }}")?.render(lump::value! { q: "say \"hi\"" })?;
    /// assert_eq!(result, "say \\\"hi\\\"");
    /// # Ok::<(), lump::Error>(())
    /// ```
    pub fn escape<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.escape = Some(Box::new(f));
        self
    }

    /// Set which quote characters the default HTML escaping escapes.
    pub fn entity_flags(mut self, flags: EntityFlags) -> Self {
        self.entity_flags = flags;
        self
    }

    /// Set the character set, `UTF-8` by default.
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    /// Set whether only [`Value::Lambda`] values are callable.
    ///
    /// When disabled, which is the default, a two element list of a map and
    /// the name of a lambda in that map is also callable.
    pub fn strict_callables(mut self, yes: bool) -> Self {
        self.strict_callables = yes;
        self
    }

    /// Enable a pragma for every template.
    pub fn pragma(mut self, name: impl Into<String>) -> Self {
        self.pragmas.push(name.into());
        self
    }

    /// Enable pragmas for every template.
    pub fn pragmas<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pragmas.extend(names.into_iter().map(Into::into));
        self
    }

    /// Set the cache for compiled programs.
    pub fn cache(mut self, cache: impl Cache + 'static) -> Self {
        self.cache = Some(Arc::new(cache));
        self
    }

    /// Set whether templates returned by lambdas are stored in the cache.
    pub fn cache_lambda_templates(mut self, yes: bool) -> Self {
        self.cache_lambda_templates = yes;
        self
    }

    /// Set the maximum nesting of partials and parents.
    pub fn max_partial_depth(mut self, max: usize) -> Self {
        self.max_partial_depth = max;
        self
    }

    /// Build the engine.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorKind::Config`] error for an unknown pragma, an
    /// unsupported charset or a zero maximum partial depth.
    pub fn build(self) -> Result<Engine> {
        let pragmas = self
            .pragmas
            .iter()
            .map(|name| name.parse::<Pragma>())
            .collect::<Result<BTreeSet<_>>>()?;
        if !fmt::is_known_charset(&self.charset) {
            return Err(Error::config(format!(
                "unsupported charset `{}`",
                self.charset
            )));
        }
        if self.max_partial_depth == 0 {
            return Err(Error::config("maximum partial depth must be at least 1"));
        }
        Ok(self.finish(pragmas))
    }

    fn finish(self, pragmas: BTreeSet<Pragma>) -> Engine {
        let partials = match (self.partials, &self.loader) {
            (Some(partials), _) => Some(partials),
            (None, Some(loader)) => Some(Arc::clone(loader)),
            (None, None) => None,
        };
        let loader = self.loader.unwrap_or_else(|| Arc::new(StringLoader));
        let cache = self.cache.unwrap_or_else(|| Arc::new(NoopCache));
        let lambda_cache = if self.cache_lambda_templates {
            Arc::clone(&cache)
        } else {
            Arc::new(NoopCache)
        };
        Engine {
            loader,
            partials,
            helpers: Value::Map(self.helpers),
            escape: self.escape,
            entity_flags: self.entity_flags,
            charset: self.charset,
            strict_callables: self.strict_callables,
            pragmas,
            cache,
            lambda_cache,
            max_partial_depth: self.max_partial_depth,
            programs: RwLock::new(HashMap::new()),
        }
    }
}

impl std::fmt::Debug for EngineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineBuilder")
            .field("helpers", &self.helpers.keys())
            .field("entity_flags", &self.entity_flags)
            .field("charset", &self.charset)
            .field("strict_callables", &self.strict_callables)
            .field("pragmas", &self.pragmas)
            .field("cache_lambda_templates", &self.cache_lambda_templates)
            .field("max_partial_depth", &self.max_partial_depth)
            .finish_non_exhaustive()
    }
}

impl<'engine> Template<'engine> {
    fn new(engine: &'engine Engine, program: Arc<Program>) -> Self {
        debug!(key = %program.key(), "instantiating template");
        Self { engine, program }
    }

    /// Render the template to a string using the provided value.
    #[cfg(feature = "serde")]
    #[inline]
    pub fn render<S>(&self, ctx: S) -> Result<String>
    where
        S: serde::Serialize,
    {
        self.render_value(&to_value(ctx)?)
    }

    /// Render the template to a string using the provided value.
    #[inline]
    pub fn render_value(&self, ctx: &Value) -> Result<String> {
        render::template(self.engine, &self.program, ctx)
    }

    /// Returns the original template source.
    #[inline]
    pub fn source(&self) -> &str {
        self.program.source()
    }

    /// Returns the identity key of the template.
    #[inline]
    pub fn key(&self) -> Key {
        self.program.key()
    }

    /// Returns the compiled program.
    #[inline]
    pub fn program(&self) -> &Arc<Program> {
        &self.program
    }
}

impl std::fmt::Debug for Template<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Template")
            .field("key", &self.program.key())
            .finish_non_exhaustive()
    }
}
