//! Template source loaders.
//!
//! A [`Loader`] maps a template name to its source. The engine uses one loader
//! for top-level templates and, optionally, a second one for partials and
//! parents.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

/// Loads template source by name.
///
/// Returning `None` means there is no template with that name.
pub trait Loader: Send + Sync {
    fn load(&self, name: &str) -> Option<String>;
}

impl<L> Loader for Arc<L>
where
    L: Loader + ?Sized,
{
    fn load(&self, name: &str) -> Option<String> {
        (**self).load(name)
    }
}

impl<L> Loader for Box<L>
where
    L: Loader + ?Sized,
{
    fn load(&self, name: &str) -> Option<String> {
        (**self).load(name)
    }
}

/// A loader where the template name *is* the template source.
///
/// This is the default top-level loader, so that
/// `engine.render("Hello {{ planet }}", ..)` works without any setup.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringLoader;

impl Loader for StringLoader {
    fn load(&self, name: &str) -> Option<String> {
        Some(name.to_owned())
    }
}

/// An in-memory map of template names to sources.
///
/// Templates can be added after the loader has been given to an engine, by
/// keeping a clone of an `Arc<ArrayLoader>`.
#[derive(Debug, Default)]
pub struct ArrayLoader {
    templates: RwLock<HashMap<String, String>>,
}

impl ArrayLoader {
    /// Construct a new loader from the given name and source pairs.
    pub fn new<I, K, V>(templates: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let templates = templates
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            templates: RwLock::new(templates),
        }
    }

    /// Add or replace a template.
    pub fn set_template(&self, name: impl Into<String>, source: impl Into<String>) {
        self.templates.write().insert(name.into(), source.into());
    }

    /// Returns whether a template with the given name exists.
    pub fn has_template(&self, name: &str) -> bool {
        self.templates.read().contains_key(name)
    }
}

impl Loader for ArrayLoader {
    fn load(&self, name: &str) -> Option<String> {
        self.templates.read().get(name).cloned()
    }
}

/// A loader that asks each of its loaders in turn, the first hit wins.
#[derive(Default)]
pub struct CascadingLoader {
    loaders: Vec<Box<dyn Loader>>,
}

impl CascadingLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a loader, it is asked after all the loaders added before it.
    pub fn add_loader(&mut self, loader: impl Loader + 'static) {
        self.loaders.push(Box::new(loader));
    }

    /// Builder style version of [`add_loader`][CascadingLoader::add_loader].
    pub fn with_loader(mut self, loader: impl Loader + 'static) -> Self {
        self.add_loader(loader);
        self
    }
}

impl Loader for CascadingLoader {
    fn load(&self, name: &str) -> Option<String> {
        self.loaders.iter().find_map(|loader| loader.load(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_loader_set_template() {
        let loader = ArrayLoader::new([("a", "A")]);
        assert_eq!(loader.load("a").as_deref(), Some("A"));
        assert_eq!(loader.load("b"), None);
        loader.set_template("b", "B");
        assert!(loader.has_template("b"));
        assert_eq!(loader.load("b").as_deref(), Some("B"));
    }

    #[test]
    fn cascading_loader_first_hit_wins() {
        let loader = CascadingLoader::new()
            .with_loader(ArrayLoader::new([("a", "first")]))
            .with_loader(ArrayLoader::new([("a", "second"), ("b", "only")]));
        assert_eq!(loader.load("a").as_deref(), Some("first"));
        assert_eq!(loader.load("b").as_deref(), Some("only"));
        assert_eq!(loader.load("c"), None);
    }
}
