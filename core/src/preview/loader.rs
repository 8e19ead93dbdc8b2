use std::collections::HashMap;

use eyre::{eyre, Result};

use super::ModelFormat;

/// Turns the bytes of a model file into a scene of type `S`.
pub trait ModelLoader<S>: Send + Sync {
    fn load(&self, url: &str, bytes: &[u8]) -> Result<S>;
}

impl<S, F> ModelLoader<S> for F
where
    F: Fn(&str, &[u8]) -> Result<S> + Send + Sync,
{
    fn load(&self, url: &str, bytes: &[u8]) -> Result<S> {
        self(url, bytes)
    }
}

/// One loader per [`ModelFormat`].
pub struct LoaderTable<S> {
    loaders: HashMap<ModelFormat, Box<dyn ModelLoader<S>>>,
}

impl<S> Default for LoaderTable<S> {
    fn default() -> Self {
        LoaderTable {
            loaders: HashMap::new(),
        }
    }
}

impl<S> LoaderTable<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any loader already registered for `format`.
    pub fn register(&mut self, format: ModelFormat, loader: impl ModelLoader<S> + 'static) -> &mut Self {
        self.loaders.insert(format, Box::new(loader));
        self
    }

    pub fn supports(&self, format: ModelFormat) -> bool {
        self.loaders.contains_key(&format)
    }

    #[tracing::instrument(skip(self, bytes), fields(len = bytes.len()), level = "debug")]
    pub fn load_model(&self, url: &str, format: ModelFormat, bytes: &[u8]) -> Result<S> {
        let loader = self
            .loaders
            .get(&format)
            .ok_or_else(|| eyre!("no loader registered for {:?}", format))?;
        loader.load(url, bytes)
    }
}
