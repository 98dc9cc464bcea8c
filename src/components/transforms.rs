use std::collections::HashMap;

use proj::Proj;

use crate::errors::Result;

/// Lazily built coordinate transformers from source crs into one fixed
/// target crs, at most one per distinct source.
///
/// The cache remembers the target it was built against so its owner can
/// tell when a dataset swap made it stale; a stale cache would silently
/// project into the wrong crs.
pub struct TransformerCache {
    target: String,
    transformers: HashMap<String, Proj>,
}

impl TransformerCache {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            transformers: HashMap::new(),
        }
    }

    /// Crs the cached transformers project into.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Transformer from `source` into the cache target, built on first
    /// request and reused afterwards.
    pub fn transformer_for(&mut self, source: &str) -> Result<&Proj> {
        if !self.transformers.contains_key(source) {
            let transformer = Proj::new_known_crs(source, &self.target, None)?;
            self.transformers.insert(source.to_string(), transformer);
        }
        Ok(&self.transformers[source])
    }

    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }
}

impl std::fmt::Debug for TransformerCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformerCache")
            .field("target", &self.target)
            .field("sources", &self.transformers.keys().collect::<Vec<_>>())
            .finish()
    }
}
