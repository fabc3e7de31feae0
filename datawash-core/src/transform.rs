//! Contract for the external transformers that carry out suggestions.
//!
//! The core never mutates a table itself. Each suggestion names a
//! transformer key and a parameter map; callers register implementations
//! under those keys and [`crate::report::Report::apply`] dispatches to them.

use std::collections::BTreeMap;

use crate::error::{DataWashError, Result};
use crate::models::{Params, TransformationResult};
use crate::table::Table;

/// A named operation that produces a new table from an input table.
pub trait Transformer: Send + Sync {
    /// Registry key, matching [`crate::models::Suggestion::transformer`]
    fn name(&self) -> &str;

    /// Applies the operation described by `params`.
    ///
    /// # Errors
    /// Returns a transformation error when the parameters are invalid for
    /// this transformer or the operation cannot be applied.
    fn transform(&self, table: &Table, params: &Params) -> Result<(Table, TransformationResult)>;
}

/// Transformers keyed by name.
#[derive(Default)]
pub struct TransformerRegistry {
    transformers: BTreeMap<String, Box<dyn Transformer>>,
}

impl std::fmt::Debug for TransformerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformerRegistry")
            .field("transformers", &self.names())
            .finish()
    }
}

impl TransformerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a transformer under its own name, replacing any previous one.
    pub fn register(&mut self, transformer: Box<dyn Transformer>) {
        let name = transformer.name().to_string();
        if self.transformers.insert(name.clone(), transformer).is_some() {
            tracing::debug!("Replaced transformer '{}'", name);
        }
    }

    /// Looks up a transformer by key.
    ///
    /// # Errors
    /// Returns `UnknownTransformer` listing the registered keys.
    pub fn get(&self, name: &str) -> Result<&dyn Transformer> {
        self.transformers
            .get(name)
            .map(AsRef::as_ref)
            .ok_or_else(|| DataWashError::UnknownTransformer {
                name: name.to_string(),
                available: self.transformers.keys().cloned().collect(),
            })
    }

    /// Registered keys in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.transformers.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }

    /// Runs the transformer registered under `name`.
    ///
    /// # Errors
    /// Returns `UnknownTransformer` for an unregistered key, or whatever the
    /// transformer itself returns.
    pub fn run(
        &self,
        name: &str,
        table: &Table,
        params: &Params,
    ) -> Result<(Table, TransformationResult)> {
        let transformer = self.get(name)?;
        tracing::debug!("Running transformer '{}' with {} params", name, params.len());
        transformer.transform(table, params)
    }
}
