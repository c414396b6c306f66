//! Integration-style tests spanning multiple modules.

mod routing;
mod web_api;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::semantic::{EmbeddingError, EmbeddingProvider};

pub(crate) const TEST_MODEL: &str = "table-test-model";

/// Embedding provider backed by a fixed text → vector table, counting
/// calls so tests can assert when it must not be consulted.
pub(crate) struct TableProvider {
    vectors: HashMap<String, Vec<f32>>,
    calls: AtomicUsize,
}

impl TableProvider {
    pub(crate) fn new(entries: &[(&str, Vec<f32>)]) -> Self {
        Self {
            vectors: entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for TableProvider {
    fn model_id(&self) -> &str {
        TEST_MODEL
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.vectors
            .get(text)
            .cloned()
            .ok_or_else(|| EmbeddingError::Request(format!("no vector for '{text}'")))
    }
}
