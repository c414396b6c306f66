//! Vectorized passage index built once from the policy corpus.
//!
//! The index is immutable after build and shared read-only across
//! concurrent queries; a corpus change rebuilds it wholesale and the new
//! index is swapped in by the caller.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::semantic::embeddings::{EmbeddingError, EmbeddingProvider};

/// A corpus record before vectorization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusDoc {
    pub text: String,
    /// Free-form attribution fields (source document, section title).
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// A retrievable unit: passage text, attribution metadata, and embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    /// Ordinal position in the corpus. Stable across identical rebuilds
    /// and used as the deterministic tie-break in ranking.
    pub id: u64,
    pub text: String,
    /// Opaque to ranking; passed through to responses.
    pub metadata: BTreeMap<String, String>,
    pub embedding: Vec<f32>,
}

/// Errors that can occur while building or loading an index.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("dimension mismatch at passage {passage}: expected {expected}, got {got}")]
    DimensionMismatch {
        passage: u64,
        expected: usize,
        got: usize,
    },

    #[error("index was built with model '{index_model}' but provider is '{provider_model}'")]
    ModelMismatch {
        index_model: String,
        provider_model: String,
    },
}

/// Immutable collection of vectorized passages plus the id of the model
/// that produced the vectors.
#[derive(Debug, Clone)]
pub struct DocumentIndex {
    model_id: String,
    dimensions: usize,
    passages: Vec<Passage>,
}

impl DocumentIndex {
    /// Vectorize a corpus and build the index.
    ///
    /// The whole build fails if the provider errors or returns a vector
    /// of unexpected dimensionality for any passage; there is no partial
    /// index. Corpus order is preserved and passage ids are ordinals.
    pub async fn build(
        corpus: Vec<CorpusDoc>,
        provider: &dyn EmbeddingProvider,
    ) -> Result<Self, IndexError> {
        let texts: Vec<String> = corpus.iter().map(|doc| doc.text.clone()).collect();
        let vectors = provider.embed_batch(&texts).await?;

        if vectors.len() != corpus.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: corpus.len(),
                got: vectors.len(),
            }
            .into());
        }

        let dimensions = vectors.first().map(|v| v.len()).unwrap_or(0);

        let mut passages = Vec::with_capacity(corpus.len());
        for (ord, (doc, embedding)) in corpus.into_iter().zip(vectors).enumerate() {
            if embedding.len() != dimensions {
                return Err(IndexError::DimensionMismatch {
                    passage: ord as u64,
                    expected: dimensions,
                    got: embedding.len(),
                });
            }
            passages.push(Passage {
                id: ord as u64,
                text: doc.text,
                metadata: doc.metadata,
                embedding,
            });
        }

        Ok(Self {
            model_id: provider.model_id().to_string(),
            dimensions,
            passages,
        })
    }

    /// Assemble an index from already-vectorized passages (prebuilt file).
    ///
    /// Ids are reassigned to ordinals so the tie-break invariant holds
    /// regardless of what the file claims.
    pub fn from_parts(model_id: String, passages: Vec<Passage>) -> Result<Self, IndexError> {
        let dimensions = passages.first().map(|p| p.embedding.len()).unwrap_or(0);

        let mut renumbered = passages;
        for (ord, passage) in renumbered.iter_mut().enumerate() {
            if passage.embedding.len() != dimensions {
                return Err(IndexError::DimensionMismatch {
                    passage: ord as u64,
                    expected: dimensions,
                    got: passage.embedding.len(),
                });
            }
            passage.id = ord as u64;
        }

        Ok(Self {
            model_id,
            dimensions,
            passages: renumbered,
        })
    }

    /// Reject use with a provider other than the one the index was built
    /// with. Vectors from different models do not share a space.
    pub fn ensure_model(&self, provider_model: &str) -> Result<(), IndexError> {
        if self.model_id != provider_model {
            return Err(IndexError::ModelMismatch {
                index_model: self.model_id.clone(),
                provider_model: provider_model.to_string(),
            });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn get(&self, id: u64) -> Option<&Passage> {
        self.passages.get(id as usize)
    }

    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Provider that maps each text to a fixed vector, failing on demand.
    struct ScriptedProvider {
        dims: usize,
        fail_on: Option<String>,
        short_on: Option<String>,
    }

    impl ScriptedProvider {
        fn new(dims: usize) -> Self {
            Self {
                dims,
                fail_on: None,
                short_on: None,
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for ScriptedProvider {
        fn model_id(&self) -> &str {
            "scripted-v1"
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            if self.fail_on.as_deref() == Some(text) {
                return Err(EmbeddingError::Request("scripted failure".to_string()));
            }
            if self.short_on.as_deref() == Some(text) {
                return Ok(vec![1.0]);
            }
            Ok(vec![text.len() as f32; self.dims])
        }
    }

    fn corpus(texts: &[&str]) -> Vec<CorpusDoc> {
        texts
            .iter()
            .map(|t| CorpusDoc {
                text: t.to_string(),
                metadata: BTreeMap::new(),
            })
            .collect()
    }

    #[tokio::test]
    async fn build_preserves_corpus_order() {
        let provider = ScriptedProvider::new(3);
        let index = DocumentIndex::build(corpus(&["first", "second", "third"]), &provider)
            .await
            .unwrap();

        assert_eq!(index.len(), 3);
        assert_eq!(index.model_id(), "scripted-v1");
        assert_eq!(index.dimensions(), 3);

        let texts: Vec<&str> = index.passages().iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);

        let ids: Vec<u64> = index.passages().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn build_fails_atomically_on_provider_error() {
        let provider = ScriptedProvider {
            dims: 3,
            fail_on: Some("bad".to_string()),
            short_on: None,
        };

        let result = DocumentIndex::build(corpus(&["good", "bad", "also good"]), &provider).await;
        assert!(matches!(result, Err(IndexError::Embedding(_))));
    }

    #[tokio::test]
    async fn build_rejects_mixed_dimensions() {
        let provider = ScriptedProvider {
            dims: 3,
            fail_on: None,
            short_on: Some("odd one".to_string()),
        };

        let result = DocumentIndex::build(corpus(&["normal", "odd one"]), &provider).await;
        assert!(matches!(
            result,
            Err(IndexError::DimensionMismatch { passage: 1, .. })
        ));
    }

    #[tokio::test]
    async fn empty_corpus_builds_an_empty_index() {
        let provider = ScriptedProvider::new(3);
        let index = DocumentIndex::build(vec![], &provider).await.unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn from_parts_renumbers_ordinals() {
        let passages = vec![
            Passage {
                id: 42,
                text: "a".to_string(),
                metadata: BTreeMap::new(),
                embedding: vec![1.0, 0.0],
            },
            Passage {
                id: 7,
                text: "b".to_string(),
                metadata: BTreeMap::new(),
                embedding: vec![0.0, 1.0],
            },
        ];

        let index = DocumentIndex::from_parts("m".to_string(), passages).unwrap();
        let ids: Vec<u64> = index.passages().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn from_parts_rejects_mixed_dimensions() {
        let passages = vec![
            Passage {
                id: 0,
                text: "a".to_string(),
                metadata: BTreeMap::new(),
                embedding: vec![1.0, 0.0],
            },
            Passage {
                id: 1,
                text: "b".to_string(),
                metadata: BTreeMap::new(),
                embedding: vec![1.0],
            },
        ];

        let result = DocumentIndex::from_parts("m".to_string(), passages);
        assert!(matches!(
            result,
            Err(IndexError::DimensionMismatch { passage: 1, .. })
        ));
    }

    #[test]
    fn model_mismatch_is_rejected() {
        let index = DocumentIndex::from_parts("model-a".to_string(), vec![]).unwrap();
        assert!(index.ensure_model("model-a").is_ok());
        assert!(matches!(
            index.ensure_model("model-b"),
            Err(IndexError::ModelMismatch { .. })
        ));
    }
}
