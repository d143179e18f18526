use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// HNSW distance function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceSpace {
    #[default]
    Cosine,
    L2,
    Ip,
}

/// Construction- and search-time candidate list sizes plus distance space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HnswParams {
    pub space: DistanceSpace,
    pub ef_construction: u32,
    pub ef_search: u32,
}

impl Default for HnswParams {
    fn default() -> Self {
        Self {
            space: DistanceSpace::Cosine,
            ef_construction: 200,
            ef_search: 200,
        }
    }
}

/// Embedding function recorded on the collection so readers embed queries the
/// same way the writer embedded documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingFunctionSpec {
    pub provider: String,
    pub model: String,
    pub api_key_env_var: String,
}

/// Everything needed to create a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSpec {
    pub name: String,
    pub embedding: EmbeddingFunctionSpec,
    pub hnsw: HnswParams,
}

/// Server-side identity of an existing collection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CollectionInfo {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

/// One add request: four aligned sequences.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AddRecords {
    pub ids: Vec<String>,
    pub embeddings: Vec<Vec<f32>>,
    pub documents: Vec<String>,
    pub metadatas: Vec<serde_json::Value>,
}

impl AddRecords {
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Check alignment and id uniqueness before anything is sent.
    ///
    /// # Errors
    ///
    /// Returns [`crate::IndexError::InvalidBatch`] describing the first problem.
    pub fn check(&self) -> Result<(), crate::IndexError> {
        let n = self.ids.len();
        if self.embeddings.len() != n || self.documents.len() != n || self.metadatas.len() != n {
            return Err(crate::IndexError::InvalidBatch(format!(
                "misaligned batch: {n} ids, {} embeddings, {} documents, {} metadatas",
                self.embeddings.len(),
                self.documents.len(),
                self.metadatas.len()
            )));
        }
        let mut seen = std::collections::HashSet::with_capacity(n);
        if let Some(dup) = self.ids.iter().find(|id| !seen.insert(id.as_str())) {
            return Err(crate::IndexError::InvalidBatch(format!("duplicate id {dup}")));
        }
        Ok(())
    }
}
