use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single input file: a template plus the records it is expanded over.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DocumentSource {
    pub source: String,
    #[serde(rename = "documentTemplate")]
    pub document_template: String,
    pub documents: Vec<Record>,
}

/// Field name to value. JSON `null` is kept as `None` and treated as missing.
pub type Record = BTreeMap<String, Option<Scalar>>;

/// Values a record field may hold. Arrays and objects do not deserialize.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    String(String),
    Number(serde_json::Number),
    Bool(bool),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Number(n) => write_number(f, n),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

// Largest magnitude at which every integer is exactly representable as f64.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Whole-valued floats print without a fractional part (`10.0` as `10`,
/// `1e3` as `1000`), matching how JSON numbers read as text elsewhere.
fn write_number(f: &mut fmt::Formatter<'_>, n: &serde_json::Number) -> fmt::Result {
    if n.is_f64()
        && let Some(v) = n.as_f64()
        && v.fract() == 0.0
        && v.abs() <= MAX_SAFE_INTEGER
    {
        #[allow(clippy::cast_possible_truncation)]
        let whole = v as i64;
        return write!(f, "{whole}");
    }
    write!(f, "{n}")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkMetadata {
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// Ids, texts and metadata kept as three aligned sequences.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    ids: Vec<String>,
    texts: Vec<String>,
    metadatas: Vec<ChunkMetadata>,
}

impl Batch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: Chunk) {
        self.ids.push(chunk.id);
        self.texts.push(chunk.text);
        self.metadatas.push(chunk.metadata);
    }

    /// Move every chunk of `other` to the end of `self`, keeping order.
    pub fn append(&mut self, other: &mut Batch) {
        self.ids.append(&mut other.ids);
        self.texts.append(&mut other.texts);
        self.metadatas.append(&mut other.metadatas);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    #[must_use]
    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    #[must_use]
    pub fn metadatas(&self) -> &[ChunkMetadata] {
        &self.metadatas
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &ChunkMetadata)> {
        self.ids
            .iter()
            .zip(&self.texts)
            .zip(&self.metadatas)
            .map(|((id, text), meta)| (id.as_str(), text.as_str(), meta))
    }
}

impl FromIterator<Chunk> for Batch {
    fn from_iter<I: IntoIterator<Item = Chunk>>(iter: I) -> Self {
        let mut batch = Batch::new();
        for chunk in iter {
            batch.push(chunk);
        }
        batch
    }
}
