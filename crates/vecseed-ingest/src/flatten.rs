//! Template expansion: one chunk per record of a [`DocumentSource`].

use std::sync::LazyLock;

use regex::Regex;

use crate::error::RecordError;
use crate::types::{Batch, Chunk, ChunkMetadata, DocumentSource, Record};

// `${name}` where name is ASCII word characters. Anything else stays verbatim.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z0-9_]+)\}").expect("placeholder regex is valid")
});

/// Result of flattening one source. Every record ends up in exactly one of
/// `batch` or `rejected`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flattened {
    pub batch: Batch,
    pub rejected: Vec<RecordError>,
}

/// Expand the template of `source` over each of its records.
///
/// Chunk ids are `{source}-{position}` with the 1-based position of the record,
/// so a rejected record leaves a gap instead of shifting later ids.
#[must_use]
pub fn flatten(source: &DocumentSource) -> Flattened {
    let mut out = Flattened::default();
    for (i, record) in source.documents.iter().enumerate() {
        let position = i + 1;
        match render(&source.document_template, record) {
            Ok(text) => out.batch.push(Chunk {
                id: format!("{}-{position}", source.source),
                text,
                metadata: ChunkMetadata {
                    source: source.source.clone(),
                },
            }),
            Err(missing_key) => out.rejected.push(RecordError {
                position,
                missing_key,
            }),
        }
    }
    out
}

/// Substitute every placeholder in `template`; `Err` carries the first key
/// the record has no value for.
fn render(template: &str, record: &Record) -> Result<String, String> {
    let mut text = String::with_capacity(template.len());
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(template) {
        let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let Some(Some(value)) = record.get(key.as_str()) else {
            return Err(key.as_str().to_owned());
        };
        text.push_str(&template[last..whole.start()]);
        text.push_str(&value.to_string());
        last = whole.end();
    }
    text.push_str(&template[last..]);
    Ok(text)
}
