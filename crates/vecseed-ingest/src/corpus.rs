//! Directory scan: every `*.json` file becomes one [`DocumentSource`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{DocumentError, IngestError};
use crate::flatten::flatten;
use crate::types::{Batch, DocumentSource};

const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFile {
    pub path: PathBuf,
    pub source: String,
    pub chunks: usize,
    pub rejected: usize,
}

#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub error: DocumentError,
}

/// Aggregated chunks of every loadable file plus what was left out.
#[derive(Debug, Default)]
pub struct CorpusReport {
    pub batch: Batch,
    pub loaded_files: Vec<LoadedFile>,
    pub skipped_files: Vec<SkippedFile>,
    pub records_rejected: usize,
}

#[derive(Debug, Clone)]
pub struct CorpusLoader {
    max_file_size: u64,
}

impl Default for CorpusLoader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl CorpusLoader {
    #[must_use]
    pub fn new(max_file_size: u64) -> Self {
        Self { max_file_size }
    }

    /// Load every `.json` file directly under `dir`, in file-name order.
    ///
    /// Bad files and bad records are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::DataDir`] if the directory cannot be listed.
    pub async fn load(&self, dir: &Path) -> Result<CorpusReport, IngestError> {
        let files = discover(dir).await.map_err(|source| IngestError::DataDir {
            path: dir.to_path_buf(),
            source,
        })?;
        tracing::debug!(dir = %dir.display(), files = files.len(), "corpus files discovered");

        let mut report = CorpusReport::default();
        let mut seen_sources = HashSet::new();

        for path in files {
            let document = match self.read_source(&path).await {
                Ok(d) => d,
                Err(error) => {
                    tracing::warn!(file = %path.display(), %error, "skipping file");
                    report.skipped_files.push(SkippedFile { path, error });
                    continue;
                }
            };
            if !seen_sources.insert(document.source.clone()) {
                let error = DocumentError::DuplicateSource(document.source);
                tracing::warn!(file = %path.display(), %error, "skipping file");
                report.skipped_files.push(SkippedFile { path, error });
                continue;
            }

            let mut flattened = flatten(&document);
            for rejected in &flattened.rejected {
                tracing::warn!(
                    file = %path.display(),
                    position = rejected.position,
                    missing_key = %rejected.missing_key,
                    "skipping record"
                );
            }

            let chunks = flattened.batch.len();
            tracing::info!(file = %path.display(), chunks, "Loaded {} -> {chunks} chunks", file_name(&path));
            report.records_rejected += flattened.rejected.len();
            report.batch.append(&mut flattened.batch);
            report.loaded_files.push(LoadedFile {
                path,
                source: document.source,
                chunks,
                rejected: flattened.rejected.len(),
            });
        }

        Ok(report)
    }

    async fn read_source(&self, path: &Path) -> Result<DocumentSource, DocumentError> {
        let size = tokio::fs::metadata(path).await?.len();
        if size > self.max_file_size {
            return Err(DocumentError::FileTooLarge {
                size,
                limit: self.max_file_size,
            });
        }
        let bytes = tokio::fs::read(path).await?;
        let document: DocumentSource = serde_json::from_slice(&bytes)?;
        if document.source.trim().is_empty() {
            return Err(DocumentError::EmptySource);
        }
        Ok(document)
    }
}

/// Regular files (symlinks followed) with a case-insensitive `json`
/// extension, sorted by path. Not recursive.
async fn discover(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if !is_json {
            continue;
        }
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => tracing::warn!(file = %path.display(), error = %e, "cannot stat file"),
        }
    }
    files.sort();
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}
