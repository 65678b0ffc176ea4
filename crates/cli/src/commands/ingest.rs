//! Ingest command handler.
//!
//! Reads plain-text files, assigns document ids and indexes them.

use super::{print_json, Pipeline};
use clap::Args;
use docqa_core::{config::AppConfig, AppError, AppResult};
use docqa_retrieval::{ingest_batch, DocumentInput, ProgressEvent, ProgressReporter};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Segment, embed and index documents
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Files or directories to ingest
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Document id to use (single file only; default: a new UUID per file)
    #[arg(long)]
    pub id: Option<String>,

    /// File extensions picked up when walking directories
    #[arg(long, value_delimiter = ',', default_value = "txt,md")]
    pub extensions: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IngestRow {
    doc_id: Option<String>,
    path: PathBuf,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    chunks: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl IngestRow {
    fn failed(doc_id: Option<String>, path: PathBuf, error: &AppError) -> Self {
        Self {
            doc_id,
            path,
            status: "failed",
            chunks: None,
            generation: None,
            error: Some(error.to_string()),
        }
    }
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ingest command");

        let files = self.collect_files()?;
        if files.is_empty() {
            return Err(AppError::Validation(
                "No matching files found to ingest".to_string(),
            ));
        }
        if self.id.is_some() && files.len() != 1 {
            return Err(AppError::Validation(format!(
                "--id needs exactly one file, found {}",
                files.len()
            )));
        }

        let pipeline = Pipeline::load(config)?;
        let embedder = pipeline.embedder()?;

        let mut rows = Vec::new();
        let mut documents = Vec::new();
        let mut paths = Vec::new();

        for path in files {
            match fs::read_to_string(&path) {
                Ok(text) => {
                    let doc_id = self
                        .id
                        .clone()
                        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
                    documents.push(DocumentInput::new(doc_id, text));
                    paths.push(path);
                }
                Err(e) => {
                    tracing::warn!("Failed to read {:?}: {}", path, e);
                    rows.push(IngestRow::failed(None, path, &AppError::Io(e)));
                }
            }
        }

        let progress = if self.json {
            ProgressReporter::noop()
        } else {
            ProgressReporter::new(Arc::new(|event: ProgressEvent| {
                eprintln!("{}", event.format_simple())
            }))
        };
        let options = pipeline.config.ingest_options(progress);

        let report = ingest_batch(&pipeline.store, embedder.as_ref(), documents, &options).await;

        for (outcome, path) in report.outcomes.into_iter().zip(paths) {
            rows.push(match outcome.result {
                Ok(stats) => IngestRow {
                    doc_id: Some(outcome.doc_id),
                    path,
                    status: "ingested",
                    chunks: Some(stats.chunks),
                    generation: Some(stats.generation),
                    error: None,
                },
                Err(e) => IngestRow::failed(Some(outcome.doc_id), path, &e),
            });
        }

        let failures = rows.iter().filter(|r| r.error.is_some()).count();

        if self.json {
            print_json(&rows)?;
        } else {
            for row in &rows {
                let id = row.doc_id.as_deref().unwrap_or("-");
                match (&row.chunks, &row.error) {
                    (Some(chunks), _) => {
                        println!("{}  {}  {} chunks", id, row.path.display(), chunks)
                    }
                    (None, Some(error)) => {
                        println!("{}  {}  FAILED: {}", id, row.path.display(), error)
                    }
                    (None, None) => println!("{}  {}", id, row.path.display()),
                }
            }
        }

        if failures > 0 {
            return Err(AppError::Other(format!(
                "{} of {} documents failed to ingest",
                failures,
                rows.len()
            )));
        }
        Ok(())
    }

    /// Expand the given paths into a sorted list of files.
    fn collect_files(&self) -> AppResult<Vec<PathBuf>> {
        let mut files = Vec::new();

        for path in &self.paths {
            if path.is_file() {
                files.push(path.clone());
            } else if path.is_dir() {
                let mut found: Vec<PathBuf> = WalkDir::new(path)
                    .follow_links(false)
                    .into_iter()
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_type().is_file())
                    .map(|e| e.into_path())
                    .filter(|p| self.has_allowed_extension(p))
                    .collect();
                found.sort();
                files.extend(found);
            } else {
                return Err(AppError::NotFound(format!("Path does not exist: {:?}", path)));
            }
        }

        Ok(files)
    }

    fn has_allowed_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.extensions
                    .iter()
                    .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn command(paths: Vec<PathBuf>) -> IngestCommand {
        IngestCommand {
            paths,
            id: None,
            extensions: vec!["txt".to_string(), ".md".to_string()],
            json: false,
        }
    }

    #[test]
    fn test_collect_files_walks_directories() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("nested")).unwrap();
        fs::write(temp.path().join("b.txt"), "B.").unwrap();
        fs::write(temp.path().join("nested/a.MD"), "A.").unwrap();
        fs::write(temp.path().join("image.png"), "x").unwrap();

        let files = command(vec![temp.path().to_path_buf()]).collect_files().unwrap();
        assert_eq!(
            files,
            vec![temp.path().join("b.txt"), temp.path().join("nested/a.MD")]
        );
    }

    #[test]
    fn test_explicit_file_kept_regardless_of_extension() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("notes.log");
        fs::write(&file, "Logged.").unwrap();

        let files = command(vec![file.clone()]).collect_files().unwrap();
        assert_eq!(files, vec![file]);
    }

    #[test]
    fn test_missing_path_is_not_found() {
        let temp = TempDir::new().unwrap();
        let result = command(vec![temp.path().join("absent.txt")]).collect_files();
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
