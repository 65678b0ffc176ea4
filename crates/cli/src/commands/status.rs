//! Status and list command handlers.

use super::{print_json, Pipeline};
use clap::Args;
use docqa_core::{config::AppConfig, AppResult};
use docqa_retrieval::IndexStore;
use serde::Serialize;

/// Show whether documents have a committed index
#[derive(Args, Debug)]
pub struct StatusCommand {
    /// Document ids to check
    #[arg(required = true)]
    pub doc_ids: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct DocumentStatus {
    doc_id: String,
    indexed: bool,
}

fn statuses(store: &IndexStore, doc_ids: &[String]) -> Vec<DocumentStatus> {
    doc_ids
        .iter()
        .map(|doc_id| DocumentStatus {
            doc_id: doc_id.clone(),
            indexed: store.exists(doc_id),
        })
        .collect()
}

impl StatusCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let pipeline = Pipeline::load(config)?;
        let rows = statuses(&pipeline.store, &self.doc_ids);

        if self.json {
            return print_json(&rows);
        }
        for row in rows {
            let state = if row.indexed { "indexed" } else { "missing" };
            println!("{}  {}", row.doc_id, state);
        }
        Ok(())
    }
}

/// List indexed documents
#[derive(Args, Debug)]
pub struct ListCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ListCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let pipeline = Pipeline::load(config)?;
        let ids = pipeline.store.list()?;

        if self.json {
            return print_json(&ids);
        }
        if ids.is_empty() {
            println!("No documents indexed yet. Run 'docqa ingest <paths>' first.");
        }
        for id in ids {
            println!("{}", id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_retrieval::FlatIndex;
    use tempfile::TempDir;

    #[test]
    fn test_statuses_reflect_store() {
        let temp = TempDir::new().unwrap();
        let store = IndexStore::new(temp.path());
        let index = FlatIndex::build(vec![vec![1.0, 0.0]]).unwrap();
        store.save("present", &index, &["Text.".to_string()]).unwrap();

        let rows = statuses(
            &store,
            &["present".to_string(), "absent".to_string(), "../bad".to_string()],
        );
        let indexed: Vec<bool> = rows.iter().map(|r| r.indexed).collect();
        assert_eq!(indexed, vec![true, false, false]);
    }
}
