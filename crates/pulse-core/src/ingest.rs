// crates/pulse-core/src/ingest.rs

//! # Ingestion
//!
//! Walks the source tree, extracts every document and bulk-loads each
//! category's records. Sequential and single-pass; the first error aborts
//! the run.

use crate::category::Category;
use crate::error::Result;
use crate::extract::extract_document;
use crate::record::FlatRecord;
use crate::store::Store;
use crate::walker::SourceTree;
use serde::Serialize;
use tracing::{debug, info, info_span};

/// Outcome for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryReport {
    pub category: Category,
    pub documents: usize,
    pub rows: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub categories: Vec<CategoryReport>,
}

impl IngestReport {
    pub fn documents(&self) -> usize {
        self.categories.iter().map(|c| c.documents).sum()
    }

    pub fn rows(&self) -> usize {
        self.categories.iter().map(|c| c.rows).sum()
    }
}

/// One load pass from a [`SourceTree`] into a [`Store`].
pub struct Ingestor<'a> {
    tree: &'a SourceTree,
    store: &'a mut Store,
    categories: Vec<Category>,
    replace: bool,
}

impl<'a> Ingestor<'a> {
    pub fn new(tree: &'a SourceTree, store: &'a mut Store) -> Self {
        Self {
            tree,
            store,
            categories: Category::ALL.to_vec(),
            replace: false,
        }
    }

    /// Restrict the pass to `categories`. An empty slice keeps the default
    /// of every category.
    pub fn categories(mut self, categories: &[Category]) -> Self {
        if !categories.is_empty() {
            let mut list = categories.to_vec();
            list.sort();
            list.dedup();
            self.categories = list;
        }
        self
    }

    /// Empty each category's table before loading it, in the same
    /// transaction as the load.
    pub fn replace(mut self, replace: bool) -> Self {
        self.replace = replace;
        self
    }

    pub fn run(self) -> Result<IngestReport> {
        info!(
            root = %self.tree.root().display(),
            categories = self.categories.len(),
            replace = self.replace,
            "ingest started"
        );
        let mut report = IngestReport::default();
        for &category in &self.categories {
            let _span = info_span!("ingest", category = %category).entered();

            let docs = self.tree.documents(category)?;
            let mut records: Vec<FlatRecord> = Vec::new();
            for doc in &docs {
                let before = records.len();
                records.extend(extract_document(doc)?);
                debug!(path = %doc.path.display(), rows = records.len() - before, "extracted");
            }

            let rows = if self.replace {
                self.store.replace(category, records)?
            } else {
                self.store.load(category, records)?
            };
            info!(documents = docs.len(), rows, "category done");

            report.categories.push(CategoryReport {
                category,
                documents: docs.len(),
                rows,
            });
        }
        Ok(report)
    }
}
