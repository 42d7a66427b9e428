//! Index maintenance.
//!
//! Every mutation is one engine write followed by one commit. A full reindex
//! walks each record type in batches and commits per batch.

mod document;

pub use document::{
    Document, MapRecord, Mapper, MapperRegistry, Record, document_id, to_document,
};

use crate::client::SearchEngine;
use crate::config::IndexingConfig;
use crate::Result;
use std::time::Instant;

/// Query matching every document.
const ALL_DOCUMENTS: &str = "*:*";

/// A batch of records.
pub type RecordBatch = Vec<Box<dyn Record>>;

/// Supplies persisted records for full reindexing.
pub trait RecordSource {
    /// Record types to index, in order.
    fn record_types(&self) -> Vec<String>;

    /// Streams records of `record_type` in batches of at most `batch_size`.
    ///
    /// # Errors
    ///
    /// Yields an error if records cannot be loaded.
    fn batches<'a>(
        &'a self,
        record_type: &str,
        batch_size: usize,
    ) -> Box<dyn Iterator<Item = Result<RecordBatch>> + 'a>;
}

/// Counts from a full reindex.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Batches written.
    pub batches: usize,
    /// Documents written.
    pub documents: usize,
}

/// Keeps an engine's index in step with persisted records.
pub struct Indexer<'a, E: SearchEngine> {
    engine: &'a E,
    registry: MapperRegistry,
    batch_size: usize,
}

impl<'a, E: SearchEngine> Indexer<'a, E> {
    /// Creates an indexer without custom mappers.
    #[must_use]
    pub fn new(engine: &'a E, config: &IndexingConfig) -> Self {
        Self {
            engine,
            registry: MapperRegistry::new(),
            batch_size: config.batch_size.max(1),
        }
    }

    /// Replaces the mapper registry.
    #[must_use]
    pub fn with_registry(mut self, registry: MapperRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Adds or replaces one record.
    ///
    /// # Errors
    ///
    /// Returns an error if the write or the commit fails.
    pub fn index_record(&self, record: &dyn Record) -> Result<()> {
        let doc = to_document(record, &self.registry);
        self.engine.add(std::slice::from_ref(&doc))?;
        self.engine.commit()?;
        tracing::debug!(id = %document_id(record), "Indexed record");
        Ok(())
    }

    /// Removes one record.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete or the commit fails.
    pub fn delete_record(&self, record: &dyn Record) -> Result<()> {
        let id = document_id(record);
        self.engine.delete_by_query(&id_query(&id))?;
        self.engine.commit()?;
        tracing::debug!(id = %id, "Deleted record from index");
        Ok(())
    }

    /// Removes every document.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete or the commit fails.
    pub fn wipe_index(&self) -> Result<()> {
        self.engine.delete_by_query(ALL_DOCUMENTS)?;
        self.engine.commit()?;
        tracing::info!(engine = self.engine.name(), "Wiped index");
        Ok(())
    }

    /// Indexes every record from `source`, one add and commit per batch.
    ///
    /// Stops at the first failing batch; earlier batches stay committed.
    ///
    /// # Errors
    ///
    /// Returns an error if loading a batch, a write or a commit fails.
    pub fn reindex_all(&self, source: &dyn RecordSource) -> Result<IndexStats> {
        let start = Instant::now();
        let mut stats = IndexStats::default();

        for record_type in source.record_types() {
            for batch in source.batches(&record_type, self.batch_size) {
                let batch = batch?;
                if batch.is_empty() {
                    continue;
                }
                let docs: Vec<Document> = batch
                    .iter()
                    .map(|record| to_document(record.as_ref(), &self.registry))
                    .collect();
                self.engine.add(&docs)?;
                self.engine.commit()?;

                stats.batches += 1;
                stats.documents += docs.len();
                tracing::debug!(
                    record_type = %record_type,
                    batch = stats.batches,
                    documents = docs.len(),
                    "Indexed batch"
                );
            }
        }

        tracing::info!(
            batches = stats.batches,
            documents = stats.documents,
            duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Reindex complete"
        );
        Ok(stats)
    }

    /// Wipes the index, then reindexes everything.
    ///
    /// # Errors
    ///
    /// Returns an error if the wipe or the reindex fails.
    pub fn wipe_and_reindex_all(&self, source: &dyn RecordSource) -> Result<IndexStats> {
        self.wipe_index()?;
        self.reindex_all(source)
    }
}

/// Exact-match query on the `id` field; the id is quoted so spaces and
/// query syntax inside it stay literal.
fn id_query(id: &str) -> String {
    let mut query = String::with_capacity(id.len() + 5);
    query.push_str("id:\"");
    for c in id.chars() {
        if matches!(c, '"' | '\\') {
            query.push('\\');
        }
        query.push(c);
    }
    query.push('"');
    query
}

/// In-memory record source holding records grouped by type.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    records: Vec<MapRecord>,
}

impl MemorySource {
    /// Creates a source over `records`.
    #[must_use]
    pub const fn new(records: Vec<MapRecord>) -> Self {
        Self { records }
    }
}

impl RecordSource for MemorySource {
    fn record_types(&self) -> Vec<String> {
        let mut types: Vec<String> = Vec::new();
        for record in &self.records {
            if !types.iter().any(|t| t == record.record_type()) {
                types.push(record.record_type().to_string());
            }
        }
        types
    }

    fn batches<'a>(
        &'a self,
        record_type: &str,
        batch_size: usize,
    ) -> Box<dyn Iterator<Item = Result<RecordBatch>> + 'a> {
        let matching: Vec<&MapRecord> = self
            .records
            .iter()
            .filter(|r| r.record_type() == record_type)
            .collect();
        let batches: Vec<Result<RecordBatch>> = matching
            .chunks(batch_size.max(1))
            .map(|chunk| {
                Ok(chunk
                    .iter()
                    .map(|r| Box::new((*r).clone()) as Box<dyn Record>)
                    .collect())
            })
            .collect();
        Box::new(batches.into_iter())
    }
}
