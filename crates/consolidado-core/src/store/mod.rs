//! Narrow interfaces over the external document and blob stores.
//!
//! The pipeline never talks to a concrete backend directly; it sees a
//! [`DocumentStore`] for work-order records and a [`BlobStore`] for file
//! bytes. [`memory`] provides in-process implementations for tests and the
//! CLI, [`http`] a reqwest-backed blob store for remote object storage.

mod http;
mod memory;

pub use http::HttpBlobStore;
pub use memory::{MemoryBlobStore, MemoryDocumentStore};

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;
use crate::model::{ConsolidationRecord, TechnicalReport, WorkOrder};

/// Read/update access to work-order records.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a work order by id.
    async fn work_order(&self, id: &str) -> Result<WorkOrder>;

    /// Fetch the most recently created technical report for a work order
    /// (creation time descending, limit 1).
    async fn latest_report(&self, work_order_id: &str) -> Result<Option<TechnicalReport>>;

    /// Write the consolidation fields back to the work order.
    async fn record_consolidation(
        &self,
        work_order_id: &str,
        record: ConsolidationRecord,
    ) -> Result<()>;
}

/// Object storage for file bytes, addressed by path on upload and by URL
/// on fetch.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload bytes at a path, returning a fetchable URL.
    ///
    /// Uploading to an existing path overwrites it; consolidated PDFs are
    /// regenerated in place with no versioning.
    async fn upload(&self, path: &str, bytes: Bytes, content_type: &str) -> Result<String>;

    /// Fetch the bytes behind a URL previously returned by this store (or
    /// recorded on a work order).
    async fn fetch(&self, url: &str) -> Result<Bytes>;
}
