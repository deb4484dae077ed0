use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::model::{ConsolidationRecord, TechnicalReport, WorkOrder};

use super::{BlobStore, DocumentStore};

/// In-memory document store backed by a `HashMap`.
///
/// Used by the CLI (which assembles its inputs from local files) and by
/// tests. Reports are kept per work order in insertion order; the latest
/// one wins by `created_at`.
#[derive(Default)]
pub struct MemoryDocumentStore {
    orders: RwLock<HashMap<String, WorkOrder>>,
    reports: RwLock<HashMap<String, Vec<TechnicalReport>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_order(&self, order: WorkOrder) {
        self.orders.write().await.insert(order.id.clone(), order);
    }

    pub async fn insert_report(&self, work_order_id: &str, report: TechnicalReport) {
        self.reports
            .write()
            .await
            .entry(work_order_id.to_string())
            .or_default()
            .push(report);
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn work_order(&self, id: &str) -> Result<WorkOrder> {
        self.orders
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| Error::WorkOrderNotFound(id.to_string()))
    }

    async fn latest_report(&self, work_order_id: &str) -> Result<Option<TechnicalReport>> {
        let reports = self.reports.read().await;
        let Some(list) = reports.get(work_order_id) else {
            return Ok(None);
        };

        // Creation time descending; reports without a timestamp sort last.
        let latest = list
            .iter()
            .max_by_key(|r| r.created_at.map_or(i64::MIN, |t| t.timestamp_millis()))
            .cloned();
        Ok(latest)
    }

    async fn record_consolidation(
        &self,
        work_order_id: &str,
        record: ConsolidationRecord,
    ) -> Result<()> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(work_order_id)
            .ok_or_else(|| Error::StoreWrite(format!("no work order {work_order_id}")))?;

        order.consolidated_url = Some(record.url);
        order.consolidated_filename = Some(record.filename);
        order.consolidated_at = Some(record.at);
        order.consolidated_by = Some(record.by);
        order.status = record.status;
        Ok(())
    }
}

/// In-memory blob store. Uploads are addressable both by the `memory://`
/// URL returned from [`BlobStore::upload`] and, for test convenience, by
/// any URL registered with [`MemoryBlobStore::put_url`].
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: RwLock<HashMap<String, Bytes>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register bytes under an arbitrary URL (e.g. a fake attachment URL).
    pub async fn put_url(&self, url: &str, bytes: impl Into<Bytes>) {
        self.objects.write().await.insert(url.to_string(), bytes.into());
    }

    /// Bytes stored at an upload path, if any.
    pub async fn bytes_at_path(&self, path: &str) -> Option<Bytes> {
        self.objects.read().await.get(&url_for_path(path)).cloned()
    }
}

fn url_for_path(path: &str) -> String {
    format!("memory://{}", urlencoding::encode(path))
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, path: &str, bytes: Bytes, _content_type: &str) -> Result<String> {
        let url = url_for_path(path);
        self.objects.write().await.insert(url.clone(), bytes);
        Ok(url)
    }

    async fn fetch(&self, url: &str) -> Result<Bytes> {
        self.objects
            .read()
            .await
            .get(url)
            .cloned()
            .ok_or_else(|| Error::BlobNotFound(url.to_string()))
    }
}
