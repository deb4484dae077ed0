//! The consolidation pipeline orchestrator.
//!
//! One call produces one consolidated PDF: Order pages first, Remisión
//! pages second, Informe pages last. That order is a contract with
//! downstream consumers of the document. Every section always contributes
//! at least one page (real content, a synthesized summary, a placeholder,
//! or an error notice) so the document never has a hole.
//!
//! Failures inside a section degrade that section to an error page.
//! Failures outside them (serialization, upload, record update) propagate
//! to the caller; the record update runs last, so nothing is recorded
//! unless a blob was actually produced.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::cache::FetchCache;
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::model::{ConsolidationRecord, InformeStatus, NormalizedOrder, Photo, WorkOrder};
use crate::pdf::pages::{self, PhotoCell};
use crate::pdf::DocumentBuilder;
use crate::sections::{self, InformeContent, PagesAppended, RenderError, Section};
use crate::store::{BlobStore, DocumentStore};

/// How one section ended up in the generated document.
#[derive(Debug, Clone)]
pub struct SectionOutcome {
    pub section: Section,
    pub pages: usize,
    /// Present when the section was replaced by an error page.
    pub degraded: Option<String>,
}

/// Result of a successful pipeline run.
#[derive(Debug, Clone)]
pub struct Consolidated {
    /// Public URL of the uploaded consolidado.
    pub url: String,
    pub filename: String,
    pub page_count: usize,
    pub sections: Vec<SectionOutcome>,
}

/// High-level consolidation pipeline over a document store and a blob
/// store.
pub struct Consolidator {
    documents: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    cache: FetchCache,
    config: AppConfig,
}

impl Consolidator {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        config: AppConfig,
    ) -> Self {
        let cache = FetchCache::new(&config.cache);
        Self {
            documents,
            blobs,
            cache,
            config,
        }
    }

    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The attachment byte cache, exposed so callers can invalidate an
    /// entry after replacing an attachment.
    pub const fn cache(&self) -> &FetchCache {
        &self.cache
    }

    /// Generate the consolidated PDF for a work order, upload it, and
    /// record the result on the work-order record.
    ///
    /// Two concurrent regenerations of the same work order race on the
    /// same storage path and record fields; last write wins.
    pub async fn generate(&self, work_order_id: &str, actor: &str) -> Result<Consolidated> {
        info!("Generating consolidado for remision {}", work_order_id);

        let order = self.documents.work_order(work_order_id).await?;
        let normalized = NormalizedOrder::from_order(&order);

        // The two attachment reads are independent; fetching them
        // concurrently is an optimization, not a correctness requirement.
        let (order_fetch, scan_fetch) = futures::join!(
            self.fetch_optional(order.attachments.order_url.as_deref()),
            self.fetch_optional(order.attachments.scanned_url.as_deref()),
        );
        let scan_attachment = match (order.attachments.scanned_url.as_deref(), scan_fetch) {
            (Some(url), Some(fetched)) => Some((url, fetched)),
            _ => None,
        };

        let informe_input = self.load_informe(work_order_id).await;

        let mut builder = DocumentBuilder::new();
        let mut outcomes = Vec::with_capacity(3);

        let result = sections::assemble_order(&mut builder, &normalized, order_fetch);
        outcomes.push(settle(&mut builder, result)?);

        let result = sections::assemble_remision(&mut builder, scan_attachment);
        outcomes.push(settle(&mut builder, result)?);

        let result = match &informe_input {
            Ok(content) => sections::assemble_informe(&mut builder, &normalized, content.as_ref()),
            Err(e) => Err(RenderError {
                section: Section::Informe,
                message: e.to_string(),
            }),
        };
        outcomes.push(settle(&mut builder, result)?);

        let page_count = builder.page_count();
        let bytes = builder.finish()?;

        let filename = consolidated_filename(&order);
        let path = format!(
            "{}/{}/consolidado/{}",
            self.config.storage_prefix, work_order_id, filename
        );
        let url = self
            .blobs
            .upload(&path, Bytes::from(bytes), "application/pdf")
            .await?;

        self.documents
            .record_consolidation(
                work_order_id,
                ConsolidationRecord {
                    url: url.clone(),
                    filename: filename.clone(),
                    at: Utc::now(),
                    by: actor.to_string(),
                    status: InformeStatus::Consolidado,
                },
            )
            .await?;

        info!(
            "Consolidado for remision {} uploaded to {} ({} pages)",
            work_order_id, url, page_count
        );

        Ok(Consolidated {
            url,
            filename,
            page_count,
            sections: outcomes,
        })
    }

    /// Produce just the informe técnico section as a standalone PDF,
    /// without uploading or touching the work-order record.
    pub async fn informe_pdf(&self, work_order_id: &str) -> Result<Vec<u8>> {
        let order = self.documents.work_order(work_order_id).await?;
        let normalized = NormalizedOrder::from_order(&order);
        let content = self.load_informe(work_order_id).await?;

        let mut builder = DocumentBuilder::new();
        sections::assemble_informe(&mut builder, &normalized, content.as_ref())
            .map_err(|e| Error::PdfSave(e.message))?;
        builder.finish()
    }

    /// Latest report plus all of its photo bytes; per-photo fetch failures
    /// become empty cells rather than errors.
    async fn load_informe(&self, work_order_id: &str) -> Result<Option<InformeContent>> {
        let Some(report) = self.documents.latest_report(work_order_id).await? else {
            return Ok(None);
        };

        let before = self.photo_cells(&report.before_photos).await;
        let after = self.photo_cells(&report.after_photos).await;

        Ok(Some(InformeContent {
            report,
            before,
            after,
        }))
    }

    async fn photo_cells(&self, photos: &[Photo]) -> Vec<PhotoCell> {
        let mut cells = Vec::with_capacity(photos.len());
        for (i, photo) in photos.iter().enumerate() {
            let caption = photo
                .name
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| format!("Foto {}", i + 1));

            let bytes = match self.fetch_cached(&photo.url).await {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    warn!("Failed to fetch photo {}: {}", photo.url, e);
                    None
                }
            };

            cells.push(PhotoCell { caption, bytes });
        }
        cells
    }

    async fn fetch_optional(&self, url: Option<&str>) -> Option<Result<Bytes>> {
        match url {
            Some(url) => Some(self.fetch_cached(url).await),
            None => None,
        }
    }

    async fn fetch_cached(&self, url: &str) -> Result<Bytes> {
        if let Some(hit) = self.cache.get(url).await {
            debug!("Fetch cache hit for {}", url);
            return Ok(hit);
        }

        let bytes = self.blobs.fetch(url).await?;
        self.cache.insert(url, bytes.clone()).await;
        Ok(bytes)
    }
}

/// Convert a section result into pages: successes pass through, failures
/// append the section's error page and are reported as degraded.
fn settle(
    builder: &mut DocumentBuilder,
    result: std::result::Result<PagesAppended, RenderError>,
) -> Result<SectionOutcome> {
    match result {
        Ok(appended) => Ok(SectionOutcome {
            section: appended.section,
            pages: appended.pages,
            degraded: None,
        }),
        Err(err) => {
            warn!("{}", err);
            pages::error_page(builder, err.section.error_title(), &err.message)?;
            Ok(SectionOutcome {
                section: err.section,
                pages: 1,
                degraded: Some(err.message),
            })
        }
    }
}

/// `{orderNumber}_{vehicleId}.pdf`, with path-hostile characters replaced.
/// The UI validates these fields before invoking the pipeline; the
/// fallbacks here only keep the path well-formed.
fn consolidated_filename(order: &WorkOrder) -> String {
    let part = |value: &Option<String>, fallback: &str| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(fallback)
            .replace(['/', '\\', ' '], "_")
    };

    format!(
        "{}_{}.pdf",
        part(&order.order_number, "sin-orden"),
        part(&order.vehicle_id, "sin-movil")
    )
}
