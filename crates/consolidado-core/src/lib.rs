//! Consolidado Core Library
//!
//! This library builds the consolidated work-order PDF for a remisión:
//! - Work-order / remisión / informe técnico section assembly
//! - Verbatim page copy from attached PDFs, image embedding for scans
//! - Synthesized summary, placeholder and error pages
//! - Attachment byte caching (in-memory)
//! - Pluggable document and blob stores

pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod pdf;
pub mod pipeline;
pub mod sections;
pub mod store;

pub use cache::FetchCache;
pub use config::{AppConfig, CacheConfig, FetchConfig};
pub use error::{Error, Result};
pub use model::{
    Attachments, ConsolidationRecord, InformeStatus, NormalizedOrder, Photo, TechnicalReport,
    WorkOrder, format_currency, format_date,
};
pub use pdf::{A4_HEIGHT, A4_WIDTH, DocumentBuilder};
pub use pipeline::{Consolidated, Consolidator, SectionOutcome};
pub use sections::{InformeContent, PagesAppended, RenderError, Section};
pub use store::{
    BlobStore, DocumentStore, HttpBlobStore, MemoryBlobStore, MemoryDocumentStore,
};
