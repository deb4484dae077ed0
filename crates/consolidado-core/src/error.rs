use thiserror::Error;

/// Unified error type for consolidado-core
///
/// This enum encompasses all error cases that can occur in the library:
/// - PDF operations (parsing, page copy, serialization)
/// - Image operations (decode, embed)
/// - Byte fetch over HTTP
/// - Store operations (document lookups/updates, blob upload)
/// - Configuration loading
/// - General I/O operations
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // PDF Errors
    // ==========================================================================
    /// Failed to parse an input PDF
    #[error("failed to parse PDF: {0}")]
    PdfParse(String),

    /// Failed to copy pages from an input PDF
    #[error("failed to copy PDF pages: {0}")]
    PdfCopy(String),

    /// Failed to serialize the consolidated PDF
    #[error("failed to save PDF: {0}")]
    PdfSave(String),

    // ==========================================================================
    // Image Errors
    // ==========================================================================
    /// Image bytes could not be decoded as PNG or JPEG
    #[error("failed to decode image: {0}")]
    ImageDecode(String),

    // ==========================================================================
    // Fetch Errors
    // ==========================================================================
    /// Attachment fetch failed at the transport level
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// Attachment fetch returned a non-success status
    #[error("fetch of {url} returned HTTP {status}")]
    FetchStatus { url: String, status: u16 },

    // ==========================================================================
    // Store Errors
    // ==========================================================================
    /// Work order not found in the document store
    #[error("work order not found: {0}")]
    WorkOrderNotFound(String),

    /// Document store update failed
    #[error("document store update failed: {0}")]
    StoreWrite(String),

    /// Blob store upload failed
    #[error("blob upload failed: {0}")]
    BlobUpload(String),

    /// Blob store has no object at the requested URL
    #[error("blob not found: {0}")]
    BlobNotFound(String),

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
