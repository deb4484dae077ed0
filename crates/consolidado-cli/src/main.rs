//! Consolidado CLI - Generate a consolidated work-order PDF from local files.
//!
//! Inputs are read from disk (the work order as JSON, attachments and
//! photos as files) and served to the pipeline through in-memory stores,
//! so the tool works without any backend running.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use consolidado_core::{
    AppConfig, BlobStore, Consolidator, DocumentStore, MemoryBlobStore, MemoryDocumentStore,
    TechnicalReport, WorkOrder,
};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "consolidar")]
#[command(author, version, about = "Generate a consolidated work-order PDF", long_about = None)]
struct Args {
    /// Work order as a JSON file
    #[arg(required = true)]
    work_order: PathBuf,

    /// Uploaded order-of-work PDF (overrides the attachment URL in the JSON)
    #[arg(long)]
    order_pdf: Option<PathBuf>,

    /// Scanned remisión, PDF or image (overrides the attachment URL in the JSON)
    #[arg(long)]
    scan: Option<PathBuf>,

    /// Informe técnico as a JSON file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Directory with report photos; files are served as local://photos/<name>
    #[arg(long)]
    photos_dir: Option<PathBuf>,

    /// Output PDF file (default: <work-order-stem>-consolidado.pdf)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Recorded as the user who generated the consolidado
    #[arg(long, default_value = "cli")]
    actor: String,

    /// Generate only the informe técnico section
    #[arg(long)]
    informe_only: bool,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn local_url(prefix: &str, path: &std::path::Path) -> String {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("archivo");
    format!("local://{prefix}/{name}")
}

/// Register a local file in the blob store and return its URL.
async fn serve_file(blobs: &MemoryBlobStore, prefix: &str, path: &std::path::Path) -> Result<String> {
    let bytes =
        std::fs::read(path).context(format!("Failed to read file: {}", path.display()))?;
    let url = local_url(prefix, path);
    blobs.put_url(&url, bytes).await;
    Ok(url)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Setup logging
    let log_level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    // Load or create config
    let config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path).context("Failed to load config file")?
    } else {
        AppConfig::load()
    };

    // Load the work order
    let order_json = std::fs::read_to_string(&args.work_order).context(format!(
        "Failed to read work order: {}",
        args.work_order.display()
    ))?;
    let mut order: WorkOrder =
        serde_json::from_str(&order_json).context("Failed to parse work order JSON")?;
    let work_order_id = order.id.clone();

    let documents = Arc::new(MemoryDocumentStore::new());
    let blobs = Arc::new(MemoryBlobStore::new());

    // Local attachments replace whatever URLs the JSON carried; URLs that
    // stay are unreachable from this tool and will render as error pages.
    if let Some(path) = &args.order_pdf {
        order.attachments.order_url = Some(serve_file(&blobs, "adjuntos", path).await?);
    }
    if let Some(path) = &args.scan {
        order.attachments.scanned_url = Some(serve_file(&blobs, "adjuntos", path).await?);
    }

    if let Some(dir) = &args.photos_dir {
        let entries = std::fs::read_dir(dir)
            .context(format!("Failed to read photos dir: {}", dir.display()))?;
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                let url = serve_file(&blobs, "photos", &entry.path()).await?;
                info!("Serving photo {}", url);
            }
        }
    }

    if let Some(path) = &args.report {
        let report_json = std::fs::read_to_string(path)
            .context(format!("Failed to read report: {}", path.display()))?;
        let report: TechnicalReport =
            serde_json::from_str(&report_json).context("Failed to parse report JSON")?;
        documents.insert_report(&work_order_id, report).await;
    }

    documents.insert_order(order).await;

    let consolidator = Consolidator::new(
        Arc::clone(&documents) as Arc<dyn DocumentStore>,
        Arc::clone(&blobs) as Arc<dyn BlobStore>,
        config,
    );

    let output_bytes = if args.informe_only {
        consolidator
            .informe_pdf(&work_order_id)
            .await
            .context("Failed to generate informe PDF")?
    } else {
        let result = consolidator
            .generate(&work_order_id, &args.actor)
            .await
            .context("Failed to generate consolidado")?;

        info!("Generated {} ({} pages)", result.filename, result.page_count);
        for outcome in &result.sections {
            match &outcome.degraded {
                Some(reason) => info!(
                    "Section {}: {} page(s), degraded: {}",
                    outcome.section, outcome.pages, reason
                ),
                None => info!("Section {}: {} page(s)", outcome.section, outcome.pages),
            }
        }

        blobs
            .fetch(&result.url)
            .await
            .context("Failed to read generated consolidado")?
            .to_vec()
    };

    // Determine output path
    let output_path = args.output.unwrap_or_else(|| {
        let stem = args
            .work_order
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        args.work_order
            .with_file_name(format!("{stem}-consolidado.pdf"))
    });

    std::fs::write(&output_path, output_bytes)
        .context(format!("Failed to write output: {}", output_path.display()))?;

    // CLI output is intentional
    #[allow(clippy::print_stdout)]
    {
        println!("Consolidado saved to: {}", output_path.display());
    }

    Ok(())
}
