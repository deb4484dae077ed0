//! Section assemblers for the three fixed parts of a consolidado.
//!
//! Each assembler appends one section's pages to the output document and
//! reports the result as `Result<PagesAppended, RenderError>`. A
//! `RenderError` never aborts the pipeline: the orchestrator appends the
//! section's error page in place of the intended content and keeps going,
//! so a bad input degrades one section, not the whole document.
//!
//! All bytes arrive prefetched; assemblers never touch the network.

use bytes::Bytes;

use crate::error::Error;
use crate::model::{NormalizedOrder, TechnicalReport};
use crate::pdf::DocumentBuilder;
use crate::pdf::pages::{self, PhotoCell};

/// The three consolidado sections, in their fixed document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Order,
    Remision,
    Informe,
}

impl Section {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Order => "orden",
            Self::Remision => "remision",
            Self::Informe => "informe",
        }
    }

    /// Title of the error page appended when this section fails.
    pub const fn error_title(self) -> &'static str {
        match self {
            Self::Order => "Error cargando Orden de Trabajo",
            Self::Remision => "Error cargando Remisión Escaneada",
            Self::Informe => "Error cargando Informe Técnico",
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Success report of one assembler.
#[derive(Debug, Clone, Copy)]
pub struct PagesAppended {
    pub section: Section,
    pub pages: usize,
}

/// Failure of one assembler, carrying the message rendered on the
/// section's error page.
#[derive(Debug, Clone)]
pub struct RenderError {
    pub section: Section,
    pub message: String,
}

impl RenderError {
    fn new(section: Section, error: &Error) -> Self {
        Self {
            section,
            message: error.to_string(),
        }
    }
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "section {} failed: {}", self.section, self.message)
    }
}

/// Prefetched informe inputs: the report plus its photo bytes. Photos
/// whose fetch failed carry `bytes: None` and render as empty cells.
#[derive(Debug, Clone)]
pub struct InformeContent {
    pub report: TechnicalReport,
    pub before: Vec<PhotoCell>,
    pub after: Vec<PhotoCell>,
}

/// Orden de trabajo: copy the uploaded PDF verbatim, or synthesize the
/// summary page when nothing was uploaded.
pub fn assemble_order(
    builder: &mut DocumentBuilder,
    order: &NormalizedOrder,
    fetched: Option<crate::error::Result<Bytes>>,
) -> Result<PagesAppended, RenderError> {
    let section = Section::Order;

    let pages = match fetched {
        Some(Ok(bytes)) => builder
            .append_pdf(&bytes)
            .map_err(|e| RenderError::new(section, &e))?,
        Some(Err(e)) => return Err(RenderError::new(section, &e)),
        None => {
            pages::order_summary_page(builder, order)
                .map_err(|e| RenderError::new(section, &e))?;
            1
        }
    };

    Ok(PagesAppended { section, pages })
}

/// Remisión escaneada: copy a PDF verbatim, embed an image full-page, or
/// append the placeholder when no scan was attached.
pub fn assemble_remision(
    builder: &mut DocumentBuilder,
    attachment: Option<(&str, crate::error::Result<Bytes>)>,
) -> Result<PagesAppended, RenderError> {
    let section = Section::Remision;

    let pages = match attachment {
        Some((url, fetched)) => {
            let bytes = fetched.map_err(|e| RenderError::new(section, &e))?;
            if is_pdf(url, &bytes) {
                builder
                    .append_pdf(&bytes)
                    .map_err(|e| RenderError::new(section, &e))?
            } else {
                pages::full_page_image(builder, &bytes, "Remisión Escaneada")
                    .map_err(|e| RenderError::new(section, &e))?;
                1
            }
        }
        None => {
            pages::placeholder_page(
                builder,
                "Remisión No Adjunta",
                "La remisión escaneada no fue adjuntada al momento de generar este consolidado.",
            )
            .map_err(|e| RenderError::new(section, &e))?;
            1
        }
    };

    Ok(PagesAppended { section, pages })
}

/// Informe técnico: description pages, then the before/after photo grids
/// (each only when non-empty), or the placeholder when no report exists.
pub fn assemble_informe(
    builder: &mut DocumentBuilder,
    order: &NormalizedOrder,
    content: Option<&InformeContent>,
) -> Result<PagesAppended, RenderError> {
    let section = Section::Informe;

    let Some(content) = content else {
        pages::placeholder_page(
            builder,
            "Informe Técnico No Creado",
            "El informe técnico no ha sido creado para esta remisión.",
        )
        .map_err(|e| RenderError::new(section, &e))?;
        return Ok(PagesAppended { section, pages: 1 });
    };

    let mut pages = pages::informe_pages(builder, order, &content.report)
        .map_err(|e| RenderError::new(section, &e))?;

    if !content.before.is_empty() {
        pages += pages::photo_grid_pages(builder, "FOTOS ANTES", &content.before)
            .map_err(|e| RenderError::new(section, &e))?;
    }
    if !content.after.is_empty() {
        pages += pages::photo_grid_pages(builder, "FOTOS DESPUÉS", &content.after)
            .map_err(|e| RenderError::new(section, &e))?;
    }

    Ok(PagesAppended { section, pages })
}

/// Decide whether a scanned attachment is a PDF: by URL extension first
/// (matching the upload convention), with a magic-bytes sniff for URLs
/// that carry no extension.
fn is_pdf(url: &str, bytes: &[u8]) -> bool {
    url.to_lowercase().contains(".pdf") || bytes.starts_with(b"%PDF")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Rgb};
    use std::io::Cursor;

    fn jpeg_bytes() -> Bytes {
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(20, 30, Rgb([128, 128, 128]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Jpeg).unwrap();
        Bytes::from(out.into_inner())
    }

    fn normalized() -> NormalizedOrder {
        NormalizedOrder::from_order(&crate::model::WorkOrder {
            id: "r1".to_string(),
            order_number: Some("1001".to_string()),
            ..Default::default()
        })
    }

    #[test]
    fn test_order_without_attachment_synthesizes_summary() {
        let mut builder = DocumentBuilder::new();
        let appended = assemble_order(&mut builder, &normalized(), None).unwrap();
        assert_eq!(appended.pages, 1);
        assert_eq!(builder.page_count(), 1);
    }

    #[test]
    fn test_order_fetch_failure_is_a_render_error() {
        let mut builder = DocumentBuilder::new();
        let fetch_err = Error::FetchStatus {
            url: "https://storage/orden.pdf".to_string(),
            status: 404,
        };
        let err = assemble_order(&mut builder, &normalized(), Some(Err(fetch_err))).unwrap_err();
        assert_eq!(err.section, Section::Order);
        assert!(err.message.contains("404"));
        // Nothing was appended; the orchestrator adds the error page.
        assert_eq!(builder.page_count(), 0);
    }

    #[test]
    fn test_remision_image_becomes_full_page() {
        let mut builder = DocumentBuilder::new();
        let appended = assemble_remision(
            &mut builder,
            Some(("https://storage/remision.jpg", Ok(jpeg_bytes()))),
        )
        .unwrap();
        assert_eq!(appended.pages, 1);
    }

    #[test]
    fn test_remision_absent_gets_placeholder() {
        let mut builder = DocumentBuilder::new();
        let appended = assemble_remision(&mut builder, None).unwrap();
        assert_eq!(appended.pages, 1);
        assert_eq!(builder.page_count(), 1);
    }

    #[test]
    fn test_remision_corrupt_pdf_is_a_render_error() {
        let mut builder = DocumentBuilder::new();
        let err = assemble_remision(
            &mut builder,
            Some(("https://storage/scan.pdf", Ok(Bytes::from_static(b"junk")))),
        )
        .unwrap_err();
        assert_eq!(err.section, Section::Remision);
    }

    #[test]
    fn test_informe_missing_gets_placeholder() {
        let mut builder = DocumentBuilder::new();
        let appended = assemble_informe(&mut builder, &normalized(), None).unwrap();
        assert_eq!(appended.pages, 1);
    }

    #[test]
    fn test_informe_with_photos() {
        let mut builder = DocumentBuilder::new();
        let content = InformeContent {
            report: TechnicalReport {
                work_description: "Cambio de aceite".to_string(),
                ..Default::default()
            },
            before: vec![PhotoCell {
                caption: "antes_1.jpg".to_string(),
                bytes: Some(jpeg_bytes()),
            }],
            after: vec![
                PhotoCell {
                    caption: "despues_1.jpg".to_string(),
                    bytes: Some(jpeg_bytes()),
                },
                PhotoCell {
                    caption: "despues_2.jpg".to_string(),
                    bytes: None,
                },
            ],
        };
        let appended = assemble_informe(&mut builder, &normalized(), Some(&content)).unwrap();
        // 1 description page + 1 before grid + 1 after grid.
        assert_eq!(appended.pages, 3);
        assert_eq!(builder.page_count(), 3);
    }

    #[test]
    fn test_is_pdf_detection() {
        assert!(is_pdf("https://x/scan.PDF?tok=1", b"junk"));
        assert!(is_pdf("https://x/blob/abc123", b"%PDF-1.4 ..."));
        assert!(!is_pdf("https://x/scan.jpg", b"\xff\xd8\xff"));
    }
}
