//! Page builders for the synthesized sections of the consolidado.
//!
//! Each builder lays out one logical unit (summary, informe body, photo
//! grid, full-page image, placeholder, error notice) on A4 pages. They
//! draw from already-fetched data only; all storage access happens in the
//! pipeline before these run.

use bytes::Bytes;
use tracing::warn;

use crate::error::Result;
use crate::model::{NormalizedOrder, TechnicalReport, format_date};

use super::builder::{A4_HEIGHT, A4_WIDTH, Color, DocumentBuilder, Font, PageCanvas};
use super::text::word_wrap;

// =============================================================================
// Layout Constants
// =============================================================================

/// Left margin shared by every synthesized page (in points).
const MARGIN_X: f32 = 50.0;

/// Lowest baseline the informe body may use before breaking the page.
const BODY_BOTTOM_MARGIN: f32 = 60.0;

/// First baseline on informe continuation pages.
const CONTINUATION_TOP: f32 = A4_HEIGHT - 80.0;

/// Line step for wrapped body text (in points).
const BODY_LINE_HEIGHT: f32 = 18.0;

/// Character width of wrapped description/observation text.
const DESCRIPTION_WRAP_WIDTH: usize = 65;

/// Character width of wrapped placeholder/error messages.
const MESSAGE_WRAP_WIDTH: usize = 60;

/// Photo cell size in the 2×2 grid (in points).
const PHOTO_WIDTH: f32 = 220.0;
const PHOTO_HEIGHT: f32 = 160.0;

/// Gap between photo cells (in points).
const PHOTO_SPACING: f32 = 20.0;

/// Vertical room reserved under each photo row for its captions.
const CAPTION_BAND: f32 = 50.0;

/// Baseline offset of a caption below its photo.
const CAPTION_OFFSET: f32 = 15.0;

/// Photos per grid page (2×2).
const PHOTOS_PER_PAGE: usize = 4;

/// Bottom edge of the first photo row.
const GRID_FIRST_ROW_Y: f32 = A4_HEIGHT - 80.0 - PHOTO_HEIGHT;

// =============================================================================
// Palette
// =============================================================================

const BLACK: Color = Color::new(0.0, 0.0, 0.0);
const HEADER_RED: Color = Color::new(0.8, 0.0, 0.0);
const TITLE_BLUE: Color = Color::new(0.0, 0.0, 0.8);
const SUBTITLE_GREY: Color = Color::new(0.3, 0.3, 0.3);
const NOTE_GREY: Color = Color::new(0.5, 0.5, 0.5);
const PLACEHOLDER_GREY: Color = Color::new(0.6, 0.6, 0.6);
const ERROR_LABEL_RED: Color = Color::new(0.6, 0.0, 0.0);
const ERROR_TEXT_RED: Color = Color::new(0.5, 0.0, 0.0);
const BORDER_GREY: Color = Color::new(0.8, 0.8, 0.8);

// =============================================================================
// Order Summary
// =============================================================================

/// Synthesize the one-page order summary used when no order PDF was
/// uploaded: a red header, the labeled work-order fields, and a footnote
/// explaining why the page exists.
pub fn order_summary_page(builder: &mut DocumentBuilder, order: &NormalizedOrder) -> Result<()> {
    let mut canvas = PageCanvas::new();

    canvas.text(
        Font::Bold,
        20.0,
        MARGIN_X,
        A4_HEIGHT - 80.0,
        HEADER_RED,
        "ORDEN DE TRABAJO - NO ADJUNTA",
    );
    canvas.text(
        Font::Regular,
        14.0,
        MARGIN_X,
        A4_HEIGHT - 110.0,
        SUBTITLE_GREY,
        "Resumen de datos de la orden",
    );

    let rows: [(&str, &str); 11] = [
        ("N° de Orden:", &order.order_number),
        ("Remisión:", &order.remision_number),
        ("Móvil:", &order.vehicle_id),
        ("Estado:", &order.state),
        ("Fecha Remisión:", &order.remision_date),
        ("Técnico 1:", &order.technicians[0]),
        ("Técnico 2:", &order.technicians[1]),
        ("Técnico 3:", &order.technicians[2]),
        ("Subtotal:", &order.subtotal),
        ("Total:", &order.total),
        ("Generado por:", &order.generated_by),
    ];

    let mut y = A4_HEIGHT - 160.0;
    for (label, value) in rows {
        canvas.text(Font::Bold, 12.0, MARGIN_X, y, BLACK, label);
        canvas.text(Font::Regular, 12.0, 200.0, y, BLACK, value);
        y -= 25.0;
    }

    canvas.text(
        Font::Regular,
        10.0,
        MARGIN_X,
        100.0,
        NOTE_GREY,
        "NOTA: Esta página fue generada automáticamente porque no se adjuntó",
    );
    canvas.text(
        Font::Regular,
        10.0,
        MARGIN_X,
        85.0,
        NOTE_GREY,
        "el archivo PDF de la orden de trabajo original.",
    );

    builder.push_page(canvas)
}

// =============================================================================
// Informe Header + Body
// =============================================================================

/// Render the informe técnico title, identifying fields and wrapped
/// description/observations. Overflowing text continues on further pages
/// with the same margins. Returns the number of pages produced.
pub fn informe_pages(
    builder: &mut DocumentBuilder,
    order: &NormalizedOrder,
    report: &TechnicalReport,
) -> Result<usize> {
    let mut canvas = PageCanvas::new();
    let mut pages = 0;

    canvas.text(
        Font::Bold,
        20.0,
        MARGIN_X,
        A4_HEIGHT - 80.0,
        TITLE_BLUE,
        "INFORME TÉCNICO",
    );

    let report_date = report.created_at.map(format_date).unwrap_or_default();
    let info_rows: [(&str, &str); 4] = [
        ("N° de Orden:", &order.order_number),
        ("Remisión:", &order.remision_number),
        ("Móvil:", &order.vehicle_id),
        ("Fecha:", &report_date),
    ];

    let mut y = A4_HEIGHT - 120.0;
    for (label, value) in info_rows {
        canvas.text(
            Font::Regular,
            12.0,
            MARGIN_X,
            y,
            BLACK,
            &format!("{label} {value}"),
        );
        y -= 20.0;
    }

    y -= 20.0;
    write_heading(
        builder,
        &mut canvas,
        &mut y,
        &mut pages,
        "DESCRIPCIÓN DE TRABAJOS REALIZADOS:",
        30.0,
    )?;
    write_body(builder, &mut canvas, &mut y, &mut pages, &report.work_description)?;

    if let Some(notes) = report.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        y -= 20.0;
        write_heading(builder, &mut canvas, &mut y, &mut pages, "OBSERVACIONES:", 25.0)?;
        write_body(builder, &mut canvas, &mut y, &mut pages, notes)?;
    }

    builder.push_page(canvas)?;
    Ok(pages + 1)
}

/// Start a new page when the cursor has dropped below the body margin.
fn break_page(
    builder: &mut DocumentBuilder,
    canvas: &mut PageCanvas,
    y: &mut f32,
    pages: &mut usize,
) -> Result<()> {
    if *y < BODY_BOTTOM_MARGIN {
        builder.push_page(std::mem::take(canvas))?;
        *pages += 1;
        *y = CONTINUATION_TOP;
    }
    Ok(())
}

fn write_heading(
    builder: &mut DocumentBuilder,
    canvas: &mut PageCanvas,
    y: &mut f32,
    pages: &mut usize,
    heading: &str,
    advance: f32,
) -> Result<()> {
    break_page(builder, canvas, y, pages)?;
    canvas.text(Font::Bold, 14.0, MARGIN_X, *y, BLACK, heading);
    *y -= advance;
    Ok(())
}

fn write_body(
    builder: &mut DocumentBuilder,
    canvas: &mut PageCanvas,
    y: &mut f32,
    pages: &mut usize,
    text: &str,
) -> Result<()> {
    for line in word_wrap(text, DESCRIPTION_WRAP_WIDTH) {
        break_page(builder, canvas, y, pages)?;
        canvas.text(Font::Regular, 11.0, MARGIN_X, *y, BLACK, &line);
        *y -= BODY_LINE_HEIGHT;
    }
    Ok(())
}

// =============================================================================
// Photo Grid
// =============================================================================

/// One cell of a photo grid: the caption plus the fetched bytes, or
/// `None` when the fetch already failed.
#[derive(Debug, Clone)]
pub struct PhotoCell {
    pub caption: String,
    pub bytes: Option<Bytes>,
}

/// Lay photos out four to a page in a 2×2 grid, one page per chunk, with
/// `"(Cont.)"` appended to the title from the second page on. A cell whose
/// bytes are missing or fail to embed renders as an empty bordered
/// rectangle; the rest of the page is unaffected. Returns pages produced.
#[allow(clippy::cast_precision_loss)]
pub fn photo_grid_pages(
    builder: &mut DocumentBuilder,
    title: &str,
    photos: &[PhotoCell],
) -> Result<usize> {
    let mut pages = 0;

    for (chunk_index, chunk) in photos.chunks(PHOTOS_PER_PAGE).enumerate() {
        let mut canvas = PageCanvas::new();

        let page_title = if chunk_index == 0 {
            title.to_string()
        } else {
            format!("{title} (Cont.)")
        };
        canvas.text(
            Font::Bold,
            16.0,
            MARGIN_X,
            A4_HEIGHT - 60.0,
            TITLE_BLUE,
            &page_title,
        );

        for (i, cell) in chunk.iter().enumerate() {
            let col = (i % 2) as f32;
            let row = (i / 2) as f32;
            let x = MARGIN_X + col * (PHOTO_WIDTH + PHOTO_SPACING);
            let y = GRID_FIRST_ROW_Y - row * (PHOTO_HEIGHT + PHOTO_SPACING + CAPTION_BAND);

            let embedded = cell.bytes.as_ref().and_then(|bytes| {
                builder
                    .embed_image(bytes)
                    .map_err(|e| warn!("Skipping photo '{}': {}", cell.caption, e))
                    .ok()
            });

            match embedded {
                Some(image) => {
                    canvas.draw_image(&image, x, y, PHOTO_WIDTH, PHOTO_HEIGHT);
                    canvas.text(
                        Font::Regular,
                        9.0,
                        x,
                        y - CAPTION_OFFSET,
                        SUBTITLE_GREY,
                        &cell.caption,
                    );
                }
                None => {
                    canvas.stroke_rect(x, y, PHOTO_WIDTH, PHOTO_HEIGHT, BORDER_GREY, 1.0);
                }
            }
        }

        builder.push_page(canvas)?;
        pages += 1;
    }

    Ok(pages)
}

// =============================================================================
// Full-Page Image
// =============================================================================

/// Embed one image scaled to fit the page, centered, under a title bar.
/// Used for scanned remisiones uploaded as images.
pub fn full_page_image(builder: &mut DocumentBuilder, bytes: &[u8], title: &str) -> Result<()> {
    let image = builder.embed_image(bytes)?;

    let scale = ((A4_WIDTH - 100.0) / image.width).min((A4_HEIGHT - 150.0) / image.height);
    let scaled_width = image.width * scale;
    let scaled_height = image.height * scale;
    let x = (A4_WIDTH - scaled_width) / 2.0;
    let y = (A4_HEIGHT - scaled_height) / 2.0;

    let mut canvas = PageCanvas::new();
    canvas.draw_image(&image, x, y, scaled_width, scaled_height);
    canvas.text(
        Font::Bold,
        16.0,
        MARGIN_X,
        A4_HEIGHT - 50.0,
        TITLE_BLUE,
        title,
    );

    builder.push_page(canvas)
}

// =============================================================================
// Placeholder / Error
// =============================================================================

/// A titled page with a word-wrapped message, for sections whose input was
/// simply absent.
pub fn placeholder_page(builder: &mut DocumentBuilder, title: &str, message: &str) -> Result<()> {
    let mut canvas = PageCanvas::new();

    canvas.text(
        Font::Bold,
        20.0,
        MARGIN_X,
        A4_HEIGHT - 200.0,
        PLACEHOLDER_GREY,
        title,
    );

    let mut y = A4_HEIGHT - 250.0;
    for line in word_wrap(message, MESSAGE_WRAP_WIDTH) {
        canvas.text(Font::Regular, 12.0, MARGIN_X, y, NOTE_GREY, &line);
        y -= 20.0;
    }

    builder.push_page(canvas)
}

/// The error variant: warning colors and an explicit "Error:" label before
/// the message. Appended when a section's content failed to load.
pub fn error_page(builder: &mut DocumentBuilder, title: &str, message: &str) -> Result<()> {
    let mut canvas = PageCanvas::new();

    canvas.text(
        Font::Bold,
        18.0,
        MARGIN_X,
        A4_HEIGHT - 200.0,
        HEADER_RED,
        title,
    );
    canvas.text(
        Font::Bold,
        14.0,
        MARGIN_X,
        A4_HEIGHT - 240.0,
        ERROR_LABEL_RED,
        "Error:",
    );

    let mut y = A4_HEIGHT - 270.0;
    for line in word_wrap(message, MESSAGE_WRAP_WIDTH) {
        canvas.text(Font::Regular, 11.0, MARGIN_X, y, ERROR_TEXT_RED, &line);
        y -= BODY_LINE_HEIGHT;
    }

    builder.push_page(canvas)
}
