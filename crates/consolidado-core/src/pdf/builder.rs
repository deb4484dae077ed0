//! Consolidated-document assembly over lopdf.
//!
//! # Coordinate System
//!
//! PDF uses a **bottom-left origin** coordinate system where:
//! - (0, 0) is at the bottom-left corner of the page
//! - X increases to the right
//! - Y increases upward
//!
//! All synthesized pages are A4 (595×842 pt). Copied pages keep their
//! original media box untouched.
//!
//! # Page order
//!
//! Pages enter the document strictly in call order, whether synthesized
//! through a [`PageCanvas`] or copied verbatim with
//! [`DocumentBuilder::append_pdf`]. The page tree is only materialized in
//! [`DocumentBuilder::finish`], which is also where the document is
//! compressed and serialized.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::error::{Error, Result};

use super::image::{EmbeddedImage, embed_image};

/// ISO A4 width in points.
pub const A4_WIDTH: f32 = 595.0;
/// ISO A4 height in points.
pub const A4_HEIGHT: f32 = 842.0;

/// RGB color with components in 0.0–1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

/// The two standard fonts every synthesized page carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    const fn resource_name(self) -> &'static str {
        match self {
            Self::Regular => "F1",
            Self::Bold => "F2",
        }
    }
}

/// Accumulates drawing operations for one synthesized A4 page.
///
/// A canvas knows nothing about storage or layout policy; the page
/// builders in [`super::pages`] decide positions and the canvas emits the
/// corresponding content-stream operators.
pub struct PageCanvas {
    ops: Vec<Operation>,
    /// Image XObjects referenced by this page: (resource name, object id).
    xobjects: Vec<(String, ObjectId)>,
}

impl PageCanvas {
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            xobjects: Vec::new(),
        }
    }

    /// Draw a single line of text at a baseline position.
    pub fn text(&mut self, font: Font, size: f32, x: f32, y: f32, color: Color, text: &str) {
        self.ops.push(Operation::new("BT", vec![]));
        self.ops.push(Operation::new(
            "Tf",
            vec![
                Object::Name(font.resource_name().into()),
                Object::Real(size),
            ],
        ));
        self.ops.push(Operation::new(
            "rg",
            vec![
                Object::Real(color.r),
                Object::Real(color.g),
                Object::Real(color.b),
            ],
        ));
        self.ops.push(Operation::new(
            "Td",
            vec![Object::Real(x), Object::Real(y)],
        ));
        self.ops.push(Operation::new(
            "Tj",
            vec![Object::String(
                encode_win_ansi(text),
                StringFormat::Literal,
            )],
        ));
        self.ops.push(Operation::new("ET", vec![]));
    }

    /// Stroke an empty rectangle (used for failed photo cells).
    pub fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color, line_width: f32) {
        self.ops.push(Operation::new("q", vec![]));
        self.ops.push(Operation::new(
            "RG",
            vec![
                Object::Real(color.r),
                Object::Real(color.g),
                Object::Real(color.b),
            ],
        ));
        self.ops
            .push(Operation::new("w", vec![Object::Real(line_width)]));
        self.ops.push(Operation::new(
            "re",
            vec![
                Object::Real(x),
                Object::Real(y),
                Object::Real(w),
                Object::Real(h),
            ],
        ));
        self.ops.push(Operation::new("S", vec![]));
        self.ops.push(Operation::new("Q", vec![]));
    }

    /// Paint a previously embedded image into the given rectangle.
    /// (x, y) is the bottom-left corner.
    pub fn draw_image(&mut self, image: &EmbeddedImage, x: f32, y: f32, w: f32, h: f32) {
        let name = format!("Im{}", self.xobjects.len() + 1);
        self.xobjects.push((name.clone(), image.id));

        self.ops.push(Operation::new("q", vec![]));
        self.ops.push(Operation::new(
            "cm",
            vec![
                Object::Real(w),
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(h),
                Object::Real(x),
                Object::Real(y),
            ],
        ));
        self.ops
            .push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
        self.ops.push(Operation::new("Q", vec![]));
    }
}

impl Default for PageCanvas {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the consolidated PDF: synthesized pages and verbatim copies of
/// input PDFs, in strict call order.
pub struct DocumentBuilder {
    doc: Document,
    /// Page dictionaries in final order; `Parent` is set in `finish`.
    pages: Vec<(ObjectId, Dictionary)>,
    font_regular: ObjectId,
    font_bold: ObjectId,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");

        let font_regular = doc.add_object(standard_font("Helvetica"));
        let font_bold = doc.add_object(standard_font("Helvetica-Bold"));

        Self {
            doc,
            pages: Vec::new(),
            font_regular,
            font_bold,
        }
    }

    /// Number of pages added so far.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Decode image bytes (PNG first, then JPEG) and embed them as an
    /// XObject usable by [`PageCanvas::draw_image`].
    pub fn embed_image(&mut self, bytes: &[u8]) -> Result<EmbeddedImage> {
        embed_image(&mut self.doc, bytes)
    }

    /// Close a canvas and append it as the next A4 page.
    pub fn push_page(&mut self, canvas: PageCanvas) -> Result<()> {
        let content = Content {
            operations: canvas.ops,
        };
        let encoded = content
            .encode()
            .map_err(|e| Error::PdfSave(format!("Failed to encode page content: {e}")))?;
        let content_id = self.doc.add_object(Stream::new(Dictionary::new(), encoded));

        let mut fonts = Dictionary::new();
        fonts.set(
            Font::Regular.resource_name(),
            Object::Reference(self.font_regular),
        );
        fonts.set(
            Font::Bold.resource_name(),
            Object::Reference(self.font_bold),
        );

        let mut resources = Dictionary::new();
        resources.set("Font", Object::Dictionary(fonts));
        if !canvas.xobjects.is_empty() {
            let mut xobjects = Dictionary::new();
            for (name, id) in canvas.xobjects {
                xobjects.set(name, Object::Reference(id));
            }
            resources.set("XObject", Object::Dictionary(xobjects));
        }

        let page = Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            (
                "MediaBox",
                Object::Array(vec![
                    0.into(),
                    0.into(),
                    Object::Real(A4_WIDTH),
                    Object::Real(A4_HEIGHT),
                ]),
            ),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Dictionary(resources)),
        ]);

        let page_id = self.doc.new_object_id();
        self.pages.push((page_id, page));
        Ok(())
    }

    /// Copy every page of an input PDF into the document, verbatim.
    ///
    /// Pages keep their content streams, sizes and resources untouched.
    /// Attributes a source page inherits from its page tree (Resources,
    /// MediaBox, CropBox, Rotate) are flattened onto the page first, since
    /// the source tree is not carried over. Returns the number of pages
    /// appended.
    pub fn append_pdf(&mut self, bytes: &[u8]) -> Result<usize> {
        let mut src = Document::load_mem(bytes)
            .map_err(|e| Error::PdfParse(format!("Failed to load PDF: {e}")))?;

        src.renumber_objects_with(self.doc.max_id + 1);

        let src_pages = src.get_pages();
        if src_pages.is_empty() {
            return Err(Error::PdfCopy("input PDF has no pages".to_string()));
        }

        // Flatten every page before touching self, so a bad page leaves
        // the output document unchanged.
        let mut copied = Vec::with_capacity(src_pages.len());
        for page_id in src_pages.values() {
            copied.push((*page_id, flattened_page_dict(&src, *page_id)?));
        }
        let appended = copied.len();
        self.pages.extend(copied);

        for (object_id, object) in src.objects {
            match object.type_name().unwrap_or(b"") {
                b"Catalog" | b"Pages" | b"Page" | b"Outlines" | b"Outline" => {}
                _ => {
                    self.doc.objects.insert(object_id, object);
                }
            }
        }

        self.doc.max_id = self.doc.max_id.max(src.max_id);
        Ok(appended)
    }

    /// Materialize the page tree and serialize the document.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        if self.pages.is_empty() {
            return Err(Error::PdfSave("document has no pages".to_string()));
        }

        let pages_id = self.doc.new_object_id();

        let kids: Vec<Object> = self
            .pages
            .iter()
            .map(|(id, _)| Object::Reference(*id))
            .collect();

        for (page_id, mut dict) in self.pages {
            dict.set("Parent", Object::Reference(pages_id));
            self.doc.objects.insert(page_id, Object::Dictionary(dict));
        }

        let page_count =
            i64::try_from(kids.len()).map_err(|_| Error::PdfSave("page count overflow".into()))?;
        let pages_dict = Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(page_count)),
        ]);
        self.doc
            .objects
            .insert(pages_id, Object::Dictionary(pages_dict));

        let catalog_id = self.doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        self.doc.renumber_objects();
        self.doc.compress();

        let mut output = Vec::new();
        self.doc
            .save_to(&mut output)
            .map_err(|e| Error::PdfSave(format!("Failed to save PDF: {e}")))?;

        Ok(output)
    }
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn standard_font(base_font: &str) -> Dictionary {
    Dictionary::from_iter([
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(base_font.as_bytes().to_vec())),
        ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
    ])
}

/// Page attributes that may live on an ancestor Pages node instead of the
/// page itself.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Clone a source page dictionary with inherited attributes resolved onto
/// it and its `Parent` link removed.
fn flattened_page_dict(src: &Document, page_id: ObjectId) -> Result<Dictionary> {
    let page = src
        .get_object(page_id)
        .and_then(Object::as_dict)
        .map_err(|e| Error::PdfCopy(format!("Failed to read page object: {e}")))?;

    let mut dict = page.clone();
    dict.remove(b"Parent");

    for key in INHERITABLE_KEYS {
        if dict.has(key) {
            continue;
        }
        if let Some(value) = lookup_inherited(src, page, key) {
            dict.set(key.to_vec(), value);
        }
    }

    Ok(dict)
}

/// Walk the Parent chain looking for an inheritable attribute.
fn lookup_inherited<'a>(src: &'a Document, mut dict: &'a Dictionary, key: &[u8]) -> Option<Object> {
    // Bounded walk in case of a cyclic Parent chain in a corrupt file.
    for _ in 0..32 {
        let Ok(Object::Reference(parent_id)) = dict.get(b"Parent") else {
            return None;
        };
        let Ok(parent) = src.get_object(*parent_id).and_then(Object::as_dict) else {
            return None;
        };
        if let Ok(value) = parent.get(key) {
            return Some(value.clone());
        }
        dict = parent;
    }
    None
}

/// Encode text for the WinAnsi (Windows-1252) encoded standard fonts.
///
/// Latin-1 characters map straight through, which covers the Spanish
/// accents and signs the pages use; a handful of Windows-1252 specials are
/// mapped explicitly and anything else degrades to '?'.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '€' => 0x80,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '–' => 0x96,
            '—' => 0x97,
            _ => {
                let cp = c as u32;
                u8::try_from(cp).unwrap_or(b'?')
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn minimal_pdf(pages: usize, page_text: &str) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let page_tree_id = doc.new_object_id();

        let font_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(b"Helvetica".to_vec())),
        ]));

        let resources_id = doc.add_object(Dictionary::from_iter([(
            "Font",
            Object::Dictionary(Dictionary::from_iter([(
                "F1",
                Object::Reference(font_id),
            )])),
        )]));

        let mut kids = Vec::new();
        for i in 0..pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![100.into(), 700.into()]),
                    Operation::new(
                        "Tj",
                        vec![Object::string_literal(format!("{page_text} {i}"))],
                    ),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));

            // Resources deliberately inherited from the page tree node.
            let page_id = doc.add_object(Dictionary::from_iter([
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(page_tree_id)),
                ("Contents", Object::Reference(content_id)),
            ]));
            kids.push(Object::Reference(page_id));
        }

        let page_tree = Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(i64::try_from(pages).unwrap())),
            ("Resources", Object::Reference(resources_id)),
            (
                "MediaBox",
                Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]),
            ),
        ]);
        doc.objects
            .insert(page_tree_id, Object::Dictionary(page_tree));

        let catalog_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(page_tree_id)),
        ]));
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut output = Vec::new();
        doc.save_to(&mut output).unwrap();
        output
    }

    #[test]
    fn test_synthesized_page_roundtrip() {
        let mut builder = DocumentBuilder::new();
        let mut canvas = PageCanvas::new();
        canvas.text(
            Font::Bold,
            20.0,
            50.0,
            A4_HEIGHT - 80.0,
            Color::new(0.0, 0.0, 0.0),
            "Página de prueba",
        );
        builder.push_page(canvas).unwrap();

        let bytes = builder.finish().unwrap();
        assert!(bytes.starts_with(b"%PDF"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_append_pdf_copies_all_pages_in_order() {
        let source = minimal_pdf(2, "Source page");

        let mut builder = DocumentBuilder::new();
        let appended = builder.append_pdf(&source).unwrap();
        assert_eq!(appended, 2);

        let mut canvas = PageCanvas::new();
        canvas.text(
            Font::Regular,
            12.0,
            50.0,
            400.0,
            Color::new(0.0, 0.0, 0.0),
            "after",
        );
        builder.push_page(canvas).unwrap();

        let bytes = builder.finish().unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 3);

        // Copied pages keep their original media box; the synthesized page
        // is A4. That distinguishes the copied pages (1, 2) from page 3.
        let first_page = doc
            .get_object(pages[&1])
            .and_then(Object::as_dict)
            .unwrap();
        let media_box = first_page.get(b"MediaBox").unwrap();
        let Object::Array(values) = media_box else {
            panic!("MediaBox should be an array");
        };
        assert_eq!(values[2], Object::Integer(612));
    }

    #[test]
    fn test_copied_page_content_is_verbatim() {
        let source = minimal_pdf(1, "Verbatim");
        let src_doc = Document::load_mem(&source).unwrap();
        let src_pages = src_doc.get_pages();
        let src_content = src_doc.get_page_content(src_pages[&1]).unwrap();

        let mut builder = DocumentBuilder::new();
        builder.append_pdf(&source).unwrap();
        let bytes = builder.finish().unwrap();

        let out_doc = Document::load_mem(&bytes).unwrap();
        let out_pages = out_doc.get_pages();
        let out_content = out_doc.get_page_content(out_pages[&1]).unwrap();

        assert_eq!(src_content, out_content);
    }

    #[test]
    fn test_append_invalid_pdf_fails() {
        let mut builder = DocumentBuilder::new();
        assert!(builder.append_pdf(b"not a pdf").is_err());
    }

    #[test]
    fn test_finish_empty_document_fails() {
        let builder = DocumentBuilder::new();
        assert!(builder.finish().is_err());
    }

    #[test]
    fn test_encode_win_ansi_spanish() {
        let encoded = encode_win_ansi("Remisión — DESPUÉS");
        assert_eq!(encoded[6], 0xF3); // ó
        assert!(encoded.contains(&0x97)); // em dash
        assert!(encoded.contains(&0xC9)); // É
        assert_eq!(encoded.len(), 18);
    }

    #[test]
    fn test_encode_win_ansi_unmappable_degrades() {
        assert_eq!(encode_win_ansi("日"), vec![b'?']);
    }
}
