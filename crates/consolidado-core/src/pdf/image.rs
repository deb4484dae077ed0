//! Photo and scan embedding.
//!
//! Attachments arrive as raw bytes with no trustworthy content type, so
//! decoding mirrors the upload path's expectations: PNG is attempted
//! first, then JPEG. JPEG bytes pass through untouched under DCTDecode;
//! everything else is re-encoded as a raw RGB image object (flate-packed
//! when the document is compressed on save).

use image::{DynamicImage, ImageFormat};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::error::{Error, Result};

/// An image XObject registered in the output document.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedImage {
    pub(crate) id: ObjectId,
    /// Pixel width of the source image.
    pub width: f32,
    /// Pixel height of the source image.
    pub height: f32,
}

pub(crate) fn embed_image(doc: &mut Document, bytes: &[u8]) -> Result<EmbeddedImage> {
    if let Ok(img) = image::load_from_memory_with_format(bytes, ImageFormat::Png) {
        return embed_rgb(doc, &img);
    }

    match image::load_from_memory_with_format(bytes, ImageFormat::Jpeg) {
        Ok(img) => embed_jpeg(doc, bytes, &img),
        Err(e) => Err(Error::ImageDecode(format!(
            "bytes are neither PNG nor JPEG: {e}"
        ))),
    }
}

fn image_dict(width: u32, height: u32, color_space: &[u8]) -> Dictionary {
    Dictionary::from_iter([
        ("Type", Object::Name(b"XObject".to_vec())),
        ("Subtype", Object::Name(b"Image".to_vec())),
        ("Width", Object::Integer(i64::from(width))),
        ("Height", Object::Integer(i64::from(height))),
        ("ColorSpace", Object::Name(color_space.to_vec())),
        ("BitsPerComponent", Object::Integer(8)),
    ])
}

/// Decode to 8-bit RGB and embed the raw samples. Alpha is dropped;
/// scans and photos do not use it.
fn embed_rgb(doc: &mut Document, img: &DynamicImage) -> Result<EmbeddedImage> {
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();

    let dict = image_dict(width, height, b"DeviceRGB");
    let id = doc.add_object(Stream::new(dict, rgb.into_raw()));

    #[allow(clippy::cast_precision_loss)]
    Ok(EmbeddedImage {
        id,
        width: width as f32,
        height: height as f32,
    })
}

/// Embed the original JPEG bytes under DCTDecode, avoiding a lossy
/// re-encode. The decoded image is only used for dimensions and color.
fn embed_jpeg(doc: &mut Document, bytes: &[u8], img: &DynamicImage) -> Result<EmbeddedImage> {
    let (width, height) = (img.width(), img.height());

    let color_space: &[u8] = match img.color() {
        image::ColorType::L8 | image::ColorType::L16 => b"DeviceGray",
        _ => b"DeviceRGB",
    };

    let mut dict = image_dict(width, height, color_space);
    dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));

    let mut stream = Stream::new(dict, bytes.to_vec());
    // Already compressed; the document-level compress pass must not touch it.
    stream.allows_compression = false;
    let id = doc.add_object(stream);

    #[allow(clippy::cast_precision_loss)]
    Ok(EmbeddedImage {
        id,
        width: width as f32,
        height: height as f32,
    })
}
