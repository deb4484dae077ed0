mod builder;
mod image;
pub mod pages;
mod text;

pub use builder::{A4_HEIGHT, A4_WIDTH, Color, DocumentBuilder, Font, PageCanvas};
pub use image::EmbeddedImage;
pub use text::word_wrap;
