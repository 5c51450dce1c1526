// ============================================================================
// IMAGE SOURCE — decode the texture image into a canvas
// ============================================================================

use std::path::Path;

use image::RgbaImage;

use crate::canvas::Canvas;

/// Error type for texture loading
#[derive(Debug)]
pub enum LoadError {
    Io(std::io::Error),
    Decode(String),
    /// Zero-sized images cannot back a texture.
    Empty,
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Io(e) => write!(f, "I/O error: {}", e),
            LoadError::Decode(e) => write!(f, "Decode error: {}", e),
            LoadError::Empty => write!(f, "Image has zero width or height"),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        LoadError::Io(e)
    }
}

impl From<image::ImageError> for LoadError {
    fn from(e: image::ImageError) -> Self {
        match e {
            image::ImageError::IoError(io) => LoadError::Io(io),
            other => LoadError::Decode(other.to_string()),
        }
    }
}

/// Load an image file as a canvas.  Rows are flipped so that canvas row 0
/// is the bottom of the picture (V = 0).
pub fn load_canvas(path: &Path) -> Result<Canvas, LoadError> {
    let img = image::open(path)?.into_rgba8();
    canvas_from_image(img)
}

/// Same as [`load_canvas`] for already-decoded pixels (top row first).
pub fn canvas_from_image(mut img: RgbaImage) -> Result<Canvas, LoadError> {
    if img.width() == 0 || img.height() == 0 {
        return Err(LoadError::Empty);
    }
    image::imageops::flip_vertical_in_place(&mut img);
    Ok(Canvas::from_rgba_image(&img))
}
