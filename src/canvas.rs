use egui::ColorImage;
use image::RgbaImage;
use rayon::prelude::*;

// ============================================================================
// COLOR
// ============================================================================

/// Straight (non-premultiplied) RGBA color with components in `[0, 1]`.
///
/// When used as a brush color, `a` is the brush opacity, not a coverage value
/// of the destination.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_array(c: [f32; 4]) -> Self {
        Self::rgba(c[0], c[1], c[2], c[3])
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_rgba8(px: [u8; 4]) -> Self {
        Self::rgba(
            px[0] as f32 / 255.0,
            px[1] as f32 / 255.0,
            px[2] as f32 / 255.0,
            px[3] as f32 / 255.0,
        )
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        #[inline]
        fn q(v: f32) -> u8 {
            (v.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    /// `self * (1 - t) + other * t`, applied to all four channels.
    #[inline]
    pub fn lerp(self, other: Color, t: f32) -> Color {
        let s = 1.0 - t;
        Color::rgba(
            self.r * s + other.r * t,
            self.g * s + other.g * t,
            self.b * s + other.b * t,
            self.a * s + other.a * t,
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

// ============================================================================
// CANVAS — the paintable pixel grid
// ============================================================================

/// Mutable RGBA grid indexed by `(row, col)`.
///
/// Row 0 is the bottom of the texture (V = 0), matching the row order in
/// which the buffer is uploaded to the GPU.  The size is fixed at creation.
#[derive(Clone, Debug)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<[f32; 4]>,
}

impl Canvas {
    /// Create a canvas filled with `fill`.
    pub fn new(width: u32, height: u32, fill: Color) -> Self {
        let count = width as usize * height as usize;
        Self {
            width,
            height,
            pixels: vec![fill.to_array(); count],
        }
    }

    /// Build a canvas from an 8-bit image whose first row is already the
    /// bottom of the texture.
    pub fn from_rgba_image(img: &RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        let pixels = img
            .as_raw()
            .par_chunks_exact(4)
            .map(|px| Color::from_rgba8([px[0], px[1], px[2], px[3]]).to_array())
            .collect();
        Self { width, height, pixels }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn in_bounds(&self, row: i32, col: i32) -> bool {
        row >= 0 && col >= 0 && (row as u32) < self.height && (col as u32) < self.width
    }

    #[inline]
    fn index(&self, row: i32, col: i32) -> Option<usize> {
        if self.in_bounds(row, col) {
            Some(row as usize * self.width as usize + col as usize)
        } else {
            None
        }
    }

    /// Read a pixel.  `None` outside the grid.
    pub fn get(&self, row: i32, col: i32) -> Option<Color> {
        self.index(row, col).map(|i| Color::from_array(self.pixels[i]))
    }

    /// Overwrite a pixel.  Out-of-bounds targets are ignored.
    pub fn set(&mut self, row: i32, col: i32, color: Color) {
        if let Some(i) = self.index(row, col) {
            self.pixels[i] = color.to_array();
        }
    }

    /// Blend `color` onto the pixel at `(row, col)`:
    ///
    /// `dst = dst * (1 - color.a) + color * color.a`
    ///
    /// The lerp runs on all four channels, alpha included, so repeated
    /// strokes pull the stored alpha towards the brush alpha instead of
    /// accumulating coverage.  Out-of-bounds targets are a no-op.
    #[inline]
    pub fn blend_pixel(&mut self, row: i32, col: i32, color: Color) {
        if let Some(i) = self.index(row, col) {
            let existing = Color::from_array(self.pixels[i]);
            self.pixels[i] = existing.lerp(color, color.a).to_array();
        }
    }

    /// Replace every pixel from `other`.  Returns `false` (and changes
    /// nothing) when the sizes differ.
    pub fn copy_from(&mut self, other: &Canvas) -> bool {
        if other.width != self.width || other.height != self.height {
            return false;
        }
        self.pixels.copy_from_slice(&other.pixels);
        true
    }

    /// Packed RGBA8 bytes in canvas row order (row 0 first).  This is the
    /// layout the GPU texture expects.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = vec![0u8; self.pixels.len() * 4];
        out.par_chunks_exact_mut(4)
            .zip(self.pixels.par_iter())
            .for_each(|(dst, px)| dst.copy_from_slice(&Color::from_array(*px).to_rgba8()));
        out
    }

    /// egui image with the top of the texture first, for the flat view.
    pub fn to_color_image(&self) -> ColorImage {
        let row_len = self.width as usize;
        let mut rgba = vec![0u8; self.pixels.len() * 4];
        rgba.par_chunks_exact_mut(row_len * 4)
            .enumerate()
            .for_each(|(screen_row, dst)| {
                let src_row = self.height as usize - 1 - screen_row;
                let src = &self.pixels[src_row * row_len..(src_row + 1) * row_len];
                for (d, px) in dst.chunks_exact_mut(4).zip(src) {
                    d.copy_from_slice(&Color::from_array(*px).to_rgba8());
                }
            });
        ColorImage::from_rgba_unmultiplied([self.width as usize, self.height as usize], &rgba)
    }
}
