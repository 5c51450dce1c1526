// ============================================================================
// COORDINATE SPACES — screen pixels, normalized texture space, image pixels
// ============================================================================
//
//   screen   (x, y)     window framebuffer pixels, origin top-left
//   texture  (u, v)     [0,1]², origin bottom-left (V flipped vs. screen)
//   image    (row, col) canvas index space, row 0 = V 0

/// Framebuffer size of one view, in physical pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FramebufferSize {
    pub width: f32,
    pub height: f32,
}

impl FramebufferSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// A pixel position inside one specific view.  Only meaningful together
/// with that view's [`FramebufferSize`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Normalized texture coordinate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Uv {
    pub u: f32,
    pub v: f32,
}

impl Uv {
    pub fn new(u: f32, v: f32) -> Self {
        Self { u, v }
    }
}

/// Canvas index.  Signed so that unclamped mappings can land outside the
/// grid; the canvas clips those.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImagePixel {
    pub row: i32,
    pub col: i32,
}

impl ImagePixel {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }
}

/// `u = x / w`, `v = 1 - y / h`.  No clamping.
pub fn screen_to_texture(p: ScreenPoint, fb: FramebufferSize) -> Uv {
    Uv {
        u: p.x / fb.width,
        v: 1.0 - p.y / fb.height,
    }
}

/// `col = floor(u * width)`, `row = floor(v * height)`.  No clamping.
pub fn texture_to_image_pixel(uv: Uv, image_width: u32, image_height: u32) -> ImagePixel {
    ImagePixel {
        row: (uv.v * image_height as f32).floor() as i32,
        col: (uv.u * image_width as f32).floor() as i32,
    }
}

/// Screen point of the flat texture view straight to a canvas index.
pub fn screen_to_image_pixel(
    p: ScreenPoint,
    fb: FramebufferSize,
    image_width: u32,
    image_height: u32,
) -> ImagePixel {
    texture_to_image_pixel(screen_to_texture(p, fb), image_width, image_height)
}
