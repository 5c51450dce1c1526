// ============================================================================
// SURFACE PICKING — screen pixel over the 3D view -> texture UV
// ============================================================================
//
// The model is rendered into an offscreen float target with a shader that
// writes each fragment's texture coordinate as its color: (u, v, 0, 1).
// The target is cleared to alpha 0 first, so alpha tells hit from
// background.  Picking reads back the single texel under the cursor.
//
// `gpu::picking` owns the GPU side; this module holds the contract and the
// texel decoding so both can be exercised without a device.

use crate::coords::{ScreenPoint, Uv};

/// Resolves a screen pixel of the 3D view to the UV of the visible surface
/// fragment, or `None` when the pixel shows background.
pub trait SurfacePicker {
    fn pick(&mut self, at: ScreenPoint) -> Option<Uv>;
}

impl<P: SurfacePicker + ?Sized> SurfacePicker for &mut P {
    fn pick(&mut self, at: ScreenPoint) -> Option<Uv> {
        (**self).pick(at)
    }
}

/// Alpha threshold separating "geometry written here" from the cleared
/// background.  Any fragment writes exactly 1.0.
const HIT_ALPHA: f32 = 0.5;

/// Decode one texel of the UV pass.
///
/// UVs outside `[0, 1)` (tiling meshes, values exactly on a seam) wrap the
/// same way the repeat-mode sampler does, so the painted pixel is the one
/// the viewer sees.
pub fn decode_uv_texel(texel: [f32; 4]) -> Option<Uv> {
    let [u, v, _, a] = texel;
    if !(a >= HIT_ALPHA) || !u.is_finite() || !v.is_finite() {
        return None;
    }
    Some(Uv::new(wrap_unit(u), wrap_unit(v)))
}

#[inline]
fn wrap_unit(x: f32) -> f32 {
    let w = x.rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs
    if w >= 1.0 { 0.0 } else { w }
}

/// A UV image already resident in memory, laid out row-major with row 0
/// at the top of the view (the same order the GPU read-back produces).
///
/// Used as a deterministic picker for tests and by callers that capture the
/// whole UV pass at once.
#[derive(Clone, Debug)]
pub struct UvBuffer {
    width: u32,
    height: u32,
    texels: Vec<[f32; 4]>,
}

impl UvBuffer {
    /// An all-background buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            texels: vec![[0.0; 4]; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Mark `(x, y)` as covered by a fragment with the given UV.
    pub fn write(&mut self, x: u32, y: u32, uv: Uv) {
        if x < self.width && y < self.height {
            self.texels[y as usize * self.width as usize + x as usize] = [uv.u, uv.v, 0.0, 1.0];
        }
    }

    pub fn texel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        if x < self.width && y < self.height {
            Some(self.texels[y as usize * self.width as usize + x as usize])
        } else {
            None
        }
    }
}

impl SurfacePicker for UvBuffer {
    fn pick(&mut self, at: ScreenPoint) -> Option<Uv> {
        let (x, y) = texel_coords(at, self.width, self.height)?;
        self.texel(x, y).and_then(decode_uv_texel)
    }
}

/// Integer texel under a screen point, or `None` outside the target.
pub fn texel_coords(at: ScreenPoint, width: u32, height: u32) -> Option<(u32, u32)> {
    if !(at.x >= 0.0 && at.y >= 0.0) {
        return None;
    }
    let x = at.x.floor() as u32;
    let y = at.y.floor() as u32;
    if x < width && y < height { Some((x, y)) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleared_texel_is_a_miss() {
        assert_eq!(decode_uv_texel([0.0, 0.0, 0.0, 0.0]), None);
        assert_eq!(decode_uv_texel([0.3, 0.7, 0.0, 0.0]), None);
    }

    #[test]
    fn covered_texel_decodes_uv() {
        assert_eq!(decode_uv_texel([0.25, 0.75, 0.0, 1.0]), Some(Uv::new(0.25, 0.75)));
        assert_eq!(decode_uv_texel([0.0, 0.0, 0.0, 1.0]), Some(Uv::new(0.0, 0.0)));
    }

    #[test]
    fn out_of_range_uv_wraps_into_unit_square() {
        let uv = decode_uv_texel([1.25, -0.25, 0.0, 1.0]).unwrap();
        assert!((uv.u - 0.25).abs() < 1e-6);
        assert!((uv.v - 0.75).abs() < 1e-6);
        let uv = decode_uv_texel([1.0, -1e-9, 0.0, 1.0]).unwrap();
        assert!(uv.u >= 0.0 && uv.u < 1.0);
        assert!(uv.v >= 0.0 && uv.v < 1.0);
        assert_eq!(decode_uv_texel([f32::NAN, 0.5, 0.0, 1.0]), None);
    }

    #[test]
    fn buffer_picker_hits_inside_silhouette_only() {
        let mut buf = UvBuffer::new(16, 16);
        for y in 4..12 {
            for x in 4..12 {
                buf.write(x, y, Uv::new(x as f32 / 16.0, 1.0 - y as f32 / 16.0));
            }
        }
        assert_eq!(buf.pick(ScreenPoint::new(1.0, 1.0)), None);
        assert_eq!(buf.pick(ScreenPoint::new(-3.0, 5.0)), None);
        assert_eq!(buf.pick(ScreenPoint::new(40.0, 5.0)), None);

        let uv = buf.pick(ScreenPoint::new(8.4, 6.9)).unwrap();
        assert!((0.0..=1.0).contains(&uv.u));
        assert!((0.0..=1.0).contains(&uv.v));
        assert_eq!(uv, Uv::new(0.5, 1.0 - 6.0 / 16.0));
    }
}
