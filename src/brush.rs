// ============================================================================
// BRUSH ENGINE — hard-edged disk stamps and stamped line segments
// ============================================================================

use crate::canvas::{Canvas, Color};
use crate::coords::ImagePixel;

pub const MIN_RADIUS: f32 = 1.0;
pub const MAX_RADIUS: f32 = 50.0;

/// Preset swatches shown in the settings window.  Picking one replaces
/// R, G, B and keeps the current opacity.
pub const PALETTE: [(&str, [f32; 3]); 4] = [
    ("white", [1.0, 1.0, 1.0]),
    ("pink", [0.749, 0.49, 0.498]),
    ("yellow", [0.965, 0.729, 0.106]),
    ("black", [0.0, 0.0, 0.0]),
];

/// Current brush, edited by the settings window and read at stamp time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BrushSettings {
    /// Radius in image pixels, kept in `[MIN_RADIUS, MAX_RADIUS]`.
    pub radius: f32,
    pub color: Color,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            radius: 5.0,
            color: Color::BLACK,
        }
    }
}

impl BrushSettings {
    pub fn new(radius: f32, color: Color) -> Self {
        Self {
            radius: clamp_radius(radius),
            color,
        }
    }

    pub fn set_radius(&mut self, radius: f32) {
        self.radius = clamp_radius(radius);
    }

    /// Apply a palette swatch: RGB only.
    pub fn apply_swatch(&mut self, rgb: [f32; 3]) {
        self.color.r = rgb[0];
        self.color.g = rgb[1];
        self.color.b = rgb[2];
    }
}

fn clamp_radius(radius: f32) -> f32 {
    if radius.is_nan() {
        return MIN_RADIUS;
    }
    radius.clamp(MIN_RADIUS, MAX_RADIUS)
}

/// Blend every pixel whose squared distance to `center` is `<= radius²`.
///
/// The bounding box is clipped to the canvas before iterating, so stamps
/// hanging over an edge only touch the part that is inside.
pub fn stamp_circle(canvas: &mut Canvas, center: ImagePixel, radius: f32, color: Color) {
    if canvas.width() == 0 || canvas.height() == 0 {
        return;
    }
    let cr = center.row as f32;
    let cc = center.col as f32;

    let min_col = ((cc - radius) as i32).max(0);
    let max_col = ((cc + radius) as i32).min(canvas.width() as i32 - 1);
    let min_row = ((cr - radius) as i32).max(0);
    let max_row = ((cr + radius) as i32).min(canvas.height() as i32 - 1);

    let radius_sq = radius * radius;

    for row in min_row..=max_row {
        let dy = row as f32 - cr;
        for col in min_col..=max_col {
            let dx = col as f32 - cc;
            if dx * dx + dy * dy <= radius_sq {
                canvas.blend_pixel(row, col, color);
            }
        }
    }
}

/// Walk the integer grid from `from` to `to` (Bresenham, error-term
/// stepping) and stamp a disk of radius `width / 2` at every visited cell.
///
/// Disks overlap along the segment and each one blends independently, so
/// translucent colors come out denser inside a stroke than a single stamp.
pub fn rasterize_line(
    canvas: &mut Canvas,
    from: ImagePixel,
    to: ImagePixel,
    width: f32,
    color: Color,
) {
    for cell in LineWalk::new(from, to) {
        stamp_circle(canvas, cell, width / 2.0, color);
    }
}

/// Integer grid cells from `start` to `end`, both inclusive.
pub struct LineWalk {
    col: i32,
    row: i32,
    end: ImagePixel,
    d_col: i32,
    d_row: i32,
    step_col: i32,
    step_row: i32,
    err: i32,
    done: bool,
}

impl LineWalk {
    pub fn new(start: ImagePixel, end: ImagePixel) -> Self {
        Self {
            col: start.col,
            row: start.row,
            end,
            d_col: (end.col - start.col).abs(),
            d_row: (end.row - start.row).abs(),
            step_col: if start.col < end.col { 1 } else { -1 },
            step_row: if start.row < end.row { 1 } else { -1 },
            err: (end.col - start.col).abs() - (end.row - start.row).abs(),
            done: false,
        }
    }
}

impl Iterator for LineWalk {
    type Item = ImagePixel;

    fn next(&mut self) -> Option<ImagePixel> {
        if self.done {
            return None;
        }
        let here = ImagePixel::new(self.row, self.col);
        if self.col == self.end.col && self.row == self.end.row {
            self.done = true;
            return Some(here);
        }
        let e2 = 2 * self.err;
        if e2 > -self.d_row {
            self.err -= self.d_row;
            self.col += self.step_col;
        }
        if e2 < self.d_col {
            self.err += self.d_col;
            self.row += self.step_row;
        }
        Some(here)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changed(canvas: &Canvas, base: Color) -> Vec<(i32, i32)> {
        let mut out = Vec::new();
        for row in 0..canvas.height() as i32 {
            for col in 0..canvas.width() as i32 {
                if canvas.get(row, col) != Some(base) {
                    out.push((row, col));
                }
            }
        }
        out
    }

    #[test]
    fn stamp_touches_exactly_the_closed_disk() {
        let mut c = Canvas::new(32, 32, Color::WHITE);
        let center = ImagePixel::new(10, 12);
        let r = 4.0;
        stamp_circle(&mut c, center, r, Color::BLACK);
        for row in 0..32 {
            for col in 0..32 {
                let dy = (row - center.row) as f32;
                let dx = (col - center.col) as f32;
                let expect_inside = dx * dx + dy * dy <= r * r;
                let is_black = c.get(row, col) == Some(Color::BLACK);
                assert_eq!(is_black, expect_inside, "pixel ({row}, {col})");
            }
        }
        // closed disk: the four axis extremes are included
        assert_eq!(c.get(14, 12), Some(Color::BLACK));
        assert_eq!(c.get(10, 16), Some(Color::BLACK));
    }

    #[test]
    fn stamp_over_the_corner_is_clipped() {
        let mut c = Canvas::new(8, 8, Color::WHITE);
        stamp_circle(&mut c, ImagePixel::new(0, 0), 3.0, Color::BLACK);
        let hits = changed(&c, Color::WHITE);
        assert!(!hits.is_empty());
        for (row, col) in hits {
            assert!(row * row + col * col <= 9);
        }

        // fully outside: nothing happens
        let mut c = Canvas::new(8, 8, Color::WHITE);
        stamp_circle(&mut c, ImagePixel::new(-20, 40), 5.0, Color::BLACK);
        assert!(changed(&c, Color::WHITE).is_empty());
    }

    #[test]
    fn single_press_scenario_draws_radius_five_disk() {
        let mut c = Canvas::new(100, 100, Color::WHITE);
        let brush = BrushSettings::default();
        stamp_circle(&mut c, ImagePixel::new(50, 50), brush.radius, brush.color);
        for row in 0..100 {
            for col in 0..100 {
                let d2 = (row - 50) * (row - 50) + (col - 50) * (col - 50);
                let px = c.get(row, col).unwrap();
                if d2 <= 25 {
                    assert_eq!(px, Color::BLACK);
                } else {
                    assert_eq!(px, Color::WHITE);
                }
            }
        }
    }

    #[test]
    fn zero_length_line_is_one_stamp() {
        let mut line = Canvas::new(20, 20, Color::WHITE);
        let mut stamp = Canvas::new(20, 20, Color::WHITE);
        let half = Color::rgba(0.0, 0.0, 0.0, 0.5);
        let p = ImagePixel::new(7, 9);
        rasterize_line(&mut line, p, p, 6.0, half);
        stamp_circle(&mut stamp, p, 3.0, half);
        assert_eq!(changed(&line, Color::WHITE), changed(&stamp, Color::WHITE));
        assert_eq!(line.get(7, 9), stamp.get(7, 9));
        assert_eq!(LineWalk::new(p, p).count(), 1);
    }

    #[test]
    fn line_walk_visits_endpoints_in_order() {
        let a = ImagePixel::new(2, 1);
        let b = ImagePixel::new(5, 9);
        let cells: Vec<_> = LineWalk::new(a, b).collect();
        assert_eq!(cells.first(), Some(&a));
        assert_eq!(cells.last(), Some(&b));
        // x-major line: one cell per column
        assert_eq!(cells.len(), 9);
        for pair in cells.windows(2) {
            assert!((pair[1].col - pair[0].col).abs() <= 1);
            assert!((pair[1].row - pair[0].row).abs() <= 1);
        }

        let back: Vec<_> = LineWalk::new(b, a).collect();
        assert_eq!(back.first(), Some(&b));
        assert_eq!(back.last(), Some(&a));
    }

    #[test]
    fn overlapping_stamps_compound() {
        let mut c = Canvas::new(20, 20, Color::WHITE);
        let half = Color::rgba(0.0, 0.0, 0.0, 0.5);
        rasterize_line(&mut c, ImagePixel::new(10, 5), ImagePixel::new(10, 6), 4.0, half);
        // covered by both disks -> blended twice
        assert!((c.get(10, 5).unwrap().r - 0.25).abs() < 1e-6);
        // only reached by the first disk
        assert!((c.get(10, 3).unwrap().r - 0.5).abs() < 1e-6);
    }

    #[test]
    fn settings_clamp_radius_and_keep_alpha_on_swatch() {
        let mut b = BrushSettings::new(80.0, Color::rgba(0.0, 0.0, 0.0, 0.3));
        assert_eq!(b.radius, MAX_RADIUS);
        b.set_radius(0.0);
        assert_eq!(b.radius, MIN_RADIUS);
        b.apply_swatch(PALETTE[2].1);
        assert_eq!(b.color, Color::rgba(0.965, 0.729, 0.106, 0.3));
    }
}
