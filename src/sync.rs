// ============================================================================
// GPU SYNC — push the whole canvas to its display textures after edits
// ============================================================================
//
// No dirty rectangles: every flush re-uploads the full buffer.  Stroke rate
// is bounded by that transfer.

use crate::canvas::Canvas;

/// Anything that can take "replace all pixels from this canvas".
pub trait TextureSink {
    fn replace_all(&mut self, canvas: &Canvas);
}

/// Tracks whether the canvas changed since the last upload.
#[derive(Debug, Default)]
pub struct GpuSyncBridge {
    dirty: bool,
}

impl GpuSyncBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Upload the canvas to every sink if anything changed.  Returns `true`
    /// when an upload happened.
    pub fn flush(&mut self, canvas: &Canvas, sinks: &mut [&mut dyn TextureSink]) -> bool {
        if !self.dirty {
            return false;
        }
        for sink in sinks.iter_mut() {
            sink.replace_all(canvas);
        }
        self.dirty = false;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Color;

    #[derive(Default)]
    struct Recorder {
        frames: Vec<Vec<u8>>,
    }

    impl TextureSink for Recorder {
        fn replace_all(&mut self, canvas: &Canvas) {
            self.frames.push(canvas.to_rgba8());
        }
    }

    #[test]
    fn flush_uploads_full_buffer_only_when_dirty() {
        let mut canvas = Canvas::new(2, 2, Color::WHITE);
        let mut bridge = GpuSyncBridge::new();
        let mut a = Recorder::default();
        let mut b = Recorder::default();

        assert!(!bridge.flush(&canvas, &mut [&mut a, &mut b]));
        assert!(a.frames.is_empty());

        canvas.set(0, 0, Color::BLACK);
        bridge.mark_dirty();
        assert!(bridge.flush(&canvas, &mut [&mut a, &mut b]));
        assert!(!bridge.is_dirty());
        assert_eq!(a.frames.len(), 1);
        assert_eq!(a.frames[0].len(), 2 * 2 * 4);
        assert_eq!(a.frames[0], b.frames[0]);
        assert_eq!(&a.frames[0][..4], &[0, 0, 0, 255]);

        assert!(!bridge.flush(&canvas, &mut [&mut a]));
        assert_eq!(a.frames.len(), 1);
    }
}
