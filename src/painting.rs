// ============================================================================
// PAINTING CONTEXT — canvas, brush and per-view sessions in one place
// ============================================================================

use crate::brush::{self, BrushSettings};
use crate::canvas::Canvas;
use crate::coords::FramebufferSize;
use crate::picker::SurfacePicker;
use crate::stroke::{
    FlatViewResolver, InputEvent, PointResolver, StrokeAction, StrokeSession, SurfaceResolver,
    WindowId,
};
use crate::sync::{GpuSyncBridge, TextureSink};

/// Everything an input handler or a render call needs to paint.  Passed
/// explicitly; there is no global painting state.
pub struct PaintingContext {
    canvas: Canvas,
    pub brush: BrushSettings,
    main_view: StrokeSession,
    texture_view: StrokeSession,
    sync: GpuSyncBridge,
}

impl PaintingContext {
    pub fn new(canvas: Canvas, brush: BrushSettings) -> Self {
        let mut sync = GpuSyncBridge::new();
        // the GPU copy starts out empty
        sync.mark_dirty();
        Self {
            canvas,
            brush,
            main_view: StrokeSession::new(WindowId::MainView),
            texture_view: StrokeSession::new(WindowId::TextureView),
            sync,
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn session(&self, window: WindowId) -> &StrokeSession {
        match window {
            WindowId::MainView => &self.main_view,
            WindowId::TextureView => &self.texture_view,
        }
    }

    pub fn sync(&self) -> &GpuSyncBridge {
        &self.sync
    }

    /// Route an event to its view's session and apply the resulting edits.
    /// Returns the events that must go to the camera.
    pub fn handle_event(
        &mut self,
        event: &InputEvent,
        resolver: &mut dyn PointResolver,
    ) -> Vec<InputEvent> {
        let session = match event.window() {
            WindowId::MainView => &mut self.main_view,
            WindowId::TextureView => &mut self.texture_view,
        };
        let actions = session.handle(event, resolver, &self.brush);
        actions.iter().filter_map(|a| self.apply(a)).collect()
    }

    /// Texture view event: coordinates map straight onto the canvas.
    pub fn handle_texture_view_event(
        &mut self,
        event: &InputEvent,
        framebuffer: FramebufferSize,
    ) -> Vec<InputEvent> {
        let mut resolver = FlatViewResolver {
            framebuffer,
            image_width: self.canvas.width(),
            image_height: self.canvas.height(),
        };
        self.handle_event(event, &mut resolver)
    }

    /// Main view event: coordinates go through the surface picker.
    pub fn handle_main_view_event(
        &mut self,
        event: &InputEvent,
        picker: &mut dyn SurfacePicker,
    ) -> Vec<InputEvent> {
        let mut resolver = SurfaceResolver {
            picker,
            image_width: self.canvas.width(),
            image_height: self.canvas.height(),
        };
        self.handle_event(event, &mut resolver)
    }

    /// Execute one action.  Canvas edits mark the GPU copy stale; forwarded
    /// camera events are handed back.
    pub fn apply(&mut self, action: &StrokeAction) -> Option<InputEvent> {
        match *action {
            StrokeAction::Stamp {
                center,
                radius,
                color,
            } => {
                brush::stamp_circle(&mut self.canvas, center, radius, color);
                self.sync.mark_dirty();
                None
            }
            StrokeAction::Line {
                from,
                to,
                width,
                color,
            } => {
                brush::rasterize_line(&mut self.canvas, from, to, width, color);
                self.sync.mark_dirty();
                None
            }
            StrokeAction::ForwardToCamera(event) => Some(event),
        }
    }

    /// Swap in freshly loaded pixels.  Returns `true` when the size
    /// changed, meaning GPU textures must be recreated rather than updated.
    pub fn replace_canvas(&mut self, canvas: Canvas) -> bool {
        let resized = !self.canvas.copy_from(&canvas);
        if resized {
            self.canvas = canvas;
        }
        self.sync.mark_dirty();
        resized
    }

    /// Push the canvas to the display textures if it changed.
    pub fn flush(&mut self, sinks: &mut [&mut dyn TextureSink]) -> bool {
        self.sync.flush(&self.canvas, sinks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Color;
    use crate::coords::{ScreenPoint, Uv};
    use crate::picker::UvBuffer;
    use crate::stroke::{Modifiers, PointerButton, StrokeState};

    fn fb() -> FramebufferSize {
        FramebufferSize::new(100.0, 100.0)
    }

    fn press(window: WindowId, x: f32, y: f32) -> InputEvent {
        InputEvent::Press {
            window,
            button: PointerButton::Primary,
            modifiers: Modifiers::NONE,
            pos: ScreenPoint::new(x, y),
        }
    }

    fn release(window: WindowId) -> InputEvent {
        InputEvent::Release {
            window,
            button: PointerButton::Primary,
            modifiers: Modifiers::NONE,
            pos: ScreenPoint::new(0.0, 0.0),
        }
    }

    struct Counter(u32);

    impl TextureSink for Counter {
        fn replace_all(&mut self, _canvas: &Canvas) {
            self.0 += 1;
        }
    }

    #[test]
    fn single_press_on_texture_view_stamps_disk() {
        let mut ctx = PaintingContext::new(Canvas::new(100, 100, Color::WHITE), BrushSettings::default());
        // framebuffer pixel (50.5, 49.5) -> u 0.505, v 0.505 -> image (50, 50)
        ctx.handle_texture_view_event(&press(WindowId::TextureView, 50.5, 49.5), fb());
        let c = ctx.canvas();
        assert_eq!(c.get(50, 50), Some(Color::BLACK));
        assert_eq!(c.get(55, 50), Some(Color::BLACK));
        assert_eq!(c.get(56, 50), Some(Color::WHITE));
        assert_eq!(c.get(54, 54), Some(Color::WHITE));
    }

    #[test]
    fn two_half_alpha_presses_give_quarter_value() {
        let brush = BrushSettings::new(5.0, Color::rgba(0.0, 0.0, 0.0, 0.5));
        let mut ctx = PaintingContext::new(Canvas::new(100, 100, Color::WHITE), brush);
        for _ in 0..2 {
            ctx.handle_texture_view_event(&press(WindowId::TextureView, 50.5, 49.5), fb());
            ctx.handle_texture_view_event(&release(WindowId::TextureView), fb());
        }
        let px = ctx.canvas().get(50, 50).unwrap();
        assert!((px.r - 0.25).abs() < 1e-6);
        assert!((px.g - 0.25).abs() < 1e-6);
        assert!((px.b - 0.25).abs() < 1e-6);
    }

    #[test]
    fn main_view_paints_through_picker_and_forwards_camera_drags() {
        let mut ctx = PaintingContext::new(Canvas::new(64, 64, Color::WHITE), BrushSettings::new(1.0, Color::BLACK));
        let mut uv = UvBuffer::new(10, 10);
        uv.write(3, 3, Uv::new(0.25, 0.5));

        let mut sink = Counter(0);
        assert!(ctx.flush(&mut [&mut sink]));
        assert_eq!(sink.0, 1);

        // background: nothing painted, nothing to upload
        let fwd = ctx.handle_main_view_event(&press(WindowId::MainView, 8.0, 8.0), &mut uv);
        assert!(fwd.is_empty());
        assert!(!ctx.flush(&mut [&mut sink]));
        assert_eq!(ctx.session(WindowId::MainView).state(), StrokeState::Idle);

        ctx.handle_main_view_event(&press(WindowId::MainView, 3.5, 3.5), &mut uv);
        assert_eq!(ctx.canvas().get(32, 16), Some(Color::BLACK));
        assert!(ctx.flush(&mut [&mut sink]));
        ctx.handle_main_view_event(&release(WindowId::MainView), &mut uv);

        let drag = InputEvent::Press {
            window: WindowId::MainView,
            button: PointerButton::Secondary,
            modifiers: Modifiers::NONE,
            pos: ScreenPoint::new(3.5, 3.5),
        };
        let fwd = ctx.handle_main_view_event(&drag, &mut uv);
        assert_eq!(fwd, vec![drag]);
        assert!(!ctx.sync().is_dirty());
    }

    #[test]
    fn views_keep_independent_sessions() {
        let mut ctx = PaintingContext::new(Canvas::new(32, 32, Color::WHITE), BrushSettings::default());
        ctx.handle_texture_view_event(&press(WindowId::TextureView, 1.0, 1.0), fb());
        assert_eq!(ctx.session(WindowId::TextureView).state(), StrokeState::Painting);
        assert_eq!(ctx.session(WindowId::MainView).state(), StrokeState::Idle);
    }

    #[test]
    fn replace_canvas_reports_resize() {
        let mut ctx = PaintingContext::new(Canvas::new(8, 8, Color::WHITE), BrushSettings::default());
        let mut sink = Counter(0);
        ctx.flush(&mut [&mut sink]);

        assert!(!ctx.replace_canvas(Canvas::new(8, 8, Color::BLACK)));
        assert_eq!(ctx.canvas().get(0, 0), Some(Color::BLACK));
        assert!(ctx.sync().is_dirty());

        assert!(ctx.replace_canvas(Canvas::new(4, 2, Color::WHITE)));
        assert_eq!(ctx.canvas().width(), 4);
    }
}
