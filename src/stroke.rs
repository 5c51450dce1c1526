// ============================================================================
// STROKE SESSION — per-view press/move/release state machine
// ============================================================================
//
// One session per view.  A session never touches the canvas itself: it
// turns input events into `StrokeAction`s which the painting context
// applies.  That keeps the state machine testable with scripted resolvers.

use crate::brush::BrushSettings;
use crate::canvas::Color;
use crate::coords::{self, FramebufferSize, ImagePixel, ScreenPoint};
use crate::picker::SurfacePicker;

/// Which view an event belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WindowId {
    /// Perspective view of the textured model.
    MainView,
    /// Flat view of the raw texture, filling its framebuffer.
    TextureView,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
    };

    pub fn any(&self) -> bool {
        self.shift || self.ctrl || self.alt
    }
}

/// Pointer input, already split per view and expressed in that view's
/// framebuffer pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    Press {
        window: WindowId,
        button: PointerButton,
        modifiers: Modifiers,
        pos: ScreenPoint,
    },
    Move {
        window: WindowId,
        pos: ScreenPoint,
    },
    Release {
        window: WindowId,
        button: PointerButton,
        modifiers: Modifiers,
        pos: ScreenPoint,
    },
}

impl InputEvent {
    pub fn window(&self) -> WindowId {
        match self {
            InputEvent::Press { window, .. }
            | InputEvent::Move { window, .. }
            | InputEvent::Release { window, .. } => *window,
        }
    }

    pub fn pos(&self) -> ScreenPoint {
        match self {
            InputEvent::Press { pos, .. }
            | InputEvent::Move { pos, .. }
            | InputEvent::Release { pos, .. } => *pos,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StrokeState {
    #[default]
    Idle,
    /// Pointer is dragging the camera; events go to the view collaborator.
    ManipulatingView,
    Painting,
}

/// A canvas edit (or a forwarded event) produced by a session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StrokeAction {
    Stamp {
        center: ImagePixel,
        radius: f32,
        color: Color,
    },
    Line {
        from: ImagePixel,
        to: ImagePixel,
        width: f32,
        color: Color,
    },
    ForwardToCamera(InputEvent),
}

/// Maps a screen point of one view to a canvas pixel.
pub trait PointResolver {
    fn resolve(&mut self, at: ScreenPoint) -> Option<ImagePixel>;
}

/// Texture view: direct screen -> texture -> image mapping.  Always
/// resolves; off-canvas results are clipped by the canvas.
pub struct FlatViewResolver {
    pub framebuffer: FramebufferSize,
    pub image_width: u32,
    pub image_height: u32,
}

impl PointResolver for FlatViewResolver {
    fn resolve(&mut self, at: ScreenPoint) -> Option<ImagePixel> {
        Some(coords::screen_to_image_pixel(
            at,
            self.framebuffer,
            self.image_width,
            self.image_height,
        ))
    }
}

/// 3D view: the picker finds the UV under the cursor, then the UV goes
/// through the usual texture -> image mapping.
pub struct SurfaceResolver<P> {
    pub picker: P,
    pub image_width: u32,
    pub image_height: u32,
}

impl<P: SurfacePicker> PointResolver for SurfaceResolver<P> {
    fn resolve(&mut self, at: ScreenPoint) -> Option<ImagePixel> {
        let uv = self.picker.pick(at)?;
        Some(coords::texture_to_image_pixel(uv, self.image_width, self.image_height))
    }
}

#[derive(Clone, Debug)]
pub struct StrokeSession {
    window: WindowId,
    state: StrokeState,
    /// Last pointer position seen by this view, in its own pixels.
    last_screen: Option<ScreenPoint>,
    /// Canvas pixel the current stroke last reached.
    last_point: Option<ImagePixel>,
}

impl StrokeSession {
    pub fn new(window: WindowId) -> Self {
        Self {
            window,
            state: StrokeState::Idle,
            last_screen: None,
            last_point: None,
        }
    }

    pub fn window(&self) -> WindowId {
        self.window
    }

    pub fn state(&self) -> StrokeState {
        self.state
    }

    pub fn last_screen(&self) -> Option<ScreenPoint> {
        self.last_screen
    }

    pub fn last_point(&self) -> Option<ImagePixel> {
        self.last_point
    }

    /// Feed one event.  Events addressed to another view are ignored.
    ///
    /// Only the segment since the previous move is emitted, never the
    /// whole stroke.
    pub fn handle(
        &mut self,
        event: &InputEvent,
        resolver: &mut dyn PointResolver,
        brush: &BrushSettings,
    ) -> Vec<StrokeAction> {
        if event.window() != self.window {
            return Vec::new();
        }
        self.last_screen = Some(event.pos());

        match *event {
            InputEvent::Press {
                button,
                modifiers,
                pos,
                ..
            } => self.on_press(event, button, modifiers, pos, resolver, brush),
            InputEvent::Move { pos, .. } => self.on_move(event, pos, resolver, brush),
            InputEvent::Release { .. } => {
                let mut out = Vec::new();
                if self.state == StrokeState::ManipulatingView {
                    out.push(StrokeAction::ForwardToCamera(*event));
                }
                self.state = StrokeState::Idle;
                self.last_point = None;
                out
            }
        }
    }

    fn on_press(
        &mut self,
        event: &InputEvent,
        button: PointerButton,
        modifiers: Modifiers,
        pos: ScreenPoint,
        resolver: &mut dyn PointResolver,
        brush: &BrushSettings,
    ) -> Vec<StrokeAction> {
        if self.state != StrokeState::Idle {
            return Vec::new();
        }

        match self.window {
            WindowId::MainView => {
                if modifiers.any() || button == PointerButton::Secondary {
                    self.state = StrokeState::ManipulatingView;
                    return vec![StrokeAction::ForwardToCamera(*event)];
                }
                if button != PointerButton::Primary {
                    return Vec::new();
                }
            }
            // The texture view paints with any button.
            WindowId::TextureView => {}
        }

        match resolver.resolve(pos) {
            Some(center) => {
                self.state = StrokeState::Painting;
                self.last_point = Some(center);
                vec![StrokeAction::Stamp {
                    center,
                    radius: brush.radius,
                    color: brush.color,
                }]
            }
            // pressed over background: no stroke starts
            None => Vec::new(),
        }
    }

    fn on_move(
        &mut self,
        event: &InputEvent,
        pos: ScreenPoint,
        resolver: &mut dyn PointResolver,
        brush: &BrushSettings,
    ) -> Vec<StrokeAction> {
        match self.state {
            StrokeState::Idle => Vec::new(),
            StrokeState::ManipulatingView => vec![StrokeAction::ForwardToCamera(*event)],
            StrokeState::Painting => {
                let Some(current) = resolver.resolve(pos) else {
                    return Vec::new();
                };
                let from = self.last_point.unwrap_or(current);
                self.last_point = Some(current);
                vec![StrokeAction::Line {
                    from,
                    to: current,
                    width: brush.radius * 2.0,
                    color: brush.color,
                }]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Uv;
    use std::collections::VecDeque;

    /// Returns scripted results in order, recording every query.
    struct Scripted {
        answers: VecDeque<Option<ImagePixel>>,
        queries: Vec<ScreenPoint>,
    }

    impl Scripted {
        fn new(answers: &[Option<ImagePixel>]) -> Self {
            Self {
                answers: answers.iter().copied().collect(),
                queries: Vec::new(),
            }
        }
    }

    impl PointResolver for Scripted {
        fn resolve(&mut self, at: ScreenPoint) -> Option<ImagePixel> {
            self.queries.push(at);
            self.answers.pop_front().flatten()
        }
    }

    struct ScriptedPicker(VecDeque<Option<Uv>>);

    impl SurfacePicker for ScriptedPicker {
        fn pick(&mut self, _at: ScreenPoint) -> Option<Uv> {
            self.0.pop_front().flatten()
        }
    }

    fn press(window: WindowId, button: PointerButton, modifiers: Modifiers) -> InputEvent {
        InputEvent::Press {
            window,
            button,
            modifiers,
            pos: ScreenPoint::new(10.0, 10.0),
        }
    }

    fn mv(window: WindowId, x: f32, y: f32) -> InputEvent {
        InputEvent::Move {
            window,
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

    #[test]
    fn press_move_release_on_texture_view() {
        let brush = BrushSettings::default();
        let mut s = StrokeSession::new(WindowId::TextureView);
        let a = ImagePixel::new(5, 5);
        let b = ImagePixel::new(6, 9);
        let c = ImagePixel::new(8, 12);
        let mut r = Scripted::new(&[Some(a), Some(b), Some(c)]);

        let out = s.handle(&press(WindowId::TextureView, PointerButton::Primary, Modifiers::NONE), &mut r, &brush);
        assert_eq!(out, vec![StrokeAction::Stamp { center: a, radius: 5.0, color: Color::BLACK }]);
        assert_eq!(s.state(), StrokeState::Painting);

        let out = s.handle(&mv(WindowId::TextureView, 11.0, 12.0), &mut r, &brush);
        assert_eq!(out, vec![StrokeAction::Line { from: a, to: b, width: 10.0, color: Color::BLACK }]);
        let out = s.handle(&mv(WindowId::TextureView, 12.0, 14.0), &mut r, &brush);
        assert_eq!(out, vec![StrokeAction::Line { from: b, to: c, width: 10.0, color: Color::BLACK }]);
        assert_eq!(s.last_screen(), Some(ScreenPoint::new(12.0, 14.0)));

        assert!(s.handle(&release(WindowId::TextureView), &mut r, &brush).is_empty());
        assert_eq!(s.state(), StrokeState::Idle);
        assert_eq!(s.last_point(), None);

        // moving while idle does nothing and asks nothing
        let queries = r.queries.len();
        assert!(s.handle(&mv(WindowId::TextureView, 1.0, 1.0), &mut r, &brush).is_empty());
        assert_eq!(r.queries.len(), queries);
    }

    #[test]
    fn texture_view_paints_with_any_button() {
        let brush = BrushSettings::default();
        let mut s = StrokeSession::new(WindowId::TextureView);
        let mut r = Scripted::new(&[Some(ImagePixel::new(1, 1))]);
        let ctrl = Modifiers { ctrl: true, ..Modifiers::NONE };
        let out = s.handle(&press(WindowId::TextureView, PointerButton::Secondary, ctrl), &mut r, &brush);
        assert_eq!(out.len(), 1);
        assert_eq!(s.state(), StrokeState::Painting);
    }

    #[test]
    fn main_view_modifier_or_secondary_manipulates_view() {
        let brush = BrushSettings::default();
        for (button, mods) in [
            (PointerButton::Secondary, Modifiers::NONE),
            (PointerButton::Primary, Modifiers { shift: true, ..Modifiers::NONE }),
        ] {
            let mut s = StrokeSession::new(WindowId::MainView);
            let mut r = Scripted::new(&[]);
            let p = press(WindowId::MainView, button, mods);
            assert_eq!(s.handle(&p, &mut r, &brush), vec![StrokeAction::ForwardToCamera(p)]);
            assert_eq!(s.state(), StrokeState::ManipulatingView);

            let m = mv(WindowId::MainView, 20.0, 20.0);
            assert_eq!(s.handle(&m, &mut r, &brush), vec![StrokeAction::ForwardToCamera(m)]);

            let rel = release(WindowId::MainView);
            assert_eq!(s.handle(&rel, &mut r, &brush), vec![StrokeAction::ForwardToCamera(rel)]);
            assert_eq!(s.state(), StrokeState::Idle);
            // picker is never consulted while manipulating
            assert!(r.queries.is_empty());
        }
    }

    #[test]
    fn main_view_press_over_background_does_not_start_a_stroke() {
        let brush = BrushSettings::default();
        let mut s = StrokeSession::new(WindowId::MainView);
        let mut r = SurfaceResolver {
            picker: ScriptedPicker(VecDeque::from([None])),
            image_width: 100,
            image_height: 100,
        };
        let out = s.handle(&press(WindowId::MainView, PointerButton::Primary, Modifiers::NONE), &mut r, &brush);
        assert!(out.is_empty());
        assert_eq!(s.state(), StrokeState::Idle);
    }

    #[test]
    fn main_view_skips_moves_that_miss_the_model() {
        let brush = BrushSettings::default();
        let mut s = StrokeSession::new(WindowId::MainView);
        let mut r = SurfaceResolver {
            picker: ScriptedPicker(VecDeque::from([
                Some(Uv::new(0.5, 0.5)),
                None,
                Some(Uv::new(0.6, 0.5)),
            ])),
            image_width: 100,
            image_height: 100,
        };
        let out = s.handle(&press(WindowId::MainView, PointerButton::Primary, Modifiers::NONE), &mut r, &brush);
        assert_eq!(out, vec![StrokeAction::Stamp { center: ImagePixel::new(50, 50), radius: 5.0, color: Color::BLACK }]);

        assert!(s.handle(&mv(WindowId::MainView, 1.0, 1.0), &mut r, &brush).is_empty());
        assert_eq!(s.state(), StrokeState::Painting);
        assert_eq!(s.last_point(), Some(ImagePixel::new(50, 50)));

        let out = s.handle(&mv(WindowId::MainView, 2.0, 1.0), &mut r, &brush);
        assert_eq!(
            out,
            vec![StrokeAction::Line {
                from: ImagePixel::new(50, 50),
                to: ImagePixel::new(50, 60),
                width: 10.0,
                color: Color::BLACK
            }]
        );
    }

    #[test]
    fn events_for_other_views_are_ignored() {
        let brush = BrushSettings::default();
        let mut s = StrokeSession::new(WindowId::MainView);
        let mut r = Scripted::new(&[Some(ImagePixel::new(0, 0))]);
        let out = s.handle(&press(WindowId::TextureView, PointerButton::Primary, Modifiers::NONE), &mut r, &brush);
        assert!(out.is_empty());
        assert_eq!(s.state(), StrokeState::Idle);
        assert_eq!(s.last_screen(), None);
    }

    #[test]
    fn flat_resolver_uses_coordinate_mapping() {
        let mut r = FlatViewResolver {
            framebuffer: FramebufferSize::new(512.0, 512.0),
            image_width: 256,
            image_height: 256,
        };
        assert_eq!(r.resolve(ScreenPoint::new(0.0, 511.0)), Some(ImagePixel::new(0, 0)));
        assert_eq!(r.resolve(ScreenPoint::new(256.0, 256.0)), Some(ImagePixel::new(128, 128)));
    }
}
