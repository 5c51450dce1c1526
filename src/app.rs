// ============================================================================
// TEXPAINT APP — eframe host: 3D view, texture view, settings window
// ============================================================================

use std::path::Path;

use eframe::egui;
use egui::{Color32, Pos2, Rect, TextureOptions};

use crate::brush::{MAX_RADIUS, MIN_RADIUS, PALETTE};
use crate::canvas::{Canvas, Color};
use crate::coords::{FramebufferSize, ScreenPoint};
use crate::gpu::{GpuContext, GpuError, SceneView};
use crate::io::LoadError;
use crate::model::{Mesh, ModelError};
use crate::painting::PaintingContext;
use crate::settings::AppSettings;
use crate::stroke::{InputEvent, Modifiers, PointerButton, WindowId};
use crate::sync::TextureSink;

/// Canvas used when no texture image is configured.
const BLANK_CANVAS_SIZE: u32 = 512;
const SPHERE_STACKS: u32 = 48;
const SPHERE_SLICES: u32 = 96;

// ============================================================================
// STARTUP
// ============================================================================

/// Anything that stops the app from starting.  All of these are fatal.
#[derive(Debug)]
pub enum StartupError {
    Texture(LoadError),
    Model(ModelError),
    Gpu(GpuError),
}

impl std::fmt::Display for StartupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StartupError::Texture(e) => write!(f, "could not load texture: {}", e),
            StartupError::Model(e) => write!(f, "could not load model: {}", e),
            StartupError::Gpu(e) => write!(f, "GPU initialization failed: {}", e),
        }
    }
}

impl std::error::Error for StartupError {}

impl From<LoadError> for StartupError {
    fn from(e: LoadError) -> Self {
        StartupError::Texture(e)
    }
}

impl From<ModelError> for StartupError {
    fn from(e: ModelError) -> Self {
        StartupError::Model(e)
    }
}

impl From<GpuError> for StartupError {
    fn from(e: GpuError) -> Self {
        StartupError::Gpu(e)
    }
}

/// Everything the window needs, built before it opens so failures can be
/// reported on the console.
pub struct Startup {
    pub painting: PaintingContext,
    pub scene: SceneView,
}

impl Startup {
    pub fn build(settings: &AppSettings) -> Result<Self, StartupError> {
        let canvas = match &settings.texture_path {
            Some(path) => {
                let canvas = crate::io::load_canvas(path)?;
                crate::log_info!(
                    "[Startup] texture {} ({}x{})",
                    path.display(),
                    canvas.width(),
                    canvas.height()
                );
                canvas
            }
            None => {
                crate::log_info!("[Startup] no texture configured, using a blank canvas");
                Canvas::new(BLANK_CANVAS_SIZE, BLANK_CANVAS_SIZE, Color::WHITE)
            }
        };

        let mesh = match &settings.model_path {
            Some(path) => {
                let mesh = Mesh::load_obj(path)?;
                crate::log_info!(
                    "[Startup] model {} ({} triangles)",
                    path.display(),
                    mesh.triangle_count()
                );
                mesh
            }
            None => Mesh::uv_sphere(SPHERE_STACKS, SPHERE_SLICES),
        };

        let ctx = GpuContext::new(&settings.preferred_gpu)?;
        crate::log_info!("[GPU] adapter: {}", ctx.adapter_name);

        let [w, h] = settings.main_view_size;
        let scene = SceneView::new(ctx, &mesh, &canvas, w, h)?;
        let painting = PaintingContext::new(canvas, settings.brush());
        Ok(Self { painting, scene })
    }
}

/// Replace the painted canvas with `canvas`, recreating the 3D view's
/// texture when the size changed.  Returns `true` on a size change.  If the
/// new size does not fit on the device, nothing is replaced.
pub fn swap_canvas(
    painting: &mut PaintingContext,
    scene: &mut SceneView,
    canvas: Canvas,
) -> Result<bool, GpuError> {
    let current = painting.canvas();
    let resized = (canvas.width(), canvas.height()) != (current.width(), current.height());
    if resized {
        scene.recreate_canvas_texture(&canvas)?;
        crate::log_info!("[Reload] canvas resized to {}x{}", canvas.width(), canvas.height());
    }
    painting.replace_canvas(canvas);
    Ok(resized)
}

// ============================================================================
// FLAT VIEW TEXTURE — egui copy of the canvas for the texture view
// ============================================================================

struct FlatViewTexture {
    ctx: egui::Context,
    handle: Option<egui::TextureHandle>,
}

impl TextureSink for FlatViewTexture {
    fn replace_all(&mut self, canvas: &Canvas) {
        let image = canvas.to_color_image();
        match &mut self.handle {
            Some(tex) => tex.set(image, TextureOptions::NEAREST),
            None => {
                self.handle = Some(self.ctx.load_texture("texture_view", image, TextureOptions::NEAREST));
            }
        }
    }
}

// ============================================================================
// INPUT TRANSLATION
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq)]
enum Pointer {
    Press(PointerButton, Modifiers),
    Move,
    Release(PointerButton, Modifiers),
}

fn map_button(button: egui::PointerButton) -> Option<PointerButton> {
    match button {
        egui::PointerButton::Primary => Some(PointerButton::Primary),
        egui::PointerButton::Secondary => Some(PointerButton::Secondary),
        egui::PointerButton::Middle => Some(PointerButton::Middle),
        _ => None,
    }
}

fn map_modifiers(m: egui::Modifiers) -> Modifiers {
    Modifiers {
        shift: m.shift,
        ctrl: m.ctrl || m.mac_cmd,
        alt: m.alt,
    }
}

fn pointer_event(event: &egui::Event) -> Option<(Pointer, Pos2)> {
    match *event {
        egui::Event::PointerMoved(pos) => Some((Pointer::Move, pos)),
        egui::Event::PointerButton {
            pos,
            button,
            pressed,
            modifiers,
        } => {
            let button = map_button(button)?;
            let modifiers = map_modifiers(modifiers);
            let kind = if pressed {
                Pointer::Press(button, modifiers)
            } else {
                Pointer::Release(button, modifiers)
            };
            Some((kind, pos))
        }
        _ => None,
    }
}

/// Position relative to `rect`, in physical pixels, origin top-left.
fn view_point(rect: Rect, pos: Pos2, pixels_per_point: f32) -> ScreenPoint {
    ScreenPoint::new(
        (pos.x - rect.min.x) * pixels_per_point,
        (pos.y - rect.min.y) * pixels_per_point,
    )
}

fn to_input_event(kind: Pointer, window: WindowId, pos: ScreenPoint) -> InputEvent {
    match kind {
        Pointer::Press(button, modifiers) => InputEvent::Press {
            window,
            button,
            modifiers,
            pos,
        },
        Pointer::Move => InputEvent::Move { window, pos },
        Pointer::Release(button, modifiers) => InputEvent::Release {
            window,
            button,
            modifiers,
            pos,
        },
    }
}

fn pixel_size(rect: Rect, pixels_per_point: f32) -> (u32, u32) {
    (
        (rect.width() * pixels_per_point).round().max(1.0) as u32,
        (rect.height() * pixels_per_point).round().max(1.0) as u32,
    )
}

// ============================================================================
// APP
// ============================================================================

pub struct TexPaintApp {
    settings: AppSettings,
    painting: PaintingContext,
    scene: SceneView,
    flat_view: FlatViewTexture,
    main_view_tex: Option<egui::TextureHandle>,
    /// The 3D view must be re-rendered before it is shown next.
    scene_dirty: bool,
    main_rect: Option<Rect>,
    texture_rect: Option<Rect>,
    settings_rect: Option<Rect>,
    status: Option<String>,
}

impl TexPaintApp {
    pub fn new(cc: &eframe::CreationContext<'_>, settings: AppSettings, startup: Startup) -> Self {
        Self {
            settings,
            painting: startup.painting,
            scene: startup.scene,
            flat_view: FlatViewTexture {
                ctx: cc.egui_ctx.clone(),
                handle: None,
            },
            main_view_tex: None,
            scene_dirty: true,
            main_rect: None,
            texture_rect: None,
            settings_rect: None,
            status: None,
        }
    }

    /// Re-read the texture file and replace the canvas.
    fn reload_image(&mut self, ctx: &egui::Context) {
        let Some(path) = self.settings.texture_path.clone() else {
            self.status = Some("No texture file to reload".to_string());
            return;
        };
        match self.try_reload(&path) {
            Ok(()) => {
                crate::log_info!("[Reload] {}", path.display());
                self.status = None;
                // the upload happens in the next update
                ctx.request_repaint();
            }
            Err(e) => {
                crate::log_err!("[Reload] {}: {}", path.display(), e);
                self.status = Some(format!("Reload failed: {}", e));
            }
        }
    }

    fn try_reload(&mut self, path: &Path) -> Result<(), String> {
        let canvas = crate::io::load_canvas(path).map_err(|e| e.to_string())?;
        swap_canvas(&mut self.painting, &mut self.scene, canvas).map_err(|e| e.to_string())?;
        Ok(())
    }

    /// Feed this frame's pointer events to the two views.
    fn handle_input(&mut self, ctx: &egui::Context) {
        let (events, ppp) = ctx.input(|i| (i.events.clone(), i.pixels_per_point()));
        for event in &events {
            let Some((kind, pos)) = pointer_event(event) else { continue };

            if let Pointer::Press(..) = kind {
                // presses on the settings window belong to egui
                if self.settings_rect.is_some_and(|r| r.contains(pos)) {
                    continue;
                }
                if let Some(rect) = self.texture_rect.filter(|r| r.contains(pos)) {
                    self.dispatch_texture_view(kind, view_point(rect, pos, ppp), rect, ppp);
                } else if let Some(rect) = self.main_rect.filter(|r| r.contains(pos)) {
                    self.dispatch_main_view(kind, view_point(rect, pos, ppp));
                }
                continue;
            }

            // moves and releases go to both views; idle sessions ignore them
            if let Some(rect) = self.texture_rect {
                self.dispatch_texture_view(kind, view_point(rect, pos, ppp), rect, ppp);
            }
            if let Some(rect) = self.main_rect {
                self.dispatch_main_view(kind, view_point(rect, pos, ppp));
            }
        }
    }

    fn dispatch_texture_view(&mut self, kind: Pointer, pos: ScreenPoint, rect: Rect, ppp: f32) {
        let event = to_input_event(kind, WindowId::TextureView, pos);
        let fb = FramebufferSize::new(rect.width() * ppp, rect.height() * ppp);
        // the texture view never forwards to the camera
        let _ = self.painting.handle_texture_view_event(&event, fb);
    }

    fn dispatch_main_view(&mut self, kind: Pointer, pos: ScreenPoint) {
        let event = to_input_event(kind, WindowId::MainView, pos);
        let forwarded = self.painting.handle_main_view_event(&event, &mut self.scene);
        for camera_event in &forwarded {
            if self.scene.handle_camera_event(camera_event) {
                self.scene_dirty = true;
            }
        }
    }

    fn show_settings(&mut self, ctx: &egui::Context) {
        let mut reload = false;
        let response = egui::Window::new("Settings")
            .resizable(false)
            .default_pos(Pos2::new(16.0, 16.0))
            .show(ctx, |ui| {
                let brush = &mut self.painting.brush;

                let mut radius = brush.radius;
                if ui
                    .add(egui::Slider::new(&mut radius, MIN_RADIUS..=MAX_RADIUS).text("Brush radius"))
                    .changed()
                {
                    brush.set_radius(radius);
                }

                let mut rgba = brush.color.to_array();
                ui.horizontal(|ui| {
                    ui.label("Color");
                    if ui.color_edit_button_rgba_unmultiplied(&mut rgba).changed() {
                        brush.color = Color::from_array(rgba);
                    }
                });

                ui.horizontal(|ui| {
                    for (name, rgb) in PALETTE {
                        let fill = Color32::from_rgb(
                            (rgb[0] * 255.0).round() as u8,
                            (rgb[1] * 255.0).round() as u8,
                            (rgb[2] * 255.0).round() as u8,
                        );
                        let swatch = egui::Button::new("")
                            .fill(fill)
                            .min_size(egui::vec2(24.0, 24.0));
                        if ui.add(swatch).on_hover_text(name).clicked() {
                            brush.apply_swatch(rgb);
                        }
                    }
                });

                ui.separator();
                if ui.button("Reload image").clicked() {
                    reload = true;
                }
                if let Some(status) = &self.status {
                    ui.colored_label(Color32::RED, status);
                }
                ui.weak(format!("GPU: {}", self.scene.adapter_name()));
            });

        self.settings_rect = response.map(|r| r.response.rect);
        if reload {
            self.reload_image(ctx);
        }
    }

    fn show_texture_view(&mut self, ctx: &egui::Context) {
        let ppp = ctx.pixels_per_point();
        let [w, h] = self.settings.texture_view_size;
        let size = egui::vec2(w as f32 / ppp, h as f32 / ppp);

        egui::SidePanel::left("texture_view")
            .resizable(false)
            .exact_width(size.x)
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let (rect, _) = ui.allocate_exact_size(size, egui::Sense::click_and_drag());
                self.texture_rect = Some(rect);
                if let Some(tex) = &self.flat_view.handle {
                    ui.painter().image(tex.id(), rect, full_uv(), Color32::WHITE);
                }
            });
    }

    fn show_main_view(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(Color32::WHITE))
            .show(ctx, |ui| {
                let ppp = ui.ctx().pixels_per_point();
                let (rect, response) =
                    ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
                self.main_rect = Some(rect);

                let (w, h) = pixel_size(rect, ppp);
                if (w, h) != self.scene.size() {
                    if let Err(e) = self.scene.resize(w, h) {
                        crate::log_err!("[GPU] {}", e);
                        panic!("main view resize failed: {}", e);
                    }
                    self.settings.main_view_size = [w, h];
                    self.scene_dirty = true;
                }

                if response.hovered() {
                    let scroll = ui.input(|i| i.scroll_delta.y);
                    if self.scene.scroll(scroll) {
                        self.scene_dirty = true;
                    }
                }

                if self.scene_dirty {
                    self.refresh_main_view(ui.ctx());
                }
                if let Some(tex) = &self.main_view_tex {
                    ui.painter().image(tex.id(), rect, full_uv(), Color32::WHITE);
                }
            });
    }

    fn refresh_main_view(&mut self, ctx: &egui::Context) {
        let Some(pixels) = self.scene.render_display() else { return };
        let (w, h) = self.scene.size();
        let image = egui::ColorImage::from_rgba_unmultiplied([w as usize, h as usize], &pixels);
        match &mut self.main_view_tex {
            Some(tex) => tex.set(image, TextureOptions::LINEAR),
            None => self.main_view_tex = Some(ctx.load_texture("main_view", image, TextureOptions::LINEAR)),
        }
        self.scene_dirty = false;
    }

    fn save_settings(&mut self) {
        self.settings.set_brush(&self.painting.brush);
        self.settings.save();
        crate::log_info!("[Settings] saved");
    }
}

fn full_uv() -> Rect {
    Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0))
}

impl eframe::App for TexPaintApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.viewport().close_requested()) {
            self.save_settings();
        }

        self.handle_input(ctx);

        // push canvas edits to both views
        let mut sinks: [&mut dyn TextureSink; 2] = [self.scene.canvas_texture_mut(), &mut self.flat_view];
        if self.painting.flush(&mut sinks) {
            self.scene_dirty = true;
        }

        if ctx.input(|i| i.focused) {
            self.show_settings(ctx);
        } else {
            self.settings_rect = None;
        }
        self.show_texture_view(ctx);
        self.show_main_view(ctx);
    }
}
