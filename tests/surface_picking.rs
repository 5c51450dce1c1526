// Renders the UV pass of the procedural sphere on whatever adapter the
// machine has (hardware or software).  Skips when there is none.

use texpaint::app::swap_canvas;
use texpaint::brush::BrushSettings;
use texpaint::canvas::{Canvas, Color};
use texpaint::coords::ScreenPoint;
use texpaint::gpu::{GpuContext, GpuError, SceneView};
use texpaint::model::Mesh;
use texpaint::painting::PaintingContext;
use texpaint::picker::SurfacePicker;
use texpaint::stroke::{InputEvent, Modifiers, PointerButton, WindowId};
use texpaint::sync::TextureSink;

fn gpu() -> Option<GpuContext> {
    match GpuContext::new("") {
        Ok(ctx) => Some(ctx),
        Err(e) => {
            eprintln!("skipping GPU test: {}", e);
            None
        }
    }
}

fn scene(width: u32, height: u32) -> Option<SceneView> {
    let ctx = gpu()?;
    let mesh = Mesh::uv_sphere(32, 64);
    let canvas = Canvas::new(64, 64, Color::WHITE);
    Some(SceneView::new(ctx, &mesh, &canvas, width, height).expect("scene view"))
}

fn press(x: f32, y: f32) -> InputEvent {
    InputEvent::Press {
        window: WindowId::MainView,
        button: PointerButton::Primary,
        modifiers: Modifiers::NONE,
        pos: ScreenPoint::new(x, y),
    }
}

fn release(x: f32, y: f32) -> InputEvent {
    InputEvent::Release {
        window: WindowId::MainView,
        button: PointerButton::Primary,
        modifiers: Modifiers::NONE,
        pos: ScreenPoint::new(x, y),
    }
}

fn rgb_sum(pixels: &[u8], index: usize) -> u32 {
    pixels[index..index + 3].iter().map(|&c| c as u32).sum()
}

#[test]
fn center_hits_the_sphere_and_corners_miss() {
    let Some(mut scene) = scene(96, 64) else { return };

    let uv = scene.pick(ScreenPoint::new(48.0, 32.0)).expect("center of the view is on the sphere");
    assert!((0.0..1.0).contains(&uv.u));
    assert!((0.0..1.0).contains(&uv.v));
    // the equator faces the camera
    assert!((uv.v - 0.5).abs() < 0.1, "v = {}", uv.v);

    assert_eq!(scene.pick(ScreenPoint::new(0.0, 0.0)), None);
    assert_eq!(scene.pick(ScreenPoint::new(95.0, 63.0)), None);
    assert_eq!(scene.pick(ScreenPoint::new(-1.0, 10.0)), None);
    assert_eq!(scene.pick(ScreenPoint::new(500.0, 10.0)), None);
}

#[test]
fn upper_half_of_the_view_maps_to_upper_half_of_the_texture() {
    let Some(mut scene) = scene(64, 64) else { return };

    let above = scene.pick(ScreenPoint::new(32.0, 24.0)).expect("hit above center");
    let below = scene.pick(ScreenPoint::new(32.0, 40.0)).expect("hit below center");
    assert!(above.v > below.v, "above {:?} below {:?}", above, below);
}

#[test]
fn picks_follow_the_camera() {
    let Some(mut scene) = scene(64, 64) else { return };

    let before = scene.pick(ScreenPoint::new(32.0, 32.0)).expect("hit");
    scene.camera_mut().orbit(150.0, 0.0);
    let after = scene.pick(ScreenPoint::new(32.0, 32.0)).expect("hit");
    assert!((before.u - after.u).abs() > 0.05, "{:?} vs {:?}", before, after);
    // equator stays put under a pure yaw
    assert!((before.v - after.v).abs() < 0.02);

    scene.resize(80, 48).expect("resize");
    assert_eq!(scene.size(), (80, 48));
    assert!(scene.pick(ScreenPoint::new(40.0, 24.0)).is_some());
    assert_eq!(scene.pick(ScreenPoint::new(40.0, 60.0)), None);
}

#[test]
fn display_render_has_white_background_and_shaded_model() {
    let Some(mut scene) = scene(32, 32) else { return };

    let pixels = scene.render_display().expect("read-back");
    assert_eq!(pixels.len(), 32 * 32 * 4);
    assert_eq!(&pixels[0..4], &[255, 255, 255, 255]);
    let center = (16 * 32 + 16) * 4;
    assert_eq!(pixels[center + 3], 255);
}

#[test]
fn canvas_wider_than_the_device_limit_is_rejected() {
    let Some(ctx) = gpu() else { return };
    let too_wide = ctx.max_texture_dim + 1;
    let mesh = Mesh::uv_sphere(8, 16);

    let canvas = Canvas::new(too_wide, 1, Color::WHITE);
    match SceneView::new(ctx, &mesh, &canvas, 32, 32) {
        Err(GpuError::TextureTooLarge { width, max, .. }) => {
            assert_eq!(width, too_wide);
            assert_eq!(max + 1, too_wide);
        }
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("oversized canvas was accepted"),
    }
}

#[test]
fn oversized_reload_keeps_the_current_canvas() {
    let Some(mut scene) = scene(64, 64) else { return };
    let mut painting = PaintingContext::new(Canvas::new(64, 64, Color::WHITE), BrushSettings::default());
    painting.flush(&mut [scene.canvas_texture_mut()]);
    let before = scene.render_display().expect("read-back");

    let too_wide = Canvas::new(scene.max_texture_dim() + 1, 1, Color::BLACK);
    assert!(matches!(
        swap_canvas(&mut painting, &mut scene, too_wide),
        Err(GpuError::TextureTooLarge { .. })
    ));
    assert_eq!((painting.canvas().width(), painting.canvas().height()), (64, 64));

    // the old texture still renders and still accepts uploads
    painting.flush(&mut [scene.canvas_texture_mut()]);
    assert_eq!(scene.render_display().expect("read-back"), before);
}

#[test]
fn painting_through_the_picker_reaches_the_rendered_texture() {
    let Some(mut scene) = scene(64, 64) else { return };
    let mut painting = PaintingContext::new(
        Canvas::new(64, 64, Color::WHITE),
        BrushSettings::new(5.0, Color::BLACK),
    );
    painting.flush(&mut [scene.canvas_texture_mut()]);

    let center = (32 * 64 + 32) * 4;
    let before = scene.render_display().expect("read-back");

    let forwarded = painting.handle_main_view_event(&press(32.0, 32.0), &mut scene);
    assert!(forwarded.is_empty());
    painting.handle_main_view_event(&release(32.0, 32.0), &mut scene);
    assert!(painting.flush(&mut [scene.canvas_texture_mut()]));

    let after = scene.render_display().expect("read-back");
    assert!(
        rgb_sum(&after, center) < rgb_sum(&before, center),
        "before {:?} after {:?}",
        &before[center..center + 4],
        &after[center..center + 4]
    );
    // background is untouched
    assert_eq!(&after[0..4], &[255, 255, 255, 255]);
}

#[test]
fn mismatched_upload_leaves_the_texture_alone() {
    let Some(mut scene) = scene(64, 64) else { return };
    scene.canvas_texture_mut().replace_all(&Canvas::new(64, 64, Color::WHITE));
    let before = scene.render_display().expect("read-back");

    scene.canvas_texture_mut().replace_all(&Canvas::new(32, 16, Color::BLACK));
    assert_eq!(scene.render_display().expect("read-back"), before);
}

#[test]
fn reload_with_a_new_size_recreates_the_texture() {
    let Some(mut scene) = scene(64, 64) else { return };
    let mut painting = PaintingContext::new(Canvas::new(64, 64, Color::WHITE), BrushSettings::default());
    painting.flush(&mut [scene.canvas_texture_mut()]);

    let center = (32 * 64 + 32) * 4;
    let white = scene.render_display().expect("read-back");
    assert!(rgb_sum(&white, center) > 0);

    let resized = swap_canvas(&mut painting, &mut scene, Canvas::new(128, 32, Color::BLACK))
        .expect("fits on the device");
    assert!(resized);
    assert_eq!((painting.canvas().width(), painting.canvas().height()), (128, 32));
    assert!(painting.flush(&mut [scene.canvas_texture_mut()]));

    let black = scene.render_display().expect("read-back");
    assert_eq!(&black[center..center + 3], &[0, 0, 0]);

    // same size again: the texture is reused
    let resized = swap_canvas(&mut painting, &mut scene, Canvas::new(128, 32, Color::WHITE))
        .expect("fits on the device");
    assert!(!resized);
    painting.flush(&mut [scene.canvas_texture_mut()]);
    assert_eq!(scene.render_display().expect("read-back"), white);
}
