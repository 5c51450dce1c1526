// ============================================================================
// TexPaint CLI — launch options layered over the saved settings
// ============================================================================
//
// Usage examples:
//   texpaint --texture skin.png --model head.obj
//   texpaint -t skin.png                      (procedural sphere as the model)
//   texpaint -t skin.png --radius 12 --gpu "low power"

use std::path::PathBuf;

use clap::Parser;

use crate::settings::AppSettings;

/// TexPaint: paint on a model's texture in 3D or flat.
#[derive(Parser, Debug, Default)]
#[command(
    name = "texpaint",
    about = "Paint directly onto a 3D model's texture",
    long_about = "Paint onto a texture image either on the 3D model (main view) or on the\n\
                  flat image (texture view). Values given here override the saved\n\
                  settings for this session and are saved on exit."
)]
pub struct CliArgs {
    /// Texture image to paint on (PNG, JPEG, WEBP, BMP, TGA, TIFF).
    #[arg(short, long, value_name = "IMAGE")]
    pub texture: Option<PathBuf>,

    /// Wavefront OBJ model with texture coordinates.
    /// A UV sphere is used when none is configured.
    #[arg(short, long, value_name = "MODEL.obj")]
    pub model: Option<PathBuf>,

    /// GPU preference: "high performance" (default) or "low power".
    #[arg(long, value_name = "PREFERENCE")]
    pub gpu: Option<String>,

    /// Initial brush radius in image pixels (1-50).
    #[arg(short, long, value_name = "PIXELS")]
    pub radius: Option<f32>,
}

impl CliArgs {
    /// Overlay the given options onto `settings`.
    pub fn apply_to(&self, settings: &mut AppSettings) {
        if let Some(texture) = &self.texture {
            settings.texture_path = Some(texture.clone());
        }
        if let Some(model) = &self.model {
            settings.model_path = Some(model.clone());
        }
        if let Some(gpu) = &self.gpu {
            settings.preferred_gpu = gpu.clone();
        }
        if let Some(radius) = self.radius {
            let mut brush = settings.brush();
            brush.set_radius(radius);
            settings.set_brush(&brush);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_values_override_settings() {
        let args = CliArgs::parse_from(["texpaint", "-t", "a.png", "--radius", "80", "--gpu", "low power"]);
        let mut s = AppSettings {
            model_path: Some(PathBuf::from("keep.obj")),
            ..AppSettings::default()
        };
        args.apply_to(&mut s);
        assert_eq!(s.texture_path, Some(PathBuf::from("a.png")));
        assert_eq!(s.model_path, Some(PathBuf::from("keep.obj")));
        assert_eq!(s.preferred_gpu, "low power");
        assert_eq!(s.brush_radius, 50.0);
    }

    #[test]
    fn no_arguments_leave_settings_alone() {
        let args = CliArgs::parse_from(["texpaint"]);
        let mut s = AppSettings::default();
        args.apply_to(&mut s);
        assert_eq!(s, AppSettings::default());
    }
}
