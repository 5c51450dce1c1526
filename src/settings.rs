// ============================================================================
// APP SETTINGS — persisted brush + launch configuration
// ============================================================================

use std::path::PathBuf;

use crate::brush::{BrushSettings, MAX_RADIUS, MIN_RADIUS};
use crate::canvas::Color;

pub const DEFAULT_MAIN_VIEW: [u32; 2] = [800, 600];
pub const DEFAULT_TEXTURE_VIEW: [u32; 2] = [512, 512];

#[derive(Clone, Debug, PartialEq)]
pub struct AppSettings {
    pub brush_radius: f32,
    pub brush_color: Color,
    /// "" = let wgpu decide, "low power" / "integrated" = prefer iGPU.
    pub preferred_gpu: String,
    pub texture_path: Option<PathBuf>,
    pub model_path: Option<PathBuf>,
    pub main_view_size: [u32; 2],
    pub texture_view_size: [u32; 2],
}

impl Default for AppSettings {
    fn default() -> Self {
        let brush = BrushSettings::default();
        Self {
            brush_radius: brush.radius,
            brush_color: brush.color,
            preferred_gpu: String::new(),
            texture_path: None,
            model_path: None,
            main_view_size: DEFAULT_MAIN_VIEW,
            texture_view_size: DEFAULT_TEXTURE_VIEW,
        }
    }
}

impl AppSettings {
    /// Path to the settings file.
    /// On Linux:   ~/.config/texpaint/texpaint_settings.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\TexPaint\texpaint_settings.cfg
    /// On macOS:   ~/Library/Application Support/TexPaint/texpaint_settings.cfg
    pub fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
                    PathBuf::from(home).join(".config")
                })
                .join("texpaint");
            let _ = std::fs::create_dir_all(&config_dir);
            return Some(config_dir.join("texpaint_settings.cfg"));
        }
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA").or_else(|_| std::env::var("USERPROFILE")).ok()?;
            let config_dir = PathBuf::from(appdata).join("TexPaint");
            let _ = std::fs::create_dir_all(&config_dir);
            return Some(config_dir.join("texpaint_settings.cfg"));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").ok()?;
            let config_dir = PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("TexPaint");
            let _ = std::fs::create_dir_all(&config_dir);
            return Some(config_dir.join("texpaint_settings.cfg"));
        }
        #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
        {
            std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|d| d.join("texpaint_settings.cfg")))
        }
    }

    pub fn brush(&self) -> BrushSettings {
        BrushSettings::new(self.brush_radius, self.brush_color)
    }

    pub fn set_brush(&mut self, brush: &BrushSettings) {
        self.brush_radius = brush.radius;
        self.brush_color = brush.color;
    }

    /// Serialize a color as "r,g,b,a" floats.
    fn color_to_str(c: Color) -> String {
        format!("{},{},{},{}", c.r, c.g, c.b, c.a)
    }

    fn str_to_color(s: &str) -> Option<Color> {
        let parts: Vec<f32> = s
            .split(',')
            .map(|p| p.trim().parse::<f32>())
            .collect::<Result<_, _>>()
            .ok()?;
        match parts.as_slice() {
            &[r, g, b, a] if parts.iter().all(|c| (0.0..=1.0).contains(c)) => {
                Some(Color::rgba(r, g, b, a))
            }
            _ => None,
        }
    }

    /// Parse "w x h", e.g. "800x600".
    fn str_to_size(s: &str) -> Option<[u32; 2]> {
        let (w, h) = s.split_once('x')?;
        let w = w.trim().parse::<u32>().ok().filter(|&w| w > 0)?;
        let h = h.trim().parse::<u32>().ok().filter(|&h| h > 0)?;
        Some([w, h])
    }

    fn path_to_str(p: &Option<PathBuf>) -> String {
        p.as_ref().map(|p| p.display().to_string()).unwrap_or_default()
    }

    pub fn serialize(&self) -> String {
        format!(
            "brush_radius={}\n\
             brush_color={}\n\
             preferred_gpu={}\n\
             texture_path={}\n\
             model_path={}\n\
             main_view_size={}x{}\n\
             texture_view_size={}x{}\n",
            self.brush_radius,
            Self::color_to_str(self.brush_color),
            self.preferred_gpu,
            Self::path_to_str(&self.texture_path),
            Self::path_to_str(&self.model_path),
            self.main_view_size[0],
            self.main_view_size[1],
            self.texture_view_size[0],
            self.texture_view_size[1],
        )
    }

    /// Parse the `key=value` format.  Unknown keys are ignored and
    /// malformed values keep their defaults.
    pub fn parse(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let Some((key, val)) = line.split_once('=') else { continue };
            let val = val.trim();
            match key.trim() {
                "brush_radius" => {
                    if let Ok(r) = val.parse::<f32>()
                        && r.is_finite()
                    {
                        s.brush_radius = r.clamp(MIN_RADIUS, MAX_RADIUS);
                    }
                }
                "brush_color" => {
                    if let Some(c) = Self::str_to_color(val) {
                        s.brush_color = c;
                    }
                }
                "preferred_gpu" => s.preferred_gpu = val.to_string(),
                "texture_path" => {
                    s.texture_path = (!val.is_empty()).then(|| PathBuf::from(val));
                }
                "model_path" => {
                    s.model_path = (!val.is_empty()).then(|| PathBuf::from(val));
                }
                "main_view_size" => {
                    if let Some(sz) = Self::str_to_size(val) {
                        s.main_view_size = sz;
                    }
                }
                "texture_view_size" => {
                    if let Some(sz) = Self::str_to_size(val) {
                        s.texture_view_size = sz;
                    }
                }
                _ => {}
            }
        }
        s
    }

    /// Save settings to disk
    pub fn save(&self) {
        let Some(path) = Self::settings_path() else { return };
        if let Err(e) = std::fs::write(&path, self.serialize()) {
            crate::log_warn!("[Settings] could not write {}: {}", path.display(), e);
        }
    }

    /// Load settings from disk (returns default if file missing or corrupt)
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else { return Self::default() };
        let Ok(content) = std::fs::read_to_string(&path) else { return Self::default() };
        Self::parse(&content)
    }
}
