use std::process::ExitCode;

use clap::Parser;
use eframe::egui;

use texpaint::app::{Startup, TexPaintApp};
use texpaint::cli::CliArgs;
use texpaint::settings::AppSettings;
use texpaint::{log_err, log_info, logger};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    // Initialize session log (overwrites previous session log)
    logger::init();

    let mut settings = AppSettings::load();
    args.apply_to(&mut settings);
    log_info!(
        "[Startup] texture={:?} model={:?} gpu={:?} radius={}",
        settings.texture_path,
        settings.model_path,
        settings.preferred_gpu,
        settings.brush_radius
    );

    // -- Everything that can fail happens before the window opens --------
    let startup = match Startup::build(&settings) {
        Ok(s) => s,
        Err(e) => {
            log_err!("[Startup] {}", e);
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let [main_w, main_h] = settings.main_view_size;
    let [tex_w, tex_h] = settings.texture_view_size;
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([(main_w + tex_w) as f32, main_h.max(tex_h) as f32])
            .with_title("TexPaint"),
        ..Default::default()
    };

    let result = eframe::run_native(
        "TexPaint",
        options,
        Box::new(move |cc| Box::new(TexPaintApp::new(cc, settings, startup))),
    );
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log_err!("[Startup] window creation failed: {}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
