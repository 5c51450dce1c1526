// TexPaint library: painting pipeline, surface picking and the GPU side of
// the 3D view.  The binary in main.rs only wires these together.
#![allow(clippy::too_many_arguments)]

pub mod logger;

pub mod app;
pub mod brush;
pub mod camera;
pub mod canvas;
pub mod cli;
pub mod coords;
pub mod gpu;
pub mod io;
pub mod model;
pub mod painting;
pub mod picker;
pub mod settings;
pub mod stroke;
pub mod sync;
