//! Software painter: canvas, colors, glyphs, and artifact writers.

pub mod canvas;
pub mod color;
pub mod glyphs;
pub mod paint;
pub mod ppm;
pub mod text_mode;
pub mod trace;

pub use canvas::Canvas;
pub use color::Color;
pub use paint::render_to_canvas;
pub use ppm::write_ppm;
pub use text_mode::render_to_text;
pub use trace::{RenderMetadata, RenderStage, RenderTrace, render_to_canvas_traced};
