//! Binary PPM (P6) artifact writer.

use crate::canvas::Canvas;
use anyhow::{Result, bail};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Write the canvas as a P6 PPM: ASCII header `P6\n<W> <H>\n255\n`
/// followed by the raw RGB bytes.
pub fn write_ppm(canvas: &Canvas, path: &str) -> Result<()> {
    if canvas.is_empty() {
        bail!("canvas has no drawable area");
    }
    if path.is_empty() {
        bail!("output path is empty");
    }

    let mut output = File::create(Path::new(path))?;
    write!(output, "P6\n{} {}\n255\n", canvas.width(), canvas.height())?;
    output.write_all(canvas.pixels())?;
    output.flush()?;
    Ok(())
}
