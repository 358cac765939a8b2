//! Render-stage tracing and artifact metadata.

use crate::canvas::Canvas;
use crate::paint::{self, resolve_initial_canvas_color};
use anyhow::{Result, bail};
use layout::engine::LayoutBox;
use std::fmt::Write as _;
use std::fs;
use std::time::Instant;

/// Stages of one render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStage {
    CanvasInit,
    BackgroundResolve,
    Paint,
    Complete,
}

/// Display name of a render stage.
#[must_use]
pub const fn render_stage_name(stage: RenderStage) -> &'static str {
    match stage {
        RenderStage::CanvasInit => "CanvasInit",
        RenderStage::BackgroundResolve => "BackgroundResolve",
        RenderStage::Paint => "Paint",
        RenderStage::Complete => "Complete",
    }
}

/// One recorded stage entry.
#[derive(Debug, Clone, Copy)]
pub struct RenderTraceEntry {
    /// The stage entered.
    pub stage: RenderStage,
    /// When it was entered.
    pub entered_at: Instant,
    /// Milliseconds since the previous entry; zero for the first.
    pub elapsed_since_prev_ms: f64,
}

/// Ordered stage entries for one render.
#[derive(Debug, Clone, Default)]
pub struct RenderTrace {
    pub entries: Vec<RenderTraceEntry>,
}

impl RenderTrace {
    /// Record entry into a stage.
    pub fn record(&mut self, stage: RenderStage) {
        let entered_at = Instant::now();
        let elapsed_since_prev_ms = self.entries.last().map_or(0.0, |previous| {
            entered_at.duration_since(previous.entered_at).as_secs_f64() * 1000.0
        });
        self.entries.push(RenderTraceEntry {
            stage,
            entered_at,
            elapsed_since_prev_ms,
        });
    }

    /// Compare against another trace: identical stage order, and stage
    /// timings within a factor-based tolerance floored at 50 ms.
    #[must_use]
    pub fn is_reproducible_with(&self, other: &Self, tolerance_factor: f64) -> bool {
        if self.entries.len() != other.entries.len() {
            return false;
        }
        if self
            .entries
            .iter()
            .zip(&other.entries)
            .any(|(mine, theirs)| mine.stage != theirs.stage)
        {
            return false;
        }

        for index in 1..self.entries.len() {
            let mine = self.entries[index].elapsed_since_prev_ms;
            let theirs = other.entries[index].elapsed_since_prev_ms;
            let average = (mine + theirs) / 2.0;
            let tolerance = f64::max(average * tolerance_factor, 50.0);
            if (mine - theirs).abs() > tolerance {
                return false;
            }
        }
        true
    }
}

/// Write a trace as `stage=<name> elapsed_ms=<ms>` lines.
pub fn write_render_trace(trace: &RenderTrace, path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("trace path is empty");
    }

    let mut output = String::new();
    for entry in &trace.entries {
        let _ = writeln!(
            output,
            "stage={} elapsed_ms={}",
            render_stage_name(entry.stage),
            entry.elapsed_since_prev_ms
        );
    }
    fs::write(path, output)?;
    Ok(())
}

/// Size and timing facts about one rendered artifact.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderMetadata {
    pub width: i32,
    pub height: i32,
    pub pixel_count: usize,
    pub byte_count: usize,
    pub render_duration_ms: f64,
}

/// Write metadata as `key=value` lines.
pub fn write_render_metadata(metadata: &RenderMetadata, path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("metadata path is empty");
    }

    let mut output = String::new();
    let _ = writeln!(output, "width={}", metadata.width);
    let _ = writeln!(output, "height={}", metadata.height);
    let _ = writeln!(output, "pixel_count={}", metadata.pixel_count);
    let _ = writeln!(output, "byte_count={}", metadata.byte_count);
    let _ = writeln!(output, "render_duration_ms={}", metadata.render_duration_ms);
    fs::write(path, output)?;
    Ok(())
}

/// Paint with a stage trace recorded along the way.
#[must_use]
pub fn render_to_canvas_traced(
    root: &LayoutBox,
    width: i32,
    height: i32,
    trace: &mut RenderTrace,
) -> Canvas {
    trace.record(RenderStage::CanvasInit);
    let mut canvas = Canvas::new(width, height);

    trace.record(RenderStage::BackgroundResolve);
    canvas.clear(resolve_initial_canvas_color(root));

    trace.record(RenderStage::Paint);
    paint::paint_box_tree(root, &mut canvas);

    trace.record(RenderStage::Complete);
    canvas
}

/// Paint with both a trace and artifact metadata.
#[must_use]
pub fn render_to_canvas_with_metadata(
    root: &LayoutBox,
    width: i32,
    height: i32,
    metadata: &mut RenderMetadata,
    trace: &mut RenderTrace,
) -> Canvas {
    let started = Instant::now();
    let canvas = render_to_canvas_traced(root, width, height, trace);

    metadata.width = canvas.width();
    metadata.height = canvas.height();
    metadata.pixel_count = canvas.width() as usize * canvas.height() as usize;
    metadata.byte_count = canvas.pixels().len();
    metadata.render_duration_ms = started.elapsed().as_secs_f64() * 1000.0;
    canvas
}
