//! The rendering pipeline: one synchronous pass from input URL to
//! artifact, with stage callbacks and cooperative cancellation at stage
//! boundaries.

use crate::resources::{collect_style_text, execute_scripts, resolve_resource_base_url};
use css::parser::parse_css_with_diagnostics;
use html::parser::parse_html_with_diagnostics;
use layout::engine::layout_document;
use log::info;
use net::fetcher::Fetcher;
use net::loader::ResourceCache;
use renderer::{render_to_canvas, render_to_text, write_ppm};

/// Stage of the rendering pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Loading the document.
    Fetching,
    /// Parsing HTML.
    Parsing,
    /// Collecting and parsing stylesheets.
    Styling,
    /// Computing geometry.
    Layout,
    /// Painting and writing the artifact.
    Rendering,
}

/// Lowercase display name of a pipeline stage.
#[must_use]
pub const fn pipeline_stage_name(stage: PipelineStage) -> &'static str {
    match stage {
        PipelineStage::Fetching => "fetching",
        PipelineStage::Parsing => "parsing",
        PipelineStage::Styling => "styling",
        PipelineStage::Layout => "layout",
        PipelineStage::Rendering => "rendering",
    }
}

/// What kind of artifact the pipeline writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Binary PPM image.
    #[default]
    Headless,
    /// Indented text transcript of the layout tree.
    Shell,
}

/// Options for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Viewport width in px; must be positive.
    pub width: i32,
    /// Viewport height in px; must be positive.
    pub height: i32,
    /// Artifact path; must be non-empty.
    pub output_path: String,
    /// Artifact kind.
    pub output_mode: OutputMode,
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// True when the artifact was produced.
    pub ok: bool,
    /// Success message (with warning summary) or the failure reason.
    pub message: String,
}

fn make_error(message: String) -> RunResult {
    RunResult { ok: false, message }
}

fn join_warnings(warnings: &[String]) -> String {
    warnings.join(" | ")
}

/// First warning flattened to one line and clipped to 96 characters.
fn first_warning_snippet(warnings: &[String]) -> String {
    const MAX_SNIPPET_LENGTH: usize = 96;

    let Some(first) = warnings.first() else {
        return String::new();
    };

    let mut snippet: String = first
        .chars()
        .map(|character| {
            if matches!(character, '\n' | '\r' | '\t') {
                ' '
            } else {
                character
            }
        })
        .collect();
    snippet = snippet.trim().to_owned();

    if snippet.chars().count() > MAX_SNIPPET_LENGTH {
        snippet = snippet
            .chars()
            .take(MAX_SNIPPET_LENGTH - 3)
            .collect::<String>()
            + "...";
    }

    snippet
}

/// Drive the whole pipeline for one input. The stage observer fires at
/// each stage entry; the cancel check is consulted at stage boundaries
/// and aborts the run with a stage-specific message when it reports
/// true.
pub fn run(
    url: &str,
    options: &RunOptions,
    fetcher: &dyn Fetcher,
    on_stage_enter: &mut dyn FnMut(PipelineStage),
    is_cancelled: &dyn Fn() -> bool,
) -> RunResult {
    if url.is_empty() {
        return make_error("URL is empty.".to_owned());
    }
    if options.width <= 0 || options.height <= 0 {
        return make_error("Viewport width and height must be positive.".to_owned());
    }
    if options.output_path.is_empty() {
        return make_error("Output path is empty.".to_owned());
    }

    // Fetch stage
    on_stage_enter(PipelineStage::Fetching);
    if is_cancelled() {
        return make_error("Navigation cancelled during fetch".to_owned());
    }
    let mut resource_cache = ResourceCache::new();
    let document_text = resource_cache.load_cached(url, fetcher);
    if !document_text.ok {
        return make_error(format!("Document load failed: {}", document_text.error));
    }

    let mut warnings: Vec<String> = Vec::new();
    if !document_text.fetch_diagnostic.is_empty() {
        warnings.push(document_text.fetch_diagnostic.clone());
    }

    // Parse stage
    if is_cancelled() {
        return make_error("Navigation cancelled before parsing".to_owned());
    }
    on_stage_enter(PipelineStage::Parsing);
    let parse_result = parse_html_with_diagnostics(&document_text.text);
    let mut document = parse_result.document;
    for parse_warning in &parse_result.warnings {
        warnings.push(format!(
            "HTML recovery: {} ({})",
            parse_warning.message, parse_warning.recovery_action
        ));
    }

    let resource_base_url =
        resolve_resource_base_url(&document, &document_text.final_url, &mut warnings);

    execute_scripts(
        &mut document,
        &resource_base_url,
        &mut warnings,
        &mut resource_cache,
        fetcher,
    );

    // Style stage
    if is_cancelled() {
        return make_error("Navigation cancelled before styling".to_owned());
    }
    on_stage_enter(PipelineStage::Styling);
    let style_text = collect_style_text(
        &document,
        &resource_base_url,
        &mut warnings,
        &mut resource_cache,
        fetcher,
    );
    let css_result = parse_css_with_diagnostics(&style_text);
    for style_warning in &css_result.warnings {
        warnings.push(format!(
            "{}: {}",
            style_warning.message, style_warning.selector
        ));
    }
    let stylesheet = css_result.stylesheet;

    // Layout stage
    if is_cancelled() {
        return make_error("Navigation cancelled before layout".to_owned());
    }
    on_stage_enter(PipelineStage::Layout);
    let layout_root = layout_document(&document, &stylesheet, options.width);

    // Render stage
    if is_cancelled() {
        return make_error("Navigation cancelled before rendering".to_owned());
    }
    on_stage_enter(PipelineStage::Rendering);
    let write_outcome = match options.output_mode {
        OutputMode::Headless => {
            let canvas = render_to_canvas(&layout_root, options.width, options.height);
            write_ppm(&canvas, &options.output_path)
        }
        OutputMode::Shell => {
            let transcript = render_to_text(&layout_root);
            std::fs::write(&options.output_path, transcript).map_err(Into::into)
        }
    };
    if write_outcome.is_err() {
        return make_error(format!(
            "Failed to write output file: {}",
            options.output_path
        ));
    }

    info!(
        "pipeline: rendered {} with {} warning(s)",
        document_text.final_url,
        warnings.len()
    );

    let mut message = format!(
        "Rendered {} to {}",
        document_text.final_url, options.output_path
    );
    if !warnings.is_empty() {
        message.push_str(&format!(
            "\nWarning summary: {} warning(s); first: {}",
            warnings.len(),
            first_warning_snippet(&warnings)
        ));
        message.push_str(&format!("\nWarnings: {}", join_warnings(&warnings)));
    }

    RunResult { ok: true, message }
}
