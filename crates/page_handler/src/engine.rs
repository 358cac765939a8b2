//! The engine shell: lifecycle-tracked navigation with retry and
//! cancellation over the rendering pipeline.

use crate::config;
use crate::diagnostics::{DiagnosticEvent, Severity};
use crate::lifecycle::{LifecycleStage, LifecycleTrace, lifecycle_stage_name};
use crate::navigation::{NavigationInput, navigation_type_name, normalize_input};
use crate::pipeline::{self, OutputMode, PipelineStage, RunOptions};
use net::fetcher::{Fetcher, HttpFetcher};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// State for one `navigate` call.
#[derive(Debug, Clone, Default)]
pub struct SessionInfo {
    /// The normalized navigation input.
    pub navigation: NavigationInput,
    /// Current lifecycle stage.
    pub stage: LifecycleStage,
    /// Diagnostics in emit order; timestamps are non-decreasing.
    pub diagnostics: Vec<DiagnosticEvent>,
    /// Stage timing trace.
    pub trace: LifecycleTrace,
}

/// Render options for one navigation.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub viewport_width: i32,
    pub viewport_height: i32,
    pub output_path: String,
    pub output_mode: OutputMode,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            viewport_width: config::DEFAULT_VIEWPORT_WIDTH,
            viewport_height: config::DEFAULT_VIEWPORT_HEIGHT,
            output_path: config::DEFAULT_OUTPUT_PATH.to_owned(),
            output_mode: OutputMode::Headless,
        }
    }
}

/// What a navigation returned; the session is always attached.
#[derive(Debug, Clone)]
pub struct EngineResult {
    pub ok: bool,
    pub message: String,
    pub session: SessionInfo,
}

/// Cloneable handle that lets another thread request cancellation.
#[derive(Clone)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    /// Request cancellation; observed at the next stage boundary.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }
}

/// Record a stage transition on the session: state, trace, diagnostic.
fn transition(session: &mut SessionInfo, stage: LifecycleStage, detail: &str) {
    session.stage = stage;
    session.trace.record(stage);
    let mut message = format!("Stage transition: {}", lifecycle_stage_name(stage));
    if !detail.is_empty() {
        message.push_str(&format!(" ({detail})"));
    }
    emit(session, Severity::Info, "engine", &message);
}

/// Append a diagnostic stamped with the session's current stage.
fn emit(session: &mut SessionInfo, severity: Severity, module: &str, message: &str) {
    session.diagnostics.push(DiagnosticEvent {
        timestamp: Instant::now(),
        severity,
        module: module.to_owned(),
        stage: lifecycle_stage_name(session.stage).to_owned(),
        message: message.to_owned(),
        correlation_id: 0,
    });
}

const fn map_pipeline_stage(stage: PipelineStage) -> LifecycleStage {
    match stage {
        PipelineStage::Fetching => LifecycleStage::Fetching,
        PipelineStage::Parsing => LifecycleStage::Parsing,
        PipelineStage::Styling => LifecycleStage::Styling,
        PipelineStage::Layout => LifecycleStage::Layout,
        PipelineStage::Rendering => LifecycleStage::Rendering,
    }
}

/// Drives navigations and owns the session, the cancel flag, and the
/// fetcher.
pub struct Engine {
    session: SessionInfo,
    last_input: String,
    last_options: RenderOptions,
    cancel_requested: Arc<AtomicBool>,
    fetcher: Box<dyn Fetcher>,
}

impl Engine {
    /// Engine with the default HTTP fetcher.
    #[must_use]
    pub fn new() -> Self {
        Self::with_fetcher(Box::new(HttpFetcher::new()))
    }

    /// Engine with a caller-supplied fetcher (tests, offline use).
    #[must_use]
    pub fn with_fetcher(fetcher: Box<dyn Fetcher>) -> Self {
        Self {
            session: SessionInfo::default(),
            last_input: String::new(),
            last_options: RenderOptions::default(),
            cancel_requested: Arc::new(AtomicBool::new(false)),
            fetcher,
        }
    }

    /// Navigate to `input`, driving the full pipeline. The session is
    /// reset first; the cancel flag is cleared.
    pub fn navigate(&mut self, input: &str, options: &RenderOptions) -> EngineResult {
        self.cancel_requested.store(false, Ordering::Release);
        self.last_input = input.to_owned();
        self.last_options = options.clone();

        self.session = SessionInfo::default();
        transition(&mut self.session, LifecycleStage::Idle, "");

        let navigation = match normalize_input(input) {
            Ok(navigation) => navigation,
            Err(err) => {
                transition(&mut self.session, LifecycleStage::Error, &err);
                return EngineResult {
                    ok: false,
                    message: err,
                    session: self.session.clone(),
                };
            }
        };
        self.session.navigation = navigation;

        let target_message = format!(
            "Navigation target: {} (type: {})",
            self.session.navigation.canonical_url,
            navigation_type_name(&self.session.navigation)
        );
        emit(&mut self.session, Severity::Info, "engine", &target_message);

        let run_options = RunOptions {
            width: options.viewport_width,
            height: options.viewport_height,
            output_path: options.output_path.clone(),
            output_mode: options.output_mode,
        };

        let cancel_flag = Arc::clone(&self.cancel_requested);
        let session = &mut self.session;
        let mut on_stage_enter = |stage: PipelineStage| {
            transition(session, map_pipeline_stage(stage), "");
        };
        let is_cancelled = move || cancel_flag.load(Ordering::Acquire);

        let run_result = pipeline::run(
            input,
            &run_options,
            self.fetcher.as_ref(),
            &mut on_stage_enter,
            &is_cancelled,
        );

        if self.cancel_requested.load(Ordering::Acquire) {
            transition(&mut self.session, LifecycleStage::Cancelled, "");
        } else if run_result.ok {
            transition(&mut self.session, LifecycleStage::Complete, "");
        } else {
            transition(&mut self.session, LifecycleStage::Error, &run_result.message);
        }

        EngineResult {
            ok: run_result.ok,
            message: run_result.message,
            session: self.session.clone(),
        }
    }

    /// Re-run the previous navigation, preserving prior diagnostics so
    /// the new session keeps its context.
    pub fn retry(&mut self) -> EngineResult {
        if self.last_input.is_empty() {
            return EngineResult {
                ok: false,
                message: "No previous navigation to retry".to_owned(),
                session: self.session.clone(),
            };
        }

        let mut prior_diagnostics = std::mem::take(&mut self.session.diagnostics);
        let retry_message = format!(
            "Retry requested from stage: {}",
            lifecycle_stage_name(self.session.stage)
        );
        prior_diagnostics.push(DiagnosticEvent {
            timestamp: Instant::now(),
            severity: Severity::Info,
            module: "engine".to_owned(),
            stage: lifecycle_stage_name(self.session.stage).to_owned(),
            message: retry_message,
            correlation_id: 0,
        });

        let last_input = self.last_input.clone();
        let last_options = self.last_options.clone();
        let mut result = self.navigate(&last_input, &last_options);

        prior_diagnostics.extend(result.session.diagnostics);
        result.session.diagnostics = prior_diagnostics;
        self.session.diagnostics = result.session.diagnostics.clone();

        result
    }

    /// Request cancellation and transition to `Cancelled`. The pipeline
    /// observes the flag at its next stage boundary.
    pub fn cancel(&mut self) {
        self.cancel_requested.store(true, Ordering::Release);
        transition(&mut self.session, LifecycleStage::Cancelled, "");
        emit(&mut self.session, Severity::Info, "engine", "Cancel requested");
    }

    /// Handle for cancelling from another thread.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(Arc::clone(&self.cancel_requested))
    }

    /// The current session.
    #[must_use]
    pub const fn session(&self) -> &SessionInfo {
        &self.session
    }

    /// The current lifecycle stage.
    #[must_use]
    pub const fn current_stage(&self) -> LifecycleStage {
        self.session.stage
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
