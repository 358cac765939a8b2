//! Structured diagnostics: events, the emitter, and failure traces.

use std::fmt::Write as _;
use std::time::Instant;

/// Diagnostic severity, ordered for minimum-severity filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Error,
}

/// Lowercase display name of a severity.
#[must_use]
pub const fn severity_name(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "info",
        Severity::Warning => "warning",
        Severity::Error => "error",
    }
}

/// One structured diagnostic event. Timestamps are monotonic and
/// non-decreasing within a session.
#[derive(Debug, Clone)]
pub struct DiagnosticEvent {
    /// When the event was emitted.
    pub timestamp: Instant,
    /// Event severity.
    pub severity: Severity,
    /// Originating module (e.g. `engine`).
    pub module: String,
    /// Lifecycle stage name at emit time.
    pub stage: String,
    /// Human-readable message.
    pub message: String,
    /// Session correlation id; zero when unset.
    pub correlation_id: u64,
}

/// One-line rendering of a diagnostic event.
#[must_use]
pub fn format_diagnostic(event: &DiagnosticEvent) -> String {
    let mut formatted = format!("[{}]", severity_name(event.severity));
    if !event.module.is_empty() {
        let _ = write!(formatted, " {}", event.module);
    }
    if !event.stage.is_empty() {
        let _ = write!(formatted, "/{}", event.stage);
    }
    if event.correlation_id != 0 {
        let _ = write!(formatted, " (cid:{})", event.correlation_id);
    }
    let _ = write!(formatted, ": {}", event.message);
    formatted
}

/// Callback invoked for every emitted event.
pub type DiagnosticObserver = Box<dyn Fn(&DiagnosticEvent)>;

/// Collects diagnostic events with severity filtering, a correlation id,
/// and optional observers.
#[derive(Default)]
pub struct DiagnosticEmitter {
    events: Vec<DiagnosticEvent>,
    observers: Vec<DiagnosticObserver>,
    correlation_id: u64,
    min_severity: Severity,
}

impl DiagnosticEmitter {
    /// Emit an event; dropped when below the minimum severity.
    pub fn emit(&mut self, severity: Severity, module: &str, stage: &str, message: &str) {
        if severity < self.min_severity {
            return;
        }

        let event = DiagnosticEvent {
            timestamp: Instant::now(),
            severity,
            module: module.to_owned(),
            stage: stage.to_owned(),
            message: message.to_owned(),
            correlation_id: self.correlation_id,
        };

        for observer in &self.observers {
            observer(&event);
        }
        self.events.push(event);
    }

    /// Set the correlation id stamped onto subsequent events.
    pub fn set_correlation_id(&mut self, id: u64) {
        self.correlation_id = id;
    }

    /// The current correlation id.
    #[must_use]
    pub const fn correlation_id(&self) -> u64 {
        self.correlation_id
    }

    /// Drop events below this severity from now on.
    pub fn set_min_severity(&mut self, min_severity: Severity) {
        self.min_severity = min_severity;
    }

    /// The current severity floor.
    #[must_use]
    pub const fn min_severity(&self) -> Severity {
        self.min_severity
    }

    /// Register an observer for future events.
    pub fn add_observer(&mut self, observer: DiagnosticObserver) {
        self.observers.push(observer);
    }

    /// All collected events, in emit order.
    #[must_use]
    pub fn events(&self) -> &[DiagnosticEvent] {
        &self.events
    }

    /// Events matching one severity.
    #[must_use]
    pub fn events_by_severity(&self, severity: Severity) -> Vec<DiagnosticEvent> {
        self.events
            .iter()
            .filter(|event| event.severity == severity)
            .cloned()
            .collect()
    }

    /// Events from one module.
    #[must_use]
    pub fn events_by_module(&self, module: &str) -> Vec<DiagnosticEvent> {
        self.events
            .iter()
            .filter(|event| event.module == module)
            .cloned()
            .collect()
    }

    /// Drop all collected events.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True when no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Snapshot of one failure with its surrounding context.
#[derive(Debug, Clone, Default)]
pub struct FailureTrace {
    /// Correlation id at capture time.
    pub correlation_id: u64,
    /// Module that failed.
    pub module: String,
    /// Stage at failure time.
    pub stage: String,
    /// The failure message.
    pub error_message: String,
    /// Key/value snapshots attached by the reporter.
    pub snapshots: Vec<(String, String)>,
    /// Events collected up to the failure.
    pub context_events: Vec<DiagnosticEvent>,
}

impl FailureTrace {
    /// Attach one key/value snapshot.
    pub fn add_snapshot(&mut self, key: &str, value: &str) {
        self.snapshots.push((key.to_owned(), value.to_owned()));
    }

    /// Multi-line rendering for logs.
    #[must_use]
    pub fn format(&self) -> String {
        let mut out = String::from("FailureTrace");
        if self.correlation_id != 0 {
            let _ = write!(out, " (cid:{})", self.correlation_id);
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "  module: {}", self.module);
        let _ = writeln!(out, "  stage: {}", self.stage);
        let _ = writeln!(out, "  error: {}", self.error_message);
        if !self.snapshots.is_empty() {
            let _ = writeln!(out, "  snapshots:");
            for (key, value) in &self.snapshots {
                let _ = writeln!(out, "    {key}={value}");
            }
        }
        if !self.context_events.is_empty() {
            let _ = writeln!(out, "  context_events: {}", self.context_events.len());
        }
        out
    }

    /// Exact structural comparison (timestamps ignored).
    #[must_use]
    pub fn is_reproducible_with(&self, other: &Self) -> bool {
        self.module == other.module
            && self.stage == other.stage
            && self.error_message == other.error_message
            && self.correlation_id == other.correlation_id
            && self.snapshots == other.snapshots
            && self.context_events.len() == other.context_events.len()
            && self
                .context_events
                .iter()
                .zip(&other.context_events)
                .all(|(mine, theirs)| {
                    mine.severity == theirs.severity
                        && mine.module == theirs.module
                        && mine.stage == theirs.stage
                        && mine.message == theirs.message
                })
    }
}

/// Accumulates failure traces captured against an emitter.
#[derive(Default)]
pub struct FailureTraceCollector {
    traces: Vec<FailureTrace>,
}

impl FailureTraceCollector {
    /// Capture a failure with the emitter's current context.
    pub fn capture(
        &mut self,
        emitter: &DiagnosticEmitter,
        module: &str,
        stage: &str,
        error_message: &str,
    ) -> FailureTrace {
        let trace = FailureTrace {
            correlation_id: emitter.correlation_id(),
            module: module.to_owned(),
            stage: stage.to_owned(),
            error_message: error_message.to_owned(),
            snapshots: Vec::new(),
            context_events: emitter.events().to_vec(),
        };
        self.traces.push(trace.clone());
        trace
    }

    /// All captured traces.
    #[must_use]
    pub fn traces(&self) -> &[FailureTrace] {
        &self.traces
    }

    /// Drop all captured traces.
    pub fn clear(&mut self) {
        self.traces.clear();
    }

    /// Number of captured traces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.traces.len()
    }

    /// True when nothing has been captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{DiagnosticEmitter, FailureTraceCollector, Severity, format_diagnostic};

    #[test]
    fn severity_filter_drops_low_events() {
        let mut emitter = DiagnosticEmitter::default();
        emitter.set_min_severity(Severity::Warning);
        emitter.emit(Severity::Info, "css", "styling", "dropped");
        emitter.emit(Severity::Error, "css", "styling", "kept");
        assert_eq!(emitter.len(), 1);
        assert_eq!(emitter.events()[0].message, "kept");
    }

    #[test]
    fn formatting_includes_module_stage_and_cid() {
        let mut emitter = DiagnosticEmitter::default();
        emitter.set_correlation_id(7);
        emitter.emit(Severity::Warning, "net", "fetching", "slow");
        let formatted = format_diagnostic(&emitter.events()[0]);
        assert_eq!(formatted, "[warning] net/fetching (cid:7): slow");
    }

    #[test]
    fn timestamps_never_decrease() {
        let mut emitter = DiagnosticEmitter::default();
        for index in 0..5 {
            emitter.emit(Severity::Info, "engine", "idle", &format!("event {index}"));
        }
        for window in emitter.events().windows(2) {
            assert!(window[1].timestamp >= window[0].timestamp);
        }
    }

    #[test]
    fn captured_failure_traces_compare_structurally() {
        let mut emitter = DiagnosticEmitter::default();
        emitter.emit(Severity::Error, "render", "rendering", "disk full");

        let mut collector = FailureTraceCollector::default();
        let first = collector.capture(&emitter, "render", "rendering", "disk full");
        let second = collector.capture(&emitter, "render", "rendering", "disk full");
        assert!(first.is_reproducible_with(&second));
        assert_eq!(collector.len(), 2);
    }
}
