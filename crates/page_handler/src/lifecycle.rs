//! Lifecycle stages and the per-session timing trace.

use std::time::Instant;

/// Engine lifecycle states. Transitions are linear from `Idle` through
/// `Complete`, with `Error` and `Cancelled` as terminal off-ramps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LifecycleStage {
    #[default]
    Idle,
    Fetching,
    Parsing,
    Styling,
    Layout,
    Rendering,
    Complete,
    Error,
    Cancelled,
}

/// Lowercase display name of a stage.
#[must_use]
pub const fn lifecycle_stage_name(stage: LifecycleStage) -> &'static str {
    match stage {
        LifecycleStage::Idle => "idle",
        LifecycleStage::Fetching => "fetching",
        LifecycleStage::Parsing => "parsing",
        LifecycleStage::Styling => "styling",
        LifecycleStage::Layout => "layout",
        LifecycleStage::Rendering => "rendering",
        LifecycleStage::Complete => "complete",
        LifecycleStage::Error => "error",
        LifecycleStage::Cancelled => "cancelled",
    }
}

/// One stage entry in the trace.
#[derive(Debug, Clone, Copy)]
pub struct StageTimingEntry {
    /// The stage entered.
    pub stage: LifecycleStage,
    /// When it was entered (monotonic).
    pub entered_at: Instant,
    /// Milliseconds since the previous entry; zero for the first.
    pub elapsed_since_prev_ms: f64,
}

/// Ordered stage entries for one session.
#[derive(Debug, Clone, Default)]
pub struct LifecycleTrace {
    pub entries: Vec<StageTimingEntry>,
}

impl LifecycleTrace {
    /// Record entry into a stage.
    pub fn record(&mut self, stage: LifecycleStage) {
        let entered_at = Instant::now();
        let elapsed_since_prev_ms = self.entries.last().map_or(0.0, |previous| {
            entered_at.duration_since(previous.entered_at).as_secs_f64() * 1000.0
        });
        self.entries.push(StageTimingEntry {
            stage,
            entered_at,
            elapsed_since_prev_ms,
        });
    }

    /// Compare stage order exactly and per-stage timings loosely: stages
    /// under 50 ms always pass; longer ones must agree within the factor.
    #[must_use]
    pub fn is_reproducible_with(&self, other: &Self, tolerance_factor: f64) -> bool {
        const MIN_TOLERANCE_MS: f64 = 50.0;

        if self.entries.len() != other.entries.len() {
            return false;
        }

        for index in 0..self.entries.len() {
            if self.entries[index].stage != other.entries[index].stage {
                return false;
            }

            if index > 0 {
                let mine = self.entries[index].elapsed_since_prev_ms;
                let theirs = other.entries[index].elapsed_since_prev_ms;
                let max_val = f64::max(mine, theirs);

                if max_val > MIN_TOLERANCE_MS {
                    let ratio = if max_val > 0.0 {
                        f64::min(mine, theirs) / max_val
                    } else {
                        1.0
                    };
                    if ratio < 1.0 / tolerance_factor {
                        return false;
                    }
                }
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::{LifecycleStage, LifecycleTrace, lifecycle_stage_name};

    #[test]
    fn stage_names_are_lowercase() {
        assert_eq!(lifecycle_stage_name(LifecycleStage::Idle), "idle");
        assert_eq!(lifecycle_stage_name(LifecycleStage::Cancelled), "cancelled");
    }

    #[test]
    fn trace_entries_are_monotonic() {
        let mut trace = LifecycleTrace::default();
        trace.record(LifecycleStage::Idle);
        trace.record(LifecycleStage::Fetching);
        trace.record(LifecycleStage::Complete);

        assert_eq!(trace.entries.len(), 3);
        for window in trace.entries.windows(2) {
            assert!(window[1].entered_at >= window[0].entered_at);
            assert!(window[1].elapsed_since_prev_ms >= 0.0);
        }
    }

    #[test]
    fn differing_stage_orders_are_not_reproducible() {
        let mut first = LifecycleTrace::default();
        first.record(LifecycleStage::Idle);
        first.record(LifecycleStage::Complete);

        let mut second = LifecycleTrace::default();
        second.record(LifecycleStage::Idle);
        second.record(LifecycleStage::Error);

        assert!(!first.is_reproducible_with(&second, 3.0));
        assert!(first.is_reproducible_with(&first.clone(), 3.0));
    }
}
