use std::collections::HashMap;
use std::sync::Mutex;

/// Cross-cutting logger for pipeline orchestration events.
///
/// One use case instance serves many concurrent requests, so every method
/// takes `&self` and implementations must be `Sync`.
pub trait PipelineLogger: Send + Sync {
    /// Record how long a named pipeline stage took for one request.
    fn timing(&self, stage: &str, duration_ms: f64);

    /// Log a human-readable status message.
    fn info(&self, message: &str);

    /// Emit a summary of everything recorded so far. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events. Used by tests.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn timing(&self, _stage: &str, _duration_ms: f64) {}
    fn info(&self, _message: &str) {}
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct StageStats {
    count: usize,
    total_ms: f64,
    max_ms: f64,
}

/// Forwards events to the `log` crate and keeps per-stage aggregates for
/// a summary at shutdown.
#[derive(Default)]
pub struct LogPipelineLogger {
    stages: Mutex<HashMap<String, StageStats>>,
}

impl LogPipelineLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the formatted summary string, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        let stages = self.stages.lock().ok()?;
        if stages.is_empty() {
            return None;
        }

        let mut names: Vec<_> = stages.keys().collect();
        names.sort();

        let mut lines = vec!["Pipeline summary:".to_string()];
        for name in names {
            let s = &stages[name];
            let avg_ms = s.total_ms / s.count as f64;
            lines.push(format!(
                "  {name:10}: {count:5} runs  avg {avg_ms:8.1}ms  max {max:8.1}ms",
                count = s.count,
                max = s.max_ms
            ));
        }
        Some(lines.join("\n"))
    }

    fn stats_for(&self, stage: &str) -> Option<StageStats> {
        self.stages.lock().ok()?.get(stage).copied()
    }
}

impl PipelineLogger for LogPipelineLogger {
    fn timing(&self, stage: &str, duration_ms: f64) {
        log::debug!("{stage} took {duration_ms:.1}ms");
        if let Ok(mut stages) = self.stages.lock() {
            let s = stages.entry(stage.to_string()).or_default();
            s.count += 1;
            s.total_ms += duration_ms;
            s.max_ms = s.max_ms.max(duration_ms);
        }
    }

    fn info(&self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
