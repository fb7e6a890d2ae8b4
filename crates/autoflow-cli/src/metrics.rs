use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Counter {
    Requests,
    Rejected,
    Fallbacks,
    Invalid,
    Submitted,
    Failed,
}

impl Counter {
    const ALL: [Counter; 6] = [
        Counter::Requests,
        Counter::Rejected,
        Counter::Fallbacks,
        Counter::Invalid,
        Counter::Submitted,
        Counter::Failed,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Counter::Requests => "requests",
            Counter::Rejected => "rejected",
            Counter::Fallbacks => "fallbacks",
            Counter::Invalid => "invalid",
            Counter::Submitted => "submitted",
            Counter::Failed => "failed",
        }
    }

    fn help(self) -> &'static str {
        match self {
            Counter::Requests => "Prompts received.",
            Counter::Rejected => "Prompts rejected by the safety gate.",
            Counter::Fallbacks => "Plans replaced by the fallback workflow.",
            Counter::Invalid => "Workflows that failed structural validation.",
            Counter::Submitted => "Workflows accepted by the platform.",
            Counter::Failed => "Runs aborted by an upstream or submission failure.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Safety,
    Generation,
    Normalize,
    Validate,
    Submit,
    Total,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Safety => "safety",
            Stage::Generation => "generation",
            Stage::Normalize => "normalize",
            Stage::Validate => "validate",
            Stage::Submit => "submit",
            Stage::Total => "total",
        }
    }
}

/// Run counters and per-stage latencies of one process.
#[derive(Debug, Default)]
pub struct Metrics {
    counters: BTreeMap<Counter, u64>,
    latencies: BTreeMap<Stage, Duration>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr(&mut self, counter: Counter) {
        *self.counters.entry(counter).or_default() += 1;
    }

    pub fn get(&self, counter: Counter) -> u64 {
        self.counters.get(&counter).copied().unwrap_or(0)
    }

    /// Record the latest latency of `stage`.
    pub fn observe(&mut self, stage: Stage, elapsed: Duration) {
        self.latencies.insert(stage, elapsed);
    }

    pub fn latency(&self, stage: Stage) -> Option<Duration> {
        self.latencies.get(&stage).copied()
    }

    /// Prometheus text exposition of all counters and recorded latencies.
    pub fn render_prometheus(&self) -> String {
        let mut out = String::new();
        for counter in Counter::ALL {
            let name = format!("autoflow_{}_total", counter.as_str());
            let _ = writeln!(out, "# HELP {} {}", name, counter.help());
            let _ = writeln!(out, "# TYPE {} counter", name);
            let _ = writeln!(out, "{} {}", name, self.get(counter));
        }

        if !self.latencies.is_empty() {
            let _ = writeln!(
                out,
                "# HELP autoflow_stage_latency_seconds Latency of the last run per pipeline stage."
            );
            let _ = writeln!(out, "# TYPE autoflow_stage_latency_seconds gauge");
            for (stage, elapsed) in &self.latencies {
                let _ = writeln!(
                    out,
                    "autoflow_stage_latency_seconds{{stage=\"{}\"}} {:.6}",
                    stage.as_str(),
                    elapsed.as_secs_f64()
                );
            }
        }
        out
    }

    /// Human-readable latency lines, one per recorded stage.
    pub fn summary(&self) -> String {
        let mut out = String::from("Latency summary:");
        for (stage, elapsed) in &self.latencies {
            let _ = write!(
                out,
                "\n  {:<11}{:>10.1} ms",
                stage.as_str(),
                elapsed.as_secs_f64() * 1000.0
            );
        }
        out
    }

    /// Write the Prometheus snapshot to `path`, replacing any previous one.
    pub fn write_snapshot(&self, path: &Path) -> Result<()> {
        let stamp = chrono::Utc::now().to_rfc3339();
        let body = format!("# autoflow snapshot {}\n{}", stamp, self.render_prometheus());
        std::fs::write(path, body)
            .with_context(|| format!("Failed to write metrics snapshot: {}", path.display()))
    }
}
