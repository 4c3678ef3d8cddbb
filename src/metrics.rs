//! Lightweight runtime metrics aggregation for the qrmark service
//!
//! Counters are cumulative for the life of the process. A background task
//! logs a summary every interval; the `/metrics` route renders the same
//! snapshot as JSON or Prometheus text.

use crate::config::MetricsFormat;
use crate::watermark::Position;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};
use tokio::time::{self, MissedTickBehavior};
use tracing::info;

static METRICS: OnceLock<Arc<MetricsInner>> = OnceLock::new();

/// Outcome of one generation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// PNG produced
    Success,
    /// Request failed with the given error kind
    Failure(&'static str),
}

/// Enable metrics aggregation and periodic emission with the provided interval in seconds.
///
/// Must be called from within a Tokio runtime.
pub fn enable(interval_secs: u64) {
    let interval = interval_secs.max(5);
    let inner = Arc::clone(METRICS.get_or_init(|| Arc::new(MetricsInner::new(interval))));
    inner.update_interval(interval);
    inner.ensure_task();
}

/// Record one generation request.
///
/// `position` is only set for watermarked requests.
pub fn record(duration: Duration, outcome: Outcome, position: Option<Position>) {
    if let Some(inner) = METRICS.get() {
        inner.record(duration, outcome, position);
    }
}

/// Render the current snapshot, returning the content type and body.
pub fn render(format: MetricsFormat) -> Option<(&'static str, Vec<u8>)> {
    let snapshot = METRICS.get()?.snapshot();
    match format {
        MetricsFormat::Json => {
            let body = serde_json::to_vec(&snapshot_to_http(&snapshot)).ok()?;
            Some(("application/json", body))
        }
        MetricsFormat::Prometheus => Some((
            "text/plain; version=0.0.4",
            render_prometheus(&snapshot).into_bytes(),
        )),
    }
}

struct MetricsInner {
    state: Mutex<MetricsState>,
    interval_secs: AtomicU64,
    task_spawned: AtomicBool,
}

impl MetricsInner {
    fn new(interval_secs: u64) -> Self {
        Self {
            state: Mutex::new(MetricsState::new()),
            interval_secs: AtomicU64::new(interval_secs.max(5)),
            task_spawned: AtomicBool::new(false),
        }
    }

    fn update_interval(&self, interval_secs: u64) {
        self.interval_secs
            .store(interval_secs.max(5), Ordering::Relaxed);
    }

    fn ensure_task(self: &Arc<Self>) {
        if self
            .task_spawned
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let runner = Arc::clone(self);
            tokio::spawn(async move {
                runner.run().await;
            });
        }
    }

    fn record(&self, duration: Duration, outcome: Outcome, position: Option<Position>) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.total_requests += 1;
        match outcome {
            Outcome::Success => {
                state.successes += 1;
                state.success_duration += duration;
                if duration > state.max_duration {
                    state.max_duration = duration;
                }
                if let Some(position) = position {
                    state.watermarked += 1;
                    *state.per_position.entry(position.as_str()).or_default() += 1;
                }
            }
            Outcome::Failure(kind) => {
                state.failures += 1;
                *state.failures_by_kind.entry(kind).or_default() += 1;
                if let Some(position) = position {
                    *state.failures_by_position.entry(position.as_str()).or_default() += 1;
                }
            }
        }
    }

    fn snapshot(&self) -> Snapshot {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.snapshot()
    }

    async fn run(self: Arc<Self>) {
        let mut current_secs = self.interval_secs.load(Ordering::Relaxed).max(5);
        loop {
            let mut ticker = time::interval(Duration::from_secs(current_secs));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately; report after a full interval
            ticker.tick().await;

            loop {
                ticker.tick().await;
                log_snapshot(&self.snapshot());

                let next_secs = self.interval_secs.load(Ordering::Relaxed).max(5);
                if next_secs != current_secs {
                    current_secs = next_secs;
                    break;
                }
            }
        }
    }
}

struct MetricsState {
    started: Instant,
    total_requests: u64,
    successes: u64,
    failures: u64,
    watermarked: u64,
    success_duration: Duration,
    max_duration: Duration,
    per_position: BTreeMap<&'static str, u64>,
    failures_by_kind: BTreeMap<&'static str, u64>,
    failures_by_position: BTreeMap<&'static str, u64>,
}

impl MetricsState {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            total_requests: 0,
            successes: 0,
            failures: 0,
            watermarked: 0,
            success_duration: Duration::ZERO,
            max_duration: Duration::ZERO,
            per_position: BTreeMap::new(),
            failures_by_kind: BTreeMap::new(),
            failures_by_position: BTreeMap::new(),
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            uptime: self.started.elapsed(),
            total_requests: self.total_requests,
            successes: self.successes,
            failures: self.failures,
            watermarked: self.watermarked,
            success_duration: self.success_duration,
            max_duration: self.max_duration,
            per_position: self.per_position.clone(),
            failures_by_kind: self.failures_by_kind.clone(),
            failures_by_position: self.failures_by_position.clone(),
        }
    }
}

#[derive(Clone)]
struct Snapshot {
    uptime: Duration,
    total_requests: u64,
    successes: u64,
    failures: u64,
    watermarked: u64,
    success_duration: Duration,
    max_duration: Duration,
    per_position: BTreeMap<&'static str, u64>,
    failures_by_kind: BTreeMap<&'static str, u64>,
    failures_by_position: BTreeMap<&'static str, u64>,
}

impl Snapshot {
    fn avg_latency_secs(&self) -> f64 {
        if self.successes == 0 {
            0.0
        } else {
            self.success_duration.as_secs_f64() / self.successes as f64
        }
    }

    fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.successes as f64 / self.total_requests as f64
        }
    }
}

fn log_snapshot(snapshot: &Snapshot) {
    info!(
        target: "qrmark::metrics",
        uptime_secs = snapshot.uptime.as_secs(),
        total_requests = snapshot.total_requests,
        success_count = snapshot.successes,
        failure_count = snapshot.failures,
        watermarked = snapshot.watermarked,
        avg_latency_ms = snapshot.avg_latency_secs() * 1_000.0,
        max_latency_ms = snapshot.max_duration.as_secs_f64() * 1_000.0,
        success_rate = format_args!("{:.1}%", snapshot.success_rate() * 100.0),
        "Generation metrics"
    );

    if !snapshot.failures_by_kind.is_empty() {
        let breakdown = snapshot
            .failures_by_kind
            .iter()
            .map(|(kind, count)| format!("{kind}: {count}"))
            .collect::<Vec<_>>()
            .join(", ");
        info!(target: "qrmark::metrics", breakdown, "Failures by kind");
    }
}

#[derive(Serialize)]
struct HttpMetrics {
    uptime_secs: u64,
    total_requests: u64,
    successes: u64,
    failures: u64,
    watermarked: u64,
    success_rate: f64,
    avg_latency_ms: f64,
    max_latency_ms: f64,
    per_position: BTreeMap<&'static str, u64>,
    failures_by_kind: BTreeMap<&'static str, u64>,
    failures_by_position: BTreeMap<&'static str, u64>,
}

fn snapshot_to_http(snapshot: &Snapshot) -> HttpMetrics {
    HttpMetrics {
        uptime_secs: snapshot.uptime.as_secs(),
        total_requests: snapshot.total_requests,
        successes: snapshot.successes,
        failures: snapshot.failures,
        watermarked: snapshot.watermarked,
        success_rate: snapshot.success_rate() * 100.0,
        avg_latency_ms: snapshot.avg_latency_secs() * 1_000.0,
        max_latency_ms: snapshot.max_duration.as_secs_f64() * 1_000.0,
        per_position: snapshot.per_position.clone(),
        failures_by_kind: snapshot.failures_by_kind.clone(),
        failures_by_position: snapshot.failures_by_position.clone(),
    }
}

fn render_prometheus(snapshot: &Snapshot) -> String {
    let mut output = String::new();

    let _ = writeln!(
        &mut output,
        "# HELP qrmark_uptime_seconds Seconds since metrics were enabled"
    );
    let _ = writeln!(&mut output, "# TYPE qrmark_uptime_seconds gauge");
    let _ = writeln!(
        &mut output,
        "qrmark_uptime_seconds {}",
        snapshot.uptime.as_secs()
    );

    let _ = writeln!(
        &mut output,
        "# HELP qrmark_requests_total Generation requests handled"
    );
    let _ = writeln!(&mut output, "# TYPE qrmark_requests_total counter");
    let _ = writeln!(
        &mut output,
        "qrmark_requests_total{{result=\"success\"}} {}",
        snapshot.successes
    );
    let _ = writeln!(
        &mut output,
        "qrmark_requests_total{{result=\"failure\"}} {}",
        snapshot.failures
    );

    let _ = writeln!(
        &mut output,
        "# HELP qrmark_watermarked_total Successful requests that composited a watermark"
    );
    let _ = writeln!(&mut output, "# TYPE qrmark_watermarked_total counter");
    for (position, count) in &snapshot.per_position {
        let _ = writeln!(
            &mut output,
            "qrmark_watermarked_total{{position=\"{}\"}} {}",
            escape_label(position),
            count
        );
    }

    let _ = writeln!(
        &mut output,
        "# HELP qrmark_failures_total Failed requests by error kind"
    );
    let _ = writeln!(&mut output, "# TYPE qrmark_failures_total counter");
    for (kind, count) in &snapshot.failures_by_kind {
        let _ = writeln!(
            &mut output,
            "qrmark_failures_total{{kind=\"{}\"}} {}",
            escape_label(kind),
            count
        );
    }

    let _ = writeln!(
        &mut output,
        "# HELP qrmark_watermark_failures_total Failed watermarked requests by position"
    );
    let _ = writeln!(&mut output, "# TYPE qrmark_watermark_failures_total counter");
    for (position, count) in &snapshot.failures_by_position {
        let _ = writeln!(
            &mut output,
            "qrmark_watermark_failures_total{{position=\"{}\"}} {}",
            escape_label(position),
            count
        );
    }

    let _ = writeln!(
        &mut output,
        "# HELP qrmark_latency_seconds Generation latency for successful requests"
    );
    let _ = writeln!(&mut output, "# TYPE qrmark_latency_seconds gauge");
    let _ = writeln!(
        &mut output,
        "qrmark_latency_seconds{{stat=\"avg\"}} {:.6}",
        snapshot.avg_latency_secs()
    );
    let _ = writeln!(
        &mut output,
        "qrmark_latency_seconds{{stat=\"max\"}} {:.6}",
        snapshot.max_duration.as_secs_f64()
    );

    output
}

fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('"', "\\\"")
}
