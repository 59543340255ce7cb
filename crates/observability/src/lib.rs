use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct AppMetrics {
    requests_total: AtomicU64,
    generated_total: AtomicU64,
    invalid_input_total: AtomicU64,
    generation_failures_total: AtomicU64,
    fallback_renders_total: AtomicU64,
    total_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub generated_total: u64,
    pub invalid_input_total: u64,
    pub generation_failures_total: u64,
    pub fallback_renders_total: u64,
    pub avg_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_generated(&self) {
        self.generated_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_invalid_input(&self) {
        self.invalid_input_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_generation_failure(&self) {
        self.generation_failures_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_fallback_render(&self) {
        self.fallback_renders_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests = self.requests_total.load(Ordering::Relaxed);

        MetricsSnapshot {
            requests_total: requests,
            generated_total: self.generated_total.load(Ordering::Relaxed),
            invalid_input_total: self.invalid_input_total.load(Ordering::Relaxed),
            generation_failures_total: self.generation_failures_total.load(Ordering::Relaxed),
            fallback_renders_total: self.fallback_renders_total.load(Ordering::Relaxed),
            avg_latency_millis: per_request(
                self.total_latency_millis.load(Ordering::Relaxed),
                requests,
            ),
        }
    }
}

fn per_request(total: u64, requests: u64) -> f64 {
    match requests {
        0 => 0.0,
        count => total as f64 / count as f64,
    }
}

const WORKSPACE_TARGETS: [&str; 3] = ["showme_api", "showme_agents", "tower_http"];

/// Filter used when `RUST_LOG` is unset: the binary's own target plus the
/// workspace crates that emit request logs, all at `info`.
pub fn default_filter_directives(service_name: &str) -> String {
    let mut targets = vec![service_name];
    targets.extend(
        WORKSPACE_TARGETS
            .iter()
            .copied()
            .filter(|target| *target != service_name),
    );
    targets
        .iter()
        .map(|target| format!("{target}=info"))
        .collect::<Vec<_>>()
        .join(",")
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter_directives(service_name)));

        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .init();
    });
}
