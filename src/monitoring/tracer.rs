/*!
 * Structured Tracing
 * Subscriber setup and spans for CPU threads and long-running operations
 *
 * `log` records from the library are bridged into the subscriber, so one
 * filter (`RUST_LOG`) governs both.
 */

use crate::core::types::CpuId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info, span, warn, Level, Span};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Environment variable switching the output to JSON
pub const ENV_TRACE_JSON: &str = "KERNEL_TRACE_JSON";

static NEXT_TRACE_ID: AtomicU64 = AtomicU64::new(1);

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - KERNEL_TRACE_JSON: Enable JSON output (default: false)
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var(ENV_TRACE_JSON)
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .init();
        info!("Structured tracing initialized with JSON output");
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .init();
        info!("Structured tracing initialized");
    }
}

/// Span covering one CPU's dispatch loop
pub fn span_cpu(cpu: CpuId) -> Span {
    span!(Level::INFO, "cpu", id = cpu)
}

/// Span for a named operation, warning when it runs long
pub struct OperationSpan {
    span: Span,
    start: Instant,
    trace_id: u64,
}

impl OperationSpan {
    pub fn new(operation: &str) -> Self {
        let trace_id = NEXT_TRACE_ID.fetch_add(1, Ordering::Relaxed);
        let span = span!(
            Level::DEBUG,
            "operation",
            trace_id = trace_id,
            operation = operation,
            duration_us = tracing::field::Empty,
            items_processed = tracing::field::Empty,
        );
        debug!(parent: &span, operation = operation, "operation started");

        Self {
            span,
            start: Instant::now(),
            trace_id,
        }
    }

    #[inline]
    pub fn trace_id(&self) -> u64 {
        self.trace_id
    }

    pub fn record_items_processed(&self, count: usize) {
        self.span.record("items_processed", count);
    }

    /// Enter the span on the current thread
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for OperationSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        let _entered = self.span.enter();
        self.span.record("duration_us", duration.as_micros() as u64);

        if duration.as_millis() > 100 {
            warn!(
                trace_id = self.trace_id,
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow operation detected"
            );
        } else {
            debug!(
                trace_id = self.trace_id,
                duration_us = duration.as_micros() as u64,
                "operation completed"
            );
        }
    }
}

/// Convenience constructor for [`OperationSpan`]
#[inline]
pub fn span_operation(operation: &str) -> OperationSpan {
    OperationSpan::new(operation)
}
