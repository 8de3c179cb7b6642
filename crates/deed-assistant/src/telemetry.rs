//! Telemetry service
//!
//! Constructed once and handed to whoever needs it as `Arc<dyn Telemetry>`.
//! Events recorded before `start()` or after `shutdown()` are dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TelemetryEvent {
    RemoteAttemptFailed {
        operation: String,
        attempt: u32,
        reason: String,
    },
    FallbackUsed {
        operation: String,
        reason: String,
    },
    RemoteSucceeded {
        operation: String,
        attempts: u32,
        elapsed_ms: u64,
    },
    StepTransition {
        from: String,
        to: String,
    },
    GenerationFailed {
        detail: String,
    },
}

pub trait Telemetry: Send + Sync {
    fn start(&self);
    fn record(&self, event: TelemetryEvent);
    /// Drain buffered events
    fn flush(&self) -> Vec<TelemetryEvent>;
    fn shutdown(&self);
}

/// Discards everything
#[derive(Debug, Default)]
pub struct NoopTelemetry;

impl Telemetry for NoopTelemetry {
    fn start(&self) {}
    fn record(&self, _event: TelemetryEvent) {}
    fn flush(&self) -> Vec<TelemetryEvent> {
        Vec::new()
    }
    fn shutdown(&self) {}
}

#[derive(Debug, Default)]
struct RecorderState {
    running: bool,
    stopped: bool,
    buffer: Vec<TelemetryEvent>,
}

/// Buffers events in memory until flushed
#[derive(Debug, Default)]
pub struct RecordingTelemetry {
    state: Mutex<RecorderState>,
}

impl RecordingTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffered events without draining them
    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.state
            .lock()
            .map(|s| s.buffer.clone())
            .unwrap_or_default()
    }
}

impl Telemetry for RecordingTelemetry {
    fn start(&self) {
        if let Ok(mut state) = self.state.lock() {
            if !state.stopped {
                state.running = true;
            }
        }
    }

    fn record(&self, event: TelemetryEvent) {
        if let Ok(mut state) = self.state.lock() {
            if state.running {
                state.buffer.push(event);
            }
        }
    }

    fn flush(&self) -> Vec<TelemetryEvent> {
        self.state
            .lock()
            .map(|mut s| std::mem::take(&mut s.buffer))
            .unwrap_or_default()
    }

    fn shutdown(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.running = false;
            state.stopped = true;
        }
    }
}

/// Forwards events to `tracing`
#[derive(Debug, Default)]
pub struct TracingTelemetry {
    running: AtomicBool,
}

impl TracingTelemetry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Telemetry for TracingTelemetry {
    fn start(&self) {
        self.running.store(true, Ordering::SeqCst);
    }

    fn record(&self, event: TelemetryEvent) {
        if !self.running.load(Ordering::SeqCst) {
            return;
        }
        match event {
            TelemetryEvent::RemoteAttemptFailed {
                operation,
                attempt,
                reason,
            } => info!(%operation, attempt, %reason, "telemetry: remote attempt failed"),
            TelemetryEvent::FallbackUsed { operation, reason } => {
                warn!(%operation, %reason, "telemetry: fallback used")
            }
            TelemetryEvent::RemoteSucceeded {
                operation,
                attempts,
                elapsed_ms,
            } => info!(%operation, attempts, elapsed_ms, "telemetry: remote succeeded"),
            TelemetryEvent::StepTransition { from, to } => {
                info!(%from, %to, "telemetry: step transition")
            }
            TelemetryEvent::GenerationFailed { detail } => {
                warn!(%detail, "telemetry: generation failed")
            }
        }
    }

    fn flush(&self) -> Vec<TelemetryEvent> {
        Vec::new()
    }

    fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}
