//! Client metrics.
//!
//! Process-wide counters for connection attempts and notification outcomes,
//! plus gauges for the dispatch window. Registered with metriken so they are
//! exposed by whatever exporter the application runs.

use metriken::{Counter, Gauge, metric};

// ── Connection ───────────────────────────────────────────────────

#[metric(
    name = "pushline/connect/attempts",
    description = "Total connection attempts"
)]
pub static CONNECT_ATTEMPTS: Counter = Counter::new();

#[metric(
    name = "pushline/connect/failures",
    description = "Connection attempts that failed"
)]
pub static CONNECT_FAILURES: Counter = Counter::new();

// ── Notifications ────────────────────────────────────────────────

#[metric(
    name = "pushline/notifications/sent",
    description = "Notifications sent on a stream"
)]
pub static NOTIFICATIONS_SENT: Counter = Counter::new();

#[metric(
    name = "pushline/notifications/succeeded",
    description = "Notifications accepted by the push service"
)]
pub static NOTIFICATIONS_SUCCEEDED: Counter = Counter::new();

#[metric(
    name = "pushline/notifications/failed",
    description = "Notifications rejected with a known reason"
)]
pub static NOTIFICATIONS_FAILED: Counter = Counter::new();

#[metric(
    name = "pushline/notifications/invalid",
    description = "Notifications rejected before sending (bad token, oversized payload)"
)]
pub static NOTIFICATIONS_INVALID: Counter = Counter::new();

#[metric(
    name = "pushline/notifications/unclassified",
    description = "Responses with an unknown reason, a malformed body, or no response in time"
)]
pub static NOTIFICATIONS_UNCLASSIFIED: Counter = Counter::new();

// ── Window ───────────────────────────────────────────────────────

#[metric(
    name = "pushline/streams/open",
    description = "Streams sent and not yet classified"
)]
pub static STREAMS_OPEN: Gauge = Gauge::new();

#[metric(
    name = "pushline/streams/window",
    description = "Current effective concurrency window"
)]
pub static STREAMS_WINDOW: Gauge = Gauge::new();
