//! Observability and Metrics
//!
//! Counters for connections, handshakes and board traffic, shared by all
//! connection handlers of one server.
//!
//! Uses atomic counters for thread-safe metrics collection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

/// Metrics collector for one server instance
#[derive(Debug)]
pub struct Metrics {
    /// Total connections accepted
    pub connections_total: AtomicU64,
    /// Currently open connections
    pub connections_active: AtomicU64,
    /// Total handshake attempts
    pub handshakes_total: AtomicU64,
    /// Successful handshakes
    pub handshakes_success: AtomicU64,
    /// Failed handshakes (unknown user, bad challenge response, I/O)
    pub handshakes_failed: AtomicU64,
    /// Commands received from authenticated sessions
    pub commands_total: AtomicU64,
    /// Commands answered with "Invalid command"
    pub commands_invalid: AtomicU64,
    /// Placements committed to the board
    pub placements_accepted: AtomicU64,
    /// Placements rejected by validation
    pub placements_rejected: AtomicU64,
    /// Sessions ended by transport or crypto failure
    pub connection_errors: AtomicU64,
    /// Failures to accept a connection
    pub accept_errors: AtomicU64,
    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            connections_total: AtomicU64::new(0),
            connections_active: AtomicU64::new(0),
            handshakes_total: AtomicU64::new(0),
            handshakes_success: AtomicU64::new(0),
            handshakes_failed: AtomicU64::new(0),
            commands_total: AtomicU64::new(0),
            commands_invalid: AtomicU64::new(0),
            placements_accepted: AtomicU64::new(0),
            placements_rejected: AtomicU64::new(0),
            connection_errors: AtomicU64::new(0),
            accept_errors: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a new connection
    pub fn connection_established(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a connection closed
    pub fn connection_closed(&self) {
        self.connections_active.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn handshake_attempt(&self) {
        self.handshakes_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn handshake_success(&self) {
        self.handshakes_success.fetch_add(1, Ordering::Relaxed);
    }

    pub fn handshake_failed(&self) {
        self.handshakes_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn command_received(&self) {
        self.commands_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn command_invalid(&self) {
        self.commands_invalid.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of one placement attempt
    pub fn placement(&self, accepted: bool) {
        if accepted {
            self.placements_accepted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.placements_rejected.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn connection_error(&self) {
        self.connection_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn accept_error(&self) {
        self.accept_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_total: self.connections_total.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            handshakes_total: self.handshakes_total.load(Ordering::Relaxed),
            handshakes_success: self.handshakes_success.load(Ordering::Relaxed),
            handshakes_failed: self.handshakes_failed.load(Ordering::Relaxed),
            commands_total: self.commands_total.load(Ordering::Relaxed),
            commands_invalid: self.commands_invalid.load(Ordering::Relaxed),
            placements_accepted: self.placements_accepted.load(Ordering::Relaxed),
            placements_rejected: self.placements_rejected.load(Ordering::Relaxed),
            connection_errors: self.connection_errors.load(Ordering::Relaxed),
            accept_errors: self.accept_errors.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            connections_total = snapshot.connections_total,
            connections_active = snapshot.connections_active,
            handshakes_total = snapshot.handshakes_total,
            handshakes_success = snapshot.handshakes_success,
            handshakes_failed = snapshot.handshakes_failed,
            commands_total = snapshot.commands_total,
            commands_invalid = snapshot.commands_invalid,
            placements_accepted = snapshot.placements_accepted,
            placements_rejected = snapshot.placements_rejected,
            connection_errors = snapshot.connection_errors,
            accept_errors = snapshot.accept_errors,
            uptime_seconds = snapshot.uptime_seconds,
            "Server metrics snapshot"
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub connections_total: u64,
    pub connections_active: u64,
    pub handshakes_total: u64,
    pub handshakes_success: u64,
    pub handshakes_failed: u64,
    pub commands_total: u64,
    pub commands_invalid: u64,
    pub placements_accepted: u64,
    pub placements_rejected: u64,
    pub connection_errors: u64,
    pub accept_errors: u64,
    pub uptime_seconds: u64,
}

/// Timer for measuring operation duration
pub struct Timer {
    start: Instant,
    operation: &'static str,
}

impl Timer {
    /// Start timing an operation
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        debug!(
            operation = self.operation,
            duration_ms = duration.as_millis(),
            "Operation completed"
        );
    }
}
