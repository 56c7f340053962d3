//! Runtime metrics — track turns, fallbacks, socket activity.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Process-wide metrics collector.
#[derive(Debug, Default)]
pub struct Metrics {
    pub turns_total: AtomicU64,
    pub turns_fallback: AtomicU64,
    pub ws_connections: AtomicU64,
    pub validation_errors: AtomicU64,
    start_time: Option<Instant>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    pub fn record_turn(&self, fallback: bool) {
        self.turns_total.fetch_add(1, Ordering::Relaxed);
        if fallback {
            self.turns_fallback.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_ws_connection(&self) {
        self.ws_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_validation_error(&self) {
        self.validation_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time
            .map(|t| t.elapsed().as_secs())
            .unwrap_or(0)
    }

    /// Export as JSON.
    pub fn to_json(&self) -> serde_json::Value {
        let uptime = self.uptime_secs();
        let hours = uptime / 3600;
        let minutes = (uptime % 3600) / 60;
        let seconds = uptime % 60;

        serde_json::json!({
            "uptime": format!("{}h {}m {}s", hours, minutes, seconds),
            "uptime_secs": uptime,
            "turns": {
                "total": self.turns_total.load(Ordering::Relaxed),
                "fallback": self.turns_fallback.load(Ordering::Relaxed),
            },
            "ws_connections": self.ws_connections.load(Ordering::Relaxed),
            "validation_errors": self.validation_errors.load(Ordering::Relaxed),
        })
    }
}

/// Shared metrics instance.
pub type SharedMetrics = Arc<Metrics>;

pub fn new_metrics() -> SharedMetrics {
    Arc::new(Metrics::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_counters() {
        let metrics = Metrics::new();
        metrics.record_turn(false);
        metrics.record_turn(true);
        metrics.record_validation_error();

        let json = metrics.to_json();
        assert_eq!(json["turns"]["total"], 2);
        assert_eq!(json["turns"]["fallback"], 1);
        assert_eq!(json["validation_errors"], 1);
        assert_eq!(json["ws_connections"], 0);
    }
}
