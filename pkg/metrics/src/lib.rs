use std::fmt::Write;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Monotonically increasing counter.
pub struct Counter {
    name: &'static str,
    help: &'static str,
    value: AtomicU64,
}

impl Counter {
    const fn new(name: &'static str, help: &'static str) -> Self {
        Self {
            name,
            help,
            value: AtomicU64::new(0),
        }
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Value that can go up or down.
pub struct Gauge {
    name: &'static str,
    help: &'static str,
    value: AtomicI64,
}

impl Gauge {
    const fn new(name: &'static str, help: &'static str) -> Self {
        Self {
            name,
            help,
            value: AtomicI64::new(0),
        }
    }

    pub fn set(&self, val: i64) {
        self.value.store(val, Ordering::Relaxed);
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec(&self) {
        self.value.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Process-wide metrics, rendered in Prometheus text exposition format.
pub struct Metrics {
    /// Watch notifications handled, of any kind.
    pub watch_events: Counter,
    /// Endpoint or workload lookups that failed during translation.
    pub lookup_failures: Counter,
    /// Watch loop instances that terminated and were restarted.
    pub watch_restarts: Counter,
    /// Status records currently held in the store.
    pub services: Gauge,
    /// Connected snapshot viewers.
    pub viewers: Gauge,
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            watch_events: Counter::new(
                "kube_status_watch_events_total",
                "Service watch notifications handled",
            ),
            lookup_failures: Counter::new(
                "kube_status_lookup_failures_total",
                "Auxiliary endpoint/pod lookups that failed",
            ),
            watch_restarts: Counter::new(
                "kube_status_watch_restarts_total",
                "Watch loop restarts after a failure",
            ),
            services: Gauge::new("kube_status_services", "Service status records in the store"),
            viewers: Gauge::new("kube_status_viewers", "Connected snapshot viewers"),
        }
    }

    pub fn render(&self) -> String {
        let mut output = String::new();
        for c in [&self.watch_events, &self.lookup_failures, &self.watch_restarts] {
            let _ = writeln!(output, "# HELP {} {}", c.name, c.help);
            let _ = writeln!(output, "# TYPE {} counter", c.name);
            let _ = writeln!(output, "{} {}", c.name, c.get());
        }
        for g in [&self.services, &self.viewers] {
            let _ = writeln!(output, "# HELP {} {}", g.name, g.help);
            let _ = writeln!(output, "# TYPE {} gauge", g.name);
            let _ = writeln!(output, "{} {}", g.name, g.get());
        }
        output
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
