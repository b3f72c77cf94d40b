use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// Point-in-time view of all counters and gauges.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub counters: BTreeMap<String, u64>,
    pub gauges: BTreeMap<String, u64>,
}

/// Collects operational metrics from pool hosts.
///
/// Counters are monotonic and created on first touch; gauges hold the last
/// written value.
pub struct MetricsCollector {
    counters: RwLock<HashMap<String, AtomicU64>>,
    gauges: RwLock<HashMap<String, AtomicU64>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            counters: RwLock::new(HashMap::new()),
            gauges: RwLock::new(HashMap::new()),
        }
    }

    /// Increments a counter by 1.
    pub fn increment_counter(&self, name: &str) {
        self.add_to_counter(name, 1);
    }

    /// Adds a value to a counter, creating it at zero if absent.
    pub fn add_to_counter(&self, name: &str, value: u64) {
        {
            let counters = self
                .counters
                .read()
                .expect("Failed to acquire read lock");
            if let Some(counter) = counters.get(name) {
                counter.fetch_add(value, Ordering::Relaxed);
                return;
            }
        }
        let mut counters = self
            .counters
            .write()
            .expect("Failed to acquire write lock");
        counters
            .entry(name.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(value, Ordering::Relaxed);
    }

    /// Sets a gauge to the given value, creating it if absent.
    pub fn set_gauge(&self, name: &str, value: u64) {
        {
            let gauges = self.gauges.read().expect("Failed to acquire read lock");
            if let Some(gauge) = gauges.get(name) {
                gauge.store(value, Ordering::Relaxed);
                return;
            }
        }
        let mut gauges = self.gauges.write().expect("Failed to acquire write lock");
        gauges
            .entry(name.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .store(value, Ordering::Relaxed);
    }

    /// Returns the current value of a counter, or `None` if never touched.
    pub fn get_counter(&self, name: &str) -> Option<u64> {
        let counters = self.counters.read().expect("Failed to acquire read lock");
        counters.get(name).map(|c| c.load(Ordering::Relaxed))
    }

    /// Returns the current value of a gauge, or `None` if never set.
    pub fn get_gauge(&self, name: &str) -> Option<u64> {
        let gauges = self.gauges.read().expect("Failed to acquire read lock");
        gauges.get(name).map(|g| g.load(Ordering::Relaxed))
    }

    /// Captures all metrics into a serializable snapshot with stable key
    /// ordering.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let counters = self
            .counters
            .read()
            .expect("Failed to acquire read lock")
            .iter()
            .map(|(name, value)| (name.clone(), value.load(Ordering::Relaxed)))
            .collect();
        let gauges = self
            .gauges
            .read()
            .expect("Failed to acquire read lock")
            .iter()
            .map(|(name, value)| (name.clone(), value.load(Ordering::Relaxed)))
            .collect();
        MetricsSnapshot { counters, gauges }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MetricsCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("MetricsCollector")
            .field("counters", &snapshot.counters)
            .field("gauges", &snapshot.gauges)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_counter_auto_registers() {
        let metrics = MetricsCollector::new();
        assert_eq!(metrics.get_counter("swaps"), None);

        metrics.increment_counter("swaps");
        metrics.increment_counter("swaps");
        metrics.add_to_counter("swaps", 3);

        assert_eq!(metrics.get_counter("swaps"), Some(5));
    }

    #[test]
    fn test_gauge_overwrites() {
        let metrics = MetricsCollector::new();
        metrics.set_gauge("total_shares", 100);
        metrics.set_gauge("total_shares", 42);

        assert_eq!(metrics.get_gauge("total_shares"), Some(42));
        assert_eq!(metrics.get_gauge("unknown"), None);
    }

    #[test]
    fn test_snapshot_is_sorted_and_serializable() {
        let metrics = MetricsCollector::new();
        metrics.increment_counter("withdrawals");
        metrics.increment_counter("deposits");
        metrics.set_gauge("pools", 1);

        let snapshot = metrics.snapshot();
        let keys: Vec<_> = snapshot.counters.keys().cloned().collect();
        assert_eq!(keys, vec!["deposits".to_string(), "withdrawals".to_string()]);

        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"pools\":1"));
    }

    #[test]
    fn test_concurrent_counting() {
        let metrics = Arc::new(MetricsCollector::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let metrics = Arc::clone(&metrics);
                std::thread::spawn(move || {
                    for _ in 0..1_000 {
                        metrics.increment_counter("ops");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metrics.get_counter("ops"), Some(8_000));
    }
}
