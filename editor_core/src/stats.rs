//! Highlighting statistics.
//!
//! Rolling timings for reparses and queries plus the counters the pipeline
//! bumps as it works.

use std::collections::VecDeque;
use std::time::Duration;

/// Maximum number of samples to keep for rolling averages.
const MAX_SAMPLES: usize = 120;

/// Rolling statistics for a timed operation.
#[derive(Debug, Clone)]
pub struct RollingStats {
    samples: VecDeque<Duration>,
    sum: Duration,
    max: Duration,
}

impl Default for RollingStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RollingStats {
    /// Creates a new empty rolling stats tracker.
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(MAX_SAMPLES),
            sum: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    /// Records a new sample.
    pub fn record(&mut self, duration: Duration) {
        // Remove old sample if at capacity
        if self.samples.len() >= MAX_SAMPLES {
            if let Some(old) = self.samples.pop_front() {
                self.sum = self.sum.saturating_sub(old);
            }
        }

        self.samples.push_back(duration);
        self.sum += duration;
        self.max = self.max.max(duration);
    }

    /// Returns the number of samples in the window.
    pub fn count(&self) -> usize {
        self.samples.len()
    }

    /// Returns the average duration.
    pub fn average(&self) -> Duration {
        if self.samples.is_empty() {
            Duration::ZERO
        } else {
            self.sum / self.samples.len() as u32
        }
    }

    /// Returns the maximum duration ever recorded.
    pub fn max(&self) -> Duration {
        self.max
    }

    /// Returns the most recent duration.
    pub fn last(&self) -> Duration {
        self.samples.back().copied().unwrap_or(Duration::ZERO)
    }

    /// Returns the average as milliseconds.
    pub fn average_ms(&self) -> f64 {
        self.average().as_secs_f64() * 1000.0
    }
}

/// Work done by one buffer's highlighting pipeline.
#[derive(Debug, Clone, Default)]
pub struct HighlightStats {
    /// Reparse durations.
    pub parse: RollingStats,
    /// Highlight query durations.
    pub query: RollingStats,
    /// Parses that started without a previous tree.
    pub full_parses: u64,
    /// Parses that reused an edited tree.
    pub incremental_parses: u64,
    /// Parses abandoned at the time budget.
    pub parse_timeouts: u64,
    /// Queries that stopped early on the budget or match limit.
    pub partial_queries: u64,
    /// Background results dropped because a newer edit superseded them.
    pub discarded_results: u64,
    /// Attribute updates delivered to the host.
    pub updates_emitted: u64,
}

impl HighlightStats {
    /// Total number of successful parses of any kind.
    pub fn parse_count(&self) -> u64 {
        self.full_parses + self.incremental_parses
    }

    /// Returns a one-line summary suitable for logging.
    pub fn summary(&self) -> String {
        format!(
            "parses: {} full / {} incremental (avg {:.2}ms, {} timeouts) | queries: avg {:.2}ms, {} partial | updates: {} | discarded: {}",
            self.full_parses,
            self.incremental_parses,
            self.parse.average_ms(),
            self.parse_timeouts,
            self.query.average_ms(),
            self.partial_queries,
            self.updates_emitted,
            self.discarded_results,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolling_stats() {
        let mut stats = RollingStats::new();
        assert_eq!(stats.average(), Duration::ZERO);

        stats.record(Duration::from_millis(10));
        stats.record(Duration::from_millis(20));
        stats.record(Duration::from_millis(30));

        assert_eq!(stats.count(), 3);
        assert_eq!(stats.average(), Duration::from_millis(20));
        assert_eq!(stats.max(), Duration::from_millis(30));
        assert_eq!(stats.last(), Duration::from_millis(30));
    }

    #[test]
    fn test_rolling_stats_window() {
        let mut stats = RollingStats::new();
        for _ in 0..MAX_SAMPLES {
            stats.record(Duration::from_millis(100));
        }
        for _ in 0..MAX_SAMPLES {
            stats.record(Duration::from_millis(1));
        }
        assert_eq!(stats.count(), MAX_SAMPLES);
        assert_eq!(stats.average(), Duration::from_millis(1));
        assert_eq!(stats.max(), Duration::from_millis(100));
    }

    #[test]
    fn test_parse_count_and_summary() {
        let stats = HighlightStats {
            full_parses: 1,
            incremental_parses: 4,
            ..HighlightStats::default()
        };
        assert_eq!(stats.parse_count(), 5);
        assert!(stats.summary().contains("1 full / 4 incremental"));
    }
}
