use std::time::Instant;

use crate::scoring::AggregateCounters;
use crate::util::{format_clock, format_percent, format_rate, round_to};

/// Rates derived from the session counters on each tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DerivedMetrics {
    pub elapsed_secs: u64,
    pub precision: f64,
    pub cpm: f64,
    pub wpm: f64,
}

/// Display strings for the stats panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsDisplay {
    pub time: String,
    pub precision: String,
    pub cpm: String,
    pub wpm: String,
}

impl Default for MetricsDisplay {
    fn default() -> Self {
        Self {
            time: "0:00".to_string(),
            precision: "0 %".to_string(),
            cpm: "0.00".to_string(),
            wpm: "0.00".to_string(),
        }
    }
}

impl From<&DerivedMetrics> for MetricsDisplay {
    fn from(m: &DerivedMetrics) -> Self {
        Self {
            time: format_clock(m.elapsed_secs),
            precision: format_percent(m.precision),
            cpm: format_rate(m.cpm),
            wpm: format_rate(m.wpm),
        }
    }
}

pub struct MetricsCalculator;

impl MetricsCalculator {
    /// Recompute the metrics. Values that would divide by zero keep their `previous` value.
    pub fn tick(
        now: Instant,
        session_start: Instant,
        counters: &AggregateCounters,
        previous: &DerivedMetrics,
    ) -> DerivedMetrics {
        let elapsed = now.saturating_duration_since(session_start).as_secs_f64();
        let elapsed_secs = elapsed.round_ties_even() as u64;

        let mut metrics = DerivedMetrics {
            elapsed_secs,
            ..*previous
        };

        if counters.total_chars > 0 {
            metrics.precision = round_to(
                counters.correct_chars as f64 / counters.total_chars as f64,
                2,
            );
        }

        if elapsed_secs > 0 {
            let secs = elapsed_secs as f64;
            metrics.cpm = round_to(counters.correct_chars as f64 / secs * 60.0, 2);
            metrics.wpm = round_to(counters.words_completed as f64 / secs * 60.0, 2);
        }

        metrics
    }
}
