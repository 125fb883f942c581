//! Formatting helpers for log output and sort summaries.

use std::time::{Duration, Instant};

use crate::sort::SortOutcome;

/// Formats a count with comma thousands separators (e.g. `1,234,567`).
///
/// # Examples
///
/// ```
/// use segsort_lib::logging::format_count;
///
/// assert_eq!(format_count(999), "999");
/// assert_eq!(format_count(1_234_567), "1,234,567");
/// ```
#[must_use]
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Formats a fraction as a percentage with `decimals` decimal places.
///
/// ```
/// use segsort_lib::logging::format_percent;
///
/// assert_eq!(format_percent(0.9543, 2), "95.43%");
/// ```
#[must_use]
pub fn format_percent(value: f64, decimals: usize) -> String {
    format!("{:.decimals$}%", value * 100.0)
}

/// Formats a duration as `45s`, `2m 15s` or `1h 30m`. Sub-second durations
/// are shown in milliseconds.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    match secs {
        0 => format!("{}ms", duration.as_millis()),
        1..60 => format!("{secs}s"),
        60..3600 => match (secs / 60, secs % 60) {
            (mins, 0) => format!("{mins}m"),
            (mins, rem) => format!("{mins}m {rem}s"),
        },
        _ => match (secs / 3600, (secs % 3600) / 60) {
            (hours, 0) => format!("{hours}h"),
            (hours, mins) => format!("{hours}h {mins}m"),
        },
    }
}

/// Formats a throughput in records per second, falling back to records per
/// minute for slow rates.
#[must_use]
pub fn format_rate(count: u64, duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 0.001 {
        return format!("{} records/s", format_count(count));
    }
    let rate = count as f64 / secs;
    if rate >= 1.0 {
        format!("{} records/s", format_count(rate as u64))
    } else {
        format!("{:.1} records/min", rate * 60.0)
    }
}

/// Group-wide statistics of one distributed sort.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSummary {
    /// Number of ranks in the group.
    pub ranks: usize,
    /// Total records across all ranks.
    pub records: u64,
    /// Exchange rounds run.
    pub rounds: usize,
    /// Rounds in which some rank's order changed.
    pub changed_rounds: usize,
    /// Boundary region size.
    pub region: usize,
}

impl SortSummary {
    /// Summarise a sort from one rank's outcome and the group totals.
    #[must_use]
    pub fn new(outcome: &SortOutcome, ranks: usize, records: u64) -> Self {
        Self {
            ranks,
            records,
            rounds: outcome.rounds,
            changed_rounds: outcome.changed_rounds,
            region: outcome.region,
        }
    }
}

/// Logs a formatted summary of a distributed sort.
pub fn log_sort_summary(summary: &SortSummary) {
    log::info!("Sort Summary:");
    log::info!("  Ranks: {}", summary.ranks);
    log::info!("  Records: {}", format_count(summary.records));
    log::info!("  Boundary region: {} records", format_count(summary.region as u64));
    log::info!("  Rounds: {}", summary.rounds);
    if summary.rounds > 0 {
        let productive = summary.changed_rounds as f64 / summary.rounds as f64;
        log::info!("  Rounds with changes: {} ({})", summary.changed_rounds, format_percent(productive, 1));
    }
}

/// Logs the start of an operation and, on completion, its count, duration and
/// rate.
pub struct OperationTimer {
    operation: String,
    start_time: Instant,
}

impl OperationTimer {
    /// Start timing `operation`.
    #[must_use]
    pub fn new(operation: &str) -> Self {
        log::info!("{operation} ...");
        Self { operation: operation.to_string(), start_time: Instant::now() }
    }

    /// Time elapsed since the timer started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Log completion after processing `count` records.
    pub fn log_completion(&self, count: u64) {
        let duration = self.elapsed();
        log::info!(
            "{} completed: {} records in {} ({})",
            self.operation,
            format_count(count),
            format_duration(duration),
            format_rate(count, duration)
        );
    }
}
