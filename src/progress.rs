//! Progress and ETA accounting
//!
//! The estimator is deliberately simple: average time per processed row,
//! extrapolated linearly over the remaining rows.

use std::time::{Duration, Instant};

/// Snapshot of run progress
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Progress {
    /// Rows processed so far
    pub processed_rows: usize,
    /// Rows in the input
    pub total_rows: usize,
    /// Completion percentage (0.0 to 100.0)
    pub percent: f64,
    /// Estimated time until the last row is processed
    pub eta: Duration,
}

impl Progress {
    /// Compute progress from counts and elapsed time
    ///
    /// An empty input is reported as complete with no remaining time. Before
    /// the first row is processed there is nothing to extrapolate from, so
    /// the ETA is zero.
    pub fn compute(processed_rows: usize, total_rows: usize, elapsed: Duration) -> Self {
        if total_rows == 0 {
            return Self {
                processed_rows,
                total_rows,
                percent: 100.0,
                eta: Duration::ZERO,
            };
        }

        let percent = 100.0 * processed_rows as f64 / total_rows as f64;
        let remaining = total_rows.saturating_sub(processed_rows);
        let eta = if processed_rows == 0 || remaining == 0 {
            Duration::ZERO
        } else {
            elapsed.div_f64(processed_rows as f64).mul_f64(remaining as f64)
        };

        Self {
            processed_rows,
            total_rows,
            percent,
            eta,
        }
    }

    /// Status line shown while rows are being processed
    ///
    /// `Progress: 3/10 (30.0%) | ETA: 1m 4s`
    pub fn status_line(&self) -> String {
        format!(
            "Progress: {}/{} ({:.1}%) | ETA: {}",
            self.processed_rows,
            self.total_rows,
            self.percent,
            format_duration(self.eta)
        )
    }

    /// Status line shown while a row folder is being compressed
    ///
    /// `Compressing: SKU-1 | Progress: 30.0% | ETA: 1m 4s`
    pub fn compress_status_line(&self, row_id: &str) -> String {
        format!(
            "Compressing: {} | Progress: {:.1}% | ETA: {}",
            row_id,
            self.percent,
            format_duration(self.eta)
        )
    }
}

/// Tracks processed rows against wall-clock time for one run
#[derive(Debug)]
pub struct ProgressTracker {
    total_rows: usize,
    processed_rows: usize,
    started: Instant,
}

impl ProgressTracker {
    /// Start tracking a run over `total_rows` rows
    pub fn new(total_rows: usize) -> Self {
        Self {
            total_rows,
            processed_rows: 0,
            started: Instant::now(),
        }
    }

    /// Count one more row as processed and return the new snapshot
    pub fn advance(&mut self) -> Progress {
        self.processed_rows = (self.processed_rows + 1).min(self.total_rows);
        self.snapshot()
    }

    /// Current progress without advancing
    pub fn snapshot(&self) -> Progress {
        Progress::compute(self.processed_rows, self.total_rows, self.elapsed())
    }

    /// Rows counted so far
    pub fn processed_rows(&self) -> usize {
        self.processed_rows
    }

    /// Time since tracking started
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Render a duration as `<m>m <s>s`, omitting minutes when zero
///
/// Sub-second remainders are truncated.
///
/// # Examples
///
/// ```
/// use csv_image_dl::progress::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_secs(42)), "42s");
/// assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let minutes = total / 60;
    let seconds = total % 60;
    if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eta_extrapolates_average_row_time() {
        let progress = Progress::compute(2, 10, Duration::from_secs(20));
        assert_eq!(progress.percent, 20.0);
        assert_eq!(progress.eta, Duration::from_secs(80));
    }

    #[test]
    fn finished_run_has_zero_eta() {
        let progress = Progress::compute(5, 5, Duration::from_secs(33));
        assert_eq!(progress.percent, 100.0);
        assert_eq!(progress.eta, Duration::ZERO);
    }

    #[test]
    fn empty_input_is_complete_without_fault() {
        let progress = Progress::compute(0, 0, Duration::from_secs(3));
        assert_eq!(progress.percent, 100.0);
        assert_eq!(progress.eta, Duration::ZERO);
    }

    #[test]
    fn nothing_processed_yet_has_zero_eta() {
        let progress = Progress::compute(0, 4, Duration::from_secs(3));
        assert_eq!(progress.percent, 0.0);
        assert_eq!(progress.eta, Duration::ZERO);
    }

    #[test]
    fn format_omits_zero_minutes() {
        assert_eq!(format_duration(Duration::ZERO), "0s");
        assert_eq!(format_duration(Duration::from_millis(59_900)), "59s");
        assert_eq!(format_duration(Duration::from_secs(60)), "1m 0s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "62m 5s");
    }

    #[test]
    fn status_lines_match_display_format() {
        let progress = Progress::compute(1, 3, Duration::from_secs(30));
        assert_eq!(progress.status_line(), "Progress: 1/3 (33.3%) | ETA: 1m 0s");
        assert_eq!(
            progress.compress_status_line("SKU-9"),
            "Compressing: SKU-9 | Progress: 33.3% | ETA: 1m 0s"
        );
    }

    #[test]
    fn tracker_never_exceeds_total() {
        let mut tracker = ProgressTracker::new(2);
        tracker.advance();
        tracker.advance();
        let progress = tracker.advance();
        assert_eq!(progress.processed_rows, 2);
        assert_eq!(progress.percent, 100.0);
        assert_eq!(progress.eta, Duration::ZERO);
    }
}
