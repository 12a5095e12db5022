//! Progress tracking and reporting for transfers and batches

use std::io::{self, Write};
use std::sync::Arc;

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;

/// Callback receiving per-file progress (single-file mode)
pub type ProgressCallback = Arc<dyn Fn(TransferProgress) + Send + Sync>;

/// Callback receiving aggregate progress (multi-file mode)
pub type BatchProgressCallback = Arc<dyn Fn(BatchProgress) + Send + Sync>;

/// Callback receiving human-readable trace lines, in order
pub type LogCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Snapshot of a single transfer, recomputed on every tick
#[derive(Debug, Clone, PartialEq)]
pub struct TransferProgress {
    pub bytes_transferred: u64,
    /// Declared size, `-1` when the server did not send one
    pub total_bytes: i64,
    pub percent_complete: u8,
    pub speed_bytes_per_second: f64,
    pub formatted_speed: String,
}

impl TransferProgress {
    /// Build a tick from raw counters, deriving percentage and display speed
    pub fn new(bytes_transferred: u64, total_bytes: Option<u64>, speed_bytes_per_second: f64) -> Self {
        let total_bytes = total_bytes.and_then(|t| i64::try_from(t).ok()).unwrap_or(-1);
        Self {
            bytes_transferred,
            total_bytes,
            percent_complete: percent_of(bytes_transferred, total_bytes),
            speed_bytes_per_second,
            formatted_speed: format_speed(speed_bytes_per_second),
        }
    }

    pub fn is_size_known(&self) -> bool {
        self.total_bytes > 0
    }
}

/// floor(done * 100 / total), clamped to 100. Zero when the total is unknown.
pub fn percent_of(done: u64, total: i64) -> u8 {
    if total <= 0 {
        return 0;
    }
    let percent = (u128::from(done) * 100) / total as u128;
    percent.min(100) as u8
}

/// Render a speed as `B/s`, `KB/s` or `MB/s` with 1024 thresholds
pub fn format_speed(bytes_per_second: f64) -> String {
    if bytes_per_second >= MIB {
        format!("{:.2} MB/s", bytes_per_second / MIB)
    } else if bytes_per_second >= KIB {
        format!("{:.2} KB/s", bytes_per_second / KIB)
    } else {
        format!("{:.0} B/s", bytes_per_second)
    }
}

/// Aggregate view over one batch run
#[derive(Debug, Clone, PartialEq)]
pub struct BatchProgress {
    /// Zero-based index of the item in flight, or the count of finished items
    /// on the tick emitted after an item completes
    pub current_item_index: usize,
    pub total_items: usize,
    pub current_item_name: String,
    pub current_item_progress: Option<TransferProgress>,
}

impl BatchProgress {
    /// Overall completion: completed items count fully, the current one by its percentage
    pub fn overall_percent_complete(&self) -> u8 {
        if self.total_items == 0 {
            return 0;
        }

        let current = self
            .current_item_progress
            .as_ref()
            .map_or(0, |p| usize::from(p.percent_complete));
        let percent = (self.current_item_index * 100 + current) / self.total_items;
        percent.min(100) as u8
    }
}

/// Trait for progress reporting with more granular control
pub trait ProgressReporter: Send + Sync {
    fn on_transfer_progress(&self, _progress: &TransferProgress) {}
    fn on_batch_progress(&self, _progress: &BatchProgress) {}
    fn on_log(&self, _line: &str) {}
}

/// Bundle of optional callbacks handed to the pipeline
#[derive(Clone, Default)]
pub struct ProgressHooks {
    pub on_progress: Option<ProgressCallback>,
    pub on_batch_progress: Option<BatchProgressCallback>,
    pub on_log: Option<LogCallback>,
}

impl std::fmt::Debug for ProgressHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressHooks")
            .field("on_progress", &self.on_progress.is_some())
            .field("on_batch_progress", &self.on_batch_progress.is_some())
            .field("on_log", &self.on_log.is_some())
            .finish()
    }
}

impl ProgressHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route every callback to a single reporter
    pub fn from_reporter<R: ProgressReporter + 'static>(reporter: R) -> Self {
        let reporter = Arc::new(reporter);
        let transfer = reporter.clone();
        let batch = reporter.clone();
        Self {
            on_progress: Some(Arc::new(move |p: TransferProgress| transfer.on_transfer_progress(&p))),
            on_batch_progress: Some(Arc::new(move |p: BatchProgress| batch.on_batch_progress(&p))),
            on_log: Some(Arc::new(move |line: &str| reporter.on_log(line))),
        }
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    pub fn with_batch_progress(mut self, callback: BatchProgressCallback) -> Self {
        self.on_batch_progress = Some(callback);
        self
    }

    pub fn with_log(mut self, callback: LogCallback) -> Self {
        self.on_log = Some(callback);
        self
    }

    pub(crate) fn log(&self, line: &str) {
        if let Some(ref callback) = self.on_log {
            callback(line);
        }
    }
}

/// Console reporter that rewrites the current line on every tick
#[derive(Debug, Default)]
pub struct ConsoleProgressReporter {
    pub verbose: bool,
}

impl ConsoleProgressReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    fn redraw(line: &str) {
        let mut stdout = io::stdout().lock();
        // A closed stdout is not worth failing an install over
        let _ = write!(stdout, "\r\x1b[K{line}");
        let _ = stdout.flush();
    }
}

impl ProgressReporter for ConsoleProgressReporter {
    fn on_transfer_progress(&self, progress: &TransferProgress) {
        if progress.is_size_known() {
            Self::redraw(&format!(
                "{}% ({}/{} bytes) - {}",
                progress.percent_complete,
                progress.bytes_transferred,
                progress.total_bytes,
                progress.formatted_speed
            ));
        } else {
            Self::redraw(&format!(
                "{} bytes - {}",
                progress.bytes_transferred, progress.formatted_speed
            ));
        }
    }

    fn on_batch_progress(&self, progress: &BatchProgress) {
        let item_percent = progress
            .current_item_progress
            .as_ref()
            .map_or(0, |p| p.percent_complete);
        let shown_index = (progress.current_item_index + 1).min(progress.total_items);
        Self::redraw(&format!(
            "[{:>3}%] Mod {}/{}: {} ({}%)",
            progress.overall_percent_complete(),
            shown_index,
            progress.total_items,
            progress.current_item_name,
            item_percent
        ));
    }

    fn on_log(&self, line: &str) {
        if self.verbose {
            Self::redraw("");
            println!("{line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(index: usize, total: usize, item_percent: Option<u8>) -> BatchProgress {
        BatchProgress {
            current_item_index: index,
            total_items: total,
            current_item_name: "a.jar".to_string(),
            current_item_progress: item_percent.map(|p| TransferProgress {
                bytes_transferred: 0,
                total_bytes: 100,
                percent_complete: p,
                speed_bytes_per_second: 0.0,
                formatted_speed: String::new(),
            }),
        }
    }

    #[test]
    fn percent_is_floored_and_bounded() {
        for total in [1u64, 3, 7, 100, 1023, 4096] {
            for done in 0..=total {
                let expected = (done * 100 / total) as u8;
                let percent = percent_of(done, total as i64);
                assert_eq!(percent, expected);
                assert!(percent <= 100);
            }
        }
    }

    #[test]
    fn unknown_total_keeps_percent_at_zero() {
        let progress = TransferProgress::new(4096, None, 10.0);
        assert_eq!(progress.total_bytes, -1);
        assert_eq!(progress.percent_complete, 0);
        assert!(!progress.is_size_known());
    }

    #[test]
    fn formats_speed_with_binary_thresholds() {
        assert_eq!(format_speed(500.0), "500 B/s");
        assert_eq!(format_speed(2048.0), "2.00 KB/s");
        assert_eq!(format_speed(3.0 * 1024.0 * 1024.0), "3.00 MB/s");
        assert_eq!(format_speed(0.0), "0 B/s");
        assert_eq!(format_speed(1023.4), "1023 B/s");
    }

    #[test]
    fn empty_batch_reports_zero() {
        assert_eq!(batch(0, 0, Some(50)).overall_percent_complete(), 0);
        assert_eq!(batch(3, 0, None).overall_percent_complete(), 0);
    }

    #[test]
    fn overall_percent_counts_completed_items() {
        assert_eq!(batch(0, 4, None).overall_percent_complete(), 0);
        assert_eq!(batch(0, 4, Some(50)).overall_percent_complete(), 12);
        assert_eq!(batch(1, 4, Some(0)).overall_percent_complete(), 25);
        assert_eq!(batch(3, 4, Some(100)).overall_percent_complete(), 100);
        assert_eq!(batch(4, 4, None).overall_percent_complete(), 100);
        // Overshoot from a stale tick is clamped
        assert_eq!(batch(4, 4, Some(100)).overall_percent_complete(), 100);
    }

    #[test]
    fn overall_percent_is_monotonic_over_a_run() {
        let total = 3;
        let mut ticks = Vec::new();
        for index in 0..total {
            for p in [0u8, 10, 55, 99, 100] {
                ticks.push(batch(index, total, Some(p)));
            }
            ticks.push(batch(index + 1, total, None));
        }

        let percents: Vec<u8> = ticks.iter().map(|t| t.overall_percent_complete()).collect();
        assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{percents:?}");
        assert_eq!(*percents.last().unwrap(), 100);
    }
}
