//! Progress bar and logging utilities.
//!
//! Stages that write many files show a progress bar. In log-only mode the bars
//! are hidden and periodic progress lines go to stderr instead, for
//! tail-friendly output.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Global flag for log-only mode (set from args in main)
pub static LOG_ONLY: AtomicBool = AtomicBool::new(false);

pub fn set_log_only(value: bool) {
    LOG_ONLY.store(value, Ordering::Relaxed);
}

pub fn is_log_only() -> bool {
    LOG_ONLY.load(Ordering::Relaxed)
}

/// Format duration in human-readable format
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}

/// Progress over a known number of items (files to write).
pub struct StageProgress {
    bar: ProgressBar,
    label: String,
    total: u64,
    interval: u64,
}

impl StageProgress {
    pub fn new(label: &str, total: usize) -> Self {
        let total = total as u64;
        let bar = ProgressBar::new(total);
        if is_log_only() {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        } else if let Ok(style) = ProgressStyle::default_bar()
            .template("   {msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}")
        {
            bar.set_style(style.progress_chars("=> "));
        }
        bar.set_message(label.to_string());
        Self {
            bar,
            label: label.to_string(),
            total,
            interval: (total / 10).max(1),
        }
    }

    pub fn inc(&self) {
        self.bar.inc(1);
        if is_log_only() {
            let current = self.bar.position();
            if current % self.interval == 0 || current == self.total {
                let pct = 100.0 * current as f64 / self.total as f64;
                eprintln!("[{}] {}/{} ({:.1}%)", self.label, current, self.total, pct);
            }
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

/// Spinner for indeterminate work such as reading a collection.
pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if is_log_only() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    } else {
        if let Ok(style) = ProgressStyle::default_spinner().template("   {msg} {spinner} [{elapsed_precise}]") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
    }
    pb.set_message(msg.to_string());
    pb
}
