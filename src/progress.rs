//! Phase progress for the long-running commands.
//!
//! Each phase draws a bar or spinner on stderr. In log-only mode nothing is
//! drawn; a phase instead logs a line each time it crosses `LOG_INTERVAL`
//! items, and one more when it finishes.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// Items between progress lines in log-only mode.
pub const LOG_INTERVAL: u64 = 10_000;

const BAR_TEMPLATE: &str =
    "{prefix:>8.bold} {wide_bar:.green/white} {pos}/{len} [{elapsed}<{eta}, {per_sec}] {msg}";
const SPINNER_TEMPLATE: &str = "{prefix:>8.bold} {spinner:.green} {msg} [{elapsed}]";

static LOG_ONLY: AtomicBool = AtomicBool::new(false);

pub fn set_log_only(value: bool) {
    LOG_ONLY.store(value, Ordering::Relaxed);
}

fn log_only() -> bool {
    LOG_ONLY.load(Ordering::Relaxed)
}

/// One named phase of a command. `inc` may be called from rayon workers.
pub struct PhaseProgress {
    phase: &'static str,
    bar: ProgressBar,
    total: u64,
    done: AtomicU64,
}

impl PhaseProgress {
    /// Phase over a known number of items.
    pub fn bar(phase: &'static str, total: u64) -> Self {
        Self::styled(phase, ProgressBar::new(total), BAR_TEMPLATE, total)
    }

    /// Phase of unknown length.
    pub fn spinner(phase: &'static str) -> Self {
        let progress = Self::styled(phase, ProgressBar::new_spinner(), SPINNER_TEMPLATE, 0);
        if !log_only() {
            progress.bar.enable_steady_tick(Duration::from_millis(120));
        }
        progress
    }

    fn styled(phase: &'static str, bar: ProgressBar, template: &str, total: u64) -> Self {
        if log_only() {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        } else {
            bar.set_style(
                ProgressStyle::with_template(template)
                    .expect("valid progress template")
                    .progress_chars("##-"),
            );
        }
        bar.set_prefix(phase);
        Self {
            phase,
            bar,
            total,
            done: AtomicU64::new(0),
        }
    }

    pub fn inc(&self, n: u64) {
        self.bar.inc(n);
        let before = self.done.fetch_add(n, Ordering::Relaxed);
        let now = before + n;
        if log_only() && crosses_interval(before, now, self.total) {
            tracing::info!(
                phase = self.phase,
                done = now,
                total = self.total,
                "{:.1}%",
                percent(now, self.total)
            );
        }
    }

    pub fn finish(&self, msg: impl Into<String>) {
        let msg = msg.into();
        if log_only() {
            tracing::info!(phase = self.phase, elapsed = %format_elapsed(self.bar.elapsed()), "{}", msg);
        }
        self.bar.finish_with_message(msg);
    }
}

/// Batched increments can jump over a multiple, so compare interval buckets.
fn crosses_interval(before: u64, now: u64, total: u64) -> bool {
    now == total || before / LOG_INTERVAL != now / LOG_INTERVAL
}

fn percent(done: u64, total: u64) -> f64 {
    if total == 0 {
        return 100.0;
    }
    100.0 * done as f64 / total as f64
}

/// `4.2s`, `3m07s` or `2h15m`.
pub fn format_elapsed(d: Duration) -> String {
    let secs = d.as_secs();
    match secs {
        0..=59 => format!("{:.1}s", d.as_secs_f64()),
        60..=3599 => format!("{}m{:02}s", secs / 60, secs % 60),
        _ => format!("{}h{:02}m", secs / 3600, (secs % 3600) / 60),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_millis(2500)), "2.5s");
        assert_eq!(format_elapsed(Duration::from_secs(187)), "3m07s");
        assert_eq!(format_elapsed(Duration::from_secs(8100)), "2h15m");
    }

    #[test]
    fn test_crosses_interval() {
        assert!(crosses_interval(9_999, 10_000, 50_000));
        assert!(crosses_interval(5_000, 15_000, 50_000));
        assert!(crosses_interval(49_990, 50_000, 50_000));
        assert!(!crosses_interval(10_000, 19_999, 50_000));
        assert!(!crosses_interval(0, 3, 5_000_000));
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(0, 0), 100.0);
        assert_eq!(percent(250, 1000), 25.0);
    }

    #[test]
    fn test_phase_counts_batched_increments() {
        let phase = PhaseProgress::bar("test", 25_000);
        for _ in 0..5 {
            phase.inc(5_000);
        }
        assert_eq!(phase.done.load(Ordering::Relaxed), 25_000);
        assert_eq!(phase.bar.position(), 25_000);
        phase.finish("done");
        assert!(phase.bar.is_finished());
    }
}
