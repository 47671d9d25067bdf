//! Progress bar over the trajectory files of a run.
//!
//! With the `progress` feature, [`FileProgress`] drives an `indicatif` bar whose message
//! shows the last and the smoothed per-file parse time. Without it every method is a no-op.
#[cfg(feature = "progress")]
use std::time::{Duration, Instant};

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

/// Per-file parse time, smoothed as `ema ← α·dt + (1 − α)·ema`.
#[cfg(feature = "progress")]
struct IterTimer {
    last: Instant,
    ema_ns: f64,
    alpha: f64,
    count: u64,
}

#[cfg(feature = "progress")]
impl IterTimer {
    fn new(alpha: f64) -> Self {
        Self {
            last: Instant::now(),
            ema_ns: 0.0,
            alpha,
            count: 0,
        }
    }

    #[inline]
    fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let dt = now.duration_since(self.last);
        self.last = now;
        self.count += 1;

        let dt_ns = dt.as_nanos() as f64;
        self.ema_ns = if self.count == 1 {
            dt_ns
        } else {
            self.alpha * dt_ns + (1.0 - self.alpha) * self.ema_ns
        };

        dt
    }

    #[inline]
    fn avg(&self) -> Duration {
        if self.count == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.ema_ns as u64)
        }
    }
}

#[cfg(feature = "progress")]
fn fmt_dur(d: Duration) -> String {
    let us = d.as_micros();
    if us < 1_000 {
        format!("{us}µs")
    } else if d.as_millis() < 1_000 {
        format!("{}ms", d.as_millis())
    } else {
        format!("{:.2}s", d.as_secs_f32())
    }
}

/// Progress over the files of a trajectory folder.
#[cfg(feature = "progress")]
pub struct FileProgress {
    pb: ProgressBar,
    timer: IterTimer,
}

#[cfg(feature = "progress")]
impl FileProgress {
    pub fn new(n_files: usize) -> Self {
        let pb = ProgressBar::new((n_files as u64).max(1));
        if let Ok(style) = ProgressStyle::with_template(
            "{bar:40.cyan/blue} {pos}/{len} files ({percent:>3}%) | ETA {eta_precise} | {msg}",
        ) {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(200));

        FileProgress {
            pb,
            timer: IterTimer::new(0.2),
        }
    }

    /// Mark one file as done.
    pub fn inc(&mut self) {
        let last = self.timer.tick();
        let avg = self.timer.avg();
        self.pb
            .set_message(format!("last: {}, avg: {}", fmt_dur(last), fmt_dur(avg)));
        self.pb.inc(1);
    }

    pub fn finish(self) {
        self.pb.disable_steady_tick();
        self.pb.finish_and_clear();
    }
}

#[cfg(not(feature = "progress"))]
pub struct FileProgress;

#[cfg(not(feature = "progress"))]
impl FileProgress {
    #[inline]
    pub fn new(_n_files: usize) -> Self {
        FileProgress
    }

    #[inline]
    pub fn inc(&mut self) {}

    #[inline]
    pub fn finish(self) {}
}

#[cfg(all(test, feature = "progress"))]
mod progress_bar_test {
    use super::*;

    #[test]
    fn duration_formatting() {
        assert_eq!(fmt_dur(Duration::from_micros(253)), "253µs");
        assert_eq!(fmt_dur(Duration::from_millis(42)), "42ms");
        assert_eq!(fmt_dur(Duration::from_millis(3140)), "3.14s");
    }

    #[test]
    fn first_tick_initializes_the_average() {
        let mut timer = IterTimer::new(0.2);
        assert_eq!(timer.avg(), Duration::from_nanos(0));
        let dt = timer.tick();
        assert_eq!(timer.avg().as_nanos(), dt.as_nanos());
    }
}
