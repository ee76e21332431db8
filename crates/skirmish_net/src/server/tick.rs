//! # Tick Pacing
//!
//! Fixed-timestep pacing for the simulation and broadcast loops.
//!
//! ## Design
//!
//! - Time accumulates between calls; each due tick consumes one period.
//! - After a long stall at most [`MAX_CATCH_UP`] periods are kept, so a
//!   paused server does not replay seconds of ticks at once.
//! - Waiting sleeps most of the remaining time and spins the last stretch.

use std::time::{Duration, Instant};
use tracing::warn;

/// Periods kept in the accumulator after a stall.
pub const MAX_CATCH_UP: u32 = 5;

/// Remaining wait below which the loop spins instead of sleeping.
const SPIN_WINDOW: Duration = Duration::from_micros(500);

/// Fixed-timestep controller.
#[derive(Clone, Debug)]
pub struct TickLoop {
    period: Duration,
    last_poll: Instant,
    accumulator: Duration,
    tick_count: u64,
    stats: TickStats,
}

/// Timing of executed ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickStats {
    /// Fastest tick body (µs).
    pub min_tick_us: u64,
    /// Slowest tick body (µs).
    pub max_tick_us: u64,
    /// Rolling average over roughly the last 16 ticks (µs).
    pub avg_tick_us: u64,
    /// Ticks whose body overran the period.
    pub late_ticks: u64,
    /// Ticks measured.
    pub total_ticks: u64,
    /// Periods dropped after stalls.
    pub skipped_ticks: u64,
}

impl TickStats {
    fn fresh(period: Duration) -> Self {
        Self {
            min_tick_us: u64::MAX,
            max_tick_us: 0,
            avg_tick_us: period.as_micros() as u64,
            late_ticks: 0,
            total_ticks: 0,
            skipped_ticks: 0,
        }
    }

    /// Share of late ticks, in percent.
    #[must_use]
    pub fn late_percent(&self) -> f64 {
        self.late_ticks as f64 / self.total_ticks.max(1) as f64 * 100.0
    }
}

impl TickLoop {
    /// Paces `rate` ticks per second (at least one).
    #[must_use]
    pub fn new(rate: u32) -> Self {
        let period = Duration::from_micros(1_000_000 / u64::from(rate.max(1)));
        Self {
            period,
            last_poll: Instant::now(),
            accumulator: Duration::ZERO,
            tick_count: 0,
            stats: TickStats::fresh(period),
        }
    }

    /// Returns `true` while a tick is due. Call until it returns `false`.
    #[must_use]
    pub fn should_tick(&mut self) -> bool {
        let now = Instant::now();
        self.accumulator += now.duration_since(self.last_poll);
        self.last_poll = now;

        let cap = self.period * MAX_CATCH_UP;
        if self.accumulator > cap {
            let dropped = ((self.accumulator - cap).as_micros() / self.period.as_micros().max(1)) as u64;
            if dropped > 0 {
                warn!(dropped, period_us = self.period.as_micros() as u64, "tick loop fell behind");
                self.stats.skipped_ticks += dropped;
            }
            self.accumulator = cap;
        }
        self.accumulator >= self.period
    }

    /// Starts a tick; pass the result to [`end_tick`](Self::end_tick).
    #[must_use]
    pub fn begin_tick(&mut self) -> Instant {
        self.accumulator = self.accumulator.saturating_sub(self.period);
        self.tick_count += 1;
        Instant::now()
    }

    /// Finishes a tick and records its duration.
    pub fn end_tick(&mut self, start: Instant) {
        let elapsed = start.elapsed();
        let elapsed_us = elapsed.as_micros() as u64;
        let stats = &mut self.stats;
        stats.total_ticks += 1;
        stats.min_tick_us = stats.min_tick_us.min(elapsed_us);
        stats.max_tick_us = stats.max_tick_us.max(elapsed_us);
        stats.avg_tick_us = (stats.avg_tick_us * 15 + elapsed_us) / 16;
        if elapsed > self.period {
            stats.late_ticks += 1;
        }
    }

    /// Blocks until the next tick is due.
    pub fn wait_for_next_tick(&self) {
        let due = self.period.saturating_sub(self.accumulator);
        let deadline = self.last_poll + due;
        let now = Instant::now();
        if deadline <= now {
            return;
        }
        let remaining = deadline - now;
        if remaining > SPIN_WINDOW * 2 {
            std::thread::sleep(remaining - SPIN_WINDOW);
        }
        while Instant::now() < deadline {
            std::hint::spin_loop();
        }
    }

    /// Ticks started so far.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Timing statistics.
    #[must_use]
    pub const fn stats(&self) -> &TickStats {
        &self.stats
    }

    /// Target period.
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Clears the statistics, e.g. after a periodic report.
    pub fn reset_stats(&mut self) {
        self.stats = TickStats::fresh(self.period);
    }
}
