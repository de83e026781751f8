//! Platform abstraction layer
//!
//! Handles browser/native/headless differences for:
//! - Wall-clock time (epoch milliseconds)
//! - Frame ticks
//! - Logger setup

use std::cell::Cell;

/// Source of epoch-millisecond timestamps
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Real wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[cfg(not(target_arch = "wasm32"))]
    fn now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    #[cfg(target_arch = "wasm32")]
    fn now_ms(&self) -> u64 {
        js_sys::Date::now() as u64
    }
}

/// Hand-advanced clock for tests and headless runs
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// Supplies frame timestamps to the game loop
///
/// In the browser this is the animation-frame callback; headless runs use
/// [`FixedRateTicks`].
pub trait TickSource {
    /// Timestamp of the next frame, or `None` when the source is exhausted
    fn next_frame(&mut self) -> Option<u64>;
}

/// Fixed-interval frames, bounded by a frame budget
#[derive(Debug, Clone)]
pub struct FixedRateTicks {
    now_ms: u64,
    interval_ms: u64,
    remaining: u64,
}

impl FixedRateTicks {
    pub fn new(start_ms: u64, interval_ms: u64, frames: u64) -> Self {
        Self {
            now_ms: start_ms,
            interval_ms,
            remaining: frames,
        }
    }

    /// Timestamp the next frame will carry
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }
}

impl TickSource for FixedRateTicks {
    fn next_frame(&mut self) -> Option<u64> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let now = self.now_ms;
        self.now_ms += self.interval_ms;
        Some(now)
    }
}

/// Install the platform logger (idempotent)
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

/// Install the platform logger (idempotent)
#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}
