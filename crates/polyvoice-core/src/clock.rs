//! Monotonic time sources.
//!
//! Every voice in a pool reads the same clock, so scheduled automation from
//! different voices lines up on one timeline.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Monotonic time in seconds.
pub trait Clock {
    /// Current time in seconds. Never decreases.
    fn now(&self) -> f64;
}

impl<C: Clock + ?Sized> Clock for &C {
    #[inline]
    fn now(&self) -> f64 {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for Rc<C> {
    #[inline]
    fn now(&self) -> f64 {
        (**self).now()
    }
}

/// Hand-advanced clock.
///
/// Clones share the same underlying time, so a test can keep one handle and
/// move time forward while a synth holds another.
///
/// # Example
///
/// ```rust
/// use polyvoice_core::{Clock, ManualClock};
///
/// let clock = ManualClock::new();
/// let shared = clock.clone();
///
/// clock.advance(0.25);
/// assert_eq!(shared.now(), 0.25);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    /// Create a clock starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock starting at `start` seconds.
    pub fn starting_at(start: f64) -> Self {
        Self {
            now: Rc::new(Cell::new(start.max(0.0))),
        }
    }

    /// Move time forward by `seconds`. Negative steps are ignored.
    pub fn advance(&self, seconds: f64) {
        if seconds > 0.0 {
            self.now.set(self.now.get() + seconds);
        }
    }

    /// Jump to `time`. Moving backwards is ignored.
    pub fn set(&self, time: f64) {
        if time > self.now.get() {
            self.now.set(time);
        }
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now(&self) -> f64 {
        self.now.get()
    }
}

/// Wall-clock seconds elapsed since construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Start counting from now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}
