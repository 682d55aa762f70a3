//! Polyvoice Core - automation timeline and clock primitives
//!
//! This crate defines the two collaborators the voice manager schedules
//! against, plus reference implementations used by tests and tooling.
//!
//! # Core Abstractions
//!
//! ## Automation
//!
//! Control values are never polled. Instead, callers schedule points and
//! curves on a continuous timeline and the renderer interpolates between them:
//!
//! - [`AutomationTimeline`] - Scheduling contract (set, ramp, target, cancel)
//! - [`ParamTimeline`] - Event list that evaluates the scheduled curve at any time
//! - [`AutomationEvent`] - One scheduled point or curve segment
//!
//! ## Time
//!
//! - [`Clock`] - Monotonic time source in seconds
//! - [`ManualClock`] - Shared, hand-advanced clock for tests and offline runs
//! - [`SystemClock`] - Wall-clock time since construction
//!
//! # Example
//!
//! ```rust
//! use polyvoice_core::{AutomationTimeline, ParamTimeline};
//!
//! let mut gain = ParamTimeline::new(0.0);
//! gain.set_value_at_time(0.0, 0.0);
//! gain.linear_ramp_to_value_at_time(1.0, 0.1);
//!
//! assert!((gain.value_at(0.05) - 0.5).abs() < 1e-9);
//!
//! // Cancelling drops the ramp; the curve falls back to the last explicit point.
//! gain.cancel_scheduled_values(0.05);
//! assert_eq!(gain.value_at(0.05), 0.0);
//! ```
//!
//! # Features
//!
//! - `tracing`: emit `trace!` events for every scheduled and cancelled point.

pub mod clock;
pub mod timeline;

pub use clock::{Clock, ManualClock, SystemClock};
pub use timeline::{AutomationEvent, AutomationTimeline, ParamTimeline};
