//! Continuous-time automation of a single control value.
//!
//! A timeline is a function from time to value, described by an ordered list
//! of scheduled events. Between events the value follows the curve declared by
//! the event kind:
//!
//! - **SetValue**: jump to a value exactly at a time and hold it.
//! - **LinearRamp**: interpolate linearly from the previous event's time and
//!   value, arriving at the ramp's value at the ramp's time.
//! - **SetTarget**: starting at a time, approach a target exponentially:
//!
//! ```text
//! v(t) = target + (v0 - target) * exp(-(t - t0) / time_constant)
//! ```
//!
//!   The target is never reached exactly.
//!
//! ## Cancellation
//!
//! [`AutomationTimeline::cancel_scheduled_values`] removes every event at or
//! after the cancel time. It does NOT remember where an in-flight ramp had
//! got to: if the cancel lands inside a linear ramp, the ramp's end event is
//! dropped and the curve reverts to the last explicitly scheduled point. A
//! caller that wants to hold the instantaneous value must schedule it
//! explicitly after cancelling.
//!
//! ```text
//!   value
//!     1 ┤        ╱ (ramp end, removed by cancel)
//!       │      ╱
//!   0.5 ┤    ● ← true value at cancel time
//!       │  ╱
//!     0 ●──────────────  ← what remains after cancel: hold 0
//!       t0   tc
//! ```

use libm::exp;

/// One scheduled point or curve segment on a timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AutomationEvent {
    /// Jump to `value` at `time`.
    SetValue {
        /// Value held from `time` onward.
        value: f64,
        /// Time in seconds.
        time: f64,
    },
    /// Ramp linearly from the previous event to `value`, arriving at `time`.
    LinearRamp {
        /// Value reached at `time`.
        value: f64,
        /// Ramp end time in seconds.
        time: f64,
    },
    /// From `time`, approach `target` exponentially.
    SetTarget {
        /// Asymptotic target value.
        target: f64,
        /// Start time in seconds.
        time: f64,
        /// Exponential time constant in seconds (0 = jump to target).
        time_constant: f64,
    },
}

impl AutomationEvent {
    /// Time at which this event takes effect.
    #[inline]
    pub fn time(&self) -> f64 {
        match *self {
            Self::SetValue { time, .. }
            | Self::LinearRamp { time, .. }
            | Self::SetTarget { time, .. } => time,
        }
    }
}

/// Scheduling contract for an automatable control value.
///
/// Implementations are owned by the rendering side; the voice manager only
/// writes to them. All times are absolute seconds on the shared clock.
pub trait AutomationTimeline {
    /// Schedule an instantaneous change to `value` at `time`.
    fn set_value_at_time(&mut self, value: f64, time: f64);

    /// Schedule a linear ramp from the previous event, reaching `value` at `time`.
    fn linear_ramp_to_value_at_time(&mut self, value: f64, time: f64);

    /// Start an exponential approach to `target` at `start_time`.
    fn set_target_at_time(&mut self, target: f64, start_time: f64, time_constant: f64);

    /// Remove every event scheduled at or after `cancel_time`.
    fn cancel_scheduled_values(&mut self, cancel_time: f64);
}

/// Curve currently in force while walking the event list.
#[derive(Debug, Clone, Copy)]
enum Segment {
    Hold(f64),
    Target {
        from: f64,
        start: f64,
        target: f64,
        time_constant: f64,
    },
}

impl Segment {
    #[inline]
    fn value_at(self, time: f64) -> f64 {
        match self {
            Segment::Hold(value) => value,
            Segment::Target {
                from,
                start,
                target,
                time_constant,
            } => {
                if time_constant <= 0.0 {
                    return target;
                }
                let elapsed = (time - start).max(0.0);
                target + (from - target) * exp(-elapsed / time_constant)
            }
        }
    }
}

/// Reference [`AutomationTimeline`] that stores events and evaluates the curve.
///
/// Events are kept sorted by time; events scheduled at the same time keep
/// their insertion order. Before the first event the timeline holds its
/// default value.
///
/// The full history is kept by default, which suits short traces. A
/// long-lived timeline should use [`ParamTimeline::with_retention`] or call
/// [`ParamTimeline::prune_before`] so retriggering does not grow it without
/// bound.
///
/// # Example
///
/// ```rust
/// use polyvoice_core::{AutomationTimeline, ParamTimeline};
///
/// let mut gain = ParamTimeline::new(0.0);
/// gain.set_value_at_time(1.0, 0.0);
/// gain.set_target_at_time(0.0, 1.0, 0.5);
///
/// assert_eq!(gain.value_at(0.5), 1.0);
/// // One time constant after the target starts: 1/e of the distance remains.
/// assert!((gain.value_at(1.5) - (-1.0f64).exp()).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamTimeline {
    default_value: f64,
    events: Vec<AutomationEvent>,
    retention: Option<f64>,
}

impl ParamTimeline {
    /// Create an empty timeline holding `default_value`.
    pub fn new(default_value: f64) -> Self {
        Self {
            default_value,
            events: Vec::new(),
            retention: None,
        }
    }

    /// Create a timeline that forgets history older than `seconds` before its
    /// latest event.
    ///
    /// Pruning happens on every insert through [`ParamTimeline::prune_before`],
    /// so the curve at and after the cutoff is unchanged.
    pub fn with_retention(default_value: f64, seconds: f64) -> Self {
        Self {
            retention: Some(seconds.max(0.0)),
            ..Self::new(default_value)
        }
    }

    /// Value held before any event.
    pub fn default_value(&self) -> f64 {
        self.default_value
    }

    /// Scheduled events in time order.
    pub fn events(&self) -> &[AutomationEvent] {
        &self.events
    }

    /// Number of scheduled events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True if nothing is scheduled.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drop every scheduled event.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Drop events that cannot affect the curve at or after `time`.
    ///
    /// Everything before the last explicit value scheduled at or before
    /// `time` is removed; an explicit value fixes the curve from its own time
    /// on. Queries earlier than that point fall back to the default value.
    /// Returns the number of events dropped.
    pub fn prune_before(&mut self, time: f64) -> usize {
        let upto = self.events.partition_point(|e| e.time() <= time);
        let Some(anchor) = self.events[..upto]
            .iter()
            .rposition(|e| matches!(e, AutomationEvent::SetValue { .. }))
        else {
            return 0;
        };
        self.events.drain(..anchor);

        #[cfg(feature = "tracing")]
        tracing::trace!(time, dropped = anchor, "timeline_prune");

        anchor
    }

    /// Evaluate the scheduled curve at `time`.
    pub fn value_at(&self, time: f64) -> f64 {
        let mut held = Segment::Hold(self.default_value);
        let mut last_time = 0.0;

        for event in &self.events {
            match *event {
                AutomationEvent::SetValue { value, time: at } => {
                    if time < at {
                        return held.value_at(time);
                    }
                    held = Segment::Hold(value);
                    last_time = at;
                }
                AutomationEvent::LinearRamp { value, time: end } => {
                    if time < end {
                        if time < last_time {
                            return held.value_at(time);
                        }
                        let start = held.value_at(last_time);
                        let progress = (time - last_time) / (end - last_time);
                        return start + (value - start) * progress;
                    }
                    held = Segment::Hold(value);
                    last_time = end;
                }
                AutomationEvent::SetTarget {
                    target,
                    time: at,
                    time_constant,
                } => {
                    if time < at {
                        return held.value_at(time);
                    }
                    held = Segment::Target {
                        from: held.value_at(at),
                        start: at,
                        target,
                        time_constant,
                    };
                    last_time = at;
                }
            }
        }

        held.value_at(time)
    }

    fn insert(&mut self, event: AutomationEvent) {
        debug_assert!(event.time().is_finite(), "non-finite automation time");
        let at = event.time();
        let index = self.events.partition_point(|e| e.time() <= at);
        self.events.insert(index, event);

        #[cfg(feature = "tracing")]
        tracing::trace!(?event, index, "timeline_insert");

        if let Some(retention) = self.retention
            && let Some(latest) = self.events.last().map(AutomationEvent::time)
        {
            self.prune_before(latest - retention);
        }
    }
}

impl AutomationTimeline for ParamTimeline {
    fn set_value_at_time(&mut self, value: f64, time: f64) {
        self.insert(AutomationEvent::SetValue { value, time });
    }

    fn linear_ramp_to_value_at_time(&mut self, value: f64, time: f64) {
        self.insert(AutomationEvent::LinearRamp { value, time });
    }

    fn set_target_at_time(&mut self, target: f64, start_time: f64, time_constant: f64) {
        self.insert(AutomationEvent::SetTarget {
            target,
            time: start_time,
            time_constant: time_constant.max(0.0),
        });
    }

    fn cancel_scheduled_values(&mut self, cancel_time: f64) {
        let keep = self.events.partition_point(|e| e.time() < cancel_time);

        #[cfg(feature = "tracing")]
        tracing::trace!(
            cancel_time,
            dropped = self.events.len() - keep,
            "timeline_cancel"
        );

        self.events.truncate(keep);
    }
}
