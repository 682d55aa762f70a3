//! ADSR scheduling on an automation timeline.
//!
//! The envelope is never computed sample by sample. A trigger writes the
//! whole attack and decay shape onto the voice's gain timeline, and a release
//! replaces whatever is still pending with an exponential fall to silence.
//!
//! ```text
//!  velocity ┤    ╱╲
//!           │   ╱  ╲___________ velocity * sustain
//!           │  ╱               ╲
//!         0 ●─╯                 ╲______
//!           t0   t0+attack      t1 (release)
//! ```
//!
//! The hard case is a release that lands inside the linear attack ramp.
//! Cancelling the pending automation also drops the ramp's end point, so the
//! timeline would snap back to 0 at `t0`. [`schedule_release`] sets the
//! interpolated ramp value explicitly at the release time before starting the
//! fall, which keeps the curve continuous.

use polyvoice_core::AutomationTimeline;

use crate::params::VoiceParams;

/// Scale from a user-facing decay/release duration to the exponential time
/// constant. At `duration` the curve has covered about 86% of the distance.
pub const TIME_CONSTANT_SCALE: f64 = 0.5;

/// Time constants after which a release counts as silent (about -60 dB).
pub const SETTLE_TIME_CONSTANTS: f64 = 7.0;

/// Conceptual envelope stage of a voice at a point in time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EnvelopeState {
    /// Never triggered, or released long enough ago to be silent.
    #[default]
    Idle,
    /// Waiting for, or inside, the linear attack ramp.
    Attack,
    /// Decaying toward and holding the sustain level.
    Sustain,
    /// Falling toward silence after a release.
    Release,
}

impl EnvelopeState {
    /// True for every stage except [`Idle`](Self::Idle).
    pub fn is_sounding(self) -> bool {
        self != EnvelopeState::Idle
    }
}

/// The linear attack ramp scheduled by one trigger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackWindow {
    /// Ramp start (`now + audio_delay`).
    pub start: f64,
    /// Ramp duration in seconds (never negative).
    pub attack_time: f64,
    /// Peak value reached at the end of the ramp.
    pub velocity: f64,
}

impl AttackWindow {
    /// Time the ramp reaches `velocity`.
    #[inline]
    pub fn end(&self) -> f64 {
        self.start + self.attack_time
    }

    /// Value of the attack ramp at `time`, ignoring decay.
    ///
    /// 0 before the ramp starts, `velocity` once it has finished.
    pub fn ramp_value_at(&self, time: f64) -> f64 {
        if time < self.start {
            0.0
        } else if self.attack_time <= 0.0 || time >= self.end() {
            self.velocity
        } else {
            self.velocity * (time - self.start) / self.attack_time
        }
    }

    /// True if `time` lies inside the ramp, end included.
    #[inline]
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time <= self.end()
    }
}

/// The release fall scheduled by one note-off.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReleaseWindow {
    /// Time the fall starts.
    pub start: f64,
    /// Explicit value set at `start`, when the release cut the attack ramp.
    pub start_value: Option<f64>,
    /// User-facing release duration in seconds.
    pub release_time: f64,
}

impl ReleaseWindow {
    /// Time after which the voice is treated as silent.
    pub fn settled_at(&self) -> f64 {
        self.start + self.release_time.max(0.0) * TIME_CONSTANT_SCALE * SETTLE_TIME_CONSTANTS
    }
}

/// Schedule the attack and decay shape starting at `start`.
///
/// Pending automation from `start` onward is cleared first, so a stolen voice
/// does not keep its previous note's curve.
pub fn schedule_attack<G: AutomationTimeline + ?Sized>(
    gain: &mut G,
    start: f64,
    velocity: f64,
    params: &VoiceParams,
) -> AttackWindow {
    let window = AttackWindow {
        start,
        attack_time: params.attack_time.max(0.0),
        velocity,
    };
    let sustain = velocity * params.sustain_level.clamp(0.0, 1.0);
    let decay_tau = params.decay_time.max(0.0) * TIME_CONSTANT_SCALE;

    gain.cancel_scheduled_values(start);
    gain.set_value_at_time(0.0, start);
    gain.linear_ramp_to_value_at_time(velocity, window.end());
    gain.set_target_at_time(sustain, window.end(), decay_tau);

    window
}

/// Schedule a release at `now` for a note whose attack is `window`.
///
/// - Released before the attack begins: the pending attack is dropped and the
///   fall starts at the attack start, continuing whatever the gain was doing.
///   The previous note's tail between `now` and the attack start is kept.
/// - Released inside the ramp: the interpolated ramp value is set explicitly
///   at `now`.
/// - Released after the ramp: the decay curve is already continuous at `now`.
pub fn schedule_release<G: AutomationTimeline + ?Sized>(
    gain: &mut G,
    window: &AttackWindow,
    release_time: f64,
    now: f64,
) -> ReleaseWindow {
    let release_tau = release_time.max(0.0) * TIME_CONSTANT_SCALE;

    if now < window.start {
        gain.cancel_scheduled_values(window.start);
        gain.set_target_at_time(0.0, window.start, release_tau);
        return ReleaseWindow {
            start: window.start,
            start_value: None,
            release_time,
        };
    }

    gain.cancel_scheduled_values(now);
    let start_value = if window.contains(now) {
        let value = window.ramp_value_at(now);
        gain.set_value_at_time(value, now);
        Some(value)
    } else {
        None
    };
    gain.set_target_at_time(0.0, now, release_tau);

    ReleaseWindow {
        start: now,
        start_value,
        release_time,
    }
}

/// Envelope stage at `time` given the last attack and optional release.
pub fn state_at(attack: &AttackWindow, release: Option<&ReleaseWindow>, time: f64) -> EnvelopeState {
    match release {
        Some(release) if time >= release.settled_at() => EnvelopeState::Idle,
        Some(release) if time >= release.start => EnvelopeState::Release,
        _ if time < attack.end() => EnvelopeState::Attack,
        _ => EnvelopeState::Sustain,
    }
}
