//! Note and voice identity.
//!
//! Note ids are ownership tokens: each trigger gets a fresh one, and a voice
//! only honours a release carrying the id it is currently playing. Counters
//! are shareable handles rather than globals, so two synths can either keep
//! separate identity spaces or deliberately share one.

use core::fmt;
use core::num::NonZeroU64;
use std::cell::Cell;
use std::rc::Rc;

/// Token identifying one trigger/release pair. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NoteId(NonZeroU64);

impl NoteId {
    /// Raw id value (always `>= 1`).
    #[inline]
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "note#{}", self.0)
    }
}

/// Stable identity of a voice for its whole lifetime in a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VoiceId(u64);

impl VoiceId {
    /// Raw id value.
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "voice#{}", self.0)
    }
}

/// Monotonic note-id counter. Starts at 1; clones share the sequence.
///
/// ```rust
/// use polyvoice_synth::NoteIds;
///
/// let ids = NoteIds::new();
/// let shared = ids.clone();
///
/// assert_eq!(ids.issue().get(), 1);
/// assert_eq!(shared.issue().get(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct NoteIds {
    next: Rc<Cell<NonZeroU64>>,
}

impl NoteIds {
    /// Create a fresh identity space.
    pub fn new() -> Self {
        Self {
            next: Rc::new(Cell::new(NonZeroU64::MIN)),
        }
    }

    /// Issue the next note id.
    pub fn issue(&self) -> NoteId {
        let id = self.next.get();
        // Exhaustion is unreachable in practice; saturate rather than wrap to zero.
        self.next.set(id.saturating_add(1));
        NoteId(id)
    }

    /// The id the next call to [`issue`](Self::issue) will return.
    pub fn peek(&self) -> u64 {
        self.next.get().get()
    }
}

impl Default for NoteIds {
    fn default() -> Self {
        Self::new()
    }
}

/// Monotonic voice-id counter. Starts at 0.
#[derive(Debug, Clone, Default)]
pub struct VoiceIds {
    next: Rc<Cell<u64>>,
}

impl VoiceIds {
    /// Create a fresh identity space.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next voice id.
    pub fn issue(&self) -> VoiceId {
        let id = self.next.get();
        self.next.set(id.saturating_add(1));
        VoiceId(id)
    }
}
