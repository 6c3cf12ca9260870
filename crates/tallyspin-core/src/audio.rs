//! Audio playback seam
//!
//! The widget never touches an audio device directly. The host hands it
//! two loaded tracks behind the [`AudioTrack`] trait; the widget rewinds
//! and plays them, and treats play rejection as a logged, non-fatal
//! event.

use std::sync::Arc;

use crate::error::TallyResult;

/// A loaded, playable sound resource
///
/// Mirrors the host audio element contract: the playback position can be
/// rewound to the start, and `play` reports failure instead of
/// panicking. Implementations decide what "playing" means (a real
/// device, a log line, a recording for tests).
pub trait AudioTrack: Send + Sync {
    /// Reset the playback position to the beginning of the track
    fn rewind(&self);

    /// Start playback from the current position
    ///
    /// # Errors
    ///
    /// Returns `TallyError::Playback` when the host refuses to play
    /// (autoplay policy, missing asset, device gone). The widget logs
    /// this and carries on with the visual cycle.
    fn play(&self) -> TallyResult<()>;
}

/// The two tracks a widget alternates between, indexed by variant
pub struct SoundBank {
    tracks: [Arc<dyn AudioTrack>; 2],
}

impl SoundBank {
    /// Build a bank from the variant-0 and variant-1 tracks
    pub fn new(first: Arc<dyn AudioTrack>, second: Arc<dyn AudioTrack>) -> Self {
        Self {
            tracks: [first, second],
        }
    }

    /// The track for a variant index (0 or 1)
    pub fn track(&self, variant: usize) -> &Arc<dyn AudioTrack> {
        &self.tracks[variant & 1]
    }
}
