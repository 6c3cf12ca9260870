//! Widget configuration
//!
//! All fixed constants of the click cycle live here: the two
//! sound/duration pairings the widget alternates through, the resting
//! and active frame sources, and the key of the shared counter
//! document. The defaults reproduce the production tuning (1000 ms and
//! 700 ms cycles at volume 0.7 against `counters/clicks`).

use std::time::Duration;

use crate::types::DocKey;

/// Default playback volume for both tracks
pub const DEFAULT_VOLUME: f32 = 0.7;

/// How a sound resource should be loaded by the host's audio backend
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSpec {
    /// Resource name the host resolves to an actual audio asset
    pub resource: String,
    /// Playback volume in `0.0..=1.0`
    pub volume: f32,
    /// Whether the host should fetch the asset eagerly
    pub preload: bool,
}

impl TrackSpec {
    /// Create a spec with the default volume and eager preloading
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            volume: DEFAULT_VOLUME,
            preload: true,
        }
    }

    /// Set the playback volume
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    /// Set whether the asset is fetched eagerly
    pub fn with_preload(mut self, preload: bool) -> Self {
        self.preload = preload;
        self
    }
}

/// One sound/duration pairing
///
/// The widget owns exactly two of these and alternates between them on
/// every accepted trigger. Read-only after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantPair {
    /// The sound played when this variant is chosen
    pub sound: TrackSpec,
    /// How long the active frame stays up before the resting frame returns
    pub duration: Duration,
}

impl VariantPair {
    /// Pair a sound with its animation duration
    pub fn new(sound: TrackSpec, duration: Duration) -> Self {
        Self { sound, duration }
    }
}

/// Full configuration of one click-counter widget
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    /// Key of the shared counter document
    pub counter_key: DocKey,
    /// The two pairings indexed by the alternating variant index
    pub variants: [VariantPair; 2],
    /// Frame shown while the widget is resting
    pub resting_source: String,
    /// Frame shown while a cycle is active (cache-busted on each trigger)
    pub active_source: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            counter_key: DocKey::new("counters", "clicks"),
            variants: [
                VariantPair::new(TrackSpec::new("click-a.ogg"), Duration::from_millis(1000)),
                VariantPair::new(TrackSpec::new("click-b.ogg"), Duration::from_millis(700)),
            ],
            resting_source: "spin-still.gif".to_string(),
            active_source: "spin-active.gif".to_string(),
        }
    }
}

impl WidgetConfig {
    /// Point the widget at a different counter document
    pub fn with_counter_key(mut self, key: DocKey) -> Self {
        self.counter_key = key;
        self
    }

    /// Replace both cycle durations, keeping the configured sounds
    pub fn with_durations(mut self, first: Duration, second: Duration) -> Self {
        self.variants[0].duration = first;
        self.variants[1].duration = second;
        self
    }

    /// Replace the resting and active frame sources
    pub fn with_sources(
        mut self,
        resting: impl Into<String>,
        active: impl Into<String>,
    ) -> Self {
        self.resting_source = resting.into();
        self.active_source = active.into();
        self
    }
}
