//! Click counter widget
//!
//! The widget cycles between two playback states:
//!
//! ```text
//!                trigger accepted
//!   +---------+ -----------------> +--------+
//!   | Resting |                    | Active |
//!   +---------+ <----------------- +--------+
//!             variant duration elapsed
//! ```
//!
//! An accepted trigger plays the current sound variant, fires a
//! detached increment of the shared counter document, swaps the spin
//! surface to its animated source, and schedules the return to
//! `Resting`. Triggers that land while `Active` are dropped, so the
//! sound variants strictly alternate across accepted triggers.
//!
//! The widget starts inert. It arms itself once the [`ClientGate`]
//! resolves with a store client, at which point it subscribes to the
//! counter document and mirrors every change into the display surface.
//! Store and audio failures are logged and dropped; they never stop
//! the cycle or disturb the displayed count.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::json;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::audio::{AudioTrack, SoundBank};
use crate::config::WidgetConfig;
use crate::store::gate::ClientGate;
use crate::store::{DocSnapshot, DocWatch, DocumentStore};
use crate::surface::{CounterDisplay, SpinSurface};
use crate::types::{format_count, CounterDoc};

/// What happened to one trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The trigger started a cycle with the given variant index
    Accepted {
        /// Which variant (0 or 1) this cycle plays
        variant: usize,
    },
    /// A cycle was already active, the trigger was dropped
    DroppedBusy,
    /// The widget is not armed (no client yet, or already shut down),
    /// the trigger was dropped
    DroppedUnarmed,
}

/// Mutable playback state, guarded by one lock
struct PlaybackState {
    /// Reentrancy guard, true from trigger acceptance to frame restore
    is_playing: bool,
    /// Variant the next accepted trigger will play
    variant_index: usize,
}

/// A sound variant resolved against its cycle duration
struct BoundVariant {
    track: Arc<dyn AudioTrack>,
    duration: Duration,
}

struct WidgetInner<S> {
    config: WidgetConfig,
    variants: [BoundVariant; 2],
    display: Arc<dyn CounterDisplay>,
    visual: Arc<dyn SpinSurface>,
    playback: Mutex<PlaybackState>,
    store: OnceLock<Arc<S>>,
    armed: AtomicBool,
    cancel: CancellationToken,
}

impl<S> WidgetInner<S> {
    fn play_sound(&self, variant: usize) {
        let track = &self.variants[variant].track;
        track.rewind();
        if let Err(e) = track.play() {
            warn!(variant, error = %e, "sound playback failed");
        }
    }

    /// Swap the spin surface to the animated frame, cache-busted so a
    /// host that caches by source restarts the animation every cycle.
    fn show_active(&self) {
        let stamp = chrono::Utc::now().timestamp_millis();
        self.visual
            .set_source(&format!("{}?t={}", self.config.active_source, stamp));
    }

    fn restore_resting(&self) {
        // Repaint before lifting the guard; a trigger accepted right
        // after must paint over the resting frame, not under it.
        self.visual.set_source(&self.config.resting_source);
        self.playback.lock().is_playing = false;
    }
}

/// A click-counter widget that has not been started yet
pub struct ClickCounterWidget<S: DocumentStore> {
    inner: Arc<WidgetInner<S>>,
    gate: ClientGate<S>,
}

impl<S: DocumentStore> ClickCounterWidget<S> {
    /// Wire a widget to its surfaces, sounds and store gate
    pub fn new(
        config: WidgetConfig,
        bank: SoundBank,
        display: Arc<dyn CounterDisplay>,
        visual: Arc<dyn SpinSurface>,
        gate: ClientGate<S>,
    ) -> Self {
        let variants = [
            BoundVariant {
                track: Arc::clone(bank.track(0)),
                duration: config.variants[0].duration,
            },
            BoundVariant {
                track: Arc::clone(bank.track(1)),
                duration: config.variants[1].duration,
            },
        ];

        Self {
            inner: Arc::new(WidgetInner {
                config,
                variants,
                display,
                visual,
                playback: Mutex::new(PlaybackState {
                    is_playing: false,
                    variant_index: 0,
                }),
                store: OnceLock::new(),
                armed: AtomicBool::new(false),
                cancel: CancellationToken::new(),
            }),
            gate,
        }
    }

    /// Show the resting frame and begin waiting for the store client.
    ///
    /// The resting frame goes up immediately. Arming happens on a
    /// detached task once the gate resolves, so a late-provided client
    /// never delays startup. Must be called on a Tokio runtime.
    pub fn start(self) -> WidgetHandle<S> {
        let Self { inner, gate } = self;

        inner.visual.set_source(&inner.config.resting_source);
        tokio::spawn(arm(Arc::clone(&inner), gate));

        WidgetHandle { inner }
    }
}

/// Wait for the store client, then subscribe and enable triggers.
async fn arm<S: DocumentStore>(inner: Arc<WidgetInner<S>>, mut gate: ClientGate<S>) {
    let store = tokio::select! {
        _ = inner.cancel.cancelled() => return,
        client = gate.ready() => match client {
            Some(store) => store,
            None => {
                warn!(
                    key = %inner.config.counter_key,
                    "store gate closed before a client arrived, widget stays inert"
                );
                return;
            }
        },
    };

    let watch = store.subscribe(&inner.config.counter_key);
    let _ = inner.store.set(store);
    tokio::spawn(mirror(Arc::clone(&inner), watch));
    inner.armed.store(true, Ordering::Release);
    info!(key = %inner.config.counter_key, "click counter armed");
}

/// Mirror every counter document change into the display surface.
async fn mirror<S: DocumentStore>(inner: Arc<WidgetInner<S>>, mut watch: DocWatch) {
    loop {
        let snapshot = tokio::select! {
            _ = inner.cancel.cancelled() => break,
            next = watch.changed() => match next {
                Some(snapshot) => snapshot,
                None => {
                    debug!(key = %inner.config.counter_key, "counter feed ended");
                    break;
                }
            },
        };

        let count = counter_doc(&snapshot).count;
        inner.display.set_text(&format_count(count));
    }
}

/// Read a snapshot as a counter document. Missing documents and
/// payloads of the wrong shape both read as a zero tally.
fn counter_doc(snapshot: &DocSnapshot) -> CounterDoc {
    snapshot.parse().ok().flatten().unwrap_or_default()
}

/// Handle over a started widget
///
/// Cloning the handle is cheap, every clone drives the same widget.
pub struct WidgetHandle<S> {
    inner: Arc<WidgetInner<S>>,
}

impl<S> Clone for WidgetHandle<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: DocumentStore> WidgetHandle<S> {
    /// Run one click cycle, unless one is already running.
    ///
    /// On acceptance the counter increment runs on a detached task and
    /// the frame restore on another, so the call itself never blocks.
    /// Transaction failures are logged at `warn` and otherwise
    /// swallowed, the local cycle plays out regardless.
    pub fn trigger(&self) -> TriggerOutcome {
        let inner = &self.inner;

        if inner.cancel.is_cancelled() {
            debug!(key = %inner.config.counter_key, "trigger after shutdown, dropping");
            return TriggerOutcome::DroppedUnarmed;
        }

        if !inner.armed.load(Ordering::Acquire) {
            debug!(
                key = %inner.config.counter_key,
                "trigger before the store client arrived, dropping"
            );
            return TriggerOutcome::DroppedUnarmed;
        }

        let variant = {
            let mut playback = inner.playback.lock();
            if playback.is_playing {
                return TriggerOutcome::DroppedBusy;
            }
            playback.is_playing = true;
            let chosen = playback.variant_index;
            // Flipping under the same lock keeps the alternation strict
            // no matter how triggers interleave.
            playback.variant_index = 1 - chosen;
            chosen
        };

        inner.play_sound(variant);
        self.spawn_increment();
        inner.show_active();
        self.spawn_restore(inner.variants[variant].duration);

        TriggerOutcome::Accepted { variant }
    }

    fn spawn_increment(&self) {
        // Armed implies the store slot is set.
        let Some(store) = self.inner.store.get().cloned() else {
            return;
        };
        let key = self.inner.config.counter_key.clone();

        tokio::spawn(async move {
            let written = store
                .run_transaction(&key, |snapshot| {
                    json!({ "count": counter_doc(snapshot).incremented().count })
                })
                .await;
            if let Err(e) = written {
                warn!(key = %key, error = %e, "counter increment failed");
            }
        });
    }

    fn spawn_restore(&self, duration: Duration) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::select! {
                _ = inner.cancel.cancelled() => {}
                _ = sleep(duration) => inner.restore_resting(),
            }
        });
    }

    /// Whether a store client has arrived and triggers are live
    pub fn is_armed(&self) -> bool {
        self.inner.armed.load(Ordering::Acquire) && !self.inner.cancel.is_cancelled()
    }

    /// Whether a cycle is active right now
    pub fn is_playing(&self) -> bool {
        self.inner.playback.lock().is_playing
    }

    /// Stop the widget's background tasks.
    ///
    /// Pending restore timers, the arming wait and the counter mirror
    /// all end, and later triggers are dropped. Idempotent.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
        debug!(key = %self.inner.config.counter_key, "click counter shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TallyResult;
    use crate::store::memory::MemoryStore;

    struct NullTrack;

    impl AudioTrack for NullTrack {
        fn rewind(&self) {}
        fn play(&self) -> TallyResult<()> {
            Ok(())
        }
    }

    struct NullDisplay;

    impl CounterDisplay for NullDisplay {
        fn set_text(&self, _text: &str) {}
    }

    struct RecordingSurface {
        sources: Mutex<Vec<String>>,
    }

    impl RecordingSurface {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                sources: Mutex::new(Vec::new()),
            })
        }

        fn sources(&self) -> Vec<String> {
            self.sources.lock().clone()
        }
    }

    impl SpinSurface for RecordingSurface {
        fn set_source(&self, source: &str) {
            self.sources.lock().push(source.to_string());
        }
    }

    fn test_bank() -> SoundBank {
        SoundBank::new(Arc::new(NullTrack), Arc::new(NullTrack))
    }

    #[tokio::test]
    async fn test_start_shows_resting_frame_immediately() {
        let (_setter, gate) = ClientGate::<MemoryStore>::channel();
        let surface = RecordingSurface::new();

        let widget = ClickCounterWidget::new(
            WidgetConfig::default(),
            test_bank(),
            Arc::new(NullDisplay),
            surface.clone(),
            gate,
        );
        let handle = widget.start();

        assert_eq!(surface.sources(), vec!["spin-still.gif".to_string()]);
        handle.shutdown();
    }

    #[tokio::test]
    async fn test_trigger_before_client_is_inert() {
        let (_setter, gate) = ClientGate::<MemoryStore>::channel();
        let surface = RecordingSurface::new();

        let handle = ClickCounterWidget::new(
            WidgetConfig::default(),
            test_bank(),
            Arc::new(NullDisplay),
            surface.clone(),
            gate,
        )
        .start();

        assert_eq!(handle.trigger(), TriggerOutcome::DroppedUnarmed);
        assert!(!handle.is_armed());
        assert!(!handle.is_playing());
        // Nothing beyond the initial resting frame was shown.
        assert_eq!(surface.sources().len(), 1);
        handle.shutdown();
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let (_setter, gate) = ClientGate::<MemoryStore>::channel();

        let handle = ClickCounterWidget::new(
            WidgetConfig::default(),
            test_bank(),
            Arc::new(NullDisplay),
            RecordingSurface::new(),
            gate,
        )
        .start();

        handle.shutdown();
        handle.shutdown();
    }
}
