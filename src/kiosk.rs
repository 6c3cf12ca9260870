//! Kiosk run loop
//!
//! Wires N click-counter widgets to terminal surfaces and one shared
//! in-memory store, provides the store client after a delay, then
//! scripts a round of clicks and reports how the shared tally ended up.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use rand::Rng;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use tallyspin_core::{
    AudioTrack, ClickCounterWidget, ClientGate, CounterDisplay, CounterDoc, DocKey,
    DocumentStore, MemoryStore, SoundBank, SpinSurface, TallyResult, TrackSpec,
    TriggerOutcome, WidgetConfig, WidgetHandle,
};

/// Everything the run loop needs, resolved from the command line
pub struct KioskOptions {
    pub widgets: usize,
    pub clicks: u32,
    pub click_gap: Duration,
    pub ready_after: Duration,
    pub cycle_durations: (Duration, Duration),
}

/// Audio backend that narrates playback into the log
struct LogTrack {
    spec: TrackSpec,
}

impl LogTrack {
    fn new(spec: TrackSpec) -> Arc<Self> {
        if spec.preload {
            debug!(track = %spec.resource, "preloading sound");
        }
        Arc::new(Self { spec })
    }
}

impl AudioTrack for LogTrack {
    fn rewind(&self) {}

    fn play(&self) -> TallyResult<()> {
        debug!(
            track = %self.spec.resource,
            volume = self.spec.volume as f64,
            "playing click sound"
        );
        Ok(())
    }
}

/// Counter display that prints the live tally per widget
struct TermDisplay {
    label: String,
}

impl CounterDisplay for TermDisplay {
    fn set_text(&self, text: &str) {
        println!("[{}] count: {}", self.label, text);
    }
}

/// Spin surface that narrates frame swaps into the log
struct TermSurface {
    label: String,
}

impl SpinSurface for TermSurface {
    fn set_source(&self, source: &str) {
        debug!(widget = %self.label, frame = %source, "frame swapped");
    }
}

fn counter_key() -> DocKey {
    DocKey::new("counters", "clicks")
}

/// Read the shared tally straight out of the store
fn shared_count(store: &MemoryStore) -> u64 {
    store
        .snapshot(&counter_key())
        .parse::<CounterDoc>()
        .ok()
        .flatten()
        .unwrap_or_default()
        .count
}

/// Start one widget wired to labeled terminal surfaces
fn start_widget(
    index: usize,
    options: &KioskOptions,
    gate: ClientGate<MemoryStore>,
) -> WidgetHandle<MemoryStore> {
    let label = format!("widget-{}", index);
    let config = WidgetConfig::default()
        .with_durations(options.cycle_durations.0, options.cycle_durations.1);

    let bank = SoundBank::new(
        LogTrack::new(config.variants[0].sound.clone()),
        LogTrack::new(config.variants[1].sound.clone()),
    );

    ClickCounterWidget::new(
        config,
        bank,
        Arc::new(TermDisplay {
            label: label.clone(),
        }),
        Arc::new(TermSurface { label }),
        gate,
    )
    .start()
}

pub async fn run(options: KioskOptions) -> Result<()> {
    anyhow::ensure!(options.widgets > 0, "need at least one widget");

    println!("Tallyspin Kiosk");
    println!();
    println!(
        "widgets: {}   clicks: {}   click gap: {}ms   client delay: {}ms",
        options.widgets,
        options.clicks,
        options.click_gap.as_millis(),
        options.ready_after.as_millis()
    );
    println!("counter document: {}", counter_key());
    println!();

    let store = Arc::new(MemoryStore::new());
    let (setter, gate) = ClientGate::channel();

    let handles: Vec<_> = (0..options.widgets)
        .map(|i| start_widget(i, &options, gate.clone()))
        .collect();

    // The client shows up late, widgets arm mid-run.
    let provider = {
        let store = store.clone();
        let delay = options.ready_after;
        tokio::spawn(async move {
            sleep(delay).await;
            info!(delay_ms = delay.as_millis() as u64, "providing the store client");
            setter.provide(store);
        })
    };

    let mut accepted = 0u32;
    let mut dropped_busy = 0u32;
    let mut dropped_unarmed = 0u32;

    for click in 0..options.clicks {
        let handle = &handles[click as usize % handles.len()];
        match handle.trigger() {
            TriggerOutcome::Accepted { variant } => {
                accepted += 1;
                debug!(click, variant, "click accepted");
            }
            TriggerOutcome::DroppedBusy => dropped_busy += 1,
            TriggerOutcome::DroppedUnarmed => dropped_unarmed += 1,
        }

        let jitter = rand::rng().random_range(0..=options.click_gap.as_millis() as u64 / 4);
        sleep(options.click_gap + Duration::from_millis(jitter)).await;
    }

    let _ = provider.await;

    // Detached increments may still be in flight, give them a moment.
    let deadline = Instant::now() + Duration::from_secs(2);
    let final_count = loop {
        let count = shared_count(&store);
        if count == u64::from(accepted) {
            break count;
        }
        if Instant::now() >= deadline {
            warn!(count, accepted, "tally did not converge before the deadline");
            break count;
        }
        sleep(Duration::from_millis(10)).await;
    };

    for handle in &handles {
        handle.shutdown();
    }

    println!();
    println!("clicks sent:        {}", options.clicks);
    println!("accepted:           {}", accepted);
    println!("dropped (busy):     {}", dropped_busy);
    println!("dropped (unarmed):  {}", dropped_unarmed);
    println!("final shared count: {}", final_count);
    println!(
        "tally consistent:   {}",
        if final_count == u64::from(accepted) {
            "yes"
        } else {
            "no"
        }
    );

    Ok(())
}
