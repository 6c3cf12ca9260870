//! Tallyspin Core Library
//!
//! Shared click tally with alternating spin playback.
//!
//! ## Overview
//!
//! Tallyspin drives a click-counter widget: every accepted click plays
//! one of two alternating sound variants, spins up an animated frame
//! for that variant's duration, and transactionally increments a
//! counter document shared by every client. A subscription mirrors the
//! live tally back into a display surface with locale-style grouping.
//!
//! ## Core Principles
//!
//! - **Never block the click**: increments and frame restores run on
//!   detached tasks
//! - **Late clients welcome**: widgets start inert and arm themselves
//!   when the store client arrives
//! - **Failures are logged, not fatal**: a lost increment or a silent
//!   sound never stops the cycle
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use tallyspin_core::{ClickCounterWidget, ClientGate, MemoryStore, WidgetConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(MemoryStore::new());
//!     let (setter, gate) = ClientGate::channel();
//!
//!     let widget = ClickCounterWidget::new(
//!         WidgetConfig::default(),
//!         bank,    // two AudioTrack impls
//!         display, // CounterDisplay impl
//!         visual,  // SpinSurface impl
//!         gate,
//!     );
//!     let handle = widget.start();
//!
//!     // The widget arms once the client shows up, even much later.
//!     setter.provide(store);
//!
//!     handle.trigger();
//! }
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod logging;
pub mod store;
pub mod surface;
pub mod types;
pub mod widget;

// Re-exports
pub use audio::{AudioTrack, SoundBank};
pub use config::{TrackSpec, VariantPair, WidgetConfig, DEFAULT_VOLUME};
pub use error::{TallyError, TallyResult};
pub use logging::{CaptureLayer, CapturedEvent, LogCapture};
pub use store::gate::{ClientGate, GateSetter, Readiness};
pub use store::memory::MemoryStore;
pub use store::{DocSnapshot, DocWatch, DocumentStore};
pub use surface::{CounterDisplay, SpinSurface};
pub use types::{format_count, CounterDoc, DocKey};
pub use widget::{ClickCounterWidget, TriggerOutcome, WidgetHandle};
