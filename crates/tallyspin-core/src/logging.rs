//! Log capture layer
//!
//! Failures in the widget are logged and dropped, never surfaced, so
//! the only way to observe the failure contract is through the tracing
//! sink. This layer records every event into shared memory where tests
//! (and diagnostic tooling) can query them.

use std::fmt::Write as FmtWrite;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// One recorded tracing event
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    /// Lowercase level name (`"warn"`, `"info"`, ...)
    pub level: String,
    /// Module path the event was emitted from
    pub target: String,
    /// The event's message field
    pub message: String,
    /// Every other field, stringified
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl CapturedEvent {
    /// Whether the message or any field value mentions `needle`
    pub fn mentions(&self, needle: &str) -> bool {
        self.message.contains(needle)
            || self
                .fields
                .values()
                .any(|v| v.as_str().is_some_and(|s| s.contains(needle)))
    }
}

/// Shared handle over everything a [`CaptureLayer`] recorded
#[derive(Clone, Default)]
pub struct LogCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl LogCapture {
    /// Create an empty capture
    pub fn new() -> Self {
        Self::default()
    }

    /// A layer that records into this capture
    pub fn layer(&self) -> CaptureLayer {
        CaptureLayer {
            events: Arc::clone(&self.events),
        }
    }

    /// Copy of every recorded event, in emission order
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().clone()
    }

    /// How many events were recorded at `level`
    pub fn count_at(&self, level: &str) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.level == level)
            .count()
    }

    /// Whether any event at `level` mentions `needle`
    pub fn contains(&self, level: &str, needle: &str) -> bool {
        self.events
            .lock()
            .iter()
            .any(|e| e.level == level && e.mentions(needle))
    }
}

/// A tracing layer that records events into a [`LogCapture`]
pub struct CaptureLayer {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();

        let mut visitor = FieldVisitor::new();
        event.record(&mut visitor);

        self.events.lock().push(CapturedEvent {
            level: metadata.level().as_str().to_lowercase(),
            target: metadata.target().to_string(),
            message: visitor.message.unwrap_or_default(),
            fields: visitor.fields,
        });
    }
}

/// Visitor that extracts fields from tracing events
struct FieldVisitor {
    message: Option<String>,
    fields: serde_json::Map<String, serde_json::Value>,
}

impl FieldVisitor {
    fn new() -> Self {
        Self {
            message: None,
            fields: serde_json::Map::new(),
        }
    }
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let name = field.name();
        let mut buf = String::new();
        let _ = write!(&mut buf, "{:?}", value);

        if name == "message" {
            self.message = Some(buf);
        } else {
            self.fields
                .insert(name.to_string(), serde_json::Value::String(buf));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        let name = field.name();
        if name == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields
                .insert(name.to_string(), serde_json::Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields
            .insert(field.name().to_string(), serde_json::Value::Number(value.into()));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields
            .insert(field.name().to_string(), serde_json::Value::Number(value.into()));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields
            .insert(field.name().to_string(), serde_json::Value::Bool(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        if let Some(n) = serde_json::Number::from_f64(value) {
            self.fields
                .insert(field.name().to_string(), serde_json::Value::Number(n));
        }
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.fields.insert(
            field.name().to_string(),
            serde_json::Value::String(value.to_string()),
        );
    }
}
