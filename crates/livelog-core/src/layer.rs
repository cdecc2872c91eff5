//! Tracing layer that forwards events into a livelog [`Backend`].
//!
//! Lets code instrumented with `tracing` share the same destinations (and
//! filters) as code logging through [`crate::Logger`].
//!
//! ```ignore
//! use livelog_core::layer::BackendLayer;
//! use tracing_subscriber::prelude::*;
//!
//! let backend = config.build_backend()?;
//! tracing_subscriber::registry()
//!     .with(BackendLayer::new(backend.clone()))
//!     .init();
//! ```

use std::fmt::Write as FmtWrite;
use std::sync::Arc;

use serde_json::{Map, Number, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

use crate::backend::Backend;
use crate::level::Level;

/// A tracing layer writing every event to a backend.
///
/// The event's target becomes the key (`::` replaced by `/`), its `message`
/// field the message, and any other fields a JSON object in `data`.
pub struct BackendLayer {
    backend: Arc<dyn Backend>,
}

impl BackendLayer {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }
}

/// Map a tracing target onto a livelog key.
pub fn target_key(target: &str) -> String {
    target.replace("::", "/")
}

impl<S: Subscriber> Layer<S> for BackendLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let level = Level::from(metadata.level());
        let key = target_key(metadata.target());

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let message = visitor.message.unwrap_or_default();
        let data = (!visitor.fields.is_empty()).then(|| Value::Object(visitor.fields));

        self.backend.write(Some(&key), level, &message, data.as_ref());
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: Map<String, Value>,
}

impl FieldVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        self.fields.insert(field.name().to_string(), value);
    }
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let mut buf = String::new();
        let _ = write!(&mut buf, "{:?}", value);

        if field.name() == "message" {
            self.message = Some(buf);
        } else {
            self.insert(field, Value::String(buf));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.insert(field, Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::Number(value.into()));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::Number(value.into()));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::Bool(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        if let Some(n) = Number::from_f64(value) {
            self.insert(field, Value::Number(n));
        }
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, Value::String(value.to_string()));
    }
}
