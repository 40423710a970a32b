use crate::base::Base;
use crate::level::LogLevel;
use crate::record::Attrs;
use chrono::Utc;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that turns every event into a log call on a
/// [`Base`], so `tracing` macros end up on the console loggers.
///
/// Event fields become call-site attributes; the `message` field becomes
/// the log message. `TRACE` events are logged at [`LogLevel::Debug`].
pub struct ConsoleLayer {
    base: Arc<Base>,
}

impl ConsoleLayer {
    pub fn new(base: Arc<Base>) -> Self {
        ConsoleLayer { base }
    }
}

impl<S> Layer<S> for ConsoleLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = Attrs::new();
        let mut message: Option<String> = None;

        let mut visitor = FieldVisitor {
            fields: &mut fields,
            message: &mut message,
        };
        event.record(&mut visitor);

        let level = LogLevel::from(event.metadata().level());
        let attrs = (!fields.is_empty()).then_some(&fields);
        let message = message.unwrap_or_default();

        // A layer has no caller to hand the error back to.
        if let Err(e) = self.base.logm_at(Utc::now(), level, attrs, message) {
            eprintln!("console logger failed: {}", e);
        }
    }
}

pub struct FieldVisitor<'a> {
    pub fields: &'a mut Attrs,
    pub message: &'a mut Option<String>,
}

impl Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.insert(field.name().to_string(), serde_json::Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields.insert(field.name().to_string(), serde_json::Value::String(format!("{:?}", value)));
        }
    }
}
