//! Flat JSON-lines event layer.
//!
//! Each event becomes one JSON object on its own line. The keys `ts`,
//! `level`, `service`, `pid`, `target` and `msg` are always present; the
//! event's own fields (`remote`, `path`, `replayed`, `error`, ...) sit next
//! to them at the top level, so a cache or outage history can be pulled out
//! with `jq 'select(.path)'` and the like. A field whose name collides with
//! one of the fixed keys is written as `field.<name>`.

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::fmt;
use std::io::Write;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

const FIXED_KEYS: [&str; 6] = ["ts", "level", "service", "pid", "target", "msg"];

/// Layer appending one flat JSON object per event to `W`.
pub struct JsonlLayer<W> {
    service: String,
    pid: u32,
    make_writer: W,
}

impl<W> JsonlLayer<W> {
    pub fn new(service: impl Into<String>, make_writer: W) -> Self {
        Self {
            service: service.into(),
            pid: std::process::id(),
            make_writer,
        }
    }

    fn render(&self, event: &Event<'_>) -> String {
        let mut collected = EventFields::default();
        event.record(&mut collected);

        let metadata = event.metadata();
        let mut object = Map::new();
        object.insert(
            "ts".into(),
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true).into(),
        );
        object.insert("level".into(), level_name(*metadata.level()).into());
        object.insert("service".into(), self.service.clone().into());
        object.insert("pid".into(), self.pid.into());
        object.insert("target".into(), metadata.target().into());
        object.insert("msg".into(), collected.message.unwrap_or_default().into());
        object.extend(collected.fields);

        let mut line = Value::Object(object).to_string();
        line.push('\n');
        line
    }
}

impl<S, W> Layer<S> for JsonlLayer<W>
where
    S: Subscriber,
    W: for<'writer> MakeWriter<'writer> + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let line = self.render(event);
        // Nowhere left to report a failed diagnostic write.
        let _ = self.make_writer.make_writer().write_all(line.as_bytes());
    }
}

#[derive(Default)]
struct EventFields {
    message: Option<String>,
    fields: Map<String, Value>,
}

impl EventFields {
    fn put(&mut self, field: &Field, value: Value) {
        let name = field.name();
        if name == "message" {
            self.message = Some(match value {
                Value::String(text) => text,
                other => other.to_string(),
            });
            return;
        }

        let key = if FIXED_KEYS.contains(&name) {
            format!("field.{}", name)
        } else {
            name.to_string()
        };
        self.fields.insert(key, value);
    }
}

impl Visit for EventFields {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.put(field, Value::String(format!("{:?}", value)));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, value.into());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, value.into());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, value.into());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, value.into());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.put(field, Value::String(value.to_string()));
    }
}

fn level_name(level: Level) -> &'static str {
    match level {
        Level::TRACE => "trace",
        Level::DEBUG => "debug",
        Level::INFO => "info",
        Level::WARN => "warn",
        Level::ERROR => "error",
    }
}
