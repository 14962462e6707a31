//! A tracing layer that logs events to stderr in a compact human readable
//! format.

use std::fmt::Write;
use std::time::Instant;
use tracing::field::{Field, Visit};
use tracing::level_filters::LevelFilter;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use yansi::Paint;

pub struct StderrLayer {
    start: Instant,
    max_level: LevelFilter,
}

impl StderrLayer {
    pub fn new(max_level: LevelFilter) -> Self {
        Self {
            start: Instant::now(),
            max_level,
        }
    }
}

impl<S: Subscriber> Layer<S> for StderrLayer {
    fn enabled(&self, metadata: &tracing::Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        *metadata.level() <= self.max_level
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = FieldFormatter::default();
        event.record(&mut fields);

        let prefix = match *event.metadata().level() {
            Level::ERROR => "ERROR".red().bold().to_string(),
            Level::WARN => " WARN".yellow().to_string(),
            Level::INFO => " INFO".green().to_string(),
            Level::DEBUG => "DEBUG".blue().to_string(),
            Level::TRACE => "TRACE".white().to_string(),
        };

        let elapsed = self.start.elapsed();
        let mut line = String::new();
        write!(line, "{:>6}{}", elapsed.as_millis().dim(), "ms".dim()).ok();
        write!(line, " {}: {}", prefix, fields.message).ok();
        if !fields.extra.is_empty() {
            write!(line, "{}", fields.extra.dim()).ok();
        }
        write!(line, " {}", event.metadata().target().dim().italic()).ok();
        eprintln!("{line}");
    }
}

/// Collects the event's `message` field and renders every other field as a
/// trailing `key=value` pair.
#[derive(Default)]
struct FieldFormatter {
    message: String,
    extra: String,
}

impl Visit for FieldFormatter {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            write!(self.message, "{value:?}").ok();
        } else {
            write!(self.extra, " {}={value:?}", field.name()).ok();
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            write!(self.extra, " {}={value}", field.name()).ok();
        }
    }
}
