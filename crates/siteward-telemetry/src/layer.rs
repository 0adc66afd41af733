//! Tracing layer that converts events into application log rows.
//!
//! Request context is explicit: the HTTP edge opens a span carrying
//! `client_ip`, `culture` and `url` (or `path`) fields, and every event
//! inside it inherits them. The innermost span that sets a field wins.

use std::fmt;

use chrono::Utc;
use siteward_core::models::log_entry::CreateLogEntry;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Metadata, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;

use crate::config::LogSinkConfig;
use crate::error::TelemetryError;
use crate::format::{LogValue, format_log_values};

const SHORT_URL_MAX: usize = 255;
const SHORT_URL_KEEP: usize = 254;

/// Truncate a url for the indexed `short_url` column.
pub fn short_url(url: &str) -> String {
    if url.chars().count() > SHORT_URL_MAX {
        url.chars().take(SHORT_URL_KEEP).collect()
    } else {
        url.to_string()
    }
}

/// A layer that forwards accepted events to a background log writer.
pub struct DbLogLayer {
    min_level: LevelFilter,
    ignored_targets: Vec<String>,
    sender: UnboundedSender<CreateLogEntry>,
}

impl DbLogLayer {
    pub fn new(
        config: &LogSinkConfig,
        sender: UnboundedSender<CreateLogEntry>,
    ) -> Result<Self, TelemetryError> {
        Ok(Self {
            min_level: config.level_filter()?,
            ignored_targets: config.effective_ignored_targets(),
            sender,
        })
    }

    /// Build a layer together with the receiving end for
    /// [`spawn_log_writer`](crate::spawn_log_writer).
    pub fn channel(
        config: &LogSinkConfig,
    ) -> Result<(Self, UnboundedReceiver<CreateLogEntry>), TelemetryError> {
        let (tx, rx) = mpsc::unbounded_channel();
        Ok((Self::new(config, tx)?, rx))
    }

    fn accepts(&self, metadata: &Metadata<'_>) -> bool {
        if LevelFilter::from_level(*metadata.level()) > self.min_level {
            return false;
        }
        let target = metadata.target();
        !self
            .ignored_targets
            .iter()
            .any(|prefix| target.starts_with(prefix.as_str()))
    }
}

/// Request fields captured from a span.
#[derive(Debug, Clone, Default)]
struct RequestContext {
    client_ip: Option<String>,
    culture: Option<String>,
    url: Option<String>,
}

impl RequestContext {
    fn is_empty(&self) -> bool {
        self.client_ip.is_none() && self.culture.is_none() && self.url.is_none()
    }

    fn overlay(&mut self, inner: &RequestContext) {
        if inner.client_ip.is_some() {
            self.client_ip.clone_from(&inner.client_ip);
        }
        if inner.culture.is_some() {
            self.culture.clone_from(&inner.culture);
        }
        if inner.url.is_some() {
            self.url.clone_from(&inner.url);
        }
    }
}

impl Visit for RequestContext {
    fn record_str(&mut self, field: &Field, value: &str) {
        let slot = match field.name() {
            "client_ip" => &mut self.client_ip,
            "culture" => &mut self.culture,
            "url" | "path" => &mut self.url,
            _ => return,
        };
        *slot = Some(value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_str(field, &format!("{value:?}"));
    }
}

/// Collects the message, error and remaining fields of an event.
#[derive(Default)]
struct EventVisitor {
    message: Option<String>,
    error: Option<String>,
    fields: Vec<(String, LogValue)>,
}

impl EventVisitor {
    fn record_text(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => self.message = Some(value),
            "error" => self.error = Some(value),
            name => self
                .fields
                .push((name.to_string(), LogValue::parse_field(&value))),
        }
    }

    fn into_message(self) -> String {
        let mut message = match self.message {
            Some(message) => message,
            None if self.fields.is_empty() => String::new(),
            None => format_log_values(&self.fields),
        };
        if let Some(error) = self.error {
            if !message.is_empty() {
                message.push('\n');
            }
            message.push_str(&error);
        }
        message
    }
}

impl Visit for EventVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_text(field, value.to_string());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.record_text(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_text(field, format!("{value:?}"));
    }
}

fn current_thread() -> String {
    let thread = std::thread::current();
    format!("{} {:?}", thread.name().unwrap_or_default(), thread.id())
}

impl<S> Layer<S> for DbLogLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut request = RequestContext::default();
        attrs.record(&mut request);
        if request.is_empty() {
            return;
        }
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(request);
        }
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut extensions = span.extensions_mut();
        match extensions.get_mut::<RequestContext>() {
            Some(request) => values.record(request),
            None => {
                let mut request = RequestContext::default();
                values.record(&mut request);
                if !request.is_empty() {
                    extensions.insert(request);
                }
            }
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !self.accepts(metadata) {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);
        let message = visitor.into_message();
        if message.is_empty() {
            return;
        }

        let mut request = RequestContext::default();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(inner) = span.extensions().get::<RequestContext>() {
                    request.overlay(inner);
                }
            }
        }

        let url = request.url.unwrap_or_default();
        let entry = CreateLogEntry {
            logged_at: Utc::now(),
            ip_address: request.client_ip.unwrap_or_default(),
            culture: request.culture.unwrap_or_default(),
            short_url: short_url(&url),
            url,
            thread: current_thread(),
            log_level: metadata.level().to_string(),
            logger: metadata.target().to_string(),
            message,
        };

        // The writer is gone during shutdown; nothing left to persist to.
        let _ = self.sender.send(entry);
    }
}
