//! Log sink setup.
//!
//! Two outputs share one writer:
//! - webhook entries (target [`LOG_TARGET`]) are written as the bare JSON line
//!   the entry serialized to, so each line is the record itself
//! - everything else goes through the flattened JSON formatter

use std::fmt::{self, Write as _};

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::{
    filter::filter_fn,
    fmt::{format::Writer, FmtContext, FormatEvent, FormatFields, MakeWriter},
    layer::SubscriberExt,
    registry::LookupSpan,
    EnvFilter, Layer,
};

use crate::web::log_entry::LOG_TARGET;

/// Build the process subscriber writing to `writer`.
pub fn subscriber<W>(filter: EnvFilter, writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'a> MakeWriter<'a> + Clone + Send + Sync + 'static,
{
    let entries = tracing_subscriber::fmt::layer()
        .event_format(EntryLine)
        .with_writer(writer.clone())
        .with_filter(filter_fn(|meta| meta.target() == LOG_TARGET));

    let operational = tracing_subscriber::fmt::layer()
        .json()
        .flatten_event(true)
        .with_writer(writer)
        .with_filter(filter_fn(|meta| meta.target() != LOG_TARGET));

    tracing_subscriber::registry()
        .with(filter)
        .with(entries)
        .with(operational)
}

/// Writes only the event message, followed by a newline.
struct EntryLine;

impl<S, N> FormatEvent<S, N> for EntryLine
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut message = Message::default();
        event.record(&mut message);
        writeln!(writer, "{}", message.0)
    }
}

#[derive(Default)]
struct Message(String);

impl Visit for Message {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.0 = value.to_string();
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{:?}", value);
        }
    }
}
