//! Output helpers shared by the subcommands.

use std::io::Write;

use ilicache_core::{MessageSink, Severity};
use ilicache_data::repository::RefreshReport;
use serde::Serialize;

use crate::CliError;

/// [`MessageSink`] printing one line per message.
pub(crate) struct WriterSink<W> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub(crate) const fn new(writer: W) -> Self {
        Self { writer }
    }

    #[cfg(test)]
    pub(crate) fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> MessageSink for WriterSink<W> {
    fn notify(&mut self, severity: Severity, text: String) {
        if let Err(err) = writeln!(self.writer, "{severity}: {text}") {
            log::debug!("dropping {severity} message: {err}");
        }
    }
}

/// Surface failed fetches of a refresh as warnings.
pub(crate) fn report_failures(report: &RefreshReport, sink: &mut dyn MessageSink) {
    for failure in &report.failures {
        sink.notify(
            Severity::Warning,
            format!("could not download {} ({})", failure.url, failure.reason),
        );
    }
}

/// Write `value` as pretty-printed JSON followed by a newline.
pub(crate) fn write_json<T: Serialize + ?Sized>(
    writer: &mut dyn Write,
    value: &T,
) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerializeOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}
