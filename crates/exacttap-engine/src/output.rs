//! Output channel for tap envelopes.
//!
//! The orchestrator and accessors only see [`RecordSink`]. The CLI writes
//! newline-delimited JSON to stdout through [`JsonLinesSink`]; tests collect
//! into [`MemorySink`].

use std::io::{self, BufWriter, Stdout, Write};

use exacttap_types::message::Message;
use exacttap_types::state::State;
use serde_json::{Map, Value};

/// Destination for [`Message`] envelopes.
pub trait RecordSink {
    /// Write one envelope.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the envelope cannot be written.
    fn emit(&mut self, message: &Message) -> io::Result<()>;

    /// Push buffered envelopes to their destination.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    fn flush(&mut self) -> io::Result<()>;
}

/// One JSON document per line on any writer.
///
/// `STATE` envelopes force a flush so a checkpoint is never stuck behind
/// buffered records.
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl JsonLinesSink<BufWriter<Stdout>> {
    /// Buffered sink over process stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(BufWriter::new(io::stdout()))
    }
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RecordSink for JsonLinesSink<W> {
    fn emit(&mut self, message: &Message) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, message)?;
        self.out.write_all(b"\n")?;
        if matches!(message, Message::State { .. }) {
            self.out.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Collects envelopes in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub messages: Vec<Message>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records emitted for `stream`, in emission order.
    #[must_use]
    pub fn records_for(&self, stream: &str) -> Vec<&Map<String, Value>> {
        self.messages
            .iter()
            .filter_map(|m| match m {
                Message::Record {
                    stream: s, record, ..
                } if s == stream => Some(record),
                _ => None,
            })
            .collect()
    }

    /// Every `STATE` checkpoint, in emission order.
    #[must_use]
    pub fn states(&self) -> Vec<&State> {
        self.messages
            .iter()
            .filter_map(|m| match m {
                Message::State { value } => Some(value),
                _ => None,
            })
            .collect()
    }

    /// Streams that received a `SCHEMA` envelope, in emission order.
    #[must_use]
    pub fn schema_streams(&self) -> Vec<&str> {
        self.messages
            .iter()
            .filter_map(|m| match m {
                Message::Schema { stream, .. } => Some(stream.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl RecordSink for MemorySink {
    fn emit(&mut self, message: &Message) -> io::Result<()> {
        self.messages.push(message.clone());
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exacttap_types::state::StreamName;
    use serde_json::json;

    fn record(stream: &str, id: i64) -> Message {
        Message::Record {
            stream: stream.into(),
            record: json!({"ID": id}).as_object().cloned().unwrap(),
            time_extracted: None,
        }
    }

    #[test]
    fn json_lines_one_envelope_per_line() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.emit(&record("email", 1)).unwrap();
        sink.emit(&record("email", 2)).unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first, json!({"type": "RECORD", "stream": "email", "record": {"ID": 1}}));
    }

    #[test]
    fn memory_sink_helpers() {
        let mut sink = MemorySink::new();
        sink.emit(&record("email", 1)).unwrap();
        sink.emit(&record("send", 2)).unwrap();
        let state: State = [(StreamName::new("email"), json!("2024-01-01T00:00:00Z"))]
            .into_iter()
            .collect();
        sink.emit(&Message::State { value: state }).unwrap();

        assert_eq!(sink.records_for("email").len(), 1);
        assert_eq!(sink.records_for("send")[0]["ID"], 2);
        assert_eq!(sink.states().len(), 1);
        assert!(sink.schema_streams().is_empty());
    }
}
