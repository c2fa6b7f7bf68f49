use agent_events::EventEnvelope;
use serde_json::Value;
use tracing::warn;

/// Incremental parser for SSE text streams carrying event envelopes.
///
/// Frames may arrive split across arbitrary chunk boundaries. Each complete
/// frame contributes at most one envelope; malformed frames are logged and
/// dropped without interrupting the stream.
#[derive(Debug, Default)]
pub struct SseStreamParser {
    buffer: String,
}

impl SseStreamParser {
    /// Feed arbitrary bytes into the parser and drain complete envelopes.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<EventEnvelope> {
        self.buffer.push_str(&String::from_utf8_lossy(bytes));
        let mut envelopes = Vec::new();

        while let Some((split, delimiter_len)) = frame_boundary(&self.buffer) {
            let frame = self.buffer[..split].to_string();
            self.buffer.drain(0..split + delimiter_len);

            if let Some(envelope) = decode_frame(&frame) {
                envelopes.push(envelope);
            }
        }

        envelopes
    }

    /// Parse a complete SSE payload string in one shot.
    pub fn parse_frames(input: &str) -> Vec<EventEnvelope> {
        let mut parser = Self::default();
        parser.feed(input.as_bytes())
    }

    pub fn is_empty_buffer(&self) -> bool {
        self.buffer.trim().is_empty()
    }
}

fn frame_boundary(buffer: &str) -> Option<(usize, usize)> {
    let lf = buffer.find("\n\n");
    let crlf = buffer.find("\r\n\r\n");

    match (lf, crlf) {
        (Some(lf), Some(crlf)) if crlf < lf => Some((crlf, 4)),
        (Some(lf), _) => Some((lf, 2)),
        (None, Some(crlf)) => Some((crlf, 4)),
        (None, None) => None,
    }
}

/// Split one raw frame into its `event:` name and joined `data:` payload.
fn split_frame(frame: &str) -> (Option<String>, Option<String>) {
    let mut event_name = None;
    let mut data_lines = Vec::new();

    for line in frame.lines() {
        let line = line.trim_end_matches('\r');
        if line.starts_with(':') {
            continue;
        }
        if let Some(value) = line.strip_prefix("event:") {
            let value = value.trim();
            if !value.is_empty() {
                event_name = Some(value.to_string());
            }
        } else if let Some(value) = line.strip_prefix("data:") {
            let value = value.trim();
            if !value.is_empty() {
                data_lines.push(value);
            }
        }
    }

    let data = if data_lines.is_empty() {
        None
    } else {
        Some(data_lines.join("\n"))
    };

    (event_name, data)
}

fn decode_frame(frame: &str) -> Option<EventEnvelope> {
    let (event_name, data) = split_frame(frame);
    let payload = data?;

    let mut value = match serde_json::from_str::<Value>(&payload) {
        Ok(value) => value,
        Err(error) => {
            warn!(%error, "dropping undecodable stream frame");
            return None;
        }
    };

    // Named frames carry the type out-of-band; backfill it so the catch-all
    // data channel and dedicated channels decode through one path.
    if let Some(name) = event_name {
        if let Some(object) = value.as_object_mut() {
            object
                .entry("type")
                .or_insert_with(|| Value::String(name));
        }
    }

    match serde_json::from_value::<EventEnvelope>(value) {
        Ok(envelope) => Some(envelope),
        Err(error) => {
            warn!(%error, "dropping frame without a usable event envelope");
            None
        }
    }
}
