//! Server-sent-event framing and the local copy of a streamed node.

use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// SseDecoder
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: String,
    pub data: String,
}

/// Incremental decoder for a `text/event-stream` body.
///
/// Chunks may split frames, lines or UTF-8 sequences anywhere; bytes are
/// buffered until a blank line completes a frame.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every frame it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buf.extend(chunk.iter().copied().filter(|b| *b != b'\r'));

        let mut frames = Vec::new();
        while let Some(end) = find_blank_line(&self.buf) {
            let raw: Vec<u8> = self.buf.drain(..end + 2).collect();
            if let Some(frame) = parse_frame(&String::from_utf8_lossy(&raw[..end])) {
                frames.push(frame);
            }
        }
        frames
    }
}

fn find_blank_line(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\n\n")
}

fn parse_frame(text: &str) -> Option<SseFrame> {
    let mut event = None;
    let mut data: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.starts_with(':') {
            continue;
        }
        let (field, value) = line.split_once(':').unwrap_or((line, ""));
        let value = value.strip_prefix(' ').unwrap_or(value);
        match field {
            "event" => event = Some(value.to_owned()),
            "data" => data.push(value),
            _ => {}
        }
    }

    if event.is_none() && data.is_empty() {
        return None;
    }
    Some(SseFrame {
        event: event.unwrap_or_else(|| "message".to_owned()),
        data: data.join("\n"),
    })
}

// ---------------------------------------------------------------------------
// NodeTree
// ---------------------------------------------------------------------------

/// Local copy of the subscribed node, rebuilt from `put`/`patch` events.
///
/// Null writes delete, and objects left empty collapse to null the same way
/// the database stores them.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct NodeTree {
    root: Value,
}

impl NodeTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the value at `path` (relative to the node).
    pub fn put(&mut self, path: &str, data: Value) {
        set_at(&mut self.root, &segments(path), data);
    }

    /// Merge each child of `data` below `path`.
    pub fn patch(&mut self, path: &str, data: Value) {
        let base = segments(path);
        match data {
            Value::Object(children) => {
                for (key, value) in children {
                    let mut target = base.clone();
                    target.push(key.as_str());
                    set_at(&mut self.root, &target, value);
                }
            }
            other => set_at(&mut self.root, &base, other),
        }
    }

    /// Current node value, `None` when the node does not exist.
    pub fn value(&self) -> Option<Value> {
        (!self.root.is_null()).then(|| self.root.clone())
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn set_at(node: &mut Value, path: &[&str], data: Value) {
    let Some((head, rest)) = path.split_first() else {
        *node = if is_empty_object(&data) { Value::Null } else { data };
        return;
    };

    if !node.is_object() {
        if data.is_null() {
            return;
        }
        *node = Value::Object(Map::new());
    }
    let Value::Object(map) = node else {
        return;
    };

    let child = map.entry((*head).to_owned()).or_insert(Value::Null);
    set_at(child, rest, data);
    if child.is_null() {
        map.remove(*head);
    }
    if map.is_empty() {
        *node = Value::Null;
    }
}

fn is_empty_object(v: &Value) -> bool {
    v.as_object().is_some_and(Map::is_empty)
}
