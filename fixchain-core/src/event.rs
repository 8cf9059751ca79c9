use serde::{Deserialize, Serialize};

/// Event delivered to the client while a pipeline run progresses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "EventRecord", from = "EventRecord")]
pub enum StreamEvent {
    Status(String),
    Response(String),
    Error(String),
    Done,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Status,
    Response,
    Error,
    Done,
}

/// Wire shape of a [`StreamEvent`]: `{"type": "...", "content": "..."}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default)]
    pub content: String,
}

impl StreamEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Status(_) => EventKind::Status,
            Self::Response(_) => EventKind::Response,
            Self::Error(_) => EventKind::Error,
            Self::Done => EventKind::Done,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::Status(content) | Self::Response(content) | Self::Error(content) => content,
            Self::Done => "",
        }
    }

    /// `response` and `error` close the answer part of a run; `done` follows them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Response(_) | Self::Error(_))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&EventRecord::from(self.clone()))
            .unwrap_or_else(|_| r#"{"type":"error","content":"unserializable event"}"#.to_string())
    }
}

impl From<StreamEvent> for EventRecord {
    fn from(event: StreamEvent) -> Self {
        let kind = event.kind();
        let content = match event {
            StreamEvent::Status(content)
            | StreamEvent::Response(content)
            | StreamEvent::Error(content) => content,
            StreamEvent::Done => String::new(),
        };
        Self { kind, content }
    }
}

impl From<EventRecord> for StreamEvent {
    fn from(record: EventRecord) -> Self {
        match record.kind {
            EventKind::Status => Self::Status(record.content),
            EventKind::Response => Self::Response(record.content),
            EventKind::Error => Self::Error(record.content),
            EventKind::Done => Self::Done,
        }
    }
}
