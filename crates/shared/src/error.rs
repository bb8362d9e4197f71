use thiserror::Error;

/// A named host event whose payload did not match the expected shape.
#[derive(Debug, Error)]
#[error("malformed `{event}` payload: {source}")]
pub struct EventDecodeError {
    pub event: String,
    #[source]
    pub source: serde_json::Error,
}

impl EventDecodeError {
    pub fn new(event: impl Into<String>, source: serde_json::Error) -> Self {
        Self {
            event: event.into(),
            source,
        }
    }
}
