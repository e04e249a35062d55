use entity_framework::FrameworkError;

/// Errors raised by the chat client on top of the engine's.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error(transparent)]
    Framework(#[from] FrameworkError),
    #[error("Malformed {event} payload: {source}")]
    Payload {
        event: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{event} payload is missing `{field}`")]
    MissingField { event: String, field: &'static str },
}
