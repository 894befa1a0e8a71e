use thiserror::Error;

/// Ways a single bank source can fail. The collector contains these: a
/// failed source degrades to a null rate, it never fails the cycle.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The bank endpoint could not be reached, timed out, or answered
    /// with an error status.
    #[error("upstream unavailable: {0}")]
    Unavailable(#[from] reqwest::Error),

    /// The response arrived but did not have the expected shape.
    #[error("unexpected upstream format: {0}")]
    Format(String),
}

/// Failure in the history store layer. Writes are swallowed at the
/// collector boundary; reads surface to the HTTP caller as a 500.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("history store unavailable: {0}")]
    Unavailable(String),

    #[error("storage backend: {0}")]
    Backend(#[from] fjall::Error),

    #[error("record serialization: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("storage io: {0}")]
    Io(#[from] std::io::Error),
}
