use thiserror::Error;

/// Unexpected failures of the automation session.
///
/// "Element not present yet" is never an error: lookups return empty
/// collections or `None`, and rejected clicks are a `ClickOutcome`.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Transport failure talking to the driver endpoint
    #[error("request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// Driver returned a body that is not the expected JSON shape
    #[error("JSON parse error ({context}): {source}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Driver answered with a WebDriver error for a command
    #[error("driver rejected '{command}': {error}")]
    Protocol { command: String, error: String },

    /// No live session to send commands to
    #[error("no active session: {0}")]
    Session(String),

    /// Snapshot file could not be read
    #[error("failed to read snapshot '{path}': {source}")]
    SnapshotIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
