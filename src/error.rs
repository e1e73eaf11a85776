/// Error types for the requester and the two history stores
use thiserror::Error;

/// Failure of a single analysis request. Every variant is shown to the user
/// as the same generic failure message.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("No analysis provider API key configured")]
    MissingApiKey,
    #[error("Topic is empty")]
    EmptyTopic,
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The provider answered with a non-success status code
    #[error("Status error: {1} (Status {0})")]
    Status(u16, String),
    #[error("Provider returned no text")]
    EmptyResponse,
    #[error("Unparsable provider response: {0}")]
    Unparsable(String),
    #[error("Invalid field in provider response: {0}")]
    InvalidField(String),
}

impl AnalysisError {
    /// Message shown in the popup, regardless of the underlying cause
    pub fn user_message(&self) -> &'static str {
        "Analysis engine failure."
    }
}

/// Failure of the remote or local history store. Logged, never surfaced.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Status error: {1} (Status {0})")]
    Status(u16, String),
    #[error("Failed to decode stored data: {0}")]
    Decode(String),
    #[error("Failed to serialize: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    /// Firestore answers 403 when security rules reject the request
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, StoreError::Status(403, _))
    }
}
