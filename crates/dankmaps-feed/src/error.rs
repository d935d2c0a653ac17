use thiserror::Error;

/// Errors returned by the store feed client.
///
/// The variants are kept distinct so the UI can show a different message for
/// an unreachable server, a slow one, and one that answered with an error.
#[derive(Debug, Error)]
pub enum FeedError {
    /// No response: DNS, connect, TLS or mid-body transport failure.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The request did not complete within the configured timeout.
    #[error("request timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// The server answered with a non-success status.
    #[error("server responded with HTTP {status}")]
    Server { status: u16, body: String },

    /// A single-store lookup returned 404.
    #[error("store '{id}' not found")]
    NotFound { id: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid feed endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

impl FeedError {
    /// Classifies a transport-level `reqwest` failure.
    pub(crate) fn from_transport(err: reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            FeedError::Timeout { timeout_ms }
        } else {
            FeedError::Network(err)
        }
    }

    /// Short message suitable for an alert shown to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            FeedError::Network(_) => {
                "No response from server. Please check your network connection.".to_string()
            }
            FeedError::Timeout { .. } => {
                "The store directory took too long to respond. Please try again.".to_string()
            }
            FeedError::Server { status, .. } => format!("Server Error: {status}"),
            FeedError::NotFound { .. } => "That store is no longer listed.".to_string(),
            FeedError::Deserialize { .. } => {
                "The store directory sent data that could not be read.".to_string()
            }
            FeedError::InvalidEndpoint { .. } => {
                "The store directory address is misconfigured.".to_string()
            }
        }
    }
}
