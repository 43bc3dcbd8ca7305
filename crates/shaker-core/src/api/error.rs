use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("API error ({status}) from {url}: {body}")]
    Status {
        status: StatusCode,
        url: String,
        body: String,
    },

    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Human-readable message for a store's `error` field.
    ///
    /// `None` when the failure carries no message of its own (a non-success
    /// response with an empty body); callers substitute a generic one.
    pub fn user_message(&self) -> Option<String> {
        match self {
            ApiError::Status { body, .. } if body.is_empty() => None,
            ApiError::Status { body, .. } => Some(body.clone()),
            ApiError::Transport { source, .. } | ApiError::Decode { source, .. } => {
                Some(source.to_string())
            }
            ApiError::Client(source) => Some(source.to_string()),
        }
    }
}
