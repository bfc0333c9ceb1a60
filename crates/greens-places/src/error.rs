use thiserror::Error;

/// Errors returned by the places provider client.
#[derive(Debug, Error)]
pub enum PlacesError {
    /// No provider credential was configured.
    #[error("places API key not configured")]
    MissingApiKey,

    /// Geocoding produced no usable location for the query.
    #[error("place \"{query}\" not found (status {status})")]
    NotFound { query: String, status: String },

    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-2xx HTTP status.
    #[error("unexpected HTTP status {status} from {endpoint}")]
    UnexpectedStatus { status: u16, endpoint: &'static str },

    /// The provider answered 2xx but reported a failure in its envelope.
    #[error("{endpoint} returned status {status}{}", detail_suffix(.message))]
    ApiStatus {
        endpoint: &'static str,
        status: String,
        message: Option<String>,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

fn detail_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

/// Coarse classification used at the HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacesErrorKind {
    Config,
    NotFound,
    Upstream,
}

impl PlacesError {
    #[must_use]
    pub fn kind(&self) -> PlacesErrorKind {
        match self {
            PlacesError::MissingApiKey => PlacesErrorKind::Config,
            PlacesError::NotFound { .. } => PlacesErrorKind::NotFound,
            PlacesError::Http(_)
            | PlacesError::UnexpectedStatus { .. }
            | PlacesError::ApiStatus { .. }
            | PlacesError::Deserialize { .. }
            | PlacesError::InvalidBaseUrl { .. } => PlacesErrorKind::Upstream,
        }
    }
}
