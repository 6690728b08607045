use camino::Utf8PathBuf;
use thiserror::Error;

use crate::ErrorKind;

/// Errors raised while talking to the node's REST API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The API host could not be interpreted.
    #[error("invalid API host '{host}'")]
    InvalidHost {
        /// Host text as supplied.
        host: String,
    },
    /// An endpoint could not be joined onto the base URL.
    #[error("invalid API endpoint '{endpoint}': {source}")]
    InvalidUrl {
        /// Endpoint path.
        endpoint: String,
        /// Parse failure.
        #[source]
        source: url::ParseError,
    },
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    /// The request did not complete.
    #[error("HTTP request to {url} failed: {source}")]
    Request {
        /// Requested URL.
        url: String,
        /// Transport failure.
        #[source]
        source: reqwest::Error,
    },
    /// The node answered with a non-success status.
    #[error("HTTP request failed with code {status}: {url}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },
    /// The response body was not a JSON envelope.
    #[error("invalid JSON response from {url}: {source}")]
    Decode {
        /// Requested URL.
        url: String,
        /// Parse failure.
        #[source]
        source: serde_json::Error,
    },
    /// The envelope carried no `data` where a payload was required.
    #[error("response from '{endpoint}' carried no data")]
    MissingData {
        /// Endpoint path.
        endpoint: String,
    },
    /// The payload did not match the expected shape.
    #[error("unexpected payload from '{endpoint}': {source}")]
    Payload {
        /// Endpoint path.
        endpoint: String,
        /// Parse failure.
        #[source]
        source: serde_json::Error,
    },
    /// A TMX path yields no usable domain name.
    #[error("cannot derive a domain name from {path}")]
    InvalidDomainName {
        /// TMX file path.
        path: Utf8PathBuf,
    },
    /// No domain carries the requested name.
    #[error("unable to find domain \"{name}\"")]
    UnknownDomain {
        /// Requested name.
        name: String,
    },
    /// Several domains carry the requested name.
    #[error("ambiguous domain name \"{name}\", choose one of the following ids: {ids:?}")]
    AmbiguousDomain {
        /// Requested name.
        name: String,
        /// Candidate ids.
        ids: Vec<u64>,
    },
}

impl ApiError {
    /// Failure class of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidHost { .. }
            | Self::InvalidUrl { .. }
            | Self::InvalidDomainName { .. }
            | Self::UnknownDomain { .. }
            | Self::AmbiguousDomain { .. } => ErrorKind::IllegalArgument,
            Self::Client(_) | Self::Request { .. } | Self::Status { .. } => ErrorKind::Transport,
            Self::Decode { .. } | Self::MissingData { .. } | Self::Payload { .. } => {
                ErrorKind::Parse
            }
        }
    }

    /// True when the node could not be reached at all.
    #[must_use]
    pub fn is_connect(&self) -> bool {
        match self {
            Self::Request { source, .. } => source.is_connect(),
            _ => false,
        }
    }
}
