//! Error types shared by the API client, the listing controller and the
//! transfer executors.

use reqwest::StatusCode;
use thiserror::Error;

/// Message recorded on a transfer when the connection itself failed.
pub const NETWORK_ERROR_MESSAGE: &str = "A network error occurred.";

/// Failure talking to the console API.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response (DNS, connect, reset).
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("{message}")]
    Status { status: StatusCode, message: String },

    /// The response body could not be decoded.
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl ClientError {
    /// HTTP status of the failed call, if the backend answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Failure resolving a listing. Surfaces as the global error notification.
#[derive(Debug, Error)]
pub enum ListingError {
    #[error("no bucket selected")]
    NoBucket,

    /// Listing failed and no permitted-path fallback was available.
    #[error("could not list objects in `{bucket}`: {source}")]
    Fetch {
        bucket: String,
        #[source]
        source: ClientError,
    },

    /// The folder/file probe for an ambiguous path failed.
    #[error("could not resolve `{path}` in `{bucket}`: {source}")]
    Probe {
        bucket: String,
        path: String,
        #[source]
        source: ClientError,
    },

    #[error("path `{0}` is not valid base64")]
    InvalidPath(String),

    #[error("no object is open")]
    NoObjectOpen,
}

pub type ListingResult<T> = Result<T, ListingError>;
