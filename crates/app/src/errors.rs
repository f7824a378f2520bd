//! Cart errors.

use std::error::Error as StdError;

use serde::Deserialize;
use thiserror::Error;

use crate::storage::StorageError;

type BoxError = Box<dyn StdError + Send + Sync>;

/// Business rule a request violated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationCode {
    /// Requested quantity exceeds available stock
    StockExceeded,

    /// Quantity outside the allowed range
    QuantityInvalid,

    /// Size not offered for the product
    SizeInvalid,

    /// Any other code, kept verbatim
    Other(String),
}

impl ValidationCode {
    /// Parse a server error code.
    pub fn parse(code: Option<&str>) -> Self {
        match code {
            Some("STOCK_EXCEEDED" | "INSUFFICIENT_STOCK") => Self::StockExceeded,
            Some("QUANTITY_INVALID") => Self::QuantityInvalid,
            Some("SIZE_INVALID") => Self::SizeInvalid,
            Some(other) => Self::Other(other.to_string()),
            None => Self::Other(String::new()),
        }
    }
}

/// Broad class of a [`CartError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request never reached the server
    Network,

    /// The server failed or answered with something unusable
    Server,

    /// The session is missing or expired
    Auth,

    /// The request broke a business rule
    Validation,

    /// The resource does not exist
    NotFound,

    /// The device-local cart could not be written
    Storage,
}

#[derive(Debug, Error)]
pub enum CartError {
    #[error("could not reach the server")]
    Network(#[source] BoxError),

    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("not authenticated")]
    Unauthorized,

    #[error("rejected by server: {message}")]
    Validation {
        code: ValidationCode,
        message: String,
    },

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("unexpected response body")]
    Decode(#[source] BoxError),

    #[error("invalid endpoint for base URL {base}")]
    Endpoint { base: String },

    #[error("guest cart storage error")]
    Storage(#[from] StorageError),
}

/// Error body returned by the cart API.
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,

    #[serde(default)]
    code: Option<String>,
}

impl CartError {
    /// Map a non-success HTTP response onto the error taxonomy.
    pub fn from_status(status: u16, body: &str) -> Self {
        let parsed: ApiErrorBody = serde_json::from_str(body).unwrap_or_default();

        let message = parsed
            .message
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| body.trim().to_string());

        match status {
            401 | 403 => Self::Unauthorized,
            404 => Self::NotFound { message },
            400..=499 => Self::Validation {
                code: ValidationCode::parse(parsed.code.as_deref()),
                message,
            },
            _ => Self::Server { status, message },
        }
    }

    /// Map a transport failure.
    pub fn from_transport(error: reqwest::Error) -> Self {
        if error.is_decode() {
            return Self::Decode(Box::new(error));
        }

        Self::Network(Box::new(error))
    }

    /// Broad class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::Network,
            Self::Server { .. } | Self::Decode(_) | Self::Endpoint { .. } => ErrorKind::Server,
            Self::Unauthorized => ErrorKind::Auth,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Whether repeating the request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Server { .. })
    }

    /// Whether the request was rejected for lack of stock.
    pub fn is_stock_error(&self) -> bool {
        matches!(
            self,
            Self::Validation {
                code: ValidationCode::StockExceeded,
                ..
            }
        )
    }
}
