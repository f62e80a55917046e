use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

pub const BOT_PROTECTION_DETAIL: &str = concat!(
    "The API is protected by Cloudflare and is blocking automated requests. ",
    "This may require manual verification or a different approach to access the API.",
);
pub const BOT_PROTECTION_SUGGESTION: &str = concat!(
    "Try using the API directly with curl or Postman, ",
    "or contact the API provider for server-to-server access.",
);

/// Every way a tracking request can end without a result.
///
/// `Display` is the message shown to a user of the client; the proxy turns
/// the same value into an [`ErrorBody`] envelope through `IntoResponse`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackingError {
    #[error("awb & courier required")]
    Validation,

    #[error("API key not configured")]
    Configuration,

    #[error("Cloudflare protection detected")]
    BotProtection,

    #[error("{detail}")]
    Upstream { status: u16, detail: UpstreamDetail },

    #[error("Invalid response format. {detail}")]
    InvalidResponse { detail: String },

    #[error("{0}")]
    Transport(String),
}

/// What we could learn about a non-2xx upstream reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamDetail {
    /// A message field from a JSON error body
    Message(String),
    /// No usable body, only the status line
    StatusText(String),
    /// Leading characters of a non-JSON body
    NonJson(String),
}

impl fmt::Display for UpstreamDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamDetail::Message(message) => f.write_str(message),
            UpstreamDetail::StatusText(reason) => write!(f, "Failed to track package: {reason}"),
            UpstreamDetail::NonJson(snippet) => write!(f, "Server error: {snippet}"),
        }
    }
}

/// JSON error envelope returned by the proxy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ErrorBody {
    fn new(error: &str, detail: Option<String>) -> Self {
        Self {
            error: error.to_string(),
            detail,
            suggestion: None,
        }
    }
}

impl TrackingError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            TrackingError::Validation => StatusCode::BAD_REQUEST,
            TrackingError::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
            TrackingError::BotProtection => StatusCode::SERVICE_UNAVAILABLE,
            TrackingError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            TrackingError::InvalidResponse { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            TrackingError::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The proxy's view of the error
    pub fn body(&self) -> ErrorBody {
        match self {
            TrackingError::Validation => ErrorBody::new("awb & courier required", None),
            TrackingError::Configuration => ErrorBody::new(
                "API key not configured",
                Some("Please set KLIKRESI_API_KEY in the environment".to_string()),
            ),
            TrackingError::BotProtection => ErrorBody {
                error: "Cloudflare protection detected".to_string(),
                detail: Some(BOT_PROTECTION_DETAIL.to_string()),
                suggestion: Some(BOT_PROTECTION_SUGGESTION.to_string()),
            },
            TrackingError::Upstream { detail, .. } => {
                let detail = match detail {
                    UpstreamDetail::Message(message) => message.clone(),
                    UpstreamDetail::StatusText(reason) => reason.clone(),
                    UpstreamDetail::NonJson(snippet) => {
                        format!("API returned non-JSON response: {snippet}")
                    }
                };
                ErrorBody::new("Failed to fetch tracking data", Some(detail))
            }
            TrackingError::InvalidResponse { detail } => {
                ErrorBody::new("Invalid API response", Some(detail.clone()))
            }
            TrackingError::Transport(message) => {
                ErrorBody::new("Proxy failed", Some(message.clone()))
            }
        }
    }
}

impl IntoResponse for TrackingError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}
