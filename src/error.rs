//! Error types for API calls and their user-facing translation
//!
//! `ApiError` is what every network-facing function in this crate returns. Its
//! display strings double as the input to [`format_api_error`], which maps a
//! failure onto one of a fixed set of messages suitable for end users.

use reqwest::StatusCode;
use thiserror::Error;

/// Message shown when the server cannot be reached at all
pub const MSG_NETWORK: &str =
    "Unable to connect to the server. Please check your internet connection.";
/// Message shown when a request timed out
pub const MSG_TIMEOUT: &str = "The request timed out. Please try again.";
/// Message shown for 401 / 403 responses
pub const MSG_UNAUTHORIZED: &str = "You are not authorized to perform this action.";
/// Message shown for 404 responses
pub const MSG_NOT_FOUND: &str = "Resource not found.";
/// Message shown for 5xx responses
pub const MSG_SERVER: &str = "Server error. Please try again later.";
/// Message shown when the failure is not an error value at all
pub const MSG_UNKNOWN: &str = "An unexpected error occurred.";

/// Priority-ordered classification table. First row with any matching
/// pattern wins; matching is a case-sensitive substring test.
const CLASSIFICATION: &[(&[&str], &str)] = &[
    (&["Failed to fetch", "NetworkError"], MSG_NETWORK),
    (&["timeout"], MSG_TIMEOUT),
    (&["401", "403"], MSG_UNAUTHORIZED),
    (&["404"], MSG_NOT_FOUND),
    (&["500", "502", "503", "504"], MSG_SERVER),
];

/// Errors that can occur when talking to the backend API
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The server answered with an error status
    #[error("HTTP {status}: {status_text}")]
    Http { status: u16, status_text: String },

    /// Connection refused, DNS failure and similar transport problems
    #[error("Failed to fetch: {0}")]
    Network(String),

    /// The request did not complete in time
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Any other failure while sending the request or reading the body
    #[error("Request failed: {0}")]
    Request(String),

    /// The request could not be built (bad URL, bad header, ...)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The response body was not what the caller expected
    #[error("Failed to parse response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Builds the error synthesized for an HTTP error status.
    pub fn from_status(status: StatusCode) -> Self {
        ApiError::Http {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
        }
    }

    /// Whether sending the same request again could plausibly succeed.
    ///
    /// Server errors and transport failures are transient. Client errors,
    /// malformed requests and undecodable bodies are permanent.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Http { status, .. } => *status >= 500,
            ApiError::Network(_) | ApiError::Timeout(_) | ApiError::Request(_) => true,
            ApiError::InvalidRequest(_) | ApiError::Decode(_) => false,
        }
    }

    /// Returns the HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Shortcut for `format_api_error(Some(self))`.
    pub fn user_message(&self) -> String {
        format_api_error(Some(self as &dyn std::error::Error))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        let message = err.to_string();
        if err.is_builder() {
            ApiError::InvalidRequest(message)
        } else if err.is_timeout() {
            ApiError::Timeout(message)
        } else if err.is_connect() {
            ApiError::Network(message)
        } else if err.is_decode() {
            ApiError::Decode(message)
        } else {
            ApiError::Request(message)
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

/// Translates a failure into a message fit for an end user.
///
/// `None` stands for a failure that is not an error value (for example a
/// panic payload or a bare string) and yields the generic fallback. An error
/// whose message matches none of the known patterns is returned verbatim.
pub fn format_api_error(error: Option<&(dyn std::error::Error + '_)>) -> String {
    let Some(error) = error else {
        return MSG_UNKNOWN.to_string();
    };

    let message = error.to_string();
    CLASSIFICATION
        .iter()
        .find(|(patterns, _)| patterns.iter().any(|p| message.contains(p)))
        .map(|(_, friendly)| friendly.to_string())
        .unwrap_or(message)
}

/// Message to show for a failure at the command-line boundary.
///
/// API failures go through [`format_api_error`]; anything else (local
/// validation, argument parsing, I/O) is shown verbatim, since its text often
/// echoes user input that the status-code patterns would misread.
pub fn describe_failure(error: &(dyn std::error::Error + 'static)) -> String {
    match error.downcast_ref::<ApiError>() {
        Some(api_error) => api_error.user_message(),
        None => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;
    use std::fmt;

    /// Minimal error carrying an arbitrary message
    #[derive(Debug)]
    struct Plain(&'static str);

    impl fmt::Display for Plain {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    impl StdError for Plain {}

    fn format_plain(message: &'static str) -> String {
        format_api_error(Some(&Plain(message) as &dyn StdError))
    }

    #[test]
    fn test_failed_to_fetch_maps_to_network_message() {
        assert_eq!(format_plain("Failed to fetch"), MSG_NETWORK);
        assert_eq!(format_plain("NetworkError when attempting to fetch resource."), MSG_NETWORK);
    }

    #[test]
    fn test_timeout_maps_to_timeout_message() {
        assert_eq!(format_plain("operation timeout exceeded"), MSG_TIMEOUT);
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        assert_eq!(format_plain("Timeout"), "Timeout");
        assert_eq!(format_plain("failed to fetch"), "failed to fetch");
    }

    #[test]
    fn test_auth_statuses_map_to_unauthorized() {
        assert_eq!(format_plain("HTTP 401: Unauthorized"), MSG_UNAUTHORIZED);
        assert_eq!(format_plain("HTTP 403: Forbidden"), MSG_UNAUTHORIZED);
    }

    #[test]
    fn test_404_maps_to_not_found() {
        assert_eq!(format_plain("HTTP 404: Not Found"), MSG_NOT_FOUND);
        assert_eq!(format_plain("lesson 404 missing"), MSG_NOT_FOUND);
    }

    #[test]
    fn test_server_statuses_map_to_server_error() {
        for message in [
            "HTTP 500: Internal Server Error",
            "HTTP 502: Bad Gateway",
            "HTTP 503: Service Unavailable",
            // "Timeout" is capitalized here, so only the status matches
            "HTTP 504: Gateway Timeout",
        ] {
            assert_eq!(format_plain(message), MSG_SERVER, "{}", message);
        }
    }

    #[test]
    fn test_priority_order_first_match_wins() {
        // Network beats everything below it in the table
        assert_eq!(format_plain("Failed to fetch after 404"), MSG_NETWORK);
        // Unauthorized beats not-found
        assert_eq!(format_plain("401 then 404"), MSG_UNAUTHORIZED);
    }

    #[test]
    fn test_unknown_message_is_returned_raw() {
        assert_eq!(format_plain("Lesson quota exceeded"), "Lesson quota exceeded");
    }

    #[test]
    fn test_non_error_returns_generic_fallback() {
        assert_eq!(format_api_error(None), MSG_UNKNOWN);
    }

    #[test]
    fn test_api_error_display_is_classified() {
        let not_found = ApiError::from_status(StatusCode::NOT_FOUND);
        assert_eq!(not_found.to_string(), "HTTP 404: Not Found");
        assert_eq!(not_found.user_message(), MSG_NOT_FOUND);

        let network = ApiError::Network("connection refused".to_string());
        assert_eq!(network.user_message(), MSG_NETWORK);

        let timeout = ApiError::Timeout("after 30s".to_string());
        assert_eq!(timeout.user_message(), MSG_TIMEOUT);

        let unavailable = ApiError::from_status(StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(unavailable.to_string(), "HTTP 503: Service Unavailable");
        assert_eq!(unavailable.user_message(), MSG_SERVER);
    }

    #[test]
    fn test_describe_failure_translates_only_api_errors() {
        let api: Box<dyn StdError> = Box::new(ApiError::from_status(StatusCode::NOT_FOUND));
        assert_eq!(describe_failure(&*api), MSG_NOT_FOUND);

        // Digits in a local error must not be read as a status code
        let local: Box<dyn StdError> = Box::new(Plain("'5000' is not a HH:MM time"));
        assert_eq!(describe_failure(&*local), "'5000' is not a HH:MM time");

        let message: Box<dyn StdError> = "lesson 404 not unlocked".into();
        assert_eq!(describe_failure(&*message), "lesson 404 not unlocked");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR).is_retryable());
        assert!(ApiError::from_status(StatusCode::BAD_GATEWAY).is_retryable());
        assert!(!ApiError::from_status(StatusCode::NOT_FOUND).is_retryable());
        assert!(!ApiError::from_status(StatusCode::TOO_MANY_REQUESTS).is_retryable());
        assert!(ApiError::Network(String::new()).is_retryable());
        assert!(ApiError::Timeout(String::new()).is_retryable());
        assert!(ApiError::Request(String::new()).is_retryable());
        assert!(!ApiError::InvalidRequest(String::new()).is_retryable());
        assert!(!ApiError::Decode(String::new()).is_retryable());
    }

    #[test]
    fn test_status_accessor() {
        assert_eq!(ApiError::from_status(StatusCode::FORBIDDEN).status(), Some(403));
        assert_eq!(ApiError::Network(String::new()).status(), None);
    }

    #[test]
    fn test_serde_error_becomes_decode() {
        let err = serde_json::from_str::<u32>("not json").unwrap_err();
        assert!(matches!(ApiError::from(err), ApiError::Decode(_)));
    }
}
