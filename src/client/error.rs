//! Classification of failed API calls
//!
//! Every request that does not yield the expected payload is described as a
//! [`CallFailure`] and turned into exactly one [`ApiError`] by [`classify`].
//! Commands never see raw transport errors; they branch on the
//! [`FailureKind`] and the predicates exposed by [`ApiError`].
//!
//! Transport failures are attributed in this order:
//! 1. host name could not be resolved
//! 2. connection refused
//! 3. client-side deadline expired (even if part of the body already arrived)
//! 4. certificate signed by an unknown authority
//! 5. any other connection-level problem
//!
//! Responses with a non-success status keep their status code. If the body
//! claims to be JSON but cannot be decoded, the failure is a malformed
//! response instead.

use bytes::Bytes;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::error::Error as StdError;
use std::io;
use thiserror::Error;
use tracing::{debug, warn};

pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

const DNS_MARKERS: &[&str] = &[
    "dns error",
    "failed to lookup address",
    "name or service not known",
    "nodename nor servname",
    "no such host",
    "temporary failure in name resolution",
];

const TIMEOUT_MARKERS: &[&str] = &["timed out", "deadline has elapsed"];

const UNKNOWN_AUTHORITY_MARKERS: &[&str] = &[
    "unknownissuer",
    "unknown issuer",
    "unknown authority",
    "unable to get local issuer certificate",
    "self signed certificate",
    "self-signed certificate",
    // rustls: a self-signed CA certificate served as the leaf
    "causedasendentity",
];

const BODY_EXCERPT_LEN: usize = 200;

/// Raw description of a request that did not produce the expected payload
#[derive(Debug)]
pub enum CallFailure {
    /// No usable response: resolution, connect, TLS, deadline, or body read failure
    Transport {
        url: Option<String>,
        source: BoxError,
    },
    /// A response with a non-success status code
    Status {
        status: u16,
        content_type: Option<String>,
        body: Bytes,
    },
    /// A successful response whose body did not decode into the expected type
    Decode {
        status: u16,
        content_type: Option<String>,
        source: BoxError,
    },
}

impl From<reqwest::Error> for CallFailure {
    fn from(err: reqwest::Error) -> Self {
        CallFailure::Transport {
            url: err.url().map(Url::to_string),
            source: Box::new(err),
        }
    }
}

/// The dominant cause of a failed API call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    HostUnresolvable,
    ConnectionRefused,
    /// Connection-level failure other than resolution or refusal
    Network,
    Timeout,
    /// TLS chain signed by an authority we don't trust
    Certificate,
    HttpStatus { status: u16 },
    MalformedResponse { status: u16 },
    Unknown,
}

/// Normalized, inspectable representation of a failed API call
///
/// `message` is a short headline and `details` a longer explanation. Both are
/// always non-empty.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    kind: FailureKind,
    message: String,
    details: String,
    #[source]
    source: Option<BoxError>,
}

/// Error document the API sends along with non-success responses
#[derive(Deserialize)]
struct ErrorDocument {
    /// Usually a string such as `PERMISSION_DENIED`, sometimes a number
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

impl ErrorDocument {
    fn describe(self) -> Option<String> {
        let code = self.code.and_then(|code| match code {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s),
            other => Some(other.to_string()),
        });
        match (code, self.message) {
            (Some(code), Some(message)) => Some(format!("{message} ({code})")),
            (None, Some(message)) => Some(message),
            (Some(code), None) => Some(code),
            (None, None) => None,
        }
    }
}

/// Turn the outcome of one failed API call into an [`ApiError`]
pub fn classify(failure: CallFailure) -> ApiError {
    let err = match failure {
        CallFailure::Transport { url, source } => classify_transport(url.as_deref(), source),
        CallFailure::Status {
            status,
            content_type,
            body,
        } => classify_status(status, content_type.as_deref(), &body),
        CallFailure::Decode {
            status,
            content_type,
            source,
        } => ApiError::malformed_response(status, content_type.as_deref(), Some(source)),
    };
    debug!(kind = ?err.kind, message = %err.message, "classified API failure");
    err
}

fn classify_transport(url: Option<&str>, source: BoxError) -> ApiError {
    match TransportCause::inspect(source.as_ref()) {
        TransportCause::Dns => ApiError::host_unresolvable(url, source),
        TransportCause::Refused => ApiError::connection_refused(url, source),
        TransportCause::Timeout => ApiError::timeout(url, Some(source)),
        TransportCause::UnknownAuthority => ApiError::certificate(url, source),
        TransportCause::Connect => ApiError::network(url, source),
        TransportCause::Other => {
            warn!(error = %source, "unrecognized transport failure");
            ApiError::unknown(Some(source))
        }
    }
}

fn classify_status(status: u16, content_type: Option<&str>, body: &[u8]) -> ApiError {
    let blank = body.iter().all(u8::is_ascii_whitespace);
    if is_json(content_type) && !blank {
        return match serde_json::from_slice::<ErrorDocument>(body) {
            Ok(doc) => ApiError::http_status(status, doc.describe()),
            Err(e) => ApiError::malformed_response(status, content_type, Some(Box::new(e))),
        };
    }
    let summary = (!blank).then(|| excerpt(body));
    ApiError::http_status(status, summary)
}

fn is_json(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| {
        let essence = ct.split(';').next().unwrap_or_default().trim();
        essence.eq_ignore_ascii_case("application/json") || essence.ends_with("+json")
    })
}

fn excerpt(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    match text.char_indices().nth(BODY_EXCERPT_LEN) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

fn host_of(url: Option<&str>) -> String {
    url.and_then(|u| Url::parse(u).ok())
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "the API endpoint".to_string())
}

fn non_empty(text: String, fallback: &str) -> String {
    if text.trim().is_empty() {
        fallback.to_string()
    } else {
        text
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransportCause {
    Dns,
    Refused,
    Timeout,
    UnknownAuthority,
    Connect,
    Other,
}

impl TransportCause {
    fn inspect(err: &(dyn StdError + 'static)) -> Self {
        let chain: Vec<&(dyn StdError + 'static)> =
            std::iter::successors(Some(err), |&e| e.source()).collect();
        let texts: Vec<String> = chain.iter().map(|e| e.to_string().to_lowercase()).collect();
        let mentions = |markers: &[&str]| {
            texts
                .iter()
                .any(|t| markers.iter().any(|marker| t.contains(marker)))
        };
        let has_io_kind = |kind: io::ErrorKind| {
            chain
                .iter()
                .filter_map(|e| e.downcast_ref::<io::Error>())
                .any(|e| e.kind() == kind)
        };
        let transport = chain.iter().find_map(|e| e.downcast_ref::<reqwest::Error>());

        if mentions(DNS_MARKERS) {
            Self::Dns
        } else if has_io_kind(io::ErrorKind::ConnectionRefused) || mentions(&["connection refused"])
        {
            Self::Refused
        } else if transport.is_some_and(|e| e.is_timeout())
            || has_io_kind(io::ErrorKind::TimedOut)
            || mentions(TIMEOUT_MARKERS)
        {
            Self::Timeout
        } else if mentions(UNKNOWN_AUTHORITY_MARKERS) {
            Self::UnknownAuthority
        } else if transport.is_some_and(|e| e.is_connect() || e.is_request() || e.is_body())
            || has_io_kind(io::ErrorKind::ConnectionReset)
            || has_io_kind(io::ErrorKind::ConnectionAborted)
            || has_io_kind(io::ErrorKind::UnexpectedEof)
        {
            Self::Connect
        } else {
            Self::Other
        }
    }
}

impl ApiError {
    fn new(kind: FailureKind, message: String, details: String, source: Option<BoxError>) -> Self {
        ApiError {
            kind,
            message: non_empty(message, "API request failed"),
            details: non_empty(details, "No further details are available."),
            source,
        }
    }

    pub fn host_unresolvable(url: Option<&str>, source: BoxError) -> Self {
        let host = host_of(url);
        Self::new(
            FailureKind::HostUnresolvable,
            "Host name could not be resolved".to_string(),
            format!(
                "The host name of {host} cannot be resolved. Please check the endpoint URL and your DNS settings."
            ),
            Some(source),
        )
    }

    pub fn connection_refused(url: Option<&str>, source: BoxError) -> Self {
        let host = host_of(url);
        Self::new(
            FailureKind::ConnectionRefused,
            "Connection refused".to_string(),
            format!(
                "The connection to {host} was refused. Please check the endpoint URL and whether the API is reachable from here."
            ),
            Some(source),
        )
    }

    pub fn network(url: Option<&str>, source: BoxError) -> Self {
        let host = host_of(url);
        let details = format!("No response was received from {host}: {source}");
        Self::new(
            FailureKind::Network,
            "No connection to the API".to_string(),
            details,
            Some(source),
        )
    }

    pub fn timeout(url: Option<&str>, source: Option<BoxError>) -> Self {
        let host = host_of(url);
        Self::new(
            FailureKind::Timeout,
            "Request timed out".to_string(),
            format!(
                "No response from {host} arrived within the configured timeout. You may retry with a longer timeout."
            ),
            source,
        )
    }

    pub fn certificate(url: Option<&str>, source: BoxError) -> Self {
        let host = host_of(url);
        Self::new(
            FailureKind::Certificate,
            "Certificate signed by unknown authority".to_string(),
            format!(
                "The TLS certificate presented by {host} could not be verified against the trusted root certificates. Please check your trust configuration."
            ),
            Some(source),
        )
    }

    /// A response with a non-success status. `api_message` is whatever the
    /// API said about the failure, if anything.
    pub fn http_status(status: u16, api_message: Option<String>) -> Self {
        let reason = StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unexpected status");
        let details = match api_message {
            Some(msg) if !msg.trim().is_empty() => {
                format!("The API responded with status {status}: {msg}")
            }
            _ => format!("The API responded with status {status}."),
        };
        Self::new(
            FailureKind::HttpStatus { status },
            format!("HTTP {status} {reason}"),
            details,
            None,
        )
    }

    pub fn malformed_response(
        status: u16,
        content_type: Option<&str>,
        source: Option<BoxError>,
    ) -> Self {
        let content_type = content_type.unwrap_or("unspecified");
        let details = match &source {
            Some(e) => format!(
                "The API response (status {status}, content type '{content_type}') could not be decoded: {e}"
            ),
            None => format!(
                "The API response (status {status}, content type '{content_type}') could not be decoded."
            ),
        };
        Self::new(
            FailureKind::MalformedResponse { status },
            "Malformed response".to_string(),
            details,
            source,
        )
    }

    pub fn unknown(source: Option<BoxError>) -> Self {
        let details = source
            .as_ref()
            .map(|e| e.to_string())
            .unwrap_or_default();
        Self::new(
            FailureKind::Unknown,
            "Unknown error".to_string(),
            details,
            source,
        )
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> &str {
        &self.details
    }

    /// The wrapped cause, if the failure had one
    pub fn original_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    /// Status code of the response, 0 if none was received
    pub fn http_status_code(&self) -> u16 {
        match self.kind {
            FailureKind::HttpStatus { status } | FailureKind::MalformedResponse { status } => {
                status
            }
            _ => 0,
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == FailureKind::Timeout
    }

    pub fn is_malformed_response(&self) -> bool {
        matches!(self.kind, FailureKind::MalformedResponse { .. })
    }

    pub fn is_certificate_error(&self) -> bool {
        self.kind == FailureKind::Certificate
    }

    pub fn is_network_failure(&self) -> bool {
        matches!(
            self.kind,
            FailureKind::HostUnresolvable | FailureKind::ConnectionRefused | FailureKind::Network
        )
    }

    /// Whether re-running the command might succeed without the user changing anything
    pub fn is_retryable(&self) -> bool {
        self.is_network_failure() || self.is_timeout() || self.is_server_error()
    }

    pub fn is_unauthorized(&self) -> bool {
        self.has_status(StatusCode::UNAUTHORIZED)
    }

    pub fn is_access_forbidden(&self) -> bool {
        self.has_status(StatusCode::FORBIDDEN)
    }

    pub fn is_not_found(&self) -> bool {
        self.has_status(StatusCode::NOT_FOUND)
    }

    pub fn is_conflict(&self) -> bool {
        self.has_status(StatusCode::CONFLICT)
    }

    pub fn is_server_error(&self) -> bool {
        matches!(self.kind, FailureKind::HttpStatus { status } if status >= 500)
    }

    fn has_status(&self, code: StatusCode) -> bool {
        self.kind == FailureKind::HttpStatus {
            status: code.as_u16(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        classify(CallFailure::from(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("{0}")]
    struct Message(&'static str);

    #[derive(Debug, Error)]
    #[error("{context}")]
    struct Wrapped {
        context: &'static str,
        #[source]
        inner: io::Error,
    }

    fn transport(source: impl StdError + Send + Sync + 'static) -> CallFailure {
        CallFailure::Transport {
            url: Some("https://api.example.com/v4/clusters/".to_string()),
            source: Box::new(source),
        }
    }

    fn status(code: u16, content_type: &str, body: &'static str) -> CallFailure {
        CallFailure::Status {
            status: code,
            content_type: Some(content_type.to_string()),
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    fn assert_described(err: &ApiError) {
        assert!(!err.message().is_empty());
        assert!(!err.details().is_empty());
    }

    #[test]
    fn test_refused_connection_is_network_failure_without_status() {
        let err = classify(transport(Wrapped {
            context: "tcp connect error",
            inner: io::Error::new(io::ErrorKind::ConnectionRefused, "os error 111"),
        }));

        assert_eq!(err.kind(), FailureKind::ConnectionRefused);
        assert_eq!(err.http_status_code(), 0);
        assert!(err.is_network_failure());
        assert!(err.is_retryable());
        assert!(err.details().contains("api.example.com"));
        let cause = err.original_error().expect("cause");
        assert!(cause.downcast_ref::<Wrapped>().is_some());
        assert_described(&err);
    }

    #[test]
    fn test_dns_failure_wins_over_other_markers() {
        let err = classify(transport(Message(
            "dns error: failed to lookup address information: connection timed out",
        )));
        assert_eq!(err.kind(), FailureKind::HostUnresolvable);
        assert!(!err.is_timeout());
        assert_described(&err);
    }

    #[test]
    fn test_deadline_is_timeout() {
        let err = classify(transport(Wrapped {
            context: "error decoding response body",
            inner: io::Error::new(io::ErrorKind::TimedOut, "deadline"),
        }));
        assert!(err.is_timeout());
        assert_eq!(err.http_status_code(), 0);
        assert!(err.is_retryable());
        assert_described(&err);
    }

    #[test]
    fn test_unknown_issuer_is_certificate_error() {
        let err = classify(transport(Message(
            "invalid peer certificate: UnknownIssuer",
        )));
        assert!(err.is_certificate_error());
        assert!(!err.is_retryable());
        assert_described(&err);
    }

    #[test]
    fn test_reset_connection_is_generic_network_failure() {
        let err = classify(transport(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "connection reset by peer",
        )));
        assert_eq!(err.kind(), FailureKind::Network);
        assert!(err.details().contains("connection reset by peer"));
    }

    #[test]
    fn test_unrecognized_cause_still_described() {
        let err = classify(transport(Message("")));
        assert_eq!(err.kind(), FailureKind::Unknown);
        assert_described(&err);

        let bare = ApiError::unknown(None);
        assert_described(&bare);
        assert!(bare.original_error().is_none());
    }

    #[test]
    fn test_forbidden_plain_text_keeps_status() {
        let err = classify(status(403, "text/plain", "Access forbidden"));
        assert_eq!(err.http_status_code(), 403);
        assert!(err.is_access_forbidden());
        assert!(!err.is_malformed_response());
        assert!(err.details().contains("Access forbidden"));
        assert_eq!(err.message(), "HTTP 403 Forbidden");
    }

    #[test]
    fn test_unauthorized_json_surfaces_api_message() {
        let err = classify(status(
            401,
            "application/json; charset=utf-8",
            r#"{"code": "PERMISSION_DENIED", "message": "Not authorized"}"#,
        ));
        assert_eq!(err.http_status_code(), 401);
        assert!(err.is_unauthorized());
        assert!(err.details().contains("Not authorized (PERMISSION_DENIED)"));
    }

    #[test]
    fn test_status_predicates() {
        assert!(classify(status(404, "text/plain", "")).is_not_found());
        assert!(classify(status(409, "text/plain", "")).is_conflict());
        let server = classify(status(503, "text/plain", "down"));
        assert!(server.is_server_error());
        assert!(server.is_retryable());
        assert!(!classify(status(400, "text/plain", "")).is_retryable());
    }

    #[test]
    fn test_json_content_type_with_html_body_is_malformed() {
        let err = classify(status(
            500,
            "application/json",
            "<html>This is not a JSON page</html>",
        ));
        assert!(err.is_malformed_response());
        assert_eq!(err.http_status_code(), 500);
        assert!(!err.is_server_error());
    }

    #[test]
    fn test_undecodable_success_body_is_malformed() {
        let source = serde_json::from_str::<Vec<String>>("<html>").unwrap_err();
        let err = classify(CallFailure::Decode {
            status: 200,
            content_type: Some("text/html".to_string()),
            source: Box::new(source),
        });
        assert!(err.is_malformed_response());
        assert!(!err.is_timeout());
        assert!(err.details().contains("text/html"));
        assert_described(&err);
    }

    #[test]
    fn test_long_bodies_are_shortened() {
        let body = "x".repeat(1000);
        let err = ApiError::http_status(502, Some(excerpt(body.as_bytes())));
        assert!(err.details().len() < 300);
    }

    #[test]
    fn test_ca_certificate_used_as_server_certificate() {
        let err = classify(transport(Message(
            "invalid peer certificate: Other(CaUsedAsEndEntity)",
        )));
        assert_eq!(err.kind(), FailureKind::Certificate);
        assert_described(&err);
    }

    #[test]
    fn test_numeric_error_code_keeps_status() {
        let err = classify(status(
            404,
            "application/json",
            r#"{"code": 404, "message": "The cluster could not be found."}"#,
        ));
        assert_eq!(err.kind(), FailureKind::HttpStatus { status: 404 });
        assert!(err.is_not_found());
        assert!(err.details().contains("could not be found. (404)"));
    }
}
