use actix_web::http::StatusCode;
use actix_web::http::header::{self, HeaderValue};
use actix_web::{HttpResponse, ResponseError};

/// Coarse classification of a failed exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthorized,
    /// Caller-side payload faults. An oversized body belongs here too even
    /// though it is answered with 413 rather than 400.
    BadRequest,
    InternalError,
    GatewayTimeout,
    BackendUnreachable,
    /// The caller went away before the backend answered.
    Cancelled,
}

/// Terminal failure of one `/api/chat` exchange.
///
/// `Display` is the plain-text body returned to the caller. The payload of
/// each variant carries the underlying cause, which is only logged.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid request payload")]
    InvalidPayload(String),

    #[error("Missing required fields")]
    MissingFields,

    #[error("Payload too large")]
    PayloadTooLarge { limit: usize },

    #[error("Error creating request")]
    CreateRequest(#[source] serde_json::Error),

    #[error("Request timed out")]
    Timeout,

    #[error("Error contacting Ollama API")]
    BackendUnreachable(#[source] reqwest::Error),

    #[error("Error reading Ollama response")]
    ReadResponse(String),

    #[error("Client closed request")]
    ClientDisconnected,
}

/// nginx-style status for a request its caller abandoned.
const CLIENT_CLOSED_REQUEST: u16 = 499;

impl ProxyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProxyError::Unauthorized => ErrorKind::Unauthorized,
            ProxyError::InvalidPayload(_)
            | ProxyError::MissingFields
            | ProxyError::PayloadTooLarge { .. } => ErrorKind::BadRequest,
            ProxyError::CreateRequest(_) | ProxyError::ReadResponse(_) => {
                ErrorKind::InternalError
            }
            ProxyError::Timeout => ErrorKind::GatewayTimeout,
            ProxyError::BackendUnreachable(_) => ErrorKind::BackendUnreachable,
            ProxyError::ClientDisconnected => ErrorKind::Cancelled,
        }
    }

    /// Log line prefix; the caller's address is appended after "from".
    pub fn log_message(&self) -> &'static str {
        match self {
            ProxyError::Unauthorized => "Unauthorized request",
            ProxyError::InvalidPayload(_) => "Invalid request payload",
            ProxyError::MissingFields => "Missing required fields in request",
            ProxyError::PayloadTooLarge { .. } => "Payload too large",
            ProxyError::CreateRequest(_) => "Error creating request body",
            ProxyError::Timeout => "Request timed out",
            ProxyError::BackendUnreachable(_) => "Error contacting Ollama API",
            ProxyError::ReadResponse(_) => "Error reading Ollama response",
            ProxyError::ClientDisconnected => "Cancelled Ollama call after client disconnect",
        }
    }

    /// Underlying cause, if any, for debug logging.
    pub fn detail(&self) -> Option<String> {
        match self {
            ProxyError::InvalidPayload(e) | ProxyError::ReadResponse(e) => Some(e.clone()),
            ProxyError::PayloadTooLarge { limit } => Some(format!("limit is {} bytes", limit)),
            ProxyError::CreateRequest(e) => Some(e.to_string()),
            ProxyError::BackendUnreachable(e) => Some(e.to_string()),
            ProxyError::Unauthorized
            | ProxyError::MissingFields
            | ProxyError::Timeout
            | ProxyError::ClientDisconnected => None,
        }
    }
}

impl ResponseError for ProxyError {
    fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::Unauthorized => StatusCode::UNAUTHORIZED,
            ProxyError::InvalidPayload(_) | ProxyError::MissingFields => StatusCode::BAD_REQUEST,
            ProxyError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::CreateRequest(_)
            | ProxyError::BackendUnreachable(_)
            | ProxyError::ReadResponse(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::ClientDisconnected => StatusCode::from_u16(CLIENT_CLOSED_REQUEST)
                .unwrap_or(StatusCode::BAD_REQUEST),
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header((
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            ))
            .insert_header((
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .body(format!("{}\n", self))
    }
}
