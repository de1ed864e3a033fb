//! services/api/src/web/errors.rs
//!
//! Turns port failures into the `(StatusCode, String)` pairs handlers return.
//! The string is meant to be shown to the user as-is.

use axum::http::StatusCode;
use beyond_bark_core::ports::PortError;
use tracing::{error, warn};

pub type HandlerError = (StatusCode, String);

pub fn port_error_response(context: &str, e: PortError) -> HandlerError {
    let status = match &e {
        PortError::NotFound(_) => StatusCode::NOT_FOUND,
        PortError::Conflict(_) | PortError::AlreadyRescued(_) => StatusCode::CONFLICT,
        PortError::Unauthorized => StatusCode::UNAUTHORIZED,
        PortError::Transport(_) => StatusCode::GATEWAY_TIMEOUT,
        PortError::Rejected(_) | PortError::EmptyReport { .. } | PortError::RetriesExhausted { .. } => {
            StatusCode::BAD_GATEWAY
        }
        PortError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        PortError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        error!("{}: {:?}", context, e);
    } else {
        warn!("{}: {}", context, e);
    }

    let message = match e {
        PortError::Unexpected(_) => context.to_string(),
        other => format!("{}: {}", context, other),
    };
    (status, message)
}
