use {
    axum::{
        http::StatusCode,
        response::{IntoResponse, Json, Response},
    },
    parley_protocol::{ErrorEnvelope, ErrorShape, ValidationError, error_codes},
};

/// Why an inbound chat message was not accepted.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid message: {0}")]
    Invalid(#[from] ValidationError),

    #[error("message store unavailable: {0}")]
    Store(#[from] parley_store::Error),
}

impl Error {
    /// Client-visible description. Store internals are not leaked.
    pub fn to_error_shape(&self) -> ErrorShape {
        match self {
            Self::Json(_) | Self::Invalid(_) => {
                ErrorShape::new(error_codes::INVALID_REQUEST, self.to_string())
            },
            Self::Store(_) => ErrorShape::new(error_codes::UNAVAILABLE, "message store unavailable"),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Json(_) | Self::Invalid(_) => StatusCode::BAD_REQUEST,
            Self::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let envelope = ErrorEnvelope::from(self.to_error_shape());
        (self.status(), Json(envelope)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, Error>;
