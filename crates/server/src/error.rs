use axum::{
    Json,
    extract::{FromRequest, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tasklane_api::ServiceError;
use tasklane_models::Error;

use crate::keyvalue::KvError;

/// Unified API error type.
///
/// Produces `{"error": "<message>", "code": <code>}` JSON responses. Domain
/// errors keep their numeric code; anything else answers with code 0.
#[derive(Debug)]
pub struct ApiErr {
    status: StatusCode,
    code: i64,
    message: String,
}

impl ApiErr {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            code: 0,
            message: message.into(),
        }
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, msg)
    }

    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "forbidden")
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> i64 {
        self.code
    }
}

impl From<Error> for ApiErr {
    fn from(err: Error) -> Self {
        if err.is_internal() {
            tracing::error!("request failed: {err}");
            return Self::internal();
        }
        Self {
            status: StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::BAD_REQUEST),
            code: err.code(),
            message: err.to_string(),
        }
    }
}

impl From<ServiceError> for ApiErr {
    fn from(err: ServiceError) -> Self {
        Error::Service(err).into()
    }
}

impl From<KvError> for ApiErr {
    fn from(err: KvError) -> Self {
        tracing::error!("key-value store: {err}");
        Self::internal()
    }
}

impl From<JsonRejection> for ApiErr {
    fn from(rejection: JsonRejection) -> Self {
        let message = rejection.body_text();
        let code = if message.contains("invalid right") {
            Error::InvalidRight(0).code()
        } else {
            Error::InvalidData(String::new()).code()
        };
        Self {
            status: StatusCode::BAD_REQUEST,
            code,
            message,
        }
    }
}

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({"error": self.message, "code": self.code})),
        )
            .into_response()
    }
}

/// JSON request body whose rejections answer in the API's error format.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiErr))]
pub struct Payload<T>(pub T);
