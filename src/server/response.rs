//! Mapping of errors onto HTTP responses

use crate::error::Error;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

impl Error {
    /// HTTP status reported for this error
    pub fn status(&self) -> StatusCode {
        match self {
            Error::MissingData | Error::BadRequest(_) | Error::InvalidParameter(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::Encoding(_) | Error::ImageLoad(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.to_string(),
            "kind": self.kind(),
        });
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(Error::MissingData.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            Error::InvalidParameter("scale".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::ImageLoad("corrupt".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            Error::Encoding("too long".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            Error::Image("png".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_response_status() {
        let response = Error::MissingData.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
