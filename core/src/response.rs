//! Turning an `HttpResponse` into a typed result or an `ApiError`.
//!
//! Every operation goes through `check_status` first, so the error taxonomy
//! is the same for all of them: a 2xx status proceeds to decoding, anything
//! else becomes `Remote` when the body carries a `{code, message}` pair and
//! `MalformedResponse` when it does not.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::http::HttpResponse;

/// A `{code, message}` pair reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: i64,
    pub message: String,
}

/// Result of an operation that reports acceptance only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acknowledgement {
    pub status: u16,
}

// The live service nests the pair under "error"; older gateways return it flat.
#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorEnvelope {
    Nested { error: ErrorDetail },
    Flat(ErrorDetail),
}

impl ErrorEnvelope {
    fn into_detail(self) -> ErrorDetail {
        match self {
            ErrorEnvelope::Nested { error } | ErrorEnvelope::Flat(error) => error,
        }
    }
}

/// Map a non-2xx response to `Remote` or `MalformedResponse`.
pub fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    match serde_json::from_str::<ErrorEnvelope>(&response.body) {
        Ok(envelope) => {
            let detail = envelope.into_detail();
            Err(ApiError::Remote {
                status: response.status,
                code: detail.code,
                message: detail.message,
            })
        }
        Err(e) => Err(ApiError::MalformedResponse {
            status: response.status,
            reason: format!("unrecognized error body: {e}"),
            body: response.body.clone(),
        }),
    }
}

/// Decode a successful response body into `T`.
pub fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    check_status(response)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::MalformedResponse {
        status: response.status,
        reason: format!("unexpected success body: {e}"),
        body: response.body.clone(),
    })
}

/// Accept any 2xx response, ignoring its body.
pub fn acknowledge(response: &HttpResponse) -> Result<Acknowledgement, ApiError> {
    check_status(response)?;
    Ok(Acknowledgement {
        status: response.status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Shape {
        id: String,
    }

    #[test]
    fn success_body_is_decoded() {
        let shape: Shape = decode(&HttpResponse::new(200, r#"{"id":"a1"}"#)).unwrap();
        assert_eq!(shape, Shape { id: "a1".into() });
    }

    #[test]
    fn success_with_wrong_shape_is_malformed() {
        let err = decode::<Shape>(&HttpResponse::new(200, r#"{"other":1}"#)).unwrap_err();
        match err {
            ApiError::MalformedResponse { status, body, .. } => {
                assert_eq!(status, 200);
                assert_eq!(body, r#"{"other":1}"#);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn success_with_empty_body_is_malformed() {
        let err = decode::<Shape>(&HttpResponse::new(200, "")).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn nested_error_body_is_remote() {
        let response = HttpResponse::new(
            400,
            r#"{"error":{"code":1011,"message":"Missing senders"},"msg_id":"0"}"#,
        );
        let err = decode::<Shape>(&response).unwrap_err();
        match err {
            ApiError::Remote {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 400);
                assert_eq!(code, 1011);
                assert_eq!(message, "Missing senders");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn flat_error_body_is_remote() {
        let response = HttpResponse::new(401, r#"{"code":1004,"message":"Authen failed"}"#);
        let err = check_status(&response).unwrap_err();
        assert_eq!(err.remote_code(), Some(1004));
    }

    #[test]
    fn non_json_error_body_is_malformed() {
        let response = HttpResponse::new(502, "<html>Bad Gateway</html>");
        let err = check_status(&response).unwrap_err();
        match err {
            ApiError::MalformedResponse { status, body, .. } => {
                assert_eq!(status, 502);
                assert_eq!(body, "<html>Bad Gateway</html>");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn error_body_missing_fields_is_malformed() {
        let response = HttpResponse::new(500, r#"{"error":{"code":1000}}"#);
        assert!(check_status(&response).unwrap_err().is_malformed());
    }

    #[test]
    fn acknowledge_ignores_body() {
        let ack = acknowledge(&HttpResponse::new(200, "")).unwrap();
        assert_eq!(ack, Acknowledgement { status: 200 });
        let ack = acknowledge(&HttpResponse::new(204, "not json")).unwrap();
        assert_eq!(ack.status, 204);
    }

    #[test]
    fn acknowledge_reports_rejection() {
        let response =
            HttpResponse::new(404, r#"{"error":{"code":7002,"message":"no such device"}}"#);
        let err = acknowledge(&response).unwrap_err();
        assert_eq!(err.remote_code(), Some(7002));
    }
}
