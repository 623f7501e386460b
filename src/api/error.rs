use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server responded with {status}: {message}")]
    Status { status: u16, message: String },
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Builds a status error, preferring the body's `message` or `error` field.
    pub fn from_status(status: StatusCode, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<serde_json::Value>(body)
            .ok()
            .and_then(|value| {
                ["message", "error"]
                    .iter()
                    .find_map(|key| value.get(key)?.as_str().map(str::to_string))
            })
            .or_else(|| {
                let text = String::from_utf8_lossy(body).trim().to_string();
                (!text.is_empty()).then_some(text)
            })
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unknown status")
                    .to_string()
            });

        ApiError::Status {
            status: status.as_u16(),
            message,
        }
    }

    pub fn is_status(&self, code: u16) -> bool {
        matches!(self, ApiError::Status { status, .. } if *status == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_message_prefers_json_fields() {
        let err = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            br#"{"success":false,"message":"Insufficient balance"}"#,
        );
        assert_eq!(err.to_string(), "server responded with 400: Insufficient balance");

        let err = ApiError::from_status(StatusCode::NOT_FOUND, br#"{"error":"no such game"}"#);
        assert!(err.is_status(404));
        assert!(err.to_string().ends_with("no such game"));
    }

    #[test]
    fn status_message_falls_back_to_body_then_reason() {
        let err = ApiError::from_status(StatusCode::BAD_GATEWAY, b"upstream down\n");
        assert!(err.to_string().ends_with(": upstream down"));

        let err = ApiError::from_status(StatusCode::SERVICE_UNAVAILABLE, b"");
        assert!(err.to_string().ends_with(": Service Unavailable"));
    }
}
