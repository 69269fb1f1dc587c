use serde::{Deserialize, Serialize};

/// JSON body returned for errors produced by the guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str, code: u16) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
            code,
        }
    }
}

/// Body of the guarded demonstration endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloResponse {
    pub message: String,
    pub request_id: Option<String>,
}

impl HelloResponse {
    pub fn new(request_id: Option<String>) -> Self {
        Self {
            message: "Hello, you made it through.".to_string(),
            request_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_shape() {
        let body = ErrorResponse::new("rate_limit_exceeded", "slow down", 429);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["error"], "rate_limit_exceeded");
        assert_eq!(json["message"], "slow down");
        assert_eq!(json["code"], 429);
    }
}
