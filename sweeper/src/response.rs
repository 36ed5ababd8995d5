use serde::Serialize;

use crate::{ErrorKind, SweepError};

/// Operation result as reported to callers: `{"success": true, ...payload}`
/// or `{"success": false, "kind": ..., "error": ...}`.
#[derive(Debug, Serialize)]
pub struct OperationResponse<T> {
    success: bool,
    #[serde(flatten)]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> OperationResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            kind: None,
            error: None,
        }
    }

    pub fn failure(err: &SweepError) -> Self {
        Self {
            success: false,
            data: None,
            kind: Some(err.kind()),
            error: Some(err.to_string()),
        }
    }

    pub fn from_result(result: Result<T, SweepError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::failure(&e),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Payload {
        tx_hash: &'static str,
        status: &'static str,
    }

    #[test]
    fn success_flattens_payload() {
        let response = OperationResponse::ok(Payload {
            tx_hash: "0x01",
            status: "confirmed",
        });
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"success": true, "tx_hash": "0x01", "status": "confirmed"})
        );
    }

    #[test]
    fn failure_carries_kind_and_message() {
        let response = OperationResponse::<Payload>::from_result(Err(SweepError::NoTargetToken));
        assert!(!response.is_success());
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "success": false,
                "kind": "configuration",
                "error": "No target token set. Call set_target_token first."
            })
        );
    }
}
