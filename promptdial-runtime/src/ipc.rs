use promptdial_core::task::Task;
use promptdial_core::types::EqualizerSettings;
use promptdial_engine::dispatch::{Dispatcher, GenerationRequest};
use serde::{Deserialize, Serialize};

pub const MSG_RUN_EQ: &str = "RUN_EQ";

/// Payload of a `RUN_EQ` message. `task` is optional on the wire and
/// defaults to Optimize, keeping older callers compatible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunEqPayload {
    pub eq: EqualizerSettings,
    pub parental: bool,
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub task: Task,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunerResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TunerResponse {
    pub fn success(result: impl Into<String>) -> Self {
        Self {
            ok: true,
            result: Some(result.into()),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            result: None,
            error: Some(error.into()),
        }
    }
}

/// Handles one raw message and always produces exactly one response.
///
/// Every failure, including malformed JSON and unknown message types,
/// comes back as `{ ok: false, error }`; nothing is thrown at the
/// transport layer.
pub async fn handle_message(dispatcher: &Dispatcher, raw: &str) -> TunerResponse {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => return TunerResponse::failure(format!("malformed message: {e}")),
    };

    match value.get("type").and_then(|t| t.as_str()) {
        Some(MSG_RUN_EQ) => {
            let payload: RunEqPayload = match serde_json::from_value(value) {
                Ok(p) => p,
                Err(e) => return TunerResponse::failure(format!("malformed RUN_EQ payload: {e}")),
            };

            let req = GenerationRequest {
                input: payload.input,
                eq: payload.eq,
                parental: payload.parental,
                task: payload.task,
            };

            match dispatcher.dispatch(&req).await {
                Ok(outcome) => TunerResponse::success(outcome.text),
                Err(e) => TunerResponse::failure(e.to_string()),
            }
        }
        _ => TunerResponse::failure("Unknown message"),
    }
}
