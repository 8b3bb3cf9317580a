use anyhow::{Context, anyhow};
use async_trait::async_trait;
use promptdial_engine::traits::{ModelSession, OnDeviceModel};
use promptdial_providers::request::{Body, HttpRequest};
use promptdial_providers::runtime;
use serde::Deserialize;
use serde_json::json;

/// On-device backend adapter over a local inference server.
///
/// Session lifecycle maps onto three routes: `POST /sessions` creates a
/// session seeded with the system instruction and sampling rails,
/// `POST /sessions/<id>/prompt` generates, `DELETE /sessions/<id>`
/// releases the model resources.
#[derive(Debug, Clone)]
pub struct LocalModel {
    base_url: String,
}

impl LocalModel {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Debug, Deserialize)]
struct CreateSessionReply {
    id: String,
}

#[async_trait]
impl OnDeviceModel for LocalModel {
    async fn create_session(
        &self,
        system_instruction: &str,
        temperature: f64,
        top_k: u32,
    ) -> anyhow::Result<Box<dyn ModelSession>> {
        let payload = json!({
            "systemInstruction": system_instruction,
            "temperature": temperature,
            "topK": top_k,
        });
        let req = HttpRequest {
            method: "POST".into(),
            url: self.endpoint("sessions"),
            headers: vec![("Content-Type".into(), "application/json".into())],
            body: Body::Json(payload.to_string()),
        };

        let resp = runtime::execute(&req).await.context("create session")?;
        if !resp.is_success() {
            return Err(anyhow!(
                "session creation failed: status={} body={}",
                resp.status,
                String::from_utf8_lossy(&resp.body)
            ));
        }

        let reply: CreateSessionReply =
            serde_json::from_slice(&resp.body).context("decode session JSON")?;

        Ok(Box::new(LocalSession {
            base_url: self.base_url.clone(),
            id: reply.id,
        }))
    }
}

struct LocalSession {
    base_url: String,
    id: String,
}

impl LocalSession {
    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Debug, Deserialize)]
struct PromptReply {
    text: String,
}

#[async_trait]
impl ModelSession for LocalSession {
    async fn prompt(&self, input: &str) -> anyhow::Result<String> {
        let req = HttpRequest {
            method: "POST".into(),
            url: self.endpoint(&format!("sessions/{}/prompt", self.id)),
            headers: vec![("Content-Type".into(), "application/json".into())],
            body: Body::Json(json!({ "input": input }).to_string()),
        };

        let resp = runtime::execute(&req).await.context("prompt session")?;
        if !resp.is_success() {
            return Err(anyhow!(
                "prompt call failed: status={} body={}",
                resp.status,
                String::from_utf8_lossy(&resp.body)
            ));
        }

        // Servers answer with either `{"text": ...}`, a JSON string, or
        // plain text; accept all three.
        if let Ok(reply) = serde_json::from_slice::<PromptReply>(&resp.body) {
            return Ok(reply.text);
        }
        if let Ok(s) = serde_json::from_slice::<String>(&resp.body) {
            return Ok(s);
        }
        Ok(String::from_utf8_lossy(&resp.body).into_owned())
    }

    async fn destroy(&self) {
        let req = HttpRequest {
            method: "DELETE".into(),
            url: self.endpoint(&format!("sessions/{}", self.id)),
            headers: vec![],
            body: Body::Empty,
        };

        // A leaked remote session is the server's to reap; the dispatch
        // result must not depend on cleanup succeeding.
        match runtime::execute(&req).await {
            Ok(resp) if resp.is_success() => {}
            Ok(resp) => log::warn!("session {} delete returned status {}", self.id, resp.status),
            Err(e) => log::warn!("session {} delete failed: {e:#}", self.id),
        }
    }
}
