use async_trait::async_trait;
use promptdial_core::rails::GenerationRails;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What one probe mechanism had to say about on-device availability.
///
/// `NotApplicable` means the mechanism itself is absent or unreachable;
/// the dispatcher moves on to the next one instead of failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeAnswer {
    Available,
    Unavailable,
    NotApplicable,
}

/// One way of asking whether the on-device model can serve a request.
///
/// Probes are consulted in a fixed priority order; the first definitive
/// answer wins. A probe must never error: anything it cannot determine
/// is `NotApplicable`.
#[async_trait]
pub trait CapabilityProbe: Send + Sync {
    fn mechanism(&self) -> &str;
    async fn check(&self) -> ProbeAnswer;
}

/// Factory for on-device generation sessions.
#[async_trait]
pub trait OnDeviceModel: Send + Sync {
    async fn create_session(
        &self,
        system_instruction: &str,
        temperature: f64,
        top_k: u32,
    ) -> anyhow::Result<Box<dyn ModelSession>>;
}

/// A live on-device session. The dispatcher calls `destroy` exactly once
/// per created session, on every exit path, so implementations can hold
/// real model resources.
#[async_trait]
pub trait ModelSession: Send + Sync {
    async fn prompt(&self, input: &str) -> anyhow::Result<String>;
    async fn destroy(&self);
}

#[derive(Debug, Error)]
pub enum CloudError {
    #[error("cloud endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("cloud transport error: {0:#}")]
    Transport(#[source] anyhow::Error),
    #[error("cloud response could not be decoded: {0:#}")]
    Decode(#[source] anyhow::Error),
}

#[async_trait]
pub trait CloudTextBackend: Send + Sync {
    async fn generate(
        &self,
        system_instruction: &str,
        user_input: &str,
        rails: &GenerationRails,
    ) -> Result<String, CloudError>;
}

/// Transient probe verdict for one dispatch. Recomputed every time;
/// on-device availability can change between calls (e.g. mid-download).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendAvailability {
    pub available: bool,
    pub mechanism: Option<String>,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendKind {
    OnDevice,
    Cloud,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::OnDevice => "on-device",
            BackendKind::Cloud => "cloud",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
