use async_trait::async_trait;
use promptdial_engine::traits::{CapabilityProbe, ProbeAnswer};
use promptdial_providers::request::{Body, HttpRequest};
use promptdial_providers::runtime;
use serde::Deserialize;
use std::sync::Arc;

// Status strings the availability mechanism may report that still mean
// the model can serve requests (some arrive mid-download).
const AVAILABLE_STATUSES: [&str; 5] = ["readily", "available", "ready", "downloaded", "maybe"];

fn get(url: String) -> HttpRequest {
    HttpRequest {
        method: "GET".into(),
        url,
        headers: vec![],
        body: Body::Empty,
    }
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

/// Highest-priority mechanism: an explicit capability query.
pub struct CapabilitiesProbe {
    base_url: String,
}

impl CapabilitiesProbe {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CapabilitiesReply {
    #[serde(rename = "canCreate")]
    can_create: bool,
}

#[async_trait]
impl CapabilityProbe for CapabilitiesProbe {
    fn mechanism(&self) -> &str {
        "capabilities"
    }

    async fn check(&self) -> ProbeAnswer {
        let req = get(endpoint(&self.base_url, "capabilities"));
        let resp = match runtime::execute(&req).await {
            Ok(resp) => resp,
            Err(e) => {
                log::debug!("capabilities probe unreachable: {e:#}");
                return ProbeAnswer::NotApplicable;
            }
        };
        if !resp.is_success() {
            return ProbeAnswer::NotApplicable;
        }
        match serde_json::from_slice::<CapabilitiesReply>(&resp.body) {
            Ok(reply) if reply.can_create => ProbeAnswer::Available,
            Ok(_) => ProbeAnswer::Unavailable,
            Err(e) => {
                log::debug!("capabilities probe returned unreadable body: {e:#}");
                ProbeAnswer::NotApplicable
            }
        }
    }
}

/// Second mechanism: a status string describing model readiness.
pub struct AvailabilityStatusProbe {
    base_url: String,
}

impl AvailabilityStatusProbe {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl CapabilityProbe for AvailabilityStatusProbe {
    fn mechanism(&self) -> &str {
        "availability"
    }

    async fn check(&self) -> ProbeAnswer {
        let req = get(endpoint(&self.base_url, "availability"));
        let resp = match runtime::execute(&req).await {
            Ok(resp) => resp,
            Err(e) => {
                log::debug!("availability probe unreachable: {e:#}");
                return ProbeAnswer::NotApplicable;
            }
        };
        if !resp.is_success() {
            return ProbeAnswer::NotApplicable;
        }

        // The status arrives either as a JSON string or as plain text.
        let status = serde_json::from_slice::<String>(&resp.body)
            .unwrap_or_else(|_| String::from_utf8_lossy(&resp.body).trim().to_string());

        if AVAILABLE_STATUSES.contains(&status.as_str()) {
            ProbeAnswer::Available
        } else {
            ProbeAnswer::Unavailable
        }
    }
}

/// Last resort: does the session-creation entry point exist at all?
pub struct SessionEntryProbe {
    base_url: String,
}

impl SessionEntryProbe {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl CapabilityProbe for SessionEntryProbe {
    fn mechanism(&self) -> &str {
        "session-entry"
    }

    async fn check(&self) -> ProbeAnswer {
        let req = get(endpoint(&self.base_url, "sessions"));
        let resp = match runtime::execute(&req).await {
            Ok(resp) => resp,
            Err(e) => {
                log::debug!("session-entry probe unreachable: {e:#}");
                return ProbeAnswer::NotApplicable;
            }
        };

        // 405 still proves the route exists; only a 404 proves it doesn't.
        match resp.status {
            404 => ProbeAnswer::Unavailable,
            405 => ProbeAnswer::Available,
            s if (200..=299).contains(&s) => ProbeAnswer::Available,
            _ => ProbeAnswer::NotApplicable,
        }
    }
}

/// The standard probe chain, highest priority first.
pub fn default_probe_chain(base_url: &str) -> Vec<Arc<dyn CapabilityProbe>> {
    vec![
        Arc::new(CapabilitiesProbe::new(base_url)),
        Arc::new(AvailabilityStatusProbe::new(base_url)),
        Arc::new(SessionEntryProbe::new(base_url)),
    ]
}
