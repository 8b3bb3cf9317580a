use crate::traits::{
    BackendAvailability, BackendKind, CapabilityProbe, CloudError, CloudTextBackend, OnDeviceModel,
    ProbeAnswer,
};
use promptdial_core::rails::{build_system_instruction, map_equalizer};
use promptdial_core::task::Task;
use promptdial_core::text::truncate_sentences;
use promptdial_core::types::EqualizerSettings;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Appended to every result the cloud fallback produced, so provenance
/// stays visible to the user even when the fallback was silent.
pub const CLOUD_FALLBACK_MARKER: &str = "\n\n[Cloud fallback: Gemini 1.5]";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub input: String,
    pub eq: EqualizerSettings,
    pub parental: bool,
    #[serde(default)]
    pub task: Task,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no generation backend available: {detail}")]
    NoBackendAvailable { detail: String },
    #[error(transparent)]
    Cloud(#[from] CloudError),
    #[error("{backend} backend returned an empty response")]
    EmptyResult { backend: BackendKind },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub text: String,
    pub backend: BackendKind,
    pub availability: BackendAvailability,
}

/// Routes one generation request: probe the on-device backend, try it if
/// it looks usable, otherwise (or on any primary failure) fall back to
/// the cloud backend, then truncate the result to the verbosity cap.
///
/// Fallback policy: silent. Primary unavailability and primary failure
/// are both recovered by the cloud path within the same dispatch; the
/// caller sees provenance through `DispatchOutcome::backend` and the
/// cloud marker, never a manual-retry error.
///
/// Holds no per-request state; concurrent dispatches are independent and
/// each creates and destroys its own on-device session.
pub struct Dispatcher {
    probes: Vec<Arc<dyn CapabilityProbe>>,
    on_device: Arc<dyn OnDeviceModel>,
    cloud: Option<Arc<dyn CloudTextBackend>>,
}

impl Dispatcher {
    pub fn new(
        probes: Vec<Arc<dyn CapabilityProbe>>,
        on_device: Arc<dyn OnDeviceModel>,
        cloud: Option<Arc<dyn CloudTextBackend>>,
    ) -> Self {
        Self {
            probes,
            on_device,
            cloud,
        }
    }

    /// Walks the probe list in priority order and returns the first
    /// definitive answer. All-`NotApplicable` reads as unavailable.
    pub async fn probe_availability(&self) -> BackendAvailability {
        for probe in &self.probes {
            match probe.check().await {
                ProbeAnswer::Available => {
                    return BackendAvailability {
                        available: true,
                        mechanism: Some(probe.mechanism().to_string()),
                        detail: format!("{} reported available", probe.mechanism()),
                    };
                }
                ProbeAnswer::Unavailable => {
                    return BackendAvailability {
                        available: false,
                        mechanism: Some(probe.mechanism().to_string()),
                        detail: format!("{} reported unavailable", probe.mechanism()),
                    };
                }
                ProbeAnswer::NotApplicable => {
                    log::debug!("probe mechanism {} not applicable, trying next", probe.mechanism());
                }
            }
        }

        BackendAvailability {
            available: false,
            mechanism: None,
            detail: "no probe mechanism answered".to_string(),
        }
    }

    pub async fn dispatch(&self, req: &GenerationRequest) -> Result<DispatchOutcome, DispatchError> {
        let rails = map_equalizer(&req.eq);
        let system = build_system_instruction(&rails, req.parental);
        let input = req.task.frame_input(&req.input);

        let availability = self.probe_availability().await;

        let mut primary_failure = None;
        if availability.available {
            match self.run_on_device(&system, &input, &rails).await {
                Ok(raw) => {
                    return Ok(DispatchOutcome {
                        text: truncate_sentences(&raw, rails.verbosity_cap as usize),
                        backend: BackendKind::OnDevice,
                        availability,
                    });
                }
                Err(e) => {
                    log::warn!("on-device generation failed, falling back to cloud: {e:#}");
                    primary_failure = Some(format!("{e:#}"));
                }
            }
        } else {
            log::warn!("on-device backend unavailable ({}), using cloud fallback", availability.detail);
        }

        let cloud = self
            .cloud
            .as_ref()
            .ok_or_else(|| DispatchError::NoBackendAvailable {
                detail: match &primary_failure {
                    Some(e) => format!("on-device attempt failed ({e}); no cloud backend configured"),
                    None => format!("{}; no cloud backend configured", availability.detail),
                },
            })?;

        let raw = cloud.generate(&system, &input, &rails).await?;
        if raw.trim().is_empty() {
            return Err(DispatchError::EmptyResult {
                backend: BackendKind::Cloud,
            });
        }

        let mut text = truncate_sentences(&raw, rails.verbosity_cap as usize);
        text.push_str(CLOUD_FALLBACK_MARKER);

        Ok(DispatchOutcome {
            text,
            backend: BackendKind::Cloud,
            availability,
        })
    }

    /// Scoped session use: the handle is created right before the prompt
    /// and destroyed right after, on success and failure alike.
    async fn run_on_device(
        &self,
        system_instruction: &str,
        input: &str,
        rails: &promptdial_core::rails::GenerationRails,
    ) -> anyhow::Result<String> {
        let session = self
            .on_device
            .create_session(system_instruction, rails.temperature, rails.top_k)
            .await?;

        let res = session.prompt(input).await;
        session.destroy().await;

        let raw = res?;
        if raw.trim().is_empty() {
            anyhow::bail!("on-device model returned an empty response");
        }
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ModelSession;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedProbe {
        mechanism: &'static str,
        answer: ProbeAnswer,
    }

    #[async_trait]
    impl CapabilityProbe for FixedProbe {
        fn mechanism(&self) -> &str {
            self.mechanism
        }

        async fn check(&self) -> ProbeAnswer {
            self.answer.clone()
        }
    }

    fn probe(mechanism: &'static str, answer: ProbeAnswer) -> Arc<dyn CapabilityProbe> {
        Arc::new(FixedProbe { mechanism, answer })
    }

    #[derive(Default)]
    struct Counters {
        sessions_created: AtomicUsize,
        prompts: AtomicUsize,
        destroys: AtomicUsize,
    }

    #[derive(Clone, Copy)]
    enum PromptBehavior {
        Reply(&'static str),
        Fail,
    }

    struct FakeModel {
        counters: Arc<Counters>,
        create_fails: bool,
        prompt: PromptBehavior,
    }

    struct FakeSession {
        counters: Arc<Counters>,
        reply: Option<&'static str>,
    }

    #[async_trait]
    impl OnDeviceModel for FakeModel {
        async fn create_session(
            &self,
            _system_instruction: &str,
            _temperature: f64,
            _top_k: u32,
        ) -> anyhow::Result<Box<dyn ModelSession>> {
            if self.create_fails {
                anyhow::bail!("session creation refused");
            }
            self.counters.sessions_created.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeSession {
                counters: self.counters.clone(),
                reply: match self.prompt {
                    PromptBehavior::Reply(text) => Some(text),
                    PromptBehavior::Fail => None,
                },
            }))
        }
    }

    #[async_trait]
    impl ModelSession for FakeSession {
        async fn prompt(&self, _input: &str) -> anyhow::Result<String> {
            self.counters.prompts.fetch_add(1, Ordering::SeqCst);
            match self.reply {
                Some(text) => Ok(text.to_string()),
                None => anyhow::bail!("prompt call failed"),
            }
        }

        async fn destroy(&self) {
            self.counters.destroys.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct FakeCloud {
        reply: Result<&'static str, u16>,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl FakeCloud {
        fn replying(text: &'static str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text),
                calls: Mutex::new(vec![]),
            })
        }

        fn failing(status: u16) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(status),
                calls: Mutex::new(vec![]),
            })
        }
    }

    #[async_trait]
    impl CloudTextBackend for FakeCloud {
        async fn generate(
            &self,
            system_instruction: &str,
            user_input: &str,
            _rails: &promptdial_core::rails::GenerationRails,
        ) -> Result<String, CloudError> {
            self.calls
                .lock()
                .unwrap()
                .push((system_instruction.to_string(), user_input.to_string()));
            match self.reply {
                Ok(text) => Ok(text.to_string()),
                Err(status) => Err(CloudError::Status {
                    status,
                    body: "boom".into(),
                }),
            }
        }
    }

    fn model(counters: &Arc<Counters>, prompt: PromptBehavior) -> Arc<dyn OnDeviceModel> {
        Arc::new(FakeModel {
            counters: counters.clone(),
            create_fails: false,
            prompt,
        })
    }

    fn request(input: &str) -> GenerationRequest {
        GenerationRequest {
            input: input.into(),
            eq: EqualizerSettings::centered(),
            parental: false,
            task: Task::Optimize,
        }
    }

    #[tokio::test]
    async fn unavailable_probe_never_touches_primary() {
        let counters = Arc::new(Counters::default());
        let cloud = FakeCloud::replying("Cloudy answer. More detail.");
        let dispatcher = Dispatcher::new(
            vec![probe("capabilities", ProbeAnswer::Unavailable)],
            model(&counters, PromptBehavior::Reply("unused")),
            Some(cloud.clone()),
        );

        let out = dispatcher.dispatch(&request("hi")).await.unwrap();
        assert_eq!(counters.sessions_created.load(Ordering::SeqCst), 0);
        assert_eq!(out.backend, BackendKind::Cloud);
        assert!(out.text.ends_with(CLOUD_FALLBACK_MARKER));
        assert_eq!(cloud.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn on_device_success_skips_cloud_and_omits_marker() {
        let counters = Arc::new(Counters::default());
        let cloud = FakeCloud::replying("unused");
        let dispatcher = Dispatcher::new(
            vec![probe("capabilities", ProbeAnswer::Available)],
            model(&counters, PromptBehavior::Reply("One. Two. Three. Four. Five.")),
            Some(cloud.clone()),
        );

        // sociability 0 -> verbosity cap 1
        let mut req = request("hi");
        req.eq.sociability = 0;
        let out = dispatcher.dispatch(&req).await.unwrap();

        assert_eq!(out.backend, BackendKind::OnDevice);
        assert_eq!(out.text, "One.");
        assert!(cloud.calls.lock().unwrap().is_empty());
        assert_eq!(counters.destroys.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn prompt_failure_destroys_session_and_falls_back() {
        let counters = Arc::new(Counters::default());
        let cloud = FakeCloud::replying("Recovered.");
        let dispatcher = Dispatcher::new(
            vec![probe("capabilities", ProbeAnswer::Available)],
            model(&counters, PromptBehavior::Fail),
            Some(cloud.clone()),
        );

        let out = dispatcher.dispatch(&request("hi")).await.unwrap();
        assert_eq!(counters.sessions_created.load(Ordering::SeqCst), 1);
        assert_eq!(counters.destroys.load(Ordering::SeqCst), 1);
        assert_eq!(out.backend, BackendKind::Cloud);
        assert!(out.text.starts_with("Recovered."));
    }

    #[tokio::test]
    async fn create_failure_falls_back_without_leaking() {
        let counters = Arc::new(Counters::default());
        let cloud = FakeCloud::replying("Recovered.");
        let dispatcher = Dispatcher::new(
            vec![probe("capabilities", ProbeAnswer::Available)],
            Arc::new(FakeModel {
                counters: counters.clone(),
                create_fails: true,
                prompt: PromptBehavior::Reply("unused"),
            }),
            Some(cloud),
        );

        let out = dispatcher.dispatch(&request("hi")).await.unwrap();
        assert_eq!(out.backend, BackendKind::Cloud);
        assert_eq!(counters.sessions_created.load(Ordering::SeqCst), 0);
        assert_eq!(counters.destroys.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn blank_on_device_reply_triggers_fallback() {
        let counters = Arc::new(Counters::default());
        let cloud = FakeCloud::replying("Cloud said something.");
        let dispatcher = Dispatcher::new(
            vec![probe("capabilities", ProbeAnswer::Available)],
            model(&counters, PromptBehavior::Reply("   \n")),
            Some(cloud),
        );

        let out = dispatcher.dispatch(&request("hi")).await.unwrap();
        assert_eq!(out.backend, BackendKind::Cloud);
        assert_eq!(counters.destroys.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn blank_cloud_reply_is_an_empty_result_error() {
        let counters = Arc::new(Counters::default());
        let dispatcher = Dispatcher::new(
            vec![probe("capabilities", ProbeAnswer::Unavailable)],
            model(&counters, PromptBehavior::Reply("unused")),
            Some(FakeCloud::replying("   ")),
        );

        let err = dispatcher.dispatch(&request("hi")).await.unwrap_err();
        assert!(matches!(
            err,
            DispatchError::EmptyResult {
                backend: BackendKind::Cloud
            }
        ));
    }

    #[tokio::test]
    async fn cloud_status_failure_is_terminal() {
        let counters = Arc::new(Counters::default());
        let dispatcher = Dispatcher::new(
            vec![probe("capabilities", ProbeAnswer::Unavailable)],
            model(&counters, PromptBehavior::Reply("unused")),
            Some(FakeCloud::failing(500)),
        );

        let err = dispatcher.dispatch(&request("hi")).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("500"), "unexpected message: {msg}");
    }

    #[tokio::test]
    async fn no_cloud_and_unavailable_primary_reports_no_backend() {
        let counters = Arc::new(Counters::default());
        let dispatcher = Dispatcher::new(
            vec![probe("availability", ProbeAnswer::Unavailable)],
            model(&counters, PromptBehavior::Reply("unused")),
            None,
        );

        let err = dispatcher.dispatch(&request("hi")).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("no generation backend available"));
        assert!(msg.contains("availability reported unavailable"));
        assert!(msg.contains("no cloud backend configured"));
    }

    #[tokio::test]
    async fn primary_failure_without_cloud_reports_the_failure() {
        let counters = Arc::new(Counters::default());
        let dispatcher = Dispatcher::new(
            vec![probe("capabilities", ProbeAnswer::Available)],
            model(&counters, PromptBehavior::Fail),
            None,
        );

        let err = dispatcher.dispatch(&request("hi")).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("on-device attempt failed"), "unexpected message: {msg}");
        assert!(msg.contains("prompt call failed"), "unexpected message: {msg}");
        assert!(msg.contains("no cloud backend configured"), "unexpected message: {msg}");
        // The session still gets released on this path.
        assert_eq!(counters.destroys.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn first_definitive_probe_answer_wins() {
        let counters = Arc::new(Counters::default());
        let dispatcher = Dispatcher::new(
            vec![
                probe("capabilities", ProbeAnswer::NotApplicable),
                probe("availability", ProbeAnswer::Unavailable),
                probe("session-entry", ProbeAnswer::Available),
            ],
            model(&counters, PromptBehavior::Reply("unused")),
            None,
        );

        let availability = dispatcher.probe_availability().await;
        assert!(!availability.available);
        assert_eq!(availability.mechanism.as_deref(), Some("availability"));
    }

    #[tokio::test]
    async fn all_probes_not_applicable_reads_as_unavailable() {
        let counters = Arc::new(Counters::default());
        let dispatcher = Dispatcher::new(
            vec![
                probe("capabilities", ProbeAnswer::NotApplicable),
                probe("availability", ProbeAnswer::NotApplicable),
            ],
            model(&counters, PromptBehavior::Reply("unused")),
            None,
        );

        let availability = dispatcher.probe_availability().await;
        assert!(!availability.available);
        assert_eq!(availability.mechanism, None);
        assert_eq!(availability.detail, "no probe mechanism answered");
    }

    #[tokio::test]
    async fn task_framing_reaches_the_backend() {
        let counters = Arc::new(Counters::default());
        let cloud = FakeCloud::replying("Summary.");
        let dispatcher = Dispatcher::new(
            vec![probe("capabilities", ProbeAnswer::Unavailable)],
            model(&counters, PromptBehavior::Reply("unused")),
            Some(cloud.clone()),
        );

        let mut req = request("long text");
        req.task = Task::Summarize;
        dispatcher.dispatch(&req).await.unwrap();

        let calls = cloud.calls.lock().unwrap();
        assert!(calls[0].1.starts_with("Please summarize the following text:"));
        assert!(calls[0].0.contains("Rails: temp=0.55"));
    }
}
