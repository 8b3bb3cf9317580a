use crate::types::EqualizerSettings;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudDefaults {
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunerConfig {
    pub eq: EqualizerSettings,
    pub parental: bool,
    pub cloud: CloudDefaults,
    pub local_base_url: String,

    // Secrets are stored outside this struct at rest.
    #[serde(default)]
    pub cloud_api_key_present: bool,
}
