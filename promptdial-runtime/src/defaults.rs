use promptdial_core::config::{CloudDefaults, TunerConfig};
use promptdial_core::types::EqualizerSettings;

pub const DEFAULT_CLOUD_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_CLOUD_MODEL: &str = "gemini-pro";
pub const DEFAULT_LOCAL_BASE_URL: &str = "http://127.0.0.1:8484";

pub fn default_tuner_config() -> TunerConfig {
    TunerConfig {
        eq: EqualizerSettings::centered(),
        parental: false,
        cloud: CloudDefaults {
            base_url: DEFAULT_CLOUD_BASE_URL.into(),
            model: DEFAULT_CLOUD_MODEL.into(),
        },
        local_base_url: DEFAULT_LOCAL_BASE_URL.into(),
        cloud_api_key_present: false,
    }
}
