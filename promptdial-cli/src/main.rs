use promptdial_core::config::TunerConfig;
use promptdial_core::task::Task;
use promptdial_engine::dispatch::{Dispatcher, GenerationRequest};
use promptdial_engine::traits::CloudTextBackend;
use promptdial_runtime::cloud::GeminiCloudBackend;
use promptdial_runtime::config_store::ConfigStore;
use promptdial_runtime::defaults::default_tuner_config;
use promptdial_runtime::local_model::LocalModel;
use promptdial_runtime::probes::default_probe_chain;
use promptdial_runtime::secrets::{SecretKey, get_secret};
use std::io::Read;
use std::sync::Arc;

fn load_config() -> TunerConfig {
    let Some(path) = std::env::var_os("PROMPTDIAL_CONFIG") else {
        return default_tuner_config();
    };

    let store = ConfigStore::at_path(path);
    match store.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            log::warn!("could not load config, using defaults: {e:#}");
            default_tuner_config()
        }
    }
}

fn cloud_api_key() -> Option<String> {
    if let Ok(key) = std::env::var("GEMINI_API_KEY") {
        if !key.trim().is_empty() {
            return Some(key);
        }
    }
    match get_secret(SecretKey::GeminiApiKey) {
        Ok(key) => key,
        Err(e) => {
            log::warn!("keyring lookup failed: {e:#}");
            None
        }
    }
}

fn read_input() -> anyhow::Result<String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        return Ok(args.join(" "));
    }

    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    Ok(input.trim().to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let input = read_input()?;
    if input.is_empty() {
        anyhow::bail!("usage: promptdial-cli <text>  (or pipe text on stdin)");
    }

    let cfg = load_config();
    let cloud: Option<Arc<dyn CloudTextBackend>> = match cloud_api_key() {
        Some(key) => Some(Arc::new(GeminiCloudBackend::new(
            cfg.cloud.base_url.clone(),
            key,
            cfg.cloud.model.clone(),
        ))),
        None => {
            log::warn!("no cloud API key configured; on-device only");
            None
        }
    };

    let dispatcher = Dispatcher::new(
        default_probe_chain(&cfg.local_base_url),
        Arc::new(LocalModel::new(cfg.local_base_url.clone())),
        cloud,
    );

    let outcome = dispatcher
        .dispatch(&GenerationRequest {
            input,
            eq: cfg.eq,
            parental: cfg.parental,
            task: Task::Optimize,
        })
        .await?;

    println!("{}", outcome.text);
    log::info!(
        "served by {} backend ({})",
        outcome.backend,
        outcome.availability.detail
    );
    Ok(())
}
