use std::sync::OnceLock;

use serde::Deserialize;

/// Env var naming the JSON config file.
pub(crate) const CONFIG_ENV: &str = "LOADGEN_CONFIG";

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoadConfig {
    pub publishers: usize,
    // "low", "medium", "high"
    pub video_resolution: String,
    // "" = any, "h264", "vp8"
    pub video_codec: String,
    pub simulcast: bool,
    pub audio: bool,
    // 0 = run until ctrl-c
    pub duration_secs: u64,
    // None = embedded clips
    pub resources_dir: Option<String>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            publishers: 1,
            video_resolution: "high".to_string(),
            video_codec: String::new(),
            simulcast: true,
            audio: true,
            duration_secs: 10,
            resources_dir: None,
        }
    }
}

impl LoadConfig {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).map_err(|e| anyhow::anyhow!("invalid load config: {}", e))
    }

    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("read load config {}: {}", path, e))?;
        Self::from_json(&json)
    }
}

static CONFIG: OnceLock<LoadConfig> = OnceLock::new();

fn load_config(path: Option<&str>) -> anyhow::Result<LoadConfig> {
    match path {
        Some(path) if !path.is_empty() => LoadConfig::from_file(path),
        _ => Ok(LoadConfig::default()),
    }
}

/// Loads the config once: from the file named by `LOADGEN_CONFIG`, or
/// defaults when unset.
pub(crate) fn init_config() -> anyhow::Result<&'static LoadConfig> {
    let path = std::env::var(CONFIG_ENV).ok();
    let loaded = load_config(path.as_deref())?;
    CONFIG
        .set(loaded)
        .map_err(|_| anyhow::anyhow!("load config already initialized"))?;
    config()
}

pub(crate) fn config() -> anyhow::Result<&'static LoadConfig> {
    CONFIG
        .get()
        .ok_or(anyhow::anyhow!("load config not initialized"))
}
