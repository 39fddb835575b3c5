use serde::Deserialize;
use std::path::{Path, PathBuf};

use wacdec::model::MarkerMode;

const DEFAULT_DEVICE: &str = "/dev/input/wacom";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub model: Option<String>,
    #[serde(default = "default_device")]
    pub device: PathBuf,
    pub marker: Option<MarkerMode>,
    pub coords: Option<String>,
    pub max_pressure: Option<i32>,
    pub tilt: Option<bool>,
    #[serde(default)]
    pub reports: bool,
    #[serde(default)]
    pub compat32: bool,
    #[serde(default)]
    pub uinput: bool,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            model: None,
            device: default_device(),
            marker: None,
            coords: None,
            max_pressure: None,
            tilt: None,
            reports: false,
            compat32: false,
            uinput: false,
        }
    }
}

fn default_device() -> PathBuf {
    PathBuf::from(DEFAULT_DEVICE)
}

pub fn load_from_path(path: &Path) -> Option<FileConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => {
            log::debug!("Loaded config from {}", path.display());
            Some(config)
        }
        Err(e) => {
            log::warn!("Failed to parse {}: {}", path.display(), e);
            None
        }
    }
}

pub fn load_from_default_paths() -> Option<FileConfig> {
    for path in default_config_paths() {
        if path.exists() {
            if let Some(config) = load_from_path(&path) {
                return Some(config);
            }
        }
    }
    None
}

fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("wacdec.toml")];

    if let Ok(home) = std::env::var("HOME") {
        paths.push(PathBuf::from(home).join(".config").join("wacdec.toml"));
    }

    paths
}
