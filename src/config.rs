use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const APP_DIR: &str = ".lifesync";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct RemoteConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl RemoteConfig {
    /// The key to send, if the remote path is enabled at all.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct Config {
    /// Where the profile slot lives; defaults to `~/.lifesync`.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub remote: RemoteConfig,
}

impl Config {
    pub fn base_dir() -> PathBuf {
        match homedir::my_home() {
            Ok(Some(home)) => home.join(APP_DIR),
            Ok(None) => PathBuf::from(APP_DIR),
            Err(err) => {
                tracing::warn!("could not resolve home directory: {}", err);
                PathBuf::from(APP_DIR)
            }
        }
    }

    pub fn config_path() -> PathBuf {
        Self::base_dir().join(CONFIG_FILE)
    }

    /// Loads `path`, falling back to defaults when it is missing or invalid,
    /// then applies environment overrides.
    pub fn load(path: &Path) -> Self {
        let mut config = Self::read(path);
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    fn read(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(_) => {
                tracing::debug!("no config at {:?}, using defaults", path);
                return Self::default();
            }
        };
        match toml::from_str::<Config>(&contents) {
            Ok(config) => {
                tracing::info!("loaded config from {:?}", path);
                config
            }
            Err(err) => {
                tracing::error!("failed to parse {:?}: {}", path, err);
                Self::default()
            }
        }
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("LIFESYNC_API_URL") {
            self.remote.endpoint = url;
        }
        if let Some(key) = var("LIFESYNC_API_KEY").or_else(|| var("OPENAI_API_KEY")) {
            self.remote.api_key = Some(key);
        }
        if let Some(model) = var("LIFESYNC_MODEL") {
            self.remote.model = model;
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(Self::base_dir)
    }
}
