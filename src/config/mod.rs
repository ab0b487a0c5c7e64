use std::env;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

pub const API_KEY_ENV: &str = "HYPIXEL_API_KEY";

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct ConfigFile {
    pub api_key: Option<String>,
    pub hypixel_url: Option<String>,
    pub profile_url: Option<String>,
    pub timeout: Option<u64>,
    pub proxy: Option<String>,
    #[serde(alias = "limit_threshold")]
    pub threshold: Option<u32>,
    pub lookup_rate: Option<u32>,
    pub state_file: Option<String>,
    pub persist: Option<bool>,
    pub sort: Option<String>,
    pub search: Option<String>,
    pub output_format: Option<String>,
    pub no_color: Option<bool>,
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("USERPROFILE").map(PathBuf::from))
        .or_else(|| {
            let drive = env::var_os("HOMEDRIVE")?;
            let path = env::var_os("HOMEPATH")?;
            Some(PathBuf::from(drive).join(path))
        })
}

fn app_dir() -> Option<PathBuf> {
    Some(home_dir()?.join(".housing-lookup"))
}

pub fn default_config_path() -> Option<PathBuf> {
    Some(app_dir()?.join("config.yml"))
}

pub fn default_state_path() -> PathBuf {
    app_dir()
        .unwrap_or_else(|| PathBuf::from(".housing-lookup"))
        .join("state.json")
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn env_api_key() -> Option<String> {
    env::var(API_KEY_ENV)
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
}

pub fn load_config(path: &PathBuf, allow_missing: bool) -> Result<ConfigFile, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => serde_yaml::from_str::<ConfigFile>(&contents)
            .map_err(|e| format!("failed to parse config '{}': {e}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
            Ok(ConfigFile::default())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("config file not found '{}'", path.display()))
        }
        Err(e) => Err(format!("failed to read config '{}': {e}", path.display())),
    }
}

fn default_config_yaml() -> String {
    r#"# housing-lookup config
#
# Location (default):
#   ~/.housing-lookup/config.yml

# Hypixel API key (or set HYPIXEL_API_KEY)
# api_key: 00000000-0000-0000-0000-000000000000

# Endpoints
hypixel_url: https://api.hypixel.net/v2
profile_url: https://api.mojang.com/users/profiles/minecraft

# HTTP
timeout: 10
# proxy: http://127.0.0.1:8080

# Call guard: fetches allowed before the countdown kicks in.
# One call is given back per minute.
threshold: 6
# Owner name lookups per second
lookup_rate: 10
# state_file: ~/.housing-lookup/state.json
persist: true

# View
sort: none
# search: parkour
output_format: text
no_color: false
"#
    .to_string()
}

pub fn ensure_default_config_file(path: &PathBuf) -> Result<(), String> {
    if path.exists() {
        return Ok(());
    }
    let parent = path
        .parent()
        .ok_or_else(|| format!("invalid config path '{}'", path.display()))?;
    std::fs::create_dir_all(parent).map_err(|e| {
        format!(
            "failed to create config directory '{}': {e}",
            parent.display()
        )
    })?;
    let contents = default_config_yaml();
    std::fs::write(path, contents)
        .map_err(|e| format!("failed to write config file '{}': {e}", path.display()))?;
    Ok(())
}
