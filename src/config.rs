use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::Context;

const DEFAULT_CHAT_MODEL: &str = "gemini-1.5-flash-002";
const DEFAULT_EMBED_MODEL: &str = "text-embedding-004";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_LOOKUP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_AGENT_MAX_ITERATIONS: usize = 3;

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        let data_dir = env::var("POSTGEN_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));
        let log_dir = data_dir.join("logs");

        for dir in [&data_dir, &log_dir] {
            let _ = fs::create_dir_all(dir);
        }

        AppPaths { data_dir, log_dir }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

/// Process configuration, resolved once at startup from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub google_api_key: String,
    pub chat_model: String,
    pub embed_model: String,
    pub port: u16,
    pub lookup_timeout_secs: u64,
    pub agent_max_iterations: usize,
    pub cors_origins: Vec<String>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        let google_api_key = env::var("GOOGLE_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .context("Please set GOOGLE_API_KEY in your environment variables")?;

        Ok(Settings {
            google_api_key,
            chat_model: env_or("POSTGEN_CHAT_MODEL", DEFAULT_CHAT_MODEL),
            embed_model: env_or("POSTGEN_EMBED_MODEL", DEFAULT_EMBED_MODEL),
            port: parse_env("PORT").unwrap_or(DEFAULT_PORT),
            lookup_timeout_secs: parse_env("POSTGEN_LOOKUP_TIMEOUT_SECS")
                .unwrap_or(DEFAULT_LOOKUP_TIMEOUT_SECS),
            agent_max_iterations: parse_env("POSTGEN_AGENT_MAX_ITERATIONS")
                .unwrap_or(DEFAULT_AGENT_MAX_ITERATIONS),
            cors_origins: resolve_cors_origins(),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|value| value.trim().parse().ok())
}

fn resolve_cors_origins() -> Vec<String> {
    let origins = env::var("POSTGEN_CORS_ORIGINS")
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    if origins.is_empty() {
        return default_local_origins();
    }

    origins
}

fn default_local_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_paths_create_directories() {
        let tmp = tempfile::tempdir().expect("tempdir");
        std::env::set_var("POSTGEN_DATA_DIR", tmp.path().join("nested"));
        let paths = AppPaths::new();
        std::env::remove_var("POSTGEN_DATA_DIR");

        assert!(paths.data_dir.is_dir());
        assert!(paths.log_dir.is_dir());
    }

    #[test]
    fn default_origins_cover_local_frontend() {
        let origins = default_local_origins();
        assert!(origins.contains(&"http://localhost:3000".to_string()));
    }
}
