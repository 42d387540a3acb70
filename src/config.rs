use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub timeout_secs: u64,
    pub token: Option<String>,
    pub page_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            token: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), token_path().as_deref())
    }

    /// Builds a config from `lookup` (normally the process environment).
    /// `token_file` is only read when `BOARD_API_TOKEN` is unset.
    pub fn from_lookup<F>(lookup: F, token_file: Option<&Path>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("BOARD_API_URL").filter(|v| !v.trim().is_empty()) {
            config.api_url = url.trim().trim_end_matches('/').to_string();
        }

        if let Some(v) = lookup("BOARD_API_TIMEOUT_SECS") {
            config.timeout_secs = v
                .trim()
                .parse()
                .with_context(|| format!("BOARD_API_TIMEOUT_SECS must be a number of seconds, got '{}'", v))?;
        }

        if let Some(v) = lookup("BOARD_PAGE_SIZE") {
            config.page_size = v
                .trim()
                .parse()
                .with_context(|| format!("BOARD_PAGE_SIZE must be a positive integer, got '{}'", v))?;
            if config.page_size == 0 {
                bail!("BOARD_PAGE_SIZE must be at least 1");
            }
        }

        config.token = match lookup("BOARD_API_TOKEN").filter(|v| !v.trim().is_empty()) {
            Some(token) => Some(token.trim().to_string()),
            None => match token_file {
                Some(path) if path.exists() => {
                    let token = std::fs::read_to_string(path)
                        .with_context(|| format!("Failed to read token file: {}", path.display()))?;
                    Some(token.trim().to_string()).filter(|t| !t.is_empty())
                }
                _ => None,
            },
        };

        Ok(config)
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "board")
}

/// `token` in the user's config directory, e.g. `~/.config/board/token`.
pub fn token_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("token"))
}

/// Where the interactive browser writes its log.
pub fn log_path() -> PathBuf {
    match project_dirs() {
        Some(dirs) => dirs.data_dir().join("board.log"),
        // Fallback to current directory
        None => PathBuf::from("board.log"),
    }
}
