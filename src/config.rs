//! Configuration management for mozi
//!
//! Stores settings in ~/.config/mozi/config.json. Every field is optional in
//! the file; missing ones fall back to defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
const DEFAULT_FILE_CONTENT_CAP: usize = 5000;
const DEFAULT_KEYWORD_LIMIT: usize = 5;
const DEFAULT_MATCHES_PER_KEYWORD: usize = 3;
const DEFAULT_TOP_RECOMMENDED: usize = 10;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Token used when `GITHUB_TOKEN` is not set
    pub github_token: Option<String>,
    pub api_base_url: String,
    /// Characters of each related file kept as evidence
    pub file_content_cap: usize,
    /// Extracted keywords sent to code search per issue
    pub keyword_limit: usize,
    pub matches_per_keyword: usize,
    pub top_recommended: usize,
    /// Issues analyzed at once. 1 keeps requests strictly sequential.
    pub concurrency: usize,
    /// Give up on evidence gathering for a single issue after this long
    pub issue_timeout_secs: Option<u64>,
    pub request_timeout_secs: u64,
    pub include_pull_requests: bool,
    /// Where report files are written (current directory when unset)
    pub output_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github_token: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            file_content_cap: DEFAULT_FILE_CONTENT_CAP,
            keyword_limit: DEFAULT_KEYWORD_LIMIT,
            matches_per_keyword: DEFAULT_MATCHES_PER_KEYWORD,
            top_recommended: DEFAULT_TOP_RECOMMENDED,
            concurrency: 1,
            issue_timeout_secs: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            include_pull_requests: false,
            output_dir: None,
        }
    }
}

impl Config {
    /// Replace values that would stall or empty a run.
    pub fn sanitize(&mut self) {
        if self.concurrency == 0 {
            self.concurrency = 1;
        }
        if self.file_content_cap == 0 {
            self.file_content_cap = DEFAULT_FILE_CONTENT_CAP;
        }
        if self.keyword_limit == 0 {
            self.keyword_limit = DEFAULT_KEYWORD_LIMIT;
        }
        if self.matches_per_keyword == 0 {
            self.matches_per_keyword = DEFAULT_MATCHES_PER_KEYWORD;
        }
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = DEFAULT_REQUEST_TIMEOUT_SECS;
        }
        if self.issue_timeout_secs == Some(0) {
            self.issue_timeout_secs = None;
        }
        let trimmed = self.api_base_url.trim().trim_end_matches('/');
        self.api_base_url = if trimmed.is_empty() {
            DEFAULT_API_BASE_URL.to_string()
        } else {
            trimmed.to_string()
        };
        if self
            .github_token
            .as_deref()
            .is_some_and(|t| t.trim().is_empty())
        {
            self.github_token = None;
        }
    }

    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("mozi"))
    }

    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.json"))
    }

    /// Load config from the default location, or return defaults
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load config from `path`. A corrupt file is set aside and defaults are used.
    pub fn load_from(path: &Path) -> Self {
        if let Ok(content) = fs::read_to_string(path) {
            match serde_json::from_str::<Config>(&content) {
                Ok(mut config) => {
                    config.sanitize();
                    return config;
                }
                Err(err) => {
                    preserve_corrupt_config(path, &content);
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "Config file was corrupted. A backup was saved and defaults were loaded."
                    );
                }
            }
        }
        Self::default()
    }

    /// Save config to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        let mut sanitized = self.clone();
        sanitized.sanitize();

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Err(e) = fs::set_permissions(dir, fs::Permissions::from_mode(0o700)) {
                    warn!(error = %e, "Failed to set config directory permissions");
                }
            }
        }

        let content = serde_json::to_string_pretty(&sanitized)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        write_config_atomic(path, &content).map_err(|e| format!("Failed to write config: {}", e))
    }

    /// Token from the environment first, then the config file.
    pub fn github_token(&self) -> Option<String> {
        if let Ok(token) = std::env::var("GITHUB_TOKEN") {
            if !token.trim().is_empty() {
                return Some(token);
            }
        }
        self.github_token.clone()
    }

    /// Get the config file location for display
    pub fn config_location() -> String {
        Self::config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "~/.config/mozi/config.json".to_string())
    }
}

fn preserve_corrupt_config(path: &Path, content: &str) {
    let corrupt_path = path.with_extension("json.corrupt");
    if fs::rename(path, &corrupt_path).is_err() {
        let _ = fs::write(&corrupt_path, content);
    }
}

fn write_config_atomic(path: &Path, content: &str) -> Result<(), String> {
    use std::fs::OpenOptions;

    let tmp_path = path.with_extension("tmp");
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&tmp_path)
        .map_err(|e| e.to_string())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) = file.set_permissions(fs::Permissions::from_mode(0o600)) {
            warn!(error = %e, "Failed to set temp config file permissions");
        }
    }

    file.write_all(content.as_bytes())
        .map_err(|e| e.to_string())?;

    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err.to_string());
    }
    Ok(())
}
