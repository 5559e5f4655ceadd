use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use crate::model::comment::CommentRules;
use crate::model::ticket::TicketRules;

/// Name of the per-project directory holding collections, lock, and config.
pub const DOCKET_DIR: &str = ".docket";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub tickets: TicketConfig,
    #[serde(default)]
    pub comments: CommentConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketConfig {
    #[serde(default = "default_min_title_len")]
    pub min_title_len: usize,
    #[serde(default = "default_min_description_len")]
    pub min_description_len: usize,
    /// Delete a ticket's comments along with it instead of leaving orphans.
    #[serde(default)]
    pub cascade_comments: bool,
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self {
            min_title_len: default_min_title_len(),
            min_description_len: default_min_description_len(),
            cascade_comments: false,
        }
    }
}

impl TicketConfig {
    #[must_use]
    pub const fn rules(&self) -> TicketRules {
        TicketRules {
            min_title_len: self.min_title_len,
            min_description_len: self.min_description_len,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentConfig {
    #[serde(default = "default_max_comment_len")]
    pub max_len: usize,
}

impl Default for CommentConfig {
    fn default() -> Self {
        Self {
            max_len: default_max_comment_len(),
        }
    }
}

impl CommentConfig {
    #[must_use]
    pub const fn rules(&self) -> CommentRules {
        CommentRules {
            max_len: self.max_len,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
}

/// Walk up from `start` to the first directory containing `.docket/`.
#[must_use]
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(DOCKET_DIR).is_dir())
        .map(Path::to_path_buf)
}

pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(DOCKET_DIR).join("config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Write the default project config, leaving an existing file alone.
///
/// Returns whether a file was written.
pub fn write_default_project_config(project_root: &Path) -> Result<bool> {
    let dir = project_root.join(DOCKET_DIR);
    let path = dir.join("config.toml");
    if path.exists() {
        return Ok(false);
    }

    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let content = toml::to_string_pretty(&ProjectConfig::default())
        .context("Failed to serialize default config")?;
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}

pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("docket/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Output mode precedence: CLI flag, `FORMAT` env, user config, then TTY
/// detection. Unrecognized values fall through to the next source.
#[must_use]
pub fn resolve_output(
    cli_json: bool,
    user_output: Option<String>,
    env_format: Option<String>,
) -> String {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" | "plain" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    if cli_json {
        return "json".to_string();
    }

    if let Some(mode) = env_format.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if let Some(mode) = user_output.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if std::io::stdout().is_terminal() {
        "pretty".to_string()
    } else {
        "text".to_string()
    }
}

const fn default_min_title_len() -> usize {
    3
}

const fn default_min_description_len() -> usize {
    10
}

const fn default_max_comment_len() -> usize {
    8_192
}
