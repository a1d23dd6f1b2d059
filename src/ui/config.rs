use crate::debugger::frame::FrameList;
use crate::debugger::frame::select::DEFAULT_ADDRESS_SEARCH_LIMIT;
use crate::{fstk_debug, fstk_warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use strum_macros::{Display, EnumString, IntoStaticStr};

#[derive(
    Copy, Clone, PartialEq, Eq, Debug, Default, EnumString, Display, IntoStaticStr, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Application user interface config.
#[derive(Debug, Clone, PartialEq)]
pub struct UIConfig {
    /// Colorize addresses, function names and file paths.
    pub color: bool,
    pub output: OutputFormat,
    /// Unwinding stops after this number of frames.
    pub max_unwind_depth: u32,
    /// Frames examined by `frame select <address>`.
    pub address_search_limit: u32,
    /// Save command history in a regular file.
    pub save_history: bool,
}

impl Default for UIConfig {
    fn default() -> Self {
        Self {
            color: true,
            output: OutputFormat::Text,
            max_unwind_depth: FrameList::DEFAULT_MAX_DEPTH,
            address_search_limit: DEFAULT_ADDRESS_SEARCH_LIMIT,
            save_history: true,
        }
    }
}

/// Content of a configuration file, every key is optional.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub color: Option<bool>,
    pub output: Option<OutputFormat>,
    pub max_unwind_depth: Option<u32>,
    pub address_search_limit: Option<u32>,
    pub save_history: Option<bool>,
}

impl ConfigFile {
    /// Apply keys presented in a file over `config`.
    pub fn apply(self, mut config: UIConfig) -> UIConfig {
        if let Some(color) = self.color {
            config.color = color;
        }
        if let Some(output) = self.output {
            config.output = output;
        }
        if let Some(depth) = self.max_unwind_depth {
            config.max_unwind_depth = depth;
        }
        if let Some(limit) = self.address_search_limit {
            config.address_search_limit = limit;
        }
        if let Some(save_history) = self.save_history {
            config.save_history = save_history;
        }
        config
    }
}

/// Return path to a default configuration file (`~/.config/fstk/config.toml`).
pub fn default_path() -> Option<PathBuf> {
    home::home_dir().map(|home| home.join(".config").join("fstk").join("config.toml"))
}

fn read_file(path: &Path) -> anyhow::Result<ConfigFile> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load configuration.
///
/// Explicitly passed file must exist, a missing default file is silently ignored.
/// Malformed file is reported into logs and ignored, defaults are used instead.
pub fn load(explicit: Option<&Path>) -> anyhow::Result<UIConfig> {
    let path = match explicit {
        Some(path) if !path.exists() => {
            anyhow::bail!("configuration file {} not found", path.display())
        }
        Some(path) => path.to_path_buf(),
        None => match default_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(UIConfig::default()),
        },
    };

    match read_file(&path) {
        Ok(file) => {
            fstk_debug!(target: "config", "configuration loaded from {}", path.display());
            Ok(file.apply(UIConfig::default()))
        }
        Err(e) => {
            fstk_warn!(target: "config", "ignore configuration file {}: {e:#}", path.display());
            Ok(UIConfig::default())
        }
    }
}

/// Read-only ui configuration (set only once, at debugger start).
static CONFIG: OnceLock<UIConfig> = OnceLock::new();

/// Set initial configuration, return `false` if configuration is already set.
pub fn set(config: UIConfig) -> bool {
    CONFIG.set(config).is_ok()
}

/// Return application ui config.
pub fn current() -> &'static UIConfig {
    CONFIG.get_or_init(UIConfig::default)
}
