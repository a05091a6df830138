//! Application configuration for bookpipe.
//!
//! Config is looked up, in order, at `--config <path>`, `./bookpipe.toml`,
//! and `~/.bookpipe/bookpipe.toml`. CLI flags override config file values,
//! which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BookPipeError, Result};
use crate::types::StepId;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "bookpipe.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".bookpipe";

// ---------------------------------------------------------------------------
// Config structs (matching bookpipe.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Output and site roots.
    #[serde(default)]
    pub paths: PathsConfig,

    /// How stage programs are launched.
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Script file name per stage.
    #[serde(default)]
    pub scripts: ScriptsConfig,

    /// Default values for run flags.
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root for per-book work directories.
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,

    /// Root for generated sites.
    #[serde(default = "default_docs_root")]
    pub docs_root: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_root: default_output_root(),
            docs_root: default_docs_root(),
        }
    }
}

fn default_output_root() -> PathBuf {
    PathBuf::from("output/books")
}
fn default_docs_root() -> PathBuf {
    PathBuf::from("docs/books")
}

/// `[runtime]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Program that runs each stage script.
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    /// Directory holding the stage scripts, relative to the working directory.
    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: PathBuf,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            scripts_dir: default_scripts_dir(),
        }
    }
}

fn default_interpreter() -> String {
    "python3".into()
}
fn default_scripts_dir() -> PathBuf {
    PathBuf::from("src")
}

/// `[scripts]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptsConfig {
    #[serde(default = "default_extract_script")]
    pub extract: String,
    #[serde(default = "default_preprocess_script")]
    pub preprocess: String,
    #[serde(default = "default_translate_script")]
    pub translate: String,
    #[serde(default = "default_summarize_script")]
    pub summarize: String,
    #[serde(default = "default_audio_script")]
    pub audio: String,
    #[serde(default = "default_website_script")]
    pub website: String,
}

impl ScriptsConfig {
    /// Script file name for `step`.
    pub fn for_step(&self, step: StepId) -> &str {
        match step {
            StepId::Extract => &self.extract,
            StepId::Preprocess => &self.preprocess,
            StepId::Translate => &self.translate,
            StepId::Summarize => &self.summarize,
            StepId::Audio => &self.audio,
            StepId::Website => &self.website,
        }
    }
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            extract: default_extract_script(),
            preprocess: default_preprocess_script(),
            translate: default_translate_script(),
            summarize: default_summarize_script(),
            audio: default_audio_script(),
            website: default_website_script(),
        }
    }
}

fn default_extract_script() -> String {
    "extract_chapters.py".into()
}
fn default_preprocess_script() -> String {
    "preprocess.py".into()
}
fn default_translate_script() -> String {
    "translate.py".into()
}
fn default_summarize_script() -> String {
    "summarize.py".into()
}
fn default_audio_script() -> String {
    "generate_audio.py".into()
}
fn default_website_script() -> String {
    "generate_website.py".into()
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Front-matter pages the extract stage skips.
    #[serde(default = "default_skip_pages")]
    pub skip_pages: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            skip_pages: default_skip_pages(),
        }
    }
}

fn default_skip_pages() -> u32 {
    10
}

impl AppConfig {
    /// Reject values no run could succeed with.
    pub fn validate(&self) -> Result<()> {
        if self.runtime.interpreter.trim().is_empty() {
            return Err(BookPipeError::config("runtime.interpreter must not be empty"));
        }
        for step in StepId::ALL {
            if self.scripts.for_step(step).trim().is_empty() {
                return Err(BookPipeError::config(format!(
                    "scripts.{step} must not be empty"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the user config directory (`~/.bookpipe/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| BookPipeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Resolve and load the application config.
///
/// An explicit path must exist. Otherwise `<working_dir>/bookpipe.toml` is
/// tried, then the user config; defaults are used when neither exists.
pub fn load_config(explicit: Option<&Path>, working_dir: &Path) -> Result<AppConfig> {
    if let Some(path) = explicit {
        return load_config_from(path);
    }

    let local = working_dir.join(CONFIG_FILE_NAME);
    if local.is_file() {
        return load_config_from(&local);
    }

    if let Ok(dir) = config_dir() {
        let user = dir.join(CONFIG_FILE_NAME);
        if user.is_file() {
            return load_config_from(&user);
        }
    }

    tracing::debug!("no config file found, using defaults");
    Ok(AppConfig::default())
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| BookPipeError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        BookPipeError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;

    tracing::debug!(?path, "loaded config file");
    Ok(config)
}
