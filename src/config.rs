use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::util::parse_bool_str;

pub const DEFAULT_INDENT_UNIT: usize = 3;
pub const DEFAULT_RECENT_CAPACITY: usize = 5;

const SETTINGS_PATH_ENV: &str = "CAMLPAD_SETTINGS";
const DEFAULT_SETTINGS_FILE: &str = ".camlpad.json";

/// Session configuration: environment variables layered over an optional JSON
/// settings file. The settings file is also where mutable preferences (recent
/// files, indent-on-enter) are written back between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub toplevel_path: PathBuf,
    pub toplevel_args: Vec<String>,
    pub tree_models_dir: PathBuf,
    pub draw_trees: bool,
    pub indent_unit: usize,
    pub indent_on_enter: bool,
    pub recent_capacity: usize,
    pub recent_files: Vec<String>,
    #[serde(skip)]
    pub settings_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            toplevel_path: PathBuf::from("./caml/CamlLightToplevel"),
            toplevel_args: vec!["-stdlib".to_string(), "./caml/lib".to_string()],
            tree_models_dir: PathBuf::from("./gentree"),
            draw_trees: false,
            indent_unit: DEFAULT_INDENT_UNIT,
            indent_on_enter: false,
            recent_capacity: DEFAULT_RECENT_CAPACITY,
            recent_files: Vec::new(),
            settings_path: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let settings_path = std::env::var(SETTINGS_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_SETTINGS_FILE));
        let mut config = Self::load_settings_file(&settings_path)?;
        config.settings_path = Some(settings_path);
        config.apply_env_overrides();
        Ok(config)
    }

    fn load_settings_file(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("settings file {} is not valid JSON", path.display()))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("CAMLPAD_TOPLEVEL") {
            if !path.trim().is_empty() {
                self.toplevel_path = PathBuf::from(path);
            }
        }
        if let Ok(args) = std::env::var("CAMLPAD_TOPLEVEL_ARGS") {
            self.toplevel_args = args.split_whitespace().map(str::to_string).collect();
        }
        if let Ok(dir) = std::env::var("CAMLPAD_TREE_MODELS") {
            if !dir.trim().is_empty() {
                self.tree_models_dir = PathBuf::from(dir);
            }
        }
        if let Some(flag) = env_bool("CAMLPAD_DRAW_TREES") {
            self.draw_trees = flag;
        }
        if let Some(flag) = env_bool("CAMLPAD_INDENT_ON_ENTER") {
            self.indent_on_enter = flag;
        }
        if let Some(unit) = env_usize("CAMLPAD_INDENT_UNIT") {
            self.indent_unit = unit;
        }
        if let Some(capacity) = env_usize("CAMLPAD_RECENT") {
            self.recent_capacity = capacity;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.toplevel_path.as_os_str().is_empty() {
            bail!("toplevel path is empty; set CAMLPAD_TOPLEVEL or the settings file");
        }
        if self.indent_unit == 0 || self.indent_unit > 16 {
            bail!(
                "indent unit {} is out of range (expected 1..=16)",
                self.indent_unit
            );
        }
        if self.recent_capacity == 0 {
            bail!("recent-files capacity must be at least 1");
        }
        Ok(())
    }

    /// Write mutable preferences back to the settings file. Best-effort for
    /// callers that do not want a failed write to interrupt the session.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.settings_path else {
            return Ok(());
        };
        let body = serde_json::to_string_pretty(self)?;
        std::fs::write(path, body)
            .with_context(|| format!("failed to write settings file {}", path.display()))
    }
}

fn env_bool(name: &str) -> Option<bool> {
    std::env::var(name).ok().and_then(|v| parse_bool_str(&v))
}

fn env_usize(name: &str) -> Option<usize> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
}
