use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::tensor::DISPLAY_LIMIT;
use crate::warning;

const SETTINGS_KEY: &str = "cntkread";
const DISPLAY_LIMIT_ENV: &str = "CNTKREAD_DISPLAY_LIMIT";

/// Reader options, loaded from the `cntkread` object of a JSON file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Element limit for rendered tensor contents.
    pub display_limit: usize,
    /// Render initializer contents in summaries.
    pub include_values: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            display_limit: DISPLAY_LIMIT,
            include_values: false,
        }
    }
}

impl Settings {
    /// Defaults, overlaid by `path` when given, then by the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(settings.with_env_overrides())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read settings file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parse settings file {}", path.display()))
    }

    /// A missing `cntkread` key yields the defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(text)?;
        match root.get(SETTINGS_KEY) {
            Some(section) => Ok(Self::deserialize(section)?),
            None => Ok(Self::default()),
        }
    }

    pub fn with_env_overrides(self) -> Self {
        self.with_display_limit(env::var(DISPLAY_LIMIT_ENV).ok().as_deref())
    }

    fn with_display_limit(mut self, raw: Option<&str>) -> Self {
        if let Some(raw) = raw {
            match raw.trim().parse::<usize>() {
                Ok(limit) => self.display_limit = limit,
                Err(_) => warning!("settings: ignoring {}={:?}", DISPLAY_LIMIT_ENV, raw),
            }
        }
        self
    }
}
