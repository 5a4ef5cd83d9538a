//! Plugin configuration file.
//!
//! Layering: defaults -> `<plugin dir>/fbw.toml` (optional) -> environment.

use crate::error::{XplmError, XplmResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const CONFIG_FILE: &str = "fbw.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// `error`, `warn`, `info`, `debug` or `trace`.
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub show_module: bool,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            show_module: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginConfig {
    #[serde(default)]
    pub log: LogConfig,
    /// Integer preferences answered to libraries that ask for them, by section then key.
    #[serde(default)]
    pub int_prefs: BTreeMap<String, BTreeMap<String, i32>>,
}

impl PluginConfig {
    pub fn from_toml_str(text: &str) -> XplmResult<Self> {
        toml::from_str(text).map_err(|e| XplmError::Config(format!("parse failed: {e}")))
    }

    /// Reads `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> XplmResult<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(XplmError::Config(format!(
                    "read failed: path={path:?} err={e}"
                )))
            }
        };
        Self::from_toml_str(&text)
            .map_err(|e| XplmError::Config(format!("path={path:?} {e}")))
    }

    /// File layer from [`CONFIG_FILE`] in `dir`, then the environment.
    pub fn load_layered(dir: &Path) -> XplmResult<Self> {
        let mut cfg = Self::load(&dir.join(CONFIG_FILE))?;
        cfg.apply_env(|key| std::env::var(key).ok());
        Ok(cfg)
    }

    /// `FBW_LOG` sets the level, `FBW_LOG_MODULE` (`0`/`1`) the module column.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(level) = var("FBW_LOG").filter(|v| !v.trim().is_empty()) {
            self.log.level = level.trim().to_ascii_lowercase();
        }
        if let Some(v) = var("FBW_LOG_MODULE") {
            self.log.show_module = v.trim() == "1";
        }
    }

    pub fn int_pref(&self, section: &str, key: &str) -> Option<i32> {
        self.int_prefs.get(section)?.get(key).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_log_and_int_prefs() {
        let cfg = PluginConfig::from_toml_str(
            r#"
            [log]
            level = "debug"

            [int_prefs.planes]
            clamp_all_to_ground = 1

            [int_prefs.debug]
            model_matching = 0
            "#,
        )
        .unwrap();
        assert_eq!(cfg.log.level, "debug");
        assert!(!cfg.log.show_module);
        assert_eq!(cfg.int_pref("planes", "clamp_all_to_ground"), Some(1));
        assert_eq!(cfg.int_pref("debug", "model_matching"), Some(0));
        assert_eq!(cfg.int_pref("debug", "log_level"), None);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let cfg = PluginConfig::load(Path::new("/nonexistent/fbw.toml")).unwrap();
        assert_eq!(cfg, PluginConfig::default());
        assert_eq!(cfg.log.level, "info");
    }

    #[test]
    fn bad_toml_is_a_config_error() {
        assert!(matches!(
            PluginConfig::from_toml_str("[log\nlevel="),
            Err(XplmError::Config(_))
        ));
    }

    #[test]
    fn environment_overrides_file() {
        let mut cfg = PluginConfig::from_toml_str("[log]\nlevel = \"warn\"\nshow_module = true").unwrap();
        cfg.apply_env(|k| match k {
            "FBW_LOG" => Some(" TRACE ".to_owned()),
            "FBW_LOG_MODULE" => Some("0".to_owned()),
            _ => None,
        });
        assert_eq!(cfg.log.level, "trace");
        assert!(!cfg.log.show_module);
    }
}
