//! Persistent editor preferences.

use dirs_next as dirs;
use serde::{Deserialize, Serialize};

use crate::editor::SupersetLinkMode;
use crate::model::WeightUnit;

const API_KEY_VAR: &str = "WORKOUT_STORE_API_KEY";

/// Resolve a file path under the config directory. Having no config
/// directory is an error so callers never report a save that did not happen.
pub(crate) fn require_config_path(
    path: Option<std::path::PathBuf>,
) -> std::io::Result<std::path::PathBuf> {
    path.ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "no config directory"))
}

fn default_store_url() -> String {
    "http://localhost:8080/v1".into()
}

/// User preferences stored as JSON in the config directory.
///
/// Every field is `#[serde(default)]` so files written by older versions
/// keep loading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EditorSettings {
    /// Unit given to newly added exercises.
    #[serde(default)]
    pub weight_unit: WeightUnit,
    #[serde(default)]
    pub superset_link_mode: SupersetLinkMode,
    #[serde(default = "default_store_url")]
    pub store_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub last_template_id: Option<String>,
}

impl EditorSettings {
    const FILE: &'static str = "workout_template_editor.json";

    pub fn path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|p| p.join(Self::FILE))
    }

    /// Load settings, falling back to defaults when the file is missing or
    /// cannot be parsed.
    pub fn load() -> Self {
        if let Some(path) = Self::path() {
            if let Ok(data) = std::fs::read_to_string(&path) {
                match serde_json::from_str(&data) {
                    Ok(cfg) => return cfg,
                    Err(e) => log::warn!("Ignoring unreadable settings {}: {e}", path.display()),
                }
            }
        }
        Self::default()
    }

    pub fn save(&self) -> std::io::Result<()> {
        let path = require_config_path(Self::path())?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, data)
    }

    /// API key to use for store requests. The environment variable wins over
    /// the stored key.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var(API_KEY_VAR).ok().or_else(|| self.api_key.clone())
    }
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            weight_unit: WeightUnit::Lbs,
            superset_link_mode: SupersetLinkMode::Overwrite,
            store_url: default_store_url(),
            api_key: None,
            last_template_id: None,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use std::env;
    use std::sync::Mutex;

    pub(crate) static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    /// Run `f` with the config directory pointed at a fresh temp dir.
    pub(crate) fn with_config_home<F: FnOnce()>(f: F) {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let prev = env::var_os("XDG_CONFIG_HOME");
        unsafe {
            env::set_var("XDG_CONFIG_HOME", dir.path());
        }
        f();
        match prev {
            Some(val) => unsafe { env::set_var("XDG_CONFIG_HOME", val) },
            None => unsafe { env::remove_var("XDG_CONFIG_HOME") },
        }
    }

    #[test]
    fn settings_roundtrip() {
        let s = EditorSettings {
            weight_unit: WeightUnit::Kg,
            superset_link_mode: SupersetLinkMode::AppendToChainEnd,
            store_url: "https://example.test/v1".into(),
            api_key: Some("secret".into()),
            last_template_id: Some("push-day".into()),
        };
        let json = serde_json::to_string(&s).unwrap();
        let loaded: EditorSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(s, loaded);
    }

    #[test]
    fn missing_config_dir_is_an_error() {
        let err = require_config_path(None).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
        let p = std::path::PathBuf::from("/tmp/x.json");
        assert_eq!(require_config_path(Some(p.clone())).unwrap(), p);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let loaded: EditorSettings = serde_json::from_str(r#"{"weight_unit": "kg"}"#).unwrap();
        assert_eq!(loaded.weight_unit, WeightUnit::Kg);
        assert_eq!(loaded.superset_link_mode, SupersetLinkMode::Overwrite);
        assert_eq!(loaded.store_url, default_store_url());
    }

    #[test]
    fn save_and_load_from_config_dir() {
        with_config_home(|| {
            let mut s = EditorSettings::default();
            s.weight_unit = WeightUnit::Kg;
            s.save().unwrap();
            assert_eq!(EditorSettings::load().weight_unit, WeightUnit::Kg);

            std::fs::write(EditorSettings::path().unwrap(), "not json").unwrap();
            assert_eq!(EditorSettings::load(), EditorSettings::default());
        });
    }

    #[test]
    fn env_var_overrides_stored_key() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let s = EditorSettings {
            api_key: Some("stored".into()),
            ..Default::default()
        };
        unsafe {
            env::set_var(API_KEY_VAR, "forced");
        }
        assert_eq!(s.resolve_api_key().as_deref(), Some("forced"));
        unsafe {
            env::remove_var(API_KEY_VAR);
        }
        assert_eq!(s.resolve_api_key().as_deref(), Some("stored"));
    }
}
