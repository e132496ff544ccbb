use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use facescope_core::detection::infrastructure::gemini_config::DEFAULT_MODEL;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub camera_index: u32,
    #[serde(default = "default_period_ms")]
    pub period_ms: u64,
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_period_ms() -> u64 {
    2000
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            camera_index: 0,
            period_ms: default_period_ms(),
            model: default_model(),
        }
    }
}

impl Settings {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("FaceScope").join("settings.json"))
    }

    pub fn load() -> Self {
        Self::config_path()
            .and_then(|path| fs::read_to_string(path).ok())
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default()
    }

    pub fn save(&self) {
        if let Some(path) = Self::config_path() {
            if let Some(parent) = path.parent() {
                let _ = fs::create_dir_all(parent);
            }
            if let Ok(json) = serde_json::to_string_pretty(self) {
                let _ = fs::write(path, json);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_round_trip() {
        let settings = Settings {
            camera_index: 2,
            period_ms: 1500,
            model: "gemini-2.5-pro".to_string(),
        };
        let json = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.camera_index, 2);
        assert_eq!(back.period_ms, 1500);
        assert_eq!(back.model, "gemini-2.5-pro");
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let back: Settings = serde_json::from_str(r#"{"camera_index":1}"#).unwrap();
        assert_eq!(back.camera_index, 1);
        assert_eq!(back.period_ms, 2000);
        assert_eq!(back.model, DEFAULT_MODEL);
    }
}
