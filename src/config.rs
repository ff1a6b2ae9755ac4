//! Driver configuration and on-disk locations.
//!
//! Config locations:
//! - Linux: ~/.config/cdn_explorer/config.json
//! - Windows: %APPDATA%\cdn_explorer\config.json
//! - MacOS: ~/Library/Application Support/cdn_explorer/config.json

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::clock::Millis;
use crate::content::QuestionBank;
use crate::error::{ExplorerError, Result};

fn default_frame_ms() -> Millis {
    50
}

fn default_speed() -> f32 {
    1.0
}

fn default_log_filter() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorerConfig {
    /// Virtual time between emitted frames.
    #[serde(default = "default_frame_ms")]
    pub frame_ms: Millis,

    /// Pace frames against the wall clock instead of replaying instantly.
    #[serde(default)]
    pub realtime: bool,

    /// Wall-clock speed multiplier when `realtime` is set.
    #[serde(default = "default_speed")]
    pub speed: f32,

    /// Emit frames as JSON lines.
    #[serde(default)]
    pub json: bool,

    /// `tracing` filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Replacement question bank (JSON array of questions).
    #[serde(default)]
    pub question_bank: Option<PathBuf>,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            frame_ms: default_frame_ms(),
            realtime: false,
            speed: default_speed(),
            json: false,
            log_filter: default_log_filter(),
            question_bank: None,
        }
    }
}

impl ExplorerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: ExplorerConfig = serde_json::from_str(json)?;
        Ok(cfg.sanitized())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Explicit path if given, else the per-user config file if present, else defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match AppPaths::new().map(|p| p.config_file()) {
            Ok(path) if path.exists() => Self::load(&path),
            Ok(_) => Ok(Self::default()),
            Err(e) => {
                warn!("{e}; using default configuration");
                Ok(Self::default())
            }
        }
    }

    /// Clamp out-of-range values instead of failing.
    pub fn sanitized(mut self) -> Self {
        let frame_ms = self.frame_ms.clamp(1, 1_000);
        if frame_ms != self.frame_ms {
            warn!(requested = self.frame_ms, used = frame_ms, "frame_ms clamped");
            self.frame_ms = frame_ms;
        }
        let speed = if self.speed.is_finite() {
            self.speed.clamp(0.1, 100.0)
        } else {
            default_speed()
        };
        if speed != self.speed {
            warn!(requested = self.speed, used = speed, "speed clamped");
            self.speed = speed;
        }
        if self.log_filter.trim().is_empty() {
            self.log_filter = default_log_filter();
        }
        self
    }

    pub fn question_bank(&self) -> Result<QuestionBank> {
        match &self.question_bank {
            Some(path) => QuestionBank::load(path),
            None => Ok(QuestionBank::builtin()),
        }
    }
}

/// Cross-platform application paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
}

impl AppPaths {
    pub fn new() -> Result<Self> {
        let base = dirs::config_dir().ok_or_else(|| {
            ExplorerError::InvalidArgument("could not determine config directory".to_string())
        })?;
        Ok(Self {
            config_dir: base.join("cdn_explorer"),
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let cfg = ExplorerConfig::from_json_str("{}").expect("valid config");
        assert_eq!(cfg, ExplorerConfig::default());
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let cfg = ExplorerConfig::from_json_str(
            r#"{"frame_ms": 0, "speed": 1000.0, "log_filter": "  "}"#,
        )
        .expect("valid config");
        assert_eq!(cfg.frame_ms, 1);
        assert_eq!(cfg.speed, 100.0);
        assert_eq!(cfg.log_filter, "info");
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            ExplorerConfig::from_json_str("{frame_ms: 5"),
            Err(ExplorerError::Json(_))
        ));
    }

    #[test]
    fn missing_question_bank_file_is_io_error() {
        let cfg = ExplorerConfig {
            question_bank: Some(PathBuf::from("/nonexistent/cdn_explorer/questions.json")),
            ..ExplorerConfig::default()
        };
        assert!(matches!(cfg.question_bank(), Err(ExplorerError::Io(_))));
        assert_eq!(ExplorerConfig::default().question_bank().ok(), Some(QuestionBank::builtin()));
    }
}
