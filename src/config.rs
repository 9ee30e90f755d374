//! Panel configuration file handling.
//!
//! Loads configuration from `~/.config/picam-panel/config.toml` or a custom
//! path: media directories, preview geometry, external tool names, and where
//! the settings record lives.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration file structure for picam-panel.
/// Loaded from ~/.config/picam-panel/config.toml (or custom path via --config).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PanelConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Where stills and timelapse shots are written.
    #[serde(default = "default_pictures_dir")]
    pub pictures_dir: PathBuf,
    /// Where videos are written.
    #[serde(default = "default_videos_dir")]
    pub videos_dir: PathBuf,
    /// Scratch directory the preview stream drops frames into.
    #[serde(default = "default_frame_dir")]
    pub frame_dir: PathBuf,
    /// The persisted settings record.
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        PathsConfig {
            pictures_dir: default_pictures_dir(),
            videos_dir: default_videos_dir(),
            frame_dir: default_frame_dir(),
            state_file: default_state_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    #[serde(default = "default_preview_width")]
    pub width: i32,
    #[serde(default = "default_preview_height")]
    pub height: i32,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        PreviewConfig {
            width: default_preview_width(),
            height: default_preview_height(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Still capture tool, also used for timelapse bursts.
    #[serde(default = "default_still_tool")]
    pub still: String,
    /// Video tool, also used for the preview stream.
    #[serde(default = "default_video_tool")]
    pub video: String,
    /// One-shot tool used for the startup camera probe.
    #[serde(default = "default_probe_tool")]
    pub probe: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        ToolsConfig {
            still: default_still_tool(),
            video: default_video_tool(),
            probe: default_probe_tool(),
        }
    }
}

fn default_pictures_dir() -> PathBuf {
    dirs::picture_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn default_videos_dir() -> PathBuf {
    dirs::video_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn default_frame_dir() -> PathBuf {
    // /run/shm keeps the preview stream off flash storage on the Pi.
    let shm = PathBuf::from("/run/shm");
    if shm.is_dir() {
        shm
    } else {
        std::env::temp_dir().join("picam-panel-frames")
    }
}

fn default_state_file() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("picam-panel")
        .join("settings.txt")
}

fn default_preview_width() -> i32 {
    800
}

fn default_preview_height() -> i32 {
    600
}

fn default_still_tool() -> String {
    "libcamera-still".to_string()
}

fn default_video_tool() -> String {
    "libcamera-vid".to_string()
}

fn default_probe_tool() -> String {
    "libcamera-jpeg".to_string()
}

impl PanelConfig {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
                path: path.clone(),
                source: e,
            })?;
            let config: PanelConfig =
                toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                    path: path.clone(),
                    source: e,
                })?;
            Ok(config)
        } else {
            Ok(PanelConfig::default())
        }
    }

    /// Load from an explicitly requested path; the file must exist.
    pub fn load_from_explicit(path: PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound { path });
        }
        PanelConfig::load(Some(&path))
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    NotFound {
        path: PathBuf,
    },
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound { path } => {
                write!(f, "Config file '{}' does not exist", path.display())
            }
            ConfigError::IoError { path, source } => {
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::ParseError { path, source } => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::NotFound { .. } => None,
            ConfigError::IoError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
        }
    }
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        })
        .join("picam-panel")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = PanelConfig::load(Some(Path::new("/nonexistent/picam-panel.toml"))).unwrap();
        assert_eq!(config.preview.width, 800);
        assert_eq!(config.preview.height, 600);
        assert_eq!(config.tools.still, "libcamera-still");
        assert_eq!(config.tools.video, "libcamera-vid");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[preview]\nwidth = 640\nheight = 480\n").unwrap();
        let config = PanelConfig::load(Some(&path)).unwrap();
        assert_eq!(config.preview.width, 640);
        assert_eq!(config.preview.height, 480);
        assert_eq!(config.tools.probe, "libcamera-jpeg");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "not valid toml [[").unwrap();
        let err = PanelConfig::load(Some(&path)).unwrap_err();
        assert!(format!("{}", err).contains("parse"));
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let err = PanelConfig::load_from_explicit(PathBuf::from("/nonexistent/picam-panel.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn test_tool_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[tools]\nstill = \"rpicam-still\"\n").unwrap();
        let config = PanelConfig::load(Some(&path)).unwrap();
        assert_eq!(config.tools.still, "rpicam-still");
        assert_eq!(config.tools.video, "libcamera-vid");
    }
}
