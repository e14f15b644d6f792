//! Configuration file management
//!
//! Loads TOML configuration files and provides application settings.
//! Default config path: ~/.config/tzbanner/config.toml

#![allow(dead_code)]

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveTime};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{
    DEFAULT_DATETIME_FORMAT, DEFAULT_LINE_HEIGHT, DEFAULT_TEXT, DEFAULT_TEXT_BACKGROUND,
    DEFAULT_TEXT_COLOR, EXPORT_FILE_PREFIX,
};
use crate::datetime::host_zone_or_fallback;
use crate::utils::ColorRGBA;

/// Environment variable overriding the config path
pub const CONFIG_ENV: &str = "TZBANNER_CONFIG";

/// Application settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Font discovery
    pub fonts: FontsConfig,
    /// Defaults for new text elements
    pub text: TextConfig,
    /// Defaults for new date/time elements
    pub datetime: DateTimeConfig,
    /// Canvas background
    pub canvas: CanvasConfig,
    /// Export destination
    pub export: ExportConfig,
    /// Elements drawn over the background, bottom first
    pub layers: Vec<LayerConfig>,
}

/// Font settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontsConfig {
    /// Extra directories searched (recursively) for font files
    pub directories: Vec<String>,
    /// Also index the platform font directories
    pub system: bool,
    /// Default font: file path or file stem (first font found if empty)
    pub default: String,
}

/// Text element defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    /// Line height in pixels
    pub line_height: f32,
    /// Text color (RRGGBBAA)
    pub color: ColorRGBA,
    /// Background behind the text (RRGGBBAA)
    pub background: ColorRGBA,
}

/// Date/time element defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateTimeConfig {
    /// Format string using the custom tokens (see --formats)
    pub format: String,
    /// Lowercase AM/PM in the output
    pub lowercase_am_pm: bool,
    /// Zones listed, one line each (reference zone only if empty)
    pub zones: Vec<String>,
    /// Zone the entered time is interpreted in ($TZ, then UTC, if empty)
    pub reference_zone: String,
}

/// Canvas settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Background image path; a solid canvas is used if empty
    pub background: String,
    /// Background image scale factor
    pub scale: f32,
    /// Solid canvas width
    pub width: u32,
    /// Solid canvas height
    pub height: u32,
    /// Solid canvas color (RRGGBBAA)
    pub color: ColorRGBA,
}

/// Export settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Output directory (~ is expanded)
    pub directory: String,
    /// File name prefix; a timestamp is appended
    pub file_prefix: String,
}

/// Layer kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Image,
    #[default]
    Text,
    DateTime,
}

/// One element of the declarative scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerConfig {
    pub kind: LayerKind,
    pub x: i32,
    pub y: i32,
    /// Display size; native size if unset
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Color modulation (RRGGBBAA)
    pub color: ColorRGBA,

    // image
    pub path: String,
    pub scale: f32,

    // text and datetime
    pub text: String,
    /// Font path or name; default font if empty
    pub font: String,
    pub line_height: Option<f32>,
    pub text_color: Option<ColorRGBA>,
    pub background: Option<ColorRGBA>,

    // datetime
    pub format: Option<String>,
    pub zones: Vec<String>,
    pub reference_zone: Option<String>,
    pub lowercase_am_pm: Option<bool>,
    /// YYYY-MM-DD; today if empty
    pub date: String,
    /// HH:MM or HH:MM:SS; now if empty
    pub time: String,
}

impl Default for FontsConfig {
    fn default() -> Self {
        Self {
            directories: Vec::new(),
            system: true,
            default: String::new(),
        }
    }
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            line_height: DEFAULT_LINE_HEIGHT,
            color: DEFAULT_TEXT_COLOR,
            background: DEFAULT_TEXT_BACKGROUND,
        }
    }
}

impl Default for DateTimeConfig {
    fn default() -> Self {
        Self {
            format: DEFAULT_DATETIME_FORMAT.to_string(),
            lowercase_am_pm: true,
            zones: Vec::new(),
            reference_zone: String::new(),
        }
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            background: String::new(),
            scale: 1.0,
            width: 800,
            height: 200,
            color: ColorRGBA::BLACK,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            // Use ~ to be expanded at runtime
            directory: "~".to_string(),
            file_prefix: EXPORT_FILE_PREFIX.to_string(),
        }
    }
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            kind: LayerKind::default(),
            x: 0,
            y: 0,
            width: None,
            height: None,
            color: ColorRGBA::WHITE,
            path: String::new(),
            scale: 1.0,
            text: DEFAULT_TEXT.to_string(),
            font: String::new(),
            line_height: None,
            text_color: None,
            background: None,
            format: None,
            zones: Vec::new(),
            reference_zone: None,
            lowercase_am_pm: None,
            date: String::new(),
            time: String::new(),
        }
    }
}

impl LayerConfig {
    /// Parsed `date` field; None if empty
    pub fn parsed_date(&self) -> Result<Option<NaiveDate>> {
        let date = self.date.trim();
        if date.is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map(Some)
            .with_context(|| format!("Invalid layer date '{}' (expected YYYY-MM-DD)", date))
    }

    /// Parsed `time` field; None if empty
    pub fn parsed_time(&self) -> Result<Option<NaiveTime>> {
        let time = self.time.trim();
        if time.is_empty() {
            return Ok(None);
        }
        NaiveTime::parse_from_str(time, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M"))
            .map(Some)
            .with_context(|| format!("Invalid layer time '{}' (expected HH:MM[:SS])", time))
    }
}

impl Config {
    /// Get the path that would be used for loading config
    /// Returns None if using built-in defaults
    pub fn config_path() -> Option<PathBuf> {
        // 1. TZBANNER_CONFIG environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let p = Path::new(&path);
            if p.exists() {
                return Some(p.to_path_buf());
            }
            warn!("{} points to a missing file: {}", CONFIG_ENV, path);
        }

        // 2. User config: ~/.config/tzbanner/config.toml
        Self::user_config_path().filter(|p| p.exists())
    }

    /// ~/.config/tzbanner/config.toml, whether or not it exists
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tzbanner").join("config.toml"))
    }

    /// Load configuration with priority:
    /// 1. TZBANNER_CONFIG environment variable
    /// 2. ~/.config/tzbanner/config.toml
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            match Self::load_from_file(&path) {
                Ok(config) => {
                    info!("Loaded config: {}", path.display());
                    return config;
                }
                Err(e) => {
                    warn!("Failed to load config {}: {:#}", path.display(), e);
                }
            }
        }
        info!("Using built-in default config");
        Self::default()
    }

    /// Load settings from specified path
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Write the commented default config to the user config path
    pub fn write_default(force: bool) -> Result<PathBuf> {
        let path = Self::user_config_path()
            .ok_or_else(|| anyhow::anyhow!("Config directory not found"))?;
        Self::write_default_to(&path, force)?;
        Ok(path)
    }

    pub fn write_default_to(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            bail!("{} already exists (use --force to overwrite)", path.display());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(path, DEFAULT_CONFIG_TEMPLATE)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Font directories with ~ expanded
    pub fn font_directories(&self) -> Vec<PathBuf> {
        self.fonts
            .directories
            .iter()
            .map(|d| PathBuf::from(expand_path(d, None)))
            .collect()
    }

    /// Configured reference zone, or the host zone
    pub fn reference_zone(&self) -> String {
        let zone = self.datetime.reference_zone.trim();
        if zone.is_empty() {
            host_zone_or_fallback()
        } else {
            zone.to_string()
        }
    }

    pub fn export_directory(&self) -> PathBuf {
        PathBuf::from(expand_path(&self.export.directory, None))
    }
}

/// Expand a leading `~` to the home directory
pub fn expand_path(path: &str, user_home: Option<&str>) -> String {
    if !path.starts_with('~') {
        return path.to_string();
    }

    // Get home directory: prefer provided value, fallback to dirs
    let home = user_home
        .map(|h| h.to_string())
        .or_else(|| dirs::home_dir().map(|p| p.to_string_lossy().to_string()));

    match home {
        Some(home) if path == "~" => home,
        Some(home) => format!("{}{}", home, &path[1..]),
        None => path.to_string(),
    }
}

/// Written by `--init-config`
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# tzbanner configuration
# Location: ~/.config/tzbanner/config.toml (override with TZBANNER_CONFIG)
# Colors are hex RRGGBBAA (RRGGBB is opaque, # optional)

[fonts]
# Extra directories searched recursively for font files
# directories = ["~/fonts"]
# Also index the platform font directories
system = true
# Default font: file path or file name without extension
default = ""

[text]
line_height = 60.0
color = "ffffffff"
background = "00000000"

[datetime]
# Tokens: run `tzbanner --formats` for the full list
format = "hh:mmap TMZCITY"
lowercase_am_pm = true
# One output line per zone; empty lists the reference zone only
zones = []
# Zone the layer date/time is entered in ($TZ, then UTC, when empty)
reference_zone = ""

[canvas]
# Background image; a solid canvas of width x height is used when empty
background = ""
scale = 1.0
width = 800
height = 200
color = "000000ff"

[export]
directory = "~"
file_prefix = "banner"

# Layers are drawn in order, later on top.
#
# [[layers]]
# kind = "image"
# path = "~/Pictures/logo.png"
# scale = 0.5
# x = 10
# y = 10
#
# [[layers]]
# kind = "text"
# text = "Standup"
# font = "DejaVuSans"
# line_height = 48.0
# text_color = "ffcc00ff"
# x = 20
# y = 20
#
# [[layers]]
# kind = "datetime"
# format = "DW hh:mmap TMZCITY"
# zones = ["America/New_York", "Europe/London", "Asia/Tokyo"]
# reference_zone = "Europe/London"
# date = "2024-06-03"
# time = "15:00"
# x = 20
# y = 80
"#;
