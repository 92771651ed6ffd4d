//! Configuration structures and loading logic.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::glyph::BatcherConfig;

/// Top-level configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub graphics: GraphicsConfig,
    pub debug: DebugConfig,
}

/// Window and presentation-target configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    /// Presentation target width in game pixels.
    pub width: u32,
    /// Presentation target height in game pixels.
    pub height: u32,
    /// Initial window size as a multiple of the presentation target.
    pub scale: u32,
    pub fullscreen: bool,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "blitcore".to_owned(),
            width: 320,
            height: 240,
            scale: 2,
            fullscreen: false,
            vsync: true,
        }
    }
}

impl WindowConfig {
    /// Returns `scale` clamped to at least 1.
    pub fn effective_scale(&self) -> u32 {
        self.scale.max(1)
    }
}

/// Graphics capability tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphicsTier {
    /// Native backends (Vulkan, Metal, DX12) with default limits.
    #[default]
    Standard,
    /// GL backend with WebGL2-level limits for older hardware.
    Compat,
}

/// Device and batching configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphicsConfig {
    pub tier: GraphicsTier,
    /// Number of vertex buffers rotated between flushes.
    pub vertex_buffer_slots: usize,
    /// Width and height of a glyph atlas page.
    pub atlas_size: u32,
    /// Frames a glyph may go undrawn before its atlas slot is reclaimed
    /// (0 = never).
    pub glyph_decay_ticks: u64,
    /// Atlas occupancy below which pages are merged (0.0–1.0).
    pub defrag_threshold: f32,
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            tier: GraphicsTier::default(),
            vertex_buffer_slots: 8,
            atlas_size: 256,
            glyph_decay_ticks: 1800,
            defrag_threshold: 0.5,
        }
    }
}

impl GraphicsConfig {
    /// Returns `vertex_buffer_slots` clamped to at least 1.
    pub fn effective_vertex_buffer_slots(&self) -> usize {
        self.vertex_buffer_slots.max(1)
    }

    /// Returns `defrag_threshold` clamped to [0.0, 1.0].
    pub fn effective_defrag_threshold(&self) -> f32 {
        self.defrag_threshold.clamp(0.0, 1.0)
    }

    pub fn batcher_config(&self) -> BatcherConfig {
        BatcherConfig {
            atlas_size: self.atlas_size.max(1),
            decay_ticks: self.glyph_decay_ticks,
            defrag_threshold: self.effective_defrag_threshold(),
        }
    }
}

/// Diagnostics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// `off`, `error`, `warn`, `info`, `debug` or `trace`.
    pub log_level: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
        }
    }
}

impl DebugConfig {
    /// Parsed log level. Unknown names fall back to `Info`.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

/// Return the platform-specific configuration directory.
pub fn config_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata).join("blitcore");
        }
        PathBuf::from(".").join("blitcore")
    }
    #[cfg(not(target_os = "windows"))]
    {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("blitcore");
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(".config").join("blitcore");
        }
        PathBuf::from(".").join("blitcore")
    }
}

/// Return the path to the config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

impl Config {
    /// Load config from the default path. Returns defaults if the file
    /// doesn't exist or can't be parsed.
    pub fn load() -> Self {
        let path = config_path();
        let data = match std::fs::read_to_string(&path) {
            Ok(d) => d,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("config: failed to read {}: {e}", path.display());
                }
                return Self::default();
            }
        };

        match toml::from_str(&data) {
            Ok(cfg) => {
                log::info!("config: loaded from {}", path.display());
                cfg
            }
            Err(e) => {
                log::warn!("config: parse error in {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Try to load config, returning an error message on failure.
    /// Unlike `load()`, this keeps "file missing" and "parse error" apart.
    pub fn try_load() -> Result<Self, String> {
        Self::try_load_from(&config_path())
    }

    pub fn try_load_from(path: &Path) -> Result<Self, String> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
        toml::from_str(&data).map_err(|e| format!("parse error in {}: {e}", path.display()))
    }

    /// Save config to the default path. Creates the directory if needed.
    pub fn save(&self) -> Result<PathBuf, String> {
        let path = config_path();
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .map_err(|e| format!("failed to create dir {}: {e}", dir.display()))?;
        }
        let data = toml::to_string_pretty(self).map_err(|e| format!("serialize error: {e}"))?;
        std::fs::write(path, data).map_err(|e| format!("failed to write {}: {e}", path.display()))?;
        log::info!("config: saved to {}", path.display());
        Ok(())
    }
}
