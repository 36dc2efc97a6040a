use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::render::RenderPolicy;

#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub render: RenderConfig,
    pub zoom: ZoomConfig,
    pub host: HostConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    pub policy: RenderPolicy,
    pub dpi_base: f32,
    pub cache_entries: usize,
    pub background: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            policy: RenderPolicy::FitWindow,
            dpi_base: 96.0,
            cache_entries: 4,
            background: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ZoomConfig {
    pub step: f32,
    pub min: f32,
    pub max: f32,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            step: 1.2,
            min: 0.1,
            max: 10.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HostConfig {
    pub cell_px: (u16, u16),
}

impl Default for HostConfig {
    fn default() -> Self {
        Self { cell_px: (10, 20) }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl LogConfig {
    pub fn resolved_file(&self) -> PathBuf {
        self.file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("pvd.log"))
    }

    pub fn level_filter(&self) -> log::LevelFilter {
        self.level
            .parse::<log::LevelFilter>()
            .unwrap_or(log::LevelFilter::Info)
    }
}

impl Config {
    pub fn load() -> AppResult<Self> {
        let Some(path) = default_config_path() else {
            return Ok(Self::default());
        };
        Self::load_from_path(path)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        if !path.is_file() {
            return Err(AppError::invalid_argument(format!(
                "config path is not a regular file: {}",
                path.display()
            )));
        }

        let raw = fs::read_to_string(path).map_err(|source| {
            AppError::io_with_context(source, format!("failed to read config: {}", path.display()))
        })?;
        let parsed = toml::from_str::<Self>(&raw).map_err(|source| {
            AppError::invalid_argument(format!(
                "failed to parse config {}: {source}",
                path.display()
            ))
        })?;
        Ok(parsed.sanitized())
    }

    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !self.render.dpi_base.is_finite() || self.render.dpi_base <= 0.0 {
            self.render.dpi_base = defaults.render.dpi_base;
        }
        if !self.zoom.step.is_finite() || self.zoom.step <= 1.0 {
            self.zoom.step = defaults.zoom.step;
        }
        if !self.zoom.min.is_finite() || self.zoom.min <= 0.0 || self.zoom.min > 1.0 {
            self.zoom.min = defaults.zoom.min;
        }
        if !self.zoom.max.is_finite() || self.zoom.max < 1.0 {
            self.zoom.max = defaults.zoom.max;
        }
        self.host.cell_px = (self.host.cell_px.0.max(1), self.host.cell_px.1.max(1));
        self
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    if let Some(explicit) = std::env::var_os("PVD_CONFIG_PATH")
        && !explicit.is_empty()
    {
        return Some(PathBuf::from(explicit));
    }

    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME")
        && !xdg.is_empty()
    {
        return Some(PathBuf::from(xdg).join("pvd").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME")
        && !home.is_empty()
    {
        return Some(
            PathBuf::from(home)
                .join(".config")
                .join("pvd")
                .join("config.toml"),
        );
    }
    if let Some(appdata) = std::env::var_os("APPDATA")
        && !appdata.is_empty()
    {
        return Some(PathBuf::from(appdata).join("pvd").join("config.toml"));
    }
    None
}
