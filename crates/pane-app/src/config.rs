// SPDX-License-Identifier: CEPL-1.0
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct WindowCfg {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_title")]
    pub title: String,
    /// Index into the monitor list; the window goes fullscreen there.
    #[serde(default)]
    pub monitor: Option<usize>,
    #[serde(default = "default_count")]
    pub count: usize,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct RenderCfg {
    #[serde(default = "default_clear")]
    pub clear_color: [f32; 4],
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct AppCfg {
    #[serde(default)]
    pub window: WindowCfg,
    #[serde(default)]
    pub render: RenderCfg,
}

impl Default for WindowCfg {
    fn default() -> Self {
        WindowCfg {
            width: default_width(),
            height: default_height(),
            title: default_title(),
            monitor: None,
            count: default_count(),
        }
    }
}

impl Default for RenderCfg {
    fn default() -> Self {
        RenderCfg {
            clear_color: default_clear(),
        }
    }
}

fn default_width() -> u32 {
    1280
}
fn default_height() -> u32 {
    720
}
fn default_title() -> String {
    "pane".to_owned()
}
fn default_count() -> usize {
    1
}
fn default_clear() -> [f32; 4] {
    [0.02, 0.02, 0.04, 1.0]
}

pub fn parse_cfg(text: &str) -> Result<AppCfg, toml::de::Error> {
    toml::from_str::<AppCfg>(text)
}

/// Missing file or invalid contents fall back to defaults.
pub fn load_cfg(path: &Path) -> AppCfg {
    match fs::read_to_string(path) {
        Ok(s) => match parse_cfg(&s) {
            Ok(cfg) => {
                info!("loaded config from {}", path.display());
                cfg
            }
            Err(e) => {
                warn!("ignoring invalid config {}: {e}", path.display());
                AppCfg::default()
            }
        },
        Err(_) => AppCfg::default(),
    }
}

impl AppCfg {
    /// Command-line values win over the file.
    pub fn with_overrides(mut self, windows: Option<usize>, monitor: Option<usize>) -> Self {
        if let Some(n) = windows {
            self.window.count = n;
        }
        if monitor.is_some() {
            self.window.monitor = monitor;
        }
        self
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
