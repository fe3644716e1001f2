//! Settings produced by the control panels and, optionally, a JSON file.

use std::path::{Path, PathBuf};

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Environment variable naming an optional JSON settings file.
pub const CONFIG_ENV: &str = "KINET_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    #[default]
    Box,
    Circle,
    Triangle,
    Pentagon,
    Hexagon,
    /// Built as a pentagon; there is no star outline yet.
    Star,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 6] = [
        ShapeKind::Box,
        ShapeKind::Circle,
        ShapeKind::Triangle,
        ShapeKind::Pentagon,
        ShapeKind::Hexagon,
        ShapeKind::Star,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ShapeKind::Box => "Box",
            ShapeKind::Circle => "Circle",
            ShapeKind::Triangle => "Triangle",
            ShapeKind::Pentagon => "Pentagon",
            ShapeKind::Hexagon => "Hexagon",
            ShapeKind::Star => "Star",
        }
    }
}

/// What a Move-tool click on empty space (or a slingshot release) creates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    pub shape: ShapeKind,
    pub size: f32,
    pub density: f32,
    pub restitution: f32,
    /// Fill hue in degrees.
    pub hue: f32,
    pub is_static: bool,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            shape: ShapeKind::Box,
            size: 50.0,
            density: 0.001,
            restitution: 0.6,
            hue: rand::thread_rng().gen_range(0.0..360.0),
            is_static: false,
        }
    }
}

impl SpawnConfig {
    pub fn color(&self) -> Color {
        Color::hsl(self.hue.rem_euclid(360.0), 0.7, 0.6)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub gravity_x: f32,
    pub gravity_y: f32,
    pub time_scale: f32,
    pub running: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity_x: 0.0,
            gravity_y: 1.0,
            time_scale: 1.0,
            running: true,
        }
    }
}

impl WorldConfig {
    pub fn gravity(&self) -> Vec2 {
        Vec2::new(self.gravity_x, self.gravity_y)
    }
}

/// Springs made by the Connect tool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringConfig {
    pub stiffness: f32,
    pub damping: f32,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            stiffness: 60.0,
            damping: 2.0,
        }
    }
}

/// The temporary constraint that pulls a dragged body towards the pointer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    pub stiffness: f32,
    pub damping: f32,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            stiffness: 600.0,
            damping: 40.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Zoom factor applied per wheel notch.
    pub zoom_step: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.02,
            max_zoom: 10.0,
            zoom_step: 1.1,
        }
    }
}

#[derive(Resource, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub spawn: SpawnConfig,
    pub world: WorldConfig,
    pub spring: SpringConfig,
    pub drag: DragConfig,
    pub camera: CameraConfig,
}

impl Settings {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

pub fn load_settings(mut settings: ResMut<Settings>) {
    let Some(path) = std::env::var_os(CONFIG_ENV).map(PathBuf::from) else {
        info!("no {CONFIG_ENV} set, using default settings");
        return;
    };
    match Settings::load(&path) {
        Ok(loaded) => {
            info!("loaded settings from {}", path.display());
            *settings = loaded;
        }
        Err(err) => warn!("{err}; using default settings"),
    }
}
