//! View transform between screen pixels and world units, plus inertial
//! keyboard panning.

use bevy::prelude::*;

use crate::canvas::Similarity;
use crate::config::CameraConfig;

/// Lowest zoom the camera will ever accept, whatever the configuration says.
const ZOOM_FLOOR: f32 = 1e-3;

const PAN_ACCELERATION: f32 = 2.0;
const PAN_DAMPING: f32 = 0.85;
const PAN_REST_SPEED: f32 = 0.01;

/// Drawing applies `translate(x, y)` then `scale(zoom)`; picking inverts it.
#[derive(Resource, Clone, Debug, PartialEq)]
pub struct ViewCamera {
    /// Screen position of the world origin.
    pub x: f32,
    pub y: f32,
    zoom: f32,
    min_zoom: f32,
    max_zoom: f32,
}

impl Default for ViewCamera {
    fn default() -> Self {
        Self::new(Vec2::ZERO, &CameraConfig::default())
    }
}

impl ViewCamera {
    pub fn new(origin: Vec2, config: &CameraConfig) -> Self {
        let mut camera = Self {
            x: origin.x,
            y: origin.y,
            zoom: 1.0,
            min_zoom: 1.0,
            max_zoom: 1.0,
        };
        camera.set_zoom_limits(config.min_zoom, config.max_zoom);
        camera
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.x = position.x;
        self.y = position.y;
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn zoom_limits(&self) -> (f32, f32) {
        (self.min_zoom, self.max_zoom)
    }

    /// Re-clamps the current zoom into the new range.
    pub fn set_zoom_limits(&mut self, min_zoom: f32, max_zoom: f32) {
        let min_zoom = if min_zoom.is_finite() {
            min_zoom.max(ZOOM_FLOOR)
        } else {
            ZOOM_FLOOR
        };
        let max_zoom = if max_zoom.is_finite() {
            max_zoom.max(min_zoom)
        } else {
            min_zoom
        };
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self.zoom = self.zoom.clamp(min_zoom, max_zoom);
    }

    pub fn transform(&self) -> Similarity {
        Similarity::new(self.position(), self.zoom)
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        self.transform().inverse_apply(screen)
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        self.transform().apply(world)
    }

    /// Zooms by `factor` keeping the world point under `screen` in place.
    pub fn zoom_at(&mut self, screen: Vec2, factor: f32) {
        if !factor.is_finite() {
            return;
        }
        let anchor = self.screen_to_world(screen);
        self.zoom = (self.zoom * factor).clamp(self.min_zoom, self.max_zoom);
        self.x = screen.x - anchor.x * self.zoom;
        self.y = screen.y - anchor.y * self.zoom;
    }

    pub fn pan(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PanDirection {
    Up,
    Down,
    Left,
    Right,
}

impl PanDirection {
    pub const ALL: [PanDirection; 4] = [
        PanDirection::Up,
        PanDirection::Down,
        PanDirection::Left,
        PanDirection::Right,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Screen-space unit vector, y down.
    fn unit(self) -> Vec2 {
        match self {
            PanDirection::Up => Vec2::NEG_Y,
            PanDirection::Down => Vec2::Y,
            PanDirection::Left => Vec2::NEG_X,
            PanDirection::Right => Vec2::X,
        }
    }
}

/// Held direction keys plus the velocity they build up.
#[derive(Resource, Clone, Debug, Default)]
pub struct KeyboardPan {
    held: [bool; 4],
    velocity: Vec2,
}

impl KeyboardPan {
    pub fn press(&mut self, direction: PanDirection) {
        self.held[direction.index()] = true;
    }

    pub fn release(&mut self, direction: PanDirection) {
        self.held[direction.index()] = false;
    }

    pub fn release_all(&mut self) {
        self.held = [false; 4];
    }

    pub fn is_held(&self, direction: PanDirection) -> bool {
        self.held[direction.index()]
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// One frame of inertial panning. The view moves in the held direction,
    /// so the world origin moves the opposite way on screen.
    pub fn update(&mut self, camera: &mut ViewCamera) {
        let input: Vec2 = PanDirection::ALL
            .into_iter()
            .filter(|d| self.is_held(*d))
            .map(PanDirection::unit)
            .sum();
        self.velocity += input * PAN_ACCELERATION;
        self.velocity *= PAN_DAMPING;
        if input == Vec2::ZERO && self.velocity.length() < PAN_REST_SPEED {
            self.velocity = Vec2::ZERO;
            return;
        }
        camera.pan(-self.velocity / camera.zoom());
    }
}
