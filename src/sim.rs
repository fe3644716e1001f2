use bevy::prelude::*;
use bevy::window::{PrimaryWindow, WindowResized};

use crate::config::load_settings;
use crate::interaction::InteractionState;
use crate::particles::ParticleSystem;
use crate::physics::{BodyDesc, BodyHandle, BodyShape, BodyTag, PhysicsWorld};
use crate::PlaygroundSet;

const WALL_THICKNESS: f32 = 100.0;

/// Removes everything the user made, keeping the boundary.
#[derive(Event, Default)]
pub struct ClearWorld;

/// Static walls enclosing `[-w/2, w/2] x [-h/2, h/2]`, sized to the window.
#[derive(Resource, Debug, Default)]
pub struct WorldBoundary {
    bodies: Vec<BodyHandle>,
    size: Vec2,
}

impl WorldBoundary {
    pub fn bodies(&self) -> &[BodyHandle] {
        &self.bodies
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// Top edge of the floor.
    pub fn floor_y(&self) -> f32 {
        self.size.y * 0.5
    }

    /// Swaps the walls for ones matching `size`. A degenerate size keeps the
    /// current walls.
    pub fn rebuild(&mut self, world: &mut PhysicsWorld, size: Vec2) -> bool {
        if !(size.x > 0.0 && size.y > 0.0) {
            return false;
        }
        for body in self.bodies.drain(..) {
            world.remove_body(body);
        }
        let half = size * 0.5;
        let t = WALL_THICKNESS;
        let wide = size.x + 2.0 * t;
        let walls = [
            (Vec2::new(0.0, half.y + t * 0.5), Vec2::new(wide, t), true),
            (Vec2::new(0.0, -half.y - t * 0.5), Vec2::new(wide, t), false),
            (Vec2::new(-half.x - t * 0.5, 0.0), Vec2::new(t, size.y), false),
            (Vec2::new(half.x + t * 0.5, 0.0), Vec2::new(t, size.y), false),
        ];
        self.bodies = walls
            .into_iter()
            .map(|(center, extent, ground)| {
                let shape = BodyShape::Rect {
                    width: extent.x,
                    height: extent.y,
                };
                world.spawn_body(&BodyDesc {
                    is_static: true,
                    friction: 0.5,
                    tag: BodyTag {
                        ground,
                        ..BodyTag::default()
                    },
                    ..BodyDesc::new(shape, center)
                })
            })
            .collect();
        self.size = size;
        true
    }

    pub fn clear(&self, world: &mut PhysicsWorld, particles: &mut ParticleSystem) {
        world.clear_except(&self.bodies);
        particles.clear();
    }
}

pub struct SimPlugin;
impl Plugin for SimPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PhysicsWorld>()
            .init_resource::<ParticleSystem>()
            .init_resource::<WorldBoundary>()
            .add_event::<ClearWorld>()
            .add_systems(Startup, build_initial_boundary.after(load_settings))
            .add_systems(
                Update,
                (resize_boundary, handle_clear).in_set(PlaygroundSet::Input),
            );
    }
}

fn apply_size(
    size: Vec2,
    world: &mut PhysicsWorld,
    boundary: &mut WorldBoundary,
    particles: &mut ParticleSystem,
) {
    if boundary.rebuild(world, size) {
        particles.set_floor(boundary.floor_y());
        info!("boundary rebuilt for {}x{}", size.x, size.y);
    }
}

fn build_initial_boundary(
    windows: Query<&Window, With<PrimaryWindow>>,
    mut world: ResMut<PhysicsWorld>,
    mut boundary: ResMut<WorldBoundary>,
    mut particles: ResMut<ParticleSystem>,
) {
    let Ok(window) = windows.get_single() else {
        return;
    };
    apply_size(window.size(), &mut world, &mut boundary, &mut particles);
}

fn resize_boundary(
    mut resized: EventReader<WindowResized>,
    mut world: ResMut<PhysicsWorld>,
    mut boundary: ResMut<WorldBoundary>,
    mut particles: ResMut<ParticleSystem>,
) {
    // Only the final size of a burst of resize events matters.
    let Some(last) = resized.read().last() else {
        return;
    };
    let size = Vec2::new(last.width, last.height);
    if size == boundary.size() {
        return;
    }
    apply_size(size, &mut world, &mut boundary, &mut particles);
}

fn handle_clear(
    mut ev_clear: EventReader<ClearWorld>,
    mut interaction: ResMut<InteractionState>,
    mut world: ResMut<PhysicsWorld>,
    boundary: Res<WorldBoundary>,
    mut particles: ResMut<ParticleSystem>,
) {
    if ev_clear.is_empty() {
        return;
    }
    ev_clear.clear();

    interaction.cancel(&mut world);
    boundary.clear(&mut world, &mut particles);
    info!("world cleared, {} boundary bodies kept", boundary.bodies().len());
}
