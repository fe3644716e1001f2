//! Per-frame pipeline: step the simulation, then paint it back to front.

use std::f32::consts::TAU;

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::{egui, EguiContexts};

use crate::camera::ViewCamera;
use crate::canvas::{Canvas, EguiCanvas, Similarity, Stroke};
use crate::config::{Settings, WorldConfig};
use crate::interaction::InteractionState;
use crate::particles::ParticleSystem;
use crate::physics::{BodyView, PhysicsWorld};
use crate::PlaygroundSet;

pub const GRID_BASE_SPACING: f32 = 50.0;
/// Screen spacing below which the grid is not worth drawing.
pub const GRID_MIN_SPACING: f32 = 8.0;
pub const POP_IN_SECONDS: f32 = 0.3;
pub const COIL_SEGMENTS: usize = 12;
pub const COIL_AMPLITUDE: f32 = 6.0;
const COIL_CAP_RADIUS: f32 = 4.0;
const PARTICLE_SIZE: f32 = 4.0;
const SPARKS_PER_IMPACT: usize = 3;
const GIZMO_DASH: f32 = 6.0;

#[derive(Resource, Clone, Debug)]
pub struct Renderer {
    pub background: Color,
    pub grid: Color,
    pub outline: Color,
    pub static_fill: Color,
    pub hover: Color,
    pub spring: Color,
    pub gizmo_valid: Color,
    pub gizmo_idle: Color,
    pub aim: Color,
    pub drag_line: Color,
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            background: Color::srgb_u8(0x1a, 0x1a, 0x1a),
            grid: Color::srgba(1.0, 1.0, 1.0, 0.05),
            outline: Color::srgb_u8(0xcc, 0xcc, 0xcc),
            static_fill: Color::srgb_u8(0x44, 0x44, 0x44),
            hover: Color::WHITE,
            spring: Color::srgb_u8(0xcc, 0xcc, 0xcc),
            gizmo_valid: Color::srgb(0.3, 0.9, 0.4),
            gizmo_idle: Color::srgb(0.6, 0.6, 0.6),
            aim: Color::srgb(1.0, 0.55, 0.2),
            drag_line: Color::srgba(1.0, 1.0, 1.0, 0.25),
        }
    }
}

/// Read-only view of everything one frame paints.
pub struct Frame<'a> {
    pub world: &'a PhysicsWorld,
    pub particles: &'a ParticleSystem,
    pub camera: &'a ViewCamera,
    pub interaction: &'a InteractionState,
    /// Window size in logical pixels.
    pub viewport: Vec2,
    pub now: f32,
}

/// Steps physics, turns impacts into sparks, then moves the particles.
pub fn advance(world: &mut PhysicsWorld, particles: &mut ParticleSystem, config: &WorldConfig) {
    if !config.running {
        return;
    }
    for impact in world.step(config) {
        particles.spawn(impact.position, SPARKS_PER_IMPACT);
    }
    particles.update(config.gravity());
}

impl Renderer {
    pub fn draw(&self, canvas: &mut impl Canvas, frame: &Frame) {
        canvas.fill_rect(Vec2::ZERO, frame.viewport, self.background);
        for [from, to] in grid_lines(frame.camera, frame.viewport) {
            canvas.polyline(&[from, to], Stroke::new(1.0, self.grid));
        }

        canvas.save();
        canvas.transform(frame.camera.transform());
        self.draw_bodies(canvas, frame);
        self.draw_springs(canvas, frame);
        self.draw_particles(canvas, frame);
        self.draw_gizmos(canvas, frame);
        canvas.restore();
    }

    fn body_fill(&self, body: &BodyView) -> Color {
        if body.tag.ground {
            self.background
        } else if body.is_static {
            self.static_fill
        } else {
            body.tag.color
        }
    }

    fn draw_bodies(&self, canvas: &mut impl Canvas, frame: &Frame) {
        let hover = frame.interaction.hover_body();
        for body in frame.world.bodies() {
            if body.tag.hidden {
                continue;
            }
            let scale = body
                .tag
                .spawned_at
                .map_or(1.0, |t| pop_in_scale(frame.now - t));
            let animated = scale != 1.0;
            if animated {
                canvas.save();
                canvas.transform(Similarity::about(body.position, scale));
            }
            canvas.polygon(
                &body.vertices,
                Some(self.body_fill(&body)),
                Some(Stroke::new(1.0, self.outline)),
            );
            if hover == Some(body.handle) {
                canvas.polygon(&body.vertices, None, Some(Stroke::new(3.0, self.hover)));
            }
            if animated {
                canvas.restore();
            }
        }
    }

    fn draw_springs(&self, canvas: &mut impl Canvas, frame: &Frame) {
        for spring in frame.world.constraints() {
            if !spring.visible || spring.pointer_tracking {
                continue;
            }
            let points = coil_points(spring.point_a, spring.point_b, COIL_SEGMENTS, COIL_AMPLITUDE);
            canvas.polyline(&points, Stroke::new(2.0, self.spring));
            canvas.circle(spring.point_a, COIL_CAP_RADIUS, self.spring);
            canvas.circle(spring.point_b, COIL_CAP_RADIUS, self.spring);
        }
    }

    fn draw_particles(&self, canvas: &mut impl Canvas, frame: &Frame) {
        let size = Vec2::splat(PARTICLE_SIZE);
        for p in frame.particles.particles() {
            canvas.set_alpha(p.life);
            canvas.fill_rect(p.position - size * 0.5, size, p.color);
        }
        canvas.set_alpha(1.0);
    }

    fn draw_gizmos(&self, canvas: &mut impl Canvas, frame: &Frame) {
        let interaction = frame.interaction;
        let mouse = interaction.mouse_world();
        if let Some(start) = interaction
            .spring_start()
            .and_then(|b| frame.world.position(b))
        {
            let color = if interaction.hover_body().is_some() {
                self.gizmo_valid
            } else {
                self.gizmo_idle
            };
            canvas.dashed_line(start, mouse, Stroke::new(2.0, color), GIZMO_DASH);
        }
        if let Some(anchor) = interaction.slingshot_anchor() {
            canvas.polyline(&[anchor, mouse], Stroke::new(2.0, self.aim));
            canvas.circle(anchor, 5.0, self.aim);
        }
        if let Some(drag) = interaction
            .drag_constraint()
            .and_then(|c| frame.world.constraint(c))
        {
            canvas.polyline(&[drag.point_a, drag.point_b], Stroke::new(1.0, self.drag_line));
        }
    }
}

/// Screen-space grid lines. Spacing follows the zoom and the offset follows
/// the camera, so the grid appears fixed to the world.
pub fn grid_lines(camera: &ViewCamera, viewport: Vec2) -> Vec<[Vec2; 2]> {
    let spacing = GRID_BASE_SPACING * camera.zoom();
    if spacing < GRID_MIN_SPACING {
        return Vec::new();
    }
    let mut lines = Vec::new();
    let mut x = camera.x.rem_euclid(spacing);
    while x < viewport.x {
        lines.push([Vec2::new(x, 0.0), Vec2::new(x, viewport.y)]);
        x += spacing;
    }
    let mut y = camera.y.rem_euclid(spacing);
    while y < viewport.y {
        lines.push([Vec2::new(0.0, y), Vec2::new(viewport.x, y)]);
        y += spacing;
    }
    lines
}

/// Zigzag from `a` to `b`. Interior samples alternate `amplitude` to either
/// side of the line; the ends sit on the anchors.
pub fn coil_points(a: Vec2, b: Vec2, segments: usize, amplitude: f32) -> Vec<Vec2> {
    let segments = segments.max(1);
    let delta = b - a;
    let normal = delta.perp().normalize_or_zero();
    (0..=segments)
        .map(|i| {
            let base = a + delta * (i as f32 / segments as f32);
            if i == 0 || i == segments {
                base
            } else if i % 2 == 1 {
                base + normal * amplitude
            } else {
                base - normal * amplitude
            }
        })
        .collect()
}

pub fn elastic_out(t: f32) -> f32 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }
    2f32.powf(-10.0 * t) * ((10.0 * t - 0.75) * TAU / 3.0).sin() + 1.0
}

/// Scale of a body `age` seconds after it spawned.
pub fn pop_in_scale(age: f32) -> f32 {
    elastic_out(age.max(0.0) / POP_IN_SECONDS)
}

pub struct RenderPlugin;
impl Plugin for RenderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Renderer>()
            .add_systems(Update, frame_tick.in_set(PlaygroundSet::Tick));
    }
}

#[allow(clippy::too_many_arguments)]
fn frame_tick(
    mut contexts: EguiContexts,
    time: Res<Time>,
    settings: Res<Settings>,
    renderer: Res<Renderer>,
    camera: Res<ViewCamera>,
    interaction: Res<InteractionState>,
    mut world: ResMut<PhysicsWorld>,
    mut particles: ResMut<ParticleSystem>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    advance(&mut world, &mut particles, &settings.world);

    let Ok(window) = windows.get_single() else {
        return;
    };
    let Some(ctx) = contexts.try_ctx_mut() else {
        return;
    };
    let mut canvas = EguiCanvas::new(ctx.layer_painter(egui::LayerId::background()));
    let frame = Frame {
        world: &world,
        particles: &particles,
        camera: &camera,
        interaction: &interaction,
        viewport: window.size(),
        now: time.elapsed_seconds(),
    };
    renderer.draw(&mut canvas, &frame);
}
