//! Adapter over the rapier2d solver.
//!
//! Rapier owns every rigid body and joint. The rest of the crate holds only
//! `BodyHandle`/`ConstraintHandle` values and reads state through the views
//! returned here, so a body removed by the engine can never leave a dangling
//! reference behind. The world is y-down and measured in pixels.

use std::collections::HashMap;
use std::f32::consts::TAU;
use std::sync::Mutex;

use bevy::prelude::{Color, Resource, Vec2};
use rapier2d::prelude::*;

use crate::config::{ShapeKind, WorldConfig};

pub const FIXED_DT: f32 = 1.0 / 60.0;
/// World gravity of `1.0` in the settings, in px/s².
pub const GRAVITY_PIXELS: f32 = 1000.0;
pub const MIN_BODY_SIZE: f32 = 1.0;
pub const MIN_DENSITY: f32 = 1e-5;
/// Per-second linear damping standing in for air friction.
pub const AIR_FRICTION: f32 = 0.6;

/// Relative speed (px/s) at which a new contact counts as an impact.
const IMPACT_SPEED: f32 = 240.0;
const CIRCLE_SEGMENTS: usize = 24;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BodyHandle(RigidBodyHandle);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConstraintHandle(ImpulseJointHandle);

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BodyShape {
    Rect { width: f32, height: f32 },
    Circle { radius: f32 },
    RegularPolygon { sides: usize, radius: f32 },
}

impl BodyShape {
    /// `size` is the side of a box or the diameter of anything round.
    pub fn from_kind(kind: ShapeKind, size: f32) -> Self {
        let size = size.max(MIN_BODY_SIZE);
        let radius = size * 0.5;
        match kind {
            ShapeKind::Box => BodyShape::Rect {
                width: size,
                height: size,
            },
            ShapeKind::Circle => BodyShape::Circle { radius },
            ShapeKind::Triangle => BodyShape::RegularPolygon { sides: 3, radius },
            ShapeKind::Pentagon | ShapeKind::Star => BodyShape::RegularPolygon { sides: 5, radius },
            ShapeKind::Hexagon => BodyShape::RegularPolygon { sides: 6, radius },
        }
    }

    fn clamped(self) -> Self {
        let min_radius = MIN_BODY_SIZE * 0.5;
        match self {
            BodyShape::Rect { width, height } => BodyShape::Rect {
                width: width.max(MIN_BODY_SIZE),
                height: height.max(MIN_BODY_SIZE),
            },
            BodyShape::Circle { radius } => BodyShape::Circle {
                radius: radius.max(min_radius),
            },
            BodyShape::RegularPolygon { sides, radius } => BodyShape::RegularPolygon {
                sides: sides.max(3),
                radius: radius.max(min_radius),
            },
        }
    }

    /// Vertices around the local origin.
    pub fn outline(&self) -> Vec<Vec2> {
        match *self {
            BodyShape::Rect { width, height } => {
                let h = Vec2::new(width, height) * 0.5;
                vec![
                    Vec2::new(-h.x, -h.y),
                    Vec2::new(h.x, -h.y),
                    Vec2::new(h.x, h.y),
                    Vec2::new(-h.x, h.y),
                ]
            }
            BodyShape::Circle { radius } => regular_polygon(CIRCLE_SEGMENTS, radius),
            BodyShape::RegularPolygon { sides, radius } => regular_polygon(sides, radius),
        }
    }

    fn collider(&self) -> ColliderBuilder {
        match *self {
            BodyShape::Rect { width, height } => ColliderBuilder::cuboid(width * 0.5, height * 0.5),
            BodyShape::Circle { radius } => ColliderBuilder::ball(radius),
            BodyShape::RegularPolygon { sides, radius } => {
                let points = regular_polygon(sides, radius)
                    .into_iter()
                    .map(|v| point![v.x, v.y])
                    .collect();
                ColliderBuilder::convex_polyline(points)
                    .unwrap_or_else(|| ColliderBuilder::ball(radius))
            }
        }
    }
}

/// Vertex `i` sits at angle `(i + 0.5) * TAU / sides`, so a triangle rests on
/// a flat edge.
fn regular_polygon(sides: usize, radius: f32) -> Vec<Vec2> {
    let step = TAU / sides as f32;
    (0..sides)
        .map(|i| Vec2::from_angle(step * (i as f32 + 0.5)) * radius)
        .collect()
}

/// Bookkeeping attached to a body when it is created.
#[derive(Clone, Debug, PartialEq)]
pub struct BodyTag {
    pub color: Color,
    /// Drawn in the background colour so only the edge shows.
    pub ground: bool,
    pub hidden: bool,
    /// Seconds on the app clock; drives the pop-in animation.
    pub spawned_at: Option<f32>,
}

impl Default for BodyTag {
    fn default() -> Self {
        Self {
            color: Color::srgb(0.27, 0.27, 0.27),
            ground: false,
            hidden: false,
            spawned_at: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct BodyDesc {
    pub shape: BodyShape,
    pub position: Vec2,
    pub velocity: Vec2,
    pub restitution: f32,
    pub friction: f32,
    pub density: f32,
    pub air_friction: f32,
    pub is_static: bool,
    pub ccd: bool,
    pub tag: BodyTag,
}

impl BodyDesc {
    pub fn new(shape: BodyShape, position: Vec2) -> Self {
        Self {
            shape,
            position,
            velocity: Vec2::ZERO,
            restitution: 0.0,
            friction: 0.1,
            density: 0.001,
            air_friction: AIR_FRICTION,
            is_static: false,
            ccd: false,
            tag: BodyTag::default(),
        }
    }
}

pub struct BodyView<'a> {
    pub handle: BodyHandle,
    pub position: Vec2,
    /// Outline in world space.
    pub vertices: Vec<Vec2>,
    pub is_static: bool,
    pub tag: &'a BodyTag,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConstraintView {
    pub handle: ConstraintHandle,
    /// `None` when this end is pinned to the pointer.
    pub body_a: Option<BodyHandle>,
    pub body_b: BodyHandle,
    pub point_a: Vec2,
    pub point_b: Vec2,
    pub rest_length: f32,
    pub pointer_tracking: bool,
    pub visible: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Impact {
    pub position: Vec2,
}

struct BodyRecord {
    outline: Vec<Vec2>,
    is_static: bool,
    tag: BodyTag,
}

#[derive(Clone, Copy, Debug)]
enum ConstraintKind {
    Spring,
    /// `body_a` is a collider-less kinematic anchor that follows the pointer.
    Drag { pointer: Vec2 },
}

#[derive(Clone, Copy, Debug)]
struct ConstraintRecord {
    handle: ImpulseJointHandle,
    body_a: RigidBodyHandle,
    body_b: RigidBodyHandle,
    local_a: Vec2,
    local_b: Vec2,
    rest_length: f32,
    kind: ConstraintKind,
}

/// Collects contact starts fast enough to deserve a spark.
#[derive(Default)]
struct ImpactCollector {
    pending: Mutex<Vec<Impact>>,
}

impl ImpactCollector {
    fn drain(&self) -> Vec<Impact> {
        self.pending
            .lock()
            .map(|mut pending| std::mem::take(&mut *pending))
            .unwrap_or_default()
    }
}

fn parent_body<'a>(
    bodies: &'a RigidBodySet,
    colliders: &ColliderSet,
    collider: ColliderHandle,
) -> Option<&'a RigidBody> {
    colliders
        .get(collider)
        .and_then(|c| c.parent())
        .and_then(|h| bodies.get(h))
}

impl EventHandler for ImpactCollector {
    fn handle_collision_event(
        &self,
        bodies: &RigidBodySet,
        colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        let CollisionEvent::Started(c1, c2, _) = event else {
            return;
        };
        let (Some(a), Some(b)) = (
            parent_body(bodies, colliders, c1),
            parent_body(bodies, colliders, c2),
        ) else {
            return;
        };
        if (a.linvel() - b.linvel()).norm() < IMPACT_SPEED {
            return;
        }
        let mid = (a.translation() + b.translation()) * 0.5;
        if let Ok(mut pending) = self.pending.lock() {
            pending.push(Impact {
                position: Vec2::new(mid.x, mid.y),
            });
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

fn to_vector(v: Vec2) -> Vector<Real> {
    vector![v.x, v.y]
}

fn from_vector(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

fn to_world(position: &Isometry<Real>, local: Vec2) -> Vec2 {
    let p = position * point![local.x, local.y];
    Vec2::new(p.x, p.y)
}

#[derive(Resource)]
pub struct PhysicsWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    /// Rebuilt after every step and every body change.
    query_pipeline: QueryPipeline,
    impacts: ImpactCollector,
    records: HashMap<RigidBodyHandle, BodyRecord>,
    constraints: Vec<ConstraintRecord>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    pub fn new() -> Self {
        Self {
            gravity: vector![0.0, GRAVITY_PIXELS],
            integration_parameters: IntegrationParameters {
                dt: FIXED_DT,
                ..IntegrationParameters::default()
            },
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            impacts: ImpactCollector::default(),
            records: HashMap::new(),
            constraints: Vec::new(),
        }
    }

    /// Bodies created through `spawn_body`; drag anchors are not counted.
    pub fn body_count(&self) -> usize {
        self.records.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn spawn_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        let shape = desc.shape.clamped();
        let builder = if desc.is_static {
            RigidBodyBuilder::fixed()
        } else {
            RigidBodyBuilder::dynamic()
        };
        let body = builder
            .translation(to_vector(desc.position))
            .linvel(to_vector(desc.velocity))
            .linear_damping(desc.air_friction.max(0.0))
            .ccd_enabled(desc.ccd)
            .build();
        let handle = self.bodies.insert(body);

        let collider = shape
            .collider()
            .restitution(desc.restitution.max(0.0))
            .restitution_combine_rule(CoefficientCombineRule::Max)
            .friction(desc.friction.max(0.0))
            .density(desc.density.max(MIN_DENSITY))
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        if let Some(body) = self.bodies.get_mut(handle) {
            body.recompute_mass_properties_from_colliders(&self.colliders);
        }

        self.records.insert(
            handle,
            BodyRecord {
                outline: shape.outline(),
                is_static: desc.is_static,
                tag: desc.tag.clone(),
            },
        );
        self.query_pipeline.update(&self.colliders);
        BodyHandle(handle)
    }

    /// Removes the body, its collider and every constraint attached to it.
    pub fn remove_body(&mut self, handle: BodyHandle) -> bool {
        if self.records.remove(&handle.0).is_none() {
            return false;
        }
        let (attached, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.constraints)
            .into_iter()
            .partition(|c| c.body_a == handle.0 || c.body_b == handle.0);
        self.constraints = kept;
        for record in attached {
            self.impulse_joints.remove(record.handle, true);
            if let ConstraintKind::Drag { .. } = record.kind {
                self.remove_rigid_body(record.body_a);
            }
        }
        self.remove_rigid_body(handle.0);
        self.query_pipeline.update(&self.colliders);
        true
    }

    fn remove_rigid_body(&mut self, handle: RigidBodyHandle) {
        self.bodies.remove(
            handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    /// Removes every body not in `keep`, and every constraint.
    pub fn clear_except(&mut self, keep: &[BodyHandle]) {
        for record in std::mem::take(&mut self.constraints) {
            self.impulse_joints.remove(record.handle, false);
        }
        let doomed: Vec<RigidBodyHandle> = self
            .bodies
            .iter()
            .map(|(h, _)| h)
            .filter(|h| !keep.contains(&BodyHandle(*h)))
            .collect();
        for handle in doomed {
            self.records.remove(&handle);
            self.remove_rigid_body(handle);
        }
        self.query_pipeline.update(&self.colliders);
    }

    pub fn position(&self, handle: BodyHandle) -> Option<Vec2> {
        self.bodies
            .get(handle.0)
            .map(|body| from_vector(body.translation()))
    }

    pub fn velocity(&self, handle: BodyHandle) -> Option<Vec2> {
        self.bodies.get(handle.0).map(|body| from_vector(body.linvel()))
    }

    pub fn mass(&self, handle: BodyHandle) -> Option<f32> {
        self.bodies.get(handle.0).map(|body| body.mass())
    }

    pub fn is_sleeping(&self, handle: BodyHandle) -> Option<bool> {
        self.bodies.get(handle.0).map(|body| body.is_sleeping())
    }

    pub fn sleep(&mut self, handle: BodyHandle) {
        if let Some(body) = self.bodies.get_mut(handle.0) {
            body.sleep();
        }
    }

    pub fn wake(&mut self, handle: BodyHandle) {
        if let Some(body) = self.bodies.get_mut(handle.0) {
            body.wake_up(true);
        }
    }

    pub fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec2) {
        if let Some(body) = self.bodies.get_mut(handle.0) {
            body.apply_impulse(to_vector(impulse), true);
        }
    }

    /// Every body whose collider contains `point`, dynamic ones first.
    pub fn bodies_at_point(&self, point: Vec2) -> Vec<BodyHandle> {
        let mut hits: Vec<(bool, BodyHandle)> = Vec::new();
        self.query_pipeline.intersections_with_point(
            &self.bodies,
            &self.colliders,
            &point![point.x, point.y],
            QueryFilter::default(),
            |collider| {
                let parent = self.colliders.get(collider).and_then(Collider::parent);
                if let Some((handle, record)) =
                    parent.and_then(|h| self.records.get_key_value(&h))
                {
                    hits.push((record.is_static, BodyHandle(*handle)));
                }
                true
            },
        );
        hits.sort_by_key(|(is_static, _)| *is_static);
        hits.into_iter().map(|(_, handle)| handle).collect()
    }

    pub fn pick(&self, point: Vec2) -> Option<BodyHandle> {
        self.bodies_at_point(point).into_iter().next()
    }

    pub fn body(&self, handle: BodyHandle) -> Option<BodyView<'_>> {
        let body = self.bodies.get(handle.0)?;
        let record = self.records.get(&handle.0)?;
        Some(BodyView {
            handle,
            position: from_vector(body.translation()),
            vertices: record
                .outline
                .iter()
                .map(|v| to_world(body.position(), *v))
                .collect(),
            is_static: record.is_static,
            tag: &record.tag,
        })
    }

    pub fn bodies(&self) -> impl Iterator<Item = BodyView<'_>> + '_ {
        self.bodies
            .iter()
            .filter_map(move |(handle, _)| self.body(BodyHandle(handle)))
    }

    /// A spring whose rest length is the current distance between the bodies.
    pub fn add_spring(
        &mut self,
        a: BodyHandle,
        b: BodyHandle,
        stiffness: f32,
        damping: f32,
    ) -> Option<ConstraintHandle> {
        if a == b || !self.records.contains_key(&a.0) || !self.records.contains_key(&b.0) {
            return None;
        }
        let rest_length = self.position(a)?.distance(self.position(b)?);
        let joint = SpringJointBuilder::new(rest_length, stiffness.max(0.0), damping.max(0.0))
            .spring_model(MotorModel::AccelerationBased)
            .build();
        let handle = self.impulse_joints.insert(a.0, b.0, joint, true);
        self.constraints.push(ConstraintRecord {
            handle,
            body_a: a.0,
            body_b: b.0,
            local_a: Vec2::ZERO,
            local_b: Vec2::ZERO,
            rest_length,
            kind: ConstraintKind::Spring,
        });
        Some(ConstraintHandle(handle))
    }

    /// Pins the grabbed point of a dynamic body to `point`.
    pub fn begin_drag(
        &mut self,
        handle: BodyHandle,
        point: Vec2,
        stiffness: f32,
        damping: f32,
    ) -> Option<ConstraintHandle> {
        let body = self.bodies.get(handle.0)?;
        if !body.is_dynamic() {
            return None;
        }
        let local = body.position().inverse_transform_point(&point![point.x, point.y]);
        let anchor = self.bodies.insert(
            RigidBodyBuilder::kinematic_position_based()
                .translation(to_vector(point))
                .build(),
        );
        let joint = SpringJointBuilder::new(0.0, stiffness.max(0.0), damping.max(0.0))
            .spring_model(MotorModel::AccelerationBased)
            .local_anchor2(local)
            .build();
        let joint_handle = self.impulse_joints.insert(anchor, handle.0, joint, true);
        self.constraints.push(ConstraintRecord {
            handle: joint_handle,
            body_a: anchor,
            body_b: handle.0,
            local_a: Vec2::ZERO,
            local_b: Vec2::new(local.x, local.y),
            rest_length: 0.0,
            kind: ConstraintKind::Drag { pointer: point },
        });
        self.wake(handle);
        Some(ConstraintHandle(joint_handle))
    }

    /// Moves the pointer end of a drag constraint and wakes the dragged body.
    pub fn move_drag(&mut self, handle: ConstraintHandle, point: Vec2) -> bool {
        let Some(record) = self.constraints.iter_mut().find(|c| c.handle == handle.0) else {
            return false;
        };
        let ConstraintKind::Drag { pointer } = &mut record.kind else {
            return false;
        };
        *pointer = point;
        let (anchor, target) = (record.body_a, record.body_b);
        if let Some(anchor) = self.bodies.get_mut(anchor) {
            anchor.set_next_kinematic_translation(to_vector(point));
        }
        self.wake(BodyHandle(target));
        true
    }

    /// Removing a constraint twice is a no-op.
    pub fn remove_constraint(&mut self, handle: ConstraintHandle) -> bool {
        let Some(index) = self.constraints.iter().position(|c| c.handle == handle.0) else {
            return false;
        };
        let record = self.constraints.remove(index);
        self.impulse_joints.remove(record.handle, true);
        if let ConstraintKind::Drag { .. } = record.kind {
            self.remove_rigid_body(record.body_a);
        }
        true
    }

    fn constraint_view(&self, record: &ConstraintRecord) -> Option<ConstraintView> {
        let body_b = self.bodies.get(record.body_b)?;
        let point_b = to_world(body_b.position(), record.local_b);
        let (body_a, point_a, pointer_tracking) = match record.kind {
            ConstraintKind::Drag { pointer } => (None, pointer, true),
            ConstraintKind::Spring => {
                let body_a = self.bodies.get(record.body_a)?;
                (
                    Some(BodyHandle(record.body_a)),
                    to_world(body_a.position(), record.local_a),
                    false,
                )
            }
        };
        Some(ConstraintView {
            handle: ConstraintHandle(record.handle),
            body_a,
            body_b: BodyHandle(record.body_b),
            point_a,
            point_b,
            rest_length: record.rest_length,
            pointer_tracking,
            visible: !pointer_tracking,
        })
    }

    pub fn constraint(&self, handle: ConstraintHandle) -> Option<ConstraintView> {
        self.constraints
            .iter()
            .find(|c| c.handle == handle.0)
            .and_then(|record| self.constraint_view(record))
    }

    pub fn constraints(&self) -> impl Iterator<Item = ConstraintView> + '_ {
        self.constraints
            .iter()
            .filter_map(move |record| self.constraint_view(record))
    }

    /// One fixed step of `FIXED_DT * time_scale`. Returns the impacts seen.
    pub fn step(&mut self, config: &WorldConfig) -> Vec<Impact> {
        let dt = FIXED_DT * config.time_scale;
        if !dt.is_finite() || dt <= 0.0 {
            return Vec::new();
        }
        self.gravity = to_vector(config.gravity() * GRAVITY_PIXELS);
        self.integration_parameters.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &self.impacts,
        );
        self.query_pipeline.update(&self.colliders);
        self.impacts.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(world: &mut PhysicsWorld, at: Vec2, is_static: bool) -> BodyHandle {
        world.spawn_body(&BodyDesc {
            is_static,
            ..BodyDesc::new(BodyShape::from_kind(ShapeKind::Box, 40.0), at)
        })
    }

    #[test]
    fn spawned_body_is_found_at_its_position() {
        let mut world = PhysicsWorld::new();
        let body = boxed(&mut world, Vec2::new(100.0, -50.0), false);
        assert_eq!(world.body_count(), 1);
        assert_eq!(world.position(body), Some(Vec2::new(100.0, -50.0)));
        assert_eq!(world.pick(Vec2::new(115.0, -35.0)), Some(body));
        assert_eq!(world.pick(Vec2::new(125.0, -50.0)), None);
        assert!(world.mass(body).unwrap() > 0.0);
    }

    #[test]
    fn dynamic_bodies_win_point_queries() {
        let mut world = PhysicsWorld::new();
        let wall = boxed(&mut world, Vec2::ZERO, true);
        let crate_ = boxed(&mut world, Vec2::new(5.0, 5.0), false);
        assert_eq!(world.bodies_at_point(Vec2::new(2.0, 2.0)), vec![crate_, wall]);
        assert_eq!(world.bodies_at_point(Vec2::new(-18.0, -18.0)), vec![wall]);
    }

    #[test]
    fn circle_is_pickable_right_up_to_its_rim() {
        let mut world = PhysicsWorld::new();
        let ball = world.spawn_body(&BodyDesc::new(
            BodyShape::from_kind(ShapeKind::Circle, 50.0),
            Vec2::ZERO,
        ));
        // Between the drawn 24-gon's edge and the true radius of 25.
        assert_eq!(world.pick(Vec2::new(0.0, 24.9)), Some(ball));
        assert_eq!(world.pick(Vec2::new(0.0, 25.5)), None);
    }

    #[test]
    fn picking_tracks_bodies_as_they_fall() {
        let mut world = PhysicsWorld::new();
        let body = boxed(&mut world, Vec2::ZERO, false);
        let config = WorldConfig::default();
        for _ in 0..30 {
            world.step(&config);
        }
        let at = world.position(body).unwrap();
        assert!(at.y > 40.0);
        assert_eq!(world.pick(at), Some(body));
        assert_eq!(world.pick(Vec2::ZERO), None);
    }

    #[test]
    fn degenerate_sizes_are_clamped() {
        let mut world = PhysicsWorld::new();
        let body = world.spawn_body(&BodyDesc {
            density: 0.0,
            ..BodyDesc::new(BodyShape::RegularPolygon { sides: 1, radius: 0.0 }, Vec2::ZERO)
        });
        let view = world.body(body).unwrap();
        assert_eq!(view.vertices.len(), 3);
        assert!(view.vertices.iter().all(|v| v.length() > 0.0));
        assert!(world.mass(body).unwrap() > 0.0);
    }

    #[test]
    fn spring_rest_length_matches_spawn_geometry() {
        let mut world = PhysicsWorld::new();
        let a = boxed(&mut world, Vec2::new(0.0, 0.0), false);
        let b = boxed(&mut world, Vec2::new(30.0, 40.0), false);
        let spring = world.add_spring(a, b, 60.0, 2.0).unwrap();
        let view = world.constraint(spring).unwrap();
        assert_eq!(view.rest_length, 50.0);
        assert_eq!(view.body_a, Some(a));
        assert_eq!(view.body_b, b);
        assert!(!view.pointer_tracking);
        assert!(world.add_spring(a, a, 60.0, 2.0).is_none());
    }

    #[test]
    fn removing_a_constraint_twice_is_harmless() {
        let mut world = PhysicsWorld::new();
        let a = boxed(&mut world, Vec2::ZERO, false);
        let b = boxed(&mut world, Vec2::new(100.0, 0.0), false);
        let spring = world.add_spring(a, b, 60.0, 2.0).unwrap();
        assert!(world.remove_constraint(spring));
        assert!(!world.remove_constraint(spring));
        assert_eq!(world.constraint_count(), 0);
    }

    #[test]
    fn drag_anchor_is_invisible_to_body_enumeration() {
        let mut world = PhysicsWorld::new();
        let body = boxed(&mut world, Vec2::ZERO, false);
        let grab = Vec2::new(10.0, 5.0);
        let drag = world.begin_drag(body, grab, 600.0, 40.0).unwrap();
        assert_eq!(world.body_count(), 1);
        assert_eq!(world.bodies().count(), 1);

        let view = world.constraint(drag).unwrap();
        assert!(view.pointer_tracking);
        assert_eq!(view.body_a, None);
        assert!((view.point_b - grab).length() < 1e-4);

        assert!(world.move_drag(drag, Vec2::new(60.0, 5.0)));
        assert_eq!(world.constraint(drag).unwrap().point_a, Vec2::new(60.0, 5.0));
        assert!(world.remove_constraint(drag));
        assert_eq!(world.body_count(), 1);
        assert_eq!(world.constraint_count(), 0);
    }

    #[test]
    fn static_bodies_cannot_be_dragged() {
        let mut world = PhysicsWorld::new();
        let wall = boxed(&mut world, Vec2::ZERO, true);
        assert!(world.begin_drag(wall, Vec2::ZERO, 600.0, 40.0).is_none());
        assert_eq!(world.constraint_count(), 0);
    }

    #[test]
    fn dragging_wakes_a_sleeping_body() {
        let mut world = PhysicsWorld::new();
        let body = boxed(&mut world, Vec2::ZERO, false);
        let drag = world.begin_drag(body, Vec2::ZERO, 600.0, 40.0).unwrap();
        world.sleep(body);
        assert_eq!(world.is_sleeping(body), Some(true));
        world.move_drag(drag, Vec2::new(20.0, 0.0));
        assert_eq!(world.is_sleeping(body), Some(false));
    }

    #[test]
    fn impulse_changes_velocity_by_impulse_over_mass() {
        let mut world = PhysicsWorld::new();
        let body = boxed(&mut world, Vec2::ZERO, false);
        let mass = world.mass(body).unwrap();
        world.apply_impulse(body, Vec2::new(mass * 10.0, 0.0));
        let v = world.velocity(body).unwrap();
        assert!((v.x - 10.0).abs() < 1e-3);
        assert_eq!(v.y, 0.0);
    }

    #[test]
    fn gravity_pulls_down_the_screen() {
        let mut world = PhysicsWorld::new();
        let body = boxed(&mut world, Vec2::ZERO, false);
        let config = WorldConfig::default();
        for _ in 0..10 {
            world.step(&config);
        }
        assert!(world.position(body).unwrap().y > 0.0);

        let paused = WorldConfig {
            time_scale: 0.0,
            ..WorldConfig::default()
        };
        let before = world.position(body);
        world.step(&paused);
        assert_eq!(world.position(body), before);
    }

    #[test]
    fn removing_a_body_drops_its_springs() {
        let mut world = PhysicsWorld::new();
        let a = boxed(&mut world, Vec2::ZERO, false);
        let b = boxed(&mut world, Vec2::new(100.0, 0.0), false);
        world.add_spring(a, b, 60.0, 2.0).unwrap();
        assert!(world.remove_body(a));
        assert!(!world.remove_body(a));
        assert_eq!(world.constraint_count(), 0);
        assert_eq!(world.body_count(), 1);
    }

    #[test]
    fn clear_except_keeps_listed_bodies() {
        let mut world = PhysicsWorld::new();
        let keep = boxed(&mut world, Vec2::ZERO, true);
        let a = boxed(&mut world, Vec2::new(100.0, 0.0), false);
        let b = boxed(&mut world, Vec2::new(200.0, 0.0), false);
        world.add_spring(a, b, 60.0, 2.0).unwrap();
        world.begin_drag(a, Vec2::new(100.0, 0.0), 600.0, 40.0).unwrap();
        world.clear_except(&[keep]);
        assert_eq!(world.body_count(), 1);
        assert_eq!(world.constraint_count(), 0);
        assert_eq!(world.bodies().next().map(|b| b.handle), Some(keep));
    }
}
