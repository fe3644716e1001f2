//! Tool state machine driven by pointer events.
//!
//! Each pointer stream runs one gesture at a time. The gesture enum carries
//! exactly the transient state its tool needs, so a drag, a pending spring and
//! a slingshot can never be live together.

use bevy::prelude::*;

use crate::camera::ViewCamera;
use crate::config::{Settings, SpawnConfig};
use crate::physics::{BodyDesc, BodyHandle, BodyShape, BodyTag, ConstraintHandle, PhysicsWorld};

/// Scales `(anchor - pointer) * mass` into the launch impulse.
pub const LAUNCH_POWER: f32 = 8.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Tool {
    #[default]
    Move,
    Connect,
    Shoot,
}

impl Tool {
    pub const ALL: [Tool; 3] = [Tool::Move, Tool::Connect, Tool::Shoot];

    pub fn label(self) -> &'static str {
        match self {
            Tool::Move => "Move",
            Tool::Connect => "Connect",
            Tool::Shoot => "Shoot",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct PointerDown {
    pub screen: Vec2,
    pub button: PointerButton,
    pub modifiers: Modifiers,
}

impl PointerDown {
    /// Middle button, secondary with shift or ctrl, or primary with alt.
    pub fn is_pan_trigger(&self) -> bool {
        match self.button {
            PointerButton::Middle => true,
            PointerButton::Secondary => self.modifiers.shift || self.modifiers.ctrl,
            PointerButton::Primary => self.modifiers.alt,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Panning {
        anchor_screen: Vec2,
        camera_start: Vec2,
    },
    Dragging {
        constraint: ConstraintHandle,
        body: BodyHandle,
    },
    Connecting {
        start: BodyHandle,
        hover: Option<BodyHandle>,
    },
    Aiming {
        anchor: Vec2,
    },
}

/// What a pointer event did; logged and used by the UI.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum PointerAction {
    None,
    PanStarted,
    PanEnded,
    DragStarted(BodyHandle),
    DragEnded,
    Spawned(BodyHandle),
    ConnectStarted(BodyHandle),
    SpringCreated(ConstraintHandle),
    ConnectCancelled,
    AimStarted(Vec2),
    Launched { body: BodyHandle, impulse: Vec2 },
}

/// Everything a pointer handler may touch.
pub struct InteractionContext<'a> {
    pub world: &'a mut PhysicsWorld,
    pub camera: &'a mut ViewCamera,
    pub settings: &'a Settings,
    /// App clock in seconds, stamped on spawned bodies.
    pub now: f32,
}

#[derive(Resource, Debug, Default)]
pub struct InteractionState {
    tool: Tool,
    gesture: Gesture,
    /// Button that started the running gesture.
    held: Option<PointerButton>,
    mouse_world: Vec2,
}

impl InteractionState {
    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Switching tools abandons whatever gesture was running.
    pub fn set_tool(&mut self, tool: Tool, world: &mut PhysicsWorld) {
        if tool == self.tool {
            return;
        }
        self.cancel(world);
        self.tool = tool;
        debug!("tool set to {}", tool.label());
    }

    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    pub fn mouse_world(&self) -> Vec2 {
        self.mouse_world
    }

    pub fn is_idle(&self) -> bool {
        self.gesture == Gesture::Idle
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.gesture, Gesture::Panning { .. })
    }

    pub fn drag_constraint(&self) -> Option<ConstraintHandle> {
        match self.gesture {
            Gesture::Dragging { constraint, .. } => Some(constraint),
            _ => None,
        }
    }

    pub fn spring_start(&self) -> Option<BodyHandle> {
        match self.gesture {
            Gesture::Connecting { start, .. } => Some(start),
            _ => None,
        }
    }

    pub fn hover_body(&self) -> Option<BodyHandle> {
        match self.gesture {
            Gesture::Connecting { hover, .. } => hover,
            _ => None,
        }
    }

    pub fn slingshot_anchor(&self) -> Option<Vec2> {
        match self.gesture {
            Gesture::Aiming { anchor } => Some(anchor),
            _ => None,
        }
    }

    /// Drops the running gesture, removing a live drag constraint.
    pub fn cancel(&mut self, world: &mut PhysicsWorld) {
        self.held = None;
        if let Gesture::Dragging { constraint, .. } = std::mem::take(&mut self.gesture) {
            world.remove_constraint(constraint);
        }
    }

    pub fn pointer_down(&mut self, event: PointerDown, ctx: &mut InteractionContext) -> PointerAction {
        if !self.is_idle() {
            return PointerAction::None;
        }
        let action = self.begin(event, ctx);
        if !self.is_idle() {
            self.held = Some(event.button);
        }
        action
    }

    fn begin(&mut self, event: PointerDown, ctx: &mut InteractionContext) -> PointerAction {
        if event.is_pan_trigger() {
            self.gesture = Gesture::Panning {
                anchor_screen: event.screen,
                camera_start: ctx.camera.position(),
            };
            return PointerAction::PanStarted;
        }
        if event.button != PointerButton::Primary {
            return PointerAction::None;
        }

        let point = ctx.camera.screen_to_world(event.screen);
        self.mouse_world = point;
        let hit = ctx.world.pick(point);
        match (self.tool, hit) {
            (Tool::Move, Some(body)) => {
                let drag = &ctx.settings.drag;
                match ctx.world.begin_drag(body, point, drag.stiffness, drag.damping) {
                    Some(constraint) => {
                        self.gesture = Gesture::Dragging { constraint, body };
                        PointerAction::DragStarted(body)
                    }
                    // Static bodies stay put.
                    None => PointerAction::None,
                }
            }
            (Tool::Move, None) => {
                let desc = spawn_desc(&ctx.settings.spawn, point, ctx.now);
                PointerAction::Spawned(ctx.world.spawn_body(&desc))
            }
            (Tool::Connect, Some(start)) => {
                self.gesture = Gesture::Connecting { start, hover: None };
                PointerAction::ConnectStarted(start)
            }
            (Tool::Connect, None) => PointerAction::None,
            (Tool::Shoot, _) => {
                self.gesture = Gesture::Aiming { anchor: point };
                PointerAction::AimStarted(point)
            }
        }
    }

    pub fn pointer_move(&mut self, screen: Vec2, ctx: &mut InteractionContext) {
        if let Gesture::Panning {
            anchor_screen,
            camera_start,
        } = self.gesture
        {
            ctx.camera.set_position(camera_start + (screen - anchor_screen));
        }
        let point = ctx.camera.screen_to_world(screen);
        self.mouse_world = point;
        match &mut self.gesture {
            Gesture::Dragging { constraint, .. } => {
                ctx.world.move_drag(*constraint, point);
            }
            Gesture::Connecting { start, hover } => {
                *hover = hover_target(ctx.world, *start, point);
            }
            _ => {}
        }
    }

    /// Ends the gesture, but only for the button that started it.
    pub fn pointer_up(
        &mut self,
        screen: Vec2,
        button: PointerButton,
        ctx: &mut InteractionContext,
    ) -> PointerAction {
        let point = ctx.camera.screen_to_world(screen);
        self.mouse_world = point;
        if self.held != Some(button) {
            return PointerAction::None;
        }
        self.held = None;
        match std::mem::take(&mut self.gesture) {
            Gesture::Idle => PointerAction::None,
            Gesture::Panning { .. } => PointerAction::PanEnded,
            Gesture::Dragging { constraint, .. } => {
                ctx.world.remove_constraint(constraint);
                PointerAction::DragEnded
            }
            Gesture::Connecting { start, .. } => {
                let spring = &ctx.settings.spring;
                hover_target(ctx.world, start, point)
                    .and_then(|end| ctx.world.add_spring(start, end, spring.stiffness, spring.damping))
                    .map_or(PointerAction::ConnectCancelled, PointerAction::SpringCreated)
            }
            Gesture::Aiming { anchor } => {
                let desc = BodyDesc {
                    is_static: false,
                    ccd: true,
                    ..spawn_desc(&ctx.settings.spawn, anchor, ctx.now)
                };
                let body = ctx.world.spawn_body(&desc);
                let mass = ctx.world.mass(body).unwrap_or(0.0);
                let impulse = launch_impulse(anchor, point, mass);
                ctx.world.apply_impulse(body, impulse);
                PointerAction::Launched { body, impulse }
            }
        }
    }
}

fn hover_target(world: &PhysicsWorld, start: BodyHandle, point: Vec2) -> Option<BodyHandle> {
    world.bodies_at_point(point).into_iter().find(|b| *b != start)
}

/// Pulling back from the anchor launches forward.
pub fn launch_impulse(anchor: Vec2, pointer: Vec2, mass: f32) -> Vec2 {
    (anchor - pointer) * mass * LAUNCH_POWER
}

pub fn spawn_desc(config: &SpawnConfig, position: Vec2, now: f32) -> BodyDesc {
    BodyDesc {
        restitution: config.restitution,
        density: config.density,
        is_static: config.is_static,
        tag: BodyTag {
            color: config.color(),
            spawned_at: Some(now),
            ..BodyTag::default()
        },
        ..BodyDesc::new(BodyShape::from_kind(config.shape, config.size), position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CameraConfig, ShapeKind};

    struct Fixture {
        world: PhysicsWorld,
        camera: ViewCamera,
        settings: Settings,
        state: InteractionState,
    }

    impl Fixture {
        fn new() -> Self {
            let mut settings = Settings::default();
            settings.spawn.shape = ShapeKind::Box;
            settings.spawn.size = 50.0;
            Self {
                world: PhysicsWorld::new(),
                // Identity camera so screen and world coordinates coincide.
                camera: ViewCamera::new(Vec2::ZERO, &CameraConfig::default()),
                settings,
                state: InteractionState::default(),
            }
        }

        fn with_tool(tool: Tool) -> Self {
            let mut f = Self::new();
            f.state.set_tool(tool, &mut f.world);
            f
        }

        fn body_at(&mut self, at: Vec2) -> BodyHandle {
            self.world
                .spawn_body(&BodyDesc::new(BodyShape::from_kind(ShapeKind::Box, 40.0), at))
        }

        fn down(&mut self, screen: Vec2, button: PointerButton, modifiers: Modifiers) -> PointerAction {
            let event = PointerDown {
                screen,
                button,
                modifiers,
            };
            let mut ctx = InteractionContext {
                world: &mut self.world,
                camera: &mut self.camera,
                settings: &self.settings,
                now: 0.0,
            };
            self.state.pointer_down(event, &mut ctx)
        }

        fn press(&mut self, screen: Vec2) -> PointerAction {
            self.down(screen, PointerButton::Primary, Modifiers::default())
        }

        fn drag_to(&mut self, screen: Vec2) {
            let mut ctx = InteractionContext {
                world: &mut self.world,
                camera: &mut self.camera,
                settings: &self.settings,
                now: 0.0,
            };
            self.state.pointer_move(screen, &mut ctx);
        }

        fn release(&mut self, screen: Vec2) -> PointerAction {
            self.release_with(screen, PointerButton::Primary)
        }

        fn release_with(&mut self, screen: Vec2, button: PointerButton) -> PointerAction {
            let mut ctx = InteractionContext {
                world: &mut self.world,
                camera: &mut self.camera,
                settings: &self.settings,
                now: 0.0,
            };
            self.state.pointer_up(screen, button, &mut ctx)
        }
    }

    #[test]
    fn move_tool_spawns_on_empty_space() {
        let mut f = Fixture::with_tool(Tool::Move);
        let PointerAction::Spawned(body) = f.press(Vec2::new(200.0, 120.0)) else {
            panic!("expected a spawn");
        };
        assert_eq!(f.world.body_count(), 1);
        assert_eq!(f.world.position(body), Some(Vec2::new(200.0, 120.0)));
        let view = f.world.body(body).unwrap();
        assert!(!view.is_static);
        assert_eq!(view.vertices.len(), 4);
        assert!((view.vertices[0] - view.vertices[2]).length() > 70.0);
        assert_eq!(f.world.constraint_count(), 0);
        assert!(f.state.is_idle());
        assert_eq!(f.release(Vec2::new(200.0, 120.0)), PointerAction::None);
    }

    #[test]
    fn drag_is_removed_on_release() {
        let mut f = Fixture::with_tool(Tool::Move);
        let body = f.body_at(Vec2::new(100.0, 100.0));
        assert_eq!(f.press(Vec2::new(110.0, 95.0)), PointerAction::DragStarted(body));
        assert_eq!(f.world.constraint_count(), 1);
        let drag = f.state.drag_constraint().unwrap();

        f.drag_to(Vec2::new(180.0, 60.0));
        assert_eq!(f.world.constraint(drag).unwrap().point_a, Vec2::new(180.0, 60.0));
        assert_eq!(f.state.mouse_world(), Vec2::new(180.0, 60.0));

        assert_eq!(f.release(Vec2::new(180.0, 60.0)), PointerAction::DragEnded);
        assert_eq!(f.state.drag_constraint(), None);
        assert_eq!(f.world.constraint_count(), 0);
        assert_eq!(f.world.body_count(), 1);
    }

    #[test]
    fn pressing_a_static_body_neither_drags_nor_spawns() {
        let mut f = Fixture::with_tool(Tool::Move);
        f.world.spawn_body(&BodyDesc {
            is_static: true,
            ..BodyDesc::new(BodyShape::from_kind(ShapeKind::Box, 40.0), Vec2::ZERO)
        });
        assert_eq!(f.press(Vec2::ZERO), PointerAction::None);
        assert_eq!(f.world.body_count(), 1);
        assert!(f.state.is_idle());
    }

    #[test]
    fn connect_creates_one_spring_between_distinct_bodies() {
        let mut f = Fixture::with_tool(Tool::Connect);
        let a = f.body_at(Vec2::new(0.0, 0.0));
        let b = f.body_at(Vec2::new(300.0, 400.0));

        assert_eq!(f.press(Vec2::new(5.0, 5.0)), PointerAction::ConnectStarted(a));
        f.drag_to(Vec2::new(2.0, 2.0));
        assert_eq!(f.state.hover_body(), None, "start body never hovers");
        f.drag_to(Vec2::new(300.0, 395.0));
        assert_eq!(f.state.spring_start(), Some(a));
        assert_eq!(f.state.hover_body(), Some(b));

        let PointerAction::SpringCreated(spring) = f.release(Vec2::new(300.0, 395.0)) else {
            panic!("expected a spring");
        };
        assert_eq!(f.world.constraint_count(), 1);
        let view = f.world.constraint(spring).unwrap();
        assert_eq!(view.body_a, Some(a));
        assert_eq!(view.body_b, b);
        assert_eq!(view.rest_length, 500.0);
        assert_eq!(f.state.spring_start(), None);
        assert_eq!(f.state.hover_body(), None);
    }

    #[test]
    fn connect_from_empty_space_does_nothing() {
        let mut f = Fixture::with_tool(Tool::Connect);
        f.body_at(Vec2::new(300.0, 0.0));
        assert_eq!(f.press(Vec2::new(-200.0, 0.0)), PointerAction::None);
        assert!(f.state.is_idle());
        f.drag_to(Vec2::new(300.0, 0.0));
        assert_eq!(f.release(Vec2::new(300.0, 0.0)), PointerAction::None);
        assert_eq!(f.world.constraint_count(), 0);
        assert_eq!(f.world.body_count(), 1);
    }

    #[test]
    fn releasing_on_the_start_body_cancels() {
        let mut f = Fixture::with_tool(Tool::Connect);
        f.body_at(Vec2::ZERO);
        f.press(Vec2::ZERO);
        assert_eq!(f.release(Vec2::new(3.0, 3.0)), PointerAction::ConnectCancelled);
        assert_eq!(f.world.constraint_count(), 0);
        assert!(f.state.is_idle());
    }

    #[test]
    fn slingshot_launches_away_from_the_pull() {
        let mut f = Fixture::with_tool(Tool::Shoot);
        assert_eq!(
            f.press(Vec2::new(100.0, 100.0)),
            PointerAction::AimStarted(Vec2::new(100.0, 100.0))
        );
        assert_eq!(f.state.slingshot_anchor(), Some(Vec2::new(100.0, 100.0)));
        f.drag_to(Vec2::new(50.0, 100.0));
        let PointerAction::Launched { body, impulse } = f.release(Vec2::new(50.0, 100.0)) else {
            panic!("expected a launch");
        };
        assert_eq!(f.world.body_count(), 1);
        assert_eq!(f.world.position(body), Some(Vec2::new(100.0, 100.0)));
        let mass = f.world.mass(body).unwrap();
        assert!(impulse.x > 0.0);
        assert!((impulse.x - 50.0 * mass * LAUNCH_POWER).abs() < 1e-3);
        assert_eq!(impulse.y, 0.0);
        assert!(f.world.velocity(body).unwrap().x > 0.0);
        assert_eq!(f.state.slingshot_anchor(), None);
    }

    #[test]
    fn heavier_projectiles_get_proportionally_more_impulse() {
        let launch = |density: f32| {
            let mut f = Fixture::with_tool(Tool::Shoot);
            f.settings.spawn.density = density;
            f.press(Vec2::new(100.0, 100.0));
            match f.release(Vec2::new(50.0, 100.0)) {
                PointerAction::Launched { impulse, .. } => impulse.x,
                other => panic!("expected a launch, got {other:?}"),
            }
        };
        let light = launch(0.001);
        let heavy = launch(0.004);
        assert!((heavy / light - 4.0).abs() < 1e-3);
    }

    #[test]
    fn projectiles_are_dynamic_even_with_static_spawning() {
        let mut f = Fixture::with_tool(Tool::Shoot);
        f.settings.spawn.is_static = true;
        f.press(Vec2::ZERO);
        let PointerAction::Launched { body, .. } = f.release(Vec2::new(-10.0, 0.0)) else {
            panic!("expected a launch");
        };
        assert!(!f.world.body(body).unwrap().is_static);
    }

    #[test]
    fn panning_is_relative_to_the_anchor() {
        let mut f = Fixture::new();
        f.camera.set_position(Vec2::new(10.0, 20.0));
        let alt = Modifiers {
            alt: true,
            ..Modifiers::default()
        };
        assert_eq!(
            f.down(Vec2::new(100.0, 100.0), PointerButton::Primary, alt),
            PointerAction::PanStarted
        );
        for p in [Vec2::new(130.0, 90.0), Vec2::new(-50.0, 7.0), Vec2::new(140.0, 150.0)] {
            f.drag_to(p);
        }
        assert_eq!(f.camera.position(), Vec2::new(50.0, 70.0));
        assert_eq!(f.release(Vec2::new(140.0, 150.0)), PointerAction::PanEnded);
        assert_eq!(f.world.body_count(), 0);
    }

    #[test]
    fn pan_triggers() {
        let mut f = Fixture::new();
        let shift = Modifiers {
            shift: true,
            ..Modifiers::default()
        };
        assert_eq!(
            f.down(Vec2::ZERO, PointerButton::Middle, Modifiers::default()),
            PointerAction::PanStarted
        );
        assert_eq!(
            f.release_with(Vec2::ZERO, PointerButton::Middle),
            PointerAction::PanEnded
        );
        assert_eq!(
            f.down(Vec2::ZERO, PointerButton::Secondary, shift),
            PointerAction::PanStarted
        );
        assert_eq!(
            f.release_with(Vec2::ZERO, PointerButton::Secondary),
            PointerAction::PanEnded
        );
        assert_eq!(
            f.down(Vec2::ZERO, PointerButton::Secondary, Modifiers::default()),
            PointerAction::None
        );
        assert!(f.state.is_idle());
        assert_eq!(f.world.body_count(), 0);
    }

    #[test]
    fn presses_during_a_gesture_are_ignored() {
        let mut f = Fixture::with_tool(Tool::Shoot);
        f.press(Vec2::new(10.0, 10.0));
        assert_eq!(
            f.down(Vec2::ZERO, PointerButton::Middle, Modifiers::default()),
            PointerAction::None
        );
        assert_eq!(f.press(Vec2::new(90.0, 90.0)), PointerAction::None);
        assert_eq!(f.state.slingshot_anchor(), Some(Vec2::new(10.0, 10.0)));
    }

    #[test]
    fn only_the_starting_button_ends_a_gesture() {
        let mut f = Fixture::with_tool(Tool::Shoot);
        f.press(Vec2::new(100.0, 100.0));
        f.down(Vec2::new(60.0, 100.0), PointerButton::Secondary, Modifiers::default());
        assert_eq!(
            f.release_with(Vec2::new(60.0, 100.0), PointerButton::Secondary),
            PointerAction::None
        );
        assert_eq!(f.state.slingshot_anchor(), Some(Vec2::new(100.0, 100.0)));
        assert_eq!(f.world.body_count(), 0);
        assert!(matches!(
            f.release(Vec2::new(50.0, 100.0)),
            PointerAction::Launched { .. }
        ));

        let mut f = Fixture::with_tool(Tool::Move);
        let body = f.body_at(Vec2::ZERO);
        assert_eq!(f.press(Vec2::ZERO), PointerAction::DragStarted(body));
        assert_eq!(
            f.release_with(Vec2::ZERO, PointerButton::Middle),
            PointerAction::None
        );
        assert_eq!(f.world.constraint_count(), 1);
        assert!(f.state.drag_constraint().is_some());
        assert_eq!(f.release(Vec2::ZERO), PointerAction::DragEnded);
        assert_eq!(f.world.constraint_count(), 0);
    }

    #[test]
    fn picking_follows_the_camera() {
        let mut f = Fixture::with_tool(Tool::Move);
        let body = f.body_at(Vec2::new(100.0, 50.0));
        f.camera.set_position(Vec2::new(400.0, 300.0));
        f.camera.zoom_at(Vec2::new(400.0, 300.0), 2.0);
        // World (100, 50) is drawn at 400 + 100 * 2, 300 + 50 * 2.
        assert_eq!(f.press(Vec2::new(600.0, 400.0)), PointerAction::DragStarted(body));
    }

    #[test]
    fn switching_tools_drops_a_live_drag() {
        let mut f = Fixture::with_tool(Tool::Move);
        f.body_at(Vec2::ZERO);
        f.press(Vec2::ZERO);
        assert_eq!(f.world.constraint_count(), 1);
        f.state.set_tool(Tool::Connect, &mut f.world);
        assert_eq!(f.state.tool(), Tool::Connect);
        assert!(f.state.is_idle());
        assert_eq!(f.world.constraint_count(), 0);
        assert_eq!(f.release(Vec2::ZERO), PointerAction::None);
    }

    #[test]
    fn launch_impulse_points_from_pointer_to_anchor() {
        let impulse = launch_impulse(Vec2::new(100.0, 100.0), Vec2::new(50.0, 130.0), 2.0);
        assert_eq!(impulse, Vec2::new(50.0, -30.0) * 2.0 * LAUNCH_POWER);
    }
}
