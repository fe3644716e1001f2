use bevy::input::keyboard::KeyboardInput;
use bevy::input::mouse::{MouseButtonInput, MouseWheel};
use bevy::input::ButtonState; // needed in Bevy 0.14
use bevy::prelude::*;
use bevy::window::{CursorIcon, PrimaryWindow, WindowFocused};
use bevy_egui::EguiContexts;

use crate::camera::{KeyboardPan, PanDirection, ViewCamera};
use crate::config::{load_settings, Settings};
use crate::interaction::{
    InteractionContext, InteractionState, Modifiers, PointerAction, PointerButton, PointerDown,
    Tool,
};
use crate::physics::PhysicsWorld;
use crate::sim::ClearWorld;
use crate::ui::{SpawnMenu, UiFlags};
use crate::PlaygroundSet;

pub struct InputPlugin;
impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ViewCamera>()
            .init_resource::<InteractionState>()
            .init_resource::<KeyboardPan>()
            .add_systems(Startup, center_camera.after(load_settings))
            .add_systems(
                Update,
                (
                    pointer_input,
                    wheel_zoom,
                    track_held_keys,
                    keyboard_pan,
                    tool_hotkeys,
                    pause_toggle,
                    clear_trigger,
                    help_toggle,
                    diagnostics_toggle,
                    cursor_style,
                )
                    .in_set(PlaygroundSet::Input),
            );
    }
}

fn center_camera(
    windows: Query<&Window, With<PrimaryWindow>>,
    settings: Res<Settings>,
    mut camera: ResMut<ViewCamera>,
) {
    let origin = windows
        .get_single()
        .map_or(Vec2::ZERO, |window| window.size() * 0.5);
    *camera = ViewCamera::new(origin, &settings.camera);
    debug!("camera centred at {origin}");
}

fn pointer_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Primary),
        MouseButton::Middle => Some(PointerButton::Middle),
        MouseButton::Right => Some(PointerButton::Secondary),
        _ => None,
    }
}

fn modifiers(keys: &ButtonInput<KeyCode>) -> Modifiers {
    Modifiers {
        shift: keys.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]),
        ctrl: keys.any_pressed([KeyCode::ControlLeft, KeyCode::ControlRight]),
        alt: keys.any_pressed([KeyCode::AltLeft, KeyCode::AltRight]),
    }
}

fn pointer_over_ui(contexts: &mut EguiContexts) -> bool {
    contexts
        .try_ctx_mut()
        .map_or(false, |ctx| ctx.is_pointer_over_area() || ctx.wants_pointer_input())
}

/// Pointer events read in one frame.
///
/// Bevy queues cursor moves apart from button events, so their order inside a
/// frame is lost. Moves are replayed just before the first release, or before
/// the first press when nothing was released. A press, pull and release that
/// land in the same frame still start where the cursor was and end where it
/// went.
#[derive(Default, Debug)]
struct PointerFrame {
    moves: Vec<Vec2>,
    buttons: Vec<(PointerButton, ButtonState)>,
}

impl PointerFrame {
    fn replay_moves(
        &self,
        cursor: &mut Option<Vec2>,
        interaction: &mut InteractionState,
        ctx: &mut InteractionContext,
    ) {
        for &position in &self.moves {
            *cursor = Some(position);
            interaction.pointer_move(position, ctx);
        }
    }

    fn route(
        &self,
        cursor: &mut Option<Vec2>,
        modifiers: Modifiers,
        over_ui: bool,
        interaction: &mut InteractionState,
        ctx: &mut InteractionContext,
        menu: &mut SpawnMenu,
    ) -> Vec<(PointerButton, PointerAction)> {
        let split = self
            .buttons
            .iter()
            .position(|(_, state)| *state == ButtonState::Released)
            .unwrap_or(0);
        let mut moved = false;
        let mut actions = Vec::new();
        for (i, &(button, state)) in self.buttons.iter().enumerate() {
            if i == split {
                self.replay_moves(cursor, interaction, ctx);
                moved = true;
            }
            let Some(screen) = *cursor else {
                continue;
            };
            let action = match state {
                ButtonState::Pressed => {
                    if over_ui {
                        continue;
                    }
                    let was_idle = interaction.is_idle();
                    let down = PointerDown {
                        screen,
                        button,
                        modifiers,
                    };
                    let action = interaction.pointer_down(down, ctx);
                    // A plain secondary click opens the spawn menu; any other
                    // press on the canvas closes it.
                    menu.open_at = (was_idle
                        && button == PointerButton::Secondary
                        && !down.is_pan_trigger())
                    .then_some(screen);
                    action
                }
                ButtonState::Released => interaction.pointer_up(screen, button, ctx),
            };
            actions.push((button, action));
        }
        if !moved {
            self.replay_moves(cursor, interaction, ctx);
        }
        actions
    }
}

#[allow(clippy::too_many_arguments)]
fn pointer_input(
    mut contexts: EguiContexts,
    mut cursor_evr: EventReader<CursorMoved>,
    mut mousebtn_evr: EventReader<MouseButtonInput>,
    keys: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    settings: Res<Settings>,
    mut world: ResMut<PhysicsWorld>,
    mut camera: ResMut<ViewCamera>,
    mut interaction: ResMut<InteractionState>,
    mut menu: ResMut<SpawnMenu>,
    mut last_cursor: Local<Option<Vec2>>,
) {
    let frame = PointerFrame {
        moves: cursor_evr.read().map(|ev| ev.position).collect(),
        buttons: mousebtn_evr
            .read()
            .filter_map(|ev| pointer_button(ev.button).map(|button| (button, ev.state)))
            .collect(),
    };
    let over_ui = pointer_over_ui(&mut contexts);
    let mut ctx = InteractionContext {
        world: &mut world,
        camera: &mut camera,
        settings: &settings,
        now: time.elapsed_seconds(),
    };
    let actions = frame.route(
        &mut last_cursor,
        modifiers(&keys),
        over_ui,
        &mut interaction,
        &mut ctx,
        &mut menu,
    );
    for (button, action) in actions {
        if action != PointerAction::None {
            debug!("{button:?} -> {action:?}");
        }
    }
}

/// Zoom factor for one wheel event, or `None` for a zero delta.
fn wheel_factor(delta_y: f32, zoom_step: f32) -> Option<f32> {
    if delta_y > 0.0 {
        Some(zoom_step)
    } else if delta_y < 0.0 {
        Some(zoom_step.recip())
    } else {
        None
    }
}

fn wheel_zoom(
    mut contexts: EguiContexts,
    mut scroll_evr: EventReader<MouseWheel>,
    windows: Query<&Window, With<PrimaryWindow>>,
    settings: Res<Settings>,
    mut camera: ResMut<ViewCamera>,
) {
    let cursor = windows.get_single().ok().and_then(Window::cursor_position);
    let Some(cursor) = cursor.filter(|_| !pointer_over_ui(&mut contexts)) else {
        scroll_evr.clear();
        return;
    };
    for ev in scroll_evr.read() {
        if let Some(factor) = wheel_factor(ev.y, settings.camera.zoom_step) {
            camera.zoom_at(cursor, factor);
        }
    }
}

fn pan_direction(key: KeyCode) -> Option<PanDirection> {
    match key {
        KeyCode::KeyW | KeyCode::ArrowUp => Some(PanDirection::Up),
        KeyCode::KeyS | KeyCode::ArrowDown => Some(PanDirection::Down),
        KeyCode::KeyA | KeyCode::ArrowLeft => Some(PanDirection::Left),
        KeyCode::KeyD | KeyCode::ArrowRight => Some(PanDirection::Right),
        _ => None,
    }
}

fn track_held_keys(
    mut key_evr: EventReader<KeyboardInput>,
    mut focus_evr: EventReader<WindowFocused>,
    mut pan: ResMut<KeyboardPan>,
) {
    for ev in key_evr.read() {
        let Some(direction) = pan_direction(ev.key_code) else {
            continue;
        };
        match ev.state {
            ButtonState::Pressed => pan.press(direction),
            ButtonState::Released => pan.release(direction),
        }
    }
    // Key-up events are lost while the window is unfocused.
    if focus_evr.read().any(|ev| !ev.focused) {
        pan.release_all();
    }
}

fn keyboard_pan(mut pan: ResMut<KeyboardPan>, mut camera: ResMut<ViewCamera>) {
    pan.update(&mut camera);
}

fn tool_hotkeys(
    keys: Res<ButtonInput<KeyCode>>,
    mut interaction: ResMut<InteractionState>,
    mut world: ResMut<PhysicsWorld>,
) {
    let bindings = [
        (KeyCode::Digit1, Tool::Move),
        (KeyCode::Digit2, Tool::Connect),
        (KeyCode::Digit3, Tool::Shoot),
    ];
    for (key, tool) in bindings {
        if keys.just_pressed(key) {
            interaction.set_tool(tool, &mut world);
        }
    }
}

fn pause_toggle(mut settings: ResMut<Settings>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::Space) {
        settings.world.running = !settings.world.running;
    }
}

fn clear_trigger(mut ev_clear: EventWriter<ClearWorld>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::KeyC) {
        ev_clear.send(ClearWorld);
    }
}

fn help_toggle(mut flags: ResMut<UiFlags>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::KeyH) {
        flags.show_help = !flags.show_help;
    }
}

fn diagnostics_toggle(mut flags: ResMut<UiFlags>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::F3) {
        flags.show_diagnostics = !flags.show_diagnostics;
    }
}

fn cursor_icon(interaction: &InteractionState) -> CursorIcon {
    if interaction.is_panning() {
        return CursorIcon::Grabbing;
    }
    match interaction.tool() {
        Tool::Move => CursorIcon::Default,
        Tool::Connect => CursorIcon::Pointer,
        Tool::Shoot => CursorIcon::Crosshair,
    }
}

fn cursor_style(
    interaction: Res<InteractionState>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
) {
    let Ok(mut window) = windows.get_single_mut() else {
        return;
    };
    let icon = cursor_icon(&interaction);
    if window.cursor.icon != icon {
        window.cursor.icon = icon;
    }
}
