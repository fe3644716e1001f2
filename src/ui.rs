use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPlugin};

use crate::camera::ViewCamera;
use crate::config::{Settings, ShapeKind};
use crate::interaction::{InteractionState, Tool};
use crate::particles::ParticleSystem;
use crate::physics::PhysicsWorld;
use crate::sim::ClearWorld;
use crate::PlaygroundSet;

/// Spawn settings panel opened by a plain secondary click.
#[derive(Resource, Default, Debug)]
pub struct SpawnMenu {
    /// Screen position the panel opened at.
    pub open_at: Option<Vec2>,
}

#[derive(Resource, Debug)]
pub struct UiFlags {
    pub show_help: bool,
    pub show_diagnostics: bool,
}

impl Default for UiFlags {
    fn default() -> Self {
        Self {
            show_help: true,
            show_diagnostics: false,
        }
    }
}

pub struct UiPlugin;
impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(EguiPlugin)
            .init_resource::<SpawnMenu>()
            .init_resource::<UiFlags>()
            .add_systems(
                Update,
                (controls_ui, spawn_menu_ui, help_ui, diagnostics_ui).in_set(PlaygroundSet::Ui),
            );
    }
}

fn fps(diagnostics: &DiagnosticsStore) -> Option<f64> {
    diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(|fps| fps.smoothed())
}

#[allow(clippy::too_many_arguments)]
fn controls_ui(
    mut contexts: EguiContexts,
    mut settings: ResMut<Settings>,
    mut interaction: ResMut<InteractionState>,
    mut world: ResMut<PhysicsWorld>,
    particles: Res<ParticleSystem>,
    camera: Res<ViewCamera>,
    diagnostics: Res<DiagnosticsStore>,
    mut ev_clear: EventWriter<ClearWorld>,
) {
    egui::Window::new("Controls").show(contexts.ctx_mut(), |ui| {
        ui.label(format!(
            "Bodies: {}  Springs: {}  Particles: {}",
            world.body_count(),
            world.constraint_count(),
            particles.len()
        ));
        if let Some(value) = fps(&diagnostics) {
            ui.label(format!("FPS: {:.1}", value));
        }
        ui.label(format!(
            "Camera: ({:.0}, {:.0})  Zoom: {:.2}x",
            camera.x,
            camera.y,
            camera.zoom()
        ));

        ui.separator();

        let mut tool = interaction.tool();
        ui.horizontal(|ui| {
            for t in Tool::ALL {
                ui.selectable_value(&mut tool, t, t.label());
            }
        });
        interaction.set_tool(tool, &mut world);

        ui.separator();

        let world_settings = &mut settings.world;
        ui.checkbox(&mut world_settings.running, "Running");
        ui.add(egui::Slider::new(&mut world_settings.gravity_x, -2.0..=2.0).text("Gravity X"));
        ui.add(egui::Slider::new(&mut world_settings.gravity_y, -2.0..=2.0).text("Gravity Y"));
        ui.add(egui::Slider::new(&mut world_settings.time_scale, 0.0..=2.0).text("Time Scale"));

        ui.separator();

        let spring = &mut settings.spring;
        ui.add(egui::Slider::new(&mut spring.stiffness, 1.0..=300.0).text("Spring Stiffness"));
        ui.add(egui::Slider::new(&mut spring.damping, 0.0..=20.0).text("Spring Damping"));

        ui.separator();

        if ui.button("Clear World").clicked() {
            ev_clear.send(ClearWorld);
        }
    });
}

fn spawn_menu_ui(
    mut contexts: EguiContexts,
    mut menu: ResMut<SpawnMenu>,
    mut settings: ResMut<Settings>,
) {
    let Some(at) = menu.open_at else {
        return;
    };
    let mut open = true;
    egui::Window::new("Spawn")
        .open(&mut open)
        .fixed_pos(egui::pos2(at.x, at.y))
        .collapsible(false)
        .resizable(false)
        .show(contexts.ctx_mut(), |ui| {
            let spawn = &mut settings.spawn;
            egui::ComboBox::from_label("Shape")
                .selected_text(spawn.shape.label())
                .show_ui(ui, |ui| {
                    for shape in ShapeKind::ALL {
                        ui.selectable_value(&mut spawn.shape, shape, shape.label());
                    }
                });
            if spawn.shape == ShapeKind::Star {
                ui.small("Stars are built as pentagons for now.");
            }
            ui.add(egui::Slider::new(&mut spawn.size, 5.0..=200.0).text("Size"));
            ui.add(
                egui::Slider::new(&mut spawn.density, 0.0001..=0.01)
                    .logarithmic(true)
                    .text("Density"),
            );
            ui.add(egui::Slider::new(&mut spawn.restitution, 0.0..=1.2).text("Restitution"));
            ui.add(egui::Slider::new(&mut spawn.hue, 0.0..=360.0).text("Hue"));
            ui.checkbox(&mut spawn.is_static, "Static");
        });
    if !open {
        menu.open_at = None;
    }
}

fn help_ui(mut contexts: EguiContexts, flags: Res<UiFlags>) {
    if !flags.show_help {
        return;
    }
    egui::Window::new("Help").show(contexts.ctx_mut(), |ui| {
        ui.label("Left Mouse: Use Tool");
        ui.label("  Move: drag a body, or click empty space to spawn");
        ui.label("  Connect: drag from one body to another");
        ui.label("  Shoot: pull back and release");
        ui.label("Right Mouse: Spawn Menu");
        ui.label("Middle Mouse, Shift/Ctrl+Right, Alt+Left: Pan Camera (drag)");
        ui.label("Mouse Wheel: Zoom");
        ui.label("WASD/Arrows: Pan Camera");
        ui.label("1/2/3: Move/Connect/Shoot");
        ui.label("Space: Pause Simulation");
        ui.label("C: Clear World");
        ui.label("H: Toggle Help");
        ui.label("F3: Toggle Diagnostics");
    });
}

fn diagnostics_ui(
    mut contexts: EguiContexts,
    flags: Res<UiFlags>,
    diagnostics: Res<DiagnosticsStore>,
    interaction: Res<InteractionState>,
) {
    if !flags.show_diagnostics {
        return;
    }
    egui::Window::new("Diagnostics").show(contexts.ctx_mut(), |ui| {
        if let Some(value) = fps(&diagnostics) {
            ui.label(format!("FPS: {:.1}", value));
        }
        if let Some(frame_time) = diagnostics
            .get(&FrameTimeDiagnosticsPlugin::FRAME_TIME)
            .and_then(|d| d.smoothed())
        {
            ui.label(format!("Frame: {:.2} ms", frame_time));
        }
        let mouse = interaction.mouse_world();
        ui.label(format!("Pointer: ({:.1}, {:.1})", mouse.x, mouse.y));
        ui.label(format!("Gesture: {:?}", interaction.gesture()));
    });
}
