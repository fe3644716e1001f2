mod camera;
mod canvas;
mod config;
mod input;
mod interaction;
mod particles;
mod physics;
mod render;
mod sim;
mod ui;

use bevy::diagnostic::FrameTimeDiagnosticsPlugin;
use bevy::prelude::*;
use config::{load_settings, Settings};
use input::InputPlugin;
use render::RenderPlugin;
use sim::SimPlugin;
use ui::UiPlugin;

/// Per-frame ordering: panels claim the pointer first, then input mutates the
/// world, then the frame is stepped and painted.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlaygroundSet {
    Ui,
    Input,
    Tick,
}

fn main() {
    App::new()
        .insert_resource(ClearColor(Color::srgb_u8(0x1a, 0x1a, 0x1a)))
        .insert_resource(Msaa::Sample4)
        .init_resource::<Settings>()
        .add_plugins(FrameTimeDiagnosticsPlugin)
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Kinet Sandbox".into(),
                resolution: (1400., 900.).into(),
                ..default()
            }),
            ..default()
        }))
        .configure_sets(
            Update,
            (PlaygroundSet::Ui, PlaygroundSet::Input, PlaygroundSet::Tick).chain(),
        )
        .add_plugins((SimPlugin, UiPlugin, InputPlugin, RenderPlugin))
        .add_systems(Startup, (load_settings, setup_camera).chain())
        .run();
}

fn setup_camera(mut commands: Commands) {
    // Everything is painted by egui; the camera only hosts its pass.
    commands.spawn(Camera2dBundle::default());
    info!("playground ready");
}
