use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use bevy::diagnostic::{FrameTimeDiagnosticsPlugin, LogDiagnosticsPlugin};

use block_golf::launch::LaunchOptions;
use block_golf::plugins::autoplay::AutoplayPlugin;
use block_golf::plugins::ball::BallPlugin;
use block_golf::plugins::camera::CameraPlugin;
use block_golf::plugins::core_sim::CoreSimPlugin;
use block_golf::plugins::course::CoursePlugin;
use block_golf::plugins::course_builder::CourseBuilderPlugin;
use block_golf::plugins::game_audio::GameAudioPlugin;
use block_golf::plugins::game_flow::GameFlowPlugin;
use block_golf::plugins::hud::HudPlugin;
use block_golf::plugins::input::LocalInputPlugin;
use block_golf::plugins::lobby::LobbyPlugin;
use block_golf::plugins::shooting::ShootingPlugin;
use block_golf::plugins::ui_messages::UiMessagesPlugin;

fn main() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let options = match LaunchOptions::from_args(std::env::args().skip(1)) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("block_golf: {e}");
            eprintln!("usage: block_golf [--course <path.ron>] [--players <n>] [--autoplay] [--runtime <seconds>]");
            std::process::exit(2);
        }
    };

    App::new()
        .insert_resource(Msaa::Sample4)
        .insert_resource(AmbientLight { color: Color::srgb(0.55, 0.55, 0.60), brightness: 600.0 })
        .insert_resource(options)
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window { title: "Block Golf".into(), ..default() }),
            ..default()
        }))
        .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
        .add_plugins(CoreSimPlugin)       // timing, set ordering, shared events
        .add_plugins(CoursePlugin)        // course RON + tuning
        .add_plugins(CourseBuilderPlugin) // voxel stamping + colliders
        .add_plugins(BallPlugin)
        .add_plugins(ShootingPlugin)
        .add_plugins(GameFlowPlugin)      // turns, holes, scoring
        .add_plugins(UiMessagesPlugin)
        .add_plugins(AutoplayPlugin)
        .add_plugins(LocalInputPlugin)
        .add_plugins(LobbyPlugin)
        .add_plugins(HudPlugin)
        .add_plugins(CameraPlugin)
        .add_plugins(GameAudioPlugin)
        .add_plugins(FrameTimeDiagnosticsPlugin)
        .add_plugins(LogDiagnosticsPlugin::default())
        .run();
}
