use bevy::prelude::*;
use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::render::camera::ClearColorConfig;

use crate::plugins::ball::{ActiveBall, GolfBall};
use crate::plugins::core_sim::GolfSet;
use crate::plugins::course_builder::CourseLayout;
use crate::plugins::game_state::{GolfMatch, MatchPhase, Player};
use crate::plugins::shooting::{wrap_yaw, ShotMode, ShotState};

/// Marker component for the single orbit camera.
#[derive(Component)]
pub struct OrbitCamera;

/// Runtime orbit state. `yaw` trails the active player's aim.
#[derive(Resource)]
pub struct OrbitCameraState {
    pub yaw: f32,
    pub pitch: f32,
    pub radius: f32,
}

impl Default for OrbitCameraState {
    fn default() -> Self {
        Self { yaw: 0.0, pitch: 28f32.to_radians(), radius: 7.0 }
    }
}

#[derive(Resource)]
pub struct OrbitCameraConfig {
    pub pitch_min: f32,
    pub pitch_max: f32,
    pub radius_min: f32,
    pub radius_max: f32,
    pub zoom_speed: f32,
    pub sens_pitch: f32,
    pub yaw_follow: f32,       // 1/s, exponential catch-up to the aim yaw
    pub target_max_speed: f32, // units / second
    pub lobby_orbit_speed: f32,
}

impl Default for OrbitCameraConfig {
    fn default() -> Self {
        Self {
            pitch_min: 8f32.to_radians(),
            pitch_max: 75f32.to_radians(),
            radius_min: 2.5,
            radius_max: 30.0,
            zoom_speed: 1.0,
            sens_pitch: 0.005,
            yaw_follow: 6.0,
            target_max_speed: 40.0,
            lobby_orbit_speed: 0.2,
        }
    }
}

#[derive(Resource, Default)]
pub struct CameraFollow {
    pub smoothed_target: Vec3,
    pub lobby_angle: f32,
}

pub struct CameraPlugin;
impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<OrbitCameraConfig>()
            .init_resource::<OrbitCameraState>()
            .init_resource::<CameraFollow>()
            .add_systems(Startup, spawn_camera)
            .add_systems(
                Update,
                (orbit_camera_input, lobby_camera_orbit, follow_active_ball)
                    .chain()
                    .in_set(GolfSet::Present),
            );
    }
}

fn spawn_camera(mut commands: Commands) {
    commands.spawn((
        Camera3dBundle {
            transform: Transform::from_xyz(-12.0, 10.0, 18.0).looking_at(Vec3::ZERO, Vec3::Y),
            camera: Camera { clear_color: ClearColorConfig::Custom(Color::srgb(0.52, 0.80, 0.92)), ..default() },
            projection: PerspectiveProjection { fov: 60f32.to_radians(), ..default() }.into(),
            ..default()
        },
        OrbitCamera,
    ));
    commands.spawn(DirectionalLightBundle {
        directional_light: DirectionalLight { illuminance: 12_000.0, shadows_enabled: true, ..default() },
        transform: Transform::from_xyz(30.0, 60.0, 20.0).looking_at(Vec3::ZERO, Vec3::Y),
        ..default()
    });
}

/// Scroll zoom always; right mouse drag tilts.
fn orbit_camera_input(
    mut state: ResMut<OrbitCameraState>,
    cfg: Res<OrbitCameraConfig>,
    buttons: Res<ButtonInput<MouseButton>>,
    mut ev_motion: EventReader<MouseMotion>,
    mut ev_wheel: EventReader<MouseWheel>,
) {
    for w in ev_wheel.read() {
        state.radius = (state.radius - w.y * cfg.zoom_speed).clamp(cfg.radius_min, cfg.radius_max);
    }
    if buttons.pressed(MouseButton::Right) {
        for m in ev_motion.read() {
            state.pitch -= m.delta.y * cfg.sens_pitch;
        }
        state.pitch = state.pitch.clamp(cfg.pitch_min, cfg.pitch_max);
    } else {
        ev_motion.clear();
    }
}

fn lobby_camera_orbit(
    time: Res<Time>,
    cfg: Res<OrbitCameraConfig>,
    golf: Option<Res<GolfMatch>>,
    layout: Option<Res<CourseLayout>>,
    mut follow: ResMut<CameraFollow>,
    mut q_cam: Query<&mut Transform, With<OrbitCamera>>,
) {
    let showing_course = golf.map_or(true, |g| matches!(g.phase(), MatchPhase::Lobby | MatchPhase::Starting | MatchPhase::Finished));
    if !showing_course {
        return;
    }
    let (Some(layout), Ok(mut cam_t)) = (layout, q_cam.get_single_mut()) else { return; };
    let center = (layout.min + layout.max) * 0.5;
    let span = (layout.max - layout.min).length().max(8.0);
    follow.lobby_angle = (follow.lobby_angle + cfg.lobby_orbit_speed * time.delta_seconds()) % std::f32::consts::TAU;
    let radius = span * 0.7;
    cam_t.translation = center + Vec3::new(follow.lobby_angle.cos() * radius, span * 0.45, follow.lobby_angle.sin() * radius);
    cam_t.look_at(center, Vec3::Y);
    follow.smoothed_target = center;
}

fn follow_active_ball(
    time: Res<Time>,
    cfg: Res<OrbitCameraConfig>,
    golf: Option<Res<GolfMatch>>,
    mut state: ResMut<OrbitCameraState>,
    mut follow: ResMut<CameraFollow>,
    q_players: Query<(&Player, &ShotState)>,
    q_ball: Query<(&GolfBall, &Transform), (With<ActiveBall>, Without<OrbitCamera>)>,
    mut q_cam: Query<&mut Transform, With<OrbitCamera>>,
) {
    let Some(golf) = golf else { return; };
    if !matches!(golf.phase(), MatchPhase::InHole | MatchPhase::BetweenHoles) {
        return;
    }
    let Ok((ball, ball_t)) = q_ball.get_single() else { return; };
    let Ok(mut cam_t) = q_cam.get_single_mut() else { return; };
    let dt = time.delta_seconds();

    // Trail the aim while the owner is lining up; hold the last yaw while the ball rolls.
    if let Some((_, shot)) = q_players.iter().find(|(p, _)| p.id == ball.owner) {
        if matches!(shot.mode, ShotMode::Aiming | ShotMode::Charging) {
            let diff = wrap_yaw(shot.aim_yaw - state.yaw);
            state.yaw += diff * (cfg.yaw_follow * dt).min(1.0);
        }
    }

    let raw_target = ball_t.translation;
    let max_step = cfg.target_max_speed * dt;
    let to_target = raw_target - follow.smoothed_target;
    let dist = to_target.length();
    if dist <= max_step || dist == 0.0 {
        follow.smoothed_target = raw_target;
    } else {
        follow.smoothed_target += to_target / dist * max_step;
    }

    let back = -Vec3::new(state.yaw.cos(), 0.0, state.yaw.sin());
    let offset = back * state.radius * state.pitch.cos() + Vec3::Y * state.radius * state.pitch.sin();
    cam_t.translation = follow.smoothed_target + offset;
    cam_t.look_at(follow.smoothed_target, Vec3::Y);
}
