// Per-player shot state machine: aim, power charge (triangle wave) and launch.
//
// Idle -> Aiming (turn start) -> Charging (BeginCharge) -> Rolling (Release)
//                       ^------------- Cancel -----'
//
// The launch is an ExternalImpulse on the player's ball; Rapier does the rest.

use bevy::prelude::*;
use bevy_rapier3d::prelude::ExternalImpulse;
use serde::Deserialize;
use std::f32::consts::{PI, TAU};

use crate::plugins::ball::{ActiveBall, BallMotion, GolfBall};
use crate::plugins::core_sim::GolfSet;
use crate::plugins::events::{PlayerAction, PlayerActionEvent, ShotFiredEvent, TurnStartedEvent};
use crate::plugins::game_state::{GolfMatch, MatchPhase, Player};
use crate::plugins::ui_messages::{UiMessage, UiMessageEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotMode {
    Idle,
    Aiming,
    Charging,
    Rolling,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct ShotState {
    pub mode: ShotMode,
    pub aim_yaw: f32,        // radians, 0 = +X
    pub power: f32,          // 0..1 (oscillating)
    pub rising: bool,        // triangle wave direction
    reported_power: f32,
}
impl Default for ShotState {
    fn default() -> Self {
        Self { mode: ShotMode::Idle, aim_yaw: 0.0, power: 0.0, rising: true, reported_power: -1.0 }
    }
}

impl ShotState {
    pub fn arm(&mut self, aim_yaw: f32) {
        self.mode = ShotMode::Aiming;
        self.aim_yaw = wrap_yaw(aim_yaw);
        self.power = 0.0;
        self.rising = true;
    }

    pub fn disarm(&mut self) {
        self.mode = ShotMode::Idle;
        self.power = 0.0;
        self.rising = true;
    }

    pub fn can_aim(&self) -> bool {
        matches!(self.mode, ShotMode::Aiming | ShotMode::Charging)
    }

    pub fn begin_charge(&mut self) -> bool {
        if self.mode != ShotMode::Aiming {
            return false;
        }
        self.mode = ShotMode::Charging;
        self.power = 0.0;
        self.rising = true;
        true
    }

    pub fn cancel_charge(&mut self) -> bool {
        if self.mode != ShotMode::Charging {
            return false;
        }
        self.mode = ShotMode::Aiming;
        self.power = 0.0;
        self.rising = true;
        true
    }

    /// Triangle wave between 0 and 1.
    pub fn advance_charge(&mut self, delta: f32) {
        if self.mode != ShotMode::Charging {
            return;
        }
        if self.rising {
            self.power += delta;
            if self.power >= 1.0 {
                self.power = 1.0;
                self.rising = false;
            }
        } else {
            self.power -= delta;
            if self.power <= 0.0 {
                self.power = 0.0;
                self.rising = true;
            }
        }
    }
}

#[derive(Resource, Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShotConfig {
    pub osc_speed: f32,    // units per second (triangle wave edge speed)
    pub base_impulse: f32, // impulse at full power scale
    pub min_scale: f32,
    pub max_scale: f32,
    pub loft_deg: f32,     // launch elevation angle
    pub aim_speed: f32,    // radians per second while an aim key is held
}
impl Default for ShotConfig {
    fn default() -> Self {
        Self { osc_speed: 0.9, base_impulse: 0.6, min_scale: 0.1, max_scale: 1.0, loft_deg: 4.0, aim_speed: 1.8 }
    }
}

impl ShotConfig {
    pub fn power_scale(&self, power: f32) -> f32 {
        self.min_scale + power.clamp(0.0, 1.0) * (self.max_scale - self.min_scale)
    }

    pub fn impulse(&self, aim_yaw: f32, power: f32) -> Vec3 {
        aim_direction(aim_yaw, self.loft_deg) * self.base_impulse * self.power_scale(power)
    }
}

pub fn aim_direction(yaw: f32, loft_deg: f32) -> Vec3 {
    let loft = loft_deg.to_radians();
    let flat = Vec3::new(yaw.cos(), 0.0, yaw.sin());
    (flat * loft.cos() + Vec3::Y * loft.sin()).normalize_or_zero()
}

/// Wraps into `[-PI, PI)`.
pub fn wrap_yaw(yaw: f32) -> f32 {
    (yaw + PI).rem_euclid(TAU) - PI
}

pub fn yaw_toward(from: Vec3, to: Vec3) -> f32 {
    (to.z - from.z).atan2(to.x - from.x)
}

pub struct ShootingPlugin;
impl Plugin for ShootingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ShotConfig>()
            .add_systems(
                Update,
                (arm_shooters, disarm_outside_holes, apply_player_actions, update_shot_charge, report_power)
                    .chain()
                    .in_set(GolfSet::Shots),
            );
    }
}

// ---------------- Systems ----------------

fn arm_shooters(
    mut commands: Commands,
    mut ev_turn: EventReader<TurnStartedEvent>,
    mut q_players: Query<(&Player, &mut ShotState)>,
    q_balls: Query<(Entity, &GolfBall, Has<ActiveBall>)>,
) {
    let Some(turn) = ev_turn.read().last().copied() else { return; };
    for (player, mut state) in &mut q_players {
        if player.id == turn.player {
            state.arm(turn.aim_yaw);
        } else if state.mode != ShotMode::Idle {
            state.disarm();
        }
    }
    for (entity, ball, active) in &q_balls {
        let should = ball.owner == turn.player;
        if should && !active {
            commands.entity(entity).insert(ActiveBall);
        } else if !should && active {
            commands.entity(entity).remove::<ActiveBall>();
        }
    }
}

// Nobody may shoot between holes, during the countdown or back in the lobby.
fn disarm_outside_holes(golf: Option<Res<GolfMatch>>, mut q: Query<&mut ShotState>) {
    let in_hole = golf.is_some_and(|g| g.phase() == MatchPhase::InHole);
    if in_hole {
        return;
    }
    for mut state in &mut q {
        if state.mode != ShotMode::Idle {
            state.disarm();
        }
    }
}

fn apply_player_actions(
    cfg: Res<ShotConfig>,
    mut ev_actions: EventReader<PlayerActionEvent>,
    mut q_players: Query<(&Player, &mut ShotState)>,
    mut q_balls: Query<(&GolfBall, &Transform, &mut ExternalImpulse, &mut BallMotion)>,
    mut ev_shot: EventWriter<ShotFiredEvent>,
    mut ev_ui: EventWriter<UiMessageEvent>,
) {
    for ev in ev_actions.read() {
        let Some((player, mut state)) = q_players.iter_mut().find(|(p, _)| p.id == ev.player) else {
            debug!("SHOT action from unknown player={}", ev.player);
            continue;
        };
        if state.mode == ShotMode::Idle {
            debug!("SHOT rejected player={} action={:?} mode=idle", player.id, ev.action);
            if !matches!(ev.action, PlayerAction::Aim(_)) {
                ev_ui.send(UiMessageEvent::to(player.id, UiMessage::Notice { text: "Wait for your turn".into() }));
            }
            continue;
        }
        match ev.action {
            PlayerAction::Aim(delta) if state.can_aim() => {
                state.aim_yaw = wrap_yaw(state.aim_yaw + delta);
            }
            PlayerAction::SetAim(yaw) if state.can_aim() => {
                state.aim_yaw = wrap_yaw(yaw);
            }
            PlayerAction::BeginCharge => {
                if !state.begin_charge() {
                    debug!("SHOT begin_charge ignored player={} mode={:?}", player.id, state.mode);
                }
            }
            PlayerAction::Cancel => {
                state.cancel_charge();
            }
            PlayerAction::Release if state.mode == ShotMode::Charging => {
                let Some((_, t, mut imp, mut motion)) =
                    q_balls.iter_mut().find(|(b, ..)| b.owner == player.id)
                else {
                    warn!("SHOT release without a ball player={}", player.id);
                    state.cancel_charge();
                    continue;
                };
                let impulse = cfg.impulse(state.aim_yaw, state.power);
                imp.impulse = impulse;
                motion.last_rest = t.translation;
                motion.launch();
                let power = cfg.power_scale(state.power);
                info!(
                    "SHOT player={} yaw={:.2} power={:.0}% impulse=({:.3},{:.3},{:.3})",
                    player.id, state.aim_yaw, power * 100.0, impulse.x, impulse.y, impulse.z
                );
                ev_shot.send(ShotFiredEvent { player: player.id, origin: t.translation, impulse, power });
                state.mode = ShotMode::Rolling;
                state.power = 0.0;
            }
            other => {
                debug!("SHOT ignored player={} action={:?} mode={:?}", player.id, other, state.mode);
            }
        }
    }
}

fn update_shot_charge(time: Res<Time>, cfg: Res<ShotConfig>, mut q: Query<&mut ShotState>) {
    let delta = cfg.osc_speed * time.delta_seconds();
    for mut state in &mut q {
        if state.mode == ShotMode::Charging {
            state.advance_charge(delta);
        }
    }
}

fn report_power(mut q: Query<(&Player, &mut ShotState)>, mut ev_ui: EventWriter<UiMessageEvent>) {
    for (player, mut state) in &mut q {
        if state.mode != ShotMode::Charging {
            state.reported_power = -1.0;
            continue;
        }
        if (state.power - state.reported_power).abs() >= 0.05 {
            state.reported_power = state.power;
            ev_ui.send(UiMessageEvent::to(player.id, UiMessage::Power { power: state.power }));
        }
    }
}
