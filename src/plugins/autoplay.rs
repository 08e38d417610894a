use bevy::prelude::*;
use rand::prelude::*;
use serde::Deserialize;
use std::time::Duration;

use crate::launch::LaunchOptions;
use crate::plugins::ball::{ActiveBall, GolfBall};
use crate::plugins::core_sim::{GolfSet, SimState};
use crate::plugins::course_builder::CourseLayout;
use crate::plugins::events::{MatchCommand, PlayerAction, PlayerActionEvent};
use crate::plugins::game_state::{GolfMatch, MatchId, MatchPhase, Player};
use crate::plugins::shooting::{yaw_toward, wrap_yaw, ShotMode, ShotState};

#[derive(Resource, Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(default)]
pub struct BotConfig {
    pub think_secs: f32,
    /// Distance the bot hits at full power.
    pub full_power_distance: f32,
    pub aim_jitter_deg: f32,
    pub power_jitter: f32,
}
impl Default for BotConfig {
    fn default() -> Self {
        Self { think_secs: 0.8, full_power_distance: 18.0, aim_jitter_deg: 3.0, power_jitter: 0.05 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannedShot {
    pub yaw: f32,
    pub power: f32,
}

/// Drives a player's shots instead of local input.
#[derive(Component, Debug)]
pub struct Bot {
    think: Timer,
    plan: Option<PlannedShot>,
}

impl Bot {
    pub fn new(think_secs: f32) -> Self {
        Self { think: Timer::from_seconds(think_secs.max(0.0), TimerMode::Once), plan: None }
    }

    pub fn plan(&self) -> Option<PlannedShot> {
        self.plan
    }

    pub fn commit(&mut self, plan: PlannedShot) {
        self.plan = Some(plan);
    }

    /// Advances the think timer while aiming; true once a new shot should be planned.
    /// A plan still held while aiming means the charge never took, so it is dropped
    /// and the bot thinks again.
    pub fn ready_to_plan(&mut self, delta: Duration) -> bool {
        if self.plan.is_some() {
            if self.think.finished() {
                debug!("BOT dropping stale plan");
                self.reset();
            }
            return false;
        }
        self.think.tick(delta).finished()
    }

    fn reset(&mut self) {
        self.think.reset();
        self.plan = None;
    }
}

/// Straight at the cup, power proportional to distance, with a little human error.
pub fn plan_shot(ball: Vec3, cup: Vec3, cfg: &BotConfig, rng: &mut impl Rng) -> PlannedShot {
    let flat = Vec3::new(cup.x - ball.x, 0.0, cup.z - ball.z).length();
    let base = (flat / cfg.full_power_distance.max(0.1)).clamp(0.15, 1.0);
    let jitter_yaw = if cfg.aim_jitter_deg > 0.0 {
        rng.gen_range(-cfg.aim_jitter_deg..=cfg.aim_jitter_deg).to_radians()
    } else {
        0.0
    };
    let jitter_power = if cfg.power_jitter > 0.0 {
        rng.gen_range(-cfg.power_jitter..=cfg.power_jitter)
    } else {
        0.0
    };
    PlannedShot {
        yaw: wrap_yaw(yaw_toward(ball, cup) + jitter_yaw),
        power: (base + jitter_power).clamp(0.05, 1.0),
    }
}

pub struct AutoplayPlugin;
impl Plugin for AutoplayPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<BotConfig>()
            .add_systems(Update, (autostart_bot_match, drive_bots).chain().in_set(GolfSet::Input))
            .add_systems(FixedUpdate, debug_log_each_second);
    }
}

// In autoplay mode the bots start a match as soon as everyone is seated, and again after each lobby return.
fn autostart_bot_match(
    options: Option<Res<LaunchOptions>>,
    golf: Option<Res<GolfMatch>>,
    mut started: Local<Option<MatchId>>,
    mut ev_cmd: EventWriter<MatchCommand>,
) {
    let (Some(options), Some(golf)) = (options, golf) else { return; };
    if !options.autoplay || golf.phase() != MatchPhase::Lobby || *started == Some(golf.id()) {
        return;
    }
    let wanted = options.players.max(golf.rules().min_players) as usize;
    if golf.roster().len() < wanted.min(golf.rules().max_players as usize) {
        return;
    }
    info!("AUTOPLAY starting match={} bots={}", golf.id(), golf.roster().len());
    *started = Some(golf.id());
    ev_cmd.send(MatchCommand::Start);
}

fn drive_bots(
    time: Res<Time>,
    cfg: Res<BotConfig>,
    golf: Option<Res<GolfMatch>>,
    layout: Option<Res<CourseLayout>>,
    mut q_bots: Query<(&Player, &ShotState, &mut Bot)>,
    q_balls: Query<(&GolfBall, &Transform)>,
    mut ev_actions: EventWriter<PlayerActionEvent>,
) {
    let (Some(golf), Some(layout)) = (golf, layout) else { return; };
    let cup = layout.hole(golf.hole()).map(|h| h.cup);
    for (player, state, mut bot) in &mut q_bots {
        match state.mode {
            ShotMode::Idle | ShotMode::Rolling => {
                if bot.plan.is_some() || bot.think.elapsed_secs() > 0.0 {
                    bot.reset();
                }
            }
            ShotMode::Aiming => {
                if !bot.ready_to_plan(time.delta()) {
                    continue;
                }
                let (Some(cup), Some((_, ball_t))) = (cup, q_balls.iter().find(|(b, _)| b.owner == player.id)) else {
                    continue;
                };
                let plan = plan_shot(ball_t.translation, cup, &cfg, &mut thread_rng());
                debug!("BOT plan player={} yaw={:.2} power={:.2}", player.id, plan.yaw, plan.power);
                bot.commit(plan);
                ev_actions.send(PlayerActionEvent { player: player.id, action: PlayerAction::SetAim(plan.yaw) });
                ev_actions.send(PlayerActionEvent { player: player.id, action: PlayerAction::BeginCharge });
            }
            ShotMode::Charging => {
                let Some(plan) = bot.plan else {
                    ev_actions.send(PlayerActionEvent { player: player.id, action: PlayerAction::Cancel });
                    continue;
                };
                // Release on the way up, or right after the peak for near-full shots.
                if (state.rising && state.power >= plan.power) || !state.rising {
                    ev_actions.send(PlayerActionEvent { player: player.id, action: PlayerAction::Release });
                }
            }
        }
    }
}

fn debug_log_each_second(
    sim: Res<SimState>,
    mut last_second: Local<u64>,
    golf: Option<Res<GolfMatch>>,
    q_ball: Query<(&GolfBall, &Transform), With<ActiveBall>>,
) {
    if sim.tick == 0 || sim.tick % 60 != 0 {
        return;
    }
    let current_second = sim.tick / 60;
    if current_second == *last_second {
        return;
    }
    *last_second = current_second;
    let Some(golf) = golf else { return; };
    if golf.phase() != MatchPhase::InHole {
        return;
    }
    if let Ok((ball, t)) = q_ball.get_single() {
        let clock = golf.shot_clock_remaining().map(|s| format!("{s:.0}s")).unwrap_or_else(|| "--".into());
        info!(
            "T+{}s tick={} hole={} player={} ball=({:.2},{:.2},{:.2}) clock={}",
            current_second, sim.tick, golf.hole() + 1, ball.owner,
            t.translation.x, t.translation.y, t.translation.z, clock
        );
    }
}
