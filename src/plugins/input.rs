// Local keyboard / mouse input for hot-seat play. Only the active human player is driven;
// bots and remote players send their own PlayerActionEvents.

use bevy::prelude::*;

use crate::plugins::autoplay::Bot;
use crate::plugins::core_sim::GolfSet;
use crate::plugins::events::{JoinRequestEvent, MatchCommand, PlayerAction, PlayerActionEvent};
use crate::plugins::game_state::{GolfMatch, MatchPhase, Player};
use crate::plugins::shooting::ShotConfig;

pub struct LocalInputPlugin;
impl Plugin for LocalInputPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, (lobby_keys, shot_input).in_set(GolfSet::Input));
    }
}

fn lobby_keys(
    keys: Res<ButtonInput<KeyCode>>,
    golf: Option<Res<GolfMatch>>,
    mut ev_cmd: EventWriter<MatchCommand>,
    mut ev_join: EventWriter<JoinRequestEvent>,
) {
    let Some(golf) = golf else { return; };
    if golf.phase() != MatchPhase::Lobby {
        return;
    }
    if keys.just_pressed(KeyCode::Enter) {
        ev_cmd.send(MatchCommand::Start);
    }
    if keys.just_pressed(KeyCode::KeyN) {
        let n = golf.roster().len() + golf.spectators().len() + 1;
        ev_join.send(JoinRequestEvent { name: format!("Player {n}"), bot: false });
    }
}

fn shot_input(
    time: Res<Time>,
    keys: Res<ButtonInput<KeyCode>>,
    buttons: Res<ButtonInput<MouseButton>>,
    cfg: Res<ShotConfig>,
    golf: Option<Res<GolfMatch>>,
    q_players: Query<&Player, Without<Bot>>,
    mut ev_actions: EventWriter<PlayerActionEvent>,
) {
    let Some(golf) = golf else { return; };
    if golf.phase() != MatchPhase::InHole {
        return;
    }
    let Some(active) = golf.current_player() else { return; };
    if !q_players.iter().any(|p| p.id == active) {
        return;
    }
    let mut send = |action| ev_actions.send(PlayerActionEvent { player: active, action });

    let mut turn = 0.0;
    if keys.any_pressed([KeyCode::KeyA, KeyCode::ArrowLeft]) {
        turn -= 1.0;
    }
    if keys.any_pressed([KeyCode::KeyD, KeyCode::ArrowRight]) {
        turn += 1.0;
    }
    if turn != 0.0 {
        send(PlayerAction::Aim(turn * cfg.aim_speed * time.delta_seconds()));
    }

    if keys.just_pressed(KeyCode::Space) || buttons.just_pressed(MouseButton::Left) {
        send(PlayerAction::BeginCharge);
    }
    if keys.just_released(KeyCode::Space) || buttons.just_released(MouseButton::Left) {
        send(PlayerAction::Release);
    }
    if keys.just_pressed(KeyCode::Escape) {
        send(PlayerAction::Cancel);
    }
}
