// Game-flow orchestration: joins/leaves, countdown, hole setup, stroke & penalty
// bookkeeping, turn hand-over and match end. Rules live in GolfMatch; this module
// applies their outcomes to the world.

use bevy::prelude::*;
use bevy_rapier3d::prelude::Velocity;

use crate::launch::LaunchOptions;
use crate::plugins::autoplay::{Bot, BotConfig};
use crate::plugins::ball::{reset_ball, spawn_ball, BallMotion, BallRender, BallTuning, GolfBall};
use crate::plugins::core_sim::GolfSet;
use crate::plugins::course::{load_course, CourseDef};
use crate::plugins::course_builder::CourseLayout;
use crate::plugins::events::{
    BallHazardEvent, BallInCupEvent, BallStoppedEvent, Hazard, HoleCompletedEvent, JoinRequestEvent,
    LeaveRequestEvent, MatchCommand, MatchFinishedEvent, PlayerHoledOutEvent, ShotFiredEvent,
    TurnEndReason, TurnEndedEvent, TurnStartedEvent,
};
use crate::plugins::game_state::{GolfMatch, HoleAdvance, MatchPhase, NextTurn, Player, PlayerId, Seat};
use crate::plugins::scheduler::{DelayedActions, FlowAction};
use crate::plugins::shooting::{yaw_toward, ShotState};
use crate::plugins::ui_messages::{ScoreboardRow, UiMessage, UiMessageEvent};

pub struct GameFlowPlugin;
impl Plugin for GameFlowPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DelayedActions>()
            .add_systems(Startup, (init_match.after(load_course), seat_local_players))
            .add_systems(
                Update,
                (
                    handle_join_requests,
                    handle_leave_requests,
                    handle_match_commands,
                    run_flow_actions,
                    record_shots,
                    resolve_ball_events,
                    tick_shot_clock,
                    resolve_turn_end,
                )
                    .chain()
                    .in_set(GolfSet::Flow),
            );
    }
}

// ---------------- Startup ----------------

fn init_match(mut commands: Commands, course: Option<Res<CourseDef>>, existing: Option<Res<GolfMatch>>) {
    if existing.is_some() {
        return;
    }
    let Some(course) = course else {
        error!("MATCH no course loaded; gameplay disabled");
        return;
    };
    let golf = GolfMatch::new(course.rules, course.pars());
    info!("MATCH id={} course=\"{}\" holes={} par={}", golf.id(), course.name, course.holes.len(), course.total_par());
    commands.insert_resource(golf);
}

fn seat_local_players(options: Option<Res<LaunchOptions>>, mut ev_join: EventWriter<JoinRequestEvent>) {
    let Some(options) = options else { return; };
    for i in 1..=options.players {
        let name = if options.autoplay { format!("Bot {i}") } else { format!("Player {i}") };
        ev_join.send(JoinRequestEvent { name, bot: options.autoplay });
    }
}

// ---------------- Helpers ----------------

fn lobby_message(golf: &GolfMatch, course: Option<&CourseDef>) -> UiMessage {
    UiMessage::Lobby {
        course: course.map(|c| c.name.clone()).unwrap_or_default(),
        players: golf.roster().iter().map(|p| p.name.clone()).collect(),
        min_players: golf.rules().min_players,
    }
}

fn scoreboard_message(golf: &GolfMatch) -> UiMessage {
    let pars: Vec<u32> = (0..golf.hole_count()).filter_map(|h| golf.par(h)).collect();
    let rows = golf
        .roster()
        .iter()
        .filter_map(|p| {
            let row = golf.scorecard().row(p.id)?;
            let par_played: u32 = row
                .played
                .iter()
                .zip(pars.iter())
                .filter(|(played, _)| **played)
                .map(|(_, par)| *par)
                .sum();
            Some(ScoreboardRow {
                player: p.id,
                name: p.name.clone(),
                strokes: row.strokes.clone(),
                total: row.total(),
                to_par: row.total() as i32 - par_played as i32,
            })
        })
        .collect();
    UiMessage::Scoreboard { hole: golf.hole(), pars, rows }
}

fn turn_message(golf: &GolfMatch, player: PlayerId) -> UiMessage {
    UiMessage::TurnStarted {
        player,
        name: golf.name_of(player).unwrap_or_default().to_string(),
        stroke: golf.strokes(player) + 1,
    }
}

fn return_to_lobby(
    commands: &mut Commands,
    golf: &mut GolfMatch,
    delayed: &mut DelayedActions,
    balls: impl Iterator<Item = Entity>,
) {
    delayed.clear();
    for e in balls {
        commands.entity(e).despawn_recursive();
    }
    golf.reset_to_lobby();
    info!("LOBBY match={} players={}", golf.id(), golf.roster().len());
}

#[allow(clippy::too_many_arguments)]
fn start_hole(
    index: usize,
    commands: &mut Commands,
    golf: &mut GolfMatch,
    layout: &CourseLayout,
    course: &CourseDef,
    tuning: &BallTuning,
    render: Option<&BallRender>,
    balls: impl Iterator<Item = Entity>,
    ev_turn: &mut EventWriter<TurnStartedEvent>,
    ev_ui: &mut EventWriter<UiMessageEvent>,
) -> bool {
    let (Some(hole), Some(def)) = (layout.hole(index), course.holes.get(index)) else {
        error!("HOLE {} missing from course layout", index + 1);
        return false;
    };
    let first = match golf.begin_hole(index) {
        Ok(p) => p,
        Err(e) => {
            error!("HOLE begin failed hole={}: {e}", index + 1);
            return false;
        }
    };
    for e in balls {
        commands.entity(e).despawn_recursive();
    }
    for p in golf.roster() {
        spawn_ball(commands, p.id, hole.tee, tuning, render);
    }
    info!("HOLE begin hole={} name=\"{}\" par={} players={}", index + 1, def.name, def.par, golf.roster().len());
    ev_ui.send(UiMessageEvent::all(UiMessage::HoleIntro {
        hole: index,
        holes: golf.hole_count(),
        name: def.name.clone(),
        par: def.par,
    }));
    ev_turn.send(TurnStartedEvent { player: first, hole: index, stroke: 0, aim_yaw: yaw_toward(hole.tee, hole.cup) });
    ev_ui.send(UiMessageEvent::all(turn_message(golf, first)));
    true
}

// ---------------- Systems ----------------

fn handle_join_requests(
    mut commands: Commands,
    golf: Option<ResMut<GolfMatch>>,
    course: Option<Res<CourseDef>>,
    bot_cfg: Option<Res<BotConfig>>,
    mut ev_join: EventReader<JoinRequestEvent>,
    mut ev_ui: EventWriter<UiMessageEvent>,
) {
    let Some(mut golf) = golf else { return; };
    let mut lobby_changed = false;
    for req in ev_join.read() {
        match golf.admit(&req.name) {
            Ok((id, seat)) => {
                let mut ec = commands.spawn((
                    Player { id, name: req.name.trim().to_string() },
                    ShotState::default(),
                ));
                if req.bot {
                    let think = bot_cfg.as_ref().map(|c| c.think_secs).unwrap_or_else(|| BotConfig::default().think_secs);
                    ec.insert(Bot::new(think));
                }
                info!("JOIN player={id} name=\"{}\" seat={seat:?} bot={}", req.name.trim(), req.bot);
                match seat {
                    Seat::Roster => lobby_changed = true,
                    Seat::Spectator => {
                        ev_ui.send(UiMessageEvent::to(id, UiMessage::Notice {
                            text: "A match is in progress; you will play in the next one".into(),
                        }));
                    }
                }
            }
            Err(e) => warn!("JOIN rejected name=\"{}\": {e}", req.name),
        }
    }
    if lobby_changed && golf.phase() == MatchPhase::Lobby {
        ev_ui.send(UiMessageEvent::all(lobby_message(&golf, course.as_deref())));
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_leave_requests(
    mut commands: Commands,
    golf: Option<ResMut<GolfMatch>>,
    course: Option<Res<CourseDef>>,
    mut delayed: ResMut<DelayedActions>,
    mut ev_leave: EventReader<LeaveRequestEvent>,
    q_players: Query<(Entity, &Player)>,
    q_balls: Query<(Entity, &GolfBall)>,
    mut ev_turn_end: EventWriter<TurnEndedEvent>,
    mut ev_ui: EventWriter<UiMessageEvent>,
) {
    let Some(mut golf) = golf else { return; };
    for req in ev_leave.read() {
        let removal = match golf.remove(req.player) {
            Ok(r) => r,
            Err(e) => {
                warn!("LEAVE ignored: {e}");
                continue;
            }
        };
        info!("LEAVE player={} seat={:?} was_active={}", req.player, removal.seat, removal.was_active);
        for (e, p) in &q_players {
            if p.id == req.player {
                commands.entity(e).despawn_recursive();
            }
        }
        for (e, b) in &q_balls {
            if b.owner == req.player {
                commands.entity(e).despawn_recursive();
            }
        }
        if removal.roster_empty && golf.is_running() {
            return_to_lobby(&mut commands, &mut golf, &mut delayed, q_balls.iter().map(|(e, _)| e));
        } else if removal.was_active && golf.phase() == MatchPhase::InHole {
            ev_turn_end.send(TurnEndedEvent {
                player: req.player,
                turn: golf.turn_number(),
                reason: TurnEndReason::Left,
            });
        }
        if golf.phase() == MatchPhase::Lobby {
            ev_ui.send(UiMessageEvent::all(lobby_message(&golf, course.as_deref())));
        }
    }
}

fn handle_match_commands(
    mut commands: Commands,
    golf: Option<ResMut<GolfMatch>>,
    course: Option<Res<CourseDef>>,
    mut delayed: ResMut<DelayedActions>,
    mut ev_cmd: EventReader<MatchCommand>,
    q_balls: Query<Entity, With<GolfBall>>,
    mut ev_ui: EventWriter<UiMessageEvent>,
) {
    let Some(mut golf) = golf else { return; };
    for cmd in ev_cmd.read() {
        match cmd {
            MatchCommand::Start => match golf.start() {
                Ok(()) => {
                    let secs = golf.rules().start_countdown_secs;
                    for i in 0..secs {
                        delayed.schedule(i as f32, FlowAction::Countdown(secs - i));
                    }
                    delayed.schedule(secs as f32, FlowAction::BeginMatch);
                    info!("MATCH starting id={} players={} countdown={}s", golf.id(), golf.roster().len(), secs);
                }
                Err(e) => {
                    warn!("MATCH start refused: {e}");
                    ev_ui.send(UiMessageEvent::all(UiMessage::Notice { text: e.to_string() }));
                }
            },
            MatchCommand::Abort => {
                if golf.is_running() {
                    info!("MATCH aborted id={}", golf.id());
                    return_to_lobby(&mut commands, &mut golf, &mut delayed, q_balls.iter());
                    ev_ui.send(UiMessageEvent::all(lobby_message(&golf, course.as_deref())));
                }
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_flow_actions(
    time: Res<Time>,
    mut commands: Commands,
    golf: Option<ResMut<GolfMatch>>,
    course: Option<Res<CourseDef>>,
    layout: Option<Res<CourseLayout>>,
    tuning: Res<BallTuning>,
    render: Option<Res<BallRender>>,
    mut delayed: ResMut<DelayedActions>,
    q_balls: Query<Entity, With<GolfBall>>,
    mut ev_turn: EventWriter<TurnStartedEvent>,
    mut ev_ui: EventWriter<UiMessageEvent>,
) {
    let Some(mut golf) = golf else { return; };
    for action in delayed.tick(time.delta()) {
        match action {
            FlowAction::Countdown(seconds) => {
                ev_ui.send(UiMessageEvent::all(UiMessage::Countdown { seconds }));
            }
            FlowAction::BeginMatch | FlowAction::BeginHole(_) => {
                let index = match action {
                    FlowAction::BeginHole(i) => i,
                    _ => 0,
                };
                let (Some(course), Some(layout)) = (course.as_deref(), layout.as_deref()) else {
                    error!("HOLE cannot begin without a built course");
                    continue;
                };
                let started = start_hole(
                    index,
                    &mut commands,
                    &mut golf,
                    layout,
                    course,
                    &tuning,
                    render.as_deref(),
                    q_balls.iter(),
                    &mut ev_turn,
                    &mut ev_ui,
                );
                if !started {
                    return_to_lobby(&mut commands, &mut golf, &mut delayed, q_balls.iter());
                    ev_ui.send(UiMessageEvent::all(lobby_message(&golf, Some(course))));
                }
            }
            FlowAction::ReturnToLobby => {
                return_to_lobby(&mut commands, &mut golf, &mut delayed, q_balls.iter());
                ev_ui.send(UiMessageEvent::all(lobby_message(&golf, course.as_deref())));
            }
        }
    }
}

fn record_shots(
    golf: Option<ResMut<GolfMatch>>,
    mut ev_shot: EventReader<ShotFiredEvent>,
    mut ev_ui: EventWriter<UiMessageEvent>,
) {
    let Some(mut golf) = golf else { return; };
    for shot in ev_shot.read() {
        match golf.record_stroke(shot.player) {
            Ok(strokes) => {
                info!("STROKE player={} hole={} stroke={}", shot.player, golf.hole() + 1, strokes);
                ev_ui.send(UiMessageEvent::all(UiMessage::Stroke { player: shot.player, strokes }));
            }
            Err(e) => warn!("STROKE not recorded: {e}"),
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn resolve_ball_events(
    mut commands: Commands,
    golf: Option<ResMut<GolfMatch>>,
    mut ev_stopped: EventReader<BallStoppedEvent>,
    mut ev_cup: EventReader<BallInCupEvent>,
    mut ev_hazard: EventReader<BallHazardEvent>,
    mut q_balls: Query<(Entity, &GolfBall, &mut Transform, &mut Velocity, &mut BallMotion)>,
    mut ev_holed: EventWriter<PlayerHoledOutEvent>,
    mut ev_turn_end: EventWriter<TurnEndedEvent>,
    mut ev_ui: EventWriter<UiMessageEvent>,
) {
    let Some(mut golf) = golf else { return; };
    if golf.phase() != MatchPhase::InHole {
        ev_stopped.clear();
        ev_cup.clear();
        ev_hazard.clear();
        return;
    }
    let turn = golf.turn_number();

    for ev in ev_cup.read() {
        if golf.current_player() != Some(ev.player) || ev.hole != golf.hole() {
            continue;
        }
        match golf.hole_out(ev.player) {
            Ok(result) => {
                info!("CUP player={} hole={} strokes={} label=\"{}\"", ev.player, ev.hole + 1, result.strokes, result.label);
                for (e, ball, ..) in &q_balls {
                    if ball.owner == ev.player {
                        commands.entity(e).despawn_recursive();
                    }
                }
                ev_holed.send(PlayerHoledOutEvent { player: ev.player, hole: ev.hole, strokes: result.strokes, par: result.par });
                ev_ui.send(UiMessageEvent::all(UiMessage::HoleOut {
                    player: ev.player,
                    name: golf.name_of(ev.player).unwrap_or_default().to_string(),
                    strokes: result.strokes,
                    label: result.label,
                }));
                ev_turn_end.send(TurnEndedEvent { player: ev.player, turn, reason: TurnEndReason::HoledOut });
            }
            Err(e) => debug!("CUP ignored: {e}"),
        }
    }

    for ev in ev_hazard.read() {
        if golf.current_player() != Some(ev.player) {
            continue;
        }
        let Some((_, _, mut t, mut vel, mut motion)) =
            q_balls.iter_mut().find(|(_, b, ..)| b.owner == ev.player)
        else {
            continue;
        };
        if !motion.in_flight {
            continue; // already handled this flight
        }
        let rules = golf.rules();
        let penalty = match ev.hazard {
            Hazard::Water => rules.water_penalty,
            Hazard::OutOfBounds => rules.out_of_bounds_penalty,
        };
        match golf.penalize(ev.player, penalty) {
            Ok(total) => {
                reset_ball(&mut t, &mut vel, &mut motion);
                info!("PENALTY player={} kind={} strokes={} total={}", ev.player, ev.hazard.label(), penalty, total);
                ev_ui.send(UiMessageEvent::all(UiMessage::Penalty {
                    player: ev.player,
                    reason: ev.hazard.label().to_string(),
                    strokes: penalty,
                }));
                ev_turn_end.send(TurnEndedEvent { player: ev.player, turn, reason: TurnEndReason::Hazard(ev.hazard) });
            }
            Err(e) => debug!("PENALTY ignored: {e}"),
        }
    }

    for ev in ev_stopped.read() {
        if golf.current_player() == Some(ev.player) {
            ev_turn_end.send(TurnEndedEvent { player: ev.player, turn, reason: TurnEndReason::Rested });
        }
    }
}

fn tick_shot_clock(
    time: Res<Time>,
    golf: Option<ResMut<GolfMatch>>,
    mut ev_turn_end: EventWriter<TurnEndedEvent>,
    mut ev_ui: EventWriter<UiMessageEvent>,
) {
    let Some(mut golf) = golf else { return; };
    if !golf.tick_shot_clock(time.delta_seconds()) {
        return;
    }
    let Some(player) = golf.current_player() else { return; };
    let penalty = golf.rules().timeout_penalty;
    match golf.penalize(player, penalty) {
        Ok(total) => {
            info!("PENALTY player={player} kind=timeout strokes={penalty} total={total}");
            ev_ui.send(UiMessageEvent::all(UiMessage::Penalty {
                player,
                reason: "shot clock expired".into(),
                strokes: penalty,
            }));
        }
        Err(e) => warn!("PENALTY timeout not applied: {e}"),
    }
    ev_turn_end.send(TurnEndedEvent { player, turn: golf.turn_number(), reason: TurnEndReason::TimedOut });
}

#[allow(clippy::too_many_arguments)]
fn resolve_turn_end(
    mut commands: Commands,
    golf: Option<ResMut<GolfMatch>>,
    layout: Option<Res<CourseLayout>>,
    mut delayed: ResMut<DelayedActions>,
    mut ev_turn_end: EventReader<TurnEndedEvent>,
    q_balls: Query<(Entity, &GolfBall, &Transform)>,
    mut ev_turn: EventWriter<TurnStartedEvent>,
    mut ev_hole_done: EventWriter<HoleCompletedEvent>,
    mut ev_finished: EventWriter<MatchFinishedEvent>,
    mut ev_ui: EventWriter<UiMessageEvent>,
) {
    let Some(mut golf) = golf else { return; };
    for ev in ev_turn_end.read() {
        if golf.phase() != MatchPhase::InHole || ev.turn != golf.turn_number() {
            debug!("TURN stale end player={} turn={} reason={:?}", ev.player, ev.turn, ev.reason);
            continue;
        }
        if ev.reason != TurnEndReason::Left && golf.current_player() != Some(ev.player) {
            continue;
        }
        let hole = golf.hole();
        let outcome = golf.end_turn();

        if let Some(p) = outcome.picked_up {
            let strokes = golf.strokes(p);
            info!("PICKUP player={p} hole={} strokes={strokes}", hole + 1);
            for (e, ball, _) in &q_balls {
                if ball.owner == p {
                    commands.entity(e).despawn_recursive();
                }
            }
            ev_ui.send(UiMessageEvent::all(UiMessage::HoleOut {
                player: p,
                name: golf.name_of(p).unwrap_or_default().to_string(),
                strokes,
                label: "Picked up".into(),
            }));
        }

        match outcome.next {
            NextTurn::Player(next) => {
                let cup = layout.as_ref().and_then(|l| l.hole(hole)).map(|h| h.cup);
                let ball_pos = q_balls.iter().find(|(_, b, _)| b.owner == next).map(|(_, _, t)| t.translation);
                let aim_yaw = match (ball_pos, cup) {
                    (Some(from), Some(to)) => yaw_toward(from, to),
                    _ => 0.0,
                };
                let stroke = golf.strokes(next);
                debug!("TURN player={next} hole={} stroke={}", hole + 1, stroke + 1);
                ev_turn.send(TurnStartedEvent { player: next, hole, stroke, aim_yaw });
                ev_ui.send(UiMessageEvent::all(turn_message(&golf, next)));
            }
            NextTurn::HoleComplete => {
                info!("HOLE complete hole={}", hole + 1);
                ev_ui.send(UiMessageEvent::all(scoreboard_message(&golf)));
                ev_hole_done.send(HoleCompletedEvent { hole });
                match golf.advance_hole() {
                    HoleAdvance::Next(next) => {
                        delayed.schedule(golf.rules().hole_transition_secs, FlowAction::BeginHole(next));
                    }
                    HoleAdvance::MatchOver(standings) => {
                        if let Some(winner) = standings.first() {
                            info!("MATCH over id={} winner=\"{}\" total={}", golf.id(), winner.name, winner.total);
                        }
                        ev_ui.send(UiMessageEvent::all(UiMessage::MatchOver { standings: standings.clone() }));
                        ev_finished.send(MatchFinishedEvent { standings });
                        delayed.schedule(golf.rules().lobby_return_secs, FlowAction::ReturnToLobby);
                    }
                }
            }
        }
    }
}
