// Headless match runs: no renderer and no Rapier pipeline. Balls never move on
// their own, so a released shot simply comes to rest after the rest window, and
// cup/water contacts are injected as collision events.

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use bevy_rapier3d::prelude::CollisionEvent;
use bevy_rapier3d::rapier::geometry::CollisionEventFlags;
use std::time::Duration;

use block_golf::launch::LaunchOptions;
use block_golf::plugins::ball::{BallMotion, BallPlugin, GolfBall};
use block_golf::plugins::core_sim::CoreSimPlugin;
use block_golf::plugins::course::{CourseDef, CoursePlugin, RulesDef};
use block_golf::plugins::course_builder::{CourseBuilderPlugin, CourseLayout, HoleCup, WaterHazard};
use block_golf::plugins::events::{
    JoinRequestEvent, LeaveRequestEvent, MatchCommand, PlayerAction, PlayerActionEvent, TurnEndReason, TurnEndedEvent,
};
use block_golf::plugins::game_flow::GameFlowPlugin;
use block_golf::plugins::game_state::{GolfMatch, MatchPhase, Player, PlayerId};
use block_golf::plugins::scheduler::{DelayedActions, FlowAction};
use block_golf::plugins::shooting::{ShootingPlugin, ShotMode, ShotState};
use block_golf::plugins::ui_messages::{UiHistory, UiMessage, UiMessagesPlugin};

const COURSE: &str = r#"(
    name: "Test Links",
    holes: [
        (name: "Short", par: 2, origin: (0, 0, 0), size: (5, 10), tee: (2, 1), cup: (2, 8),
            features: [Water(min: (0, 4), max: (0, 5))]),
        (name: "Long", par: 3, origin: (8, 0, 0), size: (5, 14), tee: (2, 1), cup: (2, 12)),
    ],
)"#;

fn quick_rules() -> RulesDef {
    RulesDef {
        start_countdown_secs: 1,
        shot_clock_secs: 0.0,
        hole_transition_secs: 0.5,
        lobby_return_secs: 0.5,
        ..RulesDef::default()
    }
}

fn build_app(players: u32, rules: RulesDef) -> App {
    let mut course = CourseDef::from_ron(COURSE).expect("test course");
    course.rules = rules;

    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(100)))
        .insert_resource(LaunchOptions { players, ..LaunchOptions::default() })
        .insert_resource(course)
        .add_plugins(CoreSimPlugin)
        .add_plugins(CoursePlugin)
        .add_plugins(CourseBuilderPlugin)
        .add_plugins(BallPlugin)
        .add_plugins(ShootingPlugin)
        .add_plugins(GameFlowPlugin)
        .add_plugins(UiMessagesPlugin);
    app
}

fn run_until(app: &mut App, max_updates: usize, what: &str, cond: impl Fn(&mut App) -> bool) {
    for _ in 0..max_updates {
        app.update();
        if cond(app) {
            return;
        }
    }
    panic!("timed out waiting for {what}");
}

fn golf(app: &App) -> &GolfMatch {
    app.world().resource::<GolfMatch>()
}

fn shot_mode(app: &mut App, player: PlayerId) -> Option<ShotMode> {
    let mut q = app.world_mut().query::<(&Player, &ShotState)>();
    q.iter(app.world()).find(|(p, _)| p.id == player).map(|(_, s)| s.mode)
}

fn ball_of(app: &mut App, player: PlayerId) -> Option<Entity> {
    let mut q = app.world_mut().query::<(Entity, &GolfBall)>();
    q.iter(app.world()).find(|(_, b)| b.owner == player).map(|(e, _)| e)
}

fn cup_of(app: &mut App, hole: usize) -> Entity {
    let mut q = app.world_mut().query::<(Entity, &HoleCup)>();
    q.iter(app.world()).find(|(_, c)| c.hole == hole).map(|(e, _)| e).expect("cup sensor")
}

/// Seats the launch players, starts the match and waits for the first player to be armed.
fn start_match(app: &mut App) -> PlayerId {
    app.update();
    app.world_mut().send_event(MatchCommand::Start);
    run_until(app, 40, "first hole", |app| golf(app).phase() == MatchPhase::InHole);
    let first = golf(app).current_player().expect("active player");
    run_until(app, 5, "first player armed", |app| shot_mode(app, first) == Some(ShotMode::Aiming));
    first
}

fn shoot(app: &mut App, player: PlayerId) {
    app.world_mut().send_event(PlayerActionEvent { player, action: PlayerAction::BeginCharge });
    app.world_mut().send_event(PlayerActionEvent { player, action: PlayerAction::Release });
}

fn messages(app: &App) -> Vec<UiMessage> {
    app.world().resource::<UiHistory>().iter().map(|e| e.message.clone()).collect()
}

#[test]
fn launch_players_are_seated_in_the_lobby() {
    let mut app = build_app(3, quick_rules());
    app.update();
    app.update();
    let g = golf(&app);
    assert_eq!(g.phase(), MatchPhase::Lobby);
    assert_eq!(g.roster().len(), 3);
    assert!(messages(&app).iter().any(|m| matches!(m, UiMessage::Lobby { players, .. } if players.len() == 3)));
}

#[test]
fn resting_ball_hands_the_turn_to_the_next_player() {
    let mut app = build_app(2, quick_rules());
    let first = start_match(&mut app);
    assert!(messages(&app).iter().any(|m| matches!(m, UiMessage::Countdown { seconds: 1 })));
    assert!(messages(&app).iter().any(|m| matches!(m, UiMessage::HoleIntro { hole: 0, .. })));

    shoot(&mut app, first);
    app.update();
    assert_eq!(golf(&app).strokes(first), 1);
    assert_eq!(shot_mode(&mut app, first), Some(ShotMode::Rolling));

    run_until(&mut app, 30, "turn hand-over", |app| golf(app).current_player() != Some(first));
    let second = golf(&app).current_player().expect("second player");
    assert_ne!(second, first);
    run_until(&mut app, 5, "second player armed", |app| shot_mode(app, second) == Some(ShotMode::Aiming));
    assert_eq!(shot_mode(&mut app, first), Some(ShotMode::Idle));
}

#[test]
fn out_of_turn_actions_are_ignored() {
    let mut app = build_app(2, quick_rules());
    let first = start_match(&mut app);
    let other = golf(&app).roster().iter().map(|p| p.id).find(|id| *id != first).expect("second seat");

    shoot(&mut app, other);
    app.update();
    app.update();
    assert_eq!(golf(&app).strokes(other), 0);
    assert_eq!(golf(&app).current_player(), Some(first));
    let history = app.world().resource::<UiHistory>();
    assert!(history.for_player(other).any(|m| matches!(m, UiMessage::Notice { .. })));
}

#[test]
fn cup_contact_holes_out_and_finishes_the_match() {
    let mut app = build_app(1, quick_rules());
    let player = start_match(&mut app);

    // Hole 1: sink it with the first stroke.
    let ball = ball_of(&mut app, player).expect("ball on tee");
    let cup = cup_of(&mut app, 0);
    shoot(&mut app, player);
    app.world_mut().send_event(CollisionEvent::Started(ball, cup, CollisionEventFlags::SENSOR));
    app.update();
    app.update();
    assert_eq!(golf(&app).scorecard().strokes(player, 0), 1);
    assert!(messages(&app)
        .iter()
        .any(|m| matches!(m, UiMessage::HoleOut { label, strokes: 1, .. } if label == "Hole in one!")));
    assert!(messages(&app).iter().any(|m| matches!(m, UiMessage::Scoreboard { hole: 0, .. })));

    // Hole 2 starts after the transition with a fresh ball at the new tee.
    run_until(&mut app, 20, "second hole", |app| golf(app).hole() == 1 && golf(app).phase() == MatchPhase::InHole);
    run_until(&mut app, 5, "armed on hole 2", |app| shot_mode(app, player) == Some(ShotMode::Aiming));
    let tee = app.world().resource::<CourseLayout>().holes[1].tee;
    let ball = ball_of(&mut app, player).expect("ball on second tee");
    assert_eq!(app.world().get::<Transform>(ball).map(|t| t.translation), Some(tee));

    let cup = cup_of(&mut app, 1);
    shoot(&mut app, player);
    app.update();
    shoot_again_after_rest(&mut app, player);
    app.world_mut().send_event(CollisionEvent::Started(cup, ball, CollisionEventFlags::SENSOR));
    app.update();
    app.update();

    assert_eq!(golf(&app).phase(), MatchPhase::Finished);
    let over = messages(&app).into_iter().find_map(|m| match m {
        UiMessage::MatchOver { standings } => Some(standings),
        _ => None,
    });
    let standings = over.expect("match over message");
    assert_eq!(standings.len(), 1);
    assert_eq!(standings[0].total, 3);
    assert_eq!(standings[0].to_par, -2);

    // Back to the lobby with a new match id.
    let finished_id = golf(&app).id();
    run_until(&mut app, 20, "lobby return", |app| golf(app).phase() == MatchPhase::Lobby);
    assert_ne!(golf(&app).id(), finished_id);
    assert!(ball_of(&mut app, player).is_none());
}

// Waits for the previous shot to settle, then fires once more.
fn shoot_again_after_rest(app: &mut App, player: PlayerId) {
    run_until(app, 30, "re-armed", |app| shot_mode(app, player) == Some(ShotMode::Aiming));
    shoot(app, player);
}

#[test]
fn out_of_bounds_costs_a_stroke_and_replays_from_the_last_lie() {
    let mut app = build_app(1, quick_rules());
    let player = start_match(&mut app);
    let ball = ball_of(&mut app, player).expect("ball");
    let tee = app.world().get::<Transform>(ball).expect("transform").translation;

    shoot(&mut app, player);
    app.update();
    let kill_y = app.world().resource::<CourseLayout>().kill_y;
    app.world_mut().get_mut::<Transform>(ball).expect("transform").translation.y = kill_y - 5.0;
    app.update();

    assert_eq!(golf(&app).strokes(player), 2);
    assert_eq!(app.world().get::<Transform>(ball).map(|t| t.translation), Some(tee));
    assert_eq!(app.world().get::<BallMotion>(ball).map(|m| m.in_flight), Some(false));
    assert!(messages(&app).iter().any(|m| matches!(m, UiMessage::Penalty { strokes: 1, .. })));
    // Solo player keeps the tee.
    run_until(&mut app, 5, "re-armed", |app| shot_mode(app, player) == Some(ShotMode::Aiming));
}

#[test]
fn shot_clock_penalizes_and_skips_an_idle_player() {
    let rules = RulesDef { shot_clock_secs: 1.0, ..quick_rules() };
    let mut app = build_app(2, rules);
    let first = start_match(&mut app);
    run_until(&mut app, 20, "timeout", |app| golf(app).current_player() != Some(first));
    assert_eq!(golf(&app).strokes(first), 1);
    assert!(messages(&app)
        .iter()
        .any(|m| matches!(m, UiMessage::Penalty { reason, .. } if reason.contains("clock"))));
}

#[test]
fn active_player_leaving_passes_the_turn() {
    let mut app = build_app(2, quick_rules());
    let first = start_match(&mut app);
    app.world_mut().send_event(LeaveRequestEvent { player: first });
    run_until(&mut app, 5, "turn after leave", |app| {
        golf(app).current_player().is_some_and(|p| p != first)
    });
    app.update();
    assert_eq!(golf(&app).roster().len(), 1);
    assert!(ball_of(&mut app, first).is_none());
}

#[test]
fn last_player_leaving_returns_to_the_lobby() {
    let mut app = build_app(1, quick_rules());
    let player = start_match(&mut app);
    app.world_mut().send_event(LeaveRequestEvent { player });
    app.update();
    app.update();
    assert_eq!(golf(&app).phase(), MatchPhase::Lobby);
    assert!(golf(&app).roster().is_empty());
}

#[test]
fn water_contact_costs_a_stroke_and_hands_over_the_turn() {
    let mut app = build_app(2, quick_rules());
    let first = start_match(&mut app);
    let ball = ball_of(&mut app, first).expect("ball");
    let tee = app.world().get::<Transform>(ball).expect("transform").translation;
    let water = {
        let mut q = app.world_mut().query_filtered::<Entity, With<WaterHazard>>();
        q.iter(app.world()).next().expect("water sensor")
    };

    shoot(&mut app, first);
    app.update();
    app.world_mut().get_mut::<Transform>(ball).expect("transform").translation += Vec3::new(0.0, 0.0, 3.0);
    app.world_mut().send_event(CollisionEvent::Started(ball, water, CollisionEventFlags::SENSOR));
    app.update();

    assert_eq!(golf(&app).strokes(first), 2);
    assert_eq!(app.world().get::<Transform>(ball).map(|t| t.translation), Some(tee));
    assert_eq!(app.world().get::<BallMotion>(ball).map(|m| m.in_flight), Some(false));
    assert!(messages(&app)
        .iter()
        .any(|m| matches!(m, UiMessage::Penalty { reason, strokes: 1, .. } if reason == "water")));
    assert_ne!(golf(&app).current_player(), Some(first));
}

#[test]
fn abort_cancels_timers_and_clears_the_course() {
    let mut app = build_app(2, quick_rules());
    app.update();
    app.world_mut().send_event(MatchCommand::Start);
    app.update();
    assert!(app.world().resource::<DelayedActions>().contains(FlowAction::BeginMatch));

    // During the countdown: the pending start is dropped.
    app.world_mut().send_event(MatchCommand::Abort);
    app.update();
    assert_eq!(golf(&app).phase(), MatchPhase::Lobby);
    assert!(app.world().resource::<DelayedActions>().is_empty());
    for _ in 0..15 {
        app.update();
    }
    assert_eq!(golf(&app).phase(), MatchPhase::Lobby);

    // Mid-hole: every ball is removed.
    let first = start_match(&mut app);
    assert!(ball_of(&mut app, first).is_some());
    app.world_mut().send_event(MatchCommand::Abort);
    app.update();
    app.update();
    assert_eq!(golf(&app).phase(), MatchPhase::Lobby);
    assert!(app.world().resource::<DelayedActions>().is_empty());
    let mut q = app.world_mut().query::<&GolfBall>();
    assert_eq!(q.iter(app.world()).count(), 0);
}

#[test]
fn stale_turn_end_is_ignored() {
    let mut app = build_app(2, quick_rules());
    let first = start_match(&mut app);
    let turn = golf(&app).turn_number();
    app.world_mut().send_event(TurnEndedEvent { player: first, turn: turn - 1, reason: TurnEndReason::Rested });
    app.update();
    app.update();
    assert_eq!(golf(&app).current_player(), Some(first));
    assert_eq!(golf(&app).turn_number(), turn);
    assert_eq!(shot_mode(&mut app, first), Some(ShotMode::Aiming));
}

#[test]
fn joining_mid_match_seats_a_spectator_until_the_lobby() {
    let mut app = build_app(1, quick_rules());
    let player = start_match(&mut app);
    app.world_mut().send_event(JoinRequestEvent { name: "Late".into(), bot: false });
    app.update();

    let late = golf(&app).spectators().first().map(|p| p.id).expect("spectator");
    assert_eq!(golf(&app).roster().len(), 1);
    assert_eq!(golf(&app).current_player(), Some(player));
    assert!(ball_of(&mut app, late).is_none());
    assert_eq!(shot_mode(&mut app, late), Some(ShotMode::Idle));
    let history = app.world().resource::<UiHistory>();
    assert!(history.for_player(late).any(|m| matches!(m, UiMessage::Notice { .. })));

    app.world_mut().send_event(MatchCommand::Abort);
    app.update();
    assert!(golf(&app).roster().iter().any(|p| p.id == late));
    assert!(golf(&app).spectators().is_empty());
}
