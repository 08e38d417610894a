use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::f32::consts::{FRAC_PI_2, PI};
use std::time::Duration;

use block_golf::plugins::autoplay::{plan_shot, Bot, BotConfig, PlannedShot};
use block_golf::plugins::game_state::PlayerId;
use block_golf::plugins::shooting::*;
use block_golf::plugins::ui_messages::{UiHistory, UiMessage, UiMessageEvent, UiTarget};

#[test]
fn charge_cycle_follows_the_state_machine() {
    let mut s = ShotState::default();
    assert_eq!(s.mode, ShotMode::Idle);
    assert!(!s.begin_charge(), "idle players cannot charge");

    s.arm(0.5);
    assert_eq!(s.mode, ShotMode::Aiming);
    assert!(s.can_aim());
    assert!(s.begin_charge());
    assert!(!s.begin_charge());

    s.advance_charge(0.4);
    assert!((s.power - 0.4).abs() < 1e-6);
    s.advance_charge(0.8); // overshoots the top and turns around
    assert_eq!(s.power, 1.0);
    assert!(!s.rising);
    s.advance_charge(1.5);
    assert_eq!(s.power, 0.0);
    assert!(s.rising);

    assert!(s.cancel_charge());
    assert_eq!(s.mode, ShotMode::Aiming);
    s.disarm();
    assert_eq!(s.mode, ShotMode::Idle);
}

#[test]
fn impulse_scales_with_power_and_points_along_the_aim() {
    let cfg = ShotConfig::default();
    assert!((cfg.power_scale(0.0) - cfg.min_scale).abs() < 1e-6);
    assert!((cfg.power_scale(2.0) - cfg.max_scale).abs() < 1e-6);

    let weak = cfg.impulse(0.0, 0.1);
    let strong = cfg.impulse(0.0, 1.0);
    assert!(strong.length() > weak.length());
    assert!(strong.x > 0.0 && strong.y > 0.0 && strong.z.abs() < 1e-6);

    let dir = aim_direction(FRAC_PI_2, 0.0);
    assert!((dir - Vec3::Z).length() < 1e-5);
}

#[test]
fn yaw_helpers() {
    assert!((wrap_yaw(2.5 * PI) - FRAC_PI_2).abs() < 1e-5);
    assert!((wrap_yaw(-1.5 * PI) - FRAC_PI_2).abs() < 1e-5);
    assert!((wrap_yaw(0.25) - 0.25).abs() < 1e-6);
    let yaw = yaw_toward(Vec3::ZERO, Vec3::new(0.0, 5.0, 3.0));
    assert!((yaw - FRAC_PI_2).abs() < 1e-6);
}

#[test]
fn bot_aims_at_the_cup_with_distance_scaled_power() {
    let cfg = BotConfig { aim_jitter_deg: 0.0, power_jitter: 0.0, ..BotConfig::default() };
    let mut rng = StdRng::seed_from_u64(7);
    let near = plan_shot(Vec3::ZERO, Vec3::new(0.0, 0.0, 2.0), &cfg, &mut rng);
    let far = plan_shot(Vec3::ZERO, Vec3::new(0.0, 0.0, 40.0), &cfg, &mut rng);
    assert!((near.yaw - FRAC_PI_2).abs() < 1e-5);
    assert!(near.power < far.power);
    assert_eq!(far.power, 1.0);
    assert!(near.power >= 0.15);
}

#[test]
fn bot_jitter_stays_within_bounds() {
    let cfg = BotConfig::default();
    let mut rng = StdRng::seed_from_u64(42);
    let cup = Vec3::new(9.0, 0.0, 0.0);
    for _ in 0..50 {
        let plan = plan_shot(Vec3::ZERO, cup, &cfg, &mut rng);
        assert!(plan.yaw.abs() <= cfg.aim_jitter_deg.to_radians() + 1e-5);
        assert!((plan.power - 0.5).abs() <= cfg.power_jitter + 1e-5);
    }
}

#[test]
fn bot_drops_a_plan_whose_charge_never_took() {
    let step = Duration::from_millis(300);
    let mut bot = Bot::new(0.5);
    assert!(!bot.ready_to_plan(step));
    assert!(bot.ready_to_plan(step));

    bot.commit(PlannedShot { yaw: 0.0, power: 0.5 });
    // Back to aiming with the plan still held: the plan is discarded.
    assert!(!bot.ready_to_plan(step));
    assert!(bot.plan().is_none());

    // It thinks again and then plans a fresh shot.
    assert!(!bot.ready_to_plan(step));
    assert!(bot.ready_to_plan(step));
}

#[test]
fn ui_messages_encode_and_route() {
    let msg = UiMessage::Stroke { player: PlayerId(3), strokes: 2 };
    let ron = msg.encode().expect("encodes");
    assert!(ron.contains("Stroke"));
    assert!(ron.contains("strokes:2"));

    let mut history = UiHistory::default();
    history.push(UiMessageEvent::all(UiMessage::Countdown { seconds: 3 }));
    history.push(UiMessageEvent::to(PlayerId(1), UiMessage::Notice { text: "Wait for your turn".into() }));
    assert_eq!(history.len(), 2);
    assert_eq!(history.for_player(PlayerId(1)).count(), 2);
    assert_eq!(history.for_player(PlayerId(2)).count(), 1);
    assert!(UiTarget::All.includes(PlayerId(9)));

    for i in 0..200 {
        history.push(UiMessageEvent::all(UiMessage::Countdown { seconds: i }));
    }
    assert_eq!(history.len(), 128);
    assert!(matches!(history.iter().last().map(|e| &e.message), Some(UiMessage::Countdown { seconds: 199 })));
}
