// Gameplay events shared between plugins.
use bevy::prelude::*;

use crate::plugins::game_state::{PlayerId, Standing};
use crate::plugins::ui_messages::UiMessageEvent;

// ---------------- Requests (host / input -> game) ----------------

#[derive(Event, Debug, Clone)]
pub struct JoinRequestEvent {
    pub name: String,
    pub bot: bool,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct LeaveRequestEvent {
    pub player: PlayerId,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchCommand {
    Start,
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerAction {
    /// Rotate the aim by a yaw delta in radians.
    Aim(f32),
    SetAim(f32),
    BeginCharge,
    Release,
    Cancel,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct PlayerActionEvent {
    pub player: PlayerId,
    pub action: PlayerAction,
}

// ---------------- Ball ----------------

#[derive(Event, Debug, Clone, Copy)]
pub struct ShotFiredEvent {
    pub player: PlayerId,
    pub origin: Vec3,
    pub impulse: Vec3,
    pub power: f32,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct BallStoppedEvent {
    pub player: PlayerId,
    pub position: Vec3,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct BallInCupEvent {
    pub player: PlayerId,
    pub hole: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hazard {
    Water,
    OutOfBounds,
}

impl Hazard {
    pub fn label(self) -> &'static str {
        match self {
            Hazard::Water => "water",
            Hazard::OutOfBounds => "out of bounds",
        }
    }
}

#[derive(Event, Debug, Clone, Copy)]
pub struct BallHazardEvent {
    pub player: PlayerId,
    pub hazard: Hazard,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct BallImpactEvent {
    pub pos: Vec3,
    pub intensity: f32,
}

// ---------------- Flow ----------------

#[derive(Event, Debug, Clone, Copy)]
pub struct TurnStartedEvent {
    pub player: PlayerId,
    pub hole: usize,
    pub stroke: u32,
    /// Yaw pointing from the player's ball toward the cup.
    pub aim_yaw: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnEndReason {
    Rested,
    HoledOut,
    Hazard(Hazard),
    TimedOut,
    Left,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct TurnEndedEvent {
    pub player: PlayerId,
    pub turn: u64,
    pub reason: TurnEndReason,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct PlayerHoledOutEvent {
    pub player: PlayerId,
    pub hole: usize,
    pub strokes: u32,
    pub par: u32,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct HoleCompletedEvent {
    pub hole: usize,
}

#[derive(Event, Debug, Clone)]
pub struct MatchFinishedEvent {
    pub standings: Vec<Standing>,
}

pub fn register_events(app: &mut App) {
    app.add_event::<JoinRequestEvent>()
        .add_event::<LeaveRequestEvent>()
        .add_event::<MatchCommand>()
        .add_event::<PlayerActionEvent>()
        .add_event::<ShotFiredEvent>()
        .add_event::<BallStoppedEvent>()
        .add_event::<BallInCupEvent>()
        .add_event::<BallHazardEvent>()
        .add_event::<BallImpactEvent>()
        .add_event::<TurnStartedEvent>()
        .add_event::<TurnEndedEvent>()
        .add_event::<PlayerHoledOutEvent>()
        .add_event::<HoleCompletedEvent>()
        .add_event::<MatchFinishedEvent>()
        .add_event::<UiMessageEvent>();
}
