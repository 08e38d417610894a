//! Structured messages addressed to player UIs.
//!
//! Gameplay code never touches UI nodes directly: it sends [`UiMessageEvent`]s,
//! which the local HUD renders and a host transport could forward as RON.
use bevy::prelude::*;
use serde::Serialize;
use std::collections::VecDeque;

use crate::plugins::core_sim::GolfSet;
use crate::plugins::game_state::{PlayerId, Standing};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UiTarget {
    All,
    Player(PlayerId),
}

impl UiTarget {
    pub fn includes(self, player: PlayerId) -> bool {
        match self {
            UiTarget::All => true,
            UiTarget::Player(p) => p == player,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreboardRow {
    pub player: PlayerId,
    pub name: String,
    pub strokes: Vec<u32>,
    pub total: u32,
    pub to_par: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum UiMessage {
    Lobby { course: String, players: Vec<String>, min_players: u32 },
    Countdown { seconds: u32 },
    HoleIntro { hole: usize, holes: usize, name: String, par: u32 },
    TurnStarted { player: PlayerId, name: String, stroke: u32 },
    Power { power: f32 },
    Stroke { player: PlayerId, strokes: u32 },
    Penalty { player: PlayerId, reason: String, strokes: u32 },
    HoleOut { player: PlayerId, name: String, strokes: u32, label: String },
    Scoreboard { hole: usize, pars: Vec<u32>, rows: Vec<ScoreboardRow> },
    MatchOver { standings: Vec<Standing> },
    Notice { text: String },
}

impl UiMessage {
    /// RON payload for a host transport.
    pub fn encode(&self) -> Result<String, ron::Error> {
        ron::to_string(self)
    }
}

#[derive(Event, Debug, Clone, PartialEq)]
pub struct UiMessageEvent {
    pub target: UiTarget,
    pub message: UiMessage,
}

impl UiMessageEvent {
    pub fn all(message: UiMessage) -> Self {
        Self { target: UiTarget::All, message }
    }

    pub fn to(player: PlayerId, message: UiMessage) -> Self {
        Self { target: UiTarget::Player(player), message }
    }
}

const HISTORY_CAP: usize = 128;

/// Most recent messages, oldest first.
#[derive(Resource, Debug, Default)]
pub struct UiHistory {
    entries: VecDeque<UiMessageEvent>,
}

impl UiHistory {
    pub fn push(&mut self, ev: UiMessageEvent) {
        if self.entries.len() == HISTORY_CAP {
            self.entries.pop_front();
        }
        self.entries.push_back(ev);
    }

    pub fn iter(&self) -> impl Iterator<Item = &UiMessageEvent> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Messages a given player would have received.
    pub fn for_player(&self, player: PlayerId) -> impl Iterator<Item = &UiMessage> {
        self.entries
            .iter()
            .filter(move |e| e.target.includes(player))
            .map(|e| &e.message)
    }
}

pub struct UiMessagesPlugin;
impl Plugin for UiMessagesPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<UiMessageEvent>()
            .init_resource::<UiHistory>()
            .add_systems(Update, record_ui_history.in_set(GolfSet::Present));
    }
}

fn record_ui_history(mut ev_ui: EventReader<UiMessageEvent>, mut history: ResMut<UiHistory>) {
    for ev in ev_ui.read() {
        if !matches!(ev.message, UiMessage::Power { .. }) {
            match ev.message.encode() {
                Ok(payload) => debug!("UI target={:?} payload={payload}", ev.target),
                Err(e) => warn!("UI encode failed: {e}"),
            }
        }
        history.push(ev.clone());
    }
}
