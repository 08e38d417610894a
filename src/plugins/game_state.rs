// Match model: roster, turn order, hole progression, scorecard & penalties.
// Pure state; the ECS side lives in game_flow.rs.

use bevy::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::plugins::course::RulesDef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Player entity marker; the match model refers to players by id only.
#[derive(Component, Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchId(pub Uuid);

impl MatchId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPhase {
    #[default]
    Lobby,
    Starting,
    InHole,
    BetweenHoles,
    Finished,
}

/// Where an admitted player ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seat {
    Roster,
    Spectator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoleStatus {
    Playing,
    HoledOut,
    PickedUp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: PlayerId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    NotInLobby,
    NotEnoughPlayers { have: usize, need: usize },
    MatchFull { max: usize },
    EmptyName,
    UnknownPlayer(PlayerId),
    NotYourTurn(PlayerId),
    NoActiveHole,
    NoSuchHole(usize),
    NoPlayers,
    AlreadyFinished(PlayerId),
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchError::NotInLobby => write!(f, "a match is already running"),
            MatchError::NotEnoughPlayers { have, need } => {
                write!(f, "need {need} players to start, have {have}")
            }
            MatchError::MatchFull { max } => write!(f, "match is full ({max} players)"),
            MatchError::EmptyName => write!(f, "player name must not be empty"),
            MatchError::UnknownPlayer(id) => write!(f, "unknown player {id}"),
            MatchError::NotYourTurn(id) => write!(f, "it is not player {id}'s turn"),
            MatchError::NoActiveHole => write!(f, "no hole is being played"),
            MatchError::NoSuchHole(i) => write!(f, "course has no hole {}", i + 1),
            MatchError::NoPlayers => write!(f, "no players on the roster"),
            MatchError::AlreadyFinished(id) => write!(f, "player {id} already finished this hole"),
        }
    }
}

impl std::error::Error for MatchError {}

/// Per-player strokes for every hole of the course.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScoreRow {
    pub strokes: Vec<u32>,
    pub penalties: Vec<u32>,
    pub played: Vec<bool>,
}

impl ScoreRow {
    fn new(holes: usize) -> Self {
        Self {
            strokes: vec![0; holes],
            penalties: vec![0; holes],
            played: vec![false; holes],
        }
    }

    pub fn total(&self) -> u32 {
        self.strokes.iter().sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scorecard {
    rows: BTreeMap<PlayerId, ScoreRow>,
}

impl Scorecard {
    pub fn row(&self, player: PlayerId) -> Option<&ScoreRow> {
        self.rows.get(&player)
    }

    pub fn rows(&self) -> impl Iterator<Item = (&PlayerId, &ScoreRow)> {
        self.rows.iter()
    }

    pub fn strokes(&self, player: PlayerId, hole: usize) -> u32 {
        self.rows
            .get(&player)
            .and_then(|r| r.strokes.get(hole).copied())
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoleResult {
    pub player: PlayerId,
    pub hole: usize,
    pub strokes: u32,
    pub par: u32,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Removal {
    pub seat: Seat,
    pub was_active: bool,
    pub roster_empty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextTurn {
    Player(PlayerId),
    HoleComplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnOutcome {
    pub picked_up: Option<PlayerId>,
    pub next: NextTurn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HoleAdvance {
    Next(usize),
    MatchOver(Vec<Standing>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Standing {
    pub player: PlayerId,
    pub name: String,
    pub total: u32,
    pub to_par: i32,
    pub rank: u32,
}

/// Golf name for a finished hole.
pub fn score_label(strokes: u32, par: u32) -> String {
    if strokes == 1 {
        return "Hole in one!".to_string();
    }
    match strokes as i64 - par as i64 {
        i64::MIN..=-4 => format!("{} under", par - strokes),
        -3 => "Albatross".to_string(),
        -2 => "Eagle".to_string(),
        -1 => "Birdie".to_string(),
        0 => "Par".to_string(),
        1 => "Bogey".to_string(),
        2 => "Double bogey".to_string(),
        3 => "Triple bogey".to_string(),
        n => format!("+{n}"),
    }
}

#[derive(Resource, Debug)]
pub struct GolfMatch {
    id: MatchId,
    rules: RulesDef,
    pars: Vec<u32>,
    phase: MatchPhase,
    roster: Vec<Participant>,
    spectators: Vec<Participant>,
    next_id: u32,
    hole: usize,
    status: BTreeMap<PlayerId, HoleStatus>,
    active: Option<PlayerId>,
    // seat to resume from when the active player left mid-turn
    resume_at: usize,
    turn: u64,
    shot_clock: f32,
    shot_in_progress: bool,
    scorecard: Scorecard,
}

impl GolfMatch {
    pub fn new(rules: RulesDef, pars: Vec<u32>) -> Self {
        Self {
            id: MatchId::new(),
            rules,
            pars,
            phase: MatchPhase::Lobby,
            roster: Vec::new(),
            spectators: Vec::new(),
            next_id: 1,
            hole: 0,
            status: BTreeMap::new(),
            active: None,
            resume_at: 0,
            turn: 0,
            shot_clock: 0.0,
            shot_in_progress: false,
            scorecard: Scorecard::default(),
        }
    }

    pub fn id(&self) -> MatchId { self.id }
    pub fn rules(&self) -> &RulesDef { &self.rules }
    pub fn phase(&self) -> MatchPhase { self.phase }
    pub fn hole(&self) -> usize { self.hole }
    pub fn hole_count(&self) -> usize { self.pars.len() }
    pub fn par(&self, hole: usize) -> Option<u32> { self.pars.get(hole).copied() }
    pub fn roster(&self) -> &[Participant] { &self.roster }
    pub fn spectators(&self) -> &[Participant] { &self.spectators }
    pub fn scorecard(&self) -> &Scorecard { &self.scorecard }
    pub fn current_player(&self) -> Option<PlayerId> { self.active }
    pub fn turn_number(&self) -> u64 { self.turn }
    pub fn shot_in_progress(&self) -> bool { self.shot_in_progress }

    pub fn is_running(&self) -> bool {
        !matches!(self.phase, MatchPhase::Lobby)
    }

    pub fn name_of(&self, player: PlayerId) -> Option<&str> {
        self.roster
            .iter()
            .chain(self.spectators.iter())
            .find(|p| p.id == player)
            .map(|p| p.name.as_str())
    }

    pub fn status_of(&self, player: PlayerId) -> Option<HoleStatus> {
        self.status.get(&player).copied()
    }

    pub fn strokes(&self, player: PlayerId) -> u32 {
        self.scorecard.strokes(player, self.hole)
    }

    pub fn admit(&mut self, name: &str) -> Result<(PlayerId, Seat), MatchError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MatchError::EmptyName);
        }
        let seat = if self.phase == MatchPhase::Lobby {
            if self.roster.len() >= self.rules.max_players as usize {
                return Err(MatchError::MatchFull { max: self.rules.max_players as usize });
            }
            Seat::Roster
        } else {
            Seat::Spectator
        };
        let id = PlayerId(self.next_id);
        self.next_id += 1;
        let participant = Participant { id, name: name.to_string() };
        match seat {
            Seat::Roster => self.roster.push(participant),
            Seat::Spectator => self.spectators.push(participant),
        }
        Ok((id, seat))
    }

    pub fn remove(&mut self, player: PlayerId) -> Result<Removal, MatchError> {
        if let Some(pos) = self.spectators.iter().position(|p| p.id == player) {
            self.spectators.remove(pos);
            return Ok(Removal {
                seat: Seat::Spectator,
                was_active: false,
                roster_empty: self.roster.is_empty(),
            });
        }
        let pos = self
            .roster
            .iter()
            .position(|p| p.id == player)
            .ok_or(MatchError::UnknownPlayer(player))?;
        self.roster.remove(pos);
        self.status.remove(&player);
        let was_active = self.active == Some(player);
        if was_active {
            self.active = None;
            self.resume_at = pos;
            self.shot_in_progress = false;
            self.shot_clock = 0.0;
        } else if self.active.is_none() && pos < self.resume_at {
            // Keep the cursor on the seat that was next in line.
            self.resume_at -= 1;
        }
        Ok(Removal { seat: Seat::Roster, was_active, roster_empty: self.roster.is_empty() })
    }

    pub fn start(&mut self) -> Result<(), MatchError> {
        if self.phase != MatchPhase::Lobby {
            return Err(MatchError::NotInLobby);
        }
        let need = self.rules.min_players.max(1) as usize;
        if self.roster.len() < need {
            return Err(MatchError::NotEnoughPlayers { have: self.roster.len(), need });
        }
        self.phase = MatchPhase::Starting;
        Ok(())
    }

    /// Activates hole `index` and returns the player who tees off.
    pub fn begin_hole(&mut self, index: usize) -> Result<PlayerId, MatchError> {
        if index >= self.pars.len() {
            return Err(MatchError::NoSuchHole(index));
        }
        if self.roster.is_empty() {
            return Err(MatchError::NoPlayers);
        }
        if index == 0 || self.phase == MatchPhase::Starting {
            let holes = self.pars.len();
            self.scorecard.rows = self
                .roster
                .iter()
                .map(|p| (p.id, ScoreRow::new(holes)))
                .collect();
        } else {
            // Honors: lowest score on the previous hole tees off first.
            let prev = index - 1;
            let card = &self.scorecard;
            self.roster.sort_by_key(|p| card.strokes(p.id, prev));
        }
        let holes = self.pars.len();
        for p in &self.roster {
            let row = self.scorecard.rows.entry(p.id).or_insert_with(|| ScoreRow::new(holes));
            row.played[index] = true;
        }
        self.hole = index;
        self.phase = MatchPhase::InHole;
        self.status = self.roster.iter().map(|p| (p.id, HoleStatus::Playing)).collect();
        self.active = None;
        self.resume_at = 0;
        match self.next_turn() {
            NextTurn::Player(id) => Ok(id),
            NextTurn::HoleComplete => Err(MatchError::NoPlayers),
        }
    }

    fn require_active(&self, player: PlayerId) -> Result<(), MatchError> {
        if self.phase != MatchPhase::InHole {
            return Err(MatchError::NoActiveHole);
        }
        if self.active != Some(player) {
            return Err(MatchError::NotYourTurn(player));
        }
        Ok(())
    }

    pub fn record_stroke(&mut self, player: PlayerId) -> Result<u32, MatchError> {
        self.require_active(player)?;
        let hole = self.hole;
        let row = self
            .scorecard
            .rows
            .get_mut(&player)
            .ok_or(MatchError::UnknownPlayer(player))?;
        row.strokes[hole] += 1;
        self.shot_in_progress = true;
        self.shot_clock = 0.0;
        Ok(row.strokes[hole])
    }

    pub fn penalize(&mut self, player: PlayerId, strokes: u32) -> Result<u32, MatchError> {
        if self.phase != MatchPhase::InHole {
            return Err(MatchError::NoActiveHole);
        }
        match self.status.get(&player) {
            None => return Err(MatchError::UnknownPlayer(player)),
            Some(HoleStatus::Playing) => {}
            Some(_) => return Err(MatchError::AlreadyFinished(player)),
        }
        let hole = self.hole;
        let row = self
            .scorecard
            .rows
            .get_mut(&player)
            .ok_or(MatchError::UnknownPlayer(player))?;
        row.strokes[hole] += strokes;
        row.penalties[hole] += strokes;
        Ok(row.strokes[hole])
    }

    pub fn hole_out(&mut self, player: PlayerId) -> Result<HoleResult, MatchError> {
        self.require_active(player)?;
        if self.status.get(&player) != Some(&HoleStatus::Playing) {
            return Err(MatchError::AlreadyFinished(player));
        }
        self.status.insert(player, HoleStatus::HoledOut);
        let strokes = self.strokes(player);
        let par = self.pars[self.hole];
        Ok(HoleResult {
            player,
            hole: self.hole,
            strokes,
            par,
            label: score_label(strokes, par),
        })
    }

    /// Closes the active player's turn and hands the ball to the next seat.
    pub fn end_turn(&mut self) -> TurnOutcome {
        let mut picked_up = None;
        if let Some(player) = self.active {
            let max = self.rules.max_strokes;
            if self.status.get(&player) == Some(&HoleStatus::Playing) && self.strokes(player) >= max {
                self.status.insert(player, HoleStatus::PickedUp);
                if let Some(row) = self.scorecard.rows.get_mut(&player) {
                    row.strokes[self.hole] = max;
                }
                picked_up = Some(player);
            }
        }
        self.shot_in_progress = false;
        self.shot_clock = 0.0;
        let next = self.next_turn();
        TurnOutcome { picked_up, next }
    }

    fn next_turn(&mut self) -> NextTurn {
        self.turn += 1;
        let n = self.roster.len();
        let start = match self.active.and_then(|a| self.roster.iter().position(|p| p.id == a)) {
            Some(pos) => pos + 1,
            None => self.resume_at,
        };
        for offset in 0..n {
            let id = self.roster[(start + offset) % n].id;
            if self.status.get(&id) == Some(&HoleStatus::Playing) {
                self.active = Some(id);
                return NextTurn::Player(id);
            }
        }
        self.active = None;
        if self.phase == MatchPhase::InHole {
            self.phase = MatchPhase::BetweenHoles;
        }
        NextTurn::HoleComplete
    }

    pub fn advance_hole(&mut self) -> HoleAdvance {
        if self.hole + 1 < self.pars.len() {
            HoleAdvance::Next(self.hole + 1)
        } else {
            self.phase = MatchPhase::Finished;
            HoleAdvance::MatchOver(self.standings())
        }
    }

    pub fn standings(&self) -> Vec<Standing> {
        let mut out: Vec<Standing> = self
            .roster
            .iter()
            .filter_map(|p| {
                let row = self.scorecard.row(p.id)?;
                let par_played: u32 = row
                    .played
                    .iter()
                    .zip(self.pars.iter())
                    .filter(|(played, _)| **played)
                    .map(|(_, par)| *par)
                    .sum();
                let total = row.total();
                Some(Standing {
                    player: p.id,
                    name: p.name.clone(),
                    total,
                    to_par: total as i32 - par_played as i32,
                    rank: 0,
                })
            })
            .collect();
        out.sort_by_key(|s| s.total);
        let mut prev_total = None;
        let mut rank = 0;
        for (i, s) in out.iter_mut().enumerate() {
            if prev_total != Some(s.total) {
                rank = i as u32 + 1;
                prev_total = Some(s.total);
            }
            s.rank = rank;
        }
        out
    }

    /// Advances the active player's shot clock; true once on expiry.
    pub fn tick_shot_clock(&mut self, dt: f32) -> bool {
        let limit = self.rules.shot_clock_secs;
        if limit <= 0.0 || self.phase != MatchPhase::InHole || self.active.is_none() || self.shot_in_progress {
            return false;
        }
        self.shot_clock += dt;
        if self.shot_clock >= limit {
            self.shot_clock = 0.0;
            self.shot_in_progress = true;
            return true;
        }
        false
    }

    pub fn shot_clock_remaining(&self) -> Option<f32> {
        let limit = self.rules.shot_clock_secs;
        if limit <= 0.0 || self.active.is_none() || self.shot_in_progress {
            return None;
        }
        Some((limit - self.shot_clock).max(0.0))
    }

    pub fn reset_to_lobby(&mut self) {
        let max = self.rules.max_players as usize;
        while self.roster.len() < max && !self.spectators.is_empty() {
            let p = self.spectators.remove(0);
            self.roster.push(p);
        }
        self.id = MatchId::new();
        self.phase = MatchPhase::Lobby;
        self.hole = 0;
        self.status.clear();
        self.active = None;
        self.resume_at = 0;
        self.shot_clock = 0.0;
        self.shot_in_progress = false;
        self.scorecard = Scorecard::default();
    }
}
