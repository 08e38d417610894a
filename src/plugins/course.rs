// Course definition (RON) & loading.
use bevy::prelude::*;
use serde::Deserialize;
use std::fmt;
#[cfg(not(target_arch = "wasm32"))]
use std::fs;

use crate::launch::LaunchOptions;
use crate::plugins::ball::BallTuning;
use crate::plugins::shooting::ShotConfig;

const EMBEDDED_COURSE: &str = include_str!("../../assets/courses/meadow.ron");

// ----------------------- Course Definition (RON) -----------------------

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct RulesDef {
    pub min_players: u32,
    pub max_players: u32,
    pub start_countdown_secs: u32,
    pub max_strokes: u32,
    pub water_penalty: u32,
    pub out_of_bounds_penalty: u32,
    /// Seconds a player has to start a shot; 0 disables the clock.
    pub shot_clock_secs: f32,
    pub timeout_penalty: u32,
    pub hole_transition_secs: f32,
    pub lobby_return_secs: f32,
}

impl Default for RulesDef {
    fn default() -> Self {
        Self {
            min_players: 1,
            max_players: 8,
            start_countdown_secs: 3,
            max_strokes: 10,
            water_penalty: 1,
            out_of_bounds_penalty: 1,
            shot_clock_secs: 30.0,
            timeout_penalty: 1,
            hole_transition_secs: 4.0,
            lobby_return_secs: 10.0,
        }
    }
}

/// Block-space rectangle features, in fairway-local (x, z) cells.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum FeatureDef {
    Wall { min: (i32, i32), max: (i32, i32), height: i32 },
    Sand { min: (i32, i32), max: (i32, i32) },
    Water { min: (i32, i32), max: (i32, i32) },
    Ice { min: (i32, i32), max: (i32, i32) },
    Gap { min: (i32, i32), max: (i32, i32) },
}

fn default_wall_height() -> i32 { 1 }

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct HoleDef {
    pub name: String,
    pub par: u32,
    /// World block of the fairway's (0, 0) floor cell.
    pub origin: (i32, i32, i32),
    /// Fairway width (x) and length (z) in blocks.
    pub size: (i32, i32),
    pub tee: (i32, i32),
    pub cup: (i32, i32),
    #[serde(default = "default_wall_height")]
    pub wall_height: i32,
    #[serde(default)]
    pub features: Vec<FeatureDef>,
}

impl HoleDef {
    pub fn contains(&self, cell: (i32, i32)) -> bool {
        cell.0 >= 0 && cell.1 >= 0 && cell.0 < self.size.0 && cell.1 < self.size.1
    }
}

fn default_kill_depth() -> f32 { 6.0 }

#[derive(Debug, Deserialize, Resource, Clone)]
pub struct CourseDef {
    pub name: String,
    #[serde(default)]
    pub seed: u32,
    #[serde(default = "default_kill_depth")]
    pub kill_depth: f32,
    #[serde(default)]
    pub rules: RulesDef,
    #[serde(default)]
    pub ball: BallTuning,
    #[serde(default)]
    pub shot: ShotConfig,
    pub holes: Vec<HoleDef>,
}

#[derive(Debug)]
pub enum CourseError {
    Io { path: String, source: std::io::Error },
    Parse(ron::error::SpannedError),
    Invalid(String),
}

impl fmt::Display for CourseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CourseError::Io { path, source } => write!(f, "failed to read {path}: {source}"),
            CourseError::Parse(e) => write!(f, "failed to parse course: {e}"),
            CourseError::Invalid(msg) => write!(f, "invalid course: {msg}"),
        }
    }
}

impl std::error::Error for CourseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CourseError::Io { source, .. } => Some(source),
            CourseError::Parse(e) => Some(e),
            CourseError::Invalid(_) => None,
        }
    }
}

impl From<ron::error::SpannedError> for CourseError {
    fn from(e: ron::error::SpannedError) -> Self {
        CourseError::Parse(e)
    }
}

impl CourseDef {
    pub fn from_ron(data: &str) -> Result<Self, CourseError> {
        let def: CourseDef = ron::from_str(data)?;
        def.validate()?;
        Ok(def)
    }

    pub fn embedded() -> Result<Self, CourseError> {
        Self::from_ron(EMBEDDED_COURSE)
    }

    pub fn validate(&self) -> Result<(), CourseError> {
        let invalid = |msg: String| Err(CourseError::Invalid(msg));
        if self.holes.is_empty() {
            return invalid("course has no holes".into());
        }
        let rules = &self.rules;
        if rules.min_players == 0 || rules.max_players < rules.min_players {
            return invalid(format!(
                "player limits min={} max={} are inconsistent",
                rules.min_players, rules.max_players
            ));
        }
        if rules.max_strokes == 0 {
            return invalid("max_strokes must be at least 1".into());
        }
        for (i, hole) in self.holes.iter().enumerate() {
            let n = i + 1;
            if hole.par == 0 {
                return invalid(format!("hole {n} ({}) has par 0", hole.name));
            }
            if hole.size.0 < 3 || hole.size.1 < 3 {
                return invalid(format!("hole {n} fairway {:?} is smaller than 3x3", hole.size));
            }
            if !hole.contains(hole.tee) {
                return invalid(format!("hole {n} tee {:?} lies outside the fairway", hole.tee));
            }
            if !hole.contains(hole.cup) {
                return invalid(format!("hole {n} cup {:?} lies outside the fairway", hole.cup));
            }
            if hole.tee == hole.cup {
                return invalid(format!("hole {n} tee and cup share a cell"));
            }
            if hole.wall_height < 0 {
                return invalid(format!("hole {n} wall_height is negative"));
            }
        }
        Ok(())
    }

    pub fn pars(&self) -> Vec<u32> {
        self.holes.iter().map(|h| h.par).collect()
    }

    pub fn total_par(&self) -> u32 {
        self.holes.iter().map(|h| h.par).sum()
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn load_course_file(path: &str) -> Result<CourseDef, CourseError> {
    let data = fs::read_to_string(path).map_err(|source| CourseError::Io {
        path: path.to_string(),
        source,
    })?;
    CourseDef::from_ron(&data)
}

// ----------------------- Plugin -----------------------

pub struct CoursePlugin;

impl Plugin for CoursePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, (load_course, apply_course_tuning).chain());
    }
}

// ----------------------- Systems -----------------------

pub fn load_course(
    mut commands: Commands,
    existing: Option<Res<CourseDef>>,
    options: Option<Res<LaunchOptions>>,
) {
    if existing.is_some() {
        return;
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        let path = options
            .as_ref()
            .map(|o| o.course_path.clone())
            .unwrap_or_else(|| LaunchOptions::default().course_path);
        match load_course_file(&path) {
            Ok(def) => {
                info!("COURSE loaded name=\"{}\" holes={} path={path}", def.name, def.holes.len());
                commands.insert_resource(def);
                return;
            }
            Err(e) => error!("{e}; falling back to the embedded course"),
        }
    }
    #[cfg(target_arch = "wasm32")]
    let _ = options;

    match CourseDef::embedded() {
        Ok(def) => {
            info!("COURSE embedded name=\"{}\" holes={}", def.name, def.holes.len());
            commands.insert_resource(def);
        }
        Err(e) => error!("embedded course is broken: {e}"),
    }
}

pub fn apply_course_tuning(mut commands: Commands, course: Option<Res<CourseDef>>) {
    let Some(course) = course else { return; };
    commands.insert_resource(course.ball);
    commands.insert_resource(course.shot);
}
