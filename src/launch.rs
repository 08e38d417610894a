//! Command-line launch options.
use bevy::prelude::*;
use std::fmt;

pub const DEFAULT_COURSE_PATH: &str = "assets/courses/meadow.ron";

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct LaunchOptions {
    pub course_path: String,
    /// Local players seated at startup.
    pub players: u32,
    /// Seat bots instead of humans and start matches automatically.
    pub autoplay: bool,
    /// Exit after this many simulated seconds (smoke runs).
    pub run_duration_seconds: Option<f32>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            course_path: DEFAULT_COURSE_PATH.to_string(),
            players: 2,
            autoplay: false,
            run_duration_seconds: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchError {
    MissingValue(&'static str),
    InvalidNumber { flag: &'static str, value: String },
    UnknownFlag(String),
}

impl fmt::Display for LaunchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchError::MissingValue(flag) => write!(f, "{flag} expects a value"),
            LaunchError::InvalidNumber { flag, value } => {
                write!(f, "{flag} expects a positive number, got {value:?}")
            }
            LaunchError::UnknownFlag(flag) => write!(f, "unknown argument {flag:?}"),
        }
    }
}

impl std::error::Error for LaunchError {}

impl LaunchOptions {
    /// Parses arguments (program name already stripped).
    pub fn from_args<I, S>(args: I) -> Result<Self, LaunchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut opts = Self::default();
        let mut it = args.into_iter().map(Into::into);
        while let Some(arg) = it.next() {
            match arg.as_str() {
                "--course" => {
                    opts.course_path = it.next().ok_or(LaunchError::MissingValue("--course"))?;
                }
                "--players" => {
                    let value = it.next().ok_or(LaunchError::MissingValue("--players"))?;
                    opts.players = match value.parse::<u32>() {
                        Ok(n) if n > 0 => n,
                        _ => return Err(LaunchError::InvalidNumber { flag: "--players", value }),
                    };
                }
                "--runtime" => {
                    let value = it.next().ok_or(LaunchError::MissingValue("--runtime"))?;
                    opts.run_duration_seconds = match value.parse::<f32>() {
                        Ok(s) if s > 0.0 && s.is_finite() => Some(s),
                        _ => return Err(LaunchError::InvalidNumber { flag: "--runtime", value }),
                    };
                }
                "--autoplay" => opts.autoplay = true,
                _ => return Err(LaunchError::UnknownFlag(arg)),
            }
        }
        Ok(opts)
    }
}
