use bevy::prelude::*;
use bevy::app::AppExit;
use bevy::time::Fixed;

use crate::launch::LaunchOptions;
use crate::plugins::events::register_events;
use crate::plugins::game_state::{GolfMatch, MatchPhase};

// Core simulation timing, frame ordering & shared events.
#[derive(Resource, Default, Debug)]
pub struct SimState {
    pub tick: u64,
    pub elapsed_seconds: f32,
}
impl SimState {
    pub fn advance_fixed(&mut self) {
        self.tick += 1;
        self.elapsed_seconds = self.tick as f32 / 60.0;
    }
}

/// Per-frame ordering of gameplay systems in `Update`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GolfSet {
    Input,
    Shots,
    Ball,
    Flow,
    Present,
}

#[derive(Resource, Default)]
pub struct ExitState { pub triggered: bool }

pub struct CoreSimPlugin;
impl Plugin for CoreSimPlugin {
    fn build(&self, app: &mut App) {
        register_events(app);
        app.insert_resource(SimState::default())
            .insert_resource(ExitState::default())
            .insert_resource(Time::<Fixed>::from_hz(60.0))
            .configure_sets(
                Update,
                (GolfSet::Input, GolfSet::Shots, GolfSet::Ball, GolfSet::Flow, GolfSet::Present).chain(),
            )
            .add_systems(FixedUpdate, tick_state)
            .add_systems(Update, exit_after_runtime);
    }
}

fn tick_state(mut sim: ResMut<SimState>, golf: Option<Res<GolfMatch>>) {
    if let Some(golf) = golf {
        if golf.phase() == MatchPhase::Finished {
            return; // freeze simulation timing while the final scoreboard is up
        }
    }
    sim.advance_fixed();
}

fn exit_after_runtime(
    sim: Res<SimState>,
    options: Option<Res<LaunchOptions>>,
    mut exit_state: ResMut<ExitState>,
    mut ev_exit: EventWriter<AppExit>,
) {
    if exit_state.triggered { return; }
    let Some(limit) = options.and_then(|o| o.run_duration_seconds) else { return; };
    if sim.elapsed_seconds >= limit {
        info!("EXIT runtime reached seconds={}", sim.elapsed_seconds);
        exit_state.triggered = true;
        ev_exit.send(AppExit::Success);
    }
}
