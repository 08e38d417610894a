//! Library entry for integration tests & external tooling.
//! Exposes plugin modules, launch options and a prelude for common types.

pub mod launch;
pub mod plugins {
    pub mod core_sim;
    pub mod events;
    pub mod game_state;
    pub mod course;
    pub mod course_builder;
    pub mod ball;
    pub mod shooting;
    pub mod scheduler;
    pub mod game_flow;
    pub mod ui_messages;
    pub mod autoplay;
    pub mod input;
    pub mod hud;
    pub mod camera;
    pub mod lobby;
    pub mod game_audio;
}
pub mod prelude;
