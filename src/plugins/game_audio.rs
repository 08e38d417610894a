use bevy::prelude::*;
use bevy::audio::{AudioSource, AudioBundle, PlaybackSettings, PlaybackMode, Volume};

use crate::plugins::core_sim::GolfSet;
use crate::plugins::events::{
    BallHazardEvent, BallImpactEvent, Hazard, MatchFinishedEvent, PlayerHoledOutEvent, ShotFiredEvent,
};

/// Impacts softer than this stay silent.
pub const IMPACT_SOUND_MIN: f32 = 0.6;

pub struct GameAudioPlugin;

#[derive(Resource, Clone)]
struct SfxHandles {
    bounce: Handle<AudioSource>,
    cup: Handle<AudioSource>,
    splash: Handle<AudioSource>,
    match_over: Handle<AudioSource>,
    launch: Handle<AudioSource>,
    music: Handle<AudioSource>,
}

#[derive(Component)]
struct MusicTag;

impl Plugin for GameAudioPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, load_audio_assets)
            .add_systems(Update, (play_event_sfx, ensure_music_loop).in_set(GolfSet::Present));
    }
}

fn load_audio_assets(mut commands: Commands, assets: Res<AssetServer>) {
    // Expected files: assets/audio/{bounce,cup,splash,match_over,launch,music}.mp3
    commands.insert_resource(SfxHandles {
        bounce: assets.load("audio/bounce.mp3"),
        cup: assets.load("audio/cup.mp3"),
        splash: assets.load("audio/splash.mp3"),
        match_over: assets.load("audio/match_over.mp3"),
        launch: assets.load("audio/launch.mp3"),
        music: assets.load("audio/music.mp3"),
    });
}

fn one_shot(source: &Handle<AudioSource>, volume: f32) -> AudioBundle {
    AudioBundle {
        source: source.clone(),
        settings: PlaybackSettings { mode: PlaybackMode::Despawn, volume: Volume::new(volume), ..default() },
    }
}

/// Maps impact intensity `[IMPACT_SOUND_MIN .. 6]` onto volume `[0.25 .. 1.0]`.
pub fn impact_volume(intensity: f32) -> Option<f32> {
    if intensity < IMPACT_SOUND_MIN {
        return None;
    }
    let norm = ((intensity - IMPACT_SOUND_MIN) / (6.0 - IMPACT_SOUND_MIN)).clamp(0.0, 1.0);
    Some(0.25 + norm * 0.75)
}

// Music entity is respawned if it ever goes away.
fn ensure_music_loop(mut commands: Commands, q_music: Query<(), With<MusicTag>>, sfx: Option<Res<SfxHandles>>) {
    let Some(sfx) = sfx else { return; };
    if q_music.is_empty() {
        commands.spawn((
            AudioBundle {
                source: sfx.music.clone(),
                settings: PlaybackSettings { mode: PlaybackMode::Loop, volume: Volume::new(0.45), ..default() },
            },
            MusicTag,
        ));
    }
}

fn play_event_sfx(
    sfx: Option<Res<SfxHandles>>,
    mut commands: Commands,
    mut ev_impact: EventReader<BallImpactEvent>,
    mut ev_shot: EventReader<ShotFiredEvent>,
    mut ev_holed: EventReader<PlayerHoledOutEvent>,
    mut ev_hazard: EventReader<BallHazardEvent>,
    mut ev_finished: EventReader<MatchFinishedEvent>,
) {
    let Some(sfx) = sfx else {
        ev_impact.clear();
        ev_shot.clear();
        ev_holed.clear();
        ev_hazard.clear();
        ev_finished.clear();
        return;
    };
    for e in ev_impact.read() {
        if let Some(v) = impact_volume(e.intensity) {
            commands.spawn(one_shot(&sfx.bounce, v));
        }
    }
    for e in ev_shot.read() {
        commands.spawn(one_shot(&sfx.launch, (0.4 + e.power * 0.6).clamp(0.4, 1.0)));
    }
    for _ in ev_holed.read() {
        commands.spawn(one_shot(&sfx.cup, 0.9));
    }
    for e in ev_hazard.read() {
        if e.hazard == Hazard::Water {
            commands.spawn(one_shot(&sfx.splash, 0.8));
        }
    }
    for _ in ev_finished.read() {
        commands.spawn(one_shot(&sfx.match_over, 1.0));
    }
}
