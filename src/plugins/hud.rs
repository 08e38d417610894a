use bevy::prelude::*;

use crate::plugins::core_sim::GolfSet;
use crate::plugins::game_state::{GolfMatch, MatchPhase, Player};
use crate::plugins::shooting::{ShotMode, ShotState};
use crate::plugins::ui_messages::{UiMessage, UiMessageEvent};

#[derive(Component)]
pub struct Hud;
#[derive(Component)]
struct PowerBar;
#[derive(Component)]
struct PowerBarFill;
#[derive(Component)]
struct Banner;
#[derive(Component)]
struct ScoreboardText;

/// Center-screen banner text and how long it stays up.
#[derive(Resource, Default)]
struct BannerState {
    remaining: f32,
}

pub struct HudPlugin;
impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<BannerState>()
            .add_systems(Startup, setup_hud)
            .add_systems(
                Update,
                (update_status, update_power_bar, apply_ui_messages, fade_banner).in_set(GolfSet::Present),
            );
    }
}

fn setup_hud(mut commands: Commands, assets: Res<AssetServer>) {
    let font = assets.load("fonts/FiraSans-Bold.ttf");
    commands.spawn((
        TextBundle::from_section("", TextStyle { font: font.clone(), font_size: 22.0, color: Color::WHITE })
            .with_style(Style { position_type: PositionType::Absolute, left: Val::Px(12.0), top: Val::Px(8.0), ..default() }),
        Hud,
    ));

    commands
        .spawn((
            NodeBundle {
                style: Style {
                    position_type: PositionType::Absolute,
                    right: Val::Px(12.0),
                    top: Val::Px(12.0),
                    width: Val::Px(180.0),
                    height: Val::Px(18.0),
                    padding: UiRect::all(Val::Px(2.0)),
                    ..default()
                },
                background_color: Color::srgb(0.08, 0.08, 0.10).into(),
                visibility: Visibility::Hidden,
                ..default()
            },
            PowerBar,
        ))
        .with_children(|parent| {
            parent.spawn((
                NodeBundle {
                    style: Style { width: Val::Percent(0.0), height: Val::Percent(100.0), ..default() },
                    background_color: Color::srgb(0.15, 0.60, 0.25).into(),
                    ..default()
                },
                PowerBarFill,
            ));
        });

    commands.spawn((
        TextBundle::from_section("", TextStyle { font: font.clone(), font_size: 40.0, color: Color::srgb(0.98, 0.95, 0.80) })
            .with_style(Style {
                position_type: PositionType::Absolute,
                top: Val::Percent(22.0),
                left: Val::Percent(0.0),
                right: Val::Percent(0.0),
                justify_content: JustifyContent::Center,
                ..default()
            })
            .with_text_justify(JustifyText::Center),
        Banner,
    ));

    commands.spawn((
        TextBundle::from_section("", TextStyle { font, font_size: 18.0, color: Color::srgb(0.90, 0.92, 0.95) })
            .with_style(Style { position_type: PositionType::Absolute, right: Val::Px(12.0), top: Val::Px(44.0), ..default() })
            .with_background_color(Color::srgba(0.02, 0.02, 0.05, 0.6)),
        ScoreboardText,
    ));
}

fn update_status(golf: Option<Res<GolfMatch>>, mut q_text: Query<&mut Text, With<Hud>>) {
    let (Some(golf), Ok(mut text)) = (golf, q_text.get_single_mut()) else { return; };
    let line = match golf.phase() {
        MatchPhase::Lobby => format!("Lobby | {} player(s) | Enter to start, N to add a player", golf.roster().len()),
        MatchPhase::Starting => "Get ready...".to_string(),
        MatchPhase::InHole => {
            let hole = golf.hole();
            let par = golf.par(hole).unwrap_or_default();
            let who = golf
                .current_player()
                .and_then(|p| golf.name_of(p).map(|n| (p, n)))
                .map(|(p, n)| format!("{n} | Stroke {}", golf.strokes(p) + 1))
                .unwrap_or_else(|| "--".into());
            let clock = golf.shot_clock_remaining().map(|s| format!(" | {s:.0}s")).unwrap_or_default();
            format!("Hole {}/{} | Par {} | {}{}", hole + 1, golf.hole_count(), par, who, clock)
        }
        MatchPhase::BetweenHoles => format!("Hole {} complete", golf.hole() + 1),
        MatchPhase::Finished => "Match over".to_string(),
    };
    if text.sections[0].value != line {
        text.sections[0].value = line;
    }
}

/// Green -> yellow -> red.
pub fn power_color(power: f32) -> Color {
    let power = power.clamp(0.0, 1.0);
    if power < 0.5 {
        let t = power / 0.5;
        Color::srgb(0.15 + (0.70 - 0.15) * t, 0.60 + (0.85 - 0.60) * t, 0.25 + (0.10 - 0.25) * t)
    } else {
        let t = (power - 0.5) / 0.5;
        Color::srgb(0.70 + (0.90 - 0.70) * t, 0.85 + (0.20 - 0.85) * t, 0.10 + (0.15 - 0.10) * t)
    }
}

fn update_power_bar(
    golf: Option<Res<GolfMatch>>,
    q_players: Query<(&Player, &ShotState)>,
    mut q_bar: Query<&mut Visibility, With<PowerBar>>,
    mut q_fill: Query<(&mut Style, &mut BackgroundColor), With<PowerBarFill>>,
) {
    let active = golf.and_then(|g| g.current_player());
    let state = active.and_then(|id| q_players.iter().find(|(p, _)| p.id == id).map(|(_, s)| *s));
    let charging = state.filter(|s| s.mode == ShotMode::Charging);
    if let Ok(mut vis) = q_bar.get_single_mut() {
        let want = if state.is_some_and(|s| s.mode != ShotMode::Idle) { Visibility::Visible } else { Visibility::Hidden };
        if *vis != want {
            *vis = want;
        }
    }
    let power = charging.map(|s| s.power).unwrap_or(0.0);
    if let Ok((mut style, mut color)) = q_fill.get_single_mut() {
        style.width = Val::Percent(power * 100.0);
        *color = power_color(power).into();
    }
}

fn banner_for(message: &UiMessage) -> Option<(String, f32)> {
    let text = match message {
        UiMessage::Countdown { seconds } => return Some((format!("{seconds}"), 1.0)),
        UiMessage::HoleIntro { hole, holes, name, par } => format!("Hole {}/{}: {name}\nPar {par}", hole + 1, holes),
        UiMessage::TurnStarted { name, stroke, .. } => return Some((format!("{name}, stroke {stroke}"), 1.5)),
        UiMessage::Penalty { reason, strokes, .. } => format!("{} (+{strokes})", capitalize(reason)),
        UiMessage::HoleOut { name, label, strokes, .. } => format!("{name}: {label} ({strokes})"),
        UiMessage::MatchOver { standings } => {
            let winner = standings.first().map(|s| s.name.as_str()).unwrap_or("nobody");
            return Some((format!("{winner} wins!"), 8.0));
        }
        UiMessage::Notice { text } => text.clone(),
        _ => return None,
    };
    Some((text, 2.5))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn scoreboard_text(message: &UiMessage) -> Option<String> {
    match message {
        UiMessage::Scoreboard { pars, rows, .. } => {
            let mut out = format!("Par   {}\n", pars.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(" "));
            for row in rows {
                let holes = row.strokes.iter().map(|s| if *s == 0 { "-".to_string() } else { s.to_string() });
                out.push_str(&format!("{:<10} {}  = {} ({:+})\n", row.name, holes.collect::<Vec<_>>().join(" "), row.total, row.to_par));
            }
            Some(out)
        }
        UiMessage::MatchOver { standings } => {
            let mut out = String::from("Final standings\n");
            for s in standings {
                out.push_str(&format!("{}. {:<10} {} ({:+})\n", s.rank, s.name, s.total, s.to_par));
            }
            Some(out)
        }
        UiMessage::Lobby { .. } => Some(String::new()),
        _ => None,
    }
}

fn apply_ui_messages(
    mut ev_ui: EventReader<UiMessageEvent>,
    mut banner: ResMut<BannerState>,
    mut q_banner: Query<&mut Text, (With<Banner>, Without<ScoreboardText>)>,
    mut q_board: Query<&mut Text, (With<ScoreboardText>, Without<Banner>)>,
) {
    // Local hot-seat screen shows everything, including per-player messages.
    for ev in ev_ui.read() {
        if let Some((text, secs)) = banner_for(&ev.message) {
            if let Ok(mut t) = q_banner.get_single_mut() {
                t.sections[0].value = text;
                banner.remaining = secs;
            }
        }
        if let Some(text) = scoreboard_text(&ev.message) {
            if let Ok(mut t) = q_board.get_single_mut() {
                t.sections[0].value = text;
            }
        }
    }
}

fn fade_banner(time: Res<Time>, mut banner: ResMut<BannerState>, mut q_banner: Query<&mut Text, With<Banner>>) {
    if banner.remaining <= 0.0 {
        return;
    }
    banner.remaining -= time.delta_seconds();
    if banner.remaining <= 0.0 {
        if let Ok(mut t) = q_banner.get_single_mut() {
            t.sections[0].value.clear();
        }
    }
}
