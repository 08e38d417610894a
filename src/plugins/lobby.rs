// Lobby overlay: course name, seated players and Start / Add player / Quit buttons.
// Shown only while the match is in the lobby.

use bevy::prelude::*;

use crate::plugins::core_sim::GolfSet;
use crate::plugins::course::{load_course, CourseDef};
use crate::plugins::events::{JoinRequestEvent, MatchCommand};
use crate::plugins::game_state::{GolfMatch, MatchPhase};

#[derive(Component)]
struct LobbyRoot;
#[derive(Component)]
struct RosterText;
#[derive(Component)]
struct StartButton;
#[derive(Component)]
struct AddPlayerButton;
#[derive(Component)]
struct QuitButton;

pub struct LobbyPlugin;
impl Plugin for LobbyPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_lobby.after(load_course))
            .add_systems(Update, lobby_buttons.in_set(GolfSet::Input))
            .add_systems(Update, (sync_lobby_visibility, refresh_roster).in_set(GolfSet::Present));
    }
}

fn spawn_lobby(mut commands: Commands, assets: Res<AssetServer>, course: Option<Res<CourseDef>>) {
    let font = assets.load("fonts/FiraSans-Bold.ttf");
    let title = course.as_ref().map(|c| c.name.clone()).unwrap_or_else(|| "Block Golf".to_string());
    let subtitle = course
        .as_ref()
        .map(|c| format!("{} holes | par {}", c.holes.len(), c.total_par()))
        .unwrap_or_default();

    commands
        .spawn((
            NodeBundle {
                style: Style {
                    width: Val::Percent(100.0),
                    height: Val::Percent(100.0),
                    flex_direction: FlexDirection::Column,
                    justify_content: JustifyContent::Center,
                    align_items: AlignItems::Center,
                    row_gap: Val::Px(14.0),
                    ..default()
                },
                background_color: BackgroundColor(Color::srgba(0.02, 0.02, 0.05, 0.65)),
                ..default()
            },
            LobbyRoot,
        ))
        .with_children(|parent| {
            parent.spawn(TextBundle::from_section(
                title,
                TextStyle { font: font.clone(), font_size: 56.0, color: Color::srgb(0.95, 0.95, 1.0) },
            ));
            parent.spawn(TextBundle::from_section(
                subtitle,
                TextStyle { font: font.clone(), font_size: 24.0, color: Color::srgb(0.75, 0.75, 0.80) },
            ));
            parent.spawn((
                TextBundle::from_section(
                    "",
                    TextStyle { font: font.clone(), font_size: 24.0, color: Color::srgb(0.85, 0.90, 0.85) },
                )
                .with_text_justify(JustifyText::Center)
                .with_style(Style { margin: UiRect::all(Val::Px(6.0)), ..default() }),
                RosterText,
            ));
            spawn_button(parent, &font, "Start", Color::srgb(0.15, 0.55, 0.25), StartButton);
            spawn_button(parent, &font, "Add player", Color::srgb(0.20, 0.35, 0.60), AddPlayerButton);
            spawn_button(parent, &font, "Quit", Color::srgb(0.55, 0.15, 0.15), QuitButton);
        });
}

fn spawn_button<T: Component>(parent: &mut ChildBuilder, font: &Handle<Font>, label: &str, base_color: Color, marker: T) {
    parent
        .spawn((
            ButtonBundle {
                style: Style {
                    width: Val::Px(240.0),
                    height: Val::Px(52.0),
                    justify_content: JustifyContent::Center,
                    align_items: AlignItems::Center,
                    ..default()
                },
                background_color: BackgroundColor(base_color),
                ..default()
            },
            marker,
        ))
        .with_children(|b| {
            b.spawn(TextBundle::from_section(
                label,
                TextStyle { font: font.clone(), font_size: 30.0, color: Color::srgb(0.95, 0.95, 1.0) },
            ));
        });
}

#[allow(clippy::type_complexity)]
fn lobby_buttons(
    golf: Option<Res<GolfMatch>>,
    q_buttons: Query<
        (&Interaction, Has<StartButton>, Has<AddPlayerButton>, Has<QuitButton>),
        (Changed<Interaction>, With<Button>),
    >,
    mut ev_cmd: EventWriter<MatchCommand>,
    mut ev_join: EventWriter<JoinRequestEvent>,
    mut exit: EventWriter<AppExit>,
) {
    let Some(golf) = golf else { return; };
    if golf.phase() != MatchPhase::Lobby {
        return;
    }
    for (interaction, start, add, quit) in &q_buttons {
        if *interaction != Interaction::Pressed {
            continue;
        }
        if start {
            ev_cmd.send(MatchCommand::Start);
        } else if add {
            let n = golf.roster().len() + golf.spectators().len() + 1;
            ev_join.send(JoinRequestEvent { name: format!("Player {n}"), bot: false });
        } else if quit {
            exit.send(AppExit::Success);
        }
    }
}

fn sync_lobby_visibility(golf: Option<Res<GolfMatch>>, mut q_root: Query<&mut Visibility, With<LobbyRoot>>) {
    let show = golf.map_or(true, |g| g.phase() == MatchPhase::Lobby);
    let want = if show { Visibility::Inherited } else { Visibility::Hidden };
    for mut vis in &mut q_root {
        if *vis != want {
            *vis = want;
        }
    }
}

fn refresh_roster(golf: Option<Res<GolfMatch>>, mut q_text: Query<&mut Text, With<RosterText>>) {
    let Some(golf) = golf else { return; };
    if !golf.is_changed() {
        return;
    }
    let Ok(mut text) = q_text.get_single_mut() else { return; };
    let mut lines: Vec<String> = golf.roster().iter().map(|p| p.name.clone()).collect();
    if lines.is_empty() {
        lines.push("No players yet".to_string());
    }
    let need = golf.rules().min_players as usize;
    if golf.roster().len() < need {
        lines.push(format!("(need at least {need})"));
    }
    text.sections[0].value = lines.join("\n");
}
