use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::game::{Game, MenuChoice, Mode};
use crate::generation::SEED_DIGITS;
use crate::input::PendingInput;

const MENU_ROW_LEFT: f32 = 300.0;
const MENU_ROW_WIDTH: f32 = 360.0;
const MENU_ROW_HEIGHT: f32 = 36.0;
const MENU_FIRST_ROW_TOP: f32 = 290.0;
const MENU_ROW_STRIDE: f32 = 44.0;

fn menu_row_bounds(index: usize) -> (f32, f32, f32, f32) {
    (
        MENU_ROW_LEFT,
        MENU_FIRST_ROW_TOP + index as f32 * MENU_ROW_STRIDE,
        MENU_ROW_WIDTH,
        MENU_ROW_HEIGHT,
    )
}

#[derive(Component)]
struct UiRoot;

#[derive(Component)]
struct ProgressFill;

#[derive(Component)]
struct BestFill;

#[derive(Resource, Default)]
struct UiCache {
    signature: Option<String>,
    best_progress: f32,
    last_level_index: usize,
}

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(UiCache::default())
            .add_systems(Update, menu_pointer_confirm.before(crate::game::tick_game))
            .add_systems(
                Update,
                (sync_ui, update_progress_bar)
                    .chain()
                    .after(crate::game::tick_game),
            );
    }
}

/// Map a click onto the menu rows. Clicking the selected row confirms it; the
/// state machine handles clicks on other rows as selection moves.
fn menu_pointer_confirm(
    mouse: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    game: Res<Game>,
    mut pending: ResMut<PendingInput>,
) {
    if game.mode != Mode::Start || !mouse.just_pressed(MouseButton::Left) {
        return;
    }
    let Ok(window) = windows.get_single() else {
        return;
    };
    let Some(cursor) = window.cursor_position() else {
        return;
    };
    for (i, choice) in MenuChoice::ALL.iter().enumerate() {
        let (left, top, w, h) = menu_row_bounds(i);
        if cursor.x >= left && cursor.x <= left + w && cursor.y >= top && cursor.y <= top + h {
            pending.0.clicked_choice = Some(*choice);
        }
    }
}

fn mode_signature(game: &Game) -> String {
    match game.mode {
        Mode::Start => format!(
            "start|{:?}|{}",
            game.menu.selected, game.menu.seed_buffer
        ),
        Mode::Playing | Mode::Transition(_) => {
            let title = game
                .current_level()
                .map(|l| l.title.as_str())
                .unwrap_or("");
            format!("hud|{}|{title}", game.level_index)
        }
        Mode::End => format!("end|{}", game.level_times.len()),
    }
}

fn sync_ui(
    mut commands: Commands,
    game: Res<Game>,
    mut cache: ResMut<UiCache>,
    roots: Query<Entity, With<UiRoot>>,
) {
    let signature = mode_signature(&game);
    if cache.signature.as_deref() == Some(signature.as_str()) {
        return;
    }
    cache.signature = Some(signature);

    for root in roots.iter() {
        commands.entity(root).despawn_recursive();
    }

    match game.mode {
        Mode::Start => spawn_start_screen(&mut commands, &game),
        Mode::Playing | Mode::Transition(_) => spawn_hud(&mut commands, &game),
        Mode::End => spawn_end_screen(&mut commands, &game),
    }
}

fn full_screen_root() -> Node {
    Node {
        width: Val::Percent(100.0),
        height: Val::Percent(100.0),
        position_type: PositionType::Absolute,
        ..default()
    }
}

fn centered_label(parent: &mut ChildBuilder, text: &str, size: f32, top: f32, color: Color) {
    parent.spawn((
        Text::new(text),
        TextFont {
            font_size: size,
            ..default()
        },
        TextColor(color),
        TextLayout::new_with_justify(JustifyText::Center),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(top),
            width: Val::Percent(100.0),
            ..default()
        },
    ));
}

fn spawn_start_screen(commands: &mut Commands, game: &Game) {
    commands
        .spawn((UiRoot, full_screen_root()))
        .with_children(|parent| {
            centered_label(parent, "Spooky Climb", 42.0, 150.0, Color::srgb(0.97, 0.98, 0.99));
            centered_label(
                parent,
                "Left/Right to choose - Enter or Space to play",
                18.0,
                210.0,
                Color::srgba(0.97, 0.98, 0.99, 0.85),
            );

            for (i, choice) in MenuChoice::ALL.iter().enumerate() {
                let (left, top, w, h) = menu_row_bounds(i);
                let selected = *choice == game.menu.selected;
                let bg = if selected {
                    Color::srgba(0.66, 0.33, 0.97, 0.35)
                } else {
                    Color::srgba(0.08, 0.1, 0.18, 0.6)
                };
                parent
                    .spawn((
                        Node {
                            position_type: PositionType::Absolute,
                            left: Val::Px(left),
                            top: Val::Px(top),
                            width: Val::Px(w),
                            height: Val::Px(h),
                            justify_content: JustifyContent::Center,
                            align_items: AlignItems::Center,
                            ..default()
                        },
                        BackgroundColor(bg),
                    ))
                    .with_children(|row| {
                        row.spawn((
                            Text::new(choice.label()),
                            TextFont {
                                font_size: 20.0,
                                ..default()
                            },
                            TextColor(Color::srgb(0.97, 0.98, 0.99)),
                        ));
                    });
            }

            if game.menu.selected == MenuChoice::CustomSeed {
                let mut shown = game.menu.seed_buffer.clone();
                while shown.len() < SEED_DIGITS {
                    shown.push('_');
                }
                centered_label(
                    parent,
                    &format!("Seed: {shown}"),
                    20.0,
                    MENU_FIRST_ROW_TOP + 3.0 * MENU_ROW_STRIDE + 12.0,
                    Color::srgba(0.97, 0.98, 0.99, 0.9),
                );
            }
        });
}

fn spawn_hud(commands: &mut Commands, game: &Game) {
    let title = game
        .current_level()
        .map(|l| l.title.clone())
        .unwrap_or_default();
    commands
        .spawn((UiRoot, full_screen_root()))
        .with_children(|parent| {
            parent.spawn((
                Text::new(title),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(Color::srgba(1.0, 1.0, 1.0, 0.8)),
                Node {
                    position_type: PositionType::Absolute,
                    left: Val::Px(12.0),
                    top: Val::Px(10.0),
                    ..default()
                },
            ));

            // Right-edge climb progress bar, filling bottom to top.
            parent
                .spawn((
                    Node {
                        position_type: PositionType::Absolute,
                        right: Val::Px(12.0),
                        top: Val::Px(12.0),
                        bottom: Val::Px(12.0),
                        width: Val::Px(18.0),
                        ..default()
                    },
                    BackgroundColor(Color::srgba(0.06, 0.09, 0.16, 0.6)),
                ))
                .with_children(|bar| {
                    bar.spawn((
                        BestFill,
                        Node {
                            position_type: PositionType::Absolute,
                            left: Val::Px(2.0),
                            right: Val::Px(2.0),
                            bottom: Val::Px(2.0),
                            height: Val::Percent(0.0),
                            ..default()
                        },
                        BackgroundColor(Color::srgba(1.0, 1.0, 1.0, 0.2)),
                    ));
                    bar.spawn((
                        ProgressFill,
                        Node {
                            position_type: PositionType::Absolute,
                            left: Val::Px(2.0),
                            right: Val::Px(2.0),
                            bottom: Val::Px(2.0),
                            height: Val::Percent(0.0),
                            ..default()
                        },
                        BackgroundColor(Color::srgba(0.13, 0.77, 0.37, 0.9)),
                    ));
                });
        });
}

fn spawn_end_screen(commands: &mut Commands, game: &Game) {
    let total: f32 = game.level_times.iter().sum();
    commands
        .spawn((UiRoot, full_screen_root()))
        .with_children(|parent| {
            centered_label(parent, "You Are At Rest!", 36.0, 150.0, Color::srgb(0.97, 0.98, 0.99));
            let mut y = 200.0;
            for (i, time) in game.level_times.iter().enumerate() {
                let name = game
                    .pool
                    .get(i)
                    .map(|l| l.title.clone())
                    .unwrap_or_else(|| format!("Level {}", i + 1));
                centered_label(
                    parent,
                    &format!("{name}: {}", format_time(*time)),
                    18.0,
                    y,
                    Color::srgba(0.97, 0.98, 0.99, 0.9),
                );
                y += 26.0;
            }
            centered_label(
                parent,
                &format!("Total: {}", format_time(total)),
                18.0,
                y + 8.0,
                Color::srgb(0.97, 0.98, 0.99),
            );
            centered_label(
                parent,
                "Press Space to Restart",
                18.0,
                y + 48.0,
                Color::srgba(0.97, 0.98, 0.99, 0.85),
            );
        });
}

fn update_progress_bar(
    game: Res<Game>,
    mut cache: ResMut<UiCache>,
    mut current_q: Query<&mut Node, (With<ProgressFill>, Without<BestFill>)>,
    mut best_q: Query<&mut Node, (With<BestFill>, Without<ProgressFill>)>,
) {
    if cache.last_level_index != game.level_index {
        cache.last_level_index = game.level_index;
        cache.best_progress = 0.0;
    }
    cache.best_progress = cache.best_progress.max(game.climb_progress);

    if let Ok(mut node) = current_q.get_single_mut() {
        node.height = Val::Percent(game.climb_progress * 100.0);
    }
    if let Ok(mut node) = best_q.get_single_mut() {
        node.height = Val::Percent(cache.best_progress * 100.0);
    }
}

fn format_time(seconds: f32) -> String {
    let minutes = (seconds / 60.0).floor() as u32;
    let rest = seconds - minutes as f32 * 60.0;
    format!("{minutes}:{rest:05.2}")
}
