mod audio;
mod camera;
mod components;
mod events;
mod game;
mod generation;
mod input;
mod particles;
mod physics_core;
mod render;
mod rng;
mod screen_effects;
mod ui;
mod weather;

use bevy::prelude::*;

#[derive(serde::Deserialize, Default)]
struct StartupConfig {
    window_title: Option<String>,
    window_width: Option<f32>,
    window_height: Option<f32>,
    background_color: Option<[f32; 3]>,
}

fn load_startup_config() -> StartupConfig {
    let path = std::env::var("BELFRY_GAME_CONFIG")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "game.json".to_string());
    match std::fs::read_to_string(&path) {
        Ok(contents) => match serde_json::from_str::<StartupConfig>(&contents) {
            Ok(cfg) => {
                println!("[Belfry] Loaded startup config from {}", path);
                cfg
            }
            Err(e) => {
                eprintln!("[Belfry] Failed to parse {}: {}", path, e);
                StartupConfig::default()
            }
        },
        Err(_) => StartupConfig::default(),
    }
}

fn main() {
    let startup = load_startup_config();
    let window_title = startup
        .window_title
        .unwrap_or_else(|| "Spooky Climb".to_string());
    let window_width = startup.window_width.unwrap_or(game::VIEW_WIDTH);
    let window_height = startup.window_height.unwrap_or(game::VIEW_HEIGHT);
    let bg = startup.background_color.unwrap_or([0.02, 0.02, 0.05]);

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: window_title,
                resolution: (window_width, window_height).into(),
                present_mode: bevy::window::PresentMode::AutoVsync,
                resizable: false,
                ..default()
            }),
            ..default()
        }))
        .insert_resource(ClearColor(Color::srgb(bg[0], bg[1], bg[2])))
        .add_plugins(events::GameEventsPlugin)
        .add_plugins(input::InputPlugin)
        .add_plugins(game::GamePlugin)
        .add_plugins(camera::CameraPlugin)
        .add_plugins(render::RenderPlugin)
        .add_plugins(ui::UiPlugin)
        .add_plugins(audio::AudioPlugin)
        .add_plugins(screen_effects::ScreenEffectsPlugin)
        .add_plugins(particles::ParticlesPlugin)
        .add_plugins(weather::WeatherPlugin)
        .insert_resource(game::Game::with_view(
            components::PhysicsConfig::default(),
            window_width,
            window_height,
        ))
        .run();
}
