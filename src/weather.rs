use bevy::prelude::*;

use crate::camera::MainCamera;
use crate::events::GameEventBus;
use crate::game::{Game, Mode};

const LIGHTNING_PROGRESS_THRESHOLD: f32 = 0.75;
const LIGHTNING_FLASH_DURATION: f32 = 0.28;
const LIGHTNING_CHANCE_PER_SECOND: f32 = 0.25;

/// Marker for rain streak entities, moving in scene coordinates.
#[derive(Component)]
struct RainDrop {
    vx: f32,
    vy: f32,
    lifetime: f32,
    elapsed: f32,
}

#[derive(Resource, Default)]
struct LightningState {
    cooldown: f32,
}

pub struct WeatherPlugin;

impl Plugin for WeatherPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(LightningState::default()).add_systems(
            Update,
            (tick_rain, tick_lightning).after(crate::game::tick_game),
        );
    }
}

/// Rain density follows climb progress, so the storm builds as the player
/// nears the summit and falls silent on the menus.
fn tick_rain(
    mut commands: Commands,
    time: Res<Time>,
    game: Res<Game>,
    camera_q: Query<&Transform, With<MainCamera>>,
    mut drops: Query<(Entity, &mut RainDrop, &mut Transform), Without<MainCamera>>,
) {
    let dt = time.delta_secs();

    for (entity, mut drop, mut transform) in drops.iter_mut() {
        drop.elapsed += dt;
        if drop.elapsed >= drop.lifetime {
            commands.entity(entity).despawn();
            continue;
        }
        transform.translation.x += drop.vx * dt;
        transform.translation.y += drop.vy * dt;
    }

    let intensity = match game.mode {
        Mode::Playing | Mode::Transition(_) => game.climb_progress,
        Mode::Start | Mode::End => 0.0,
    };
    if intensity <= 0.0 {
        return;
    }
    let Ok(cam) = camera_q.get_single() else {
        return;
    };

    let spawn_count = (intensity * 5.0).ceil() as usize;
    let half_width = 520.0;
    let half_height = 320.0;
    for _ in 0..spawn_count {
        let rx = rand::random::<f32>() * half_width * 2.0 - half_width;
        commands.spawn((
            RainDrop {
                vx: -40.0,
                vy: -400.0 - rand::random::<f32>() * 100.0,
                lifetime: 2.0,
                elapsed: 0.0,
            },
            Sprite::from_color(Color::srgba(0.6, 0.7, 0.95, 0.7), Vec2::new(1.5, 8.0)),
            Transform::from_xyz(
                cam.translation.x + rx,
                cam.translation.y + half_height + rand::random::<f32>() * 20.0,
                200.0,
            ),
        ));
    }
}

/// Past three quarters of the climb, lightning strikes at random: a pale
/// screen flash plus the thunder cue.
fn tick_lightning(
    time: Res<Time>,
    game: Res<Game>,
    mut state: ResMut<LightningState>,
    mut bus: ResMut<GameEventBus>,
) {
    let dt = time.delta_secs();
    if state.cooldown > 0.0 {
        state.cooldown -= dt;
        return;
    }
    if game.mode != Mode::Playing || game.climb_progress < LIGHTNING_PROGRESS_THRESHOLD {
        return;
    }
    if rand::random::<f32>() < LIGHTNING_CHANCE_PER_SECOND * dt {
        bus.emit(
            "trigger_flash",
            serde_json::json!({
                "duration": LIGHTNING_FLASH_DURATION,
                "color": [0.82, 0.9, 1.0],
            }),
        );
        bus.emit("thunder", serde_json::json!({}));
        state.cooldown = LIGHTNING_FLASH_DURATION + 1.2;
    }
}
