use bevy::prelude::*;

use crate::events::{EventCursor, GameEventBus};

const BURST_SIZE: usize = 4;

/// Landing dust particle, living in scene (y-up) coordinates.
#[derive(Component)]
struct Dust {
    vx: f32,
    vy: f32,
    lifetime: f32,
    elapsed: f32,
}

#[derive(Resource, Default)]
struct DustEventCursor(EventCursor);

pub struct ParticlesPlugin;

impl Plugin for ParticlesPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(DustEventCursor::default()).add_systems(
            Update,
            (spawn_dust_bursts, tick_dust).after(crate::game::tick_game),
        );
    }
}

fn spawn_dust_bursts(
    mut commands: Commands,
    bus: Res<GameEventBus>,
    mut cursor: ResMut<DustEventCursor>,
) {
    for ev in cursor.0.drain(&bus) {
        if ev.name != "player_land" {
            continue;
        }
        let x = ev.data.get("x").and_then(|v| v.as_f64()).unwrap_or(0.0) as f32;
        let y = ev.data.get("y").and_then(|v| v.as_f64()).unwrap_or(0.0) as f32;
        for _ in 0..BURST_SIZE {
            commands.spawn((
                Dust {
                    vx: (rand::random::<f32>() - 0.5) * 120.0,
                    vy: 120.0 + (rand::random::<f32>() - 0.5) * 60.0,
                    lifetime: 0.4 + rand::random::<f32>() * 0.2,
                    elapsed: 0.0,
                },
                Sprite::from_color(Color::srgba(0.82, 0.84, 0.9, 0.8), Vec2::splat(3.0)),
                Transform::from_xyz(x, -y, 30.0),
            ));
        }
    }
}

fn tick_dust(
    mut commands: Commands,
    time: Res<Time>,
    mut dust: Query<(Entity, &mut Dust, &mut Transform, &mut Sprite)>,
) {
    let dt = time.delta_secs();
    for (entity, mut d, mut transform, mut sprite) in dust.iter_mut() {
        d.elapsed += dt;
        if d.elapsed >= d.lifetime {
            commands.entity(entity).despawn();
            continue;
        }
        d.vy -= 300.0 * dt;
        transform.translation.x += d.vx * dt;
        transform.translation.y += d.vy * dt;
        let life = 1.0 - d.elapsed / d.lifetime;
        sprite.color = Color::srgba(0.82, 0.84, 0.9, 0.8 * life);
    }
}
