use bevy::prelude::*;

use crate::components::{LevelDefinition, Rect};
use crate::game::{Game, Mode};
use crate::rng::GameRng;

const STAR_COUNT: usize = 140;

/// Scene entities are rebuilt only when this key changes, never implicitly.
#[derive(Resource, Default)]
pub struct SceneCache {
    key: Option<(u32, u64)>,
}

#[derive(Component)]
struct SceneEntity;

#[derive(Component)]
struct ScenePlatform(u32);

#[derive(Component)]
struct SceneDoor;

#[derive(Component)]
struct ScenePlayer;

pub struct RenderPlugin;

impl Plugin for RenderPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(SceneCache::default()).add_systems(
            Update,
            (rebuild_scene, sync_scene_transforms)
                .chain()
                .after(crate::game::tick_game),
        );
    }
}

/// Translation for a y-down world rect in the y-up scene.
fn rect_translation(r: &Rect, z: f32) -> Vec3 {
    Vec3::new(r.x + r.w / 2.0, -(r.y + r.h / 2.0), z)
}

fn palette_color(rgb: [f32; 3]) -> Color {
    Color::srgb(rgb[0], rgb[1], rgb[2])
}

fn rebuild_scene(
    mut commands: Commands,
    game: Res<Game>,
    mut cache: ResMut<SceneCache>,
    mut clear_color: ResMut<ClearColor>,
    scene: Query<Entity, With<SceneEntity>>,
) {
    let level = match game.mode {
        Mode::Playing | Mode::Transition(_) => game.current_level(),
        Mode::Start | Mode::End => None,
    };

    let key = level.map(|l| (l.id, l.visual_seed));
    if key == cache.key {
        return;
    }
    cache.key = key;

    for entity in scene.iter() {
        commands.entity(entity).despawn();
    }
    let Some(level) = level else {
        clear_color.0 = Color::srgb(0.02, 0.02, 0.05);
        return;
    };

    clear_color.0 = palette_color(level.palette.sky);
    spawn_backdrop(&mut commands, level);

    let ground = palette_color(level.palette.ground);
    for platform in &level.platforms {
        commands.spawn((
            SceneEntity,
            ScenePlatform(platform.id),
            Sprite::from_color(ground, Vec2::new(platform.rect.w, platform.rect.h)),
            Transform::from_translation(rect_translation(&platform.rect, 10.0)),
        ));
    }

    let door = &level.exit_door;
    commands.spawn((
        SceneEntity,
        SceneDoor,
        Sprite::from_color(
            Color::srgb(0.36, 0.27, 0.16),
            Vec2::new(door.rect.w, door.rect.h),
        ),
        Transform::from_translation(rect_translation(&door.rect, 5.0)),
    ));

    commands.spawn((
        SceneEntity,
        ScenePlayer,
        Sprite::from_color(
            Color::srgb(0.95, 0.97, 0.99),
            Vec2::new(game.player.width, game.player.height),
        ),
        Transform::from_translation(rect_translation(&game.player.bounds(), 20.0)),
    ));
}

/// Star field derived from the level's visual seed through the same PRNG
/// abstraction as the generator, so a given seed reproduces its decoration.
fn spawn_backdrop(commands: &mut Commands, level: &LevelDefinition) {
    let mut rng = GameRng::new(level.visual_seed);
    for _ in 0..STAR_COUNT {
        let x = rng.range_f32(0.0, level.bounds.w);
        let y = rng.range_f32(0.0, level.bounds.h);
        let size = rng.range_f32(1.0, 2.5);
        let alpha = rng.range_f32(0.25, 0.85);
        commands.spawn((
            SceneEntity,
            Sprite::from_color(
                Color::srgba(0.85, 0.88, 1.0, alpha),
                Vec2::splat(size),
            ),
            Transform::from_xyz(x, -y, -20.0),
        ));
    }
}

fn sync_scene_transforms(
    game: Res<Game>,
    mut platforms: Query<
        (&ScenePlatform, &mut Transform),
        (Without<SceneDoor>, Without<ScenePlayer>),
    >,
    mut door_q: Query<&mut Transform, (With<SceneDoor>, Without<ScenePlayer>)>,
    mut player_q: Query<(&mut Transform, &mut Sprite), With<ScenePlayer>>,
) {
    let Some(level) = game.current_level() else {
        return;
    };
    let positioned = level.platforms_at(game.elapsed);

    for (marker, mut transform) in platforms.iter_mut() {
        if let Some(p) = positioned.iter().find(|p| p.id == marker.0) {
            transform.translation = rect_translation(&p.rect, 10.0);
        }
    }

    if let Ok(mut transform) = door_q.get_single_mut() {
        let door = level.door_at(&positioned);
        transform.translation = rect_translation(&door.rect, 5.0);
    }

    if let Ok((mut transform, mut sprite)) = player_q.get_single_mut() {
        transform.translation = rect_translation(&game.player.bounds(), 20.0);
        sprite.flip_x = game.player.facing < 0;
    }
}
