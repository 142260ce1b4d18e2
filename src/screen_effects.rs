use bevy::prelude::*;

use crate::camera::MainCamera;
use crate::events::{EventCursor, GameEventBus};

pub struct ScreenEffectsPlugin;

impl Plugin for ScreenEffectsPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ScreenEffects::default())
            .insert_resource(EffectsEventCursor::default())
            .add_systems(Startup, spawn_screen_overlay)
            .add_systems(
                Update,
                (effects_from_events, tick_effects, sync_overlay_visual)
                    .chain()
                    .after(crate::game::tick_game),
            );
    }
}

#[derive(Resource, Default)]
pub struct ScreenEffects {
    pub color: [f32; 4],
    pub active_effect: Option<ActiveScreenEffect>,
}

pub struct ActiveScreenEffect {
    pub effect_type: ScreenEffectType,
    pub duration: f32,
    pub elapsed: f32,
    pub color: [f32; 3],
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ScreenEffectType {
    FadeIn,
    Flash,
}

impl ScreenEffects {
    pub fn start(&mut self, effect_type: ScreenEffectType, duration: f32, color: [f32; 3]) {
        self.active_effect = Some(ActiveScreenEffect {
            effect_type,
            duration: duration.max(0.001),
            elapsed: 0.0,
            color,
        });
        self.color = [color[0], color[1], color[2], 1.0];
    }
}

#[derive(Resource, Default)]
struct EffectsEventCursor(EventCursor);

/// Marker for the screen effects overlay sprite.
#[derive(Component)]
pub struct ScreenOverlay;

fn spawn_screen_overlay(mut commands: Commands) {
    commands.spawn((
        ScreenOverlay,
        Sprite::from_color(Color::srgba(0.0, 0.0, 0.0, 0.0), Vec2::new(4096.0, 4096.0)),
        Transform::from_xyz(0.0, 0.0, 300.0),
    ));
}

fn effects_from_events(
    bus: Res<GameEventBus>,
    mut cursor: ResMut<EffectsEventCursor>,
    mut effects: ResMut<ScreenEffects>,
) {
    for ev in cursor.0.drain(&bus) {
        let duration = ev
            .data
            .get("duration")
            .and_then(|v| v.as_f64())
            .unwrap_or(0.5) as f32;
        let color = ev
            .data
            .get("color")
            .and_then(|v| v.as_array())
            .map(|arr| {
                let mut c = [0.0f32; 3];
                for (i, v) in arr.iter().take(3).enumerate() {
                    c[i] = v.as_f64().unwrap_or(0.0) as f32;
                }
                c
            });
        match ev.name.as_str() {
            "trigger_flash" => {
                effects.start(
                    ScreenEffectType::Flash,
                    duration,
                    color.unwrap_or([1.0, 1.0, 1.0]),
                );
            }
            "trigger_fade_in" => {
                effects.start(ScreenEffectType::FadeIn, duration, color.unwrap_or([0.0; 3]));
            }
            _ => {}
        }
    }
}

fn effect_alpha(effect_type: ScreenEffectType, t: f32) -> f32 {
    match effect_type {
        ScreenEffectType::FadeIn => 1.0 - t,
        ScreenEffectType::Flash => {
            let inv = 1.0 - t;
            inv * inv * inv
        }
    }
}

fn tick_effects(time: Res<Time>, mut effects: ResMut<ScreenEffects>) {
    let update = effects.active_effect.as_ref().map(|active| {
        let elapsed = active.elapsed + time.delta_secs();
        let t = (elapsed / active.duration).clamp(0.0, 1.0);
        let alpha = effect_alpha(active.effect_type, t);
        let color = [active.color[0], active.color[1], active.color[2], alpha];
        (elapsed, color, elapsed >= active.duration)
    });

    if let Some((elapsed, color, done)) = update {
        if let Some(ref mut active) = effects.active_effect {
            active.elapsed = elapsed;
        }
        effects.color = color;
        if done {
            effects.color = [0.0, 0.0, 0.0, 0.0];
            effects.active_effect = None;
        }
    }
}

fn sync_overlay_visual(
    effects: Res<ScreenEffects>,
    camera_q: Query<&Transform, (With<MainCamera>, Without<ScreenOverlay>)>,
    mut overlay_q: Query<(&mut Sprite, &mut Transform), With<ScreenOverlay>>,
) {
    let Ok((mut sprite, mut transform)) = overlay_q.get_single_mut() else {
        return;
    };
    if let Ok(cam_transform) = camera_q.get_single() {
        transform.translation.x = cam_transform.translation.x;
        transform.translation.y = cam_transform.translation.y;
    }
    sprite.color = Color::srgba(
        effects.color[0],
        effects.color[1],
        effects.color[2],
        effects.color[3],
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flash_fades_out_with_a_cubic_tail() {
        let mut effects = ScreenEffects::default();
        effects.start(ScreenEffectType::Flash, 0.6, [1.0, 0.2, 0.2]);
        assert_eq!(effects.color[3], 1.0);

        assert_eq!(effect_alpha(ScreenEffectType::Flash, 0.0), 1.0);
        assert!((effect_alpha(ScreenEffectType::Flash, 0.5) - 0.125).abs() < 1e-6);
        assert_eq!(effect_alpha(ScreenEffectType::Flash, 1.0), 0.0);
        // The cubic drops below the linear fade everywhere in between.
        assert!(effect_alpha(ScreenEffectType::Flash, 0.3) < effect_alpha(ScreenEffectType::FadeIn, 0.3));
    }

    #[test]
    fn fade_in_starts_opaque() {
        let mut effects = ScreenEffects::default();
        effects.start(ScreenEffectType::FadeIn, 0.45, [0.0; 3]);
        assert_eq!(effects.color, [0.0, 0.0, 0.0, 1.0]);
    }
}
