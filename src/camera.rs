use bevy::prelude::*;

use crate::components::Rect;
use crate::game::Game;

/// Simulation-side camera: a viewport-sized window into the world, y-down
/// like the rest of the simulation. Recomputed from the follow target every
/// frame; holds no smoothing state.
#[derive(Clone, Copy, Debug)]
pub struct ViewCamera {
    pub pos: Vec2,
    pub view: Vec2,
}

impl ViewCamera {
    pub fn new(view_width: f32, view_height: f32) -> Self {
        Self {
            pos: Vec2::ZERO,
            view: Vec2::new(view_width, view_height),
        }
    }

    /// Center the viewport on `target`, then clamp into the world bounds so
    /// the camera never shows outside the level. When the world is smaller
    /// than the viewport on an axis the low edge wins.
    pub fn follow(&mut self, target: Vec2, bounds: &Rect) {
        self.pos.x = target.x - self.view.x / 2.0;
        self.pos.y = target.y - self.view.y / 2.0;
        let max_x = bounds.x + bounds.w - self.view.x;
        let max_y = bounds.y + bounds.h - self.view.y;
        self.pos.x = self.pos.x.min(max_x).max(bounds.x);
        self.pos.y = self.pos.y.min(max_y).max(bounds.y);
    }

    pub fn bottom(&self) -> f32 {
        self.pos.y + self.view.y
    }
}

#[derive(Component)]
pub struct MainCamera;

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_camera)
            .add_systems(Update, sync_camera.after(crate::game::tick_game));
    }
}

fn spawn_camera(mut commands: Commands) {
    commands.spawn((MainCamera, Camera2d, Transform::from_xyz(0.0, 0.0, 100.0)));
}

/// Mirror the simulation camera onto the bevy camera. The y-axis flip between
/// the y-down world and bevy's y-up scene happens here, at the presentation
/// boundary, and nowhere else.
fn sync_camera(game: Res<Game>, mut query: Query<&mut Transform, With<MainCamera>>) {
    let Ok(mut transform) = query.get_single_mut() else {
        return;
    };
    let cam = &game.camera;
    transform.translation.x = cam.pos.x + cam.view.x / 2.0;
    transform.translation.y = -(cam.pos.y + cam.view.y / 2.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follow_centers_on_target() {
        let mut cam = ViewCamera::new(960.0, 540.0);
        let bounds = Rect::new(0.0, 0.0, 4000.0, 4000.0);
        cam.follow(Vec2::new(2000.0, 2000.0), &bounds);
        assert_eq!(cam.pos, Vec2::new(2000.0 - 480.0, 2000.0 - 270.0));
    }

    #[test]
    fn follow_clamps_inside_bounds_for_any_target() {
        let mut cam = ViewCamera::new(960.0, 540.0);
        let bounds = Rect::new(0.0, 0.0, 1600.0, 9600.0);
        let targets = [
            Vec2::new(-5000.0, -5000.0),
            Vec2::new(5000.0, 50000.0),
            Vec2::new(0.0, 9600.0),
            Vec2::new(1600.0, 0.0),
            Vec2::new(f32::MAX / 2.0, f32::MIN / 2.0),
        ];
        for target in targets {
            cam.follow(target, &bounds);
            assert!(cam.pos.x >= bounds.x && cam.pos.x <= bounds.x + bounds.w - cam.view.x);
            assert!(cam.pos.y >= bounds.y && cam.pos.y <= bounds.y + bounds.h - cam.view.y);
        }
    }

    #[test]
    fn undersized_world_pins_to_low_edge() {
        let mut cam = ViewCamera::new(960.0, 540.0);
        let bounds = Rect::new(100.0, 200.0, 400.0, 300.0);
        cam.follow(Vec2::new(300.0, 350.0), &bounds);
        assert_eq!(cam.pos.x, 100.0);
        assert_eq!(cam.pos.y, 200.0);
    }
}
