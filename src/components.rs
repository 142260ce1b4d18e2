use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle, top-left anchored, y grows downward in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.w / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.h / 2.0
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }
}

/// Sinusoidal horizontal oscillation: x(t) = base_x + range * sin(angular_speed * t + phase).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlatformMove {
    pub base_x: f32,
    pub range: f32,
    pub angular_speed: f32,
    pub phase: f32,
}

impl PlatformMove {
    pub fn x_at(&self, t: f32) -> f32 {
        self.base_x + (self.angular_speed * t + self.phase).sin() * self.range
    }

    /// Instantaneous horizontal speed of the oscillation at time t.
    pub fn vx_at(&self, t: f32) -> f32 {
        self.range * self.angular_speed * (self.angular_speed * t + self.phase).cos()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformKind {
    Ground,
    Platform,
}

/// Level geometry template. The stored rect is the rest position; a frame's
/// positioned rect comes from `at_time` when `motion` is present.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub id: u32,
    pub rect: Rect,
    pub kind: PlatformKind,
    pub motion: Option<PlatformMove>,
}

impl Platform {
    pub fn at_time(&self, t: f32) -> Platform {
        let mut out = *self;
        if let Some(motion) = self.motion {
            out.rect.x = motion.x_at(t);
        }
        out
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Door {
    pub rect: Rect,
    pub target_level_id: u32,
    pub attach_to_platform_id: Option<u32>,
    pub local_offset_x: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectibleKind {
    Key,
    Lantern,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Collectible {
    pub rect: Rect,
    pub kind: CollectibleKind,
    pub attach_to_platform_id: Option<u32>,
    pub local_offset_x: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    Patroller,
    Jumper,
}

/// Placeholder only: present in level data, never simulated.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyPlaceholder {
    pub rect: Rect,
    pub kind: EnemyKind,
}

/// Level color theme. Components are linear-ish sRGB triples; fog carries alpha.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub sky: [f32; 3],
    pub fog: [f32; 4],
    pub ground: [f32; 3],
}

/// Immutable level description produced by the generator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelDefinition {
    pub id: u32,
    pub spawn: (f32, f32),
    pub bounds: Rect,
    pub platforms: Vec<Platform>,
    pub collectibles: Vec<Collectible>,
    pub enemies: Vec<EnemyPlaceholder>,
    pub exit_door: Door,
    pub palette: Palette,
    pub title: String,
    pub visual_seed: u64,
    /// Platform ids of the main climbing spine, ascent order, base first.
    pub climb_path: Vec<u32>,
}

impl LevelDefinition {
    /// Positioned platform list for a given timestamp. Templates are never
    /// mutated; each frame derives a fresh transient list.
    pub fn platforms_at(&self, t: f32) -> Vec<Platform> {
        self.platforms.iter().map(|p| p.at_time(t)).collect()
    }

    /// Door position for the current frame. When the attachment platform is
    /// missing from the list the door keeps its template position.
    pub fn door_at(&self, platforms: &[Platform]) -> Door {
        let mut door = self.exit_door.clone();
        if let Some(attach_id) = door.attach_to_platform_id {
            if let Some(p) = platforms.iter().find(|p| p.id == attach_id) {
                door.rect.x = p.rect.x + door.local_offset_x;
                door.rect.y = p.rect.y - door.rect.h;
            }
        }
        door
    }
}

/// The one simulated body. Created fresh at every spawn, respawn and level
/// change; owned by the game state machine, mutated by the integrator.
#[derive(Clone, Copy, Debug)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    pub on_ground: bool,
    pub width: f32,
    pub height: f32,
    pub facing: i8,
    pub air_jumps_left: u32,
}

impl Player {
    pub fn spawn_at(spawn: (f32, f32), config: &PhysicsConfig) -> Self {
        Self {
            pos: Vec2::new(spawn.0, spawn.1),
            vel: Vec2::ZERO,
            on_ground: false,
            width: config.player_width,
            height: config.player_height,
            facing: 1,
            air_jumps_left: config.air_jumps,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, self.width, self.height)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.pos.x + self.width / 2.0, self.pos.y + self.height / 2.0)
    }
}

/// Physics constants (as a resource-style config so they can be tuned).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PhysicsConfig {
    pub gravity: f32,
    pub move_speed: f32,
    pub jump_velocity: f32,
    pub max_fall_speed: f32,
    /// Extra gravity factor applied while rising with jump released.
    pub cut_jump_multiplier: f32,
    pub coyote_time: f32,
    pub player_width: f32,
    pub player_height: f32,
    pub air_jumps: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 1800.0,
            move_speed: 260.0,
            jump_velocity: 780.0,
            max_fall_speed: 1200.0,
            cut_jump_multiplier: 2.2,
            coyote_time: 0.12,
            player_width: 32.0,
            player_height: 44.0,
            air_jumps: 1,
        }
    }
}

/// Reach envelope derived from the physics constants. The single source of
/// truth for how far the player can travel between leaving the ground and
/// landing; the generator must recompute these, never hardcode them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MovementCaps {
    pub time_to_apex: f32,
    pub air_time: f32,
    pub max_jump_height: f32,
    pub max_air_horizontal_distance: f32,
}

impl PhysicsConfig {
    pub fn movement_caps(&self) -> MovementCaps {
        let time_to_apex = self.jump_velocity / self.gravity;
        let air_time = time_to_apex * 2.0;
        MovementCaps {
            time_to_apex,
            air_time,
            max_jump_height: (self.jump_velocity * self.jump_velocity) / (2.0 * self.gravity),
            max_air_horizontal_distance: self.move_speed * air_time,
        }
    }
}
