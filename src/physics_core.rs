use crate::components::{PhysicsConfig, Platform, Player, Rect};

/// Per-tick movement intent handed to the integrator. `jump_pressed` is the
/// rising edge of the jump input; `jump_held` is the level signal.
#[derive(Clone, Copy, Debug, Default)]
pub struct StepIntent {
    pub left: bool,
    pub right: bool,
    pub down: bool,
    pub jump_pressed: bool,
    pub jump_held: bool,
    pub coyote_available: bool,
    pub ignore_ceiling: bool,
}

/// What the step did, so the caller can settle timers and cues without
/// re-deriving edges from velocity.
#[derive(Clone, Copy, Debug, Default)]
pub struct StepEvents {
    pub jumped: bool,
    pub air_jumped: bool,
}

pub fn aabb_intersect(a: &Rect, b: &Rect) -> bool {
    a.x < b.x + b.w && a.x + a.w > b.x && a.y < b.y + b.h && a.y + a.h > b.y
}

/// Overlap area divided by `subject`'s own area; 0 for degenerate subjects.
pub fn overlap_ratio(subject: &Rect, other: &Rect) -> f32 {
    let area = subject.w * subject.h;
    if area <= 0.0 {
        return 0.0;
    }
    let overlap_x = (subject.x + subject.w).min(other.x + other.w) - subject.x.max(other.x);
    let overlap_y = (subject.y + subject.h).min(other.y + other.h) - subject.y.max(other.y);
    if overlap_x <= 0.0 || overlap_y <= 0.0 {
        return 0.0;
    }
    (overlap_x * overlap_y) / area
}

pub fn rising_edge(prev: bool, curr: bool) -> bool {
    curr && !prev
}

/// Grace-window countdown: refilled whenever grounded, decays while airborne.
pub fn update_coyote_timer(grounded: bool, timer: &mut f32, dt: f32, grace: f32) {
    if grounded {
        *timer = grace;
    } else {
        *timer = (*timer - dt).max(0.0);
    }
}

/// Advance the player by one frame against the given positioned platforms.
///
/// Collision resolution is axis-separated: X is integrated and resolved
/// fully before Y, which avoids diagonal tunneling. Within an axis every
/// overlapping platform applies one correction based on the velocity sign;
/// the last contact wins. This function cannot fail; zero-size platform
/// rects simply never register a contact.
pub fn step_player(
    player: &mut Player,
    dt: f32,
    intent: &StepIntent,
    platforms: &[Platform],
    config: &PhysicsConfig,
) -> StepEvents {
    let mut events = StepEvents::default();

    // Horizontal intent; facing persists when input is neutral.
    let mut dir = 0.0f32;
    if intent.left {
        dir -= 1.0;
    }
    if intent.right {
        dir += 1.0;
    }
    player.vel.x = dir * config.move_speed;
    if dir != 0.0 {
        player.facing = if dir > 0.0 { 1 } else { -1 };
    }

    player.vel.y += config.gravity * dt;

    if intent.jump_pressed {
        if player.on_ground || intent.coyote_available {
            player.vel.y = -config.jump_velocity;
            player.on_ground = false;
            events.jumped = true;
        } else if player.air_jumps_left > 0 {
            player.vel.y = -config.jump_velocity;
            player.air_jumps_left -= 1;
            events.air_jumped = true;
        }
    }

    // Cut the arc short when jump is released during ascent.
    if !intent.jump_held && player.vel.y < 0.0 {
        player.vel.y += config.gravity * (config.cut_jump_multiplier - 1.0) * dt;
    }

    if player.vel.y > config.max_fall_speed {
        player.vel.y = config.max_fall_speed;
    }

    player.pos.x += player.vel.x * dt;
    resolve_x(player, platforms);

    player.pos.y += player.vel.y * dt;
    player.on_ground = false;
    resolve_y(player, platforms, intent.ignore_ceiling);

    if player.on_ground {
        player.air_jumps_left = config.air_jumps;
    }

    events
}

fn resolve_x(player: &mut Player, platforms: &[Platform]) {
    for p in platforms {
        let r = p.rect;
        if r.w <= 0.0 || r.h <= 0.0 {
            continue;
        }
        if !aabb_intersect(&player.bounds(), &r) {
            continue;
        }
        if player.vel.x > 0.0 {
            player.pos.x = r.x - player.width;
        } else if player.vel.x < 0.0 {
            player.pos.x = r.x + r.w;
        }
        player.vel.x = 0.0;
    }
}

fn resolve_y(player: &mut Player, platforms: &[Platform], ignore_ceiling: bool) {
    for p in platforms {
        let r = p.rect;
        if r.w <= 0.0 || r.h <= 0.0 {
            continue;
        }
        if !aabb_intersect(&player.bounds(), &r) {
            continue;
        }
        if player.vel.y > 0.0 {
            player.pos.y = r.y - player.height;
            player.vel.y = 0.0;
            player.on_ground = true;
        } else if player.vel.y < 0.0 && !ignore_ceiling {
            player.pos.y = r.y + r.h;
            player.vel.y = 0.0;
        }
    }
}

/// The platform directly under the player's feet, if any: top surface within
/// one pixel of the foot line and a horizontal footprint overlap.
pub fn find_supporting_platform<'a>(
    player: &Player,
    platforms: &'a [Platform],
) -> Option<&'a Platform> {
    let foot_y = player.pos.y + player.height;
    platforms.iter().find(|p| {
        let r = p.rect;
        let over = player.pos.x + player.width > r.x && player.pos.x < r.x + r.w;
        over && (foot_y - r.y).abs() <= 1.0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::PlatformKind;
    use bevy::math::Vec2;

    const DT: f32 = 1.0 / 60.0;

    fn config() -> PhysicsConfig {
        PhysicsConfig::default()
    }

    fn platform(id: u32, x: f32, y: f32, w: f32, h: f32) -> Platform {
        Platform {
            id,
            rect: Rect::new(x, y, w, h),
            kind: PlatformKind::Platform,
            motion: None,
        }
    }

    fn grounded_player(x: f32, floor_y: f32, cfg: &PhysicsConfig) -> Player {
        let mut player = Player::spawn_at((x, floor_y - cfg.player_height), cfg);
        player.on_ground = true;
        player
    }

    fn idle() -> StepIntent {
        StepIntent::default()
    }

    #[test]
    fn rest_on_static_platform_is_idempotent() {
        let cfg = config();
        let floor = platform(0, 0.0, 400.0, 600.0, 24.0);
        let mut player = grounded_player(100.0, 400.0, &cfg);
        let start = player.pos;
        for _ in 0..600 {
            step_player(&mut player, DT, &idle(), &[floor], &cfg);
            assert!(player.on_ground);
        }
        assert!((player.pos.x - start.x).abs() < 1e-4);
        assert!((player.pos.y - start.y).abs() < 1e-4);
    }

    #[test]
    fn jump_from_ground_sets_upward_velocity() {
        let cfg = config();
        let floor = platform(0, 0.0, 400.0, 600.0, 24.0);
        let mut player = grounded_player(100.0, 400.0, &cfg);
        let intent = StepIntent {
            jump_pressed: true,
            jump_held: true,
            ..StepIntent::default()
        };
        let events = step_player(&mut player, DT, &intent, &[floor], &cfg);
        assert!(events.jumped);
        assert!(player.vel.y < 0.0);
        assert!(!player.on_ground);
    }

    #[test]
    fn coyote_residual_still_allows_jump() {
        let cfg = config();
        let mut player = Player::spawn_at((100.0, 300.0), &cfg);
        player.on_ground = false;
        let intent = StepIntent {
            jump_pressed: true,
            jump_held: true,
            coyote_available: true,
            ..StepIntent::default()
        };
        // Budget spent so only the coyote branch can fire.
        player.air_jumps_left = 0;
        let events = step_player(&mut player, DT, &intent, &[], &cfg);
        assert!(events.jumped);
        assert!(player.vel.y < -cfg.jump_velocity * 0.9);
    }

    #[test]
    fn expired_coyote_does_not_allow_ground_jump() {
        let cfg = config();
        let mut player = Player::spawn_at((100.0, 300.0), &cfg);
        player.on_ground = false;
        player.air_jumps_left = 0;
        let intent = StepIntent {
            jump_pressed: true,
            jump_held: true,
            coyote_available: false,
            ..StepIntent::default()
        };
        let events = step_player(&mut player, DT, &intent, &[], &cfg);
        assert!(!events.jumped);
        assert!(!events.air_jumped);
        assert!(player.vel.y > 0.0);
    }

    #[test]
    fn air_jump_consumes_budget_and_ground_refills_it() {
        let cfg = config();
        let mut player = Player::spawn_at((100.0, 300.0), &cfg);
        player.on_ground = false;
        assert_eq!(player.air_jumps_left, 1);
        let intent = StepIntent {
            jump_pressed: true,
            jump_held: true,
            ..StepIntent::default()
        };
        let events = step_player(&mut player, DT, &intent, &[], &cfg);
        assert!(events.air_jumped);
        assert_eq!(player.air_jumps_left, 0);

        // Second press in flight is refused.
        let events = step_player(&mut player, DT, &intent, &[], &cfg);
        assert!(!events.air_jumped && !events.jumped);

        // Land on a floor far below; budget refills.
        let floor = platform(0, 0.0, 800.0, 600.0, 24.0);
        for _ in 0..600 {
            step_player(&mut player, DT, &idle(), &[floor], &cfg);
            if player.on_ground {
                break;
            }
        }
        assert!(player.on_ground);
        assert_eq!(player.air_jumps_left, cfg.air_jumps);
    }

    #[test]
    fn tapped_jump_rises_less_than_held_jump() {
        let cfg = config();
        let floor = platform(0, 0.0, 400.0, 600.0, 24.0);

        let apex = |held: bool| {
            let mut player = grounded_player(100.0, 400.0, &cfg);
            let mut intent = StepIntent {
                jump_pressed: true,
                jump_held: true,
                ..StepIntent::default()
            };
            step_player(&mut player, DT, &intent, &[floor], &cfg);
            intent.jump_pressed = false;
            intent.jump_held = held;
            let mut top = player.pos.y;
            for _ in 0..240 {
                step_player(&mut player, DT, &intent, &[floor], &cfg);
                top = top.min(player.pos.y);
                if player.on_ground {
                    break;
                }
            }
            top
        };

        let held_apex = apex(true);
        let tapped_apex = apex(false);
        assert!(tapped_apex > held_apex + 20.0, "tap should cut the arc short");
    }

    #[test]
    fn horizontal_collision_clamps_to_obstacle_edge() {
        let cfg = config();
        let wall = platform(1, 200.0, 0.0, 40.0, 400.0);
        let floor = platform(0, 0.0, 400.0, 600.0, 24.0);
        let mut player = grounded_player(150.0, 400.0, &cfg);
        let intent = StepIntent {
            right: true,
            ..StepIntent::default()
        };
        for _ in 0..120 {
            step_player(&mut player, DT, &intent, &[floor, wall], &cfg);
        }
        assert!((player.pos.x - (200.0 - cfg.player_width)).abs() < 1e-3);
    }

    #[test]
    fn ceiling_contact_zeroes_ascent_unless_disabled() {
        let cfg = config();
        let ceiling = platform(2, 0.0, 100.0, 600.0, 24.0);
        let mut player = Player::spawn_at((100.0, 130.0), &cfg);
        player.vel.y = -cfg.jump_velocity;
        let intent = StepIntent {
            jump_held: true,
            ..StepIntent::default()
        };
        step_player(&mut player, DT, &intent, &[ceiling], &cfg);
        assert_eq!(player.vel.y, 0.0);
        assert!((player.pos.y - 124.0).abs() < 1e-3);

        let mut ghost = Player::spawn_at((100.0, 130.0), &cfg);
        ghost.vel.y = -cfg.jump_velocity;
        let intent = StepIntent {
            jump_held: true,
            ignore_ceiling: true,
            ..StepIntent::default()
        };
        step_player(&mut ghost, DT, &intent, &[ceiling], &cfg);
        assert!(ghost.vel.y < 0.0, "ascent continues through the ceiling");
    }

    #[test]
    fn zero_size_platform_never_corrects() {
        let cfg = config();
        let degenerate = platform(3, 100.0, 300.0, 0.0, 0.0);
        let mut player = Player::spawn_at((100.0, 290.0), &cfg);
        let before = player.pos;
        step_player(&mut player, DT, &idle(), &[degenerate], &cfg);
        assert!(player.pos.y > before.y, "falls freely past degenerate rect");
    }

    #[test]
    fn facing_persists_without_input() {
        let cfg = config();
        let floor = platform(0, 0.0, 400.0, 600.0, 24.0);
        let mut player = grounded_player(100.0, 400.0, &cfg);
        let left = StepIntent {
            left: true,
            ..StepIntent::default()
        };
        step_player(&mut player, DT, &left, &[floor], &cfg);
        assert_eq!(player.facing, -1);
        step_player(&mut player, DT, &idle(), &[floor], &cfg);
        assert_eq!(player.facing, -1);
    }

    #[test]
    fn overlap_ratio_door_threshold() {
        let player = Rect::new(0.0, 0.0, 32.0, 44.0);
        // Door sharing exactly half the player's area.
        let half = Rect::new(16.0, 0.0, 40.0, 80.0);
        let ratio = overlap_ratio(&player, &half);
        assert!((ratio - 0.5).abs() < 1e-6);
        let less = Rect::new(16.4, 0.0, 40.0, 80.0);
        assert!(overlap_ratio(&player, &less) < 0.5);
        assert_eq!(overlap_ratio(&Rect::new(0.0, 0.0, 0.0, 44.0), &half), 0.0);
    }

    #[test]
    fn rising_edge_is_strict() {
        assert!(rising_edge(false, true));
        assert!(!rising_edge(true, true));
        assert!(!rising_edge(true, false));
        assert!(!rising_edge(false, false));
    }

    #[test]
    fn coyote_timer_refills_and_decays() {
        let mut timer = 0.0;
        update_coyote_timer(true, &mut timer, DT, 0.12);
        assert_eq!(timer, 0.12);
        update_coyote_timer(false, &mut timer, 0.05, 0.12);
        assert!((timer - 0.07).abs() < 1e-6);
        update_coyote_timer(false, &mut timer, 1.0, 0.12);
        assert_eq!(timer, 0.0);
    }

    #[test]
    fn supporting_platform_requires_top_contact() {
        let cfg = config();
        let deck = platform(5, 80.0, 400.0, 140.0, 24.0);
        let mut player = Player::spawn_at((100.0, 400.0 - cfg.player_height), &cfg);
        assert_eq!(
            find_supporting_platform(&player, &[deck]).map(|p| p.id),
            Some(5)
        );
        player.pos.y -= 8.0;
        assert!(find_supporting_platform(&player, &[deck]).is_none());
        player.pos.y += 8.0;
        player.pos.x = 300.0;
        assert!(find_supporting_platform(&player, &[deck]).is_none());
    }

    #[test]
    fn landing_zeroes_fall_and_sets_grounded() {
        let cfg = config();
        let floor = platform(0, 0.0, 400.0, 600.0, 24.0);
        let mut player = Player::spawn_at((100.0, 300.0), &cfg);
        player.vel = Vec2::new(0.0, 600.0);
        for _ in 0..120 {
            step_player(&mut player, DT, &idle(), &[floor], &cfg);
            if player.on_ground {
                break;
            }
        }
        assert!(player.on_ground);
        assert_eq!(player.vel.y, 0.0);
        assert!((player.pos.y - (400.0 - cfg.player_height)).abs() < 1e-3);
    }
}
