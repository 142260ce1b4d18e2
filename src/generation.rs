use crate::components::{
    Door, LevelDefinition, Palette, PhysicsConfig, Platform, PlatformKind, PlatformMove, Rect,
};
use crate::rng::{lerp, GameRng};

pub const WORLD_WIDTH: f32 = 1600.0;
pub const WORLD_HEIGHT: f32 = 9600.0;
pub const LEVEL_COUNT: usize = 5;
pub const SEED_DIGITS: usize = 8;

const PLATFORM_THICKNESS: f32 = 24.0;
const TOP_MARGIN: f32 = 120.0;
const SIDE_MARGIN: f32 = 80.0;

const CLASSIC_SEEDS: [u64; LEVEL_COUNT] = [1337, 424242, 9876, 20241, 55555];
const CLASSIC_STEPS: [u32; LEVEL_COUNT] = [35, 50, 85, 125, 166];

/// Clamp with the lower bound winning when the interval is empty, so a
/// collapsed window degrades to the nearest valid value instead of panicking.
fn clampf(v: f32, lo: f32, hi: f32) -> f32 {
    v.min(hi).max(lo)
}

/// Bound a candidate X into the window the player can actually cross from
/// `prev_x` with one jump, widened by the target platform's own oscillation
/// range. An empty window falls back to holding the previous X.
fn clamp_reachable_x(
    prev_x: f32,
    min_x: f32,
    max_x: f32,
    candidate: f32,
    max_run_eff: f32,
    next_range: f32,
) -> f32 {
    let rmin = min_x.max(prev_x - max_run_eff - next_range);
    let rmax = max_x.min(prev_x + max_run_eff + next_range);
    if rmin > rmax {
        return clampf(prev_x, min_x, max_x);
    }
    clampf(candidate, rmin, rmax)
}

fn palette_for(id: u32) -> (Palette, &'static str) {
    match id {
        1 => (
            Palette {
                sky: [0.043, 0.071, 0.125],
                fog: [0.659, 0.333, 0.969, 0.10],
                ground: [0.122, 0.161, 0.216],
            },
            "Grave Beginnings",
        ),
        2 => (
            Palette {
                sky: [0.039, 0.055, 0.098],
                fog: [0.133, 0.773, 0.369, 0.10],
                ground: [0.067, 0.094, 0.153],
            },
            "Swampy Spire",
        ),
        3 => (
            Palette {
                sky: [0.043, 0.043, 0.090],
                fog: [0.231, 0.510, 0.965, 0.10],
                ground: [0.059, 0.090, 0.165],
            },
            "Mausoleum Rise",
        ),
        4 => (
            Palette {
                sky: [0.071, 0.039, 0.020],
                fog: [0.984, 0.573, 0.235, 0.12],
                ground: [0.102, 0.075, 0.051],
            },
            "Cathedral Ascent",
        ),
        _ => (
            Palette {
                sky: [0.078, 0.027, 0.027],
                fog: [0.937, 0.267, 0.267, 0.12],
                ground: [0.102, 0.055, 0.055],
            },
            "The Bloody Summit",
        ),
    }
}

/// Deterministically synthesize a climbable tower: a static base platform,
/// `steps` oscillating platforms steered through horizontal lanes with every
/// hop bounded by the movement capability envelope, and an exit door riding
/// the topmost platform. Same inputs always yield an identical level.
pub fn generate_vertical_level(
    id: u32,
    width: f32,
    height: f32,
    seed: u64,
    steps: u32,
    config: &PhysicsConfig,
) -> LevelDefinition {
    let mut rng = GameRng::new(seed);
    let caps = config.movement_caps();

    let base_ground_height = height - 200.0;
    let top_y = TOP_MARGIN;

    // Rise budget assumes the air jump (~1.9x a single arc), scaled down to
    // leave margin for player error.
    let effective_double_rise = (caps.max_jump_height * 1.9).floor();
    let max_rise = (effective_double_rise * 0.9).floor().max(60.0);
    let max_run_cap = caps.max_air_horizontal_distance.floor();
    let max_run_eff = (max_run_cap * 0.7).floor();

    let mut platforms: Vec<Platform> = Vec::new();

    // Base ground with open gaps on both sides.
    let base_width = (width * 0.3).floor();
    let base_x = ((width - base_width) / 2.0).floor();
    platforms.push(Platform {
        id: 0,
        rect: Rect::new(base_x, base_ground_height, base_width, PLATFORM_THICKNESS),
        kind: PlatformKind::Ground,
        motion: None,
    });
    let spawn = (
        (base_x + base_width / 2.0 - config.player_width / 2.0).floor(),
        base_ground_height - config.player_height,
    );

    let width_min = 120.0;
    let width_max = 160.0;
    let move_range_max = (max_run_eff * 0.7).floor().min(320.0);
    // Later levels oscillate faster: 0.25x at level 1 up to 1.25x at level 5.
    let speed_scale = 0.25 + (id.clamp(1, 5) - 1) as f32 * 0.25;
    let speed_min = 1.0 * speed_scale;
    let speed_max = 2.2 * speed_scale;

    // Anti-stacking: noticeable x change per step, but still within reach.
    let min_delta_x = (max_run_eff * 0.5).floor().max(180.0);
    let lanes = 4i32;
    let lane_span = (width - SIDE_MARGIN * 2.0) / (lanes - 1) as f32;
    let mut target_lane = (rng.float() * lanes as f32).floor() as i32;
    let mut lane_change_in = 4 + (rng.float() * 6.0).floor() as i32;

    let mut pid = 1u32;
    let mut climb_path = vec![0u32];

    // First platform: a gentler rise than the steady climb band.
    let first_rise_min = (max_rise * 0.6).floor();
    let first_rise = clampf(
        lerp(max_rise * 0.7, max_rise * 0.9, rng.float()).floor(),
        first_rise_min,
        (max_rise * 0.95).floor(),
    );

    let mut current_w = lerp(width_min, width_max, rng.float()).floor();
    let mut current_range = lerp(60.0, move_range_max, rng.float()).floor();
    let mut allowed_min_x = SIDE_MARGIN + current_range;
    let mut allowed_max_x = width - SIDE_MARGIN - current_w - current_range;
    let mut lane_center = SIDE_MARGIN + target_lane as f32 * lane_span;
    let mut jitter = (rng.float() - 0.5) * (lane_span * 0.6).floor().min(200.0);
    let mut candidate_x = lane_center + jitter - current_w / 2.0;
    let mut current_x = clamp_reachable_x(
        spawn.0,
        allowed_min_x,
        allowed_max_x,
        candidate_x,
        max_run_eff,
        current_range,
    );
    let mut current_y = clampf(
        base_ground_height - first_rise,
        top_y + 8.0,
        base_ground_height - 40.0,
    );
    platforms.push(Platform {
        id: pid,
        rect: Rect::new(current_x, current_y, current_w, PLATFORM_THICKNESS),
        kind: PlatformKind::Platform,
        motion: Some(PlatformMove {
            base_x: current_x,
            range: current_range,
            angular_speed: lerp(speed_min, speed_max, rng.float()),
            phase: lerp(0.0, std::f32::consts::TAU, rng.float()),
        }),
    });
    climb_path.push(pid);
    pid += 1;
    let mut last_x = current_x;

    for _ in 1..steps {
        // Narrow rise band keeps the climb rhythm consistent.
        let rise_min = (max_rise * 0.8).floor();
        let rise = clampf(
            lerp(max_rise * 0.9, max_rise, rng.float()).floor(),
            rise_min,
            max_rise,
        );

        current_w = lerp(width_min, width_max, rng.float()).floor();
        current_range = lerp(60.0, move_range_max, rng.float()).floor();
        allowed_min_x = SIDE_MARGIN + current_range;
        allowed_max_x = width - SIDE_MARGIN - current_w - current_range;

        // Lane steering: hold a lane for a few steps, then hop to a neighbor.
        lane_change_in -= 1;
        if lane_change_in <= 0 {
            let dir = if rng.float() < 0.5 { -1 } else { 1 };
            target_lane = (target_lane + dir).rem_euclid(lanes);
            lane_change_in = 4 + (rng.float() * 6.0).floor() as i32;
        }
        lane_center = SIDE_MARGIN + target_lane as f32 * lane_span;
        jitter = (rng.float() - 0.5) * (lane_span * 0.5).floor().min(180.0);
        candidate_x = lane_center + jitter - current_w / 2.0;

        let mut next_x = clamp_reachable_x(
            last_x,
            allowed_min_x,
            allowed_max_x,
            candidate_x,
            max_run_eff,
            current_range,
        );
        if (next_x - last_x).abs() < min_delta_x {
            let rmin = allowed_min_x.max(last_x - max_run_eff);
            let rmax = allowed_max_x.min(last_x + max_run_eff);
            if rmin <= rmax {
                next_x = if rng.float() < 0.5 {
                    (last_x + min_delta_x).min(rmax)
                } else {
                    (last_x - min_delta_x).max(rmin)
                };
            }
        }

        // Center separation so consecutive platforms never visually stack.
        let last_center = last_x + current_w / 2.0;
        let next_center = next_x + current_w / 2.0;
        let min_center_delta = (current_w * 0.9).floor();
        if (next_center - last_center).abs() < min_center_delta {
            let dir_sign = if next_center >= last_center { 1.0 } else { -1.0 };
            let rmin = allowed_min_x.max(last_x - max_run_eff);
            let rmax = allowed_max_x.min(last_x + max_run_eff);
            let needed = min_center_delta - (next_center - last_center).abs();
            next_x = clampf(next_x + dir_sign * needed, rmin, rmax);
        }

        current_x = next_x;
        let next_y_raw = current_y - rise;
        let reached_top = next_y_raw <= top_y + 8.0;
        current_y = if reached_top {
            top_y + 8.0
        } else {
            clampf(next_y_raw, top_y + 8.0, base_ground_height - 40.0)
        };

        platforms.push(Platform {
            id: pid,
            rect: Rect::new(current_x, current_y, current_w, PLATFORM_THICKNESS),
            kind: PlatformKind::Platform,
            motion: Some(PlatformMove {
                base_x: current_x,
                range: current_range,
                angular_speed: lerp(speed_min, speed_max, rng.float()),
                phase: lerp(0.0, std::f32::consts::TAU, rng.float()),
            }),
        });
        climb_path.push(pid);
        pid += 1;
        last_x = current_x;

        if reached_top {
            // Stop once the climb hits the ceiling margin to avoid clustering.
            break;
        }

        // Occasional side ledge within reach of this step, for route variety.
        if current_y > top_y + 220.0 && rng.float() < 0.22 {
            let dir = if rng.float() < 0.5 { -1.0 } else { 1.0 };
            let offset_raw = dir * clampf(lerp(140.0, 220.0, rng.float()).floor(), 120.0, 240.0);
            let lw = lerp(80.0, 120.0, rng.float()).floor();
            let lx_allowed_min = SIDE_MARGIN + 40.0;
            let lx_allowed_max = width - SIDE_MARGIN - lw - 40.0;
            let lx_candidate = current_x + offset_raw;
            let lx_reach_min =
                lx_allowed_min.max(current_x - max_run_eff - lerp(40.0, 90.0, rng.float()).floor());
            let lx_reach_max =
                lx_allowed_max.min(current_x + max_run_eff + lerp(40.0, 90.0, rng.float()).floor());
            let lx = clampf(lx_candidate, lx_reach_min, lx_reach_max);
            let ly_rise = clampf(
                lerp(100.0, 160.0, rng.float()).floor(),
                100.0,
                (max_rise * 0.85).floor(),
            );
            let ly = clampf(current_y - ly_rise, top_y + 40.0, base_ground_height - 40.0);
            platforms.push(Platform {
                id: pid,
                rect: Rect::new(lx, ly, lw, PLATFORM_THICKNESS),
                kind: PlatformKind::Platform,
                motion: Some(PlatformMove {
                    base_x: lx,
                    range: lerp(40.0, 90.0, rng.float()).floor(),
                    angular_speed: lerp(speed_min, speed_max, rng.float()),
                    phase: lerp(0.0, std::f32::consts::TAU, rng.float()),
                }),
            });
            pid += 1;
        }
    }

    // The exit door rides whichever moving platform ended up highest.
    let top = platforms
        .iter()
        .filter(|p| p.kind == PlatformKind::Platform)
        .fold(None::<Platform>, |best, p| match best {
            Some(b) if b.rect.y <= p.rect.y => Some(b),
            _ => Some(*p),
        })
        .unwrap_or(platforms[0]);
    let door_local_x = (top.rect.w / 2.0).floor() - 20.0;
    let exit_door = Door {
        rect: Rect::new(top.rect.x + door_local_x, top.rect.y - 80.0, 40.0, 80.0),
        target_level_id: id + 1,
        attach_to_platform_id: Some(top.id),
        local_offset_x: door_local_x,
    };

    let (palette, title) = palette_for(id);
    LevelDefinition {
        id,
        spawn,
        bounds: Rect::new(0.0, 0.0, width, height),
        platforms,
        collectibles: Vec::new(),
        enemies: Vec::new(),
        exit_door,
        palette,
        title: title.to_string(),
        visual_seed: seed,
        climb_path,
    }
}

/// The fixed five-level set shipped as "classic" mode.
pub fn classic_levels(config: &PhysicsConfig) -> Vec<LevelDefinition> {
    (0..LEVEL_COUNT)
        .map(|i| {
            generate_vertical_level(
                i as u32 + 1,
                WORLD_WIDTH,
                WORLD_HEIGHT,
                CLASSIC_SEEDS[i],
                CLASSIC_STEPS[i],
                config,
            )
        })
        .collect()
}

/// Normalize arbitrary seed input to exactly eight decimal digits: strip
/// non-digits, left-pad with zeros, truncate the tail.
pub fn sanitize_seed(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let padded = format!("{digits:0>width$}", width = SEED_DIGITS);
    padded.chars().take(SEED_DIGITS).collect()
}

/// Expand an 8-digit base seed into the five per-level seeds by appending the
/// level number, then generate each level with the classic step counts.
pub fn levels_from_base_seed(base: &str, config: &PhysicsConfig) -> Vec<LevelDefinition> {
    let normalized = sanitize_seed(base);
    (0..LEVEL_COUNT)
        .map(|i| {
            let id = i as u32 + 1;
            let seed = format!("{normalized}{}", id % 10)
                .parse::<u64>()
                .unwrap_or(u64::from(id));
            generate_vertical_level(id, WORLD_WIDTH, WORLD_HEIGHT, seed, CLASSIC_STEPS[i], config)
        })
        .collect()
}
