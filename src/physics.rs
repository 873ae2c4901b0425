//! Physics simulation: fixed-tick gravity, collision, jump.
//!
//! The server owns vertical motion absolutely. Clients propose horizontal
//! movement and jump intent through the router; `y`, `vertical_velocity`,
//! and `on_ground` are written only here (per-tick step from the loop in
//! [`crate::server`], jump impulse from the router), always under the
//! registry lock.

use crate::players::Player;
use crate::world::WorldStore;
use std::time::Duration;

/// Simulation period: 20 ticks per second.
pub const TICK: Duration = Duration::from_millis(50);
pub const TICK_SECONDS: f64 = 0.05;

/// Tiles per second squared; up is negative, so gravity is positive.
pub const GRAVITY: f64 = 30.0;
pub const MAX_FALL_SPEED: f64 = 25.0;
pub const JUMP_VELOCITY: f64 = -14.0;

/// Horizontal sample offsets of the avatar's 1×1 footprint.
const FOOT_LEFT: f64 = 0.1;
const FOOT_RIGHT: f64 = 0.9;

/// Rows scanned upward when the avatar center ends up inside solid terrain.
const UNSTICK_ROWS: i64 = 10;

/// Vertical delta below which no correction is broadcast.
pub const CORRECTION_EPSILON: f64 = 0.01;

fn footprint_solid(world: &WorldStore, x: f64, row: i64) -> bool {
    world.is_solid((x + FOOT_LEFT).floor() as i64, row)
        || world.is_solid((x + FOOT_RIGHT).floor() as i64, row)
}

/// Advance one player by one tick. Returns true when `y` moved far enough
/// that a correction must be broadcast.
pub fn step(world: &WorldStore, player: &mut Player) -> bool {
    let y_prev = player.y;

    let v = (player.vertical_velocity + GRAVITY * TICK_SECONDS).min(MAX_FALL_SPEED);
    player.vertical_velocity = v;
    let y_candidate = player.y + v * TICK_SECONDS;

    if v > 0.0 {
        // Descending: land on the first solid row under the feet.
        let row = (y_candidate + 1.0).floor() as i64;
        if footprint_solid(world, player.x, row) {
            player.y = (row - 1) as f64;
            player.vertical_velocity = 0.0;
            player.on_ground = true;
        } else {
            player.y = y_candidate;
            player.on_ground = false;
        }
    } else if v < 0.0 {
        // Ascending: bump the head on the first solid row above.
        let row = y_candidate.floor() as i64;
        if footprint_solid(world, player.x, row) {
            player.y = (row + 1) as f64;
            player.vertical_velocity = 0.0;
        } else {
            player.y = y_candidate;
        }
        player.on_ground = false;
    } else {
        player.y = y_candidate;
        player.on_ground = footprint_solid(world, player.x, (player.y + 1.0).floor() as i64);
    }

    unstick(world, player);

    (player.y - y_prev).abs() > CORRECTION_EPSILON
}

/// If the avatar center is buried in solid terrain, lift it to the first
/// non-solid row within the scan range.
fn unstick(world: &WorldStore, player: &mut Player) {
    let center_col = (player.x + 0.5).floor() as i64;
    let center_row = (player.y + 0.5).floor() as i64;
    if !world.is_solid(center_col, center_row) {
        return;
    }
    for d in 1..=UNSTICK_ROWS {
        let row = center_row - d;
        if !world.is_solid(center_col, row) {
            player.y = row as f64;
            player.vertical_velocity = 0.0;
            player.on_ground = false;
            return;
        }
    }
}

/// Jump intent from the router. Only grounded avatars launch.
pub fn apply_jump(player: &mut Player) -> bool {
    if !player.on_ground {
        return false;
    }
    player.vertical_velocity = JUMP_VELOCITY;
    player.on_ground = false;
    true
}

/// Whether a horizontal move to `candidate_x` collides with terrain at the
/// avatar's head or feet rows.
pub fn horizontal_blocked(world: &WorldStore, candidate_x: f64, y: f64) -> bool {
    let head_row = (y + FOOT_LEFT).floor() as i64;
    let feet_row = (y + FOOT_RIGHT).floor() as i64;
    footprint_solid(world, candidate_x, head_row) || footprint_solid(world, candidate_x, feet_row)
}
