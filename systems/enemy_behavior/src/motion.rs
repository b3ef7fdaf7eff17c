//! Per-state steering. Every function returns a target velocity.

use std::f32::consts::TAU;

use deepfield_core::{glam::Vec2, Enemy, EngagementRanges, PatrolShape, Rank};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, UnitCircle};

pub(crate) const PATROL_SPEED: f32 = 0.35;
pub(crate) const RETURN_SPEED: f32 = 0.7;
pub(crate) const AGGRO_SPEED: f32 = 1.0;
pub(crate) const BOSS_AGGRO_SCALE: f32 = 1.2;

const ORBIT_FRACTION: f32 = 0.6;
const CLEARANCE_FRACTION: f32 = 0.5;
const JITTER_WEIGHT: f32 = 0.15;
const HOVER_RATE: f32 = 1.6;
const LINE_RATE: f32 = 0.9;
const WANDER_RETARGET: (f32, f32) = (1.5, 3.5);
const WANDER_ARRIVAL: f32 = 12.0;

/// Velocity that moves from `from` toward `target` at `speed` without
/// overshooting within one `dt`.
pub(crate) fn seek(from: Vec2, target: Vec2, speed: f32, dt: f32) -> Vec2 {
    let offset = target - from;
    let distance = offset.length();
    if distance <= f32::EPSILON || speed <= 0.0 {
        return Vec2::ZERO;
    }
    if dt > 0.0 && speed * dt > distance {
        return offset / dt;
    }
    offset / distance * speed
}

pub(crate) fn patrol(
    enemy: &mut Enemy,
    home: Vec2,
    time: f32,
    dt: f32,
    rng: &mut ChaCha8Rng,
) -> Vec2 {
    let speed = enemy.speed * PATROL_SPEED;
    let radius = enemy.patrol.radius.max(1.0);
    let target = match enemy.patrol.shape {
        PatrolShape::Orbit => {
            enemy.patrol.phase = (enemy.patrol.phase + dt * speed / radius).rem_euclid(TAU);
            home + Vec2::from_angle(enemy.patrol.phase) * radius
        }
        PatrolShape::Line => {
            enemy.patrol.phase = (enemy.patrol.phase + dt * LINE_RATE).rem_euclid(TAU);
            home + Vec2::from_angle(enemy.patrol.axis) * radius * enemy.patrol.phase.sin()
        }
        PatrolShape::Wander => {
            enemy.patrol.wander_timer -= dt;
            let arrived = enemy
                .patrol
                .wander_target
                .map_or(true, |target| target.distance(enemy.position) <= WANDER_ARRIVAL);
            if arrived || enemy.patrol.wander_timer <= 0.0 {
                let [x, y]: [f64; 2] = UnitCircle.sample(rng);
                let reach = rng.gen_range(0.3..=1.0_f32) * radius;
                enemy.patrol.wander_target = Some(home + Vec2::new(x as f32, y as f32) * reach);
                enemy.patrol.wander_timer = rng.gen_range(WANDER_RETARGET.0..=WANDER_RETARGET.1);
            }
            enemy.patrol.wander_target.unwrap_or(home)
        }
        PatrolShape::Hover => {
            let bob = (time * HOVER_RATE + enemy.patrol.phase).sin();
            home + Vec2::new(0.0, bob * radius)
        }
    };
    seek(enemy.position, target, speed, dt)
}

pub(crate) fn return_home(enemy: &Enemy, home: Vec2, dt: f32) -> Vec2 {
    seek(enemy.position, home, enemy.speed * RETURN_SPEED, dt)
}

pub(crate) fn aggro(
    enemy: &Enemy,
    player: Vec2,
    ranges: &EngagementRanges,
    time: f32,
) -> Vec2 {
    let offset = player - enemy.position;
    let distance = offset.length();
    let toward = offset.normalize_or_zero();
    let orbit = ranges.attack * ORBIT_FRACTION;
    let clearance = orbit * CLEARANCE_FRACTION;

    let steer = if distance > orbit {
        toward
    } else if distance < clearance {
        -toward
    } else {
        toward.perp() * enemy.patrol.strafe_sign
    };
    let phase = enemy.patrol.phase;
    let jitter = Vec2::new((time * 2.3 + phase).sin(), (time * 1.7 + phase).cos()) * JITTER_WEIGHT;
    let direction = (steer + jitter).normalize_or_zero();

    let scale = if enemy.rank == Rank::Boss {
        AGGRO_SPEED * BOSS_AGGRO_SCALE
    } else {
        AGGRO_SPEED
    };
    direction * enemy.speed * scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seek_stops_at_target() {
        let velocity = seek(Vec2::ZERO, Vec2::new(3.0, 4.0), 100.0, 0.5);
        assert!((velocity * 0.5 - Vec2::new(3.0, 4.0)).length() < 1e-4);
        assert_eq!(seek(Vec2::ONE, Vec2::ONE, 100.0, 0.1), Vec2::ZERO);
    }

    #[test]
    fn seek_caps_speed() {
        let velocity = seek(Vec2::ZERO, Vec2::new(1_000.0, 0.0), 50.0, 0.1);
        assert!((velocity.length() - 50.0).abs() < 1e-3);
    }
}
