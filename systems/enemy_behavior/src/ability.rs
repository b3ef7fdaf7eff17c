//! Attack and support modules attached to enemies at spawn time.

use std::collections::HashMap;
use std::f32::consts::{PI, TAU};

use deepfield_core::{
    glam::Vec2, Ability, BehaviorTuning, Enemy, EnemyId, Event, FireTimer, Rank, TelegraphPhase,
    TelegraphState,
};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::motion::{seek, PATROL_SPEED, RETURN_SPEED};

const FIRE_JITTER: (f32, f32) = (0.75, 1.25);
const MIN_FIRE_INTERVAL: f32 = 0.05;
const SUPPORT_ORBIT_RATE: f32 = 1.2;
const SUPPORT_STANDOFF: f32 = 360.0;

/// Healing granted to each target during the current tick.
///
/// Every support entity draws from the same per-target budget, so stacking
/// healers on one ally never exceeds the shared cap.
#[derive(Clone, Debug, Default)]
pub struct HealLedger {
    granted: HashMap<EnemyId, f32>,
}

impl HealLedger {
    /// Forgets every grant; called at the start of each tick and on zone loads.
    pub fn clear(&mut self) {
        self.granted.clear();
    }

    /// Healing already granted to `target` this tick.
    #[must_use]
    pub fn granted(&self, target: EnemyId) -> f32 {
        self.granted.get(&target).copied().unwrap_or(0.0)
    }

    /// Grants up to `requested` healing to `target` without exceeding
    /// `shared_cap` for the tick. Returns the amount granted.
    pub fn grant(&mut self, target: EnemyId, requested: f32, shared_cap: f32) -> f32 {
        let available = (shared_cap - self.granted(target)).max(0.0);
        let amount = requested.min(available).max(0.0);
        if amount > 0.0 {
            *self.granted.entry(target).or_insert(0.0) += amount;
        }
        amount
    }
}

/// Interval until the next standard shot, jittered around the archetype's base.
pub(crate) fn roll_fire_interval(
    base: f32,
    tuning: &BehaviorTuning,
    rng: &mut ChaCha8Rng,
) -> f32 {
    let jitter = rng.gen_range(FIRE_JITTER.0..=FIRE_JITTER.1);
    (base * tuning.fire_interval_multiplier * jitter).max(MIN_FIRE_INTERVAL)
}

fn fire(enemy: &Enemy, direction: Vec2, telegraphed: bool, out: &mut Vec<Event>) {
    let profile = enemy.kind.profile();
    let direction = if direction == Vec2::ZERO {
        Vec2::X
    } else {
        direction
    };
    out.push(Event::EnemyFired {
        enemy: enemy.id,
        origin: enemy.position + direction * enemy.radius,
        direction,
        speed: profile.projectile_speed,
        damage: profile.damage,
        telegraphed,
    });
}

pub(crate) fn standard(
    enemy: &Enemy,
    timer: &mut FireTimer,
    player: Vec2,
    dt: f32,
    tuning: &BehaviorTuning,
    rng: &mut ChaCha8Rng,
    out: &mut Vec<Event>,
) {
    timer.remaining -= dt;
    if timer.remaining > 0.0 {
        return;
    }
    fire(enemy, (player - enemy.position).normalize_or_zero(), false, out);
    timer.remaining = roll_fire_interval(enemy.kind.profile().fire_interval, tuning, rng);
}

/// Advances the telegraphed shot cycle.
///
/// `in_range` gates the cooldown only; a windup that has started always
/// completes while the enemy stays engaged.
pub(crate) fn telegraphed(
    enemy: &Enemy,
    state: &mut TelegraphState,
    player: Vec2,
    in_range: bool,
    dt: f32,
    tuning: &BehaviorTuning,
    out: &mut Vec<Event>,
) {
    let bearing = angle_to(enemy.position, player);
    match state.phase {
        TelegraphPhase::Cooldown => {
            if !in_range {
                return;
            }
            state.timer -= dt;
            if state.timer <= 0.0 {
                state.phase = TelegraphPhase::Windup;
                state.timer = tuning.telegraph_windup.max(0.0);
                state.aim = bearing;
                out.push(Event::TelegraphStarted {
                    enemy: enemy.id,
                    aim: bearing,
                });
            }
        }
        TelegraphPhase::Windup => {
            state.aim = turn_toward(state.aim, bearing, tuning.telegraph_turn_rate * dt);
            state.timer -= dt;
            if state.timer <= 0.0 {
                fire(enemy, Vec2::from_angle(state.aim), true, out);
                state.phase = TelegraphPhase::Cooldown;
                state.timer = telegraph_cooldown(enemy, tuning);
            }
        }
    }
}

pub(crate) fn telegraph_cooldown(enemy: &Enemy, tuning: &BehaviorTuning) -> f32 {
    (enemy.kind.profile().fire_interval * tuning.fire_interval_multiplier).max(MIN_FIRE_INTERVAL)
}

fn angle_to(from: Vec2, to: Vec2) -> f32 {
    let offset = to - from;
    offset.y.atan2(offset.x)
}

/// Rotates `current` toward `target` by at most `max_step` radians.
pub(crate) fn turn_toward(current: f32, target: f32, max_step: f32) -> f32 {
    let delta = (target - current + PI).rem_euclid(TAU) - PI;
    let step = delta.clamp(-max_step.abs(), max_step.abs());
    current + step
}

/// Read-only view of an ally used while a support entity picks a target.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Ally {
    pub(crate) id: EnemyId,
    pub(crate) index: usize,
    pub(crate) position: Vec2,
    pub(crate) hp: f32,
    pub(crate) max_hp: f32,
    pub(crate) rank: Rank,
    pub(crate) support: bool,
}

impl Ally {
    pub(crate) fn of(index: usize, enemy: &Enemy) -> Self {
        Self {
            id: enemy.id,
            index,
            position: enemy.position,
            hp: enemy.hp,
            max_hp: enemy.max_hp,
            rank: enemy.rank,
            support: matches!(enemy.ability, Ability::Support(_)),
        }
    }

    fn missing(&self) -> f32 {
        (self.max_hp - self.hp).max(0.0)
    }
}

/// Heal owed to an ally once every enemy has moved this tick.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PendingHeal {
    pub(crate) healer: EnemyId,
    pub(crate) target: EnemyId,
    pub(crate) index: usize,
    pub(crate) amount: f32,
}

fn priority(ally: &Ally, distance: f32, search_radius: f32) -> f32 {
    let rank = match ally.rank {
        Rank::Boss => 3.0,
        Rank::Elite => 1.5,
        Rank::Normal => 0.0,
    };
    let missing = if ally.max_hp > 0.0 {
        ally.missing() / ally.max_hp
    } else {
        0.0
    };
    let proximity = 1.0 - (distance / search_radius.max(1.0)).min(1.0);
    rank + missing * 2.0 + proximity
}

/// Best wounded non-support ally within the search radius.
pub(crate) fn choose_target(
    healer: &Enemy,
    allies: &[Ally],
    tuning: &BehaviorTuning,
) -> Option<Ally> {
    allies
        .iter()
        .filter(|ally| ally.id != healer.id && !ally.support)
        .filter(|ally| ally.hp > 0.0 && ally.missing() > 0.0)
        .filter_map(|ally| {
            let distance = ally.position.distance(healer.position);
            (distance <= tuning.support_search_radius).then_some((ally, distance))
        })
        .fold(None, |best: Option<(Ally, f32)>, (ally, distance)| {
            let score = priority(ally, distance, tuning.support_search_radius);
            match best {
                Some((_, best_score)) if best_score >= score => best,
                _ => Some((*ally, score)),
            }
        })
        .map(|(ally, _)| ally)
}

/// Moves a support entity and queues its heal. Returns the velocity to apply.
pub(crate) fn support(
    healer: &mut Enemy,
    allies: &[Ally],
    player: Vec2,
    dt: f32,
    tuning: &BehaviorTuning,
    ledger: &mut HealLedger,
    heals: &mut Vec<PendingHeal>,
) -> Vec2 {
    let target = choose_target(healer, allies, tuning);
    let Ability::Support(state) = &mut healer.ability else {
        return Vec2::ZERO;
    };
    state.target = target.map(|ally| ally.id);

    let Some(target) = target else {
        let offset = player - healer.position;
        if offset.length() <= SUPPORT_STANDOFF {
            return Vec2::ZERO;
        }
        let stop = player - offset.normalize_or_zero() * SUPPORT_STANDOFF;
        return seek(healer.position, stop, healer.speed * PATROL_SPEED, dt);
    };

    state.orbit_angle = (state.orbit_angle + SUPPORT_ORBIT_RATE * dt).rem_euclid(TAU);
    let station =
        target.position + Vec2::from_angle(state.orbit_angle) * tuning.support_orbit_radius;
    let velocity = seek(healer.position, station, healer.speed * RETURN_SPEED, dt);

    let next = healer.position + velocity * dt;
    if next.distance(target.position) <= tuning.support_tether_range {
        let remaining = (target.missing() - ledger.granted(target.id)).max(0.0);
        let requested = (tuning.heal_rate * dt)
            .min(tuning.heal_cap_per_tick)
            .min(remaining);
        let amount = ledger.grant(target.id, requested, tuning.shared_heal_cap_per_tick);
        if amount > 0.0 {
            heals.push(PendingHeal {
                healer: healer.id,
                target: target.id,
                index: target.index,
                amount,
            });
        }
    }
    velocity
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_caps_shared_healing() {
        let mut ledger = HealLedger::default();
        let target = EnemyId::new(3);
        assert_eq!(ledger.grant(target, 1.5, 2.0), 1.5);
        assert_eq!(ledger.grant(target, 1.5, 2.0), 0.5);
        assert_eq!(ledger.grant(target, 1.5, 2.0), 0.0);
        assert_eq!(ledger.granted(EnemyId::new(4)), 0.0);
        ledger.clear();
        assert_eq!(ledger.granted(target), 0.0);
    }

    #[test]
    fn turn_toward_respects_rate_and_wraps() {
        let turned = turn_toward(0.0, 1.0, 0.25);
        assert!((turned - 0.25).abs() < 1e-6);
        let wrapped = turn_toward(3.0, -3.0, 0.1);
        assert!(wrapped > 3.0, "should turn through pi, got {wrapped}");
        assert!((turn_toward(0.5, 0.6, 1.0) - 0.6).abs() < 1e-6);
    }
}
