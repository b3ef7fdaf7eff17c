#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-entity enemy behavior: the patrol, aggro and return state machine,
//! patrol shapes, aggro steering and the attached ability modules.
//!
//! The system owns no entities. The world hands it the live enemy slice once
//! per tick and forwards the events it emits. Moment-to-moment jitter (fire
//! timers, wander retargets, strafe direction) comes from a ChaCha generator
//! that is seeded from entropy in play and from a fixed value in tests; none
//! of it affects zone reproducibility.

use std::f32::consts::TAU;

use deepfield_core::{
    glam::Vec2, Ability, AbilityKind, AiState, BehaviorTuning, Enemy, EnemyId, EngagementRanges,
    Event, FireTimer, PatrolState, Rank, SpawnDescriptor, SupportState, TelegraphPhase,
    TelegraphState,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

mod ability;
mod motion;
pub mod state;

pub use ability::HealLedger;
pub use state::{transition, Distances};

use ability::{Ally, PendingHeal};

/// Hit point multiplier applied to elite spawns.
pub const ELITE_HP_MULTIPLIER: f32 = 2.5;

/// Per-tick inputs shared by every enemy.
#[derive(Clone, Copy, Debug)]
pub struct BehaviorContext<'a> {
    /// Seconds elapsed in the tick.
    pub dt: f32,
    /// Seconds elapsed since the zone loaded; drives periodic motion.
    pub time: f32,
    /// Player position.
    pub player_position: Vec2,
    /// Zone width; enemies are clamped inside it.
    pub width: f32,
    /// Zone height; enemies are clamped inside it.
    pub height: f32,
    /// Behavior tuning in effect.
    pub tuning: &'a BehaviorTuning,
}

/// Pure system advancing enemy state machines and abilities.
#[derive(Debug)]
pub struct EnemyBehavior {
    rng: ChaCha8Rng,
    ledger: HealLedger,
}

impl Default for EnemyBehavior {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl EnemyBehavior {
    /// Creates a system whose ambient jitter is seeded from the operating system.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
            ledger: HealLedger::default(),
        }
    }

    /// Creates a system with reproducible ambient jitter.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            ledger: HealLedger::default(),
        }
    }

    /// Forgets per-zone bookkeeping. Called whenever a zone loads.
    pub fn reset(&mut self) {
        self.ledger.clear();
    }

    /// Heal grants recorded during the most recent update.
    #[must_use]
    pub fn ledger(&self) -> &HealLedger {
        &self.ledger
    }

    /// Builds a live enemy from a spawn descriptor.
    ///
    /// Engagement ranges and the ability module are fixed here and never
    /// recomputed for the lifetime of the entity.
    pub fn instantiate(
        &mut self,
        descriptor: &SpawnDescriptor,
        id: EnemyId,
        tuning: &BehaviorTuning,
    ) -> Enemy {
        let profile = descriptor.kind.profile();
        let max_hp = match descriptor.rank {
            Rank::Elite => profile.max_hp * ELITE_HP_MULTIPLIER,
            Rank::Normal | Rank::Boss => profile.max_hp,
        };
        let patrol = PatrolState {
            shape: descriptor.patrol.shape,
            radius: descriptor.patrol.radius,
            phase: self.rng.gen_range(0.0..TAU),
            axis: self.rng.gen_range(0.0..TAU),
            wander_target: None,
            wander_timer: 0.0,
            strafe_sign: if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 },
        };
        let fire_interval = profile.fire_interval * tuning.fire_interval_multiplier;
        let ability = match profile.ability {
            AbilityKind::Standard => Ability::Standard(FireTimer {
                remaining: ability::roll_fire_interval(
                    profile.fire_interval,
                    tuning,
                    &mut self.rng,
                ),
            }),
            AbilityKind::Telegraphed => Ability::Telegraphed(TelegraphState {
                phase: TelegraphPhase::Cooldown,
                timer: fire_interval,
                aim: 0.0,
            }),
            AbilityKind::Support => Ability::Support(SupportState::default()),
        };

        Enemy {
            id,
            spawn: Some(descriptor.id),
            kind: descriptor.kind,
            rank: descriptor.rank,
            position: descriptor.position,
            velocity: Vec2::ZERO,
            hp: max_hp,
            max_hp,
            speed: profile.speed,
            radius: profile.radius,
            state: AiState::Patrol,
            home: Some(descriptor.position),
            ranges: Some(EngagementRanges::for_rank(descriptor.rank, tuning)),
            patrol,
            ability,
            despawn_pending: false,
        }
    }

    /// Advances every enemy by one tick.
    ///
    /// Emits [`Event::EnemyStateChanged`], [`Event::EnemyFired`],
    /// [`Event::TelegraphStarted`] and [`Event::EnemyHealed`]. Heals are
    /// applied after every enemy has moved, so the order of the slice does
    /// not influence who gets healed.
    pub fn update(
        &mut self,
        enemies: &mut [Enemy],
        ctx: &BehaviorContext<'_>,
        out: &mut Vec<Event>,
    ) {
        self.ledger.clear();
        if ctx.dt <= 0.0 || !ctx.dt.is_finite() {
            return;
        }

        let allies: Vec<Ally> = enemies
            .iter()
            .enumerate()
            .map(|(index, enemy)| Ally::of(index, enemy))
            .collect();
        let mut heals: Vec<PendingHeal> = Vec::new();

        for enemy in enemies.iter_mut() {
            ensure_initialized(enemy, ctx.tuning);
            let velocity = if enemy.ability.kind() == AbilityKind::Support {
                ability::support(
                    enemy,
                    &allies,
                    ctx.player_position,
                    ctx.dt,
                    ctx.tuning,
                    &mut self.ledger,
                    &mut heals,
                )
            } else {
                self.drive(enemy, ctx, out)
            };
            enemy.velocity = velocity;
            enemy.position = clamp_to_zone(
                enemy.position + velocity * ctx.dt,
                enemy.radius,
                ctx.width,
                ctx.height,
            );
        }

        for heal in heals {
            let Some(target) = enemies.get_mut(heal.index) else {
                continue;
            };
            let amount = heal.amount.min((target.max_hp - target.hp).max(0.0));
            if amount <= 0.0 {
                continue;
            }
            target.hp += amount;
            out.push(Event::EnemyHealed {
                healer: heal.healer,
                target: heal.target,
                amount,
            });
        }
    }

    /// Runs the state machine, motion and attack for a non-support enemy.
    fn drive(
        &mut self,
        enemy: &mut Enemy,
        ctx: &BehaviorContext<'_>,
        out: &mut Vec<Event>,
    ) -> Vec2 {
        let home = enemy.home.unwrap_or(enemy.position);
        let ranges = enemy
            .ranges
            .unwrap_or_else(|| EngagementRanges::for_rank(enemy.rank, ctx.tuning));
        let distances = Distances {
            to_player: enemy.position.distance(ctx.player_position),
            to_home: enemy.position.distance(home),
        };

        let previous = enemy.state;
        let next = transition(previous, &distances, &ranges);
        if next != previous {
            enemy.state = next;
            out.push(Event::EnemyStateChanged {
                enemy: enemy.id,
                from: previous,
                to: next,
            });
            if next != AiState::Aggro {
                stand_down(enemy, ctx.tuning);
            }
            if next == AiState::Patrol {
                return Vec2::ZERO;
            }
        }

        match enemy.state {
            AiState::Patrol => motion::patrol(enemy, home, ctx.time, ctx.dt, &mut self.rng),
            AiState::Return => motion::return_home(enemy, home, ctx.dt),
            AiState::Aggro => {
                self.attack(enemy, ctx, distances.to_player <= ranges.attack, out);
                motion::aggro(enemy, ctx.player_position, &ranges, ctx.time)
            }
        }
    }

    fn attack(
        &mut self,
        enemy: &mut Enemy,
        ctx: &BehaviorContext<'_>,
        in_range: bool,
        out: &mut Vec<Event>,
    ) {
        let mut module = enemy.ability;
        match &mut module {
            Ability::Standard(timer) => {
                if in_range {
                    ability::standard(
                        enemy,
                        timer,
                        ctx.player_position,
                        ctx.dt,
                        ctx.tuning,
                        &mut self.rng,
                        out,
                    );
                }
            }
            Ability::Telegraphed(telegraph) => ability::telegraphed(
                enemy,
                telegraph,
                ctx.player_position,
                in_range,
                ctx.dt,
                ctx.tuning,
                out,
            ),
            Ability::Support(_) => {}
        }
        enemy.ability = module;
    }
}

/// Aborts an in-progress telegraph windup and restarts its cooldown.
///
/// Called whenever an enemy leaves `Aggro`, including forced recalls.
pub fn stand_down(enemy: &mut Enemy, tuning: &BehaviorTuning) {
    let cooldown = ability::telegraph_cooldown(enemy, tuning);
    if let Ability::Telegraphed(telegraph) = &mut enemy.ability {
        if telegraph.phase == TelegraphPhase::Windup {
            telegraph.phase = TelegraphPhase::Cooldown;
            telegraph.timer = cooldown;
        }
    }
}

/// Fills in a missing home or missing ranges from defaults.
fn ensure_initialized(enemy: &mut Enemy, tuning: &BehaviorTuning) {
    if enemy.home.is_none() {
        tracing::warn!(
            enemy = enemy.id.get(),
            "enemy has no home; anchoring at current position"
        );
        enemy.home = Some(enemy.position);
    }
    if enemy.ranges.is_none() {
        tracing::warn!(
            enemy = enemy.id.get(),
            "enemy has no engagement ranges; deriving defaults"
        );
        enemy.ranges = Some(EngagementRanges::for_rank(enemy.rank, tuning));
    }
}

/// Clamps finite points into the zone. Non-finite points pass through
/// untouched so the invariant guard still sees them.
fn clamp_to_zone(point: Vec2, radius: f32, width: f32, height: f32) -> Vec2 {
    if !point.is_finite() {
        return point;
    }
    let min = Vec2::new(radius.min(width * 0.5), radius.min(height * 0.5)).max(Vec2::ZERO);
    let max = (Vec2::new(width, height) - min).max(min);
    point.clamp(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepfield_core::{EnemyKind, PatrolProfile, PatrolShape, SpawnId, SpawnState};

    fn descriptor(kind: EnemyKind, rank: Rank, position: Vec2) -> SpawnDescriptor {
        SpawnDescriptor {
            id: SpawnId::new(0),
            position,
            kind,
            rank,
            patrol: PatrolProfile {
                shape: PatrolShape::Orbit,
                radius: 120.0,
            },
            pack: None,
            state: SpawnState::default(),
        }
    }

    #[test]
    fn instantiate_attaches_ability_by_archetype() {
        let tuning = BehaviorTuning::default();
        let mut behavior = EnemyBehavior::with_seed(1);
        let at = Vec2::new(500.0, 500.0);
        let mut spawn = |kind, id| {
            behavior.instantiate(&descriptor(kind, Rank::Normal, at), EnemyId::new(id), &tuning)
        };
        let lancer = spawn(EnemyKind::Lancer, 1);
        let mender = spawn(EnemyKind::Mender, 2);
        let drone = spawn(EnemyKind::Drone, 3);
        assert_eq!(lancer.ability.kind(), AbilityKind::Telegraphed);
        assert_eq!(mender.ability.kind(), AbilityKind::Support);
        assert_eq!(drone.ability.kind(), AbilityKind::Standard);
        assert_eq!(drone.home, Some(at));
        assert_eq!(drone.state, AiState::Patrol);
    }

    #[test]
    fn elites_are_tougher() {
        let tuning = BehaviorTuning::default();
        let mut behavior = EnemyBehavior::with_seed(1);
        let at = Vec2::new(500.0, 500.0);
        let normal = behavior.instantiate(
            &descriptor(EnemyKind::Marauder, Rank::Normal, at),
            EnemyId::new(1),
            &tuning,
        );
        let elite = behavior.instantiate(
            &descriptor(EnemyKind::Marauder, Rank::Elite, at),
            EnemyId::new(2),
            &tuning,
        );
        assert!((elite.max_hp - normal.max_hp * ELITE_HP_MULTIPLIER).abs() < 1e-3);
        assert!(elite.ranges.expect("ranges").aggro > normal.ranges.expect("ranges").aggro);
    }

    #[test]
    fn standard_fire_interval_is_jittered_within_bounds() {
        let tuning = BehaviorTuning::default();
        let mut behavior = EnemyBehavior::with_seed(9);
        let base = EnemyKind::Drone.profile().fire_interval;
        for index in 0..200 {
            let enemy = behavior.instantiate(
                &descriptor(EnemyKind::Drone, Rank::Normal, Vec2::splat(400.0)),
                EnemyId::new(index),
                &tuning,
            );
            let Ability::Standard(timer) = enemy.ability else {
                panic!("expected standard ability");
            };
            assert!(timer.remaining >= base * 0.75 - 1e-4);
            assert!(timer.remaining <= base * 1.25 + 1e-4);
        }
    }

    #[test]
    fn clamp_keeps_entities_inside() {
        let clamped = clamp_to_zone(Vec2::new(-50.0, 9_000.0), 10.0, 1_000.0, 800.0);
        assert_eq!(clamped, Vec2::new(10.0, 790.0));
        let corrupt = clamp_to_zone(Vec2::new(f32::NAN, 0.0), 10.0, 1_000.0, 800.0);
        assert!(corrupt.x.is_nan());
        assert_eq!(corrupt.y, 0.0);
    }
}
