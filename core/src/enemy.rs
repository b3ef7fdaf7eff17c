//! Live entity state shared by the world and the behavior system.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{BehaviorTuning, BodyId, EnemyId, PatrolShape, Rank, SpawnId};

/// Enemy archetypes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    /// Light chaser.
    Drone,
    /// Fast strafing fighter.
    Skirmisher,
    /// Slow heavy gunner.
    Gunship,
    /// Marksman firing telegraphed high-damage shots.
    Lancer,
    /// Support craft that tethers to allies and heals them.
    Mender,
    /// Fragile swarm unit.
    Swarmer,
    /// Armoured raider, usually elite.
    Marauder,
    /// Defensive gun platform, usually elite.
    Sentinel,
    /// Boss: massive broadside cruiser.
    Dreadnought,
    /// Boss: carrier surrounded by drones.
    Hivemother,
    /// Boss: serpentine hunter.
    Leviathan,
}

/// Attached behavior module chosen at spawn time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbilityKind {
    /// Periodic shots on a jittered timer.
    Standard,
    /// Wind-up then a single high-damage shot.
    Telegraphed,
    /// Heals allies instead of attacking.
    Support,
}

/// Static tuning of an enemy archetype.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyProfile {
    /// Hit points at normal rank.
    pub max_hp: f32,
    /// Base speed in units per second.
    pub speed: f32,
    /// Collision radius.
    pub radius: f32,
    /// Behavior module attached at spawn.
    pub ability: AbilityKind,
    /// Seconds between standard shots before jitter.
    pub fire_interval: f32,
    /// Projectile speed in units per second.
    pub projectile_speed: f32,
    /// Damage per projectile.
    pub damage: f32,
}

impl EnemyKind {
    /// Bosses eligible for boss arenas.
    pub const BOSSES: [EnemyKind; 3] = [Self::Dreadnought, Self::Hivemother, Self::Leviathan];

    /// Static tuning of the archetype.
    #[must_use]
    pub const fn profile(self) -> EnemyProfile {
        const fn profile(
            max_hp: f32,
            speed: f32,
            radius: f32,
            ability: AbilityKind,
            fire_interval: f32,
            damage: f32,
        ) -> EnemyProfile {
            EnemyProfile {
                max_hp,
                speed,
                radius,
                ability,
                fire_interval,
                projectile_speed: 420.0,
                damage,
            }
        }

        match self {
            Self::Drone => profile(30.0, 170.0, 16.0, AbilityKind::Standard, 1.8, 6.0),
            Self::Skirmisher => profile(45.0, 230.0, 18.0, AbilityKind::Standard, 1.2, 5.0),
            Self::Gunship => profile(110.0, 110.0, 28.0, AbilityKind::Standard, 0.9, 8.0),
            Self::Lancer => profile(55.0, 140.0, 20.0, AbilityKind::Telegraphed, 3.2, 34.0),
            Self::Mender => profile(60.0, 150.0, 20.0, AbilityKind::Support, 0.0, 0.0),
            Self::Swarmer => profile(14.0, 260.0, 10.0, AbilityKind::Standard, 2.4, 3.0),
            Self::Marauder => profile(160.0, 180.0, 30.0, AbilityKind::Standard, 1.0, 10.0),
            Self::Sentinel => profile(220.0, 90.0, 34.0, AbilityKind::Telegraphed, 2.6, 40.0),
            Self::Dreadnought => profile(2_400.0, 90.0, 90.0, AbilityKind::Standard, 0.45, 12.0),
            Self::Hivemother => profile(1_800.0, 120.0, 80.0, AbilityKind::Standard, 0.6, 9.0),
            Self::Leviathan => profile(2_000.0, 160.0, 70.0, AbilityKind::Telegraphed, 1.8, 45.0),
        }
    }

    /// Reports whether the archetype is a boss.
    #[must_use]
    pub const fn is_boss(self) -> bool {
        matches!(self, Self::Dreadnought | Self::Hivemother | Self::Leviathan)
    }
}

/// Behavioral state of an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AiState {
    /// Idle patrol around home.
    Patrol,
    /// Pursuing and attacking the player.
    Aggro,
    /// Heading back home after disengaging.
    Return,
}

/// Distance thresholds derived once when an enemy spawns.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngagementRanges {
    /// Player distance that starts an engagement.
    pub aggro: f32,
    /// Player distance within which attacks are attempted.
    pub attack: f32,
    /// Player distance beyond which an engagement ends.
    pub disengage: f32,
    /// Maximum distance from home during an engagement.
    pub leash: f32,
    /// Distance from home that counts as arrived.
    pub return_threshold: f32,
}

const BASE_RANGES: EngagementRanges = EngagementRanges {
    aggro: 520.0,
    attack: 440.0,
    disengage: 820.0,
    leash: 1_100.0,
    return_threshold: 24.0,
};

impl EngagementRanges {
    /// Ranges for an entity of `rank`, scaled by the global range multiplier.
    ///
    /// Elites reach 1.25x and bosses 1.6x further than regular enemies. The
    /// return threshold is never scaled.
    #[must_use]
    pub fn for_rank(rank: Rank, tuning: &BehaviorTuning) -> Self {
        let rank_scale = match rank {
            Rank::Normal => 1.0,
            Rank::Elite => 1.25,
            Rank::Boss => 1.6,
        };
        let scale = rank_scale * tuning.aggro_range_multiplier.max(0.0);
        Self {
            aggro: BASE_RANGES.aggro * scale,
            attack: BASE_RANGES.attack * scale,
            disengage: BASE_RANGES.disengage * scale,
            leash: BASE_RANGES.leash * scale,
            return_threshold: BASE_RANGES.return_threshold,
        }
    }
}

/// Mutable patrol bookkeeping.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatrolState {
    /// Path family.
    pub shape: PatrolShape,
    /// Path radius.
    pub radius: f32,
    /// Phase along the path in radians.
    pub phase: f32,
    /// Sweep axis for line patrols, in radians.
    pub axis: f32,
    /// Current wander destination.
    pub wander_target: Option<Vec2>,
    /// Seconds until the next wander retarget.
    pub wander_timer: f32,
    /// Strafing direction while engaged, `1.0` or `-1.0`.
    pub strafe_sign: f32,
}

/// Countdown between standard shots.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FireTimer {
    /// Seconds until the next shot.
    pub remaining: f32,
}

/// Phase of the telegraphed attack cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TelegraphPhase {
    /// Counting down to the next windup.
    Cooldown,
    /// Aiming; fires once when the timer runs out.
    Windup,
}

/// State of the telegraphed attack module.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TelegraphState {
    /// Current phase.
    pub phase: TelegraphPhase,
    /// Seconds remaining in the phase.
    pub timer: f32,
    /// Aim angle in radians.
    pub aim: f32,
}

/// State of the support module.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SupportState {
    /// Ally currently being healed.
    pub target: Option<EnemyId>,
    /// Angle around the target used while orbiting it.
    pub orbit_angle: f32,
}

/// Behavior module attached to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Ability {
    /// Periodic shots.
    Standard(FireTimer),
    /// Telegraphed high-damage shot.
    Telegraphed(TelegraphState),
    /// Tethered area heal.
    Support(SupportState),
}

impl Ability {
    /// Discriminant of the module.
    #[must_use]
    pub const fn kind(&self) -> AbilityKind {
        match self {
            Self::Standard(_) => AbilityKind::Standard,
            Self::Telegraphed(_) => AbilityKind::Telegraphed,
            Self::Support(_) => AbilityKind::Support,
        }
    }
}

/// Live enemy entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    /// Identifier allocated by the world.
    pub id: EnemyId,
    /// Descriptor the entity was created from.
    pub spawn: Option<SpawnId>,
    /// Archetype.
    pub kind: EnemyKind,
    /// Threat tier.
    pub rank: Rank,
    /// Position in world units.
    pub position: Vec2,
    /// Velocity in units per second.
    pub velocity: Vec2,
    /// Remaining hit points.
    pub hp: f32,
    /// Maximum hit points.
    pub max_hp: f32,
    /// Base speed.
    pub speed: f32,
    /// Collision radius.
    pub radius: f32,
    /// Behavioral state.
    pub state: AiState,
    /// Home position; initialised lazily when absent.
    pub home: Option<Vec2>,
    /// Engagement thresholds; initialised lazily when absent.
    pub ranges: Option<EngagementRanges>,
    /// Patrol bookkeeping.
    pub patrol: PatrolState,
    /// Attached behavior module.
    pub ability: Ability,
    /// The lifecycle manager wants this entity gone once it is home.
    pub despawn_pending: bool,
}

impl Enemy {
    /// Fraction of hit points missing, in `[0, 1]`.
    #[must_use]
    pub fn missing_fraction(&self) -> f32 {
        if self.max_hp <= 0.0 {
            return 0.0;
        }
        ((self.max_hp - self.hp) / self.max_hp).clamp(0.0, 1.0)
    }
}

/// Entry of a transient collection: projectiles, pickups and particles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Identifier allocated by the world; increases with spawn order.
    pub id: BodyId,
    /// Position in world units.
    pub position: Vec2,
    /// Velocity in units per second.
    pub velocity: Vec2,
    /// Hit points or value carried by the body.
    pub health: f32,
    /// Seconds until the body expires.
    pub ttl: f32,
    /// Damage dealt on contact.
    pub damage: f32,
}

/// Player ship state read by the world and the invariant guard.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Position in world units.
    pub position: Vec2,
    /// Velocity in units per second.
    pub velocity: Vec2,
    /// Remaining hull.
    pub health: f32,
    /// Maximum hull.
    pub max_health: f32,
    /// Remaining shield; absorbs damage before hull.
    pub shield: f32,
    /// Collision radius.
    pub radius: f32,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            health: 100.0,
            max_health: 100.0,
            shield: 50.0,
            radius: 18.0,
        }
    }
}

impl PlayerState {
    /// Applies `amount` damage to the shield first, then the hull.
    pub fn absorb(&mut self, amount: f32) {
        if amount <= 0.0 {
            return;
        }
        let shielded = amount.min(self.shield.max(0.0));
        self.shield -= shielded;
        self.health = (self.health - (amount - shielded)).max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_grow_with_rank() {
        let tuning = BehaviorTuning::default();
        let normal = EngagementRanges::for_rank(Rank::Normal, &tuning);
        let elite = EngagementRanges::for_rank(Rank::Elite, &tuning);
        let boss = EngagementRanges::for_rank(Rank::Boss, &tuning);
        assert!(normal.aggro < elite.aggro && elite.aggro < boss.aggro);
        assert!(normal.attack <= normal.aggro && normal.aggro < normal.disengage);
        assert_eq!(normal.return_threshold, boss.return_threshold);
    }

    #[test]
    fn range_multiplier_scales_every_threshold() {
        let doubled = BehaviorTuning {
            aggro_range_multiplier: 2.0,
            ..BehaviorTuning::default()
        };
        let base = EngagementRanges::for_rank(Rank::Normal, &BehaviorTuning::default());
        let scaled = EngagementRanges::for_rank(Rank::Normal, &doubled);
        assert!((scaled.leash - base.leash * 2.0).abs() < 1e-3);
        assert!((scaled.disengage - base.disengage * 2.0).abs() < 1e-3);
    }

    #[test]
    fn shield_absorbs_before_hull() {
        let mut player = PlayerState::default();
        player.absorb(30.0);
        assert_eq!(player.shield, 20.0);
        assert_eq!(player.health, 100.0);
        player.absorb(50.0);
        assert_eq!(player.shield, 0.0);
        assert_eq!(player.health, 70.0);
    }
}
