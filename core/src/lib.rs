#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Deepfield simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems and
//! external collaborators (renderer, progression, audio) to react to. The
//! data model for generated zones and live entities, the configuration
//! tables, and the seeded generator that keeps generation reproducible live
//! here as well.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod config;
pub mod enemy;
pub mod random;
pub mod zone;

pub use config::{
    ArenaConfig, BehaviorTuning, BiomeConfig, BiomeTable, CapTuning, DensityTuning, DepthRamp,
    EntityCaps, ModifierTuning, ObstacleWeights, PackComposition, PackMember, PackTemplate,
    PackTuning, RampTuning, RotationTuning, SpacingTuning, Span, StreamingTuning, Tuning,
    WorldConfig,
};
pub use enemy::{
    Ability, AbilityKind, AiState, Body, Enemy, EnemyKind, EnemyProfile, EngagementRanges,
    FireTimer, PatrolState, PlayerState, SupportState, TelegraphPhase, TelegraphState,
};
pub use glam;
pub use random::{derive_seed, label_seed, SeededRandom};
pub use zone::{
    Background, Decoration, DecorationKind, Edge, ModifierEffect, Obstacle, ObstacleKind, PackId,
    PackTag, ParallaxLayer, PatrolProfile, PatrolShape, Portal, PortalDestination, Rank,
    SpawnDescriptor, SpawnState, Zone, ZoneModifier,
};

/// Identifier of a biome (act theme) in the biome table.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BiomeId(String);

impl BiomeId {
    /// Creates a biome identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Textual form of the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BiomeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier assigned to a live enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a spawn descriptor, unique within its zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpawnId(u32);

impl SpawnId {
    /// Creates a new spawn identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a transient body. Allocation order equals age order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(u64);

impl BodyId {
    /// Creates a new body identifier.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Live collections whose size the invariant guard bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedCollection {
    /// Player projectiles.
    Bullets,
    /// Enemy projectiles.
    EnemyBullets,
    /// Live enemies.
    Enemies,
    /// Pickups dropped by kills.
    Pickups,
    /// Visual particles.
    Particles,
}

impl TrackedCollection {
    /// Every tracked collection in check order.
    pub const ALL: [TrackedCollection; 5] = [
        Self::Bullets,
        Self::EnemyBullets,
        Self::Enemies,
        Self::Pickups,
        Self::Particles,
    ];

    /// Stable name used in logs and diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bullets => "bullets",
            Self::EnemyBullets => "enemy_bullets",
            Self::Enemies => "enemies",
            Self::Pickups => "pickups",
            Self::Particles => "particles",
        }
    }
}

impl fmt::Display for TrackedCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Size of the viewport in world units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewSize {
    /// Visible width.
    pub width: f32,
    /// Visible height.
    pub height: f32,
}

impl ViewSize {
    /// Creates a view size.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Invalid zone or theme references. Generation is aborted for the call.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ZoneError {
    /// The requested theme is not in the biome table.
    #[error("unknown theme `{0}`")]
    UnknownTheme(BiomeId),
    /// The biome table has no entries.
    #[error("biome table is empty")]
    EmptyBiomeTable,
    /// A zone was requested before the world was initialised.
    #[error("world has not been initialised")]
    NotInitialized,
    /// Zone indices start at one and stop at the configured maximum depth.
    #[error("zone index {0} is out of range")]
    InvalidIndex(u32),
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Starts a new run and loads its first zone.
    InitWorld {
        /// Theme pinned for the first theme block.
        theme: Option<BiomeId>,
        /// Run seed; wall-clock derived when absent.
        run_seed: Option<u32>,
    },
    /// Loads the zone at the provided depth.
    LoadZone {
        /// Depth of the zone, starting at one.
        index: u32,
    },
    /// Advances the simulation by one tick.
    Tick {
        /// Seconds elapsed since the previous tick.
        dt: f32,
        /// Current viewport size in world units.
        view: ViewSize,
        /// Whether the interact input is held this tick.
        interact: bool,
    },
    /// Pushes the player out of overlapping obstacles.
    ResolvePlayerCollisions {
        /// Seconds elapsed since the previous tick.
        dt: f32,
    },
    /// Overwrites the player's motion as decided by the input collaborator.
    SetPlayerMotion {
        /// New position.
        position: Vec2,
        /// New velocity.
        velocity: Vec2,
    },
    /// Applies damage to the player.
    DamagePlayer {
        /// Damage amount.
        amount: f32,
    },
    /// Instantiates a live enemy for a spawn descriptor.
    ActivateSpawn {
        /// Descriptor to activate.
        spawn: SpawnId,
    },
    /// Applies damage to a live enemy.
    DamageEnemy {
        /// Target enemy.
        enemy: EnemyId,
        /// Damage amount.
        amount: f32,
    },
    /// Kills a live enemy in combat.
    KillEnemy {
        /// Target enemy.
        enemy: EnemyId,
    },
    /// Appends a body to a transient collection.
    SpawnBody {
        /// Destination collection; `Enemies` is rejected.
        collection: TrackedCollection,
        /// Initial position.
        position: Vec2,
        /// Initial velocity.
        velocity: Vec2,
        /// Lifetime in seconds.
        ttl: f32,
        /// Contact damage.
        damage: f32,
    },
    /// Removes the oldest `count` entries of a collection.
    TrimOldest {
        /// Collection to trim.
        collection: TrackedCollection,
        /// Entries to remove.
        count: usize,
    },
}

/// Events broadcast by the world and systems after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A new run started.
    WorldInitialized {
        /// Run seed in effect.
        run_seed: u32,
    },
    /// A zone finished loading.
    ZoneLoaded {
        /// Depth of the zone.
        index: u32,
        /// Theme of the zone.
        biome: BiomeId,
        /// Zone seed.
        seed: u32,
        /// Boss guarding the zone, if it is an arena.
        boss: Option<EnemyKind>,
        /// Modifiers active in the zone.
        modifiers: Vec<ZoneModifier>,
    },
    /// A zone could not be generated; the previous zone stays loaded.
    ZoneLoadFailed {
        /// Requested depth.
        index: u32,
        /// Reason for the failure.
        error: ZoneError,
    },
    /// The simulation clock advanced.
    TimeAdvanced {
        /// Seconds elapsed in the tick.
        dt: f32,
    },
    /// A live enemy was created for a descriptor.
    EnemySpawned {
        /// New enemy.
        enemy: EnemyId,
        /// Originating descriptor.
        spawn: SpawnId,
        /// Archetype.
        kind: EnemyKind,
        /// Threat tier.
        rank: Rank,
        /// Spawn position.
        position: Vec2,
    },
    /// A live enemy left the simulation without dying.
    EnemyDespawned {
        /// Removed enemy.
        enemy: EnemyId,
        /// Originating descriptor.
        spawn: Option<SpawnId>,
    },
    /// An engaged enemy was ordered home ahead of despawning.
    EnemyRecalled {
        /// Recalled enemy.
        enemy: EnemyId,
    },
    /// An enemy changed behavioral state.
    EnemyStateChanged {
        /// Enemy concerned.
        enemy: EnemyId,
        /// Previous state.
        from: AiState,
        /// New state.
        to: AiState,
    },
    /// An enemy fired a projectile.
    EnemyFired {
        /// Shooter.
        enemy: EnemyId,
        /// Muzzle position.
        origin: Vec2,
        /// Unit direction.
        direction: Vec2,
        /// Projectile speed.
        speed: f32,
        /// Projectile damage.
        damage: f32,
        /// Whether the shot followed a telegraphed windup.
        telegraphed: bool,
    },
    /// A telegraphed windup began.
    TelegraphStarted {
        /// Shooter.
        enemy: EnemyId,
        /// Initial aim angle in radians.
        aim: f32,
    },
    /// A support enemy healed an ally.
    EnemyHealed {
        /// Support enemy.
        healer: EnemyId,
        /// Healed ally.
        target: EnemyId,
        /// Hit points restored.
        amount: f32,
    },
    /// An enemy took damage and survived.
    EnemyDamaged {
        /// Damaged enemy.
        enemy: EnemyId,
        /// Damage applied.
        amount: f32,
        /// Remaining hit points.
        remaining: f32,
    },
    /// An enemy died in combat. Progression collaborators credit rewards from this.
    EnemyKilled {
        /// Killed enemy.
        enemy: EnemyId,
        /// Originating descriptor.
        spawn: Option<SpawnId>,
        /// Archetype.
        kind: EnemyKind,
        /// Threat tier.
        rank: Rank,
        /// Position at death.
        position: Vec2,
    },
    /// The zone boss died and a victory portal opened.
    BossDefeated {
        /// Boss archetype.
        kind: EnemyKind,
        /// Portal position.
        portal: Vec2,
    },
    /// The player reached the zone exit.
    ExitReached {
        /// Depth that was completed.
        index: u32,
    },
    /// The player used a portal.
    PortalEntered {
        /// Destination taken.
        destination: PortalDestination,
    },
    /// The run left the zones for the hub.
    ReturnedToHub,
    /// The player overlapped an obstacle.
    PlayerCollided {
        /// Obstacle family.
        kind: ObstacleKind,
        /// Contact damage applied.
        damage: f32,
    },
    /// A mine detonated against the player.
    MineDetonated {
        /// Mine position.
        position: Vec2,
        /// Damage applied.
        damage: f32,
    },
    /// A collection exceeded its cap and lost its oldest entries.
    CollectionTrimmed {
        /// Trimmed collection.
        collection: TrackedCollection,
        /// Entries removed.
        removed: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::{BiomeId, BiomeTable, SpawnId, TrackedCollection, Tuning};
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn biome_table_round_trips_through_bincode() {
        assert_round_trip(&BiomeTable::default());
    }

    #[test]
    fn tuning_round_trips_through_bincode() {
        assert_round_trip(&Tuning::default());
    }

    #[test]
    fn spawn_id_round_trips_through_bincode() {
        assert_round_trip(&SpawnId::new(17));
    }

    #[test]
    fn biome_id_displays_its_text() {
        assert_eq!(BiomeId::new("void").to_string(), "void");
    }

    #[test]
    fn tracked_collection_names_are_unique() {
        let mut names: Vec<_> = TrackedCollection::ALL.iter().map(|c| c.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), TrackedCollection::ALL.len());
    }
}
