//! Configuration tables consumed by generation, streaming and behavior.
//!
//! Every struct deserializes with `#[serde(default)]`, so a configuration file
//! may supply any subset of keys; anything missing falls back to the values
//! documented by the `Default` implementations below.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{BiomeId, DecorationKind, EnemyKind, TrackedCollection};

/// Closed interval of world units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// Lower bound.
    pub min: f32,
    /// Upper bound.
    pub max: f32,
}

impl Span {
    /// Creates a span.
    #[must_use]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }
}

/// Relative odds of each destructible obstacle family.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleWeights {
    /// Asteroid weight.
    pub asteroid: f32,
    /// Debris weight.
    pub debris: f32,
    /// Mine weight.
    pub mine: f32,
}

impl Default for ObstacleWeights {
    fn default() -> Self {
        Self {
            asteroid: 6.0,
            debris: 3.0,
            mine: 1.0,
        }
    }
}

/// Boss arena parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Arena width.
    pub width: f32,
    /// Arena height.
    pub height: f32,
    /// Radius of the cover ring around the arena centre.
    pub cover_ring_radius: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: 2_600.0,
            height: 1_800.0,
            cover_ring_radius: 520.0,
        }
    }
}

/// Generation parameters for one biome (act theme).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiomeConfig {
    /// Display name.
    pub name: String,
    /// Width range before scaling.
    pub width: Span,
    /// Height range before scaling.
    pub height: Span,
    /// Regular enemy pool.
    pub enemy_pool: Vec<EnemyKind>,
    /// Elite pool.
    pub elite_pool: Vec<EnemyKind>,
    /// Regular enemies per square world unit.
    pub enemy_density: f32,
    /// Elites per square world unit.
    pub elite_density: f32,
    /// Obstacles per square world unit.
    pub obstacle_density: f32,
    /// Decorations per square world unit.
    pub decoration_density: f32,
    /// Background stars per square world unit on the nearest layer.
    pub star_density: f32,
    /// Obstacle family odds.
    pub obstacle_weights: ObstacleWeights,
    /// Decoration pool.
    pub decoration_pool: Vec<DecorationKind>,
    /// Backdrop colour.
    pub base_color: [u8; 3],
    /// Boss arena parameters.
    pub boss_arena: ArenaConfig,
}

impl Default for BiomeConfig {
    fn default() -> Self {
        Self {
            name: String::from("Uncharted"),
            width: Span::new(3_600.0, 4_800.0),
            height: Span::new(2_600.0, 3_400.0),
            enemy_pool: vec![EnemyKind::Drone, EnemyKind::Skirmisher],
            elite_pool: vec![EnemyKind::Marauder],
            enemy_density: 2.4e-6,
            elite_density: 2.0e-7,
            obstacle_density: 3.0e-6,
            decoration_density: 1.5e-6,
            star_density: 2.5e-5,
            obstacle_weights: ObstacleWeights::default(),
            decoration_pool: vec![DecorationKind::Wreck, DecorationKind::Wisp],
            base_color: [6, 8, 18],
            boss_arena: ArenaConfig::default(),
        }
    }
}

/// Biome table keyed by id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BiomeTable {
    biomes: BTreeMap<BiomeId, BiomeConfig>,
}

impl BiomeTable {
    /// Creates a table from `(id, config)` pairs.
    #[must_use]
    pub fn new(entries: impl IntoIterator<Item = (BiomeId, BiomeConfig)>) -> Self {
        Self {
            biomes: entries.into_iter().collect(),
        }
    }

    /// Looks up a biome.
    #[must_use]
    pub fn get(&self, id: &BiomeId) -> Option<&BiomeConfig> {
        self.biomes.get(id)
    }

    /// Biome ids in sorted order.
    #[must_use]
    pub fn ids(&self) -> Vec<BiomeId> {
        self.biomes.keys().cloned().collect()
    }

    /// Number of biomes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.biomes.len()
    }

    /// Reports whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.biomes.is_empty()
    }
}

impl Default for BiomeTable {
    fn default() -> Self {
        let void = BiomeConfig {
            name: String::from("The Void"),
            enemy_pool: vec![EnemyKind::Drone, EnemyKind::Skirmisher, EnemyKind::Lancer],
            elite_pool: vec![EnemyKind::Marauder],
            base_color: [4, 4, 12],
            ..BiomeConfig::default()
        };
        let nebula = BiomeConfig {
            name: String::from("Ember Nebula"),
            width: Span::new(4_000.0, 5_200.0),
            enemy_pool: vec![
                EnemyKind::Drone,
                EnemyKind::Gunship,
                EnemyKind::Mender,
                EnemyKind::Swarmer,
            ],
            elite_pool: vec![EnemyKind::Marauder, EnemyKind::Sentinel],
            enemy_density: 2.8e-6,
            decoration_pool: vec![DecorationKind::Wisp, DecorationKind::Beacon],
            base_color: [28, 8, 22],
            ..BiomeConfig::default()
        };
        let belt = BiomeConfig {
            name: String::from("Shattered Belt"),
            enemy_pool: vec![EnemyKind::Skirmisher, EnemyKind::Swarmer, EnemyKind::Lancer],
            elite_pool: vec![EnemyKind::Sentinel],
            obstacle_density: 7.5e-6,
            obstacle_weights: ObstacleWeights {
                asteroid: 8.0,
                debris: 2.0,
                mine: 0.5,
            },
            decoration_pool: vec![DecorationKind::IceShard, DecorationKind::Wreck],
            base_color: [10, 12, 16],
            ..BiomeConfig::default()
        };
        let derelict = BiomeConfig {
            name: String::from("Derelict Yards"),
            enemy_pool: vec![
                EnemyKind::Gunship,
                EnemyKind::Drone,
                EnemyKind::Mender,
                EnemyKind::Lancer,
            ],
            elite_pool: vec![EnemyKind::Marauder, EnemyKind::Sentinel],
            elite_density: 3.0e-7,
            obstacle_weights: ObstacleWeights {
                asteroid: 1.0,
                debris: 6.0,
                mine: 2.0,
            },
            decoration_pool: vec![
                DecorationKind::Wreck,
                DecorationKind::Satellite,
                DecorationKind::Beacon,
            ],
            base_color: [14, 14, 10],
            ..BiomeConfig::default()
        };

        Self::new([
            (BiomeId::new("void"), void),
            (BiomeId::new("nebula"), nebula),
            (BiomeId::new("asteroid_belt"), belt),
            (BiomeId::new("derelict"), derelict),
        ])
    }
}

/// Global density multipliers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityTuning {
    /// Multiplier applied to every biome's enemy density.
    pub enemy_multiplier: f32,
    /// Multiplier applied to every biome's elite density.
    pub elite_multiplier: f32,
}

impl Default for DensityTuning {
    fn default() -> Self {
        Self {
            enemy_multiplier: 1.0,
            elite_multiplier: 1.0,
        }
    }
}

/// Hard caps guaranteeing bounded generation output.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapTuning {
    /// Maximum regular enemy descriptors per zone.
    pub max_enemy_spawns_per_zone: usize,
    /// Maximum elite descriptors per zone.
    pub max_elite_spawns_per_zone: usize,
    /// Maximum obstacles per zone.
    pub max_obstacles_per_zone: usize,
    /// Maximum decorations per zone.
    pub max_decorations_per_zone: usize,
    /// Maximum stars per parallax layer.
    pub max_stars_per_layer: u32,
    /// Widest zone allowed after scaling.
    pub max_zone_width: f32,
    /// Tallest zone allowed after scaling.
    pub max_zone_height: f32,
    /// Smallest extent allowed along either axis after scaling.
    pub min_zone_extent: f32,
}

impl Default for CapTuning {
    fn default() -> Self {
        Self {
            max_enemy_spawns_per_zone: 48,
            max_elite_spawns_per_zone: 6,
            max_obstacles_per_zone: 90,
            max_decorations_per_zone: 60,
            max_stars_per_layer: 420,
            max_zone_width: 9_000.0,
            max_zone_height: 6_500.0,
            min_zone_extent: 1_600.0,
        }
    }
}

/// Depth ramp `1 + min(depth * rate, ceiling)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DepthRamp {
    /// Growth per depth.
    pub rate: f32,
    /// Maximum growth.
    pub ceiling: f32,
}

impl DepthRamp {
    /// Creates a ramp.
    #[must_use]
    pub const fn new(rate: f32, ceiling: f32) -> Self {
        Self { rate, ceiling }
    }

    /// Multiplier for `depth`.
    #[must_use]
    pub fn factor(&self, depth: u32) -> f32 {
        1.0 + (depth as f32 * self.rate).min(self.ceiling).max(0.0)
    }
}

/// Depth ramps per generated class.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RampTuning {
    /// Regular enemy density ramp.
    pub enemy: DepthRamp,
    /// Elite density ramp.
    pub elite: DepthRamp,
    /// Obstacle density ramp.
    pub obstacle: DepthRamp,
    /// Zone dimension ramp.
    pub dimension: DepthRamp,
}

impl Default for RampTuning {
    fn default() -> Self {
        Self {
            enemy: DepthRamp::new(0.08, 1.5),
            elite: DepthRamp::new(0.05, 1.0),
            obstacle: DepthRamp::new(0.04, 0.8),
            dimension: DepthRamp::new(0.03, 0.6),
        }
    }
}

/// Minimum distances enforced while placing zone content.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpacingTuning {
    /// Inset of the spawn and exit points from their edge and corners.
    pub edge_margin: f32,
    /// Minimum distance between an enemy spawn and the player spawn.
    pub min_distance_from_spawn: f32,
    /// Minimum distance between an enemy spawn and the exit.
    pub min_distance_from_exit: f32,
    /// Minimum distance between two accepted enemy spawns.
    pub min_spawn_spacing: f32,
    /// Obstacle-free radius around the spawn and exit points.
    pub obstacle_clearance: f32,
}

impl Default for SpacingTuning {
    fn default() -> Self {
        Self {
            edge_margin: 220.0,
            min_distance_from_spawn: 700.0,
            min_distance_from_exit: 450.0,
            min_spawn_spacing: 240.0,
            obstacle_clearance: 260.0,
        }
    }
}

/// View-based streaming thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingTuning {
    /// Margin added around the view when activating descriptors.
    pub spawn_margin: f32,
    /// Margin added around the view when despawning entities.
    pub despawn_margin: f32,
    /// Player distance that always activates a descriptor.
    pub activation_radius: f32,
    /// Player distance inside which an entity is never despawned.
    pub despawn_radius: f32,
    /// Factor applied to the spawn margin for boss descriptors.
    pub boss_margin_factor: f32,
    /// Distance from home at which a returning entity may despawn.
    pub home_despawn_threshold: f32,
    /// Player distance to the exit that completes a zone.
    pub exit_radius: f32,
}

impl Default for StreamingTuning {
    fn default() -> Self {
        Self {
            spawn_margin: 320.0,
            despawn_margin: 720.0,
            activation_radius: 1_400.0,
            despawn_radius: 2_200.0,
            boss_margin_factor: 1.25,
            home_despawn_threshold: 48.0,
            exit_radius: 140.0,
        }
    }
}

/// Enemy behavior tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorTuning {
    /// Scales every engagement range.
    pub aggro_range_multiplier: f32,
    /// Scales every standard fire interval.
    pub fire_interval_multiplier: f32,
    /// Support heal rate in hit points per second.
    pub heal_rate: f32,
    /// Maximum healing one support entity applies per tick.
    pub heal_cap_per_tick: f32,
    /// Maximum healing one target receives per tick from all support entities.
    pub shared_heal_cap_per_tick: f32,
    /// Radius searched for heal targets.
    pub support_search_radius: f32,
    /// Maximum tether length for healing.
    pub support_tether_range: f32,
    /// Orbit radius around the heal target.
    pub support_orbit_radius: f32,
    /// Telegraph windup duration in seconds.
    pub telegraph_windup: f32,
    /// Maximum aim turn rate during windup, radians per second.
    pub telegraph_turn_rate: f32,
}

impl Default for BehaviorTuning {
    fn default() -> Self {
        Self {
            aggro_range_multiplier: 1.0,
            fire_interval_multiplier: 1.0,
            heal_rate: 18.0,
            heal_cap_per_tick: 1.5,
            shared_heal_cap_per_tick: 2.0,
            support_search_radius: 900.0,
            support_tether_range: 280.0,
            support_orbit_radius: 130.0,
            telegraph_windup: 0.9,
            telegraph_turn_rate: 1.4,
        }
    }
}

/// Theme and boss rotation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationTuning {
    /// Consecutive depths sharing a theme.
    pub theme_block_size: u32,
    /// Forbid a theme from following itself.
    pub no_repeat_theme: bool,
    /// Every `boss_interval`-th depth is a boss arena; zero disables bosses.
    pub boss_interval: u32,
    /// Bosses eligible for arenas.
    pub boss_pool: Vec<EnemyKind>,
    /// Forbid a boss from following itself.
    pub no_repeat_boss: bool,
    /// Deepest loadable zone. Rotation replays every earlier block, so
    /// deeper requests are rejected.
    pub max_depth: u32,
}

impl Default for RotationTuning {
    fn default() -> Self {
        Self {
            theme_block_size: 3,
            no_repeat_theme: true,
            boss_interval: 5,
            boss_pool: EnemyKind::BOSSES.to_vec(),
            no_repeat_boss: true,
            max_depth: 10_000,
        }
    }
}

/// Modifier sampling.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModifierTuning {
    /// Depths per additional modifier slot.
    pub depth_step: u32,
    /// Maximum simultaneous modifiers.
    pub max_active: u32,
    /// Probability each unlocked slot rolls a modifier.
    pub roll_chance: f32,
}

impl Default for ModifierTuning {
    fn default() -> Self {
        Self {
            depth_step: 3,
            max_active: 2,
            roll_chance: 0.55,
        }
    }
}

/// Caps enforced on live collections by the invariant guard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityCaps {
    /// Player projectiles.
    pub bullets: usize,
    /// Enemy projectiles.
    pub enemy_bullets: usize,
    /// Live enemies.
    pub enemies: usize,
    /// Pickups.
    pub pickups: usize,
    /// Particles.
    pub particles: usize,
}

impl EntityCaps {
    /// Cap for `collection`.
    #[must_use]
    pub const fn cap(&self, collection: TrackedCollection) -> usize {
        match collection {
            TrackedCollection::Bullets => self.bullets,
            TrackedCollection::EnemyBullets => self.enemy_bullets,
            TrackedCollection::Enemies => self.enemies,
            TrackedCollection::Pickups => self.pickups,
            TrackedCollection::Particles => self.particles,
        }
    }
}

impl Default for EntityCaps {
    fn default() -> Self {
        Self {
            bullets: 2_000,
            enemy_bullets: 1_500,
            enemies: 160,
            pickups: 400,
            particles: 3_000,
        }
    }
}

/// Global tuning object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Density multipliers.
    pub density: DensityTuning,
    /// Hard caps.
    pub caps: CapTuning,
    /// Depth ramps.
    pub ramps: RampTuning,
    /// Placement distances.
    pub spacing: SpacingTuning,
    /// Streaming thresholds.
    pub streaming: StreamingTuning,
    /// Behavior tuning.
    pub behavior: BehaviorTuning,
    /// Theme and boss rotation.
    pub rotation: RotationTuning,
    /// Modifier sampling.
    pub modifiers: ModifierTuning,
    /// Global map-scale factor applied to zone dimensions.
    pub map_scale: f32,
    /// Invariant guard caps.
    pub entity_caps: EntityCaps,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            density: DensityTuning::default(),
            caps: CapTuning::default(),
            ramps: RampTuning::default(),
            spacing: SpacingTuning::default(),
            streaming: StreamingTuning::default(),
            behavior: BehaviorTuning::default(),
            rotation: RotationTuning::default(),
            modifiers: ModifierTuning::default(),
            map_scale: 1.0,
            entity_caps: EntityCaps::default(),
        }
    }
}

/// Member of an exact pack composition.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PackMember {
    /// Archetype of the member.
    pub kind: EnemyKind,
    /// Minimum copies.
    pub min: u32,
    /// Maximum copies.
    pub max: u32,
}

/// How a template decides member types.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PackComposition {
    /// Explicit member types with per-member multiplicity ranges.
    Exact {
        /// Members in formation order.
        members: Vec<PackMember>,
    },
    /// Free type pool; an empty pool draws from the zone's enemy pool.
    Pool {
        /// Archetypes to draw from.
        kinds: Vec<EnemyKind>,
    },
}

/// Weighted pack composition rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PackTemplate {
    /// Template name carried by pack members.
    pub name: String,
    /// Relative selection weight.
    pub weight: f32,
    /// Member composition.
    pub composition: PackComposition,
}

/// Pack director parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackTuning {
    /// Weighted templates.
    pub templates: Vec<PackTemplate>,
    /// Probability that an eligible anchor forms a pack.
    pub formation_chance: f32,
    /// Smallest pool-composed pack.
    pub size_min: u32,
    /// Largest pool-composed pack.
    pub size_max: u32,
    /// Maximum packs per zone.
    pub max_packs_per_zone: u32,
    /// Maximum member distance from the anchor.
    pub member_spacing: f32,
    /// Minimum anchor distance from the player spawn.
    pub min_distance_from_spawn: f32,
    /// Minimum anchor distance from the exit.
    pub min_distance_from_exit: f32,
}

impl Default for PackTuning {
    fn default() -> Self {
        let exact = |members: &[(EnemyKind, u32, u32)]| PackComposition::Exact {
            members: members
                .iter()
                .map(|&(kind, min, max)| PackMember { kind, min, max })
                .collect(),
        };
        Self {
            templates: vec![
                PackTemplate {
                    name: String::from("escort"),
                    weight: 3.0,
                    composition: exact(&[(EnemyKind::Mender, 1, 1), (EnemyKind::Skirmisher, 2, 3)]),
                },
                PackTemplate {
                    name: String::from("gunline"),
                    weight: 2.0,
                    composition: exact(&[(EnemyKind::Gunship, 2, 3)]),
                },
                PackTemplate {
                    name: String::from("lancer_screen"),
                    weight: 2.0,
                    composition: exact(&[(EnemyKind::Lancer, 1, 1), (EnemyKind::Drone, 2, 2)]),
                },
                PackTemplate {
                    name: String::from("swarm"),
                    weight: 2.5,
                    composition: PackComposition::Pool {
                        kinds: vec![EnemyKind::Swarmer, EnemyKind::Drone],
                    },
                },
                PackTemplate {
                    name: String::from("mixed"),
                    weight: 1.5,
                    composition: PackComposition::Pool { kinds: Vec::new() },
                },
            ],
            formation_chance: 0.35,
            size_min: 2,
            size_max: 4,
            max_packs_per_zone: 6,
            member_spacing: 140.0,
            min_distance_from_spawn: 900.0,
            min_distance_from_exit: 600.0,
        }
    }
}

/// Everything the world needs to generate and stream zones.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Biome table.
    pub biomes: BiomeTable,
    /// Global tuning.
    pub tuning: Tuning,
    /// Pack director parameters.
    pub packs: PackTuning,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_ramp_saturates_at_ceiling() {
        let ramp = DepthRamp::new(0.1, 0.5);
        assert!((ramp.factor(0) - 1.0).abs() < f32::EPSILON);
        assert!((ramp.factor(3) - 1.3).abs() < 1e-5);
        assert!((ramp.factor(400) - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn default_table_contains_void() {
        let table = BiomeTable::default();
        assert!(table.get(&BiomeId::new("void")).is_some());
        assert_eq!(table.len(), 4);
        let ids = table.ids();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn entity_caps_cover_every_collection() {
        let caps = EntityCaps::default();
        for collection in TrackedCollection::ALL {
            assert!(caps.cap(collection) > 0);
        }
    }
}
