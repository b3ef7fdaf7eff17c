//! Generated zone content and the descriptors the lifecycle manager streams.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{BiomeId, EnemyId, EnemyKind, SpawnId};

/// Edge of a rectangular zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    /// Edge along decreasing y.
    North,
    /// Edge along increasing x. Zones flow toward it, so spawns never use it.
    East,
    /// Edge along increasing y.
    South,
    /// Edge along decreasing x.
    West,
}

impl Edge {
    /// Edges eligible to host the player spawn.
    pub const SPAWN_EDGES: [Edge; 3] = [Edge::West, Edge::North, Edge::South];

    /// Returns the geometrically opposite edge.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }
}

/// Threat tier of a spawn descriptor and the entity it produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rank {
    /// Regular enemy.
    Normal,
    /// Tougher enemy with wider engagement ranges.
    Elite,
    /// Zone boss.
    Boss,
}

/// Patrol path family followed while an enemy is idle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatrolShape {
    /// Circular orbit around home.
    Orbit,
    /// Back-and-forth sweep through home.
    Line,
    /// Bounded random walk that retargets on a timer.
    Wander,
    /// Near-stationary bobbing.
    Hover,
}

impl PatrolShape {
    /// All shapes in generation order.
    pub const ALL: [PatrolShape; 4] = [Self::Orbit, Self::Line, Self::Wander, Self::Hover];
}

/// Patrol shape and extent assigned to a spawn descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatrolProfile {
    /// Path family.
    pub shape: PatrolShape,
    /// Radius of the path around home, in world units.
    pub radius: f32,
}

/// Identifier of a pack within a zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackId(u16);

impl PackId {
    /// Creates a pack identifier.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Numeric value of the identifier.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

/// Marks a spawn descriptor as a member of a pack.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackTag {
    /// Pack the descriptor belongs to.
    pub pack: PackId,
    /// Name of the template that formed the pack.
    pub template: String,
    /// Whether the descriptor sits at the pack anchor.
    pub leader: bool,
}

/// Runtime link between a descriptor and its live entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnState {
    /// A live entity currently exists for the descriptor.
    pub active: bool,
    /// The descriptor was consumed by a combat death and never reactivates.
    pub killed: bool,
    /// Live entity while `active` is set.
    pub entity: Option<EnemyId>,
}

/// Inert record describing where and what an enemy could be.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnDescriptor {
    /// Identifier unique within the zone.
    pub id: SpawnId,
    /// Home position in world units.
    pub position: Vec2,
    /// Enemy archetype spawned here.
    pub kind: EnemyKind,
    /// Threat tier.
    pub rank: Rank,
    /// Idle patrol profile.
    pub patrol: PatrolProfile,
    /// Pack membership assigned by the pack director.
    pub pack: Option<PackTag>,
    /// Activation bookkeeping.
    pub state: SpawnState,
}

impl SpawnDescriptor {
    /// Reports whether the descriptor may produce a new live entity.
    #[must_use]
    pub const fn can_activate(&self) -> bool {
        !self.state.active && !self.state.killed
    }
}

/// Collidable obstacle families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleKind {
    /// Destructible rock.
    Asteroid,
    /// Destructible wreckage.
    Debris,
    /// Proximity mine that detonates on contact.
    Mine,
    /// Indestructible boss-arena cover.
    Cover,
}

impl ObstacleKind {
    /// Hit points of a freshly generated obstacle, `None` when indestructible.
    #[must_use]
    pub const fn initial_hp(self) -> Option<f32> {
        match self {
            Self::Asteroid => Some(60.0),
            Self::Debris => Some(30.0),
            Self::Mine => Some(10.0),
            Self::Cover => None,
        }
    }

    /// Damage dealt to the player per second of overlap.
    #[must_use]
    pub const fn contact_damage_per_second(self) -> f32 {
        match self {
            Self::Asteroid => 12.0,
            Self::Debris => 6.0,
            Self::Mine | Self::Cover => 0.0,
        }
    }

    /// Radius range used by the generator.
    #[must_use]
    pub const fn radius_range(self) -> (f32, f32) {
        match self {
            Self::Asteroid => (28.0, 70.0),
            Self::Debris => (16.0, 36.0),
            Self::Mine => (12.0, 14.0),
            Self::Cover => (60.0, 80.0),
        }
    }
}

/// Collidable obstacle placed in a zone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Centre in world units.
    pub position: Vec2,
    /// Collision radius.
    pub radius: f32,
    /// Obstacle family.
    pub kind: ObstacleKind,
    /// Remaining hit points, `None` when indestructible.
    pub hp: Option<f32>,
}

/// Non-colliding decoration families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecorationKind {
    /// Drifting hull fragment.
    Wreck,
    /// Dormant satellite.
    Satellite,
    /// Gas wisp.
    Wisp,
    /// Navigation beacon.
    Beacon,
    /// Frozen shard.
    IceShard,
}

/// Non-colliding decoration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Decoration {
    /// Centre in world units.
    pub position: Vec2,
    /// Decoration family.
    pub kind: DecorationKind,
    /// Uniform draw scale.
    pub scale: f32,
    /// Rotation in radians.
    pub rotation: f32,
}

/// Where a portal leads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortalDestination {
    /// Advance to the next depth.
    NextZone,
    /// Leave the run for the hub.
    Hub,
    /// Load the next depth in the named theme.
    Theme(BiomeId),
}

/// Interactable portal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Portal {
    /// Centre in world units.
    pub position: Vec2,
    /// Interaction radius.
    pub radius: f32,
    /// Destination taken on interaction.
    pub destination: PortalDestination,
}

/// Backdrop parameters for the renderer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Background {
    /// Base fill colour.
    pub base_color: [u8; 3],
    /// Nebula hue in degrees.
    pub nebula_hue: f32,
    /// Nebula opacity in `[0, 1]`.
    pub nebula_intensity: f32,
}

/// Parallax star layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParallaxLayer {
    /// Scroll factor relative to the camera; smaller is farther away.
    pub depth_factor: f32,
    /// Stars drawn on the layer.
    pub star_count: u32,
    /// Slow ambient drift in units per second.
    pub drift: Vec2,
    /// Seed the renderer uses to scatter stars.
    pub scatter_seed: u32,
}

/// Modifier altering a zone's generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneModifier {
    /// More regular enemies.
    Swarming,
    /// More elites.
    EliteSurge,
    /// More obstacles.
    Minefield,
    /// Smaller zone.
    Cramped,
    /// Larger zone.
    Vast,
    /// Fewer decorations.
    Barren,
}

impl ZoneModifier {
    /// Every modifier in sampling order.
    pub const ALL: [ZoneModifier; 6] = [
        Self::Swarming,
        Self::EliteSurge,
        Self::Minefield,
        Self::Cramped,
        Self::Vast,
        Self::Barren,
    ];

    /// Multipliers this modifier contributes.
    #[must_use]
    pub const fn effect(self) -> ModifierEffect {
        let neutral = ModifierEffect::NEUTRAL;
        match self {
            Self::Swarming => ModifierEffect {
                enemy: 1.6,
                ..neutral
            },
            Self::EliteSurge => ModifierEffect {
                elite: 2.0,
                enemy: 0.85,
                ..neutral
            },
            Self::Minefield => ModifierEffect {
                obstacle: 1.8,
                ..neutral
            },
            Self::Cramped => ModifierEffect {
                dimension: 0.75,
                ..neutral
            },
            Self::Vast => ModifierEffect {
                dimension: 1.3,
                decoration: 1.2,
                ..neutral
            },
            Self::Barren => ModifierEffect {
                decoration: 0.3,
                obstacle: 0.6,
                ..neutral
            },
        }
    }

    /// Reports whether two modifiers may not be active together.
    #[must_use]
    pub const fn conflicts_with(self, other: ZoneModifier) -> bool {
        matches!(
            (self, other),
            (Self::Cramped, Self::Vast) | (Self::Vast, Self::Cramped)
        )
    }
}

/// Multipliers applied by modifiers to generation terms.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModifierEffect {
    /// Enemy density multiplier.
    pub enemy: f32,
    /// Elite density multiplier.
    pub elite: f32,
    /// Obstacle density multiplier.
    pub obstacle: f32,
    /// Decoration density multiplier.
    pub decoration: f32,
    /// Width and height multiplier.
    pub dimension: f32,
}

impl ModifierEffect {
    /// Effect that changes nothing.
    pub const NEUTRAL: ModifierEffect = ModifierEffect {
        enemy: 1.0,
        elite: 1.0,
        obstacle: 1.0,
        decoration: 1.0,
        dimension: 1.0,
    };

    /// Composes the effects of all `modifiers` multiplicatively.
    #[must_use]
    pub fn combined(modifiers: &[ZoneModifier]) -> Self {
        modifiers
            .iter()
            .map(|modifier| modifier.effect())
            .fold(Self::NEUTRAL, |acc, effect| Self {
                enemy: acc.enemy * effect.enemy,
                elite: acc.elite * effect.elite,
                obstacle: acc.obstacle * effect.obstacle,
                decoration: acc.decoration * effect.decoration,
                dimension: acc.dimension * effect.dimension,
            })
    }
}

/// One generated playable area.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Seed the zone was generated from.
    pub seed: u32,
    /// Depth (zone index) the zone was generated for.
    pub depth: u32,
    /// Biome the zone belongs to.
    pub biome: BiomeId,
    /// Width in world units.
    pub width: f32,
    /// Height in world units.
    pub height: f32,
    /// Modifiers active during generation.
    pub modifiers: Vec<ZoneModifier>,
    /// Player entry point.
    pub spawn_point: Vec2,
    /// Edge hosting the entry point.
    pub spawn_edge: Edge,
    /// Exit point; boss arenas have none.
    pub exit_point: Option<Vec2>,
    /// Regular enemy descriptors, including pack members.
    pub enemy_spawns: Vec<SpawnDescriptor>,
    /// Elite descriptors.
    pub elite_spawns: Vec<SpawnDescriptor>,
    /// Boss descriptor for boss arenas.
    pub boss_spawn: Option<SpawnDescriptor>,
    /// Collidable obstacles.
    pub obstacles: Vec<Obstacle>,
    /// Non-colliding decorations.
    pub decorations: Vec<Decoration>,
    /// Interactable portals.
    pub portals: Vec<Portal>,
    /// Backdrop parameters.
    pub background: Background,
    /// Parallax star layers, farthest first.
    pub parallax: Vec<ParallaxLayer>,
}

impl Zone {
    /// Centre of the zone.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    /// Reports whether this zone is a boss arena.
    #[must_use]
    pub fn is_boss_zone(&self) -> bool {
        self.boss_spawn.is_some()
    }

    /// Clamps `point` so a circle of `radius` stays inside the zone.
    #[must_use]
    pub fn clamp(&self, point: Vec2, radius: f32) -> Vec2 {
        let min = Vec2::splat(radius.min(self.width * 0.5).max(0.0));
        let max = Vec2::new(self.width, self.height) - min;
        point.clamp(min, max.max(min))
    }

    /// Iterates every spawn descriptor: regular, elite, then boss.
    pub fn spawns(&self) -> impl Iterator<Item = &SpawnDescriptor> {
        self.enemy_spawns
            .iter()
            .chain(self.elite_spawns.iter())
            .chain(self.boss_spawn.iter())
    }

    /// Mutable counterpart of [`Zone::spawns`].
    pub fn spawns_mut(&mut self) -> impl Iterator<Item = &mut SpawnDescriptor> {
        self.enemy_spawns
            .iter_mut()
            .chain(self.elite_spawns.iter_mut())
            .chain(self.boss_spawn.iter_mut())
    }

    /// Looks up a descriptor by identifier.
    #[must_use]
    pub fn spawn(&self, id: SpawnId) -> Option<&SpawnDescriptor> {
        self.spawns().find(|descriptor| descriptor.id == id)
    }

    /// Looks up a descriptor by identifier for mutation.
    pub fn spawn_mut(&mut self, id: SpawnId) -> Option<&mut SpawnDescriptor> {
        self.spawns_mut().find(|descriptor| descriptor.id == id)
    }
}
