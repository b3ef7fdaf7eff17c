#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic zone generation system.
//!
//! A zone is a pure function of its biome configuration, seed, depth and
//! active modifiers. Every random decision flows through a single
//! [`SeededRandom`] seeded with the zone seed, in a fixed order: dimensions,
//! spawn and exit, enemy spawns, packs, elites, obstacles, decorations and
//! finally the backdrop. Reordering any step changes every zone of every run.

use std::f32::consts::TAU;

use deepfield_core::{
    glam::Vec2, Background, BiomeConfig, BiomeId, Decoration, Edge, EnemyKind, ModifierEffect,
    Obstacle, ObstacleKind, PackTuning, ParallaxLayer, PatrolProfile, PatrolShape, Rank,
    SeededRandom, SpawnDescriptor, SpawnId, SpawnState, Tuning, Zone, ZoneModifier,
};
use sha2::{Digest, Sha256};

pub mod pack;

pub use pack::{PackContext, PackDirector};

/// Asteroids synthesised near the spawn when obstacle placement finds nothing.
pub const FALLBACK_CLUSTER_SIZE: usize = 3;
/// Indestructible cover pieces ringing a boss arena.
pub const BOSS_COVER_COUNT: usize = 6;

const ATTEMPTS_PER_TARGET: usize = 3;
const SPAWN_INSET: f32 = 120.0;
const OBSTACLE_GAP: f32 = 8.0;
const FALLBACK_SPREAD: f32 = 120.0;
const FALLBACK_DISTANCE: f32 = 240.0;
const PARALLAX_DEPTHS: [f32; 3] = [0.15, 0.35, 0.6];
const BOSS_SPAWN_INSET: f32 = 300.0;
const BOSS_OFFSET: Vec2 = Vec2::new(1_100.0, 0.0);
const BOSS_PATROL_RADIUS: f32 = 40.0;
const ELITE_PATROL_SCALE: f32 = 1.2;

/// Per-call inputs that vary between zones of the same biome.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationOptions {
    /// Theme the zone belongs to.
    pub theme: BiomeId,
    /// Depth (zone index) being generated.
    pub depth: u32,
    /// Modifiers active for the zone.
    pub modifiers: Vec<ZoneModifier>,
}

/// Pure system that turns a biome configuration and a seed into a [`Zone`].
#[derive(Clone, Debug, Default)]
pub struct ZoneGenerator {
    tuning: Tuning,
    packs: PackTuning,
}

impl ZoneGenerator {
    /// Creates a generator bound to the provided tuning tables.
    #[must_use]
    pub fn new(tuning: Tuning, packs: PackTuning) -> Self {
        Self { tuning, packs }
    }

    /// Tuning the generator was built with.
    #[must_use]
    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Generates a regular zone.
    #[must_use]
    pub fn generate(&self, biome: &BiomeConfig, seed: u32, options: &GenerationOptions) -> Zone {
        let mut rng = SeededRandom::new(seed);
        let effect = ModifierEffect::combined(&options.modifiers);
        let (width, height) = self.dimensions(biome, options.depth, &effect, &mut rng);

        let margin = self.tuning.spacing.edge_margin;
        let spawn_edge = *rng.pick(&Edge::SPAWN_EDGES).unwrap_or(&Edge::West);
        let spawn_point = edge_point(spawn_edge, width, height, margin, &mut rng);
        let exit_point = edge_point(spawn_edge.opposite(), width, height, margin, &mut rng);
        let layout = Layout {
            width,
            height,
            spawn_point,
            exit_point: Some(exit_point),
        };

        let depth = options.depth;
        let caps = &self.tuning.caps;
        let ramps = &self.tuning.ramps;

        let enemy_target = density_count(
            width,
            height,
            biome.enemy_density
                * self.tuning.density.enemy_multiplier
                * ramps.enemy.factor(depth)
                * effect.enemy,
            caps.max_enemy_spawns_per_zone,
        );
        let enemy_positions = self.sample_spawn_points(&layout, enemy_target, &[], &mut rng);
        let enemy_spawns: Vec<SpawnDescriptor> = enemy_positions
            .into_iter()
            .map(|position| {
                let kind = rng
                    .pick(&biome.enemy_pool)
                    .copied()
                    .unwrap_or(EnemyKind::Drone);
                descriptor(position, kind, Rank::Normal, roll_patrol(Rank::Normal, &mut rng))
            })
            .collect();

        let context = PackContext {
            enemy_pool: &biome.enemy_pool,
            spawn_point,
            exit_point: Some(exit_point),
            width,
            height,
        };
        let mut enemy_spawns =
            PackDirector::new(&self.packs).direct(enemy_spawns, &context, &mut rng);

        let elite_target = density_count(
            width,
            height,
            biome.elite_density
                * self.tuning.density.elite_multiplier
                * ramps.elite.factor(depth)
                * effect.elite,
            caps.max_elite_spawns_per_zone,
        );
        let occupied: Vec<Vec2> = enemy_spawns.iter().map(|spawn| spawn.position).collect();
        let elite_positions = self.sample_spawn_points(&layout, elite_target, &occupied, &mut rng);
        let mut elite_spawns: Vec<SpawnDescriptor> = elite_positions
            .into_iter()
            .map(|position| {
                let kind = rng
                    .pick(&biome.elite_pool)
                    .copied()
                    .unwrap_or(EnemyKind::Marauder);
                descriptor(position, kind, Rank::Elite, roll_patrol(Rank::Elite, &mut rng))
            })
            .collect();

        renumber(enemy_spawns.iter_mut().chain(elite_spawns.iter_mut()));

        let obstacle_target = density_count(
            width,
            height,
            biome.obstacle_density * ramps.obstacle.factor(depth) * effect.obstacle,
            caps.max_obstacles_per_zone,
        );
        let mut obstacles = self.place_obstacles(biome, &layout, obstacle_target, &mut rng);
        if obstacles.is_empty() {
            obstacles = fallback_cluster(
                &layout,
                spawn_edge,
                self.fallback_size(),
                self.tuning.spacing.obstacle_clearance,
                &mut rng,
            );
        }

        let decoration_target = density_count(
            width,
            height,
            biome.decoration_density * effect.decoration,
            caps.max_decorations_per_zone,
        );
        let decorations = place_decorations(biome, width, height, decoration_target, &mut rng);

        let background = roll_background(biome, &mut rng);
        let parallax = self.roll_parallax(biome, width, height, &mut rng);

        tracing::debug!(
            seed,
            depth,
            enemies = enemy_spawns.len(),
            elites = elite_spawns.len(),
            obstacles = obstacles.len(),
            "generated zone"
        );

        Zone {
            seed,
            depth,
            biome: options.theme.clone(),
            width,
            height,
            modifiers: options.modifiers.clone(),
            spawn_point,
            spawn_edge,
            exit_point: Some(exit_point),
            enemy_spawns,
            elite_spawns,
            boss_spawn: None,
            obstacles,
            decorations,
            portals: Vec::new(),
            background,
            parallax,
        }
    }

    /// Generates a boss arena guarded by `boss`.
    ///
    /// Arenas have fixed dimensions, no exit and no regular enemies. The
    /// victory portal is added by the world once the boss dies.
    #[must_use]
    pub fn generate_boss(
        &self,
        biome: &BiomeConfig,
        theme: &BiomeId,
        seed: u32,
        boss: EnemyKind,
        depth: u32,
    ) -> Zone {
        let mut rng = SeededRandom::new(seed);
        let arena = biome.boss_arena;
        let width = arena.width.max(BOSS_SPAWN_INSET * 2.0 + BOSS_OFFSET.x);
        let height = arena.height.max(BOSS_SPAWN_INSET * 2.0);
        let bounds = Bounds { width, height };

        let spawn_point = Vec2::new(BOSS_SPAWN_INSET, height * 0.5);
        let boss_position = bounds.clamp(spawn_point + BOSS_OFFSET, boss.profile().radius);
        let boss_spawn = SpawnDescriptor {
            id: SpawnId::new(0),
            position: boss_position,
            kind: boss,
            rank: Rank::Boss,
            patrol: PatrolProfile {
                shape: PatrolShape::Hover,
                radius: BOSS_PATROL_RADIUS,
            },
            pack: None,
            state: SpawnState::default(),
        };

        let center = Vec2::new(width * 0.5, height * 0.5);
        let phase = rng.range(0.0, TAU);
        let (min_radius, max_radius) = ObstacleKind::Cover.radius_range();
        let obstacles = (0..BOSS_COVER_COUNT)
            .map(|slot| {
                let angle = phase + slot as f32 * TAU / BOSS_COVER_COUNT as f32;
                let radius = rng.range(min_radius, max_radius);
                Obstacle {
                    position: bounds.clamp(
                        center + Vec2::from_angle(angle) * arena.cover_ring_radius,
                        radius,
                    ),
                    radius,
                    kind: ObstacleKind::Cover,
                    hp: ObstacleKind::Cover.initial_hp(),
                }
            })
            .collect();

        let background = roll_background(biome, &mut rng);
        let parallax = self.roll_parallax(biome, width, height, &mut rng);

        tracing::debug!(seed, depth, ?boss, "generated boss arena");

        Zone {
            seed,
            depth,
            biome: theme.clone(),
            width,
            height,
            modifiers: Vec::new(),
            spawn_point,
            spawn_edge: Edge::West,
            exit_point: None,
            enemy_spawns: Vec::new(),
            elite_spawns: Vec::new(),
            boss_spawn: Some(boss_spawn),
            obstacles,
            decorations: Vec::new(),
            portals: Vec::new(),
            background,
            parallax,
        }
    }

    fn dimensions(
        &self,
        biome: &BiomeConfig,
        depth: u32,
        effect: &ModifierEffect,
        rng: &mut SeededRandom,
    ) -> (f32, f32) {
        let caps = &self.tuning.caps;
        let scale =
            self.tuning.ramps.dimension.factor(depth) * effect.dimension * self.tuning.map_scale;
        let width = rng.range(biome.width.min, biome.width.max) * scale;
        let height = rng.range(biome.height.min, biome.height.max) * scale;
        let floor = caps.min_zone_extent;
        (
            sanitize_extent(width, floor, caps.max_zone_width),
            sanitize_extent(height, floor, caps.max_zone_height),
        )
    }

    fn sample_spawn_points(
        &self,
        layout: &Layout,
        target: usize,
        existing: &[Vec2],
        rng: &mut SeededRandom,
    ) -> Vec<Vec2> {
        let spacing = &self.tuning.spacing;
        let mut accepted: Vec<Vec2> = Vec::with_capacity(target);
        for _ in 0..target.saturating_mul(ATTEMPTS_PER_TARGET) {
            if accepted.len() >= target {
                break;
            }
            let candidate = layout.random_point(SPAWN_INSET, rng);
            if candidate.distance(layout.spawn_point) < spacing.min_distance_from_spawn {
                continue;
            }
            if layout
                .exit_point
                .is_some_and(|exit| candidate.distance(exit) < spacing.min_distance_from_exit)
            {
                continue;
            }
            let crowded = existing
                .iter()
                .chain(accepted.iter())
                .any(|other| candidate.distance(*other) < spacing.min_spawn_spacing);
            if crowded {
                continue;
            }
            accepted.push(candidate);
        }
        accepted
    }

    fn place_obstacles(
        &self,
        biome: &BiomeConfig,
        layout: &Layout,
        target: usize,
        rng: &mut SeededRandom,
    ) -> Vec<Obstacle> {
        let weights = biome.obstacle_weights;
        let families = [ObstacleKind::Asteroid, ObstacleKind::Debris, ObstacleKind::Mine];
        let odds = [weights.asteroid, weights.debris, weights.mine];
        let clearance = self.tuning.spacing.obstacle_clearance;

        let mut placed: Vec<Obstacle> = Vec::with_capacity(target);
        for _ in 0..target.saturating_mul(ATTEMPTS_PER_TARGET) {
            if placed.len() >= target {
                break;
            }
            let kind = rng
                .weighted_index(&odds)
                .and_then(|index| families.get(index).copied())
                .unwrap_or(ObstacleKind::Asteroid);
            let (min_radius, max_radius) = kind.radius_range();
            let radius = rng.range(min_radius, max_radius);
            let position = layout.random_point(radius, rng);

            let blocks_entry = position.distance(layout.spawn_point) < clearance + radius;
            let blocks_exit = layout
                .exit_point
                .is_some_and(|exit| position.distance(exit) < clearance + radius);
            let overlaps = placed.iter().any(|other| {
                position.distance(other.position) < radius + other.radius + OBSTACLE_GAP
            });
            if blocks_entry || blocks_exit || overlaps {
                continue;
            }
            placed.push(Obstacle {
                position,
                radius,
                kind,
                hp: kind.initial_hp(),
            });
        }
        placed
    }

    fn fallback_size(&self) -> usize {
        FALLBACK_CLUSTER_SIZE.min(self.tuning.caps.max_obstacles_per_zone)
    }

    fn roll_parallax(
        &self,
        biome: &BiomeConfig,
        width: f32,
        height: f32,
        rng: &mut SeededRandom,
    ) -> Vec<ParallaxLayer> {
        let cap = self.tuning.caps.max_stars_per_layer;
        PARALLAX_DEPTHS
            .iter()
            .map(|&depth_factor| {
                let raw = f64::from(width)
                    * f64::from(height)
                    * f64::from(biome.star_density)
                    * f64::from(depth_factor);
                let star_count = if raw.is_finite() && raw > 0.0 {
                    raw.floor().min(f64::from(cap)) as u32
                } else {
                    0
                };
                let drift = Vec2::new(rng.range(-4.0, 4.0), rng.range(-2.0, 2.0)) * depth_factor;
                ParallaxLayer {
                    depth_factor,
                    star_count,
                    drift,
                    scatter_seed: rng.next_u32(),
                }
            })
            .collect()
    }
}

/// SHA-256 digest over every generated field of `zone`.
///
/// Runtime bookkeeping (spawn activation state, obstacle damage, portals opened
/// after a boss dies) is excluded, so a zone fingerprints identically before
/// and after it has been played.
#[must_use]
pub fn fingerprint(zone: &Zone) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(zone.seed.to_le_bytes());
    hasher.update(zone.depth.to_le_bytes());
    hasher.update(zone.biome.as_str().as_bytes());
    hash_f32s(&mut hasher, &[zone.width, zone.height]);
    for modifier in &zone.modifiers {
        hasher.update([*modifier as u8]);
    }
    hash_vec2(&mut hasher, zone.spawn_point);
    hasher.update([zone.spawn_edge as u8]);
    if let Some(exit) = zone.exit_point {
        hash_vec2(&mut hasher, exit);
    }
    for spawn in zone.spawns() {
        hasher.update(spawn.id.get().to_le_bytes());
        hash_vec2(&mut hasher, spawn.position);
        hasher.update([spawn.kind as u8, spawn.rank as u8, spawn.patrol.shape as u8]);
        hash_f32s(&mut hasher, &[spawn.patrol.radius]);
        if let Some(tag) = &spawn.pack {
            hasher.update(tag.pack.get().to_le_bytes());
            hasher.update(tag.template.as_bytes());
            hasher.update([u8::from(tag.leader)]);
        }
    }
    for obstacle in &zone.obstacles {
        hash_vec2(&mut hasher, obstacle.position);
        hash_f32s(&mut hasher, &[obstacle.radius]);
        hasher.update([obstacle.kind as u8]);
    }
    for decoration in &zone.decorations {
        hash_vec2(&mut hasher, decoration.position);
        hash_f32s(&mut hasher, &[decoration.scale, decoration.rotation]);
        hasher.update([decoration.kind as u8]);
    }
    hasher.update(zone.background.base_color);
    hash_f32s(
        &mut hasher,
        &[zone.background.nebula_hue, zone.background.nebula_intensity],
    );
    for layer in &zone.parallax {
        hash_f32s(&mut hasher, &[layer.depth_factor]);
        hasher.update(layer.star_count.to_le_bytes());
        hash_vec2(&mut hasher, layer.drift);
        hasher.update(layer.scatter_seed.to_le_bytes());
    }
    hasher.finalize().into()
}

/// Lowercase hexadecimal form of [`fingerprint`].
#[must_use]
pub fn fingerprint_hex(zone: &Zone) -> String {
    fingerprint(zone)
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

fn hash_f32s(hasher: &mut Sha256, values: &[f32]) {
    for value in values {
        hasher.update(value.to_le_bytes());
    }
}

fn hash_vec2(hasher: &mut Sha256, value: Vec2) {
    hash_f32s(hasher, &[value.x, value.y]);
}

#[derive(Clone, Copy, Debug)]
struct Bounds {
    width: f32,
    height: f32,
}

impl Bounds {
    fn clamp(self, point: Vec2, radius: f32) -> Vec2 {
        clamp_to(point, radius, self.width, self.height)
    }
}

#[derive(Clone, Copy, Debug)]
struct Layout {
    width: f32,
    height: f32,
    spawn_point: Vec2,
    exit_point: Option<Vec2>,
}

impl Layout {
    fn random_point(&self, inset: f32, rng: &mut SeededRandom) -> Vec2 {
        let inset_x = inset.min(self.width * 0.5);
        let inset_y = inset.min(self.height * 0.5);
        Vec2::new(
            rng.range(inset_x, self.width - inset_x),
            rng.range(inset_y, self.height - inset_y),
        )
    }
}

pub(crate) fn clamp_to(point: Vec2, radius: f32, width: f32, height: f32) -> Vec2 {
    let min = Vec2::new(radius.min(width * 0.5), radius.min(height * 0.5)).max(Vec2::ZERO);
    let max = (Vec2::new(width, height) - min).max(min);
    point.clamp(min, max)
}

fn sanitize_extent(value: f32, floor: f32, ceiling: f32) -> f32 {
    let ceiling = ceiling.max(floor);
    if value.is_finite() {
        value.clamp(floor, ceiling)
    } else {
        floor
    }
}

/// `min(floor(w * h * density), cap)`, zero for non-positive or non-finite input.
fn density_count(width: f32, height: f32, density: f32, cap: usize) -> usize {
    let raw = (f64::from(width) * f64::from(height) * f64::from(density)).floor();
    if !raw.is_finite() || raw <= 0.0 {
        return 0;
    }
    if raw >= cap as f64 {
        cap
    } else {
        raw as usize
    }
}

fn edge_point(edge: Edge, width: f32, height: f32, margin: f32, rng: &mut SeededRandom) -> Vec2 {
    let margin_x = margin.min(width * 0.5);
    let margin_y = margin.min(height * 0.5);
    match edge {
        Edge::West => Vec2::new(margin_x, rng.range(margin_y, height - margin_y)),
        Edge::East => Vec2::new(width - margin_x, rng.range(margin_y, height - margin_y)),
        Edge::North => Vec2::new(rng.range(margin_x, width - margin_x), margin_y),
        Edge::South => Vec2::new(rng.range(margin_x, width - margin_x), height - margin_y),
    }
}

fn inward(edge: Edge) -> Vec2 {
    match edge {
        Edge::West => Vec2::X,
        Edge::East => Vec2::NEG_X,
        Edge::North => Vec2::Y,
        Edge::South => Vec2::NEG_Y,
    }
}

fn roll_patrol(rank: Rank, rng: &mut SeededRandom) -> PatrolProfile {
    let shape = *rng.pick(&PatrolShape::ALL).unwrap_or(&PatrolShape::Orbit);
    let (min, max) = match shape {
        PatrolShape::Orbit => (80.0, 180.0),
        PatrolShape::Line => (100.0, 220.0),
        PatrolShape::Wander => (120.0, 260.0),
        PatrolShape::Hover => (10.0, 24.0),
    };
    let scale = if rank == Rank::Elite {
        ELITE_PATROL_SCALE
    } else {
        1.0
    };
    PatrolProfile {
        shape,
        radius: rng.range(min, max) * scale,
    }
}

fn descriptor(position: Vec2, kind: EnemyKind, rank: Rank, patrol: PatrolProfile) -> SpawnDescriptor {
    SpawnDescriptor {
        id: SpawnId::new(0),
        position,
        kind,
        rank,
        patrol,
        pack: None,
        state: SpawnState::default(),
    }
}

fn renumber<'a>(descriptors: impl Iterator<Item = &'a mut SpawnDescriptor>) {
    for (index, descriptor) in descriptors.enumerate() {
        descriptor.id = SpawnId::new(u32::try_from(index).unwrap_or(u32::MAX));
    }
}

fn fallback_cluster(
    layout: &Layout,
    spawn_edge: Edge,
    size: usize,
    clearance: f32,
    rng: &mut SeededRandom,
) -> Vec<Obstacle> {
    let anchor = layout.spawn_point + inward(spawn_edge) * (clearance + FALLBACK_DISTANCE);
    let (min_radius, max_radius) = ObstacleKind::Asteroid.radius_range();
    (0..size)
        .map(|_| {
            let angle = rng.range(0.0, TAU);
            let distance = rng.range(0.0, FALLBACK_SPREAD);
            let radius = rng.range(min_radius, max_radius);
            Obstacle {
                position: clamp_to(
                    anchor + Vec2::from_angle(angle) * distance,
                    radius,
                    layout.width,
                    layout.height,
                ),
                radius,
                kind: ObstacleKind::Asteroid,
                hp: ObstacleKind::Asteroid.initial_hp(),
            }
        })
        .collect()
}

fn place_decorations(
    biome: &BiomeConfig,
    width: f32,
    height: f32,
    target: usize,
    rng: &mut SeededRandom,
) -> Vec<Decoration> {
    if biome.decoration_pool.is_empty() {
        return Vec::new();
    }
    let mut decorations = Vec::with_capacity(target);
    for _ in 0..target {
        let Some(kind) = rng.pick(&biome.decoration_pool).copied() else {
            break;
        };
        decorations.push(Decoration {
            position: Vec2::new(rng.range(0.0, width), rng.range(0.0, height)),
            kind,
            scale: rng.range(0.6, 1.6),
            rotation: rng.range(0.0, TAU),
        });
    }
    decorations
}

fn roll_background(biome: &BiomeConfig, rng: &mut SeededRandom) -> Background {
    Background {
        base_color: biome.base_color,
        nebula_hue: rng.range(0.0, 360.0),
        nebula_intensity: rng.range(0.15, 0.45),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepfield_core::{BiomeTable, ObstacleWeights};

    fn void() -> BiomeConfig {
        BiomeTable::default()
            .get(&BiomeId::new("void"))
            .cloned()
            .expect("void biome")
    }

    fn options(depth: u32) -> GenerationOptions {
        GenerationOptions {
            theme: BiomeId::new("void"),
            depth,
            modifiers: Vec::new(),
        }
    }

    #[test]
    fn density_count_floors_and_caps() {
        assert_eq!(density_count(1_000.0, 1_000.0, 2.5e-6, 10), 2);
        assert_eq!(density_count(1_000.0, 1_000.0, 1.0, 10), 10);
        assert_eq!(density_count(1_000.0, 1_000.0, -1.0, 10), 0);
        assert_eq!(density_count(1_000.0, 1_000.0, f32::NAN, 10), 0);
    }

    #[test]
    fn exit_sits_on_opposite_edge() {
        let generator = ZoneGenerator::default();
        let margin = generator.tuning().spacing.edge_margin;
        for seed in 0..40 {
            let zone = generator.generate(&void(), seed, &options(1));
            let exit = zone.exit_point.expect("regular zones have an exit");
            assert_ne!(zone.spawn_edge, Edge::East);
            match zone.spawn_edge {
                Edge::West => assert!((exit.x - (zone.width - margin)).abs() < 1e-3),
                Edge::North => assert!((exit.y - (zone.height - margin)).abs() < 1e-3),
                Edge::South => assert!((exit.y - margin).abs() < 1e-3),
                Edge::East => unreachable!(),
            }
        }
    }

    #[test]
    fn spawn_ids_are_sequential_across_ranks() {
        let zone = ZoneGenerator::default().generate(&void(), 17, &options(4));
        let ids: Vec<u32> = zone.spawns().map(|spawn| spawn.id.get()).collect();
        let expected: Vec<u32> = (0..ids.len() as u32).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn fallback_cluster_fills_empty_obstacle_fields() {
        let biome = BiomeConfig {
            obstacle_density: 0.0,
            obstacle_weights: ObstacleWeights::default(),
            ..void()
        };
        let zone = ZoneGenerator::default().generate(&biome, 3, &options(1));
        assert_eq!(zone.obstacles.len(), FALLBACK_CLUSTER_SIZE);
        assert!(zone
            .obstacles
            .iter()
            .all(|obstacle| obstacle.kind == ObstacleKind::Asteroid));
    }

    #[test]
    fn fallback_cluster_respects_obstacle_cap() {
        let mut tuning = Tuning::default();
        tuning.caps.max_obstacles_per_zone = 1;
        let biome = BiomeConfig {
            obstacle_density: 0.0,
            ..void()
        };
        let zone = ZoneGenerator::new(tuning, PackTuning::default()).generate(&biome, 3, &options(1));
        assert_eq!(zone.obstacles.len(), 1);
    }

    #[test]
    fn fingerprint_ignores_runtime_state() {
        let generator = ZoneGenerator::default();
        let zone = generator.generate(&void(), 99, &options(2));
        let mut played = zone.clone();
        for spawn in played.spawns_mut() {
            spawn.state.killed = true;
        }
        assert_eq!(fingerprint(&zone), fingerprint(&played));
        assert_eq!(fingerprint_hex(&zone).len(), 64);
    }
}
