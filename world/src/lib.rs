#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Deepfield.
//!
//! The [`World`] owns the loaded zone, the player, live enemies and every
//! transient body collection. It is mutated exclusively through [`apply`],
//! which executes one [`Command`] and reports the outcome as [`Event`]s.
//! Read access goes through the [`query`] module.

mod collections;
mod collision;
mod combat;
pub mod lifecycle;

use deepfield_core::{
    glam::Vec2, Command, Enemy, EnemyId, Event, PlayerState, TrackedCollection, ViewSize,
    WorldConfig, Zone,
};
use deepfield_system_enemy_behavior::EnemyBehavior;
use deepfield_system_zone_generation::ZoneGenerator;

use collections::Bodies;
pub use lifecycle::{Location, RunState, RunStats, ZoneStats};

const DEFAULT_VIEW: ViewSize = ViewSize::new(1_280.0, 720.0);

/// Represents the authoritative Deepfield world state.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    generator: ZoneGenerator,
    behavior: EnemyBehavior,
    run: Option<RunState>,
    zone: Option<Zone>,
    player: PlayerState,
    camera: Vec2,
    view: ViewSize,
    enemies: Vec<Enemy>,
    bodies: Bodies,
    next_enemy_id: u32,
    tick_index: u64,
    zone_time: f32,
}

impl World {
    /// Creates a world whose ambient enemy jitter is seeded from the operating system.
    #[must_use]
    pub fn new(config: WorldConfig) -> Self {
        Self::with_behavior(config, EnemyBehavior::from_entropy())
    }

    /// Creates a world with reproducible ambient enemy jitter.
    ///
    /// Generation is always reproducible from the run seed; this additionally
    /// pins per-frame behavior so whole simulations replay exactly.
    #[must_use]
    pub fn with_behavior_seed(config: WorldConfig, seed: u64) -> Self {
        Self::with_behavior(config, EnemyBehavior::with_seed(seed))
    }

    fn with_behavior(config: WorldConfig, behavior: EnemyBehavior) -> Self {
        let generator = ZoneGenerator::new(config.tuning.clone(), config.packs.clone());
        Self {
            config,
            generator,
            behavior,
            run: None,
            zone: None,
            player: PlayerState::default(),
            camera: Vec2::ZERO,
            view: DEFAULT_VIEW,
            enemies: Vec::new(),
            bodies: Bodies::default(),
            next_enemy_id: 0,
            tick_index: 0,
            zone_time: 0.0,
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::InitWorld { theme, run_seed } => world.init_run(theme, run_seed, out_events),
        Command::LoadZone { index } => world.load_zone(index, out_events),
        Command::Tick { dt, view, interact } => world.tick(dt, view, interact, out_events),
        Command::ResolvePlayerCollisions { dt } => world.resolve_player_collisions(dt, out_events),
        Command::SetPlayerMotion { position, velocity } => {
            world.player.position = position;
            world.player.velocity = velocity;
        }
        Command::DamagePlayer { amount } => {
            if amount.is_finite() && amount > 0.0 {
                world.player.absorb(amount);
                if let Some(run) = world.run.as_mut() {
                    run.zone_stats.damage_taken += amount;
                }
            }
        }
        Command::ActivateSpawn { spawn } => world.activate_spawn(spawn, out_events),
        Command::DamageEnemy { enemy, amount } => world.damage_enemy(enemy, amount, out_events),
        Command::KillEnemy { enemy } => world.kill_enemy(enemy, out_events),
        Command::SpawnBody {
            collection,
            position,
            velocity,
            ttl,
            damage,
        } => {
            if world
                .bodies
                .spawn(collection, position, velocity, ttl, damage, 1.0)
                .is_none()
            {
                tracing::warn!(%collection, "enemies are spawned from descriptors, not as bodies");
            }
        }
        Command::TrimOldest { collection, count } => {
            let removed = match collection {
                TrackedCollection::Enemies => world.trim_oldest_enemies(count, out_events),
                _ => world.bodies.trim_oldest(collection, count),
            };
            if removed > 0 {
                out_events.push(Event::CollectionTrimmed {
                    collection,
                    removed,
                });
            }
        }
    }
}

/// Read-only queries over the world state.
pub mod query {
    use deepfield_core::{
        glam::Vec2, Body, Enemy, EnemyId, PlayerState, TrackedCollection, ViewSize, WorldConfig,
        Zone,
    };

    use super::{RunState, World};

    /// Position, velocity and health of one collection entry.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct EntitySample {
        /// Index of the entry within its collection, oldest first.
        pub index: usize,
        /// Numeric identifier of the entity.
        pub id: u64,
        /// Current position.
        pub position: Vec2,
        /// Current velocity.
        pub velocity: Vec2,
        /// Hit points for enemies, health for bodies.
        pub health: f32,
    }

    /// Configuration the world was created with.
    #[must_use]
    pub fn config(world: &World) -> &WorldConfig {
        &world.config
    }

    /// State of the current run, if one has started.
    #[must_use]
    pub fn run(world: &World) -> Option<&RunState> {
        world.run.as_ref()
    }

    /// Currently loaded zone.
    #[must_use]
    pub fn zone(world: &World) -> Option<&Zone> {
        world.zone.as_ref()
    }

    /// SHA-256 digest of the loaded zone's generated content.
    #[must_use]
    pub fn zone_fingerprint(world: &World) -> Option<[u8; 32]> {
        world
            .zone
            .as_ref()
            .map(deepfield_system_zone_generation::fingerprint)
    }

    /// Player state.
    #[must_use]
    pub fn player(world: &World) -> &PlayerState {
        &world.player
    }

    /// Camera centre in world coordinates.
    #[must_use]
    pub fn camera(world: &World) -> Vec2 {
        world.camera
    }

    /// Viewport size used by the most recent tick.
    #[must_use]
    pub fn view(world: &World) -> ViewSize {
        world.view
    }

    /// Live enemies in spawn order.
    #[must_use]
    pub fn enemies(world: &World) -> &[Enemy] {
        &world.enemies
    }

    /// Looks up a live enemy.
    #[must_use]
    pub fn enemy(world: &World, id: EnemyId) -> Option<&Enemy> {
        world.enemies.iter().find(|enemy| enemy.id == id)
    }

    /// Bodies of a transient collection, oldest first. `None` for `Enemies`.
    pub fn bodies(world: &World, collection: TrackedCollection) -> Option<impl Iterator<Item = &Body>> {
        world.bodies.get(collection).map(|bodies| bodies.iter())
    }

    /// Number of entries in a tracked collection.
    #[must_use]
    pub fn collection_len(world: &World, collection: TrackedCollection) -> usize {
        match collection {
            TrackedCollection::Enemies => world.enemies.len(),
            _ => world.bodies.get(collection).map_or(0, |bodies| bodies.len()),
        }
    }

    /// Samples the entry at `index` of a tracked collection.
    #[must_use]
    pub fn sample(world: &World, collection: TrackedCollection, index: usize) -> Option<EntitySample> {
        match collection {
            TrackedCollection::Enemies => world.enemies.get(index).map(|enemy| EntitySample {
                index,
                id: u64::from(enemy.id.get()),
                position: enemy.position,
                velocity: enemy.velocity,
                health: enemy.hp,
            }),
            _ => world
                .bodies
                .get(collection)
                .and_then(|bodies| bodies.get(index))
                .map(|body| EntitySample {
                    index,
                    id: body.id.get(),
                    position: body.position,
                    velocity: body.velocity,
                    health: body.health,
                }),
        }
    }

    /// Ticks processed since the world was created.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Seconds simulated since the current zone loaded.
    #[must_use]
    pub fn zone_time(world: &World) -> f32 {
        world.zone_time
    }
}

impl World {
    fn enemy_index(&self, id: EnemyId) -> Option<usize> {
        self.enemies.iter().position(|enemy| enemy.id == id)
    }
}

#[cfg(test)]
mod tests {
    use deepfield_core::{BiomeId, SpawnId};

    use super::*;

    fn started(seed: u32) -> (World, Vec<Event>) {
        let mut world = World::with_behavior_seed(WorldConfig::default(), 9);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::InitWorld {
                theme: Some(BiomeId::new("void")),
                run_seed: Some(seed),
            },
            &mut events,
        );
        (world, events)
    }

    fn first_spawn(world: &World) -> SpawnId {
        query::zone(world)
            .and_then(|zone| zone.enemy_spawns.first())
            .map(|descriptor| descriptor.id)
            .expect("zone has enemies")
    }

    #[test]
    fn fresh_world_has_no_run() {
        let world = World::default();
        assert!(query::run(&world).is_none());
        assert!(query::zone(&world).is_none());
        assert_eq!(query::tick_index(&world), 0);
    }

    #[test]
    fn init_world_loads_first_zone() {
        let (world, events) = started(42);
        assert!(matches!(
            events.first(),
            Some(Event::WorldInitialized { run_seed: 42 })
        ));
        let Some(Event::ZoneLoaded { index, biome, .. }) = events.get(1) else {
            panic!("expected ZoneLoaded, got {events:?}");
        };
        assert_eq!(*index, 1);
        assert_eq!(biome, &BiomeId::new("void"));
        let zone = query::zone(&world).expect("zone");
        assert_eq!(query::player(&world).position, zone.spawn_point);
        assert_eq!(query::player(&world).velocity, Vec2::ZERO);
        assert_eq!(query::camera(&world), zone.spawn_point);
    }

    #[test]
    fn spawn_body_rejects_enemies() {
        let (mut world, _) = started(1);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnBody {
                collection: TrackedCollection::Enemies,
                position: Vec2::ZERO,
                velocity: Vec2::ZERO,
                ttl: 1.0,
                damage: 0.0,
            },
            &mut events,
        );
        assert_eq!(query::collection_len(&world, TrackedCollection::Enemies), 0);
        assert!(events.is_empty());
    }

    #[test]
    fn trimming_enemies_despawns_without_killing() {
        let (mut world, _) = started(5);
        let spawn = first_spawn(&world);
        let mut events = Vec::new();
        apply(&mut world, Command::ActivateSpawn { spawn }, &mut events);
        assert_eq!(query::enemies(&world).len(), 1);

        events.clear();
        apply(
            &mut world,
            Command::TrimOldest {
                collection: TrackedCollection::Enemies,
                count: 4,
            },
            &mut events,
        );
        assert!(query::enemies(&world).is_empty());
        assert!(events.contains(&Event::CollectionTrimmed {
            collection: TrackedCollection::Enemies,
            removed: 1,
        }));
        let descriptor = query::zone(&world)
            .and_then(|zone| zone.spawn(spawn))
            .expect("descriptor");
        assert!(!descriptor.state.active);
        assert!(!descriptor.state.killed);
        assert!(descriptor.can_activate());
    }

    #[test]
    fn damage_player_drains_shield_first() {
        let (mut world, _) = started(3);
        let mut events = Vec::new();
        apply(&mut world, Command::DamagePlayer { amount: 20.0 }, &mut events);
        let player = query::player(&world);
        assert_eq!(player.shield, 30.0);
        assert_eq!(player.health, 100.0);
        apply(&mut world, Command::DamagePlayer { amount: f32::NAN }, &mut events);
        assert_eq!(query::player(&world).shield, 30.0);
    }

    #[test]
    fn samples_follow_collection_order() {
        let (mut world, _) = started(8);
        let mut events = Vec::new();
        for step in 0..3 {
            apply(
                &mut world,
                Command::SpawnBody {
                    collection: TrackedCollection::Bullets,
                    position: Vec2::splat(step as f32),
                    velocity: Vec2::X,
                    ttl: 5.0,
                    damage: 1.0,
                },
                &mut events,
            );
        }
        assert_eq!(query::collection_len(&world, TrackedCollection::Bullets), 3);
        let tail = query::sample(&world, TrackedCollection::Bullets, 2).expect("tail");
        assert_eq!(tail.position, Vec2::splat(2.0));
        assert!(query::sample(&world, TrackedCollection::Bullets, 3).is_none());
        assert!(query::enemy(&world, EnemyId::new(0)).is_none());
    }
}
