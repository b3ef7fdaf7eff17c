use deepfield_core::{
    BiomeConfig, BiomeId, BiomeTable, EnemyKind, ObstacleKind, PackTuning, Rank, Tuning, Zone,
    ZoneModifier,
};
use deepfield_system_zone_generation::{
    fingerprint, GenerationOptions, ZoneGenerator, BOSS_COVER_COUNT,
};

fn biome(id: &str) -> BiomeConfig {
    BiomeTable::default()
        .get(&BiomeId::new(id))
        .cloned()
        .expect("biome exists")
}

fn options(theme: &str, depth: u32, modifiers: Vec<ZoneModifier>) -> GenerationOptions {
    GenerationOptions {
        theme: BiomeId::new(theme),
        depth,
        modifiers,
    }
}

fn no_packs() -> PackTuning {
    PackTuning {
        formation_chance: 0.0,
        ..PackTuning::default()
    }
}

#[test]
fn seed_42_void_depth_1_is_well_formed() {
    let generator = ZoneGenerator::default();
    let config = biome("void");
    let zone = generator.generate(&config, 42, &options("void", 1, Vec::new()));

    let ramp = generator.tuning().ramps.dimension.factor(1);
    assert!(zone.width >= config.width.min * ramp - 1e-2);
    assert!(zone.width <= config.width.max * ramp + 1e-2);
    assert!(zone.height >= config.height.min * ramp - 1e-2);
    assert!(zone.height <= config.height.max * ramp + 1e-2);

    let exit = zone.exit_point.expect("exit point");
    assert!(zone.spawn_point.distance(exit) > zone.width.min(zone.height) * 0.5);
    assert!(
        zone.enemy_spawns.len() <= generator.tuning().caps.max_enemy_spawns_per_zone,
        "enemy spawns exceed cap"
    );
    assert!(zone.boss_spawn.is_none());
    assert_eq!(zone.biome, BiomeId::new("void"));
}

#[test]
fn same_inputs_produce_identical_zones() {
    let generator = ZoneGenerator::default();
    let config = biome("nebula");
    let run = |seed| {
        generator.generate(
            &config,
            seed,
            &options("nebula", 4, vec![ZoneModifier::Swarming]),
        )
    };
    let first = run(42);
    let second = run(42);
    assert_eq!(first, second);
    assert_eq!(fingerprint(&first), fingerprint(&second));
    assert_ne!(fingerprint(&first), fingerprint(&run(43)));
}

#[test]
fn generated_zone_survives_bincode() {
    let zone = ZoneGenerator::default().generate(
        &biome("derelict"),
        5,
        &options("derelict", 2, Vec::new()),
    );
    let bytes = bincode::serialize(&zone).expect("serialize");
    let restored: Zone = bincode::deserialize(&bytes).expect("deserialize");
    assert_eq!(restored, zone);
}

#[test]
fn caps_hold_under_extreme_densities() {
    let mut tuning = Tuning::default();
    tuning.caps.max_enemy_spawns_per_zone = 7;
    tuning.caps.max_elite_spawns_per_zone = 2;
    tuning.caps.max_obstacles_per_zone = 5;
    tuning.caps.max_decorations_per_zone = 4;
    tuning.caps.max_stars_per_layer = 9;
    let dense = BiomeConfig {
        enemy_density: 1.0,
        elite_density: 1.0,
        obstacle_density: 1.0,
        decoration_density: 1.0,
        star_density: 1.0,
        ..biome("void")
    };
    let generator = ZoneGenerator::new(tuning.clone(), PackTuning::default());
    for seed in 0..20 {
        let zone = generator.generate(
            &dense,
            seed,
            &options("void", 30, vec![ZoneModifier::Swarming, ZoneModifier::Vast]),
        );
        assert!(zone.enemy_spawns.len() <= 7);
        assert!(zone.elite_spawns.len() <= 2);
        assert!(zone.obstacles.len() <= 5);
        assert!(zone.decorations.len() <= 4);
        assert!(zone.width <= tuning.caps.max_zone_width);
        assert!(zone.height <= tuning.caps.max_zone_height);
        assert!(zone.parallax.iter().all(|layer| layer.star_count <= 9));
    }
}

#[test]
fn accepted_spawns_respect_spacing() {
    let generator = ZoneGenerator::new(Tuning::default(), no_packs());
    let spacing = generator.tuning().spacing;
    for seed in 0..25 {
        let zone = generator.generate(&biome("void"), seed, &options("void", 8, Vec::new()));
        let exit = zone.exit_point.expect("exit");
        let spawns: Vec<_> = zone.spawns().collect();
        for (index, spawn) in spawns.iter().enumerate() {
            assert!(spawn.position.distance(zone.spawn_point) >= spacing.min_distance_from_spawn);
            assert!(spawn.position.distance(exit) >= spacing.min_distance_from_exit);
            for other in &spawns[index + 1..] {
                assert!(
                    spawn.position.distance(other.position) >= spacing.min_spawn_spacing,
                    "seed {seed}: spawns too close"
                );
            }
        }
    }
}

#[test]
fn packs_do_not_change_enemy_count() {
    let always = PackTuning {
        formation_chance: 1.0,
        ..PackTuning::default()
    };
    for seed in 0..20 {
        let options = options("nebula", 6, Vec::new());
        let plain = ZoneGenerator::new(Tuning::default(), no_packs()).generate(
            &biome("nebula"),
            seed,
            &options,
        );
        let packed = ZoneGenerator::new(Tuning::default(), always.clone()).generate(
            &biome("nebula"),
            seed,
            &options,
        );
        assert_eq!(plain.enemy_spawns.len(), packed.enemy_spawns.len());
        assert!(packed
            .enemy_spawns
            .iter()
            .all(|spawn| spawn.rank == Rank::Normal));
    }
}

#[test]
fn obstacles_keep_clear_of_entry_and_exit() {
    let generator = ZoneGenerator::default();
    let clearance = generator.tuning().spacing.obstacle_clearance;
    let zone = generator.generate(
        &biome("asteroid_belt"),
        77,
        &options("asteroid_belt", 3, vec![ZoneModifier::Minefield]),
    );
    let exit = zone.exit_point.expect("exit");
    assert!(!zone.obstacles.is_empty());
    for obstacle in &zone.obstacles {
        assert!(obstacle.position.distance(zone.spawn_point) >= clearance + obstacle.radius);
        assert!(obstacle.position.distance(exit) >= clearance + obstacle.radius);
        assert_eq!(obstacle.hp, obstacle.kind.initial_hp());
    }
}

#[test]
fn boss_arena_has_boss_cover_and_no_exit() {
    let generator = ZoneGenerator::default();
    let config = biome("void");
    let zone =
        generator.generate_boss(&config, &BiomeId::new("void"), 1234, EnemyKind::Leviathan, 5);

    assert!(zone.exit_point.is_none());
    assert!(zone.portals.is_empty());
    assert!(zone.enemy_spawns.is_empty());
    assert!(zone.elite_spawns.is_empty());
    let boss = zone.boss_spawn.as_ref().expect("boss descriptor");
    assert_eq!(boss.kind, EnemyKind::Leviathan);
    assert_eq!(boss.rank, Rank::Boss);
    assert!(boss.position.x > zone.spawn_point.x);
    assert_eq!(zone.obstacles.len(), BOSS_COVER_COUNT);
    assert!(zone
        .obstacles
        .iter()
        .all(|obstacle| obstacle.kind == ObstacleKind::Cover && obstacle.hp.is_none()));
    assert!(zone.is_boss_zone());
}

#[test]
fn deeper_zones_are_not_sparser() {
    let generator = ZoneGenerator::new(Tuning::default(), no_packs());
    let config = BiomeConfig {
        enemy_density: 1.0e-6,
        ..biome("void")
    };
    let count = |depth| -> usize {
        (0..10)
            .map(|seed| {
                generator
                    .generate(&config, seed, &options("void", depth, Vec::new()))
                    .enemy_spawns
                    .len()
            })
            .sum()
    };
    let shallow = count(1);
    let deep = count(15);
    assert!(deep >= shallow);
}
