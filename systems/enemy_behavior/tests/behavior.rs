use deepfield_core::{
    glam::Vec2, Ability, AiState, BehaviorTuning, Enemy, EnemyId, EnemyKind, Event, PatrolProfile,
    PatrolShape, Rank, SpawnDescriptor, SpawnId, SpawnState,
};
use deepfield_system_enemy_behavior::{BehaviorContext, EnemyBehavior};

const WIDTH: f32 = 4_000.0;
const HEIGHT: f32 = 3_000.0;

fn spawn(
    behavior: &mut EnemyBehavior,
    kind: EnemyKind,
    rank: Rank,
    position: Vec2,
    id: u32,
) -> Enemy {
    let descriptor = SpawnDescriptor {
        id: SpawnId::new(id),
        position,
        kind,
        rank,
        patrol: PatrolProfile {
            shape: PatrolShape::Hover,
            radius: 16.0,
        },
        pack: None,
        state: SpawnState::default(),
    };
    behavior.instantiate(&descriptor, EnemyId::new(id), &BehaviorTuning::default())
}

fn context(tuning: &BehaviorTuning, dt: f32, time: f32, player: Vec2) -> BehaviorContext<'_> {
    BehaviorContext {
        dt,
        time,
        player_position: player,
        width: WIDTH,
        height: HEIGHT,
        tuning,
    }
}

#[test]
fn disengaged_enemy_returns_then_settles() {
    let tuning = BehaviorTuning::default();
    let mut behavior = EnemyBehavior::with_seed(3);
    let home = Vec2::new(1_000.0, 1_000.0);
    let mut enemies = vec![spawn(&mut behavior, EnemyKind::Drone, Rank::Normal, home, 1)];
    enemies[0].state = AiState::Aggro;
    let ranges = enemies[0].ranges.expect("ranges");

    let far = home + Vec2::new(ranges.disengage + 50.0, 0.0);
    let mut events = Vec::new();
    behavior.update(&mut enemies, &context(&tuning, 1.0 / 60.0, 0.0, far), &mut events);
    assert_eq!(enemies[0].state, AiState::Return);
    assert!(events.contains(&Event::EnemyStateChanged {
        enemy: EnemyId::new(1),
        from: AiState::Aggro,
        to: AiState::Return,
    }));

    enemies[0].position = home + Vec2::new(ranges.return_threshold * 0.5, 0.0);
    enemies[0].velocity = Vec2::new(40.0, 0.0);
    events.clear();
    behavior.update(&mut enemies, &context(&tuning, 1.0 / 60.0, 0.1, far), &mut events);
    assert_eq!(enemies[0].state, AiState::Patrol);
    assert_eq!(enemies[0].velocity, Vec2::ZERO);
}

#[test]
fn leash_forces_return_even_near_player() {
    let tuning = BehaviorTuning::default();
    let mut behavior = EnemyBehavior::with_seed(3);
    let home = Vec2::new(500.0, 1_500.0);
    let mut enemies = vec![spawn(&mut behavior, EnemyKind::Skirmisher, Rank::Normal, home, 1)];
    let ranges = enemies[0].ranges.expect("ranges");
    enemies[0].state = AiState::Aggro;
    enemies[0].position = home + Vec2::new(ranges.leash + 10.0, 0.0);
    let player = enemies[0].position + Vec2::new(50.0, 0.0);

    let mut events = Vec::new();
    behavior.update(&mut enemies, &context(&tuning, 0.016, 0.0, player), &mut events);
    assert_eq!(enemies[0].state, AiState::Return);
}

#[test]
fn heals_never_exceed_shared_budget() {
    let tuning = BehaviorTuning::default();
    let mut behavior = EnemyBehavior::with_seed(11);
    let center = Vec2::new(2_000.0, 1_500.0);
    let mut enemies = vec![spawn(&mut behavior, EnemyKind::Marauder, Rank::Elite, center, 1)];
    enemies[0].hp = 10.0;
    for (offset, id) in [(Vec2::new(100.0, 0.0), 2), (Vec2::new(-100.0, 0.0), 3), (Vec2::new(0.0, 100.0), 4)] {
        enemies.push(spawn(&mut behavior, EnemyKind::Mender, Rank::Normal, center + offset, id));
    }
    let player = Vec2::new(3_800.0, 2_900.0);

    let mut healed_any = false;
    for tick in 0..20 {
        let mut events = Vec::new();
        let before = enemies[0].hp;
        behavior.update(
            &mut enemies,
            &context(&tuning, 0.5, tick as f32 * 0.5, player),
            &mut events,
        );
        let total: f32 = events
            .iter()
            .filter_map(|event| match event {
                Event::EnemyHealed { target, amount, .. } if *target == EnemyId::new(1) => {
                    Some(*amount)
                }
                _ => None,
            })
            .sum();
        assert!(total <= tuning.shared_heal_cap_per_tick + 1e-4, "tick {tick}: {total}");
        assert!((enemies[0].hp - before - total).abs() < 1e-3);
        healed_any |= total > 0.0;
    }
    assert!(healed_any);
    assert!(enemies[0].hp <= enemies[0].max_hp);
}

#[test]
fn support_never_changes_state() {
    let tuning = BehaviorTuning::default();
    let mut behavior = EnemyBehavior::with_seed(5);
    let at = Vec2::new(1_000.0, 1_000.0);
    let mut enemies = vec![spawn(&mut behavior, EnemyKind::Mender, Rank::Normal, at, 1)];
    for tick in 0..30 {
        let mut events = Vec::new();
        behavior.update(
            &mut enemies,
            &context(&tuning, 0.1, tick as f32 * 0.1, at + Vec2::new(20.0, 0.0)),
            &mut events,
        );
        assert_eq!(enemies[0].state, AiState::Patrol);
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::EnemyStateChanged { .. } | Event::EnemyFired { .. })));
    }
}

#[test]
fn telegraphed_shot_fires_once_per_windup() {
    let tuning = BehaviorTuning::default();
    let mut behavior = EnemyBehavior::with_seed(8);
    let at = Vec2::new(1_500.0, 1_500.0);
    let mut enemies = vec![spawn(&mut behavior, EnemyKind::Lancer, Rank::Normal, at, 1)];
    let player = at + Vec2::new(300.0, 0.0);

    let mut started = 0;
    let mut telegraphed_shots = 0;
    let mut plain_shots = 0;
    for tick in 0..50 {
        let mut events = Vec::new();
        behavior.update(
            &mut enemies,
            &context(&tuning, 0.1, tick as f32 * 0.1, player),
            &mut events,
        );
        for event in &events {
            match event {
                Event::TelegraphStarted { .. } => started += 1,
                Event::EnemyFired { telegraphed: true, .. } => telegraphed_shots += 1,
                Event::EnemyFired { telegraphed: false, .. } => plain_shots += 1,
                _ => {}
            }
        }
    }
    assert_eq!(enemies[0].state, AiState::Aggro);
    assert_eq!(started, 1);
    assert_eq!(telegraphed_shots, 1);
    assert_eq!(plain_shots, 0);
}

#[test]
fn standard_enemy_fires_when_in_range() {
    let tuning = BehaviorTuning::default();
    let mut behavior = EnemyBehavior::with_seed(2);
    let at = Vec2::new(1_500.0, 1_500.0);
    let mut enemies = vec![spawn(&mut behavior, EnemyKind::Gunship, Rank::Normal, at, 1)];
    let player = at + Vec2::new(250.0, 0.0);

    let mut shots = Vec::new();
    for tick in 0..40 {
        let mut events = Vec::new();
        behavior.update(
            &mut enemies,
            &context(&tuning, 0.1, tick as f32 * 0.1, player),
            &mut events,
        );
        shots.extend(events.into_iter().filter(|event| matches!(event, Event::EnemyFired { .. })));
    }
    assert!(shots.len() >= 2);
    for shot in shots {
        let Event::EnemyFired { direction, .. } = shot else {
            panic!("expected EnemyFired");
        };
        assert!((direction.length() - 1.0).abs() < 1e-3);
    }
}

#[test]
fn missing_home_and_ranges_are_initialised_lazily() {
    let tuning = BehaviorTuning::default();
    let mut behavior = EnemyBehavior::with_seed(4);
    let at = Vec2::new(800.0, 800.0);
    let mut enemies = vec![spawn(&mut behavior, EnemyKind::Drone, Rank::Elite, at, 1)];
    enemies[0].home = None;
    enemies[0].ranges = None;

    let mut events = Vec::new();
    behavior.update(
        &mut enemies,
        &context(&tuning, 0.016, 0.0, Vec2::new(3_900.0, 2_900.0)),
        &mut events,
    );
    assert_eq!(enemies[0].home, Some(at));
    assert_eq!(
        enemies[0].ranges,
        Some(deepfield_core::EngagementRanges::for_rank(Rank::Elite, &tuning))
    );
}

#[test]
fn enemies_stay_inside_zone_bounds() {
    let tuning = BehaviorTuning::default();
    let mut behavior = EnemyBehavior::with_seed(6);
    let corner = Vec2::new(30.0, 30.0);
    let mut enemies = vec![spawn(&mut behavior, EnemyKind::Skirmisher, Rank::Normal, corner, 1)];
    enemies[0].state = AiState::Aggro;
    let player = Vec2::new(40.0, 40.0);
    for tick in 0..120 {
        let mut events = Vec::new();
        behavior.update(
            &mut enemies,
            &context(&tuning, 0.05, tick as f32 * 0.05, player),
            &mut events,
        );
        let enemy = &enemies[0];
        assert!(enemy.position.x >= enemy.radius && enemy.position.x <= WIDTH - enemy.radius);
        assert!(enemy.position.y >= enemy.radius && enemy.position.y <= HEIGHT - enemy.radius);
    }
}

#[test]
fn zero_dt_changes_nothing() {
    let tuning = BehaviorTuning::default();
    let mut behavior = EnemyBehavior::with_seed(6);
    let at = Vec2::new(900.0, 900.0);
    let mut enemies = vec![spawn(&mut behavior, EnemyKind::Drone, Rank::Normal, at, 1)];
    let snapshot = enemies.clone();
    let mut events = Vec::new();
    behavior.update(&mut enemies, &context(&tuning, 0.0, 0.0, at), &mut events);
    assert_eq!(enemies, snapshot);
    assert!(events.is_empty());
    assert!(matches!(enemies[0].ability, Ability::Standard(_)));
}

#[test]
fn corrupt_positions_are_left_for_the_guard() {
    let tuning = BehaviorTuning::default();
    let mut behavior = EnemyBehavior::with_seed(9);
    let at = Vec2::new(1_200.0, 900.0);
    let mut enemies = vec![spawn(&mut behavior, EnemyKind::Drone, Rank::Normal, at, 1)];
    enemies[0].position = Vec2::new(f32::NAN, f32::NAN);

    let mut events = Vec::new();
    behavior.update(
        &mut enemies,
        &context(&tuning, 0.016, 0.0, at + Vec2::new(40.0, 0.0)),
        &mut events,
    );
    assert!(enemies[0].position.x.is_nan());
    assert!(enemies[0].position.y.is_nan());
}
