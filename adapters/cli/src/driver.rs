//! Headless tick driver with a scripted pilot standing in for player input.

use deepfield_core::{Command, Event, Rank, ViewSize};
use deepfield_system_invariants::InvariantGuard;
use deepfield_world::{apply, query, World};
use glam::Vec2;
use rand::Rng;
use rand_chacha::{rand_core::SeedableRng, ChaCha8Rng};

const PILOT_SPEED: f32 = 320.0;
const PILOT_JITTER: f32 = 0.25;
const WEAPON_RANGE: f32 = 420.0;
const WEAPON_DPS: f32 = 90.0;

/// Parameters of a headless run.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SimulationOptions {
    pub(crate) ticks: u32,
    pub(crate) dt: f32,
    pub(crate) view: ViewSize,
    pub(crate) pilot_seed: u64,
}

/// Totals gathered while driving the world.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct SimulationReport {
    pub(crate) ticks: u32,
    pub(crate) depth: u32,
    pub(crate) zones_cleared: u32,
    pub(crate) spawned: u32,
    pub(crate) kills: u32,
    pub(crate) bosses: u32,
    pub(crate) shots: u32,
    pub(crate) trims: usize,
    pub(crate) violation: Option<String>,
}

impl SimulationReport {
    fn tally(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::ZoneLoaded { index, .. } => self.depth = *index,
                Event::ExitReached { .. } => self.zones_cleared += 1,
                Event::EnemySpawned { .. } => self.spawned += 1,
                Event::EnemyKilled { .. } => self.kills += 1,
                Event::BossDefeated { .. } => self.bosses += 1,
                Event::EnemyFired { .. } => self.shots += 1,
                Event::CollectionTrimmed { removed, .. } => self.trims += removed,
                _ => {}
            }
        }
    }
}

/// Steers toward the next objective and shoots the nearest enemy in range.
#[derive(Debug)]
struct Pilot {
    rng: ChaCha8Rng,
}

impl Pilot {
    fn objective(world: &World) -> Option<(Vec2, bool)> {
        let zone = query::zone(world)?;
        if let Some(portal) = zone.portals.first() {
            return Some((portal.position, true));
        }
        if let Some(exit) = zone.exit_point {
            return Some((exit, false));
        }
        let boss = query::enemies(world)
            .iter()
            .find(|enemy| enemy.rank == Rank::Boss)
            .map(|enemy| enemy.position);
        Some((boss.unwrap_or_else(|| zone.center()), false))
    }

    fn steer(&mut self, world: &World, dt: f32) -> (Vec2, Vec2, bool) {
        let player = query::player(world);
        let Some((target, interact)) = Self::objective(world) else {
            return (player.position, Vec2::ZERO, false);
        };
        let jitter = Vec2::new(
            self.rng.gen_range(-PILOT_JITTER..=PILOT_JITTER),
            self.rng.gen_range(-PILOT_JITTER..=PILOT_JITTER),
        );
        let heading = ((target - player.position).normalize_or_zero() + jitter).normalize_or_zero();
        let velocity = heading * PILOT_SPEED;
        (player.position + velocity * dt, velocity, interact)
    }

    fn fire(world: &World, dt: f32) -> Option<Command> {
        let player = query::player(world).position;
        query::enemies(world)
            .iter()
            .map(|enemy| (enemy.id, enemy.position.distance(player)))
            .filter(|(_, distance)| *distance <= WEAPON_RANGE)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(enemy, _)| Command::DamageEnemy {
                enemy,
                amount: WEAPON_DPS * dt,
            })
    }
}

/// Drives `world` for `options.ticks` ticks in the fixed per-tick order:
/// guard pre-check, input, tick, collisions, combat, guard post-check.
pub(crate) fn simulate(
    world: &mut World,
    guard: &mut InvariantGuard,
    options: SimulationOptions,
) -> SimulationReport {
    let mut pilot = Pilot {
        rng: ChaCha8Rng::seed_from_u64(options.pilot_seed),
    };
    let mut report = SimulationReport {
        depth: query::zone(world).map_or(0, |zone| zone.depth),
        ..SimulationReport::default()
    };
    let mut events = Vec::new();

    for _ in 0..options.ticks {
        events.clear();
        if let Err(violation) = guard.pre_tick(world, options.dt) {
            report.violation = Some(violation.to_string());
            break;
        }

        let (position, velocity, interact) = pilot.steer(world, options.dt);
        apply(world, Command::SetPlayerMotion { position, velocity }, &mut events);
        apply(
            world,
            Command::Tick {
                dt: options.dt,
                view: options.view,
                interact,
            },
            &mut events,
        );
        apply(world, Command::ResolvePlayerCollisions { dt: options.dt }, &mut events);
        if let Some(shot) = Pilot::fire(world, options.dt) {
            apply(world, shot, &mut events);
        }

        let checked = guard.post_tick(world, &mut events);
        report.ticks += 1;
        report.tally(&events);
        if let Err(violation) = checked {
            report.violation = Some(violation.to_string());
            break;
        }
    }

    tracing::info!(
        ticks = report.ticks,
        depth = report.depth,
        kills = report.kills,
        "simulation finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use deepfield_core::{BiomeId, EntityCaps, WorldConfig};
    use deepfield_system_invariants::MemorySink;

    use super::*;

    fn run(seed: u32) -> (SimulationReport, World) {
        let mut world = World::with_behavior_seed(WorldConfig::default(), 3);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::InitWorld {
                theme: Some(BiomeId::new("void")),
                run_seed: Some(seed),
            },
            &mut events,
        );
        let mut guard = InvariantGuard::new(EntityCaps::default(), Box::new(MemorySink::new()));
        let options = SimulationOptions {
            ticks: 900,
            dt: 1.0 / 30.0,
            view: ViewSize::new(1_280.0, 720.0),
            pilot_seed: 8,
        };
        (simulate(&mut world, &mut guard, options), world)
    }

    #[test]
    fn simulation_is_reproducible() {
        let (first, first_world) = run(99);
        let (second, second_world) = run(99);
        assert_eq!(first, second);
        assert_eq!(query::player(&first_world), query::player(&second_world));
        assert_eq!(first.ticks, 900);
        assert!(first.violation.is_none());
    }

    #[test]
    fn pilot_makes_progress() {
        let (report, _) = run(7);
        assert!(report.spawned > 0);
        assert!(report.depth >= 1);
    }
}
