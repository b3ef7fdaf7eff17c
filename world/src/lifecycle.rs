//! Zone lifecycle: run state, theme and boss rotation, zone loads, view
//! streaming, exits and portals.
//!
//! Rotation decisions are pure functions of the run seed and depth, so the
//! same run seed reproduces the same sequence of themes, bosses and zones no
//! matter how the player moves between them.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use deepfield_core::{
    derive_seed, glam::Vec2, label_seed,
    random::{ACT_SEED_SALT, BOSS_ROLL_SALT, MODIFIER_SALT, THEME_BLOCK_SALT, ZONE_SEED_SALT},
    AiState, BiomeId, EnemyKind, Event, ModifierTuning, PortalDestination, Rank,
    SeededRandom, SpawnId, TrackedCollection, ViewSize, Zone, ZoneError,
    ZoneModifier,
};
use deepfield_system_enemy_behavior::{stand_down, BehaviorContext};
use deepfield_system_zone_generation::GenerationOptions;

use crate::World;

const ENEMY_BULLET_TTL: f32 = 4.0;

/// Where the run currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Location {
    /// Inside a generated zone.
    Zone,
    /// In the hub between zones; no zone is loaded.
    Hub,
}

/// Counters reset on every zone load.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ZoneStats {
    /// Enemies activated.
    pub spawned: u32,
    /// Enemies removed without dying.
    pub despawned: u32,
    /// Enemies killed.
    pub killed: u32,
    /// Damage dealt to enemies.
    pub damage_dealt: f32,
    /// Damage taken by the player.
    pub damage_taken: f32,
    /// Seconds spent in the zone.
    pub elapsed: f32,
}

/// Counters accumulated over the whole run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Zones loaded.
    pub zones_entered: u32,
    /// Zones left through their exit.
    pub zones_cleared: u32,
    /// Enemies killed.
    pub kills: u32,
    /// Bosses killed.
    pub bosses_defeated: u32,
}

/// State of the run in progress.
#[derive(Clone, Debug, PartialEq)]
pub struct RunState {
    /// Seed every rotation and generation decision derives from.
    pub run_seed: u32,
    /// Theme of the current block.
    pub theme: BiomeId,
    /// Depth of the current zone; zero until the first load.
    pub zone_index: u32,
    /// Themes of the two preceding blocks, most recent first.
    pub recent_themes: Vec<BiomeId>,
    /// Most recent boss encountered.
    pub last_boss: Option<EnemyKind>,
    /// Themes forced onto specific blocks by the run start or theme portals.
    pub pinned_themes: BTreeMap<u32, BiomeId>,
    /// Whether the run is inside a zone or in the hub.
    pub location: Location,
    /// Counters for the current zone.
    pub zone_stats: ZoneStats,
    /// Counters for the whole run.
    pub run_stats: RunStats,
}

/// Theme block containing depth `index`. Depths start at one.
#[must_use]
pub fn theme_block(index: u32, block_size: u32) -> u32 {
    index.saturating_sub(1) / block_size.max(1)
}

/// Themes chosen for blocks `0..=last_block`, in block order.
///
/// A pinned block takes its pinned theme. Every other block draws from a
/// generator seeded by the run seed and block number; with `no_repeat` the
/// previous block's theme is excluded, and the one before it as well when at
/// least three themes exist.
#[must_use]
pub fn theme_history(
    themes: &[BiomeId],
    run_seed: u32,
    last_block: u32,
    pinned: &BTreeMap<u32, BiomeId>,
    no_repeat: bool,
) -> Vec<BiomeId> {
    let window = match (no_repeat, themes.len()) {
        (false, _) => 0,
        (true, count) if count >= 3 => 2,
        (true, _) => 1,
    };
    let mut history: Vec<BiomeId> = Vec::new();
    for block in 0..=last_block {
        let chosen = if let Some(theme) = pinned.get(&block) {
            theme.clone()
        } else {
            let recent = &history[history.len().saturating_sub(window)..];
            let fresh: Vec<&BiomeId> = themes
                .iter()
                .filter(|theme| !recent.contains(theme))
                .collect();
            let candidates = if fresh.is_empty() {
                themes.iter().collect()
            } else {
                fresh
            };
            let mut rng = SeededRandom::new(derive_seed(run_seed, THEME_BLOCK_SALT, block));
            match rng.pick(&candidates) {
                Some(theme) => (*theme).clone(),
                None => break,
            }
        };
        history.push(chosen);
    }
    history
}

/// Boss guarding depth `index`, or `None` when it is a regular zone.
///
/// Each boss depth rolls from its own seed; with `no_repeat` a boss never
/// follows itself while the pool offers an alternative.
#[must_use]
pub fn boss_for_depth(
    pool: &[EnemyKind],
    run_seed: u32,
    index: u32,
    interval: u32,
    no_repeat: bool,
) -> Option<EnemyKind> {
    if interval == 0 || index == 0 || index % interval != 0 {
        return None;
    }
    let mut previous: Option<EnemyKind> = None;
    for depth in (interval..=index).step_by(interval as usize) {
        let fresh: Vec<EnemyKind> = pool
            .iter()
            .copied()
            .filter(|kind| !(no_repeat && previous == Some(*kind)))
            .collect();
        let candidates = if fresh.is_empty() { pool } else { &fresh[..] };
        let mut rng = SeededRandom::new(derive_seed(run_seed, BOSS_ROLL_SALT, depth));
        previous = rng.pick(candidates).copied();
    }
    previous
}

/// Seed shared by every zone of a theme within a run.
#[must_use]
pub fn act_seed(run_seed: u32, theme: &BiomeId) -> u32 {
    derive_seed(run_seed, ACT_SEED_SALT, label_seed(theme.as_str()))
}

/// Seed of the zone at depth `index` within an act.
#[must_use]
pub fn zone_seed(act_seed: u32, index: u32) -> u32 {
    derive_seed(act_seed, ZONE_SEED_SALT, index)
}

/// Modifiers active at depth `index`.
///
/// One slot opens every `depth_step` depths up to `max_active`; each slot
/// rolls against `roll_chance` and never picks a duplicate or a conflicting
/// modifier. The result is sorted.
#[must_use]
pub fn sample_modifiers(seed: u32, index: u32, tuning: &ModifierTuning) -> Vec<ZoneModifier> {
    if tuning.depth_step == 0 {
        return Vec::new();
    }
    let slots = (index / tuning.depth_step).min(tuning.max_active);
    let mut rng = SeededRandom::new(derive_seed(seed, MODIFIER_SALT, index));
    let mut chosen: Vec<ZoneModifier> = Vec::new();
    for _ in 0..slots {
        if !rng.chance(tuning.roll_chance) {
            continue;
        }
        let candidates: Vec<ZoneModifier> = ZoneModifier::ALL
            .into_iter()
            .filter(|modifier| {
                !chosen
                    .iter()
                    .any(|taken| taken == modifier || taken.conflicts_with(*modifier))
            })
            .collect();
        if let Some(modifier) = rng.pick(&candidates) {
            chosen.push(*modifier);
        }
    }
    chosen.sort_unstable();
    chosen
}

fn wall_clock_seed() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            let nanos = elapsed.as_nanos();
            (nanos as u32) ^ ((nanos >> 32) as u32)
        })
}

/// Axis-aligned view rectangle centred on the camera.
#[derive(Clone, Copy, Debug)]
struct ViewWindow {
    center: Vec2,
    half: Vec2,
}

impl ViewWindow {
    fn new(center: Vec2, view: ViewSize) -> Self {
        Self {
            center,
            half: Vec2::new(view.width, view.height) * 0.5,
        }
    }

    fn contains(&self, point: Vec2, margin: f32) -> bool {
        let offset = (point - self.center).abs();
        offset.x <= self.half.x + margin && offset.y <= self.half.y + margin
    }
}

struct PreparedZone {
    zone: Zone,
    theme: BiomeId,
    recent: Vec<BiomeId>,
    boss: Option<EnemyKind>,
}

fn fail_load(index: u32, error: ZoneError, out: &mut Vec<Event>) {
    tracing::error!(index, %error, "zone load failed");
    out.push(Event::ZoneLoadFailed { index, error });
}

impl World {
    pub(crate) fn init_run(
        &mut self,
        theme: Option<BiomeId>,
        run_seed: Option<u32>,
        out: &mut Vec<Event>,
    ) {
        if self.config.biomes.is_empty() {
            fail_load(1, ZoneError::EmptyBiomeTable, out);
            return;
        }
        if let Some(theme) = theme.as_ref() {
            if self.config.biomes.get(theme).is_none() {
                fail_load(1, ZoneError::UnknownTheme(theme.clone()), out);
                return;
            }
        }

        let run_seed = run_seed.unwrap_or_else(wall_clock_seed);
        let mut pinned_themes = BTreeMap::new();
        if let Some(theme) = theme {
            let _ = pinned_themes.insert(0, theme);
        }
        let rotation = &self.config.tuning.rotation;
        let first = theme_history(
            &self.config.biomes.ids(),
            run_seed,
            0,
            &pinned_themes,
            rotation.no_repeat_theme,
        );
        let Some(theme) = first.into_iter().next() else {
            fail_load(1, ZoneError::EmptyBiomeTable, out);
            return;
        };

        self.run = Some(RunState {
            run_seed,
            theme,
            zone_index: 0,
            recent_themes: Vec::new(),
            last_boss: None,
            pinned_themes,
            location: Location::Zone,
            zone_stats: ZoneStats::default(),
            run_stats: RunStats::default(),
        });
        self.player = Default::default();
        tracing::info!(run_seed, "run started");
        out.push(Event::WorldInitialized { run_seed });
        self.load_zone(1, out);
    }

    pub(crate) fn load_zone(&mut self, index: u32, out: &mut Vec<Event>) {
        match self.prepare_zone(index) {
            Ok(prepared) => self.enter_zone(prepared, out),
            Err(error) => fail_load(index, error, out),
        }
    }

    fn prepare_zone(&self, index: u32) -> Result<PreparedZone, ZoneError> {
        let run = self.run.as_ref().ok_or(ZoneError::NotInitialized)?;
        let rotation = &self.config.tuning.rotation;
        if index == 0 || index > rotation.max_depth {
            return Err(ZoneError::InvalidIndex(index));
        }
        let ids = self.config.biomes.ids();
        if ids.is_empty() {
            return Err(ZoneError::EmptyBiomeTable);
        }

        let block = theme_block(index, rotation.theme_block_size);
        let history = theme_history(
            &ids,
            run.run_seed,
            block,
            &run.pinned_themes,
            rotation.no_repeat_theme,
        );
        let (theme, earlier) = history.split_last().ok_or(ZoneError::EmptyBiomeTable)?;
        let biome = self
            .config
            .biomes
            .get(theme)
            .ok_or_else(|| ZoneError::UnknownTheme(theme.clone()))?;

        let seed = zone_seed(act_seed(run.run_seed, theme), index);
        let boss = boss_for_depth(
            &rotation.boss_pool,
            run.run_seed,
            index,
            rotation.boss_interval,
            rotation.no_repeat_boss,
        );
        let zone = match boss {
            Some(kind) => self
                .generator
                .generate_boss(biome, theme, seed, kind, index),
            None => {
                let options = GenerationOptions {
                    theme: theme.clone(),
                    depth: index,
                    modifiers: sample_modifiers(seed, index, &self.config.tuning.modifiers),
                };
                self.generator.generate(biome, seed, &options)
            }
        };

        Ok(PreparedZone {
            zone,
            theme: theme.clone(),
            recent: earlier.iter().rev().take(2).cloned().collect(),
            boss,
        })
    }

    fn enter_zone(&mut self, prepared: PreparedZone, out: &mut Vec<Event>) {
        let PreparedZone {
            zone,
            theme,
            recent,
            boss,
        } = prepared;

        self.enemies.clear();
        self.bodies.clear();
        self.behavior.reset();
        self.zone_time = 0.0;
        self.player.position = zone.spawn_point;
        self.player.velocity = Vec2::ZERO;
        self.camera = zone.spawn_point;

        if let Some(run) = self.run.as_mut() {
            run.theme = theme.clone();
            run.zone_index = zone.depth;
            run.recent_themes = recent;
            if boss.is_some() {
                run.last_boss = boss;
            }
            run.location = Location::Zone;
            run.zone_stats = ZoneStats::default();
            run.run_stats.zones_entered += 1;
        }

        tracing::info!(
            index = zone.depth,
            biome = %theme,
            seed = zone.seed,
            ?boss,
            enemies = zone.enemy_spawns.len(),
            elites = zone.elite_spawns.len(),
            "zone loaded"
        );
        out.push(Event::ZoneLoaded {
            index: zone.depth,
            biome: theme,
            seed: zone.seed,
            boss,
            modifiers: zone.modifiers.clone(),
        });
        self.zone = Some(zone);
    }

    pub(crate) fn tick(&mut self, dt: f32, view: ViewSize, interact: bool, out: &mut Vec<Event>) {
        if !dt.is_finite() || dt < 0.0 {
            tracing::warn!(dt, "ignoring tick with an invalid delta");
            return;
        }
        self.tick_index += 1;
        self.zone_time += dt;
        self.view = view;
        out.push(Event::TimeAdvanced { dt });

        let in_zone = matches!(
            self.run.as_ref().map(|run| run.location),
            Some(Location::Zone)
        );
        if !in_zone || self.zone.is_none() {
            return;
        }
        if let Some(run) = self.run.as_mut() {
            run.zone_stats.elapsed += dt;
        }

        self.camera = self.player.position;
        self.stream(out);
        self.advance_enemies(dt, out);
        self.bodies.integrate(dt);
        if self.check_exit(out) {
            return;
        }
        if interact {
            self.check_portals(out);
        }
    }

    /// Activates descriptors near the view and retires enemies far from it.
    fn stream(&mut self, out: &mut Vec<Event>) {
        let Some(zone) = self.zone.as_ref() else {
            return;
        };
        let streaming = self.config.tuning.streaming;
        let window = ViewWindow::new(self.camera, self.view);
        let player = self.player.position;
        let margin_scale = |rank: Rank| {
            if rank == Rank::Boss {
                streaming.boss_margin_factor
            } else {
                1.0
            }
        };

        let waking: Vec<SpawnId> = zone
            .spawns()
            .filter(|descriptor| descriptor.can_activate())
            .filter(|descriptor| {
                let margin = streaming.spawn_margin * margin_scale(descriptor.rank);
                window.contains(descriptor.position, margin)
                    || descriptor.position.distance(player) <= streaming.activation_radius
            })
            .map(|descriptor| descriptor.id)
            .collect();
        for spawn in waking {
            self.activate_spawn(spawn, out);
        }

        let mut leaving = Vec::new();
        for enemy in &mut self.enemies {
            let home = enemy.home.unwrap_or(enemy.position);
            let margin = streaming.despawn_margin * margin_scale(enemy.rank);
            let far = !window.contains(home, margin) && home.distance(player) > streaming.despawn_radius;
            if !far {
                enemy.despawn_pending = false;
                continue;
            }
            match enemy.state {
                AiState::Patrol => leaving.push(enemy.id),
                AiState::Aggro => {
                    enemy.state = AiState::Return;
                    enemy.despawn_pending = true;
                    stand_down(enemy, &self.config.tuning.behavior);
                    tracing::debug!(enemy = enemy.id.get(), "recalling engaged enemy");
                    out.push(Event::EnemyStateChanged {
                        enemy: enemy.id,
                        from: AiState::Aggro,
                        to: AiState::Return,
                    });
                    out.push(Event::EnemyRecalled { enemy: enemy.id });
                }
                AiState::Return => {
                    enemy.despawn_pending = true;
                    if enemy.position.distance(home) <= streaming.home_despawn_threshold {
                        leaving.push(enemy.id);
                    }
                }
            }
        }
        for enemy in leaving {
            let _ = self.despawn_enemy(enemy, out);
        }
    }

    fn advance_enemies(&mut self, dt: f32, out: &mut Vec<Event>) {
        let Some(zone) = self.zone.as_ref() else {
            return;
        };
        let ctx = BehaviorContext {
            dt,
            time: self.zone_time,
            player_position: self.player.position,
            width: zone.width,
            height: zone.height,
            tuning: &self.config.tuning.behavior,
        };
        let mut emitted = Vec::new();
        self.behavior.update(&mut self.enemies, &ctx, &mut emitted);

        for event in emitted {
            if let Event::EnemyFired {
                origin,
                direction,
                speed,
                damage,
                ..
            } = &event
            {
                let _ = self.bodies.spawn(
                    TrackedCollection::EnemyBullets,
                    *origin,
                    *direction * *speed,
                    ENEMY_BULLET_TTL,
                    *damage,
                    1.0,
                );
            }
            out.push(event);
        }
    }

    /// Advances to the next depth when the player reaches the exit.
    fn check_exit(&mut self, out: &mut Vec<Event>) -> bool {
        let Some(zone) = self.zone.as_ref() else {
            return false;
        };
        let Some(exit) = zone.exit_point else {
            return false;
        };
        if self.player.position.distance(exit) > self.config.tuning.streaming.exit_radius {
            return false;
        }
        let index = zone.depth;
        if let Some(run) = self.run.as_mut() {
            run.run_stats.zones_cleared += 1;
        }
        out.push(Event::ExitReached { index });
        self.load_zone(index.saturating_add(1), out);
        true
    }

    fn check_portals(&mut self, out: &mut Vec<Event>) {
        let Some(zone) = self.zone.as_ref() else {
            return;
        };
        let player = &self.player;
        let Some(portal) = zone
            .portals
            .iter()
            .find(|portal| portal.position.distance(player.position) <= portal.radius + player.radius)
        else {
            return;
        };
        let destination = portal.destination.clone();
        let next = zone.depth.saturating_add(1);

        match destination {
            PortalDestination::NextZone => {
                out.push(Event::PortalEntered { destination });
                self.load_zone(next, out);
            }
            PortalDestination::Hub => {
                out.push(Event::PortalEntered { destination });
                self.return_to_hub(out);
            }
            PortalDestination::Theme(theme) => {
                if self.config.biomes.get(&theme).is_none() {
                    fail_load(next, ZoneError::UnknownTheme(theme), out);
                    return;
                }
                out.push(Event::PortalEntered {
                    destination: PortalDestination::Theme(theme.clone()),
                });
                let block = theme_block(next, self.config.tuning.rotation.theme_block_size);
                if let Some(run) = self.run.as_mut() {
                    let _ = run.pinned_themes.insert(block, theme);
                }
                self.load_zone(next, out);
            }
        }
    }

    fn return_to_hub(&mut self, out: &mut Vec<Event>) {
        self.enemies.clear();
        self.bodies.clear();
        self.behavior.reset();
        self.zone = None;
        if let Some(run) = self.run.as_mut() {
            run.location = Location::Hub;
        }
        tracing::info!("returned to hub");
        out.push(Event::ReturnedToHub);
    }
}
