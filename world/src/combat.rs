//! Enemy activation, damage, death and despawn.

use deepfield_core::{
    glam::Vec2, Enemy, EnemyId, Event, Portal, PortalDestination, Rank, SpawnId, SpawnState,
    TrackedCollection,
};

use crate::World;

const PICKUP_TTL: f32 = 20.0;
const PICKUP_VALUE: f32 = 0.1;
const VICTORY_PORTAL_RADIUS: f32 = 90.0;

impl World {
    /// Instantiates a live enemy for an inactive, unkilled descriptor.
    pub(crate) fn activate_spawn(&mut self, spawn: SpawnId, out: &mut Vec<Event>) {
        let Some(zone) = self.zone.as_mut() else {
            return;
        };
        let Some(descriptor) = zone.spawn_mut(spawn) else {
            return;
        };
        if !descriptor.can_activate() {
            return;
        }

        let id = EnemyId::new(self.next_enemy_id);
        self.next_enemy_id = self.next_enemy_id.wrapping_add(1);
        let enemy = self
            .behavior
            .instantiate(descriptor, id, &self.config.tuning.behavior);
        descriptor.state.active = true;
        descriptor.state.entity = Some(id);

        tracing::debug!(spawn = spawn.get(), enemy = id.get(), kind = ?enemy.kind, "enemy activated");
        out.push(Event::EnemySpawned {
            enemy: id,
            spawn,
            kind: enemy.kind,
            rank: enemy.rank,
            position: enemy.position,
        });
        if let Some(run) = self.run.as_mut() {
            run.zone_stats.spawned += 1;
        }
        self.enemies.push(enemy);
    }

    pub(crate) fn damage_enemy(&mut self, id: EnemyId, amount: f32, out: &mut Vec<Event>) {
        if !amount.is_finite() || amount <= 0.0 {
            return;
        }
        let Some(index) = self.enemy_index(id) else {
            return;
        };
        let enemy = &mut self.enemies[index];
        let dealt = amount.min(enemy.hp.max(0.0));
        enemy.hp -= amount;
        let remaining = enemy.hp.max(0.0);
        if let Some(run) = self.run.as_mut() {
            run.zone_stats.damage_dealt += dealt;
        }

        if remaining <= 0.0 {
            self.kill_enemy(id, out);
        } else {
            out.push(Event::EnemyDamaged {
                enemy: id,
                amount,
                remaining,
            });
        }
    }

    /// Removes a dead enemy. Its descriptor never activates again.
    pub(crate) fn kill_enemy(&mut self, id: EnemyId, out: &mut Vec<Event>) {
        let Some(index) = self.enemy_index(id) else {
            return;
        };
        let enemy = self.enemies.remove(index);
        if let (Some(zone), Some(spawn)) = (self.zone.as_mut(), enemy.spawn) {
            if let Some(descriptor) = zone.spawn_mut(spawn) {
                descriptor.state = SpawnState {
                    active: false,
                    killed: true,
                    entity: None,
                };
            }
        }
        let _ = self.bodies.spawn(
            TrackedCollection::Pickups,
            enemy.position,
            Vec2::ZERO,
            PICKUP_TTL,
            0.0,
            enemy.max_hp * PICKUP_VALUE,
        );
        if let Some(run) = self.run.as_mut() {
            run.zone_stats.killed += 1;
            run.run_stats.kills += 1;
        }
        out.push(Event::EnemyKilled {
            enemy: id,
            spawn: enemy.spawn,
            kind: enemy.kind,
            rank: enemy.rank,
            position: enemy.position,
        });

        if enemy.rank == Rank::Boss {
            self.open_victory_portal(&enemy, out);
        }
    }

    fn open_victory_portal(&mut self, boss: &Enemy, out: &mut Vec<Event>) {
        let Some(zone) = self.zone.as_mut() else {
            return;
        };
        let portal = zone.center();
        zone.portals.push(Portal {
            position: portal,
            radius: VICTORY_PORTAL_RADIUS,
            destination: PortalDestination::NextZone,
        });
        if let Some(run) = self.run.as_mut() {
            run.run_stats.bosses_defeated += 1;
        }
        tracing::info!(kind = ?boss.kind, "boss defeated");
        out.push(Event::BossDefeated {
            kind: boss.kind,
            portal,
        });
    }

    /// Removes a live enemy without killing it. Its descriptor may activate again.
    pub(crate) fn despawn_enemy(&mut self, id: EnemyId, out: &mut Vec<Event>) -> bool {
        let Some(index) = self.enemy_index(id) else {
            return false;
        };
        let enemy = self.enemies.remove(index);
        self.release(&enemy, out);
        true
    }

    /// Despawns up to `count` of the oldest live enemies.
    pub(crate) fn trim_oldest_enemies(&mut self, count: usize, out: &mut Vec<Event>) -> usize {
        let count = count.min(self.enemies.len());
        let trimmed: Vec<Enemy> = self.enemies.drain(..count).collect();
        for enemy in &trimmed {
            self.release(enemy, out);
        }
        count
    }

    fn release(&mut self, enemy: &Enemy, out: &mut Vec<Event>) {
        if let (Some(zone), Some(spawn)) = (self.zone.as_mut(), enemy.spawn) {
            if let Some(descriptor) = zone.spawn_mut(spawn) {
                descriptor.state.active = false;
                descriptor.state.entity = None;
            }
        }
        if let Some(run) = self.run.as_mut() {
            run.zone_stats.despawned += 1;
        }
        tracing::debug!(enemy = enemy.id.get(), "enemy despawned");
        out.push(Event::EnemyDespawned {
            enemy: enemy.id,
            spawn: enemy.spawn,
        });
    }
}
