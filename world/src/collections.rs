//! Transient body collections: projectiles, pickups and particles.

use std::collections::VecDeque;

use deepfield_core::{glam::Vec2, Body, BodyId, TrackedCollection};

/// Body collections keyed by [`TrackedCollection`].
///
/// Bodies are appended at the back, so every deque is ordered oldest first.
#[derive(Debug, Default)]
pub(crate) struct Bodies {
    bullets: VecDeque<Body>,
    enemy_bullets: VecDeque<Body>,
    pickups: VecDeque<Body>,
    particles: VecDeque<Body>,
    next_id: u64,
}

impl Bodies {
    pub(crate) fn get(&self, collection: TrackedCollection) -> Option<&VecDeque<Body>> {
        match collection {
            TrackedCollection::Bullets => Some(&self.bullets),
            TrackedCollection::EnemyBullets => Some(&self.enemy_bullets),
            TrackedCollection::Pickups => Some(&self.pickups),
            TrackedCollection::Particles => Some(&self.particles),
            TrackedCollection::Enemies => None,
        }
    }

    fn get_mut(&mut self, collection: TrackedCollection) -> Option<&mut VecDeque<Body>> {
        match collection {
            TrackedCollection::Bullets => Some(&mut self.bullets),
            TrackedCollection::EnemyBullets => Some(&mut self.enemy_bullets),
            TrackedCollection::Pickups => Some(&mut self.pickups),
            TrackedCollection::Particles => Some(&mut self.particles),
            TrackedCollection::Enemies => None,
        }
    }

    fn all_mut(&mut self) -> [&mut VecDeque<Body>; 4] {
        [
            &mut self.bullets,
            &mut self.enemy_bullets,
            &mut self.pickups,
            &mut self.particles,
        ]
    }

    /// Appends a body and returns its identifier, or `None` for `Enemies`.
    pub(crate) fn spawn(
        &mut self,
        collection: TrackedCollection,
        position: Vec2,
        velocity: Vec2,
        ttl: f32,
        damage: f32,
        health: f32,
    ) -> Option<BodyId> {
        let id = BodyId::new(self.next_id);
        let bodies = self.get_mut(collection)?;
        bodies.push_back(Body {
            id,
            position,
            velocity,
            health,
            ttl,
            damage,
        });
        self.next_id = self.next_id.wrapping_add(1);
        Some(id)
    }

    /// Removes up to `count` of the oldest bodies and returns how many went.
    pub(crate) fn trim_oldest(&mut self, collection: TrackedCollection, count: usize) -> usize {
        let Some(bodies) = self.get_mut(collection) else {
            return 0;
        };
        let removed = count.min(bodies.len());
        drop(bodies.drain(..removed));
        removed
    }

    /// Moves every body and drops the ones whose lifetime ran out.
    pub(crate) fn integrate(&mut self, dt: f32) {
        for bodies in self.all_mut() {
            for body in bodies.iter_mut() {
                body.position += body.velocity * dt;
                body.ttl -= dt;
            }
            bodies.retain(|body| body.ttl > 0.0);
        }
    }

    /// Empties every collection. Identifiers keep increasing.
    pub(crate) fn clear(&mut self) {
        for bodies in self.all_mut() {
            bodies.clear();
        }
    }
}
