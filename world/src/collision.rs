//! Circular collision response between the player and zone obstacles.

use deepfield_core::{glam::Vec2, Event, Obstacle, ObstacleKind};

use crate::World;

const MINE_DAMAGE: f32 = 25.0;

/// Unit vector from the obstacle centre toward an overlapping circle.
fn contact_normal(position: Vec2, radius: f32, obstacle: &Obstacle) -> Option<Vec2> {
    let offset = position - obstacle.position;
    let reach = radius + obstacle.radius;
    let distance_sq = offset.length_squared();
    if !distance_sq.is_finite() || distance_sq >= reach * reach {
        return None;
    }
    let distance = distance_sq.sqrt();
    Some(if distance > f32::EPSILON {
        offset / distance
    } else {
        Vec2::X
    })
}

impl World {
    pub(crate) fn resolve_player_collisions(&mut self, dt: f32, out: &mut Vec<Event>) {
        if !dt.is_finite() || dt < 0.0 {
            return;
        }
        let Some(zone) = self.zone.as_mut() else {
            return;
        };
        let player = &mut self.player;
        let mut detonated = Vec::new();
        let mut taken = 0.0;

        for (index, obstacle) in zone.obstacles.iter().enumerate() {
            let Some(normal) = contact_normal(player.position, player.radius, obstacle) else {
                continue;
            };
            if obstacle.kind == ObstacleKind::Mine {
                player.absorb(MINE_DAMAGE);
                taken += MINE_DAMAGE;
                detonated.push(index);
                out.push(Event::MineDetonated {
                    position: obstacle.position,
                    damage: MINE_DAMAGE,
                });
                continue;
            }

            player.position = obstacle.position + normal * (obstacle.radius + player.radius);
            let inward = player.velocity.dot(normal);
            if inward < 0.0 {
                player.velocity -= normal * inward;
            }
            let damage = obstacle.kind.contact_damage_per_second() * dt;
            player.absorb(damage);
            taken += damage;
            out.push(Event::PlayerCollided {
                kind: obstacle.kind,
                damage,
            });
        }

        for index in detonated.into_iter().rev() {
            let _ = zone.obstacles.remove(index);
        }
        if player.position.is_finite() {
            player.position = zone.clamp(player.position, player.radius);
        }
        if let Some(run) = self.run.as_mut() {
            run.zone_stats.damage_taken += taken;
        }
    }
}
