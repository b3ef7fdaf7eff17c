//! Groups already-placed enemy spawns into coordinated packs.
//!
//! The director never creates spawns. Each pack consumes as many descriptors
//! from the shuffled walk as it has members, so the output always holds as
//! many descriptors as the input.

use std::f32::consts::TAU;

use deepfield_core::{
    glam::Vec2, EnemyKind, PackComposition, PackId, PackTag, PackTemplate, PackTuning, Rank,
    SeededRandom, SpawnDescriptor, SpawnState,
};

use crate::clamp_to;

const MEMBER_MIN_FRACTION: f32 = 0.35;

/// Zone facts the director needs while forming packs.
#[derive(Clone, Copy, Debug)]
pub struct PackContext<'a> {
    /// Regular enemy pool of the zone's biome.
    pub enemy_pool: &'a [EnemyKind],
    /// Player spawn point.
    pub spawn_point: Vec2,
    /// Exit point, when the zone has one.
    pub exit_point: Option<Vec2>,
    /// Zone width.
    pub width: f32,
    /// Zone height.
    pub height: f32,
}

/// Forms packs from enemy spawn descriptors.
#[derive(Clone, Copy, Debug)]
pub struct PackDirector<'a> {
    tuning: &'a PackTuning,
}

impl<'a> PackDirector<'a> {
    /// Creates a director bound to `tuning`.
    #[must_use]
    pub const fn new(tuning: &'a PackTuning) -> Self {
        Self { tuning }
    }

    /// Regroups `descriptors` into packs.
    ///
    /// Descriptors that stay single keep their relative order and come first;
    /// pack members follow, leaders first. Identifiers are left for the caller
    /// to renumber.
    pub fn direct(
        &self,
        descriptors: Vec<SpawnDescriptor>,
        context: &PackContext<'_>,
        rng: &mut SeededRandom,
    ) -> Vec<SpawnDescriptor> {
        let tuning = self.tuning;
        if descriptors.len() < 2 || tuning.templates.is_empty() || tuning.max_packs_per_zone == 0 {
            return descriptors;
        }

        let mut order: Vec<usize> = (0..descriptors.len()).collect();
        rng.shuffle(&mut order);
        let weights: Vec<f32> = tuning.templates.iter().map(|template| template.weight).collect();

        let mut consumed = vec![false; descriptors.len()];
        let mut members: Vec<SpawnDescriptor> = Vec::new();
        let mut formed: u32 = 0;

        for (cursor, &anchor_index) in order.iter().enumerate() {
            if formed >= tuning.max_packs_per_zone {
                break;
            }
            if consumed[anchor_index] {
                continue;
            }
            let anchor = &descriptors[anchor_index];
            if anchor.position.distance(context.spawn_point) < tuning.min_distance_from_spawn {
                continue;
            }
            if context
                .exit_point
                .is_some_and(|exit| anchor.position.distance(exit) < tuning.min_distance_from_exit)
            {
                continue;
            }
            if !rng.chance(tuning.formation_chance) {
                continue;
            }
            let Some(template) = rng
                .weighted_index(&weights)
                .and_then(|index| tuning.templates.get(index))
            else {
                break;
            };

            let remaining = order[cursor + 1..]
                .iter()
                .filter(|&&index| !consumed[index])
                .count();
            let kinds = self.roll_members(template, context.enemy_pool, remaining + 1, rng);
            if kinds.len() < 2 {
                continue;
            }

            consumed[anchor_index] = true;
            let mut budget = kinds.len() - 1;
            for &index in &order[cursor + 1..] {
                if budget == 0 {
                    break;
                }
                if !consumed[index] {
                    consumed[index] = true;
                    budget -= 1;
                }
            }

            let pack = PackId::new(u16::try_from(formed).unwrap_or(u16::MAX));
            let spacing = tuning.member_spacing.max(0.0);
            for (slot, kind) in kinds.into_iter().enumerate() {
                let leader = slot == 0;
                let position = if leader {
                    anchor.position
                } else {
                    let angle = rng.range(0.0, TAU);
                    let distance = rng.range(MEMBER_MIN_FRACTION * spacing, spacing);
                    clamp_to(
                        anchor.position + Vec2::from_angle(angle) * distance,
                        kind.profile().radius,
                        context.width,
                        context.height,
                    )
                };
                members.push(SpawnDescriptor {
                    id: anchor.id,
                    position,
                    kind,
                    rank: Rank::Normal,
                    patrol: anchor.patrol,
                    pack: Some(PackTag {
                        pack,
                        template: template.name.clone(),
                        leader,
                    }),
                    state: SpawnState::default(),
                });
            }
            formed += 1;
        }

        if formed > 0 {
            tracing::debug!(packs = formed, members = members.len(), "formed packs");
        }

        let mut output: Vec<SpawnDescriptor> = descriptors
            .into_iter()
            .zip(consumed)
            .filter_map(|(descriptor, used)| (!used).then_some(descriptor))
            .collect();
        output.extend(members);
        output
    }

    fn roll_members(
        &self,
        template: &PackTemplate,
        zone_pool: &[EnemyKind],
        limit: usize,
        rng: &mut SeededRandom,
    ) -> Vec<EnemyKind> {
        match &template.composition {
            PackComposition::Exact { members } => {
                let mut kinds = Vec::new();
                for member in members {
                    let min = i32::try_from(member.min).unwrap_or(i32::MAX);
                    let max = i32::try_from(member.max).unwrap_or(i32::MAX);
                    let copies = usize::try_from(rng.int(min, max.max(min))).unwrap_or(0);
                    let room = limit.saturating_sub(kinds.len());
                    kinds.extend(std::iter::repeat(member.kind).take(copies.min(room)));
                }
                kinds
            }
            PackComposition::Pool { kinds: pool } => {
                let pool = if pool.is_empty() { zone_pool } else { pool.as_slice() };
                let min = i32::try_from(self.tuning.size_min).unwrap_or(i32::MAX);
                let max = i32::try_from(self.tuning.size_max).unwrap_or(i32::MAX);
                let size = usize::try_from(rng.int(min, max.max(min)))
                    .unwrap_or(0)
                    .min(limit);
                (0..size)
                    .map(|_| rng.pick(pool).copied().unwrap_or(EnemyKind::Drone))
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepfield_core::{PackMember, PatrolProfile, PatrolShape, SpawnId};

    fn spawns(count: u32) -> Vec<SpawnDescriptor> {
        (0..count)
            .map(|index| SpawnDescriptor {
                id: SpawnId::new(index),
                position: Vec2::new(2_000.0 + index as f32 * 260.0, 1_500.0),
                kind: EnemyKind::Drone,
                rank: Rank::Normal,
                patrol: PatrolProfile {
                    shape: PatrolShape::Orbit,
                    radius: 100.0,
                },
                pack: None,
                state: SpawnState::default(),
            })
            .collect()
    }

    fn context() -> PackContext<'static> {
        PackContext {
            enemy_pool: &[EnemyKind::Drone, EnemyKind::Skirmisher],
            spawn_point: Vec2::new(100.0, 1_500.0),
            exit_point: Some(Vec2::new(9_900.0, 1_500.0)),
            width: 10_000.0,
            height: 3_000.0,
        }
    }

    fn always(templates: Vec<PackTemplate>) -> PackTuning {
        PackTuning {
            templates,
            formation_chance: 1.0,
            ..PackTuning::default()
        }
    }

    #[test]
    fn output_count_matches_input() {
        let tuning = always(PackTuning::default().templates);
        for seed in 0..50 {
            let mut rng = SeededRandom::new(seed);
            let output = PackDirector::new(&tuning).direct(spawns(12), &context(), &mut rng);
            assert_eq!(output.len(), 12);
        }
    }

    #[test]
    fn single_descriptor_is_left_alone() {
        let tuning = always(PackTuning::default().templates);
        let mut rng = SeededRandom::new(1);
        let input = spawns(1);
        let output = PackDirector::new(&tuning).direct(input.clone(), &context(), &mut rng);
        assert_eq!(output, input);
    }

    #[test]
    fn exact_template_forms_expected_pack() {
        let tuning = always(vec![PackTemplate {
            name: String::from("escort"),
            weight: 1.0,
            composition: PackComposition::Exact {
                members: vec![
                    PackMember {
                        kind: EnemyKind::Mender,
                        min: 1,
                        max: 1,
                    },
                    PackMember {
                        kind: EnemyKind::Skirmisher,
                        min: 2,
                        max: 2,
                    },
                ],
            },
        }]);
        let mut rng = SeededRandom::new(7);
        let output = PackDirector::new(&tuning).direct(spawns(3), &context(), &mut rng);

        assert_eq!(output.len(), 3);
        assert!(output.iter().all(|spawn| spawn.pack.is_some()));
        let kinds: Vec<EnemyKind> = output.iter().map(|spawn| spawn.kind).collect();
        assert_eq!(
            kinds,
            vec![EnemyKind::Mender, EnemyKind::Skirmisher, EnemyKind::Skirmisher]
        );
        let leaders = output
            .iter()
            .filter(|spawn| spawn.pack.as_ref().is_some_and(|tag| tag.leader))
            .count();
        assert_eq!(leaders, 1);
    }

    #[test]
    fn members_stay_near_anchor() {
        let tuning = always(PackTuning::default().templates);
        let mut rng = SeededRandom::new(11);
        let output = PackDirector::new(&tuning).direct(spawns(10), &context(), &mut rng);
        for member in output.iter().filter(|spawn| spawn.pack.is_some()) {
            let tag = member.pack.as_ref().expect("tagged");
            let leader = output
                .iter()
                .find(|spawn| {
                    spawn
                        .pack
                        .as_ref()
                        .is_some_and(|other| other.pack == tag.pack && other.leader)
                })
                .expect("pack has a leader");
            assert!(member.position.distance(leader.position) <= tuning.member_spacing + 1e-3);
        }
    }

    #[test]
    fn pack_limit_is_honoured() {
        let tuning = PackTuning {
            max_packs_per_zone: 1,
            ..always(PackTuning::default().templates)
        };
        let mut rng = SeededRandom::new(21);
        let output = PackDirector::new(&tuning).direct(spawns(20), &context(), &mut rng);
        let mut packs: Vec<u16> = output
            .iter()
            .filter_map(|spawn| spawn.pack.as_ref().map(|tag| tag.pack.get()))
            .collect();
        packs.dedup();
        assert!(packs.len() <= 1);
    }

    #[test]
    fn anchors_near_spawn_never_lead() {
        let tuning = always(PackTuning::default().templates);
        let near = PackContext {
            spawn_point: Vec2::new(2_500.0, 1_500.0),
            ..context()
        };
        let mut rng = SeededRandom::new(4);
        let output = PackDirector::new(&tuning).direct(spawns(12), &near, &mut rng);
        for leader in output
            .iter()
            .filter(|spawn| spawn.pack.as_ref().is_some_and(|tag| tag.leader))
        {
            assert!(leader.position.distance(near.spawn_point) >= tuning.min_distance_from_spawn);
        }
    }

    #[test]
    fn oversized_rolls_stop_at_the_remaining_budget() {
        let tuning = PackTuning {
            size_min: 200_000_000,
            size_max: 200_000_000,
            ..always(vec![PackTemplate {
                name: String::from("horde"),
                weight: 1.0,
                composition: PackComposition::Pool { kinds: Vec::new() },
            }])
        };
        let director = PackDirector::new(&tuning);
        let mut rng = SeededRandom::new(3);
        let pool = director.roll_members(&tuning.templates[0], context().enemy_pool, 4, &mut rng);
        assert_eq!(pool.len(), 4);

        let exact = PackTemplate {
            name: String::from("wall"),
            weight: 1.0,
            composition: PackComposition::Exact {
                members: vec![PackMember {
                    kind: EnemyKind::Gunship,
                    min: 150_000_000,
                    max: 150_000_000,
                }],
            },
        };
        assert_eq!(director.roll_members(&exact, &[], 3, &mut rng).len(), 3);

        let output = director.direct(spawns(6), &context(), &mut rng);
        assert_eq!(output.len(), 6);
    }
}
