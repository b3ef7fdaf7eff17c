//! Serializable picture of the world at the moment an invariant failed.

use std::backtrace::Backtrace;

use deepfield_core::{BiomeId, TrackedCollection};
use deepfield_system_zone_generation::fingerprint_hex;
use deepfield_world::{query, query::EntitySample, World};
use serde::{Deserialize, Serialize};

/// One sampled collection entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    /// Index within the collection, oldest first.
    pub index: usize,
    /// Entity identifier.
    pub id: u64,
    /// Position as `[x, y]`.
    pub position: [f32; 2],
    /// Velocity as `[x, y]`.
    pub velocity: [f32; 2],
    /// Health or hit points.
    pub health: f32,
}

impl From<EntitySample> for SampleRecord {
    fn from(sample: EntitySample) -> Self {
        Self {
            index: sample.index,
            id: sample.id,
            position: sample.position.to_array(),
            velocity: sample.velocity.to_array(),
            health: sample.health,
        }
    }
}

/// Size and extremes of one tracked collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CollectionRecord {
    /// Collection described.
    pub collection: TrackedCollection,
    /// Number of entries.
    pub len: usize,
    /// Oldest entry.
    pub head: Option<SampleRecord>,
    /// Newest entry.
    pub tail: Option<SampleRecord>,
}

/// Player state at capture time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// Position as `[x, y]`.
    pub position: [f32; 2],
    /// Velocity as `[x, y]`.
    pub velocity: [f32; 2],
    /// Hull points.
    pub health: f32,
    /// Shield points.
    pub shield: f32,
}

/// Diagnostic record persisted under the last-violation key.
///
/// Non-finite floats serialize as JSON `null`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticSnapshot {
    /// Human readable violation.
    pub message: String,
    /// Backtrace captured at the violation site.
    pub backtrace: String,
    /// Tick counter of the world.
    pub tick: u64,
    /// Run seed, when a run is active.
    pub run_seed: Option<u32>,
    /// Depth of the loaded zone.
    pub zone_index: Option<u32>,
    /// Theme of the loaded zone.
    pub theme: Option<BiomeId>,
    /// Hex SHA-256 fingerprint of the loaded zone.
    pub zone_fingerprint: Option<String>,
    /// Player state.
    pub player: PlayerRecord,
    /// Every tracked collection.
    pub collections: Vec<CollectionRecord>,
}

impl DiagnosticSnapshot {
    /// Captures the world state together with a forced backtrace.
    #[must_use]
    pub fn capture(world: &World, message: String) -> Self {
        let run = query::run(world);
        let zone = query::zone(world);
        let player = query::player(world);
        let collections = TrackedCollection::ALL
            .into_iter()
            .map(|collection| {
                let len = query::collection_len(world, collection);
                let sample = |index: usize| {
                    query::sample(world, collection, index).map(SampleRecord::from)
                };
                CollectionRecord {
                    collection,
                    len,
                    head: sample(0),
                    tail: len.checked_sub(1).and_then(sample),
                }
            })
            .collect();

        Self {
            message,
            backtrace: Backtrace::force_capture().to_string(),
            tick: query::tick_index(world),
            run_seed: run.map(|run| run.run_seed),
            zone_index: zone.map(|zone| zone.depth),
            theme: zone.map(|zone| zone.biome.clone()),
            zone_fingerprint: zone.map(fingerprint_hex),
            player: PlayerRecord {
                position: player.position.to_array(),
                velocity: player.velocity.to_array(),
                health: player.health,
                shield: player.shield,
            },
            collections,
        }
    }
}
