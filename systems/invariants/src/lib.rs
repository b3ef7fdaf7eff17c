#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Runtime guard that keeps the world within its numeric and size bounds.
//!
//! The guard runs around every tick. [`InvariantGuard::pre_tick`] rejects a
//! tick whose inputs are already corrupt, before anything is mutated.
//! [`InvariantGuard::post_tick`] trims over-cap collections oldest first, then
//! asserts that the player and a bounded sample of every collection are
//! finite. Each violation is captured as a [`DiagnosticSnapshot`], logged and
//! stored in a [`DiagnosticSink`] before the error is returned.

mod sink;
mod snapshot;

use std::collections::BTreeSet;

use deepfield_core::{glam::Vec2, Command, EntityCaps, Event, TrackedCollection};
use deepfield_world::{apply, query, World};
use thiserror::Error;

pub use sink::{DiagnosticSink, FileSink, MemorySink, SinkError};
pub use snapshot::{CollectionRecord, DiagnosticSnapshot, PlayerRecord, SampleRecord};

/// Key under which the most recent violation snapshot is stored.
pub const LAST_VIOLATION_KEY: &str = "deepfield_last_invariant_violation";

/// Interior samples taken per collection when sampling partially.
pub const DEFAULT_INTERIOR_SAMPLES: usize = 6;

/// Fail-fast numeric invariant violations.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum InvariantViolation {
    /// A value that must be finite was NaN or infinite.
    #[error("non-finite {label} ({value}) at {context}")]
    NonFinite {
        /// Quantity that failed.
        label: &'static str,
        /// Offending value.
        value: f32,
        /// Where the value was found.
        context: String,
    },
    /// The tick delta was negative.
    #[error("tick delta must not be negative, got {value}")]
    NegativeDelta {
        /// Offending delta.
        value: f32,
    },
}

/// Which collection entries the post-tick finiteness check visits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SamplingMode {
    /// First, last and `interior` evenly spaced entries of each collection.
    Partial {
        /// Interior entries sampled between the head and the tail.
        interior: usize,
    },
    /// Every entry.
    Exhaustive,
}

impl Default for SamplingMode {
    fn default() -> Self {
        Self::Partial {
            interior: DEFAULT_INTERIOR_SAMPLES,
        }
    }
}

impl SamplingMode {
    /// Indices visited for a collection of `len` entries, ascending.
    #[must_use]
    pub fn indices(self, len: usize) -> Vec<usize> {
        match self {
            Self::Exhaustive => (0..len).collect(),
            Self::Partial { .. } if len == 0 => Vec::new(),
            Self::Partial { interior } => {
                let last = len - 1;
                let mut picked = BTreeSet::from([0, last]);
                for slot in 1..=interior {
                    let _ = picked.insert(slot * last / (interior + 1));
                }
                picked.into_iter().collect()
            }
        }
    }
}

fn finite(label: &'static str, value: f32, context: impl FnOnce() -> String) -> Result<(), InvariantViolation> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(InvariantViolation::NonFinite {
            label,
            value,
            context: context(),
        })
    }
}

fn finite_vec(label: &'static str, value: Vec2, context: impl Fn() -> String) -> Result<(), InvariantViolation> {
    finite(label, value.x, &context)?;
    finite(label, value.y, &context)
}

/// Enforces entity caps and numeric sanity around each tick.
#[derive(Debug)]
pub struct InvariantGuard {
    caps: EntityCaps,
    sampling: SamplingMode,
    sink: Box<dyn DiagnosticSink>,
    violations: u64,
}

impl InvariantGuard {
    /// Creates a guard enforcing `caps` that stores snapshots in `sink`.
    #[must_use]
    pub fn new(caps: EntityCaps, sink: Box<dyn DiagnosticSink>) -> Self {
        Self {
            caps,
            sampling: SamplingMode::default(),
            sink,
            violations: 0,
        }
    }

    /// Replaces the sampling mode used by [`Self::post_tick`].
    #[must_use]
    pub fn with_sampling(mut self, sampling: SamplingMode) -> Self {
        self.sampling = sampling;
        self
    }

    /// Caps currently enforced.
    #[must_use]
    pub fn caps(&self) -> &EntityCaps {
        &self.caps
    }

    /// Violations reported since the guard was created.
    #[must_use]
    pub fn violations(&self) -> u64 {
        self.violations
    }

    /// Snapshot stored by the most recent violation, as raw JSON.
    pub fn last_violation(&self) -> Result<Option<serde_json::Value>, SinkError> {
        self.sink
            .load(LAST_VIOLATION_KEY)?
            .map(|payload| serde_json::from_str(&payload))
            .transpose()
            .map_err(SinkError::from)
    }

    /// Validates the tick inputs. Nothing is mutated.
    pub fn pre_tick(&mut self, world: &World, dt: f32) -> Result<(), InvariantViolation> {
        let checked = finite("dt", dt, || String::from("tick delta"))
            .and_then(|()| {
                if dt < 0.0 {
                    Err(InvariantViolation::NegativeDelta { value: dt })
                } else {
                    Ok(())
                }
            })
            .and_then(|()| check_player(world, "pre-tick"));
        self.report(world, checked)
    }

    /// Trims over-cap collections, then checks the player and sampled entities.
    pub fn post_tick(
        &mut self,
        world: &mut World,
        out_events: &mut Vec<Event>,
    ) -> Result<(), InvariantViolation> {
        for collection in TrackedCollection::ALL {
            let len = query::collection_len(world, collection);
            let cap = self.caps.cap(collection);
            if len > cap {
                let count = len - cap;
                tracing::warn!(%collection, len, cap, removed = count, "collection over cap, trimming oldest");
                apply(world, Command::TrimOldest { collection, count }, out_events);
            }
        }

        let checked = check_player(world, "post-tick").and_then(|()| self.check_samples(world));
        self.report(world, checked)
    }

    fn check_samples(&self, world: &World) -> Result<(), InvariantViolation> {
        for collection in TrackedCollection::ALL {
            let len = query::collection_len(world, collection);
            for index in self.sampling.indices(len) {
                let Some(sample) = query::sample(world, collection, index) else {
                    continue;
                };
                let context = || format!("{collection}[{index}] id {}", sample.id);
                finite_vec("position", sample.position, context)?;
                finite_vec("velocity", sample.velocity, context)?;
                finite("health", sample.health, context)?;
            }
        }
        Ok(())
    }

    fn report(
        &mut self,
        world: &World,
        checked: Result<(), InvariantViolation>,
    ) -> Result<(), InvariantViolation> {
        let Err(violation) = checked else {
            return Ok(());
        };
        self.violations += 1;
        let snapshot = DiagnosticSnapshot::capture(world, violation.to_string());
        tracing::error!(
            %violation,
            tick = snapshot.tick,
            run_seed = ?snapshot.run_seed,
            zone = ?snapshot.zone_index,
            "invariant violated"
        );
        let stored = serde_json::to_string_pretty(&snapshot)
            .map_err(SinkError::from)
            .and_then(|payload| self.sink.store(LAST_VIOLATION_KEY, &payload));
        if let Err(error) = stored {
            tracing::warn!(%error, "failed to persist diagnostic snapshot");
        }
        Err(violation)
    }
}

fn check_player(world: &World, phase: &'static str) -> Result<(), InvariantViolation> {
    let player = query::player(world);
    let context = || format!("player ({phase})");
    finite_vec("player position", player.position, context)?;
    finite_vec("player velocity", player.velocity, context)?;
    finite("player health", player.health, context)?;
    finite("player shield", player.shield, context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_sampling_includes_head_and_tail() {
        let mode = SamplingMode::Partial { interior: 3 };
        assert_eq!(mode.indices(0), Vec::<usize>::new());
        assert_eq!(mode.indices(1), vec![0]);
        assert_eq!(mode.indices(2), vec![0, 1]);
        assert_eq!(mode.indices(9), vec![0, 2, 4, 6, 8]);
        assert_eq!(mode.indices(1_000).len(), 5);
    }

    #[test]
    fn exhaustive_sampling_visits_everything() {
        assert_eq!(SamplingMode::Exhaustive.indices(4), vec![0, 1, 2, 3]);
    }

    #[test]
    fn violations_render_their_context() {
        let violation = InvariantViolation::NonFinite {
            label: "position",
            value: f32::NAN,
            context: String::from("bullets[3] id 7"),
        };
        assert_eq!(violation.to_string(), "non-finite position (NaN) at bullets[3] id 7");
    }
}
