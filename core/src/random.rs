//! Seeded pseudo-random generation and seed derivation.
//!
//! Every quantity that must reproduce for a given run seed (zone layout, pack
//! composition, theme and boss rotation, modifier rolls) flows through
//! [`SeededRandom`]. The generator is mulberry32: a 32-bit state advanced with
//! wrapping unsigned arithmetic only, so sequences are bit-identical on every
//! platform. Floats are derived by dividing the raw output by 2^32.

use serde::{Deserialize, Serialize};

/// Multiplicative constant used when folding an index into a derived seed.
pub const GOLDEN_RATIO_32: u32 = 0x9E37_79B9;

/// Salt separating per-act (theme) seeds from other derivations.
pub const ACT_SEED_SALT: u32 = 0xA5C3_0F17;
/// Salt separating per-zone seeds from other derivations.
pub const ZONE_SEED_SALT: u32 = 0x3B9A_CA07;
/// Salt used when rolling the theme for a block of consecutive depths.
pub const THEME_BLOCK_SALT: u32 = 0x7E1A_B10C;
/// Salt used when rolling the boss guarding a boss depth.
pub const BOSS_ROLL_SALT: u32 = 0xB055_F00D;
/// Salt used when sampling the modifiers active in a zone.
pub const MODIFIER_SALT: u32 = 0x0D1F_FE75;

const MULBERRY_INCREMENT: u32 = 0x6D2B_79F5;
const TWO_POW_32: f64 = 4_294_967_296.0;

const FNV_OFFSET_BASIS: u32 = 0x811C_9DC5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Derives a child seed from `parent`, a derivation `salt` and an `index`.
///
/// Computes `(parent ^ salt) + index * 0x9E3779B9` in wrapping 32-bit
/// arithmetic.
#[must_use]
pub const fn derive_seed(parent: u32, salt: u32, index: u32) -> u32 {
    (parent ^ salt).wrapping_add(index.wrapping_mul(GOLDEN_RATIO_32))
}

/// Maps a textual label (such as a theme id) onto a seed using 32-bit FNV-1a.
#[must_use]
pub fn label_seed(label: &str) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in label.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Deterministic 32-bit pseudo-random generator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeededRandom {
    state: u32,
}

impl SeededRandom {
    /// Creates a generator whose sequence is fully determined by `seed`.
    #[must_use]
    pub const fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Returns the raw internal state.
    #[must_use]
    pub const fn state(&self) -> u32 {
        self.state
    }

    /// Advances the generator and returns the next raw 32-bit output.
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(MULBERRY_INCREMENT);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    /// Returns a float in `[0, 1)`.
    pub fn next_float(&mut self) -> f64 {
        f64::from(self.next_u32()) / TWO_POW_32
    }

    /// Returns a float between `min` and `max`.
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        let unit = self.next_float();
        (f64::from(min) + (f64::from(max) - f64::from(min)) * unit) as f32
    }

    /// Returns an integer in `[min, max]`. Returns `min` when `max <= min`.
    pub fn int(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            // keep the stream aligned regardless of the degenerate range
            let _ = self.next_u32();
            return min;
        }
        let span = i64::from(max) - i64::from(min) + 1;
        let offset = (self.next_float() * span as f64).floor() as i64;
        (i64::from(min) + offset.min(span - 1)) as i32
    }

    /// Returns a uniformly chosen element, or `None` for an empty slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let last = i32::try_from(items.len() - 1).unwrap_or(i32::MAX);
        let index = usize::try_from(self.int(0, last)).unwrap_or(0);
        items.get(index)
    }

    /// Returns `true` with probability `p`.
    pub fn chance(&mut self, p: f32) -> bool {
        self.next_float() < f64::from(p)
    }

    /// Chooses an index with probability proportional to its weight.
    ///
    /// Non-positive and non-finite weights never win. Returns `None` when no
    /// weight is eligible.
    pub fn weighted_index(&mut self, weights: &[f32]) -> Option<usize> {
        let eligible = |weight: f32| weight.is_finite() && weight > 0.0;
        let total: f64 = weights
            .iter()
            .copied()
            .filter(|weight| eligible(*weight))
            .map(f64::from)
            .sum();
        if total <= 0.0 {
            return None;
        }

        let mut roll = self.next_float() * total;
        let mut last_eligible = None;
        for (index, weight) in weights.iter().copied().enumerate() {
            if !eligible(weight) {
                continue;
            }
            last_eligible = Some(index);
            roll -= f64::from(weight);
            if roll < 0.0 {
                return Some(index);
            }
        }
        last_eligible
    }

    /// Shuffles `items` in place with a Fisher-Yates pass driven by this generator.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let upper = i32::try_from(i).unwrap_or(i32::MAX);
            let j = usize::try_from(self.int(0, upper)).unwrap_or(0);
            items.swap(i, j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_matches_reference_values() {
        let mut rng = SeededRandom::new(42);
        let values: Vec<u32> = (0..4).map(|_| rng.next_u32()).collect();
        assert_eq!(values, REFERENCE_SEED_42);
    }

    const REFERENCE_SEED_42: [u32; 4] = [2_581_720_956, 1_925_393_290, 3_661_312_704, 2_876_485_805];

    #[test]
    fn identical_seeds_produce_identical_sequences() {
        let mut first = SeededRandom::new(0xDEAD_BEEF);
        let mut second = SeededRandom::new(0xDEAD_BEEF);
        for _ in 0..1_000 {
            assert_eq!(first.next_u32(), second.next_u32());
        }
    }

    #[test]
    fn derived_seeds_wrap_without_sign_extension() {
        assert_eq!(derive_seed(0, 0, 1), GOLDEN_RATIO_32);
        assert_eq!(derive_seed(u32::MAX, 0, 2), 0x3C6E_F371);
        assert_eq!(derive_seed(0xFFFF_0000, 0x0000_FFFF, 0), u32::MAX);
    }

    #[test]
    fn label_seed_matches_fnv1a() {
        assert_eq!(label_seed(""), FNV_OFFSET_BASIS);
        assert_eq!(label_seed("a"), 0xE40C_292C);
        assert_ne!(label_seed("void"), label_seed("nebula"));
    }

    #[test]
    fn floats_stay_in_unit_interval() {
        let mut rng = SeededRandom::new(7);
        for _ in 0..10_000 {
            let value = rng.next_float();
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn int_is_inclusive_on_both_ends() {
        let mut rng = SeededRandom::new(99);
        let mut seen = [false; 4];
        for _ in 0..2_000 {
            let value = rng.int(2, 5);
            assert!((2..=5).contains(&value));
            seen[(value - 2) as usize] = true;
        }
        assert!(seen.iter().all(|hit| *hit));
        assert_eq!(rng.int(3, 3), 3);
        assert_eq!(rng.int(9, 1), 9);
    }

    #[test]
    fn weighted_index_skips_zero_weights() {
        let mut rng = SeededRandom::new(1);
        for _ in 0..500 {
            let index = rng.weighted_index(&[0.0, 2.0, f32::NAN, 1.0]);
            assert!(matches!(index, Some(1) | Some(3)));
        }
        assert_eq!(rng.weighted_index(&[0.0, -1.0]), None);
    }

    #[test]
    fn shuffle_preserves_elements() {
        let mut rng = SeededRandom::new(5);
        let mut items: Vec<u32> = (0..32).collect();
        rng.shuffle(&mut items);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..32).collect::<Vec<_>>());
    }

    #[test]
    fn pick_handles_empty_slices() {
        let mut rng = SeededRandom::new(5);
        let empty: [u8; 0] = [];
        assert!(rng.pick(&empty).is_none());
        assert_eq!(rng.pick(&[11]), Some(&11));
    }
}
