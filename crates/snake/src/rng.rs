//! Deterministic per-effect random numbers.
//!
//! Every effect derives its own generator from the inputs that identify it
//! (position, game time, counters). Nothing here holds state between calls,
//! so replaying a frame with the same inputs reproduces the same effect.

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Effect tags keep generators for different effects at the same place and
/// time apart.
pub mod tags {
    pub const WORM_PACK: u64 = 0x5701;
    pub const AIR_SUPPORT: u64 = 0x5703;
    pub const EXPLODERS: u64 = 0x5704;
    pub const EXPLODER_STEP: u64 = 0x5705;
    pub const IGNITE: u64 = 0x5706;
    pub const GATLING: u64 = 0x5707;
    pub const GHOST_WANDER: u64 = 0x5708;
    pub const AUTOPILOT: u64 = 0x5709;
}

/// Seed accumulator. Each `with_*` call folds one more input in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectSeed(u64);

impl EffectSeed {
    pub fn new(tag: u64) -> Self {
        Self(splitmix64(tag ^ 0x9E37_79B9_7F4A_7C15))
    }

    #[inline]
    pub fn with_u64(self, value: u64) -> Self {
        Self(splitmix64(self.0 ^ value.wrapping_mul(0xBF58_476D_1CE4_E5B9)))
    }

    #[inline]
    pub fn with_f32(self, value: f32) -> Self {
        self.with_u64(u64::from(value.to_bits()))
    }

    #[inline]
    pub fn with_pos(self, pos: Vec2) -> Self {
        self.with_f32(pos.x).with_f32(pos.y)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    /// Fresh generator for this seed.
    pub fn rng(self) -> StdRng {
        StdRng::seed_from_u64(self.0)
    }

    /// One-shot Bernoulli draw.
    pub fn chance(self, probability: f32) -> bool {
        if probability <= 0.0 {
            return false;
        }
        if probability >= 1.0 {
            return true;
        }
        self.rng().random::<f32>() < probability
    }
}

/// Convenience for the common (tag, position, time, id) seed.
pub fn effect_rng(tag: u64, pos: Vec2, time: f32, id: u64) -> StdRng {
    EffectSeed::new(tag).with_pos(pos).with_f32(time).with_u64(id).rng()
}

/// Uniform random unit vector.
pub fn random_direction(rng: &mut impl Rng) -> Vec2 {
    let angle = rng.random_range(0.0..std::f32::consts::TAU);
    Vec2::new(angle.cos(), angle.sin())
}

#[inline]
fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
