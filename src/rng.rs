use rand::{Rng as _, SeedableRng};
use rand_pcg::Pcg32;

/// Deterministic random stream for generation and decoration.
///
/// Backed by PCG-32, a published, versioned algorithm, so a seed reproduces
/// the same stream regardless of `rand` upgrades. Any sub-system needing an
/// independent reproducible stream (level layout, backdrop stars) constructs
/// its own `GameRng` from its own seed.
pub struct GameRng(Pcg32);

impl GameRng {
    pub fn new(seed: u64) -> Self {
        Self(Pcg32::seed_from_u64(seed))
    }

    /// Uniform float in [0, 1).
    pub fn float(&mut self) -> f32 {
        self.0.gen()
    }

    /// Uniform float in [min, max).
    pub fn range_f32(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        min + (max - min) * self.float()
    }

    pub fn range(&mut self, min: u32, max: u32) -> u32 {
        if max <= min {
            return min;
        }
        self.0.gen_range(min..max)
    }

    pub fn chance(&mut self, p: f32) -> bool {
        self.float() < p
    }
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
