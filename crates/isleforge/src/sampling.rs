//! Random sampling helpers shared by terrain generation and population control.
//!
//! Every consumer takes a `&mut dyn RngCore` so callers decide on the generator
//! (seeded [`rand::rngs::StdRng`] for reproducible worlds, stub generators in tests).
use glam::Vec2;
use rand::Rng as RngCore;

/// Generate a random float in the range [0, 1).
#[inline]
pub fn rand01(rng: &mut dyn RngCore) -> f32 {
    (rng.next_u32() as f32) / ((u32::MAX as f32) + 1.0)
}

/// Random float in `[min, max]`. Reversed bounds are accepted and sampled as given.
#[inline]
pub fn range_f32(rng: &mut dyn RngCore, min: f32, max: f32) -> f32 {
    min + (max - min) * rand01(rng)
}

/// Random integer in `[min, max)`. Returns `min` when the range is empty.
pub fn range_i32(rng: &mut dyn RngCore, min: i32, max: i32) -> i32 {
    if max <= min {
        return min;
    }
    let span = (max as i64 - min as i64) as f64;
    let offset = ((rng.next_u32() as f64 / (u32::MAX as f64 + 1.0)) * span).floor() as i64;
    (min as i64 + offset).min(max as i64 - 1) as i32
}

/// Random index in `[0, len)`. `len` must be non-zero.
pub fn index(rng: &mut dyn RngCore, len: usize) -> usize {
    debug_assert!(len > 0, "index requires a non-empty range");
    let i = (rand01(rng) * len as f32) as usize;
    i.min(len - 1)
}

/// Uniform point inside the unit disc.
pub fn inside_unit_circle(rng: &mut dyn RngCore) -> Vec2 {
    let r = rand01(rng).sqrt();
    let theta = rand01(rng) * std::f32::consts::TAU;
    Vec2::new(r * theta.cos(), r * theta.sin())
}

#[cfg(test)]
pub(crate) mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    /// Stub generator returning the same word forever.
    pub(crate) struct FixedRng {
        pub(crate) value: u32,
    }

    impl rand::TryRng for FixedRng {
        type Error = core::convert::Infallible;

        fn try_next_u32(&mut self) -> Result<u32, Self::Error> {
            Ok(self.value)
        }

        fn try_next_u64(&mut self) -> Result<u64, Self::Error> {
            Ok(self.value as u64)
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Self::Error> {
            let bytes = self.value.to_le_bytes();
            for (i, b) in dest.iter_mut().enumerate() {
                *b = bytes[i % 4];
            }
            Ok(())
        }
    }

    #[test]
    fn rand01_stays_below_one() {
        let mut rng = FixedRng { value: u32::MAX };
        let r = rand01(&mut rng);
        assert!(r <= 1.0);
        let mut rng = FixedRng { value: 0 };
        assert_eq!(rand01(&mut rng), 0.0);
    }

    #[test]
    fn range_i32_is_half_open() {
        let mut rng = FixedRng { value: u32::MAX };
        assert_eq!(range_i32(&mut rng, -1000, 1000), 999);
        let mut rng = FixedRng { value: 0 };
        assert_eq!(range_i32(&mut rng, -1000, 1000), -1000);
        assert_eq!(range_i32(&mut rng, 5, 5), 5);
    }

    #[test]
    fn index_never_reaches_len() {
        let mut rng = FixedRng { value: u32::MAX };
        assert_eq!(index(&mut rng, 3), 2);
    }

    #[test]
    fn unit_circle_points_stay_inside() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..256 {
            assert!(inside_unit_circle(&mut rng).length() <= 1.0 + 1e-6);
        }
    }
}
