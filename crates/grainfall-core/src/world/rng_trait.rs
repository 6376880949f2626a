//! Randomness seam for the simulation
//!
//! Movement direction picks, interaction rolls and organism decisions all draw
//! from a [`WorldRng`]. The world owns a seeded generator; tests substitute a
//! scripted one to force a particular branch.

/// Source of the simulation's random decisions
pub trait WorldRng {
    /// Fair coin flip
    fn gen_bool(&mut self) -> bool;

    /// Uniform in `[0.0, 1.0)`
    fn gen_f32(&mut self) -> f32;

    /// True with the given probability; `<= 0` never, `>= 1` always
    fn check_probability(&mut self, probability: f32) -> bool {
        self.gen_f32() < probability
    }

    /// -1 or 1 with equal probability
    fn gen_sign(&mut self) -> i32 {
        if self.gen_bool() { -1 } else { 1 }
    }

    /// Uniform integer in `[low, high)`; returns `low` for empty ranges
    fn gen_range_i32(&mut self, low: i32, high: i32) -> i32 {
        if high <= low {
            return low;
        }
        let span = (high - low) as f32;
        (low + (self.gen_f32() * span) as i32).min(high - 1)
    }
}

// Seeded Xoshiro generators and thread_rng() both come in through rand::Rng
impl<T: ?Sized + rand::Rng> WorldRng for T {
    fn gen_bool(&mut self) -> bool {
        rand::Rng::r#gen(self)
    }

    fn gen_f32(&mut self) -> f32 {
        rand::Rng::r#gen(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;

    /// Replays a fixed list of draws
    struct Scripted {
        bools: Vec<bool>,
        floats: Vec<f32>,
    }

    impl Scripted {
        fn floats(floats: &[f32]) -> Self {
            Self {
                bools: Vec::new(),
                floats: floats.iter().rev().copied().collect(),
            }
        }

        fn bools(bools: &[bool]) -> Self {
            Self {
                bools: bools.iter().rev().copied().collect(),
                floats: Vec::new(),
            }
        }
    }

    impl WorldRng for Scripted {
        fn gen_bool(&mut self) -> bool {
            self.bools.pop().expect("script ran out of bools")
        }

        fn gen_f32(&mut self) -> f32 {
            self.floats.pop().expect("script ran out of floats")
        }
    }

    #[test]
    fn test_gen_range_i32_maps_unit_interval_onto_range() {
        let mut rng = Scripted::floats(&[0.0, 0.5, 0.999_999, 0.25]);

        assert_eq!(rng.gen_range_i32(-3, 5), -3);
        assert_eq!(rng.gen_range_i32(-3, 5), 1);
        // Top of the unit interval stays below `high`
        assert_eq!(rng.gen_range_i32(-3, 5), 4);
        assert_eq!(rng.gen_range_i32(10, 14), 11);
    }

    #[test]
    fn test_gen_range_i32_empty_range_draws_nothing() {
        // An empty script panics if anything is drawn
        let mut rng = Scripted::floats(&[]);

        assert_eq!(rng.gen_range_i32(4, 4), 4);
        assert_eq!(rng.gen_range_i32(9, 2), 9);
    }

    #[test]
    fn test_gen_sign_follows_coin() {
        let mut rng = Scripted::bools(&[true, false, false]);

        assert_eq!(rng.gen_sign(), -1);
        assert_eq!(rng.gen_sign(), 1);
        assert_eq!(rng.gen_sign(), 1);
    }

    #[test]
    fn test_check_probability_is_strict() {
        let mut rng = Scripted::floats(&[0.3, 0.299, 0.0, 0.999]);

        assert!(!rng.check_probability(0.3));
        assert!(rng.check_probability(0.3));
        assert!(!rng.check_probability(0.0));
        assert!(rng.check_probability(1.0));
    }

    #[test]
    fn test_seeded_gen_sign_is_balanced() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(5);
        let sum: i32 = (0..10_000).map(|_| rng.gen_sign()).sum();

        // ~4.5 standard deviations
        assert!(sum.abs() < 450, "sign sum {}", sum);
    }

    #[test]
    fn test_seeded_gen_range_i32_is_roughly_uniform() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(6);
        let mut counts = [0u32; 6];

        for _ in 0..12_000 {
            let v = rng.gen_range_i32(-2, 4);
            counts[(v + 2) as usize] += 1;
        }

        for (i, &count) in counts.iter().enumerate() {
            assert!((1_800..2_200).contains(&count), "value {}: {}", i as i32 - 2, count);
        }
    }

    #[test]
    fn test_thread_rng_is_a_world_rng() {
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            assert!((0..3).contains(&rng.gen_range_i32(0, 3)));
        }
    }
}
