use std::hash::{Hash, Hasher};

use rand::prelude::*;
use rand_xorshift::XorShiftRng;

/// Construct a throwaway random number generator seeded by a noise value.
///
/// Good for short-term use in immutable contexts given a varying source of
/// noise like map position coordinates.
pub fn srng(seed: &(impl Hash + ?Sized)) -> XorShiftRng {
    let mut h = crate::FastHasher::default();
    seed.hash(&mut h);
    XorShiftRng::seed_from_u64(h.finish())
}

pub trait RngExt {
    fn one_chance_in(&mut self, n: usize) -> bool;

    /// Roll against a probability expressed in percent.
    fn percent_chance(&mut self, p: f64) -> bool;

    /// Insert a value at a uniformly random position of a vec.
    fn random_insert<T>(&mut self, vec: &mut Vec<T>, value: T);
}

impl<T: Rng + ?Sized> RngExt for T {
    fn one_chance_in(&mut self, n: usize) -> bool {
        if n == 0 {
            return false;
        }
        self.gen_range(0..n) == 0
    }

    fn percent_chance(&mut self, p: f64) -> bool {
        self.gen_range(0.0..100.0) < p
    }

    fn random_insert<U>(&mut self, vec: &mut Vec<U>, value: U) {
        let idx = self.gen_range(0..=vec.len());
        vec.insert(idx, value);
    }
}
