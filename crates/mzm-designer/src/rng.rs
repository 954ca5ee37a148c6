//! A tiny xorshift64 generator seeded from system time. The designer's `R`
//! (randomise level) key needs nothing but "looks scrambled" — no statistical
//! distributions — so pulling in `rand` for it would be overkill (see
//! `DESIGN.md`'s dependency-stack decisions).

use std::time::{SystemTime, UNIX_EPOCH};

pub struct Xorshift64(u64);

impl Xorshift64 {
    pub fn seeded_from_time() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0x9E3779B97F4A7C15);
        Xorshift64(nanos | 1)
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    /// Draws `true` with roughly `percent` out of 100 probability.
    pub fn next_bool(&mut self, percent: u64) -> bool {
        self.next_u64() % 100 < percent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successive_draws_are_not_all_identical() {
        let mut rng = Xorshift64(0x1234_5678_9abc_def1);
        let draws: Vec<bool> = (0..20).map(|_| rng.next_bool(50)).collect();
        assert!(draws.iter().any(|&b| b) && draws.iter().any(|&b| !b));
    }
}
