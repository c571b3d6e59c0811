//! Delivery-time randomness for simulation runs.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of the minute offset applied to a route's base time.
pub trait DeliveryJitter: Send {
    fn offset_minutes(&mut self) -> i32;
}

/// Uniform offset in `[-spread, +spread]` minutes.
pub struct UniformJitter {
    rng: StdRng,
    spread: i32,
}

impl UniformJitter {
    pub fn new(spread_minutes: u32) -> Self {
        Self::with_rng(StdRng::from_entropy(), spread_minutes)
    }

    pub fn seeded(seed: u64, spread_minutes: u32) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), spread_minutes)
    }

    fn with_rng(rng: StdRng, spread_minutes: u32) -> Self {
        Self {
            rng,
            spread: spread_minutes.min(i32::MAX as u32) as i32,
        }
    }
}

impl DeliveryJitter for UniformJitter {
    fn offset_minutes(&mut self) -> i32 {
        self.rng.gen_range(-self.spread..=self.spread)
    }
}

/// Always returns the same offset.
#[derive(Debug, Clone, Copy)]
pub struct FixedJitter(pub i32);

impl DeliveryJitter for FixedJitter {
    fn offset_minutes(&mut self) -> i32 {
        self.0
    }
}

/// Replays offsets in order, then repeats the last one.
#[derive(Debug, Clone)]
pub struct SequenceJitter {
    offsets: Vec<i32>,
    next: usize,
}

impl SequenceJitter {
    pub fn new(offsets: Vec<i32>) -> Self {
        Self { offsets, next: 0 }
    }
}

impl DeliveryJitter for SequenceJitter {
    fn offset_minutes(&mut self) -> i32 {
        let value = self
            .offsets
            .get(self.next)
            .or_else(|| self.offsets.last())
            .copied()
            .unwrap_or(0);
        self.next += 1;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_stays_within_spread() {
        let mut jitter = UniformJitter::seeded(7, 5);
        for _ in 0..1_000 {
            let offset = jitter.offset_minutes();
            assert!((-5..=5).contains(&offset), "offset {} out of range", offset);
        }
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let mut a = UniformJitter::seeded(42, 5);
        let mut b = UniformJitter::seeded(42, 5);
        let left: Vec<i32> = (0..20).map(|_| a.offset_minutes()).collect();
        let right: Vec<i32> = (0..20).map(|_| b.offset_minutes()).collect();
        assert_eq!(left, right);
    }

    #[test]
    fn test_zero_spread_is_exact() {
        let mut jitter = UniformJitter::seeded(1, 0);
        assert_eq!(jitter.offset_minutes(), 0);
    }

    #[test]
    fn test_sequence_repeats_last() {
        let mut jitter = SequenceJitter::new(vec![3, 12]);
        assert_eq!(jitter.offset_minutes(), 3);
        assert_eq!(jitter.offset_minutes(), 12);
        assert_eq!(jitter.offset_minutes(), 12);
        assert_eq!(SequenceJitter::new(Vec::new()).offset_minutes(), 0);
    }
}
