//! Seeded random streams.
//!
//! Every stream is a `StdRng` seeded from a `u64`. Child streams are keyed
//! either by an index or by a label (a sample or category name) and their
//! seeds come from SipHash-1-3 with zero keys, so they do not depend on the
//! platform or on the order in which streams are created.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use siphasher::sip::SipHasher13;
use std::hash::Hasher;

/// Seeded random stream used for toy sampling and synthetic tables.
#[derive(Debug, Clone)]
pub struct RngHandle {
    seed: u64,
    rng: StdRng,
}

impl RngHandle {
    /// Stream seeded directly with `seed`.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Child stream `index` of `master`.
    pub fn substream(master: u64, index: u64) -> Self {
        Self::from_seed(derive_substream_seed(master, index))
    }

    /// Child stream of `master` keyed by a name.
    pub fn labelled(master: u64, label: &str) -> Self {
        Self::from_seed(derive_label_seed(master, label))
    }

    /// Child stream of this handle's seed keyed by a name.
    ///
    /// The parent's position is not consumed, so forks taken at any point
    /// yield the same sequence.
    pub fn fork(&self, label: &str) -> Self {
        Self::labelled(self.seed, label)
    }

    /// Seed this stream was created from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Underlying generator.
    pub fn inner_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

impl RngCore for RngHandle {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.rng.try_fill_bytes(dest)
    }
}

/// Seed of child stream `index` of `master`.
pub fn derive_substream_seed(master: u64, index: u64) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(0, 0);
    hasher.write_u64(master);
    hasher.write_u64(index);
    hasher.finish()
}

/// Seed of the child stream of `master` named `label`.
pub fn derive_label_seed(master: u64, label: &str) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(0, 0);
    hasher.write_u64(master);
    // length prefix keeps ("ab", "c") apart from ("a", "bc") when chained
    hasher.write_usize(label.len());
    hasher.write(label.as_bytes());
    hasher.finish()
}
