//! Injectable entropy sources.
//!
//! Seeding never reads a hidden process-wide generator: whatever supplies the
//! initial entropy is passed in explicitly, so the seed-mixing pool stays a
//! pure function of its inputs and tests can script every word.

use rand::RngCore;

/// Supplier of raw 32-bit entropy words.
///
/// Implementations must fill the whole slice on every call. They are only
/// consulted when a caller constructs a seed pool without explicit entropy.
pub trait EntropySource {
    /// Fill `dst` with entropy words.
    fn fill_words(&mut self, dst: &mut [u32]);
}

/// Operating-system entropy via [`rand::rngs::OsRng`].
///
/// This is the production default; tests substitute scripted sources.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill_words(&mut self, dst: &mut [u32]) {
        let mut os = rand::rngs::OsRng;
        for word in dst.iter_mut() {
            *word = os.next_u32();
        }
    }
}

impl<T: EntropySource + ?Sized> EntropySource for &mut T {
    fn fill_words(&mut self, dst: &mut [u32]) {
        (**self).fill_words(dst)
    }
}
