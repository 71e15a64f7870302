//! Seed-mixing entropy pool.
//!
//! [`SeedSequence`] condenses arbitrary entropy words into a fixed pool via
//! multiplicative hashing and an all-pairs diffusion pass, then hands out an
//! unbounded stream of well-mixed 32-bit words for seeding engine state.
//!
//! Unlike NumPy's `SeedSequence`, the pool is never re-hashed between
//! generate calls: the cursor and hash constant simply keep evolving. Two
//! ranges filled from one instance therefore continue a single stream. To
//! reproduce NumPy's per-block behaviour, build a fresh instance per block;
//! seeding an engine is a one-shot use anyway.

use randstate_core::EntropySource;

const INIT_A: u32 = 0x43b0_d7e5;
const MULT_A: u32 = 0x931e_8875;
const INIT_B: u32 = 0x8b51_f9dd;
const MULT_B: u32 = 0x58f3_8ded;
const MIX_MULT_L: u32 = 0xca01_f9dd;
const MIX_MULT_R: u32 = 0x4973_f715;
const XSHIFT: u32 = 16;

/// Pool size used by the plain constructors, in 32-bit words.
pub const DEFAULT_POOL_SIZE: usize = 4;

fn hashmix(mut value: u32, hash_const: &mut u32) -> u32 {
    value ^= *hash_const;
    *hash_const = hash_const.wrapping_mul(MULT_A);
    value = value.wrapping_mul(*hash_const);
    value ^= value >> XSHIFT;
    value
}

fn mix(x: u32, y: u32) -> u32 {
    let result = MIX_MULT_L
        .wrapping_mul(x)
        .wrapping_sub(MIX_MULT_R.wrapping_mul(y));
    result ^ (result >> XSHIFT)
}

/// Entropy-mixing pool yielding an unbounded stream of seed words.
///
/// Construction runs the mixing pass exactly once; afterwards the pool is
/// only read and rewritten word-by-word by the output hash.
#[derive(Debug, Clone)]
pub struct SeedSequence {
    pool: Vec<u32>,
    cursor: usize,
    hash_const: u32,
}

impl SeedSequence {
    /// Smallest word the stream can yield.
    pub const MIN_WORD: u32 = u32::MIN;
    /// Largest word the stream can yield.
    pub const MAX_WORD: u32 = u32::MAX;

    /// Build from explicit entropy words with the default pool size.
    pub fn from_entropy(entropy: &[u32]) -> Self {
        Self::from_entropy_with_pool(entropy, DEFAULT_POOL_SIZE)
    }

    /// Build from explicit entropy words with a caller-chosen pool size.
    pub fn from_entropy_with_pool(entropy: &[u32], pool_size: usize) -> Self {
        Self {
            pool: mix_entropy(pool_size, entropy),
            cursor: 0,
            hash_const: INIT_B,
        }
    }

    /// Build from one 64-bit seed, split big-half-first into two words.
    pub fn from_seed(seed: u64) -> Self {
        Self::from_entropy(&[(seed >> 32) as u32, seed as u32])
    }

    /// Build from one 32-bit seed.
    pub fn from_seed_u32(seed: u32) -> Self {
        Self::from_entropy(&[seed])
    }

    /// Build by drawing one pool's worth of words from `source`.
    pub fn from_source<T: EntropySource + ?Sized>(source: &mut T) -> Self {
        Self::from_source_with_pool(source, DEFAULT_POOL_SIZE)
    }

    /// Build from `source` with a caller-chosen pool size.
    pub fn from_source_with_pool<T: EntropySource + ?Sized>(
        source: &mut T,
        pool_size: usize,
    ) -> Self {
        let mut entropy = vec![0u32; pool_size];
        source.fill_words(&mut entropy);
        Self::from_entropy_with_pool(&entropy, pool_size)
    }

    /// One 32-bit word: hash the word under the cursor and advance.
    ///
    /// The hash constant evolves with every call, so the stream does not
    /// repeat when the cursor wraps.
    pub fn next_word(&mut self) -> u32 {
        let mut hash_const = self.hash_const;
        let mut state = self.pool[self.cursor];
        state ^= hash_const;
        hash_const = hash_const.wrapping_mul(MULT_B);
        state = state.wrapping_mul(hash_const);
        state ^= state >> XSHIFT;

        self.cursor += 1;
        if self.cursor >= self.pool.len() {
            self.cursor = 0;
        }
        self.hash_const = hash_const;
        state
    }

    /// One 64-bit value from two words, first word in the high half.
    pub fn next_u64(&mut self) -> u64 {
        let hi = self.next_word();
        let lo = self.next_word();
        (u64::from(hi) << 32) | u64::from(lo)
    }

    /// Fill `dest` with seed material at `T`'s width.
    ///
    /// Lanes narrower than a word split each word low lane first and then
    /// reverse the whole destination, so the bytes read the same on every
    /// endianness. 64-bit lanes pack two words first-word-low, which is the
    /// opposite order from [`next_u64`]; both orders are kept as the
    /// reference defines them.
    pub fn generate_into<T: SeedLane>(&mut self, dest: &mut [T]) {
        T::fill(self, dest);
    }
}

impl rand::RngCore for SeedSequence {
    fn next_u32(&mut self) -> u32 {
        self.next_word()
    }

    fn next_u64(&mut self) -> u64 {
        SeedSequence::next_u64(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        rand_core::impls::fill_bytes_via_next(self, dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

fn mix_entropy(pool_size: usize, entropy: &[u32]) -> Vec<u32> {
    let mut hash_const = INIT_A;
    let mut pool = vec![0u32; pool_size];

    // Hash the entropy into the pool, zero-padded past its length.
    for (i, slot) in pool.iter_mut().enumerate() {
        let word = entropy.get(i).copied().unwrap_or(0);
        *slot = hashmix(word, &mut hash_const);
    }

    // All-pairs diffusion so every pool word depends on every other.
    for i_src in 0..pool_size {
        for i_dst in 0..pool_size {
            if i_src != i_dst {
                let hashed = hashmix(pool[i_src], &mut hash_const);
                pool[i_dst] = mix(pool[i_dst], hashed);
            }
        }
    }

    // Entropy beyond the pool size still feeds every pool word.
    for &word in entropy.iter().skip(pool_size) {
        for slot in pool.iter_mut() {
            let hashed = hashmix(word, &mut hash_const);
            *slot = mix(*slot, hashed);
        }
    }

    pool
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for u8 {}
    impl Sealed for u16 {}
    impl Sealed for u32 {}
    impl Sealed for u64 {}
}

/// Destination lane widths accepted by [`SeedSequence::generate_into`].
pub trait SeedLane: Copy + sealed::Sealed {
    #[doc(hidden)]
    fn fill(seq: &mut SeedSequence, dest: &mut [Self]);
}

impl SeedLane for u32 {
    fn fill(seq: &mut SeedSequence, dest: &mut [Self]) {
        for slot in dest.iter_mut() {
            *slot = seq.next_word();
        }
    }
}

impl SeedLane for u64 {
    fn fill(seq: &mut SeedSequence, dest: &mut [Self]) {
        for slot in dest.iter_mut() {
            let lo = seq.next_word();
            let hi = seq.next_word();
            *slot = u64::from(lo) | (u64::from(hi) << 32);
        }
    }
}

/// Split words into `scale` narrow lanes, low lane first, then reverse.
fn fill_narrow<T, F>(seq: &mut SeedSequence, dest: &mut [T], scale: usize, narrow: F)
where
    T: Copy,
    F: Fn(u32) -> T,
{
    let mut word = 0u32;
    for (count, slot) in dest.iter_mut().enumerate() {
        if count % scale == 0 {
            word = seq.next_word();
        } else {
            word >>= 32 / scale as u32;
        }
        *slot = narrow(word);
    }
    dest.reverse();
}

impl SeedLane for u16 {
    fn fill(seq: &mut SeedSequence, dest: &mut [Self]) {
        fill_narrow(seq, dest, 2, |w| w as u16);
    }
}

impl SeedLane for u8 {
    fn fill(seq: &mut SeedSequence, dest: &mut [Self]) {
        fill_narrow(seq, dest, 4, |w| w as u8);
    }
}
