//! The bit-source capability trait.
//!
//! Every sampling routine in the replay layer is a deterministic function of
//! one [`BitSource`] plus, for a few distributions, small per-stream caches.
//! The trait is the Rust rendering of the classic bit-generator handle (an
//! opaque state pointer plus four next-value function pointers): a capability
//! view over an engine, never an owner.

/// Canonical fixed-width draw operations over an underlying engine.
///
/// Implementors guarantee that every call consumes fresh engine output (or
/// output previously buffered from the engine) and that the mapping from raw
/// engine bits to each return type is fixed: callers rely on it to reproduce
/// recorded streams bit for bit.
pub trait BitSource {
    /// Next canonical 64-bit word.
    fn next_u64(&mut self) -> u64;

    /// Next canonical 32-bit word.
    fn next_u32(&mut self) -> u32;

    /// Next double in `[0, 1)` built from 53 random bits.
    fn next_f64(&mut self) -> f64;

    /// Next raw engine block, zero-extended to 64 bits, without any width
    /// normalisation beyond buffering.
    fn next_raw(&mut self) -> u64;
}

impl<S: BitSource + ?Sized> BitSource for &mut S {
    #[inline]
    fn next_u64(&mut self) -> u64 {
        (**self).next_u64()
    }

    #[inline]
    fn next_u32(&mut self) -> u32 {
        (**self).next_u32()
    }

    #[inline]
    fn next_f64(&mut self) -> f64 {
        (**self).next_f64()
    }

    #[inline]
    fn next_raw(&mut self) -> u64 {
        (**self).next_raw()
    }
}
