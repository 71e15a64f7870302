//! Caller-supplied bit engines and their output-shape probe.
//!
//! An engine is an arbitrary stateful generator of raw pseudo-random bits.
//! Rather than dispatching on an open-ended family of return types, the
//! adapter asks each engine to classify itself once, at construction, into a
//! closed set of shapes ([`OutputShape`]) and to deliver every block through
//! one uniform channel: a low-first sequence of zero-extended 64-bit values.

use std::marker::PhantomData;

use num_traits::{PrimInt, Unsigned};
use rand::RngCore;

/// Native output shape of one engine call, probed once when the adapter is
/// built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputShape {
    /// A single arithmetic value of `bits` significant bits (1..=64).
    Scalar {
        /// Significant bits per produced value.
        bits: u32,
    },
    /// A fixed-length container of `len` arithmetic elements, each
    /// `elem_bits` wide. Elements must be byte-power widths (8/16/32/64).
    FixedContainer {
        /// Significant bits per element.
        elem_bits: u32,
        /// Elements per produced block.
        len: usize,
    },
    /// A custom integer-like value supporting shift and mask, `bits` wide;
    /// widths above 64 are delivered as multiple 64-bit limbs.
    CustomShiftable {
        /// Significant bits per produced value.
        bits: u32,
    },
}

/// A caller-supplied pseudo-random bit source.
///
/// `produce` appends one native block to `out` as zero-extended 64-bit
/// values: a scalar pushes one value, a container pushes its elements in
/// order, and a wide custom value pushes its 64-bit limbs low limb first.
/// The shape reported by [`Engine::shape`] must describe every block the
/// engine ever produces; it is probed exactly once.
pub trait Engine {
    /// Report the native output shape.
    fn shape(&self) -> OutputShape;

    /// Produce one native output block.
    fn produce(&mut self, out: &mut Vec<u64>);
}

/// Engine backed by a closure returning one unsigned scalar per call.
///
/// This is the cheapest way to wrap a raw generator function:
///
/// ```
/// use randstate::{Engine, FnEngine, OutputShape};
///
/// let mut state = 0x9E3779B97F4A7C15_u64;
/// let mut engine = FnEngine::new(move || {
///     state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
///     state
/// });
/// assert_eq!(engine.shape(), OutputShape::Scalar { bits: 64 });
/// let mut block = Vec::new();
/// engine.produce(&mut block);
/// assert_eq!(block.len(), 1);
/// ```
pub struct FnEngine<T, F> {
    f: F,
    _marker: PhantomData<T>,
}

impl<T, F> FnEngine<T, F>
where
    T: PrimInt + Unsigned,
    F: FnMut() -> T,
{
    /// Wrap `f` as a scalar engine of `T`'s width.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

impl<T, F> Engine for FnEngine<T, F>
where
    T: PrimInt + Unsigned,
    F: FnMut() -> T,
{
    fn shape(&self) -> OutputShape {
        OutputShape::Scalar {
            bits: std::mem::size_of::<T>() as u32 * 8,
        }
    }

    fn produce(&mut self, out: &mut Vec<u64>) {
        // Unsigned primitives always fit in u64, so the fallback is inert.
        out.push((self.f)().to_u64().unwrap_or(0));
    }
}

/// Bridge exposing any [`rand::RngCore`] generator as a 64-bit scalar engine.
///
/// ```
/// use rand::{rngs::StdRng, SeedableRng};
/// use randstate::{Engine, OutputShape, RngCoreEngine};
///
/// let engine = RngCoreEngine::new(StdRng::seed_from_u64(7));
/// assert_eq!(engine.shape(), OutputShape::Scalar { bits: 64 });
/// ```
pub struct RngCoreEngine<R>(R);

impl<R: RngCore> RngCoreEngine<R> {
    /// Wrap `rng`.
    pub fn new(rng: R) -> Self {
        Self(rng)
    }

    /// Consume the bridge and return the generator.
    pub fn into_inner(self) -> R {
        self.0
    }
}

impl<R: RngCore> Engine for RngCoreEngine<R> {
    fn shape(&self) -> OutputShape {
        OutputShape::Scalar { bits: 64 }
    }

    fn produce(&mut self, out: &mut Vec<u64>) {
        out.push(self.0.next_u64());
    }
}
