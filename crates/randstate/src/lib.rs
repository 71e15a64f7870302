//! # randstate: NumPy-legacy RandomState replay over arbitrary bit engines
//!
//! ## What this crate does
//!
//! Given any caller-supplied pseudo-random bit engine, this crate adapts its
//! native output width into canonical 32/64-bit words and replays NumPy's
//! frozen legacy `RandomState` distribution stream on top of it, value for
//! value:
//! - Word-width adapter with a FIFO remainder buffer (`adapter`)
//! - Bounded-integer sampling, masked and Lemire rejection (`bounded`)
//! - The legacy distribution catalogue with its Gaussian and binomial
//!   caches (`distributions`)
//! - Entropy-mixing seed pool for deriving engine seeds (`seed`)
//! - A mutex-guarded facade tying it all together (`state`)
//!
//! Identical engine bits yield identical samples, on any platform. The
//! sampling algorithms are deliberately archaic: they reproduce reference
//! behaviour, including its quirks, and must not be modernised.
//!
//! ## Quick start
//!
//! ```rust
//! use randstate::{FnEngine, RandomState, SeedSequence};
//!
//! // Seed a toy engine from the mixing pool.
//! let mut seeds = SeedSequence::from_seed(42);
//! let mut s = seeds.next_u64() | 1;
//! let engine = FnEngine::new(move || {
//!     s = s.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
//!     s
//! });
//!
//! let state = RandomState::new(engine)?;
//! let u = state.uniform(0.0, 10.0)?;
//! assert!((0.0..10.0).contains(&u));
//! let d = state.rand_int(1_u8, 6)?;
//! assert!((1..=6).contains(&d));
//! let z = state.rand_n();
//! assert!(z.is_finite());
//! # Ok::<(), randstate::RandstateError>(())
//! ```
//!
//! ## Engine shapes
//!
//! Engines declare one of three output shapes, probed once at construction:
//! a scalar of 1..=64 bits, a fixed container of 8/16/32/64-bit elements, or
//! a custom shiftable integer of any width (wider than 64 bits is delivered
//! as low-first limbs). See [`OutputShape`].
//!
//! ## Error handling
//!
//! Parameter problems surface as [`RandstateError`] before any engine bits
//! are consumed. NaN shape parameters that the reference stream propagates
//! as NaN samples are not errors; see the method docs on [`RandomState`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![allow(unknown_lints)]

pub mod adapter;
pub mod bounded;
pub mod distributions;
pub mod engine;
pub mod error;
pub mod seed;
pub mod state;

pub use adapter::WordSource;
pub use bounded::BoundedInt;
pub use distributions::{BinomialCache, GaussCache};
pub use engine::{Engine, FnEngine, OutputShape, RngCoreEngine};
pub use error::RandstateError;
pub use seed::{SeedSequence, DEFAULT_POOL_SIZE};
pub use state::RandomState;

pub use randstate_core::{BitSource, EntropySource, OsEntropy};
