//! The legacy distribution catalogue.
//!
//! Every sampler here is a stream-exact port of the frozen reference
//! formulations: constants, draw order, and comparison directions are load
//! bearing and must not be "improved". Samplers take a [`BitSource`] plus any
//! auxiliary cache they need; parameter validation lives on the facade, so
//! these functions document the domain the caller guarantees.
//!
//! [`BitSource`]: randstate_core::BitSource

pub mod continuous;
pub mod discrete;

pub use continuous::GaussCache;
pub use discrete::BinomialCache;
