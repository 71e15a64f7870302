//! # Randstate Core (shared layer)
//!
//! Lower layer of the randstate workspace. It collects the pieces the
//! distribution replay layer consumes but does not own:
//!
//! - [`ieee`]: IEEE-754 bit patterns and floating-point predicates
//! - [`source`]: the [`BitSource`] capability trait every sampler draws from
//! - [`kernels`]: lower-level numeric kernels (log-gamma, Poisson, Zipf,
//!   geometric search) consumed as pure functions by the distribution layer
//! - [`entropy`]: injectable entropy sources for deterministic seeding
//!
//! This crate carries no sampling policy of its own: everything here is a
//! stateless function or a capability trait, so the replay layer above can be
//! tested with fully scripted inputs.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![allow(unknown_lints)]

pub mod entropy;
pub mod ieee;
pub mod kernels;
pub mod source;

// Re-export commonly used items for convenience
pub use entropy::{EntropySource, OsEntropy};
pub use source::BitSource;
