//! Content fingerprinting for twig.
//!
//! Fingerprints let the diff engine prove two leaves equal without fetching
//! their content. All fingerprints, precomputed by a provider or computed on
//! demand, go through [`ContentHasher`] so they are comparable.
//!
//! All crypto operations wrap established libraries; there is no custom cryptography.

pub mod hasher;

pub use hasher::ContentHasher;
