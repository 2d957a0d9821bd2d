//! Seasonal decomposition.
//!
//! - Classical additive decomposition: moving-average trend, phase-averaged
//!   seasonal figure and residual

mod classical;

pub use classical::{Decomposer, DecompositionResult};
