//! Orbital position sampling
//!
//! Positions come from SGP4 via satkit, consumed as a black box: element
//! set and instant in, TEME position out. The scanner only depends on the
//! [`PositionProvider`] trait, so tests can swap in analytic orbits.

mod provider;

pub use provider::*;
