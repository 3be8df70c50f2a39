//! Deterministic per-token shader parameters.
//!
//! A token id is the only seed. [`derive`] maps it to a [`ParameterSet`];
//! [`Overrides`] and [`Sweep`] layer operator choices on top without
//! disturbing the seeded draws, and [`ParameterPlan`] bundles both for a batch.

mod error;
mod overrides;
mod plan;
mod rng;
mod set;
mod sweep;

pub use error::ParamError;
pub use overrides::{parse_hue_list, Overrides};
pub use plan::ParameterPlan;
pub use rng::TokenRng;
pub use set::{derive, ParameterSet, DOT_DIVISORS, HUE_MAX, ROTATION_SPEEDS, SCALES};
pub use sweep::{
    parse_sweep_values, Sweep, SweepKind, DOT_DIVISOR_MIDPOINT, ROTATION_MIDPOINT,
    SCALE_MIDPOINT, SWEEP_HUES, SWEEP_LEN,
};
