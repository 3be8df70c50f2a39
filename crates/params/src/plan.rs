use tracing::debug;

use crate::error::ParamError;
use crate::overrides::Overrides;
use crate::set::{derive, ParameterSet};
use crate::sweep::{Sweep, SweepKind, SWEEP_LEN};

/// Batch-wide recipe for turning token ids into parameter sets.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ParameterPlan {
    pub overrides: Overrides,
    pub sweep: Option<Sweep>,
}

impl ParameterPlan {
    pub fn new(overrides: Overrides, sweep: Option<Sweep>) -> Result<Self, ParamError> {
        overrides.validate()?;
        if let Some(sweep) = &sweep {
            sweep.validate()?;
        }
        Ok(Self { overrides, sweep })
    }

    /// Parameters for the token at `position` within the batch.
    pub fn params_for(&self, token_id: u64, position: usize) -> ParameterSet {
        let mut params = derive(token_id);
        self.overrides.apply(&mut params);
        if let Some(sweep) = &self.sweep {
            sweep.apply(position, self.overrides.hues.is_some(), &mut params);
        }
        debug!(token = token_id, position, ?params, "resolved parameters");
        params
    }

    /// Number of tokens the batch actually produces; sweeps are always four clips.
    pub fn batch_len(&self, requested: usize) -> usize {
        if self.sweep.is_some() {
            SWEEP_LEN
        } else {
            requested
        }
    }

    pub fn sweep_kind(&self) -> Option<SweepKind> {
        self.sweep.map(|sweep| sweep.kind)
    }
}
