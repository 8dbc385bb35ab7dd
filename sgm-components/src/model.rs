//! A common surface over the glacier flavours.
//!
//! [`GlacierModel`] is what a [`crate::collection::GlacierCollection`] stores:
//! anything that can progress through time, report a summary row and accept
//! attribute updates. Trait objects serialise through `typetag`, so a mixed
//! collection survives a serde round trip.

use serde::{Deserialize, Serialize};
use sgm_core::errors::SgmResult;
use sgm_core::glacier::Glacier;
use sgm_core::history::History;

/// A single attribute update for one glacier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AttributeChange {
    /// Temperature bias (K), applied immediately.
    TempBias(f64),
    /// Unbiased equilibrium line altitude (m).
    Ela(f64),
    /// Uniform mass-balance gradient (mm w.e. / m / yr).
    Gradient(f64),
    /// Ice creep parameter (Glen A).
    Creep(f64),
    /// Basal sliding parameter.
    BasalSliding(f64),
}

/// One row of scalar diagnostics describing a glacier's current state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlacierSummary {
    pub kind: String,
    pub age: f64,
    pub length_m: f64,
    pub area_km2: f64,
    pub volume_km3: f64,
    pub ela_m: f64,
    pub max_velocity_m_yr: f64,
}

/// Anything a collection can hold and progress.
#[typetag::serde]
pub trait GlacierModel: std::fmt::Debug + Send {
    /// Advance to the given age.
    fn progress_to_year(&mut self, year: f64) -> SgmResult<()>;

    /// Advance until the volume settles, where that is meaningful.
    fn progress_to_equilibrium(&mut self) -> SgmResult<()>;

    /// Apply one attribute update.
    fn apply_change(&mut self, change: AttributeChange) -> SgmResult<()>;

    /// Scalar diagnostics of the current state.
    fn summary(&self) -> GlacierSummary;

    /// The per-year diagnostic history.
    fn history(&self) -> &History;

    /// The underlying standard glacier.
    fn glacier(&self) -> &Glacier;
}

pub(crate) fn apply_to_glacier(glacier: &mut Glacier, change: AttributeChange) -> SgmResult<()> {
    match change {
        AttributeChange::TempBias(bias) => {
            glacier.mass_balance_mut().set_temp_bias(bias);
            Ok(())
        }
        AttributeChange::Ela(ela) => glacier.mass_balance_mut().set_ela(ela),
        AttributeChange::Gradient(gradient) => glacier.mass_balance_mut().set_gradient(gradient),
        AttributeChange::Creep(creep) => glacier.set_creep(creep),
        AttributeChange::BasalSliding(fs) => glacier.set_basal_sliding(fs),
    }
}

pub(crate) fn summarize(kind: &str, glacier: &Glacier) -> GlacierSummary {
    GlacierSummary {
        kind: kind.to_string(),
        age: glacier.age(),
        length_m: glacier.length_m(),
        area_km2: glacier.area_km2(),
        volume_km3: glacier.volume_km3(),
        ela_m: glacier.ela(),
        max_velocity_m_yr: glacier.max_ice_velocity(),
    }
}

#[typetag::serde]
impl GlacierModel for Glacier {
    fn progress_to_year(&mut self, year: f64) -> SgmResult<()> {
        Glacier::progress_to_year(self, year)
    }

    fn progress_to_equilibrium(&mut self) -> SgmResult<()> {
        Glacier::progress_to_equilibrium(self)
    }

    fn apply_change(&mut self, change: AttributeChange) -> SgmResult<()> {
        apply_to_glacier(self, change)
    }

    fn summary(&self) -> GlacierSummary {
        summarize("Glacier", self)
    }

    fn history(&self) -> &History {
        Glacier::history(self)
    }

    fn glacier(&self) -> &Glacier {
        self
    }
}
