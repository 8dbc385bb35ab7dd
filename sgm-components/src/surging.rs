//! A glacier that periodically surges.
//!
//! Surge-type glaciers alternate between long quiescent phases and short
//! active phases in which basal motion increases by an order of magnitude,
//! moving large amounts of ice downglacier in a few years. Here the surge is
//! emulated by multiplying the basal-sliding parameter by `surge_factor`
//! during the active phase, the classic teaching simplification.

use crate::model::{apply_to_glacier, summarize, AttributeChange, GlacierModel, GlacierSummary};
use log::debug;
use serde::{Deserialize, Serialize};
use sgm_core::bed::GlacierBed;
use sgm_core::constants::FS_DEFAULT;
use sgm_core::errors::{SgmError, SgmResult};
use sgm_core::glacier::Glacier;
use sgm_core::history::History;
use sgm_core::mass_balance::MassBalance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum SurgePhase {
    Normal,
    Surging,
}

/// A [`Glacier`] whose basal sliding cycles between a quiescent and a surging
/// value.
///
/// Defaults: 50 quiescent years, 5 surging years, sliding amplified tenfold
/// while surging. Surging glaciers never equilibrate; asking for an
/// equilibrium is an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurgingGlacier {
    glacier: Glacier,
    normal_years: usize,
    surging_years: usize,
    surge_factor: f64,
    base_sliding: f64,
    phase: SurgePhase,
    years_left_in_phase: usize,
    /// One entry per simulated year: was it a surge year?
    surge_log: Vec<bool>,
}

impl SurgingGlacier {
    /// A surging glacier with the default 50/5 cycle and tenfold surges.
    pub fn new(bed: GlacierBed, mass_balance: MassBalance) -> Self {
        Self::with_cycle(bed, mass_balance, 50, 5, 10.0).expect("default cycle is valid")
    }

    /// A surging glacier with an explicit cycle.
    pub fn with_cycle(
        bed: GlacierBed,
        mass_balance: MassBalance,
        normal_years: usize,
        surging_years: usize,
        surge_factor: f64,
    ) -> SgmResult<Self> {
        if normal_years == 0 || surging_years == 0 {
            return Err(SgmError::Error(
                "both surge-cycle phases need at least one year".to_string(),
            ));
        }
        if !(surge_factor > 1.0) {
            return Err(SgmError::Error(format!(
                "surge_factor must exceed 1, got {surge_factor}"
            )));
        }
        let mut glacier = Glacier::new(bed, mass_balance);
        glacier.set_basal_sliding(FS_DEFAULT)?;
        Ok(Self {
            glacier,
            normal_years,
            surging_years,
            surge_factor,
            base_sliding: FS_DEFAULT,
            phase: SurgePhase::Normal,
            years_left_in_phase: normal_years,
            surge_log: Vec::new(),
        })
    }

    pub fn normal_years(&self) -> usize {
        self.normal_years
    }

    pub fn surging_years(&self) -> usize {
        self.surging_years
    }

    pub fn surge_factor(&self) -> f64 {
        self.surge_factor
    }

    /// Is the glacier currently in its active phase?
    pub fn is_surging(&self) -> bool {
        self.phase == SurgePhase::Surging
    }

    /// One flag per simulated year: surge year or not.
    pub fn surge_log(&self) -> &[bool] {
        &self.surge_log
    }

    pub fn age(&self) -> f64 {
        self.glacier.age()
    }

    fn advance_year(&mut self) -> SgmResult<()> {
        if self.years_left_in_phase == 0 {
            self.phase = match self.phase {
                SurgePhase::Normal => {
                    debug!("surge starts at age {:.0}", self.glacier.age());
                    self.years_left_in_phase = self.surging_years;
                    SurgePhase::Surging
                }
                SurgePhase::Surging => {
                    debug!("surge ends at age {:.0}", self.glacier.age());
                    self.years_left_in_phase = self.normal_years;
                    SurgePhase::Normal
                }
            };
            let sliding = match self.phase {
                SurgePhase::Normal => self.base_sliding,
                SurgePhase::Surging => self.base_sliding * self.surge_factor,
            };
            self.glacier.set_basal_sliding(sliding)?;
        }
        self.glacier.progress_to_year(self.glacier.age() + 1.0)?;
        self.years_left_in_phase -= 1;
        self.surge_log.push(self.phase == SurgePhase::Surging);
        Ok(())
    }
}

#[typetag::serde]
impl GlacierModel for SurgingGlacier {
    fn progress_to_year(&mut self, year: f64) -> SgmResult<()> {
        if !year.is_finite() || year < self.glacier.age() {
            return Err(SgmError::YearInPast {
                requested: year,
                current: self.glacier.age(),
            });
        }
        while self.glacier.age() + 1.0 <= year + 1e-9 {
            self.advance_year()?;
        }
        Ok(())
    }

    fn progress_to_equilibrium(&mut self) -> SgmResult<()> {
        Err(SgmError::NoEquilibrium)
    }

    fn apply_change(&mut self, change: AttributeChange) -> SgmResult<()> {
        match change {
            // The quiescent value is what cycles; reapply it for the phase.
            AttributeChange::BasalSliding(fs) => {
                let active = match self.phase {
                    SurgePhase::Normal => fs,
                    SurgePhase::Surging => fs * self.surge_factor,
                };
                self.glacier.set_basal_sliding(active)?;
                self.base_sliding = fs;
                Ok(())
            }
            other => apply_to_glacier(&mut self.glacier, other),
        }
    }

    fn summary(&self) -> GlacierSummary {
        summarize("SurgingGlacier", &self.glacier)
    }

    fn history(&self) -> &History {
        self.glacier.history()
    }

    fn glacier(&self) -> &Glacier {
        &self.glacier
    }
}
