//! Annual melt accounting and the peak-water diagnostic.
//!
//! As a warming glacier retreats, the melt it delivers downstream first
//! rises (more ablation area, stored ice being released) and later falls
//! (little ice left to melt). The year of maximum smoothed melt is called
//! peak water.

use serde::{Deserialize, Serialize};
use sgm_core::constants::{RHO_ICE, RHO_WATER};
use sgm_core::errors::SgmResult;
use sgm_core::glacier::Glacier;

/// Melt released by the glacier this year (m^3 water equivalent / yr).
///
/// The area-integral of the negative part of the annual mass balance over the
/// current ice surface, converted from ice to water volume.
pub fn annual_melt_m3_we(glacier: &Glacier) -> f64 {
    let bed = glacier.bed();
    let eps = glacier.params().ice_thickness_epsilon;
    let dx = bed.map_dx();
    let mut melt_ice = 0.0;
    for i in 0..bed.nx() {
        let h = glacier.thickness()[i];
        if h > eps {
            let mb = glacier
                .mass_balance()
                .annual_mb(bed.bed_h()[i] + h);
            if mb < 0.0 {
                melt_ice += -mb * bed.widths()[i] * dx;
            }
        }
    }
    melt_ice * RHO_ICE / RHO_WATER
}

/// Per-year melt volumes recorded alongside a progressing glacier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunoffSeries {
    time: Vec<f64>,
    melt_m3_we: Vec<f64>,
}

impl RunoffSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            time: Vec::with_capacity(n),
            melt_m3_we: Vec::with_capacity(n),
        }
    }

    pub fn push(&mut self, time: f64, melt_m3_we: f64) {
        self.time.push(time);
        self.melt_m3_we.push(melt_m3_we);
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn melt_m3_we(&self) -> &[f64] {
        &self.melt_m3_we
    }
}

/// Progress a glacier year by year for `years`, recording the annual melt
/// after each step.
pub fn track_melt(glacier: &mut Glacier, years: usize) -> SgmResult<RunoffSeries> {
    let mut series = RunoffSeries::with_capacity(years);
    for _ in 0..years {
        glacier.progress_to_year(glacier.age() + 1.0)?;
        series.push(glacier.age(), annual_melt_m3_we(glacier));
    }
    Ok(series)
}

/// The year of maximum smoothed melt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakWater {
    pub year: f64,
    pub melt_m3_we: f64,
}

/// Find peak water: the maximum of the centered moving average of the melt
/// series.
///
/// `window` is in years and is widened to the next odd number; near the
/// series ends the window shrinks symmetrically. Returns `None` for an empty
/// series or a zero window.
pub fn peak_water(series: &RunoffSeries, window: usize) -> Option<PeakWater> {
    if series.is_empty() || window == 0 {
        return None;
    }
    let melt = series.melt_m3_we();
    let half = window / 2;

    let mut best: Option<(usize, f64)> = None;
    for i in 0..melt.len() {
        let reach = half.min(i).min(melt.len() - 1 - i);
        let lo = i - reach;
        let hi = i + reach;
        let mean = melt[lo..=hi].iter().sum::<f64>() / (hi - lo + 1) as f64;
        match best {
            Some((_, value)) if value >= mean => {}
            _ => best = Some((i, mean)),
        }
    }

    best.map(|(i, value)| PeakWater {
        year: series.time()[i],
        melt_m3_we: value,
    })
}
