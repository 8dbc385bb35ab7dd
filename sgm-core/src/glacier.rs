//! The glacier façade: a bed, a mass balance, and an evolving ice profile.
//!
//! A [`Glacier`] owns its geometry and forcing, delegates the yearly time
//! evolution to the flowline engine, and records one [`HistoryRecord`] per
//! simulated year. Glaciers are cheap to clone, so a single bed definition
//! can seed many side-by-side experiments.

use crate::bed::GlacierBed;
use crate::climate::BiasSchedule;
use crate::config::PhysicsParams;
use crate::errors::{SgmError, SgmResult};
use crate::flowline;
use crate::history::{History, HistoryRecord};
use crate::mass_balance::MassBalance;
use is_close::is_close;
use log::info;
use ndarray::Array1;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A one-dimensional glacier progressing through time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Glacier {
    bed: GlacierBed,
    mass_balance: MassBalance,
    params: PhysicsParams,
    thickness: Array1<f64>,
    age: f64,
    history: History,
    climate: BiasSchedule,
    /// (age, volume) pairs recorded each time an equilibrium is reached.
    eq_states: Vec<(f64, f64)>,
    max_velocity_m_yr: f64,
}

impl Glacier {
    /// An ice-free glacier on the given bed, with default physics.
    pub fn new(bed: GlacierBed, mass_balance: MassBalance) -> Self {
        Self::with_params(bed, mass_balance, PhysicsParams::default())
    }

    /// An ice-free glacier with explicit physics parameters.
    pub fn with_params(bed: GlacierBed, mass_balance: MassBalance, params: PhysicsParams) -> Self {
        let thickness = Array1::zeros(bed.nx());
        let mut glacier = Self {
            bed,
            mass_balance,
            params,
            thickness,
            age: 0.0,
            history: History::new(),
            climate: BiasSchedule::new(),
            eq_states: Vec::new(),
            max_velocity_m_yr: 0.0,
        };
        glacier.history.push(glacier.current_record());
        glacier
    }

    pub fn bed(&self) -> &GlacierBed {
        &self.bed
    }

    pub fn mass_balance(&self) -> &MassBalance {
        &self.mass_balance
    }

    pub fn mass_balance_mut(&mut self) -> &mut MassBalance {
        &mut self.mass_balance
    }

    pub fn params(&self) -> &PhysicsParams {
        &self.params
    }

    /// Glacier age in simulated years.
    pub fn age(&self) -> f64 {
        self.age
    }

    /// The per-year diagnostics recorded so far.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Effective equilibrium line altitude (m).
    pub fn ela(&self) -> f64 {
        self.mass_balance.ela()
    }

    /// Ice creep parameter (Glen A).
    pub fn creep(&self) -> f64 {
        self.params.creep
    }

    pub fn set_creep(&mut self, creep: f64) -> SgmResult<()> {
        let mut params = self.params.clone();
        params.creep = creep;
        params.validate()?;
        self.params = params;
        Ok(())
    }

    /// Basal sliding parameter.
    pub fn basal_sliding(&self) -> f64 {
        self.params.basal_sliding
    }

    pub fn set_basal_sliding(&mut self, basal_sliding: f64) -> SgmResult<()> {
        let mut params = self.params.clone();
        params.basal_sliding = basal_sliding;
        params.validate()?;
        self.params = params;
        Ok(())
    }

    /// Ice thickness profile (m).
    pub fn thickness(&self) -> &Array1<f64> {
        &self.thickness
    }

    /// Ice surface altitude profile (m).
    pub fn surface_h(&self) -> Array1<f64> {
        self.bed.bed_h() + &self.thickness
    }

    /// Glacier length (m): grid cells holding ice times the grid spacing.
    pub fn length_m(&self) -> f64 {
        let eps = self.params.ice_thickness_epsilon;
        let cells = self.thickness.iter().filter(|&&h| h > eps).count();
        cells as f64 * self.bed.map_dx()
    }

    /// Glacier area (km^2).
    pub fn area_km2(&self) -> f64 {
        let eps = self.params.ice_thickness_epsilon;
        let dx = self.bed.map_dx();
        self.thickness
            .iter()
            .zip(self.bed.widths().iter())
            .filter(|(&h, _)| h > eps)
            .map(|(_, &w)| w * dx)
            .sum::<f64>()
            / 1e6
    }

    /// Ice volume (km^3).
    pub fn volume_km3(&self) -> f64 {
        let dx = self.bed.map_dx();
        self.thickness
            .iter()
            .zip(self.bed.widths().iter())
            .map(|(&h, &w)| h * w * dx)
            .sum::<f64>()
            / 1e9
    }

    /// Area-weighted mean annual mass balance over the glacier surface
    /// (m ice / yr), or `None` while there is no ice.
    pub fn specific_mass_balance(&self) -> Option<f64> {
        let eps = self.params.ice_thickness_epsilon;
        let bed_h = self.bed.bed_h();
        let widths = self.bed.widths();
        let mut weighted = 0.0;
        let mut area = 0.0;
        for i in 0..self.bed.nx() {
            if self.thickness[i] > eps {
                let w = widths[i];
                weighted += self.mass_balance.annual_mb(bed_h[i] + self.thickness[i]) * w;
                area += w;
            }
        }
        if area > 0.0 {
            Some(weighted / area)
        } else {
            None
        }
    }

    /// Fastest ice during the most recent simulated year (m/yr).
    pub fn max_ice_velocity(&self) -> f64 {
        self.max_velocity_m_yr
    }

    /// Biases still queued for future years.
    pub fn pending_climate(&self) -> &BiasSchedule {
        &self.climate
    }

    /// Ramp the temperature bias linearly to `bias` (K) over `duration`
    /// years, starting from the current bias.
    pub fn add_temperature_bias(&mut self, bias: f64, duration: usize) {
        let current = self.mass_balance.temp_bias();
        self.climate.push_trend(current, bias, duration);
    }

    /// Like [`add_temperature_bias`](Self::add_temperature_bias), with
    /// Gaussian year-to-year noise of standard deviation `sigma`.
    pub fn add_noisy_temperature_bias<R: Rng>(
        &mut self,
        bias: f64,
        duration: usize,
        sigma: f64,
        rng: &mut R,
    ) -> SgmResult<()> {
        let current = self.mass_balance.temp_bias();
        self.climate
            .push_noisy_trend(current, bias, duration, sigma, rng)
    }

    /// Queue `duration` years of biases drawn uniformly from
    /// `[-temperature_range, temperature_range]`.
    pub fn add_random_climate<R: Rng>(
        &mut self,
        duration: usize,
        temperature_range: f64,
        rng: &mut R,
    ) -> SgmResult<()> {
        self.climate.push_random(duration, temperature_range, rng)
    }

    /// Advance the glacier to the given age, one simulated year at a time.
    ///
    /// Each year first consumes a pending climate bias (if any), then
    /// integrates the ice dynamics and appends a history row. Fractional
    /// years are truncated; asking for a year in the past is an error and
    /// asking for the current year is a no-op.
    pub fn progress_to_year(&mut self, year: f64) -> SgmResult<()> {
        if !year.is_finite() || year < self.age {
            return Err(SgmError::YearInPast {
                requested: year,
                current: self.age,
            });
        }
        while self.age + 1.0 <= year + 1e-9 {
            self.advance_year()?;
        }
        Ok(())
    }

    fn advance_year(&mut self) -> SgmResult<()> {
        if let Some(bias) = self.climate.next_bias() {
            self.mass_balance.set_temp_bias(bias);
        }
        let stats = flowline::advance_one_year(
            &self.bed,
            &self.mass_balance,
            &self.params,
            &mut self.thickness,
            self.age + 1.0,
        )?;
        self.age += 1.0;
        self.max_velocity_m_yr = stats.max_velocity_m_yr;
        self.history.push(self.current_record());
        Ok(())
    }

    fn current_record(&self) -> HistoryRecord {
        HistoryRecord {
            time: self.age,
            length_m: self.length_m(),
            area_km2: self.area_km2(),
            volume_km3: self.volume_km3(),
            ela_m: self.ela(),
            temp_bias: self.mass_balance.temp_bias(),
            max_velocity_m_yr: self.max_velocity_m_yr,
        }
    }

    /// Run until the volume stops changing between check blocks.
    ///
    /// Advances in blocks of `equilibrium_block_years` until the relative
    /// volume change over a block drops below `equilibrium_rel_tol`, then
    /// records the (age, volume) equilibrium state. Errors if no equilibrium
    /// appears within `equilibrium_max_years`, or while a climate schedule is
    /// still pending (the forcing must settle before the glacier can).
    pub fn progress_to_equilibrium(&mut self) -> SgmResult<()> {
        if !self.climate.is_empty() {
            return Err(SgmError::PendingClimate);
        }
        let block = self.params.equilibrium_block_years as f64;
        let start = self.age;
        let mut volume_before = self.volume_km3();
        loop {
            self.progress_to_year(self.age + block)?;
            let volume = self.volume_km3();
            if is_close!(
                volume,
                volume_before,
                rel_tol = self.params.equilibrium_rel_tol
            ) {
                info!(
                    "equilibrium reached at age {:.0} (volume {:.4} km^3)",
                    self.age, volume
                );
                self.eq_states.push((self.age, volume));
                return Ok(());
            }
            if self.age - start >= self.params.equilibrium_max_years as f64 {
                return Err(SgmError::EquilibriumNotReached(self.age - start));
            }
            volume_before = volume;
        }
    }

    /// Equilibrium states recorded so far, as (age, volume km^3) pairs.
    pub fn equilibrium_states(&self) -> &[(f64, f64)] {
        &self.eq_states
    }

    /// Volume e-folding response time (yr) between the two most recent
    /// equilibria.
    ///
    /// Measured from the first change of the equilibrium line after the
    /// earlier equilibrium to the year the volume first closes `1 - 1/e` of
    /// the gap to the newer equilibrium volume. `None` until two distinct
    /// equilibria exist.
    pub fn response_time(&self) -> Option<f64> {
        if self.eq_states.len() < 2 {
            return None;
        }
        let (t1, v1) = self.eq_states[self.eq_states.len() - 2];
        let (t2, v2) = self.eq_states[self.eq_states.len() - 1];
        if (v2 - v1).abs() < 1e-12 {
            return None;
        }

        let time = self.history.time();
        let ela = self.history.ela_m();
        let volume = self.history.volume_km3();
        let idx1 = time.iter().position(|&t| t >= t1)?;

        // The perturbation starts at the first ELA change after the old
        // equilibrium.
        let mut start = None;
        for i in (idx1 + 1)..time.len() {
            if (ela[i] - ela[i - 1]).abs() > 1e-9 {
                start = Some(i);
                break;
            }
        }
        let start = start?;

        let target = v2 - (v2 - v1) / std::f64::consts::E;
        for i in start..time.len() {
            if time[i] > t2 {
                break;
            }
            let crossed = if v2 >= v1 {
                volume[i] >= target
            } else {
                volume[i] <= target
            };
            if crossed {
                return Some(time[i] - time[start]);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn small_bed() -> GlacierBed {
        GlacierBed::builder()
            .top(3000.0)
            .bottom(1500.0)
            .width(300.0)
            .nx(100)
            .build()
            .unwrap()
    }

    fn small_glacier() -> Glacier {
        Glacier::new(small_bed(), MassBalance::new(2500.0, 4.0).unwrap())
    }

    #[test]
    fn test_new_glacier_is_ice_free() {
        let glacier = small_glacier();

        assert_relative_eq!(glacier.age(), 0.0);
        assert_relative_eq!(glacier.length_m(), 0.0);
        assert_relative_eq!(glacier.area_km2(), 0.0);
        assert_relative_eq!(glacier.volume_km3(), 0.0);
        assert!(glacier.specific_mass_balance().is_none());
        // Construction writes the initial history row
        assert_eq!(glacier.history().len(), 1);
    }

    #[test]
    fn test_progress_appends_history() {
        let mut glacier = small_glacier();
        glacier.progress_to_year(25.0).unwrap();

        assert_relative_eq!(glacier.age(), 25.0);
        assert_eq!(glacier.history().len(), 26);
        assert!(glacier.volume_km3() > 0.0);
        assert!(glacier.length_m() > 0.0);
    }

    #[test]
    fn test_progress_to_current_year_is_noop() {
        let mut glacier = small_glacier();
        glacier.progress_to_year(10.0).unwrap();
        glacier.progress_to_year(10.0).unwrap();

        assert_relative_eq!(glacier.age(), 10.0);
        assert_eq!(glacier.history().len(), 11);
    }

    #[test]
    fn test_progress_into_the_past_is_an_error() {
        let mut glacier = small_glacier();
        glacier.progress_to_year(10.0).unwrap();

        let err = glacier.progress_to_year(5.0).unwrap_err();
        assert!(matches!(err, SgmError::YearInPast { .. }));
    }

    #[test]
    fn test_volume_grows_during_spinup() {
        let mut glacier = small_glacier();
        glacier.progress_to_year(60.0).unwrap();

        let volume = glacier.history().volume_km3();
        assert!(volume[10] > 0.0);
        assert!(volume[59] > volume[10]);
    }

    #[test]
    fn test_climate_bias_consumed_year_by_year() {
        let mut glacier = small_glacier();
        glacier.add_temperature_bias(1.0, 4);
        assert_eq!(glacier.pending_climate().len(), 4);

        glacier.progress_to_year(2.0).unwrap();
        assert_eq!(glacier.pending_climate().len(), 2);
        assert_relative_eq!(glacier.mass_balance().temp_bias(), 0.5);

        glacier.progress_to_year(4.0).unwrap();
        assert!(glacier.pending_climate().is_empty());
        assert_relative_eq!(glacier.mass_balance().temp_bias(), 1.0);
        assert_relative_eq!(glacier.ela(), 2650.0);
    }

    #[test]
    fn test_history_tracks_ela() {
        let mut glacier = small_glacier();
        glacier.add_temperature_bias(2.0, 2);
        glacier.progress_to_year(2.0).unwrap();

        let ela = glacier.history().ela_m();
        assert_relative_eq!(ela[0], 2500.0);
        assert_relative_eq!(ela[1], 2650.0);
        assert_relative_eq!(ela[2], 2800.0);
    }

    #[test]
    fn test_equilibrium_refused_while_climate_pending() {
        let mut glacier = small_glacier();
        glacier.add_temperature_bias(1.0, 10);

        let err = glacier.progress_to_equilibrium().unwrap_err();
        assert!(matches!(err, SgmError::PendingClimate));
    }

    #[test]
    fn test_setters_validate() {
        let mut glacier = small_glacier();
        assert!(glacier.set_creep(1e-23).is_ok());
        assert!(glacier.set_creep(-1.0).is_err());
        assert!(glacier.set_basal_sliding(5.7e-20).is_ok());
        assert!(glacier.set_basal_sliding(-1.0).is_err());
        // A failed update leaves the previous value in place
        assert_relative_eq!(glacier.basal_sliding(), 5.7e-20);
    }

    #[test]
    fn test_clone_diverges_independently() {
        let mut a = small_glacier();
        let mut b = a.clone();

        a.progress_to_year(20.0).unwrap();
        b.mass_balance_mut().set_temp_bias(2.0);
        b.progress_to_year(20.0).unwrap();

        assert!(a.volume_km3() > b.volume_km3());
    }

    #[test]
    fn test_serialization_round_trip() {
        let mut glacier = small_glacier();
        glacier.progress_to_year(5.0).unwrap();

        let json = serde_json::to_string(&glacier).expect("Serialization failed");
        let parsed: Glacier = serde_json::from_str(&json).expect("Deserialization failed");

        assert_relative_eq!(glacier.age(), parsed.age());
        assert_relative_eq!(glacier.volume_km3(), parsed.volume_km3());
        assert_eq!(glacier.history().len(), parsed.history().len());
    }
}
