//! Shallow-ice flowline dynamics on a staggered grid.
//!
//! The ice surface evolves from the continuity equation for rectangular
//! cross-sections,
//!
//! $$\frac{\partial S}{\partial t} = w\,\dot{b} - \frac{\partial q}{\partial x},$$
//!
//! with the volume flux $q = u\,S$ evaluated at cell interfaces. The depth-
//! integrated velocity combines internal deformation and basal sliding:
//!
//! $$u = (\rho g \alpha)^n \left(f_d h^{n+1} + f_s h^{n-1}\right)$$
//!
//! where $\alpha$ is the surface slope. The explicit timestep adapts to the
//! fastest ice in the domain through a CFL condition.

use crate::bed::GlacierBed;
use crate::config::PhysicsParams;
use crate::constants::SEC_IN_YEAR;
use crate::errors::{SgmError, SgmResult};
use crate::mass_balance::MassBalance;
use log::debug;
use ndarray::Array1;

/// Diagnostics of one simulated year.
#[derive(Debug, Clone, Copy)]
pub(crate) struct YearStats {
    /// Fastest ice anywhere in the domain during the year (m/yr).
    pub max_velocity_m_yr: f64,
    /// Number of explicit substeps taken.
    pub n_steps: usize,
}

/// Advance the thickness profile by one year of ice flow and mass balance.
///
/// `year` is the age the glacier is progressing towards; it only appears in
/// errors and logs.
pub(crate) fn advance_one_year(
    bed: &GlacierBed,
    mass_balance: &MassBalance,
    params: &PhysicsParams,
    thickness: &mut Array1<f64>,
    year: f64,
) -> SgmResult<YearStats> {
    let nx = bed.nx();
    let dx = bed.map_dx();
    let bed_h = bed.bed_h();
    let widths = bed.widths();

    let rho_g = params.ice_density * params.gravity;
    let fd = params.deformation_factor();
    let fs = params.basal_sliding;
    let n = params.glen_n;

    let mut flux = vec![0.0; nx - 1];
    let mut max_u = 0.0_f64;
    let mut steps = 0_usize;
    let mut t = 0.0;

    while t < SEC_IN_YEAR {
        // Velocities and fluxes at the interfaces between grid points.
        let mut u_max_step = 0.0_f64;
        for i in 0..nx - 1 {
            let h_avg = 0.5 * (thickness[i] + thickness[i + 1]);
            if h_avg <= 0.0 {
                flux[i] = 0.0;
                continue;
            }
            let s_up = bed_h[i] + thickness[i];
            let s_down = bed_h[i + 1] + thickness[i + 1];
            // Positive when the surface drops downstream.
            let slope = (s_up - s_down) / dx;
            let stress = (rho_g * slope.abs()).powf(n);
            let u = slope.signum()
                * stress
                * (fd * h_avg.powf(n + 1.0) + fs * h_avg.powf(n - 1.0));
            let w_avg = 0.5 * (widths[i] + widths[i + 1]);
            flux[i] = u * h_avg * w_avg;
            u_max_step = u_max_step.max(u.abs());
        }

        let remaining = SEC_IN_YEAR - t;
        let mut dt = params.dt_max.min(remaining);
        if u_max_step > 0.0 {
            dt = dt.min(params.cfl_number * dx / u_max_step);
        }
        // The final substep may legitimately be shorter than dt_min.
        if dt < params.dt_min.min(remaining) {
            return Err(SgmError::UnstableTimestep { dt, year });
        }

        // Continuity: update each cell's section from mass balance and the
        // flux divergence, then clip at zero thickness.
        for i in 0..nx {
            let surface = bed_h[i] + thickness[i];
            let mb_rate = mass_balance.annual_mb(surface) / SEC_IN_YEAR;
            let q_in = if i == 0 { 0.0 } else { flux[i - 1] };
            let q_out = if i == nx - 1 { 0.0 } else { flux[i] };
            let ds_dt = widths[i] * mb_rate + (q_in - q_out) / dx;
            let section = (thickness[i] * widths[i] + dt * ds_dt).max(0.0);
            thickness[i] = section / widths[i];
        }

        if thickness[nx - 1] > 0.0 {
            return Err(SgmError::DomainExceeded {
                year,
                domain_m: (nx - 1) as f64 * dx,
            });
        }

        t += dt;
        steps += 1;
        max_u = max_u.max(u_max_step);
    }

    let max_velocity_m_yr = max_u * SEC_IN_YEAR;
    debug!("year {year:.0}: {steps} substeps, max velocity {max_velocity_m_yr:.1} m/yr");

    Ok(YearStats {
        max_velocity_m_yr,
        n_steps: steps,
    })
}
