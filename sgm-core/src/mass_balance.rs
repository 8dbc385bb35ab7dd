//! Elevation-dependent accumulation and ablation.
//!
//! The annual mass balance is a continuous, piecewise-linear function of
//! elevation that is zero at the equilibrium line altitude (ELA):
//!
//! $$\dot{b}(z) = \frac{1}{\rho_{ice}} \int_{ELA}^{z} \gamma(\zeta)\, d\zeta$$
//!
//! where $\gamma$ is the balance gradient in mm w.e. per metre per year. A
//! temperature bias shifts the effective ELA without touching the gradient.

use crate::constants::RHO_ICE;
use crate::errors::{SgmError, SgmResult};
use serde::{Deserialize, Serialize};

/// Default ELA shift per degree of temperature bias (m/K).
const ELA_SHIFT_PER_DEGREE: f64 = 150.0;

/// Balance gradient with elevation: a single value, or one value per
/// altitude band separated by descending breakpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Gradient {
    /// One gradient for the whole profile (mm w.e. / m / yr).
    Uniform(f64),
    /// `gradients[k]` applies between `breakpoints[k - 1]` and
    /// `breakpoints[k]`; `gradients.len() == breakpoints.len() + 1`.
    Piecewise {
        gradients: Vec<f64>,
        breakpoints: Vec<f64>,
    },
}

/// Linear (or piecewise-linear) elevation-dependent mass balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MassBalance {
    orig_ela: f64,
    gradient: Gradient,
    temp_bias: f64,
    ela_shift_per_degree: f64,
    max_mb: Option<f64>,
}

impl MassBalance {
    /// A mass balance with a uniform gradient (mm w.e. / m / yr).
    pub fn new(ela: f64, gradient: f64) -> SgmResult<Self> {
        Self::with_gradient(ela, Gradient::Uniform(gradient))
    }

    /// A mass balance whose gradient changes at the given breakpoint
    /// altitudes (descending, m). `gradients` needs one more entry than
    /// `breakpoints`; the first gradient applies above the first breakpoint.
    pub fn with_breakpoints(
        ela: f64,
        gradients: Vec<f64>,
        breakpoints: Vec<f64>,
    ) -> SgmResult<Self> {
        Self::with_gradient(
            ela,
            Gradient::Piecewise {
                gradients,
                breakpoints,
            },
        )
    }

    fn with_gradient(ela: f64, gradient: Gradient) -> SgmResult<Self> {
        validate_gradient(&gradient)?;
        if !ela.is_finite() {
            return Err(SgmError::InvalidMassBalance(format!(
                "ELA must be finite, got {ela}"
            )));
        }
        Ok(Self {
            orig_ela: ela,
            gradient,
            temp_bias: 0.0,
            ela_shift_per_degree: ELA_SHIFT_PER_DEGREE,
            max_mb: None,
        })
    }

    /// Cap accumulation at `max_mb` (m ice / yr).
    pub fn with_max_mb(mut self, max_mb: f64) -> Self {
        self.max_mb = Some(max_mb);
        self
    }

    /// Override the ELA shift per degree of temperature bias (m/K).
    pub fn with_ela_sensitivity(mut self, shift_per_degree: f64) -> Self {
        self.ela_shift_per_degree = shift_per_degree;
        self
    }

    /// The effective ELA (m), including the temperature bias.
    pub fn ela(&self) -> f64 {
        self.orig_ela + self.temp_bias * self.ela_shift_per_degree
    }

    /// The ELA without any temperature bias (m).
    pub fn unbiased_ela(&self) -> f64 {
        self.orig_ela
    }

    /// Move the unbiased ELA; the current temperature bias still applies.
    pub fn set_ela(&mut self, ela: f64) -> SgmResult<()> {
        if !ela.is_finite() {
            return Err(SgmError::InvalidMassBalance(format!(
                "ELA must be finite, got {ela}"
            )));
        }
        self.orig_ela = ela;
        Ok(())
    }

    /// Current temperature bias (K).
    pub fn temp_bias(&self) -> f64 {
        self.temp_bias
    }

    /// Set the temperature bias (K); positive warms and raises the ELA.
    pub fn set_temp_bias(&mut self, bias: f64) {
        self.temp_bias = bias;
    }

    /// Replace the gradient with a uniform one (mm w.e. / m / yr).
    pub fn set_gradient(&mut self, gradient: f64) -> SgmResult<()> {
        let gradient = Gradient::Uniform(gradient);
        validate_gradient(&gradient)?;
        self.gradient = gradient;
        Ok(())
    }

    /// The gradient definition.
    pub fn gradient(&self) -> &Gradient {
        &self.gradient
    }

    /// The gradient that applies at an elevation (mm w.e. / m / yr).
    pub fn gradient_at(&self, elevation: f64) -> f64 {
        match &self.gradient {
            Gradient::Uniform(g) => *g,
            Gradient::Piecewise {
                gradients,
                breakpoints,
            } => {
                let mut k = 0;
                while k < breakpoints.len() && elevation < breakpoints[k] {
                    k += 1;
                }
                gradients[k]
            }
        }
    }

    /// Annual mass balance at an elevation (m ice / yr).
    ///
    /// Zero at the effective ELA, positive above, negative below, continuous
    /// across gradient breakpoints.
    pub fn annual_mb(&self, elevation: f64) -> f64 {
        let ela = self.ela();
        let mb_mm_we = match &self.gradient {
            Gradient::Uniform(g) => (elevation - ela) * g,
            Gradient::Piecewise {
                gradients,
                breakpoints,
            } => {
                let (lo, hi) = if elevation >= ela {
                    (ela, elevation)
                } else {
                    (elevation, ela)
                };
                let mut integral = 0.0;
                for (k, &g) in gradients.iter().enumerate() {
                    let upper = if k == 0 {
                        f64::INFINITY
                    } else {
                        breakpoints[k - 1]
                    };
                    let lower = if k == breakpoints.len() {
                        f64::NEG_INFINITY
                    } else {
                        breakpoints[k]
                    };
                    let overlap = (hi.min(upper) - lo.max(lower)).max(0.0);
                    integral += g * overlap;
                }
                if elevation >= ela {
                    integral
                } else {
                    -integral
                }
            }
        };
        let mb = mb_mm_we / RHO_ICE;
        match self.max_mb {
            Some(cap) => mb.min(cap),
            None => mb,
        }
    }
}

fn validate_gradient(gradient: &Gradient) -> SgmResult<()> {
    match gradient {
        Gradient::Uniform(g) => {
            if !(g.is_finite() && *g > 0.0) {
                return Err(SgmError::InvalidMassBalance(format!(
                    "gradient must be positive, got {g}"
                )));
            }
        }
        Gradient::Piecewise {
            gradients,
            breakpoints,
        } => {
            if gradients.len() != breakpoints.len() + 1 {
                return Err(SgmError::LengthMismatch {
                    expected: breakpoints.len() + 1,
                    got: gradients.len(),
                });
            }
            if gradients.iter().any(|&g| !(g.is_finite() && g > 0.0)) {
                return Err(SgmError::InvalidMassBalance(
                    "all gradients must be positive".to_string(),
                ));
            }
            if breakpoints.windows(2).any(|w| w[1] >= w[0]) {
                return Err(SgmError::InvalidMassBalance(
                    "breakpoints must be strictly descending".to_string(),
                ));
            }
        }
    }
    Ok(())
}
