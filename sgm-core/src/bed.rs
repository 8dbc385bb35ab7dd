//! Valley geometry along a one-dimensional flowline.
//!
//! A [`GlacierBed`] holds the bedrock altitude and valley width at `nx` grid
//! points spaced `map_dx` metres apart, highest point first. Beds are
//! constructed through [`GlacierBedBuilder`], which supports a uniform slope,
//! a piecewise width profile and a piecewise slope profile.

use crate::errors::{SgmError, SgmResult};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

const DEFAULT_NX: usize = 200;
const DEFAULT_MAP_DX: f64 = 100.0;

/// Bedrock altitude and valley width along the flowline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlacierBed {
    bed_h: Array1<f64>,
    widths: Array1<f64>,
    map_dx: f64,
}

impl GlacierBed {
    /// Start building a bed.
    pub fn builder() -> GlacierBedBuilder {
        GlacierBedBuilder::new()
    }

    /// Construct a bed directly from altitude and width profiles.
    ///
    /// `bed_h` must be non-increasing (the flowline runs downhill) and all
    /// widths must be positive.
    pub fn from_profiles(bed_h: Vec<f64>, widths: Vec<f64>, map_dx: f64) -> SgmResult<Self> {
        if bed_h.len() < 2 {
            return Err(SgmError::InvalidBed(format!(
                "need at least 2 grid points, got {}",
                bed_h.len()
            )));
        }
        if bed_h.len() != widths.len() {
            return Err(SgmError::LengthMismatch {
                expected: bed_h.len(),
                got: widths.len(),
            });
        }
        if !(map_dx > 0.0) {
            return Err(SgmError::InvalidBed(format!(
                "map_dx must be positive, got {map_dx}"
            )));
        }
        if bed_h.windows(2).any(|w| w[1] > w[0]) {
            return Err(SgmError::InvalidBed(
                "bed altitude must not increase along the flowline".to_string(),
            ));
        }
        if widths.iter().any(|&w| !(w > 0.0)) {
            return Err(SgmError::InvalidBed(
                "all widths must be positive".to_string(),
            ));
        }
        Ok(Self {
            bed_h: Array1::from_vec(bed_h),
            widths: Array1::from_vec(widths),
            map_dx,
        })
    }

    /// Number of grid points.
    pub fn nx(&self) -> usize {
        self.bed_h.len()
    }

    /// Grid spacing (m).
    pub fn map_dx(&self) -> f64 {
        self.map_dx
    }

    /// Bedrock altitude profile (m), highest point first.
    pub fn bed_h(&self) -> &Array1<f64> {
        &self.bed_h
    }

    /// Valley width profile (m).
    pub fn widths(&self) -> &Array1<f64> {
        &self.widths
    }

    /// Altitude of the top of the bed (m).
    pub fn top(&self) -> f64 {
        self.bed_h[0]
    }

    /// Altitude of the bottom of the bed (m).
    pub fn bottom(&self) -> f64 {
        self.bed_h[self.bed_h.len() - 1]
    }

    /// Distance along the flowline at each grid point (km).
    pub fn distance_along_km(&self) -> Array1<f64> {
        Array1::from_iter((0..self.nx()).map(|i| i as f64 * self.map_dx / 1000.0))
    }
}

/// Builder for [`GlacierBed`].
///
/// Three construction modes, checked in this order:
/// - `slopes` + `slope_sections`: piecewise slope profile from `top`;
///   the bottom altitude is derived from the profile.
/// - `top` + `bottom` (+ optional `altitude_widths`): linear altitude profile,
///   widths either uniform or interpolated between control points.
#[derive(Debug, Clone, Default)]
pub struct GlacierBedBuilder {
    top: Option<f64>,
    bottom: Option<f64>,
    width: Option<f64>,
    nx: Option<usize>,
    map_dx: Option<f64>,
    altitudes: Option<Vec<f64>>,
    widths: Option<Vec<f64>>,
    slopes: Option<Vec<f64>>,
    slope_sections: Option<Vec<f64>>,
}

impl GlacierBedBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Altitude of the highest grid point (m).
    pub fn top(&mut self, top: f64) -> &mut Self {
        self.top = Some(top);
        self
    }

    /// Altitude of the lowest grid point (m).
    pub fn bottom(&mut self, bottom: f64) -> &mut Self {
        self.bottom = Some(bottom);
        self
    }

    /// Uniform valley width (m).
    pub fn width(&mut self, width: f64) -> &mut Self {
        self.width = Some(width);
        self
    }

    /// Number of grid points (default 200).
    pub fn nx(&mut self, nx: usize) -> &mut Self {
        self.nx = Some(nx);
        self
    }

    /// Grid spacing in metres (default 100).
    pub fn map_dx(&mut self, map_dx: f64) -> &mut Self {
        self.map_dx = Some(map_dx);
        self
    }

    /// Piecewise width profile: widths linearly interpolated between
    /// (`altitude`, `width`) control points. Altitudes must be strictly
    /// descending and cover the whole altitude range of the bed.
    pub fn altitude_widths(&mut self, altitudes: Vec<f64>, widths: Vec<f64>) -> &mut Self {
        self.altitudes = Some(altitudes);
        self.widths = Some(widths);
        self
    }

    /// Piecewise slope profile. `slopes` are grades in (0, 1]; `slope_sections`
    /// gives the along-flowline distance (m) of the section boundaries and
    /// must have one more entry than `slopes`, starting at 0.
    pub fn slopes(&mut self, slopes: Vec<f64>, slope_sections: Vec<f64>) -> &mut Self {
        self.slopes = Some(slopes);
        self.slope_sections = Some(slope_sections);
        self
    }

    pub fn build(&self) -> SgmResult<GlacierBed> {
        let map_dx = self.map_dx.unwrap_or(DEFAULT_MAP_DX);
        if !(map_dx > 0.0) {
            return Err(SgmError::InvalidBed(format!(
                "map_dx must be positive, got {map_dx}"
            )));
        }

        let bed_h = if self.slopes.is_some() {
            self.bed_from_slopes(map_dx)?
        } else {
            self.bed_from_top_bottom()?
        };

        let widths = match (&self.altitudes, &self.widths) {
            (Some(altitudes), Some(widths)) => interp_widths(altitudes, widths, &bed_h)?,
            _ => {
                let width = self.width.ok_or_else(|| {
                    SgmError::InvalidBed(
                        "a uniform width (or a width profile) is required".to_string(),
                    )
                })?;
                if !(width > 0.0) {
                    return Err(SgmError::InvalidBed(format!(
                        "width must be positive, got {width}"
                    )));
                }
                vec![width; bed_h.len()]
            }
        };

        GlacierBed::from_profiles(bed_h, widths, map_dx)
    }

    fn bed_from_top_bottom(&self) -> SgmResult<Vec<f64>> {
        let top = self
            .top
            .ok_or_else(|| SgmError::InvalidBed("top altitude is required".to_string()))?;
        let bottom = self
            .bottom
            .ok_or_else(|| SgmError::InvalidBed("bottom altitude is required".to_string()))?;
        if top <= bottom {
            return Err(SgmError::InvalidBed(format!(
                "top ({top}) must lie above bottom ({bottom})"
            )));
        }
        let nx = self.nx.unwrap_or(DEFAULT_NX);
        if nx < 2 {
            return Err(SgmError::InvalidBed(format!(
                "need at least 2 grid points, got {nx}"
            )));
        }
        let step = (top - bottom) / (nx - 1) as f64;
        Ok((0..nx).map(|i| top - i as f64 * step).collect())
    }

    fn bed_from_slopes(&self, map_dx: f64) -> SgmResult<Vec<f64>> {
        let top = self
            .top
            .ok_or_else(|| SgmError::InvalidBed("top altitude is required".to_string()))?;
        if self.bottom.is_some() {
            return Err(SgmError::InvalidBed(
                "bottom is derived from the slope profile; do not set it".to_string(),
            ));
        }
        let slopes = self.slopes.as_ref().unwrap();
        let sections = self.slope_sections.as_ref().ok_or_else(|| {
            SgmError::InvalidBed("slope_sections are required with slopes".to_string())
        })?;
        if sections.len() != slopes.len() + 1 {
            return Err(SgmError::LengthMismatch {
                expected: slopes.len() + 1,
                got: sections.len(),
            });
        }
        if sections[0] != 0.0 {
            return Err(SgmError::InvalidBed(
                "slope_sections must start at 0".to_string(),
            ));
        }
        if sections.windows(2).any(|w| w[1] <= w[0]) {
            return Err(SgmError::InvalidBed(
                "slope_sections must be strictly increasing".to_string(),
            ));
        }
        if slopes.iter().any(|&s| !(s > 0.0 && s <= 1.0)) {
            return Err(SgmError::InvalidBed(
                "slopes must be grades in (0, 1]".to_string(),
            ));
        }

        let total = *sections.last().unwrap();
        let nx = (total / map_dx).floor() as usize + 1;
        if nx < 2 {
            return Err(SgmError::InvalidBed(
                "slope profile is shorter than one grid cell".to_string(),
            ));
        }

        let mut bed_h = Vec::with_capacity(nx);
        for i in 0..nx {
            let x = i as f64 * map_dx;
            let mut altitude = top;
            for (k, &slope) in slopes.iter().enumerate() {
                let lo = sections[k];
                let hi = sections[k + 1];
                let overlap = (x.min(hi) - lo).max(0.0);
                altitude -= slope * overlap;
            }
            bed_h.push(altitude);
        }
        Ok(bed_h)
    }
}

/// Linearly interpolate widths given at descending altitude control points
/// onto the bed altitude profile.
fn interp_widths(altitudes: &[f64], widths: &[f64], bed_h: &[f64]) -> SgmResult<Vec<f64>> {
    if altitudes.len() != widths.len() {
        return Err(SgmError::LengthMismatch {
            expected: altitudes.len(),
            got: widths.len(),
        });
    }
    if altitudes.len() < 2 {
        return Err(SgmError::InvalidBed(
            "a width profile needs at least 2 control points".to_string(),
        ));
    }
    if altitudes.windows(2).any(|w| w[1] >= w[0]) {
        return Err(SgmError::InvalidBed(
            "width-profile altitudes must be strictly descending".to_string(),
        ));
    }
    if widths.iter().any(|&w| !(w > 0.0)) {
        return Err(SgmError::InvalidBed(
            "all widths must be positive".to_string(),
        ));
    }
    let top = bed_h[0];
    let bottom = bed_h[bed_h.len() - 1];
    if altitudes[0] < top || *altitudes.last().unwrap() > bottom {
        return Err(SgmError::InvalidBed(format!(
            "width profile must cover the full bed range [{bottom}, {top}]"
        )));
    }

    Ok(bed_h
        .iter()
        .map(|&z| {
            // Find the control segment containing z (altitudes descend).
            let mut k = 0;
            while k + 2 < altitudes.len() && z < altitudes[k + 1] {
                k += 1;
            }
            let (z0, z1) = (altitudes[k], altitudes[k + 1]);
            let (w0, w1) = (widths[k], widths[k + 1]);
            let frac = (z0 - z) / (z0 - z1);
            w0 + frac.clamp(0.0, 1.0) * (w1 - w0)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_uniform_bed() {
        let bed = GlacierBed::builder()
            .top(3400.0)
            .bottom(1500.0)
            .width(300.0)
            .build()
            .unwrap();

        assert_eq!(bed.nx(), 200);
        assert_relative_eq!(bed.top(), 3400.0);
        assert_relative_eq!(bed.bottom(), 1500.0);
        assert_relative_eq!(bed.map_dx(), 100.0);
        assert!(bed.widths().iter().all(|&w| (w - 300.0).abs() < 1e-12));

        // Linear profile
        let mid = bed.bed_h()[100];
        let expected = 3400.0 - 100.0 * (3400.0 - 1500.0) / 199.0;
        assert_relative_eq!(mid, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_top_below_bottom_rejected() {
        let err = GlacierBed::builder()
            .top(1000.0)
            .bottom(2000.0)
            .width(300.0)
            .build()
            .unwrap_err();
        assert!(matches!(err, SgmError::InvalidBed(_)));
    }

    #[test]
    fn test_missing_width_rejected() {
        assert!(GlacierBed::builder()
            .top(3000.0)
            .bottom(1500.0)
            .build()
            .is_err());
    }

    #[test]
    fn test_width_profile_interpolation() {
        let bed = GlacierBed::builder()
            .top(3000.0)
            .bottom(2000.0)
            .nx(101)
            .altitude_widths(vec![3000.0, 2000.0], vec![600.0, 200.0])
            .build()
            .unwrap();

        assert_relative_eq!(bed.widths()[0], 600.0);
        assert_relative_eq!(bed.widths()[100], 200.0);
        // Halfway down in altitude -> halfway between the control widths
        assert_relative_eq!(bed.widths()[50], 400.0, epsilon = 1e-6);
    }

    #[test]
    fn test_width_profile_must_cover_bed() {
        let err = GlacierBed::builder()
            .top(3000.0)
            .bottom(1500.0)
            .altitude_widths(vec![2800.0, 1500.0], vec![400.0, 200.0])
            .build()
            .unwrap_err();
        assert!(matches!(err, SgmError::InvalidBed(_)));
    }

    #[test]
    fn test_slope_profile() {
        // 2 km at 20% then 4 km at 5%: drops 400 m then 200 m
        let bed = GlacierBed::builder()
            .top(3000.0)
            .width(300.0)
            .slopes(vec![0.2, 0.05], vec![0.0, 2000.0, 6000.0])
            .build()
            .unwrap();

        assert_eq!(bed.nx(), 61);
        assert_relative_eq!(bed.top(), 3000.0);
        assert_relative_eq!(bed.bed_h()[20], 2600.0, epsilon = 1e-9);
        assert_relative_eq!(bed.bottom(), 2400.0, epsilon = 1e-9);
    }

    #[test]
    fn test_slope_profile_rejects_bottom() {
        assert!(GlacierBed::builder()
            .top(3000.0)
            .bottom(2000.0)
            .width(300.0)
            .slopes(vec![0.1], vec![0.0, 5000.0])
            .build()
            .is_err());
    }

    #[test]
    fn test_from_profiles_rejects_uphill() {
        let err =
            GlacierBed::from_profiles(vec![3000.0, 2900.0, 2950.0], vec![300.0; 3], 100.0)
                .unwrap_err();
        assert!(matches!(err, SgmError::InvalidBed(_)));
    }

    #[test]
    fn test_distance_along() {
        let bed = GlacierBed::builder()
            .top(3000.0)
            .bottom(2000.0)
            .width(300.0)
            .nx(11)
            .map_dx(500.0)
            .build()
            .unwrap();

        let d = bed.distance_along_km();
        assert_relative_eq!(d[0], 0.0);
        assert_relative_eq!(d[10], 5.0);
    }

    #[test]
    fn test_serialization() {
        let bed = GlacierBed::builder()
            .top(3400.0)
            .bottom(1500.0)
            .width(300.0)
            .build()
            .unwrap();
        let json = serde_json::to_string(&bed).expect("Serialization failed");
        let parsed: GlacierBed = serde_json::from_str(&json).expect("Deserialization failed");

        assert_eq!(bed.nx(), parsed.nx());
        assert_relative_eq!(bed.top(), parsed.top());
    }
}
