//! Batch operations across many glaciers.
//!
//! A [`GlacierCollection`] holds standard and surging glaciers behind the
//! [`GlacierModel`] trait and applies the same operation to every member:
//! progressing in time, equilibrating, or updating one attribute per glacier
//! from a vector of values.

use crate::model::{AttributeChange, GlacierModel, GlacierSummary};
use serde::{Deserialize, Serialize};
use sgm_core::errors::{SgmError, SgmResult};
use sgm_core::glacier::Glacier;

/// One attribute, one value per glacier in the collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeSeries {
    TempBias(Vec<f64>),
    Ela(Vec<f64>),
    Gradient(Vec<f64>),
    Creep(Vec<f64>),
    BasalSliding(Vec<f64>),
}

impl AttributeSeries {
    fn values(&self) -> &[f64] {
        match self {
            AttributeSeries::TempBias(v)
            | AttributeSeries::Ela(v)
            | AttributeSeries::Gradient(v)
            | AttributeSeries::Creep(v)
            | AttributeSeries::BasalSliding(v) => v,
        }
    }

    fn change_for(&self, i: usize) -> AttributeChange {
        match self {
            AttributeSeries::TempBias(v) => AttributeChange::TempBias(v[i]),
            AttributeSeries::Ela(v) => AttributeChange::Ela(v[i]),
            AttributeSeries::Gradient(v) => AttributeChange::Gradient(v[i]),
            AttributeSeries::Creep(v) => AttributeChange::Creep(v[i]),
            AttributeSeries::BasalSliding(v) => AttributeChange::BasalSliding(v[i]),
        }
    }
}

/// A batch of glaciers addressed as one.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GlacierCollection {
    glaciers: Vec<Box<dyn GlacierModel>>,
}

impl GlacierCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one glacier (standard or surging).
    pub fn add<G: GlacierModel + 'static>(&mut self, glacier: G) {
        self.glaciers.push(Box::new(glacier));
    }

    /// Add `n` clones of a template glacier, ready for
    /// [`change_attributes`](Self::change_attributes).
    pub fn fill(&mut self, template: &Glacier, n: usize) {
        for _ in 0..n {
            self.add(template.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.glaciers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glaciers.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&dyn GlacierModel> {
        self.glaciers.get(i).map(|g| g.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn GlacierModel> {
        self.glaciers.iter().map(|g| g.as_ref())
    }

    /// Apply one attribute value per glacier.
    ///
    /// The series length must match the collection.
    pub fn change_attributes(&mut self, series: &AttributeSeries) -> SgmResult<()> {
        if self.glaciers.is_empty() {
            return Err(SgmError::EmptyCollection);
        }
        let values = series.values();
        if values.len() != self.glaciers.len() {
            return Err(SgmError::LengthMismatch {
                expected: self.glaciers.len(),
                got: values.len(),
            });
        }
        for (i, glacier) in self.glaciers.iter_mut().enumerate() {
            glacier.apply_change(series.change_for(i))?;
        }
        Ok(())
    }

    /// Progress every glacier to the given age.
    pub fn progress_to_year(&mut self, year: f64) -> SgmResult<()> {
        if self.glaciers.is_empty() {
            return Err(SgmError::EmptyCollection);
        }
        for glacier in &mut self.glaciers {
            glacier.progress_to_year(year)?;
        }
        Ok(())
    }

    /// Progress every glacier to its equilibrium.
    ///
    /// Fails fast on the first member without one (e.g. a surging glacier).
    pub fn progress_to_equilibrium(&mut self) -> SgmResult<()> {
        if self.glaciers.is_empty() {
            return Err(SgmError::EmptyCollection);
        }
        for glacier in &mut self.glaciers {
            glacier.progress_to_equilibrium()?;
        }
        Ok(())
    }

    /// One summary row per glacier.
    pub fn summary(&self) -> Vec<GlacierSummary> {
        self.glaciers.iter().map(|g| g.summary()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surging::SurgingGlacier;
    use approx::assert_relative_eq;
    use sgm_core::bed::GlacierBed;
    use sgm_core::mass_balance::MassBalance;

    fn bed() -> GlacierBed {
        GlacierBed::builder()
            .top(3000.0)
            .bottom(1500.0)
            .width(300.0)
            .nx(100)
            .build()
            .unwrap()
    }

    fn glacier() -> Glacier {
        Glacier::new(bed(), MassBalance::new(2500.0, 4.0).unwrap())
    }

    #[test]
    fn test_empty_collection_refuses_operations() {
        let mut collection = GlacierCollection::new();
        assert!(matches!(
            collection.progress_to_year(10.0),
            Err(SgmError::EmptyCollection)
        ));
        assert!(matches!(
            collection.change_attributes(&AttributeSeries::TempBias(vec![])),
            Err(SgmError::EmptyCollection)
        ));
    }

    #[test]
    fn test_fill_clones_template() {
        let mut collection = GlacierCollection::new();
        collection.fill(&glacier(), 3);

        assert_eq!(collection.len(), 3);
        collection
            .change_attributes(&AttributeSeries::Gradient(vec![4.0, 8.0, 12.0]))
            .unwrap();
        collection.progress_to_year(30.0).unwrap();

        // A steeper balance gradient feeds the glacier faster
        let summary = collection.summary();
        assert!(summary[1].volume_km3 > summary[0].volume_km3);
        assert!(summary[2].volume_km3 > summary[1].volume_km3);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let mut collection = GlacierCollection::new();
        collection.fill(&glacier(), 2);

        let err = collection
            .change_attributes(&AttributeSeries::TempBias(vec![0.5]))
            .unwrap_err();
        assert!(matches!(err, SgmError::LengthMismatch { .. }));
    }

    #[test]
    fn test_mixed_collection_progresses_together() {
        let mut collection = GlacierCollection::new();
        collection.add(glacier());
        collection.add(SurgingGlacier::new(
            bed(),
            MassBalance::new(2500.0, 4.0).unwrap(),
        ));

        collection.progress_to_year(20.0).unwrap();

        let summary = collection.summary();
        assert_eq!(summary.len(), 2);
        assert_relative_eq!(summary[0].age, 20.0);
        assert_relative_eq!(summary[1].age, 20.0);
        assert_eq!(summary[0].kind, "Glacier");
        assert_eq!(summary[1].kind, "SurgingGlacier");
    }

    #[test]
    fn test_equilibrium_fails_fast_with_surging_member() {
        let mut collection = GlacierCollection::new();
        collection.add(SurgingGlacier::new(
            bed(),
            MassBalance::new(2500.0, 4.0).unwrap(),
        ));

        assert!(matches!(
            collection.progress_to_equilibrium(),
            Err(SgmError::NoEquilibrium)
        ));
    }

    #[test]
    fn test_serialization_round_trip() {
        let mut collection = GlacierCollection::new();
        collection.add(glacier());
        collection.add(SurgingGlacier::new(
            bed(),
            MassBalance::new(2500.0, 4.0).unwrap(),
        ));

        let json = serde_json::to_string(&collection).expect("Serialization failed");
        let parsed: GlacierCollection =
            serde_json::from_str(&json).expect("Deserialization failed");

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.summary()[1].kind, "SurgingGlacier");
    }
}
