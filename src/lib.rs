//! Simple glacier models: an interactive toolkit for teaching ice-flow
//! mechanics.
//!
//! Build a valley ([`GlacierBed`]), hang a climate on it ([`MassBalance`]),
//! and watch a [`Glacier`] grow, equilibrate, retreat or surge. Everything a
//! classroom experiment needs is re-exported here; the pieces live in
//! `sgm-core` (geometry, forcing, ice dynamics) and `sgm-components`
//! (surging glaciers, collections, melt accounting).
//!
//! ```no_run
//! use sgm::{Glacier, GlacierBed, MassBalance};
//!
//! let bed = GlacierBed::builder()
//!     .top(3400.0)
//!     .bottom(1500.0)
//!     .width(300.0)
//!     .build()?;
//! let mut glacier = Glacier::new(bed, MassBalance::new(3000.0, 4.0)?);
//! glacier.progress_to_equilibrium()?;
//! println!("length: {:.1} km", glacier.length_m() / 1000.0);
//! # Ok::<(), sgm::SgmError>(())
//! ```

pub use sgm_core::bed::{GlacierBed, GlacierBedBuilder};
pub use sgm_core::climate::BiasSchedule;
pub use sgm_core::config::PhysicsParams;
pub use sgm_core::constants;
pub use sgm_core::errors::{SgmError, SgmResult};
pub use sgm_core::glacier::Glacier;
pub use sgm_core::history::{History, HistoryRecord};
pub use sgm_core::mass_balance::{Gradient, MassBalance};

pub use sgm_components::collection::{AttributeSeries, GlacierCollection};
pub use sgm_components::model::{AttributeChange, GlacierModel, GlacierSummary};
pub use sgm_components::runoff::{annual_melt_m3_we, peak_water, track_melt, PeakWater, RunoffSeries};
pub use sgm_components::surging::SurgingGlacier;
