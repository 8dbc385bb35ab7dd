//! Core building blocks for simple one-dimensional glacier models.
//!
//! A glacier is assembled from a [`bed::GlacierBed`] (valley geometry along a
//! flowline) and a [`mass_balance::MassBalance`] (elevation-dependent
//! accumulation/ablation). The resulting [`glacier::Glacier`] evolves its ice
//! thickness with a shallow-ice flowline scheme and records scalar
//! diagnostics per simulated year in a [`history::History`].

pub mod bed;
pub mod climate;
pub mod config;
pub mod constants;
mod flowline;
pub mod glacier;
pub mod history;
pub mod mass_balance;

pub mod errors;
