use thiserror::Error;

/// Error type for invalid operations.
#[derive(Error, Debug)]
pub enum SgmError {
    #[error("{0}")]
    Error(String),
    #[error("invalid bed geometry: {0}")]
    InvalidBed(String),
    #[error("invalid mass balance: {0}")]
    InvalidMassBalance(String),
    #[error("invalid climate schedule: {0}")]
    InvalidClimate(String),
    #[error("cannot progress to year {requested}: the glacier is already {current} years old")]
    YearInPast { requested: f64, current: f64 },
    #[error("glacier advanced past the end of its {domain_m} m domain at year {year}")]
    DomainExceeded { year: f64, domain_m: f64 },
    #[error("timestep collapsed to {dt} s at year {year}; the geometry is numerically unstable")]
    UnstableTimestep { dt: f64, year: f64 },
    #[error("no equilibrium within {0} years")]
    EquilibriumNotReached(f64),
    #[error("a surging glacier oscillates and has no equilibrium state")]
    NoEquilibrium,
    #[error("a climate schedule is still pending; progress the glacier through it first")]
    PendingClimate,
    #[error("expected {expected} values, got {got}")]
    LengthMismatch { expected: usize, got: usize },
    #[error("the collection is empty")]
    EmptyCollection,
    #[error("failed to parse parameter file: {0}")]
    Config(#[from] toml::de::Error),
    #[error("failed to read parameter file: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type for `Result<T, SgmError>`.
pub type SgmResult<T> = Result<T, SgmError>;
