//! Formal-solution integrator for time-dependent radiative transfer on a
//! structured 3D grid, coupled to a fluid through scattering and absorption
//! to first order in v/c.

pub mod config;
pub mod error;
pub mod grid;
pub mod quadrature;
pub mod solver;
pub mod state;

pub use error::RadError;
pub use grid::{FluidGrid, RadGrid};
pub use quadrature::{AngleSet, FrequencyGroups};
pub use solver::{Boundaries, BoundaryKind, FormalSolver, Geometry, SolverParams};
pub use state::{GridDims, NGHOST};
