use std::path::Path;

use log::warn;
use serde::Deserialize;

use crate::error::RadError;
use crate::quadrature::{AngleSet, FrequencyGroups};
use crate::solver::{Boundaries, BoundaryKind, Face, Geometry, Reconstruction, SolverParams};
use crate::state::GridDims;

pub const DEFAULT_PATH: &str = "fullrt.yaml";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub grid: GridConfig,
    pub radiation: RadiationConfig,
    pub physics: PhysicsConfig,
    pub solver: SolverConfig,
    pub geometry: GeometryConfig,
    pub boundaries: BoundaryConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub nx1: usize,
    pub nx2: usize,
    pub nx3: usize,
    pub dx1: f64,
    pub dx2: f64,
    pub dx3: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuadratureKind {
    S2,
    S4,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RadiationConfig {
    pub quadrature: QuadratureKind,
    /// Number of equally weighted groups, used when `planck_fractions` is empty.
    pub groups: usize,
    pub planck_fractions: Vec<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub dt: f64,
    pub crat: f64,
    pub prat: f64,
    pub r_ideal: f64,
    pub gamma: f64,
    pub compton: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconstructionKind {
    Donor,
    VanLeer,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub reconstruction: ReconstructionKind,
    pub newton_tol: f64,
    pub newton_max_iter: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateKind {
    Cartesian,
    Cylindrical,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    pub kind: CoordinateKind,
    pub r_min: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceKind {
    Periodic,
    FixedIncident,
    PendingProlongation,
    Outflow,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BoundaryConfig {
    pub ix1: FaceKind,
    pub ox1: FaceKind,
    pub ix2: FaceKind,
    pub ox2: FaceKind,
    pub ix3: FaceKind,
    pub ox3: FaceKind,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { nx1: 16, nx2: 16, nx3: 1, dx1: 1.0 / 16.0, dx2: 1.0 / 16.0, dx3: 1.0 }
    }
}

impl Default for RadiationConfig {
    fn default() -> Self {
        Self { quadrature: QuadratureKind::S4, groups: 1, planck_fractions: Vec::new() }
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        let p = SolverParams::default();
        Self { dt: p.dt, crat: p.crat, prat: p.prat, r_ideal: p.r_ideal, gamma: p.gamma, compton: p.compton }
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        let p = SolverParams::default();
        Self {
            reconstruction: ReconstructionKind::VanLeer,
            newton_tol: p.newton_tol,
            newton_max_iter: p.newton_max_iter,
        }
    }
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self { kind: CoordinateKind::Cartesian, r_min: 1.0 }
    }
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        let p = FaceKind::Periodic;
        Self { ix1: p, ox1: p, ix2: p, ox2: p, ix3: p, ox3: p }
    }
}

impl From<FaceKind> for BoundaryKind {
    fn from(kind: FaceKind) -> Self {
        match kind {
            FaceKind::Periodic => BoundaryKind::Periodic,
            FaceKind::FixedIncident => BoundaryKind::FixedIncident,
            FaceKind::PendingProlongation => BoundaryKind::PendingProlongation,
            FaceKind::Outflow => BoundaryKind::Outflow,
        }
    }
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, RadError> {
        serde_yaml::from_str(yaml).map_err(|e| RadError::InvalidConfig(e.to_string()))
    }

    pub fn dims(&self) -> Result<GridDims, RadError> {
        let g = &self.grid;
        GridDims::new([g.nx1, g.nx2, g.nx3], [g.dx1, g.dx2, g.dx3])
    }

    pub fn angles(&self) -> AngleSet {
        match self.radiation.quadrature {
            QuadratureKind::S2 => AngleSet::s2(),
            QuadratureKind::S4 => AngleSet::s4(),
        }
    }

    pub fn groups(&self) -> Result<FrequencyGroups, RadError> {
        if self.radiation.planck_fractions.is_empty() {
            FrequencyGroups::equal(self.radiation.groups)
        } else {
            FrequencyGroups::new(self.radiation.planck_fractions.clone())
        }
    }

    pub fn params(&self) -> SolverParams {
        let p = &self.physics;
        SolverParams {
            dt: p.dt,
            crat: p.crat,
            prat: p.prat,
            r_ideal: p.r_ideal,
            gamma: p.gamma,
            compton: p.compton,
            reconstruction: match self.solver.reconstruction {
                ReconstructionKind::Donor => Reconstruction::Donor,
                ReconstructionKind::VanLeer => Reconstruction::VanLeer,
            },
            newton_tol: self.solver.newton_tol,
            newton_max_iter: self.solver.newton_max_iter,
        }
    }

    pub fn geometry(&self) -> Geometry {
        match self.geometry.kind {
            CoordinateKind::Cartesian => Geometry::Cartesian,
            CoordinateKind::Cylindrical => Geometry::Cylindrical { r_min: self.geometry.r_min },
        }
    }

    pub fn boundaries(&self) -> Boundaries {
        let b = &self.boundaries;
        Boundaries::default()
            .with(Face::Ix1, b.ix1.into())
            .with(Face::Ox1, b.ox1.into())
            .with(Face::Ix2, b.ix2.into())
            .with(Face::Ox2, b.ox2.into())
            .with(Face::Ix3, b.ix3.into())
            .with(Face::Ox3, b.ox3.into())
    }
}

/// Read `fullrt.yaml` from the working directory, falling back to defaults.
pub fn load() -> Config {
    load_from(Path::new(DEFAULT_PATH))
}

pub fn load_from(path: &Path) -> Config {
    if !path.exists() {
        return Config::default();
    }
    match std::fs::read_to_string(path) {
        Ok(contents) => match Config::from_yaml_str(&contents) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("failed to parse {}: {e}; using defaults", path.display());
                Config::default()
            }
        },
        Err(e) => {
            warn!("failed to read {}: {e}; using defaults", path.display());
            Config::default()
        }
    }
}
