mod absorption;
mod band;
mod boundary;
pub mod diagnostics;
mod flux;
mod geometry;
mod moments;
mod params;
mod reconstruct;
mod source;
mod workspace;

// Re-export public API
pub use absorption::{solve_quartic, NewtonFailure, NewtonOutcome};
pub use band::special_matrix_solve;
pub use boundary::{Boundaries, BoundaryKind, Face, GhostFill};
pub use geometry::Geometry;
pub use moments::{estimate_velocity, update_moments};
pub use params::{Reconstruction, SolverParams, TINY_NUMBER, VELOCITY_FLOOR};
pub use reconstruct::flux_adv_j;
pub use source::SourceReport;
pub use workspace::Workspace;

use log::debug;

use crate::error::RadError;
use crate::grid::{FluidGrid, RadGrid};

/// Formal-solution integrator for one grid partition.
///
/// Each `step` is one fixed-point pass: boundaries, the three flux sweeps,
/// then the source stage. Convergence looping belongs to the caller.
pub struct FormalSolver {
    pub params: SolverParams,
    pub geometry: Geometry,
    pub boundaries: Boundaries,
    workspace: Workspace,
    steps: u64,
}

impl FormalSolver {
    pub fn new(params: SolverParams, geometry: Geometry, boundaries: Boundaries, rad: &RadGrid) -> Result<Self, RadError> {
        if !(params.dt > 0.0) || !(params.crat > 0.0) || !(params.gamma > 1.0) {
            return Err(RadError::InvalidConfig(format!(
                "dt, crat must be positive and gamma above 1 (dt={}, crat={}, gamma={})",
                params.dt, params.crat, params.gamma
            )));
        }
        if let Geometry::Cylindrical { r_min } = geometry {
            if !(r_min > 0.0) {
                return Err(RadError::InvalidConfig(format!("cylindrical r_min must be positive, got {}", r_min)));
            }
        }
        let workspace = Workspace::for_grid(rad)?;
        Ok(Self { params, geometry, boundaries, workspace, steps: 0 })
    }

    /// Advance the radiation field and its fluid coupling by one timestep.
    pub fn step(&mut self, rad: &mut RadGrid, fluid: &mut FluidGrid) -> Result<SourceReport, RadError> {
        self.workspace.check(rad)?;
        if fluid.dims != rad.dims {
            return Err(RadError::DimensionMismatch(format!(
                "fluid grid {:?} does not match radiation grid {:?}",
                fluid.dims.nx, rad.dims.nx
            )));
        }
        self.boundaries.apply(rad, fluid);
        self.flux_step(rad, fluid);
        let report = self.source_step(rad, fluid)?;
        self.steps += 1;
        debug!(
            "radiation step {}: {} absorbing cells, max {} Newton iterations",
            self.steps, report.absorbing_cells, report.max_newton_iterations
        );
        Ok(report)
    }

    /// Fill the flux divergence from the current intensities. Ghost zones must be valid.
    pub fn flux_step(&mut self, rad: &RadGrid, fluid: &FluidGrid) {
        flux::flux_step(&self.params, &self.geometry, rad, fluid, &mut self.workspace);
    }

    /// Consume the flux divergence and apply the scattering and absorption sources.
    pub fn source_step(&mut self, rad: &mut RadGrid, fluid: &mut FluidGrid) -> Result<SourceReport, RadError> {
        source::source_step(&self.params, rad, fluid, &mut self.workspace)
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Release the working buffers.
    pub fn release(self) {
        self.workspace.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quadrature::{AngleSet, FrequencyGroups};
    use crate::solver::diagnostics::{compute_moment_residual, compute_radiation_temperature, compute_total_energy, compute_total_momentum};
    use crate::state::GridDims;

    #[test]
    fn test_new_rejects_bad_params() {
        let dims = GridDims::new([2, 2, 2], [1.0; 3]).unwrap();
        let rad = RadGrid::new(dims, AngleSet::s2(), FrequencyGroups::grey()).unwrap();
        let bad = SolverParams { dt: 0.0, ..SolverParams::default() };
        assert!(FormalSolver::new(bad, Geometry::Cartesian, Boundaries::default(), &rad).is_err());
        let cyl = Geometry::Cylindrical { r_min: 0.0 };
        assert!(FormalSolver::new(SolverParams::default(), cyl, Boundaries::default(), &rad).is_err());
    }

    #[test]
    fn test_step_rejects_mismatched_grid() {
        let dims = GridDims::new([2, 2, 2], [1.0; 3]).unwrap();
        let rad = RadGrid::new(dims, AngleSet::s2(), FrequencyGroups::grey()).unwrap();
        let mut solver = FormalSolver::new(SolverParams::default(), Geometry::Cartesian, Boundaries::default(), &rad).unwrap();

        let other = GridDims::new([3, 2, 2], [1.0; 3]).unwrap();
        let mut rad2 = RadGrid::new(other, AngleSet::s2(), FrequencyGroups::grey()).unwrap();
        let mut fluid2 = FluidGrid::new(other).unwrap();
        assert!(matches!(solver.step(&mut rad2, &mut fluid2), Err(RadError::DimensionMismatch(_))));
        assert_eq!(solver.steps(), 0);
        solver.release();
    }

    #[test]
    fn test_energy_closure_single_cell() {
        let dims = GridDims::new([1, 1, 1], [1.0; 3]).unwrap();
        let mut rad = RadGrid::new(dims, AngleSet::s2(), FrequencyGroups::grey()).unwrap();
        let mut fluid = FluidGrid::new(dims).unwrap();
        let params = SolverParams { dt: 0.1, ..SolverParams::default() };
        rad.fill_opacity([1.0, 1.0, 0.0]);
        fluid.fill_primitive(1.0, [0.0; 3], 1.0, params.cv());

        let mut solver = FormalSolver::new(params, Geometry::Cartesian, Boundaries::default(), &rad).unwrap();
        let cell = dims.cell_inner(0, 0, 0);
        let e0 = compute_total_energy(&rad, &fluid, solver.params.prat);

        let mut last_j = 0.0;
        let mut last_t = 1.0;
        for n in 0..200 {
            solver.step(&mut rad, &mut fluid).unwrap();
            let j = rad.j[rad.idx_cf(cell, 0)];
            let t = fluid.tgas[cell];
            assert!(j >= last_j - 1e-14, "step {}: J should not decrease ({} -> {})", n, last_j, j);
            assert!(t <= last_t + 1e-14, "step {}: gas should not heat ({} -> {})", n, last_t, t);
            last_j = j;
            last_t = t;
        }

        let t = fluid.tgas[cell];
        let t_rad = compute_radiation_temperature(&rad, cell);
        assert!(t < 1.0 && t > 0.7, "equilibrium temperature {}", t);
        assert!((t_rad - t).abs() < 1e-6 * t, "radiation {} and gas {} temperatures should meet", t_rad, t);
        // 1.5 T + 4pi J = 1.5 with 4pi J = T^4 at equilibrium
        assert!((1.5 * t + t.powi(4) - 1.5).abs() < 1e-6);
        let e1 = compute_total_energy(&rad, &fluid, solver.params.prat);
        assert!((e1 - e0).abs() < 1e-10, "total energy drifted: {} -> {}", e0, e1);
        assert!(compute_moment_residual(&rad) < 1e-15);
    }

    #[test]
    fn test_periodic_streaming_conserves_radiation() {
        let dims = GridDims::new([8, 4, 2], [0.25, 0.5, 1.0]).unwrap();
        let mut rad = RadGrid::new(dims, AngleSet::s4(), FrequencyGroups::equal(2).unwrap()).unwrap();
        let mut fluid = FluidGrid::new(dims).unwrap();
        let params = SolverParams { dt: 0.002, ..SolverParams::default() };
        fluid.fill_primitive(1.0, [0.0; 3], 1.0, params.cv());
        for (i, j, k) in dims.interior_cells().collect::<Vec<_>>() {
            let cell = dims.cell(i, j, k);
            for f in 0..2 {
                let bump = if i == 4 && j == 3 { 5.0 } else { 1.0 };
                rad.set_isotropic(cell, f, bump * (1.0 + f as f64));
            }
        }
        let mut solver = FormalSolver::new(params, Geometry::Cartesian, Boundaries::default(), &rad).unwrap();
        let e0 = compute_total_energy(&rad, &fluid, 1.0);
        for _ in 0..10 {
            solver.step(&mut rad, &mut fluid).unwrap();
        }
        let e1 = compute_total_energy(&rad, &fluid, 1.0);
        assert!((e1 - e0).abs() < 1e-10 * e0, "periodic transport should conserve energy: {} -> {}", e0, e1);
        assert!(rad.intensity.iter().all(|&i| i >= 0.0), "van Leer sweep should stay positive");
        assert_eq!(solver.steps(), 10);
    }

    #[test]
    fn test_scattering_medium_with_flow_conserves_momentum() {
        let dims = GridDims::new([4, 2, 2], [1.0; 3]).unwrap();
        let mut rad = RadGrid::new(dims, AngleSet::s4(), FrequencyGroups::grey()).unwrap();
        let mut fluid = FluidGrid::new(dims).unwrap();
        let params = SolverParams { dt: 0.01, ..SolverParams::default() };
        fluid.fill_primitive(1.0, [0.5, 0.0, 0.0], 1.0, params.cv());
        rad.fill_opacity([0.0, 0.0, 2.0]);
        rad.fill_isotropic(0.3);
        let mut solver = FormalSolver::new(params, Geometry::Cartesian, Boundaries::default(), &rad).unwrap();

        let p0 = compute_total_momentum(&rad, &fluid, 1.0, 10.0);
        solver.step(&mut rad, &mut fluid).unwrap();
        let p1 = compute_total_momentum(&rad, &fluid, 1.0, 10.0);
        let h = rad.flux(dims.cell_inner(1, 0, 0), 0);
        assert!(h[0] > 0.0, "flow should drag radiation along +x, H = {:?}", h);
        // Uniform periodic state: the sweeps move nothing, scattering exchanges momentum exactly
        for d in 0..3 {
            assert!((p1[d] - p0[d]).abs() < 1e-12, "momentum {} changed: {} -> {}", d, p0[d], p1[d]);
        }
    }
}
