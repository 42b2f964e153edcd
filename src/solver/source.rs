use std::f64::consts::PI;

use log::error;

use super::absorption::{absorb, Coupling};
use super::band::special_matrix_solve;
use super::moments::{estimate_velocity, update_moments};
use super::params::{SolverParams, VELOCITY_FLOOR};
use super::workspace::Workspace;
use crate::error::RadError;
use crate::grid::{FluidGrid, RadGrid};
use crate::state::NGHOST;

/// Per-step numbers worth logging.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SourceReport {
    pub max_newton_iterations: usize,
    pub absorbing_cells: usize,
}

fn interior_index(i: usize, j: usize, k: usize) -> [usize; 3] {
    [i - NGHOST, j - NGHOST, k - NGHOST]
}

/// Apply the flux divergence, then scattering, moments and velocity estimate,
/// then absorption. Fluid momentum and energy receive the matching feedback.
pub fn source_step(
    params: &SolverParams,
    rad: &mut RadGrid,
    fluid: &mut FluidGrid,
    ws: &mut Workspace,
) -> Result<SourceReport, RadError> {
    apply_divergence(rad, ws);
    scatter(params, rad, fluid, ws)?;
    update_moments(rad);
    estimate_velocity(fluid);
    let report = absorb_all(params, rad, fluid, ws)?;
    update_moments(rad);
    Ok(report)
}

fn apply_divergence(rad: &mut RadGrid, ws: &Workspace) {
    let dims = rad.dims;
    let block = rad.nf() * rad.nang();
    for (i, j, k) in dims.interior_cells() {
        let start = dims.cell(i, j, k) * block;
        for (x, d) in rad.intensity[start..start + block].iter_mut().zip(&ws.div[start..start + block]) {
            *x -= d;
        }
    }
}

/// Fill `angle_v` and `angle_v2` for velocity `v`.
fn load_angle_velocity(rad: &RadGrid, v: [f64; 3], ws: &mut Workspace) {
    for (m, mu) in rad.angles.directions().iter().enumerate() {
        let vmu = v[0] * mu[0] + v[1] * mu[1] + v[2] * mu[2];
        ws.angle_v[m] = vmu;
        ws.angle_v2[m] = vmu * vmu;
    }
}

/// Push the momentum and energy removed from the radiation into the fluid.
/// `dm` and `de` are the quadrature-weighted changes `sum(w mu dI)` and `sum(w dI)`.
fn radiation_feedback(params: &SolverParams, fluid: &mut FluidGrid, cell: usize, dm: [f64; 3], de: f64) {
    let scale = params.prat * 4.0 * PI;
    for d in 0..3 {
        fluid.momentum[3 * cell + d] -= scale * dm[d] * params.inv_crat();
    }
    fluid.energy[cell] -= scale * de;
}

/// Accumulate `sum(w dI)` and `sum(w mu dI)` between `before` and `after`.
fn weighted_change(rad: &RadGrid, before: &[f64], after: &[f64], dm: &mut [f64; 3], de: &mut f64) {
    let weights = rad.angles.weights();
    for (m, mu) in rad.angles.directions().iter().enumerate() {
        let wdi = weights[m] * (after[m] - before[m]);
        *de += wdi;
        dm[0] += wdi * mu[0];
        dm[1] += wdi * mu[1];
        dm[2] += wdi * mu[2];
    }
}

fn scatter(params: &SolverParams, rad: &mut RadGrid, fluid: &mut FluidGrid, ws: &mut Workspace) -> Result<(), RadError> {
    let dims = rad.dims;
    let na = rad.nang();
    let c = params.crat;
    let invc = params.inv_crat();

    for (i, j, k) in dims.interior_cells() {
        let cell = dims.cell(i, j, k);
        let v = fluid.velocity(cell);
        let v2 = v[0] * v[0] + v[1] * v[1] + v[2] * v[2];
        load_angle_velocity(rad, v, ws);

        let mut dm = [0.0; 3];
        let mut de = 0.0;
        for f in 0..rad.nf() {
            let dts = params.dt * rad.opacity(cell, f)[2];
            let start = rad.idx(cell, f, 0);

            ws.sol[..na].copy_from_slice(&rad.intensity[start..start + na]);
            ws.rhs[..na].copy_from_slice(&ws.sol[..na]);
            if let (true, Some(comp)) = (params.compton, rad.compton.as_ref()) {
                for (r, s) in ws.rhs[..na].iter_mut().zip(&comp[start..start + na]) {
                    *r += s;
                }
            }

            let weights = rad.angles.weights();
            let ray = &mut rad.intensity[start..start + na];
            // The reduced equation for J keeps about eps * (1 + dts c) relative
            // precision; v/c corrections below that cannot be resolved by it.
            let speed = v2.sqrt();
            let moving = speed > VELOCITY_FLOOR && speed * invc > (1.0 + dts * c) * f64::EPSILON;
            if dts == 0.0 {
                ray.copy_from_slice(&ws.rhs[..na]);
            } else if moving {
                for m in 0..na {
                    let vmu = ws.angle_v[m];
                    ws.ma[3 * m] = (1.0 + dts * (c - vmu)) / weights[m];
                    ws.ma[3 * m + 1] = dts * (2.0 * vmu - (v2 + ws.angle_v2[m]) * invc);
                    ws.ma[3 * m + 2] = -dts * (c + 3.0 * vmu);
                }
                if special_matrix_solve(&ws.ma[..3 * na], weights, &mut ws.rhs[..na], &mut ws.diag).is_none() {
                    error!("singular scattering system at cell {:?}, frequency {}", interior_index(i, j, k), f);
                    return Err(RadError::SingularScattering { cell: interior_index(i, j, k), freq: f });
                }
                for m in 0..na {
                    ray[m] = ws.rhs[m] / weights[m];
                }
            } else {
                // Static limit: J is conserved, so it comes straight from the RHS
                let j_new: f64 = ws.rhs[..na].iter().zip(weights).map(|(r, w)| r * w).sum();
                let denom = 1.0 + dts * c;
                for m in 0..na {
                    ray[m] = (ws.rhs[m] + dts * c * j_new) / denom;
                }
            }

            weighted_change(rad, &ws.sol[..na], &rad.intensity[start..start + na], &mut dm, &mut de);
        }
        radiation_feedback(params, fluid, cell, dm, de);
    }
    Ok(())
}

fn absorb_all(params: &SolverParams, rad: &mut RadGrid, fluid: &mut FluidGrid, ws: &mut Workspace) -> Result<SourceReport, RadError> {
    let dims = rad.dims;
    let na = rad.nang();
    let cv = params.cv();
    let mut report = SourceReport::default();

    for (i, j, k) in dims.interior_cells() {
        let cell = dims.cell(i, j, k);
        let v = fluid.velocity(cell);
        let v2 = v[0] * v[0] + v[1] * v[1] + v[2] * v[2];
        load_angle_velocity(rad, v, ws);

        let tcoef = fluid.density[cell] * cv;
        let t_old = fluid.tgas[cell];
        let ke_old = fluid.kinetic_energy(cell);
        let mut t = t_old;
        let mut dm = [0.0; 3];
        let mut absorbed = false;

        for f in 0..rad.nf() {
            let dt_sigma = params.dt * rad.opacity(cell, f)[0];
            if dt_sigma == 0.0 {
                continue;
            }
            absorbed = true;
            let start = rad.idx(cell, f, 0);
            ws.sol[..na].copy_from_slice(&rad.intensity[start..start + na]);

            let coupling = Coupling {
                dt_sigma,
                fraction: rad.groups.fraction(f),
                tcoef,
                prat: params.prat,
                crat: params.crat,
                v2,
            };
            let outcome = absorb(
                &coupling,
                rad.angles.weights(),
                &ws.angle_v[..na],
                &ws.angle_v2[..na],
                &mut rad.intensity[start..start + na],
                t,
                params.newton_tol,
                params.newton_max_iter,
            );
            match outcome {
                Ok(out) => {
                    t = out.temperature;
                    report.max_newton_iterations = report.max_newton_iterations.max(out.iterations);
                }
                Err(fail) => {
                    let idx = interior_index(i, j, k);
                    error!(
                        "temperature coupling failed at cell {:?}, frequency {}: {} iterations, residual {:.3e}",
                        idx, f, fail.iterations, fail.residual
                    );
                    return Err(RadError::AbsorptionNotConverged {
                        cell: idx,
                        freq: f,
                        iterations: fail.iterations,
                        residual: fail.residual,
                    });
                }
            }

            let mut de = 0.0;
            weighted_change(rad, &ws.sol[..na], &rad.intensity[start..start + na], &mut dm, &mut de);
        }

        if absorbed {
            report.absorbing_cells += 1;
            radiation_feedback(params, fluid, cell, dm, 0.0);
            let ke_new = fluid.kinetic_energy(cell);
            fluid.tgas[cell] = t;
            fluid.energy[cell] += tcoef * (t - t_old) + (ke_new - ke_old);
        }
    }
    Ok(report)
}
