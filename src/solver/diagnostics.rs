use std::f64::consts::PI;

use crate::grid::{FluidGrid, RadGrid};

/// Radiation energy over the interior: sum of Prat * 4pi * J over cells and groups.
pub fn compute_radiation_energy(rad: &RadGrid, prat: f64) -> f64 {
    let dims = rad.dims;
    let mut sum = 0.0;
    for (i, j, k) in dims.interior_cells() {
        let cell = dims.cell(i, j, k);
        for f in 0..rad.nf() {
            sum += rad.j[rad.idx_cf(cell, f)];
        }
    }
    prat * 4.0 * PI * sum
}

/// Total fluid energy (internal + kinetic) over the interior.
pub fn compute_gas_energy(fluid: &FluidGrid) -> f64 {
    let dims = fluid.dims;
    dims.interior_cells().map(|(i, j, k)| fluid.energy[dims.cell(i, j, k)]).sum()
}

pub fn compute_total_energy(rad: &RadGrid, fluid: &FluidGrid, prat: f64) -> f64 {
    compute_radiation_energy(rad, prat) + compute_gas_energy(fluid)
}

/// Fluid plus radiation momentum, `M + Prat * 4pi * H / Crat`, summed over the interior.
pub fn compute_total_momentum(rad: &RadGrid, fluid: &FluidGrid, prat: f64, crat: f64) -> [f64; 3] {
    let dims = rad.dims;
    let scale = prat * 4.0 * PI / crat;
    let mut total = [0.0; 3];
    for (i, j, k) in dims.interior_cells() {
        let cell = dims.cell(i, j, k);
        let m = fluid.momentum_at(cell);
        for d in 0..3 {
            total[d] += m[d];
        }
        for f in 0..rad.nf() {
            let h = rad.flux(cell, f);
            for d in 0..3 {
                total[d] += scale * h[d];
            }
        }
    }
    total
}

/// Largest deviation between stored moments and those of the current intensities.
/// Zero whenever J and H are up to date.
pub fn compute_moment_residual(rad: &RadGrid) -> f64 {
    let dims = rad.dims;
    let mut worst = 0.0_f64;
    for (i, j, k) in dims.interior_cells() {
        let cell = dims.cell(i, j, k);
        for f in 0..rad.nf() {
            let (jm, h) = rad.angles.moments(rad.ray(cell, f));
            let stored = rad.flux(cell, f);
            worst = worst.max((jm - rad.j[rad.idx_cf(cell, f)]).abs());
            for d in 0..3 {
                worst = worst.max((h[d] - stored[d]).abs());
            }
        }
    }
    worst
}

/// Mean radiation temperature of one cell, `(4pi * sum_f J_f)^(1/4)`.
pub fn compute_radiation_temperature(rad: &RadGrid, cell: usize) -> f64 {
    let e: f64 = (0..rad.nf()).map(|f| rad.j[rad.idx_cf(cell, f)]).sum();
    (4.0 * PI * e).max(0.0).powf(0.25)
}
