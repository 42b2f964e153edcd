use super::params::TINY_NUMBER;
use crate::grid::{FluidGrid, RadGrid};

/// Recompute J and H from the current intensities over the interior.
pub fn update_moments(rad: &mut RadGrid) {
    let dims = rad.dims;
    for (i, j, k) in dims.interior_cells() {
        let cell = dims.cell(i, j, k);
        for f in 0..rad.nf() {
            rad.refresh_moments(cell, f);
        }
    }
}

/// Re-derive the velocity guess from the fluid momentum, `v = M / rho`.
/// Evacuated cells get zero velocity.
pub fn estimate_velocity(fluid: &mut FluidGrid) {
    let dims = fluid.dims;
    for (i, j, k) in dims.interior_cells() {
        let cell = dims.cell(i, j, k);
        let rho = fluid.density[cell];
        let m = fluid.momentum_at(cell);
        for d in 0..3 {
            fluid.velguess[3 * cell + d] = if rho > TINY_NUMBER { m[d] / rho } else { 0.0 };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quadrature::{AngleSet, FrequencyGroups};
    use crate::state::{GridDims, NGHOST};

    #[test]
    fn test_update_moments_interior_only() {
        let dims = GridDims::new([2, 2, 2], [1.0; 3]).unwrap();
        let mut rad = RadGrid::new(dims, AngleSet::s2(), FrequencyGroups::grey()).unwrap();
        rad.intensity.iter_mut().enumerate().for_each(|(n, i)| *i = (n % 8) as f64);
        update_moments(&mut rad);

        let inner = dims.cell_inner(1, 0, 1);
        let (j, h) = rad.angles.moments(rad.ray(inner, 0));
        assert!((rad.j[rad.idx_cf(inner, 0)] - j).abs() < 1e-14);
        assert_eq!(rad.flux(inner, 0), h);

        let ghost = dims.cell(0, NGHOST, NGHOST);
        assert_eq!(rad.j[rad.idx_cf(ghost, 0)], 0.0, "ghost moments should be left alone");
    }

    #[test]
    fn test_estimate_velocity() {
        let dims = GridDims::new([2, 1, 1], [1.0; 3]).unwrap();
        let mut fluid = FluidGrid::new(dims).unwrap();
        let a = dims.cell_inner(0, 0, 0);
        let b = dims.cell_inner(1, 0, 0);
        fluid.density[a] = 2.0;
        fluid.momentum[3 * a..3 * a + 3].copy_from_slice(&[1.0, -4.0, 0.5]);
        fluid.momentum[3 * b] = 3.0;
        fluid.velguess[3 * b] = 7.0;
        estimate_velocity(&mut fluid);
        assert_eq!(fluid.velocity(a), [0.5, -2.0, 0.25]);
        assert_eq!(fluid.velocity(b), [0.0; 3], "zero density should give zero velocity");
    }
}
