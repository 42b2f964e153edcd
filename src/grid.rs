use crate::error::RadError;
use crate::quadrature::{AngleSet, FrequencyGroups};
use crate::state::{alloc_zeroed, GridDims};

/// Radiation state of one grid partition, ghost layers included.
///
/// Per-cell arrays are flat with frequency-major, angle-minor layout:
/// `intensity[(cell * nf + f) * nang + n]`, `j[cell * nf + f]`,
/// `h`, `sigma` and `speed_factor` carry three components per `(cell, f)`.
pub struct RadGrid {
    pub dims: GridDims,
    pub angles: AngleSet,
    pub groups: FrequencyGroups,
    pub intensity: Vec<f64>,
    pub j: Vec<f64>,
    pub h: Vec<f64>,
    /// `[absorption, absorption in front of I, scattering]` per `(cell, f)`.
    pub sigma: Vec<f64>,
    /// Reduced-speed factor per direction, 1 for full light speed.
    pub speed_factor: Vec<f64>,
    /// Compton source added to the scattering right-hand side when enabled.
    pub compton: Option<Vec<f64>>,
}

impl RadGrid {
    pub fn new(dims: GridDims, angles: AngleSet, groups: FrequencyGroups) -> Result<Self, RadError> {
        let ncells = dims.ncells();
        let nf = groups.len();
        let na = angles.len();
        let mut speed_factor = alloc_zeroed(ncells * nf * 3, "speed factor")?;
        speed_factor.iter_mut().for_each(|a| *a = 1.0);
        Ok(Self {
            dims,
            intensity: alloc_zeroed(ncells * nf * na, "specific intensity")?,
            j: alloc_zeroed(ncells * nf, "mean intensity")?,
            h: alloc_zeroed(ncells * nf * 3, "radiation flux")?,
            sigma: alloc_zeroed(ncells * nf * 3, "opacity")?,
            speed_factor,
            compton: None,
            angles,
            groups,
        })
    }

    pub fn nf(&self) -> usize {
        self.groups.len()
    }

    pub fn nang(&self) -> usize {
        self.angles.len()
    }

    #[inline(always)]
    pub fn idx(&self, cell: usize, f: usize, n: usize) -> usize {
        (cell * self.nf() + f) * self.nang() + n
    }

    #[inline(always)]
    pub fn idx_cf(&self, cell: usize, f: usize) -> usize {
        cell * self.nf() + f
    }

    /// Intensities of every angle for one `(cell, f)`.
    pub fn ray(&self, cell: usize, f: usize) -> &[f64] {
        let start = self.idx(cell, f, 0);
        &self.intensity[start..start + self.nang()]
    }

    pub fn ray_mut(&mut self, cell: usize, f: usize) -> &mut [f64] {
        let start = self.idx(cell, f, 0);
        let na = self.nang();
        &mut self.intensity[start..start + na]
    }

    #[inline(always)]
    pub fn opacity(&self, cell: usize, f: usize) -> [f64; 3] {
        let o = 3 * self.idx_cf(cell, f);
        [self.sigma[o], self.sigma[o + 1], self.sigma[o + 2]]
    }

    pub fn set_opacity(&mut self, cell: usize, f: usize, sigma: [f64; 3]) {
        let o = 3 * self.idx_cf(cell, f);
        self.sigma[o..o + 3].copy_from_slice(&sigma);
    }

    /// Same opacity in every cell (ghosts included) and group.
    pub fn fill_opacity(&mut self, sigma: [f64; 3]) {
        for chunk in self.sigma.chunks_exact_mut(3) {
            chunk.copy_from_slice(&sigma);
        }
    }

    #[inline(always)]
    pub fn speed(&self, cell: usize, f: usize, dir: usize) -> f64 {
        self.speed_factor[3 * self.idx_cf(cell, f) + dir]
    }

    pub fn flux(&self, cell: usize, f: usize) -> [f64; 3] {
        let o = 3 * self.idx_cf(cell, f);
        [self.h[o], self.h[o + 1], self.h[o + 2]]
    }

    /// Set every angle of `(cell, f)` to `value` and refresh its moments.
    pub fn set_isotropic(&mut self, cell: usize, f: usize, value: f64) {
        self.ray_mut(cell, f).iter_mut().for_each(|i| *i = value);
        self.refresh_moments(cell, f);
    }

    /// Isotropic intensity everywhere, ghosts included.
    pub fn fill_isotropic(&mut self, value: f64) {
        self.intensity.iter_mut().for_each(|i| *i = value);
        for cell in 0..self.dims.ncells() {
            for f in 0..self.nf() {
                self.refresh_moments(cell, f);
            }
        }
    }

    /// Recompute J and H of one `(cell, f)` from the current intensities.
    pub fn refresh_moments(&mut self, cell: usize, f: usize) {
        let (j, h) = self.angles.moments(self.ray(cell, f));
        let cf = self.idx_cf(cell, f);
        self.j[cf] = j;
        self.h[3 * cf..3 * cf + 3].copy_from_slice(&h);
    }

    /// Allocate a zeroed Compton source matching the intensity layout.
    pub fn enable_compton(&mut self) -> Result<(), RadError> {
        if self.compton.is_none() {
            self.compton = Some(alloc_zeroed(self.intensity.len(), "compton source")?);
        }
        Ok(())
    }
}

/// Fluid state read and updated by the radiation source terms.
pub struct FluidGrid {
    pub dims: GridDims,
    pub density: Vec<f64>,
    /// Momentum density, three components per cell.
    pub momentum: Vec<f64>,
    /// Total energy density (internal + kinetic).
    pub energy: Vec<f64>,
    pub tgas: Vec<f64>,
    /// Velocity used for the v/c terms, three components per cell.
    pub velguess: Vec<f64>,
}

impl FluidGrid {
    pub fn new(dims: GridDims) -> Result<Self, RadError> {
        let n = dims.ncells();
        Ok(Self {
            dims,
            density: alloc_zeroed(n, "density")?,
            momentum: alloc_zeroed(3 * n, "momentum")?,
            energy: alloc_zeroed(n, "total energy")?,
            tgas: alloc_zeroed(n, "gas temperature")?,
            velguess: alloc_zeroed(3 * n, "velocity guess")?,
        })
    }

    /// Set one cell from primitive variables; `cv` is `R_ideal / (Gamma - 1)`.
    pub fn set_primitive(&mut self, cell: usize, rho: f64, v: [f64; 3], t: f64, cv: f64) {
        self.density[cell] = rho;
        let v2 = v[0] * v[0] + v[1] * v[1] + v[2] * v[2];
        for d in 0..3 {
            self.momentum[3 * cell + d] = rho * v[d];
            self.velguess[3 * cell + d] = v[d];
        }
        self.tgas[cell] = t;
        self.energy[cell] = rho * cv * t + 0.5 * rho * v2;
    }

    /// Same primitive state in every cell, ghosts included.
    pub fn fill_primitive(&mut self, rho: f64, v: [f64; 3], t: f64, cv: f64) {
        for cell in 0..self.dims.ncells() {
            self.set_primitive(cell, rho, v, t, cv);
        }
    }

    #[inline(always)]
    pub fn velocity(&self, cell: usize) -> [f64; 3] {
        [self.velguess[3 * cell], self.velguess[3 * cell + 1], self.velguess[3 * cell + 2]]
    }

    pub fn momentum_at(&self, cell: usize) -> [f64; 3] {
        [self.momentum[3 * cell], self.momentum[3 * cell + 1], self.momentum[3 * cell + 2]]
    }

    pub fn kinetic_energy(&self, cell: usize) -> f64 {
        let rho = self.density[cell];
        if rho > 0.0 {
            let m = self.momentum_at(cell);
            0.5 * (m[0] * m[0] + m[1] * m[1] + m[2] * m[2]) / rho
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rad() -> RadGrid {
        let dims = GridDims::new([2, 2, 1], [1.0; 3]).unwrap();
        RadGrid::new(dims, AngleSet::s2(), FrequencyGroups::equal(2).unwrap()).unwrap()
    }

    #[test]
    fn test_rad_grid_sizes() {
        let r = rad();
        let ncells = r.dims.ncells();
        assert_eq!(r.intensity.len(), ncells * 2 * 8);
        assert_eq!(r.j.len(), ncells * 2);
        assert_eq!(r.h.len(), ncells * 2 * 3);
        assert!(r.speed_factor.iter().all(|&a| a == 1.0));
        assert!(r.compton.is_none());
    }

    #[test]
    fn test_ray_slices_do_not_overlap() {
        let mut r = rad();
        let cell = r.dims.cell_inner(1, 1, 0);
        r.ray_mut(cell, 1).iter_mut().for_each(|i| *i = 7.0);
        assert!(r.ray(cell, 0).iter().all(|&i| i == 0.0));
        assert!(r.ray(cell, 1).iter().all(|&i| i == 7.0));
        assert_eq!(r.intensity.iter().filter(|&&i| i == 7.0).count(), 8);
    }

    #[test]
    fn test_set_isotropic_refreshes_moments() {
        let mut r = rad();
        let cell = r.dims.cell_inner(0, 1, 0);
        r.set_isotropic(cell, 0, 3.0);
        assert!((r.j[r.idx_cf(cell, 0)] - 3.0).abs() < 1e-14);
        assert!(r.flux(cell, 0).iter().all(|h| h.abs() < 1e-14));
    }

    #[test]
    fn test_opacity_roundtrip() {
        let mut r = rad();
        let cell = r.dims.cell_inner(1, 0, 0);
        r.set_opacity(cell, 1, [1.0, 2.0, 3.0]);
        assert_eq!(r.opacity(cell, 1), [1.0, 2.0, 3.0]);
        assert_eq!(r.opacity(cell, 0), [0.0; 3]);
    }

    #[test]
    fn test_fluid_primitive_energy() {
        let dims = GridDims::new([1, 1, 1], [1.0; 3]).unwrap();
        let mut fl = FluidGrid::new(dims).unwrap();
        let cell = dims.cell_inner(0, 0, 0);
        fl.set_primitive(cell, 2.0, [1.0, 0.0, 0.0], 3.0, 1.5);
        assert_eq!(fl.momentum_at(cell), [2.0, 0.0, 0.0]);
        assert!((fl.energy[cell] - (2.0 * 1.5 * 3.0 + 1.0)).abs() < 1e-14);
        assert!((fl.kinetic_energy(cell) - 1.0).abs() < 1e-14);
    }
}
