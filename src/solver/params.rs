/// Below this, opacities and direction cosines count as zero.
pub const TINY_NUMBER: f64 = 1e-20;

/// Velocity magnitude under which the scattering solve drops the v/c terms.
pub const VELOCITY_FLOOR: f64 = 1e-15;

/// Interface reconstruction used by the directional sweeps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reconstruction {
    /// First-order upwind.
    Donor,
    /// Van Leer limited slopes with time-centred face states.
    VanLeer,
}

/// Solver parameters for the radiation integrator.
#[derive(Clone, Debug)]
pub struct SolverParams {
    pub dt: f64,
    /// Speed of light in code units.
    pub crat: f64,
    /// Radiation to gas pressure ratio.
    pub prat: f64,
    pub r_ideal: f64,
    pub gamma: f64,
    /// Add the Compton source to the scattering right-hand side.
    pub compton: bool,
    pub reconstruction: Reconstruction,
    /// Relative temperature change at which the Newton iteration stops.
    pub newton_tol: f64,
    pub newton_max_iter: usize,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            dt: 1e-3,
            crat: 10.0,
            prat: 1.0,
            r_ideal: 1.0,
            gamma: 5.0 / 3.0,
            compton: false,
            reconstruction: Reconstruction::VanLeer,
            newton_tol: 1e-12,
            newton_max_iter: 50,
        }
    }
}

impl SolverParams {
    /// Specific heat at constant volume, `R_ideal / (Gamma - 1)`.
    pub fn cv(&self) -> f64 {
        self.r_ideal / (self.gamma - 1.0)
    }

    pub fn inv_crat(&self) -> f64 {
        1.0 / self.crat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let p = SolverParams::default();
        assert_eq!(p.crat, 10.0);
        assert_eq!(p.prat, 1.0);
        assert_eq!(p.reconstruction, Reconstruction::VanLeer);
        assert!(!p.compton);
        assert!((p.cv() - 1.5).abs() < 1e-14, "cv should be 1.5 for gamma 5/3, got {}", p.cv());
    }

    #[test]
    fn test_inv_crat() {
        let p = SolverParams { crat: 4.0, ..SolverParams::default() };
        assert_eq!(p.inv_crat(), 0.25);
    }
}
