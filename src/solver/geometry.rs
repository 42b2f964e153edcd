use crate::state::{GridDims, NGHOST};

/// Coordinate system of the grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Geometry {
    Cartesian,
    /// x1 is the radius starting at `r_min` (inner face of the first interior cell),
    /// x2 the azimuth in radians, x3 the axial coordinate.
    ///
    /// The sweeps apply the face-area factors and azimuthal path length only.
    /// Every cell streams along the global angle set: direction cosines are not
    /// rotated with the local azimuth, and there is no angular redistribution
    /// term moving intensity between directions.
    Cylindrical { r_min: f64 },
}

impl Default for Geometry {
    fn default() -> Self {
        Self::Cartesian
    }
}

impl Geometry {
    /// Radius at the centre of x1 position `i` (ghost-inclusive index).
    pub fn r_center(&self, i: usize, dims: &GridDims) -> f64 {
        match self {
            Geometry::Cartesian => 1.0,
            Geometry::Cylindrical { r_min } => {
                r_min + (i as f64 - NGHOST as f64 + 0.5) * dims.dx[0]
            }
        }
    }

    /// Radius of the inner x1 face of position `i`.
    pub fn r_face(&self, i: usize, dims: &GridDims) -> f64 {
        match self {
            Geometry::Cartesian => 1.0,
            Geometry::Cylindrical { r_min } => r_min + (i as f64 - NGHOST as f64) * dims.dx[0],
        }
    }

    /// Face-area factors `(left, right)` scaling the x1 fluxes of cell `i`.
    pub fn x1_face_factors(&self, i: usize, dims: &GridDims) -> (f64, f64) {
        match self {
            Geometry::Cartesian => (1.0, 1.0),
            Geometry::Cylindrical { .. } => {
                let rc = self.r_center(i, dims);
                (self.r_face(i, dims) / rc, self.r_face(i + 1, dims) / rc)
            }
        }
    }

    /// Length of cell `i` along `dir`, including the metric factor.
    pub fn path_length(&self, dir: usize, i: usize, dims: &GridDims) -> f64 {
        match (self, dir) {
            (Geometry::Cylindrical { .. }, 1) => dims.dx[1] * self.r_center(i, dims),
            _ => dims.dx[dir],
        }
    }
}
