use log::debug;

use crate::error::RadError;
use crate::grid::RadGrid;
use crate::state::{alloc_zeroed, GridDims};

/// Scratch buffers owned by one integrator instance.
/// Sized once from the grid extents, group count and angle count.
pub struct Workspace {
    dims: GridDims,
    nf: usize,
    nang: usize,
    /// Flux divergence, same layout as the intensity field.
    pub div: Vec<f64>,
    /// Transported values along the current sweep line, `2 * nang` channels per group.
    pub line_q: Vec<f64>,
    /// Propagation speeds paired with `line_q`.
    pub line_s: Vec<f64>,
    /// Interface values produced by the reconstruction.
    pub face: Vec<f64>,
    /// Scattering right-hand side, overwritten with the solution.
    pub rhs: Vec<f64>,
    /// Scattering matrix rows, three coefficients per angle.
    pub ma: Vec<f64>,
    pub diag: Vec<f64>,
    /// Intensities before the current source stage.
    pub sol: Vec<f64>,
    /// `v . mu` per angle.
    pub angle_v: Vec<f64>,
    /// `(v . mu)^2` per angle.
    pub angle_v2: Vec<f64>,
}

impl Workspace {
    /// Allocate every buffer; any failure releases what was already built.
    pub fn allocate(dims: GridDims, nf: usize, noct: usize, nang_per_octant: usize) -> Result<Self, RadError> {
        let nang = noct * nang_per_octant;
        if nf == 0 || nang == 0 {
            return Err(RadError::InvalidConfig(format!(
                "workspace needs at least one group and one angle (nf={}, angles={})",
                nf, nang
            )));
        }
        let line = dims.max_line() * nf * 2 * nang;
        let ws = Self {
            dims,
            nf,
            nang,
            div: alloc_zeroed(dims.ncells() * nf * nang, "flux divergence")?,
            line_q: alloc_zeroed(line, "line intensity")?,
            line_s: alloc_zeroed(line, "line speed")?,
            face: alloc_zeroed(line, "interface values")?,
            rhs: alloc_zeroed(nf * nang, "scattering rhs")?,
            ma: alloc_zeroed(3 * nf * nang, "scattering matrix")?,
            diag: alloc_zeroed(nang, "scattering diagonal")?,
            sol: alloc_zeroed(nf * nang, "pre-source intensity")?,
            angle_v: alloc_zeroed(nang, "angle velocity")?,
            angle_v2: alloc_zeroed(nang, "angle velocity squared")?,
        };
        debug!(
            "allocated radiation workspace: grid {:?}, {} groups, {} angles, {} bytes",
            dims.nx,
            nf,
            nang,
            ws.bytes()
        );
        Ok(ws)
    }

    /// Workspace sized for an existing radiation grid.
    pub fn for_grid(rad: &RadGrid) -> Result<Self, RadError> {
        Self::allocate(rad.dims, rad.nf(), rad.angles.noct(), rad.angles.nang())
    }

    /// Drop every buffer.
    pub fn release(self) {
        debug!("released radiation workspace ({} bytes)", self.bytes());
    }

    pub fn bytes(&self) -> usize {
        let n = self.div.len()
            + self.line_q.len()
            + self.line_s.len()
            + self.face.len()
            + self.rhs.len()
            + self.ma.len()
            + self.diag.len()
            + self.sol.len()
            + self.angle_v.len()
            + self.angle_v2.len();
        n * std::mem::size_of::<f64>()
    }

    /// Check that this workspace was sized for `rad`.
    pub fn check(&self, rad: &RadGrid) -> Result<(), RadError> {
        if rad.dims.nx != self.dims.nx || rad.nf() != self.nf || rad.nang() != self.nang {
            return Err(RadError::DimensionMismatch(format!(
                "workspace sized for {:?} x {} groups x {} angles, grid is {:?} x {} x {}",
                self.dims.nx,
                self.nf,
                self.nang,
                rad.dims.nx,
                rad.nf(),
                rad.nang()
            )));
        }
        Ok(())
    }
}
