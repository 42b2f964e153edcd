use std::fmt;
use std::sync::Arc;

use crate::grid::{FluidGrid, RadGrid};
use crate::state::NGHOST;

/// One of the six faces of the grid partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Ix1,
    Ox1,
    Ix2,
    Ox2,
    Ix3,
    Ox3,
}

impl Face {
    pub const ALL: [Face; 6] = [Face::Ix1, Face::Ox1, Face::Ix2, Face::Ox2, Face::Ix3, Face::Ox3];

    pub fn dir(self) -> usize {
        match self {
            Face::Ix1 | Face::Ox1 => 0,
            Face::Ix2 | Face::Ox2 => 1,
            Face::Ix3 | Face::Ox3 => 2,
        }
    }

    pub fn is_inner(self) -> bool {
        matches!(self, Face::Ix1 | Face::Ix2 | Face::Ix3)
    }

    fn slot(self) -> usize {
        2 * self.dir() + usize::from(!self.is_inner())
    }
}

/// User-supplied ghost-zone filler for one face.
pub trait GhostFill: Send + Sync {
    fn fill(&self, face: Face, rad: &mut RadGrid, fluid: &mut FluidGrid);
}

/// Boundary treatment of a face.
#[derive(Clone)]
pub enum BoundaryKind {
    /// Copy from the opposite side of the partition.
    Periodic,
    /// Incoming radiation fixed at initialisation; ghosts are left untouched.
    FixedIncident,
    /// Ghosts are filled later by a refinement layer; nothing to do here.
    PendingProlongation,
    /// Zero-gradient copy of the nearest interior layer.
    Outflow,
    Custom(Arc<dyn GhostFill>),
}

impl fmt::Debug for BoundaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryKind::Periodic => write!(f, "Periodic"),
            BoundaryKind::FixedIncident => write!(f, "FixedIncident"),
            BoundaryKind::PendingProlongation => write!(f, "PendingProlongation"),
            BoundaryKind::Outflow => write!(f, "Outflow"),
            BoundaryKind::Custom(_) => write!(f, "Custom"),
        }
    }
}

/// Boundary kinds for all six faces.
#[derive(Clone, Debug)]
pub struct Boundaries {
    faces: [BoundaryKind; 6],
}

impl Default for Boundaries {
    fn default() -> Self {
        Self::uniform(BoundaryKind::Periodic)
    }
}

impl Boundaries {
    pub fn uniform(kind: BoundaryKind) -> Self {
        Self {
            faces: [kind.clone(), kind.clone(), kind.clone(), kind.clone(), kind.clone(), kind],
        }
    }

    pub fn with(mut self, face: Face, kind: BoundaryKind) -> Self {
        self.faces[face.slot()] = kind;
        self
    }

    pub fn kind(&self, face: Face) -> &BoundaryKind {
        &self.faces[face.slot()]
    }

    /// Fill ghost zones face by face: x1 first, then x2 and x3 over the full
    /// ghost-inclusive extent so edges and corners pick up earlier passes.
    pub fn apply(&self, rad: &mut RadGrid, fluid: &mut FluidGrid) {
        for face in Face::ALL {
            match self.kind(face) {
                BoundaryKind::Periodic => fill_copy(face, rad, fluid, true),
                BoundaryKind::Outflow => fill_copy(face, rad, fluid, false),
                BoundaryKind::FixedIncident | BoundaryKind::PendingProlongation => {}
                BoundaryKind::Custom(filler) => filler.fill(face, rad, fluid),
            }
        }
    }
}

/// Copy interior layers into the ghosts of `face`.
/// `periodic` takes the layer from the opposite side, otherwise the nearest interior layer.
fn fill_copy(face: Face, rad: &mut RadGrid, fluid: &mut FluidGrid, periodic: bool) {
    let dims = rad.dims;
    let dir = face.dir();
    let n = dims.nx[dir];
    let (ta, tb) = (dims.total((dir + 1) % 3), dims.total((dir + 2) % 3));
    for g in 0..NGHOST {
        let (dst_p, src_p) = if face.is_inner() {
            let dst = g;
            (dst, if periodic { dst + n } else { NGHOST })
        } else {
            let dst = NGHOST + n + g;
            (dst, if periodic { dst - n } else { NGHOST + n - 1 })
        };
        for b in 0..tb {
            for a in 0..ta {
                let dst = dims.line_cell(dir, dst_p, a, b);
                let src = dims.line_cell(dir, src_p, a, b);
                copy_cell(rad, fluid, src, dst);
            }
        }
    }
}

fn copy_block(buf: &mut [f64], src: usize, dst: usize, len: usize) {
    buf.copy_within(src * len..(src + 1) * len, dst * len);
}

fn copy_cell(rad: &mut RadGrid, fluid: &mut FluidGrid, src: usize, dst: usize) {
    let nf = rad.nf();
    let na = rad.nang();
    copy_block(&mut rad.intensity, src, dst, nf * na);
    copy_block(&mut rad.j, src, dst, nf);
    copy_block(&mut rad.h, src, dst, 3 * nf);
    copy_block(&mut rad.sigma, src, dst, 3 * nf);
    copy_block(&mut rad.speed_factor, src, dst, 3 * nf);
    if let Some(ref mut comp) = rad.compton {
        copy_block(comp, src, dst, nf * na);
    }
    copy_block(&mut fluid.density, src, dst, 1);
    copy_block(&mut fluid.momentum, src, dst, 3);
    copy_block(&mut fluid.energy, src, dst, 1);
    copy_block(&mut fluid.tgas, src, dst, 1);
    copy_block(&mut fluid.velguess, src, dst, 3);
}
