use crate::error::RadError;

/// Ghost layers on each side of every direction.
pub const NGHOST: usize = 2;

/// Extents and spacing of one structured grid partition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridDims {
    /// Interior cell counts along x1, x2, x3.
    pub nx: [usize; 3],
    /// Cell widths along x1, x2, x3.
    pub dx: [f64; 3],
}

impl GridDims {
    pub fn new(nx: [usize; 3], dx: [f64; 3]) -> Result<Self, RadError> {
        if nx.iter().any(|&n| n == 0) {
            return Err(RadError::InvalidConfig(format!("grid extents must be positive, got {:?}", nx)));
        }
        if dx.iter().any(|&d| !(d > 0.0) || !d.is_finite()) {
            return Err(RadError::InvalidConfig(format!("cell widths must be positive, got {:?}", dx)));
        }
        Ok(Self { nx, dx })
    }

    /// Cell count along `dir` including ghost layers.
    #[inline(always)]
    pub const fn total(&self, dir: usize) -> usize {
        self.nx[dir] + 2 * NGHOST
    }

    /// Number of cells including ghosts.
    pub const fn ncells(&self) -> usize {
        self.total(0) * self.total(1) * self.total(2)
    }

    /// Longest line (with ghosts) any directional sweep walks.
    pub fn max_line(&self) -> usize {
        (0..3).map(|d| self.total(d)).max().unwrap_or(0)
    }

    /// Flat cell index; `i, j, k` count from the first ghost layer.
    #[inline(always)]
    pub const fn cell(&self, i: usize, j: usize, k: usize) -> usize {
        (k * self.total(1) + j) * self.total(0) + i
    }

    /// Flat cell index from interior coordinates (0 = first interior cell).
    #[inline(always)]
    pub const fn cell_inner(&self, i: usize, j: usize, k: usize) -> usize {
        self.cell(i + NGHOST, j + NGHOST, k + NGHOST)
    }

    /// Cell index of position `p` on the line along `dir` through `(a, b)`,
    /// where `(a, b)` are the two remaining coordinates in cyclic order.
    #[inline(always)]
    pub const fn line_cell(&self, dir: usize, p: usize, a: usize, b: usize) -> usize {
        match dir {
            0 => self.cell(p, a, b),
            1 => self.cell(b, p, a),
            _ => self.cell(a, b, p),
        }
    }

    /// Interior index range along `dir` (ghost-inclusive coordinates).
    pub const fn interior(&self, dir: usize) -> std::ops::Range<usize> {
        NGHOST..NGHOST + self.nx[dir]
    }

    /// Iterate every interior cell as `(i, j, k)` in ghost-inclusive coordinates.
    pub fn interior_cells(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        self.interior(2).flat_map(move |k| {
            self.interior(1)
                .flat_map(move |j| self.interior(0).map(move |i| (i, j, k)))
        })
    }
}

/// Allocate a zero-filled buffer, reporting failure instead of aborting.
pub fn alloc_zeroed(len: usize, what: &'static str) -> Result<Vec<f64>, RadError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| RadError::Allocation { what, len })?;
    buf.resize(len, 0.0);
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims() -> GridDims {
        GridDims::new([4, 3, 2], [0.1, 0.2, 0.3]).unwrap()
    }

    #[test]
    fn test_cell_index_is_row_major_in_x() {
        let d = dims();
        assert_eq!(d.cell(0, 0, 0), 0);
        assert_eq!(d.cell(1, 0, 0), 1);
        assert_eq!(d.cell(0, 1, 0), d.total(0));
        assert_eq!(d.cell(0, 0, 1), d.total(0) * d.total(1));
        assert_eq!(d.cell_inner(0, 0, 0), d.cell(NGHOST, NGHOST, NGHOST));
    }

    #[test]
    fn test_line_cell_matches_cell() {
        let d = dims();
        assert_eq!(d.line_cell(0, 5, 2, 3), d.cell(5, 2, 3));
        assert_eq!(d.line_cell(1, 4, 2, 3), d.cell(3, 4, 2));
        assert_eq!(d.line_cell(2, 1, 2, 3), d.cell(2, 3, 1));
    }

    #[test]
    fn test_interior_cells_count() {
        let d = dims();
        assert_eq!(d.interior_cells().count(), 4 * 3 * 2);
        assert!(d.interior_cells().all(|(i, j, k)| i >= NGHOST && j >= NGHOST && k >= NGHOST));
    }

    #[test]
    fn test_max_line_includes_ghosts() {
        assert_eq!(dims().max_line(), 4 + 2 * NGHOST);
    }

    #[test]
    fn test_rejects_empty_grid() {
        assert!(GridDims::new([0, 1, 1], [1.0; 3]).is_err());
        assert!(GridDims::new([1, 1, 1], [1.0, 0.0, 1.0]).is_err());
    }

    #[test]
    fn test_alloc_zeroed() {
        let buf = alloc_zeroed(16, "test").unwrap();
        assert_eq!(buf.len(), 16);
        assert!(buf.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_alloc_failure_reported() {
        match alloc_zeroed(usize::MAX / 4, "huge") {
            Err(RadError::Allocation { what, .. }) => assert_eq!(what, "huge"),
            other => panic!("expected allocation error, got {:?}", other.map(|v| v.len())),
        }
    }
}
