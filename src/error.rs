use thiserror::Error;

/// Errors raised while setting up or advancing the radiation field.
#[derive(Debug, Error)]
pub enum RadError {
    #[error("failed to allocate {what} ({len} elements)")]
    Allocation { what: &'static str, len: usize },

    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("invalid quadrature: {0}")]
    InvalidQuadrature(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("singular scattering system at cell {cell:?}, frequency {freq}")]
    SingularScattering { cell: [usize; 3], freq: usize },

    #[error(
        "temperature coupling did not converge at cell {cell:?}, frequency {freq} \
         after {iterations} iterations (residual: {residual:.3e})"
    )]
    AbsorptionNotConverged {
        cell: [usize; 3],
        freq: usize,
        iterations: usize,
        residual: f64,
    },
}
