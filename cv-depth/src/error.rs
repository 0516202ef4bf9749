use thiserror::Error;

#[derive(Debug, Error)]
pub enum DepthError {
    #[error("depth grid must have non-zero dimensions, got {x_max}x{y_max} with {h_max} hypotheses")]
    EmptyGrid {
        x_max: usize,
        y_max: usize,
        h_max: usize,
    },
    #[error("grid scale must be positive and finite, got {0}")]
    InvalidScale(f64),
    #[error("grid origin must be finite, got ({0}, {1})")]
    InvalidOrigin(f64, f64),
    #[error(
        "reconstruction outputs are misaligned: {entries} entries, {hypotheses} hypothesis \
         indices, {sigmas} sigmas and {points} points"
    )]
    MisalignedPack {
        entries: usize,
        hypotheses: usize,
        sigmas: usize,
        points: usize,
    },
    #[error("failed to write point cloud")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DepthError>;
