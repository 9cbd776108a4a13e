use thiserror::Error;

#[derive(Debug, Error)]
pub enum PhysarumError {
    #[error("cell (row {row}, col {col}) is outside of the {rows}x{cols} field")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Config(#[from] config::ConfigError),
    #[error("Couldn't encode frame: {0}")]
    Image(#[from] image::ImageError),
    #[error("frame writer stopped unexpectedly: {0}")]
    FrameWriter(String),
}
