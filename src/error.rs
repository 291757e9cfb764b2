use thiserror::Error;

/// Errors raised at the I/O boundary. Segmentation itself never fails.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SegmentError {
    #[error("failed to load or encode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T, E = SegmentError> = std::result::Result<T, E>;
