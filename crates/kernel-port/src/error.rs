use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("port is closed")]
    Closed,
    #[error("port does not support {0}")]
    WrongDirection(&'static str),
}

pub type Result<T> = std::result::Result<T, PortError>;

impl From<kernel_gc::Unwind> for PortError {
    fn from(_: kernel_gc::Unwind) -> Self {
        PortError::Io(std::io::Error::new(std::io::ErrorKind::Other, "heap allocation failed while opening a port"))
    }
}
