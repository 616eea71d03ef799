use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Surface is no longer attached: {0}")]
    SurfaceGone(String),

    #[error("Engine already released")]
    EngineReleased,
}

pub type Result<T> = std::result::Result<T, BridgeError>;
