use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("service run error: {0:#}")]
    Run(anyhow::Error),
    #[error("service shutdown error: {0:#}")]
    Shutdown(Arc<anyhow::Error>),
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}
