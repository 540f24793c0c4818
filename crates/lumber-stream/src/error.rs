use lumber_runtime::RuntimeError;
use lumber_world::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("failed to build scan thread: {0}")]
    ScanPool(#[from] rayon::ThreadPoolBuildError),
}
