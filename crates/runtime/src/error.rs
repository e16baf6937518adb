use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to load config: {0}")]
    Config(#[from] phorest_config::ConfigError),
    #[error("failed to install signal handlers: {0}")]
    Signal(#[source] std::io::Error),
    #[error("failed to install logging: {0}")]
    Logging(#[source] std::io::Error),
}
