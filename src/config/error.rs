#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid yaml in process configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("process configuration validation failed: {0}")]
    Validation(String),
}
