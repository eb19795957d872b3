use thiserror::Error;

#[derive(Debug, Error)]
pub enum RevenaError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("No active job. Open a job before exporting.")]
    NoActiveJob,

    #[error("Authoring data incomplete: {0} is required")]
    IncompleteAuthoring(&'static str),

    #[error("Unknown kit: {0}")]
    UnknownKit(String),

    #[error("Report export failed: {0}")]
    Export(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
