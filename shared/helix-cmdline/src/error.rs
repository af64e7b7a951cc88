use thiserror::Error;

#[derive(Error, Debug)]
pub enum CmdlineError {
    #[error("Convention `{convention}` failed: {source}")]
    Convention {
        convention: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Parse(#[from] clap::Error),

    #[error("No handler defined for command `{0}`")]
    MissingHandler(String),

    #[error("Service not registered: {0}")]
    ServiceNotFound(&'static str),

    #[error("Command `{command}` failed: {source}")]
    Handler {
        command: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error(
        "Command `{0}` is async and cannot block a current-thread runtime; call `execute_async` instead"
    )]
    NestedRuntime(String),

    #[error("Invalid settings: {0}")]
    Settings(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

impl CmdlineError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Parse(err) => err.exit_code(),
            Self::Handler { .. } => 1,
            Self::Convention { .. }
            | Self::Configuration(_)
            | Self::MissingHandler(_)
            | Self::Settings(_) => 3,
            Self::ServiceNotFound(_) => 4,
            Self::Runtime(_) | Self::NestedRuntime(_) | Self::Io(_) | Self::Logging(_) => 10,
        }
    }

    /// The user error carried by a convention or handler failure.
    pub fn user_error(&self) -> Option<&anyhow::Error> {
        match self {
            Self::Convention { source, .. } | Self::Handler { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CmdlineError>;
