/// Errors specific to the Discord integration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("discord config: {0}")]
    Config(String),

    #[error("discord gateway: {0}")]
    Gateway(String),
}

pub type Result<T> = std::result::Result<T, Error>;
