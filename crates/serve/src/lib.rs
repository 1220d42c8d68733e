pub mod builder;
pub mod manager;
pub mod paths;
pub mod provider;
pub mod registry;
pub mod render;
pub mod repo;
pub mod request;
pub mod site;

use domain::ConfigError;
use http::StatusCode;
use thiserror::Error;

pub use manager::LinkManager;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Site resolution was attempted with neither an explicit site nor a
    /// request context.
    #[error("no site context: pass a site explicitly when resolving outside a request")]
    MissingSiteContext,

    #[error("invalid redirect location `{0}`")]
    InvalidRedirect(String),
}

impl Error {
    pub fn to_status(&self) -> StatusCode {
        match self {
            Error::InvalidRedirect(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
