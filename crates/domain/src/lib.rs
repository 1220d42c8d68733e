pub mod content;
pub mod context;
pub mod options;
pub mod setting;
pub mod site;
pub mod validate;

use thiserror::Error;

/// Configuration problems detected while loading sites, rules, or providers.
///
/// These are fatal at startup: the edge refuses to serve with a partial
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("site #{index}: {reason}")]
    InvalidSite { index: usize, reason: String },

    #[error("duplicate site name `{0}`")]
    DuplicateSite(String),

    #[error("shared content rule `{template}`: {reason}")]
    InvalidRule { template: String, reason: String },

    #[error("duplicate shared content rule for template `{0}`")]
    DuplicateRule(String),

    #[error("more than one media site configured (`{first}`, `{second}`)")]
    MultipleMediaSites { first: String, second: String },

    #[error("unknown provider type `{0}`")]
    UnknownProviderType(String),

    #[error("unknown provider `{0}`")]
    UnknownProvider(String),

    #[error("duplicate provider `{0}`")]
    DuplicateProvider(String),

    #[error("invalid value `{value}` for `{field}`")]
    InvalidValue { field: &'static str, value: String },

    #[error("media settings: {0}")]
    InvalidMedia(String),
}
