// crates/domain/src/options.rs

use crate::site::SiteDescriptor;
use crate::ConfigError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// ─────────────────────────────────────────────────────────────────────────────
// Language embedding policy
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LanguageEmbedding {
    Always,
    Never,
    #[default]
    AsNeeded,
}

impl FromStr for LanguageEmbedding {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_key(s).as_str() {
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            "asneeded" => Ok(Self::AsNeeded),
            _ => Err(ConfigError::InvalidValue {
                field: "language_embedding",
                value: s.to_owned(),
            }),
        }
    }
}

impl fmt::Display for LanguageEmbedding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Always => "always",
            Self::Never => "never",
            Self::AsNeeded => "as-needed",
        })
    }
}

/// Where an embedded language code goes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LanguageLocation {
    /// `/en/page`
    #[default]
    FilePath,
    /// `/page?sc_lang=en`
    QueryString,
}

impl FromStr for LanguageLocation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_key(s).as_str() {
            "filepath" | "path" | "pathprefix" => Ok(Self::FilePath),
            "querystring" | "query" => Ok(Self::QueryString),
            _ => Err(ConfigError::InvalidValue {
                field: "language_location",
                value: s.to_owned(),
            }),
        }
    }
}

impl fmt::Display for LanguageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FilePath => "file-path",
            Self::QueryString => "query-string",
        })
    }
}

/// Lowercase and drop `-`/`_` so `as-needed`, `AsNeeded` and `as_needed` agree.
fn normalize_key(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| *c != '-' && *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

macro_rules! serde_via_str {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

serde_via_str!(LanguageEmbedding);
serde_via_str!(LanguageLocation);

// ─────────────────────────────────────────────────────────────────────────────
// URL options
// ─────────────────────────────────────────────────────────────────────────────

/// Controls how one outbound item URL is rendered.
///
/// A provider holds one default value; callers derive a per-call value with
/// the `with_*` methods, which return a new `UrlOptions` and leave the
/// default untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlOptions {
    pub add_extension: bool,
    pub extension: String,
    pub always_include_authority: bool,
    pub encode_names: bool,
    pub language_embedding: LanguageEmbedding,
    pub language_location: LanguageLocation,
    pub lowercase_urls: bool,
    pub use_display_name: bool,

    /// Explicit target site; bypasses owning-site inference.
    pub site: Option<SiteDescriptor>,

    /// Language code to embed; the node's language when unset.
    pub language: Option<String>,
}

impl Default for UrlOptions {
    fn default() -> Self {
        Self {
            add_extension: true,
            extension: "aspx".to_owned(),
            always_include_authority: false,
            encode_names: true,
            language_embedding: LanguageEmbedding::AsNeeded,
            language_location: LanguageLocation::FilePath,
            lowercase_urls: false,
            use_display_name: false,
            site: None,
            language: None,
        }
    }
}

impl UrlOptions {
    pub fn with_site(&self, site: SiteDescriptor) -> Self {
        Self {
            site: Some(site),
            ..self.clone()
        }
    }

    pub fn with_language(&self, language: impl Into<String>) -> Self {
        Self {
            language: Some(language.into()),
            ..self.clone()
        }
    }

    pub fn with_authority(&self, always: bool) -> Self {
        Self {
            always_include_authority: always,
            ..self.clone()
        }
    }

    pub fn with_language_embedding(&self, embedding: LanguageEmbedding) -> Self {
        Self {
            language_embedding: embedding,
            ..self.clone()
        }
    }

    pub fn with_language_location(&self, location: LanguageLocation) -> Self {
        Self {
            language_location: location,
            ..self.clone()
        }
    }

    pub fn with_extension(&self, add: bool) -> Self {
        Self {
            add_extension: add,
            ..self.clone()
        }
    }

    pub fn with_display_name(&self, use_display_name: bool) -> Self {
        Self {
            use_display_name,
            ..self.clone()
        }
    }

    pub fn with_lowercase(&self, lowercase: bool) -> Self {
        Self {
            lowercase_urls: lowercase,
            ..self.clone()
        }
    }

    pub fn with_encode_names(&self, encode: bool) -> Self {
        Self {
            encode_names: encode,
            ..self.clone()
        }
    }
}

/// Options for rendering a media asset URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaUrlOptions {
    pub include_extension: bool,
    pub always_include_authority: bool,

    /// Use the library-relative item path instead of the short id.
    pub use_item_path: bool,

    /// Overrides the item's own extension.
    pub request_extension: Option<String>,
}
