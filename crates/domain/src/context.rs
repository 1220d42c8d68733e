// crates/domain/src/context.rs

use crate::site::SiteDescriptor;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rendering mode of the current request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageMode {
    #[default]
    Normal,
    Preview,
    Edit,
}

impl PageMode {
    pub fn is_normal(&self) -> bool {
        matches!(self, PageMode::Normal)
    }

    /// Preview and Edit are both authoring modes.
    pub fn is_authoring(&self) -> bool {
        !self.is_normal()
    }
}

/// Scheme, host and port the current request arrived on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authority {
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

impl Authority {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            port,
        }
    }

    fn is_default_port(&self) -> bool {
        match self.port {
            0 => true,
            80 => self.scheme.eq_ignore_ascii_case("http"),
            443 => self.scheme.eq_ignore_ascii_case("https"),
            _ => false,
        }
    }
}

impl Default for Authority {
    fn default() -> Self {
        Self::new("http", "localhost", 80)
    }
}

/// `scheme://host[:port]`, port omitted when it is the scheme default.
impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host)?;
        if !self.is_default_port() {
            write!(f, ":{}", self.port)?;
        }
        Ok(())
    }
}

/// Everything the link core needs to know about the request being served.
///
/// Passed explicitly to every resolution and building call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Site serving the request; `None` outside a request (background jobs).
    pub site: Option<SiteDescriptor>,

    /// Language the request is rendered in.
    pub language: String,

    pub authority: Authority,
    pub page_mode: PageMode,

    /// Visitor has a stored language preference for this site.
    pub language_cookie: bool,
}

impl RequestContext {
    pub fn new(site: SiteDescriptor) -> Self {
        let language = site.language.clone();
        Self {
            site: Some(site),
            language,
            ..Default::default()
        }
    }

    /// Context with no site, as seen by background processing.
    pub fn detached(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            ..Default::default()
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_authority(mut self, authority: Authority) -> Self {
        self.authority = authority;
        self
    }

    pub fn with_page_mode(mut self, mode: PageMode) -> Self {
        self.page_mode = mode;
        self
    }

    pub fn with_language_cookie(mut self, present: bool) -> Self {
        self.language_cookie = present;
        self
    }

    pub fn site_name(&self) -> Option<&str> {
        self.site.as_ref().map(|s| s.name.as_str())
    }

    /// Cookie name holding the language preference for `site`.
    pub fn language_cookie_key(site: &str) -> String {
        format!("{site}#lang")
    }
}
