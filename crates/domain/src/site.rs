// crates/domain/src/site.rs

use serde::{Deserialize, Serialize};

/// Characters that mark a host name as a pattern rather than a real host.
pub const HOST_WILDCARDS: &[char] = &['*', '|'];

/// One hosted site. Loaded once at startup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteDescriptor {
    pub name: String,

    /// Content path of the site node, e.g. `/sitecore/content/website`.
    pub root_path: String,

    /// Home item path relative to `root_path`, e.g. `/home`.
    #[serde(default)]
    pub start_item: String,

    /// Host (or host pattern) this site answers on.
    #[serde(default)]
    pub host_name: String,

    /// Host to use when rendering links to this site.
    #[serde(default)]
    pub target_host_name: Option<String>,

    /// Host for media links rendered in the context of this site.
    #[serde(default)]
    pub media_host_name: Option<String>,

    #[serde(default)]
    pub scheme: Option<String>,

    /// 0 means "use the request port".
    #[serde(default)]
    pub port: u16,

    #[serde(default)]
    pub virtual_folder: String,

    pub language: String,

    #[serde(default)]
    pub supported_languages: Vec<String>,

    /// Repository the site reads content from.
    #[serde(default = "default_database")]
    pub database: String,
}

fn default_database() -> String {
    "web".to_owned()
}

impl SiteDescriptor {
    pub fn new(
        name: impl Into<String>,
        root_path: impl Into<String>,
        start_item: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            root_path: root_path.into(),
            start_item: start_item.into(),
            host_name: String::new(),
            target_host_name: None,
            media_host_name: None,
            scheme: None,
            port: 0,
            virtual_folder: String::new(),
            language: language.into(),
            supported_languages: Vec::new(),
            database: default_database(),
        }
    }

    // ───────────────────────────────
    // Builder-style setters
    // ───────────────────────────────

    pub fn with_host_name(mut self, host: impl Into<String>) -> Self {
        self.host_name = host.into();
        self
    }

    pub fn with_target_host_name(mut self, host: impl Into<String>) -> Self {
        self.target_host_name = Some(host.into());
        self
    }

    pub fn with_media_host_name(mut self, host: impl Into<String>) -> Self {
        self.media_host_name = Some(host.into());
        self
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_virtual_folder(mut self, folder: impl Into<String>) -> Self {
        self.virtual_folder = folder.into();
        self
    }

    pub fn with_supported_languages<I, S>(mut self, langs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supported_languages = langs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// `root_path + start_item`, the path of the site's home node.
    pub fn start_path(&self) -> String {
        format!("{}{}", self.root_path, self.start_item)
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Case-insensitive membership in `supported_languages`.
    pub fn supports_language(&self, language: &str) -> bool {
        self.supported_languages
            .iter()
            .any(|l| l.eq_ignore_ascii_case(language))
    }

    /// Explicit target host, else the host name when it is not a pattern.
    pub fn link_host(&self) -> Option<&str> {
        match self.target_host_name.as_deref() {
            Some(t) if !t.is_empty() => Some(t),
            _ if !self.host_name.is_empty() && !self.host_name.contains(HOST_WILDCARDS) => {
                Some(self.host_name.as_str())
            }
            _ => None,
        }
    }

    /// Virtual folder without surrounding slashes; empty for `/`.
    pub fn virtual_folder_segment(&self) -> &str {
        self.virtual_folder.trim_matches('/')
    }
}

/// Maps one template onto a shared-content folder outside every site tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedContentRule {
    /// Template name; unique across all rules.
    pub template: String,

    /// Content path holding the shared items.
    pub root_path: String,

    /// Flag folder name used in URLs.
    pub folder: String,

    /// Items are grouped in one sub-folder per site under `root_path`.
    #[serde(default)]
    pub categorized_by_site_folder: bool,

    /// Prefix after which the owning site's folder name appears.
    #[serde(default)]
    pub path_to_site_folder: Option<String>,

    /// Path of the page that acts as the parent of shared items, `$site`
    /// is replaced with the context site name.
    #[serde(default)]
    pub parent_page_query: Option<String>,
}

impl SharedContentRule {
    pub fn new(
        template: impl Into<String>,
        root_path: impl Into<String>,
        folder: impl Into<String>,
    ) -> Self {
        Self {
            template: template.into(),
            root_path: root_path.into(),
            folder: folder.into(),
            categorized_by_site_folder: false,
            path_to_site_folder: None,
            parent_page_query: None,
        }
    }

    pub fn categorized(mut self, path_to_site_folder: impl Into<String>) -> Self {
        self.categorized_by_site_folder = true;
        self.path_to_site_folder = Some(path_to_site_folder.into());
        self
    }

    pub fn with_path_to_site_folder(mut self, path: impl Into<String>) -> Self {
        self.path_to_site_folder = Some(path.into());
        self
    }

    pub fn with_parent_page_query(mut self, query: impl Into<String>) -> Self {
        self.parent_page_query = Some(query.into());
        self
    }

    /// Prefix after which the owning site's folder name is read: the
    /// configured `path_to_site_folder`, otherwise the rule root.
    pub fn site_folder_root(&self) -> &str {
        match self.path_to_site_folder.as_deref() {
            Some(p) if !p.is_empty() => p,
            _ => &self.root_path,
        }
    }
}
