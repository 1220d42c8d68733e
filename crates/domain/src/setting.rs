use crate::options::{LanguageEmbedding, LanguageLocation, UrlOptions};
use crate::site::{SharedContentRule, SiteDescriptor};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};

#[derive(Debug, Clone, Deserialize)]
pub struct EdgeSettings {
    /// IP address the HTTP edge binds to
    #[serde(default = "default_ip")]
    pub ip: IpAddr,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_ip() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_port() -> u16 {
    8080
}

impl Default for EdgeSettings {
    fn default() -> Self {
        Self {
            ip: default_ip(),
            port: default_port(),
        }
    }
}

/// Link provider defaults (`[links]`, or `options` of a provider definition).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LinkSettings {
    pub add_extension: bool,
    pub extension: String,
    pub always_include_authority: bool,
    pub encode_names: bool,
    pub language_embedding: LanguageEmbedding,
    pub language_location: LanguageLocation,
    pub lowercase_urls: bool,
    pub use_display_name: bool,

    /// Site used when no request context is available.
    pub default_site: Option<String>,
}

impl Default for LinkSettings {
    fn default() -> Self {
        let o = UrlOptions::default();
        Self {
            add_extension: o.add_extension,
            extension: o.extension,
            always_include_authority: o.always_include_authority,
            encode_names: o.encode_names,
            language_embedding: o.language_embedding,
            language_location: o.language_location,
            lowercase_urls: o.lowercase_urls,
            use_display_name: o.use_display_name,
            default_site: None,
        }
    }
}

impl LinkSettings {
    pub fn url_options(&self) -> UrlOptions {
        UrlOptions {
            add_extension: self.add_extension,
            extension: self.extension.trim_start_matches('.').to_owned(),
            always_include_authority: self.always_include_authority,
            encode_names: self.encode_names,
            language_embedding: self.language_embedding,
            language_location: self.language_location,
            lowercase_urls: self.lowercase_urls,
            use_display_name: self.use_display_name,
            site: None,
            language: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MediaSettings {
    /// Prefixes recognised in stored text, e.g. `~/media/`.
    pub prefixes: Vec<String>,

    /// Prefix written into rendered media URLs.
    pub link_prefix: String,

    /// Content path of the media library.
    pub library_root: String,

    pub default_extension: String,

    /// Name of the dedicated media site, if any.
    pub site: Option<String>,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            prefixes: vec!["~/media/".to_owned(), "-/media/".to_owned()],
            link_prefix: "~/media/".to_owned(),
            library_root: "/sitecore/media library".to_owned(),
            default_extension: "ashx".to_owned(),
            site: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderDefinition {
    pub name: String,

    /// Factory key, e.g. `shared-content` or `standard`.
    #[serde(rename = "type")]
    pub kind: String,

    /// Option defaults for this provider; `[links]` when absent.
    #[serde(default)]
    pub options: Option<LinkSettings>,
}

/// Picks a provider for one site, by name or by factory key.
#[derive(Debug, Clone, Deserialize)]
pub struct SwitchingRule {
    pub site: String,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub provider_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub default: Option<String>,
    pub definitions: Vec<ProviderDefinition>,
    pub switching: Vec<SwitchingRule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub edge: EdgeSettings,
    #[serde(default)]
    pub links: LinkSettings,
    #[serde(default)]
    pub media: MediaSettings,
    #[serde(default)]
    pub sites: Vec<SiteDescriptor>,
    #[serde(default)]
    pub shared_content: Vec<SharedContentRule>,
    #[serde(default)]
    pub providers: ProviderSettings,
}
