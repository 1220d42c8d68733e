// crates/serve/src/builder.rs

//! Outbound URL construction for content nodes.
//!
//! A URL is `authority + path`, where the path is built from the node path
//! relative to the owning site's home page (or re-rooted under a flag folder
//! for shared content), optionally prefixed with the language code and the
//! site's virtual folder.

use crate::paths;
use crate::registry::SiteRegistry;
use crate::repo::ContentRepository;
use domain::content::ContentNode;
use domain::context::RequestContext;
use domain::options::{LanguageEmbedding, LanguageLocation, UrlOptions};
use domain::site::{SiteDescriptor, HOST_WILDCARDS};
use tracing::trace;

/// Query-string key carrying the language code.
pub const LANGUAGE_QUERY_KEY: &str = "sc_lang";

/// HTTPS port that is never written into an authority.
const SUPPRESSED_HTTPS_PORT: u16 = 433;

pub struct UrlBuilder<'a> {
    registry: &'a SiteRegistry,
    repo: &'a dyn ContentRepository,

    /// Re-root shared-content items under their flag folder.
    shared_content: bool,
}

impl<'a> UrlBuilder<'a> {
    pub fn new(registry: &'a SiteRegistry, repo: &'a dyn ContentRepository) -> Self {
        Self {
            registry,
            repo,
            shared_content: true,
        }
    }

    pub fn with_shared_content(mut self, enabled: bool) -> Self {
        self.shared_content = enabled;
        self
    }

    /// Browser-ready URL of `node` rendered for `site`.
    #[tracing::instrument(skip_all)]
    pub fn build_url(
        &self,
        node: &ContentNode,
        site: Option<&SiteDescriptor>,
        options: &UrlOptions,
        ctx: &RequestContext,
    ) -> String {
        let authority = self.authority(site, options, ctx);
        let relative = self.item_url_path(node, site, options);
        let url = self.assemble(&authority, &relative, node, site, options, ctx);

        trace!(path = %node.path, url = %url, "built item url");
        if options.lowercase_urls {
            url.to_lowercase()
        } else {
            url
        }
    }

    // ─────────────────────────────
    // Authority
    // ─────────────────────────────

    /// `scheme://host[:port]`, or empty for a relative URL.
    pub fn authority(
        &self,
        site: Option<&SiteDescriptor>,
        options: &UrlOptions,
        ctx: &RequestContext,
    ) -> String {
        let context_authority = if options.always_include_authority {
            ctx.authority.to_string()
        } else {
            String::new()
        };

        let Some(site) = site else {
            return context_authority;
        };
        if ctx.site.as_ref().is_some_and(|c| c.is_named(&site.name)) {
            return context_authority;
        }

        let host = site.link_host().unwrap_or(ctx.authority.host.as_str());
        if host.is_empty() || host.contains(HOST_WILDCARDS) {
            trace!(site = %site.name, "no usable host; rendering relative url");
            return String::new();
        }

        let scheme = match site.scheme.as_deref() {
            Some(s) if !s.is_empty() => s,
            _ => ctx.authority.scheme.as_str(),
        };
        let port = if site.port > 0 {
            site.port
        } else {
            ctx.authority.port
        };

        if include_port(scheme, port) {
            format!("{scheme}://{host}:{port}")
        } else {
            format!("{scheme}://{host}")
        }
    }

    // ─────────────────────────────
    // Relative path
    // ─────────────────────────────

    /// Node path relative to the site's home page, re-rooted under the flag
    /// folder for shared content and prefixed with the virtual folder.
    pub fn item_url_path(
        &self,
        node: &ContentNode,
        site: Option<&SiteDescriptor>,
        options: &UrlOptions,
    ) -> String {
        let item_path = node.path_by(options.use_display_name);
        let Some(site) = site else {
            return item_path.to_owned();
        };

        let home = self.home_path(site, node, options.use_display_name);
        let relative = match home.as_deref() {
            Some(home) if !home.is_empty() && paths::is_under(item_path, home) => {
                item_path[home.trim_end_matches('/').len()..].to_owned()
            }
            _ => match self
                .registry
                .shared_rule(&node.template)
                .filter(|_| self.shared_content)
            {
                Some(rule) => paths::join(
                    &rule.folder,
                    &paths::shared_relative_path(
                        &node.path,
                        &rule.root_path,
                        rule.categorized_by_site_folder,
                    ),
                ),
                None => item_path.to_owned(),
            },
        };

        match site.virtual_folder_segment() {
            "" => relative,
            folder => paths::join(folder, &relative),
        }
    }

    /// Home page path of `site` in the requested segment style.
    ///
    /// Display-name paths need the home node itself; `None` when it is
    /// missing from the repository.
    fn home_path(
        &self,
        site: &SiteDescriptor,
        node: &ContentNode,
        use_display_name: bool,
    ) -> Option<String> {
        let start = site.start_path();
        if !use_display_name {
            return Some(start);
        }
        let home = self.repo.resolve_by_path(&start, &node.database)?;
        let localized = self
            .repo
            .get_node_by_id(&home.id, &node.language, &node.database)
            .unwrap_or(home);
        Some(localized.path_by(true).to_owned())
    }

    // ─────────────────────────────
    // Assembly
    // ─────────────────────────────

    fn assemble(
        &self,
        authority: &str,
        relative: &str,
        node: &ContentNode,
        site: Option<&SiteDescriptor>,
        options: &UrlOptions,
        ctx: &RequestContext,
    ) -> String {
        let embed = should_embed_language(site, options, ctx);
        let language = options.language.as_deref().unwrap_or(&node.language);

        let mut head = if authority.ends_with('/') { "" } else { "/" }.to_owned();
        if embed && options.language_location == LanguageLocation::FilePath {
            head = paths::join(&head, language);
        }

        let mut path = paths::join(&head, relative);
        if path.len() > 1 {
            path.truncate(path.trim_end_matches('/').len());
        }
        if options.encode_names {
            path = paths::encode_segments(&path);
        }
        if options.add_extension && !options.extension.is_empty() && !path.is_empty() && path != "/"
        {
            path.push('.');
            path.push_str(&options.extension);
        }
        if embed && options.language_location == LanguageLocation::QueryString {
            path.push_str(&format!("?{LANGUAGE_QUERY_KEY}={language}"));
        }

        format!("{authority}{path}")
    }
}

/// Port suffix policy: https omits only 433, other schemes append ports
/// above 80. Port 0 is never written.
fn include_port(scheme: &str, port: u16) -> bool {
    if port == 0 {
        return false;
    }
    if scheme.eq_ignore_ascii_case("https") {
        port != SUPPRESSED_HTTPS_PORT
    } else {
        port > 80
    }
}

/// `Always` embeds, `Never` does not. `AsNeeded` embeds unless the visitor
/// already has a language preference for the context site and the request
/// language is the target site's own language.
pub fn should_embed_language(
    site: Option<&SiteDescriptor>,
    options: &UrlOptions,
    ctx: &RequestContext,
) -> bool {
    match options.language_embedding {
        LanguageEmbedding::Always => true,
        LanguageEmbedding::Never => false,
        LanguageEmbedding::AsNeeded => {
            let Some(context_site) = ctx.site.as_ref() else {
                return true;
            };
            if !ctx.language_cookie {
                return true;
            }
            let site_language = &site.unwrap_or(context_site).language;
            !ctx.language.eq_ignore_ascii_case(site_language)
        }
    }
}
