// crates/serve/src/render/media.rs

//! Media asset URLs: `<link_prefix><SHORTID | library path>[.ext]`.

use crate::paths;
use crate::registry::SiteRegistry;
use domain::content::ContentNode;
use domain::context::RequestContext;
use domain::options::MediaUrlOptions;
use tracing::warn;

pub struct MediaUrlBuilder<'a> {
    registry: &'a SiteRegistry,
}

impl<'a> MediaUrlBuilder<'a> {
    pub fn new(registry: &'a SiteRegistry) -> Self {
        Self { registry }
    }

    #[tracing::instrument(skip_all)]
    pub fn media_url(
        &self,
        node: &ContentNode,
        options: &MediaUrlOptions,
        ctx: &RequestContext,
    ) -> String {
        let media = self.registry.media();
        let mut root = media.link_prefix.trim_start_matches('/').to_owned();

        if options.always_include_authority && ctx.page_mode.is_normal() {
            match self.media_host(ctx) {
                Some(host) => root = paths::join(&format!("http://{host}"), &root),
                None => warn!("no media host name available; rendering relative media url"),
            }
        }

        let library = format!("{}/", media.library_root.trim_end_matches('/'));
        let path = match paths::strip_prefix_ignore_case(&node.path, &library) {
            Some(rest) if options.use_item_path => rest.to_owned(),
            _ => node.id.to_short_id(),
        };

        let mut url = root;
        url.push_str(&path);
        if options.include_extension {
            let ext = options
                .request_extension
                .as_deref()
                .or(node.extension.as_deref())
                .filter(|e| !e.is_empty())
                .unwrap_or(media.default_extension.as_str());
            url.push('.');
            url.push_str(ext.trim_start_matches('.'));
        }
        url
    }

    /// Context site's media host, else the media site's link host, else the
    /// context site's link host.
    fn media_host(&self, ctx: &RequestContext) -> Option<String> {
        let site = ctx.site.as_ref();
        if let Some(host) = site
            .and_then(|s| s.media_host_name.as_deref())
            .filter(|h| !h.is_empty())
        {
            return Some(host.to_owned());
        }
        self.registry
            .media_site()
            .and_then(|m| m.link_host())
            .or_else(|| site.and_then(|s| s.link_host()))
            .map(str::to_owned)
    }
}
