// crates/serve/src/render/rewriter.rs

//! Expansion of stored rich text: dynamic content links first, then media
//! references.

use super::content_links::expand_content_links;
use super::media::MediaUrlBuilder;
use super::media_links::expand_media_links;
use crate::provider::{LinkScope, ProviderRegistry};
use domain::context::RequestContext;
use domain::options::{MediaUrlOptions, UrlOptions};
use tracing::{debug, trace};

/// Database read when neither the token nor the context names a site.
pub const DEFAULT_DATABASE: &str = "web";

pub struct LinkTextRewriter<'a> {
    scope: LinkScope<'a>,
    providers: &'a ProviderRegistry,
}

impl<'a> LinkTextRewriter<'a> {
    pub fn new(scope: LinkScope<'a>, providers: &'a ProviderRegistry) -> Self {
        Self { scope, providers }
    }

    /// Rewrite all link references in `text`. Text outside a reference is
    /// copied unchanged and a second pass over the output is a no-op.
    #[tracing::instrument(skip_all, fields(len = text.len()))]
    pub fn rewrite(&self, text: &str, ctx: &RequestContext) -> String {
        let expanded = self.expand_content(text, ctx);
        self.expand_media(&expanded, ctx)
    }

    fn expand_content(&self, text: &str, ctx: &RequestContext) -> String {
        let registry = self.scope.registry;

        expand_content_links(text, |token| {
            let named = token
                .site
                .as_deref()
                .and_then(|name| registry.site_by_name(name));
            let site = named
                .or(ctx.site.as_ref())
                .or_else(|| registry.default_site());

            let database = site.map_or(DEFAULT_DATABASE, |s| s.database.as_str());
            let language = token
                .language
                .as_deref()
                .or(site.map(|s| s.language.as_str()))
                .unwrap_or(ctx.language.as_str());

            let Some(node) = self.scope.repo.get_node_by_id(&token.item_id, language, database)
            else {
                debug!(id = %token.item_id, language, database, "dead content link");
                return None;
            };

            let hint = named.map_or_else(UrlOptions::default, |site| {
                UrlOptions::default().with_site(site.clone())
            });
            let provider = self.providers.select(&node, &hint, registry);
            let mut options = provider.default_options();
            if let Some(site) = named {
                options = options.with_site(site.clone());
            }

            match provider.item_url(&node, &options, ctx, self.scope) {
                Ok(url) => Some(url),
                Err(err) => {
                    debug!(id = %token.item_id, error = %err, "content link not rendered");
                    None
                }
            }
        })
    }

    fn expand_media(&self, text: &str, ctx: &RequestContext) -> String {
        let registry = self.scope.registry;
        let media = registry.media();
        let marker = format!(".{}", media.default_extension.trim_start_matches('.'));
        let database = ctx
            .site
            .as_ref()
            .map_or(DEFAULT_DATABASE, |s| s.database.as_str());
        let builder = MediaUrlBuilder::new(registry);

        expand_media_links(text, &media.prefixes, &marker, |id, with_extension| {
            let node = self.scope.repo.get_node_by_id(id, &ctx.language, database)?;
            let options = MediaUrlOptions {
                include_extension: with_extension,
                ..Default::default()
            };
            let url = builder.media_url(&node, &options, ctx);
            trace!(id = %id, url = %url, "media link");
            Some(url)
        })
    }
}
