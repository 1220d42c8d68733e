// crates/serve/src/manager.rs

//! Process-wide entry point for link rendering and request resolution.
//!
//! Built once at startup from validated settings, then shared read-only by
//! every request. All per-request state arrives through [`RequestContext`].

use crate::provider::{LinkProvider, LinkScope, ProviderRegistry};
use crate::registry::SiteRegistry;
use crate::render::{LinkTextRewriter, MediaUrlBuilder};
use crate::repo::ContentRepository;
use crate::request::{PathResolver, RedirectTarget, RequestOutcome, RequestPipeline, RequestUrl};
use crate::site::SiteResolver;
use crate::Result;
use domain::content::ContentNode;
use domain::context::RequestContext;
use domain::options::{MediaUrlOptions, UrlOptions};
use domain::setting::Settings;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct LinkManager {
    registry: Arc<SiteRegistry>,
    repo: Arc<dyn ContentRepository>,
    providers: Arc<ProviderRegistry>,
}

impl LinkManager {
    pub fn new(
        registry: SiteRegistry,
        providers: ProviderRegistry,
        repo: Arc<dyn ContentRepository>,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            repo,
            providers: Arc::new(providers),
        }
    }

    /// Validate `settings` and build the registries; any configuration
    /// problem aborts startup.
    #[tracing::instrument(skip_all)]
    pub fn from_settings(settings: &Settings, repo: Arc<dyn ContentRepository>) -> Result<Self> {
        let registry = SiteRegistry::from_settings(settings)?;
        let providers = ProviderRegistry::from_settings(settings)?;
        info!(
            sites = registry.sites().len(),
            rules = registry.rules().len(),
            providers = providers.providers().len(),
            "link manager ready"
        );
        Ok(Self::new(registry, providers, repo))
    }

    pub fn registry(&self) -> &SiteRegistry {
        &self.registry
    }

    pub fn repository(&self) -> &dyn ContentRepository {
        self.repo.as_ref()
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    fn scope(&self) -> LinkScope<'_> {
        LinkScope {
            registry: &self.registry,
            repo: self.repo.as_ref(),
        }
    }

    /// Provider that renders `node` under the switching rules.
    pub fn provider_for(&self, node: &ContentNode, options: &UrlOptions) -> &LinkProvider {
        self.providers.select(node, options, &self.registry)
    }

    /// Defaults of the default provider, to be customised per call.
    pub fn default_options(&self) -> UrlOptions {
        self.providers.default_provider().default_options()
    }

    /// Outbound URL of `node`, rendered by the provider switching selects.
    pub fn build_url(
        &self,
        node: &ContentNode,
        options: &UrlOptions,
        ctx: &RequestContext,
    ) -> Result<String> {
        self.provider_for(node, options)
            .item_url(node, options, ctx, self.scope())
    }

    /// Outbound URL with the selected provider's own defaults.
    pub fn item_url(&self, node: &ContentNode, ctx: &RequestContext) -> Result<String> {
        let provider = self.provider_for(node, &UrlOptions::default());
        provider.item_url(node, &provider.default_options(), ctx, self.scope())
    }

    pub fn media_url(
        &self,
        node: &ContentNode,
        options: &MediaUrlOptions,
        ctx: &RequestContext,
    ) -> String {
        MediaUrlBuilder::new(&self.registry).media_url(node, options, ctx)
    }

    pub fn rewrite_links(&self, text: &str, ctx: &RequestContext) -> String {
        LinkTextRewriter::new(self.scope(), &self.providers).rewrite(text, ctx)
    }

    pub fn owning_site(
        &self,
        node: &ContentNode,
        ctx: &RequestContext,
    ) -> Result<Option<domain::site::SiteDescriptor>> {
        SiteResolver::new(&self.registry).resolve_owning_site(node, None, ctx)
    }

    pub fn context_parent(&self, node: &ContentNode, ctx: &RequestContext) -> Option<ContentNode> {
        SiteResolver::new(&self.registry).context_parent_for_shared_item(
            node,
            ctx,
            self.repo.as_ref(),
        )
    }

    /// Map a raw request onto the content tree for the context site, using
    /// the defaults of the provider that renders that site's links.
    pub fn parse_request(&self, path: &str, query: Option<&str>, ctx: &RequestContext) -> RequestUrl {
        let site = ctx.site.as_ref();
        let options = self
            .providers
            .resolve(site.map(|s| s.name.as_str()))
            .default_options();
        RequestUrl::parse(path, query, site, &options, &self.registry)
    }

    pub fn resolve_request_node(&self, path: &str, ctx: &RequestContext) -> Option<ContentNode> {
        PathResolver::new(&self.registry, self.repo.as_ref()).resolve_request_node(path, ctx)
    }

    pub fn check_editor_redirect(
        &self,
        node: &ContentNode,
        path_and_query: &str,
        ctx: &RequestContext,
    ) -> Result<Option<RedirectTarget>> {
        PathResolver::new(&self.registry, self.repo.as_ref())
            .check_editor_redirect(node, path_and_query, ctx)
    }

    /// Full inbound resolution of one request.
    pub fn handle_request(&self, request: &RequestUrl, ctx: &RequestContext) -> Result<RequestOutcome> {
        RequestPipeline::new(&self.registry, self.repo.as_ref()).run(request, ctx)
    }
}
