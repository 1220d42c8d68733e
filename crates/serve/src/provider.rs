// crates/serve/src/provider.rs

//! Link providers and per-site provider switching.
//!
//! There is one [`LinkProvider`] type, parameterised by a [`Strategy`] and its
//! own option defaults. Providers are created from configuration through a
//! fixed table of factory keys, so an unknown type fails at startup.

use crate::builder::UrlBuilder;
use crate::paths;
use crate::registry::SiteRegistry;
use crate::render::DynamicLinkToken;
use crate::repo::ContentRepository;
use crate::site::SiteResolver;
use crate::Result;
use domain::content::ContentNode;
use domain::context::RequestContext;
use domain::options::UrlOptions;
use domain::setting::{ProviderSettings, Settings};
use domain::site::HOST_WILDCARDS;
use domain::ConfigError;
use std::collections::HashMap;
use tracing::{debug, trace, warn};

/// Factory key of the shared-content aware provider.
pub const SHARED_CONTENT: &str = "shared-content";

/// Factory key of the plain provider.
pub const STANDARD: &str = "standard";

/// Read-only collaborators a provider needs for one call.
#[derive(Clone, Copy)]
pub struct LinkScope<'a> {
    pub registry: &'a SiteRegistry,
    pub repo: &'a dyn ContentRepository,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Owning-site inference, flag-folder re-rooting and editor dynamic URLs.
    SharedContent,

    /// Explicit or context site only; shared rules are ignored.
    Standard,
}

type Factory = fn(&str, UrlOptions) -> LinkProvider;

fn shared_content_provider(name: &str, defaults: UrlOptions) -> LinkProvider {
    LinkProvider::new(name, Strategy::SharedContent, defaults)
}

fn standard_provider(name: &str, defaults: UrlOptions) -> LinkProvider {
    LinkProvider::new(name, Strategy::Standard, defaults)
}

/// Factory table keyed by provider type.
fn factory(kind: &str) -> Option<Factory> {
    match kind.to_ascii_lowercase().as_str() {
        SHARED_CONTENT => Some(shared_content_provider as Factory),
        STANDARD => Some(standard_provider as Factory),
        _ => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LinkProvider
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct LinkProvider {
    name: String,
    strategy: Strategy,
    defaults: UrlOptions,
}

impl LinkProvider {
    pub fn new(name: impl Into<String>, strategy: Strategy, defaults: UrlOptions) -> Self {
        Self {
            name: name.into(),
            strategy,
            defaults,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Fresh copy of this provider's defaults, free to customise per call.
    pub fn default_options(&self) -> UrlOptions {
        self.defaults.clone()
    }

    /// Outbound URL of `node`.
    ///
    /// In Preview/Edit with a context site the shared-content strategy
    /// returns a dynamic link so the item opens in its own site.
    #[tracing::instrument(skip_all, fields(provider = %self.name))]
    pub fn item_url(
        &self,
        node: &ContentNode,
        options: &UrlOptions,
        ctx: &RequestContext,
        scope: LinkScope<'_>,
    ) -> Result<String> {
        let builder = UrlBuilder::new(scope.registry, scope.repo);

        match self.strategy {
            Strategy::SharedContent => {
                if ctx.page_mode.is_authoring() {
                    if let Some(url) = self.editor_url(node, ctx, scope.registry) {
                        return Ok(url);
                    }
                }
                let site = SiteResolver::new(scope.registry).resolve_owning_site(
                    node,
                    options.site.as_ref(),
                    ctx,
                )?;
                Ok(builder.build_url(node, site.as_ref(), options, ctx))
            }
            Strategy::Standard => {
                let site = if node.is_in_core_repository() {
                    None
                } else {
                    options.site.as_ref().or(ctx.site.as_ref())
                };
                Ok(builder
                    .with_shared_content(false)
                    .build_url(node, site, options, ctx))
            }
        }
    }

    /// Dynamic link for authoring modes; `None` outside a site.
    ///
    /// Shared items carry the site named by their site folder so the editor
    /// opens them in that site.
    fn editor_url(
        &self,
        node: &ContentNode,
        ctx: &RequestContext,
        registry: &SiteRegistry,
    ) -> Option<String> {
        let context_site = ctx.site.as_ref()?;

        let site = registry
            .shared_rule(&node.template)
            .map(|rule| paths::first_folder(&node.path, rule.site_folder_root()))
            .and_then(|folder| registry.site_by_name(&folder))
            .unwrap_or(context_site);

        let host = site.link_host().or(Some(ctx.authority.host.as_str()));
        trace!(site = %site.name, host = ?host, "editor dynamic url");
        Some(dynamic_url(node, Some(&node.language), host, &site.name))
    }
}

/// `http://<host>/~/link.aspx?_id=<SHORTID>&_lang=..&_site=..&_z=z`
///
/// Without a usable host (missing, empty or a pattern) the link is relative:
/// `/~/link.aspx?...`.
pub fn dynamic_url(
    node: &ContentNode,
    language: Option<&str>,
    host: Option<&str>,
    site: &str,
) -> String {
    let mut token = DynamicLinkToken::new(node.id);
    if let Some(lang) = language {
        token = token.with_language(lang);
    }
    if !site.is_empty() {
        token = token.with_site(site);
    }
    match host.filter(|h| !h.is_empty() && !h.contains(HOST_WILDCARDS)) {
        Some(host) => format!("http://{host}/{token}"),
        None => format!("/{token}"),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Provider switching
// ─────────────────────────────────────────────────────────────────────────────

/// Per-site switching targets, resolved to provider indices at startup.
#[derive(Debug, Clone, Default)]
struct SwitchTarget {
    by_name: Option<usize>,
    by_type: Option<usize>,
}

/// Named providers plus the per-site switching table.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    providers: Vec<LinkProvider>,
    switching: HashMap<String, SwitchTarget>,
    default: usize,
}

impl ProviderRegistry {
    /// Single shared-content provider built from `defaults`.
    pub fn single(defaults: UrlOptions) -> Self {
        Self {
            providers: vec![LinkProvider::new(
                SHARED_CONTENT,
                Strategy::SharedContent,
                defaults,
            )],
            switching: HashMap::new(),
            default: 0,
        }
    }

    #[tracing::instrument(skip_all)]
    pub fn from_settings(settings: &Settings) -> std::result::Result<Self, ConfigError> {
        let defaults = settings.links.url_options();
        let ProviderSettings {
            default,
            definitions,
            switching,
        } = &settings.providers;

        if definitions.is_empty() && switching.is_empty() && default.is_none() {
            return Ok(Self::single(defaults));
        }

        let mut providers: Vec<LinkProvider> = Vec::new();
        for def in definitions {
            let make = factory(&def.kind)
                .ok_or_else(|| ConfigError::UnknownProviderType(def.kind.clone()))?;
            if providers.iter().any(|p| p.name.eq_ignore_ascii_case(&def.name)) {
                return Err(ConfigError::DuplicateProvider(def.name.clone()));
            }
            let options = def
                .options
                .as_ref()
                .map(|o| o.url_options())
                .unwrap_or_else(|| defaults.clone());
            providers.push(make(&def.name, options));
        }

        let mut table = HashMap::new();
        for rule in switching {
            let mut target = SwitchTarget::default();
            if let Some(kind) = rule.provider_type.as_deref() {
                target.by_type = Some(provider_for_kind(&mut providers, kind, &defaults)?);
            }
            if let Some(name) = rule.provider.as_deref() {
                target.by_name = Some(
                    position_by_name(&providers, name)
                        .ok_or_else(|| ConfigError::UnknownProvider(name.to_owned()))?,
                );
            }
            if target.by_name.is_none() && target.by_type.is_none() {
                return Err(ConfigError::InvalidValue {
                    field: "providers.switching",
                    value: rule.site.clone(),
                });
            }
            table.insert(rule.site.to_ascii_lowercase(), target);
        }

        let default = match default.as_deref() {
            Some(name) => match position_by_name(&providers, name) {
                Some(i) => i,
                None => provider_for_kind(&mut providers, name, &defaults)
                    .map_err(|_| ConfigError::UnknownProvider(name.to_owned()))?,
            },
            None if definitions.is_empty() => {
                provider_for_kind(&mut providers, SHARED_CONTENT, &defaults)?
            }
            None => 0,
        };

        debug!(
            providers = providers.len(),
            rules = table.len(),
            default = %providers[default].name,
            "link providers loaded"
        );

        Ok(Self {
            providers,
            switching: table,
            default,
        })
    }

    pub fn providers(&self) -> &[LinkProvider] {
        &self.providers
    }

    pub fn default_provider(&self) -> &LinkProvider {
        &self.providers[self.default]
    }

    pub fn by_name(&self, name: &str) -> Option<&LinkProvider> {
        position_by_name(&self.providers, name).map(|i| &self.providers[i])
    }

    /// Provider for `site`: its rule's provider name, then its rule's
    /// provider type, then the default.
    pub fn resolve(&self, site: Option<&str>) -> &LinkProvider {
        let target = site.and_then(|s| self.switching.get(&s.to_ascii_lowercase()));
        let index = target
            .and_then(|t| t.by_name.or(t.by_type))
            .unwrap_or(self.default);
        &self.providers[index]
    }

    /// Provider for rendering `node`: the site comes from the explicit
    /// `options.site`, else from a path scan of the registry.
    pub fn select(
        &self,
        node: &ContentNode,
        options: &UrlOptions,
        registry: &SiteRegistry,
    ) -> &LinkProvider {
        let site = match options.site.as_ref() {
            Some(site) => Some(site.name.as_str()),
            None => SiteResolver::new(registry)
                .find_matching_site(&node.path, Some(&node.language))
                .map(|s| s.name.as_str()),
        };
        let provider = self.resolve(site);
        if site.is_none() && !self.switching.is_empty() {
            warn!(path = %node.path, "no site matched for provider switching; using default");
        }
        provider
    }
}

/// Index of the first provider built by the `kind` factory, creating one
/// named after the key when none exists yet.
fn provider_for_kind(
    providers: &mut Vec<LinkProvider>,
    kind: &str,
    defaults: &UrlOptions,
) -> std::result::Result<usize, ConfigError> {
    let make = factory(kind).ok_or_else(|| ConfigError::UnknownProviderType(kind.to_owned()))?;
    let candidate = make(kind, defaults.clone());
    if let Some(i) = providers.iter().position(|p| p.strategy == candidate.strategy) {
        return Ok(i);
    }
    providers.push(candidate);
    Ok(providers.len() - 1)
}

fn position_by_name(providers: &[LinkProvider], name: &str) -> Option<usize> {
    providers.iter().position(|p| p.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::InMemoryRepository;
    use domain::content::ItemId;
    use domain::context::{Authority, PageMode};
    use domain::options::LanguageEmbedding;
    use domain::site::{SharedContentRule, SiteDescriptor};

    fn settings(extra: &str) -> Settings {
        let base = r#"
            [[sites]]
            name = "siteA"
            root_path = "/content/siteA"
            start_item = "/home"
            language = "en"

            [[sites]]
            name = "legacy"
            root_path = "/content/legacy"
            start_item = "/home"
            language = "en"
        "#;
        toml::from_str(&format!("{base}\n{extra}")).unwrap()
    }

    fn registry() -> SiteRegistry {
        SiteRegistry::new(
            vec![
                SiteDescriptor::new("siteA", "/content/siteA", "/home", "en")
                    .with_target_host_name("a.example.com"),
                SiteDescriptor::new("siteB", "/content/siteB", "/home", "en")
                    .with_target_host_name("b.example.com"),
            ],
            vec![SharedContentRule::new("Article", "/content/shared/news", "news")
                .categorized("/content/shared/news")],
        )
        .unwrap()
    }

    fn node(path: &str, template: &str) -> ContentNode {
        ContentNode::new(
            "110D559FDEA542EA9C1C8A5DF7E70EF9".parse::<ItemId>().unwrap(),
            path,
            template,
            "en",
            "web",
        )
    }

    #[test]
    fn no_provider_section_means_one_shared_content_provider() {
        let reg = ProviderRegistry::from_settings(&settings("")).unwrap();
        assert_eq!(reg.providers().len(), 1);
        assert_eq!(reg.default_provider().strategy(), Strategy::SharedContent);
    }

    #[test]
    fn switching_by_name_then_type_then_default() {
        let reg = ProviderRegistry::from_settings(&settings(
            r#"
            [providers]
            default = "main"

            [[providers.definitions]]
            name = "main"
            type = "shared-content"

            [[providers.definitions]]
            name = "classic"
            type = "standard"

            [providers.definitions.options]
            add_extension = false

            [[providers.switching]]
            site = "legacy"
            provider = "classic"

            [[providers.switching]]
            site = "other"
            provider_type = "standard"
            "#,
        ))
        .unwrap();

        assert_eq!(reg.resolve(Some("LEGACY")).name(), "classic");
        assert!(!reg.resolve(Some("legacy")).default_options().add_extension);
        assert_eq!(reg.resolve(Some("other")).strategy(), Strategy::Standard);
        assert_eq!(reg.resolve(Some("siteA")).name(), "main");
        assert_eq!(reg.resolve(None).name(), "main");
    }

    #[test]
    fn unknown_types_and_names_fail_at_load() {
        let err = ProviderRegistry::from_settings(&settings(
            "[[providers.definitions]]\nname = \"x\"\ntype = \"reflection.Type, Assembly\"\n",
        ))
        .unwrap_err();
        assert_eq!(err, ConfigError::UnknownProviderType("reflection.Type, Assembly".into()));

        let err = ProviderRegistry::from_settings(&settings(
            "[[providers.switching]]\nsite = \"legacy\"\nprovider = \"ghost\"\n",
        ))
        .unwrap_err();
        assert_eq!(err, ConfigError::UnknownProvider("ghost".into()));

        let err = ProviderRegistry::from_settings(&settings(
            "[[providers.definitions]]\nname = \"a\"\ntype = \"standard\"\n\
             [[providers.definitions]]\nname = \"A\"\ntype = \"standard\"\n",
        ))
        .unwrap_err();
        assert_eq!(err, ConfigError::DuplicateProvider("A".into()));
    }

    #[test]
    fn select_uses_hint_then_path_scan() {
        let sites = registry();
        let mut providers = ProviderRegistry::single(UrlOptions::default());
        providers
            .providers
            .push(LinkProvider::new("classic", Strategy::Standard, UrlOptions::default()));
        providers.switching.insert(
            "siteb".into(),
            SwitchTarget {
                by_name: Some(1),
                by_type: None,
            },
        );

        let page = node("/content/siteB/home/x", "Page");
        assert_eq!(providers.select(&page, &UrlOptions::default(), &sites).name(), "classic");

        let hinted = UrlOptions::default().with_site(sites.site_by_name("siteA").unwrap().clone());
        assert_eq!(providers.select(&page, &hinted, &sites).name(), SHARED_CONTENT);
    }

    #[test]
    fn editor_mode_renders_dynamic_link_to_owning_site() {
        let sites = registry();
        let repo = InMemoryRepository::default();
        let scope = LinkScope {
            registry: &sites,
            repo: &repo,
        };
        let provider = LinkProvider::new(SHARED_CONTENT, Strategy::SharedContent, UrlOptions::default());
        let ctx = RequestContext::new(sites.site_by_name("siteB").unwrap().clone())
            .with_page_mode(PageMode::Edit);

        let story = node("/content/shared/news/siteA/story", "Article");
        let url = provider
            .item_url(&story, &provider.default_options(), &ctx, scope)
            .unwrap();
        assert_eq!(
            url,
            "http://a.example.com/~/link.aspx?_id=110D559FDEA542EA9C1C8A5DF7E70EF9&_lang=en&_site=siteA&_z=z"
        );

        let page = node("/content/siteB/home/x", "Page");
        let url = provider
            .item_url(&page, &provider.default_options(), &ctx, scope)
            .unwrap();
        assert!(url.starts_with("http://b.example.com/~/link.aspx?_id="));
        assert!(url.ends_with("&_site=siteB&_z=z"));
    }

    #[test]
    fn editor_link_without_site_host_uses_request_host_or_stays_relative() {
        let sites = SiteRegistry::new(
            vec![SiteDescriptor::new("siteA", "/content/siteA", "/home", "en")
                .with_host_name("*.a.example.com")],
            vec![],
        )
        .unwrap();
        let repo = InMemoryRepository::default();
        let scope = LinkScope {
            registry: &sites,
            repo: &repo,
        };
        let provider = LinkProvider::new(SHARED_CONTENT, Strategy::SharedContent, UrlOptions::default());
        let page = node("/content/siteA/home/x", "Page");
        let edit = RequestContext::new(sites.site_by_name("siteA").unwrap().clone())
            .with_page_mode(PageMode::Edit);

        let from_request = edit
            .clone()
            .with_authority(Authority::new("http", "edit.a.example.com", 80));
        let url = provider
            .item_url(&page, &provider.default_options(), &from_request, scope)
            .unwrap();
        assert!(url.starts_with("http://edit.a.example.com/~/link.aspx?_id="), "{url}");

        let no_host = edit.with_authority(Authority::new("http", "", 80));
        let url = provider
            .item_url(&page, &provider.default_options(), &no_host, scope)
            .unwrap();
        assert_eq!(
            url,
            "/~/link.aspx?_id=110D559FDEA542EA9C1C8A5DF7E70EF9&_lang=en&_site=siteA&_z=z"
        );
    }

    #[test]
    fn dynamic_url_never_renders_an_empty_host() {
        let n = node("/content/siteA/home/x", "Page");
        for host in [None, Some(""), Some("*.example.com")] {
            let url = dynamic_url(&n, Some("en"), host, "siteA");
            assert!(url.starts_with("/~/link.aspx?_id="), "{url}");
        }
        assert!(dynamic_url(&n, None, Some("a.example.com"), "")
            .starts_with("http://a.example.com/~/link.aspx?_id="));
    }

    #[test]
    fn normal_mode_builds_site_relative_url() {
        let sites = registry();
        let repo = InMemoryRepository::default();
        let scope = LinkScope {
            registry: &sites,
            repo: &repo,
        };
        let ctx = RequestContext::new(sites.site_by_name("siteA").unwrap().clone());
        let options = UrlOptions::default().with_language_embedding(LanguageEmbedding::Never);

        let shared = LinkProvider::new(SHARED_CONTENT, Strategy::SharedContent, options.clone());
        let story = node("/content/shared/news/siteA/story", "Article");
        assert_eq!(
            shared.item_url(&story, &options, &ctx, scope).unwrap(),
            "/news/story.aspx"
        );

        let standard = LinkProvider::new(STANDARD, Strategy::Standard, options.clone());
        assert_eq!(
            standard.item_url(&story, &options, &ctx, scope).unwrap(),
            "/content/shared/news/siteA/story.aspx"
        );
    }

    #[test]
    fn detached_shared_content_needs_a_site() {
        let sites = registry();
        let repo = InMemoryRepository::default();
        let scope = LinkScope {
            registry: &sites,
            repo: &repo,
        };
        let provider = LinkProvider::new(SHARED_CONTENT, Strategy::SharedContent, UrlOptions::default());
        let page = node("/content/siteA/home/x", "Page");
        let ctx = RequestContext::detached("en");

        assert!(provider
            .item_url(&page, &provider.default_options(), &ctx, scope)
            .is_err());

        let hinted = provider
            .default_options()
            .with_site(sites.site_by_name("siteA").unwrap().clone())
            .with_language_embedding(LanguageEmbedding::Never);
        assert_eq!(
            provider.item_url(&page, &hinted, &ctx, scope).unwrap(),
            "http://a.example.com/x.aspx"
        );
    }
}
