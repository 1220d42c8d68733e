// crates/serve/src/request.rs

//! Inbound request resolution: URL → item path → content node, plus the
//! authoring-mode cross-site redirect.

use crate::builder::{UrlBuilder, LANGUAGE_QUERY_KEY};
use crate::paths;
use crate::registry::SiteRegistry;
use crate::repo::ContentRepository;
use crate::site::SiteResolver;
use crate::{Error, Result};
use domain::content::ContentNode;
use domain::context::RequestContext;
use domain::options::{LanguageEmbedding, LanguageLocation, UrlOptions};
use domain::site::SiteDescriptor;
use http::Uri;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info, trace};

/// `en`, `fr-CA`, `zh-Hant-TW`, ...
static LANGUAGE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]{2,3}(?:-[A-Za-z0-9]{2,8})*$").unwrap());

// ─────────────────────────────────────────────────────────────────────────────
// Request URL
// ─────────────────────────────────────────────────────────────────────────────

/// An inbound URL mapped into the content tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestUrl {
    /// Raw request path as received.
    pub path: String,

    pub query: Option<String>,

    /// Content path the request addresses, e.g. `/content/site/home/about`.
    pub item_path: String,

    /// Language named in the path or by `sc_lang`.
    pub language: Option<String>,

    /// Item path with the leading language segment kept, tried when the
    /// language-stripped path misses (a page named `fr`).
    pub literal_item_path: Option<String>,
}

impl RequestUrl {
    /// Strip the language segment, the site's virtual folder and the
    /// extension, then root the remainder at the site's home page.
    ///
    /// A leading segment is read as a language only when `options` put the
    /// language into the path and some site serves it; otherwise `sc_lang`
    /// from the query is used.
    #[tracing::instrument(skip_all)]
    pub fn parse(
        path: &str,
        query: Option<&str>,
        site: Option<&SiteDescriptor>,
        options: &UrlOptions,
        registry: &SiteRegistry,
    ) -> Self {
        let decoded = paths::decode(path);
        let rest = strip_extension(&decoded, &options.extension);

        let path_language = options.language_embedding != LanguageEmbedding::Never
            && options.language_location == LanguageLocation::FilePath;

        let (tail, mut language, literal_item_path) = match path_language
            .then(|| take_language(rest, site, registry))
            .flatten()
        {
            Some((lang, tail)) => (
                tail,
                Some(lang.to_owned()),
                Some(root_at_home(strip_virtual_folder(rest, site), site)),
            ),
            None => (strip_virtual_folder(rest, site), None, None),
        };

        if language.is_none() {
            language = query.and_then(|q| {
                form_urlencoded::parse(q.as_bytes())
                    .find(|(k, _)| k.eq_ignore_ascii_case(LANGUAGE_QUERY_KEY))
                    .map(|(_, v)| v.into_owned())
                    .filter(|v| !v.is_empty())
            });
        }

        let item_path = root_at_home(tail, site);
        trace!(path, item_path = %item_path, language = ?language, "parsed request url");
        Self {
            path: path.to_owned(),
            query: query.filter(|q| !q.is_empty()).map(str::to_owned),
            item_path,
            language,
            literal_item_path,
        }
    }

    /// Original path and query, as used in redirects.
    pub fn path_and_query(&self) -> String {
        match self.query.as_deref() {
            Some(q) => format!("{}?{q}", self.path),
            None => self.path.clone(),
        }
    }
}

fn strip_extension<'p>(path: &'p str, extension: &str) -> &'p str {
    let extension = extension.trim_start_matches('.');
    if extension.is_empty() {
        return path;
    }
    let suffix = format!(".{extension}");
    let cut = path.len().saturating_sub(suffix.len());
    if path.len() > suffix.len()
        && path.is_char_boundary(cut)
        && path[cut..].eq_ignore_ascii_case(&suffix)
    {
        &path[..cut]
    } else {
        path
    }
}

fn strip_virtual_folder<'p>(path: &'p str, site: Option<&SiteDescriptor>) -> &'p str {
    match site.map(|s| s.virtual_folder_segment()).filter(|f| !f.is_empty()) {
        Some(folder) => {
            let folder = format!("/{folder}");
            if paths::is_under(path, &folder) {
                &path[folder.len()..]
            } else {
                path
            }
        }
        None => path,
    }
}

fn root_at_home(rest: &str, site: Option<&SiteDescriptor>) -> String {
    let rest = rest.trim_end_matches('/');
    match site {
        Some(site) => paths::join(&site.start_path(), rest),
        None if rest.is_empty() => "/".to_owned(),
        None => rest.to_owned(),
    }
}

/// Language segment before the virtual folder, else right after it.
fn take_language<'p>(
    path: &'p str,
    site: Option<&SiteDescriptor>,
    registry: &SiteRegistry,
) -> Option<(&'p str, &'p str)> {
    if let Some((lang, tail)) = split_language(path, registry) {
        return Some((lang, strip_virtual_folder(tail, site)));
    }
    split_language(strip_virtual_folder(path, site), registry)
}

/// `("/en/about", ..)` → `("en", "/about")` when `en` is a served language.
fn split_language<'p>(path: &'p str, registry: &SiteRegistry) -> Option<(&'p str, &'p str)> {
    let trimmed = path.strip_prefix('/')?;
    let (segment, tail) = match trimmed.find('/') {
        Some(i) => (&trimmed[..i], &trimmed[i..]),
        None => (trimmed, ""),
    };
    if LANGUAGE_CODE.is_match(segment) && registry.is_known_language(segment) {
        Some((segment, tail))
    } else {
        None
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Path resolver
// ─────────────────────────────────────────────────────────────────────────────

/// Where an authoring request must be sent instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget {
    pub site: String,
    pub location: String,
}

pub struct PathResolver<'a> {
    registry: &'a SiteRegistry,
    repo: &'a dyn ContentRepository,
}

impl<'a> PathResolver<'a> {
    pub fn new(registry: &'a SiteRegistry, repo: &'a dyn ContentRepository) -> Self {
        Self { registry, repo }
    }

    /// Resolve a raw request path through a shared-content flag folder.
    ///
    /// `None` when no rule owns the first segment, when no item exists, or
    /// when the item has no version in the context language.
    #[tracing::instrument(skip_all)]
    pub fn resolve_request_node(
        &self,
        request_path: &str,
        ctx: &RequestContext,
    ) -> Option<ContentNode> {
        self.resolve_shared(&paths::decode(request_path), ctx)
    }

    /// Flag-folder resolution of an already decoded item path.
    fn resolve_shared(&self, item_path: &str, ctx: &RequestContext) -> Option<ContentNode> {
        let site = ctx.site.as_ref()?;

        let relative = paths::strip_prefix_ignore_case(item_path, &site.start_path())
            .unwrap_or(item_path)
            .to_lowercase();
        let relative = relative.strip_prefix('/').unwrap_or(&relative);

        let (flag, suffix) = match relative.find('/') {
            Some(i) => (&relative[..i], relative[i + 1..].trim_matches('/')),
            None => (relative, ""),
        };

        let Some(rule) = self.registry.rule_by_folder(flag) else {
            trace!(flag, "no shared content rule for flag folder");
            return None;
        };
        if suffix.is_empty() {
            return None;
        }
        debug!(flag, template = %rule.template, "matched shared content flag folder");

        let node = if rule.categorized_by_site_folder {
            let own = format!("{}/{}/{}", rule.root_path, site.name, suffix);
            self.lookup(&own, &site.database).or_else(|| {
                trace!(path = %own, "not in site folder; trying any site");
                self.lookup(&format!("{}/*/{}", rule.root_path, suffix), &site.database)
            })
        } else {
            self.lookup(&format!("{}/{}", rule.root_path, suffix), &site.database)
        }?;

        self.language_version(&node, &ctx.language)
    }

    fn lookup(&self, path: &str, database: &str) -> Option<ContentNode> {
        let node = self.repo.resolve_by_path(path, database);
        trace!(path, found = node.is_some(), "shared content lookup");
        node
    }

    /// Best-fit version in `language`; an empty version counts as not found.
    fn language_version(&self, node: &ContentNode, language: &str) -> Option<ContentNode> {
        let version = self.repo.best_fit_language_version(node, language)?;
        if self.repo.has_language_version(&version) {
            Some(version)
        } else {
            debug!(path = %node.path, language, "empty language version");
            None
        }
    }

    /// Authoring-mode check that `node` is being edited in its own site.
    ///
    /// Returns the redirect to the owning site's authority, keeping
    /// `path_and_query`, when the node lies outside the context site and
    /// another site claims it.
    #[tracing::instrument(skip_all)]
    pub fn check_editor_redirect(
        &self,
        node: &ContentNode,
        path_and_query: &str,
        ctx: &RequestContext,
    ) -> Result<Option<RedirectTarget>> {
        if !ctx.page_mode.is_authoring() {
            return Ok(None);
        }
        let Some(site) = ctx.site.as_ref() else {
            return Ok(None);
        };
        if paths::is_under(&node.path, &site.root_path) {
            return Ok(None);
        }

        let Some(target) = self.owning_site_for_editing(node) else {
            return Ok(None);
        };
        if target.is_named(&site.name) {
            return Ok(None);
        }

        let authority = UrlBuilder::new(self.registry, self.repo).authority(
            Some(target),
            &UrlOptions::default(),
            ctx,
        );
        if authority.is_empty() {
            debug!(site = %target.name, "owning site has no host; not redirecting");
            return Ok(None);
        }

        let location = format!("{authority}{path_and_query}");
        location
            .parse::<Uri>()
            .map_err(|_| Error::InvalidRedirect(location.clone()))?;

        info!(path = %node.path, site = %target.name, "redirecting editor to owning site");
        Ok(Some(RedirectTarget {
            site: target.name.clone(),
            location,
        }))
    }

    /// Path-prefix scan first, then the site folder of a categorised
    /// shared item.
    fn owning_site_for_editing(&self, node: &ContentNode) -> Option<&'a SiteDescriptor> {
        let sites = SiteResolver::new(self.registry);
        if let Some(site) = sites.find_matching_site(&node.path, None) {
            return Some(site);
        }
        let rule = self
            .registry
            .shared_rule(&node.template)
            .filter(|r| r.categorized_by_site_folder)?;
        let folder = paths::first_folder(&node.path, rule.site_folder_root());
        self.registry.site_by_name(&folder)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pipeline
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    Found(ContentNode),
    Redirect(RedirectTarget),
    NotFound,
}

/// Per-request resolution: the primary item path lookup, then shared
/// content, then the authoring redirect check.
pub struct RequestPipeline<'a> {
    registry: &'a SiteRegistry,
    repo: &'a dyn ContentRepository,
}

impl<'a> RequestPipeline<'a> {
    pub fn new(registry: &'a SiteRegistry, repo: &'a dyn ContentRepository) -> Self {
        Self { registry, repo }
    }

    #[tracing::instrument(skip_all, fields(path = %request.path))]
    pub fn run(&self, request: &RequestUrl, ctx: &RequestContext) -> Result<RequestOutcome> {
        let Some(site) = ctx.site.as_ref() else {
            return Ok(RequestOutcome::NotFound);
        };

        let base = ctx;
        let localized;
        let ctx = match request.language.as_deref() {
            Some(lang) if !lang.eq_ignore_ascii_case(&ctx.language) => {
                localized = ctx.clone().with_language(lang);
                &localized
            }
            _ => ctx,
        };

        let resolver = PathResolver::new(self.registry, self.repo);
        let node = match self.find(&resolver, &request.item_path, site, ctx) {
            Some(node) => node,
            None => {
                let literal = request.literal_item_path.as_deref().and_then(|path| {
                    debug!(path, "retrying with the language segment as a page name");
                    self.find(&resolver, path, site, base)
                });
                match literal {
                    Some(node) => node,
                    None => return Ok(RequestOutcome::NotFound),
                }
            }
        };

        if let Some(redirect) =
            resolver.check_editor_redirect(&node, &request.path_and_query(), ctx)?
        {
            return Ok(RequestOutcome::Redirect(redirect));
        }
        Ok(RequestOutcome::Found(node))
    }

    /// Primary item path lookup, then shared content.
    fn find(
        &self,
        resolver: &PathResolver<'_>,
        item_path: &str,
        site: &SiteDescriptor,
        ctx: &RequestContext,
    ) -> Option<ContentNode> {
        self.repo
            .resolve_by_path(item_path, &site.database)
            .and_then(|node| resolver.language_version(&node, &ctx.language))
            .or_else(|| resolver.resolve_shared(item_path, ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::{InMemoryRepository, MockContentRepository};
    use domain::content::ItemId;
    use domain::context::{Authority, PageMode};
    use domain::options::{LanguageEmbedding, LanguageLocation};
    use domain::site::SharedContentRule;
    use mockall::predicate::eq;
    use uuid::Uuid;

    fn node(n: u128, path: &str, template: &str) -> ContentNode {
        ContentNode::new(ItemId::new(Uuid::from_u128(n)), path, template, "en", "web")
    }

    fn site_a() -> SiteDescriptor {
        SiteDescriptor::new("siteA", "/content/siteA", "/home", "en").with_supported_languages(["fr"])
    }

    fn registry(site: SiteDescriptor) -> SiteRegistry {
        SiteRegistry::new(
            vec![
                site,
                SiteDescriptor::new("siteB", "/content/siteB", "/home", "en")
                    .with_target_host_name("b.example.com"),
            ],
            vec![
                SharedContentRule::new("Product", "/content/shared/products", "products"),
                SharedContentRule::new("Article", "/content/shared/news", "news")
                    .categorized("/content/shared/news"),
            ],
        )
        .unwrap()
    }

    fn repo() -> InMemoryRepository {
        InMemoryRepository::new(vec![
            node(1, "/content/siteA/home", "Page"),
            node(2, "/content/siteA/home/about", "Page")
                .with_display_path("/content/siteA/home/About Us"),
            node(3, "/content/siteA/home/about/Our Team", "Page"),
            node(4, "/content/shared/products/widget", "Product"),
            node(5, "/content/shared/news/siteB/launch", "Article"),
            node(6, "/content/siteB/home/contact", "Page"),
            node(7, "/content/siteA/home/fr", "Page"),
            node(8, "/content/siteA/home/x%41", "Page"),
            node(9, "/content/siteA/home/Q&A #1?", "Page"),
        ])
    }

    #[test]
    fn parse_strips_language_folder_and_extension() {
        let site = site_a().with_virtual_folder("/shop");
        let reg = registry(site.clone());

        let url = RequestUrl::parse("/fr/shop/about.aspx", None, Some(&site), &UrlOptions::default(), &reg);
        assert_eq!(url.item_path, "/content/siteA/home/about");
        assert_eq!(url.language.as_deref(), Some("fr"));

        let url = RequestUrl::parse("/shop/about.ASPX", Some("sc_lang=fr&x=1"), Some(&site), &UrlOptions::default(), &reg);
        assert_eq!(url.item_path, "/content/siteA/home/about");
        assert_eq!(url.language.as_deref(), Some("fr"));
        assert_eq!(url.path_and_query(), "/shop/about.ASPX?sc_lang=fr&x=1");

        let url = RequestUrl::parse("/", None, Some(&site), &UrlOptions::default(), &reg);
        assert_eq!(url.item_path, "/content/siteA/home");
        assert_eq!(url.language, None);
    }

    #[test]
    fn unknown_language_like_segments_stay_in_the_path() {
        let site = site_a();
        let reg = registry(site.clone());
        let url = RequestUrl::parse("/de/about", None, Some(&site), &UrlOptions::default(), &reg);
        assert_eq!(url.item_path, "/content/siteA/home/de/about");
        assert_eq!(url.language, None);
    }

    #[test]
    fn flag_folder_resolves_shared_item() {
        let reg = registry(site_a());
        let repo = repo();
        let ctx = RequestContext::new(site_a());

        let found = PathResolver::new(&reg, &repo)
            .resolve_request_node("/content/siteA/home/Products/Widget", &ctx)
            .unwrap();
        assert_eq!(found.path, "/content/shared/products/widget");

        let resolver = PathResolver::new(&reg, &repo);
        let encoded = resolver.resolve_request_node("/products/widg%65t", &ctx).unwrap();
        assert_eq!(encoded.path, "/content/shared/products/widget");
        assert!(resolver.resolve_request_node("/unknown/widget", &ctx).is_none());
        assert!(resolver.resolve_request_node("/products", &ctx).is_none());
        assert!(resolver.resolve_request_node("/products/missing", &ctx).is_none());
    }

    #[test]
    fn categorized_rule_tries_own_site_then_wildcard() {
        let reg = registry(site_a());
        let mut repo = MockContentRepository::new();
        let mut seq = mockall::Sequence::new();

        repo.expect_resolve_by_path()
            .with(eq("/content/shared/news/siteA/launch"), eq("web"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| None);
        repo.expect_resolve_by_path()
            .with(eq("/content/shared/news/*/launch"), eq("web"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Some(node(5, "/content/shared/news/siteB/launch", "Article")));
        repo.expect_best_fit_language_version()
            .returning(|n, _| Some(n.clone()));
        repo.expect_has_language_version().returning(|_| true);

        let found = PathResolver::new(&reg, &repo)
            .resolve_request_node("/news/launch", &RequestContext::new(site_a()))
            .unwrap();
        assert_eq!(found.path, "/content/shared/news/siteB/launch");
    }

    #[test]
    fn empty_language_version_is_not_found() {
        let reg = registry(site_a());
        let repo = repo();
        let ctx = RequestContext::new(site_a()).with_language("fr");

        assert!(PathResolver::new(&reg, &repo)
            .resolve_request_node("/products/widget", &ctx)
            .is_none());
    }

    #[test]
    fn editor_redirect_only_in_authoring_modes() {
        let reg = registry(site_a());
        let repo = repo();
        let resolver = PathResolver::new(&reg, &repo);
        let contact = node(6, "/content/siteB/home/contact", "Page");

        let normal = RequestContext::new(site_a());
        assert_eq!(resolver.check_editor_redirect(&contact, "/x", &normal).unwrap(), None);

        let edit = normal.clone().with_page_mode(PageMode::Edit);
        let target = resolver
            .check_editor_redirect(&contact, "/contact.aspx?sc_mode=edit", &edit)
            .unwrap()
            .unwrap();
        assert_eq!(target.site, "siteB");
        assert_eq!(target.location, "http://b.example.com/contact.aspx?sc_mode=edit");

        let own = node(2, "/content/siteA/home/about", "Page");
        assert_eq!(resolver.check_editor_redirect(&own, "/about", &edit).unwrap(), None);
    }

    #[test]
    fn editor_redirect_uses_site_folder_of_categorized_items() {
        let reg = registry(site_a());
        let repo = repo();
        let launch = node(5, "/content/shared/news/siteB/launch", "Article");
        let edit = RequestContext::new(site_a()).with_page_mode(PageMode::Preview);

        let target = PathResolver::new(&reg, &repo)
            .check_editor_redirect(&launch, "/news/launch", &edit)
            .unwrap()
            .unwrap();
        assert_eq!(target.location, "http://b.example.com/news/launch");
    }

    #[test]
    fn editor_redirect_skipped_without_host() {
        let reg = SiteRegistry::new(
            vec![site_a(), SiteDescriptor::new("siteC", "/content/siteC", "/home", "en")],
            vec![],
        )
        .unwrap();
        let repo = InMemoryRepository::default();
        let ctx = RequestContext::new(site_a())
            .with_page_mode(PageMode::Edit)
            .with_authority(Authority::new("http", "", 80));

        let n = node(9, "/content/siteC/home/x", "Page");
        assert_eq!(
            PathResolver::new(&reg, &repo).check_editor_redirect(&n, "/x", &ctx).unwrap(),
            None
        );
    }

    #[test]
    fn pipeline_prefers_primary_then_shared_then_redirect() {
        let reg = registry(site_a());
        let repo = repo();
        let pipeline = RequestPipeline::new(&reg, &repo);
        let ctx = RequestContext::new(site_a());
        let parse = |p: &str| RequestUrl::parse(p, None, Some(&reg.sites()[0]), &UrlOptions::default(), &reg);

        match pipeline.run(&parse("/about.aspx"), &ctx).unwrap() {
            RequestOutcome::Found(n) => assert_eq!(n.path, "/content/siteA/home/about"),
            other => panic!("unexpected {other:?}"),
        }
        match pipeline.run(&parse("/products/widget.aspx"), &ctx).unwrap() {
            RequestOutcome::Found(n) => assert_eq!(n.path, "/content/shared/products/widget"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            pipeline.run(&parse("/nothing-here"), &ctx).unwrap(),
            RequestOutcome::NotFound
        );

        let edit = ctx.clone().with_page_mode(PageMode::Edit);
        match pipeline.run(&parse("/news/launch"), &edit).unwrap() {
            RequestOutcome::Redirect(r) => assert_eq!(r.site, "siteB"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn language_segment_is_a_page_name_when_urls_carry_no_path_language() {
        let site = site_a();
        let reg = registry(site.clone());
        let never = UrlOptions::default().with_language_embedding(LanguageEmbedding::Never);
        let query = UrlOptions::default().with_language_location(LanguageLocation::QueryString);

        for options in [never, query] {
            let url = RequestUrl::parse("/fr.aspx", None, Some(&site), &options, &reg);
            assert_eq!(url.item_path, "/content/siteA/home/fr");
            assert_eq!(url.language, None);
            assert_eq!(url.literal_item_path, None);
        }

        let url = RequestUrl::parse("/fr.aspx", None, Some(&site), &UrlOptions::default(), &reg);
        assert_eq!(url.item_path, "/content/siteA/home");
        assert_eq!(url.language.as_deref(), Some("fr"));
        assert_eq!(url.literal_item_path.as_deref(), Some("/content/siteA/home/fr"));
    }

    #[test]
    fn missed_language_lookup_retries_the_literal_path() {
        let reg = registry(site_a());
        let repo = repo();
        let ctx = RequestContext::new(site_a());
        let request = RequestUrl::parse("/fr.aspx", None, Some(&reg.sites()[0]), &UrlOptions::default(), &reg);

        match RequestPipeline::new(&reg, &repo).run(&request, &ctx).unwrap() {
            RequestOutcome::Found(n) => assert_eq!(n.path, "/content/siteA/home/fr"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn percent_signs_in_names_are_decoded_once() {
        let reg = registry(site_a());
        let repo = repo();
        let ctx = RequestContext::new(site_a());
        let request = RequestUrl::parse("/x%2541.aspx", None, Some(&reg.sites()[0]), &UrlOptions::default(), &reg);
        assert_eq!(request.item_path, "/content/siteA/home/x%41");

        match RequestPipeline::new(&reg, &repo).run(&request, &ctx).unwrap() {
            RequestOutcome::Found(n) => assert_eq!(n.path, "/content/siteA/home/x%41"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn built_urls_resolve_back_to_their_node() {
        let mut variants = Vec::new();
        for embedding in [LanguageEmbedding::Always, LanguageEmbedding::Never, LanguageEmbedding::AsNeeded] {
            for location in [LanguageLocation::FilePath, LanguageLocation::QueryString] {
                let base = UrlOptions::default()
                    .with_language_embedding(embedding)
                    .with_language_location(location);
                variants.push(base.with_lowercase(true));
                variants.push(base.with_display_name(true));
                variants.push(base.with_lowercase(true).with_display_name(true));
                variants.push(base);
            }
        }
        let folders = ["", "/shop"];
        // home, page, nested page with a space, shared item, a page named
        // like a served language, and names with reserved characters
        let targets = [1u128, 2, 3, 4, 7, 8, 9];

        for folder in folders {
            let site = site_a().with_virtual_folder(folder);
            let reg = registry(site.clone());
            let repo = repo();
            let builder = UrlBuilder::new(&reg, &repo);
            let pipeline = RequestPipeline::new(&reg, &repo);
            let visitor = RequestContext::new(site.clone())
                .with_authority(Authority::new("http", "a.example.com", 80));

            for cookie in [false, true] {
                let ctx = visitor.clone().with_language_cookie(cookie);

                for options in &variants {
                    for id in targets {
                        let target = repo
                            .nodes
                            .iter()
                            .find(|n| n.id == ItemId::new(Uuid::from_u128(id)))
                            .unwrap()
                            .clone();

                        let url = builder.build_url(&target, Some(&site), options, &ctx);
                        let (path, query) = match url.split_once('?') {
                            Some((p, q)) => (p, Some(q)),
                            None => (url.as_str(), None),
                        };
                        let request = RequestUrl::parse(path, query, Some(&site), options, &reg);

                        assert_eq!(
                            pipeline.run(&request, &ctx).unwrap(),
                            RequestOutcome::Found(target.clone()),
                            "url {url} (folder {folder:?}, cookie {cookie}, {} {}, lowercase {}, display {})",
                            options.language_embedding,
                            options.language_location,
                            options.lowercase_urls,
                            options.use_display_name,
                        );
                    }
                }
            }
        }
    }
}
