// crates/edge/src/router.rs

use crate::Error;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use domain::content::ItemId;
use domain::context::{Authority, PageMode, RequestContext};
use domain::site::SiteDescriptor;
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use serde_json::json;
use serve::request::RequestOutcome;
use serve::LinkManager;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Query key selecting the page mode (`normal`, `preview`, `edit`).
pub const MODE_QUERY_KEY: &str = "sc_mode";

/// Shared handler state: the link manager plus the host table used to pick
/// the context site.
#[derive(Clone)]
pub struct AppState {
    manager: LinkManager,
    hosts: Arc<Vec<(Regex, usize)>>,
}

impl AppState {
    /// Compile every site's `host_name` (`|`-separated, `*` wildcards).
    /// Sites with an empty host name are left to the default-site fallback.
    pub fn new(manager: LinkManager) -> Result<Self, Error> {
        let mut hosts = Vec::new();
        for (index, site) in manager.registry().sites().iter().enumerate() {
            for pattern in site.host_name.split('|').map(str::trim).filter(|p| !p.is_empty()) {
                let source = format!("^{}$", regex::escape(pattern).replace(r"\*", ".*"));
                let re = RegexBuilder::new(&source).case_insensitive(true).build()?;
                hosts.push((re, index));
            }
        }
        Ok(Self {
            manager,
            hosts: Arc::new(hosts),
        })
    }

    pub fn manager(&self) -> &LinkManager {
        &self.manager
    }

    /// First site (configured order) whose host pattern matches, else the
    /// default site.
    pub fn site_for_host(&self, host: &str) -> Option<&SiteDescriptor> {
        let sites = self.manager.registry().sites();
        self.hosts
            .iter()
            .find(|(re, _)| re.is_match(host))
            .map(|(_, i)| &sites[*i])
            .or_else(|| self.manager.registry().default_site())
    }

    /// Build the per-request context from `Host`, `X-Forwarded-Proto`, the
    /// `sc_mode` query key and the `<site>#lang` cookie.
    pub fn request_context(&self, headers: &HeaderMap, query: Option<&str>) -> RequestContext {
        let raw_host = headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("localhost");
        let scheme = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim().to_ascii_lowercase())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "http".to_owned());

        let (host, port) = match raw_host.rsplit_once(':').map(|(h, p)| (h, p.parse::<u16>())) {
            Some((h, Ok(port))) => (h, port),
            _ => (raw_host, default_port(&scheme)),
        };

        let mut ctx = match self.site_for_host(host) {
            Some(site) => RequestContext::new(site.clone()),
            None => {
                warn!(host, "no site for host; serving without site context");
                RequestContext::detached("en")
            }
        }
        .with_authority(Authority::new(&scheme, host, port))
        .with_page_mode(page_mode(query));

        if let Some(site) = ctx.site_name().map(str::to_owned) {
            if let Some(lang) = language_cookie(headers, &RequestContext::language_cookie_key(&site)) {
                ctx = ctx.with_language(lang).with_language_cookie(true);
            }
        }
        debug!(site = ?ctx.site_name(), language = %ctx.language, mode = ?ctx.page_mode, "request context");
        ctx
    }
}

fn default_port(scheme: &str) -> u16 {
    if scheme == "https" {
        443
    } else {
        80
    }
}

fn page_mode(query: Option<&str>) -> PageMode {
    let mode = query.and_then(|q| {
        form_urlencoded::parse(q.as_bytes())
            .find(|(k, _)| k.eq_ignore_ascii_case(MODE_QUERY_KEY))
            .map(|(_, v)| v.to_ascii_lowercase())
    });
    match mode.as_deref() {
        Some("edit") => PageMode::Edit,
        Some("preview") => PageMode::Preview,
        _ => PageMode::Normal,
    }
}

/// Value of cookie `name`, when present and non-empty.
fn language_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

// ─────────────────────────────────────────────────────────────────────────────
// Router construction
// ─────────────────────────────────────────────────────────────────────────────

#[tracing::instrument(skip_all)]
pub fn build(state: AppState) -> Router {
    Router::new()
        .route("/-/url/{id}", get(render_url))
        .route("/-/rewrite", post(rewrite_text))
        .fallback(resolve_request)
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Resolve any other path to a content node.
#[tracing::instrument(skip_all, fields(path = %uri.path()))]
async fn resolve_request(State(state): State<AppState>, headers: HeaderMap, uri: Uri) -> Response {
    let manager = state.manager();
    let ctx = state.request_context(&headers, uri.query());
    let request = manager.parse_request(uri.path(), uri.query(), &ctx);

    match manager.handle_request(&request, &ctx) {
        Ok(RequestOutcome::Found(node)) => {
            let url = manager.item_url(&node, &ctx).ok();
            let parent = manager.context_parent(&node, &ctx).map(|p| p.path);
            Json(json!({
                "id": node.id.to_string(),
                "path": node.path,
                "template": node.template,
                "language": node.language,
                "site": ctx.site_name(),
                "url": url,
                "parent": parent,
            }))
            .into_response()
        }
        Ok(RequestOutcome::Redirect(target)) => {
            (StatusCode::FOUND, [(header::LOCATION, target.location)]).into_response()
        }
        Ok(RequestOutcome::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "not found", "item_path": request.item_path })),
        )
            .into_response(),
        Err(e) => {
            error!("request resolution failed: {}", e);
            (e.to_status(), e.to_string()).into_response()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct UrlParams {
    site: Option<String>,
    lang: Option<String>,
}

/// Outbound URL of one item, rendered in the context of the request host.
#[tracing::instrument(skip_all)]
async fn render_url(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    Path(id): Path<String>,
    Query(params): Query<UrlParams>,
) -> Response {
    let Ok(id) = id.parse::<ItemId>() else {
        return (StatusCode::BAD_REQUEST, format!("invalid item id `{id}`")).into_response();
    };

    let manager = state.manager();
    let ctx = state.request_context(&headers, uri.query());
    let language = params.lang.unwrap_or_else(|| ctx.language.clone());
    let database = ctx.site.as_ref().map_or("web", |s| s.database.as_str());

    let Some(node) = manager.repository().get_node_by_id(&id, &language, database) else {
        return (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" }))).into_response();
    };

    let mut options = manager.default_options();
    if let Some(name) = params.site.as_deref() {
        match manager.registry().site_by_name(name) {
            Some(site) => options = options.with_site(site.clone()),
            None => {
                return (StatusCode::NOT_FOUND, format!("unknown site `{name}`")).into_response()
            }
        }
    }

    match manager.build_url(&node, &options, &ctx) {
        Ok(url) => Json(json!({ "id": node.id.to_string(), "url": url })).into_response(),
        Err(e) => (e.to_status(), e.to_string()).into_response(),
    }
}

/// Expand dynamic and media links in the posted text.
#[tracing::instrument(skip_all)]
async fn rewrite_text(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    body: String,
) -> String {
    let ctx = state.request_context(&headers, uri.query());
    state.manager().rewrite_links(&body, &ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use domain::content::ContentNode;
    use domain::setting::Settings;
    use serve::repo::InMemoryRepository;
    use tower::ServiceExt; // oneshot
    use uuid::Uuid;

    const SETTINGS: &str = r#"
        [links]
        default_site = "siteA"
        language_embedding = "never"

        [[sites]]
        name = "siteA"
        root_path = "/content/siteA"
        start_item = "/home"
        host_name = "a.example.com|www.a.example.com"
        language = "en"
        supported_languages = ["fr"]

        [[sites]]
        name = "siteB"
        root_path = "/content/siteB"
        start_item = "/home"
        host_name = "*.b.example.com"
        target_host_name = "www.b.example.com"
        language = "en"

        [[shared_content]]
        template = "Product"
        root_path = "/content/shared/products"
        folder = "products"

        [[shared_content]]
        template = "Article"
        root_path = "/content/shared/news"
        folder = "news"
        categorized_by_site_folder = true
    "#;

    fn id(n: u128) -> ItemId {
        ItemId::new(Uuid::from_u128(n))
    }

    fn app() -> Router {
        let settings: Settings = toml::from_str(SETTINGS).unwrap();
        let repo = InMemoryRepository::new(vec![
            ContentNode::new(id(1), "/content/siteA/home", "Page", "en", "web"),
            ContentNode::new(id(2), "/content/siteA/home/about", "Page", "en", "web"),
            ContentNode::new(id(3), "/content/shared/products/widget", "Product", "en", "web"),
            ContentNode::new(id(4), "/content/shared/news/siteB/launch", "Article", "en", "web"),
            ContentNode::new(id(2), "/content/siteA/home/about", "Page", "fr", "web"),
        ]);
        let manager = LinkManager::from_settings(&settings, Arc::new(repo)).unwrap();
        build(AppState::new(manager).unwrap())
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, String) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
        (status, headers, String::from_utf8_lossy(&bytes).into_owned())
    }

    fn get(path: &str, host: &str) -> Request<Body> {
        Request::get(path).header("host", host).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn resolves_site_and_shared_paths() {
        let app = app();

        let (status, _, body) = send(&app, get("/about.aspx", "a.example.com")).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["path"], "/content/siteA/home/about");
        assert_eq!(json["site"], "siteA");
        assert_eq!(json["url"], "/about.aspx");
        assert_eq!(json["parent"], "/content/siteA/home");

        let (status, _, body) = send(&app, get("/products/widget.aspx", "www.a.example.com")).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["path"], "/content/shared/products/widget");
        assert_eq!(json["url"], "/products/widget.aspx");
    }

    #[tokio::test]
    async fn language_query_selects_the_version() {
        let app = app();
        let (status, _, body) = send(&app, get("/about.aspx?sc_lang=fr", "a.example.com")).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["language"], "fr");
    }

    #[tokio::test]
    async fn unknown_paths_are_404() {
        let (status, _, body) = send(&app(), get("/nowhere.aspx", "a.example.com")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("/content/siteA/home/nowhere"));
    }

    #[tokio::test]
    async fn editors_are_redirected_to_the_owning_site() {
        let (status, headers, _) =
            send(&app(), get("/news/launch?sc_mode=edit", "a.example.com")).await;
        assert_eq!(status, StatusCode::FOUND);
        assert_eq!(
            headers.get(header::LOCATION).unwrap(),
            "http://www.b.example.com/news/launch?sc_mode=edit"
        );
    }

    #[tokio::test]
    async fn renders_urls_for_another_site() {
        let app = app();
        let path = format!("/-/url/{}?site=siteB", id(4).to_short_id());
        let (status, _, body) = send(&app, get(&path, "a.example.com")).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["url"], "http://www.b.example.com/news/launch.aspx");

        let (status, _, _) = send(&app, get("/-/url/not-an-id", "a.example.com")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rewrites_posted_text() {
        let text = format!("<a href=\"~/link.aspx?_id={}&amp;_z=z\">x</a>", id(2).to_short_id());
        let req = Request::post("/-/rewrite")
            .header("host", "a.example.com")
            .body(Body::from(text))
            .unwrap();
        let (status, _, body) = send(&app(), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<a href=\"/about.aspx\">x</a>");
    }

    #[test]
    fn context_reads_host_scheme_mode_and_cookie() {
        let settings: Settings = toml::from_str(SETTINGS).unwrap();
        let manager =
            LinkManager::from_settings(&settings, Arc::new(InMemoryRepository::default())).unwrap();
        let state = AppState::new(manager).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "shop.b.example.com:8443".parse().unwrap());
        headers.insert("x-forwarded-proto", "HTTPS".parse().unwrap());
        headers.insert(header::COOKIE, "a=1; siteB#lang=fr".parse().unwrap());

        let ctx = state.request_context(&headers, Some("sc_mode=preview"));
        assert_eq!(ctx.site_name(), Some("siteB"));
        assert_eq!(ctx.authority, Authority::new("https", "shop.b.example.com", 8443));
        assert_eq!(ctx.page_mode, PageMode::Preview);
        assert_eq!(ctx.language, "fr");
        assert!(ctx.language_cookie);

        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "unknown.org".parse().unwrap());
        let ctx = state.request_context(&headers, None);
        assert_eq!(ctx.site_name(), Some("siteA"), "falls back to the default site");
        assert!(!ctx.language_cookie);
    }
}
