// crates/edge/src/cli.rs

use crate::content::load_repository;
use crate::router::{self, AppState};
use crate::Error;
use chrono::Utc;
use clap::{builder::ValueHint, Args, Parser, Subcommand};
use domain::content::ItemId;
use domain::setting::Settings;
use http::{header, HeaderMap, HeaderValue};
use serve::request::RequestOutcome;
use serve::LinkManager;
use std::io::Read;
use std::net::SocketAddr;
use std::sync::Arc;
use std::{path::PathBuf, process::ExitCode};
use tracing::{debug, error, info};

pub type Result<T> = std::result::Result<T, Error>;

/// sitelinks CLI
#[tokio::main(flavor = "multi_thread")]
#[tracing::instrument(skip_all)]
pub async fn start() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve(cmd) => do_serve(cmd).await,
        Commands::Url(cmd) => run_url(cmd).map(|out| println!("{out}")),
        Commands::Resolve(cmd) => run_resolve(cmd).map(|out| println!("{out}")),
        Commands::Rewrite(cmd) => run_rewrite(cmd).map(|out| print!("{out}")),
    };

    result.map_or_else(
        |e| {
            error!("sitelinks failed: {}", e);
            eprintln!("error: {e}");
            ExitCode::FAILURE
        },
        |_| ExitCode::SUCCESS,
    )
}

#[tracing::instrument(skip_all)]
async fn do_serve(cmd: ServeCmd) -> Result<()> {
    let then = Utc::now();
    let process = StartProcess::<CommandIssued>::parse_settings_file(cmd.site)?;
    info!(
        "Settings parsed in {} milliseconds",
        Utc::now().timestamp_millis() - then.timestamp_millis()
    );

    let then = Utc::now();
    let process = process.load_content()?;
    info!(
        "Content loaded in {} milliseconds",
        Utc::now().timestamp_millis() - then.timestamp_millis()
    );

    let then = Utc::now();
    let process = process.build_links()?;
    info!(
        "Sites and providers validated in {} milliseconds",
        Utc::now().timestamp_millis() - then.timestamp_millis()
    );

    process.start_server().await
}

#[derive(Parser, Debug)]
#[command(name = "sitelinks", version, about = "Multi-site content URL resolution")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the HTTP edge for the sites in the specified directory
    Serve(ServeCmd),

    /// Print the outbound URL of one item
    Url(UrlCmd),

    /// Resolve a request path to a content item
    Resolve(ResolveCmd),

    /// Expand dynamic and media links in a file (or stdin)
    Rewrite(RewriteCmd),
}

/// Directory holding `settings.toml` and `content.toml`.
#[derive(Args, Debug, Clone)]
pub struct SiteDir {
    /// Target directory (or set SITELINKS_DIR)
    ///
    /// Must exist and be a directory.
    #[arg(
        long = "dir",
        value_name = "DIR",
        env = "SITELINKS_DIR",
        required = true,
        value_hint = ValueHint::DirPath,
        value_parser = dir_must_exist
    )]
    pub dir: PathBuf,
}

/// Request the offline commands pretend to serve.
#[derive(Args, Debug, Clone, Default)]
pub struct RequestArgs {
    /// Host header of the simulated request
    #[arg(long)]
    pub host: Option<String>,

    /// Page mode: normal, preview or edit
    #[arg(long)]
    pub mode: Option<String>,

    /// Value of the visitor's `<site>#lang` cookie
    #[arg(long = "lang-cookie")]
    pub lang_cookie: Option<String>,
}

#[derive(Parser, Debug)]
pub struct ServeCmd {
    #[command(flatten)]
    pub site: SiteDir,
}

#[derive(Parser, Debug)]
pub struct UrlCmd {
    #[command(flatten)]
    pub site: SiteDir,

    /// Item id (braced, hyphenated or 32-hex short form)
    pub id: String,

    /// Render for this site instead of inferring the owning site
    #[arg(long = "site")]
    pub target_site: Option<String>,

    /// Language version of the item
    #[arg(long)]
    pub lang: Option<String>,

    #[command(flatten)]
    pub request: RequestArgs,
}

#[derive(Parser, Debug)]
pub struct ResolveCmd {
    #[command(flatten)]
    pub site: SiteDir,

    /// Request path, optionally with a query string
    pub path: String,

    #[command(flatten)]
    pub request: RequestArgs,
}

#[derive(Parser, Debug)]
pub struct RewriteCmd {
    #[command(flatten)]
    pub site: SiteDir,

    /// File to rewrite; stdin when omitted
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub file: Option<PathBuf>,

    #[command(flatten)]
    pub request: RequestArgs,
}

fn dir_must_exist(s: &str) -> std::result::Result<PathBuf, String> {
    let p = PathBuf::from(s);
    if !p.exists() {
        return Err(format!("Not found: {}", p.display()));
    }
    if !p.is_dir() {
        return Err(format!("Not a directory: {}", p.display()));
    }
    Ok(p)
}

// ─────────────────────────────────────────────────────────────────────────────
// One-shot commands
// ─────────────────────────────────────────────────────────────────────────────

/// Load settings and content, then build the shared handler state.
fn load_state(site: SiteDir) -> Result<AppState> {
    StartProcess::<CommandIssued>::parse_settings_file(site)?
        .load_content()?
        .build_links()
        .map(|p| p.state.app)
}

impl RequestArgs {
    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let host = self.host.as_deref().unwrap_or("localhost");
        headers.insert(header::HOST, header_value(host)?);
        Ok(headers)
    }

    fn query(&self) -> Option<String> {
        self.mode.as_deref().map(|m| format!("{}={m}", router::MODE_QUERY_KEY))
    }

    fn context(&self, state: &AppState) -> Result<domain::context::RequestContext> {
        let mut headers = self.headers()?;
        if let Some(lang) = self.lang_cookie.as_deref() {
            let by_host = state.request_context(&headers, None);
            if let Some(site) = by_host.site_name() {
                let cookie = format!(
                    "{}={lang}",
                    domain::context::RequestContext::language_cookie_key(site)
                );
                headers.insert(header::COOKIE, header_value(&cookie)?);
            }
        }
        Ok(state.request_context(&headers, self.query().as_deref()))
    }
}

fn header_value(s: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(s).map_err(|_| Error::Config(format!("invalid header value `{s}`")))
}

#[tracing::instrument(skip_all)]
pub fn run_url(cmd: UrlCmd) -> Result<String> {
    let state = load_state(cmd.site)?;
    let manager = state.manager();
    let ctx = cmd.request.context(&state)?;

    let id: ItemId = cmd
        .id
        .parse()
        .map_err(|_| Error::Config(format!("invalid item id `{}`", cmd.id)))?;
    let language = cmd.lang.unwrap_or_else(|| ctx.language.clone());
    let database = ctx.site.as_ref().map_or("web", |s| s.database.as_str());
    let node = manager
        .repository()
        .get_node_by_id(&id, &language, database)
        .ok_or_else(|| Error::NotFound(cmd.id.clone()))?;

    let mut options = manager.default_options();
    if let Some(name) = cmd.target_site.as_deref() {
        let site = manager
            .registry()
            .site_by_name(name)
            .ok_or_else(|| Error::UnknownSite(name.to_owned()))?;
        options = options.with_site(site.clone());
    }
    Ok(manager.build_url(&node, &options, &ctx)?)
}

#[tracing::instrument(skip_all)]
pub fn run_resolve(cmd: ResolveCmd) -> Result<String> {
    let state = load_state(cmd.site)?;
    let manager = state.manager();
    let ctx = cmd.request.context(&state)?;

    let (path, query) = match cmd.path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (cmd.path.as_str(), None),
    };
    let request = manager.parse_request(path, query, &ctx);
    debug!(item_path = %request.item_path, "resolving");

    let out = match manager.handle_request(&request, &ctx)? {
        RequestOutcome::Found(node) => serde_json::json!({
            "outcome": "found",
            "id": node.id.to_string(),
            "path": node.path,
            "language": node.language,
        }),
        RequestOutcome::Redirect(target) => serde_json::json!({
            "outcome": "redirect",
            "site": target.site,
            "location": target.location,
        }),
        RequestOutcome::NotFound => serde_json::json!({
            "outcome": "not-found",
            "item_path": request.item_path,
        }),
    };
    Ok(serde_json::to_string_pretty(&out)?)
}

#[tracing::instrument(skip_all)]
pub fn run_rewrite(cmd: RewriteCmd) -> Result<String> {
    let state = load_state(cmd.site)?;
    let ctx = cmd.request.context(&state)?;

    let text = match cmd.file.as_ref() {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    Ok(state.manager().rewrite_links(&text, &ctx))
}

// ─────────────────────────────────────────────────────────────────────────────
// Start process state machine
// ─────────────────────────────────────────────────────────────────────────────

trait ProcessState {}

struct CommandIssued;

struct SettingsLoaded {
    dir: PathBuf,
    settings: Settings,
}

struct ContentLoaded {
    settings: Settings,
    repo: serve::repo::InMemoryRepository,
}

struct LinksReady {
    settings: Settings,
    app: AppState,
}

impl ProcessState for CommandIssued {}
impl ProcessState for SettingsLoaded {}
impl ProcessState for ContentLoaded {}
impl ProcessState for LinksReady {}

struct StartProcess<S: ProcessState> {
    state: S,
}

impl StartProcess<CommandIssued> {
    /// Load settings from `<dir>/settings.toml`.
    ///
    /// `dir` is the directory that contains `settings.toml`.
    #[tracing::instrument(skip_all)]
    fn parse_settings_file(site: SiteDir) -> Result<StartProcess<SettingsLoaded>> {
        let dir = site.dir;
        if !dir.exists() {
            return Err(Error::Config(format!(
                "Settings directory does not exist: {}",
                dir.display()
            )));
        }

        let path = dir.join("settings.toml");
        if !path.exists() {
            return Err(Error::Config(format!(
                "settings.toml not found at {}",
                path.display()
            )));
        }

        let text = std::fs::read_to_string(&path).map_err(|err| {
            Error::Config(format!("Failed reading {}: {}", path.display(), err))
        })?;

        let settings: Settings = toml::from_str(&text).map_err(|err| {
            Error::Config(format!(
                "Invalid settings.toml at {}: {}",
                path.display(),
                err
            ))
        })?;

        Ok(StartProcess {
            state: SettingsLoaded { dir, settings },
        })
    }
}

impl StartProcess<SettingsLoaded> {
    #[tracing::instrument(skip_all)]
    fn load_content(self) -> Result<StartProcess<ContentLoaded>> {
        let repo = load_repository(&self.state.dir)?;
        Ok(StartProcess {
            state: ContentLoaded {
                settings: self.state.settings,
                repo,
            },
        })
    }
}

impl StartProcess<ContentLoaded> {
    #[tracing::instrument(skip_all)]
    fn build_links(self) -> Result<StartProcess<LinksReady>> {
        let manager = LinkManager::from_settings(&self.state.settings, Arc::new(self.state.repo))?;
        let app = AppState::new(manager)?;
        Ok(StartProcess {
            state: LinksReady {
                settings: self.state.settings,
                app,
            },
        })
    }
}

impl StartProcess<LinksReady> {
    #[tracing::instrument(skip_all)]
    async fn start_server(self) -> Result<()> {
        let edge = &self.state.settings.edge;
        let addr = SocketAddr::new(edge.ip, edge.port);
        let app = router::build(self.state.app);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("sitelinks listening on http://{}", listener.local_addr()?);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        info!("sitelinks stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {}", e);
    }
}
