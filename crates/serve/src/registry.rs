// crates/serve/src/registry.rs

//! Process-wide site and shared-content tables.
//!
//! Built once from [`Settings`] during startup and only read afterwards, so a
//! single `Arc<SiteRegistry>` can be shared by every request without locking.

use crate::paths;
use domain::setting::{MediaSettings, Settings};
use domain::site::{SharedContentRule, SiteDescriptor};
use domain::validate::site::{validate_content_path, validate_rule, validate_site};
use domain::ConfigError;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct SiteRegistry {
    /// Configured order; every scan walks this order.
    sites: Vec<SiteDescriptor>,

    /// Rules in declared order.
    rules: Vec<SharedContentRule>,

    /// Lowercased template name → index into `rules`.
    by_template: HashMap<String, usize>,

    /// Lowercased site and supported languages of every site.
    languages: HashSet<String>,

    media: MediaSettings,
    media_site: Option<usize>,
    default_site: Option<usize>,
}

impl SiteRegistry {
    /// Registry with default media settings and no default site.
    pub fn new(
        sites: Vec<SiteDescriptor>,
        rules: Vec<SharedContentRule>,
    ) -> Result<Self, ConfigError> {
        Self::build(sites, rules, MediaSettings::default(), None)
    }

    #[tracing::instrument(skip_all)]
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        Self::build(
            settings.sites.clone(),
            settings.shared_content.clone(),
            settings.media.clone(),
            settings.links.default_site.as_deref(),
        )
    }

    fn build(
        sites: Vec<SiteDescriptor>,
        rules: Vec<SharedContentRule>,
        media: MediaSettings,
        default_site: Option<&str>,
    ) -> Result<Self, ConfigError> {
        // ─────────────────────────────
        // Sites
        // ─────────────────────────────
        let mut seen = HashSet::new();
        for (index, site) in sites.iter().enumerate() {
            validate_site(index, site)?;
            if !seen.insert(site.name.to_ascii_lowercase()) {
                return Err(ConfigError::DuplicateSite(site.name.clone()));
            }
        }

        // ─────────────────────────────
        // Shared content rules
        // ─────────────────────────────
        let mut by_template = HashMap::new();
        for (i, rule) in rules.iter().enumerate() {
            validate_rule(rule)?;
            if by_template
                .insert(rule.template.to_ascii_lowercase(), i)
                .is_some()
            {
                return Err(ConfigError::DuplicateRule(rule.template.clone()));
            }
        }

        // ─────────────────────────────
        // Media
        // ─────────────────────────────
        if media.prefixes.iter().any(|p| p.is_empty()) {
            return Err(ConfigError::InvalidMedia("empty media prefix".into()));
        }
        validate_content_path(&media.library_root).map_err(ConfigError::InvalidMedia)?;

        let media_site = Self::locate_media_site(&sites, &media)?;

        let default_site = match default_site {
            Some(name) => Some(
                sites
                    .iter()
                    .position(|s| s.is_named(name))
                    .ok_or_else(|| ConfigError::InvalidValue {
                        field: "default_site",
                        value: name.to_owned(),
                    })?,
            ),
            None => None,
        };

        let languages = sites
            .iter()
            .flat_map(|s| std::iter::once(&s.language).chain(s.supported_languages.iter()))
            .map(|l| l.to_ascii_lowercase())
            .collect();

        debug!(
            sites = sites.len(),
            rules = rules.len(),
            "site registry loaded"
        );

        Ok(Self {
            sites,
            rules,
            by_template,
            languages,
            media,
            media_site,
            default_site,
        })
    }

    /// The named media site, or the single site rooted in the media library.
    fn locate_media_site(
        sites: &[SiteDescriptor],
        media: &MediaSettings,
    ) -> Result<Option<usize>, ConfigError> {
        if let Some(name) = media.site.as_deref() {
            return match sites.iter().position(|s| s.is_named(name)) {
                Some(i) => Ok(Some(i)),
                None => Err(ConfigError::InvalidMedia(format!(
                    "media site `{name}` is not a configured site"
                ))),
            };
        }

        let mut found: Option<usize> = None;
        for (i, site) in sites.iter().enumerate() {
            if !paths::is_under(&site.root_path, &media.library_root) {
                continue;
            }
            if let Some(first) = found {
                return Err(ConfigError::MultipleMediaSites {
                    first: sites[first].name.clone(),
                    second: site.name.clone(),
                });
            }
            found = Some(i);
        }
        if found.is_none() {
            warn!("no media site configured; media links use the context site host");
        }
        Ok(found)
    }

    // ─────────────────────────────
    // Queries
    // ─────────────────────────────

    pub fn sites(&self) -> &[SiteDescriptor] {
        &self.sites
    }

    pub fn site_by_name(&self, name: &str) -> Option<&SiteDescriptor> {
        self.sites.iter().find(|s| s.is_named(name))
    }

    pub fn shared_rule(&self, template: &str) -> Option<&SharedContentRule> {
        self.by_template
            .get(&template.to_ascii_lowercase())
            .map(|&i| &self.rules[i])
    }

    /// First rule, in declared order, whose flag folder is `folder`.
    pub fn rule_by_folder(&self, folder: &str) -> Option<&SharedContentRule> {
        self.rules
            .iter()
            .find(|r| r.folder.eq_ignore_ascii_case(folder))
    }

    /// First rule whose root contains `path`.
    pub fn rule_for_path(&self, path: &str) -> Option<&SharedContentRule> {
        self.rules.iter().find(|r| paths::is_under(path, &r.root_path))
    }

    pub fn rules(&self) -> &[SharedContentRule] {
        &self.rules
    }

    /// Language served by at least one site.
    pub fn is_known_language(&self, language: &str) -> bool {
        self.languages.contains(&language.to_ascii_lowercase())
    }

    pub fn media(&self) -> &MediaSettings {
        &self.media
    }

    pub fn media_site(&self) -> Option<&SiteDescriptor> {
        self.media_site.map(|i| &self.sites[i])
    }

    /// Site used when rendering outside a request.
    pub fn default_site(&self) -> Option<&SiteDescriptor> {
        self.default_site.map(|i| &self.sites[i])
    }
}
