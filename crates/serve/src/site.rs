// crates/serve/src/site.rs

//! Owning-site resolution for content nodes.

use crate::paths;
use crate::registry::SiteRegistry;
use crate::repo::ContentRepository;
use crate::{Error, Result};
use domain::content::ContentNode;
use domain::context::RequestContext;
use domain::site::SiteDescriptor;
use tracing::{debug, trace};

pub struct SiteResolver<'a> {
    registry: &'a SiteRegistry,
}

impl<'a> SiteResolver<'a> {
    pub fn new(registry: &'a SiteRegistry) -> Self {
        Self { registry }
    }

    /// Pick the one site that owns `node`.
    ///
    /// First match wins:
    /// 1. core repository → `None`
    /// 2. explicit `hint`
    /// 3. media library item → context site
    /// 4. under the context site root → context site
    /// 5. node language is the context language → context site
    /// 6. node language supported by the context site → context site
    /// 7. shared-content rule → site named by the folder after the rule's
    ///    site-folder prefix, else the context site
    ///
    /// Fails with [`Error::MissingSiteContext`] when neither a hint nor a
    /// context site is available.
    #[tracing::instrument(skip_all)]
    pub fn resolve_owning_site(
        &self,
        node: &ContentNode,
        hint: Option<&SiteDescriptor>,
        ctx: &RequestContext,
    ) -> Result<Option<SiteDescriptor>> {
        if node.is_in_core_repository() {
            trace!(path = %node.path, "core repository item has no site");
            return Ok(None);
        }

        if let Some(site) = hint {
            return Ok(Some(site.clone()));
        }

        let Some(context_site) = ctx.site.as_ref() else {
            return Err(Error::MissingSiteContext);
        };

        if paths::is_under(&node.path, &self.registry.media().library_root) {
            trace!(site = %context_site.name, "media library item");
            return Ok(Some(context_site.clone()));
        }

        if paths::is_under(&node.path, &context_site.root_path) {
            trace!(site = %context_site.name, "descendant of context site");
            return Ok(Some(context_site.clone()));
        }

        if node.language.eq_ignore_ascii_case(&ctx.language) {
            trace!(site = %context_site.name, "language matches context");
            return Ok(Some(context_site.clone()));
        }

        if context_site.supports_language(&node.language) {
            trace!(site = %context_site.name, "language supported by context site");
            return Ok(Some(context_site.clone()));
        }

        Ok(Some(self.infer_shared_site(node).unwrap_or(context_site).clone()))
    }

    /// Site named by the shared-content folder layout of `node`, if any.
    fn infer_shared_site(&self, node: &ContentNode) -> Option<&'a SiteDescriptor> {
        let rule = self.registry.shared_rule(&node.template)?;
        let folder = paths::first_folder(&node.path, rule.site_folder_root());
        if folder.is_empty() {
            return None;
        }
        let site = self.registry.site_by_name(&folder);
        debug!(
            template = %node.template,
            folder = %folder,
            found = site.is_some(),
            "inferred shared content site"
        );
        site
    }

    /// Scan sites in configured order for one whose home path contains
    /// `path`.
    ///
    /// A site whose language equals `language` wins immediately; otherwise
    /// the first prefix match is returned. With `language == None` the first
    /// prefix match is returned.
    #[tracing::instrument(skip_all)]
    pub fn find_matching_site(
        &self,
        path: &str,
        language: Option<&str>,
    ) -> Option<&'a SiteDescriptor> {
        let mut fallback = None;
        for site in self.registry.sites() {
            if !paths::is_under(path, &site.start_path()) {
                continue;
            }
            match language {
                Some(lang) if site.language.eq_ignore_ascii_case(lang) => return Some(site),
                None => return Some(site),
                _ => {
                    fallback.get_or_insert(site);
                }
            }
        }
        fallback
    }

    /// Page acting as the parent of `node` within the context site.
    ///
    /// Items under the context site use their real parent. Shared items use
    /// the `parent_page_query` path of the rule whose root contains them,
    /// with `$site` replaced by the context site name.
    #[tracing::instrument(skip_all)]
    pub fn context_parent_for_shared_item(
        &self,
        node: &ContentNode,
        ctx: &RequestContext,
        repo: &dyn ContentRepository,
    ) -> Option<ContentNode> {
        let site = ctx.site.as_ref()?;

        if paths::is_under(&node.path, &site.root_path) {
            let parent = node.parent_path()?;
            return repo.resolve_by_path(parent, &node.database);
        }

        let rule = self.registry.rule_for_path(&node.path)?;
        let query = rule.parent_page_query.as_deref()?;
        let parent_path = query.replace("$site", &site.name);
        debug!(path = %parent_path, "shared item parent query");
        repo.resolve_by_path(&parent_path, &node.database)
    }
}
