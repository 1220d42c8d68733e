use crate::site::{SharedContentRule, SiteDescriptor, HOST_WILDCARDS};
use crate::ConfigError;
use url::Host;

/// Content paths must be rooted and slash-delimited, without a trailing slash.
#[tracing::instrument(skip_all)]
pub fn validate_content_path(path: &str) -> Result<(), String> {
    if !path.starts_with('/') {
        return Err(format!("path `{path}` must start with `/`"));
    }
    if path.len() > 1 && path.ends_with('/') {
        return Err(format!("path `{path}` must not end with `/`"));
    }
    if path.contains("//") {
        return Err(format!("path `{path}` contains an empty segment"));
    }
    Ok(())
}

/// Host patterns (`*`, `|`) are accepted; plain hosts must parse as a
/// domain or IP.
#[tracing::instrument(skip_all)]
pub fn validate_host_name(host: &str) -> Result<(), String> {
    if host.is_empty() || host.contains(HOST_WILDCARDS) {
        return Ok(());
    }
    let bare = host.split(':').next().unwrap_or(host);
    Host::parse(bare).map_err(|e| format!("host `{host}`: {e}"))?;
    Ok(())
}

#[tracing::instrument(skip_all)]
pub fn validate_site_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("site name empty".into());
    }
    if name.contains('/') {
        return Err(format!("site name `{name}` must not contain `/`"));
    }
    if name.len() > 120 {
        return Err("site name too long".into());
    }
    Ok(())
}

#[tracing::instrument(skip_all)]
pub fn validate_site(index: usize, site: &SiteDescriptor) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidSite { index, reason };

    validate_site_name(&site.name).map_err(invalid)?;
    validate_content_path(&site.root_path).map_err(invalid)?;
    if !site.start_item.is_empty() && !site.start_item.starts_with('/') {
        return Err(invalid(format!(
            "start item `{}` must start with `/`",
            site.start_item
        )));
    }
    validate_host_name(&site.host_name).map_err(invalid)?;
    if let Some(target) = site.target_host_name.as_deref() {
        validate_host_name(target).map_err(invalid)?;
    }
    if let Some(scheme) = site.scheme.as_deref() {
        match scheme.to_ascii_lowercase().as_str() {
            "" | "http" | "https" => {}
            other => return Err(invalid(format!("unsupported scheme: {other}"))),
        }
    }
    if site.language.trim().is_empty() {
        return Err(invalid("language empty".into()));
    }
    Ok(())
}

#[tracing::instrument(skip_all)]
pub fn validate_rule(rule: &SharedContentRule) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidRule {
        template: rule.template.clone(),
        reason,
    };

    if rule.template.trim().is_empty() {
        return Err(invalid("template name empty".into()));
    }
    validate_content_path(&rule.root_path).map_err(invalid)?;
    let folder = rule.folder.trim();
    if folder.is_empty() || folder.contains('/') {
        return Err(invalid(format!(
            "folder `{}` must be a single non-empty segment",
            rule.folder
        )));
    }
    if let Some(p) = rule.path_to_site_folder.as_deref() {
        validate_content_path(p).map_err(invalid)?;
    }
    Ok(())
}
