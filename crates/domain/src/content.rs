// crates/domain/src/content.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Name of the administrative repository. Nodes stored there never belong
/// to a site.
pub const CORE_REPOSITORY: &str = "core";

// ─────────────────────────────────────────────────────────────────────────────
// Item identity
// ─────────────────────────────────────────────────────────────────────────────

/// Stable identifier of a content node.
///
/// Accepts the braced (`{XXXXXXXX-XXXX-...}`), hyphenated and 32-hex "short"
/// spellings on input. Displays in the braced uppercase form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemId(Uuid);

impl ItemId {
    pub fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// 32 uppercase hex digits, no braces or hyphens.
    pub fn to_short_id(&self) -> String {
        self.0.simple().to_string().to_ascii_uppercase()
    }

    /// True when `s` is exactly a 32 hex digit short id.
    pub fn is_short_id(s: &str) -> bool {
        s.len() == 32 && s.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let braced = self.0.braced().to_string().to_ascii_uppercase();
        f.write_str(&braced)
    }
}

impl FromStr for ItemId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::try_parse(s.trim()).map(Self)
    }
}

impl TryFrom<String> for ItemId {
    type Error = uuid::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ItemId> for String {
    fn from(id: ItemId) -> Self {
        id.to_string()
    }
}

impl From<Uuid> for ItemId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Content node
// ─────────────────────────────────────────────────────────────────────────────

/// One language version of an addressable content item.
///
/// Owned by the content repository; the link core only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentNode {
    pub id: ItemId,

    /// Full slash-delimited path by item name, e.g. `/sitecore/content/site/home/page`.
    pub path: String,

    /// Same path built from display names. Falls back to `path` when absent.
    #[serde(default)]
    pub display_path: Option<String>,

    pub template: String,
    pub language: String,

    /// Repository (database) the node was read from.
    pub database: String,

    /// False when this language version exists only as a fallback shell.
    #[serde(default = "default_true")]
    pub has_version: bool,

    /// File extension for media items (`jpg`, `pdf`, ...).
    #[serde(default)]
    pub extension: Option<String>,
}

fn default_true() -> bool {
    true
}

impl ContentNode {
    pub fn new(
        id: ItemId,
        path: impl Into<String>,
        template: impl Into<String>,
        language: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            id,
            path: path.into(),
            display_path: None,
            template: template.into(),
            language: language.into(),
            database: database.into(),
            has_version: true,
            extension: None,
        }
    }

    // ───────────────────────────────
    // Builder-style setters
    // ───────────────────────────────

    pub fn with_display_path(mut self, display_path: impl Into<String>) -> Self {
        self.display_path = Some(display_path.into());
        self
    }

    pub fn with_extension(mut self, ext: impl Into<String>) -> Self {
        self.extension = Some(ext.into());
        self
    }

    pub fn without_version(mut self) -> Self {
        self.has_version = false;
        self
    }

    /// Path in the requested segment style.
    pub fn path_by(&self, use_display_name: bool) -> &str {
        if use_display_name {
            self.display_path.as_deref().unwrap_or(&self.path)
        } else {
            &self.path
        }
    }

    /// Last segment of the item path.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }

    /// Path of the parent node, `None` at the tree root.
    pub fn parent_path(&self) -> Option<&str> {
        let trimmed = self.path.trim_end_matches('/');
        match trimmed.rfind('/') {
            Some(0) | None => None,
            Some(i) => Some(&trimmed[..i]),
        }
    }

    pub fn is_in_core_repository(&self) -> bool {
        self.database.eq_ignore_ascii_case(CORE_REPOSITORY)
    }
}
