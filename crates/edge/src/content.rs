// crates/edge/src/content.rs

//! `content.toml` manifest backing the in-memory content repository.

use crate::Error;
use domain::content::{ContentNode, ItemId};
use serde::Deserialize;
use serve::repo::InMemoryRepository;
use std::path::Path;
use tracing::{debug, warn};

pub const MANIFEST_FILE: &str = "content.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContentManifest {
    pub nodes: Vec<NodeEntry>,
}

/// One language version of one item.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeEntry {
    pub id: ItemId,
    pub path: String,
    #[serde(default)]
    pub display_path: Option<String>,
    pub template: String,
    pub language: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_true")]
    pub has_version: bool,
    #[serde(default)]
    pub extension: Option<String>,
}

fn default_database() -> String {
    "web".to_owned()
}

fn default_true() -> bool {
    true
}

impl From<NodeEntry> for ContentNode {
    fn from(e: NodeEntry) -> Self {
        let mut node = ContentNode::new(e.id, e.path, e.template, e.language, e.database);
        node.display_path = e.display_path;
        node.has_version = e.has_version;
        node.extension = e.extension;
        node
    }
}

impl ContentManifest {
    pub fn parse(text: &str, path: &Path) -> Result<Self, Error> {
        toml::from_str(text).map_err(|source| Error::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn into_repository(self) -> InMemoryRepository {
        InMemoryRepository::new(self.nodes.into_iter().map(ContentNode::from).collect())
    }
}

/// Load `<dir>/content.toml`; a missing manifest yields an empty repository.
#[tracing::instrument(skip_all)]
pub fn load_repository(dir: &Path) -> Result<InMemoryRepository, Error> {
    let path = dir.join(MANIFEST_FILE);
    if !path.exists() {
        warn!("{} not found; serving an empty repository", path.display());
        return Ok(InMemoryRepository::default());
    }

    let text = std::fs::read_to_string(&path)?;
    let repo = ContentManifest::parse(&text, &path)?.into_repository();
    debug!("Loaded {} content nodes from {}", repo.len(), path.display());
    Ok(repo)
}
