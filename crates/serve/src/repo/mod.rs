// crates/serve/src/repo/mod.rs

//! Port to the content repository.
//!
//! The link core never owns content. Storage, versioning and language
//! fallback live behind `ContentRepository`; the edge injects a concrete
//! implementation at startup.

pub mod memory;

use domain::content::{ContentNode, ItemId};

pub use memory::InMemoryRepository;

#[cfg_attr(test, mockall::automock)]
pub trait ContentRepository: Send + Sync {
    /// Node `id` in `language`, read from `database`.
    fn get_node_by_id(&self, id: &ItemId, language: &str, database: &str) -> Option<ContentNode>;

    /// Node at `path` in `database`. One segment may be `*`, matching any
    /// single segment.
    fn resolve_by_path(&self, path: &str, database: &str) -> Option<ContentNode>;

    /// Version of `node` best suited to `language`.
    fn best_fit_language_version(&self, node: &ContentNode, language: &str)
        -> Option<ContentNode>;

    /// False when the version carries no content of its own.
    fn has_language_version(&self, node: &ContentNode) -> bool {
        node.has_version
    }
}
