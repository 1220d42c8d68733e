use super::ContentRepository;
use domain::content::{ContentNode, ItemId};

// ─────────────────────────────────────────────────────────────────────────────
// In-memory ContentRepository implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Flat list of node versions.
///
/// Reference implementation used by the edge content manifest and by tests.
/// Every entry is one language version; versions of the same item share an id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    pub nodes: Vec<ContentNode>,
}

impl InMemoryRepository {
    pub fn new(nodes: Vec<ContentNode>) -> Self {
        Self { nodes }
    }

    pub fn insert(&mut self, node: ContentNode) {
        self.nodes.push(node);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn in_database<'a>(&'a self, database: &'a str) -> impl Iterator<Item = &'a ContentNode> + 'a {
        self.nodes
            .iter()
            .filter(move |n| n.database.eq_ignore_ascii_case(database))
    }
}

/// Segment-wise, case-insensitive path match where `*` matches one segment.
///
/// Each segment may match either the item name or, when the node carries a
/// display path of the same depth, the display name at that depth.
fn path_matches(pattern: &str, node: &ContentNode) -> bool {
    let pattern: Vec<&str> = pattern.trim_end_matches('/').split('/').collect();
    let names: Vec<&str> = node.path.trim_end_matches('/').split('/').collect();
    let display: Option<Vec<&str>> = node
        .display_path
        .as_deref()
        .map(|d| d.trim_end_matches('/').split('/').collect())
        .filter(|d: &Vec<&str>| d.len() == names.len());

    pattern.len() == names.len()
        && pattern.iter().enumerate().all(|(i, p)| {
            *p == "*"
                || p.eq_ignore_ascii_case(names[i])
                || display.as_ref().is_some_and(|d| p.eq_ignore_ascii_case(d[i]))
        })
}

impl ContentRepository for InMemoryRepository {
    fn get_node_by_id(&self, id: &ItemId, language: &str, database: &str) -> Option<ContentNode> {
        self.in_database(database)
            .find(|n| n.id == *id && n.language.eq_ignore_ascii_case(language))
            .cloned()
    }

    /// `path` is a content path, already decoded at the URL boundary.
    fn resolve_by_path(&self, path: &str, database: &str) -> Option<ContentNode> {
        self.in_database(database)
            .find(|n| path_matches(path, n))
            .cloned()
    }

    /// The exact language version when present, else an empty shell of the
    /// first known version relabelled with `language`.
    fn best_fit_language_version(
        &self,
        node: &ContentNode,
        language: &str,
    ) -> Option<ContentNode> {
        let versions: Vec<&ContentNode> = self
            .in_database(&node.database)
            .filter(|n| n.id == node.id)
            .collect();

        if let Some(exact) = versions
            .iter()
            .find(|n| n.language.eq_ignore_ascii_case(language))
        {
            return Some((*exact).clone());
        }

        let mut shell = versions.first().map(|n| (*n).clone())?;
        shell.language = language.to_owned();
        shell.has_version = false;
        Some(shell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn node(n: u128, path: &str, lang: &str) -> ContentNode {
        ContentNode::new(ItemId::new(Uuid::from_u128(n)), path, "Page", lang, "web")
    }

    #[test]
    fn len_and_is_empty_reflect_nodes() {
        let empty = InMemoryRepository::default();
        assert!(empty.is_empty());

        let repo = InMemoryRepository::new(vec![node(1, "/a", "en")]);
        assert_eq!(repo.len(), 1);
        assert!(!repo.is_empty());
    }

    #[test]
    fn wildcard_matches_exactly_one_segment() {
        let matches = |pattern: &str, path: &str| path_matches(pattern, &node(1, path, "en"));
        assert!(matches("/c/*/widget", "/c/site-a/widget"));
        assert!(matches("/C/Site-A/Widget", "/c/site-a/widget"));
        assert!(!matches("/c/*/widget", "/c/widget"));
        assert!(!matches("/c/*/widget", "/c/a/b/widget"));
        assert!(matches("/c/a/", "/c/a"));
    }

    #[test]
    fn segments_match_name_or_display_name() {
        let about = node(1, "/c/site/home/about", "en").with_display_path("/c/site/home/About Us");
        assert!(path_matches("/c/site/home/about us", &about));
        assert!(path_matches("/c/site/home/ABOUT", &about));
        assert!(!path_matches("/c/site/home/About%20Us", &about));

        let shallow = node(2, "/c/site/home/team", "en").with_display_path("/Team");
        assert!(!path_matches("/Team", &shallow));
    }

    #[test]
    fn paths_are_taken_verbatim() {
        let repo = InMemoryRepository::new(vec![node(1, "/c/x%41", "en")]);
        assert!(repo.resolve_by_path("/c/x%41", "web").is_some());
        assert!(repo.resolve_by_path("/c/xA", "web").is_none());
    }

    #[test]
    fn resolve_by_path_respects_database() {
        let mut master = node(1, "/c/a", "en");
        master.database = "master".into();
        let repo = InMemoryRepository::new(vec![master, node(2, "/c/a", "en")]);

        let found = repo.resolve_by_path("/c/a", "web").unwrap();
        assert_eq!(found.id, ItemId::new(Uuid::from_u128(2)));
        assert!(repo.resolve_by_path("/c/a", "core").is_none());
    }

    #[test]
    fn lookup_by_id_is_language_specific() {
        let repo = InMemoryRepository::new(vec![node(1, "/c/a", "en"), node(1, "/c/a", "fr")]);
        let id = ItemId::new(Uuid::from_u128(1));

        assert_eq!(repo.get_node_by_id(&id, "fr", "web").unwrap().language, "fr");
        assert!(repo.get_node_by_id(&id, "de", "web").is_none());
    }

    #[test]
    fn best_fit_returns_shell_without_version() {
        let repo = InMemoryRepository::new(vec![node(1, "/c/a", "en")]);
        let en = repo.resolve_by_path("/c/a", "web").unwrap();

        let same = repo.best_fit_language_version(&en, "EN").unwrap();
        assert!(repo.has_language_version(&same));

        let shell = repo.best_fit_language_version(&en, "de").unwrap();
        assert_eq!(shell.language, "de");
        assert!(!repo.has_language_version(&shell));
    }
}
