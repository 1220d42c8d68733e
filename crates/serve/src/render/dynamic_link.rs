// crates/serve/src/render/dynamic_link.rs

use domain::content::ItemId;
use std::fmt;

/// Opens a dynamic link inside stored text.
pub const LINK_MARKER: &str = "~/link.aspx?";

/// Closes a dynamic link.
pub const LINK_TERMINATOR: &str = "_z=z";

/// `{item, site?, language?}` reference decoded from a dynamic link.
///
/// Parsing accepts `_id`/`id`, `_lang`/`lang` and `_site`/`site` keys, with
/// `&` or `&amp;` separators. Formatting always writes the underscored keys
/// and the short id form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicLinkToken {
    pub item_id: ItemId,
    pub site: Option<String>,
    pub language: Option<String>,
}

impl DynamicLinkToken {
    pub fn new(item_id: ItemId) -> Self {
        Self {
            item_id,
            site: None,
            language: None,
        }
    }

    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = Some(site.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Decode the query part of a dynamic link (the text between
    /// [`LINK_MARKER`] and [`LINK_TERMINATOR`]). `None` when no valid id is
    /// present.
    pub fn parse(query: &str) -> Option<Self> {
        let query = query.replace("&amp;", "&");

        let mut id = None;
        let mut site = None;
        let mut language = None;
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.trim_start_matches('_').to_ascii_lowercase().as_str() {
                "id" => id = Some(value.to_owned()),
                "site" => site = Some(value.to_owned()),
                "lang" => language = Some(value.to_owned()),
                _ => {}
            }
        }

        let item_id = id?.parse::<ItemId>().ok()?;
        Some(Self {
            item_id,
            site,
            language,
        })
    }

    /// `_id=...&_lang=...&_site=...&_z=z`
    pub fn to_query(&self) -> String {
        let mut q = form_urlencoded::Serializer::new(String::new());
        q.append_pair("_id", &self.item_id.to_short_id());
        if let Some(lang) = self.language.as_deref() {
            q.append_pair("_lang", lang);
        }
        if let Some(site) = self.site.as_deref() {
            q.append_pair("_site", site);
        }
        let mut out = q.finish();
        out.push('&');
        out.push_str(LINK_TERMINATOR);
        out
    }
}

/// `~/link.aspx?_id=...&_z=z`
impl fmt::Display for DynamicLinkToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{LINK_MARKER}{}", self.to_query())
    }
}
