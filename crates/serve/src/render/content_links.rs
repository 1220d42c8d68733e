// crates/serve/src/render/content_links.rs

use super::dynamic_link::{DynamicLinkToken, LINK_MARKER, LINK_TERMINATOR};
use tracing::trace;

/// Rendered in place of a link whose target cannot be resolved.
pub const DEAD_LINK: &str = "#";

/// Replace every `~/link.aspx?...&_z=z` span in `text` with the URL returned
/// by `resolve`, or [`DEAD_LINK`] when the token is malformed or `resolve`
/// returns `None`.
///
/// One left-to-right pass; substituted URLs are never rescanned. A marker
/// without a terminator is kept verbatim together with the rest of the text.
pub fn expand_content_links<F>(text: &str, mut resolve: F) -> String
where
    F: FnMut(&DynamicLinkToken) -> Option<String>,
{
    let Some(first) = text.find(LINK_MARKER) else {
        return text.to_owned();
    };

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    let mut next = Some(first);

    while let Some(start) = next {
        let query_start = start + LINK_MARKER.len();
        let Some(end) = text[query_start..].find(LINK_TERMINATOR).map(|i| query_start + i) else {
            trace!(offset = start, "unterminated dynamic link");
            break;
        };

        let url = DynamicLinkToken::parse(&text[query_start..end])
            .and_then(|token| resolve(&token))
            .unwrap_or_else(|| DEAD_LINK.to_owned());

        out.push_str(&text[cursor..start]);
        out.push_str(&url);
        cursor = end + LINK_TERMINATOR.len();
        next = text[cursor..].find(LINK_MARKER).map(|i| cursor + i);
    }

    out.push_str(&text[cursor..]);
    out
}
