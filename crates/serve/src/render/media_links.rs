// crates/serve/src/render/media_links.rs

use crate::paths;
use domain::content::ItemId;
use tracing::trace;

/// Length of a short item id.
const SHORT_ID_LEN: usize = 32;

/// Earliest occurrence at or after `from` of any prefix, ignoring ASCII case.
///
/// Ties at the same offset go to the longest prefix, then to the one
/// declared first.
pub fn find_media_prefix<'p>(
    text: &str,
    from: usize,
    prefixes: &'p [String],
) -> Option<(usize, &'p str)> {
    let mut best: Option<(usize, &'p str)> = None;
    for prefix in prefixes {
        let Some(pos) = paths::find_ignore_ascii_case(text, prefix, from) else {
            continue;
        };
        best = match best {
            Some((b, p)) if b < pos || (b == pos && p.len() >= prefix.len()) => Some((b, p)),
            _ => Some((pos, prefix.as_str())),
        };
    }
    best
}

/// Replace `<prefix><SHORTID>[<extension_marker>]` spans with the URL returned
/// by `resolve(id, had_extension_marker)`.
///
/// Occurrences whose id is malformed or truncated, or for which `resolve`
/// returns `None`, are left in place and scanning resumes one byte after the
/// prefix start.
pub fn expand_media_links<F>(
    text: &str,
    prefixes: &[String],
    extension_marker: &str,
    mut resolve: F,
) -> String
where
    F: FnMut(&ItemId, bool) -> Option<String>,
{
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    let mut search = 0;

    while let Some((pos, prefix)) = find_media_prefix(text, search, prefixes) {
        let id_start = pos + prefix.len();
        let id_end = id_start + SHORT_ID_LEN;
        let id = text
            .get(id_start..id_end)
            .filter(|candidate| ItemId::is_short_id(candidate))
            .and_then(|candidate| candidate.parse::<ItemId>().ok());
        let Some(id) = id else {
            trace!(offset = pos, "skipping malformed media id");
            search = pos + 1;
            continue;
        };

        let with_extension = !extension_marker.is_empty()
            && text.as_bytes()[id_end..].starts_with(extension_marker.as_bytes());

        match resolve(&id, with_extension) {
            Some(url) => {
                out.push_str(&text[cursor..pos]);
                out.push_str(&url);
                cursor = id_end
                    + if with_extension {
                        extension_marker.len()
                    } else {
                        0
                    };
                search = cursor;
            }
            None => {
                trace!(id = %id, "skipping missing media item");
                search = pos + 1;
            }
        }
    }

    out.push_str(&text[cursor..]);
    out
}
