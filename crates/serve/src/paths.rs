//! Slash-path helpers shared by the URL builder, the request resolver and
//! the link rewriter.
//!
//! All prefix comparisons are ASCII case-insensitive: content paths are
//! matched the way the repository matches them.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use std::borrow::Cow;

/// Characters escaped inside one URL path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Join two path parts with exactly one `/` between them.
///
/// - `join("/a/", "/b")` → `/a/b`
/// - `join("", "b")`     → `b`
/// - `join("/", "")`     → `/`
pub fn join(left: &str, right: &str) -> String {
    if left.is_empty() {
        return right.to_owned();
    }
    if right.is_empty() {
        return left.to_owned();
    }
    format!(
        "{}/{}",
        left.trim_end_matches('/'),
        right.trim_start_matches('/')
    )
}

pub fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len()
        && s.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// Strip `prefix` when `s` starts with it, ignoring ASCII case.
pub fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if starts_with_ignore_case(s, prefix) {
        s.get(prefix.len()..)
    } else {
        None
    }
}

/// True when `path` is `ancestor` itself or lies below it.
pub fn is_under(path: &str, ancestor: &str) -> bool {
    let ancestor = ancestor.trim_end_matches('/');
    match strip_prefix_ignore_case(path, ancestor) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Byte offset of the first ASCII case-insensitive occurrence of `needle`
/// in `haystack` at or after `from`.
pub fn find_ignore_ascii_case(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let hay = haystack.as_bytes();
    let pat = needle.as_bytes();
    if pat.is_empty() || from > hay.len() || hay.len() - from < pat.len() {
        return None;
    }
    (from..=hay.len() - pat.len()).find(|&i| hay[i..i + pat.len()].eq_ignore_ascii_case(pat))
}

pub fn decode(path: &str) -> Cow<'_, str> {
    percent_decode_str(path).decode_utf8_lossy()
}

/// Percent-encode every segment of `path`, keeping the separators.
pub fn encode_segments(path: &str) -> String {
    path.split('/')
        .map(|seg| utf8_percent_encode(seg, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// First path segment of `path` once `start_path` is removed from its front.
///
/// `path` is a content path; it is lowercased, never decoded.
///
/// - `first_folder("/home/products/widget", "/home")` → `products`
/// - `first_folder("/products", "")`                  → `products`
pub fn first_folder(path: &str, start_path: &str) -> String {
    let lowered = path.to_lowercase();
    let rest = strip_prefix_ignore_case(&lowered, start_path).unwrap_or(&lowered);
    let rest = rest.strip_prefix('/').unwrap_or(rest);
    match rest.find('/') {
        Some(i) if i > 0 => rest[..i].to_owned(),
        _ => rest.to_owned(),
    }
}

/// Path of a shared-content item relative to its rule root.
///
/// Removes `root` and, for rules grouped by site folder, the site segment
/// that follows it. The result has no leading slash.
///
/// - `("/shared/products/widget", "/shared/products", false)`   → `widget`
/// - `("/shared/news/site-a/2024/x", "/shared/news", true)`     → `2024/x`
pub fn shared_relative_path(full_path: &str, root: &str, by_site_folder: bool) -> String {
    let rest = strip_prefix_ignore_case(full_path, root.trim_end_matches('/')).unwrap_or(full_path);
    let rest = rest.trim_start_matches('/');
    if !by_site_folder {
        return rest.to_owned();
    }
    match rest.find('/') {
        Some(i) => rest[i + 1..].to_owned(),
        None => String::new(),
    }
}
