use regex::Regex;
use std::sync::OnceLock;

/// Matches arXiv abstract and PDF URLs on the canonical, `www.` and `export.` hosts.
///
/// Capture 1 is the numeric id (digits with interior dots), capture 2 the
/// optional version marker.
fn arxiv_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^https?://(?:www\.|export\.)?arxiv\.org/(?:abs|pdf)/([0-9]+(?:\.[0-9]+)*)(v[0-9]+)?(?:\.pdf)?$",
        )
        .expect("arXiv URL pattern is a valid regex")
    })
}

/// Extracts the bare arXiv identifier from an abstract or PDF URL.
///
/// Returns `None` for anything that is not exactly an arXiv URL; callers then
/// treat the whole input as free text. When `keep_version` is false the `vN`
/// suffix is dropped.
///
/// # Examples
///
/// ```
/// use arxiv_getter::feed::extract_arxiv_id;
///
/// let url = "https://arxiv.org/abs/2005.11401v4";
/// assert_eq!(extract_arxiv_id(url, true).as_deref(), Some("2005.11401v4"));
/// assert_eq!(extract_arxiv_id(url, false).as_deref(), Some("2005.11401"));
/// assert_eq!(extract_arxiv_id("quantum gravity", true), None);
/// ```
pub fn extract_arxiv_id(text: &str, keep_version: bool) -> Option<String> {
    let captures = arxiv_url_pattern().captures(text)?;
    let id = captures.get(1)?.as_str();

    match captures.get(2) {
        Some(version) if keep_version => Some(format!("{}{}", id, version.as_str())),
        _ => Some(id.to_string()),
    }
}
