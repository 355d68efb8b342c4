use super::RewriteOptions;

// helper.
macro_rules! regex {
    ($re:literal $(,)?) => {{
        static RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
        RE.get_or_init(|| regex::Regex::new($re).expect("valid regex literal"))
    }};
}

/// `URI="..."` inside a tag's attribute list. Group 1 is the quoted value.
pub(crate) fn uri_attribute() -> &'static regex::Regex {
    regex!(r#"[:,]\s*URI="([^"]*)""#)
}

/// Values of every `URI="..."` attribute in a tag line, in order.
pub fn uri_references(tag: &str) -> Vec<&str> {
    uri_attribute()
        .captures_iter(tag)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

/// One line of a playlist, by what the rewriter does with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestLine<'a> {
    Blank,
    /// `#EXTM3U`, `#EXTINF:...`, comments. Passed through.
    Tag(&'a str),
    /// A tag with at least one `URI="..."` attribute (renditions, keys, maps).
    TagWithUri(&'a str),
    /// Segment or sub-playlist reference, whitespace trimmed.
    MediaReference(&'a str),
    /// Anything else. Passed through untouched.
    Other(&'a str),
}

/// Classify a single line (without its terminator).
pub fn classify<'a>(line: &'a str, options: &RewriteOptions) -> ManifestLine<'a> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        ManifestLine::Blank
    } else if trimmed.starts_with('#') {
        if uri_attribute().is_match(trimmed) {
            ManifestLine::TagWithUri(line)
        } else {
            ManifestLine::Tag(line)
        }
    } else if is_media_reference(trimmed, &options.media_extensions) {
        ManifestLine::MediaReference(trimmed)
    } else {
        ManifestLine::Other(line)
    }
}

/// A line is a media reference if it ends in one of `extensions`, either
/// as a whole or once the query string and fragment are stripped.
fn is_media_reference(line: &str, extensions: &[String]) -> bool {
    let lower = line.to_ascii_lowercase();
    let path = lower.split(['?', '#']).next().unwrap_or_default();
    extensions.iter().any(|ext| {
        let suffix = format!(".{}", ext.to_ascii_lowercase());
        lower.ends_with(&suffix) || path.ends_with(&suffix)
    })
}
