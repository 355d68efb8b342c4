//! Whole-playlist rewrite pass

use std::borrow::Cow;

use super::line::{classify, uri_attribute, ManifestLine};
use super::resolve::{proxy_url, resolve_reference};
use super::RewriteOptions;
use crate::error::Result;

/// Rewritten playlist plus what happened to its references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteReport {
    pub text: String,
    /// References routed through the proxy (or made absolute).
    pub rewritten: usize,
    /// Lines left as they were because a reference did not resolve.
    pub skipped: usize,
}

/// Rewrite every segment, sub-playlist and `URI="..."` reference in an HLS
/// playlist fetched from `source_url`.
///
/// Not idempotent: feeding the output back in wraps each reference in the
/// proxy a second time.
pub fn rewrite(text: &str, source_url: &str, options: &RewriteOptions) -> String {
    rewrite_with_report(text, source_url, options).text
}

/// [`rewrite`], also counting rewritten and skipped references.
pub fn rewrite_with_report(text: &str, source_url: &str, options: &RewriteOptions) -> RewriteReport {
    let mut report = RewriteReport {
        text: String::with_capacity(text.len() + text.len() / 2),
        ..Default::default()
    };

    // Splitting on '\n' and keeping any '\r' keeps every terminator, and
    // the presence or absence of a final one, exactly as received.
    for (i, raw) in text.split('\n').enumerate() {
        if i > 0 {
            report.text.push('\n');
        }
        let (line, cr) = match raw.strip_suffix('\r') {
            Some(line) => (line, "\r"),
            None => (raw, ""),
        };
        let rewritten = rewrite_line(line, source_url, options, &mut report);
        report.text.push_str(&rewritten);
        report.text.push_str(cr);
    }

    tracing::debug!(
        "Rewrote playlist {}: {} reference(s), {} skipped",
        source_url,
        report.rewritten,
        report.skipped
    );
    report
}

fn rewrite_line<'a>(
    line: &'a str,
    source_url: &str,
    options: &RewriteOptions,
    report: &mut RewriteReport,
) -> Cow<'a, str> {
    let result = match classify(line, options) {
        ManifestLine::Blank | ManifestLine::Tag(_) | ManifestLine::Other(_) => {
            return Cow::Borrowed(line)
        }
        ManifestLine::TagWithUri(tag) => rewrite_tag(tag, source_url, options),
        ManifestLine::MediaReference(reference) => resolve_reference(reference, source_url)
            .map(|absolute| (proxy_url(&absolute, options), 1)),
    };

    match result {
        Ok((rewritten, count)) => {
            report.rewritten += count;
            Cow::Owned(rewritten)
        }
        Err(e) => {
            tracing::warn!("Leaving playlist line unmodified ({}): {}", e, line);
            report.skipped += 1;
            Cow::Borrowed(line)
        }
    }
}

/// Replace the value of every `URI="..."` attribute, keeping the rest of the
/// tag byte for byte. Fails as a whole if any one URI does not resolve.
fn rewrite_tag(tag: &str, source_url: &str, options: &RewriteOptions) -> Result<(String, usize)> {
    let mut out = String::with_capacity(tag.len() + 64);
    let mut last = 0;
    let mut count = 0;

    for caps in uri_attribute().captures_iter(tag) {
        let Some(value) = caps.get(1) else {
            continue;
        };
        let absolute = resolve_reference(value.as_str(), source_url)?;
        out.push_str(&tag[last..value.start()]);
        out.push_str(&proxy_url(&absolute, options));
        last = value.end();
        count += 1;
    }
    out.push_str(&tag[last..]);

    Ok((out, count))
}
