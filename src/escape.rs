//! Entity escaping for values inside tool call envelopes.
//!
//! Encoding is strict: all five XML metacharacters are always replaced.
//! Decoding is permissive: only the five named entities are recognized and
//! everything else, including numeric references and a bare `&`, is kept
//! verbatim. Model output is untrusted and must never make decoding fail.

use std::borrow::Cow;

const ENTITIES: [(&str, char); 5] = [
    ("&amp;", '&'),
    ("&lt;", '<'),
    ("&gt;", '>'),
    ("&quot;", '"'),
    ("&apos;", '\''),
];

fn entity_for(ch: char) -> Option<&'static str> {
    match ch {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '"' => Some("&quot;"),
        '\'' => Some("&apos;"),
        _ => None,
    }
}

/// Escape the five XML metacharacters in a single pass over `raw`.
pub fn escape(raw: &str) -> Cow<'_, str> {
    let Some(first) = raw.find(['&', '<', '>', '"', '\'']) else {
        return Cow::Borrowed(raw);
    };

    let mut escaped = String::with_capacity(raw.len() + 16);
    escaped.push_str(&raw[..first]);
    for ch in raw[first..].chars() {
        match entity_for(ch) {
            Some(entity) => escaped.push_str(entity),
            None => escaped.push(ch),
        }
    }
    Cow::Owned(escaped)
}

/// Decode the five named entities produced by [`escape`]. Unknown
/// `&...;` sequences pass through unchanged.
pub fn unescape(encoded: &str) -> Cow<'_, str> {
    if !encoded.contains('&') {
        return Cow::Borrowed(encoded);
    }

    let mut decoded = String::with_capacity(encoded.len());
    let mut rest = encoded;
    while let Some(amp) = rest.find('&') {
        decoded.push_str(&rest[..amp]);
        let candidate = &rest[amp..];
        match ENTITIES
            .iter()
            .find(|(entity, _)| candidate.starts_with(entity))
        {
            Some((entity, ch)) => {
                decoded.push(*ch);
                rest = &candidate[entity.len()..];
            }
            None => {
                decoded.push('&');
                rest = &candidate[1..];
            }
        }
    }
    decoded.push_str(rest);
    Cow::Owned(decoded)
}
