// src/utils/text.rs

//! Text normalization helpers.

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Make `raw` safe to send as an HTTP header value.
///
/// Line breaks become spaces, control and non-ASCII characters are dropped
/// and whitespace is collapsed. Falls back to `"Notification"` when nothing
/// printable remains.
pub fn sanitize_header(raw: &str) -> String {
    let printable: String = raw
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .collect();

    let collapsed = normalize_whitespace(&printable);
    if collapsed.is_empty() {
        "Notification".to_string()
    } else {
        collapsed
    }
}
