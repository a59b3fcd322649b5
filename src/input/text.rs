//! Character-offset helpers for splicing dictated text into a buffer.
//!
//! Offsets coming from the UI are cursor positions counted in characters,
//! so every split goes through `char_indices` to stay on UTF-8 boundaries.

/// Number of characters in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Clamp a cursor offset into `[0, char_len(text)]`.
pub fn clamp_offset(text: &str, offset: usize) -> usize {
    offset.min(char_len(text))
}

/// Byte index of the character at `offset` (or the end of `text`).
fn byte_index(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

/// Build `prefix(base, offset) + insert + suffix(base, offset)`.
///
/// `offset` is re-clamped against `base`, so a stale offset can never split
/// past the end of the snapshot.
pub fn splice(base: &str, offset: usize, insert: &str) -> String {
    let at = byte_index(base, clamp_offset(base, offset));
    let (prefix, suffix) = base.split_at(at);

    let mut out = String::with_capacity(base.len() + insert.len());
    out.push_str(prefix);
    out.push_str(insert);
    out.push_str(suffix);
    out
}

/// True when `text` has something other than whitespace in it.
pub fn has_content(text: &str) -> bool {
    !text.trim().is_empty()
}
