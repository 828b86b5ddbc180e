/// Replacement character used for header cells when none is configured
pub const DEFAULT_REPLACEMENT: char = '_';

/// Normalize a raw header cell into a canonical column key
///
/// Lower-cases the text, then replaces every character that is not an
/// ASCII letter, digit, or hyphen with the default underscore. Rule keys
/// are matched against this canonical form, so `"First Name!!"` binds as
/// `"first_name__"` regardless of how the header was typed.
pub fn normalize_header(value: &str) -> String {
    normalize_header_with(value, DEFAULT_REPLACEMENT)
}

/// Same as [`normalize_header`] but with a caller-chosen replacement character
///
/// Each header cell is normalized independently; column order is preserved
/// and no deduplication happens here.
pub fn normalize_header_with(value: &str, replacement: char) -> String {
    value
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else {
                replacement
            }
        })
        .collect()
}
