//! Identifier sanitization helpers
//!
//! Character classes and small string splitters used when validating or
//! normalizing names coming from configuration or from backend records.

/// ASCII letter or digit
pub fn is_az09(c: char) -> bool {
    c.is_ascii_alphanumeric()
}

/// ASCII letter, digit or hyphen
pub fn is_az09_hyp(c: char) -> bool {
    is_az09(c) || c == '-'
}

/// Characters acceptable as a file name or url segment on most systems:
/// `A-Z a-z 0-9 _ - .`
pub fn is_for_file_name(c: char) -> bool {
    is_az09(c) || c == '-' || c == '_' || c == '.'
}

/// Characters allowed in identifiers handed to downstream consumers,
/// such as label keys. Extends the file name class with `/` so that
/// namespaced keys (`com.example/tier`) survive.
pub fn is_valid_identifier_char(c: char) -> bool {
    is_for_file_name(c) || c == '/'
}

/// True when every character of `s` is accepted by `judge`.
/// The empty string matches.
pub fn matches_all(s: &str, judge: impl Fn(char) -> bool) -> bool {
    s.chars().all(judge)
}

/// `[A-Za-z0-9-]*`
pub fn match_az09_hyp(s: &str) -> bool {
    matches_all(s, is_az09_hyp)
}

/// True when `s` is non-empty and made only of identifier characters
pub fn is_safe_identifier(s: &str) -> bool {
    !s.is_empty() && matches_all(s, is_valid_identifier_char)
}

/// Keep only the characters accepted by `judge`
pub fn retain(src: &str, judge: impl Fn(char) -> bool) -> String {
    src.chars().filter(|c| judge(*c)).collect()
}

/// Split at the last occurrence of `delim`; `None` when absent
pub fn split_last(s: &str, delim: char) -> Option<(&str, &str)> {
    s.rfind(delim)
        .map(|pos| (&s[..pos], &s[pos + delim.len_utf8()..]))
}

/// Portion before the first `delim`; `None` when absent
pub fn before(s: &str, delim: char) -> Option<&str> {
    s.find(delim).map(|pos| &s[..pos])
}

/// Portion after the first `delim`; `None` when absent
pub fn after(s: &str, delim: char) -> Option<&str> {
    s.find(delim).map(|pos| &s[pos + delim.len_utf8()..])
}

/// Portion after the last `delim`; `None` when absent
pub fn after_last(s: &str, delim: char) -> Option<&str> {
    split_last(s, delim).map(|(_, tail)| tail)
}
