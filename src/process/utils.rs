use crate::schema::VALUE_SELECTOR;

/// Drop the trailing `.value` selector from a flattened key:
/// `nameLabel.value` → `nameLabel`. Other keys pass through untouched.
pub fn strip_value_suffix(key: &str) -> &str {
    key.strip_suffix(VALUE_SELECTOR)
        .and_then(|k| k.strip_suffix('.'))
        .unwrap_or(key)
}

/// Strip every leading/trailing char that appears in `chars`:
/// `strip_chars("[[200]", "[]")` → `"200"`.
pub fn strip_chars(raw: &str, chars: &str) -> String {
    raw.trim_matches(|c| chars.contains(c)).to_string()
}

/// Everything after the final `/`, or the whole string if there is none.
pub fn last_path_segment(raw: &str) -> String {
    raw.rsplit('/').next().unwrap_or(raw).to_string()
}
