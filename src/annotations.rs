//! Comment grammars for `@codeflow` headers and inline step tags.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::types::Annotations;

static DELIMITER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/+\*+|\*+/+").expect("valid delimiter regex"));
static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^codeflow (\S+) (.+)").expect("valid header regex"));
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+) (.*)").expect("valid tag regex"));

/// Splits raw comment text on `@` and cleans each segment of comment
/// punctuation and redundant whitespace.
pub fn split_comment(text: &str) -> Vec<String> {
    text.split('@')
        .map(|segment| {
            let segment = DELIMITER_RE.replace_all(segment, " ");
            let segment =
                segment.trim_matches(|c: char| c == '/' || c == '*' || c.is_whitespace());
            segment.split_whitespace().collect::<Vec<_>>().join(" ")
        })
        .collect()
}

/// Adds `value` under `key`, appending to a non-empty earlier value.
fn accumulate(map: &mut HashMap<String, String>, key: &str, value: &str) {
    match map.get_mut(key) {
        Some(existing) if !existing.is_empty() => {
            existing.push(' ');
            existing.push_str(value);
        }
        _ => {
            map.insert(key.to_string(), value.to_string());
        }
    }
}

/// Parsed `@codeflow <key> <value>` tags of a function or method.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderTags {
    tags: HashMap<String, String>,
}

impl HeaderTags {
    /// Value of a tag, if present and non-empty.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.tags
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// `(id, name)` when the comment marks a flowchart construct.
    pub fn identity(&self) -> Option<(&str, &str)> {
        Some((self.get("id")?, self.get("name")?))
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Parses the header tags of a construct's leading comment.
///
/// Text before the first `@` is ignored; repeated keys are joined with a
/// space.
pub fn extract_headers(text: &str) -> HeaderTags {
    let mut tags = HashMap::new();
    for part in split_comment(text).iter().skip(1) {
        if let Some(caps) = HEADER_RE.captures(part) {
            accumulate(&mut tags, &caps[1], &caps[2]);
        }
    }
    HeaderTags { tags }
}

/// Parses the inline tags of a statement's leading comment.
///
/// Text before the first `@` becomes `info`; of the `@key value` tags only
/// `name`, `info` and `px` are kept.
pub fn extract_annotations(text: &str) -> Annotations {
    let mut parts = split_comment(text).into_iter();
    let mut tags = HashMap::new();
    if let Some(preamble) = parts.next() {
        tags.insert("info".to_string(), preamble);
    }
    for part in parts {
        if let Some(caps) = TAG_RE.captures(&part) {
            accumulate(&mut tags, &caps[1], &caps[2]);
        }
    }

    let mut take = |key: &str| tags.remove(key).filter(|value| !value.is_empty());
    Annotations {
        name: take("name"),
        info: take("info"),
        px: take("px"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_comment_strips_punctuation() {
        let parts = split_comment("/**\n * @codeflow id cf-1\n *   spread   out\n */");
        assert_eq!(parts, vec!["", "codeflow id cf-1 * spread out"]);
    }

    #[test]
    fn test_split_line_comments() {
        let parts = split_comment("// Some text.\n    // @name A Name\n    ");
        assert_eq!(parts, vec!["Some text.", "name A Name"]);
    }
}
