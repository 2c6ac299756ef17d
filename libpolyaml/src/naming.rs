//! Naming conventions map identifier names to their serialized form.
//!
//! Identifiers are split into words at case boundaries and at `_`, `-`,
//! `.` and spaces; the convention then decides how words are cased and
//! joined. `MaxRetryCount`, `max_retry_count` and `maxRetryCount` all split
//! into `max`, `retry`, `count`. An uppercase run is one word, so
//! `HTTPProxy` splits into `http`, `proxy`. Digits stay attached to the word
//! before them (`Socks5`, `Ipv6Address` → `ipv6`, `address`).

use std::fmt;

/// Deterministic transform from an identifier to its serialized form.
pub trait NamingConvention: fmt::Debug + Send + Sync {
    /// Transform `name`. Must be pure: the same input always yields the same
    /// output.
    fn apply(&self, name: &str) -> String;
}

/// `max-retry-count`. The default convention.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Hyphenated;

/// `max_retry_count`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Underscored;

/// `maxRetryCount`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Camel;

/// `MaxRetryCount`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pascal;

/// `maxretrycount`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LowerCase;

/// Names are written exactly as declared.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Verbatim;

impl NamingConvention for Hyphenated {
    fn apply(&self, name: &str) -> String {
        lower_words(name).join("-")
    }
}

impl NamingConvention for Underscored {
    fn apply(&self, name: &str) -> String {
        lower_words(name).join("_")
    }
}

impl NamingConvention for Camel {
    fn apply(&self, name: &str) -> String {
        let mut out = String::with_capacity(name.len());
        for (i, word) in lower_words(name).iter().enumerate() {
            if i == 0 {
                out.push_str(word);
            } else {
                out.push_str(&capitalize(word));
            }
        }
        out
    }
}

impl NamingConvention for Pascal {
    fn apply(&self, name: &str) -> String {
        lower_words(name).iter().map(|w| capitalize(w)).collect()
    }
}

impl NamingConvention for LowerCase {
    fn apply(&self, name: &str) -> String {
        lower_words(name).concat()
    }
}

impl NamingConvention for Verbatim {
    fn apply(&self, name: &str) -> String {
        name.to_string()
    }
}

fn lower_words(name: &str) -> Vec<String> {
    split_words(name).into_iter().map(str::to_lowercase).collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Split an identifier into its words, keeping the original casing.
pub(crate) fn split_words(name: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = name.char_indices().collect();
    let mut words = Vec::new();
    let mut start: Option<usize> = None;

    for (n, &(i, c)) in chars.iter().enumerate() {
        if matches!(c, '_' | '-' | '.' | ' ') {
            if let Some(s) = start.take() {
                words.push(&name[s..i]);
            }
            continue;
        }

        if let Some(s) = start {
            let prev = chars[n - 1].1;
            let next = chars.get(n + 1).map(|&(_, c)| c);
            let boundary = c.is_uppercase()
                && (prev.is_lowercase()
                    || prev.is_ascii_digit()
                    || (prev.is_uppercase() && next.is_some_and(char::is_lowercase)));
            if boundary {
                words.push(&name[s..i]);
                start = Some(i);
            }
        } else {
            start = Some(i);
        }
    }

    if let Some(s) = start {
        words.push(&name[s..]);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("MaxRetryCount", "max-retry-count")]
    #[case("max_retry_count", "max-retry-count")]
    #[case("maxRetryCount", "max-retry-count")]
    #[case("Http", "http")]
    #[case("Socks5", "socks5")]
    #[case("HTTPProxy", "http-proxy")]
    #[case("Ipv6Address", "ipv6-address")]
    #[case("allow_lan", "allow-lan")]
    #[case("Type", "type")]
    #[case("already-hyphenated", "already-hyphenated")]
    #[case("ID", "id")]
    fn test_hyphenated(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(Hyphenated.apply(input), expected);
    }

    #[rstest]
    #[case("MaxRetryCount", "max_retry_count", "maxRetryCount", "MaxRetryCount", "maxretrycount")]
    #[case("external_controller", "external_controller", "externalController", "ExternalController", "externalcontroller")]
    #[case("Type", "type", "type", "Type", "type")]
    fn test_other_conventions(
        #[case] input: &str,
        #[case] underscored: &str,
        #[case] camel: &str,
        #[case] pascal: &str,
        #[case] lower: &str,
    ) {
        assert_eq!(Underscored.apply(input), underscored);
        assert_eq!(Camel.apply(input), camel);
        assert_eq!(Pascal.apply(input), pascal);
        assert_eq!(LowerCase.apply(input), lower);
        assert_eq!(Verbatim.apply(input), input);
    }

    #[test]
    fn test_separators_only() {
        assert_eq!(Hyphenated.apply("__"), "");
        assert!(split_words("").is_empty());
    }

    #[test]
    fn test_apply_is_deterministic() {
        for name in ["MixedPort", "log_level", "IPv6"] {
            assert_eq!(Hyphenated.apply(name), Hyphenated.apply(name));
        }
    }
}
