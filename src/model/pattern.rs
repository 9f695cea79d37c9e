//! IRC-style rule patterns.
//!
//! Rules come in two flavours: plain wildcards (`*` matches any run, `?` one
//! character) and verbatim regular expressions. Both compile into one
//! [`Regex`] so the matching path downstream is uniform. Wildcard matching is
//! always case-insensitive.

use regex::{Regex, RegexBuilder};

/// Translate a wildcard pattern into an anchored regex source string.
pub fn wildcard_to_regex(pattern: &str) -> String {
    let escaped = regex::escape(pattern)
        .replace(r"\*", ".*")
        .replace(r"\?", ".");
    format!("^{escaped}$")
}

/// Compile a rule pattern. `is_regex` selects verbatim-regex interpretation;
/// otherwise the pattern is treated as a wildcard.
pub fn compile_rule(pattern: &str, is_regex: bool, case_sensitive: bool) -> Result<Regex, regex::Error> {
    let source = if is_regex {
        pattern.to_owned()
    } else {
        wildcard_to_regex(pattern)
    };
    RegexBuilder::new(&source)
        .case_insensitive(!case_sensitive)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_star_matches_any_run() {
        let re = compile_rule("*foo*", false, false).unwrap();
        assert!(re.is_match("xxfooyy"));
        assert!(re.is_match("foo"));
        assert!(!re.is_match("bar"));
    }

    #[test]
    fn wildcard_question_matches_one_char() {
        let re = compile_rule("f?o", false, false).unwrap();
        assert!(re.is_match("foo"));
        assert!(re.is_match("fXo"));
        assert!(!re.is_match("fo"));
    }

    #[test]
    fn wildcard_escapes_regex_metacharacters() {
        let re = compile_rule("a.b*", false, false).unwrap();
        assert!(re.is_match("a.bcd"));
        assert!(!re.is_match("aXbcd"));
    }

    #[test]
    fn regex_rules_are_used_verbatim() {
        let re = compile_rule(r"^foo\d+$", true, false).unwrap();
        assert!(re.is_match("foo42"));
        assert!(!re.is_match("foo"));
    }

    #[test]
    fn wildcard_matching_is_case_insensitive() {
        let re = compile_rule("*FOO*", false, false).unwrap();
        assert!(re.is_match("xxfooyy"));
    }
}
