/// Matches `text` against a single-`*`-wildcard glob `pattern`. No regex
/// dependency is needed since the grammar the ACL and routing vocabularies
/// use is a plain `*` wildcard, not a full glob/regex grammar.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    match pattern.split_once('*') {
        None => pattern == text,
        Some((prefix, suffix)) => {
            text.len() >= prefix.len() + suffix.len()
                && text.starts_with(prefix)
                && text.ends_with(suffix)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_pattern_requires_exact_match() {
        assert!(glob_match("math.add", "math.add"));
        assert!(!glob_match("math.add", "math.sub"));
    }

    #[test]
    fn star_matches_any_infix() {
        assert!(glob_match("math.*", "math.add"));
        assert!(glob_match("*.add", "math.add"));
        assert!(glob_match("*", "anything"));
        assert!(!glob_match("math.*", "science.add"));
    }

    #[test]
    fn prefix_and_suffix_must_not_overlap_illegally() {
        assert!(!glob_match("abc*abc", "ab"));
        assert!(glob_match("abc*abc", "abcabc"));
    }
}
