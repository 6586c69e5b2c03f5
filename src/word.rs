//! Ready-made token vocabularies over word sequences.
//!
//! These cover the common case of matching whitespace-separated words, and
//! double as a reference for writing token factories over richer element
//! types.

use std::sync::Arc;

use crate::expr::Predicate;
use crate::parser::TokenizeError;
use crate::regex::RegularExpression;

/// Compile a pattern whose token bodies match whole words exactly:
/// `<dog>` matches the word `dog` and nothing else.
pub fn word(pattern: &str) -> Result<RegularExpression<String>, TokenizeError> {
    RegularExpression::compile(pattern, |body: &str| {
        let want = body.to_string();
        Ok(Arc::new(move |token: &String| *token == want) as Predicate<String>)
    })
}

/// Like [`word`], but comparing words ASCII-case-insensitively.
pub fn word_ignore_case(pattern: &str) -> Result<RegularExpression<String>, TokenizeError> {
    RegularExpression::compile(pattern, |body: &str| {
        let want = body.to_string();
        Ok(Arc::new(move |token: &String| token.eq_ignore_ascii_case(&want)) as Predicate<String>)
    })
}

/// Split a line into the whitespace-separated words the word vocabularies
/// match against.
pub fn split_words(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_matches_exactly() {
        let regex = word("<the> (<big> | <small>) <dog>").unwrap();
        assert!(regex.matches(&split_words("the big dog")));
        assert!(regex.matches(&split_words("the small dog")));
        assert!(!regex.matches(&split_words("the BIG dog")));
        assert!(!regex.matches(&split_words("a big dog")));
    }

    #[test]
    fn word_ignore_case_folds_ascii() {
        let regex = word_ignore_case("<the> <dog>").unwrap();
        assert!(regex.matches(&split_words("The DOG")));
        assert!(!regex.matches(&split_words("The cat")));
    }

    #[test]
    fn split_words_collapses_whitespace() {
        assert_eq!(split_words("  the\tbig  dog "), vec!["the", "big", "dog"]);
        assert!(split_words("   ").is_empty());
    }
}
