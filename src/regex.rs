//! Compiled sequence regular expressions.

use std::fmt;
use std::hash::{Hash, Hasher};

use itertools::Itertools;

use crate::automaton::Automaton;
use crate::expr::{Expr, Predicate};
use crate::matcher;
use crate::matches::Match;
use crate::parser::{self, TokenizeError};

/// A compiled pattern over sequences of `E`.
///
/// Immutable after construction and safe to share across threads for
/// read-only matching, provided the token predicates are pure (the
/// [`Predicate`] alias already requires `Send + Sync`).
///
/// Equality, ordering into hash maps, and `Display` all go through the
/// canonical source form: the parsed expressions rendered back to text.
pub struct RegularExpression<E> {
    expressions: Vec<Expr<E>>,
    automaton: Automaton<E>,
}

impl<E> RegularExpression<E> {
    /// Compile a pattern string, building token predicates with `factory`.
    ///
    /// Errors are raised here and never from match-time calls.
    pub fn compile<F>(pattern: &str, factory: F) -> Result<Self, TokenizeError>
    where
        F: Fn(&str) -> anyhow::Result<Predicate<E>>,
    {
        Ok(Self::from_expressions(parser::parse(pattern, factory)?))
    }

    /// Build a regular expression directly from an expression tree, with no
    /// tokenization involved.
    pub fn from_expressions(expressions: Vec<Expr<E>>) -> Self {
        let automaton = Automaton::build(&expressions);
        RegularExpression {
            expressions,
            automaton,
        }
    }

    /// The parsed top-level expressions.
    pub fn expressions(&self) -> &[Expr<E>] {
        &self.expressions
    }

    /// Conservative lower bound on the number of elements a match consumes.
    pub fn min_match_length(&self) -> usize {
        self.automaton.min_length
    }

    /// Match with the start pinned to the beginning of the sequence.
    pub fn looking_at(&self, tokens: &[E]) -> Option<Match> {
        self.looking_at_from(tokens, 0)
    }

    /// Match with the start pinned to `start`. Anchors keep their absolute
    /// meaning: `^` is position 0, `$` is the end of the sequence.
    pub fn looking_at_from(&self, tokens: &[E], start: usize) -> Option<Match> {
        matcher::looking_at(&self.automaton, tokens, start)
    }

    /// The first match anywhere in the sequence.
    pub fn find(&self, tokens: &[E]) -> Option<Match> {
        self.find_from(tokens, 0)
    }

    /// The first match beginning at or after `start`. Start positions too
    /// close to the end to fit the minimum matching length are not tried.
    pub fn find_from(&self, tokens: &[E], start: usize) -> Option<Match> {
        let Some(last) = tokens.len().checked_sub(self.automaton.min_length) else {
            return None;
        };
        (start..=last).find_map(|i| self.looking_at_from(tokens, i))
    }

    /// All non-overlapping, non-empty matches, leftmost first.
    pub fn find_all(&self, tokens: &[E]) -> Vec<Match> {
        let mut matches = Vec::new();
        let mut start = 0;
        while let Some(found) = self.find_from(tokens, start) {
            if found.is_empty() {
                // Empty matches are dropped; an empty match at the cursor
                // still advances it so the search terminates.
                start = if found.end == start {
                    start + 1
                } else {
                    found.end
                };
            } else {
                start = found.end;
                matches.push(found);
            }
        }
        matches
    }

    /// Whether the pattern consumes the entire sequence.
    pub fn matches(&self, tokens: &[E]) -> bool {
        self.looking_at(tokens)
            .is_some_and(|m| m.end == tokens.len())
    }

    /// Whether the pattern matches anywhere in the sequence.
    pub fn is_match(&self, tokens: &[E]) -> bool {
        self.find(tokens).is_some()
    }
}

impl<E> fmt::Display for RegularExpression<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expressions.iter().map(|e| e.to_string()).join(" "))
    }
}

impl<E> fmt::Debug for RegularExpression<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RegularExpression({self})")
    }
}

impl<E> PartialEq for RegularExpression<E> {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

impl<E> Eq for RegularExpression<E> {}

impl<E> Hash for RegularExpression<E> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use std::hash::{DefaultHasher, Hash, Hasher};
    use std::sync::Arc;

    use crate::word::{split_words, word};

    use super::*;

    fn compile(pattern: &str) -> RegularExpression<String> {
        word(pattern).expect("pattern should compile")
    }

    fn spans(matches: &[Match]) -> Vec<(usize, usize)> {
        matches.iter().map(|m| (m.start, m.end)).collect()
    }

    // --- End-to-end scenarios ---

    #[test]
    fn two_word_sequence() {
        let regex = compile("<the> <cat>");
        let tokens = split_words("the cat");
        assert!(regex.matches(&tokens));
        let m = regex.find(&tokens).unwrap();
        assert_eq!((m.start, m.end), (0, 2));
    }

    #[test]
    fn optional_word_skipped() {
        let regex = compile("<a> <b>?  <c>");
        let m = regex.find(&split_words("a c")).unwrap();
        assert_eq!((m.start, m.end), (0, 2));
        assert!(m.groups().is_empty());
    }

    #[test]
    fn repeated_alternation() {
        let regex = compile("(<a> | <b>)+");
        let tokens = split_words("a b a c a");
        let m = regex.find(&tokens).unwrap();
        assert_eq!((m.start, m.end), (0, 3));
        assert_eq!(spans(&regex.find_all(&tokens)), vec![(0, 3), (4, 5)]);
    }

    #[test]
    fn anchored_pattern() {
        let regex = compile("^<a> <b>$");
        assert!(regex.matches(&split_words("a b")));
        assert!(regex.find(&split_words("x a b")).is_none());
    }

    #[test]
    fn greedy_bounded_repetition() {
        let regex = compile("(<x>){2,3}");
        let m = regex.find(&split_words("x x x x")).unwrap();
        assert_eq!((m.start, m.end), (0, 3));
    }

    #[test]
    fn named_capture() {
        let regex = compile("(<name>:<hi>) <there>");
        let m = regex.find(&split_words("hi there")).unwrap();
        assert_eq!((m.start, m.end), (0, 2));
        assert_eq!(m.group_named("name").unwrap().range(), 0..1);
    }

    // --- Search operations ---

    #[test]
    fn find_skips_to_first_match() {
        let regex = compile("<cat>");
        let m = regex.find(&split_words("the black cat sat")).unwrap();
        assert_eq!((m.start, m.end), (2, 3));
    }

    #[test]
    fn find_from_respects_start() {
        let regex = compile("<a>");
        let tokens = split_words("a b a");
        assert_eq!(regex.find_from(&tokens, 1).unwrap().start, 2);
    }

    #[test]
    fn find_prunes_by_min_match_length() {
        let regex = compile("<a> <b> <c>");
        assert_eq!(regex.min_match_length(), 3);
        assert!(regex.find(&split_words("a b")).is_none());
    }

    #[test]
    fn find_all_is_ordered_and_non_overlapping() {
        let regex = compile("<a> <b>");
        let found = regex.find_all(&split_words("a b a b a b"));
        assert_eq!(spans(&found), vec![(0, 2), (2, 4), (4, 6)]);
        for pair in found.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
    }

    #[test]
    fn find_all_drops_empty_matches() {
        let regex = compile("<a>?");
        let found = regex.find_all(&split_words("b a b"));
        assert_eq!(spans(&found), vec![(1, 2)]);
    }

    #[test]
    fn empty_pattern() {
        let regex = compile("");
        assert_eq!(regex.min_match_length(), 0);
        assert!(regex.matches(&[]));
        let m = regex.find(&split_words("a b")).unwrap();
        assert_eq!((m.start, m.end), (0, 0));
        assert!(regex.find_all(&split_words("a b")).is_empty());
    }

    #[test]
    fn matches_implies_find_covers_everything() {
        let regex = compile("<a> (<b> | <c>)*");
        let tokens = split_words("a b c b");
        assert!(regex.matches(&tokens));
        let m = regex.find(&tokens).unwrap();
        assert_eq!((m.start, m.end), (0, tokens.len()));
    }

    #[test]
    fn is_match_is_find_as_a_bool() {
        let regex = compile("<cat>");
        assert!(regex.is_match(&split_words("the cat")));
        assert!(!regex.is_match(&split_words("the dog")));
    }

    #[test]
    fn nested_quantified_groups() {
        let regex = compile("(?:(<a>|<b>)+)*");
        let tokens = split_words("a b b a");
        assert!(regex.matches(&tokens));
    }

    // --- Canonical form, equality, hashing ---

    #[test]
    fn display_is_the_canonical_form() {
        let regex = compile("(<subj>:<the>   <cat>) | (?:<dog>{1,2})");
        assert_eq!(
            regex.to_string(),
            "(<subj>:<the> <cat>) | (?:<dog>{1,2})"
        );
    }

    #[test]
    fn recompiling_the_canonical_form_is_equal() {
        let regex = compile("^ (<a> | <b>)* [end] $");
        assert_eq!(compile(&regex.to_string()), regex);
    }

    #[test]
    fn equality_and_hash_ignore_whitespace_differences() {
        let a = compile("<a>  <b>");
        let b = compile("<a> <b>");
        let c = compile("<a> <c>");
        assert_eq!(a, b);
        assert_ne!(a, c);

        let hash = |r: &RegularExpression<String>| {
            let mut hasher = DefaultHasher::new();
            r.hash(&mut hasher);
            hasher.finish()
        };
        assert_eq!(hash(&a), hash(&b));
    }

    // --- Tree compilation ---

    #[test]
    fn from_expressions_matches_without_a_factory() {
        let even = Expr::Token {
            predicate: Arc::new(|n: &i32| n % 2 == 0) as Predicate<i32>,
            source: "<even>".to_string(),
        };
        let regex = RegularExpression::from_expressions(vec![
            Expr::Plus(Box::new(even)),
        ]);
        let m = regex.find(&[1, 4, 6, 3]).unwrap();
        assert_eq!((m.start, m.end), (1, 3));
        assert_eq!(regex.to_string(), "<even>+");
    }

    #[test]
    fn compiled_regex_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RegularExpression<String>>();
    }
}
