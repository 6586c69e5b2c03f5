//! A regular expression engine over sequences of arbitrary elements.
//!
//! Instead of characters, the atoms of a pattern are *token patterns*:
//! bracketed snippets whose text is handed to a caller-supplied factory that
//! turns each one into a predicate over a single element. The engine supplies
//! the regex combinators on top: concatenation, alternation, groups (plain,
//! named, non-capturing), quantifiers, and start/end anchors, compiled to a
//! nondeterministic finite automaton and simulated without backtracking.
//!
//! # Pattern syntax
//!
//! | Syntax          | Meaning                                          |
//! |-----------------|--------------------------------------------------|
//! | `<...>` `[...]` | Token pattern; the body goes to the factory      |
//! | `(...)`         | Capturing group                                  |
//! | `(<name>:...)`  | Capturing group bound to `name`                  |
//! | `(?:...)`       | Non-capturing group                              |
//! | `^` / `$`       | Start / end of the sequence                      |
//! | `?` `*` `+`     | Postfix quantifiers (greedy)                     |
//! | `{m,n}`         | Between `m` and `n` repetitions, `m <= n`        |
//! | `\|`            | Alternation of the adjacent atoms                |
//!
//! # Example
//!
//! ```rust
//! use seqre::{split_words, word};
//!
//! let regex = word("<the> (<big> | <small>)? <dog>").unwrap();
//!
//! assert!(regex.matches(&split_words("the big dog")));
//! assert!(regex.matches(&split_words("the dog")));
//!
//! let m = regex.find(&split_words("I saw the small dog today")).unwrap();
//! assert_eq!((m.start, m.end), (2, 5));
//! assert_eq!(m.group(1).unwrap().range(), 3..4);
//! ```
//!
//! The element type is generic; a factory over your own type is all that is
//! needed:
//!
//! ```rust
//! use std::sync::Arc;
//! use seqre::{Predicate, RegularExpression};
//!
//! let regex = RegularExpression::compile("<fizz> <buzz>", |body: &str| {
//!     let by = match body {
//!         "fizz" => 3,
//!         "buzz" => 5,
//!         other => anyhow::bail!("unknown token {other:?}"),
//!     };
//!     Ok(Arc::new(move |n: &u32| n % by == 0) as Predicate<u32>)
//! })
//! .unwrap();
//!
//! assert!(regex.matches(&[9, 10]));
//! assert!(!regex.matches(&[9, 11]));
//! ```

mod automaton;
mod expr;
mod matcher;
mod matches;
mod parser;
mod regex;
mod word;

pub use expr::{Expr, Predicate};
pub use matches::{Group, Match};
pub use parser::{TokenizeError, parse};
pub use regex::RegularExpression;
pub use word::{split_words, word, word_ignore_case};
