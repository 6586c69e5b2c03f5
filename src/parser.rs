//! Tokenizer for the surface pattern syntax.
//!
//! # Pattern syntax
//!
//! | Syntax        | Meaning                                        |
//! |---------------|------------------------------------------------|
//! | `<...>` `[...]` | Token pattern; the body is handed to the factory |
//! | `(...)`       | Capturing group                                |
//! | `(<name>:...)`| Capturing group bound to `name`                |
//! | `(?:...)`     | Non-capturing group                            |
//! | `^` `$`       | Start / end of sequence                        |
//! | `?` `*` `+`   | Postfix quantifiers                            |
//! | `{m,n}`       | Between `m` and `n` repetitions, `m <= n`      |
//! | `\|`          | Binary alternation of the adjacent atoms       |
//! | whitespace    | Ignored between atoms                          |

use std::fmt;

use crate::expr::{Expr, Predicate};

/// Errors that can occur while tokenizing a pattern string.
///
/// Positions are byte offsets into the full pattern, including for errors
/// raised inside nested groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenizeError {
    /// A token `<...>` or `[...]` with no matching close bracket.
    UnmatchedBracket { pos: usize, fragment: String },
    /// A `(` with no matching `)`.
    UnclosedGroup { pos: usize, fragment: String },
    /// A character that cannot start an atom.
    UnknownSymbol { pos: usize, fragment: String },
    /// `|` with a missing operand: no atom before it, or nothing after it.
    DanglingAlternation { pos: usize },
    /// `?`, `*`, `+` or `{m,n}` with no preceding atom.
    QuantifierWithoutAtom { pos: usize },
    /// `{m,n}` with `m > n`.
    InvalidRepetition { pos: usize, min: usize, max: usize },
    /// A group with nothing inside.
    EmptyGroup { pos: usize },
    /// The token factory rejected a token body.
    Factory { token: String, cause: String },
}

impl fmt::Display for TokenizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnmatchedBracket { pos, fragment } => {
                write!(f, "non-matching token brackets at offset {pos}: {fragment:?}")
            }
            Self::UnclosedGroup { pos, fragment } => {
                write!(f, "unclosed parenthesis at offset {pos}: {fragment:?}")
            }
            Self::UnknownSymbol { pos, fragment } => {
                write!(f, "unknown symbol at offset {pos}: {fragment:?}")
            }
            Self::DanglingAlternation { pos } => {
                write!(f, "alternation missing an operand at offset {pos}")
            }
            Self::QuantifierWithoutAtom { pos } => {
                write!(f, "quantifier with no preceding atom at offset {pos}")
            }
            Self::InvalidRepetition { pos, min, max } => {
                write!(f, "invalid repetition range {{{min},{max}}} at offset {pos}")
            }
            Self::EmptyGroup { pos } => write!(f, "empty group at offset {pos}"),
            Self::Factory { token, cause } => {
                write!(f, "error parsing token {token}: {cause}")
            }
        }
    }
}

impl std::error::Error for TokenizeError {}

/// Parse a pattern string into its list of top-level expressions.
///
/// The factory is invoked once per token pattern with the text between the
/// brackets; any error it returns is wrapped as [`TokenizeError::Factory`]
/// naming the offending token.
pub fn parse<E, F>(pattern: &str, factory: F) -> Result<Vec<Expr<E>>, TokenizeError>
where
    F: Fn(&str) -> anyhow::Result<Predicate<E>>,
{
    Tokenizer {
        input: pattern,
        base: 0,
        pos: 0,
        factory: &factory,
    }
    .run()
}

struct Tokenizer<'a, E> {
    input: &'a str,
    /// Byte offset of `input` within the whole pattern, so errors raised in
    /// nested group interiors report absolute positions.
    base: usize,
    pos: usize,
    factory: &'a dyn Fn(&str) -> anyhow::Result<Predicate<E>>,
}

impl<E> Tokenizer<'_, E> {
    fn run(&mut self) -> Result<Vec<Expr<E>>, TokenizeError> {
        let mut exprs = Vec::new();
        let mut pending_or = false;

        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
                continue;
            }
            let atom = match c {
                '(' => self.group()?,
                '<' => self.token('<', '>')?,
                '[' => self.token('[', ']')?,
                '^' => {
                    self.bump();
                    Expr::StartAnchor
                }
                '$' => {
                    self.bump();
                    Expr::EndAnchor
                }
                '|' => {
                    if exprs.is_empty() || pending_or {
                        return Err(TokenizeError::DanglingAlternation {
                            pos: self.base + self.pos,
                        });
                    }
                    pending_or = true;
                    self.bump();
                    continue;
                }
                '?' | '*' | '+' | '{' => {
                    return Err(TokenizeError::QuantifierWithoutAtom {
                        pos: self.base + self.pos,
                    });
                }
                _ => {
                    return Err(TokenizeError::UnknownSymbol {
                        pos: self.base + self.pos,
                        fragment: self.input[self.pos..].to_string(),
                    });
                }
            };

            // Quantifiers attach before a pending alternation folds, so they
            // bind tighter than `|`.
            let atom = self.quantify(atom)?;
            if pending_or {
                pending_or = false;
                let prev = exprs.pop().expect("alternation has a prior expression");
                exprs.push(fold_alternation(prev, atom));
            } else {
                exprs.push(atom);
            }
        }

        if pending_or {
            return Err(TokenizeError::DanglingAlternation {
                pos: self.base + self.pos,
            });
        }
        Ok(exprs)
    }

    /// Apply any postfix quantifiers to a freshly parsed atom. Whitespace may
    /// separate an atom from its quantifier, and quantifiers stack:
    /// `<a> ? *` is `Star(Option(<a>))`.
    fn quantify(&mut self, atom: Expr<E>) -> Result<Expr<E>, TokenizeError> {
        let mut expr = atom;
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('?') => {
                    self.bump();
                    expr = Expr::Option(Box::new(expr));
                }
                Some('*') => {
                    self.bump();
                    expr = Expr::Star(Box::new(expr));
                }
                Some('+') => {
                    self.bump();
                    expr = Expr::Plus(Box::new(expr));
                }
                Some('{') => {
                    let (min, max) = self.min_max()?;
                    expr = Expr::MinMax {
                        expr: Box::new(expr),
                        min,
                        max,
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// Parse a `{m,n}` repetition. Anything that does not fit the two-number
    /// form is reported as an unknown symbol at the `{`.
    fn min_max(&mut self) -> Result<(usize, usize), TokenizeError> {
        let start = self.pos;
        self.bump(); // '{'

        let min = self.integer();
        let comma = self.peek() == Some(',');
        if comma {
            self.bump();
        }
        let max = self.integer();
        let closed = self.peek() == Some('}');
        if closed {
            self.bump();
        }

        match (min, comma, max, closed) {
            (Some(min), true, Some(max), true) if min <= max => Ok((min, max)),
            (Some(min), true, Some(max), true) => Err(TokenizeError::InvalidRepetition {
                pos: self.base + start,
                min,
                max,
            }),
            _ => Err(TokenizeError::UnknownSymbol {
                pos: self.base + start,
                fragment: self.input[start..].to_string(),
            }),
        }
    }

    fn integer(&mut self) -> Option<usize> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.bump();
            } else {
                break;
            }
        }
        if self.pos == start {
            return None;
        }
        self.input[start..self.pos].parse().ok()
    }

    /// Parse one token pattern (`<...>` or `[...]`). The close bracket is
    /// found by counting nesting of the same pair, so `<a<b>>` is one token
    /// with body `a<b>`.
    fn token(&mut self, open: char, close: char) -> Result<Expr<E>, TokenizeError> {
        let start = self.pos;
        let end =
            self.index_of_close(open, close)
                .ok_or_else(|| TokenizeError::UnmatchedBracket {
                    pos: self.base + start,
                    fragment: self.input[start..].to_string(),
                })?;
        let source = &self.input[start..=end];
        let body = &self.input[start + 1..end];
        let predicate = (self.factory)(body).map_err(|err| TokenizeError::Factory {
            token: source.to_string(),
            cause: err.to_string(),
        })?;
        self.pos = end + 1;
        Ok(Expr::Token {
            predicate,
            source: source.to_string(),
        })
    }

    /// Parse one group. The matching `)` is found by counting parentheses
    /// only; the interior is then tokenized recursively and classified by its
    /// prefix (`<name>:`, `?:`, or neither).
    fn group(&mut self) -> Result<Expr<E>, TokenizeError> {
        let start = self.pos;
        let end = self
            .index_of_close('(', ')')
            .ok_or_else(|| TokenizeError::UnclosedGroup {
                pos: self.base + start,
                fragment: self.input[start..].to_string(),
            })?;
        let interior = &self.input[start + 1..end];
        let group_pos = self.base + start;
        let interior_base = self.base + start + 1;
        self.pos = end + 1;

        if let Some(body) = interior.strip_prefix("?:") {
            let children = self.subparse(body, interior_base + 2, group_pos)?;
            Ok(Expr::NonMatchingGroup(children))
        } else if let Some((name, body, offset)) = split_named(interior) {
            let children = self.subparse(body, interior_base + offset, group_pos)?;
            Ok(Expr::NamedGroup(name.to_string(), children))
        } else {
            let children = self.subparse(interior, interior_base, group_pos)?;
            Ok(Expr::MatchingGroup(children))
        }
    }

    fn subparse(
        &self,
        interior: &str,
        base: usize,
        group_pos: usize,
    ) -> Result<Vec<Expr<E>>, TokenizeError> {
        let children = Tokenizer {
            input: interior,
            base,
            pos: 0,
            factory: self.factory,
        }
        .run()?;
        if children.is_empty() {
            return Err(TokenizeError::EmptyGroup { pos: group_pos });
        }
        Ok(children)
    }

    /// Byte index of the close character matching the open at the current
    /// position, counting nesting of the same pair.
    fn index_of_close(&self, open: char, close: char) -> Option<usize> {
        let mut depth = 0usize;
        for (i, c) in self.input[self.pos..].char_indices() {
            if c == open {
                depth += 1;
            } else if c == close {
                depth -= 1;
                if depth == 0 {
                    return Some(self.pos + i);
                }
            }
        }
        None
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.bump();
        }
    }
}

/// Split a group interior of the form `<name>:body`, where `name` is zero or
/// more word characters. Returns the name, the body, and the body's byte
/// offset within the interior.
fn split_named(interior: &str) -> Option<(&str, &str, usize)> {
    let rest = interior.strip_prefix('<')?;
    let close = rest.find('>')?;
    let name = &rest[..close];
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    let body = rest[close + 1..].strip_prefix(':')?;
    Some((name, body, close + 3))
}

/// Graft a new alternative onto the right edge of an existing alternation so
/// chains stay right-leaning: `A | B | C` is `A | (B | C)`.
fn fold_alternation<E>(prev: Expr<E>, next: Expr<E>) -> Expr<E> {
    match prev {
        Expr::Alternation(left, right) => {
            Expr::Alternation(left, Box::new(fold_alternation(*right, next)))
        }
        _ => Expr::Alternation(Box::new(prev), Box::new(next)),
    }
}
