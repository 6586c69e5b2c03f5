//! Expression tree for sequence regular expressions.

use std::fmt;
use std::sync::Arc;

use itertools::Itertools;

/// A predicate over one element of the input sequence.
///
/// Produced by a token factory from the text between token brackets. The
/// matcher may evaluate a predicate any number of times in any order, so
/// predicates must be deterministic and free of observable side effects.
pub type Predicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// One node of a parsed pattern.
///
/// Trees are immutable once built. Two expressions are equal when they have
/// the same shape and their tokens have the same source text; the predicates
/// themselves are never compared.
pub enum Expr<E> {
    /// A token pattern wrapping a factory-built predicate.
    ///
    /// `source` is the original bracketed text (`<...>` or `[...]`), kept so
    /// the expression renders back to the form it was parsed from.
    Token {
        predicate: Predicate<E>,
        source: String,
    },
    /// `^` - matches the zero-width position before the first element.
    StartAnchor,
    /// `$` - matches the zero-width position after the last element.
    EndAnchor,
    /// `(...)` - capturing group.
    MatchingGroup(Vec<Expr<E>>),
    /// `(<name>:...)` - capturing group bound to a name.
    NamedGroup(String, Vec<Expr<E>>),
    /// `(?:...)` - non-capturing group.
    NonMatchingGroup(Vec<Expr<E>>),
    /// `a | b` - tries `left` first, then `right`.
    Alternation(Box<Expr<E>>, Box<Expr<E>>),
    /// `e?`
    Option(Box<Expr<E>>),
    /// `e*`
    Star(Box<Expr<E>>),
    /// `e+`
    Plus(Box<Expr<E>>),
    /// `e{min,max}` with `min <= max`.
    MinMax {
        expr: Box<Expr<E>>,
        min: usize,
        max: usize,
    },
}

impl<E> Expr<E> {
    /// The smallest number of elements any match of this expression can
    /// consume. Used to prune impossible start positions when searching.
    pub fn min_length(&self) -> usize {
        match self {
            Expr::Token { .. } => 1,
            Expr::StartAnchor | Expr::EndAnchor => 0,
            Expr::MatchingGroup(children)
            | Expr::NamedGroup(_, children)
            | Expr::NonMatchingGroup(children) => sequence_min_length(children),
            Expr::Alternation(left, right) => left.min_length().min(right.min_length()),
            Expr::Option(_) | Expr::Star(_) => 0,
            Expr::Plus(expr) => expr.min_length(),
            Expr::MinMax { expr, min, .. } => min * expr.min_length(),
        }
    }

    /// Number of capturing groups in this subtree.
    pub fn capture_count(&self) -> usize {
        match self {
            Expr::Token { .. } | Expr::StartAnchor | Expr::EndAnchor => 0,
            Expr::MatchingGroup(children) | Expr::NamedGroup(_, children) => {
                1 + children.iter().map(Expr::capture_count).sum::<usize>()
            }
            Expr::NonMatchingGroup(children) => {
                children.iter().map(Expr::capture_count).sum()
            }
            Expr::Alternation(left, right) => left.capture_count() + right.capture_count(),
            Expr::Option(expr) | Expr::Star(expr) | Expr::Plus(expr) => expr.capture_count(),
            Expr::MinMax { expr, .. } => expr.capture_count(),
        }
    }
}

/// Minimum matching length of a concatenated expression list.
pub(crate) fn sequence_min_length<E>(exprs: &[Expr<E>]) -> usize {
    exprs.iter().map(Expr::min_length).sum()
}

fn render_children<E>(children: &[Expr<E>]) -> String {
    children.iter().map(|e| e.to_string()).join(" ")
}

impl<E> fmt::Display for Expr<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Token { source, .. } => f.write_str(source),
            Expr::StartAnchor => f.write_str("^"),
            Expr::EndAnchor => f.write_str("$"),
            Expr::MatchingGroup(children) => write!(f, "({})", render_children(children)),
            Expr::NamedGroup(name, children) => {
                write!(f, "(<{}>:{})", name, render_children(children))
            }
            Expr::NonMatchingGroup(children) => write!(f, "(?:{})", render_children(children)),
            Expr::Alternation(left, right) => write!(f, "{left} | {right}"),
            Expr::Option(expr) => write!(f, "{expr}?"),
            Expr::Star(expr) => write!(f, "{expr}*"),
            Expr::Plus(expr) => write!(f, "{expr}+"),
            Expr::MinMax { expr, min, max } => write!(f, "{expr}{{{min},{max}}}"),
        }
    }
}

impl<E> fmt::Debug for Expr<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Token { source, .. } => f.debug_tuple("Token").field(source).finish(),
            Expr::StartAnchor => f.write_str("StartAnchor"),
            Expr::EndAnchor => f.write_str("EndAnchor"),
            Expr::MatchingGroup(children) => {
                f.debug_tuple("MatchingGroup").field(children).finish()
            }
            Expr::NamedGroup(name, children) => f
                .debug_tuple("NamedGroup")
                .field(name)
                .field(children)
                .finish(),
            Expr::NonMatchingGroup(children) => {
                f.debug_tuple("NonMatchingGroup").field(children).finish()
            }
            Expr::Alternation(left, right) => f
                .debug_tuple("Alternation")
                .field(left)
                .field(right)
                .finish(),
            Expr::Option(expr) => f.debug_tuple("Option").field(expr).finish(),
            Expr::Star(expr) => f.debug_tuple("Star").field(expr).finish(),
            Expr::Plus(expr) => f.debug_tuple("Plus").field(expr).finish(),
            Expr::MinMax { expr, min, max } => f
                .debug_struct("MinMax")
                .field("expr", expr)
                .field("min", min)
                .field("max", max)
                .finish(),
        }
    }
}

// Manual impls: deriving would demand `E: Clone` / `E: PartialEq` bounds that
// the tree does not actually need.
impl<E> Clone for Expr<E> {
    fn clone(&self) -> Self {
        match self {
            Expr::Token { predicate, source } => Expr::Token {
                predicate: Arc::clone(predicate),
                source: source.clone(),
            },
            Expr::StartAnchor => Expr::StartAnchor,
            Expr::EndAnchor => Expr::EndAnchor,
            Expr::MatchingGroup(children) => Expr::MatchingGroup(children.clone()),
            Expr::NamedGroup(name, children) => {
                Expr::NamedGroup(name.clone(), children.clone())
            }
            Expr::NonMatchingGroup(children) => Expr::NonMatchingGroup(children.clone()),
            Expr::Alternation(left, right) => Expr::Alternation(left.clone(), right.clone()),
            Expr::Option(expr) => Expr::Option(expr.clone()),
            Expr::Star(expr) => Expr::Star(expr.clone()),
            Expr::Plus(expr) => Expr::Plus(expr.clone()),
            Expr::MinMax { expr, min, max } => Expr::MinMax {
                expr: expr.clone(),
                min: *min,
                max: *max,
            },
        }
    }
}

impl<E> PartialEq for Expr<E> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Expr::Token { source: a, .. }, Expr::Token { source: b, .. }) => a == b,
            (Expr::StartAnchor, Expr::StartAnchor) => true,
            (Expr::EndAnchor, Expr::EndAnchor) => true,
            (Expr::MatchingGroup(a), Expr::MatchingGroup(b)) => a == b,
            (Expr::NamedGroup(an, a), Expr::NamedGroup(bn, b)) => an == bn && a == b,
            (Expr::NonMatchingGroup(a), Expr::NonMatchingGroup(b)) => a == b,
            (Expr::Alternation(al, ar), Expr::Alternation(bl, br)) => al == bl && ar == br,
            (Expr::Option(a), Expr::Option(b)) => a == b,
            (Expr::Star(a), Expr::Star(b)) => a == b,
            (Expr::Plus(a), Expr::Plus(b)) => a == b,
            (
                Expr::MinMax {
                    expr: a,
                    min: amin,
                    max: amax,
                },
                Expr::MinMax {
                    expr: b,
                    min: bmin,
                    max: bmax,
                },
            ) => amin == bmin && amax == bmax && a == b,
            _ => false,
        }
    }
}

impl<E> Eq for Expr<E> {}
