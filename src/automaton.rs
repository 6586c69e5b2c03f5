//! Thompson construction of a nondeterministic finite automaton from an
//! expression tree.
//!
//! States live in an arena indexed by small integers; edges carry target
//! indices, which sidesteps the ownership cycles a `Star` loop would
//! otherwise create. Edge insertion order is semantic: the matcher explores
//! edges in order, and tie-breaking (greediness, first-alternative
//! preference) relies on it.

use std::sync::Arc;

use crate::expr::{self, Expr, Predicate};

/// Index of a state in [`Automaton::states`].
pub(crate) type StateId = usize;

/// A capturing group's position in opening-paren order, starting at 0.
pub(crate) type GroupId = usize;

/// Which side of a group a boundary edge records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Boundary {
    Open,
    Close,
}

pub(crate) enum EdgeKind<E> {
    /// Free transition.
    Epsilon,
    /// Consume one element if the predicate accepts it.
    Match(Predicate<E>),
    /// Zero-width, traversable only at the start of the sequence.
    AssertStart,
    /// Zero-width, traversable only at the end of the sequence.
    AssertEnd,
    /// Zero-width, records a group boundary at the current position.
    Group(GroupId, Boundary),
}

pub(crate) struct Edge<E> {
    pub kind: EdgeKind<E>,
    pub to: StateId,
}

pub(crate) struct State<E> {
    pub edges: Vec<Edge<E>>,
}

pub(crate) struct Automaton<E> {
    pub states: Vec<State<E>>,
    pub start: StateId,
    pub accept: StateId,
    /// Capturing group names in opening-paren order; `None` for anonymous.
    pub groups: Vec<Option<String>>,
    /// Smallest number of elements any accepted input consumes.
    pub min_length: usize,
}

impl<E> Automaton<E> {
    /// Compile a top-level expression list into an automaton with one global
    /// start and one global accept state.
    pub fn build(exprs: &[Expr<E>]) -> Self {
        let mut builder = Builder {
            states: Vec::new(),
            next_group: 0,
        };
        let fragment = builder.sequence(exprs);
        Automaton {
            states: builder.states,
            start: fragment.entry,
            accept: fragment.exit,
            groups: collect_groups(exprs),
            min_length: expr::sequence_min_length(exprs),
        }
    }
}

/// An NFA sub-graph with a single entry and a single exit state.
#[derive(Clone, Copy)]
struct Fragment {
    entry: StateId,
    exit: StateId,
}

struct Builder<E> {
    states: Vec<State<E>>,
    next_group: GroupId,
}

impl<E> Builder<E> {
    fn state(&mut self) -> StateId {
        self.states.push(State { edges: Vec::new() });
        self.states.len() - 1
    }

    fn edge(&mut self, from: StateId, kind: EdgeKind<E>, to: StateId) {
        self.states[from].edges.push(Edge { kind, to });
    }

    /// Concatenation: child fragments chained with epsilon edges. The empty
    /// sequence is a single state that is both entry and exit.
    fn sequence(&mut self, exprs: &[Expr<E>]) -> Fragment {
        let Some((first, rest)) = exprs.split_first() else {
            let state = self.state();
            return Fragment {
                entry: state,
                exit: state,
            };
        };
        let mut fragment = self.fragment(first);
        for next in rest {
            let next_fragment = self.fragment(next);
            self.edge(fragment.exit, EdgeKind::Epsilon, next_fragment.entry);
            fragment.exit = next_fragment.exit;
        }
        fragment
    }

    fn fragment(&mut self, expr: &Expr<E>) -> Fragment {
        match expr {
            Expr::Token { predicate, .. } => {
                let entry = self.state();
                let exit = self.state();
                self.edge(entry, EdgeKind::Match(Arc::clone(predicate)), exit);
                Fragment { entry, exit }
            }
            Expr::StartAnchor => self.assertion(EdgeKind::AssertStart),
            Expr::EndAnchor => self.assertion(EdgeKind::AssertEnd),
            Expr::MatchingGroup(children) | Expr::NamedGroup(_, children) => {
                self.capture_group(children)
            }
            Expr::NonMatchingGroup(children) => self.sequence(children),
            Expr::Alternation(left, right) => {
                let entry = self.state();
                let left_fragment = self.fragment(left);
                self.edge(entry, EdgeKind::Epsilon, left_fragment.entry);
                let right_fragment = self.fragment(right);
                self.edge(entry, EdgeKind::Epsilon, right_fragment.entry);
                let exit = self.state();
                self.edge(left_fragment.exit, EdgeKind::Epsilon, exit);
                self.edge(right_fragment.exit, EdgeKind::Epsilon, exit);
                Fragment { entry, exit }
            }
            Expr::Option(child) => {
                let fragment = self.fragment(child);
                // The skip edge goes after the child's own edges so that
                // consuming paths are explored first.
                self.edge(fragment.entry, EdgeKind::Epsilon, fragment.exit);
                fragment
            }
            Expr::Star(child) => {
                let fragment = self.fragment(child);
                // Loop-back before skip: longer traversals are explored first.
                self.edge(fragment.exit, EdgeKind::Epsilon, fragment.entry);
                self.edge(fragment.entry, EdgeKind::Epsilon, fragment.exit);
                fragment
            }
            Expr::Plus(child) => {
                // A star without the skip edge.
                let fragment = self.fragment(child);
                self.edge(fragment.exit, EdgeKind::Epsilon, fragment.entry);
                fragment
            }
            Expr::MinMax { expr, min, max } => self.min_max(expr, *min, *max),
        }
    }

    fn assertion(&mut self, kind: EdgeKind<E>) -> Fragment {
        let entry = self.state();
        let exit = self.state();
        self.edge(entry, kind, exit);
        Fragment { entry, exit }
    }

    /// Capturing group: the body fragment surrounded by two zero-width edges
    /// recording the open and close boundaries.
    fn capture_group(&mut self, children: &[Expr<E>]) -> Fragment {
        let group = self.next_group;
        self.next_group += 1;
        let entry = self.state();
        let body = self.sequence(children);
        self.edge(entry, EdgeKind::Group(group, Boundary::Open), body.entry);
        let exit = self.state();
        self.edge(body.exit, EdgeKind::Group(group, Boundary::Close), exit);
        Fragment { entry, exit }
    }

    /// `{min,max}` is `max` chained copies of the child; copies past the
    /// first `min` get a trailing skip edge. Every copy reuses the same group
    /// ids, so a group under a repetition keeps a single identity and its
    /// last traversal wins.
    fn min_max(&mut self, child: &Expr<E>, min: usize, max: usize) -> Fragment {
        let first_group = self.next_group;
        let mut fragment: Option<Fragment> = None;
        for copy in 0..max {
            self.next_group = first_group;
            let copy_fragment = self.fragment(child);
            if copy >= min {
                self.edge(copy_fragment.entry, EdgeKind::Epsilon, copy_fragment.exit);
            }
            fragment = Some(match fragment {
                None => copy_fragment,
                Some(mut chain) => {
                    self.edge(chain.exit, EdgeKind::Epsilon, copy_fragment.entry);
                    chain.exit = copy_fragment.exit;
                    chain
                }
            });
        }
        self.next_group = first_group + child.capture_count();
        match fragment {
            Some(fragment) => fragment,
            // {0,0}: the empty fragment.
            None => {
                let state = self.state();
                Fragment {
                    entry: state,
                    exit: state,
                }
            }
        }
    }
}

/// Capturing group names in opening-paren order. A group under `{m,n}` is
/// collected once even though the builder copies its fragment.
fn collect_groups<E>(exprs: &[Expr<E>]) -> Vec<Option<String>> {
    fn walk<E>(expr: &Expr<E>, groups: &mut Vec<Option<String>>) {
        match expr {
            Expr::Token { .. } | Expr::StartAnchor | Expr::EndAnchor => {}
            Expr::MatchingGroup(children) => {
                groups.push(None);
                children.iter().for_each(|c| walk(c, groups));
            }
            Expr::NamedGroup(name, children) => {
                groups.push(Some(name.clone()));
                children.iter().for_each(|c| walk(c, groups));
            }
            Expr::NonMatchingGroup(children) => {
                children.iter().for_each(|c| walk(c, groups));
            }
            Expr::Alternation(left, right) => {
                walk(left, groups);
                walk(right, groups);
            }
            Expr::Option(child) | Expr::Star(child) | Expr::Plus(child) => walk(child, groups),
            Expr::MinMax { expr, .. } => walk(expr, groups),
        }
    }
    let mut groups = Vec::new();
    exprs.iter().for_each(|e| walk(e, &mut groups));
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(text: &str) -> Expr<()> {
        Expr::Token {
            predicate: Arc::new(|_| true),
            source: format!("<{text}>"),
        }
    }

    fn targets(state: &State<()>) -> Vec<StateId> {
        state.edges.iter().map(|e| e.to).collect()
    }

    #[test]
    fn token_fragment_is_two_states_with_a_match_edge() {
        let auto = Automaton::build(&[token("a")]);
        assert_eq!(auto.states.len(), 2);
        assert_ne!(auto.start, auto.accept);
        let edges = &auto.states[auto.start].edges;
        assert_eq!(edges.len(), 1);
        assert!(matches!(edges[0].kind, EdgeKind::Match(_)));
        assert_eq!(edges[0].to, auto.accept);
    }

    #[test]
    fn empty_sequence_is_a_single_state() {
        let auto = Automaton::build(&[] as &[Expr<()>]);
        assert_eq!(auto.start, auto.accept);
        assert_eq!(auto.min_length, 0);
    }

    #[test]
    fn star_loop_back_precedes_skip() {
        let star = Expr::Star(Box::new(token("a")));
        let auto = Automaton::build(&[star]);
        // Fragment entry keeps the consuming edge first, then the skip edge.
        let entry_edges = &auto.states[auto.start].edges;
        assert!(matches!(entry_edges[0].kind, EdgeKind::Match(_)));
        assert!(matches!(entry_edges[1].kind, EdgeKind::Epsilon));
        // The exit's loop-back edge points back at the entry.
        assert_eq!(targets(&auto.states[auto.accept]), vec![auto.start]);
    }

    #[test]
    fn plus_has_no_skip_edge() {
        let plus = Expr::Plus(Box::new(token("a")));
        let auto = Automaton::build(&[plus]);
        assert_eq!(auto.states[auto.start].edges.len(), 1);
        assert_eq!(auto.min_length, 1);
    }

    #[test]
    fn alternation_tries_left_first() {
        let alt = Expr::Alternation(Box::new(token("a")), Box::new(token("b")));
        let auto = Automaton::build(&[alt]);
        let entry_edges = &auto.states[auto.start].edges;
        assert_eq!(entry_edges.len(), 2);
        // Both are epsilon edges; the left alternative's was inserted first.
        assert!(entry_edges[0].to < entry_edges[1].to);
    }

    #[test]
    fn group_table_in_paren_order() {
        let exprs = crate::parser::parse("(<a> (<inner>:<b>)) (?:<c>) (<d>)", |_: &str| {
            Ok(Arc::new(|_: &()| true) as Predicate<()>)
        })
        .unwrap();
        let auto = Automaton::build(&exprs);
        assert_eq!(
            auto.groups,
            vec![None, Some("inner".to_string()), None]
        );
    }

    #[test]
    fn min_max_copies_share_group_ids() {
        let exprs = crate::parser::parse("(<x>:<a>){2,4} (<b>)", |_: &str| {
            Ok(Arc::new(|_: &()| true) as Predicate<()>)
        })
        .unwrap();
        let auto = Automaton::build(&exprs);
        // One id for the repeated named group, one for the trailing group.
        assert_eq!(auto.groups, vec![Some("x".to_string()), None]);
        let mut group_ids: Vec<GroupId> = auto
            .states
            .iter()
            .flat_map(|s| &s.edges)
            .filter_map(|e| match e.kind {
                EdgeKind::Group(id, Boundary::Open) => Some(id),
                _ => None,
            })
            .collect();
        group_ids.sort_unstable();
        // Four copies of group 0, one of group 1.
        assert_eq!(group_ids, vec![0, 0, 0, 0, 1]);
    }

    #[test]
    fn min_length_of_bounded_repetition() {
        let minmax = Expr::MinMax {
            expr: Box::new(token("a")),
            min: 2,
            max: 5,
        };
        let auto = Automaton::build(&[minmax, token("b")]);
        assert_eq!(auto.min_length, 3);
    }
}
